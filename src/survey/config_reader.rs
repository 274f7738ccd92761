use crate::survey::*;

use log::{debug, info};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SOURCES: [(&str, &str); 2] = [
    (
        "Survey 1 (respostas)",
        "data/raw/Exploring the Use of AI Chat Assistants in Scrum (respostas).xlsx",
    ),
    (
        "Survey 2 (Udemy)",
        "data/raw/Exploring the Use of AI Chat Assistants in Scrum - Udemy (Responses).xlsx",
    ),
];
pub const DEFAULT_MERGED_FILE: &str = "data/processed/merged_survey_data.xlsx";
pub const DEFAULT_FREQUENCY_FILE: &str = "data/processed/frequency_analysis.xlsx";
pub const DEFAULT_REPORT_FILE: &str = "outputs/descriptive_stats.md";
pub const DEFAULT_PLOTS_DIR: &str = "outputs/plots";

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SurveySource {
    pub label: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "worksheetName")]
    pub worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct BucketSpec {
    pub name: String,
    pub keywords: Vec<String>,
}

/// The configuration file, as written by the user. All the fields are optional.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct AnalysisConfig {
    pub sources: Option<Vec<SurveySource>>,
    #[serde(rename = "mergedFile")]
    pub merged_file: Option<String>,
    #[serde(rename = "frequencyFile")]
    pub frequency_file: Option<String>,
    #[serde(rename = "reportFile")]
    pub report_file: Option<String>,
    #[serde(rename = "plotsDirectory")]
    pub plots_directory: Option<String>,
    pub buckets: Option<Vec<BucketSpec>>,
    #[serde(rename = "chartTopN")]
    pub chart_top_n: Option<usize>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SurveySourceSettings {
    pub label: String,
    pub path: PathBuf,
    pub worksheet: Option<String>,
}

/// The validated configuration, with all the paths resolved.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Settings {
    /// The directory against which the relative paths are resolved.
    pub root: PathBuf,
    pub sources: Vec<SurveySourceSettings>,
    pub merged_file: PathBuf,
    pub frequency_file: PathBuf,
    pub report_file: PathBuf,
    pub plots_dir: PathBuf,
    pub rules: BucketRules,
    pub chart_top_n: Option<usize>,
}

impl Settings {
    /// The default locations, relative to the given directory.
    pub fn with_root(root: &Path) -> Settings {
        Settings {
            root: root.to_path_buf(),
            sources: DEFAULT_SOURCES
                .iter()
                .map(|(label, p)| SurveySourceSettings {
                    label: label.to_string(),
                    path: root.join(p),
                    worksheet: None,
                })
                .collect(),
            merged_file: root.join(DEFAULT_MERGED_FILE),
            frequency_file: root.join(DEFAULT_FREQUENCY_FILE),
            report_file: root.join(DEFAULT_REPORT_FILE),
            plots_dir: root.join(DEFAULT_PLOTS_DIR),
            rules: BucketRules::default(),
            chart_top_n: None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings::with_root(Path::new("."))
    }
}

fn validate_buckets(specs: &Option<Vec<BucketSpec>>) -> SurveyResult<BucketRules> {
    let specs = match specs {
        None => return Ok(BucketRules::default()),
        Some(x) => x,
    };
    let mut buckets: Vec<TopicBucket> = Vec::new();
    for spec in specs.iter() {
        if spec.name.trim().is_empty() {
            return InvalidConfigSnafu {
                message: "a bucket has an empty name".to_string(),
            }
            .fail();
        }
        if buckets.iter().any(|b| b.name == spec.name) {
            return InvalidConfigSnafu {
                message: format!("bucket {:?} is defined twice", spec.name),
            }
            .fail();
        }
        if spec.keywords.is_empty() || spec.keywords.iter().any(|k| k.trim().is_empty()) {
            return InvalidConfigSnafu {
                message: format!("bucket {:?} needs non-empty keywords", spec.name),
            }
            .fail();
        }
        buckets.push(TopicBucket {
            name: spec.name.clone(),
            keywords: spec.keywords.clone(),
        });
    }
    Ok(BucketRules::new(buckets))
}

/// Checks a configuration and resolves its paths against `root`.
pub fn validate_config(config: &AnalysisConfig, root: &Path) -> SurveyResult<Settings> {
    let defaults = Settings::with_root(root);
    let resolve = |p: &Option<String>, default: PathBuf| match p {
        Some(s) => root.join(s),
        None => default,
    };

    let sources = match &config.sources {
        None => defaults.sources.clone(),
        Some(srcs) if srcs.is_empty() => {
            return InvalidConfigSnafu {
                message: "the list of sources is empty".to_string(),
            }
            .fail();
        }
        Some(srcs) => srcs
            .iter()
            .map(|s| SurveySourceSettings {
                label: s.label.clone(),
                path: root.join(&s.file_path),
                worksheet: s.worksheet_name.clone(),
            })
            .collect(),
    };
    if sources.iter().any(|s| s.label.trim().is_empty()) {
        return InvalidConfigSnafu {
            message: "every source needs a non-empty label".to_string(),
        }
        .fail();
    }
    if config.chart_top_n == Some(0) {
        return InvalidConfigSnafu {
            message: "chartTopN must be at least 1".to_string(),
        }
        .fail();
    }

    Ok(Settings {
        root: root.to_path_buf(),
        sources,
        merged_file: resolve(&config.merged_file, defaults.merged_file),
        frequency_file: resolve(&config.frequency_file, defaults.frequency_file),
        report_file: resolve(&config.report_file, defaults.report_file),
        plots_dir: resolve(&config.plots_directory, defaults.plots_dir),
        rules: validate_buckets(&config.buckets)?,
        chart_top_n: config.chart_top_n,
    })
}

/// Reads a JSON configuration. Relative paths are relative to the directory of the file.
pub fn read_config(path: &str) -> SurveyResult<Settings> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read_config: content: {:?}", contents);
    let config: AnalysisConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    info!("config: {:?}", config);
    let root = Path::new(path)
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    validate_config(&config, &root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_gives_defaults() {
        let config: AnalysisConfig = serde_json::from_str("{}").unwrap();
        let s = validate_config(&config, Path::new("/tmp/x")).unwrap();
        assert_eq!(s, Settings::with_root(Path::new("/tmp/x")));
        assert_eq!(s.sources.len(), 2);
        assert_eq!(s.sources[0].label, "Survey 1 (respostas)");
        assert_eq!(
            s.merged_file,
            Path::new("/tmp/x/data/processed/merged_survey_data.xlsx")
        );
        assert_eq!(s.rules, BucketRules::default());
    }

    #[test]
    fn full_config() {
        let js = r#"{
            "sources": [
                { "label": "A", "filePath": "raw/a.xlsx", "worksheetName": "Form1" },
                { "label": "B", "filePath": "raw/b.csv" }
            ],
            "mergedFile": "merged.xlsx",
            "plotsDirectory": "plots",
            "buckets": [ { "name": "Tools", "keywords": ["which ai"] } ],
            "chartTopN": 5
        }"#;
        let config: AnalysisConfig = serde_json::from_str(js).unwrap();
        let s = validate_config(&config, Path::new("/r")).unwrap();
        assert_eq!(s.sources[0].worksheet, Some("Form1".to_string()));
        assert_eq!(s.sources[1].path, Path::new("/r/raw/b.csv"));
        assert_eq!(s.merged_file, Path::new("/r/merged.xlsx"));
        assert_eq!(s.plots_dir, Path::new("/r/plots"));
        assert_eq!(s.report_file, Path::new("/r/outputs/descriptive_stats.md"));
        assert_eq!(s.rules.buckets.len(), 1);
        assert_eq!(s.rules.buckets[0].name, "Tools");
        assert!(s.rules.is_reserved(SOURCE_COLUMN));
        assert_eq!(s.chart_top_n, Some(5));
    }

    #[test]
    fn invalid_configs() {
        for js in [
            r#"{ "sources": [] }"#,
            r#"{ "sources": [ { "label": " ", "filePath": "a.xlsx" } ] }"#,
            r#"{ "buckets": [ { "name": "", "keywords": ["x"] } ] }"#,
            r#"{ "buckets": [ { "name": "A", "keywords": [] } ] }"#,
            r#"{ "buckets": [ { "name": "A", "keywords": ["x"] }, { "name": "A", "keywords": ["y"] } ] }"#,
            r#"{ "chartTopN": 0 }"#,
        ] {
            let config: AnalysisConfig = serde_json::from_str(js).unwrap();
            let res = validate_config(&config, Path::new("."));
            assert!(
                matches!(res, Err(SurveyError::InvalidConfig { .. })),
                "{}",
                js
            );
        }
    }

    #[test]
    fn read_config_resolves_against_its_directory() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("survey.json");
        fs::write(&p, r#"{ "reportFile": "out/report.md" }"#).unwrap();
        let s = read_config(p.to_str().unwrap()).unwrap();
        assert_eq!(s.report_file, dir.path().join("out/report.md"));

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            read_config(missing.to_str().unwrap()),
            Err(SurveyError::OpeningJson { .. })
        ));
        fs::write(&p, "{ not json").unwrap();
        assert!(matches!(
            read_config(p.to_str().unwrap()),
            Err(SurveyError::ParsingJson { .. })
        ));
    }
}
