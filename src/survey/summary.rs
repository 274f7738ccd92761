// The console summary of the dataset and of the generated files.

use chrono::NaiveDateTime;
use survey_stats::classifier::{analyzable_columns, select_columns};

use crate::survey::*;

const RULE_WIDTH: usize = 70;
const FINDINGS_TOP_N: usize = 5;
const PLOTS_SHOWN: usize = 10;

const NOTEBOOKS: [&str; 1] = ["notebooks/survey_analysis.ipynb"];
const DOCUMENTS: [&str; 5] = [
    "README.md",
    "DATA_README.md",
    "CITATION.cff",
    "LICENSE",
    ".gitignore",
];

fn section(lines: &mut Vec<String>, title: &str) {
    lines.push(String::new());
    lines.push("=".repeat(RULE_WIDTH));
    lines.push(title.to_string());
    lines.push("=".repeat(RULE_WIDTH));
}

fn overview(lines: &mut Vec<String>, table: &ResponseTable) -> SurveyResult<()> {
    let total = table.num_rows();
    section(lines, "1. DATASET OVERVIEW");
    lines.push(format!("Total Responses: {}", total));
    let num_questions = table
        .columns()
        .iter()
        .filter(|c| c.as_str() != SOURCE_COLUMN)
        .count();
    lines.push(format!("Total Questions: {}", num_questions));
    if table.has_column(SOURCE_COLUMN) && total > 0 {
        lines.push(String::new());
        lines.push("Responses by Source:".to_string());
        for (tag, count) in first_seen_counts(table, SOURCE_COLUMN).context(StatsSnafu {})? {
            lines.push(format!(
                "  - {}: {} ({:.1}%)",
                tag,
                count,
                count as f64 * 100.0 / total as f64
            ));
        }
    }
    Ok(())
}

fn completeness(
    lines: &mut Vec<String>,
    table: &ResponseTable,
    rules: &BucketRules,
) -> SurveyResult<()> {
    section(lines, "2. DATA COMPLETENESS");
    let mut rates: Vec<f64> = Vec::new();
    for col in analyzable_columns(table, rules) {
        rates.push(response_rate(table, col).context(StatsSnafu {})? * 100.0);
    }
    if rates.is_empty() {
        lines.push("No question to analyze".to_string());
        return Ok(());
    }
    let avg = rates.iter().sum::<f64>() / rates.len() as f64;
    lines.push(format!("Average Response Rate: {:.1}%", avg));
    for threshold in [90.0, 80.0, 70.0] {
        lines.push(format!(
            "Questions with >{}% response rate: {}",
            threshold,
            rates.iter().filter(|r| **r > threshold).count()
        ));
    }
    Ok(())
}

fn key_findings(
    lines: &mut Vec<String>,
    table: &ResponseTable,
    rules: &BucketRules,
) -> SurveyResult<()> {
    section(lines, "3. KEY FINDINGS SUMMARY");
    let findings: [(&str, ColumnFilter); 5] = [
        (
            "Most Used AI Chat Assistants",
            ColumnFilter::any(&["which ai", "what ai"]),
        ),
        ("Participant Roles", ColumnFilter::all(&["role", "scrum"])),
        ("Experience Levels", ColumnFilter::all(&["experience", "year"])),
        (
            "Top Benefits Experienced",
            ColumnFilter::all(&["benefits", "experienced"]),
        ),
        (
            "Top Challenges Encountered",
            ColumnFilter::any(&["problem", "frustration"]),
        ),
    ];
    for (title, filter) in findings.iter() {
        let col = match select_columns(table, rules, filter).first() {
            Some(c) => c.to_string(),
            None => continue,
        };
        let freqs = summarize(table, &col, DenominatorMode::ValidOnly, None).context(StatsSnafu {})?;
        lines.push(String::new());
        lines.push(format!("{}:", title));
        let shown = freqs.rows.len().min(FINDINGS_TOP_N);
        lines.extend(io_markdown::console_lines(&freqs.rows[..shown]));
    }
    Ok(())
}

fn check_line(root: &Path, name: &str, with_size: bool) -> String {
    let p = root.join(name);
    match fs::metadata(&p) {
        Ok(m) if with_size => format!("  [x] {} ({:.1} KB)", name, m.len() as f64 / 1024.0),
        Ok(_) => format!("  [x] {}", name),
        Err(_) => format!("  [ ] {} (not found)", name),
    }
}

fn display_path(settings: &Settings, p: &Path) -> String {
    p.strip_prefix(&settings.root)
        .unwrap_or(p)
        .display()
        .to_string()
}

fn generated_files(lines: &mut Vec<String>, settings: &Settings) {
    section(lines, "4. GENERATED FILES");
    lines.push(String::new());
    lines.push("Data Files:".to_string());
    for p in [&settings.merged_file, &settings.frequency_file] {
        let name = display_path(settings, p);
        lines.push(check_line(&settings.root, &name, true));
    }
    lines.push(check_line(
        &settings.root,
        &display_path(settings, &settings.report_file),
        true,
    ));

    lines.push(String::new());
    lines.push("Visualizations:".to_string());
    match fs::read_dir(&settings.plots_dir) {
        Ok(entries) => {
            let mut plots: Vec<String> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .filter(|n| n.ends_with(".png"))
                .collect();
            plots.sort();
            lines.push(format!("  Total plots generated: {}", plots.len()));
            for plot in plots.iter().take(PLOTS_SHOWN) {
                lines.push(format!("  [x] {}", plot));
            }
            if plots.len() > PLOTS_SHOWN {
                lines.push(format!("  ... and {} more", plots.len() - PLOTS_SHOWN));
            }
        }
        Err(_) => lines.push("  [ ] No plots directory found".to_string()),
    }

    lines.push(String::new());
    lines.push("Notebooks:".to_string());
    for nb in NOTEBOOKS.iter() {
        lines.push(check_line(&settings.root, nb, false));
    }
    lines.push(String::new());
    lines.push("Documentation:".to_string());
    for doc in DOCUMENTS.iter() {
        lines.push(check_line(&settings.root, doc, false));
    }
}

/// The lines of the console summary, stamped with the time of generation.
pub fn build_summary(
    table: &ResponseTable,
    settings: &Settings,
    generated_at: NaiveDateTime,
) -> SurveyResult<Vec<String>> {
    let mut lines = vec![
        "=".repeat(RULE_WIDTH),
        "SURVEY ANALYSIS SUMMARY REPORT".to_string(),
        "=".repeat(RULE_WIDTH),
        format!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S")),
        "=".repeat(RULE_WIDTH),
    ];
    overview(&mut lines, table)?;
    completeness(&mut lines, table, &settings.rules)?;
    key_findings(&mut lines, table, &settings.rules)?;
    generated_files(&mut lines, settings);
    lines.push(String::new());
    lines.push("=".repeat(RULE_WIDTH));
    lines.push("REPORT GENERATION COMPLETE".to_string());
    lines.push("=".repeat(RULE_WIDTH));
    Ok(lines)
}
