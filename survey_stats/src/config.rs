// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The column added by the merge step to record where a response came from.
pub const SOURCE_COLUMN: &str = "source";

/// The timestamp column written by the form provider.
pub const TIMESTAMP_COLUMN: &str = "Carimbo de data/hora";

/// The label used for the rows without an answer.
pub const MISSING_LABEL: &str = "Missing/No answer";

/// The label of the aggregate row produced by the top-N truncation.
pub const OTHERS_LABEL: &str = "Others";

/// The content of a single cell of a response table.
///
/// The cell types are kept as they were read from the source file.
#[derive(PartialEq, Debug, Clone)]
pub enum Answer {
    Text(String),
    Number(f64),
    Bool(bool),
    /// A spreadsheet date, as a serial number of days.
    DateTime(f64),
    /// An empty cell, or a cell only containing whitespace.
    Missing,
}

pub(crate) static MISSING_ANSWER: Answer = Answer::Missing;

impl Answer {
    /// Builds an answer from some text. Blank text is a missing answer.
    pub fn text(s: &str) -> Answer {
        if s.trim().is_empty() {
            Answer::Missing
        } else {
            Answer::Text(s.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Answer::Missing)
    }

    /// The label under which this answer is counted, or None for a missing answer.
    pub fn label(&self) -> Option<String> {
        match self {
            Answer::Text(s) => Some(s.trim().to_string()),
            Answer::Number(f) | Answer::DateTime(f) => Some(format_number(*f)),
            Answer::Bool(b) => Some(b.to_string()),
            Answer::Missing => None,
        }
    }
}

fn format_number(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{}", f)
    }
}

/// An immutable table of survey responses.
///
/// Columns are the literal question texts. Rows are stored in the order in which
/// they were added. Use the [`crate::builder::TableBuilder`] or [`crate::merge_tables`]
/// to create one.
#[derive(PartialEq, Debug, Clone)]
pub struct ResponseTable {
    pub(crate) columns: Vec<String>,
    // Invariant: every row has exactly one cell per column.
    pub(crate) rows: Vec<Vec<Answer>>,
}

impl ResponseTable {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// All the answers to a question, in row order.
    pub fn column_values(&self, name: &str) -> Result<Vec<&Answer>, StatsError> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| StatsError::UnknownColumn(name.to_string()))?;
        Ok(self
            .rows
            .iter()
            .map(|row| row.get(idx).unwrap_or(&MISSING_ANSWER))
            .collect())
    }

    pub fn get(&self, row: usize, col: usize) -> &Answer {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&MISSING_ANSWER)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Answer]> {
        self.rows.iter().map(|r| r.as_slice())
    }
}

/// A topical group of questions, defined by keywords.
///
/// A question belongs to the bucket if any of the keywords appears in its text,
/// ignoring case.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TopicBucket {
    pub name: String,
    pub keywords: Vec<String>,
}

impl TopicBucket {
    pub fn new(name: &str, keywords: &[&str]) -> TopicBucket {
        TopicBucket {
            name: name.to_string(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// The rule table used by the classifier.
///
/// Buckets are not exclusive and have no precedence: a question may fall in several
/// of them or in none.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BucketRules {
    pub buckets: Vec<TopicBucket>,
    /// Columns that are never classified nor analyzed.
    pub reserved_columns: Vec<String>,
}

impl BucketRules {
    pub fn new(buckets: Vec<TopicBucket>) -> BucketRules {
        BucketRules {
            buckets,
            reserved_columns: vec![TIMESTAMP_COLUMN.to_string(), SOURCE_COLUMN.to_string()],
        }
    }

    pub fn is_reserved(&self, column: &str) -> bool {
        self.reserved_columns.iter().any(|c| c == column)
    }
}

impl Default for BucketRules {
    fn default() -> Self {
        BucketRules::new(vec![
            TopicBucket::new(
                "Demographics",
                &[
                    "role",
                    "experience",
                    "team size",
                    "industry",
                    "country",
                    "age",
                ],
            ),
            TopicBucket::new("AI Usage", &["which ai", "how often", "frequency"]),
            TopicBucket::new(
                "Benefits",
                &["benefit", "helpful", "advantage", "positive"],
            ),
            TopicBucket::new(
                "Risks/Challenges",
                &["risk", "problem", "challenge", "negative", "frustration"],
            ),
            TopicBucket::new(
                "Scrum Activities",
                &["sprint", "backlog", "planning", "retrospective", "daily"],
            ),
        ])
    }
}

/// Selects columns by keywords: at least one of `any_of` (if not empty) and all
/// of `all_of` must appear in the question, ignoring case.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ColumnFilter {
    pub any_of: Vec<String>,
    pub all_of: Vec<String>,
}

impl ColumnFilter {
    pub fn any(keywords: &[&str]) -> ColumnFilter {
        ColumnFilter {
            any_of: keywords.iter().map(|s| s.to_string()).collect(),
            all_of: Vec::new(),
        }
    }

    pub fn all(keywords: &[&str]) -> ColumnFilter {
        ColumnFilter {
            any_of: Vec::new(),
            all_of: keywords.iter().map(|s| s.to_string()).collect(),
        }
    }
}

// ********* Ordinal scales **********

/// The closed set of ordinal scales found in the survey.
///
/// Each scale has a canonical order for its categories, which is the display
/// order regardless of the observed frequencies.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Scale {
    Frequency,
    Level,
    Agreement,
    Helpfulness,
    YesNoMaybe,
}

impl Scale {
    pub const ALL: [Scale; 5] = [
        Scale::Frequency,
        Scale::Level,
        Scale::Agreement,
        Scale::Helpfulness,
        Scale::YesNoMaybe,
    ];

    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            Scale::Frequency => &["Never", "Rarely", "Sometimes", "Often", "Always"],
            Scale::Level => &["Very Low", "Low", "Moderate", "High", "Very High"],
            Scale::Agreement => &[
                "Strongly Disagree",
                "Disagree",
                "Neutral",
                "Agree",
                "Strongly Agree",
            ],
            Scale::Helpfulness => &[
                "Not at all helpful",
                "Slightly helpful",
                "Moderately helpful",
                "Very helpful",
                "Extremely helpful",
            ],
            Scale::YesNoMaybe => &["Yes", "No", "Maybe"],
        }
    }

    /// The position of a category in the scale. The match is exact.
    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels().iter().position(|l| *l == label)
    }

    /// Other spellings of the categories, as (alias, canonical label).
    ///
    /// Some form exports write `Strongly agree` where others write `Strongly Agree`.
    pub fn aliases(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Scale::Agreement => &[
                ("Strongly disagree", "Strongly Disagree"),
                ("Strongly agree", "Strongly Agree"),
            ],
            _ => &[],
        }
    }

    /// Like `position`, but also accepts the aliases of the categories.
    pub fn position_or_alias(&self, label: &str) -> Option<usize> {
        self.position(label).or_else(|| {
            self.aliases()
                .iter()
                .find(|(alias, _)| *alias == label)
                .and_then(|(_, canonical)| self.position(canonical))
        })
    }
}

// ******** Output data structures *********

/// Which rows count in the denominator of the percentages.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum DenominatorMode {
    /// All the rows of the table. Missing answers get their own row.
    TotalRows,
    /// Only the rows with an answer. Missing answers are not reported.
    ValidOnly,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum ResponseLabel {
    Value(String),
    Missing,
    Others,
}

impl Display for ResponseLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseLabel::Value(s) => write!(f, "{}", s),
            ResponseLabel::Missing => write!(f, "{}", MISSING_LABEL),
            ResponseLabel::Others => write!(f, "{}", OTHERS_LABEL),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct FrequencyRow {
    pub label: ResponseLabel,
    pub count: u64,
    /// Percentage of the denominator, not rounded.
    pub percent: f64,
}

impl FrequencyRow {
    /// The percentage as displayed in reports, e.g. `25.0%`.
    pub fn percent_display(&self) -> String {
        format!("{:.1}%", self.percent)
    }
}

/// The frequency table of one question.
#[derive(PartialEq, Debug, Clone)]
pub struct Frequencies {
    pub question: String,
    pub mode: DenominatorMode,
    pub denominator: u64,
    /// Number of distinct answers before any truncation.
    pub distinct_values: usize,
    pub rows: Vec<FrequencyRow>,
}

impl Frequencies {
    pub fn total_count(&self) -> u64 {
        self.rows.iter().map(|r| r.count).sum()
    }

    pub fn total_percent(&self) -> f64 {
        self.rows.iter().map(|r| r.percent).sum()
    }

    pub fn value_rows(&self) -> impl Iterator<Item = &FrequencyRow> {
        self.rows
            .iter()
            .filter(|r| matches!(r.label, ResponseLabel::Value(_)))
    }
}

/// The counts of one question projected on a scale, one entry per category.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ScaleBreakdown {
    pub question: String,
    pub scale: Scale,
    pub counts: Vec<u64>,
    /// Answers that do not belong to the scale.
    pub unrecognized: u64,
    /// Number of rows with an answer.
    pub valid: u64,
}

impl ScaleBreakdown {
    pub fn count_of(&self, label: &str) -> u64 {
        self.scale
            .position(label)
            .and_then(|idx| self.counts.get(idx).cloned())
            .unwrap_or(0)
    }
}

/// Errors that prevent a computation from completing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum StatsError {
    UnknownColumn(String),
    NothingToMerge,
    RowTooLong { expected: usize, found: usize },
}

impl Error for StatsError {}

impl Display for StatsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsError::UnknownColumn(name) => write!(f, "Unknown column {:?}", name),
            StatsError::NothingToMerge => write!(f, "No table was provided to the merge"),
            StatsError::RowTooLong { expected, found } => write!(
                f,
                "Row has {} cells but the table only has {} columns",
                found, expected
            ),
        }
    }
}
