// The workbook with the frequency tables of all the questions.

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use survey_stats::classifier::{analyzable_columns, bucket_columns, short_label};

use crate::survey::*;

const MAX_SHEET_NAME_CHARS: usize = 31;
const BUCKET_MAX_QUESTIONS: usize = 20;
const BUCKET_TOP_N: usize = 15;
const ALL_MAX_QUESTIONS: usize = 50;
const ALL_TOP_N: usize = 10;

pub const SUMMARY_SHEET: &str = "Summary";
pub const ALL_FREQUENCIES_SHEET: &str = "All Frequencies";

#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    Text(String),
    Count(u64),
    Percent(f64),
    Blank,
}

/// The content of one worksheet, before it is written.
#[derive(PartialEq, Debug, Clone)]
pub struct SheetContent {
    pub name: String,
    pub header: Vec<&'static str>,
    pub rows: Vec<Vec<Cell>>,
}

/// Replaces the characters that Excel forbids in sheet names and cuts the name to
/// 31 characters.
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            _ => c,
        })
        .take(MAX_SHEET_NAME_CHARS)
        .collect();
    if cleaned.trim().is_empty() {
        "Sheet".to_string()
    } else {
        cleaned
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// The frequency table of a column over its answers, or None if nobody answered.
fn valid_frequencies(
    table: &ResponseTable,
    col: &str,
    top_n: usize,
) -> SurveyResult<Option<Frequencies>> {
    let freqs =
        summarize(table, col, DenominatorMode::ValidOnly, Some(top_n)).context(StatsSnafu {})?;
    if freqs.denominator == 0 {
        debug!("valid_frequencies: no answer for {:?}", short_label(col));
        Ok(None)
    } else {
        Ok(Some(freqs))
    }
}

fn frequency_cells(row: &FrequencyRow) -> Vec<Cell> {
    vec![
        Cell::Text(row.label.to_string()),
        Cell::Count(row.count),
        Cell::Percent(round2(row.percent)),
    ]
}

fn summary_sheet(table: &ResponseTable) -> SurveyResult<SheetContent> {
    let num_questions = table
        .columns()
        .iter()
        .filter(|c| c.as_str() != SOURCE_COLUMN)
        .count();
    let mut rows = vec![
        vec![
            Cell::Text("Total Responses".to_string()),
            Cell::Count(table.num_rows() as u64),
        ],
        vec![
            Cell::Text("Total Questions".to_string()),
            Cell::Count(num_questions as u64),
        ],
        vec![Cell::Blank, Cell::Blank],
        vec![Cell::Text("Responses by Source".to_string()), Cell::Blank],
    ];
    if table.has_column(SOURCE_COLUMN) {
        for (tag, count) in first_seen_counts(table, SOURCE_COLUMN).context(StatsSnafu {})? {
            rows.push(vec![Cell::Text(tag), Cell::Count(count)]);
        }
    }
    Ok(SheetContent {
        name: SUMMARY_SHEET.to_string(),
        header: vec!["Metric", "Value"],
        rows,
    })
}

fn bucket_sheet(
    table: &ResponseTable,
    rules: &BucketRules,
    bucket: &TopicBucket,
) -> SurveyResult<Option<SheetContent>> {
    let cols = bucket_columns(table, rules, &bucket.name);
    info!(
        "Processing {} ({} questions)",
        bucket.name,
        cols.len().min(BUCKET_MAX_QUESTIONS)
    );
    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for (i, col) in cols.iter().take(BUCKET_MAX_QUESTIONS).enumerate() {
        if let Some(freqs) = valid_frequencies(table, col, BUCKET_TOP_N)? {
            rows.push(vec![
                Cell::Text(format!("Q{}: {}", i + 1, short_label(col))),
                Cell::Blank,
                Cell::Blank,
            ]);
            rows.extend(freqs.rows.iter().map(frequency_cells));
            rows.push(vec![Cell::Blank, Cell::Blank, Cell::Blank]);
        }
    }
    if rows.is_empty() {
        return Ok(None);
    }
    Ok(Some(SheetContent {
        name: sanitize_sheet_name(&bucket.name),
        header: vec!["Response", "Frequency", "Percentage"],
        rows,
    }))
}

fn all_frequencies_sheet(
    table: &ResponseTable,
    rules: &BucketRules,
) -> SurveyResult<Option<SheetContent>> {
    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for col in analyzable_columns(table, rules)
        .into_iter()
        .take(ALL_MAX_QUESTIONS)
    {
        if let Some(freqs) = valid_frequencies(table, col, ALL_TOP_N)? {
            let question = short_label(col);
            for row in freqs.rows.iter() {
                let mut cells = vec![Cell::Text(question.clone())];
                cells.extend(frequency_cells(row));
                rows.push(cells);
            }
        }
    }
    if rows.is_empty() {
        return Ok(None);
    }
    Ok(Some(SheetContent {
        name: ALL_FREQUENCIES_SHEET.to_string(),
        header: vec!["Question", "Response", "Frequency", "Percentage"],
        rows,
    }))
}

/// All the sheets of the frequency workbook, in order. Buckets without any answered
/// question get no sheet.
pub fn plan_frequency_workbook(
    table: &ResponseTable,
    rules: &BucketRules,
) -> SurveyResult<Vec<SheetContent>> {
    let mut sheets = vec![summary_sheet(table)?];
    for bucket in rules.buckets.iter() {
        if let Some(mut sheet) = bucket_sheet(table, rules, bucket)? {
            // Sanitized names may collide.
            let base = sheet.name.clone();
            let mut suffix = 2;
            while sheets.iter().any(|s| s.name == sheet.name) {
                let tag = format!(" ({})", suffix);
                let keep = MAX_SHEET_NAME_CHARS - tag.chars().count();
                sheet.name = format!("{}{}", base.chars().take(keep).collect::<String>(), tag);
                suffix += 1;
            }
            sheets.push(sheet);
        }
    }
    if let Some(sheet) = all_frequencies_sheet(table, rules)? {
        sheets.push(sheet);
    }
    Ok(sheets)
}

fn write_sheet(sheet: &mut Worksheet, content: &SheetContent, bold: &Format) -> Result<(), XlsxError> {
    sheet.set_name(&content.name)?;
    for (col_idx, h) in content.header.iter().enumerate() {
        sheet.write_string_with_format(0, col_idx as u16, *h, bold)?;
    }
    for (row_idx, row) in content.rows.iter().enumerate() {
        let r = (row_idx + 1) as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            let c = col_idx as u16;
            match cell {
                Cell::Text(s) => {
                    sheet.write_string(r, c, s)?;
                }
                Cell::Count(n) => {
                    sheet.write_number(r, c, *n as f64)?;
                }
                Cell::Percent(p) => {
                    sheet.write_number(r, c, *p)?;
                }
                Cell::Blank => {}
            }
        }
    }
    Ok(())
}

pub fn write_frequency_workbook(
    table: &ResponseTable,
    rules: &BucketRules,
    path: &Path,
) -> SurveyResult<()> {
    info!(
        "Creating frequency tables for {} questions",
        analyzable_columns(table, rules).len()
    );
    let sheets = plan_frequency_workbook(table, rules)?;
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    for content in sheets.iter() {
        debug!(
            "write_frequency_workbook: sheet {:?}: {} rows",
            content.name,
            content.rows.len()
        );
        write_sheet(workbook.add_worksheet(), content, &bold).context(WritingExcelSnafu {
            path: path.display().to_string(),
        })?;
    }

    io_common::ensure_parent_dir(path)?;
    let partial = io_common::partial_path(path);
    workbook.save(&partial).context(WritingExcelSnafu {
        path: partial.display().to_string(),
    })?;
    io_common::commit_partial(&partial, path)
}
