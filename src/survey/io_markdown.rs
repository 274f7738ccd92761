// The Markdown report with the descriptive statistics.

use survey_stats::classifier::{bucket_columns, select_columns, short_label};

use crate::survey::io_common::cut_label;
use crate::survey::*;

pub const DEMOGRAPHICS_BUCKET: &str = "Demographics";
pub const AI_USAGE_BUCKET: &str = "AI Usage";

const DEMOGRAPHICS_TOP_N: usize = 10;
const AI_USAGE_MAX_QUESTIONS: usize = 5;
const AI_USAGE_TOP_N: usize = 15;
const BENEFITS_MAX_QUESTIONS: usize = 5;
const STATEMENT_MAX_CHARS: usize = 60;
const RISK_MAX_CHARS: usize = 50;

fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

pub fn frequency_table_lines(rows: &[FrequencyRow]) -> Vec<String> {
    let mut lines = vec![
        "| Response | Count | Percent |".to_string(),
        "| --- | ---: | ---: |".to_string(),
    ];
    for row in rows {
        lines.push(format!(
            "| {} | {} | {} |",
            escape_cell(&row.label.to_string()),
            row.count,
            row.percent_display()
        ));
    }
    lines
}

/// One row per question, one column per category of the scale, then the number of
/// answers. The Yes/No/Maybe scale also gets the share of `Yes` among the answers.
pub fn scale_pivot_lines(
    row_header: &str,
    rows: &[(String, ScaleBreakdown)],
    scale: Scale,
) -> Vec<String> {
    let with_share = scale == Scale::YesNoMaybe;
    let mut header = format!("| {} |", row_header);
    let mut sep = "| --- |".to_string();
    for label in scale.labels() {
        header.push_str(&format!(" {} |", label));
        sep.push_str(" ---: |");
    }
    header.push_str(" n |");
    sep.push_str(" ---: |");
    if with_share {
        header.push_str(" % Yes |");
        sep.push_str(" ---: |");
    }
    let mut lines = vec![header, sep];
    for (name, breakdown) in rows {
        let mut line = format!("| {} |", escape_cell(name));
        for count in breakdown.counts.iter() {
            line.push_str(&format!(" {} |", count));
        }
        line.push_str(&format!(" {} |", breakdown.valid));
        if with_share {
            let yes = breakdown.count_of("Yes");
            let share = if breakdown.valid > 0 {
                yes as f64 * 100.0 / breakdown.valid as f64
            } else {
                0.0
            };
            line.push_str(&format!(" {:.1}% |", share));
        }
        lines.push(line);
    }
    lines
}

/// The frequency rows as printed on the console.
pub fn console_lines(rows: &[FrequencyRow]) -> Vec<String> {
    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            format!(
                "  {}. {}: {} ({})",
                idx + 1,
                cut_label(&row.label.to_string(), STATEMENT_MAX_CHARS),
                row.count,
                row.percent_display()
            )
        })
        .collect()
}

fn pivot_section(
    lines: &mut Vec<String>,
    table: &ResponseTable,
    columns: &[&str],
    row_header: &str,
    scale: Scale,
    max_label: Option<usize>,
) -> SurveyResult<()> {
    if columns.is_empty() {
        warn!("No question found for the {:?} table", row_header);
        return Ok(());
    }
    let mut rows: Vec<(String, ScaleBreakdown)> = Vec::new();
    for col in columns {
        let label = short_label(col);
        let label = match max_label {
            Some(n) => cut_label(&label, n),
            None => label,
        };
        rows.push((label, scale_breakdown(table, col, scale).context(StatsSnafu {})?));
    }
    lines.extend(scale_pivot_lines(row_header, &rows, scale));
    lines.push(String::new());
    Ok(())
}

/// Builds the Markdown report. The frequency tables are computed over all the rows,
/// the pivot tables over the rows with an answer.
pub fn build_report(
    table: &ResponseTable,
    rules: &BucketRules,
    source_name: &str,
) -> SurveyResult<String> {
    let total = table.num_rows();
    let mut lines: Vec<String> = vec![
        "# Descriptive Statistics".to_string(),
        String::new(),
        "## Survey Overview".to_string(),
        String::new(),
        format!("- **Total responses**: {}", total),
    ];
    if table.has_column(SOURCE_COLUMN) {
        for (tag, count) in first_seen_counts(table, SOURCE_COLUMN).context(StatsSnafu {})? {
            let share = if total > 0 {
                count as f64 * 100.0 / total as f64
            } else {
                0.0
            };
            lines.push(format!("- **{}**: {} ({:.1}%)", tag, count, share));
        }
    }
    let num_questions = table
        .columns()
        .iter()
        .filter(|c| c.as_str() != SOURCE_COLUMN)
        .count();
    lines.push(format!("- **Total questions**: {}", num_questions));
    lines.push(String::new());

    lines.push("## Demographics and Background".to_string());
    lines.push(String::new());
    for col in bucket_columns(table, rules, DEMOGRAPHICS_BUCKET) {
        let freqs = summarize(table, col, DenominatorMode::TotalRows, None).context(StatsSnafu {})?;
        lines.push(format!("### {}", short_label(col)));
        lines.push(String::new());
        let shown = freqs.rows.len().min(DEMOGRAPHICS_TOP_N);
        lines.extend(frequency_table_lines(&freqs.rows[..shown]));
        lines.push(String::new());
    }

    lines.push("## AI Chat Assistant Usage".to_string());
    lines.push(String::new());
    for col in bucket_columns(table, rules, AI_USAGE_BUCKET)
        .into_iter()
        .take(AI_USAGE_MAX_QUESTIONS)
    {
        let freqs = summarize(table, col, DenominatorMode::TotalRows, None).context(StatsSnafu {})?;
        lines.push(format!("### {}", short_label(col)));
        lines.push(String::new());
        let shown = freqs.rows.len().min(AI_USAGE_TOP_N);
        lines.extend(frequency_table_lines(&freqs.rows[..shown]));
        if freqs.rows.len() > AI_USAGE_TOP_N {
            lines.push(format!(
                "_... and {} more responses_",
                freqs.rows.len() - AI_USAGE_TOP_N
            ));
        }
        lines.push(String::new());
    }

    lines.push("## Helpfulness of AI Chat Assistants by Role".to_string());
    lines.push(String::new());
    let helpfulness = select_columns(
        table,
        rules,
        &ColumnFilter::all(&["helpful", "scrum accountabilities"]),
    );
    pivot_section(&mut lines, table, &helpfulness, "Role", Scale::Helpfulness, None)?;

    lines.push("## Perceived Benefits".to_string());
    lines.push(String::new());
    let benefits: Vec<&str> = select_columns(table, rules, &ColumnFilter::all(&["benefit", "agree"]))
        .into_iter()
        .take(BENEFITS_MAX_QUESTIONS)
        .collect();
    pivot_section(
        &mut lines,
        table,
        &benefits,
        "Statement",
        Scale::Agreement,
        Some(STATEMENT_MAX_CHARS),
    )?;

    lines.push("## Perceived Risks of Intensive Use".to_string());
    lines.push(String::new());
    let risks = select_columns(
        table,
        rules,
        &ColumnFilter::all(&["intensive use", "could cause"]),
    );
    pivot_section(
        &mut lines,
        table,
        &risks,
        "Risk",
        Scale::YesNoMaybe,
        Some(RISK_MAX_CHARS),
    )?;

    lines.push("---".to_string());
    lines.push(String::new());
    lines.push(format!(
        "_All percentages are calculated over the {} total responses._",
        total
    ));
    lines.push(
        "_Tables show frequency distributions. Missing/No answer responses are included in totals._"
            .to_string(),
    );
    lines.push(String::new());
    lines.push(format!("**Generated from**: `{}`", source_name));
    lines.push(String::new());
    debug!("build_report: {} lines", lines.len());
    Ok(lines.join("\n"))
}

/// Writes the report, replacing any previous version only once it is complete.
pub fn write_report(path: &Path, report: &str) -> SurveyResult<()> {
    io_common::write_text_file(path, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::tests::*;

    fn row(label: &str, count: u64, percent: f64) -> FrequencyRow {
        FrequencyRow {
            label: ResponseLabel::Value(label.to_string()),
            count,
            percent,
        }
    }

    #[test]
    fn frequency_table_format() {
        let lines = frequency_table_lines(&[
            row("Very helpful", 2, 50.0),
            row("A | B", 1, 25.0),
            FrequencyRow {
                label: ResponseLabel::Missing,
                count: 1,
                percent: 25.0,
            },
        ]);
        assert_eq!(
            lines,
            vec![
                "| Response | Count | Percent |",
                "| --- | ---: | ---: |",
                "| Very helpful | 2 | 50.0% |",
                "| A \\| B | 1 | 25.0% |",
                "| Missing/No answer | 1 | 25.0% |",
            ]
        );
    }

    #[test]
    fn yes_no_pivot_has_share_of_yes() {
        let breakdown = ScaleBreakdown {
            question: RISK_Q.to_string(),
            scale: Scale::YesNoMaybe,
            counts: vec![2, 1, 0],
            unrecognized: 0,
            valid: 3,
        };
        let lines = scale_pivot_lines("Risk", &[("Loss of skills".to_string(), breakdown)], Scale::YesNoMaybe);
        assert_eq!(lines[0], "| Risk | Yes | No | Maybe | n | % Yes |");
        assert_eq!(lines[1], "| --- | ---: | ---: | ---: | ---: | ---: |");
        assert_eq!(lines[2], "| Loss of skills | 2 | 1 | 0 | 3 | 66.7% |");
    }

    #[test]
    fn labels_are_cut() {
        assert_eq!(cut_label("abcdef", 3), "abc...");
        assert_eq!(cut_label("abc", 3), "abc");
        let lines = console_lines(&[row("ChatGPT", 3, 75.0)]);
        assert_eq!(lines, vec!["  1. ChatGPT: 3 (75.0%)"]);
    }

    #[test]
    fn report_sections() {
        init();
        let table = sample_merged();
        let report =
            build_report(&table, &BucketRules::default(), "merged_survey_data.xlsx").unwrap();
        assert!(report.starts_with("# Descriptive Statistics\n"));
        assert!(report.contains("- **Total responses**: 4\n"));
        assert!(report.contains("- **Survey 1 (respostas)**: 2 (50.0%)\n"));
        assert!(report.contains("- **Survey 2 (Udemy)**: 2 (50.0%)\n"));
        // All the columns but the source.
        assert!(report.contains("- **Total questions**: 5\n"));
        assert!(report.contains("### What is your role in the Scrum team\n"));
        assert!(report.contains("| Developer | 2 | 50.0% |"));
        assert!(report.contains("| Missing/No answer | 1 | 25.0% |"));
        assert!(report.contains("### Which AI chat assistants do you use\n"));
        assert!(report.contains("| Developers | 0 | 1 | 0 | 2 | 0 | 3 |"));
        assert!(report.contains("| Loss of skills | 2 | 1 | 1 | 4 | 50.0% |"));
        assert!(report.contains("_All percentages are calculated over the 4 total responses._"));
        assert!(report.ends_with("**Generated from**: `merged_survey_data.xlsx`\n"));
    }

    #[test]
    fn benefits_count_lowercase_answers() {
        let q = "To what extent do you agree with these benefits? [Faster refinement]";
        let mut b = survey_stats::builder::TableBuilder::new(&[q]);
        for answer in ["Strongly agree", "Strongly agree", "Agree", "Strongly disagree"] {
            b.add_text_row(&[Some(answer)]).unwrap();
        }
        let report = build_report(&b.build(), &BucketRules::default(), "x.xlsx").unwrap();
        assert!(report.contains("| Faster refinement | 1 | 0 | 0 | 1 | 2 | 4 |"));
    }

    #[test]
    fn empty_selections_are_skipped() {
        init();
        let table = sample_export(&[[None, Some("Developer"), None, None, None]]);
        let report = build_report(&table, &BucketRules::default(), "x.xlsx").unwrap();
        assert!(!report.contains("| Statement |"));
        assert!(report.contains("## Perceived Benefits\n\n## Perceived Risks"));
    }
}
