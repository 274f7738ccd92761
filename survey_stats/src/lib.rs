mod config;
use log::{debug, info};

use std::collections::HashMap;

pub mod builder;
pub mod classifier;
pub mod manual;

pub use crate::config::*;

/// Concatenates tables row-wise and tags every row with its origin.
///
/// The rows of the first table come first, in their original order, then the rows
/// of the second one, and so on. The columns are the union of all the columns, in
/// order of first appearance, with the source column last. A table that lacks a
/// column gets missing answers for it: the columns are not validated.
///
/// Arguments:
/// * `sources` pairs of (source tag, table)
pub fn merge_tables(sources: &[(&str, &ResponseTable)]) -> Result<ResponseTable, StatsError> {
    if sources.is_empty() {
        return Err(StatsError::NothingToMerge);
    }
    let mut columns: Vec<String> = Vec::new();
    for (_, table) in sources.iter() {
        for c in table.columns() {
            if c != SOURCE_COLUMN && !columns.contains(c) {
                columns.push(c.clone());
            }
        }
    }
    columns.push(SOURCE_COLUMN.to_string());

    let mut rows: Vec<Vec<Answer>> = Vec::new();
    for (tag, table) in sources.iter() {
        info!(
            "merge_tables: source {:?}: {} rows x {} columns",
            tag,
            table.num_rows(),
            table.num_columns()
        );
        // Position of each merged column in this table.
        let mapping: Vec<Option<usize>> = columns
            .iter()
            .map(|c| {
                if c == SOURCE_COLUMN {
                    None
                } else {
                    table.column_index(c)
                }
            })
            .collect();
        for row_idx in 0..table.num_rows() {
            let mut row: Vec<Answer> = mapping
                .iter()
                .map(|m| match m {
                    Some(col_idx) => table.get(row_idx, *col_idx).clone(),
                    None => Answer::Missing,
                })
                .collect();
            if let Some(last) = row.last_mut() {
                *last = Answer::Text(tag.to_string());
            }
            rows.push(row);
        }
    }
    info!(
        "merge_tables: merged {} rows x {} columns",
        rows.len(),
        columns.len()
    );
    Ok(ResponseTable { columns, rows })
}

/// Counts the distinct labels, by decreasing count. Equal counts are ordered by label.
fn value_counts(values: &[&Answer]) -> Vec<(String, u64)> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for label in values.iter().filter_map(|a| a.label()) {
        *counts.entry(label).or_insert(0) += 1;
    }
    let mut res: Vec<(String, u64)> = counts.into_iter().collect();
    res.sort_by(|(l1, c1), (l2, c2)| c2.cmp(c1).then_with(|| l1.cmp(l2)));
    res
}

fn percent_of(count: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        (count as f64) * 100.0 / (denominator as f64)
    }
}

/// Computes the frequency table of a question.
///
/// Arguments:
/// * `table` the responses
/// * `question` the full text of the column to summarize
/// * `mode` the denominator of the percentages. With `TotalRows`, the missing answers
/// are reported in a final `Missing/No answer` row. With `ValidOnly`, they are ignored.
/// * `top_n` if provided and if there are more distinct answers than that, only the
/// `top_n` most frequent answers are kept and the rest is aggregated in an `Others` row.
///
/// The answers are ordered by decreasing count, and by label for equal counts.
pub fn summarize(
    table: &ResponseTable,
    question: &str,
    mode: DenominatorMode,
    top_n: Option<usize>,
) -> Result<Frequencies, StatsError> {
    let values = table.column_values(question)?;
    let num_missing = values.iter().filter(|a| a.is_missing()).count() as u64;
    let num_valid = values.len() as u64 - num_missing;
    let denominator = match mode {
        DenominatorMode::TotalRows => values.len() as u64,
        DenominatorMode::ValidOnly => num_valid,
    };

    let counts = value_counts(&values);
    let distinct_values = counts.len();
    debug!(
        "summarize: {:?}: {} distinct values, {} missing, denominator {}",
        question, distinct_values, num_missing, denominator
    );

    let mut rows: Vec<FrequencyRow> = counts
        .into_iter()
        .map(|(label, count)| FrequencyRow {
            label: ResponseLabel::Value(label),
            count,
            percent: percent_of(count, denominator),
        })
        .collect();

    if let Some(n) = top_n {
        if rows.len() > n {
            let rest = rows.split_off(n);
            rows.push(FrequencyRow {
                label: ResponseLabel::Others,
                count: rest.iter().map(|r| r.count).sum(),
                percent: rest.iter().map(|r| r.percent).sum(),
            });
        }
    }

    if mode == DenominatorMode::TotalRows && num_missing > 0 {
        rows.push(FrequencyRow {
            label: ResponseLabel::Missing,
            count: num_missing,
            percent: percent_of(num_missing, denominator),
        });
    }

    Ok(Frequencies {
        question: question.to_string(),
        mode,
        denominator,
        distinct_values,
        rows,
    })
}

/// Computes the frequency table of a question answered on an ordinal scale.
///
/// The answers follow the canonical order of the scale instead of the counts.
pub fn summarize_on_scale(
    table: &ResponseTable,
    question: &str,
    mode: DenominatorMode,
    scale: Scale,
) -> Result<Frequencies, StatsError> {
    Ok(summarize(table, question, mode, None)?.ordered_by_scale(scale))
}

impl Frequencies {
    /// Reorders the answers along a scale.
    ///
    /// The categories of the scale come first, in canonical order. Answers that are not
    /// part of the scale follow, in their current order. The `Others` and missing rows
    /// stay at the end.
    pub fn ordered_by_scale(&self, scale: Scale) -> Frequencies {
        let mut values: Vec<FrequencyRow> = self.value_rows().cloned().collect();
        // Stable sort: the unrecognized answers keep their relative order.
        values.sort_by_key(|r| match &r.label {
            ResponseLabel::Value(s) => scale.position(s).unwrap_or(usize::MAX),
            _ => usize::MAX,
        });
        let tail = self
            .rows
            .iter()
            .filter(|r| !matches!(r.label, ResponseLabel::Value(_)))
            .cloned();
        values.extend(tail);
        Frequencies {
            rows: values,
            ..self.clone()
        }
    }
}

impl Scale {
    /// Finds the scale sharing the most categories with the given answers.
    ///
    /// Returns None if no answer belongs to any scale. When two scales match the same
    /// number of answers, the first one in `Scale::ALL` wins.
    pub fn detect<S: AsRef<str>>(labels: &[S]) -> Option<Scale> {
        let mut best: Option<(Scale, usize)> = None;
        for scale in Scale::ALL {
            let matched = labels
                .iter()
                .filter(|l| scale.position(l.as_ref()).is_some())
                .count();
            match best {
                Some((_, m)) if m >= matched => {}
                _ if matched > 0 => best = Some((scale, matched)),
                _ => {}
            }
        }
        best.map(|(scale, _)| scale)
    }
}

/// Projects the answers of a question on the categories of a scale.
///
/// Categories without any answer count zero. The aliases of a category are counted
/// with it. `valid` is the number of rows with an answer, including the answers
/// outside of the scale.
pub fn scale_breakdown(
    table: &ResponseTable,
    question: &str,
    scale: Scale,
) -> Result<ScaleBreakdown, StatsError> {
    let values = table.column_values(question)?;
    let mut counts: Vec<u64> = vec![0; scale.labels().len()];
    let mut unrecognized: u64 = 0;
    let mut valid: u64 = 0;
    for label in values.iter().filter_map(|a| a.label()) {
        valid += 1;
        match scale.position_or_alias(&label) {
            Some(idx) => counts[idx] += 1,
            None => unrecognized += 1,
        }
    }
    Ok(ScaleBreakdown {
        question: question.to_string(),
        scale,
        counts,
        unrecognized,
        valid,
    })
}

/// The fraction (between 0 and 1) of rows that answered the question.
pub fn response_rate(table: &ResponseTable, question: &str) -> Result<f64, StatsError> {
    let values = table.column_values(question)?;
    if values.is_empty() {
        return Ok(0.0);
    }
    let answered = values.iter().filter(|a| !a.is_missing()).count();
    Ok(answered as f64 / values.len() as f64)
}

/// Counts the answers of a question in order of first appearance, skipping the
/// missing answers. Used for the source tags, which have no natural order.
pub fn first_seen_counts(
    table: &ResponseTable,
    question: &str,
) -> Result<Vec<(String, u64)>, StatsError> {
    let values = table.column_values(question)?;
    let mut res: Vec<(String, u64)> = Vec::new();
    for label in values.iter().filter_map(|a| a.label()) {
        match res.iter_mut().find(|(l, _)| *l == label) {
            Some((_, count)) => *count += 1,
            None => res.push((label, 1)),
        }
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::builder::TableBuilder;
    use super::*;

    const HELPFUL: &str = "Helpfulness";

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn single_column(question: &str, values: &[Option<&str>]) -> ResponseTable {
        let mut b = TableBuilder::new(&[question]);
        for v in values {
            b.add_text_row(&[*v]).unwrap();
        }
        b.build()
    }

    fn labels(f: &Frequencies) -> Vec<String> {
        f.rows.iter().map(|r| r.label.to_string()).collect()
    }

    fn helpfulness_table() -> ResponseTable {
        single_column(
            HELPFUL,
            &[
                Some("Very helpful"),
                Some("Very helpful"),
                Some("Slightly helpful"),
                None,
            ],
        )
    }

    #[test]
    fn helpfulness_total_rows() {
        init();
        let f = summarize(&helpfulness_table(), HELPFUL, DenominatorMode::TotalRows, None).unwrap();
        let got: Vec<(String, u64, String)> = f
            .rows
            .iter()
            .map(|r| (r.label.to_string(), r.count, r.percent_display()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("Very helpful".to_string(), 2, "50.0%".to_string()),
                ("Slightly helpful".to_string(), 1, "25.0%".to_string()),
                ("Missing/No answer".to_string(), 1, "25.0%".to_string()),
            ]
        );
        assert_eq!(f.total_count(), 4);
    }

    #[test]
    fn helpfulness_on_scale() {
        init();
        let f = summarize_on_scale(
            &helpfulness_table(),
            HELPFUL,
            DenominatorMode::TotalRows,
            Scale::Helpfulness,
        )
        .unwrap();
        assert_eq!(
            labels(&f),
            vec!["Slightly helpful", "Very helpful", "Missing/No answer"]
        );
        assert_eq!(f.rows[1].count, 2);
        assert_eq!(f.rows[1].percent_display(), "50.0%");
    }

    #[test]
    fn valid_only_drops_missing() {
        let f = summarize(&helpfulness_table(), HELPFUL, DenominatorMode::ValidOnly, None).unwrap();
        assert_eq!(f.denominator, 3);
        assert_eq!(f.total_count(), 3);
        assert!(f.rows.iter().all(|r| r.label != ResponseLabel::Missing));
        assert!((f.total_percent() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn counts_sum_to_denominator() {
        let t = single_column(
            "q",
            &[Some("a"), None, Some("b"), Some("a"), None, Some(" "), Some("c")],
        );
        for mode in [DenominatorMode::TotalRows, DenominatorMode::ValidOnly] {
            for top_n in [None, Some(0), Some(1), Some(2), Some(10)] {
                let f = summarize(&t, "q", mode, top_n).unwrap();
                assert_eq!(f.total_count(), f.denominator, "{:?} {:?}", mode, top_n);
            }
        }
        let f = summarize(&t, "q", DenominatorMode::TotalRows, None).unwrap();
        assert_eq!(f.denominator, 7);
        assert_eq!(f.rows.last().unwrap().count, 3);
    }

    #[test]
    fn ties_are_broken_by_label() {
        let t = single_column("q", &[Some("b"), Some("c"), Some("a"), Some("c")]);
        let f = summarize(&t, "q", DenominatorMode::ValidOnly, None).unwrap();
        assert_eq!(labels(&f), vec!["c", "a", "b"]);
    }

    #[test]
    fn top_n_appends_others() {
        let t = single_column(
            "q",
            &[
                Some("a"),
                Some("a"),
                Some("a"),
                Some("b"),
                Some("b"),
                Some("c"),
                Some("d"),
                None,
            ],
        );
        let f = summarize(&t, "q", DenominatorMode::ValidOnly, Some(2)).unwrap();
        assert_eq!(labels(&f), vec!["a", "b", "Others"]);
        assert_eq!(f.rows[2].count, 2);
        assert_eq!(f.distinct_values, 4);
        assert_eq!(f.total_count(), 7);
        assert!((f.total_percent() - 100.0).abs() < 1e-9);

        // Within bounds: no truncation.
        let f = summarize(&t, "q", DenominatorMode::TotalRows, Some(4)).unwrap();
        assert_eq!(labels(&f), vec!["a", "b", "c", "d", "Missing/No answer"]);
    }

    #[test]
    fn scale_order_ignores_input_order_and_counts() {
        let t = single_column(
            "q",
            &[
                Some("Agree"),
                Some("Whatever"),
                Some("Strongly Agree"),
                Some("Agree"),
                Some("Disagree"),
                Some("Strongly Agree"),
                Some("Strongly Agree"),
            ],
        );
        let f = summarize_on_scale(&t, "q", DenominatorMode::ValidOnly, Scale::Agreement).unwrap();
        assert_eq!(
            labels(&f),
            vec!["Disagree", "Agree", "Strongly Agree", "Whatever"]
        );
        assert_eq!(f.total_count(), 7);
    }

    #[test]
    fn detect_scale() {
        assert_eq!(
            Scale::detect(&["Often", "Never", "Maybe"]),
            Some(Scale::Frequency)
        );
        assert_eq!(Scale::detect(&["Yes", "No"]), Some(Scale::YesNoMaybe));
        assert_eq!(Scale::detect(&["ChatGPT"]), None);
        let empty: Vec<String> = vec![];
        assert_eq!(Scale::detect(&empty), None);
    }

    #[test]
    fn breakdown_defaults_to_zero() {
        let t = single_column(
            "risk",
            &[Some("Yes"), Some("Yes"), Some("Maybe"), Some("Dunno"), None],
        );
        let b = scale_breakdown(&t, "risk", Scale::YesNoMaybe).unwrap();
        assert_eq!(b.counts, vec![2, 0, 1]);
        assert_eq!(b.count_of("No"), 0);
        assert_eq!(b.count_of("Yes"), 2);
        assert_eq!(b.unrecognized, 1);
        assert_eq!(b.valid, 4);
    }

    #[test]
    fn breakdown_counts_aliases() {
        let t = single_column(
            "benefit",
            &[
                Some("Strongly agree"),
                Some("Strongly agree"),
                Some("Agree"),
                Some("Strongly disagree"),
            ],
        );
        let b = scale_breakdown(&t, "benefit", Scale::Agreement).unwrap();
        assert_eq!(b.counts, vec![1, 0, 0, 1, 2]);
        assert_eq!(b.unrecognized, 0);
        assert_eq!(b.valid, 4);
        // Ordering stays on the exact labels.
        assert_eq!(Scale::Agreement.position("Strongly agree"), None);
        assert_eq!(Scale::Frequency.position_or_alias("never"), None);
    }

    #[test]
    fn unknown_column() {
        let t = helpfulness_table();
        assert_eq!(
            summarize(&t, "nope", DenominatorMode::TotalRows, None),
            Err(StatsError::UnknownColumn("nope".to_string()))
        );
    }

    #[test]
    fn empty_column_is_not_an_error() {
        let t = single_column("q", &[None, None]);
        let f = summarize(&t, "q", DenominatorMode::ValidOnly, Some(3)).unwrap();
        assert!(f.rows.is_empty());
        assert_eq!(f.denominator, 0);
        assert_eq!(response_rate(&t, "q").unwrap(), 0.0);
    }

    #[test]
    fn numbers_are_counted_by_label() {
        let mut b = TableBuilder::new(&["team size"]);
        b.add_row(vec![Answer::Number(5.0)]).unwrap();
        b.add_row(vec![Answer::text("5")]).unwrap();
        b.add_row(vec![Answer::Number(2.5)]).unwrap();
        let f = summarize(&b.build(), "team size", DenominatorMode::ValidOnly, None).unwrap();
        assert_eq!(labels(&f), vec!["5", "2.5"]);
    }

    #[test]
    fn merge_preserves_order_and_tags() {
        init();
        let mut a = TableBuilder::new(&["q1", "q2"]);
        a.add_text_row(&[Some("a1"), Some("x")]).unwrap();
        a.add_text_row(&[Some("a2"), None]).unwrap();
        let mut b = TableBuilder::new(&["q1", "q3"]);
        b.add_text_row(&[Some("b1"), Some("z")]).unwrap();
        let (a, b) = (a.build(), b.build());

        let m = merge_tables(&[("A", &a), ("B", &b)]).unwrap();
        assert_eq!(m.num_rows(), 3);
        assert_eq!(m.columns(), &["q1", "q2", "q3", SOURCE_COLUMN]);
        let tags: Vec<String> = m
            .column_values(SOURCE_COLUMN)
            .unwrap()
            .iter()
            .map(|a| a.label().unwrap())
            .collect();
        assert_eq!(tags, vec!["A", "A", "B"]);
        let q1: Vec<Option<String>> = m
            .column_values("q1")
            .unwrap()
            .iter()
            .map(|a| a.label())
            .collect();
        assert_eq!(
            q1,
            vec![
                Some("a1".to_string()),
                Some("a2".to_string()),
                Some("b1".to_string())
            ]
        );
        // Columns absent from a source are missing there.
        assert!(m.get(2, 1).is_missing());
        assert!(m.get(0, 2).is_missing());
        assert_eq!(m.get(2, 2), &Answer::Text("z".to_string()));
    }

    #[test]
    fn first_seen_order() {
        let t = single_column("source", &[Some("S2"), Some("S1"), None, Some("S1")]);
        assert_eq!(
            first_seen_counts(&t, "source").unwrap(),
            vec![("S2".to_string(), 1), ("S1".to_string(), 2)]
        );
    }

    #[test]
    fn merge_overwrites_existing_source_column() {
        let mut a = TableBuilder::new(&[SOURCE_COLUMN, "q"]);
        a.add_text_row(&[Some("old"), Some("v")]).unwrap();
        let a = a.build();
        let m = merge_tables(&[("new", &a)]).unwrap();
        assert_eq!(m.columns(), &["q", SOURCE_COLUMN]);
        assert_eq!(m.get(0, 1), &Answer::Text("new".to_string()));
        assert_eq!(merge_tables(&[]), Err(StatsError::NothingToMerge));
    }
}
