use log::debug;

use crate::config::*;

const MAX_LABEL_CHARS: usize = 80;

/// Derives a short display label from the full text of a question.
///
/// Checkbox-grid questions carry their item between brackets, and the item is
/// the label. For the other questions, the label is the text before the first
/// question mark or line break, cut at 80 characters.
///
/// ```
/// use survey_stats::classifier::short_label;
///
/// assert_eq!(short_label("How helpful is it? [Product Owner]"), "Product Owner");
/// assert_eq!(short_label("What is your role?\n(pick one)"), "What is your role");
/// ```
pub fn short_label(question: &str) -> String {
    if let Some(start) = question.find('[') {
        let rest = &question[start + 1..];
        if let Some(len) = rest.find(']') {
            return rest[..len].to_string();
        }
    }
    let first_part = question
        .split('?')
        .next()
        .and_then(|s| s.split('\n').next())
        .unwrap_or("")
        .trim();
    if first_part.chars().count() > MAX_LABEL_CHARS {
        let cut: String = first_part.chars().take(MAX_LABEL_CHARS).collect();
        format!("{}...", cut)
    } else {
        first_part.to_string()
    }
}

fn contains_keyword(lowered_question: &str, keyword: &str) -> bool {
    lowered_question.contains(&keyword.to_lowercase())
}

/// Returns the names of all the buckets matching the question, in the order in
/// which the buckets are declared.
///
/// The reserved columns never match any bucket.
pub fn classify(question: &str, rules: &BucketRules) -> Vec<String> {
    if rules.is_reserved(question) {
        return Vec::new();
    }
    let lowered = question.to_lowercase();
    let res: Vec<String> = rules
        .buckets
        .iter()
        .filter(|b| b.keywords.iter().any(|kw| contains_keyword(&lowered, kw)))
        .map(|b| b.name.clone())
        .collect();
    debug!("classify: {:?} -> {:?}", short_label(question), res);
    res
}

/// The columns of the table that can be analyzed, in table order.
pub fn analyzable_columns<'a>(table: &'a ResponseTable, rules: &BucketRules) -> Vec<&'a str> {
    table
        .columns()
        .iter()
        .filter(|c| !rules.is_reserved(c))
        .map(|c| c.as_str())
        .collect()
}

/// The columns of the table belonging to the given bucket, in table order.
///
/// An unknown bucket name selects nothing.
pub fn bucket_columns<'a>(
    table: &'a ResponseTable,
    rules: &BucketRules,
    bucket_name: &str,
) -> Vec<&'a str> {
    analyzable_columns(table, rules)
        .into_iter()
        .filter(|c| classify(c, rules).iter().any(|b| b == bucket_name))
        .collect()
}

impl ColumnFilter {
    pub fn matches(&self, question: &str) -> bool {
        let lowered = question.to_lowercase();
        let any_ok =
            self.any_of.is_empty() || self.any_of.iter().any(|kw| contains_keyword(&lowered, kw));
        any_ok && self.all_of.iter().all(|kw| contains_keyword(&lowered, kw))
    }

    /// Adds keywords that must all be present.
    pub fn and_all(mut self, keywords: &[&str]) -> ColumnFilter {
        self.all_of.extend(keywords.iter().map(|s| s.to_string()));
        self
    }
}

/// The non-reserved columns selected by a filter, in table order.
pub fn select_columns<'a>(
    table: &'a ResponseTable,
    rules: &BucketRules,
    filter: &ColumnFilter,
) -> Vec<&'a str> {
    analyzable_columns(table, rules)
        .into_iter()
        .filter(|c| filter.matches(c))
        .collect()
}
