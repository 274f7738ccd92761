pub use crate::config::*;

/// A builder for response tables.
///
/// ```
/// use survey_stats::builder::TableBuilder;
/// use survey_stats::Answer;
/// # use survey_stats::StatsError;
///
/// let mut builder = TableBuilder::new(&["Your role?", "How often do you use AI?"]);
/// builder.add_text_row(&[Some("Developer"), None])?;
/// builder.add_row(vec![Answer::text("Scrum Master"), Answer::text("Often")])?;
///
/// let table = builder.build();
/// assert_eq!(table.num_rows(), 2);
/// # Ok::<(), StatsError>(())
/// ```
pub struct TableBuilder {
    pub(crate) _columns: Vec<String>,
    pub(crate) _rows: Vec<Vec<Answer>>,
}

impl TableBuilder {
    pub fn new(columns: &[&str]) -> TableBuilder {
        TableBuilder::with_columns(columns.iter().map(|s| s.to_string()).collect())
    }

    pub fn with_columns(columns: Vec<String>) -> TableBuilder {
        TableBuilder {
            _columns: columns,
            _rows: Vec::new(),
        }
    }

    /// Adds a row of answers, one per column.
    ///
    /// Rows shorter than the header are completed with missing answers.
    pub fn add_row(&mut self, mut answers: Vec<Answer>) -> Result<(), StatsError> {
        if answers.len() > self._columns.len() {
            return Err(StatsError::RowTooLong {
                expected: self._columns.len(),
                found: answers.len(),
            });
        }
        answers.resize(self._columns.len(), Answer::Missing);
        self._rows.push(answers);
        Ok(())
    }

    /// Adds a row of text answers. `None` and blank strings are missing answers.
    pub fn add_text_row(&mut self, answers: &[Option<&str>]) -> Result<(), StatsError> {
        self.add_row(
            answers
                .iter()
                .map(|a| a.map(Answer::text).unwrap_or(Answer::Missing))
                .collect(),
        )
    }

    pub fn build(self) -> ResponseTable {
        ResponseTable {
            columns: self._columns,
            rows: self._rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_rows_are_padded() {
        let mut b = TableBuilder::new(&["a", "b", "c"]);
        b.add_text_row(&[Some("x")]).unwrap();
        b.add_text_row(&[Some("y"), Some("  "), Some("z")]).unwrap();
        let t = b.build();
        assert_eq!(t.get(0, 2), &Answer::Missing);
        assert_eq!(t.get(1, 1), &Answer::Missing);
        assert_eq!(t.get(1, 2), &Answer::Text("z".to_string()));
    }

    #[test]
    fn long_rows_are_rejected() {
        let mut b = TableBuilder::new(&["a"]);
        let res = b.add_text_row(&[Some("x"), Some("y")]);
        assert_eq!(
            res,
            Err(StatsError::RowTooLong {
                expected: 1,
                found: 2
            })
        );
    }
}
