// Primitives for reading CSV exports.

use csv::ReaderBuilder;
use survey_stats::builder::TableBuilder;

use crate::survey::*;

/// Reads a response table from a CSV file with the questions in the first line.
///
/// All the cells are read as text. Lines may have fewer fields than the header: the
/// missing fields are missing answers.
pub fn read_csv_table(path: &Path) -> SurveyResult<ResponseTable> {
    let path_s = path.display().to_string();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu {
            path: path_s.clone(),
        })?;
    let headers = rdr.headers().context(CsvOpenSnafu {
        path: path_s.clone(),
    })?;
    let columns = io_common::header_names(headers.iter().map(|h| Answer::text(h).label()));
    debug!("read_csv_table: {:?}: columns: {:?}", path, columns);

    let mut builder = TableBuilder::with_columns(columns);
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu {
            path: path_s.clone(),
            lineno,
        })?;
        let answers: Vec<Answer> = line.iter().map(Answer::text).collect();
        if answers.iter().all(|a| a.is_missing()) {
            debug!("read_csv_table: skipping empty line {}", lineno);
            continue;
        }
        builder.add_row(answers).context(StatsSnafu {})?;
    }
    let table = builder.build();
    info!(
        "read_csv_table: {:?}: {} rows x {} columns",
        path,
        table.num_rows(),
        table.num_columns()
    );
    Ok(table)
}
