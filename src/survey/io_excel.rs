// Reading and writing response tables as Excel spreadsheets.

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook};
use survey_stats::builder::TableBuilder;

use crate::survey::*;

const DATE_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

fn get_range(path: &Path, worksheet: Option<&str>) -> SurveyResult<Range<DataType>> {
    let path_s = path.display().to_string();
    debug!("get_range: path: {:?} worksheet: {:?}", path, worksheet);
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu {
        path: path_s.clone(),
    })?;

    let range_o = match worksheet {
        // A worksheet name was provided, use it.
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu {
                path: path_s.clone(),
                worksheet: name.to_string(),
            })?,
        None => {
            debug!("get_range: worksheets: {:?}", workbook.sheet_names());
            workbook
                .worksheet_range_at(0)
                .context(EmptyExcelSnafu {
                    path: path_s.clone(),
                })?
        }
    };
    range_o.context(OpeningExcelSnafu { path: path_s })
}

fn read_cell(cell: &DataType, path: &Path) -> Answer {
    match cell {
        DataType::String(s) => Answer::text(s),
        DataType::Float(f) => Answer::Number(*f),
        DataType::Int(i) => Answer::Number(*i as f64),
        DataType::Bool(b) => Answer::Bool(*b),
        DataType::DateTime(f) => Answer::DateTime(*f),
        DataType::Error(e) => {
            warn!("read_cell: {:?}: error cell {:?} read as a missing answer", path, e);
            Answer::Missing
        }
        DataType::Empty => Answer::Missing,
    }
}

/// The label of a header cell, None for an empty or an error cell.
fn header_label(cell: &DataType) -> Option<String> {
    match cell {
        DataType::String(s) => Answer::text(s).label(),
        DataType::Float(f) | DataType::DateTime(f) => Answer::Number(*f).label(),
        DataType::Int(i) => Some(i.to_string()),
        DataType::Bool(b) => Some(b.to_string()),
        DataType::Error(_) | DataType::Empty => None,
    }
}

/// Reads a response table from a worksheet: the first row holds the questions, each
/// following row is a response. Rows without any answer are skipped.
pub fn read_excel_table(path: &Path, worksheet: Option<&str>) -> SurveyResult<ResponseTable> {
    let wrange = get_range(path, worksheet)?;
    let mut iter = wrange.rows();
    let header = iter.next().context(EmptyExcelSnafu {
        path: path.display().to_string(),
    })?;
    let columns = io_common::header_names(header.iter().map(header_label));
    debug!("read_excel_table: {:?}: columns: {:?}", path, columns);

    let mut builder = TableBuilder::with_columns(columns);
    let mut num_skipped = 0;
    for row in iter {
        let answers: Vec<Answer> = row.iter().map(|c| read_cell(c, path)).collect();
        if answers.iter().all(|a| a.is_missing()) {
            num_skipped += 1;
            continue;
        }
        builder.add_row(answers).context(StatsSnafu {})?;
    }
    if num_skipped > 0 {
        debug!("read_excel_table: {:?}: skipped {} empty rows", path, num_skipped);
    }
    let table = builder.build();
    info!(
        "read_excel_table: {:?}: {} rows x {} columns",
        path,
        table.num_rows(),
        table.num_columns()
    );
    Ok(table)
}

/// Writes a response table to the first worksheet of a new workbook. Missing answers
/// are left as empty cells.
pub fn write_excel_table(table: &ResponseTable, path: &Path) -> SurveyResult<()> {
    let path_s = path.display().to_string();
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let date = Format::new().set_num_format(DATE_FORMAT);
    {
        let sheet = workbook.add_worksheet();
        for (col_idx, name) in table.columns().iter().enumerate() {
            sheet
                .write_string_with_format(0, col_idx as u16, name, &bold)
                .context(WritingExcelSnafu {
                    path: path_s.clone(),
                })?;
        }
        for (row_idx, row) in table.rows().enumerate() {
            let r = (row_idx + 1) as u32;
            for (col_idx, answer) in row.iter().enumerate() {
                let c = col_idx as u16;
                let res = match answer {
                    Answer::Text(s) => sheet.write_string(r, c, s).map(|_| ()),
                    Answer::Number(f) => sheet.write_number(r, c, *f).map(|_| ()),
                    Answer::Bool(b) => sheet.write_boolean(r, c, *b).map(|_| ()),
                    Answer::DateTime(f) => sheet.write_number_with_format(r, c, *f, &date).map(|_| ()),
                    Answer::Missing => Ok(()),
                };
                res.context(WritingExcelSnafu {
                    path: path_s.clone(),
                })?;
            }
        }
    }

    io_common::ensure_parent_dir(path)?;
    let partial = io_common::partial_path(path);
    workbook.save(&partial).context(WritingExcelSnafu {
        path: partial.display().to_string(),
    })?;
    io_common::commit_partial(&partial, path)?;
    info!("write_excel_table: wrote {:?}", path);
    Ok(())
}
