use std::ffi::OsString;

use crate::survey::*;

pub fn simplify_file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Cuts a label to a number of characters, marking the cut with `...`.
pub fn cut_label(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}...", cut)
    } else {
        s.to_string()
    }
}

/// Column names from the labels of the header cells.
///
/// Cells without a label become `Unnamed: {idx}`. Repeated names get a numbered
/// suffix (`Role`, `Role.1`, ...) so that no column shadows another one.
pub fn header_names<I>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    let mut names: Vec<String> = Vec::new();
    for (idx, label) in labels.into_iter().enumerate() {
        let base = label.unwrap_or_else(|| format!("Unnamed: {}", idx));
        let mut name = base.clone();
        let mut suffix = 1;
        while names.contains(&name) {
            name = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        names.push(name);
    }
    names
}

/// The temporary file written next to `path` before it is renamed into place.
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name: OsString = path
        .file_name()
        .map(|s| s.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

pub fn ensure_parent_dir(path: &Path) -> SurveyResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            debug!("ensure_parent_dir: creating {:?}", parent);
            fs::create_dir_all(parent).context(WritingFileSnafu {
                path: parent.display().to_string(),
            })?;
        }
    }
    Ok(())
}

/// Moves a completely written partial file over its final location.
pub fn commit_partial(partial: &Path, path: &Path) -> SurveyResult<()> {
    fs::rename(partial, path).context(WritingFileSnafu {
        path: path.display().to_string(),
    })
}

/// Writes a text file. A failure leaves any previous version of the file untouched.
pub fn write_text_file(path: &Path, contents: &str) -> SurveyResult<()> {
    ensure_parent_dir(path)?;
    let partial = partial_path(path);
    fs::write(&partial, contents).context(WritingFileSnafu {
        path: partial.display().to_string(),
    })?;
    commit_partial(&partial, path)
}

/// Reads a survey export, choosing the reader from the file extension.
pub fn read_table(path: &Path, worksheet: Option<&str>) -> SurveyResult<ResponseTable> {
    let path_s = path.display().to_string();
    if !path.is_file() {
        return MissingInputSnafu { path: path_s }.fail();
    }
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    debug!("read_table: {:?} extension: {:?}", path, ext);
    match ext.as_str() {
        "xlsx" | "xlsm" => io_excel::read_excel_table(path, worksheet),
        "csv" => io_csv::read_csv_table(path),
        _ => UnsupportedFormatSnafu { path: path_s }.fail(),
    }
}
