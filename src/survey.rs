use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use survey_stats::*;
use text_diff::print_diff;

pub mod charts;
pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod io_excel;
pub mod io_markdown;
pub mod io_xlsx_report;
pub mod summary;

use crate::survey::config_reader::*;

#[derive(Debug, Snafu)]
pub enum SurveyError {
    #[snafu(display("Missing input file {path}"))]
    MissingInput { path: String },
    #[snafu(display("Error opening spreadsheet {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Spreadsheet {path} has no worksheet or no header row"))]
    EmptyExcel { path: String },
    #[snafu(display("Cannot find worksheet {worksheet:?} in {path}"))]
    MissingWorksheet { path: String, worksheet: String },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing line {lineno} of CSV file {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Unsupported input format for {path} (expected .xlsx or .csv)"))]
    UnsupportedFormat { path: String },
    #[snafu(display("Error opening configuration {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing configuration {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Invalid configuration: {message}"))]
    InvalidConfig { message: String },
    #[snafu(display("Error writing spreadsheet {path}"))]
    WritingExcel {
        source: rust_xlsxwriter::XlsxError,
        path: String,
    },
    #[snafu(display("Error drawing chart {path}: {message}"))]
    DrawingChart { path: String, message: String },
    #[snafu(display("Error reading {path}"))]
    ReadingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error while computing the statistics"))]
    Stats { source: survey_stats::StatsError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SurveyResult<T> = Result<T, SurveyError>;

/// The batch jobs. Each of them can run on its own once the merged file exists.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Job {
    Merge,
    Frequencies,
    Report,
    Charts,
    Summary,
}

impl Job {
    pub const ALL: [Job; 5] = [
        Job::Merge,
        Job::Frequencies,
        Job::Report,
        Job::Charts,
        Job::Summary,
    ];
}

/// Reads all the sources, merges them and writes the merged spreadsheet.
pub fn run_merge(settings: &Settings) -> SurveyResult<ResponseTable> {
    if settings.sources.is_empty() {
        whatever!("No survey source is configured");
    }
    let mut tables: Vec<(String, ResponseTable)> = Vec::new();
    for src in settings.sources.iter() {
        info!("Attempting to read survey export {:?}", src.path);
        let table = io_common::read_table(&src.path, src.worksheet.as_deref())?;
        println!(
            "Dataset {:?} shape: ({}, {})",
            src.label,
            table.num_rows(),
            table.num_columns()
        );
        tables.push((src.label.clone(), table));
    }
    let refs: Vec<(&str, &ResponseTable)> = tables.iter().map(|(l, t)| (l.as_str(), t)).collect();
    let merged = merge_tables(&refs).context(StatsSnafu {})?;
    println!(
        "Merged dataset shape: ({}, {})",
        merged.num_rows(),
        merged.num_columns()
    );
    for (label, table) in tables.iter() {
        println!("Responses from {}: {}", label, table.num_rows());
    }

    io_excel::write_excel_table(&merged, &settings.merged_file)?;
    println!("Merged dataset saved to: {}", settings.merged_file.display());
    Ok(merged)
}

/// Loads the merged spreadsheet. It is never recomputed on the fly: run the merge first.
pub fn load_merged(settings: &Settings) -> SurveyResult<ResponseTable> {
    let p = &settings.merged_file;
    if !p.is_file() {
        warn!("The merged file {:?} does not exist, run the merge job first", p);
        return MissingInputSnafu {
            path: p.display().to_string(),
        }
        .fail();
    }
    let table = io_excel::read_excel_table(p, None)?;
    info!(
        "Loaded merged dataset: {} rows x {} columns",
        table.num_rows(),
        table.num_columns()
    );
    Ok(table)
}

pub fn run_frequencies(settings: &Settings) -> SurveyResult<()> {
    let table = load_merged(settings)?;
    io_xlsx_report::write_frequency_workbook(&table, &settings.rules, &settings.frequency_file)?;
    println!(
        "Frequency analysis saved to: {}",
        settings.frequency_file.display()
    );
    Ok(())
}

/// Writes the Markdown report. If a reference report is given, the generated report
/// must be identical to it.
pub fn run_report(settings: &Settings, reference: Option<&Path>) -> SurveyResult<()> {
    let table = load_merged(settings)?;
    let source_name = io_common::simplify_file_name(&settings.merged_file);
    let report = io_markdown::build_report(&table, &settings.rules, &source_name)?;
    io_markdown::write_report(&settings.report_file, &report)?;
    println!(
        "Saved descriptive statistics to {}",
        settings.report_file.display()
    );
    println!("  Total responses analyzed: {}", table.num_rows());

    if let Some(ref_path) = reference {
        let expected = fs::read_to_string(ref_path).context(ReadingFileSnafu {
            path: ref_path.display().to_string(),
        })?;
        if expected != report {
            warn!("Found differences with the reference report");
            print_diff(expected.as_str(), report.as_str(), "\n");
            whatever!("Difference detected between the generated report and the reference report")
        }
    }
    Ok(())
}

pub fn run_charts(settings: &Settings) -> SurveyResult<Vec<PathBuf>> {
    let table = load_merged(settings)?;
    println!("Creating visualizations for {} responses...", table.num_rows());
    let plans = charts::plan_all_charts(&table, &settings.rules, settings.chart_top_n)?;
    let mut written: Vec<PathBuf> = Vec::new();
    for plan in plans.iter() {
        let p = charts::render_chart(plan, &settings.plots_dir)?;
        println!("Saved: {} {}", io_common::simplify_file_name(&p), plan.subtitle);
        written.push(p);
    }
    println!(
        "{} charts created in {}",
        written.len(),
        settings.plots_dir.display()
    );
    Ok(written)
}

pub fn run_summary(settings: &Settings) -> SurveyResult<()> {
    let table = load_merged(settings)?;
    let now = chrono::Local::now().naive_local();
    for line in summary::build_summary(&table, settings, now)? {
        println!("{}", line);
    }
    Ok(())
}

pub fn run_job(job: Job, settings: &Settings, reference: Option<&Path>) -> SurveyResult<()> {
    info!("Running job {:?}", job);
    match job {
        Job::Merge => run_merge(settings).map(|_| ()),
        Job::Frequencies => run_frequencies(settings),
        Job::Report => run_report(settings, reference),
        Job::Charts => run_charts(settings).map(|_| ()),
        Job::Summary => run_summary(settings),
    }
}
