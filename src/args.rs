use clap::{Parser, Subcommand};

/// Merges the exports of the "AI Chat Assistants in Scrum" survey and produces its
/// descriptive statistics: frequency workbook, Markdown report, charts and summary.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file with the locations of the inputs and outputs, and the
    /// topic buckets. Without it, the default locations relative to the current directory are used.
    /// See the manual in the survey_stats crate for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, optional) A reference Markdown report. If provided, the report job checks that
    /// the generated report matches the reference and prints the differences otherwise.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,

    /// The job to run (default: all of them, in order).
    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, Eq, PartialEq)]
pub enum Command {
    /// Merges the two survey exports into one spreadsheet.
    Merge,
    /// Writes the frequency tables workbook.
    Frequencies,
    /// Writes the descriptive statistics in Markdown.
    Report,
    /// Draws the bar charts.
    Charts,
    /// Prints the summary of the dataset and of the generated files.
    Summary,
    /// Runs all the jobs.
    All,
}
