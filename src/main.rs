mod args;
mod survey;

use std::path::Path;

use clap::Parser;
use log::{info, warn};
use snafu::ErrorCompat;

use crate::args::{Args, Command};
use crate::survey::config_reader::{read_config, Settings};
use crate::survey::{run_job, Job, SurveyResult};

fn jobs_for(command: Option<Command>) -> Vec<Job> {
    match command {
        Some(Command::Merge) => vec![Job::Merge],
        Some(Command::Frequencies) => vec![Job::Frequencies],
        Some(Command::Report) => vec![Job::Report],
        Some(Command::Charts) => vec![Job::Charts],
        Some(Command::Summary) => vec![Job::Summary],
        Some(Command::All) | None => Job::ALL.to_vec(),
    }
}

fn run(args: &Args) -> SurveyResult<()> {
    let settings = match &args.config {
        Some(p) => read_config(p)?,
        None => Settings::default(),
    };
    info!("settings: {:?}", settings);
    let reference = args.reference.as_deref().map(Path::new);
    for job in jobs_for(args.command) {
        run_job(job, &settings, reference)?;
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    if args.verbose {
        env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }

    if let Err(e) = run(&args) {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured {}", e);
        for cause in ErrorCompat::iter_chain(&e).skip(1) {
            eprintln!("  caused by: {}", cause);
        }
        std::process::exit(1);
    }
}
