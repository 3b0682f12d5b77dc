use crate::commands::{self, CommandReport};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "rcycler",
    version,
    about = "Job-portal resume rotation with append-only run-history archival"
)]
struct Cli {
    /// Render the command report as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Perform one automation run: rotate, upload, and archive the run log
    Run(RunArgs),
    /// Archive an existing run log without driving the browser helper
    Archive(ArchiveArgs),
    /// List the entries recorded in a run-history archive
    History(HistoryArgs),
    /// Report paths, configuration, and helper availability
    Status,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Skip the portal reachability preflight
    #[arg(long)]
    pub no_preflight: bool,
}

#[derive(Parser, Debug)]
pub struct ArchiveArgs {
    /// Run log to archive (defaults to the active run log)
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// Archive file override (defaults to `<log stem>_archive.log`)
    #[arg(long)]
    pub archive: Option<PathBuf>,

    /// Retention window in days; overrides the configured value
    #[arg(long, value_name = "DAYS")]
    pub rotation_days: Option<u32>,

    /// Renumber surviving entries to 1..N before appending
    #[arg(long)]
    pub reset_counter: bool,
}

#[derive(Parser, Debug)]
pub struct HistoryArgs {
    /// Archive file to list (defaults to the active log's archive)
    #[arg(long)]
    pub archive: Option<PathBuf>,
}

fn render(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        for detail in &report.details {
            println!("{detail}");
        }
        for issue in &report.issues {
            eprintln!("issue: {issue}");
        }
    }

    if !report.ok {
        anyhow::bail!("{} completed with issues", report.command);
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let report = match cli.command {
        Commands::Run(args) => commands::run::run(&args)?,
        Commands::Archive(args) => commands::archive::run(&args)?,
        Commands::History(args) => commands::history::run(&args)?,
        Commands::Status => commands::status::run()?,
    };

    render(&report, cli.json)
}
