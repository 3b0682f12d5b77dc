use crate::cli::HistoryArgs;
use crate::commands::CommandReport;
use crate::cycler::archive::default_archive_path;
use crate::cycler::config::load_config;
use crate::cycler::entry::split_entries;
use crate::cycler::paths::resolve_paths;
use crate::cycler::util::truncate_with_ellipsis;
use anyhow::Result;
use std::fs;
use std::path::PathBuf;

const SNIPPET_CHARS: usize = 72;

fn snippet(text: &str) -> String {
    let first = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default();
    truncate_with_ellipsis(first, SNIPPET_CHARS)
}

pub fn run(args: &HistoryArgs) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config(&paths)?;
    let mut report = CommandReport::new("history");

    let archive_path = match &args.archive {
        Some(path) => path.clone(),
        None => match cfg.archive.archive_path {
            Some(configured) => PathBuf::from(configured),
            None => default_archive_path(&paths.run_log_file)?,
        },
    };
    report.detail(format!("archive={}", archive_path.display()));

    if !archive_path.exists() {
        report.detail("entries=0 (no archive yet)");
        return Ok(report);
    }

    let raw = fs::read_to_string(&archive_path)?;
    let entries = split_entries(&raw);
    report.detail(format!("entries={}", entries.len()));

    for entry in &entries {
        let number = entry
            .run_number
            .map(|n| n.to_string())
            .unwrap_or_else(|| "?".to_string());
        let date = entry
            .last_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        report.detail(format!(
            "#{number:<4} {date}  {:>4} lines  {}",
            entry.text.lines().count(),
            snippet(&entry.text)
        ));
    }

    Ok(report)
}
