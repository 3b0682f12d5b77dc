use crate::cli::ArchiveArgs;
use crate::commands::CommandReport;
use crate::cycler::archive::{ArchiveOptions, ArchiveOutcome, archive_log_file};
use crate::cycler::config::load_config;
use crate::cycler::paths::resolve_paths;
use crate::cycler::warn::{self, WarnEvent};
use anyhow::Result;
use chrono::Local;
use std::path::PathBuf;

/// Fold an archival outcome into the report and surface the non-fatal
/// per-entry anomalies on the warning channel.
pub fn note_archive_outcome(report: &mut CommandReport, outcome: &ArchiveOutcome) {
    report.detail(format!("archive={}", outcome.archive_path.display()));
    report.detail(format!("run_number={}", outcome.run_number));
    report.detail(format!("entries_total={}", outcome.entries_total));
    if !outcome.excluded.is_empty() {
        report.detail(format!("entries_dropped={}", outcome.excluded.len()));
    }
    if outcome.unnumbered_kept > 0 {
        report.detail(format!("entries_unnumbered={}", outcome.unnumbered_kept));
    }

    let archive_str = outcome.archive_path.display().to_string();
    for excluded in &outcome.excluded {
        warn::emit(WarnEvent {
            code: "ENTRY_EXCLUDED",
            stage: "retention",
            archive: &archive_str,
            entry: &format!(
                "position={} run={}",
                excluded.position,
                excluded
                    .run_number
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "?".to_string())
            ),
            reason: &excluded.reason.to_string(),
        });
    }
    if outcome.unnumbered_kept > 0 {
        warn::emit(WarnEvent {
            code: "FOOTER_UNPARSED",
            stage: "numbering",
            archive: &archive_str,
            entry: &format!("count={}", outcome.unnumbered_kept),
            reason: "footer run number missing or malformed; excluded from numbering",
        });
    }
}

pub fn run(args: &ArchiveArgs) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config(&paths)?;
    let mut report = CommandReport::new("archive");

    let log_path = args
        .log
        .clone()
        .unwrap_or_else(|| paths.run_log_file.clone());
    let opts = ArchiveOptions {
        archive_path: args
            .archive
            .clone()
            .or_else(|| cfg.archive.archive_path.clone().map(PathBuf::from)),
        log_rotation_days: args.rotation_days.unwrap_or(cfg.archive.log_rotation_days),
        reset_counter: args.reset_counter || cfg.archive.reset_counter,
    };

    report.detail(format!("log={}", log_path.display()));
    let outcome = archive_log_file(&log_path, &opts, Local::now())?;
    note_archive_outcome(&mut report, &outcome);
    Ok(report)
}
