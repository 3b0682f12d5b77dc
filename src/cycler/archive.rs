use crate::cycler::entry::{self, Entry};
use crate::cycler::retention::{self, ExcludedEntry};
use crate::error::ArchiveError;
use chrono::{DateTime, Local};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone, Default)]
pub struct ArchiveOptions {
    /// Explicit archive file; derived from the log path when absent.
    pub archive_path: Option<PathBuf>,
    /// Retention window in days. 0 disables filtering.
    pub log_rotation_days: u32,
    /// Renumber surviving entries to 1..N before appending.
    pub reset_counter: bool,
}

#[derive(Debug, Clone)]
pub struct ArchiveOutcome {
    pub archive_path: PathBuf,
    /// Number assigned to the freshly appended entry.
    pub run_number: u64,
    /// Entries in the archive after the append, including the new one.
    pub entries_total: usize,
    /// Entries dropped by retention, with reasons.
    pub excluded: Vec<ExcludedEntry>,
    /// Surviving entries whose footer number could not be parsed; they are
    /// retained but do not participate in numbering.
    pub unnumbered_kept: usize,
}

/// Default archive location: `<stem>_archive.log` beside the active log.
pub fn default_archive_path(log_path: &Path) -> Result<PathBuf, ArchiveError> {
    let stem = log_path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            ArchiveError::PathConfig(format!(
                "cannot derive archive file from log path {}",
                log_path.display()
            ))
        })?;
    Ok(log_path.with_file_name(format!("{stem}_archive.log")))
}

fn resolve_archive_path(log_path: &Path, opts: &ArchiveOptions) -> Result<PathBuf, ArchiveError> {
    match &opts.archive_path {
        Some(path) if path.as_os_str().is_empty() => Err(ArchiveError::PathConfig(
            "archive path override is empty".to_string(),
        )),
        Some(path) => Ok(path.clone()),
        None => default_archive_path(log_path),
    }
}

fn ensure_archive_file(path: &Path) -> Result<(), ArchiveError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| ArchiveError::ArchiveWrite {
            path: path.to_path_buf(),
            source,
        })?;
    }
    fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map(|_| ())
        .map_err(|source| ArchiveError::ArchiveWrite {
            path: path.to_path_buf(),
            source,
        })
}

fn read_archive(path: &Path) -> Result<String, ArchiveError> {
    fs::read_to_string(path).map_err(|source| ArchiveError::ArchiveWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Full-buffer atomic replace: the new content is staged in a temp file in
/// the archive's directory and renamed over the old file, so a failed write
/// leaves the prior archive untouched.
fn write_archive_atomic(path: &Path, content: &str) -> Result<(), ArchiveError> {
    let io_err = |source: std::io::Error| ArchiveError::ArchiveWrite {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir).map_err(io_err)?;
    staged.write_all(content.as_bytes()).map_err(io_err)?;
    staged.flush().map_err(io_err)?;
    staged.persist(path).map_err(|err| io_err(err.error))?;
    Ok(())
}

fn render_archive(entries: &[Entry]) -> String {
    let sep = format!("\n\n{}\n\n", entry::separator());
    let mut out = entries
        .iter()
        .map(|e| e.text.as_str())
        .collect::<Vec<_>>()
        .join(&sep);
    out.push('\n');
    out
}

fn new_entry(log_text: &str, run_number: u64, now: DateTime<Local>) -> Entry {
    let mut text = log_text.to_string();
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    let stamp = now.format("%Y-%m-%d %H:%M:%S");
    text.push_str(&format!("{stamp} | RUN NO : {run_number}"));
    Entry::parse(&text)
}

/// Append one run's log output to the archive: parse the existing entries,
/// drop the ones outside the retention window, optionally renumber the
/// survivors, assign the next run number, and rewrite the file in full.
pub fn archive_run(
    log_text: &str,
    log_path: &Path,
    opts: &ArchiveOptions,
    now: DateTime<Local>,
) -> Result<ArchiveOutcome, ArchiveError> {
    let archive_path = resolve_archive_path(log_path, opts)?;
    ensure_archive_file(&archive_path)?;

    let raw = read_archive(&archive_path)?;
    let entries = entry::split_entries(&raw);

    let filtered = retention::filter_recent(entries, opts.log_rotation_days, now.date_naive());
    let mut kept = filtered.kept;
    if opts.reset_counter {
        kept = retention::renumber(kept);
    }

    let unnumbered_kept = kept.iter().filter(|e| e.run_number.is_none()).count();
    let next_number = kept
        .iter()
        .filter_map(|e| e.run_number)
        .max()
        .unwrap_or(0)
        + 1;

    kept.push(new_entry(log_text, next_number, now));
    write_archive_atomic(&archive_path, &render_archive(&kept))?;

    Ok(ArchiveOutcome {
        archive_path,
        run_number: next_number,
        entries_total: kept.len(),
        excluded: filtered.excluded,
        unnumbered_kept,
    })
}

/// Read the active log and archive its contents. Read failures map to the
/// source-read error; everything else behaves as `archive_run`.
pub fn archive_log_file(
    log_path: &Path,
    opts: &ArchiveOptions,
    now: DateTime<Local>,
) -> Result<ArchiveOutcome, ArchiveError> {
    let log_text = fs::read_to_string(log_path).map_err(|source| ArchiveError::SourceRead {
        path: log_path.to_path_buf(),
        source,
    })?;
    archive_run(&log_text, log_path, opts, now)
}
