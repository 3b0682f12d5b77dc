use std::path::PathBuf;
use thiserror::Error;

/// Fatal failures of one archival call. Per-entry parse anomalies are not
/// errors; they travel as values inside the archive outcome.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("run log unreadable at {path}: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("archive not writable at {path}: {source}")]
    ArchiveWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("archive path misconfigured: {0}")]
    PathConfig(String),
}
