use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationState {
    pub schema_version: u32,
    /// Index of the resume to use on the next run.
    pub next_index: usize,
    pub last_resume: Option<String>,
    pub last_resume_sha256: Option<String>,
    pub last_run_epoch_secs: u64,
}

impl Default for RotationState {
    fn default() -> Self {
        Self {
            schema_version: 1,
            next_index: 0,
            last_resume: None,
            last_resume_sha256: None,
            last_run_epoch_secs: 0,
        }
    }
}

pub fn load(state_file: &Path) -> Result<RotationState> {
    if !state_file.exists() {
        return Ok(RotationState::default());
    }

    let raw = fs::read_to_string(state_file)
        .with_context(|| format!("failed to read {}", state_file.display()))?;
    let parsed: RotationState = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", state_file.display()))?;
    Ok(parsed)
}

pub fn save(state_file: &Path, state: &RotationState) -> Result<()> {
    if let Some(parent) = state_file.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let data = serde_json::to_string_pretty(state)?;
    fs::write(state_file, format!("{data}\n"))
        .with_context(|| format!("failed to write {}", state_file.display()))?;
    Ok(())
}

/// Pick the next resume in rotation order and advance the index. The index
/// wraps, so removing files from the configured list never panics.
pub fn advance(files: &[String], state: &mut RotationState) -> Result<PathBuf> {
    if files.is_empty() {
        anyhow::bail!("no resume files configured; set [resumes] files or RCYCLER_RESUME_FILES");
    }
    let index = state.next_index % files.len();
    let resume = PathBuf::from(&files[index]);
    state.next_index = (index + 1) % files.len();
    state.last_resume = Some(resume.display().to_string());
    Ok(resume)
}

pub fn file_hash(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}
