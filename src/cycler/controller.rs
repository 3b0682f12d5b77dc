use crate::cycler::archive::{ArchiveOptions, ArchiveOutcome, archive_run};
use crate::cycler::config::CyclerConfig;
use crate::cycler::driver::ProfileDriver;
use crate::cycler::logger::RunLogger;
use crate::cycler::paths::CyclerPaths;
use crate::cycler::rotation;
use crate::cycler::util::now_epoch_secs;
use anyhow::{Context, Result};
use chrono::Local;
use fs2::FileExt;
use std::fs;
use std::path::PathBuf;

const RUN_LOCK_FILE: &str = "run.lock";

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub resume: PathBuf,
    pub resume_sha256: Option<String>,
    /// First driver failure, if any. Archival happens regardless.
    pub driver_error: Option<String>,
    pub archive: ArchiveOutcome,
}

fn archive_options(cfg: &CyclerConfig) -> ArchiveOptions {
    ArchiveOptions {
        archive_path: cfg.archive.archive_path.clone().map(PathBuf::from),
        log_rotation_days: cfg.archive.log_rotation_days,
        reset_counter: cfg.archive.reset_counter,
    }
}

fn drive(
    driver: &dyn ProfileDriver,
    logger: &mut RunLogger,
    resume: &std::path::Path,
) -> Result<()> {
    logger.info("logging in to the portal")?;
    driver.login()?;
    logger.info("navigating to the profile page")?;
    driver.navigate_to_profile()?;
    logger.info(&format!("uploading resume {}", resume.display()))?;
    driver.upload_file(resume)?;
    logger.info("resume upload completed")?;
    Ok(())
}

/// One automation run: lock, rotate, log, drive, and make exactly one
/// archival call with the finished log text. Driver failures are recorded
/// in the outcome; only lock, state, or archive failures error out.
pub fn run_once(
    cfg: &CyclerConfig,
    paths: &CyclerPaths,
    driver: &dyn ProfileDriver,
) -> Result<RunOutcome> {
    fs::create_dir_all(&paths.logs_dir)
        .with_context(|| format!("failed to create {}", paths.logs_dir.display()))?;

    let lock_path = paths.logs_dir.join(RUN_LOCK_FILE);
    let lock_file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .open(&lock_path)
        .with_context(|| format!("failed to open run lock {}", lock_path.display()))?;
    lock_file
        .try_lock_exclusive()
        .with_context(|| format!("another run holds the lock {}", lock_path.display()))?;

    let mut state = rotation::load(&paths.state_file)?;
    let resume = rotation::advance(&cfg.resumes.files, &mut state)?;

    let mut logger = RunLogger::create(&paths.run_log_file, cfg.archive.debug_log)?;
    logger.info("starting automation run")?;
    logger.info(&format!("selected resume {}", resume.display()))?;

    let resume_sha256 = match rotation::file_hash(&resume) {
        Ok(hash) => {
            logger.debug(&format!("resume sha256 {hash}"))?;
            Some(hash)
        }
        Err(err) => {
            logger.error(&format!("resume file unreadable: {err:#}"))?;
            None
        }
    };

    let driver_error = if resume_sha256.is_some() {
        match drive(driver, &mut logger, &resume) {
            Ok(()) => None,
            Err(err) => {
                logger.error(&format!("automation step failed: {err:#}"))?;
                Some(format!("{err:#}"))
            }
        }
    } else {
        Some(format!("resume file unreadable: {}", resume.display()))
    };

    state.last_resume_sha256 = resume_sha256.clone();
    state.last_run_epoch_secs = now_epoch_secs()?;
    rotation::save(&paths.state_file, &state)?;

    let log_text = logger.finish()?;
    let archive = archive_run(
        &log_text,
        &paths.run_log_file,
        &archive_options(cfg),
        Local::now(),
    )
    .with_context(|| {
        format!(
            "failed to archive run log {}",
            paths.run_log_file.display()
        )
    })?;

    // Lock released when lock_file drops, after the archive rewrite.
    drop(lock_file);

    Ok(RunOutcome {
        resume,
        resume_sha256,
        driver_error,
        archive,
    })
}
