use crate::commands::CommandReport;
use crate::cycler::config::load_config;
use crate::cycler::driver::pilot_available;
use crate::cycler::entry::split_entries;
use crate::cycler::paths::resolve_paths;
use anyhow::Result;
use std::env;
use std::fs;

include!(concat!(env!("OUT_DIR"), "/cycler_env_allowlist.rs"));

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("status");

    report.detail(format!("build_id={}", env!("BUILD_UUID")));
    report.detail(format!("cycler_home={}", paths.cycler_home.display()));
    report.detail(format!("logs_dir={}", paths.logs_dir.display()));
    report.detail(format!("run_log={}", paths.run_log_file.display()));
    report.detail(format!("state_file={}", paths.state_file.display()));
    report.detail(format!("config_file={}", paths.config_file.display()));

    match load_config(&paths) {
        Ok(cfg) => {
            report.detail(format!("login_page={}", cfg.portal.login_page));
            report.detail(format!("profile_page={}", cfg.portal.profile_page));
            report.detail(format!("resume_files={}", cfg.resumes.files.len()));
            report.detail(format!(
                "log_rotation_days={} reset_counter={}",
                cfg.archive.log_rotation_days, cfg.archive.reset_counter
            ));
            if cfg.resumes.files.is_empty() {
                report.issue(
                    "no resume files configured; runs will fail until [resumes] files or RCYCLER_RESUME_FILES is set",
                );
            }
            for file in &cfg.resumes.files {
                if !std::path::Path::new(file).is_file() {
                    report.issue(format!("configured resume missing: {file}"));
                }
            }

            let archive_path = match cfg.archive.archive_path {
                Some(configured) => std::path::PathBuf::from(configured),
                None => crate::cycler::archive::default_archive_path(&paths.run_log_file)?,
            };
            if archive_path.exists() {
                let raw = fs::read_to_string(&archive_path)?;
                report.detail(format!(
                    "archive={} entries={}",
                    archive_path.display(),
                    split_entries(&raw).len()
                ));
            } else {
                report.detail(format!(
                    "archive={} (not created yet)",
                    archive_path.display()
                ));
            }
        }
        Err(err) => report.issue(format!("config invalid: {err:#}")),
    }

    if !pilot_available() {
        report.issue("portal-pilot helper not found (set RCYCLER_PILOT_BIN or add it to PATH)");
    }
    for var in ["PORTAL_USERNAME", "PORTAL_PASSWORD"] {
        if env::var(var).map(|v| v.trim().is_empty()).unwrap_or(true) {
            report.issue(format!("{var} is not set"));
        }
    }

    let mut overrides = Vec::new();
    for key in GENERATED_CYCLER_ENV_ALLOWLIST {
        if env::var_os(key).is_some() {
            overrides.push(*key);
        }
    }
    if overrides.is_empty() {
        report.detail("env_overrides=none");
    } else {
        report.detail(format!("env_overrides={}", overrides.join(",")));
    }

    Ok(report)
}
