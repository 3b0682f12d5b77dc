use crate::cycler::paths::CyclerPaths;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    pub login_page: String,
    pub profile_page: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            login_page: "https://www.naukri.com/nlogin/login".to_string(),
            profile_page: "https://www.naukri.com/mnjuser/profile".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResumeConfig {
    /// Resume files cycled across runs, in rotation order.
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Retention window in days for archived run entries. 0 keeps everything.
    pub log_rotation_days: u32,
    /// Renumber surviving entries to 1..N on every archival.
    pub reset_counter: bool,
    /// Explicit archive file; derived from the run log path when unset.
    pub archive_path: Option<String>,
    /// Write DEBUG lines to the run log.
    pub debug_log: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            log_rotation_days: 0,
            reset_counter: false,
            archive_path: None,
            debug_log: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Per-invocation timeout for the automation helper, in seconds.
    pub pilot_timeout_secs: u64,
    /// Retries for failed helper invocations.
    pub pilot_retries: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            pilot_timeout_secs: 180,
            pilot_retries: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CyclerConfig {
    pub portal: PortalConfig,
    pub resumes: ResumeConfig,
    pub archive: ArchiveConfig,
    pub driver: DriverConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialCyclerConfig {
    portal: Option<PortalConfig>,
    resumes: Option<ResumeConfig>,
    archive: Option<ArchiveConfig>,
    driver: Option<DriverConfig>,
}

fn env_or_u32(var: &str, fallback: u32) -> u32 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u32>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_u64(var: &str, fallback: u64) -> u64 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u64>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_bool(var: &str, fallback: bool) -> bool {
    match env::var(var) {
        Ok(v) => {
            let trimmed = v.trim();
            match trimmed {
                "1" | "true" | "TRUE" | "yes" | "on" => true,
                "0" | "false" | "FALSE" | "no" | "off" => false,
                _ => fallback,
            }
        }
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn env_or_csv_paths(var: &str, fallback: &[String]) -> Vec<String> {
    match env::var(var) {
        Ok(v) => {
            let out = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToOwned::to_owned)
                .collect::<Vec<_>>();
            if out.is_empty() {
                fallback.to_vec()
            } else {
                out
            }
        }
        Err(_) => fallback.to_vec(),
    }
}

fn env_opt_string(var: &str, fallback: Option<String>) -> Option<String> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => fallback,
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("https://") || value.starts_with("http://")
}

fn validate(cfg: &CyclerConfig) -> Result<()> {
    if !is_http_url(&cfg.portal.login_page) {
        return Err(anyhow!(
            "invalid login page: must be an http(s) URL, got `{}`",
            cfg.portal.login_page
        ));
    }
    if !is_http_url(&cfg.portal.profile_page) {
        return Err(anyhow!(
            "invalid profile page: must be an http(s) URL, got `{}`",
            cfg.portal.profile_page
        ));
    }
    if cfg.archive.log_rotation_days > 3650 {
        return Err(anyhow!(
            "invalid log rotation window: must be at most 3650 days"
        ));
    }
    if let Some(path) = &cfg.archive.archive_path
        && path.trim().is_empty()
    {
        return Err(anyhow!("invalid archive path override: cannot be empty"));
    }
    if cfg.driver.pilot_timeout_secs == 0 {
        return Err(anyhow!("invalid pilot timeout: must be >= 1 second"));
    }
    Ok(())
}

fn merge_file_config(base: &mut CyclerConfig, paths: &CyclerPaths) -> Result<()> {
    let path = &paths.config_file;
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(path)?;
    let parsed: PartialCyclerConfig = toml::from_str(&raw)
        .map_err(|err| anyhow!("failed to parse cycler config {}: {err}", path.display()))?;
    if let Some(portal) = parsed.portal {
        base.portal = portal;
    }
    if let Some(resumes) = parsed.resumes {
        base.resumes = resumes;
    }
    if let Some(archive) = parsed.archive {
        base.archive = archive;
    }
    if let Some(driver) = parsed.driver {
        base.driver = driver;
    }
    Ok(())
}

pub fn load_config(paths: &CyclerPaths) -> Result<CyclerConfig> {
    let mut cfg = CyclerConfig::default();
    merge_file_config(&mut cfg, paths)?;

    cfg.portal.login_page = env_or_string("RCYCLER_LOGIN_PAGE", &cfg.portal.login_page);
    cfg.portal.profile_page = env_or_string("RCYCLER_PROFILE_PAGE", &cfg.portal.profile_page);
    cfg.resumes.files = env_or_csv_paths("RCYCLER_RESUME_FILES", &cfg.resumes.files);
    cfg.archive.log_rotation_days =
        env_or_u32("RCYCLER_LOG_ROTATION_DAYS", cfg.archive.log_rotation_days);
    cfg.archive.reset_counter = env_or_bool("RCYCLER_RESET_COUNTER", cfg.archive.reset_counter);
    cfg.archive.archive_path =
        env_opt_string("RCYCLER_ARCHIVE_PATH", cfg.archive.archive_path.clone());
    cfg.archive.debug_log = env_or_bool("RCYCLER_DEBUG_LOG", cfg.archive.debug_log);
    cfg.driver.pilot_timeout_secs =
        env_or_u64("RCYCLER_PILOT_TIMEOUT_SECS", cfg.driver.pilot_timeout_secs);
    cfg.driver.pilot_retries = env_or_u64("RCYCLER_PILOT_RETRIES", cfg.driver.pilot_retries);

    validate(&cfg)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(validate(&CyclerConfig::default()).is_ok());
    }

    #[test]
    fn rejects_non_http_portal_pages() {
        let mut cfg = CyclerConfig::default();
        cfg.portal.login_page = "ftp://example.com".to_string();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn rejects_zero_pilot_timeout() {
        let mut cfg = CyclerConfig::default();
        cfg.driver.pilot_timeout_secs = 0;
        assert!(validate(&cfg).is_err());
    }
}
