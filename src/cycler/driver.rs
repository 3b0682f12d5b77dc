use crate::cycler::config::{DriverConfig, PortalConfig};
use crate::cycler::util::run_command_with_optional_timeout;
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::thread;
use std::time::Duration;

/// The opaque browser-automation collaborator. The engine and controller
/// only see these three operations; everything behind them lives in the
/// external helper binary.
pub trait ProfileDriver {
    fn login(&self) -> Result<()>;
    fn navigate_to_profile(&self) -> Result<()>;
    fn upload_file(&self, resume: &Path) -> Result<()>;
}

/// Driver backed by the external `portal-pilot` helper. Credentials are
/// passed through the environment; this side only checks they are present.
pub struct PilotDriver {
    bin: PathBuf,
    portal: PortalConfig,
    timeout_secs: u64,
    retries: u64,
}

fn resolve_pilot_bin() -> Result<PathBuf> {
    if let Ok(custom) = env::var("RCYCLER_PILOT_BIN") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            let path = PathBuf::from(trimmed);
            if !path.is_file() {
                anyhow::bail!(
                    "RCYCLER_PILOT_BIN does not point to a file: {}",
                    path.display()
                );
            }
            return Ok(path);
        }
    }
    which::which("portal-pilot").context("portal-pilot not in RCYCLER_PILOT_BIN or PATH")
}

pub fn pilot_available() -> bool {
    resolve_pilot_bin().is_ok()
}

fn ensure_credentials() -> Result<()> {
    for var in ["PORTAL_USERNAME", "PORTAL_PASSWORD"] {
        if env::var(var).map(|v| v.trim().is_empty()).unwrap_or(true) {
            anyhow::bail!("{var} is not set; add it to the environment or the .env file");
        }
    }
    Ok(())
}

impl PilotDriver {
    pub fn new(portal: &PortalConfig, driver: &DriverConfig) -> Result<Self> {
        Ok(Self {
            bin: resolve_pilot_bin()?,
            portal: portal.clone(),
            timeout_secs: driver.pilot_timeout_secs,
            retries: driver.pilot_retries,
        })
    }

    fn run_pilot(&self, args: &[&str]) -> Result<Output> {
        let mut cmd = Command::new(&self.bin);
        cmd.args(args);
        run_command_with_optional_timeout(&mut cmd, Some(self.timeout_secs))
            .with_context(|| format!("failed to run `{} {}`", self.bin.display(), args.join(" ")))
    }

    fn run_pilot_retry(&self, args: &[&str]) -> Result<()> {
        let mut last_failure = None;

        for attempt in 0..=self.retries {
            match self.run_pilot(args) {
                Ok(out) if out.status.success() => return Ok(()),
                Ok(out) => {
                    last_failure = Some(format!(
                        "exit={:?} stderr={}",
                        out.status.code(),
                        String::from_utf8_lossy(&out.stderr).trim()
                    ));
                }
                Err(err) => {
                    last_failure = Some(format!("{err:#}"));
                }
            }
            if attempt < self.retries {
                let delay_ms = 250 * (attempt + 1);
                thread::sleep(Duration::from_millis(delay_ms));
            }
        }

        anyhow::bail!(
            "command failed after retries: portal-pilot {}\n{}",
            args.join(" "),
            last_failure.unwrap_or_default()
        )
    }
}

impl ProfileDriver for PilotDriver {
    fn login(&self) -> Result<()> {
        ensure_credentials()?;
        self.run_pilot_retry(&["login", "--url", &self.portal.login_page])
    }

    fn navigate_to_profile(&self) -> Result<()> {
        self.run_pilot_retry(&["goto", "--url", &self.portal.profile_page])
    }

    fn upload_file(&self, resume: &Path) -> Result<()> {
        let resume_str = resume.to_string_lossy().to_string();
        self.run_pilot_retry(&[
            "upload",
            "--url",
            &self.portal.profile_page,
            "--file",
            &resume_str,
        ])
    }
}

/// Preflight: check the portal answers at all before launching the helper.
/// Any HTTP response counts as reachable; only transport failures error.
pub fn portal_reachable(url: &str, timeout_secs: u64) -> Result<()> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("failed to build preflight HTTP client")?;
    client
        .get(url)
        .send()
        .with_context(|| format!("portal unreachable at {url}"))?;
    Ok(())
}
