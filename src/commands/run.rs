use crate::cli::RunArgs;
use crate::commands::CommandReport;
use crate::commands::archive::note_archive_outcome;
use crate::cycler::config::load_config;
use crate::cycler::controller;
use crate::cycler::driver::{PilotDriver, portal_reachable};
use crate::cycler::paths::resolve_paths;
use anyhow::Result;

const PREFLIGHT_TIMEOUT_SECS: u64 = 15;

pub fn run(args: &RunArgs) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config(&paths)?;
    let mut report = CommandReport::new("run");
    report.detail(format!("run_log={}", paths.run_log_file.display()));

    if args.no_preflight {
        report.detail("portal preflight skipped");
    } else if let Err(err) = portal_reachable(&cfg.portal.profile_page, PREFLIGHT_TIMEOUT_SECS) {
        report.issue(format!("portal preflight failed: {err:#}"));
        return Ok(report);
    } else {
        report.detail(format!("portal preflight ok ({})", cfg.portal.profile_page));
    }

    let driver = match PilotDriver::new(&cfg.portal, &cfg.driver) {
        Ok(driver) => driver,
        Err(err) => {
            report.issue(format!("automation helper unavailable: {err:#}"));
            return Ok(report);
        }
    };

    let outcome = controller::run_once(&cfg, &paths, &driver)?;
    report.detail(format!("resume={}", outcome.resume.display()));
    if let Some(hash) = &outcome.resume_sha256 {
        report.detail(format!("resume_sha256={hash}"));
    }
    note_archive_outcome(&mut report, &outcome.archive);

    if let Some(err) = &outcome.driver_error {
        report.issue(format!("upload failed (run log archived): {err}"));
    }

    Ok(report)
}
