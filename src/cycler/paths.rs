use anyhow::Result;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct CyclerPaths {
    pub cycler_home: PathBuf,
    pub logs_dir: PathBuf,
    pub run_log_file: PathBuf,
    pub state_file: PathBuf,
    pub config_file: PathBuf,
}

fn required_home_dir() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    Err(anyhow::anyhow!("HOME directory could not be resolved"))
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub fn resolve_paths() -> Result<CyclerPaths> {
    let home = required_home_dir()?;
    let cycler_home = env_or_default_path("RCYCLER_HOME", home.join(".resume-cycler"));

    let logs_dir = env_or_default_path("RCYCLER_LOGS_DIR", cycler_home.join("logs"));
    let run_log_file = env_or_default_path("RCYCLER_RUN_LOG", logs_dir.join("run.log"));
    let state_file = env_or_default_path(
        "RCYCLER_STATE_FILE",
        cycler_home.join("state").join("rotation.json"),
    );
    let config_file = env_or_default_path("RCYCLER_CONFIG_PATH", cycler_home.join("config.toml"));

    Ok(CyclerPaths {
        cycler_home,
        logs_dir,
        run_log_file,
        state_file,
        config_file,
    })
}
