use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Per-run log handle. Each automation run truncates the active log and
/// writes `YYYY-MM-DD HH:MM:SS - LEVEL : message` lines through one scoped
/// file handle; `finish` releases the handle and returns the full text for
/// archival. No process-global logger state.
pub struct RunLogger {
    path: PathBuf,
    file: fs::File,
    debug: bool,
}

impl RunLogger {
    pub fn create(path: &Path, debug: bool) -> Result<RunLogger> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let file = fs::File::create(path)
            .with_context(|| format!("failed to create run log {}", path.display()))?;
        Ok(RunLogger {
            path: path.to_path_buf(),
            file,
            debug,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&mut self, level: &str, message: &str) -> Result<()> {
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(self.file, "{stamp} - {level} : {message}")
            .with_context(|| format!("failed to write run log {}", self.path.display()))?;
        Ok(())
    }

    pub fn info(&mut self, message: &str) -> Result<()> {
        self.write_line("INFO", message)
    }

    pub fn debug(&mut self, message: &str) -> Result<()> {
        if !self.debug {
            return Ok(());
        }
        self.write_line("DEBUG", message)
    }

    pub fn error(&mut self, message: &str) -> Result<()> {
        self.write_line("ERROR", message)
    }

    /// Flush, drop the handle, and read the finished log back.
    pub fn finish(mut self) -> Result<String> {
        self.file
            .flush()
            .with_context(|| format!("failed to flush run log {}", self.path.display()))?;
        let path = self.path.clone();
        drop(self);
        fs::read_to_string(&path)
            .with_context(|| format!("failed to read back run log {}", path.display()))
    }
}
