//! Process logger
//!
//! stdout belongs to the host protocol, so log lines go to stderr and,
//! when configured, are appended to a file as well.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("cannot open log file {path}: {source}")]
    OpenFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("a logger is already installed")]
    AlreadyInstalled(#[from] log::SetLoggerError),
}

pub struct AgentLogger {
    level: LevelFilter,
    file: Option<Mutex<File>>,
}

impl AgentLogger {
    pub fn new(level: LevelFilter) -> Self {
        Self { level, file: None }
    }

    /// Also append every line to `path`, creating parent directories
    pub fn with_file(mut self, path: &Path) -> Result<Self, LoggerError> {
        let open_error = |source| LoggerError::OpenFile {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(open_error)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(open_error)?;

        self.file = Some(Mutex::new(file));
        Ok(self)
    }
}

fn format_line(level: Level, target: &str, message: &std::fmt::Arguments<'_>) -> String {
    format!(
        "[{}] [{}] [{}] {}",
        Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
        level,
        target,
        message
    )
}

impl Log for AgentLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format_line(record.level(), record.target(), record.args());
        let _ = writeln!(std::io::stderr().lock(), "{}", line);

        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                let _ = writeln!(file, "{}", line);
            }
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                let _ = file.flush();
            }
        }
    }
}

/// Install the process-wide logger
pub fn init(logger: AgentLogger) -> Result<(), LoggerError> {
    let level = logger.level;
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(level);
    Ok(())
}
