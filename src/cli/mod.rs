//! CLI argument parsing using clap 4.x derive macros

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use kullect_core::pump::DEFAULT_QUEUE_CAPACITY;
use log::LevelFilter;

/// Stream agent that prices Kubernetes resource usage points
///
/// Speaks the agent protocol as newline-delimited JSON: requests on stdin,
/// responses on stdout. Logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "kullect")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Minimum level written to stderr (and the log file)
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Also append log lines to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Responses buffered ahead of stdout
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}
