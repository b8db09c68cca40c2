//! Core configuration types.
//! - Config is the explicit run record handed to the RunController.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::paths;
use crate::progress::DEFAULT_PROGRESS_INTERVAL;

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Informational output (default)
    #[default]
    Normal,
    /// More info (like verbose)
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Whether the source is removed after a verified copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    #[default]
    Copy,
    Move,
}

/// How a finished copy is checked before the source may be removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyMode {
    /// Compare sizes (cheap).
    #[default]
    Size,
    /// Compare full blake3 content hashes (reads both files).
    Hash,
}

/// Which legacy layout this run migrates from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutConfig {
    /// Insert two shard levels taken from the identifier's last two characters.
    ShardBySuffix { anchor: Option<String> },
    /// Collapse nine-level paths to `tenant/temp/drives/drive/category/file`.
    FixedDepthReroot { categories: Vec<String> },
}

/// CLI/XML spelling of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LayoutKind {
    ShardBySuffix,
    FixedDepthReroot,
}

impl FromStr for LayoutKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shard-by-suffix" | "shard" => Ok(LayoutKind::ShardBySuffix),
            "fixed-depth-reroot" | "reroot" => Ok(LayoutKind::FixedDepthReroot),
            other => Err(format!("unknown layout: '{other}'")),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig::ShardBySuffix { anchor: None }
    }
}

impl LayoutConfig {
    pub fn kind(&self) -> LayoutKind {
        match self {
            LayoutConfig::ShardBySuffix { .. } => LayoutKind::ShardBySuffix,
            LayoutConfig::FixedDepthReroot { .. } => LayoutKind::FixedDepthReroot,
        }
    }
}

/// Runtime configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Tree being reorganized
    pub source_root: PathBuf,
    /// Where reorganized files land (created on demand)
    pub destination_root: PathBuf,
    pub layout: LayoutConfig,
    pub mode: TransferMode,
    /// Proceed even when preflight found unmatched entries
    pub override_unmatched: bool,
    pub verify: VerifyMode,
    /// Emit a progress line every N entries
    pub progress_interval: u64,
    /// Transfer worker threads
    pub workers: usize,
    /// Plan only, never touch the filesystem
    pub dry_run: bool,
    /// Skip the destination run lock (for filesystems where locking fails)
    pub disable_locks: bool,
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_root: PathBuf::new(),
            destination_root: PathBuf::new(),
            layout: LayoutConfig::default(),
            mode: TransferMode::Copy,
            override_unmatched: false,
            verify: VerifyMode::Size,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            workers: default_workers(),
            dry_run: false,
            disable_locks: false,
            log_level: LogLevel::Normal,
            log_file: paths::default_log_path().ok(),
        }
    }
}

impl Config {
    /// Construct a Config with explicit roots and layout; other fields use defaults.
    pub fn new(
        source_root: impl Into<PathBuf>,
        destination_root: impl Into<PathBuf>,
        layout: LayoutConfig,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            destination_root: destination_root.into(),
            layout,
            ..Default::default()
        }
    }
}

pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loglevel_parse_aliases() {
        assert_eq!(LogLevel::parse("ERROR"), Some(LogLevel::Quiet));
        assert_eq!(LogLevel::parse("verbose"), Some(LogLevel::Info));
        assert_eq!("trace".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn layout_kind_parse() {
        assert_eq!("Shard-By-Suffix".parse::<LayoutKind>(), Ok(LayoutKind::ShardBySuffix));
        assert_eq!("reroot".parse::<LayoutKind>(), Ok(LayoutKind::FixedDepthReroot));
        assert!("flat".parse::<LayoutKind>().is_err());
    }

    #[test]
    fn defaults_are_safe() {
        let cfg = Config::new("/src", "/dst", LayoutConfig::default());
        assert_eq!(cfg.mode, TransferMode::Copy);
        assert_eq!(cfg.verify, VerifyMode::Size);
        assert!(!cfg.override_unmatched);
        assert_eq!(cfg.progress_interval, 1000);
        assert!(cfg.workers >= 1);
    }
}
