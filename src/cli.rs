//! CLI definition and parsing.
//! Defines Args and applies command-line overrides on top of file config.
//!
//! Notes:
//! - --debug is a shorthand for --log-level debug.
//! - --anchor/--category only make sense with their own layout; passing them
//!   alone selects that layout.

use clap::{Parser, ValueHint};
use std::path::PathBuf;

use crate::config::{Config, LayoutConfig, LayoutKind, LogLevel, TransferMode, VerifyMode};
use crate::layout::reroot_default_categories;

/// Reorganize a directory tree into a new layout, fail-closed.
/// CLI flags override config values (which are loaded from XML if present).
#[derive(Parser, Debug, Clone, Default)]
#[command(
    author,
    version,
    about = "Safely reshard or re-root large file trees"
)]
pub struct Args {
    /// Tree to reorganize.
    #[arg(long = "source", short = 's', value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub source_root: Option<PathBuf>,

    /// Where reorganized files are written (created after preflight passes).
    #[arg(long = "dest", short = 'o', value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub destination_root: Option<PathBuf>,

    /// Legacy layout to migrate from.
    #[arg(long, value_enum)]
    pub layout: Option<LayoutKind>,

    /// shard-by-suffix: only match files whose parent directory has this name.
    #[arg(long, value_name = "NAME")]
    pub anchor: Option<String>,

    /// fixed-depth-reroot: allowed category (repeatable; default uploads, inbox).
    #[arg(long = "category", value_name = "NAME")]
    pub categories: Vec<String>,

    /// copy leaves sources in place; move removes each source after a verified copy.
    #[arg(long, value_enum)]
    pub mode: Option<TransferMode>,

    /// How copies are verified and existing destinations compared.
    #[arg(long, value_enum)]
    pub verify: Option<VerifyMode>,

    /// Proceed even when preflight finds unmatched entries (they are skipped).
    #[arg(long)]
    pub override_unmatched: bool,

    /// Emit a progress line every N entries.
    #[arg(long, value_name = "N")]
    pub progress_interval: Option<u64>,

    /// Number of transfer worker threads.
    #[arg(long, short = 'j', value_name = "N")]
    pub workers: Option<usize>,

    /// Dry-run: classify, check and plan, but do not modify the filesystem.
    #[arg(long, help = "Show what would be done, but do not modify files/directories")]
    pub dry_run: bool,

    /// Disable the destination run lock (for NFS/ZFS shares where flock may fail).
    #[arg(long)]
    pub disable_locks: bool,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Also write logs to this file.
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,

    /// Emit logs in structured JSON (includes timestamp, level, and structured fields).
    #[arg(long)]
    pub json: bool,

    /// Read settings from this XML file instead of the default location.
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Print the config file location that would be used, then exit.
    #[arg(long)]
    pub print_config: bool,

    /// Write the final run report as JSON to this path.
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub report: Option<PathBuf>,

    /// Exit non-zero (3) when any entry failed.
    #[arg(long)]
    pub fail_on_errors: bool,
}

impl Args {
    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config default).
    pub fn effective_log_level(&self) -> Result<Option<LogLevel>, String> {
        if self.debug {
            return Ok(Some(LogLevel::Debug));
        }
        self.log_level.as_deref().map(str::parse).transpose()
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) -> Result<(), String> {
        if let Some(p) = &self.source_root {
            cfg.source_root = p.clone();
        }
        if let Some(p) = &self.destination_root {
            cfg.destination_root = p.clone();
        }
        self.apply_layout(cfg)?;
        if let Some(m) = self.mode {
            cfg.mode = m;
        }
        if let Some(v) = self.verify {
            cfg.verify = v;
        }
        if self.override_unmatched {
            cfg.override_unmatched = true;
        }
        if let Some(n) = self.progress_interval {
            cfg.progress_interval = n;
        }
        if let Some(n) = self.workers {
            cfg.workers = n;
        }
        if self.dry_run {
            cfg.dry_run = true;
        }
        if self.disable_locks {
            cfg.disable_locks = true;
        }
        if let Some(level) = self.effective_log_level()? {
            cfg.log_level = level;
        }
        if let Some(p) = &self.log_file {
            cfg.log_file = Some(p.clone());
        }
        Ok(())
    }

    fn apply_layout(&self, cfg: &mut Config) -> Result<(), String> {
        let implied = match (self.anchor.is_some(), !self.categories.is_empty()) {
            (true, true) => return Err("--anchor and --category belong to different layouts".into()),
            (true, false) => Some(LayoutKind::ShardBySuffix),
            (false, true) => Some(LayoutKind::FixedDepthReroot),
            (false, false) => None,
        };
        let kind = match (self.layout, implied) {
            (Some(k), Some(i)) if k != i => {
                return Err(format!("--layout {k:?} does not accept that option"));
            }
            (Some(k), _) | (None, Some(k)) => k,
            (None, None) => return Ok(()),
        };

        cfg.layout = match (kind, std::mem::take(&mut cfg.layout)) {
            (LayoutKind::ShardBySuffix, LayoutConfig::ShardBySuffix { anchor }) => LayoutConfig::ShardBySuffix {
                anchor: self.anchor.clone().or(anchor),
            },
            (LayoutKind::ShardBySuffix, _) => LayoutConfig::ShardBySuffix { anchor: self.anchor.clone() },
            (LayoutKind::FixedDepthReroot, LayoutConfig::FixedDepthReroot { categories }) => {
                LayoutConfig::FixedDepthReroot {
                    categories: if self.categories.is_empty() { categories } else { self.categories.clone() },
                }
            }
            (LayoutKind::FixedDepthReroot, _) => LayoutConfig::FixedDepthReroot {
                categories: if self.categories.is_empty() {
                    reroot_default_categories()
                } else {
                    self.categories.clone()
                },
            },
        };
        Ok(())
    }
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("reshard").chain(v.iter().copied())).unwrap()
    }

    #[test]
    fn overrides_replace_config_values() {
        let a = args(&["--source", "/s", "--dest", "/d", "--mode", "move", "--verify", "hash", "-j", "3"]);
        let mut cfg = Config::default();
        a.apply_overrides(&mut cfg).unwrap();
        assert_eq!(cfg.source_root, PathBuf::from("/s"));
        assert_eq!(cfg.destination_root, PathBuf::from("/d"));
        assert_eq!(cfg.mode, TransferMode::Move);
        assert_eq!(cfg.verify, VerifyMode::Hash);
        assert_eq!(cfg.workers, 3);
    }

    #[test]
    fn category_selects_reroot() {
        let a = args(&["--category", "uploads", "--category", "archive"]);
        let mut cfg = Config::default();
        a.apply_overrides(&mut cfg).unwrap();
        assert_eq!(
            cfg.layout,
            LayoutConfig::FixedDepthReroot { categories: vec!["uploads".into(), "archive".into()] }
        );
    }

    #[test]
    fn reroot_without_categories_uses_defaults() {
        let a = args(&["--layout", "fixed-depth-reroot"]);
        let mut cfg = Config::default();
        a.apply_overrides(&mut cfg).unwrap();
        assert_eq!(cfg.layout, LayoutConfig::FixedDepthReroot { categories: reroot_default_categories() });
    }

    #[test]
    fn conflicting_layout_options_are_rejected() {
        let a = args(&["--layout", "shard-by-suffix", "--category", "uploads"]);
        assert!(a.apply_overrides(&mut Config::default()).is_err());
        let a = args(&["--anchor", "files", "--category", "uploads"]);
        assert!(a.apply_overrides(&mut Config::default()).is_err());
    }

    #[test]
    fn debug_wins_over_log_level() {
        let a = args(&["--log-level", "quiet", "--debug"]);
        assert_eq!(a.effective_log_level(), Ok(Some(LogLevel::Debug)));
        let a = args(&["--log-level", "loud"]);
        assert!(a.effective_log_level().is_err());
    }
}
