//! Config validation logic.
//! Verifies root existence and readability, disjoint roots, and sane tuning values.
//! Validation never creates or modifies anything.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use super::types::{Config, LayoutConfig};
use crate::errors::ReshardError;

impl Config {
    /// Validate roots and tuning values before any work happens.
    pub fn validate(&self) -> Result<(), ReshardError> {
        let src = &self.source_root;
        let dst = &self.destination_root;

        // 1) Source root: must exist, be a directory, and be readable.
        ensure_source_dir(src)?;

        // 2) Destination root: may be missing (created after preflight); otherwise a directory.
        if dst.as_os_str().is_empty() {
            return Err(dest_err(dst, "destination_root is not set"));
        }
        match fs::metadata(dst) {
            Ok(m) if !m.is_dir() => {
                error!(path = %dst.display(), "destination_root is not a directory");
                return Err(dest_err(dst, "exists but is not a directory"));
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %dst.display(), "destination_root does not exist yet");
            }
            Err(e) => return Err(dest_err(dst, &format!("cannot stat: {e}"))),
        }

        // 3) Resolve symlinks and ensure the roots are disjoint (neither contains the other).
        let src_real = dunce::canonicalize(src).unwrap_or_else(|_| src.clone());
        let dst_real = resolve_existing_prefix(dst);
        if src_real == dst_real {
            return Err(ReshardError::Config(format!(
                "source_root and destination_root resolve to the same path: '{}'",
                src_real.display()
            )));
        }
        if dst_real.starts_with(&src_real) {
            return Err(ReshardError::Config(format!(
                "destination_root '{}' must not be inside source_root '{}'",
                dst_real.display(),
                src_real.display()
            )));
        }
        if src_real.starts_with(&dst_real) {
            return Err(ReshardError::Config(format!(
                "source_root '{}' must not be inside destination_root '{}'",
                src_real.display(),
                dst_real.display()
            )));
        }

        // 4) Tuning and layout parameters.
        if self.workers == 0 {
            return Err(ReshardError::Config("workers must be at least 1".into()));
        }
        if self.progress_interval == 0 {
            return Err(ReshardError::Config("progress_interval must be at least 1".into()));
        }
        match &self.layout {
            LayoutConfig::FixedDepthReroot { categories } if categories.is_empty() => {
                return Err(ReshardError::Config(
                    "fixed-depth-reroot needs at least one category".into(),
                ));
            }
            LayoutConfig::ShardBySuffix { anchor: Some(a) } if a.is_empty() || a.contains('/') => {
                return Err(ReshardError::Config(format!(
                    "anchor must be a single directory name, got '{a}'"
                )));
            }
            _ => {}
        }

        info!(
            src = %src.display(),
            dest = %dst.display(),
            layout = ?self.layout.kind(),
            mode = ?self.mode,
            "config validated"
        );
        Ok(())
    }
}

fn dest_err(path: &Path, context: &str) -> ReshardError {
    ReshardError::DestinationRoot {
        path: path.to_path_buf(),
        context: context.to_string(),
    }
}

fn src_err(path: &Path, context: String) -> ReshardError {
    ReshardError::SourceRoot {
        path: path.to_path_buf(),
        context,
    }
}

fn ensure_source_dir(path: &Path) -> Result<(), ReshardError> {
    let meta = fs::metadata(path).map_err(|e| {
        error!(path = %path.display(), error = %e, "source_root is not accessible");
        src_err(path, format!("cannot stat: {e}"))
    })?;
    if !meta.is_dir() {
        error!(path = %path.display(), "source_root is not a directory");
        return Err(src_err(path, "is not a directory".into()));
    }
    fs::read_dir(path).map_err(|e| src_err(path, format!("cannot read directory: {e}")))?;
    debug!(path = %path.display(), "source_root readable");
    Ok(())
}

/// Canonicalize the nearest existing ancestor and re-append the missing tail.
fn resolve_existing_prefix(path: &Path) -> PathBuf {
    let mut tail = Vec::new();
    let mut cur = path;
    loop {
        if let Ok(real) = dunce::canonicalize(cur) {
            let mut out = real;
            for seg in tail.iter().rev() {
                out.push(seg);
            }
            return out;
        }
        match (cur.parent(), cur.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                cur = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}
