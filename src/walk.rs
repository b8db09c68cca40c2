//! Source tree enumeration.
//!
//! Lazy, single pass, never follows symlinks. Only regular files become entries;
//! anything else that is not a directory (symlinks, sockets, unreadable entries)
//! is surfaced as `WalkItem::Skipped` instead of aborting the walk.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// One discovered regular file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Path relative to the source root; the entry's identity.
    pub relative: PathBuf,
    pub absolute: PathBuf,
    pub size: u64,
    #[serde(skip)]
    pub modified: Option<SystemTime>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkItem {
    File(Entry),
    Skipped { path: PathBuf, reason: String },
}

/// Walk `root`, yielding files and skip records. Directory order is sorted by
/// file name so that repeated walks over an unchanged tree are identical.
pub fn walk(root: &Path) -> impl Iterator<Item = WalkItem> + '_ {
    WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |res| match res {
            Ok(de) => {
                let ft = de.file_type();
                if ft.is_dir() {
                    return None;
                }
                let relative = relative_to(root, de.path());
                if ft.is_symlink() {
                    debug!(path = %de.path().display(), "skipping symlink");
                    return Some(WalkItem::Skipped {
                        path: relative,
                        reason: "symbolic link not followed".into(),
                    });
                }
                if !ft.is_file() {
                    return Some(WalkItem::Skipped {
                        path: relative,
                        reason: "not a regular file".into(),
                    });
                }
                match de.metadata() {
                    Ok(meta) => Some(WalkItem::File(Entry {
                        relative,
                        absolute: de.into_path(),
                        size: meta.len(),
                        modified: meta.modified().ok(),
                    })),
                    Err(e) => {
                        warn!(path = %de.path().display(), error = %e, "stat failed during walk");
                        Some(WalkItem::Skipped {
                            path: relative,
                            reason: format!("stat failed: {e}"),
                        })
                    }
                }
            }
            Err(e) => {
                let path = e
                    .path()
                    .map(|p| relative_to(root, p))
                    .unwrap_or_default();
                warn!(path = %path.display(), error = %e, "walk error");
                Some(WalkItem::Skipped {
                    path,
                    reason: format!("walk error: {e}"),
                })
            }
        })
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}
