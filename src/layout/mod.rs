//! Path layouts: structural classification plus destination mapping.
//!
//! A layout is a pair of pure functions over a path relative to the source root:
//! - `PathClassifier::classify` tags the path as Matched(kind, fields) or Unmatched(reason).
//! - `MappingRule::map_path` turns a matched path into its destination relative path.
//!
//! Neither performs I/O. Exactly one layout is selected per run.

mod reroot;
mod shard_suffix;

pub use reroot::FixedDepthReroot;
pub use shard_suffix::ShardBySuffix;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::config::LayoutConfig;

/// A relative path split into UTF-8 segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelPath {
    segments: Vec<String>,
}

impl RelPath {
    /// Split a relative path into segments.
    /// Fails (with a reason) on absolute paths, `..`, or non-UTF-8 segments.
    pub fn parse(path: &Path) -> Result<Self, String> {
        let mut segments = Vec::new();
        for comp in path.components() {
            match comp {
                Component::Normal(s) => match s.to_str() {
                    Some(s) => segments.push(s.to_string()),
                    None => return Err("non-UTF-8 path segment".into()),
                },
                Component::CurDir => {}
                _ => return Err("path is not a plain relative path".into()),
            }
        }
        if segments.is_empty() {
            return Err("empty path".into());
        }
        Ok(Self { segments })
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment (the file name).
    pub fn file_name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    pub fn to_path_buf(&self) -> PathBuf {
        self.segments.iter().collect()
    }
}

impl fmt::Display for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Result of inspecting a path's structural shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Matched {
        kind: &'static str,
        fields: BTreeMap<&'static str, String>,
    },
    Unmatched {
        reason: String,
    },
}

impl Classification {
    pub fn unmatched(reason: impl Into<String>) -> Self {
        Classification::Unmatched { reason: reason.into() }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Classification::Matched { .. })
    }

    /// Extracted field by name (None for Unmatched or missing fields).
    pub fn field(&self, name: &str) -> Option<&str> {
        match self {
            Classification::Matched { fields, .. } => fields.get(name).map(String::as_str),
            Classification::Unmatched { .. } => None,
        }
    }

    /// Bucket label used for preflight counts, e.g. `matched: shard-by-suffix`.
    pub fn label(&self) -> String {
        match self {
            Classification::Matched { kind, .. } => format!("matched: {kind}"),
            Classification::Unmatched { reason } => format!("unmatched: {reason}"),
        }
    }
}

/// Result of applying a mapping rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingResult {
    Destination(RelPath),
    Rejected(String),
}

pub trait PathClassifier: Send + Sync {
    /// Total and pure: never fails, never touches the filesystem.
    fn classify(&self, rel: &RelPath) -> Classification;
}

pub trait MappingRule: Send + Sync {
    /// Pure. Rejects (never panics) when extracted fields are malformed.
    fn map_path(&self, rel: &RelPath, class: &Classification) -> MappingResult;
}

/// A complete layout: one classifier plus its matching rule.
pub trait Layout: PathClassifier + MappingRule {
    /// Stable, versioned name of the legacy layout this handles.
    fn name(&self) -> &'static str;
}

/// Classify a raw relative path, turning unparseable paths into Unmatched.
pub fn classify_path(layout: &dyn Layout, rel: &Path) -> Classification {
    match RelPath::parse(rel) {
        Ok(r) => layout.classify(&r),
        Err(reason) => Classification::unmatched(reason),
    }
}

/// Category allow-list used when none is configured.
pub fn reroot_default_categories() -> Vec<String> {
    reroot::DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect()
}

/// Build the configured layout.
pub fn build_layout(cfg: &LayoutConfig) -> Box<dyn Layout> {
    match cfg {
        LayoutConfig::ShardBySuffix { anchor } => {
            let mut rule = ShardBySuffix::new();
            if let Some(a) = anchor {
                rule = rule.with_anchor(a.clone());
            }
            Box::new(rule)
        }
        LayoutConfig::FixedDepthReroot { categories } => {
            Box::new(FixedDepthReroot::new(categories.iter().cloned()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_segments() {
        let r = RelPath::parse(Path::new("a/b/c.txt")).unwrap();
        assert_eq!(r.segments(), ["a", "b", "c.txt"]);
        assert_eq!(r.file_name(), "c.txt");
        assert_eq!(r.to_string(), "a/b/c.txt");
    }

    #[test]
    fn parse_rejects_parent_and_absolute() {
        assert!(RelPath::parse(Path::new("../x")).is_err());
        assert!(RelPath::parse(Path::new("/abs/x")).is_err());
        assert!(RelPath::parse(Path::new("")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_segment_is_unmatched() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;
        let raw = Path::new(OsStr::from_bytes(b"dir/\xff\xfe-x.bin"));
        let layout = ShardBySuffix::new();
        let c = classify_path(&layout, raw);
        assert_eq!(c, Classification::unmatched("non-UTF-8 path segment"));
    }

    #[test]
    fn build_layout_selects_rule() {
        let l = build_layout(&LayoutConfig::FixedDepthReroot {
            categories: vec!["uploads".into()],
        });
        assert_eq!(l.name(), reroot::KIND);
        let l = build_layout(&LayoutConfig::ShardBySuffix { anchor: None });
        assert_eq!(l.name(), shard_suffix::KIND);
    }
}
