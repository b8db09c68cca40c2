//! Shard-by-suffix layout.
//!
//! `<dirs...>/<id>-<rest>` becomes `<dirs...>/<id[-2]>/<id[-1]>/<id>-<rest>`.
//! The identifier is the file name up to the first `-`; names without a `-`
//! use the part before the first `.` instead.

use std::collections::BTreeMap;

use super::{Classification, Layout, MappingResult, MappingRule, PathClassifier, RelPath};

pub(super) const KIND: &str = "shard-by-suffix";

pub const FIELD_IDENTIFIER: &str = "identifier";
pub const FIELD_SHARD_A: &str = "shardA";
pub const FIELD_SHARD_B: &str = "shardB";

#[derive(Debug, Clone, Default)]
pub struct ShardBySuffix {
    /// Required name of the file's parent directory (e.g. `files`), if any.
    anchor: Option<String>,
}

impl ShardBySuffix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }
}

fn identifier_of(file_name: &str) -> &str {
    match file_name.find('-') {
        Some(i) => &file_name[..i],
        None => file_name.split('.').next().unwrap_or(file_name),
    }
}

/// A single character works as a directory name unless it is `.`, a path
/// separator or NUL.
fn usable_as_segment(c: char) -> bool {
    c != '.' && c != '\0' && !std::path::is_separator(c)
}

/// Last two characters of the identifier, if both are usable directory names.
fn shard_chars(identifier: &str) -> Result<(char, char), &'static str> {
    let mut rev = identifier.chars().rev();
    let (b, a) = match (rev.next(), rev.next()) {
        (Some(b), Some(a)) => (b, a),
        _ => return Err("identifier too short"),
    };
    if !usable_as_segment(a) || !usable_as_segment(b) {
        return Err("shard character cannot be a directory name");
    }
    Ok((a, b))
}

impl PathClassifier for ShardBySuffix {
    fn classify(&self, rel: &RelPath) -> Classification {
        if let Some(anchor) = &self.anchor {
            let segs = rel.segments();
            let parent = segs.len().checked_sub(2).map(|i| segs[i].as_str());
            if parent != Some(anchor.as_str()) {
                return Classification::unmatched(format!("file is not directly under '{anchor}'"));
            }
        }

        let identifier = identifier_of(rel.file_name());
        match shard_chars(identifier) {
            Ok((a, b)) => {
                let mut fields = BTreeMap::new();
                fields.insert(FIELD_IDENTIFIER, identifier.to_string());
                fields.insert(FIELD_SHARD_A, a.to_string());
                fields.insert(FIELD_SHARD_B, b.to_string());
                Classification::Matched { kind: KIND, fields }
            }
            Err(reason) => Classification::unmatched(reason),
        }
    }
}

impl MappingRule for ShardBySuffix {
    fn map_path(&self, rel: &RelPath, class: &Classification) -> MappingResult {
        let (Some(a), Some(b)) = (class.field(FIELD_SHARD_A), class.field(FIELD_SHARD_B)) else {
            return MappingResult::Rejected("missing shard fields".into());
        };

        // Re-derive from the path itself; the fields must agree with it.
        match shard_chars(identifier_of(rel.file_name())) {
            Ok((ea, eb)) if a == ea.to_string() && b == eb.to_string() => {}
            Ok(_) => return MappingResult::Rejected("shard fields do not match identifier".into()),
            Err(reason) => {
                return MappingResult::Rejected(format!("{reason} to derive shard key"));
            }
        }

        let segs = rel.segments();
        let (file_name, dirs) = match segs.split_last() {
            Some(split) => split,
            None => return MappingResult::Rejected("empty path".into()),
        };
        let mut out: Vec<String> = dirs.to_vec();
        out.push(a.to_string());
        out.push(b.to_string());
        out.push(file_name.clone());
        MappingResult::Destination(RelPath::from_segments(out))
    }
}

impl Layout for ShardBySuffix {
    fn name(&self) -> &'static str {
        KIND
    }
}
