//! Fixed-depth re-root layout.
//!
//! Nine-segment paths `tenant/_/drive/category/_/_/_/_/file` collapse to
//! `tenant/temp/drives/drive/category/file`; the four middle levels are dropped.

use std::collections::BTreeMap;

use super::{Classification, Layout, MappingResult, MappingRule, PathClassifier, RelPath};

pub(super) const KIND: &str = "fixed-depth-reroot";

pub const EXPECTED_DEPTH: usize = 9;
const IDX_TENANT: usize = 0;
const IDX_DRIVE: usize = 2;
const IDX_CATEGORY: usize = 3;
const IDX_FILE: usize = 8;

pub const FIELD_TENANT: &str = "tenant";
pub const FIELD_DRIVE: &str = "drive";
pub const FIELD_CATEGORY: &str = "category";
pub const FIELD_FILENAME: &str = "filename";

/// Default category allow-list.
pub const DEFAULT_CATEGORIES: [&str; 2] = ["uploads", "inbox"];

#[derive(Debug, Clone)]
pub struct FixedDepthReroot {
    categories: Vec<String>,
}

impl Default for FixedDepthReroot {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORIES)
    }
}

impl FixedDepthReroot {
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    fn allows(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}

impl PathClassifier for FixedDepthReroot {
    fn classify(&self, rel: &RelPath) -> Classification {
        if rel.len() != EXPECTED_DEPTH {
            return Classification::unmatched("unexpected path depth");
        }
        let segs = rel.segments();
        let category = &segs[IDX_CATEGORY];
        if !self.allows(category) {
            return Classification::unmatched("category not in allow-list");
        }

        let mut fields = BTreeMap::new();
        fields.insert(FIELD_TENANT, segs[IDX_TENANT].clone());
        fields.insert(FIELD_DRIVE, segs[IDX_DRIVE].clone());
        fields.insert(FIELD_CATEGORY, category.clone());
        fields.insert(FIELD_FILENAME, segs[IDX_FILE].clone());
        Classification::Matched { kind: KIND, fields }
    }
}

impl MappingRule for FixedDepthReroot {
    fn map_path(&self, rel: &RelPath, class: &Classification) -> MappingResult {
        if rel.len() != EXPECTED_DEPTH {
            return MappingResult::Rejected("path segment count does not match expected depth".into());
        }
        let fields = [FIELD_TENANT, FIELD_DRIVE, FIELD_CATEGORY, FIELD_FILENAME].map(|f| class.field(f));
        let [Some(tenant), Some(drive), Some(category), Some(filename)] = fields else {
            return MappingResult::Rejected("missing re-root fields".into());
        };
        if [tenant, drive, category, filename]
            .iter()
            .any(|s| s.is_empty() || *s == "." || *s == "..")
        {
            return MappingResult::Rejected("empty or relative path field".into());
        }
        if !self.allows(category) {
            return MappingResult::Rejected("category not in allow-list".into());
        }
        let segs = rel.segments();
        let expected = [
            (tenant, IDX_TENANT),
            (drive, IDX_DRIVE),
            (category, IDX_CATEGORY),
            (filename, IDX_FILE),
        ];
        if expected.iter().any(|(field, idx)| *field != segs[*idx]) {
            return MappingResult::Rejected("re-root fields do not match path".into());
        }

        MappingResult::Destination(RelPath::from_segments([
            tenant, "temp", "drives", drive, category, filename,
        ]))
    }
}

impl Layout for FixedDepthReroot {
    fn name(&self) -> &'static str {
        KIND
    }
}
