//! XML configuration support.
//!
//! <config>
//!   <source_root>/srv/odin/tenants</source_root>
//!   <destination_root>/srv/odin/tenants-v2</destination_root>
//!   <layout>shard-by-suffix</layout>
//!   <anchor>files</anchor>
//!   <categories>uploads,inbox</categories>
//!   <mode>copy</mode>
//!   <verify>size</verify>
//!   <override_unmatched>false</override_unmatched>
//!   <progress_interval>1000</progress_interval>
//!   <workers>8</workers>
//!   <log_level>normal</log_level>
//!   <log_file>/var/log/reshard.log</log_file>
//! </config>
//!
//! Every field is optional; unknown fields are rejected so typos surface early.

use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::types::{Config, LayoutConfig, LayoutKind, LogLevel, TransferMode, VerifyMode};
use crate::layout::reroot_default_categories;

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Default, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    source_root: Option<String>,
    destination_root: Option<String>,
    layout: Option<String>,
    anchor: Option<String>,
    /// Comma-separated allow-list for the re-root layout
    categories: Option<String>,
    mode: Option<String>,
    verify: Option<String>,
    override_unmatched: Option<bool>,
    #[serde(default, deserialize_with = "de_u64_trimmed_opt")]
    progress_interval: Option<u64>,
    #[serde(default, deserialize_with = "de_u64_trimmed_opt")]
    workers: Option<u64>,
    dry_run: Option<bool>,
    disable_locks: Option<bool>,
    log_level: Option<String>,
    log_file: Option<String>,
}

// Custom deserializer that trims surrounding whitespace for optional u64
fn de_u64_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<u64>().map(Some).map_err(serde::de::Error::custom),
    }
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl FileConfig {
    /// Overlay the values present in the file onto `cfg`.
    pub fn apply_to(&self, cfg: &mut Config) -> Result<()> {
        if let Some(s) = non_empty(&self.source_root) {
            cfg.source_root = PathBuf::from(s);
        }
        if let Some(s) = non_empty(&self.destination_root) {
            cfg.destination_root = PathBuf::from(s);
        }

        let kind = match non_empty(&self.layout) {
            Some(s) => s.parse::<LayoutKind>().map_err(|e| anyhow!(e))?,
            None => cfg.layout.kind(),
        };
        let anchor = non_empty(&self.anchor).map(str::to_string);
        let categories = non_empty(&self.categories).map(split_list);
        cfg.layout = match (kind, std::mem::take(&mut cfg.layout)) {
            (LayoutKind::ShardBySuffix, LayoutConfig::ShardBySuffix { anchor: prev }) => {
                LayoutConfig::ShardBySuffix { anchor: anchor.or(prev) }
            }
            (LayoutKind::ShardBySuffix, _) => LayoutConfig::ShardBySuffix { anchor },
            (LayoutKind::FixedDepthReroot, LayoutConfig::FixedDepthReroot { categories: prev }) => {
                LayoutConfig::FixedDepthReroot { categories: categories.unwrap_or(prev) }
            }
            (LayoutKind::FixedDepthReroot, _) => LayoutConfig::FixedDepthReroot {
                categories: categories.unwrap_or_else(reroot_default_categories),
            },
        };

        if let Some(s) = non_empty(&self.mode) {
            cfg.mode = TransferMode::from_str(s, true).map_err(|e| anyhow!("mode: {e}"))?;
        }
        if let Some(s) = non_empty(&self.verify) {
            cfg.verify = VerifyMode::from_str(s, true).map_err(|e| anyhow!("verify: {e}"))?;
        }
        if let Some(o) = self.override_unmatched {
            cfg.override_unmatched = o;
        }
        if let Some(n) = self.progress_interval {
            cfg.progress_interval = n;
        }
        if let Some(n) = self.workers {
            cfg.workers = usize::try_from(n).context("workers out of range")?;
        }
        if let Some(d) = self.dry_run {
            cfg.dry_run = d;
        }
        if let Some(d) = self.disable_locks {
            cfg.disable_locks = d;
        }
        if let Some(s) = non_empty(&self.log_level) {
            cfg.log_level = s.parse::<LogLevel>().map_err(|e| anyhow!(e))?;
        }
        if let Some(s) = non_empty(&self.log_file) {
            cfg.log_file = Some(PathBuf::from(s));
        }
        Ok(())
    }
}

/// Parse a config file.
pub fn load_config_from_xml_path(path: &Path) -> Result<FileConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: FileConfig = from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;
    debug!(path = %path.display(), "loaded config file");
    Ok(parsed)
}

/// Load `explicit` if given (must exist), else the default location if present.
pub fn load_optional(explicit: Option<&Path>) -> Result<Option<FileConfig>> {
    if let Some(p) = explicit {
        return load_config_from_xml_path(p).map(Some);
    }
    let Ok(path) = super::paths::default_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    load_config_from_xml_path(&path).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn parse(xml: &str) -> Result<FileConfig> {
        let td = tempdir().unwrap();
        let p = td.path().join("config.xml");
        fs::write(&p, xml).unwrap();
        load_config_from_xml_path(&p)
    }

    #[test]
    fn applies_reroot_settings() {
        let fc = parse(
            r#"<config>
  <source_root> /a </source_root>
  <destination_root>/b</destination_root>
  <layout>fixed-depth-reroot</layout>
  <categories>uploads, inbox ,archive</categories>
  <mode>move</mode>
  <verify>hash</verify>
  <progress_interval> 50 </progress_interval>
  <workers>3</workers>
</config>"#,
        )
        .unwrap();
        let mut cfg = Config::default();
        fc.apply_to(&mut cfg).unwrap();
        assert_eq!(cfg.source_root, PathBuf::from("/a"));
        assert_eq!(cfg.destination_root, PathBuf::from("/b"));
        assert_eq!(
            cfg.layout,
            LayoutConfig::FixedDepthReroot {
                categories: vec!["uploads".into(), "inbox".into(), "archive".into()]
            }
        );
        assert_eq!(cfg.mode, TransferMode::Move);
        assert_eq!(cfg.verify, VerifyMode::Hash);
        assert_eq!(cfg.progress_interval, 50);
        assert_eq!(cfg.workers, 3);
    }

    #[test]
    fn unknown_field_is_rejected() {
        assert!(parse("<config><target_root>/x</target_root></config>").is_err());
    }

    #[test]
    fn bad_layout_is_rejected() {
        let fc = parse("<config><layout>flat</layout></config>").unwrap();
        assert!(fc.apply_to(&mut Config::default()).is_err());
    }

    #[test]
    fn empty_file_config_keeps_defaults() {
        let fc = parse("<config></config>").unwrap();
        let mut cfg = Config::new("/s", "/d", LayoutConfig::ShardBySuffix { anchor: Some("files".into()) });
        fc.apply_to(&mut cfg).unwrap();
        assert_eq!(cfg.source_root, PathBuf::from("/s"));
        assert_eq!(cfg.layout, LayoutConfig::ShardBySuffix { anchor: Some("files".into()) });
        assert_eq!(cfg.mode, TransferMode::Copy);
    }
}
