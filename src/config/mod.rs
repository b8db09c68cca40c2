//! Config module.
//! Provides configuration types, default paths, XML loading, and validation.

pub mod paths;
pub mod types;
mod validate;
pub mod xml;

pub use paths::{CONFIG_ENV, default_config_path, default_log_path, path_has_symlink_ancestor};
pub use types::{Config, LayoutConfig, LayoutKind, LogLevel, TransferMode, VerifyMode, default_workers};
pub use xml::{FileConfig, load_config_from_xml_path, load_optional};
