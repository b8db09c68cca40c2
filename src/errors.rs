//! Typed error definitions for reshard.
//! Only these are fatal to a run; per-entry problems are recorded as outcomes.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReshardError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Source root not usable: {path}: {context}")]
    SourceRoot { path: PathBuf, context: String },

    #[error("Destination root not usable: {path}: {context}")]
    DestinationRoot { path: PathBuf, context: String },

    #[error("Another run holds the destination lock {0}")]
    Lock(PathBuf),

    #[error("Operation interrupted by user")]
    Interrupted,
}

impl ReshardError {
    /// Stable numeric code for structured logs.
    pub fn code(&self) -> u16 {
        match self {
            ReshardError::Config(_) => 10,
            ReshardError::SourceRoot { .. } => 11,
            ReshardError::DestinationRoot { .. } => 12,
            ReshardError::Lock(_) => 20,
            ReshardError::Interrupted => 130,
        }
    }

    /// Short machine-friendly label used as the `kind` log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ReshardError::Config(_) => "config",
            ReshardError::SourceRoot { .. } => "source_root",
            ReshardError::DestinationRoot { .. } => "destination_root",
            ReshardError::Lock(_) => "lock",
            ReshardError::Interrupted => "interrupted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let all = [
            ReshardError::Config("x".into()),
            ReshardError::SourceRoot { path: "/a".into(), context: "gone".into() },
            ReshardError::DestinationRoot { path: "/b".into(), context: "file".into() },
            ReshardError::Lock("/b/.reshard.lock".into()),
            ReshardError::Interrupted,
        ];
        let mut codes: Vec<u16> = all.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
    }

    #[test]
    fn source_root_message_has_path() {
        let e = ReshardError::SourceRoot { path: "/srv/data".into(), context: "does not exist".into() };
        let msg = e.to_string();
        assert!(msg.contains("/srv/data"));
        assert!(msg.contains("does not exist"));
    }
}
