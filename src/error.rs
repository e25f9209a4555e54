//! Error types for boot directory classification and pairing.
//!
//! Three families are kept apart so callers can react differently:
//!
//! - **I/O** - the boot directory or a link could not be read or written.
//! - **Structural** - a file or profile is inconsistent (duplicate image,
//!   missing version, broken naming profile).
//! - **Not found** - the requested kernel does not exist. This is an expected
//!   outcome, see [`Error::is_not_found`].

use std::io;
use std::path::PathBuf;

/// Result alias used by the classification core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("reading boot directory '{}'", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("updating link '{}'", path.display())]
    Link {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("file {filename} already present")]
    AlreadyPresent { filename: String },

    #[error("file {filename} has no version segment for profile '{profile}'")]
    MissingVersion { filename: String, profile: String },

    #[error("file {filename} does not match profile '{profile}'")]
    NoMatch { filename: String, profile: String },

    #[error("building pattern for profile '{profile}'")]
    Pattern {
        profile: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid profile '{profile}': {reason}")]
    InvalidProfile { profile: String, reason: String },

    #[error("entry for {filename} has no kernel image")]
    MissingKernel { filename: String },

    #[error("invalid version: version must not be empty")]
    InvalidVersion,

    #[error("no kernel found for version {version}{}", kernel_type.as_deref().map(|t| format!(" and type {t}")).unwrap_or_default())]
    NotFound {
        version: String,
        kernel_type: Option<String>,
    },
}

impl Error {
    /// True when the error only reports that nothing matched a query.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinct() {
        let err = Error::NotFound {
            version: "9.9.9".into(),
            kernel_type: None,
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "no kernel found for version 9.9.9");

        let err = Error::AlreadyPresent {
            filename: "kernel-vanilla-5.10.42-mocaccino".into(),
        };
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_mentions_type() {
        let err = Error::NotFound {
            version: "5.10.42".into(),
            kernel_type: Some("genkernel".into()),
        };
        assert_eq!(
            err.to_string(),
            "no kernel found for version 5.10.42 and type genkernel"
        );
    }
}
