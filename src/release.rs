//! OS release variant detection.
//!
//! Some release variants (e.g. `micro`) ship their initrd as a package, so
//! generating or purging initrd images must be skipped there.

use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Release variant read from the release file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Release(String);

impl Release {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this release is one of `external` (releases whose initrd
    /// comes from a package).
    pub fn manages_initrd_externally(&self, external: &[String]) -> bool {
        !self.0.is_empty() && external.iter().any(|r| r == &self.0)
    }
}

/// Read the release variant. A missing file means an unknown release.
pub fn os_release(path: &Path) -> Result<Release> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Release(content.replace('\n', "").trim().to_string())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Release::default()),
        Err(e) => {
            Err(e).with_context(|| format!("reading release file '{}'", path.display()))
        }
    }
}
