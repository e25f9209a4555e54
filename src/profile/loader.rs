//! Loading naming profiles from a directory of profile documents.
//!
//! Each `*.yml` / `*.yaml` (or `*.toml`) file holds one profile:
//!
//! ```yaml
//! name: Mocaccino
//! type: vanilla
//! suffix: mocaccino
//! with_arch: true
//! ```

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::NamingProfile;

/// Encoding of a profile document, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileFormat {
    Yaml,
    Toml,
}

impl ProfileFormat {
    /// Format for `path`, or `None` if the file is not a profile document.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yml") | Some("yaml") => Some(Self::Yaml),
            Some("toml") => Some(Self::Toml),
            _ => None,
        }
    }
}

/// Profiles used when no profile documents are available.
pub fn default_profiles() -> Vec<NamingProfile> {
    vec![
        NamingProfile {
            name: "Sabayon".into(),
            kernel_type: "genkernel".into(),
            suffix: "sabayon".into(),
            with_arch: true,
            ..Default::default()
        },
        NamingProfile {
            name: "Mocaccino".into(),
            kernel_type: "vanilla".into(),
            suffix: "mocaccino".into(),
            with_arch: true,
            ..Default::default()
        },
    ]
}

/// Parse a single profile document.
pub fn parse_profile(content: &str, format: ProfileFormat) -> Result<NamingProfile> {
    let profile: NamingProfile = match format {
        ProfileFormat::Yaml => serde_yaml::from_str(content)?,
        ProfileFormat::Toml => toml::from_str(content)?,
    };
    Ok(profile)
}

/// Load every profile document in `dir`, sorted by file name.
///
/// Documents that cannot be read or parsed, and profiles without a type, are
/// skipped with a warning. Only an unreadable directory is an error.
pub fn load_profiles(dir: &Path) -> Result<Vec<NamingProfile>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("reading profiles directory '{}'", dir.display()))?;

    let mut documents = Vec::new();
    for entry in entries {
        let entry = entry
            .with_context(|| format!("iterating profiles directory '{}'", dir.display()))?;
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        let Some(format) = ProfileFormat::from_path(&path) else {
            continue;
        };
        documents.push((path, format));
    }
    documents.sort_by(|a, b| a.0.cmp(&b.0));

    let mut profiles = Vec::new();
    for (path, format) in documents {
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("skipping profile '{}': {}", path.display(), e);
                continue;
            }
        };

        let profile = match parse_profile(&content, format) {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!("skipping profile '{}': {:#}", path.display(), e);
                continue;
            }
        };

        if profile.kernel_type.is_empty() {
            tracing::warn!("skipping profile '{}': no type set", path.display());
            continue;
        }

        tracing::debug!("loaded profile {} from {}", profile.label(), path.display());
        profiles.push(profile);
    }

    Ok(profiles)
}

/// Profiles from `dir` when it yields any, else [`default_profiles`].
pub fn resolve_profiles(dir: Option<&Path>) -> Vec<NamingProfile> {
    let Some(dir) = dir else {
        return default_profiles();
    };

    match load_profiles(dir) {
        Ok(profiles) if !profiles.is_empty() => profiles,
        Ok(_) => {
            tracing::warn!(
                "no usable profiles found in '{}', using defaults",
                dir.display()
            );
            default_profiles()
        }
        Err(e) => {
            tracing::debug!("{:#}, using default profiles", e);
            default_profiles()
        }
    }
}
