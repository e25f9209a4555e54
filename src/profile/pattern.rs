//! Pattern derivation for naming profiles.
//!
//! One pattern per profile recognises both its kernel and its initrd files
//! and carries named groups for every field, so classification and decoding
//! read the filename through the same expression:
//!
//! ```text
//! ^(?:(?P<initrd>initramfs)|(?P<kernel>kernel))-(?P<type>vanilla)-(?:(?P<arch>..)-)?(?P<version>..)-(?P<suffix>mocaccino)$
//! ```

use regex::Regex;
use serde::Serialize;

use super::NamingProfile;
use crate::error::{Error, Result};

/// Which naming scheme of a profile a filename follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Kernel,
    Initrd,
}

/// Build the pattern source for a profile.
///
/// Literals are escaped. The architecture segment is optional: under a
/// `with_arch` profile the first segment after the type is the architecture
/// whenever a version segment still follows it.
pub fn derive_pattern(profile: &NamingProfile) -> String {
    let mut pattern = format!(
        "^(?:(?P<initrd>{})|(?P<kernel>{}))-",
        regex::escape(profile.initrd_prefix()),
        regex::escape(profile.kernel_prefix())
    );

    if !profile.kernel_type.is_empty() {
        pattern.push_str(&format!("(?P<type>{})-", regex::escape(&profile.kernel_type)));
    }

    if profile.with_arch {
        pattern.push_str("(?:(?P<arch>[^-]+)-)?");
    }

    if profile.suffix.is_empty() {
        pattern.push_str("(?P<version>[^-].*)$");
    } else {
        pattern.push_str(&format!(
            "(?P<version>[^-].*?)-(?P<suffix>{})$",
            regex::escape(&profile.suffix)
        ));
    }

    pattern
}

/// A profile together with its compiled pattern.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledProfile {
    #[serde(flatten)]
    profile: NamingProfile,
    #[serde(skip)]
    pattern: Regex,
}

impl CompiledProfile {
    pub fn compile(profile: NamingProfile) -> Result<Self> {
        profile.validate().map_err(|reason| Error::InvalidProfile {
            profile: profile.label().to_string(),
            reason,
        })?;

        let source = derive_pattern(&profile);
        let pattern = Regex::new(&source).map_err(|source| Error::Pattern {
            profile: profile.label().to_string(),
            source,
        })?;

        Ok(Self { profile, pattern })
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn is_match(&self, filename: &str) -> bool {
        self.pattern.is_match(filename)
    }

    /// Kernel or initrd, if the filename belongs to this profile at all.
    pub fn classify(&self, filename: &str) -> Option<ImageKind> {
        let caps = self.pattern.captures(filename)?;
        if caps.name("initrd").is_some() {
            Some(ImageKind::Initrd)
        } else {
            Some(ImageKind::Kernel)
        }
    }
}

impl std::ops::Deref for CompiledProfile {
    type Target = NamingProfile;

    fn deref(&self) -> &NamingProfile {
        &self.profile
    }
}

/// Ordered set of compiled profiles. Earlier profiles take precedence.
#[derive(Debug, Clone, Default)]
pub struct ProfileSet {
    profiles: Vec<CompiledProfile>,
}

impl ProfileSet {
    /// Compile every profile up front. The first broken profile fails the set.
    pub fn compile<I>(profiles: I) -> Result<Self>
    where
        I: IntoIterator<Item = NamingProfile>,
    {
        let profiles = profiles
            .into_iter()
            .map(CompiledProfile::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { profiles })
    }

    /// First profile whose pattern matches the filename.
    pub fn find(&self, filename: &str) -> Option<(&CompiledProfile, ImageKind)> {
        self.profiles
            .iter()
            .find_map(|profile| profile.classify(filename).map(|kind| (profile, kind)))
    }
}
