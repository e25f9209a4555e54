//! Kernel naming profiles.
//!
//! A profile describes how the files of one kernel flavor are named in the
//! boot directory:
//!
//! ```text
//! <kernel_prefix>[-<type>][-<arch>]-<version>[-<suffix>]
//! <initrd_prefix>[-<type>][-<arch>]-<version>[-<suffix>]
//! ```
//!
//! Profiles are plain values. The matching pattern is derived separately by
//! [`pattern::derive_pattern`] and kept next to the profile in a
//! [`CompiledProfile`], so a profile never changes after it was loaded.
//!
//! - [`loader`] - profile documents and built-in defaults
//! - [`pattern`] - pattern derivation and the compiled [`ProfileSet`]

pub mod loader;
pub mod pattern;

use serde::{Deserialize, Serialize};

pub use loader::{default_profiles, load_profiles, parse_profile, resolve_profiles, ProfileFormat};
pub use pattern::{derive_pattern, CompiledProfile, ImageKind, ProfileSet};

/// Kernel image prefix used when a profile leaves it empty.
pub const DEFAULT_KERNEL_PREFIX: &str = "kernel";

/// Initrd image prefix used when a profile leaves it empty.
pub const DEFAULT_INITRD_PREFIX: &str = "initramfs";

/// Separator between filename segments.
pub const SEPARATOR: char = '-';

/// Naming convention for one kernel flavor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamingProfile {
    /// Display label, only used for listings.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kernel_prefix: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub initrd_prefix: String,
    /// Build flavor tag, e.g. `vanilla` or `genkernel`.
    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub kernel_type: String,
    /// Trailing distribution tag, e.g. `mocaccino`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub suffix: String,
    /// Whether an architecture segment may sit between type and version.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub with_arch: bool,
}

impl NamingProfile {
    /// Kernel prefix with the default applied.
    pub fn kernel_prefix(&self) -> &str {
        if self.kernel_prefix.is_empty() {
            DEFAULT_KERNEL_PREFIX
        } else {
            &self.kernel_prefix
        }
    }

    /// Initrd prefix with the default applied.
    pub fn initrd_prefix(&self) -> &str {
        if self.initrd_prefix.is_empty() {
            DEFAULT_INITRD_PREFIX
        } else {
            &self.initrd_prefix
        }
    }

    /// Label used in logs and errors: the name, else the type, else the kernel prefix.
    pub fn label(&self) -> &str {
        if !self.name.is_empty() {
            &self.name
        } else if !self.kernel_type.is_empty() {
            &self.kernel_type
        } else {
            self.kernel_prefix()
        }
    }

    /// Check that every literal can be used as a filename segment.
    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        let fields = [
            ("kernel_prefix", self.kernel_prefix()),
            ("initrd_prefix", self.initrd_prefix()),
            ("type", self.kernel_type.as_str()),
            ("suffix", self.suffix.as_str()),
        ];
        for (field, value) in fields {
            if value
                .chars()
                .any(|c| c == '/' || c == '\0' || c.is_whitespace())
            {
                return Err(format!(
                    "{field} '{value}' contains a path separator, NUL or whitespace"
                ));
            }
        }
        if self.kernel_prefix() == self.initrd_prefix() {
            return Err(format!(
                "kernel and initrd prefix are both '{}'",
                self.kernel_prefix()
            ));
        }
        Ok(())
    }
}
