//! Kernel and initrd image records and the filename codec.
//!
//! Decoding reads every field from the named groups of the profile pattern
//! (see [`crate::profile::derive_pattern`]). Encoding is the inverse:
//!
//! ```text
//! prefix[-type][-arch][-version][-suffix]
//! ```
//!
//! For a record whose fields contain no `-` and whose optional fields match
//! the profile (type and suffix equal to the profile's, arch empty unless the
//! profile is `with_arch`), `KernelImage::from_file(profile, &image.file_name())`
//! gives the record back.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::profile::{
    CompiledProfile, ImageKind, NamingProfile, DEFAULT_INITRD_PREFIX, DEFAULT_KERNEL_PREFIX,
    SEPARATOR,
};

/// A kernel image file in the boot directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelImage {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub filename: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prefix: String,
    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub kernel_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub arch: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub suffix: String,
}

/// An initrd image file in the boot directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitrdImage {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub filename: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prefix: String,
    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub kernel_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub arch: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub suffix: String,
}

struct Decoded {
    prefix: String,
    arch: String,
    version: String,
    suffix: String,
}

fn decode(profile: &CompiledProfile, filename: &str, expected: ImageKind) -> Result<Decoded> {
    let no_match = || Error::NoMatch {
        filename: filename.to_string(),
        profile: profile.label().to_string(),
    };

    let caps = profile.pattern().captures(filename).ok_or_else(no_match)?;
    let group = |name: &str| {
        caps.name(name)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    };

    let (kind, prefix) = match (caps.name("initrd"), caps.name("kernel")) {
        (Some(m), _) => (ImageKind::Initrd, m.as_str().to_string()),
        (None, Some(m)) => (ImageKind::Kernel, m.as_str().to_string()),
        (None, None) => return Err(no_match()),
    };
    if kind != expected {
        return Err(no_match());
    }

    let version = group("version");
    if version.is_empty() {
        return Err(Error::MissingVersion {
            filename: filename.to_string(),
            profile: profile.label().to_string(),
        });
    }

    Ok(Decoded {
        prefix,
        arch: group("arch"),
        version,
        suffix: group("suffix"),
    })
}

fn encode(
    prefix: &str,
    default_prefix: &str,
    kernel_type: &str,
    arch: &str,
    version: &str,
    suffix: &str,
) -> String {
    let mut name = if prefix.is_empty() {
        default_prefix.to_string()
    } else {
        prefix.to_string()
    };
    for segment in [kernel_type, arch, version, suffix] {
        if !segment.is_empty() {
            name.push(SEPARATOR);
            name.push_str(segment);
        }
    }
    name
}

impl KernelImage {
    /// Decode a kernel filename with the given profile.
    pub fn from_file(profile: &CompiledProfile, filename: &str) -> Result<Self> {
        let decoded = decode(profile, filename, ImageKind::Kernel)?;
        Ok(Self {
            filename: filename.to_string(),
            prefix: decoded.prefix,
            kernel_type: profile.kernel_type.clone(),
            arch: decoded.arch,
            version: decoded.version,
            suffix: decoded.suffix,
        })
    }

    /// Filename this record encodes to.
    pub fn file_name(&self) -> String {
        encode(
            &self.prefix,
            DEFAULT_KERNEL_PREFIX,
            &self.kernel_type,
            &self.arch,
            &self.version,
            &self.suffix,
        )
    }

    /// Same type, prefix, suffix, version and arch. The filename is not compared.
    pub fn same_image(&self, other: &KernelImage) -> bool {
        self.same_flavor(other) && self.version == other.version
    }

    /// Same prefix, type, arch and suffix: the same kernel line, any version.
    pub fn same_flavor(&self, other: &KernelImage) -> bool {
        self.prefix == other.prefix
            && self.kernel_type == other.kernel_type
            && self.arch == other.arch
            && self.suffix == other.suffix
    }

    /// Whether `initrd` belongs to this kernel.
    pub fn pairs_with(&self, initrd: &InitrdImage) -> bool {
        self.suffix == initrd.suffix
            && self.kernel_type == initrd.kernel_type
            && self.version == initrd.version
            && self.arch == initrd.arch
    }

    /// Release string handed to initrd generators: `version[-suffix]`.
    pub fn kernel_release(&self) -> String {
        if self.suffix.is_empty() {
            self.version.clone()
        } else {
            format!("{}{}{}", self.version, SEPARATOR, self.suffix)
        }
    }
}

impl InitrdImage {
    /// Decode an initrd filename with the given profile.
    pub fn from_file(profile: &CompiledProfile, filename: &str) -> Result<Self> {
        let decoded = decode(profile, filename, ImageKind::Initrd)?;
        Ok(Self {
            filename: filename.to_string(),
            prefix: decoded.prefix,
            kernel_type: profile.kernel_type.clone(),
            arch: decoded.arch,
            version: decoded.version,
            suffix: decoded.suffix,
        })
    }

    /// The initrd a kernel is expected to have under `profile`.
    pub fn for_kernel(kernel: &KernelImage, profile: &NamingProfile) -> Self {
        let mut initrd = Self {
            filename: String::new(),
            prefix: profile.initrd_prefix().to_string(),
            kernel_type: kernel.kernel_type.clone(),
            arch: kernel.arch.clone(),
            version: kernel.version.clone(),
            suffix: kernel.suffix.clone(),
        };
        initrd.filename = initrd.file_name();
        initrd
    }

    pub fn file_name(&self) -> String {
        encode(
            &self.prefix,
            DEFAULT_INITRD_PREFIX,
            &self.kernel_type,
            &self.arch,
            &self.version,
            &self.suffix,
        )
    }

    /// Same prefix, kernel type, arch, version and suffix.
    pub fn same_image(&self, other: &InitrdImage) -> bool {
        self.prefix == other.prefix
            && self.kernel_type == other.kernel_type
            && self.arch == other.arch
            && self.version == other.version
            && self.suffix == other.suffix
    }
}
