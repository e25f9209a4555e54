//! `bzImage`/`Initrd` link maintenance.
//!
//! Both links are relative (they name a file in the same directory) so the
//! boot directory stays valid when mounted elsewhere.

use std::fs;
use std::os::unix::fs::symlink;
use std::path::Path;

use crate::boot_files::{KernelFiles, BZIMAGE_LINK, INITRD_LINK};
use crate::error::{Error, Result};

/// Which links [`set_links`] created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// `bzImage` and `Initrd` both point at the entry.
    Both,
    /// Only `bzImage` was created: the entry has no initrd image.
    KernelOnly,
}

/// Point `bzImage` (and `Initrd`, when the entry has one) at `entry`.
///
/// Existing links are removed first; a missing link is not an error. A
/// missing initrd is only a warning since some releases ship the initrd
/// through packages.
pub fn set_links(entry: &KernelFiles, boot_dir: &Path) -> Result<LinkOutcome> {
    let kernel = entry.kernel.as_ref().ok_or_else(|| Error::MissingKernel {
        filename: entry
            .initrd
            .as_ref()
            .map(|i| i.filename.clone())
            .unwrap_or_default(),
    })?;

    let bz_image = boot_dir.join(BZIMAGE_LINK);
    let initrd_link = boot_dir.join(INITRD_LINK);

    // Ignoring errors
    let _ = fs::remove_file(&bz_image);
    let _ = fs::remove_file(&initrd_link);

    symlink(&kernel.filename, &bz_image).map_err(|source| Error::Link {
        path: bz_image.clone(),
        source,
    })?;
    tracing::info!("{} -> {}", bz_image.display(), kernel.filename);

    let Some(initrd) = entry.initrd.as_ref() else {
        tracing::warn!(
            "no initrd image found for kernel {}, {} link not created",
            kernel.version,
            INITRD_LINK
        );
        return Ok(LinkOutcome::KernelOnly);
    };

    symlink(&initrd.filename, &initrd_link).map_err(|source| Error::Link {
        path: initrd_link.clone(),
        source,
    })?;
    tracing::info!("{} -> {}", initrd_link.display(), initrd.filename);

    Ok(LinkOutcome::Both)
}
