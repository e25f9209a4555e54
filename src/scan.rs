//! Boot directory scanner.
//!
//! Lists the immediate entries of a boot directory in file name order,
//! records the `bzImage`/`Initrd` link targets and feeds every regular file
//! that matches a profile into a [`BootFiles`] registry. Files that match no
//! profile (bootloader files, configs, System.map, ...) are skipped.

use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::boot_files::{BootFiles, BZIMAGE_LINK, INITRD_LINK};
use crate::error::{Error, Result};
use crate::image::{InitrdImage, KernelImage};
use crate::profile::{ImageKind, NamingProfile, ProfileSet};

/// Boot directory used when none is given.
pub const DEFAULT_BOOT_DIR: &str = "/boot";

/// Compile `profiles` and scan `boot_dir`.
///
/// A profile that fails to compile aborts before the directory is read.
pub fn read_boot_dir<I>(boot_dir: &Path, profiles: I) -> Result<BootFiles>
where
    I: IntoIterator<Item = NamingProfile>,
{
    let profiles = ProfileSet::compile(profiles)?;
    scan_boot_dir(boot_dir, &profiles)
}

/// Scan `boot_dir` with an already compiled profile set.
pub fn scan_boot_dir(boot_dir: &Path, profiles: &ProfileSet) -> Result<BootFiles> {
    let read_dir_err = |source: std::io::Error| Error::ReadDir {
        path: boot_dir.to_path_buf(),
        source,
    };

    let mut boot = BootFiles::new(boot_dir);

    let walker = WalkDir::new(boot_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(|e| read_dir_err(e.into()))?;
        let Some(name) = entry.file_name().to_str() else {
            tracing::debug!("skipping non UTF-8 entry {}", entry.path().display());
            continue;
        };
        let file_type = entry.file_type();

        if file_type.is_dir() {
            continue;
        }

        tracing::debug!("analyzing file {}...", name);

        if file_type.is_symlink() {
            if name == BZIMAGE_LINK || name == INITRD_LINK {
                let target = fs::read_link(entry.path()).map_err(read_dir_err)?;
                let target = target.to_string_lossy().into_owned();
                tracing::debug!("{} links to {}", name, target);
                if name == BZIMAGE_LINK {
                    boot.set_bz_image_link(Some(target));
                } else {
                    boot.set_initrd_link(Some(target));
                }
            }
            continue;
        }

        if !file_type.is_file() {
            continue;
        }

        let Some((profile, kind)) = profiles.find(name) else {
            continue;
        };
        tracing::debug!("file {} matches profile {}", name, profile.label());

        match kind {
            ImageKind::Initrd => {
                let image = InitrdImage::from_file(profile, name)?;
                boot.add_initrd_image(image, profile)?;
            }
            ImageKind::Kernel => {
                let image = KernelImage::from_file(profile, name)?;
                boot.add_kernel_image(image, profile)?;
            }
        }
    }

    Ok(boot)
}
