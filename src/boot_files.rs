//! Pairing registry for the images found in one boot directory.
//!
//! [`BootFiles`] is filled one image at a time by the scanner. Each image
//! either completes an existing half-filled [`KernelFiles`] entry or starts a
//! new one, so kernel-first and initrd-first discovery end in the same state.
//! Entries keep discovery order.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::image::{InitrdImage, KernelImage};
use crate::profile::CompiledProfile;

/// Well-known link to the active kernel image.
pub const BZIMAGE_LINK: &str = "bzImage";

/// Well-known link to the active initrd image.
pub const INITRD_LINK: &str = "Initrd";

/// A kernel image and its initrd image under one profile.
///
/// At least one side is always set.
#[derive(Debug, Clone, Serialize)]
pub struct KernelFiles {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kernel: Option<KernelImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initrd: Option<InitrdImage>,
    #[serde(rename = "type")]
    pub profile: CompiledProfile,
}

impl KernelFiles {
    fn with_kernel(kernel: KernelImage, profile: &CompiledProfile) -> Self {
        Self {
            kernel: Some(kernel),
            initrd: None,
            profile: profile.clone(),
        }
    }

    fn with_initrd(initrd: InitrdImage, profile: &CompiledProfile) -> Self {
        Self {
            kernel: None,
            initrd: Some(initrd),
            profile: profile.clone(),
        }
    }

    pub fn has_kernel(&self) -> bool {
        self.kernel.is_some()
    }

    pub fn has_initrd(&self) -> bool {
        self.initrd.is_some()
    }

    /// Kernel version, or the initrd version for an orphan initrd.
    pub fn version(&self) -> &str {
        match (&self.kernel, &self.initrd) {
            (Some(kernel), _) => &kernel.version,
            (None, Some(initrd)) => &initrd.version,
            (None, None) => "",
        }
    }
}

/// Snapshot of the kernel/initrd images of one boot directory.
#[derive(Debug, Clone, Serialize)]
pub struct BootFiles {
    dir: PathBuf,
    files: Vec<KernelFiles>,
    #[serde(rename = "bzImage", skip_serializing_if = "Option::is_none")]
    bz_image_link: Option<String>,
    #[serde(rename = "initrd", skip_serializing_if = "Option::is_none")]
    initrd_link: Option<String>,
}

impl BootFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: Vec::new(),
            bz_image_link: None,
            initrd_link: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn files(&self) -> &[KernelFiles] {
        &self.files
    }

    pub fn bz_image_link(&self) -> Option<&str> {
        self.bz_image_link.as_deref()
    }

    pub fn initrd_link(&self) -> Option<&str> {
        self.initrd_link.as_deref()
    }

    pub fn set_bz_image_link(&mut self, target: Option<String>) {
        self.bz_image_link = target;
    }

    pub fn set_initrd_link(&mut self, target: Option<String>) {
        self.initrd_link = target;
    }

    /// Register a kernel image.
    ///
    /// Fails with [`Error::AlreadyPresent`] if an equal kernel image is
    /// already registered; the registry is left untouched in that case.
    pub fn add_kernel_image(&mut self, image: KernelImage, profile: &CompiledProfile) -> Result<()> {
        if self
            .files
            .iter()
            .filter_map(|f| f.kernel.as_ref())
            .any(|k| k.same_image(&image))
        {
            return Err(Error::AlreadyPresent {
                filename: image.filename,
            });
        }

        let waiting = self.files.iter_mut().find(|f| {
            f.kernel.is_none() && f.initrd.as_ref().is_some_and(|i| image.pairs_with(i))
        });

        match waiting {
            Some(entry) => {
                tracing::debug!("paired kernel {} with existing initrd", image.filename);
                entry.kernel = Some(image);
            }
            None => self.files.push(KernelFiles::with_kernel(image, profile)),
        }

        Ok(())
    }

    /// Register an initrd image. Mirrors [`BootFiles::add_kernel_image`].
    pub fn add_initrd_image(&mut self, image: InitrdImage, profile: &CompiledProfile) -> Result<()> {
        if self
            .files
            .iter()
            .filter_map(|f| f.initrd.as_ref())
            .any(|i| i.same_image(&image))
        {
            return Err(Error::AlreadyPresent {
                filename: image.filename,
            });
        }

        let waiting = self.files.iter_mut().find(|f| {
            f.initrd.is_none() && f.kernel.as_ref().is_some_and(|k| k.pairs_with(&image))
        });

        match waiting {
            Some(entry) => {
                tracing::debug!("paired initrd {} with existing kernel", image.filename);
                entry.initrd = Some(image);
            }
            None => self.files.push(KernelFiles::with_initrd(image, profile)),
        }

        Ok(())
    }

    /// Entry whose kernel has `version` and, if given, `kernel_type`.
    ///
    /// When several entries match, the last one wins.
    pub fn get_file(&self, version: &str, kernel_type: Option<&str>) -> Result<&KernelFiles> {
        if version.is_empty() {
            return Err(Error::InvalidVersion);
        }
        let kernel_type = kernel_type.filter(|t| !t.is_empty());

        self.files
            .iter()
            .rev()
            .find(|f| {
                f.kernel.as_ref().is_some_and(|k| {
                    k.version == version && kernel_type.map_or(true, |t| k.kernel_type == t)
                })
            })
            .ok_or_else(|| Error::NotFound {
                version: version.to_string(),
                kernel_type: kernel_type.map(str::to_string),
            })
    }

    /// Whether the `bzImage` link points at a registered kernel file.
    pub fn bz_image_links_to_existing_kernel(&self) -> bool {
        let Some(link) = self.bz_image_link.as_deref() else {
            return false;
        };
        self.files
            .iter()
            .filter_map(|f| f.kernel.as_ref())
            .any(|k| k.filename == link)
    }

    /// Entry the `bzImage` link designates, following version bumps.
    ///
    /// An exact filename match wins. Otherwise the link target is decoded with
    /// the profile of the first entry whose prefix, type and suffix it
    /// carries, and the first entry of the same kernel flavor (any version)
    /// is returned. This finds the new kernel after a package upgrade removed
    /// the file the link still points at.
    pub fn resolve_linked_kernel(&self) -> Option<&KernelFiles> {
        let link = self.bz_image_link.as_deref()?;

        if let Some(exact) = self
            .files
            .iter()
            .find(|f| f.kernel.as_ref().is_some_and(|k| k.filename == link))
        {
            return Some(exact);
        }

        let target = self.files.iter().find_map(|f| {
            let kernel = f.kernel.as_ref()?;
            let mut prefix = kernel.prefix.clone();
            if !kernel.kernel_type.is_empty() {
                prefix.push('-');
                prefix.push_str(&kernel.kernel_type);
            }
            if !link.starts_with(&prefix) {
                return None;
            }
            if !kernel.suffix.is_empty() && !link.ends_with(&kernel.suffix) {
                return None;
            }
            if !f.profile.is_match(link) {
                return None;
            }
            KernelImage::from_file(&f.profile, link).ok()
        })?;

        tracing::debug!(
            "bzImage link {} resolved as version {} of {}",
            link,
            target.version,
            target.prefix
        );

        self.files
            .iter()
            .find(|f| f.kernel.as_ref().is_some_and(|k| k.same_flavor(&target)))
    }

    /// Last registered entry that has a kernel image.
    pub fn latest_kernel(&self) -> Option<&KernelFiles> {
        self.files.iter().rev().find(|f| f.has_kernel())
    }

    /// Whether both links point at this entry's kernel and initrd.
    pub fn is_linked(&self, entry: &KernelFiles) -> bool {
        match (
            &entry.kernel,
            &entry.initrd,
            self.bz_image_link.as_deref(),
            self.initrd_link.as_deref(),
        ) {
            (Some(kernel), Some(initrd), Some(bz), Some(ird)) => {
                kernel.filename == bz && initrd.filename == ird
            }
            _ => false,
        }
    }

    /// Initrd images without a kernel image.
    pub fn orphan_initrds(&self) -> impl Iterator<Item = &InitrdImage> {
        self.files
            .iter()
            .filter(|f| f.kernel.is_none())
            .filter_map(|f| f.initrd.as_ref())
    }

    /// Delete orphan initrd files and drop their entries.
    ///
    /// Returns the removed filenames. With `dry_run` nothing is touched.
    pub fn purge_orphan_initrds(&mut self, dry_run: bool) -> Result<Vec<String>> {
        let orphans: Vec<String> = self
            .orphan_initrds()
            .map(|initrd| initrd.filename.clone())
            .collect();

        if dry_run {
            return Ok(orphans);
        }

        for filename in &orphans {
            let path = self.dir.join(filename);
            tracing::info!("removing orphan initrd {}", path.display());
            fs::remove_file(&path)?;
        }
        self.files.retain(|f| f.kernel.is_some());

        Ok(orphans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::NamingProfile;
    use tempfile::TempDir;

    fn mocaccino() -> CompiledProfile {
        CompiledProfile::compile(NamingProfile {
            name: "Mocaccino".into(),
            kernel_type: "vanilla".into(),
            suffix: "mocaccino".into(),
            with_arch: true,
            ..Default::default()
        })
        .unwrap()
    }

    fn kernel(p: &CompiledProfile, version: &str) -> KernelImage {
        KernelImage::from_file(p, &format!("kernel-vanilla-{version}-mocaccino")).unwrap()
    }

    fn initrd(p: &CompiledProfile, version: &str) -> InitrdImage {
        InitrdImage::from_file(p, &format!("initramfs-vanilla-{version}-mocaccino")).unwrap()
    }

    #[test]
    fn test_pairing_is_order_independent() {
        let p = mocaccino();

        let mut kernel_first = BootFiles::new("/boot");
        kernel_first.add_kernel_image(kernel(&p, "5.10.42"), &p).unwrap();
        kernel_first.add_initrd_image(initrd(&p, "5.10.42"), &p).unwrap();

        let mut initrd_first = BootFiles::new("/boot");
        initrd_first.add_initrd_image(initrd(&p, "5.10.42"), &p).unwrap();
        initrd_first.add_kernel_image(kernel(&p, "5.10.42"), &p).unwrap();

        for boot in [&kernel_first, &initrd_first] {
            assert_eq!(boot.files().len(), 1);
            let entry = &boot.files()[0];
            assert_eq!(entry.kernel, Some(kernel(&p, "5.10.42")));
            assert_eq!(entry.initrd, Some(initrd(&p, "5.10.42")));
        }
    }

    #[test]
    fn test_different_versions_never_pair() {
        let p = mocaccino();
        let mut boot = BootFiles::new("/boot");
        boot.add_kernel_image(kernel(&p, "5.10.42"), &p).unwrap();
        boot.add_initrd_image(initrd(&p, "5.10.41"), &p).unwrap();

        assert_eq!(boot.files().len(), 2);
        assert!(boot.files()[0].initrd.is_none());
        assert!(boot.files()[1].kernel.is_none());
        assert_eq!(boot.orphan_initrds().count(), 1);
    }

    #[test]
    fn test_different_arch_never_pair() {
        let p = mocaccino();
        let mut boot = BootFiles::new("/boot");
        boot.add_kernel_image(kernel(&p, "x86_64-5.10.42"), &p).unwrap();
        boot.add_initrd_image(initrd(&p, "5.10.42"), &p).unwrap();
        assert_eq!(boot.files().len(), 2);
    }

    #[test]
    fn test_duplicate_kernel_rejected() {
        let p = mocaccino();
        let mut boot = BootFiles::new("/boot");
        boot.add_kernel_image(kernel(&p, "5.10.42"), &p).unwrap();

        let err = boot
            .add_kernel_image(kernel(&p, "5.10.42"), &p)
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyPresent { .. }));
        assert_eq!(boot.files().len(), 1);
        assert!(boot.files()[0].initrd.is_none());
    }

    #[test]
    fn test_duplicate_initrd_rejected() {
        let p = mocaccino();
        let mut boot = BootFiles::new("/boot");
        boot.add_initrd_image(initrd(&p, "5.10.42"), &p).unwrap();
        let err = boot
            .add_initrd_image(initrd(&p, "5.10.42"), &p)
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyPresent { .. }));
        assert_eq!(boot.files().len(), 1);
    }

    #[test]
    fn test_complete_entry_is_not_reused() {
        let p = mocaccino();
        let mut boot = BootFiles::new("/boot");
        boot.add_kernel_image(kernel(&p, "5.10.42"), &p).unwrap();
        boot.add_initrd_image(initrd(&p, "5.10.42"), &p).unwrap();
        boot.add_kernel_image(kernel(&p, "5.10.43"), &p).unwrap();
        assert_eq!(boot.files().len(), 2);
        assert!(boot.files()[1].initrd.is_none());
    }

    #[test]
    fn test_get_file() {
        let p = mocaccino();
        let mut boot = BootFiles::new("/boot");
        boot.add_kernel_image(kernel(&p, "5.10.42"), &p).unwrap();
        boot.add_initrd_image(initrd(&p, "5.10.42"), &p).unwrap();

        let entry = boot.get_file("5.10.42", Some("vanilla")).unwrap();
        assert_eq!(entry.version(), "5.10.42");
        assert!(boot.get_file("5.10.42", None).is_ok());
        assert!(boot.get_file("5.10.42", Some("")).is_ok());

        assert!(boot.get_file("9.9.9", None).unwrap_err().is_not_found());
        assert!(boot
            .get_file("5.10.42", Some("genkernel"))
            .unwrap_err()
            .is_not_found());
        assert!(matches!(
            boot.get_file("", None).unwrap_err(),
            Error::InvalidVersion
        ));
    }

    #[test]
    fn test_get_file_last_match_wins() {
        let p = mocaccino();
        let mut boot = BootFiles::new("/boot");
        boot.add_kernel_image(kernel(&p, "5.10.42"), &p).unwrap();
        boot.add_kernel_image(kernel(&p, "x86_64-5.10.42"), &p).unwrap();

        let entry = boot.get_file("5.10.42", None).unwrap();
        assert_eq!(entry.kernel.as_ref().unwrap().arch, "x86_64");
    }

    #[test]
    fn test_link_points_at_existing_kernel() {
        let p = mocaccino();
        let mut boot = BootFiles::new("/boot");
        boot.add_kernel_image(kernel(&p, "5.10.42"), &p).unwrap();
        assert!(!boot.bz_image_links_to_existing_kernel());

        boot.set_bz_image_link(Some("kernel-vanilla-5.10.42-mocaccino".into()));
        assert!(boot.bz_image_links_to_existing_kernel());
        let entry = boot.resolve_linked_kernel().unwrap();
        assert_eq!(entry.version(), "5.10.42");
    }

    #[test]
    fn test_resolve_linked_kernel_after_upgrade() {
        let p = mocaccino();
        let mut boot = BootFiles::new("/boot");
        boot.add_kernel_image(kernel(&p, "5.10.42"), &p).unwrap();
        boot.set_bz_image_link(Some("kernel-vanilla-5.10.41-mocaccino".into()));

        assert!(!boot.bz_image_links_to_existing_kernel());
        let entry = boot.resolve_linked_kernel().unwrap();
        assert_eq!(entry.version(), "5.10.42");
    }

    #[test]
    fn test_resolve_linked_kernel_other_flavor() {
        let p = mocaccino();
        let mut boot = BootFiles::new("/boot");
        boot.add_kernel_image(kernel(&p, "5.10.42"), &p).unwrap();

        boot.set_bz_image_link(Some("kernel-genkernel-x86_64-5.10.41-sabayon".into()));
        assert!(boot.resolve_linked_kernel().is_none());

        boot.set_bz_image_link(Some("kernel-vanilla-x86_64-5.10.41-mocaccino".into()));
        assert!(boot.resolve_linked_kernel().is_none());

        boot.set_bz_image_link(None);
        assert!(boot.resolve_linked_kernel().is_none());
    }

    #[test]
    fn test_is_linked_and_latest_kernel() {
        let p = mocaccino();
        let mut boot = BootFiles::new("/boot");
        boot.add_kernel_image(kernel(&p, "5.10.41"), &p).unwrap();
        boot.add_kernel_image(kernel(&p, "5.10.42"), &p).unwrap();
        boot.add_initrd_image(initrd(&p, "5.10.42"), &p).unwrap();
        boot.add_initrd_image(initrd(&p, "5.4.0"), &p).unwrap();

        assert_eq!(boot.latest_kernel().unwrap().version(), "5.10.42");

        boot.set_bz_image_link(Some("kernel-vanilla-5.10.42-mocaccino".into()));
        assert!(!boot.is_linked(&boot.files()[1]));
        boot.set_initrd_link(Some("initramfs-vanilla-5.10.42-mocaccino".into()));
        assert!(boot.is_linked(&boot.files()[1]));
        assert!(!boot.is_linked(&boot.files()[0]));
    }

    #[test]
    fn test_purge_orphan_initrds() {
        let temp = TempDir::new().unwrap();
        let p = mocaccino();
        let mut boot = BootFiles::new(temp.path());
        for name in [
            "kernel-vanilla-5.10.42-mocaccino",
            "initramfs-vanilla-5.10.42-mocaccino",
            "initramfs-vanilla-5.4.0-mocaccino",
        ] {
            fs::write(temp.path().join(name), b"x").unwrap();
        }
        boot.add_kernel_image(kernel(&p, "5.10.42"), &p).unwrap();
        boot.add_initrd_image(initrd(&p, "5.10.42"), &p).unwrap();
        boot.add_initrd_image(initrd(&p, "5.4.0"), &p).unwrap();

        let planned = boot.purge_orphan_initrds(true).unwrap();
        assert_eq!(planned, vec!["initramfs-vanilla-5.4.0-mocaccino".to_string()]);
        assert!(temp.path().join("initramfs-vanilla-5.4.0-mocaccino").exists());
        assert_eq!(boot.files().len(), 2);

        let removed = boot.purge_orphan_initrds(false).unwrap();
        assert_eq!(removed, planned);
        assert!(!temp.path().join("initramfs-vanilla-5.4.0-mocaccino").exists());
        assert!(temp.path().join("initramfs-vanilla-5.10.42-mocaccino").exists());
        assert_eq!(boot.files().len(), 1);
    }

    #[test]
    fn test_serializes_like_a_listing() {
        let p = mocaccino();
        let mut boot = BootFiles::new("/boot");
        boot.add_kernel_image(kernel(&p, "5.10.42"), &p).unwrap();
        boot.set_bz_image_link(Some("kernel-vanilla-5.10.42-mocaccino".into()));

        let json = serde_json::to_value(&boot).unwrap();
        assert_eq!(json["dir"], "/boot");
        assert_eq!(json["bzImage"], "kernel-vanilla-5.10.42-mocaccino");
        assert_eq!(json["files"][0]["kernel"]["version"], "5.10.42");
        assert_eq!(json["files"][0]["type"]["type"], "vanilla");
        assert!(json.get("initrd").is_none());
    }
}
