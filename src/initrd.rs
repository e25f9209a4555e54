//! Initrd image generation.
//!
//! The generator itself is an external tool. [`DracutBuilder`] wraps
//! `dracut`; other generators can implement [`InitrdBuilder`].

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Command;

use crate::boot_files::KernelFiles;
use crate::image::{InitrdImage, KernelImage};

/// Default dracut options.
pub const DEFAULT_DRACUT_ARGS: &str =
    "-H -q -f -o systemd -o systemd-initrd -o systemd-networkd -o dracut-systemd";

/// Default dracut executable, looked up in `PATH`.
pub const DEFAULT_DRACUT_PROGRAM: &str = "dracut";

/// Produces (or refreshes) the initrd image of a kernel entry.
pub trait InitrdBuilder {
    /// Build the initrd for `entry` inside `boot_dir`.
    ///
    /// When the entry has no initrd yet, the expected record is synthesized
    /// from the kernel and returned once the image was produced, so the
    /// caller can register it. A failed build returns an error and nothing
    /// else.
    fn build(&self, entry: &KernelFiles, boot_dir: &Path) -> Result<Option<InitrdImage>>;
}

/// Builds initrd images with `dracut`.
#[derive(Debug, Clone)]
pub struct DracutBuilder {
    program: String,
    args: Vec<String>,
    dry_run: bool,
}

impl DracutBuilder {
    /// `args` is split on whitespace.
    pub fn new(args: &str, dry_run: bool) -> Self {
        Self {
            program: DEFAULT_DRACUT_PROGRAM.to_string(),
            args: args.split_whitespace().map(str::to_string).collect(),
            dry_run,
        }
    }

    /// Use another dracut executable (name in `PATH` or absolute path).
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Arguments passed to dracut to build `initrd` for `kernel`.
    pub fn command_args(
        &self,
        kernel: &KernelImage,
        initrd: &InitrdImage,
        boot_dir: &Path,
    ) -> Vec<String> {
        let mut args = self.args.clone();
        args.push("--kver".to_string());
        args.push(kernel.kernel_release());
        args.push(boot_dir.join(&initrd.filename).display().to_string());
        args
    }
}

impl InitrdBuilder for DracutBuilder {
    fn build(&self, entry: &KernelFiles, boot_dir: &Path) -> Result<Option<InitrdImage>> {
        let Some(kernel) = entry.kernel.as_ref() else {
            bail!("invalid kernel entry: no kernel image for version {}", entry.version());
        };

        let (initrd, synthesized) = match &entry.initrd {
            Some(initrd) => (initrd.clone(), false),
            None => {
                let initrd = InitrdImage::for_kernel(kernel, &entry.profile);
                tracing::debug!("no initrd for {}, expecting {}", kernel.filename, initrd.filename);
                (initrd, true)
            }
        };

        let args = self.command_args(kernel, &initrd, boot_dir);

        if self.dry_run {
            println!("[dry-run mode] command: {} {}", self.program, args.join(" "));
            return Ok(synthesized.then_some(initrd));
        }

        let dracut = which::which(&self.program)
            .with_context(|| format!("locating {} in PATH", self.program))?;
        let initrd_file = boot_dir.join(&initrd.filename);
        println!("Creating initrd image {}...", initrd_file.display());

        let status = Command::new(&dracut)
            .args(&args)
            .status()
            .with_context(|| format!("running {}", dracut.display()))?;

        if !status.success() {
            bail!("dracut command failed with status {status}");
        }

        println!("Creating initrd image {}... DONE", initrd_file.display());
        Ok(synthesized.then_some(initrd))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::{set_links, LinkOutcome};
    use crate::profile::default_profiles;
    use crate::scan::read_boot_dir;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_dry_run_synthesizes_initrd() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("kernel-vanilla-x86_64-5.10.42-mocaccino"), b"k").unwrap();

        let mut boot = read_boot_dir(temp.path(), default_profiles()).unwrap();
        let entry = boot.files()[0].clone();
        assert!(entry.initrd.is_none());

        let builder = DracutBuilder::new(DEFAULT_DRACUT_ARGS, true);
        let initrd = builder.build(&entry, boot.dir()).unwrap().unwrap();
        assert_eq!(initrd.filename, "initramfs-vanilla-x86_64-5.10.42-mocaccino");
        assert!(entry.kernel.as_ref().unwrap().pairs_with(&initrd));
        assert!(!temp.path().join(&initrd.filename).exists());

        boot.add_initrd_image(initrd, &entry.profile).unwrap();
        assert_eq!(boot.files().len(), 1);
        assert!(boot.files()[0].has_initrd());
    }

    #[test]
    fn test_existing_initrd_is_not_returned() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("kernel-vanilla-5.10.42-mocaccino"), b"k").unwrap();
        fs::write(temp.path().join("initramfs-vanilla-5.10.42-mocaccino"), b"i").unwrap();

        let boot = read_boot_dir(temp.path(), default_profiles()).unwrap();
        let builder = DracutBuilder::new(DEFAULT_DRACUT_ARGS, true);
        assert!(builder.build(&boot.files()[0], boot.dir()).unwrap().is_none());
    }

    #[test]
    fn test_command_args() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("kernel-vanilla-5.10.42-mocaccino"), b"k").unwrap();
        fs::write(temp.path().join("initramfs-vanilla-5.10.42-mocaccino"), b"i").unwrap();

        let boot = read_boot_dir(temp.path(), default_profiles()).unwrap();
        let entry = &boot.files()[0];
        let builder = DracutBuilder::new("-H  -q", false);
        let args = builder.command_args(
            entry.kernel.as_ref().unwrap(),
            entry.initrd.as_ref().unwrap(),
            boot.dir(),
        );
        assert_eq!(
            args,
            vec![
                "-H".to_string(),
                "-q".to_string(),
                "--kver".to_string(),
                "5.10.42-mocaccino".to_string(),
                temp.path()
                    .join("initramfs-vanilla-5.10.42-mocaccino")
                    .display()
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_build_requires_kernel() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("initramfs-vanilla-5.10.42-mocaccino"), b"i").unwrap();

        let boot = read_boot_dir(temp.path(), default_profiles()).unwrap();
        let builder = DracutBuilder::new(DEFAULT_DRACUT_ARGS, true);
        assert!(builder.build(&boot.files()[0], boot.dir()).is_err());
    }

    #[test]
    fn test_failed_build_leaves_no_initrd_link() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("kernel-vanilla-5.10.42-mocaccino"), b"k").unwrap();

        let boot = read_boot_dir(temp.path(), default_profiles()).unwrap();
        let builder = DracutBuilder::new(DEFAULT_DRACUT_ARGS, false)
            .program("boot-kernels-test-no-such-dracut");
        let err = builder.build(&boot.files()[0], boot.dir()).unwrap_err();
        assert!(format!("{err:#}").contains("locating boot-kernels-test-no-such-dracut"));

        let entry = &boot.files()[0];
        assert!(entry.initrd.is_none());
        assert_eq!(set_links(entry, boot.dir()).unwrap(), LinkOutcome::KernelOnly);
        assert!(temp.path().join("bzImage").is_symlink());
        assert!(!temp.path().join("Initrd").is_symlink());
    }
}
