//! Bootloader configuration regeneration via `grub-mkconfig`.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

const GRUB_MKCONFIG: &str = "grub-mkconfig";

/// Default grub config location inside a boot directory.
pub fn default_config_path(boot_dir: &Path) -> PathBuf {
    boot_dir.join("grub").join("grub.cfg")
}

/// Regenerate `config_path` with `grub-mkconfig -o <config_path>`.
///
/// The parent directory is created when missing. With `dry_run` the command
/// is only printed.
pub fn mkconfig(config_path: &Path, dry_run: bool) -> Result<()> {
    if config_path.as_os_str().is_empty() {
        bail!("invalid grub config file path");
    }

    let args = ["-o".to_string(), config_path.display().to_string()];

    if dry_run {
        println!("[dry-run mode] command: {} {}", GRUB_MKCONFIG, args.join(" "));
        return Ok(());
    }

    if let Some(grub_dir) = config_path.parent() {
        fs::create_dir_all(grub_dir)
            .with_context(|| format!("creating directory '{}'", grub_dir.display()))?;
    }

    let grub = which::which(GRUB_MKCONFIG)
        .with_context(|| format!("locating {GRUB_MKCONFIG} in PATH"))?;

    println!("Creating grub config file {}...", config_path.display());

    let status = Command::new(&grub)
        .args(&args)
        .status()
        .with_context(|| format!("running {}", grub.display()))?;

    if !status.success() {
        bail!("{GRUB_MKCONFIG} command failed with status {status}");
    }

    Ok(())
}
