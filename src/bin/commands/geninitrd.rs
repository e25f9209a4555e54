use anyhow::{Context, Result};
use clap::{ArgGroup, Args};
use std::path::{Path, PathBuf};

use boot_kernels::release::{os_release, Release};
use boot_kernels::{
    grub, read_boot_dir, set_links, BootFiles, Config, DracutBuilder, InitrdBuilder,
    KernelFiles, LinkOutcome,
};

use super::{boot_dir_for, profiles_for};

#[derive(Args)]
#[command(group(ArgGroup::new("target").required(true).args(["all", "version"])))]
pub struct GeninitrdArgs {
    /// Rebuild the initrd of every kernel
    #[arg(long)]
    all: bool,

    /// Kernel version of the initrd image to build
    #[arg(long)]
    version: Option<String>,

    /// Kernel type of the initrd image to build
    #[arg(long)]
    ktype: Option<String>,

    /// Set bzImage and Initrd links for the selected kernel, or follow an upgraded kernel
    #[arg(long)]
    set_links: bool,

    /// Remove initrd images without kernel
    #[arg(long)]
    purge: bool,

    /// Regenerate grub.cfg
    #[arg(long)]
    grub: bool,

    /// Print commands instead of running them
    #[arg(long)]
    dry_run: bool,

    /// Directory to analyze (default: configured boot dir)
    #[arg(long)]
    bootdir: Option<PathBuf>,

    /// Override the dracut options (BOOT_KERNELS_DRACUT_ARGS or MOS_DRACUT_ARGS win over this)
    #[arg(long)]
    dracut_opts: Option<String>,

    /// Directory of naming profiles
    #[arg(long)]
    kernel_profiles_dir: Option<PathBuf>,
}

pub fn run(config: &Config, args: GeninitrdArgs) -> Result<()> {
    let boot_dir = boot_dir_for(config, args.bootdir.clone());
    let profiles = profiles_for(config, args.kernel_profiles_dir.as_deref());

    let mut boot = read_boot_dir(&boot_dir, profiles)
        .with_context(|| format!("reading boot directory '{}'", boot_dir.display()))?;
    let release = os_release(&config.release_file)?;
    let external = release.manages_initrd_externally(&config.external_initrd_releases);

    let builder = DracutBuilder::new(&config.dracut_args(args.dracut_opts.as_deref()), args.dry_run)
        .program(&config.dracut_program);

    match args.version.as_deref() {
        Some(version) => generate_one(&mut boot, &builder, version, &args, &release, external)?,
        None => generate_all(&mut boot, &builder, &args, &release, external),
    }

    if args.purge {
        if external {
            println!("On {} the initrd is managed by a package. Nothing to purge.", release.as_str());
        } else {
            match boot.purge_orphan_initrds(args.dry_run) {
                Ok(purged) => {
                    for filename in purged {
                        let prefix = if args.dry_run { "[dry-run mode] " } else { "" };
                        println!("{}Removed orphan initrd {}", prefix, filename);
                    }
                }
                Err(e) => println!("Error on purge orphan initrd images: {:#}", e),
            }
        }
    }

    if args.grub {
        grub::mkconfig(&grub_config(config, &args, boot.dir()), args.dry_run)
            .context("updating grub.cfg")?;
    }

    Ok(())
}

fn grub_config(config: &Config, args: &GeninitrdArgs, boot_dir: &Path) -> PathBuf {
    match args.bootdir {
        Some(_) => grub::default_config_path(boot_dir),
        None => config.grub_config_path(),
    }
}

fn generate_all(
    boot: &mut BootFiles,
    builder: &DracutBuilder,
    args: &GeninitrdArgs,
    release: &Release,
    external: bool,
) {
    if external {
        println!(
            "{} release uses initrd packages. Nothing to do for initrd images generation.",
            release.as_str()
        );
    } else {
        // Orphan initrd images are handled by --purge.
        let kernels: Vec<KernelFiles> =
            boot.files().iter().filter(|f| f.has_kernel()).cloned().collect();
        for entry in &kernels {
            build_initrd(boot, builder, entry);
        }
    }

    if !args.set_links || boot.bz_image_links_to_existing_kernel() {
        return;
    }

    let target = match boot.resolve_linked_kernel() {
        Some(entry) => Some(entry),
        None => {
            let latest = boot.latest_kernel();
            if let Some(entry) = latest {
                println!("No valid links found. Setting links to kernel {}.", entry.version());
            }
            latest
        }
    };

    if let Some(entry) = target {
        link_entry(entry, boot.dir(), args.dry_run, release, external);
    }
}

fn generate_one(
    boot: &mut BootFiles,
    builder: &DracutBuilder,
    version: &str,
    args: &GeninitrdArgs,
    release: &Release,
    external: bool,
) -> Result<()> {
    let entry = boot.get_file(version, args.ktype.as_deref())?.clone();

    if external {
        println!(
            "{} release uses initrd packages. Nothing to do for initrd images generation.",
            release.as_str()
        );
    } else {
        build_initrd(boot, builder, &entry);
    }

    if args.set_links {
        let entry = boot.get_file(version, args.ktype.as_deref())?;
        link_entry(entry, boot.dir(), args.dry_run, release, external);
    }

    Ok(())
}

/// Build the initrd of `entry` and register a newly produced image.
/// Failures are reported and leave the registry untouched.
fn build_initrd(boot: &mut BootFiles, builder: &DracutBuilder, entry: &KernelFiles) {
    let filename = entry.kernel.as_ref().map(|k| k.filename.as_str()).unwrap_or_default();

    match builder.build(entry, boot.dir()) {
        Ok(Some(initrd)) => {
            if let Err(e) = boot.add_initrd_image(initrd, &entry.profile) {
                println!("Error on register initrd image for kernel {}: {:#}", filename, e);
            }
        }
        Ok(None) => {}
        Err(e) => println!(
            "Error on generate initrd image for kernel {}: {:#}. Continuing.",
            filename, e
        ),
    }
}

fn link_entry(entry: &KernelFiles, boot_dir: &Path, dry_run: bool, release: &Release, external: bool) {
    if dry_run {
        if let Some(kernel) = &entry.kernel {
            println!("[dry-run mode] bzImage -> {}", kernel.filename);
        }
        if let Some(initrd) = &entry.initrd {
            println!("[dry-run mode] Initrd -> {}", initrd.filename);
        }
        return;
    }

    match set_links(entry, boot_dir) {
        Ok(LinkOutcome::Both) => {}
        Ok(LinkOutcome::KernelOnly) => {
            println!(
                "WARN: No initrd image found for kernel {}. Initrd link not created.",
                entry.version()
            );
            if external {
                println!(
                    "For the {} release install the initramfs package of your kernel.",
                    release.as_str()
                );
            }
        }
        Err(e) => println!("Error on set links for kernel {}: {:#}", entry.version(), e),
    }
}
