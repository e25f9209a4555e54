use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use boot_kernels::{read_boot_dir, Config};

use super::{boot_dir_for, listing_table, profiles_for};

#[derive(Args)]
pub struct ListArgs {
    /// JSON output
    #[arg(long)]
    json: bool,

    /// Directory to analyze (default: configured boot dir)
    #[arg(long)]
    bootdir: Option<PathBuf>,

    /// Directory of naming profiles
    #[arg(long)]
    kernel_profiles_dir: Option<PathBuf>,
}

pub fn run(config: &Config, args: ListArgs) -> Result<()> {
    let boot_dir = boot_dir_for(config, args.bootdir);
    let profiles = profiles_for(config, args.kernel_profiles_dir.as_deref());

    let boot = read_boot_dir(&boot_dir, profiles)
        .with_context(|| format!("reading boot directory '{}'", boot_dir.display()))?;

    if args.json {
        println!("{}", serde_json::to_string(&boot)?);
        return Ok(());
    }

    if boot.files().is_empty() {
        println!("No kernel files available.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = boot
        .files()
        .iter()
        .map(|entry| {
            vec![
                entry.profile.kernel_type.clone(),
                entry.profile.suffix.clone(),
                entry.version().to_string(),
                entry.has_initrd().to_string(),
                entry.has_kernel().to_string(),
                boot.is_linked(entry).to_string(),
            ]
        })
        .collect();

    let table = listing_table(
        [
            "Type",
            "Suffix",
            "Version",
            "Has Initrd",
            "Has Kernel Image",
            "Has bzImage,Initrd links",
        ],
        rows,
    );
    println!("{table}");
    Ok(())
}
