use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use boot_kernels::Config;

use super::{listing_table, profiles_for};

#[derive(Args)]
pub struct ProfilesArgs {
    /// JSON output
    #[arg(long)]
    json: bool,

    /// Directory of naming profiles
    #[arg(long)]
    kernel_profiles_dir: Option<PathBuf>,
}

pub fn run(config: &Config, args: ProfilesArgs) -> Result<()> {
    let profiles = profiles_for(config, args.kernel_profiles_dir.as_deref());

    if args.json {
        println!("{}", serde_json::to_string(&profiles)?);
        return Ok(());
    }

    let rows: Vec<Vec<String>> = profiles
        .iter()
        .map(|p| {
            vec![
                p.name.clone(),
                p.kernel_prefix().to_string(),
                p.initrd_prefix().to_string(),
                p.suffix.clone(),
                p.kernel_type.clone(),
                p.with_arch.to_string(),
            ]
        })
        .collect();

    let table = listing_table(
        ["Name", "Kernel Prefix", "Initrd Prefix", "Suffix", "Type", "With Arch"],
        rows,
    );
    println!("{table}");
    Ok(())
}
