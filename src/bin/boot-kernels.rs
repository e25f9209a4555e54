//! boot-kernels - manage kernel and initrd images of a boot partition
//!
//! Usage:
//!   boot-kernels list [--json]
//!   boot-kernels profiles [--json]
//!   boot-kernels geninitrd --all --set-links --purge --grub

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use boot_kernels::Config;

#[derive(Parser)]
#[command(name = "boot-kernels")]
#[command(about = "Manage kernel and initrd images of the boot partition")]
struct Cli {
    /// Configuration file (default: /etc/boot-kernels/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List kernels available in the boot directory
    #[command(alias = "l")]
    List(commands::list::ListArgs),

    /// List naming profiles in use
    #[command(alias = "p")]
    Profiles(commands::profiles::ProfilesArgs),

    /// Generate initrd images and set the bzImage/Initrd links
    #[command(alias = "gi")]
    Geninitrd(commands::geninitrd::GeninitrdArgs),
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::List(args) => commands::list::run(&config, args),
        Command::Profiles(args) => commands::profiles::run(&config, args),
        Command::Geninitrd(args) => commands::geninitrd::run(&config, args),
    }
}
