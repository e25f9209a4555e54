pub mod geninitrd;
pub mod list;
pub mod profiles;

use comfy_table::presets::ASCII_MARKDOWN;
use comfy_table::{Cell, Table};
use std::path::{Path, PathBuf};

use boot_kernels::profile::resolve_profiles;
use boot_kernels::{Config, NamingProfile};

/// Profiles from `--kernel-profiles-dir` or the configured directory.
pub fn profiles_for(config: &Config, dir: Option<&Path>) -> Vec<NamingProfile> {
    resolve_profiles(Some(dir.unwrap_or(&config.profiles_dir)))
}

pub fn boot_dir_for(config: &Config, dir: Option<PathBuf>) -> PathBuf {
    dir.unwrap_or_else(|| config.boot_dir.clone())
}

/// Listing table with a header row and `|` column borders.
pub fn listing_table<H, R>(headers: H, rows: R) -> Table
where
    H: IntoIterator,
    H::Item: Into<Cell>,
    R: IntoIterator<Item = Vec<String>>,
{
    let mut table = Table::new();
    table.load_preset(ASCII_MARKDOWN).set_header(headers);
    for row in rows {
        table.add_row(row);
    }
    table
}
