//! Tool configuration.
//!
//! Loaded from a TOML file (default [`DEFAULT_CONFIG_PATH`]). Every key is
//! optional; command-line flags override the file afterwards, and the
//! [`DRACUT_ARGS_ENV`] variables override the dracut options of both.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::initrd::{DEFAULT_DRACUT_ARGS, DEFAULT_DRACUT_PROGRAM};
use crate::scan::DEFAULT_BOOT_DIR;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/boot-kernels/config.toml";
pub const DEFAULT_PROFILES_DIR: &str = "/etc/mocaccino/kernels-profiles";
pub const DEFAULT_RELEASE_FILE: &str = "/etc/mocaccino/release";

/// Environment variables overriding the dracut options, in lookup order.
/// They win over `--dracut-opts` and the config file.
pub const DRACUT_ARGS_ENV: [&str; 2] = ["BOOT_KERNELS_DRACUT_ARGS", "MOS_DRACUT_ARGS"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub boot_dir: PathBuf,
    pub profiles_dir: PathBuf,
    pub release_file: PathBuf,
    /// Releases whose initrd is shipped by a package.
    pub external_initrd_releases: Vec<String>,
    pub dracut_args: String,
    pub dracut_program: String,
    /// `None` means `<boot_dir>/grub/grub.cfg`.
    pub grub_config: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            boot_dir: PathBuf::from(DEFAULT_BOOT_DIR),
            profiles_dir: PathBuf::from(DEFAULT_PROFILES_DIR),
            release_file: PathBuf::from(DEFAULT_RELEASE_FILE),
            external_initrd_releases: vec!["micro".to_string(), "micro-embedded".to_string()],
            dracut_args: DEFAULT_DRACUT_ARGS.to_string(),
            dracut_program: DEFAULT_DRACUT_PROGRAM.to_string(),
            grub_config: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    boot_dir: Option<PathBuf>,
    profiles_dir: Option<PathBuf>,
    release_file: Option<PathBuf>,
    external_initrd_releases: Option<Vec<String>>,
    dracut_args: Option<String>,
    dracut_program: Option<String>,
    grub_config: Option<PathBuf>,
}

impl Config {
    /// Load the configuration.
    ///
    /// With `path == None` the default location is used and a missing file
    /// yields the defaults. An explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::from_file(default)
                } else {
                    tracing::debug!("no config at {}, using defaults", DEFAULT_CONFIG_PATH);
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config '{}'", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing config '{}'", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let parsed: ConfigToml = toml::from_str(content)?;
        let defaults = Self::default();

        Ok(Self {
            boot_dir: parsed.boot_dir.unwrap_or(defaults.boot_dir),
            profiles_dir: parsed.profiles_dir.unwrap_or(defaults.profiles_dir),
            release_file: parsed.release_file.unwrap_or(defaults.release_file),
            external_initrd_releases: parsed
                .external_initrd_releases
                .unwrap_or(defaults.external_initrd_releases)
                .into_iter()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect(),
            dracut_args: parsed.dracut_args.unwrap_or(defaults.dracut_args),
            dracut_program: parsed.dracut_program.unwrap_or(defaults.dracut_program),
            grub_config: parsed.grub_config,
        })
    }

    /// Dracut options: environment, then `cli` (`--dracut-opts`), then the file.
    pub fn dracut_args(&self, cli: Option<&str>) -> String {
        let env = DRACUT_ARGS_ENV
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()));
        if env.is_some() {
            tracing::debug!("dracut args taken from the environment");
        }
        pick_dracut_args(env.as_deref(), cli, &self.dracut_args)
    }

    /// Grub config file, defaulting to one inside the boot directory.
    pub fn grub_config_path(&self) -> PathBuf {
        self.grub_config
            .clone()
            .unwrap_or_else(|| crate::grub::default_config_path(&self.boot_dir))
    }
}

fn pick_dracut_args(env: Option<&str>, cli: Option<&str>, file: &str) -> String {
    [env, cli]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|args| !args.is_empty())
        .unwrap_or(file)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_parse_overrides() {
        let config = Config::parse(
            r#"
boot_dir = "/mnt/boot"
external_initrd_releases = ["micro", " "]
dracut_args = "-f"
"#,
        )
        .unwrap();

        assert_eq!(config.boot_dir, PathBuf::from("/mnt/boot"));
        assert_eq!(config.external_initrd_releases, vec!["micro".to_string()]);
        assert_eq!(config.dracut_args, "-f");
        assert_eq!(config.profiles_dir, PathBuf::from(DEFAULT_PROFILES_DIR));
        assert_eq!(config.grub_config_path(), PathBuf::from("/mnt/boot/grub/grub.cfg"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Config::parse("bootdir = \"/boot\"").is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        assert!(Config::load(Some(&temp.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "grub_config = \"/efi/grub/grub.cfg\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.grub_config_path(), PathBuf::from("/efi/grub/grub.cfg"));
    }

    #[test]
    fn test_dracut_args_precedence() {
        let file = DEFAULT_DRACUT_ARGS;
        assert_eq!(pick_dracut_args(None, None, file), file);
        assert_eq!(pick_dracut_args(None, Some("  "), file), file);
        assert_eq!(pick_dracut_args(None, Some(" -q -f "), file), "-q -f");
        assert_eq!(pick_dracut_args(Some("-H"), Some("-q -f"), file), "-H");
        assert_eq!(pick_dracut_args(Some(" "), Some("-q -f"), file), "-q -f");
    }

    #[test]
    fn test_dracut_program() {
        assert_eq!(Config::default().dracut_program, "dracut");
        let config = Config::parse("dracut_program = \"/usr/local/bin/dracut\"\n").unwrap();
        assert_eq!(config.dracut_program, "/usr/local/bin/dracut");
    }
}
