//! Layered configuration loading
//!
//! Sources, weakest first: built-in defaults, `/etc/shellrun/config.toml`,
//! the user config dir, `~/.shellrun.toml`, `./.shellrun.toml`, an explicit
//! `--config` file, then `SHELLRUN_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use super::model::Config;

const APP_NAME: &str = "shellrun";

/// Nested keys use a double underscore: `SHELLRUN_RUNNER__MODE=compat`
const ENV_PREFIX: &str = "SHELLRUN_";

const DOTFILE: &str = ".shellrun.toml";

/// Candidate config files, weakest first
pub fn config_paths() -> Vec<PathBuf> {
    let system = Path::new("/etc").join(APP_NAME).join("config.toml");
    let user = dirs::config_dir().map(|dir| dir.join(APP_NAME).join("config.toml"));
    let home = dirs::home_dir().map(|dir| dir.join(DOTFILE));

    std::iter::once(system)
        .chain(user)
        .chain(home)
        .chain(std::iter::once(PathBuf::from(DOTFILE)))
        .collect()
}

/// Every layer merged into one provider, before extraction
///
/// A missing `override_path` is logged and skipped.
pub fn figment(override_path: Option<&Path>) -> Figment {
    let files = config_paths()
        .into_iter()
        .filter(|path| path.exists())
        .chain(override_path.and_then(|path| {
            if path.exists() {
                Some(path.to_path_buf())
            } else {
                tracing::warn!("Override config not found: {}", path.display());
                None
            }
        }));

    files
        .fold(
            Figment::from(Serialized::defaults(Config::default())),
            |figment, path| {
                tracing::debug!("Merging config file {}", path.display());
                figment.merge(Toml::file(path))
            },
        )
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load, expand and validate the configuration
pub fn load_config(override_path: Option<&str>) -> Result<Config> {
    let config: Config = figment(override_path.map(Path::new))
        .extract()
        .context("Failed to load configuration")?;

    config.resolved().context("Invalid configuration")
}

/// Config files that currently exist on this host
pub fn find_config_files() -> Vec<PathBuf> {
    config_paths().into_iter().filter(|p| p.exists()).collect()
}
