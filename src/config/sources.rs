//! Config sources, lowest precedence first: defaults, user file, explicit file, environment.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ENV_PREFIX: &str = "COURSEGEN";
const APP_DIR: &str = "coursegen";

/// Create a builder with every default applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("primary_store.base_url", "")?
        .set_default("primary_store.connect_timeout_ms", 10_000)?
        .set_default("primary_store.request_timeout_ms", 120_000)?
        .set_default("generation.base_url", "")?
        .set_default("generation.connect_timeout_ms", 10_000)?
        .set_default("generation.request_timeout_ms", 120_000)?
        .set_default("polling.interval_ms", 3_000)?
        .set_default("polling.max_polls", 200)?
        .set_default("polling.max_consecutive_errors", 3)?
        .set_default("workflow.update_concurrency", 4)?
        .set_default("workflow.correlation_prefix", "node_")
}

/// `$XDG_CONFIG_HOME/coursegen/config.toml`, falling back to the platform config dir
/// (`~/.config/coursegen/config.toml` on Linux).
pub fn user_config_path() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(xdg).join(APP_DIR).join("config.toml"));
    }
    directories::BaseDirs::new().map(|dirs| dirs.config_dir().join(APP_DIR).join("config.toml"))
}

/// Add a TOML file source if it exists.
pub fn add_user_file(
    builder: ConfigBuilder<DefaultState>,
    path: Option<&Path>,
) -> ConfigBuilder<DefaultState> {
    match path {
        Some(path) if path.exists() => {
            debug!(config_path = %path.display(), "Loading user configuration");
            builder.add_source(File::from(path).format(FileFormat::Toml).required(false))
        }
        _ => builder,
    }
}

/// Add an explicitly requested file; it must exist.
pub fn add_explicit_file(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
) -> ConfigBuilder<DefaultState> {
    debug!(config_path = %path.display(), "Loading configuration file");
    builder.add_source(File::from(path).format(FileFormat::Toml).required(true))
}

/// `COURSEGEN__POLLING__INTERVAL_MS=500` sets `polling.interval_ms`. `vars` replaces the
/// process environment when given.
pub fn add_environment(
    builder: ConfigBuilder<DefaultState>,
    vars: Option<HashMap<String, String>>,
) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .source(vars),
    )
}
