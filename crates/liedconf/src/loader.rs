//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, DefaultsConfig, LiedConfig, PathsConfig, TelemetryConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
/// Returns paths in load order (system, user, local/cli).
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/liedwerk/config.toml");
    if system.exists() {
        files.push(system);
    }

    // User config (XDG_CONFIG_HOME or ~/.config)
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("liedwerk/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    // CLI override takes precedence over local
    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("liedwerk.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Load config from a TOML file.
pub fn load_from_file(path: &Path) -> Result<LiedConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_toml(&contents, path)
}

/// Parse config from TOML string, expanding `~` in every path field.
fn parse_toml(contents: &str, path: &Path) -> Result<LiedConfig, ConfigError> {
    let mut config: LiedConfig =
        toml::from_str(contents).map_err(|e: toml::de::Error| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    config.paths.songs_dir = expand_path_buf(&config.paths.songs_dir);
    config.paths.build_dir = expand_path_buf(&config.paths.build_dir);
    config.paths.audio_dir = expand_path_buf(&config.paths.audio_dir);
    config.paths.soundfont = config
        .paths
        .soundfont
        .as_deref()
        .map(expand_path_buf);

    Ok(config)
}

/// Merge two configs, with non-default fields of `overlay` taking
/// precedence.
pub fn merge_configs(base: LiedConfig, overlay: LiedConfig) -> LiedConfig {
    fn pick<T: PartialEq>(base: T, overlay: T, default: T) -> T {
        if overlay != default {
            overlay
        } else {
            base
        }
    }

    let paths_default = PathsConfig::default();
    let telemetry_default = TelemetryConfig::default();
    let defaults_default = DefaultsConfig::default();

    LiedConfig {
        paths: PathsConfig {
            songs_dir: pick(
                base.paths.songs_dir,
                overlay.paths.songs_dir,
                paths_default.songs_dir,
            ),
            build_dir: pick(
                base.paths.build_dir,
                overlay.paths.build_dir,
                paths_default.build_dir,
            ),
            audio_dir: pick(
                base.paths.audio_dir,
                overlay.paths.audio_dir,
                paths_default.audio_dir,
            ),
            soundfont: overlay.paths.soundfont.or(base.paths.soundfont),
        },
        telemetry: TelemetryConfig {
            log_level: pick(
                base.telemetry.log_level,
                overlay.telemetry.log_level,
                telemetry_default.log_level,
            ),
        },
        defaults: DefaultsConfig {
            sequence_file: pick(
                base.defaults.sequence_file,
                overlay.defaults.sequence_file,
                defaults_default.sequence_file,
            ),
            mute_volume: pick(
                base.defaults.mute_volume,
                overlay.defaults.mute_volume,
                defaults_default.mute_volume,
            ),
        },
    }
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut LiedConfig, sources: &mut ConfigSources) {
    if let Ok(v) = env::var("LIEDWERK_SONGS_DIR") {
        config.paths.songs_dir = expand_path(&v);
        sources.env_overrides.push("LIEDWERK_SONGS_DIR".to_string());
    }
    if let Ok(v) = env::var("LIEDWERK_BUILD_DIR") {
        config.paths.build_dir = expand_path(&v);
        sources.env_overrides.push("LIEDWERK_BUILD_DIR".to_string());
    }
    if let Ok(v) = env::var("LIEDWERK_AUDIO_DIR") {
        config.paths.audio_dir = expand_path(&v);
        sources.env_overrides.push("LIEDWERK_AUDIO_DIR".to_string());
    }
    if let Ok(v) = env::var("LIEDWERK_SOUNDFONT") {
        config.paths.soundfont = Some(expand_path(&v));
        sources.env_overrides.push("LIEDWERK_SOUNDFONT".to_string());
    }

    if let Ok(v) = env::var("LIEDWERK_LOG_LEVEL") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("LIEDWERK_LOG_LEVEL".to_string());
    }
    // Also support RUST_LOG
    if let Ok(v) = env::var("RUST_LOG") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }

    if let Ok(v) = env::var("LIEDWERK_SEQUENCE_FILE") {
        config.defaults.sequence_file = v;
        sources
            .env_overrides
            .push("LIEDWERK_SEQUENCE_FILE".to_string());
    }
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            home.join(stripped)
        } else {
            PathBuf::from(path)
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // Handle $VAR/rest/of/path
        if let Some(slash_pos) = stripped.find('/') {
            let var_name = &stripped[..slash_pos];
            if let Ok(var_value) = env::var(var_name) {
                PathBuf::from(var_value).join(&stripped[slash_pos + 1..])
            } else {
                PathBuf::from(path)
            }
        } else {
            env::var(stripped)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(path))
        }
    } else {
        PathBuf::from(path)
    }
}

fn expand_path_buf(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => expand_path(s),
        None => path.to_path_buf(),
    }
}
