//! Configuration loading for the liedwerk tools.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/liedwerk/config.toml` (system)
//! 2. `~/.config/liedwerk/config.toml` (user)
//! 3. `./liedwerk.toml` (local override)
//! 4. Environment variables (`LIEDWERK_*`)
//!
//! # Example Config
//!
//! ```toml
//! [paths]
//! songs_dir = "~/liederen/bron"
//! build_dir = "~/liederen/build"
//! audio_dir = "~/liederen/audio"
//! soundfont = "/usr/share/sounds/sf2/FluidR3_GM.sf2"
//!
//! [telemetry]
//! log_level = "info"
//!
//! [defaults]
//! sequence_file = "volgorde.toml"
//! mute_volume = 127
//! ```

pub mod loader;

pub use loader::{discover_config_files_with_override, ConfigSources};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Filesystem paths the tools read from and write to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the source `.nwctxt` song files.
    /// Default: ~/liederen/bron
    #[serde(default = "PathsConfig::default_songs_dir")]
    pub songs_dir: PathBuf,

    /// Directory for generated output (merged files, reports, LaTeX).
    /// Default: ~/liederen/build
    #[serde(default = "PathsConfig::default_build_dir")]
    pub build_dir: PathBuf,

    /// Directory for rendered audio and label tracks.
    /// Default: ~/liederen/audio
    #[serde(default = "PathsConfig::default_audio_dir")]
    pub audio_dir: PathBuf,

    /// Soundfont used by external audio rendering, if any.
    #[serde(default)]
    pub soundfont: Option<PathBuf>,
}

impl PathsConfig {
    fn default_songs_dir() -> PathBuf {
        Self::home_relative("liederen/bron")
    }

    fn default_build_dir() -> PathBuf {
        Self::home_relative("liederen/build")
    }

    fn default_audio_dir() -> PathBuf {
        Self::home_relative("liederen/audio")
    }

    fn home_relative(tail: &str) -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(tail))
            .unwrap_or_else(|| PathBuf::from(tail))
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            songs_dir: Self::default_songs_dir(),
            build_dir: Self::default_build_dir(),
            audio_dir: Self::default_audio_dir(),
            soundfont: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level (trace, debug, info, warn, error).
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}

/// Tunable defaults for the processing commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Name of the sequence file looked up next to the section files.
    /// Default: volgorde.toml
    #[serde(default = "DefaultsConfig::default_sequence_file")]
    pub sequence_file: String,

    /// Volume written alongside the Muted flag when soloing staves.
    /// Default: 127
    #[serde(default = "DefaultsConfig::default_mute_volume")]
    pub mute_volume: u8,
}

impl DefaultsConfig {
    fn default_sequence_file() -> String {
        "volgorde.toml".to_string()
    }

    fn default_mute_volume() -> u8 {
        127
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            sequence_file: Self::default_sequence_file(),
            mute_volume: Self::default_mute_volume(),
        }
    }
}

/// Complete liedwerk configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LiedConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,
}

impl LiedConfig {
    /// Load configuration from all sources.
    ///
    /// Load order (later wins):
    /// 1. Compiled defaults
    /// 2. `/etc/liedwerk/config.toml`
    /// 3. `~/.config/liedwerk/config.toml`
    /// 4. `./liedwerk.toml`
    /// 5. Environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration from a specific file path, then apply env overrides.
    ///
    /// If `config_path` is provided, it takes precedence over the local
    /// `./liedwerk.toml` override. System and user configs still load first.
    pub fn load_from(config_path: Option<&std::path::Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&std::path::Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = LiedConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            let file_config = loader::load_from_file(&path)?;
            config = loader::merge_configs(config, file_config);
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        // Build TOML manually for nicer formatting
        let mut output = String::new();

        output.push_str("# Liedwerk Configuration\n\n");

        output.push_str("[paths]\n");
        output.push_str(&format!(
            "songs_dir = \"{}\"\n",
            self.paths.songs_dir.display()
        ));
        output.push_str(&format!(
            "build_dir = \"{}\"\n",
            self.paths.build_dir.display()
        ));
        output.push_str(&format!(
            "audio_dir = \"{}\"\n",
            self.paths.audio_dir.display()
        ));
        if let Some(soundfont) = &self.paths.soundfont {
            output.push_str(&format!("soundfont = \"{}\"\n", soundfont.display()));
        }

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!("log_level = \"{}\"\n", self.telemetry.log_level));

        output.push_str("\n[defaults]\n");
        output.push_str(&format!(
            "sequence_file = \"{}\"\n",
            self.defaults.sequence_file
        ));
        output.push_str(&format!("mute_volume = {}\n", self.defaults.mute_volume));

        output
    }
}
