use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use thiserror::Error;

use crate::input::{key_from_name, KeyMap};
use crate::script::{PropertyError, PropertyFile};
use crate::sequence::PlayerConfig;

/// Name of the config file looked up in the config directory
pub const CONFIG_FILE_NAME: &str = "narrator.cfg";

/// Application options that can be set via CLI or config file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    // Commandline-only options
    pub config_dir: Option<String>,

    // Commandline and user config options
    pub log_file: Option<String>,
    pub content_dir: Option<String>,
    pub typing_interval: Option<Duration>,
    pub settle_delay: Option<Duration>,
    pub load_timeout: Option<Duration>,
    pub auto_advance: Option<Duration>,
    pub auto_play: Option<bool>,
    pub volume: Option<f32>,
    pub sound_driver: Option<SoundDriver>,
    pub skip_key: Option<i32>,
    pub next_key: Option<i32>,
    pub prev_key: Option<i32>,
    pub autoplay_key: Option<i32>,
    pub quit_key: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SoundDriver {
    #[default]
    Rodio,
    None,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
    #[error("unknown key name '{0}'")]
    UnknownKeyName(String),
    #[error("invalid sound driver: {0}. Valid options: rodio, none")]
    UnknownSoundDriver(String),
    #[error(transparent)]
    Property(#[from] PropertyError),
}

impl Options {
    /// Engine settings, with defaults for anything unset
    pub fn player_config(&self) -> PlayerConfig {
        let defaults = PlayerConfig::default();
        let default_keys = defaults.keys;
        PlayerConfig {
            typing_interval: self.typing_interval.unwrap_or(defaults.typing_interval),
            settle_delay: self.settle_delay.unwrap_or(defaults.settle_delay),
            load_timeout: self.load_timeout.unwrap_or(defaults.load_timeout),
            auto_advance_delay: self.auto_advance.unwrap_or(defaults.auto_advance_delay),
            auto_play: self.auto_play.unwrap_or(defaults.auto_play),
            keys: KeyMap {
                skip: self.skip_key.unwrap_or(default_keys.skip),
                next: self.next_key.unwrap_or(default_keys.next),
                prev: self.prev_key.unwrap_or(default_keys.prev),
                auto_play: self.autoplay_key.unwrap_or(default_keys.auto_play),
                quit: self.quit_key.unwrap_or(default_keys.quit),
            },
        }
    }

    /// Output volume, 0.0 - 1.0
    pub fn volume(&self) -> f32 {
        self.volume.unwrap_or(1.0)
    }

    /// Apply one `key = value` pair from narrator.cfg. Unknown keys are ignored.
    pub fn apply_property(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "typing_interval_ms" => self.typing_interval = Some(parse_millis(key, value)?),
            "settle_delay_ms" => self.settle_delay = Some(parse_millis(key, value)?),
            "load_timeout_ms" => self.load_timeout = Some(parse_millis(key, value)?),
            "auto_advance_ms" => self.auto_advance = Some(parse_millis(key, value)?),
            "auto_play" => self.auto_play = Some(parse_bool(key, value)?),
            "volume" => {
                let vol: i32 = value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                    reason: "expected an integer 0-100".into(),
                })?;
                self.volume = Some(parse_volume(vol));
            }
            "sound" => self.sound_driver = Some(parse_sound_driver(value)?),
            "skip_key" => self.skip_key = Some(parse_key(value)?),
            "next_key" => self.next_key = Some(parse_key(value)?),
            "prev_key" => self.prev_key = Some(parse_key(value)?),
            "autoplay_key" => self.autoplay_key = Some(parse_key(value)?),
            "quit_key" => self.quit_key = Some(parse_key(value)?),
            "content_dir" => self.content_dir = Some(value.to_string()),
            "log_file" => self.log_file = Some(value.to_string()),
            _ => log::warn!("{}: unknown key '{}'", CONFIG_FILE_NAME, key),
        }
        Ok(())
    }
}

/// Path of narrator.cfg for a config directory (current directory if none)
pub fn config_path(config_dir: Option<&str>) -> PathBuf {
    config_dir
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_FILE_NAME)
}

/// Load configuration from narrator.cfg. A missing file yields defaults.
pub fn load_config(config_dir: Option<&str>) -> Result<Options> {
    let path = config_path(config_dir);
    let mut opts = Options {
        config_dir: config_dir.map(str::to_string),
        ..Options::default()
    };

    if !path.exists() {
        log::debug!("no config file at {}", path.display());
        return Ok(opts);
    }

    load_config_file(&path, &mut opts)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(opts)
}

fn load_config_file(path: &Path, opts: &mut Options) -> Result<(), ConfigError> {
    let props = PropertyFile::load(path)?;
    for (key, value) in props.iter() {
        opts.apply_property(key, value)?;
    }
    Ok(())
}

/// Parse a volume value (0-100) to a float (0.0-1.0)
pub fn parse_volume(vol: i32) -> f32 {
    vol.clamp(0, 100) as f32 / 100.0
}

/// Parse a whole number of milliseconds
pub fn parse_millis(key: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected milliseconds".into(),
        })
}

pub fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected true or false".into(),
        }),
    }
}

pub fn parse_key(name: &str) -> Result<i32, ConfigError> {
    key_from_name(name).ok_or_else(|| ConfigError::UnknownKeyName(name.to_string()))
}

pub fn parse_sound_driver(s: &str) -> Result<SoundDriver, ConfigError> {
    match s.trim().to_lowercase().as_str() {
        "rodio" => Ok(SoundDriver::Rodio),
        "none" | "nosound" => Ok(SoundDriver::None),
        _ => Err(ConfigError::UnknownSoundDriver(s.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::keys;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_volume() {
        assert_eq!(parse_volume(0), 0.0);
        assert_eq!(parse_volume(50), 0.5);
        assert_eq!(parse_volume(100), 1.0);
        assert_eq!(parse_volume(-10), 0.0);
        assert_eq!(parse_volume(150), 1.0);
    }

    #[test]
    fn test_parse_millis() {
        assert_eq!(parse_millis("k", "150").unwrap(), Duration::from_millis(150));
        assert!(parse_millis("k", "-1").is_err());
        assert!(parse_millis("k", "fast").is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("k", "Yes").unwrap());
        assert!(!parse_bool("k", "off").unwrap());
        assert!(parse_bool("k", "maybe").is_err());
    }

    #[test]
    fn test_parse_sound_driver() {
        assert_eq!(parse_sound_driver("rodio").unwrap(), SoundDriver::Rodio);
        assert_eq!(parse_sound_driver("NONE").unwrap(), SoundDriver::None);
        assert!(parse_sound_driver("openal").is_err());
    }

    #[test]
    fn test_parse_key() {
        assert_eq!(parse_key("Return").unwrap(), keys::RETURN);
        assert!(matches!(
            parse_key("Hyper"),
            Err(ConfigError::UnknownKeyName(_))
        ));
    }

    #[test]
    fn test_options_default() {
        let opts = Options::default();
        assert!(opts.typing_interval.is_none());
        assert_eq!(opts.volume(), 1.0);
        assert_eq!(opts.player_config(), PlayerConfig::default());
    }

    #[test]
    fn test_player_config_overrides() {
        let opts = Options {
            typing_interval: Some(Duration::from_millis(40)),
            auto_play: Some(true),
            skip_key: Some(keys::RETURN),
            ..Options::default()
        };
        let config = opts.player_config();
        assert_eq!(config.typing_interval, Duration::from_millis(40));
        assert!(config.auto_play);
        assert_eq!(config.keys.skip, keys::RETURN);
        assert_eq!(config.keys.next, keys::RIGHT);
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = TempDir::new().unwrap();
        let dir_str = dir.path().to_str().unwrap();
        let opts = load_config(Some(dir_str)).unwrap();
        assert_eq!(opts.config_dir.as_deref(), Some(dir_str));
        assert!(opts.auto_play.is_none());
    }

    #[test]
    fn test_load_config_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "# narrator settings\n\
             typing_interval_ms = 60\n\
             auto_play = yes\n\
             volume = 80\n\
             skip_key = Return\n\
             sound = none\n\
             unknown_setting = 1\n",
        )
        .unwrap();

        let opts = load_config(dir.path().to_str()).unwrap();
        assert_eq!(opts.typing_interval, Some(Duration::from_millis(60)));
        assert_eq!(opts.auto_play, Some(true));
        assert_eq!(opts.volume, Some(0.8));
        assert_eq!(opts.skip_key, Some(keys::RETURN));
        assert_eq!(opts.sound_driver, Some(SoundDriver::None));
    }

    #[test]
    fn test_load_config_bad_value() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "settle_delay_ms = soon\n").unwrap();

        let err = load_config(dir.path().to_str()).unwrap_err();
        assert!(err.to_string().contains("Invalid config file"));
    }
}
