use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::{parse_key, parse_sound_driver, parse_volume, Options};
use crate::logging::LogLevel;

/// Narrator - plays narrated step files in the terminal
#[derive(Parser, Debug, Default)]
#[command(name = "narrator")]
#[command(version)]
#[command(about = "Plays a narrated step file: typed text in sync with speech", long_about = None)]
pub struct Cli {
    /// Step file to play
    #[arg(value_name = "SCRIPT")]
    pub script: PathBuf,

    /// Configuration directory path (holds narrator.cfg)
    #[arg(short, long, value_name = "CONFIGDIR")]
    pub configdir: Option<String>,

    /// Content directory path (audio clips are resolved against it)
    #[arg(short = 'd', long, value_name = "CONTENTDIR")]
    pub contentdir: Option<String>,

    /// Milliseconds per revealed character
    #[arg(short, long = "typing-ms", value_name = "MS")]
    pub typing_ms: Option<u64>,

    /// Advance automatically once a step is complete
    #[arg(short, long = "auto-play")]
    pub auto_play: bool,

    /// Sound driver (rodio, none)
    #[arg(long, value_name = "DRIVER")]
    pub sound: Option<String>,

    /// Output volume (0-100)
    #[arg(long, value_name = "VOLUME")]
    pub volume: Option<String>,

    /// Skip key name (e.g. Space, Return)
    #[arg(long = "skip-key", value_name = "KEY")]
    pub skip_key: Option<String>,

    /// Log file path
    #[arg(short, long, value_name = "FILE")]
    pub logfile: Option<String>,

    /// More log output (-v info, -vv debug, -vvv everything)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Merge CLI arguments into the options struct
    pub fn merge_into_options(&self, mut opts: Options) -> Result<Options> {
        // Override with command line arguments
        if let Some(ref config_dir) = self.configdir {
            opts.config_dir = Some(config_dir.clone());
        }

        if let Some(ref content_dir) = self.contentdir {
            opts.content_dir = Some(content_dir.clone());
        }

        if let Some(ms) = self.typing_ms {
            opts.typing_interval = Some(Duration::from_millis(ms));
        }

        if self.auto_play {
            opts.auto_play = Some(true);
        }

        if let Some(ref sound) = self.sound {
            opts.sound_driver = Some(parse_sound_driver(sound)?);
        }

        if let Some(ref vol) = self.volume {
            let int_vol: i32 = vol.parse().context("Invalid volume")?;
            opts.volume = Some(parse_volume(int_vol));
        }

        if let Some(ref key) = self.skip_key {
            opts.skip_key = Some(parse_key(key).context("Invalid skip key")?);
        }

        if let Some(ref log_file) = self.logfile {
            opts.log_file = Some(log_file.clone());
        }

        Ok(opts)
    }

    /// Log level selected by the -v count
    pub fn log_level(&self) -> LogLevel {
        LogLevel::from_verbosity(self.verbose)
    }
}
