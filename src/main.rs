use std::cell::Cell;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam::channel::{self, Receiver, TryRecvError};

use narrator::config::{self, SoundDriver};
use narrator::console;
use narrator::input::{key_from_name, Action, InputFocus};
use narrator::logging;
use narrator::script::{DirResolver, Sequence};
use narrator::sequence::{PlayerEvent, SequencePlayer};
use narrator::sound::{AudioBackend, AudioChannel, NullBackend, RodioBackend};
use narrator::Cli;

/// 40 frames per second
const FRAME_TIME: Duration = Duration::from_millis(25);

enum InputEvent {
    Key(i32),
    /// stdin reached end of file
    Closed,
}

/// Read key names from stdin, one per line. An empty line is the skip key.
fn spawn_stdin_reader(skip_key: i32) -> Result<Receiver<InputEvent>> {
    let (tx, rx) = channel::unbounded();
    thread::Builder::new()
        .name("narrator-input".into())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                let name = line.trim();
                let key = if name.is_empty() {
                    Some(skip_key)
                } else {
                    key_from_name(name)
                };
                match key {
                    Some(key) => {
                        if tx.send(InputEvent::Key(key)).is_err() {
                            return;
                        }
                    }
                    None => log::warn!("unknown key '{}'", name),
                }
            }
            let _ = tx.send(InputEvent::Closed);
        })
        .context("Failed to spawn input thread")?;
    Ok(rx)
}

fn build_backend(driver: SoundDriver) -> Box<dyn AudioBackend> {
    match driver {
        SoundDriver::Rodio => match RodioBackend::new() {
            Ok(backend) => Box::new(backend),
            Err(err) => {
                log::warn!("no audio output, continuing silently: {}", err);
                Box::new(NullBackend::new())
            }
        },
        SoundDriver::None => Box::new(NullBackend::new()),
    }
}

fn content_dir(content_dir: Option<&str>, script: &Path) -> PathBuf {
    match content_dir {
        Some(dir) => PathBuf::from(dir),
        None => script
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    }
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration file, then let the command line override it
    let options = config::load_config(cli.configdir.as_deref())?;
    let options = cli.merge_into_options(options)?;

    logging::init(cli.log_level(), options.log_file.as_deref().map(Path::new))
        .context("Failed to initialize logging")?;
    log::info!("narrator {} starting", env!("CARGO_PKG_VERSION"));

    let sequence = Sequence::load(&cli.script)
        .with_context(|| format!("Cannot load step file {}", cli.script.display()))?;

    let resolver = DirResolver::new(content_dir(options.content_dir.as_deref(), &cli.script));
    log::debug!("content dir: {}", resolver.base_path().display());

    let mut audio = AudioChannel::new(
        build_backend(options.sound_driver.unwrap_or_default()),
        Box::new(resolver),
    );
    audio.set_volume(options.volume());
    log::info!("audio backend: {}", audio.backend_name());

    let player_config = options.player_config();
    let input = spawn_stdin_reader(player_config.keys.skip)?;

    let done = Rc::new(Cell::new(false));
    let done_flag = Rc::clone(&done);
    let mut player =
        SequencePlayer::new(sequence, audio, player_config).on_complete(move || done_flag.set(true));

    println!("{}", console::key_hints(&player));
    player.start();

    let mut last = Instant::now();
    let mut input_open = true;
    while !done.get() {
        while input_open {
            match input.try_recv() {
                Ok(InputEvent::Key(key)) => {
                    if player.handle_key(key, InputFocus::Page) == Some(Action::Quit) {
                        log::info!("quit requested");
                        return Ok(());
                    }
                }
                Ok(InputEvent::Closed) | Err(TryRecvError::Disconnected) => {
                    input_open = false;
                    if !player.auto_play() {
                        log::info!("input closed, switching to auto-play");
                        player.set_auto_play(true);
                    }
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        let now = Instant::now();
        player.update(now - last);
        last = now;

        let events = player.drain_events();
        for event in &events {
            if let PlayerEvent::AudioFailed { index, error } = event {
                log::warn!("step {}: {}", index + 1, error);
            }
        }
        if !events.is_empty() {
            println!("\n{}", console::render_frame(&player));
        }

        thread::sleep(FRAME_TIME.saturating_sub(last.elapsed()));
    }

    println!("\n{}", console::render_frame(&player));
    Ok(())
}
