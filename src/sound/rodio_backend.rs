//! Rodio-based audio backend
//!
//! The audio runs on a dedicated thread since rodio's OutputStream is not Send.
//! Commands are fire-and-forget over a channel; voice status is published
//! back through a shared map so `status` never waits on the audio thread.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use parking_lot::RwLock;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

use super::backend::{AudioBackend, AudioError, VoiceId, VoiceStatus};

/// How often the audio thread checks for finished sinks
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Commands sent to the audio thread
enum AudioCommand {
    /// Decode and start a clip under the given handle
    Play(u32, PathBuf),
    Stop(u32),
    Pause(u32),
    Resume(u32),
    /// Set output volume for all sinks
    SetVolume(f32),
    /// Stop everything and exit
    Shutdown,
}

type StatusMap = Arc<RwLock<HashMap<u32, VoiceStatus>>>;

/// Backend playing clips through the default output device
pub struct RodioBackend {
    sender: Sender<AudioCommand>,
    statuses: StatusMap,
    next_handle: u32,
    thread: Option<JoinHandle<()>>,
}

impl RodioBackend {
    /// Start the audio thread and open the default output device
    pub fn new() -> Result<Self, AudioError> {
        let (tx, rx) = channel::unbounded();
        let (ready_tx, ready_rx) = channel::bounded(1);
        let statuses: StatusMap = Arc::new(RwLock::new(HashMap::new()));
        let thread_statuses = Arc::clone(&statuses);

        let handle = thread::Builder::new()
            .name("narrator-audio".into())
            .spawn(move || audio_thread_main(rx, ready_tx, thread_statuses))
            .map_err(|e| AudioError::Backend(format!("cannot spawn audio thread: {}", e)))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                log::info!("rodio backend: output stream opened");
                Ok(Self {
                    sender: tx,
                    statuses,
                    next_handle: 1,
                    thread: Some(handle),
                })
            }
            Ok(Err(reason)) => {
                let _ = handle.join();
                Err(AudioError::Backend(reason))
            }
            Err(_) => {
                let _ = handle.join();
                Err(AudioError::Backend("audio thread exited during init".into()))
            }
        }
    }

    fn send_command(&self, cmd: AudioCommand) -> bool {
        self.sender.send(cmd).is_ok()
    }
}

impl AudioBackend for RodioBackend {
    fn name(&self) -> &'static str {
        "rodio"
    }

    fn open(&mut self, path: &Path) -> Result<VoiceId, AudioError> {
        if !path.is_file() {
            return Err(AudioError::NotFound(path.display().to_string()));
        }

        let handle = self.next_handle;
        self.next_handle = self.next_handle.wrapping_add(1).max(1);

        self.statuses.write().insert(handle, VoiceStatus::Loading);
        if !self.send_command(AudioCommand::Play(handle, path.to_path_buf())) {
            self.statuses.write().remove(&handle);
            return Err(AudioError::Backend("audio thread is not running".into()));
        }
        Ok(VoiceId(handle))
    }

    fn status(&self, voice: VoiceId) -> VoiceStatus {
        self.statuses
            .read()
            .get(&voice.0)
            .cloned()
            .unwrap_or(VoiceStatus::Gone)
    }

    fn pause(&mut self, voice: VoiceId) {
        self.send_command(AudioCommand::Pause(voice.0));
    }

    fn resume(&mut self, voice: VoiceId) {
        self.send_command(AudioCommand::Resume(voice.0));
    }

    fn stop(&mut self, voice: VoiceId) {
        self.statuses.write().remove(&voice.0);
        self.send_command(AudioCommand::Stop(voice.0));
    }

    fn set_volume(&mut self, volume: f32) {
        self.send_command(AudioCommand::SetVolume(volume.clamp(0.0, 1.0)));
    }
}

impl Drop for RodioBackend {
    fn drop(&mut self) {
        self.send_command(AudioCommand::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

/// Audio thread main function
fn audio_thread_main(
    rx: Receiver<AudioCommand>,
    ready: Sender<Result<(), String>>,
    statuses: StatusMap,
) {
    log::debug!("audio thread: starting");

    // Initialize audio output on this thread
    let (_stream, stream_handle) = match OutputStream::try_default() {
        Ok(s) => s,
        Err(e) => {
            let _ = ready.send(Err(format!("failed to open output: {}", e)));
            return;
        }
    };
    let _ = ready.send(Ok(()));

    let mut sinks: HashMap<u32, Sink> = HashMap::new();
    let mut volume = 1.0_f32;

    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(AudioCommand::Play(handle, path)) => {
                let status = match start_voice(&stream_handle, &path, volume) {
                    Ok(sink) => {
                        sinks.insert(handle, sink);
                        VoiceStatus::Playing
                    }
                    Err(err) => {
                        log::warn!("audio thread: {}", err);
                        VoiceStatus::Failed(err)
                    }
                };
                // A stop may already have released this handle
                if let Some(slot) = statuses.write().get_mut(&handle) {
                    *slot = status;
                }
            }
            Ok(AudioCommand::Stop(handle)) => {
                if let Some(sink) = sinks.remove(&handle) {
                    sink.stop();
                }
            }
            Ok(AudioCommand::Pause(handle)) => {
                if let Some(sink) = sinks.get(&handle) {
                    sink.pause();
                    set_status_if(&statuses, handle, VoiceStatus::Playing, VoiceStatus::Paused);
                }
            }
            Ok(AudioCommand::Resume(handle)) => {
                if let Some(sink) = sinks.get(&handle) {
                    sink.play();
                    set_status_if(&statuses, handle, VoiceStatus::Paused, VoiceStatus::Playing);
                }
            }
            Ok(AudioCommand::SetVolume(v)) => {
                volume = v;
                for sink in sinks.values() {
                    sink.set_volume(volume);
                }
            }
            Ok(AudioCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => {
                for (_, sink) in sinks.drain() {
                    sink.stop();
                }
                break;
            }
            Err(RecvTimeoutError::Timeout) => {}
        }

        // Publish natural ends
        sinks.retain(|handle, sink| {
            if sink.empty() {
                set_status_if(&statuses, *handle, VoiceStatus::Playing, VoiceStatus::Ended);
                false
            } else {
                true
            }
        });
    }

    log::debug!("audio thread: exited");
}

fn set_status_if(statuses: &StatusMap, handle: u32, from: VoiceStatus, to: VoiceStatus) {
    if let Some(slot) = statuses.write().get_mut(&handle) {
        if *slot == from {
            *slot = to;
        }
    }
}

fn start_voice(
    stream_handle: &OutputStreamHandle,
    path: &Path,
    volume: f32,
) -> Result<Sink, AudioError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => AudioError::NotFound(path.display().to_string()),
        _ => AudioError::Backend(format!("{}: {}", path.display(), e)),
    })?;

    let source = Decoder::new(BufReader::new(file)).map_err(|e| AudioError::Decode {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let sink = Sink::try_new(stream_handle)
        .map_err(|e| AudioError::Backend(format!("sink error: {}", e)))?;
    sink.set_volume(volume);
    sink.append(source);

    log::debug!("audio thread: playing {}", path.display());
    Ok(sink)
}
