//! Output device enumeration and looping alarm playback.

use std::{
    fmt,
    fs::File,
    io::{self, BufReader},
    path::{Path, PathBuf},
};

use log::{debug, error, info, warn};
use rodio::{
    cpal::{
        self,
        traits::{DeviceTrait, HostTrait},
    },
    Decoder, OutputStream, OutputStreamHandle, Sink, Source,
};
use serde::{Deserialize, Serialize};

use crate::{config::clamp_volume, error::PlayerError};

/// Identifies an output device across runs. This is the name the host gives the device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDevice {
    pub id: DeviceId,
    pub display_name: String,
    pub channels: u16,
}

impl fmt::Display for OutputDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} ch)", self.display_name, self.channels)
    }
}

/// Keeps devices that can actually output sound, in host order.
///
/// Hosts sometimes list the same name twice, only the first one is reachable by id.
#[must_use]
pub fn output_devices_from(
    descriptors: impl IntoIterator<Item = (String, u16)>,
) -> Vec<OutputDevice> {
    let mut devices: Vec<OutputDevice> = Vec::new();
    for (name, channels) in descriptors {
        if channels == 0 || devices.iter().any(|d| d.display_name == name) {
            continue;
        }
        devices.push(OutputDevice {
            id: DeviceId::new(name.clone()),
            display_name: name,
            channels,
        });
    }
    devices
}

/// Lists the host's output devices. An empty list is a normal answer.
#[must_use]
pub fn list_output_devices() -> Vec<OutputDevice> {
    let host = cpal::default_host();
    let devices = match host.output_devices() {
        Ok(devices) => devices,
        Err(e) => {
            error!("couldn't list output devices: {e}");
            return vec![];
        }
    };
    let descriptors = devices.filter_map(|device| {
        let name = device
            .name()
            .map_err(|e| debug!("skipping unnamed output device: {e}"))
            .ok()?;
        let channels = device
            .supported_output_configs()
            .map(|configs| configs.map(|c| c.channels()).max().unwrap_or(0))
            .unwrap_or_else(|e| {
                debug!("skipping output device {name}: {e}");
                0
            });
        Some((name, channels))
    });
    let devices = output_devices_from(descriptors);
    info!("found {} output device(s)", devices.len());
    devices
}

/// Whether the host exposes any output at all. Checked once at startup.
#[must_use]
pub fn backend_available() -> bool {
    let host = cpal::default_host();
    host.default_output_device().is_some()
        || host
            .output_devices()
            .map(|mut devices| devices.next().is_some())
            .unwrap_or(false)
}

/// The playback side of the alarm.
///
/// `bind_device(None)` means the system default output.
pub trait Player {
    /// # Errors
    /// [`PlayerError::DeviceSelectionFailed`] when the device is gone or can't be opened
    fn bind_device(&mut self, device: Option<&DeviceId>) -> Result<(), PlayerError>;

    /// # Errors
    /// [`PlayerError::SoundFileNotFound`] for a missing file, [`PlayerError::Playback`]
    /// when the file can't be decoded or played
    fn load_and_play_loop(&mut self, path: &Path, volume: f32) -> Result<(), PlayerError>;

    fn set_volume(&mut self, volume: f32);

    /// Halts playback and releases the bound device. Does nothing when silent.
    fn stop(&mut self);

    fn is_playing(&self) -> bool;
}

impl<P: Player + ?Sized> Player for Box<P> {
    fn bind_device(&mut self, device: Option<&DeviceId>) -> Result<(), PlayerError> {
        (**self).bind_device(device)
    }

    fn load_and_play_loop(&mut self, path: &Path, volume: f32) -> Result<(), PlayerError> {
        (**self).load_and_play_loop(path, volume)
    }

    fn set_volume(&mut self, volume: f32) {
        (**self).set_volume(volume);
    }

    fn stop(&mut self) {
        (**self).stop();
    }

    fn is_playing(&self) -> bool {
        (**self).is_playing()
    }
}

struct BoundOutput {
    device: Option<DeviceId>,
    // dropping the stream silences everything played through the handle
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

/// The sound currently looping on the bound device.
pub struct PlaybackSession {
    sink: Sink,
    path: PathBuf,
}

impl PlaybackSession {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Plays through rodio on a chosen cpal device.
#[derive(Default)]
pub struct RodioPlayer {
    output: Option<BoundOutput>,
    session: Option<PlaybackSession>,
}

impl RodioPlayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    /// whether an output stream is open on some device
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.output.is_some()
    }

    fn halt(&mut self) {
        if let Some(session) = self.session.take() {
            session.sink.stop();
            info!("stopped playing {}", session.path.display());
        }
    }

    fn find_device(device: Option<&DeviceId>) -> Result<cpal::Device, PlayerError> {
        let host = cpal::default_host();
        let Some(id) = device else {
            return host
                .default_output_device()
                .ok_or_else(|| PlayerError::DeviceSelectionFailed {
                    device: "system default".to_string(),
                    reason: "no default output device".to_string(),
                });
        };
        let failed = |reason: String| PlayerError::DeviceSelectionFailed {
            device: id.to_string(),
            reason,
        };
        host.output_devices()
            .map_err(|e| failed(e.to_string()))?
            .find(|d| d.name().is_ok_and(|name| name == id.as_str()))
            .ok_or_else(|| failed("device is not available".to_string()))
    }
}

impl Player for RodioPlayer {
    fn bind_device(&mut self, device: Option<&DeviceId>) -> Result<(), PlayerError> {
        // tear down whatever played on the old device first
        self.stop();

        let cpal_device = Self::find_device(device)?;
        let (stream, handle) = OutputStream::try_from_device(&cpal_device).map_err(|e| {
            PlayerError::DeviceSelectionFailed {
                device: device.map_or_else(|| "system default".to_string(), ToString::to_string),
                reason: e.to_string(),
            }
        })?;
        info!(
            "bound output device {}",
            cpal_device.name().unwrap_or_else(|_| "unknown".to_string())
        );
        self.output = Some(BoundOutput {
            device: device.cloned(),
            _stream: stream,
            handle,
        });
        Ok(())
    }

    fn load_and_play_loop(&mut self, path: &Path, volume: f32) -> Result<(), PlayerError> {
        self.halt();
        let Some(output) = &self.output else {
            return Err(PlayerError::DeviceSelectionFailed {
                device: "none".to_string(),
                reason: "no output device bound".to_string(),
            });
        };

        let file = File::open(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                PlayerError::SoundFileNotFound(path.to_path_buf())
            } else {
                PlayerError::Playback(format!("couldn't open {}: {e}", path.display()))
            }
        })?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| {
                PlayerError::Playback(format!("couldn't decode {}: {e}", path.display()))
            })?
            .repeat_infinite();
        let sink =
            Sink::try_new(&output.handle).map_err(|e| PlayerError::Playback(e.to_string()))?;
        sink.set_volume(clamp_volume(volume));
        sink.append(source);
        sink.play();

        info!(
            "playing {} on {} at volume {volume:.2}",
            path.display(),
            output
                .device
                .as_ref()
                .map_or("system default", DeviceId::as_str)
        );
        self.session = Some(PlaybackSession {
            sink,
            path: path.to_path_buf(),
        });
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        if let Some(session) = &self.session {
            session.sink.set_volume(clamp_volume(volume));
        }
    }

    fn stop(&mut self) {
        self.halt();
        // dropping the stream closes the device
        if let Some(output) = self.output.take() {
            debug!(
                "released output device {}",
                output
                    .device
                    .as_ref()
                    .map_or("system default", DeviceId::as_str)
            );
        }
    }

    fn is_playing(&self) -> bool {
        self.session.is_some()
    }
}

/// Used when the host has no audio at all: alarms still fire, just without sound.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentPlayer;

impl Player for SilentPlayer {
    fn bind_device(&mut self, device: Option<&DeviceId>) -> Result<(), PlayerError> {
        debug!(
            "no audio backend, ignoring device {}",
            device.map_or("system default", DeviceId::as_str)
        );
        Ok(())
    }

    fn load_and_play_loop(&mut self, path: &Path, _volume: f32) -> Result<(), PlayerError> {
        warn!("no audio backend, alarm {} fires silently", path.display());
        Ok(())
    }

    fn set_volume(&mut self, _volume: f32) {}

    fn stop(&mut self) {}

    fn is_playing(&self) -> bool {
        false
    }
}
