use std::{io, path::PathBuf};

use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors surfaced by the alarm controller to the user facing layer.
#[derive(Debug, Error)]
pub enum AlarmError {
    #[error("invalid alarm time {hour:02}:{minute:02}")]
    InvalidTime { hour: u32, minute: u32 },

    #[error("no alarm is armed")]
    NotArmed,

    /// the shell should clear or stop the current alarm before setting a new one
    #[error("an alarm is already set for {}", .0.format("%Y-%m-%d %H:%M"))]
    AlreadySet(NaiveDateTime),

    #[error("can't snooze {minutes} more minutes past {}", .target.format("%Y-%m-%d %H:%M"))]
    SnoozeOutOfRange { target: NaiveDateTime, minutes: u32 },

    #[error(transparent)]
    Player(#[from] PlayerError),
}

/// Distinct playback failures so the user can tell a bad file from a bad device.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("sound file not found: {}", .0.display())]
    SoundFileNotFound(PathBuf),

    #[error("couldn't select output device {device}: {reason}")]
    DeviceSelectionFailed { device: String, reason: String },

    #[error("playback failed: {0}")]
    Playback(String),
}

/// Settings file problems. These are only ever logged as warnings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("couldn't read settings file: {0}")]
    Read(#[source] io::Error),

    #[error("couldn't parse settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("couldn't create settings directory: {0}")]
    CreateDir(#[source] io::Error),

    #[error("couldn't serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("couldn't write settings file: {0}")]
    Write(#[source] io::Error),
}
