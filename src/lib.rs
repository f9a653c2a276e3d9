#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

//! A single alarm clock: pick a time, an output device, a sound and a volume,
//! then snooze or stop it when it rings.

pub mod alarm;
pub mod audio;
pub mod command;
pub mod config;
pub mod error;

/// the eframe window around [`alarm::AlarmController`]
pub mod app;
pub mod time_picker;
pub mod widgets;

pub use alarm::{AlarmController, AlarmState, Tick};
pub use command::Command;
pub use config::{AlarmConfig, SettingsStore};
pub use error::{AlarmError, ConfigError, PlayerError};
