use std::{fs, io, path::PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use toml::{Table, Value};

use crate::{audio::DeviceId, error::ConfigError};

pub const DEFAULT_VOLUME: f32 = 0.5;
pub const DEFAULT_SNOOZE_MINUTES: u32 = 5;
const DEFAULT_SOUND: &str = "alarm.wav";
const APP_NAME: &str = "roosty_alarm";

/// the hour and minute the user last armed the alarm for
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct LastTime {
    pub hour: u32,
    pub minute: u32,
}

impl LastTime {
    /// `None` when either part is out of range
    #[must_use]
    pub const fn new(hour: u32, minute: u32) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }
}

/// The single flat settings record.
///
/// Tables have to come after plain values in toml, so `last_time` is kept last.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AlarmConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceId>,
    pub sound_file: PathBuf,
    pub volume: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_time: Option<LastTime>,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            device: None,
            sound_file: SettingsStore::sounds_path().map_or_else(
                || PathBuf::from(DEFAULT_SOUND),
                |sounds| sounds.join(DEFAULT_SOUND),
            ),
            volume: DEFAULT_VOLUME,
            last_time: None,
        }
    }
}

/// clamps into `[0, 1]`, NaN becomes silence
#[must_use]
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

impl AlarmConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a config field by field, so one bad entry doesn't cost the user the rest.
    #[must_use]
    pub fn from_table(table: &Table) -> Self {
        let mut config = Self::default();

        match table.get("volume") {
            None => {}
            Some(Value::Float(volume)) => config.volume = clamp_volume(*volume as f32),
            Some(Value::Integer(volume)) => config.volume = clamp_volume(*volume as f32),
            Some(other) => warn!("ignoring invalid volume {other} in settings"),
        }

        match table.get("sound_file") {
            None => {}
            Some(Value::String(path)) if !path.is_empty() => {
                config.sound_file = PathBuf::from(path);
            }
            Some(other) => warn!("ignoring invalid sound_file {other} in settings"),
        }

        match table.get("device") {
            None => {}
            Some(Value::String(device)) if !device.is_empty() => {
                config.device = Some(DeviceId::new(device.clone()));
            }
            Some(other) => warn!("ignoring invalid device {other} in settings"),
        }

        match table.get("last_time") {
            None => {}
            Some(Value::Table(time)) => {
                let hour = time.get("hour").and_then(time_part);
                let minute = time.get("minute").and_then(time_part);
                config.last_time = hour.zip(minute).and_then(|(h, m)| LastTime::new(h, m));
                if config.last_time.is_none() {
                    warn!("ignoring invalid last_time {time:?} in settings");
                }
            }
            Some(other) => warn!("ignoring invalid last_time {other} in settings"),
        }

        config
    }
}

// hand-edited files may quote the numbers ("07")
fn time_part(value: &Value) -> Option<u32> {
    match value {
        Value::Integer(n) => u32::try_from(*n).ok(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Reads and writes [`AlarmConfig`] at a fixed path.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Never fails: missing or broken settings give the defaults.
    #[must_use]
    pub fn load(&self) -> AlarmConfig {
        match self.try_load() {
            Ok(Some(config)) => {
                debug!("loaded settings from {}", self.path.display());
                config
            }
            Ok(None) => {
                info!(
                    "no settings file at {}, using defaults",
                    self.path.display()
                );
                AlarmConfig::default()
            }
            Err(e) => {
                warn!("{e} ({}), using defaults", self.path.display());
                AlarmConfig::default()
            }
        }
    }

    fn try_load(&self) -> Result<Option<AlarmConfig>, ConfigError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ConfigError::Read(e)),
        };
        let table: Table = content.parse()?;
        Ok(Some(AlarmConfig::from_table(&table)))
    }

    /// Best effort, a failure is only logged.
    pub fn save(&self, config: &AlarmConfig) {
        match self.try_save(config) {
            Ok(()) => debug!("saved settings to {}", self.path.display()),
            Err(e) => warn!("{e} ({})", self.path.display()),
        }
    }

    /// # Errors
    /// when the directory can't be created or the file can't be written
    pub fn try_save(&self, config: &AlarmConfig) -> Result<(), ConfigError> {
        let content = toml::to_string(config)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(ConfigError::CreateDir)?;
        }
        fs::write(&self.path, content).map_err(ConfigError::Write)
    }

    #[must_use]
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("", "", APP_NAME).map_or_else(
            || PathBuf::from("config.toml"),
            |dirs| dirs.config_dir().join("config.toml"),
        )
    }

    #[must_use]
    pub fn sounds_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", APP_NAME)
            .map(|dirs| dirs.data_dir().join("sounds"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> SettingsStore {
        SettingsStore::new(dir.path().join("nested").join("config.toml"))
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let config = AlarmConfig {
            device: Some(DeviceId::new("USB Speakers")),
            sound_file: PathBuf::from("/tmp/wake.ogg"),
            volume: 0.35,
            last_time: LastTime::new(6, 45),
        };

        store.save(&config);

        assert!(store.exists());
        assert_eq!(store.load(), config);
    }

    #[test]
    fn round_trip_without_optional_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let config = AlarmConfig {
            device: None,
            sound_file: PathBuf::from("ring.mp3"),
            volume: 1.0,
            last_time: None,
        };

        store.save(&config);

        assert_eq!(store.load(), config);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert_eq!(store.load(), AlarmConfig::default());
    }

    #[test]
    fn corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "volume = [this is not toml").unwrap();

        assert_eq!(SettingsStore::new(path).load(), AlarmConfig::default());
    }

    #[test]
    fn invalid_fields_fall_back_one_by_one() {
        let table: Table = r#"
            device = 3
            sound_file = "/sounds/bell.wav"
            volume = "loud"

            [last_time]
            hour = 25
            minute = 10
        "#
        .parse()
        .unwrap();

        let config = AlarmConfig::from_table(&table);

        assert_eq!(config.device, None);
        assert_eq!(config.sound_file, PathBuf::from("/sounds/bell.wav"));
        assert!((config.volume - DEFAULT_VOLUME).abs() < f32::EPSILON);
        assert_eq!(config.last_time, None);
    }

    #[test]
    fn volume_is_clamped_on_load() {
        let loud: Table = "volume = 3".parse().unwrap();
        let quiet: Table = "volume = -0.5".parse().unwrap();

        assert!((AlarmConfig::from_table(&loud).volume - 1.0).abs() < f32::EPSILON);
        assert!(AlarmConfig::from_table(&quiet).volume.abs() < f32::EPSILON);
    }

    #[test]
    fn accepts_hour_and_minute_as_strings() {
        let table: Table = r#"
            [last_time]
            hour = "07"
            minute = "05"
        "#
        .parse()
        .unwrap();

        assert_eq!(
            AlarmConfig::from_table(&table).last_time,
            Some(LastTime { hour: 7, minute: 5 })
        );
    }

    #[test]
    fn clamp_volume_handles_nan() {
        assert!(clamp_volume(f32::NAN).abs() < f32::EPSILON);
        assert!((clamp_volume(1.7) - 1.0).abs() < f32::EPSILON);
        assert!(clamp_volume(-0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn try_save_reports_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        // a directory can't be written as a file
        let store = SettingsStore::new(dir.path().to_path_buf());

        assert!(matches!(
            store.try_save(&AlarmConfig::default()),
            Err(ConfigError::Write(_))
        ));
    }
}
