use std::path::PathBuf;

use chrono::{Duration, NaiveDateTime, NaiveTime};
use log::{debug, error, info, warn};

use crate::{
    audio::{DeviceId, Player},
    command::Command,
    config::{clamp_volume, AlarmConfig, LastTime, SettingsStore},
    error::{AlarmError, PlayerError},
};

/// Where the single alarm is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlarmState {
    #[default]
    Disarmed,
    Armed { target: NaiveDateTime },
    /// fired at `target` and waits for [`AlarmController::stop`]
    Ringing { target: NaiveDateTime },
}

impl AlarmState {
    #[must_use]
    pub const fn target(self) -> Option<NaiveDateTime> {
        match self {
            Self::Disarmed => None,
            Self::Armed { target } | Self::Ringing { target } => Some(target),
        }
    }
}

/// What a clock tick did.
#[derive(Debug)]
pub enum Tick {
    Idle,
    Fired,
    /// the alarm fired but the sound didn't start, it still needs stopping
    FiredWithError(AlarmError),
}

/// The next `hour:minute` strictly after `now`, today or tomorrow.
///
/// # Errors
/// [`AlarmError::InvalidTime`] when hour or minute is out of range
pub fn next_occurrence(
    hour: u32,
    minute: u32,
    now: NaiveDateTime,
) -> Result<NaiveDateTime, AlarmError> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or(AlarmError::InvalidTime { hour, minute })?;
    let today = now.date().and_time(time);
    if today > now {
        Ok(today)
    } else {
        Ok(today + Duration::days(1))
    }
}

/// Owns the alarm state and drives settings and playback from it.
///
/// The window holds one of these and redraws from its queries after every call.
pub struct AlarmController<P: Player> {
    state: AlarmState,
    config: AlarmConfig,
    store: SettingsStore,
    player: P,
}

impl<P: Player> AlarmController<P> {
    /// Loads settings from `store`, the alarm starts disarmed.
    pub fn new(player: P, store: SettingsStore) -> Self {
        let config = store.load();
        Self::with_config(player, store, config)
    }

    pub fn with_config(player: P, store: SettingsStore, mut config: AlarmConfig) -> Self {
        config.volume = clamp_volume(config.volume);
        Self {
            state: AlarmState::Disarmed,
            config,
            store,
            player,
        }
    }

    #[must_use]
    pub const fn state(&self) -> AlarmState {
        self.state
    }

    #[must_use]
    pub const fn is_armed(&self) -> bool {
        matches!(self.state, AlarmState::Armed { .. })
    }

    #[must_use]
    pub const fn is_ringing(&self) -> bool {
        matches!(self.state, AlarmState::Ringing { .. })
    }

    #[must_use]
    pub const fn target(&self) -> Option<NaiveDateTime> {
        self.state.target()
    }

    #[must_use]
    pub const fn config(&self) -> &AlarmConfig {
        &self.config
    }

    #[must_use]
    pub const fn player(&self) -> &P {
        &self.player
    }

    /// Arms the alarm for the next `hour:minute` after `now` and remembers the time.
    ///
    /// # Errors
    /// [`AlarmError::InvalidTime`] for an impossible time,
    /// [`AlarmError::AlreadySet`] unless disarmed
    pub fn set_alarm(
        &mut self,
        hour: u32,
        minute: u32,
        now: NaiveDateTime,
    ) -> Result<NaiveDateTime, AlarmError> {
        if let Some(target) = self.state.target() {
            warn!("refusing to set alarm while one is set for {target}");
            return Err(AlarmError::AlreadySet(target));
        }
        let target = next_occurrence(hour, minute, now).map_err(|e| {
            warn!("{e}");
            e
        })?;
        self.state = AlarmState::Armed { target };
        info!("alarm set for {}", target.format("%Y-%m-%d %H:%M"));

        self.config.last_time = LastTime::new(hour, minute);
        self.store.save(&self.config);
        Ok(target)
    }

    /// # Errors
    /// [`AlarmError::NotArmed`] unless armed
    pub fn clear_alarm(&mut self) -> Result<(), AlarmError> {
        if !self.is_armed() {
            return Err(AlarmError::NotArmed);
        }
        self.state = AlarmState::Disarmed;
        info!("alarm cleared");
        Ok(())
    }

    /// Pushes a pending alarm back. A ringing alarm can't be snoozed.
    ///
    /// # Errors
    /// [`AlarmError::NotArmed`] unless armed, [`AlarmError::SnoozeOutOfRange`] when the
    /// new target is past the last representable date
    pub fn snooze(&mut self, minutes: u32) -> Result<NaiveDateTime, AlarmError> {
        let AlarmState::Armed { target } = self.state else {
            return Err(AlarmError::NotArmed);
        };
        let target = target
            .checked_add_signed(Duration::minutes(i64::from(minutes)))
            .ok_or(AlarmError::SnoozeOutOfRange { target, minutes })?;
        self.state = AlarmState::Armed { target };
        info!(
            "snoozed {minutes} min, alarm now at {}",
            target.format("%Y-%m-%d %H:%M")
        );
        Ok(target)
    }

    /// Fires the alarm once `now` reaches the target. Calling it again while ringing does nothing.
    pub fn check_alarm(&mut self, now: NaiveDateTime) -> Tick {
        let AlarmState::Armed { target } = self.state else {
            return Tick::Idle;
        };
        if now < target {
            return Tick::Idle;
        }
        self.state = AlarmState::Ringing { target };
        info!("alarm fired at {now} (set for {target})");
        match self.trigger() {
            Ok(()) => Tick::Fired,
            Err(e) => {
                error!("alarm fired without sound: {e}");
                Tick::FiredWithError(e)
            }
        }
    }

    // the state is already Ringing here and stays so whatever happens
    fn trigger(&mut self) -> Result<(), AlarmError> {
        let sound = &self.config.sound_file;
        if !sound.is_file() {
            return Err(PlayerError::SoundFileNotFound(sound.clone()).into());
        }
        self.player.bind_device(self.config.device.as_ref())?;
        self.player.load_and_play_loop(sound, self.config.volume)?;
        Ok(())
    }

    /// Silences a ringing alarm and disarms it. Anywhere else it only makes sure nothing plays.
    pub fn stop(&mut self) {
        self.player.stop();
        if self.is_ringing() {
            self.state = AlarmState::Disarmed;
            info!("alarm stopped");
        } else {
            debug!("stop requested while {:?}", self.state);
        }
    }

    /// Returns the volume that was actually stored.
    pub fn set_volume(&mut self, volume: f32) -> f32 {
        let volume = clamp_volume(volume);
        self.config.volume = volume;
        self.player.set_volume(volume);
        self.store.save(&self.config);
        info!("volume set to {volume:.2}");
        volume
    }

    /// Used from the next time the alarm fires.
    pub fn select_device(&mut self, device: Option<DeviceId>) {
        info!(
            "output device set to {}",
            device.as_ref().map_or("system default", DeviceId::as_str)
        );
        self.config.device = device;
        self.store.save(&self.config);
    }

    /// Used from the next time the alarm fires.
    pub fn set_sound_file(&mut self, path: PathBuf) {
        info!("alarm sound set to {}", path.display());
        self.config.sound_file = path;
        self.store.save(&self.config);
    }

    /// Runs the operation behind a window control.
    ///
    /// # Errors
    /// whatever the operation itself reports
    pub fn apply(&mut self, command: Command, now: NaiveDateTime) -> Result<(), AlarmError> {
        debug!("applying {command:?}");
        match command {
            Command::SetAlarm { hour, minute } => self.set_alarm(hour, minute, now).map(|_| ()),
            Command::ClearAlarm => self.clear_alarm(),
            Command::Snooze { minutes } => self.snooze(minutes).map(|_| ()),
            Command::Stop => {
                self.stop();
                Ok(())
            }
            Command::SetVolume(volume) => {
                self.set_volume(volume);
                Ok(())
            }
            Command::SelectDevice(device) => {
                self.select_device(device);
                Ok(())
            }
            Command::SetSoundFile(path) => {
                self.set_sound_file(path);
                Ok(())
            }
        }
    }
}
