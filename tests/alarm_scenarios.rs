use std::{
    cell::RefCell,
    path::{Path, PathBuf},
    rc::Rc,
};

use chrono::{NaiveDate, NaiveDateTime};
use roosty_alarm::{
    audio::{DeviceId, Player},
    config::LastTime,
    AlarmConfig, AlarmController, AlarmError, AlarmState, PlayerError, SettingsStore, Tick,
};

/// Shares what was played with the test after the player moved into the controller.
#[derive(Default, Clone)]
struct SharedPlayer {
    played: Rc<RefCell<Vec<PathBuf>>>,
    playing: Rc<RefCell<bool>>,
}

impl Player for SharedPlayer {
    fn bind_device(&mut self, _device: Option<&DeviceId>) -> Result<(), PlayerError> {
        Ok(())
    }

    fn load_and_play_loop(&mut self, path: &Path, _volume: f32) -> Result<(), PlayerError> {
        self.played.borrow_mut().push(path.to_path_buf());
        *self.playing.borrow_mut() = true;
        Ok(())
    }

    fn set_volume(&mut self, _volume: f32) {}

    fn stop(&mut self) {
        *self.playing.borrow_mut() = false;
    }

    fn is_playing(&self) -> bool {
        *self.playing.borrow()
    }
}

fn at(day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, day)
        .unwrap()
        .and_hms_opt(hour, minute, second)
        .unwrap()
}

fn controller_with_sound(
    dir: &tempfile::TempDir,
    sound_file: PathBuf,
    player: SharedPlayer,
) -> AlarmController<Box<dyn Player>> {
    let store = SettingsStore::new(dir.path().join("config.toml"));
    let config = AlarmConfig {
        device: None,
        sound_file,
        volume: 0.8,
        last_time: None,
    };
    AlarmController::with_config(Box::new(player), store, config)
}

#[test]
fn midnight_alarm_set_just_before_midnight() {
    let dir = tempfile::tempdir().unwrap();
    let sound = dir.path().join("wake.wav");
    std::fs::write(&sound, b"RIFF").unwrap();
    let player = SharedPlayer::default();
    let mut controller = controller_with_sound(&dir, sound.clone(), player.clone());

    let target = controller.set_alarm(0, 0, at(14, 23, 59, 30)).unwrap();
    assert_eq!(target, at(15, 0, 0, 0));

    assert!(matches!(controller.check_alarm(at(14, 23, 59, 59)), Tick::Idle));
    assert!(controller.is_armed());

    assert!(matches!(controller.check_alarm(at(15, 0, 0, 0)), Tick::Fired));
    assert!(controller.is_ringing());
    assert_eq!(*player.played.borrow(), [sound]);
    assert!(controller.player().is_playing());

    controller.stop();
    assert_eq!(controller.state(), AlarmState::Disarmed);
    assert!(!player.is_playing());
}

#[test]
fn missing_sound_still_rings_without_session() {
    let dir = tempfile::tempdir().unwrap();
    let player = SharedPlayer::default();
    let mut controller =
        controller_with_sound(&dir, dir.path().join("nowhere.wav"), player.clone());
    controller.set_alarm(6, 30, at(3, 5, 0, 0)).unwrap();

    let tick = controller.check_alarm(at(3, 6, 30, 0));

    assert!(matches!(
        tick,
        Tick::FiredWithError(AlarmError::Player(PlayerError::SoundFileNotFound(_)))
    ));
    assert!(controller.is_ringing());
    assert!(player.played.borrow().is_empty());
    assert!(!player.is_playing());

    // the user can still dismiss it
    controller.stop();
    assert_eq!(controller.state(), AlarmState::Disarmed);
}

#[test]
fn fires_exactly_at_target_for_every_hour() {
    let dir = tempfile::tempdir().unwrap();
    let sound = dir.path().join("wake.wav");
    std::fs::write(&sound, b"RIFF").unwrap();
    let now = at(20, 12, 34, 56);

    for hour in 0..24 {
        for minute in [0, 17, 59] {
            let mut controller =
                controller_with_sound(&dir, sound.clone(), SharedPlayer::default());
            let target = controller.set_alarm(hour, minute, now).unwrap();

            assert!(target > now);
            assert!(target - now <= chrono::Duration::days(1));
            assert!(matches!(controller.check_alarm(target), Tick::Fired));
            assert!(controller.is_ringing());
        }
    }
}

#[test]
fn cleared_alarm_never_fires() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller =
        controller_with_sound(&dir, dir.path().join("wake.wav"), SharedPlayer::default());
    controller.set_alarm(8, 0, at(1, 7, 0, 0)).unwrap();
    controller.clear_alarm().unwrap();

    for day in 1..10 {
        assert!(matches!(controller.check_alarm(at(day, 8, 0, 0)), Tick::Idle));
    }
    assert_eq!(controller.state(), AlarmState::Disarmed);
}

#[test]
fn settings_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    {
        let mut controller = AlarmController::new(
            Box::new(SharedPlayer::default()) as Box<dyn Player>,
            SettingsStore::new(path.clone()),
        );
        controller.set_alarm(5, 45, at(2, 22, 0, 0)).unwrap();
        controller.set_volume(1.7);
        controller.select_device(Some(DeviceId::new("Headphones")));
    }

    let restarted = AlarmController::new(SharedPlayer::default(), SettingsStore::new(path));

    assert_eq!(restarted.state(), AlarmState::Disarmed);
    assert_eq!(
        restarted.config().last_time,
        Some(LastTime { hour: 5, minute: 45 })
    );
    assert!((restarted.config().volume - 1.0).abs() < f32::EPSILON);
    assert_eq!(restarted.config().device, Some(DeviceId::new("Headphones")));
}
