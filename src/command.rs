use std::path::PathBuf;

use crate::audio::DeviceId;

/// Everything the window can ask of the controller, one variant per control.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetAlarm { hour: u32, minute: u32 },
    ClearAlarm,
    Snooze { minutes: u32 },
    Stop,
    SetVolume(f32),
    // `None` is the system default output
    SelectDevice(Option<DeviceId>),
    SetSoundFile(PathBuf),
}
