use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::{Local, NaiveDateTime};
use eframe::egui::{self, Button, CentralPanel, Color32, ComboBox, RichText, Slider, TopBottomPanel};
use log::{error, info};

use crate::{
    alarm::{AlarmController, AlarmState, Tick},
    audio::{OutputDevice, Player},
    command::Command,
    time_picker::TimePicker,
};

/// how often the window wakes up to check the alarm
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// The alarm window. It only draws the controller and turns clicks into [`Command`]s.
pub struct AlarmApp {
    controller: AlarmController<Box<dyn Player>>,
    devices: Vec<OutputDevice>,
    picker: TimePicker,
    snooze_minutes: u32,
    error: Option<String>,
    // shown once at startup when there is no audio backend
    backend_notice: Option<String>,
}

impl AlarmApp {
    #[must_use]
    pub fn new(
        controller: AlarmController<Box<dyn Player>>,
        devices: Vec<OutputDevice>,
        snooze_minutes: u32,
        backend_notice: Option<String>,
    ) -> Self {
        let picker = TimePicker::from_last_time(controller.config().last_time);
        Self {
            controller,
            devices,
            picker,
            snooze_minutes,
            error: None,
            backend_notice,
        }
    }

    fn now() -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn dispatch(&mut self, command: Command) {
        match self.controller.apply(command, Self::now()) {
            Ok(()) => self.error = None,
            Err(e) => {
                error!("{e}");
                self.error = Some(e.to_string());
            }
        }
    }

    fn tick(&mut self) {
        match self.controller.check_alarm(Self::now()) {
            Tick::Idle => {}
            Tick::Fired => self.error = None,
            Tick::FiredWithError(e) => self.error = Some(e.to_string()),
        }
    }

    fn render_header(ctx: &egui::Context) {
        TopBottomPanel::top("time").show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading(RichText::new(Local::now().format("%H:%M:%S").to_string()).size(32.0));
            });
        });
    }

    fn render_device_selector(&self, ui: &mut egui::Ui, commands: &mut Vec<Command>) {
        ui.label("Output device:");
        if self.devices.is_empty() {
            ui.colored_label(Color32::RED, "No output devices found");
            return;
        }
        let current = self.controller.config().device.clone();
        let mut selected = current.clone();
        let selected_text = selected.as_ref().map_or_else(
            || "System default".to_string(),
            |id| {
                self.devices
                    .iter()
                    .find(|d| &d.id == id)
                    .map_or_else(|| format!("{id} (unavailable)"), ToString::to_string)
            },
        );
        ComboBox::from_label("device")
            .selected_text(selected_text)
            .width(280.0)
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut selected, None, "System default");
                for device in &self.devices {
                    ui.selectable_value(&mut selected, Some(device.id.clone()), device.to_string());
                }
            });
        if selected != current {
            commands.push(Command::SelectDevice(selected));
        }
    }

    fn render_sound_selector(&self, ui: &mut egui::Ui, commands: &mut Vec<Command>) {
        let sound = &self.controller.config().sound_file;
        ui.horizontal(|ui| {
            ui.label("Sound:");
            ui.label(sound.file_name().map_or_else(
                || sound.display().to_string(),
                |name| name.to_string_lossy().into_owned(),
            ))
            .on_hover_text(sound.display().to_string());
            if ui.button("Choose...").clicked() {
                if let Some(path) = pick_sound_file(sound) {
                    commands.push(Command::SetSoundFile(path));
                }
            }
        });
    }

    fn render_volume(&self, ui: &mut egui::Ui, commands: &mut Vec<Command>) {
        let mut volume = self.controller.config().volume;
        if ui
            .add(Slider::new(&mut volume, 0.0..=1.0).text("volume"))
            .changed()
        {
            commands.push(Command::SetVolume(volume));
        }
    }

    fn render_controls(&self, ui: &mut egui::Ui, commands: &mut Vec<Command>) {
        let disarmed = self.controller.state() == AlarmState::Disarmed;
        let armed = self.controller.is_armed();
        ui.horizontal(|ui| {
            if ui.add_enabled(disarmed, Button::new("Set alarm")).clicked() {
                commands.push(Command::SetAlarm {
                    hour: self.picker.hour(),
                    minute: self.picker.minute(),
                });
            }
            if ui.add_enabled(armed, Button::new("Clear alarm")).clicked() {
                commands.push(Command::ClearAlarm);
            }
            if ui
                .add_enabled(armed, Button::new(format!("Snooze ({} min)", self.snooze_minutes)))
                .clicked()
            {
                commands.push(Command::Snooze {
                    minutes: self.snooze_minutes,
                });
            }
        });
        if self.controller.is_ringing()
            && ui
                .add(Button::new(RichText::new("Stop").size(24.0)).fill(Color32::DARK_RED))
                .clicked()
        {
            commands.push(Command::Stop);
        }
    }

    fn render_status(&mut self, ui: &mut egui::Ui) {
        ui.label(status_line(self.controller.state(), Self::now()));
        if let Some(error) = &self.error {
            ui.colored_label(Color32::RED, error);
        }
        let mut dismissed = false;
        if let Some(notice) = &self.backend_notice {
            ui.horizontal(|ui| {
                ui.colored_label(Color32::YELLOW, notice);
                dismissed = ui.small_button("x").clicked();
            });
        }
        if dismissed {
            self.backend_notice = None;
        }
    }
}

fn pick_sound_file(current: &Path) -> Option<PathBuf> {
    let dialog = rfd::FileDialog::new()
        .set_title("Pick alarm sound")
        .add_filter("audio", &["wav", "mp3", "ogg", "flac"]);
    // start next to the current sound, else in the user's music folder
    let start = current
        .parent()
        .filter(|dir| dir.is_dir())
        .map(Path::to_path_buf)
        .or_else(|| {
            directories::UserDirs::new().and_then(|u| u.audio_dir().map(Path::to_path_buf))
        });
    let dialog = match start {
        Some(dir) => dialog.set_directory(dir),
        None => dialog,
    };
    dialog.pick_file()
}

/// The one line summary under the controls.
#[must_use]
pub fn status_line(state: AlarmState, now: NaiveDateTime) -> String {
    match state {
        AlarmState::Disarmed => "Alarm not set".to_string(),
        AlarmState::Armed { target } if target.date() == now.date() => {
            format!("Alarm set for {}", target.format("%H:%M"))
        }
        AlarmState::Armed { target } => {
            format!("Alarm set for {} tomorrow", target.format("%H:%M"))
        }
        AlarmState::Ringing { .. } => "ALARM!".to_string(),
    }
}

impl eframe::App for AlarmApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.tick();

        Self::render_header(ctx);
        let mut commands = Vec::new();
        CentralPanel::default().show(ctx, |ui| {
            let editable = self.controller.state() == AlarmState::Disarmed;
            ui.label("Alarm time:");
            ui.add_enabled_ui(editable, |ui| self.picker.render(ui));
            ui.separator();
            self.render_device_selector(ui, &mut commands);
            self.render_sound_selector(ui, &mut commands);
            self.render_volume(ui, &mut commands);
            ui.separator();
            self.render_controls(ui, &mut commands);
            ui.separator();
            self.render_status(ui);
        });
        for command in commands {
            self.dispatch(command);
        }

        // keep ticking while the window is idle
        ctx.request_repaint_after(TICK_INTERVAL);
    }
}

impl Drop for AlarmApp {
    fn drop(&mut self) {
        self.controller.stop();
        info!("application closed");
    }
}
