use eframe::egui::{self, TextEdit, Widget};

use crate::{config::LastTime, widgets::Knob};

/// Hour and minute entry for the alarm, 24 hour clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimePicker {
    hour: u8,
    minute: u8,
    hour_string: String,
    minute_string: String,
}

const MAX_HOUR: u8 = 23;
const MAX_MINUTE: u8 = 59;

impl Default for TimePicker {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl TimePicker {
    #[must_use]
    pub fn new(hour: u8, minute: u8) -> Self {
        let hour = hour.min(MAX_HOUR);
        let minute = minute.min(MAX_MINUTE);
        Self {
            hour,
            minute,
            hour_string: format!("{hour:02}"),
            minute_string: format!("{minute:02}"),
        }
    }

    /// starts from the last alarm the user set, or midnight
    #[must_use]
    pub fn from_last_time(last_time: Option<LastTime>) -> Self {
        last_time.map_or_else(Self::default, |time| {
            Self::new(
                u8::try_from(time.hour).unwrap_or(0),
                u8::try_from(time.minute).unwrap_or(0),
            )
        })
    }

    #[must_use]
    pub fn hour(&self) -> u32 {
        u32::from(self.hour)
    }

    #[must_use]
    pub fn minute(&self) -> u32 {
        u32::from(self.minute)
    }

    pub fn render(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            Self::render_selector(ui, "Hour", &mut self.hour, &mut self.hour_string, MAX_HOUR);
            ui.label(":");
            Self::render_selector(
                ui,
                "Minute",
                &mut self.minute,
                &mut self.minute_string,
                MAX_MINUTE,
            );
        });
    }

    fn render_selector(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut u8,
        text: &mut String,
        max: u8,
    ) {
        ui.vertical(|ui| {
            ui.label(label);
            let hand = ui.visuals().selection.bg_fill;
            if ui
                .add(Knob::new(&mut *value, 0, max).radius(28.0).hand_color(hand))
                .changed()
            {
                *text = format!("{value:02}");
            }
            ui.horizontal(|ui| {
                if ui.button("-").clicked() {
                    *value = if *value == 0 { max } else { *value - 1 };
                    *text = format!("{value:02}");
                }
                if TextEdit::singleline(&mut *text)
                    .desired_width(20.0)
                    .char_limit(2)
                    .ui(ui)
                    .lost_focus()
                {
                    commit_text(text, value, max);
                }
                if ui.button("+").clicked() {
                    *value = if *value == max { 0 } else { *value + 1 };
                    *text = format!("{value:02}");
                }
            });
        });
    }
}

/// Takes typed text if it parses, clamped to `max`, then rewrites the text from the value.
fn commit_text(text: &mut String, value: &mut u8, max: u8) {
    if let Ok(parsed) = text.trim().parse::<u8>() {
        *value = parsed.min(max);
    }
    *text = format!("{value:02}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_from_last_time() {
        let picker = TimePicker::from_last_time(LastTime::new(6, 5));
        assert_eq!((picker.hour(), picker.minute()), (6, 5));
        assert_eq!(picker.hour_string, "06");
        assert_eq!(picker.minute_string, "05");
    }

    #[test]
    fn defaults_to_midnight() {
        let picker = TimePicker::from_last_time(None);
        assert_eq!((picker.hour(), picker.minute()), (0, 0));
    }

    #[test]
    fn typed_text_is_clamped() {
        let mut value = 3;
        let mut text = "99".to_string();
        commit_text(&mut text, &mut value, MAX_HOUR);
        assert_eq!(value, 23);
        assert_eq!(text, "23");
    }

    #[test]
    fn garbage_text_keeps_value() {
        let mut value = 42;
        let mut text = "x".to_string();
        commit_text(&mut text, &mut value, MAX_MINUTE);
        assert_eq!(value, 42);
        assert_eq!(text, "42");
    }
}
