use std::ops::{Add, Sub};

use eframe::egui::{emath::Numeric, Color32, Sense, Vec2, Widget};

/// A round dial that picks a value in `min..=max`, like the face of a clock.
pub struct Knob<'a, N> {
    min: N,
    max: N,
    value: &'a mut N,
    hand_color: Option<Color32>,
    radius: Option<f32>,
}

impl<'a, N> Knob<'a, N> {
    pub fn new(value: &'a mut N, min: N, max: N) -> Self {
        Self {
            min,
            max,
            value,
            hand_color: None,
            radius: None,
        }
    }

    #[must_use]
    pub fn radius(mut self, radius: f32) -> Self {
        self.radius = Some(radius);
        self
    }

    #[must_use]
    pub fn hand_color(mut self, color: Color32) -> Self {
        self.hand_color = Some(color);
        self
    }
}

impl<N> Widget for Knob<'_, N>
where
    N: Sub<Output = N> + Add<Output = N> + Numeric,
    f32: From<N>,
{
    // partially from https://github.com/obsqrbtz/egui_knob and https://codeberg.org/pintariching/egui_timepicker
    fn ui(self, ui: &mut eframe::egui::Ui) -> eframe::egui::Response {
        let Self {
            min,
            max,
            value,
            hand_color,
            radius,
        } = self;

        let radius = radius.unwrap_or_else(|| ui.spacing().slider_width / 2.);
        let (rect, mut response) =
            ui.allocate_exact_size(Vec2::splat(radius * 2.), Sense::click_and_drag());
        // the angle (degrees) each value gets
        let part_angle = 360. / (f32::from(max - min) + 1.);
        if response.dragged() || response.clicked() {
            if let Some(pointer) = response.interact_pointer_pos() {
                // inverse of drawing the hand: from a point back to a value
                let degrees = (pointer - rect.center()).angle().to_degrees() + 90.;
                let picked = value_at(degrees, part_angle, min, max);
                if picked != *value {
                    *value = picked;
                    response.mark_changed();
                }
            }
        }

        let visuals = ui.style().interact(&response);
        let center = rect.center();
        ui.painter()
            .circle_filled(center, radius, visuals.bg_fill);
        let border_stroke = visuals.fg_stroke;
        ui.painter().circle_stroke(center, radius, border_stroke);

        // quarter ticks so the dial reads like a clock
        for quarter in 0..4u8 {
            let direction = Vec2::angled((<f32 as From<u8>>::from(quarter) * 90.).to_radians());
            ui.painter().line_segment(
                [center + direction * (radius * 0.8), center + direction * radius],
                border_stroke,
            );
        }

        // minus 90 so the first value sits at the top
        let angle = part_angle.mul_add(f32::from(*value - min), -90.);
        let mut hand_stroke = visuals.fg_stroke;
        if let Some(color) = hand_color {
            hand_stroke.color = color;
        }
        let tip = center
            + Vec2::angled(angle.to_radians()) * border_stroke.width.mul_add(-2., radius);
        ui.painter().line_segment([center, tip], hand_stroke);
        ui.painter()
            .circle_filled(tip, hand_stroke.width * 2., hand_stroke.color);
        response
    }
}

/// The value whose slice of the dial holds `degrees`, measured clockwise from the top.
fn value_at<N>(degrees: f32, part_angle: f32, min: N, max: N) -> N
where
    N: Add<Output = N> + Numeric,
{
    let slice = (degrees.rem_euclid(360.) / part_angle).floor();
    let picked = N::from_f64(f64::from(slice)) + min;
    // just left of the top can round up to a full turn
    if picked > max {
        max
    } else {
        picked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_at_maps_slices_from_the_top() {
        let part_angle = 360. / 24.;
        assert_eq!(value_at(0., part_angle, 0u8, 23), 0);
        assert_eq!(value_at(90., part_angle, 0u8, 23), 6);
        assert_eq!(value_at(359., part_angle, 0u8, 23), 23);
    }

    #[test]
    fn value_at_never_passes_max() {
        let part_angle = 360. / 24.;
        // a pointer a hair left of the top rounds to a full turn in f32
        let degrees = -f32::EPSILON / 4.;
        assert_eq!(degrees.rem_euclid(360.), 360.);
        assert_eq!(value_at(degrees, part_angle, 0u8, 23), 23);
    }

    #[test]
    fn value_at_offsets_by_min() {
        assert_eq!(value_at(180., 360. / 10., 1u8, 10), 6);
    }
}
