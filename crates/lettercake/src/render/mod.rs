pub mod decor;
pub mod final_screen;
pub mod image_cache;
pub mod landing;
pub mod letters;

use std::f32::consts::PI;

use eframe::egui::{self, Color32, FontId, Pos2, Stroke};

use crate::theme::Theme;

/// Something the user clicked this frame. Collected by the screens and
/// applied by the app after drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    EnableMic,
    ManualBlow,
    EnterLetters,
    Prev,
    Next,
    JumpTo(usize),
    OpenJumpMenu,
    CloseJumpMenu,
    ToggleMusic,
    ScareCat(usize),
    PopBalloon,
}

/// Scale factor relative to a 1280x800 window.
pub fn compute_scale(rect: egui::Rect) -> f32 {
    let ref_w = 1280.0;
    let ref_h = 800.0;
    (rect.width() / ref_w).min(rect.height() / ref_h).max(0.4)
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Points on an ellipse, for filled polygons.
pub fn ellipse_points(center: Pos2, rx: f32, ry: f32, segments: usize) -> Vec<Pos2> {
    (0..segments)
        .map(|i| {
            let t = 2.0 * PI * i as f32 / segments as f32;
            Pos2::new(center.x + rx * t.cos(), center.y + ry * t.sin())
        })
        .collect()
}

pub fn fill_ellipse(painter: &egui::Painter, center: Pos2, rx: f32, ry: f32, color: Color32) {
    painter.add(egui::Shape::convex_polygon(
        ellipse_points(center, rx, ry, 32),
        color,
        Stroke::NONE,
    ));
}

/// Egg-shaped party balloon, wider at the top, with knot, string and shine.
/// `center` is the middle of the body; returns the body's bounding rect.
pub fn draw_balloon(
    painter: &egui::Painter,
    center: Pos2,
    width: f32,
    color: Color32,
    opacity: f32,
) -> egui::Rect {
    let rx = width / 2.0;
    let ry = width * 0.48;
    let color = Theme::with_opacity(color, opacity);

    let body: Vec<Pos2> = (0..40)
        .map(|i| {
            let t = 2.0 * PI * i as f32 / 40.0;
            // Stretch the lower half so the balloon tapers to the knot.
            let stretch = if t.sin() > 0.0 { 1.0 + 0.25 * t.sin() } else { 1.0 };
            Pos2::new(center.x + rx * t.cos(), center.y + ry * t.sin() * stretch)
        })
        .collect();
    painter.add(egui::Shape::convex_polygon(body, color, Stroke::NONE));

    let bottom = center.y + ry * 1.25;
    let knot = width * 0.06;
    painter.add(egui::Shape::convex_polygon(
        vec![
            Pos2::new(center.x - knot, bottom + knot * 1.2),
            Pos2::new(center.x, bottom - knot * 0.3),
            Pos2::new(center.x + knot, bottom + knot * 1.2),
        ],
        color,
        Stroke::NONE,
    ));

    let string = Theme::with_opacity(Color32::BLACK, 0.3 * opacity);
    let tail: Vec<Pos2> = (0..=8)
        .map(|i| {
            let s = i as f32 / 8.0;
            Pos2::new(
                center.x + (s * PI * 1.5).sin() * width * 0.05,
                bottom + knot + s * width * 0.35,
            )
        })
        .collect();
    painter.add(egui::Shape::line(tail, Stroke::new(1.5, string)));

    fill_ellipse(
        painter,
        Pos2::new(center.x - rx * 0.4, center.y - ry * 0.5),
        rx * 0.18,
        ry * 0.1,
        Theme::with_opacity(Color32::WHITE, 0.35 * opacity),
    );

    egui::Rect::from_center_size(center, egui::vec2(width, ry * 2.25))
}

/// Burst of dots flying out from `center`; `t` runs 0..1.
pub fn draw_pop(
    painter: &egui::Painter,
    center: Pos2,
    reach: f32,
    t: f32,
    palette: &[Color32],
) {
    let t = t.clamp(0.0, 1.0);
    let spread = crate::transition::ease_out(t);
    for i in 0..20 {
        let angle = i as f32 * 2.399_963; // golden angle
        let dist = reach * (0.4 + 0.6 * ((i * 7 % 10) as f32 / 10.0)) * spread;
        let pos = center + egui::vec2(angle.cos(), angle.sin()) * dist;
        let color = Theme::pick(palette, i);
        painter.circle_filled(pos, 5.0 * (1.0 - t), color);
    }
}

pub fn draw_text_centered(
    painter: &egui::Painter,
    pos: Pos2,
    text: &str,
    font: FontId,
    color: Color32,
) -> egui::Rect {
    painter.text(pos, egui::Align2::CENTER_CENTER, text, font, color)
}

/// Click target covering `rect`, with a pointing-hand cursor on hover.
pub fn click_area(ui: &egui::Ui, rect: egui::Rect, id: impl std::hash::Hash) -> egui::Response {
    ui.interact(rect, ui.id().with(id), egui::Sense::click())
        .on_hover_cursor(egui::CursorIcon::PointingHand)
}

/// Rounded pill button with centered text. Returns true when clicked.
pub fn pill_button(
    ui: &egui::Ui,
    id: &str,
    center: Pos2,
    text: &str,
    fill: Color32,
    text_color: Color32,
    size: f32,
) -> bool {
    let painter = ui.painter();
    let galley = painter.layout_no_wrap(text.to_string(), FontId::proportional(size), text_color);
    let padding = egui::vec2(size * 1.2, size * 0.7);
    let rect = egui::Rect::from_center_size(center, galley.rect.size() + padding * 2.0);
    let response = click_area(ui, rect, id);
    let fill = if response.hovered() {
        fill.gamma_multiply(0.85)
    } else {
        fill
    };
    painter.rect_filled(rect, rect.height() / 2.0, fill);
    painter.galley(rect.min + padding, galley, text_color);
    response.clicked()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_follows_smaller_axis() {
        let rect = egui::Rect::from_min_size(Pos2::ZERO, egui::vec2(2560.0, 800.0));
        assert_eq!(compute_scale(rect), 1.0);
        let tiny = egui::Rect::from_min_size(Pos2::ZERO, egui::vec2(100.0, 100.0));
        assert_eq!(compute_scale(tiny), 0.4);
    }

    #[test]
    fn ellipse_points_lie_on_the_ellipse() {
        let c = Pos2::new(10.0, 20.0);
        for p in ellipse_points(c, 4.0, 2.0, 16) {
            let v = ((p.x - c.x) / 4.0).powi(2) + ((p.y - c.y) / 2.0).powi(2);
            assert!((v - 1.0).abs() < 1e-4);
        }
    }
}
