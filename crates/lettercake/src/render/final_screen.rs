use eframe::egui::{self, Color32, FontId, Pos2, Stroke};

use crate::decor::ConfettiPiece;
use crate::render::decor::draw_confetti;
use crate::render::{
    Action, click_area, draw_balloon, draw_text_centered, fill_ellipse, lerp, pill_button,
};
use crate::theme::Theme;
use crate::transition::ease_out;

pub struct FinalView<'a> {
    pub recipient: &'a str,
    pub music_on: bool,
    /// Seconds since the balloon popped, if it has.
    pub popped_for: Option<f32>,
    pub confetti: &'a [ConfettiPiece],
    /// Seconds since the final screen appeared.
    pub shown_for: f32,
    pub t: f32,
}

/// Delay before the closing message starts to rise.
const MESSAGE_DELAY: f32 = 0.5;
const MESSAGE_SECS: f32 = 1.0;
const HEART_DELAY: f32 = 2.5;

pub fn render(
    ui: &egui::Ui,
    view: &FinalView<'_>,
    theme: &Theme,
    rect: egui::Rect,
    scale: f32,
) -> Vec<Action> {
    let mut actions = Vec::new();
    let music_label = if view.music_on { "Music on" } else { "Music off" };
    let music_center = Pos2::new(rect.right() - 70.0 * scale, rect.top() + 36.0 * scale);
    if pill_button(
        ui,
        "music",
        music_center,
        music_label,
        Theme::with_opacity(Color32::WHITE, 0.85),
        theme.foreground,
        theme.small_size * scale,
    ) {
        actions.push(Action::ToggleMusic);
    }

    match view.popped_for {
        None => {
            if giant_balloon(ui, view, theme, rect, scale) {
                actions.push(Action::PopBalloon);
            }
        }
        Some(since) => {
            draw_confetti(ui.painter(), view.confetti, rect.center(), since, scale, theme);
            draw_message(ui.painter(), view.recipient, since, theme, rect, scale);
        }
    }
    actions
}

/// The big pink balloon; grows in, breathes, and returns true when clicked.
fn giant_balloon(
    ui: &egui::Ui,
    view: &FinalView<'_>,
    theme: &Theme,
    rect: egui::Rect,
    scale: f32,
) -> bool {
    let grow = ease_out((view.shown_for / 0.6).clamp(0.0, 1.0));
    let breathe = 1.0 + 0.015 * (view.t * std::f32::consts::TAU / 3.0).sin();
    let width = 320.0 * scale * grow * breathe;
    let center = rect.center() - egui::vec2(0.0, 30.0 * scale);

    let hit = click_area(
        ui,
        egui::Rect::from_center_size(center, egui::vec2(width, width * 1.1)),
        "final-balloon",
    );
    let width = if hit.hovered() { width * 1.05 } else { width };

    let body = draw_balloon(ui.painter(), center, width, theme.pink, grow);
    let text = Theme::with_opacity(Color32::WHITE, 0.9 * grow);
    draw_text_centered(
        ui.painter(),
        body.center() - egui::vec2(0.0, 10.0 * scale),
        &format!("FOR {}", view.recipient.to_uppercase()),
        FontId::proportional(30.0 * scale),
        text,
    );
    draw_text_centered(
        ui.painter(),
        body.center() + egui::vec2(0.0, 24.0 * scale),
        "tap to pop",
        FontId::proportional(theme.small_size * scale),
        Theme::with_opacity(Color32::WHITE, 0.7 * grow),
    );

    hit.clicked()
}

fn draw_message(
    painter: &egui::Painter,
    recipient: &str,
    since: f32,
    theme: &Theme,
    rect: egui::Rect,
    scale: f32,
) {
    let p = ease_out(((since - MESSAGE_DELAY) / MESSAGE_SECS).clamp(0.0, 1.0));
    if p <= 0.0 {
        return;
    }

    let size = egui::vec2(640.0, 360.0) * scale * lerp(0.9, 1.0, p);
    let rise = egui::vec2(0.0, 50.0 * scale * (1.0 - p));
    let card = egui::Rect::from_center_size(rect.center() + rise, size);
    painter.rect_filled(
        card.translate(egui::vec2(0.0, 10.0 * scale)),
        8.0,
        Theme::with_opacity(Color32::BLACK, 0.1 * p),
    );
    painter.rect_filled(card, 8.0, Theme::with_opacity(Color32::WHITE, 0.9 * p));
    painter.rect_stroke(
        card,
        8.0,
        Stroke::new(1.0, Theme::with_opacity(theme.pink, 0.2 * p)),
        egui::StrokeKind::Inside,
    );

    let x = card.center().x;
    draw_text_centered(
        painter,
        Pos2::new(x, card.top() + 70.0 * scale),
        &format!("Happy Birthday, {recipient}"),
        FontId::proportional(theme.title_size * scale),
        Theme::with_opacity(theme.dark_red, p),
    );
    let line = Theme::with_opacity(Color32::from_gray(0x2D), p);
    draw_text_centered(
        painter,
        Pos2::new(x, card.top() + 150.0 * scale),
        "~ I love you with all my heart",
        FontId::proportional(theme.subtitle_size * scale),
        line,
    );
    draw_text_centered(
        painter,
        Pos2::new(x, card.top() + 195.0 * scale),
        "and I'll always love you and pray for you...",
        FontId::proportional(theme.subtitle_size * scale),
        line,
    );

    if since >= HEART_DELAY {
        let beat = 1.0 + 0.08 * ((since - HEART_DELAY) * 4.0).sin();
        let fade = ((since - HEART_DELAY) / 0.5).clamp(0.0, 1.0);
        draw_heart(
            painter,
            Pos2::new(x, card.bottom() - 60.0 * scale),
            22.0 * scale * beat,
            Theme::with_opacity(theme.pink, fade),
        );
    }
}

/// Two lobes and a point.
fn draw_heart(painter: &egui::Painter, center: Pos2, size: f32, color: Color32) {
    let r = size * 0.5;
    fill_ellipse(painter, center + egui::vec2(-r * 0.95, -r * 0.4), r, r, color);
    fill_ellipse(painter, center + egui::vec2(r * 0.95, -r * 0.4), r, r, color);
    painter.add(egui::Shape::convex_polygon(
        vec![
            center + egui::vec2(-size * 0.97, -r * 0.1),
            center + egui::vec2(size * 0.97, -r * 0.1),
            center + egui::vec2(0.0, size * 1.1),
        ],
        color,
        Stroke::NONE,
    ));
}
