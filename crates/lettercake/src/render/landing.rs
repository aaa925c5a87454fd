use eframe::egui::{self, Color32, FontId, Pos2, Stroke};

use crate::page::{BlowGesture, Permission};
use crate::render::{Action, click_area, draw_text_centered, fill_ellipse, pill_button};
use crate::theme::Theme;

pub struct LandingView<'a> {
    pub blow: &'a BlowGesture,
    pub recipient: &'a str,
    pub letter_count: usize,
    /// Seconds since the candles went out, if they have.
    pub blown_for: Option<f32>,
    /// Scene clock in seconds.
    pub t: f32,
}

pub fn render(
    ui: &egui::Ui,
    view: &LandingView<'_>,
    theme: &Theme,
    rect: egui::Rect,
    scale: f32,
) -> Vec<Action> {
    let mut actions = Vec::new();
    let painter = ui.painter();

    let cake_size = 300.0 * scale;
    let cake_rect = egui::Rect::from_center_size(
        Pos2::new(rect.center().x, rect.top() + rect.height() * 0.32),
        egui::vec2(cake_size, cake_size),
    );
    draw_cake(painter, cake_rect, view, theme);

    let mut y = cake_rect.bottom() + 30.0 * scale;
    draw_text_centered(
        painter,
        Pos2::new(rect.center().x, y),
        &format!("Happy Birthday, {}", view.recipient),
        FontId::proportional(theme.title_size * scale),
        theme.heading_color,
    );
    y += 50.0 * scale;
    draw_text_centered(
        painter,
        Pos2::new(rect.center().x, y),
        "I wrote every letter in here by hand, only for you.",
        FontId::proportional(theme.subtitle_size * scale),
        theme.muted,
    );
    y += 80.0 * scale;
    let center = Pos2::new(rect.center().x, y);

    if view.blow.is_blown() {
        let label = format!("Read Your {} Letters", view.letter_count);
        if pill_button(ui, "enter", center, &label, theme.pink, Color32::WHITE, 22.0 * scale) {
            actions.push(Action::EnterLetters);
        }
        return actions;
    }

    match view.blow.permission() {
        Permission::Prompt => {
            if pill_button(
                ui,
                "mic",
                center,
                "ENABLE MIC TO BLOW",
                Color32::BLACK,
                theme.background,
                15.0 * scale,
            ) {
                actions.push(Action::EnableMic);
            }
        }
        Permission::Granted => {
            let pulse = 0.6 + 0.4 * (view.t * 3.0).sin().abs();
            draw_text_centered(
                painter,
                center - egui::vec2(0.0, 14.0 * scale),
                "BLOW INTO THE MIC...",
                FontId::proportional(theme.small_size * scale),
                Theme::with_opacity(theme.pink, pulse),
            );
            let bar = egui::Rect::from_center_size(
                center + egui::vec2(0.0, 10.0 * scale),
                egui::vec2(130.0 * scale, 8.0 * scale),
            );
            painter.rect_filled(bar, 4.0 * scale, Color32::from_gray(0xE5));
            let mut fill = bar;
            fill.set_width(bar.width() * view.blow.level_percent() / 100.0);
            painter.rect_filled(fill, 4.0 * scale, theme.purple);
        }
        Permission::Denied => {
            draw_text_centered(
                painter,
                center,
                "No microphone available",
                FontId::proportional(theme.small_size * scale),
                theme.muted,
            );
        }
    }

    if view.blow.permission() != Permission::Granted {
        let link_pos = center + egui::vec2(0.0, 40.0 * scale);
        let link_rect = draw_text_centered(
            painter,
            link_pos,
            "Or tap here to blow manually",
            FontId::proportional(theme.small_size * scale),
            theme.muted,
        );
        let response = click_area(ui, link_rect.expand(4.0), "manual-blow");
        let color = if response.hovered() { theme.pink } else { theme.muted };
        painter.line_segment(
            [link_rect.left_bottom(), link_rect.right_bottom()],
            Stroke::new(1.0, color),
        );
        if response.clicked() {
            actions.push(Action::ManualBlow);
        }
    }

    actions
}

/// Two-tier cake with three candles, drawn in a 200x200 box.
fn draw_cake(painter: &egui::Painter, area: egui::Rect, view: &LandingView<'_>, theme: &Theme) {
    let k = area.width() / 200.0;
    let at = |x: f32, y: f32| area.min + egui::vec2(x * k, y * k);
    let outline = Stroke::new(2.0 * k, Color32::BLACK);

    // Bottom tier.
    let lower = egui::Rect::from_min_max(at(20.0, 120.0), at(180.0, 170.0));
    fill_ellipse(painter, at(100.0, 170.0), 80.0 * k, 18.0 * k, theme.card_border);
    painter.rect_filled(lower, 0.0, theme.card_border);
    painter.line_segment([lower.left_top(), lower.left_bottom()], outline);
    painter.line_segment([lower.right_top(), lower.right_bottom()], outline);
    fill_ellipse(painter, at(100.0, 120.0), 80.0 * k, 20.0 * k, theme.card_border);

    let frosting: Vec<Pos2> = (0..=16)
        .map(|i| at(20.0 + i as f32 * 10.0, if i % 2 == 0 { 120.0 } else { 128.0 }))
        .collect();
    painter.add(egui::Shape::line(frosting, Stroke::new(2.0 * k, theme.dark_red)));

    // Top tier.
    let upper = egui::Rect::from_min_max(at(40.0, 80.0), at(160.0, 120.0));
    fill_ellipse(painter, at(100.0, 120.0), 60.0 * k, 14.0 * k, theme.mint);
    painter.rect_filled(upper, 0.0, theme.mint);
    painter.line_segment([upper.left_top(), upper.left_bottom()], outline);
    painter.line_segment([upper.right_top(), upper.right_bottom()], outline);
    fill_ellipse(painter, at(100.0, 80.0), 60.0 * k, 15.0 * k, theme.mint);

    for i in 0..3 {
        let x = 65.0 + i as f32 * 40.0;
        let stick = egui::Rect::from_min_max(at(x, 50.0), at(x + 10.0, 90.0));
        painter.rect_filled(stick, 2.0 * k, theme.mint);
        painter.rect_stroke(stick, 2.0 * k, outline, egui::StrokeKind::Middle);
        for stripe_y in [60.0, 75.0] {
            let stripe = egui::Rect::from_min_max(at(x, stripe_y), at(x + 10.0, stripe_y + 5.0));
            painter.rect_filled(stripe, 0.0, Theme::with_opacity(theme.dark_red, 0.3));
        }

        let wick = at(x + 5.0, 40.0);
        match view.blown_for {
            None => {
                let phase = view.t * 4.0 + i as f32 * 0.6;
                let flicker = 1.0 + 0.12 * phase.sin();
                fill_ellipse(
                    painter,
                    wick - egui::vec2(0.0, 2.0 * k * phase.cos().abs()),
                    5.0 * k * flicker,
                    10.0 * k * flicker,
                    Theme::with_opacity(theme.gold, 0.85 + 0.15 * phase.cos()),
                );
                fill_ellipse(
                    painter,
                    wick + egui::vec2(0.0, 4.0 * k),
                    2.0 * k,
                    4.5 * k,
                    Theme::with_opacity(Color32::from_rgb(0x00, 0xBF, 0xFF), 0.6),
                );
            }
            Some(since) if since < 2.0 => {
                let p = since / 2.0;
                let drift = if i % 2 == 0 { 10.0 } else { -10.0 };
                let smoke = Theme::with_opacity(Color32::from_gray(0x88), 0.6 * (1.0 - p));
                for (j, r) in [2.0, 3.0, 4.0].into_iter().enumerate() {
                    let rise = -60.0 * p - j as f32 * 10.0;
                    painter.circle_filled(at(x + 5.0 + drift * p, 40.0 + rise), r * k, smoke);
                }
            }
            Some(_) => {}
        }
    }
}
