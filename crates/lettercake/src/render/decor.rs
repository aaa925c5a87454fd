use eframe::egui::{self, Color32, Pos2, Stroke};

use crate::decor::{Cat, ConfettiPiece, Heading, MouseTrail, Particle, TRAIL_LIFETIME};
use crate::render::{Action, click_area, fill_ellipse, lerp};
use crate::theme::Theme;
use crate::transition::ease_in_out;

pub fn draw_particles(
    painter: &egui::Painter,
    particles: &[Particle],
    rect: egui::Rect,
    t: f32,
    theme: &Theme,
) {
    let palette = theme.balloon_palette();
    for p in particles {
        let pose = p.pose(t);
        let center = Pos2::new(
            rect.left() + p.x * rect.width(),
            rect.top() + p.y * rect.height() + pose.dy,
        );
        let color = Theme::with_opacity(Theme::pick(&palette, p.color), pose.opacity * 0.6);
        painter.circle_filled(center, p.size / 2.0 * pose.scale, color);
    }
}

/// Draw the roaming cats; a click on one startles it.
pub fn draw_cats(
    ui: &egui::Ui,
    cats: &[Cat],
    rect: egui::Rect,
    t: f32,
    scale: f32,
    theme: &Theme,
    actions: &mut Vec<Action>,
) {
    let palette = theme.cat_palette();
    let size = 80.0 * scale;
    for (i, cat) in cats.iter().enumerate() {
        let x = rect.left() + cat.x(t) * rect.width();
        let y = rect.top() + cat.y * rect.height();
        let body = egui::Rect::from_center_size(Pos2::new(x, y), egui::vec2(size, size));
        if !body.intersects(rect) {
            continue;
        }
        let color = if cat.is_scared() {
            theme.scared()
        } else {
            Theme::pick(&palette, cat.color)
        };
        draw_cat(ui.painter(), body, cat.heading, cat.stretch(t), t, color);

        if cat.is_scared() {
            let meow = Theme::with_opacity(theme.pink, 0.8);
            ui.painter().text(
                body.right_top(),
                egui::Align2::RIGHT_BOTTOM,
                "Meow!",
                egui::FontId::proportional(14.0 * scale),
                meow,
            );
        } else if click_area(ui, body, ("cat", i)).clicked() {
            actions.push(Action::ScareCat(i));
        }
    }
}

/// Side-on cat in a 100x100 box facing `heading`.
fn draw_cat(
    painter: &egui::Painter,
    area: egui::Rect,
    heading: Heading,
    stretch: f32,
    t: f32,
    color: Color32,
) {
    let flip = match heading {
        Heading::Right => 1.0,
        Heading::Left => -1.0,
    };
    let u = area.width() / 100.0 * stretch;
    let v = area.height() / 100.0;
    let at = |x: f32, y: f32| {
        Pos2::new(area.center().x + (x - 50.0) * u * flip, area.top() + y * v)
    };

    let stroke = Stroke::new(6.0 * v, color);
    let swing = (t * 12.0).sin();
    for (i, leg_x) in [30.0, 45.0, 60.0, 75.0].into_iter().enumerate() {
        let phase = if i % 2 == 0 { swing } else { -swing };
        painter.line_segment([at(leg_x, 75.0), at(leg_x + phase * 4.0, 90.0)], stroke);
    }

    let tail_tip = at(20.0 - 8.0 * (t * 6.0).sin(), 20.0);
    painter.add(egui::Shape::line(
        vec![at(10.0, 50.0), at(8.0, 35.0), tail_tip],
        Stroke::new(4.0 * v, color),
    ));

    fill_ellipse(painter, at(50.0, 60.0), 30.0 * u, 20.0 * v, color);
    painter.circle_filled(at(75.0, 40.0), 15.0 * v, color);
    for ear in [[65.0, 30.0, 70.0, 15.0, 78.0, 28.0], [82.0, 28.0, 90.0, 15.0, 95.0, 30.0]] {
        painter.add(egui::Shape::convex_polygon(
            vec![at(ear[0], ear[1]), at(ear[2], ear[3]), at(ear[4], ear[5])],
            color,
            Stroke::NONE,
        ));
    }
    painter.circle_filled(at(78.0, 38.0), 2.0 * v, Color32::WHITE);
    painter.circle_filled(at(85.0, 38.0), 2.0 * v, Color32::WHITE);
}

pub fn draw_trail(
    painter: &egui::Painter,
    trail: &MouseTrail,
    now: std::time::Instant,
    theme: &Theme,
) {
    let palette = theme.confetti_palette();
    let lifetime = TRAIL_LIFETIME.as_secs_f32();
    for point in trail.points() {
        let age = now.saturating_duration_since(point.at).as_secs_f32() / lifetime;
        if age >= 1.0 {
            continue;
        }
        let color = Theme::with_opacity(Theme::pick(&palette, point.color), 1.0 - age);
        painter.circle_filled(point.pos, 6.0 * (1.0 - age), color);
    }
}

pub fn draw_confetti(
    painter: &egui::Painter,
    pieces: &[ConfettiPiece],
    center: Pos2,
    t: f32,
    scale: f32,
    theme: &Theme,
) {
    let palette = theme.confetti_palette();
    for piece in pieces {
        let (dx, dy, size, spin) = piece.pose(t);
        if size <= 0.0 {
            continue;
        }
        let pos = center + egui::vec2(dx, dy) * scale;
        let half = 8.0 * scale * size;
        let rot = egui::emath::Rot2::from_angle(spin);
        let corners = [(-1.0, -0.6), (1.0, -0.6), (1.0, 0.6), (-1.0, 0.6)]
            .map(|(x, y)| pos + rot * egui::vec2(x * half, y * half));
        painter.add(egui::Shape::convex_polygon(
            corners.to_vec(),
            Theme::pick(&palette, piece.color),
            Stroke::NONE,
        ));
    }
}

/// Paper plane sweeping from below-left to above-right; `t` runs 0..1.
pub fn draw_plane(painter: &egui::Painter, rect: egui::Rect, t: f32, scale: f32, theme: &Theme) {
    let e = ease_in_out(t.clamp(0.0, 1.0));
    let center = Pos2::new(
        lerp(rect.left() - rect.width() * 0.3, rect.right() + rect.width() * 0.5, e),
        lerp(rect.bottom() + rect.height() * 0.1, rect.top() - rect.height() * 0.4, e),
    );
    let rot = egui::emath::Rot2::from_angle(lerp(15.0, -10.0, e).to_radians());
    let s = 1.6 * scale;
    let p = |x: f32, y: f32| center + rot * egui::vec2((x - 50.0) * s, (y - 50.0) * s);

    let outline = Stroke::new(2.0 * scale, Color32::BLACK);
    painter.add(egui::Shape::convex_polygon(
        vec![p(10.0, 50.0), p(90.0, 20.0), p(50.0, 50.0)],
        theme.card_border,
        outline,
    ));
    painter.add(egui::Shape::convex_polygon(
        vec![p(50.0, 50.0), p(90.0, 20.0), p(50.0, 80.0)],
        theme.card_border,
        outline,
    ));
    painter.line_segment([p(30.0, 65.0), p(50.0, 80.0)], Stroke::new(1.0 * scale, Color32::BLACK));
}
