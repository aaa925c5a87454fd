use std::time::Instant;

use eframe::egui::{self, Color32, FontId, Pos2, Stroke};

use crate::letters::LetterDeck;
use crate::navigation::NavigationController;
use crate::render::image_cache::ImageCache;
use crate::render::{
    Action, click_area, draw_balloon, draw_pop, draw_text_centered, lerp, pill_button,
};
use crate::theme::Theme;
use crate::transition::PopButton;

pub struct LettersView<'a> {
    pub deck: &'a LetterDeck,
    pub images: &'a ImageCache,
    pub nav: &'a NavigationController,
    /// Eased progress of the card slide-in, if one is playing.
    pub card_slide: Option<f32>,
    pub prev: &'a PopButton,
    pub next: &'a PopButton,
    pub music_on: bool,
    /// Full-screen letter picker, only offered on narrow windows.
    pub jump_menu_open: bool,
    pub signature: &'a str,
    pub now: Instant,
    pub t: f32,
}

/// Below this width the jump column gives way to a menu button.
const NARROW_WIDTH: f32 = 1024.0;
/// Maximum card tilt towards the pointer, in degrees.
const MAX_TILT: f32 = 3.0;
const PERSPECTIVE: f32 = 1000.0;

pub fn render(
    ui: &egui::Ui,
    view: &LettersView<'_>,
    theme: &Theme,
    rect: egui::Rect,
    scale: f32,
) -> Vec<Action> {
    let mut actions = Vec::new();
    let index = view.nav.current_index();
    let narrow = rect.width() < NARROW_WIDTH;

    draw_progress(ui.painter(), view, theme, rect, scale);

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

    if narrow {
        let center = Pos2::new(rect.left() + 40.0 * scale, rect.top() + 36.0 * scale);
        if grid_button(ui, center, 22.0 * scale, theme) {
            actions.push(Action::OpenJumpMenu);
        }
    } else {
        draw_jump_row(ui, view, theme, rect, scale, &mut actions);
    }

    let card = draw_card(ui, view, theme, rect, scale);

    let side = 150.0 * scale;
    let prev_center = Pos2::new(card.left() - side, rect.center().y);
    let next_center = Pos2::new(card.right() + side, rect.center().y);
    let busy = view.nav.is_transitioning();
    let next_label = if view.nav.is_last() { "Finish" } else { "Next Letter" };

    if balloon_button(
        ui,
        BalloonLook {
            id: "prev",
            center: prev_center,
            label: "Previous",
            color: theme.blue,
            enabled: index > 0 && !busy,
        },
        view.prev,
        view,
        theme,
        scale,
    ) {
        actions.push(Action::Prev);
    }
    if balloon_button(
        ui,
        BalloonLook {
            id: "next",
            center: next_center,
            label: next_label,
            color: theme.pink,
            enabled: !busy,
        },
        view.next,
        view,
        theme,
        scale,
    ) {
        actions.push(Action::Next);
    }

    if let Some(t) = view.nav.plane().progress(view.now) {
        crate::render::decor::draw_plane(ui.painter(), rect, t, scale, theme);
    }

    if narrow && view.jump_menu_open {
        draw_jump_menu(ui, view, theme, rect, scale, &mut actions);
    }

    actions
}

fn draw_progress(
    painter: &egui::Painter,
    view: &LettersView<'_>,
    theme: &Theme,
    rect: egui::Rect,
    scale: f32,
) {
    let index = view.nav.current_index();
    let count = view.deck.count();
    let width = 560.0 * scale;
    let y = rect.top() + 36.0 * scale;
    let left = rect.center().x - width / 2.0;
    let font = FontId::proportional(theme.small_size * scale);

    painter.text(
        Pos2::new(left, y),
        egui::Align2::LEFT_CENTER,
        format!("Letter {}", index + 1),
        font.clone(),
        theme.muted,
    );
    painter.text(
        Pos2::new(left + width, y),
        egui::Align2::RIGHT_CENTER,
        count.to_string(),
        font,
        theme.muted,
    );

    let track = egui::Rect::from_min_max(
        Pos2::new(left + 80.0 * scale, y - 2.0 * scale),
        Pos2::new(left + width - 40.0 * scale, y + 2.0 * scale),
    );
    painter.rect_filled(track, 2.0 * scale, Color32::from_gray(0xE5));
    let mut filled = track;
    filled.set_width(track.width() * (index + 1) as f32 / count.max(1) as f32);
    painter.rect_filled(filled, 2.0 * scale, theme.pink);
}

/// Column of numbered mini balloons along the left edge.
fn draw_jump_row(
    ui: &egui::Ui,
    view: &LettersView<'_>,
    theme: &Theme,
    rect: egui::Rect,
    scale: f32,
    actions: &mut Vec<Action>,
) {
    let count = view.deck.count();
    let current = view.nav.current_index();
    let palette = theme.balloon_palette();
    let available = rect.height() - 120.0 * scale;
    let step = (available / count as f32).min(52.0 * scale);
    let width = (step * 0.7).min(34.0 * scale);
    let top = rect.center().y - step * count as f32 / 2.0 + step / 2.0;
    let x = rect.left() + 40.0 * scale;

    let backdrop = egui::Rect::from_center_size(
        Pos2::new(x, rect.center().y),
        egui::vec2(width + 20.0 * scale, step * count as f32 + 20.0 * scale),
    );
    ui.painter().rect_filled(
        backdrop,
        backdrop.width() / 2.0,
        Theme::with_opacity(Color32::WHITE, 0.4),
    );

    for i in 0..count {
        let active = i == current;
        let pulse = if active {
            1.0 + 0.05 * (view.t * std::f32::consts::PI).sin()
        } else {
            1.0
        };
        let center = Pos2::new(x, top + i as f32 * step - step * 0.1);
        let hit = click_area(
            ui,
            egui::Rect::from_center_size(center, egui::vec2(width, step)),
            ("jump", i),
        );
        let grow = if hit.hovered() { 1.15 } else { 1.0 };
        let opacity = if active { 1.0 } else { 0.6 };
        let body = draw_balloon(
            ui.painter(),
            center,
            width * 0.85 * pulse * grow,
            Theme::pick(&palette, i),
            opacity,
        );
        ui.painter().text(
            body.center() - egui::vec2(0.0, body.height() * 0.12),
            egui::Align2::CENTER_CENTER,
            (i + 1).to_string(),
            FontId::proportional((step * 0.28).max(8.0)),
            Color32::WHITE,
        );
        if hit.clicked() {
            actions.push(Action::JumpTo(i));
        }
    }
}

/// Round button with a 3x3 dot grid that opens the jump menu.
fn grid_button(ui: &egui::Ui, center: Pos2, radius: f32, theme: &Theme) -> bool {
    let hit = click_area(
        ui,
        egui::Rect::from_center_size(center, egui::vec2(radius, radius) * 2.0),
        "jump-menu",
    );
    let fill = if hit.hovered() { 0.95 } else { 0.8 };
    ui.painter().circle_filled(center, radius, Theme::with_opacity(Color32::WHITE, fill));
    let gap = radius * 0.36;
    for row in -1..=1 {
        for col in -1..=1 {
            let dot = center + egui::vec2(col as f32, row as f32) * gap;
            ui.painter().circle_filled(dot, radius * 0.09, theme.pink);
        }
    }
    hit.clicked()
}

/// Columns in the jump menu grid for a window `width` points wide.
fn jump_menu_columns(width: f32) -> usize {
    if width < 640.0 { 4 } else { 5 }
}

/// Full-screen picker of numbered balloons. Picking one jumps and closes.
fn draw_jump_menu(
    ui: &egui::Ui,
    view: &LettersView<'_>,
    theme: &Theme,
    rect: egui::Rect,
    scale: f32,
    actions: &mut Vec<Action>,
) {
    let painter = ui.painter();
    // Swallows clicks meant for whatever lies underneath.
    let _ = ui.interact(rect, ui.id().with("jump-menu-backdrop"), egui::Sense::click());
    painter.rect_filled(rect, 0.0, Theme::with_opacity(Color32::WHITE, 0.95));

    draw_text_centered(
        painter,
        Pos2::new(rect.center().x, rect.top() + 70.0 * scale),
        "Jump to Letter",
        FontId::proportional(theme.subtitle_size * 1.4 * scale),
        theme.dark_red,
    );

    let close = Pos2::new(rect.right() - 44.0 * scale, rect.top() + 44.0 * scale);
    let radius = 20.0 * scale;
    let hit = click_area(
        ui,
        egui::Rect::from_center_size(close, egui::vec2(radius, radius) * 2.0),
        "jump-menu-close",
    );
    let ring = if hit.hovered() { theme.pink } else { theme.muted };
    painter.circle_stroke(close, radius, Stroke::new(1.5, ring));
    let arm = radius * 0.4;
    let cross = Stroke::new(2.0, ring);
    painter.line_segment([close - egui::vec2(arm, arm), close + egui::vec2(arm, arm)], cross);
    painter.line_segment([close + egui::vec2(arm, -arm), close + egui::vec2(-arm, arm)], cross);
    if hit.clicked() {
        actions.push(Action::CloseJumpMenu);
    }

    let count = view.deck.count();
    let current = view.nav.current_index();
    let palette = theme.balloon_palette();
    let columns = jump_menu_columns(rect.width());
    let rows = count.div_ceil(columns);
    let cell = (rect.width() * 0.8 / columns as f32)
        .min((rect.height() - 160.0 * scale) / rows.max(1) as f32)
        .min(90.0 * scale);
    let grid = egui::Rect::from_center_size(
        rect.center() + egui::vec2(0.0, 40.0 * scale),
        egui::vec2(cell * columns as f32, cell * rows as f32),
    );

    for i in 0..count {
        let (row, col) = (i / columns, i % columns);
        let center = grid.min + egui::vec2((col as f32 + 0.5) * cell, (row as f32 + 0.5) * cell);
        let hit = click_area(
            ui,
            egui::Rect::from_center_size(center, egui::vec2(cell, cell)),
            ("jump-menu", i),
        );
        let grow = if hit.hovered() { 1.1 } else { 1.0 };
        let opacity = if i == current { 1.0 } else { 0.7 };
        let body = draw_balloon(
            painter,
            center,
            cell * 0.55 * grow,
            Theme::pick(&palette, i),
            opacity,
        );
        painter.text(
            body.center() - egui::vec2(0.0, body.height() * 0.12),
            egui::Align2::CENTER_CENTER,
            (i + 1).to_string(),
            FontId::proportional(cell * 0.22),
            Color32::WHITE,
        );
        if hit.clicked() {
            actions.push(Action::JumpTo(i));
        }
    }
}

/// Card rotation towards the pointer, projected with a fixed perspective.
#[derive(Debug, Clone, Copy)]
struct Tilt {
    center: Pos2,
    /// Rotation about the horizontal axis, radians.
    pitch: f32,
    /// Rotation about the vertical axis, radians.
    yaw: f32,
}

impl Tilt {
    /// Pointer at the top leans the top edge away, pointer at the right
    /// leans the right edge away. No pointer means a flat card.
    fn towards(center: Pos2, pointer: Option<Pos2>, screen: egui::Rect) -> Self {
        let (pitch, yaw) = match pointer {
            Some(p) => {
                let y = ((p.y - screen.top()) / screen.height()).clamp(0.0, 1.0);
                let x = ((p.x - screen.left()) / screen.width()).clamp(0.0, 1.0);
                (lerp(MAX_TILT, -MAX_TILT, y), lerp(-MAX_TILT, MAX_TILT, x))
            }
            None => (0.0, 0.0),
        };
        Self {
            center,
            pitch: pitch.to_radians(),
            yaw: yaw.to_radians(),
        }
    }

    fn project(&self, p: Pos2) -> Pos2 {
        let d = p - self.center;
        let (sin_y, cos_y) = self.yaw.sin_cos();
        let (sin_p, cos_p) = self.pitch.sin_cos();
        let x = d.x * cos_y;
        let z = -d.x * sin_y;
        let y = d.y * cos_p - z * sin_p;
        let z = d.y * sin_p + z * cos_p;
        let k = PERSPECTIVE / (PERSPECTIVE - z);
        self.center + egui::vec2(x, y) * k
    }

    /// Corners of `r` clockwise from the top left.
    fn quad(&self, r: egui::Rect) -> Vec<Pos2> {
        [r.left_top(), r.right_top(), r.right_bottom(), r.left_bottom()]
            .into_iter()
            .map(|p| self.project(p))
            .collect()
    }
}

fn fill_quad(painter: &egui::Painter, tilt: &Tilt, r: egui::Rect, fill: Color32, stroke: Stroke) {
    painter.add(egui::Shape::convex_polygon(tilt.quad(r), fill, stroke));
}

/// The letter card, sliding in from the direction of travel and leaning
/// towards the pointer.
fn draw_card(
    ui: &egui::Ui,
    view: &LettersView<'_>,
    theme: &Theme,
    rect: egui::Rect,
    scale: f32,
) -> egui::Rect {
    let painter = ui.painter();
    let index = view.nav.current_index();
    let width = (rect.width() * 0.9).min(500.0 * scale);
    let height = rect.height() * 0.72;

    let (offset, opacity, grow) = match view.card_slide {
        Some(p) => {
            let from = 150.0 * view.nav.direction().sign();
            (lerp(from, 0.0, p) * scale, p, lerp(0.9, 1.0, p))
        }
        None => (0.0, 1.0, 1.0),
    };
    let card = egui::Rect::from_center_size(
        rect.center() + egui::vec2(offset, 20.0 * scale),
        egui::vec2(width, height) * grow,
    );

    let pointer = ui.ctx().input(|i| i.pointer.hover_pos());
    let tilt = Tilt::towards(card.center(), pointer, rect);

    fill_quad(
        painter,
        &tilt,
        card.translate(egui::vec2(0.0, 8.0 * scale)),
        Theme::with_opacity(Color32::BLACK, 0.12 * opacity),
        Stroke::NONE,
    );
    fill_quad(
        painter,
        &tilt,
        card,
        Theme::with_opacity(theme.card_background, opacity),
        Stroke::new(1.0, Theme::with_opacity(theme.card_border, opacity)),
    );

    let tape = egui::Rect::from_center_size(
        Pos2::new(card.center().x, card.top()),
        egui::vec2(128.0 * scale, 30.0 * scale),
    );
    fill_quad(
        painter,
        &tilt,
        tape,
        Theme::with_opacity(theme.pink, 0.7 * opacity),
        Stroke::NONE,
    );

    let Some(letter) = view.deck.get(index) else {
        return card;
    };

    let title_y = card.top() + 50.0 * scale;
    draw_text_centered(
        painter,
        tilt.project(Pos2::new(card.center().x, title_y)),
        &letter.title,
        FontId::proportional(34.0 * scale),
        Theme::with_opacity(theme.dark_red, opacity),
    );

    let pad = 20.0 * scale;
    let image_area = egui::Rect::from_min_max(
        Pos2::new(card.left() + pad, title_y + 36.0 * scale),
        Pos2::new(card.right() - pad, card.bottom() - 48.0 * scale),
    );
    fill_quad(
        painter,
        &tilt,
        image_area,
        Theme::with_opacity(Color32::from_gray(0xF7), opacity),
        Stroke::NONE,
    );

    match view.images.get_or_load(ui.ctx(), index) {
        Some(texture) => {
            let size = texture.size_vec2();
            let fit = (image_area.width() / size.x).min(image_area.height() / size.y);
            let shown = egui::Rect::from_center_size(image_area.center(), size * fit);
            let tint = Theme::with_opacity(Color32::WHITE, opacity);
            let mut mesh = egui::Mesh::with_texture(texture.id());
            let uvs = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
            for (pos, (u, v)) in tilt.quad(shown).into_iter().zip(uvs) {
                mesh.vertices.push(egui::epaint::Vertex {
                    pos,
                    uv: Pos2::new(u, v),
                    color: tint,
                });
            }
            mesh.add_triangle(0, 1, 2);
            mesh.add_triangle(0, 2, 3);
            painter.add(egui::Shape::mesh(mesh));
        }
        None => {
            draw_text_centered(
                painter,
                tilt.project(image_area.center()),
                &format!("Letter {}", index + 1),
                FontId::proportional(theme.body_size * scale),
                Theme::with_opacity(theme.muted, opacity),
            );
        }
    }

    let footer_y = card.bottom() - 24.0 * scale;
    let footer = Theme::with_opacity(theme.muted, 0.7 * opacity);
    painter.text(
        tilt.project(Pos2::new(card.left() + pad, footer_y)),
        egui::Align2::LEFT_CENTER,
        format!("{} / {}", letter.id, view.deck.count()),
        FontId::proportional(theme.small_size * scale),
        footer,
    );
    painter.text(
        tilt.project(Pos2::new(card.right() - pad, footer_y)),
        egui::Align2::RIGHT_CENTER,
        format!("\u{2665} {}", view.signature),
        FontId::proportional(theme.small_size * scale),
        footer,
    );

    card
}

struct BalloonLook<'s> {
    id: &'s str,
    center: Pos2,
    label: &'s str,
    color: Color32,
    enabled: bool,
}

/// Large balloon button: bobbing while idle, swelling and vanishing after a
/// press, then scattering into dots.
fn balloon_button(
    ui: &egui::Ui,
    look: BalloonLook<'_>,
    state: &PopButton,
    view: &LettersView<'_>,
    theme: &Theme,
    scale: f32,
) -> bool {
    let width = 100.0 * scale;
    if let Some(since) = state.popped_for(view.now) {
        if let Some(p) = state.burst(view.now) {
            draw_balloon(
                ui.painter(),
                look.center,
                width * lerp(1.0, 1.5, p),
                look.color,
                1.0 - p,
            );
        }
        draw_pop(
            ui.painter(),
            look.center,
            125.0 * scale,
            since.as_secs_f32() / 0.8,
            &theme.balloon_palette(),
        );
        return false;
    }

    let bob = (view.t * 1.6 + look.center.x * 0.01).sin() * 6.0 * scale;
    let center = look.center + egui::vec2(0.0, bob);
    let hit_rect = egui::Rect::from_center_size(center, egui::vec2(width, width * 1.2));
    let response = if look.enabled {
        Some(click_area(ui, hit_rect, look.id))
    } else {
        None
    };
    let hovered = response.as_ref().is_some_and(|r| r.hovered());
    let lift = if hovered { -10.0 * scale } else { 0.0 };
    let opacity = if look.enabled { 1.0 } else { 0.5 };

    let body = draw_balloon(
        ui.painter(),
        center + egui::vec2(0.0, lift),
        width * if hovered { 1.1 } else { 1.0 },
        look.color,
        opacity,
    );
    draw_text_centered(
        ui.painter(),
        body.center() - egui::vec2(0.0, body.height() * 0.1),
        look.label,
        FontId::proportional(16.0 * scale),
        Theme::with_opacity(Color32::BLACK, 0.8 * opacity),
    );

    response.is_some_and(|r| r.clicked())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> egui::Rect {
        egui::Rect::from_min_size(Pos2::ZERO, egui::vec2(1280.0, 800.0))
    }

    fn card() -> egui::Rect {
        egui::Rect::from_center_size(Pos2::new(640.0, 420.0), egui::vec2(500.0, 576.0))
    }

    fn edge_height(quad: &[Pos2], top: usize, bottom: usize) -> f32 {
        quad[bottom].y - quad[top].y
    }

    #[test]
    fn card_is_flat_without_a_pointer() {
        let tilt = Tilt::towards(card().center(), None, screen());
        let quad = tilt.quad(card());
        assert_eq!(quad[0], card().left_top());
        assert_eq!(quad[2], card().right_bottom());
    }

    #[test]
    fn pointer_on_the_right_leans_the_right_edge_away() {
        let tilt = Tilt::towards(card().center(), Some(Pos2::new(1280.0, 400.0)), screen());
        let quad = tilt.quad(card());
        let left = edge_height(&quad, 0, 3);
        let right = edge_height(&quad, 1, 2);
        assert!(right < left);
        assert!((left - card().height()).abs() < card().height() * 0.05);
    }

    #[test]
    fn pointer_at_the_top_leans_the_top_edge_away() {
        let tilt = Tilt::towards(card().center(), Some(Pos2::new(640.0, 0.0)), screen());
        let quad = tilt.quad(card());
        let top = quad[1].x - quad[0].x;
        let bottom = quad[2].x - quad[3].x;
        assert!(top < bottom);
    }

    #[test]
    fn jump_menu_uses_fewer_columns_on_phones() {
        assert_eq!(jump_menu_columns(400.0), 4);
        assert_eq!(jump_menu_columns(800.0), 5);
    }
}
