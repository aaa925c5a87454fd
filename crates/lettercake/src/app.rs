use eframe::egui;
use std::path::PathBuf;
use std::time::Instant;

use crate::audio::detector::DEFAULT_BLOW_THRESHOLD;
use crate::audio::mic;
use crate::audio::music::MusicPlayer;
use crate::config::Config;
use crate::decor::Scene;
use crate::letters::LetterDeck;
use crate::navigation::NavEvent;
use crate::page::{FinalState, PageController, PageEvent, Permission, Screen};
use crate::render::final_screen::FinalView;
use crate::render::image_cache::{self, ImageCache};
use crate::render::landing::LandingView;
use crate::render::letters::LettersView;
use crate::render::{self, Action};
use crate::theme::Theme;
use crate::transition::{PopButton, Transition, TransitionKind};

/// Everything the command line decides before the window opens.
#[derive(Debug, Default)]
pub struct LaunchOptions {
    pub letters_dir: Option<PathBuf>,
    pub windowed: bool,
    /// 1-indexed.
    pub letter: Option<usize>,
    pub no_mic: bool,
    pub no_music: bool,
    pub seed: Option<u64>,
}

struct Toast {
    message: String,
    start: Instant,
}

impl Toast {
    fn new(message: String) -> Self {
        Self {
            message,
            start: Instant::now(),
        }
    }

    fn opacity(&self) -> f32 {
        let elapsed = self.start.elapsed().as_secs_f32();
        let duration = 1.5;
        let fade_start = 1.0;
        if elapsed < fade_start {
            1.0
        } else if elapsed < duration {
            1.0 - (elapsed - fade_start) / (duration - fade_start)
        } else {
            0.0
        }
    }

    fn is_expired(&self) -> bool {
        self.start.elapsed().as_secs_f32() >= 1.5
    }
}

struct CardApp {
    page: PageController,
    deck: LetterDeck,
    images: ImageCache,
    scene: Scene,
    theme: Theme,
    recipient: String,
    signature: String,
    music_track: Option<PathBuf>,
    music_on: bool,
    /// Opened on the letters screen once music is wanted; keeps playing
    /// through the final screen.
    music: Option<MusicPlayer>,
    prev_button: PopButton,
    next_button: PopButton,
    /// Whether the next balloon currently reads "Finish".
    next_is_finish: bool,
    card_slide: Transition,
    jump_menu_open: bool,
    start: Instant,
    blown_at: Option<Instant>,
    final_at: Option<Instant>,
    toast: Option<Toast>,
    last_esc: Option<Instant>,
}

impl CardApp {
    fn new(deck: LetterDeck, images: ImageCache, config: &Config, options: &LaunchOptions) -> Self {
        let threshold = config
            .defaults
            .as_ref()
            .and_then(|d| d.blow_threshold)
            .unwrap_or(DEFAULT_BLOW_THRESHOLD);
        let start_letter = options.letter.map(|n| n.saturating_sub(1)).unwrap_or(0);
        let mut page =
            PageController::with_start_letter(deck.count(), start_letter).with_threshold(threshold);
        if options.no_mic {
            page.set_permission(Permission::Denied);
        }

        Self {
            page,
            deck,
            images,
            scene: Scene::new(options.seed),
            theme: Theme::birthday(),
            recipient: config.recipient().to_string(),
            signature: config.signature().to_string(),
            music_track: config.defaults.as_ref().and_then(|d| d.music_file.clone()),
            music_on: !options.no_music && config.music_on(),
            music: None,
            prev_button: PopButton::new(),
            next_button: PopButton::new(),
            next_is_finish: false,
            card_slide: Transition::new(TransitionKind::CardSlide),
            jump_menu_open: false,
            start: Instant::now(),
            blown_at: None,
            final_at: None,
            toast: None,
            last_esc: None,
        }
    }

    fn clock(&self, now: Instant) -> f32 {
        now.saturating_duration_since(self.start).as_secs_f32()
    }

    fn apply(&mut self, action: Action, now: Instant) {
        log::trace!("action {action:?}");
        let index = self.page.navigation().current_index();
        let busy = self.page.navigation().is_transitioning();
        let screen = self.page.screen();
        let on_letters = screen == Screen::Letters;
        match action {
            Action::EnableMic => {
                if self.page.blow().permission() == Permission::Prompt {
                    self.page.attach_microphone(mic::open_default());
                }
            }
            Action::ManualBlow => {
                self.page.manual_blow();
            }
            Action::EnterLetters => {
                self.page.enter_letters(now);
            }
            Action::Prev => {
                let enabled = on_letters && index > 0 && !busy;
                self.prev_button.press(now, enabled);
            }
            Action::Next => {
                let enabled = on_letters && !busy;
                self.next_button.press(now, enabled);
            }
            Action::JumpTo(target) => {
                self.jump_menu_open = false;
                self.page.jump_to(target, now);
            }
            Action::OpenJumpMenu => {
                self.jump_menu_open = on_letters;
            }
            Action::CloseJumpMenu => {
                self.jump_menu_open = false;
            }
            Action::ToggleMusic => {
                self.music_on = !self.music_on;
                match &mut self.music {
                    Some(music) => music.set_enabled(self.music_on),
                    None if screen != Screen::Landing && self.music_on => self.open_music(),
                    None => {}
                }
                if self.music_on && self.music.as_ref().is_some_and(|m| !m.is_audible()) {
                    self.toast = Some(Toast::new("No audio output available".to_string()));
                }
            }
            Action::ScareCat(index) => {
                let t = self.clock(now);
                self.scene.scare_cat(index, t);
            }
            Action::PopBalloon => {
                self.page.pop_balloon(now);
            }
        }
    }

    fn open_music(&mut self) {
        self.music = Some(MusicPlayer::new(self.music_track.as_deref(), true));
    }

    fn next_deadline(&self) -> Option<Instant> {
        [
            self.page.next_deadline(),
            self.prev_button.next_deadline(),
            self.next_button.next_deadline(),
            self.card_slide.ends_at(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Run the balloon buttons and the page, then react to what happened.
    fn advance(&mut self, now: Instant) {
        if self.prev_button.poll(now) {
            self.page.prev(now);
        }
        if self.next_button.poll(now) {
            self.page.next(now);
        }

        for event in self.page.update(now) {
            match event {
                PageEvent::Blown => self.blown_at = Some(now),
                PageEvent::ScreenChanged(Screen::Letters) => {
                    if self.music_on {
                        self.open_music();
                    }
                }
                PageEvent::ScreenChanged(Screen::Final) => {
                    self.final_at = Some(now);
                    self.jump_menu_open = false;
                    self.prev_button.cancel();
                    self.next_button.cancel();
                }
                PageEvent::ScreenChanged(Screen::Landing) => {}
                PageEvent::Nav(NavEvent::IndexChanged { .. }) => {
                    self.card_slide.cancel();
                    self.card_slide.trigger(now);
                }
                PageEvent::Nav(_) => {}
                PageEvent::BalloonPopped => self.scene.burst(),
            }
        }

        let is_last = self.page.navigation().is_last();
        if is_last != self.next_is_finish {
            self.next_is_finish = is_last;
            self.next_button.reset();
        }
        self.card_slide.poll(now);

        let t = self.clock(now);
        self.scene.update(t, now);
    }

    fn draw(&self, ui: &egui::Ui, rect: egui::Rect, now: Instant) -> Vec<Action> {
        let scale = render::compute_scale(rect);
        let t = self.clock(now);
        let mut actions = Vec::new();

        match self.page.screen() {
            Screen::Landing => {
                render::decor::draw_particles(
                    ui.painter(),
                    &self.scene.particles,
                    rect,
                    t,
                    &self.theme,
                );
                let view = LandingView {
                    blow: self.page.blow(),
                    recipient: &self.recipient,
                    letter_count: self.deck.count(),
                    blown_for: self
                        .blown_at
                        .map(|at| now.saturating_duration_since(at).as_secs_f32()),
                    t,
                };
                actions.extend(render::landing::render(ui, &view, &self.theme, rect, scale));
            }
            Screen::Letters => {
                render::decor::draw_cats(
                    ui,
                    &self.scene.cats,
                    rect,
                    t,
                    scale,
                    &self.theme,
                    &mut actions,
                );
                let view = LettersView {
                    deck: &self.deck,
                    images: &self.images,
                    nav: self.page.navigation(),
                    card_slide: self.card_slide.eased(now),
                    prev: &self.prev_button,
                    next: &self.next_button,
                    music_on: self.music_on,
                    jump_menu_open: self.jump_menu_open,
                    signature: &self.signature,
                    now,
                    t,
                };
                actions.extend(render::letters::render(ui, &view, &self.theme, rect, scale));
                render::decor::draw_trail(ui.painter(), &self.scene.trail, now, &self.theme);
            }
            Screen::Final => {
                render::decor::draw_particles(
                    ui.painter(),
                    &self.scene.particles,
                    rect,
                    t,
                    &self.theme,
                );
                let popped_for = match self.page.final_state() {
                    FinalState::Balloon => None,
                    FinalState::Popped { at } => {
                        Some(now.saturating_duration_since(at).as_secs_f32())
                    }
                };
                let view = FinalView {
                    recipient: &self.recipient,
                    music_on: self.music_on,
                    popped_for,
                    confetti: &self.scene.confetti,
                    shown_for: self
                        .final_at
                        .map_or(0.0, |at| now.saturating_duration_since(at).as_secs_f32()),
                    t,
                };
                actions.extend(render::final_screen::render(ui, &view, &self.theme, rect, scale));
            }
        }

        if let Some(p) = self.page.fade().eased(now) {
            ui.painter()
                .rect_filled(rect, 0.0, Theme::with_opacity(self.theme.background, 1.0 - p));
        }

        if let Some(ref toast) = self.toast {
            draw_toast(ui, toast, &self.theme, rect, scale);
        }

        actions
    }
}

impl eframe::App for CardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        let screen = self.page.screen();
        let count = self.deck.count();

        // Viewport commands are sent after the input closure to avoid
        // holding the input lock.
        let mut viewport_cmds: Vec<egui::ViewportCommand> = Vec::new();
        let mut actions: Vec<Action> = Vec::new();

        ctx.input(|i| {
            if i.key_pressed(egui::Key::Q) {
                viewport_cmds.push(egui::ViewportCommand::Close);
                return;
            }

            if i.key_pressed(egui::Key::Escape) {
                if let Some(last) = self.last_esc {
                    if last.elapsed().as_secs_f32() < 1.0 {
                        viewport_cmds.push(egui::ViewportCommand::Close);
                        return;
                    }
                }
                self.last_esc = Some(Instant::now());
                self.toast = Some(Toast::new("Press Esc again to exit".to_string()));
                return;
            }

            if i.key_pressed(egui::Key::F) {
                viewport_cmds.push(egui::ViewportCommand::Fullscreen(
                    !i.viewport().fullscreen.unwrap_or(false),
                ));
                return;
            }

            match screen {
                Screen::Landing => {
                    if i.key_pressed(egui::Key::B) {
                        actions.push(Action::ManualBlow);
                    }
                    if i.key_pressed(egui::Key::Enter) {
                        actions.push(Action::EnterLetters);
                    }
                }
                Screen::Letters => {
                    if i.key_pressed(egui::Key::ArrowRight)
                        || i.key_pressed(egui::Key::N)
                        || i.key_pressed(egui::Key::Space)
                    {
                        actions.push(Action::Next);
                    }
                    if i.key_pressed(egui::Key::ArrowLeft) || i.key_pressed(egui::Key::P) {
                        actions.push(Action::Prev);
                    }
                    if i.key_pressed(egui::Key::Home) {
                        actions.push(Action::JumpTo(0));
                    }
                    if i.key_pressed(egui::Key::End) {
                        actions.push(Action::JumpTo(count.saturating_sub(1)));
                    }
                    for (n, key) in DIGIT_KEYS.iter().enumerate() {
                        if n < count && i.key_pressed(*key) {
                            actions.push(Action::JumpTo(n));
                        }
                    }
                }
                Screen::Final => {
                    if i.key_pressed(egui::Key::Enter) || i.key_pressed(egui::Key::Space) {
                        actions.push(Action::PopBalloon);
                    }
                }
            }
            if screen != Screen::Landing && i.key_pressed(egui::Key::M) {
                actions.push(Action::ToggleMusic);
                let label = if self.music_on { "Music off" } else { "Music on" };
                self.toast = Some(Toast::new(label.to_string()));
            }
        });

        for cmd in viewport_cmds {
            ctx.send_viewport_cmd(cmd);
        }

        if screen == Screen::Letters {
            if let Some(pos) = ctx.input(|i| i.pointer.hover_pos()) {
                self.scene.track_pointer(pos, now);
            }
        }

        for action in actions {
            self.apply(action, now);
        }
        self.advance(now);

        if self.toast.as_ref().is_some_and(|t| t.is_expired()) {
            self.toast = None;
        }

        let bg = self.theme.background;
        let mut clicked = Vec::new();
        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(bg).inner_margin(0.0))
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                ui.painter().rect_filled(rect, 0.0, bg);
                clicked = self.draw(ui, rect, now);
            });

        for action in clicked {
            self.apply(action, now);
        }

        // Flames, cats and particles never stop moving; in the background
        // only pending timers need a frame.
        let focused = ctx.input(|i| i.viewport().focused.unwrap_or(true));
        if focused || self.page.is_listening() {
            ctx.request_repaint();
        } else if let Some(deadline) = self.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(now));
        }
    }
}

impl Drop for CardApp {
    fn drop(&mut self) {
        self.page.teardown();
        self.prev_button.cancel();
        self.next_button.cancel();
        self.card_slide.cancel();
    }
}

const DIGIT_KEYS: [egui::Key; 9] = [
    egui::Key::Num1,
    egui::Key::Num2,
    egui::Key::Num3,
    egui::Key::Num4,
    egui::Key::Num5,
    egui::Key::Num6,
    egui::Key::Num7,
    egui::Key::Num8,
    egui::Key::Num9,
];

fn draw_toast(ui: &egui::Ui, toast: &Toast, theme: &Theme, rect: egui::Rect, scale: f32) {
    let opacity = toast.opacity();
    if opacity <= 0.0 {
        return;
    }
    let toast_color = Theme::with_opacity(theme.foreground, opacity * 0.9);
    let toast_bg = Theme::with_opacity(theme.card_background, opacity * 0.9);
    let galley = ui.painter().layout_no_wrap(
        toast.message.clone(),
        egui::FontId::proportional(20.0 * scale),
        toast_color,
    );
    let padding = 16.0 * scale;
    let toast_rect = egui::Rect::from_min_size(
        egui::pos2(
            rect.center().x - galley.rect.width() / 2.0 - padding,
            rect.bottom() - 80.0 * scale,
        ),
        egui::vec2(
            galley.rect.width() + padding * 2.0,
            galley.rect.height() + padding * 2.0,
        ),
    );
    ui.painter().rect_filled(toast_rect, 8.0 * scale, toast_bg);
    let text_pos = egui::pos2(toast_rect.left() + padding, toast_rect.top() + padding);
    ui.painter().galley(text_pos, galley, toast_color);
}

/// A pink balloon on a transparent square.
fn app_icon() -> egui::IconData {
    const SIZE: u32 = 64;
    let image = image::RgbaImage::from_fn(SIZE, SIZE, |x, y| {
        let dx = (x as f32 - 32.0) / 24.0;
        let dy = (y as f32 - 28.0) / 26.0;
        if dx * dx + dy * dy <= 1.0 {
            image::Rgba([0xFF, 0x6B, 0x6B, 0xFF])
        } else if (x as i32 - 32).abs() <= 1 && y > 54 {
            image::Rgba([0x55, 0x55, 0x55, 0xFF])
        } else {
            image::Rgba([0, 0, 0, 0])
        }
    });
    egui::IconData {
        rgba: image.into_raw(),
        width: SIZE,
        height: SIZE,
    }
}

pub fn run(options: LaunchOptions) -> anyhow::Result<()> {
    let config = Config::load_or_default()?;
    let letters_dir = options
        .letters_dir
        .clone()
        .or_else(|| config.defaults.as_ref().and_then(|d| d.letters_dir.clone()));
    let deck = LetterDeck::load(letters_dir.as_deref())?;

    let started = Instant::now();
    let decoded = image_cache::decode_all(&deck);
    log::info!(
        "{} letters ready ({} scans decoded in {:.0?})",
        deck.count(),
        decoded.iter().filter(|d| d.is_some()).count(),
        started.elapsed()
    );

    let windowed = options.windowed
        || config
            .defaults
            .as_ref()
            .and_then(|d| d.windowed)
            .unwrap_or(false);
    let title = format!("Happy Birthday, {}", config.recipient());

    let viewport = if windowed {
        egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title(&title)
    } else {
        egui::ViewportBuilder::default()
            .with_fullscreen(true)
            .with_title(&title)
    };
    let viewport = viewport.with_icon(std::sync::Arc::new(app_icon()));

    let native_options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        &title,
        native_options,
        Box::new(move |_cc| {
            let app = CardApp::new(deck, ImageCache::new(decoded), &config, &options);
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
