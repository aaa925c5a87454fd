//! Cosmetic scenery: floating particles, roaming cats, the mouse trail and
//! the confetti burst. Positions are fractions of the screen, times are
//! seconds on the scene clock. Everything random comes from one seedable
//! generator so a fixed `--seed` replays the same card.

use std::collections::VecDeque;
use std::f32::consts::PI;
use std::time::{Duration, Instant};

use eframe::egui::Pos2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::transition::{ease_in, ease_in_out, ease_out};

pub const PARTICLE_COUNT: usize = 20;
pub const CONFETTI_COUNT: usize = 50;
/// Visual lifetime of the confetti burst.
pub const CONFETTI_SECS: f32 = 2.5;
/// Trail points kept besides the newest one.
pub const TRAIL_LEN: usize = 20;
pub const TRAIL_LIFETIME: Duration = Duration::from_secs(1);

const CAT_FLEE_SECS: f32 = 0.8;

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    /// Diameter in points.
    pub size: f32,
    pub color: usize,
    /// Seconds per bob cycle.
    pub period: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticlePose {
    /// Vertical offset in points (negative is up).
    pub dy: f32,
    pub opacity: f32,
    pub scale: f32,
}

impl Particle {
    /// Bob up and back, brightening and swelling at the top.
    pub fn pose(&self, t: f32) -> ParticlePose {
        let phase = (t / self.period).fract();
        let wave = ease_in_out(if phase < 0.5 { phase * 2.0 } else { 2.0 - phase * 2.0 });
        ParticlePose {
            dy: -100.0 * wave,
            opacity: 0.3 + 0.4 * wave,
            scale: 1.0 + 0.2 * wave,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
    Right,
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CatState {
    Roaming { since: f32 },
    Fleeing { at: f32, from_x: f32, rest: f32 },
}

/// A cat that strolls across the screen on a loop and bolts when clicked.
#[derive(Debug, Clone, PartialEq)]
pub struct Cat {
    pub y: f32,
    pub heading: Heading,
    pub color: usize,
    delay: f32,
    duration: f32,
    state: CatState,
}

impl Cat {
    pub fn new(y: f32, delay: f32, duration: f32, heading: Heading, color: usize) -> Self {
        Self {
            y,
            heading,
            color,
            delay,
            duration,
            state: CatState::Roaming { since: 0.0 },
        }
    }

    fn edges(&self) -> (f32, f32) {
        match self.heading {
            Heading::Right => (-0.2, 1.2),
            Heading::Left => (1.2, -0.2),
        }
    }

    fn roam_x(&self, since: f32, t: f32) -> f32 {
        let (from, to) = self.edges();
        let elapsed = t - since - self.delay;
        if elapsed <= 0.0 {
            return from;
        }
        let p = (elapsed / self.duration).fract();
        from + (to - from) * p
    }

    /// Horizontal position as a fraction of the screen width.
    pub fn x(&self, t: f32) -> f32 {
        match self.state {
            CatState::Roaming { since } => self.roam_x(since, t),
            CatState::Fleeing { at, from_x, .. } => {
                let target = match self.heading {
                    Heading::Right => 1.5,
                    Heading::Left => -0.5,
                };
                let p = ease_in(((t - at) / CAT_FLEE_SECS).clamp(0.0, 1.0));
                from_x + (target - from_x) * p
            }
        }
    }

    pub fn is_scared(&self) -> bool {
        matches!(self.state, CatState::Fleeing { .. })
    }

    /// Horizontal stretch while running off.
    pub fn stretch(&self, t: f32) -> f32 {
        match self.state {
            CatState::Fleeing { at, .. } if t - at < CAT_FLEE_SECS => 1.2,
            _ => 1.0,
        }
    }

    /// Startle the cat. Ignored while it is already running or hiding.
    pub fn scare(&mut self, t: f32, rng: &mut impl Rng) -> bool {
        if self.is_scared() {
            return false;
        }
        self.state = CatState::Fleeing {
            at: t,
            from_x: self.x(t),
            rest: rng.gen_range(2.0..5.0),
        };
        true
    }

    /// Bring a hiding cat back once its rest is over.
    pub fn update(&mut self, t: f32) {
        if let CatState::Fleeing { at, rest, .. } = self.state {
            if t >= at + CAT_FLEE_SECS + rest {
                self.state = CatState::Roaming { since: t };
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    pub pos: Pos2,
    pub at: Instant,
    pub color: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MouseTrail {
    points: VecDeque<TrailPoint>,
}

impl MouseTrail {
    pub fn push(&mut self, pos: Pos2, at: Instant, color: usize) {
        if self.points.back().is_some_and(|p| p.pos == pos) {
            return;
        }
        if self.points.len() > TRAIL_LEN {
            self.points.pop_front();
        }
        self.points.push_back(TrailPoint { pos, at, color });
    }

    /// Forget points older than the trail lifetime.
    pub fn prune(&mut self, now: Instant) {
        self.points
            .retain(|p| now.saturating_duration_since(p.at) < TRAIL_LIFETIME);
    }

    pub fn points(&self) -> impl Iterator<Item = &TrailPoint> {
        self.points.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfettiPiece {
    /// Final offset from the burst centre, in points.
    pub dx: f32,
    pub dy: f32,
    /// Total spin in degrees.
    pub spin: f32,
    pub color: usize,
}

impl ConfettiPiece {
    /// Offset, scale and rotation (radians) `t` seconds into the burst.
    pub fn pose(&self, t: f32) -> (f32, f32, f32, f32) {
        let p = (t / CONFETTI_SECS).clamp(0.0, 1.0);
        let travel = ease_out(p);
        let scale = (p * PI).sin();
        (
            self.dx * travel,
            self.dy * travel,
            scale,
            self.spin.to_radians() * travel,
        )
    }
}

/// All decoration state plus the generator that seeds it.
pub struct Scene {
    rng: StdRng,
    pub particles: Vec<Particle>,
    pub cats: Vec<Cat>,
    pub trail: MouseTrail,
    pub confetti: Vec<ConfettiPiece>,
}

impl Scene {
    pub fn new(seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let particles = (0..PARTICLE_COUNT)
            .map(|_| Particle {
                x: rng.gen_range(0.0..1.0),
                y: rng.gen_range(0.0..1.0),
                size: rng.gen_range(10.0..35.0),
                color: rng.gen_range(0..5),
                period: rng.gen_range(5.0..10.0),
            })
            .collect();
        let cats = vec![
            Cat::new(0.85, 0.0, 15.0, Heading::Right, rng.gen_range(0..6)),
            Cat::new(0.15, 7.0, 20.0, Heading::Left, rng.gen_range(0..6)),
            Cat::new(0.45, 2.0, 25.0, Heading::Right, rng.gen_range(0..6)),
        ];
        Self {
            rng,
            particles,
            cats,
            trail: MouseTrail::default(),
            confetti: Vec::new(),
        }
    }

    pub fn scare_cat(&mut self, index: usize, t: f32) -> bool {
        match self.cats.get_mut(index) {
            Some(cat) => cat.scare(t, &mut self.rng),
            None => false,
        }
    }

    pub fn track_pointer(&mut self, pos: Pos2, now: Instant) {
        let color = self.rng.gen_range(0..6);
        self.trail.push(pos, now, color);
    }

    /// Scatter a fresh set of confetti pieces.
    pub fn burst(&mut self) {
        let rng = &mut self.rng;
        self.confetti = (0..CONFETTI_COUNT)
            .map(|_| ConfettiPiece {
                dx: rng.gen_range(-400.0..400.0),
                dy: rng.gen_range(-400.0..400.0),
                spin: rng.gen_range(0.0..720.0),
                color: rng.gen_range(0..6),
            })
            .collect();
    }

    pub fn update(&mut self, t: f32, now: Instant) {
        for cat in &mut self.cats {
            cat.update(t);
        }
        self.trail.prune(now);
    }
}
