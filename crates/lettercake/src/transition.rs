use std::time::{Duration, Instant};

use crate::schedule::Scheduler;

/// Delay between popping a balloon button and running its action.
pub const POP_FIRE_DELAY: Duration = Duration::from_millis(400);
/// Delay between popping a balloon button and it floating back in.
pub const POP_REAPPEAR_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// Balloon bursting outwards.
    Pop,
    /// Paper plane crossing the screen from bottom-left to top-right.
    FlyAcross,
    /// Letter card sliding in from the direction of travel.
    CardSlide,
    /// Cross-fade between screens.
    Fade,
    /// Confetti burst after the final balloon pops.
    Confetti,
}

impl TransitionKind {
    pub fn duration(self) -> Duration {
        match self {
            Self::Pop => Duration::from_millis(150),
            Self::FlyAcross => Duration::from_millis(1500),
            Self::CardSlide => Duration::from_millis(700),
            Self::Fade => Duration::from_millis(800),
            Self::Confetti => Duration::from_millis(800),
        }
    }
}

/// A fixed-duration visual effect.
///
/// `trigger` is the rising edge that starts it; triggering again while it is
/// running is ignored. `poll` reports completion exactly once, after which the
/// transition is idle and can be triggered again.
#[derive(Debug, Clone)]
pub struct Transition {
    kind: TransitionKind,
    duration: Duration,
    started: Option<Instant>,
}

impl Transition {
    pub fn new(kind: TransitionKind) -> Self {
        Self {
            kind,
            duration: kind.duration(),
            started: None,
        }
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    /// Start the effect. Returns false if it is already in flight.
    pub fn trigger(&mut self, now: Instant) -> bool {
        if self.started.is_some() {
            return false;
        }
        self.started = Some(now);
        log::trace!("{:?} started ({:?})", self.kind, self.duration);
        true
    }

    /// Returns true once, on the first poll at or after the end of the effect.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.started {
            Some(start) if now.saturating_duration_since(start) >= self.duration => {
                self.started = None;
                true
            }
            _ => false,
        }
    }

    pub fn ends_at(&self) -> Option<Instant> {
        self.started.map(|start| start + self.duration)
    }

    /// Stop without reporting completion.
    pub fn cancel(&mut self) -> bool {
        self.started.take().is_some()
    }

    /// Linear progress in `[0, 1]`, or `None` while idle.
    pub fn progress(&self, now: Instant) -> Option<f32> {
        let start = self.started?;
        if self.duration.is_zero() {
            return Some(1.0);
        }
        let elapsed = now.saturating_duration_since(start).as_secs_f32();
        Some((elapsed / self.duration.as_secs_f32()).clamp(0.0, 1.0))
    }

    pub fn eased(&self, now: Instant) -> Option<f32> {
        self.progress(now).map(ease_in_out)
    }
}

pub fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

pub fn ease_out(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

pub fn ease_in(t: f32) -> f32 {
    t * t * t
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PopTimer {
    Fire,
    Reappear,
}

/// Balloon-shaped button: pressing pops it, the action runs once the pop
/// animation is mostly over, and the balloon floats back a while later.
#[derive(Debug)]
pub struct PopButton {
    popped_at: Option<Instant>,
    /// The balloon itself swelling and vanishing.
    burst: Transition,
    timers: Scheduler<PopTimer>,
}

impl Default for PopButton {
    fn default() -> Self {
        Self::new()
    }
}

impl PopButton {
    pub fn new() -> Self {
        Self {
            popped_at: None,
            burst: Transition::new(TransitionKind::Pop),
            timers: Scheduler::new(),
        }
    }

    pub fn is_popped(&self) -> bool {
        self.popped_at.is_some()
    }

    /// True while a pressed action is still waiting to fire.
    pub fn is_armed(&self) -> bool {
        self.timers.contains(|t| *t == PopTimer::Fire)
    }

    /// How long ago the balloon popped, for the scattering dots.
    pub fn popped_for(&self, now: Instant) -> Option<Duration> {
        self.popped_at.map(|at| now.saturating_duration_since(at))
    }

    /// Progress of the balloon's own pop, while it is still visible.
    pub fn burst(&self, now: Instant) -> Option<f32> {
        self.burst.progress(now)
    }

    /// Press the balloon. Ignored while disabled, popped, or armed.
    pub fn press(&mut self, now: Instant, enabled: bool) -> bool {
        if !enabled || self.is_popped() || self.is_armed() {
            return false;
        }
        self.popped_at = Some(now);
        self.burst.trigger(now);
        self.timers.schedule(now, POP_FIRE_DELAY, PopTimer::Fire);
        self.timers.schedule(now, POP_REAPPEAR_DELAY, PopTimer::Reappear);
        true
    }

    /// Advance timers. Returns true exactly once per press, when the action
    /// should run.
    pub fn poll(&mut self, now: Instant) -> bool {
        self.burst.poll(now);
        let mut fire = false;
        for (_, timer) in self.timers.drain_due(now) {
            match timer {
                PopTimer::Fire => fire = true,
                PopTimer::Reappear => self.popped_at = None,
            }
        }
        fire
    }

    /// Bring the balloon back immediately (its label changed). A pending
    /// action still fires.
    pub fn reset(&mut self) {
        self.timers.cancel_where(|t| *t == PopTimer::Reappear);
        self.burst.cancel();
        self.popped_at = None;
    }

    /// Forget everything, including a pending action.
    pub fn cancel(&mut self) {
        self.timers.cancel_all();
        self.burst.cancel();
        self.popped_at = None;
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.timers.next_deadline(), self.burst.ends_at()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn completes_exactly_once() {
        let t0 = Instant::now();
        let mut plane = Transition::new(TransitionKind::FlyAcross);
        assert!(plane.trigger(t0));
        assert!(!plane.poll(t0 + ms(1499)));
        assert!(plane.poll(t0 + ms(1500)));
        assert!(!plane.poll(t0 + ms(1600)));
        assert!(!plane.is_running());
    }

    #[test]
    fn retrigger_in_flight_is_ignored() {
        let t0 = Instant::now();
        let mut plane = Transition::new(TransitionKind::FlyAcross);
        assert!(plane.trigger(t0));
        assert!(!plane.trigger(t0 + ms(700)));
        // Completion is still measured from the first trigger.
        assert!(plane.poll(t0 + ms(1500)));
    }

    #[test]
    fn can_be_rearmed_after_completion() {
        let t0 = Instant::now();
        let mut pop = Transition::new(TransitionKind::Pop);
        assert!(pop.trigger(t0));
        assert!(pop.poll(t0 + ms(150)));
        assert!(pop.trigger(t0 + ms(200)));
        assert!(!pop.poll(t0 + ms(300)));
        assert!(pop.poll(t0 + ms(350)));
    }

    #[test]
    fn progress_is_clamped_and_idle_is_none() {
        let t0 = Instant::now();
        let mut fade = Transition::new(TransitionKind::Fade);
        assert_eq!(fade.progress(t0), None);
        fade.trigger(t0);
        assert_eq!(fade.progress(t0), Some(0.0));
        assert_eq!(fade.progress(t0 + ms(400)), Some(0.5));
        assert_eq!(fade.progress(t0 + ms(5000)), Some(1.0));
        assert_eq!(fade.eased(t0 + ms(800)), Some(1.0));
    }

    #[test]
    fn cancel_does_not_report_completion() {
        let t0 = Instant::now();
        let mut slide = Transition::new(TransitionKind::CardSlide);
        slide.trigger(t0);
        assert!(slide.cancel());
        assert!(!slide.poll(t0 + ms(1000)));
    }

    #[test]
    fn easing_endpoints() {
        for f in [ease_in_out, ease_out, ease_in] {
            assert_eq!(f(0.0), 0.0);
            assert!((f(1.0) - 1.0).abs() < 1e-6);
        }
        assert!((ease_in_out(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn pop_button_fires_once_then_reappears() {
        let t0 = Instant::now();
        let mut button = PopButton::new();
        assert!(button.press(t0, true));
        assert!(button.is_popped());
        assert!(!button.poll(t0 + ms(399)));
        assert!(button.poll(t0 + ms(400)));
        assert!(!button.poll(t0 + ms(401)));
        assert!(button.is_popped());
        assert!(!button.poll(t0 + ms(1500)));
        assert!(!button.is_popped());
    }

    #[test]
    fn pop_button_balloon_vanishes_before_the_action() {
        let t0 = Instant::now();
        let mut button = PopButton::new();
        assert_eq!(button.burst(t0), None);
        button.press(t0, true);
        assert!(button.burst(t0 + ms(75)).is_some_and(|p| (p - 0.5).abs() < 1e-6));
        assert_eq!(button.next_deadline(), Some(t0 + ms(150)));

        assert!(!button.poll(t0 + ms(150)));
        assert_eq!(button.burst(t0 + ms(150)), None);
        assert!(button.popped_for(t0 + ms(150)).is_some());
        assert_eq!(button.next_deadline(), Some(t0 + ms(400)));
    }

    #[test]
    fn pop_button_ignores_presses_while_popped_or_disabled() {
        let t0 = Instant::now();
        let mut button = PopButton::new();
        assert!(!button.press(t0, false));
        assert!(button.press(t0, true));
        assert!(!button.press(t0 + ms(100), true));
        assert!(button.poll(t0 + ms(400)));
        assert!(!button.press(t0 + ms(1000), true));
        button.poll(t0 + ms(1500));
        assert!(button.press(t0 + ms(1600), true));
    }

    #[test]
    fn pop_button_reset_keeps_pending_action() {
        let t0 = Instant::now();
        let mut button = PopButton::new();
        button.press(t0, true);
        button.reset();
        assert!(!button.is_popped());
        assert!(button.is_armed());
        assert!(!button.press(t0 + ms(100), true));
        assert!(button.poll(t0 + ms(400)));
        assert!(!button.is_armed());
    }

    #[test]
    fn pop_button_cancel_drops_action() {
        let t0 = Instant::now();
        let mut button = PopButton::new();
        button.press(t0, true);
        button.cancel();
        assert!(!button.poll(t0 + ms(2000)));
        assert_eq!(button.next_deadline(), None);
    }
}
