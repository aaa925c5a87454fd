use std::time::{Duration, Instant};

use crate::schedule::Scheduler;
use crate::transition::{Transition, TransitionKind};

/// Delay between pressing next and the paper plane taking off.
pub const PLANE_LAUNCH_DELAY: Duration = Duration::from_millis(100);
/// Delay between pressing next and the letter swap, timed so the plane
/// covers the card when it changes.
pub const ADVANCE_DELAY: Duration = Duration::from_millis(600);
/// Delay between pressing next on the last letter and the final screen.
pub const FINISH_DELAY: Duration = Duration::from_millis(800);
/// How long prev holds the transition guard.
pub const PREV_COOLDOWN: Duration = Duration::from_millis(800);
/// Delay before a jump lands on its target.
pub const JUMP_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// +1 for forward, -1 for backward; used to mirror slide offsets.
    pub fn sign(self) -> f32 {
        match self {
            Self::Forward => 1.0,
            Self::Backward => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarouselState {
    pub current_index: usize,
    pub is_transitioning: bool,
    pub direction: Direction,
}

/// Where the carousel is within a navigation operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Operation accepted, index not changed yet.
    TransitionOut,
    /// Index changed, effect still playing.
    TransitionIn,
    /// Next was pressed on the last letter; waiting to leave the carousel.
    Finishing,
    /// The carousel has been left for the final screen.
    Settled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEvent {
    /// The paper plane took off.
    FlyStarted,
    IndexChanged {
        from: usize,
        to: usize,
        direction: Direction,
    },
    /// The transition guard was released.
    Settled,
    /// The last letter was passed; switch to the final screen.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    LaunchPlane,
    Advance,
    Finish,
    CooldownOver,
    Land(usize),
}

/// Owns the letter carousel position and the guard that keeps navigation
/// operations from overlapping.
///
/// Every operation is a no-op while `is_transitioning` is set. Delayed steps
/// go through a [`Scheduler`] and are applied by [`update`](Self::update) in
/// deadline order. Forward navigation past the last letter never wraps: it
/// finishes the carousel instead.
#[derive(Debug)]
pub struct NavigationController {
    count: usize,
    state: CarouselState,
    phase: Phase,
    timers: Scheduler<Timer>,
    plane: Transition,
    outbox: Vec<NavEvent>,
}

impl NavigationController {
    #[cfg(test)]
    pub fn new(count: usize) -> Self {
        Self::with_start(count, 0)
    }

    /// `count` must be at least one; `start` is clamped into range.
    pub fn with_start(count: usize, start: usize) -> Self {
        debug_assert!(count > 0, "a carousel needs at least one letter");
        let count = count.max(1);
        Self {
            count,
            state: CarouselState {
                current_index: start.min(count - 1),
                is_transitioning: false,
                direction: Direction::Forward,
            },
            phase: Phase::Idle,
            timers: Scheduler::new(),
            plane: Transition::new(TransitionKind::FlyAcross),
            outbox: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> CarouselState {
        self.state
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    pub fn is_transitioning(&self) -> bool {
        self.state.is_transitioning
    }

    pub fn direction(&self) -> Direction {
        self.state.direction
    }

    #[cfg(test)]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[cfg(test)]
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_last(&self) -> bool {
        self.state.current_index + 1 == self.count
    }

    /// The paper plane effect, for rendering.
    pub fn plane(&self) -> &Transition {
        &self.plane
    }

    #[cfg(test)]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Earliest moment something changes on its own: a timer or the plane
    /// landing.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.timers.next_deadline(), self.plane.ends_at()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn accepts_input(&self) -> bool {
        !self.state.is_transitioning && self.phase != Phase::Settled
    }

    pub fn next(&mut self, now: Instant) -> bool {
        if !self.accepts_input() {
            return false;
        }
        self.state.is_transitioning = true;
        self.state.direction = Direction::Forward;

        if self.is_last() {
            log::debug!("next on last letter, finishing");
            self.phase = Phase::Finishing;
            self.timers.schedule(now, FINISH_DELAY, Timer::Finish);
            return true;
        }

        log::debug!("next from letter {}", self.state.current_index + 1);
        self.phase = Phase::TransitionOut;
        self.timers.schedule(now, PLANE_LAUNCH_DELAY, Timer::LaunchPlane);
        self.timers.schedule(now, ADVANCE_DELAY, Timer::Advance);
        true
    }

    pub fn prev(&mut self, now: Instant) -> bool {
        if !self.accepts_input() || self.state.current_index == 0 {
            return false;
        }
        let from = self.state.current_index;
        self.state.direction = Direction::Backward;
        self.state.current_index -= 1;
        self.state.is_transitioning = true;
        self.phase = Phase::TransitionIn;
        self.timers.schedule(now, PREV_COOLDOWN, Timer::CooldownOver);
        log::debug!("prev to letter {}", self.state.current_index + 1);
        self.outbox.push(NavEvent::IndexChanged {
            from,
            to: self.state.current_index,
            direction: Direction::Backward,
        });
        true
    }

    pub fn jump_to(&mut self, index: usize, now: Instant) -> bool {
        if !self.accepts_input() || index == self.state.current_index || index >= self.count {
            return false;
        }
        self.state.is_transitioning = true;
        self.state.direction = if index > self.state.current_index {
            Direction::Forward
        } else {
            Direction::Backward
        };
        self.phase = Phase::TransitionOut;
        self.timers.schedule(now, JUMP_DELAY, Timer::Land(index));
        log::debug!("jump to letter {}", index + 1);
        true
    }

    /// Apply every timer due at `now` and poll the plane. Returns what
    /// happened since the last call, including immediate index changes.
    pub fn update(&mut self, now: Instant) -> Vec<NavEvent> {
        let mut events = std::mem::take(&mut self.outbox);

        for (at, timer) in self.timers.drain_due(now) {
            match timer {
                Timer::LaunchPlane => {
                    if self.plane.trigger(at) {
                        events.push(NavEvent::FlyStarted);
                    }
                }
                Timer::Advance => {
                    let from = self.state.current_index;
                    let to = (from + 1).min(self.count - 1);
                    self.state.current_index = to;
                    self.phase = Phase::TransitionIn;
                    events.push(NavEvent::IndexChanged {
                        from,
                        to,
                        direction: Direction::Forward,
                    });
                }
                Timer::Finish => {
                    self.state.is_transitioning = false;
                    self.phase = Phase::Settled;
                    events.push(NavEvent::Finished);
                }
                Timer::CooldownOver => {
                    self.settle(&mut events);
                }
                Timer::Land(index) => {
                    let from = self.state.current_index;
                    self.state.current_index = index;
                    events.push(NavEvent::IndexChanged {
                        from,
                        to: index,
                        direction: self.state.direction,
                    });
                    self.settle(&mut events);
                }
            }
        }

        // The plane's own completion releases the guard after a forward step.
        if self.plane.poll(now) && self.phase == Phase::TransitionIn {
            self.settle(&mut events);
        }

        events
    }

    fn settle(&mut self, events: &mut Vec<NavEvent>) {
        self.state.is_transitioning = false;
        self.phase = Phase::Idle;
        events.push(NavEvent::Settled);
    }

    /// Drop pending timers and the plane. Used on teardown; the carousel stays
    /// on whatever letter it currently shows.
    pub fn cancel(&mut self) {
        let dropped = self.timers.cancel_all();
        self.plane.cancel();
        self.outbox.clear();
        self.state.is_transitioning = false;
        if self.phase != Phase::Settled {
            self.phase = Phase::Idle;
        }
        if dropped > 0 {
            log::debug!("navigation cancelled with {dropped} pending timer(s)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const N: usize = 20;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Run a full forward step and return the time it settled.
    fn step_forward(nav: &mut NavigationController, at: Instant) -> Instant {
        assert!(nav.next(at));
        let done = at + ms(1600);
        nav.update(done);
        assert!(!nav.is_transitioning());
        done
    }

    #[test]
    fn next_sequences_plane_then_advance_then_settle() {
        let t0 = Instant::now();
        let mut nav = NavigationController::new(N);
        assert!(nav.next(t0));
        assert!(nav.is_transitioning());
        assert_eq!(nav.phase(), Phase::TransitionOut);

        assert!(nav.update(t0 + ms(99)).is_empty());
        assert_eq!(nav.update(t0 + ms(100)), vec![NavEvent::FlyStarted]);
        assert!(nav.plane().is_running());
        assert_eq!(nav.current_index(), 0);

        assert_eq!(
            nav.update(t0 + ms(600)),
            vec![NavEvent::IndexChanged {
                from: 0,
                to: 1,
                direction: Direction::Forward
            }]
        );
        assert_eq!(nav.current_index(), 1);
        // Index moved but the plane is still in the air.
        assert!(nav.is_transitioning());
        assert_eq!(nav.phase(), Phase::TransitionIn);

        assert!(nav.update(t0 + ms(1599)).is_empty());
        assert_eq!(nav.update(t0 + ms(1600)), vec![NavEvent::Settled]);
        assert!(!nav.is_transitioning());
        assert_eq!(nav.phase(), Phase::Idle);
    }

    #[test]
    fn late_update_applies_everything_in_order() {
        let t0 = Instant::now();
        let mut nav = NavigationController::new(N);
        nav.next(t0);
        let events = nav.update(t0 + ms(5000));
        assert_eq!(
            events,
            vec![
                NavEvent::FlyStarted,
                NavEvent::IndexChanged {
                    from: 0,
                    to: 1,
                    direction: Direction::Forward
                },
                NavEvent::Settled,
            ]
        );
    }

    #[test]
    fn five_sequential_nexts_reach_index_five() {
        let mut t = Instant::now();
        let mut nav = NavigationController::new(N);
        for _ in 0..5 {
            t = step_forward(&mut nav, t);
        }
        assert_eq!(nav.current_index(), 5);
        assert!(!nav.is_transitioning());
    }

    #[test]
    fn next_and_prev_are_noops_while_transitioning() {
        let t0 = Instant::now();
        let mut nav = NavigationController::with_start(N, 3);
        assert!(nav.next(t0));
        let before = nav.state();
        let timers = nav.pending_timers();

        assert!(!nav.next(t0 + ms(10)));
        assert!(!nav.prev(t0 + ms(10)));
        assert!(!nav.jump_to(7, t0 + ms(10)));
        assert_eq!(nav.state(), before);
        assert_eq!(nav.pending_timers(), timers);
    }

    #[test]
    fn prev_at_first_letter_is_noop() {
        let t0 = Instant::now();
        let mut nav = NavigationController::new(N);
        assert!(!nav.prev(t0));
        assert_eq!(nav.current_index(), 0);
        assert!(!nav.is_transitioning());
        assert_eq!(nav.pending_timers(), 0);
        assert!(nav.update(t0).is_empty());
    }

    #[test]
    fn prev_moves_immediately_then_cools_down() {
        let t0 = Instant::now();
        let mut nav = NavigationController::with_start(N, 4);
        assert!(nav.prev(t0));
        assert_eq!(nav.current_index(), 3);
        assert_eq!(nav.direction(), Direction::Backward);
        assert!(nav.is_transitioning());
        assert_eq!(
            nav.update(t0),
            vec![NavEvent::IndexChanged {
                from: 4,
                to: 3,
                direction: Direction::Backward
            }]
        );
        assert!(nav.update(t0 + ms(799)).is_empty());
        assert!(nav.is_transitioning());
        assert_eq!(nav.update(t0 + ms(800)), vec![NavEvent::Settled]);
        assert!(!nav.is_transitioning());
    }

    #[test]
    fn next_on_last_letter_finishes_without_incrementing() {
        let t0 = Instant::now();
        let mut nav = NavigationController::with_start(N, N - 1);
        assert!(nav.next(t0));
        assert_eq!(nav.phase(), Phase::Finishing);
        assert!(nav.update(t0 + ms(799)).is_empty());
        assert_eq!(nav.current_index(), N - 1);
        assert_eq!(nav.update(t0 + ms(800)), vec![NavEvent::Finished]);
        assert_eq!(nav.current_index(), N - 1);
        assert!(!nav.is_transitioning());
        assert_eq!(nav.phase(), Phase::Settled);
        assert!(!nav.plane().is_running());
    }

    #[test]
    fn settled_carousel_ignores_everything() {
        let t0 = Instant::now();
        let mut nav = NavigationController::with_start(N, N - 1);
        nav.next(t0);
        nav.update(t0 + ms(800));
        assert!(!nav.next(t0 + ms(900)));
        assert!(!nav.prev(t0 + ms(900)));
        assert!(!nav.jump_to(0, t0 + ms(900)));
    }

    #[test]
    fn jump_reaches_every_index() {
        for target in 0..N {
            let t0 = Instant::now();
            let mut nav = NavigationController::with_start(N, 7);
            let accepted = nav.jump_to(target, t0);
            assert_eq!(accepted, target != 7);
            nav.update(t0 + JUMP_DELAY);
            assert_eq!(nav.current_index(), target);
            assert!(!nav.is_transitioning());
        }
    }

    #[test]
    fn jump_waits_and_sets_direction() {
        let t0 = Instant::now();
        let mut nav = NavigationController::with_start(N, 10);
        assert!(nav.jump_to(2, t0));
        assert_eq!(nav.direction(), Direction::Backward);
        assert!(nav.update(t0 + ms(499)).is_empty());
        assert_eq!(nav.current_index(), 10);
        assert_eq!(
            nav.update(t0 + ms(500)),
            vec![
                NavEvent::IndexChanged {
                    from: 10,
                    to: 2,
                    direction: Direction::Backward
                },
                NavEvent::Settled,
            ]
        );

        assert!(nav.jump_to(15, t0 + ms(600)));
        assert_eq!(nav.direction(), Direction::Forward);
    }

    #[test]
    fn jump_to_current_or_out_of_range_is_noop() {
        let t0 = Instant::now();
        let mut nav = NavigationController::with_start(N, 5);
        assert!(!nav.jump_to(5, t0));
        assert!(!nav.jump_to(N, t0));
        assert!(!nav.jump_to(usize::MAX, t0));
        assert!(!nav.is_transitioning());
        assert_eq!(nav.pending_timers(), 0);
    }

    #[test]
    fn index_never_leaves_range() {
        let mut t = Instant::now();
        let mut nav = NavigationController::new(3);
        for _ in 0..10 {
            nav.next(t);
            t += ms(2000);
            nav.update(t);
            assert!(nav.current_index() < 3);
        }
        assert_eq!(nav.phase(), Phase::Settled);
        assert_eq!(nav.current_index(), 2);
    }

    #[test]
    fn single_letter_deck_finishes_immediately() {
        let t0 = Instant::now();
        let mut nav = NavigationController::new(1);
        assert!(nav.is_last());
        assert!(nav.next(t0));
        assert_eq!(nav.update(t0 + FINISH_DELAY), vec![NavEvent::Finished]);
    }

    #[test]
    fn cancel_releases_guard_and_timers() {
        let t0 = Instant::now();
        let mut nav = NavigationController::new(N);
        nav.next(t0);
        nav.update(t0 + ms(200));
        nav.cancel();
        assert_eq!(nav.pending_timers(), 0);
        assert!(!nav.plane().is_running());
        assert!(!nav.is_transitioning());
        assert!(nav.update(t0 + ms(5000)).is_empty());
        assert_eq!(nav.current_index(), 0);
    }

    #[test]
    fn start_index_is_clamped() {
        let nav = NavigationController::with_start(N, 99);
        assert_eq!(nav.current_index(), N - 1);
    }
}
