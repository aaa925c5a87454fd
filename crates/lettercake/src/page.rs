use std::time::Instant;

use crate::audio::detector::{BlowDetector, DEFAULT_BLOW_THRESHOLD, FrameSource, Poll};
use crate::audio::mic::MicError;
use crate::navigation::{NavEvent, NavigationController};
use crate::transition::{Transition, TransitionKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Landing,
    Letters,
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Microphone not requested yet.
    Prompt,
    Granted,
    /// Refused or unavailable; the manual fallback is offered instead.
    Denied,
}

/// Candle blowing state on the landing screen. `is_blown` only ever goes
/// from false to true.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlowGesture {
    permission: Permission,
    amplitude: f32,
    is_blown: bool,
}

impl Default for BlowGesture {
    fn default() -> Self {
        Self {
            permission: Permission::Prompt,
            amplitude: 0.0,
            is_blown: false,
        }
    }
}

impl BlowGesture {
    pub fn permission(&self) -> Permission {
        self.permission
    }

    #[cfg(test)]
    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub fn is_blown(&self) -> bool {
        self.is_blown
    }

    /// Width of the live level bar, in percent.
    pub fn level_percent(&self) -> f32 {
        (self.amplitude * 2.0).min(100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalState {
    Balloon,
    Popped { at: Instant },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    /// The candles went out.
    Blown,
    ScreenChanged(Screen),
    Nav(NavEvent),
    BalloonPopped,
}

/// Top-level card flow: `Landing -> Letters -> Final`, never backwards.
pub struct PageController {
    screen: Screen,
    blow: BlowGesture,
    detector: Option<BlowDetector<Box<dyn FrameSource>>>,
    threshold: f32,
    nav: NavigationController,
    fade: Transition,
    final_state: FinalState,
    confetti: Transition,
    outbox: Vec<PageEvent>,
}

impl PageController {
    #[cfg(test)]
    pub fn new(letter_count: usize) -> Self {
        Self::with_start_letter(letter_count, 0)
    }

    /// Open the carousel on `start` (clamped) once the letters are entered.
    pub fn with_start_letter(letter_count: usize, start: usize) -> Self {
        Self {
            screen: Screen::Landing,
            blow: BlowGesture::default(),
            detector: None,
            threshold: DEFAULT_BLOW_THRESHOLD,
            nav: NavigationController::with_start(letter_count, start),
            fade: Transition::new(TransitionKind::Fade),
            final_state: FinalState::Balloon,
            confetti: Transition::new(TransitionKind::Confetti),
            outbox: Vec::new(),
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn blow(&self) -> &BlowGesture {
        &self.blow
    }

    pub fn navigation(&self) -> &NavigationController {
        &self.nav
    }

    pub fn final_state(&self) -> FinalState {
        self.final_state
    }

    /// Screen cross-fade.
    pub fn fade(&self) -> &Transition {
        &self.fade
    }

    #[cfg(test)]
    pub fn confetti(&self) -> &Transition {
        &self.confetti
    }

    /// True while a microphone is held open for blow detection.
    pub fn is_listening(&self) -> bool {
        self.detector.as_ref().is_some_and(|d| d.is_listening())
    }

    /// Hand over the result of opening the microphone. A working source
    /// starts blow detection; any error means `Denied`.
    pub fn attach_microphone(&mut self, source: Result<Box<dyn FrameSource>, MicError>) {
        if self.screen != Screen::Landing || self.blow.is_blown {
            return;
        }
        match source {
            Ok(source) => {
                self.detector = Some(BlowDetector::with_threshold(source, self.threshold));
                self.set_permission(Permission::Granted);
            }
            Err(e) => {
                log::warn!("microphone unavailable: {e}");
                self.set_permission(Permission::Denied);
            }
        }
    }

    pub fn set_permission(&mut self, permission: Permission) {
        if self.blow.permission != permission {
            log::debug!("microphone permission {:?}", permission);
            self.blow.permission = permission;
        }
    }

    pub fn record_sample(&mut self, amplitude: f32) {
        self.blow.amplitude = amplitude.max(0.0);
    }

    /// Latch the blown state. Returns true only the first time.
    pub fn mark_blown(&mut self) -> bool {
        if self.blow.is_blown {
            return false;
        }
        self.blow.is_blown = true;
        if let Some(mut detector) = self.detector.take() {
            detector.cancel();
        }
        log::debug!("candles blown out");
        self.outbox.push(PageEvent::Blown);
        true
    }

    /// Fallback for a missing or refused microphone.
    pub fn manual_blow(&mut self) -> bool {
        if self.screen != Screen::Landing {
            return false;
        }
        log::debug!("manual blow");
        self.mark_blown()
    }

    pub fn enter_letters(&mut self, now: Instant) -> bool {
        if self.screen != Screen::Landing || !self.blow.is_blown {
            return false;
        }
        self.switch_to(Screen::Letters, now);
        true
    }

    pub fn next(&mut self, now: Instant) -> bool {
        self.screen == Screen::Letters && self.nav.next(now)
    }

    pub fn prev(&mut self, now: Instant) -> bool {
        self.screen == Screen::Letters && self.nav.prev(now)
    }

    pub fn jump_to(&mut self, index: usize, now: Instant) -> bool {
        self.screen == Screen::Letters && self.nav.jump_to(index, now)
    }

    /// Pop the giant balloon on the final screen. Happens once.
    pub fn pop_balloon(&mut self, now: Instant) -> bool {
        if self.screen != Screen::Final || self.final_state != FinalState::Balloon {
            return false;
        }
        self.final_state = FinalState::Popped { at: now };
        self.confetti.trigger(now);
        log::debug!("final balloon popped");
        self.outbox.push(PageEvent::BalloonPopped);
        true
    }

    fn switch_to(&mut self, screen: Screen, now: Instant) {
        log::debug!("screen {:?} -> {:?}", self.screen, screen);
        self.screen = screen;
        self.fade.cancel();
        self.fade.trigger(now);
        self.outbox.push(PageEvent::ScreenChanged(screen));
    }

    /// Advance the detector, the carousel and the screen effects to `now`.
    pub fn update(&mut self, now: Instant) -> Vec<PageEvent> {
        if self.screen == Screen::Landing {
            let poll = self.detector.as_mut().map(|d| d.poll());
            match poll {
                Some(Poll::Sample(level)) => self.record_sample(level),
                Some(Poll::Blown(level)) => {
                    self.record_sample(level);
                    self.mark_blown();
                }
                Some(Poll::Idle) => self.detector = None,
                Some(Poll::Pending) | None => {}
            }
        }

        if self.screen == Screen::Letters {
            for event in self.nav.update(now) {
                self.outbox.push(PageEvent::Nav(event));
                if event == NavEvent::Finished {
                    self.switch_to(Screen::Final, now);
                }
            }
        }

        self.fade.poll(now);
        self.confetti.poll(now);
        std::mem::take(&mut self.outbox)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.nav.next_deadline(),
            self.fade.ends_at(),
            self.confetti.ends_at(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Release the microphone and drop every pending timer.
    pub fn teardown(&mut self) {
        if let Some(mut detector) = self.detector.take() {
            detector.cancel();
        }
        self.nav.cancel();
        self.fade.cancel();
        self.confetti.cancel();
        self.outbox.clear();
        log::debug!("page controller torn down on {:?}", self.screen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::FINISH_DELAY;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    const N: usize = 20;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Replays fixed levels and flags when it is dropped.
    struct Levels {
        levels: Vec<u8>,
        dropped: Rc<Cell<bool>>,
    }

    impl FrameSource for Levels {
        fn next_frame(&mut self) -> Option<Vec<u8>> {
            if self.levels.is_empty() {
                return Some(vec![0; 128]);
            }
            Some(vec![self.levels.remove(0); 128])
        }
    }

    impl Drop for Levels {
        fn drop(&mut self) {
            self.dropped.set(true);
        }
    }

    fn mic(levels: &[u8]) -> (Result<Box<dyn FrameSource>, MicError>, Rc<Cell<bool>>) {
        let dropped = Rc::new(Cell::new(false));
        let source = Levels {
            levels: levels.to_vec(),
            dropped: dropped.clone(),
        };
        (Ok(Box::new(source)), dropped)
    }

    fn on_letters(start: usize, t0: Instant) -> PageController {
        let mut page = PageController::with_start_letter(N, start);
        page.manual_blow();
        assert!(page.enter_letters(t0));
        page.update(t0);
        page
    }

    #[test]
    fn cannot_enter_letters_before_blowing() {
        let t0 = Instant::now();
        let mut page = PageController::new(N);
        assert!(!page.enter_letters(t0));
        assert_eq!(page.screen(), Screen::Landing);
    }

    #[test]
    fn denied_permission_then_manual_blow_allows_entering() {
        let t0 = Instant::now();
        let mut page = PageController::new(N);
        page.attach_microphone(Err(MicError::NoDevice));
        assert_eq!(page.blow().permission(), Permission::Denied);
        assert!(!page.is_listening());

        assert!(page.manual_blow());
        assert!(page.blow().is_blown());
        assert!(!page.manual_blow());
        assert!(page.enter_letters(t0));
        assert_eq!(page.screen(), Screen::Letters);
        assert!(page.fade().is_running());
        assert_eq!(
            page.update(t0),
            vec![PageEvent::Blown, PageEvent::ScreenChanged(Screen::Letters)]
        );
        assert!(!page.enter_letters(t0));
    }

    #[test]
    fn microphone_blow_latches_and_releases_device() {
        let t0 = Instant::now();
        let mut page = PageController::new(N);
        let (source, dropped) = mic(&[10, 20, 90, 5]);
        page.attach_microphone(source);
        assert_eq!(page.blow().permission(), Permission::Granted);
        assert!(page.is_listening());

        assert!(page.update(t0).is_empty());
        assert_eq!(page.blow().amplitude(), 10.0);
        assert_eq!(page.blow().level_percent(), 20.0);
        page.update(t0 + ms(16));
        assert!(!page.blow().is_blown());

        assert_eq!(page.update(t0 + ms(32)), vec![PageEvent::Blown]);
        assert!(page.blow().is_blown());
        assert_eq!(page.blow().amplitude(), 90.0);
        assert_eq!(page.blow().level_percent(), 100.0);
        assert!(dropped.get());
        assert!(!page.is_listening());

        // Nothing is sampled after the blow.
        assert!(page.update(t0 + ms(48)).is_empty());
        assert_eq!(page.blow().amplitude(), 90.0);
    }

    #[test]
    fn custom_threshold_is_applied_to_microphone() {
        let t0 = Instant::now();
        let mut page = PageController::new(N).with_threshold(95.0);
        let (source, _) = mic(&[90, 96]);
        page.attach_microphone(source);
        page.update(t0);
        assert!(!page.blow().is_blown());
        page.update(t0 + ms(16));
        assert!(page.blow().is_blown());
    }

    #[test]
    fn manual_blow_while_listening_releases_microphone() {
        let mut page = PageController::new(N);
        let (source, dropped) = mic(&[]);
        page.attach_microphone(source);
        assert!(page.manual_blow());
        assert!(dropped.get());
        assert!(!page.is_listening());
    }

    #[test]
    fn microphone_after_blow_is_ignored() {
        let mut page = PageController::new(N);
        page.manual_blow();
        let (source, dropped) = mic(&[]);
        page.attach_microphone(source);
        assert!(dropped.get());
        assert_eq!(page.blow().permission(), Permission::Prompt);
    }

    #[test]
    fn navigation_is_inert_outside_letters() {
        let t0 = Instant::now();
        let mut page = PageController::new(N);
        assert!(!page.next(t0));
        assert!(!page.jump_to(3, t0));
        assert_eq!(page.navigation().current_index(), 0);
        assert!(!page.pop_balloon(t0));
    }

    #[test]
    fn five_nexts_reach_letter_six() {
        let mut t = Instant::now();
        let mut page = on_letters(0, t);
        for _ in 0..5 {
            assert!(page.next(t));
            t += ms(1600);
            page.update(t);
        }
        assert_eq!(page.navigation().current_index(), 5);
        assert_eq!(page.screen(), Screen::Letters);
    }

    #[test]
    fn next_on_last_letter_reaches_final_after_delay() {
        let t0 = Instant::now();
        let mut page = on_letters(N - 1, t0);
        assert!(page.next(t0));
        page.update(t0 + ms(799));
        assert_eq!(page.screen(), Screen::Letters);

        let events = page.update(t0 + FINISH_DELAY);
        assert_eq!(
            events,
            vec![
                PageEvent::Nav(NavEvent::Finished),
                PageEvent::ScreenChanged(Screen::Final),
            ]
        );
        assert_eq!(page.screen(), Screen::Final);
        assert!(!page.navigation().is_transitioning());
        assert!(!page.next(t0 + ms(900)));
    }

    #[test]
    fn balloon_pops_once() {
        let t0 = Instant::now();
        let mut page = on_letters(N - 1, t0);
        page.next(t0);
        page.update(t0 + FINISH_DELAY);

        let at = t0 + ms(2000);
        assert!(page.pop_balloon(at));
        assert_eq!(page.final_state(), FinalState::Popped { at });
        assert!(page.confetti().is_running());
        assert!(!page.pop_balloon(at + ms(10)));
        assert_eq!(page.update(at + ms(10)), vec![PageEvent::BalloonPopped]);
        page.update(at + ms(800));
        assert!(!page.confetti().is_running());
    }

    #[test]
    fn next_deadline_covers_pending_work() {
        let t0 = Instant::now();
        let mut page = on_letters(0, t0);
        page.update(t0 + ms(800));
        assert_eq!(page.next_deadline(), None);
        page.next(t0 + ms(1000));
        assert_eq!(page.next_deadline(), Some(t0 + ms(1100)));
    }

    #[test]
    fn teardown_releases_everything() {
        let t0 = Instant::now();
        let mut page = PageController::new(N);
        let (source, dropped) = mic(&[]);
        page.attach_microphone(source);
        page.teardown();
        assert!(dropped.get());
        assert_eq!(page.next_deadline(), None);

        let mut page = on_letters(3, t0);
        page.next(t0);
        page.teardown();
        assert_eq!(page.navigation().pending_timers(), 0);
        assert!(page.update(t0 + ms(5000)).is_empty());
        assert_eq!(page.navigation().current_index(), 3);
    }
}
