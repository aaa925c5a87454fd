/// Mean bin level (0-255 scale) above which a frame counts as a blow.
pub const DEFAULT_BLOW_THRESHOLD: f32 = 50.0;

/// Anything that yields byte frequency frames, one per animation frame.
pub trait FrameSource {
    /// The latest frame, or `None` if no new audio arrived since last call.
    fn next_frame(&mut self) -> Option<Vec<u8>>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Option<Vec<u8>> {
        (**self).next_frame()
    }
}

/// Mean magnitude across a frame's bins. An empty frame reads as silence.
pub fn mean_amplitude(frame: &[u8]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    frame.iter().map(|&b| b as f32).sum::<f32>() / frame.len() as f32
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Poll {
    /// Stopped: already blown or cancelled. The source is gone.
    Idle,
    /// Still listening, no fresh frame this time.
    Pending,
    /// A frame below the threshold.
    Sample(f32),
    /// The one and only blow. The source has just been released.
    Blown(f32),
}

/// One-shot blow detector over a frame source.
///
/// The detector owns its source, which typically holds the microphone. It
/// fires [`Poll::Blown`] for the first frame whose mean exceeds the threshold
/// and drops the source in the same call; every later poll is
/// [`Poll::Idle`]. It cannot be restarted.
pub struct BlowDetector<S> {
    source: Option<S>,
    threshold: f32,
    amplitude: f32,
    fired: bool,
}

impl<S: FrameSource> BlowDetector<S> {
    #[cfg(test)]
    pub fn new(source: S) -> Self {
        Self::with_threshold(source, DEFAULT_BLOW_THRESHOLD)
    }

    pub fn with_threshold(source: S, threshold: f32) -> Self {
        Self {
            source: Some(source),
            threshold,
            amplitude: 0.0,
            fired: false,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.source.is_some()
    }

    #[cfg(test)]
    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Last measured mean amplitude.
    #[cfg(test)]
    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    #[cfg(test)]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn poll(&mut self) -> Poll {
        let Some(source) = self.source.as_mut() else {
            return Poll::Idle;
        };
        let Some(frame) = source.next_frame() else {
            return Poll::Pending;
        };

        let level = mean_amplitude(&frame);
        self.amplitude = level;
        if level > self.threshold && !self.fired {
            self.fired = true;
            self.source = None;
            log::info!("blow detected at level {level:.1}, microphone released");
            return Poll::Blown(level);
        }
        Poll::Sample(level)
    }

    /// Stop listening without firing. Returns false if already stopped.
    pub fn cancel(&mut self) -> bool {
        let was_listening = self.source.take().is_some();
        if was_listening {
            log::info!("blow detection cancelled, microphone released");
        }
        was_listening
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// Scripted frames; records when it is dropped and how often it is read.
    struct Scripted {
        frames: VecDeque<Option<Vec<u8>>>,
        reads: Rc<Cell<usize>>,
        dropped: Rc<Cell<bool>>,
    }

    impl Scripted {
        fn new(levels: &[Option<u8>]) -> (Self, Rc<Cell<usize>>, Rc<Cell<bool>>) {
            let reads = Rc::new(Cell::new(0));
            let dropped = Rc::new(Cell::new(false));
            let frames = levels
                .iter()
                .map(|l| l.map(|v| vec![v; 128]))
                .collect();
            (
                Self {
                    frames,
                    reads: reads.clone(),
                    dropped: dropped.clone(),
                },
                reads,
                dropped,
            )
        }
    }

    impl FrameSource for Scripted {
        fn next_frame(&mut self) -> Option<Vec<u8>> {
            self.reads.set(self.reads.get() + 1);
            self.frames.pop_front().flatten()
        }
    }

    impl Drop for Scripted {
        fn drop(&mut self) {
            self.dropped.set(true);
        }
    }

    #[test]
    fn mean_of_frames() {
        assert_eq!(mean_amplitude(&[]), 0.0);
        assert_eq!(mean_amplitude(&[0, 100]), 50.0);
        assert_eq!(mean_amplitude(&[255; 128]), 255.0);
    }

    #[test]
    fn fires_once_above_threshold_and_releases_source() {
        let (source, reads, dropped) =
            Scripted::new(&[Some(10), Some(50), None, Some(51), Some(200)]);
        let mut detector = BlowDetector::new(source);

        assert_eq!(detector.poll(), Poll::Sample(10.0));
        // Exactly at the threshold is not a blow.
        assert_eq!(detector.poll(), Poll::Sample(50.0));
        assert_eq!(detector.poll(), Poll::Pending);
        assert!(!dropped.get());
        assert_eq!(detector.poll(), Poll::Blown(51.0));
        assert!(dropped.get());
        assert!(!detector.is_listening());
        assert!(detector.has_fired());

        // No further sampling once fired.
        let reads_after_blow = reads.get();
        assert_eq!(detector.poll(), Poll::Idle);
        assert_eq!(detector.poll(), Poll::Idle);
        assert_eq!(reads.get(), reads_after_blow);
        assert_eq!(detector.amplitude(), 51.0);
    }

    #[test]
    fn quiet_stream_never_fires() {
        let levels: Vec<Option<u8>> = (0..100).map(|i| Some((i % 50) as u8)).collect();
        let (source, _, dropped) = Scripted::new(&levels);
        let mut detector = BlowDetector::new(source);
        for _ in 0..100 {
            assert!(matches!(detector.poll(), Poll::Sample(_)));
        }
        assert!(!detector.has_fired());
        assert!(!dropped.get());
    }

    #[test]
    fn cancel_mid_sampling_releases_without_firing() {
        let (source, _, dropped) = Scripted::new(&[Some(10), Some(200)]);
        let mut detector = BlowDetector::new(source);
        assert_eq!(detector.poll(), Poll::Sample(10.0));
        assert!(detector.cancel());
        assert!(dropped.get());
        assert!(!detector.cancel());
        assert_eq!(detector.poll(), Poll::Idle);
        assert!(!detector.has_fired());
    }

    #[test]
    fn dropping_the_detector_releases_source() {
        let (source, _, dropped) = Scripted::new(&[Some(10)]);
        let detector = BlowDetector::new(source);
        drop(detector);
        assert!(dropped.get());
    }

    #[test]
    fn custom_threshold() {
        let (source, _, _) = Scripted::new(&[Some(30), Some(31)]);
        let mut detector = BlowDetector::with_threshold(source, 30.0);
        assert_eq!(detector.threshold(), 30.0);
        assert_eq!(detector.poll(), Poll::Sample(30.0));
        assert_eq!(detector.poll(), Poll::Blown(31.0));
    }

    #[test]
    fn boxed_sources_work() {
        let (source, _, _) = Scripted::new(&[Some(255)]);
        let boxed: Box<dyn FrameSource> = Box::new(source);
        let mut detector = BlowDetector::new(boxed);
        assert_eq!(detector.poll(), Poll::Blown(255.0));
    }
}
