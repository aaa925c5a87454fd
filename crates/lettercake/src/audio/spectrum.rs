use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Transform window, in samples.
pub const FFT_SIZE: usize = 256;
/// Number of frequency bins produced per frame.
pub const BIN_COUNT: usize = FFT_SIZE / 2;

const SMOOTHING: f32 = 0.8;
const MIN_DB: f32 = -100.0;
const MAX_DB: f32 = -30.0;

/// Byte-scaled magnitude spectrum of the most recent audio window.
///
/// Each frame is windowed (Blackman), transformed, normalised by the window
/// length, smoothed against the previous frame, converted to decibels and
/// mapped from `[MIN_DB, MAX_DB]` onto `0..=255`. Silence maps to zero, a
/// hard blow across the microphone saturates most bins.
pub struct ByteSpectrum {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl Default for ByteSpectrum {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteSpectrum {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);

        let n = FFT_SIZE as f32;
        let window = (0..FFT_SIZE)
            .map(|i| {
                let x = i as f32 / n;
                0.42 - 0.5 * (2.0 * std::f32::consts::PI * x).cos()
                    + 0.08 * (4.0 * std::f32::consts::PI * x).cos()
            })
            .collect();

        Self {
            fft,
            window,
            buffer: vec![Complex::new(0.0, 0.0); FFT_SIZE],
            smoothed: vec![0.0; BIN_COUNT],
        }
    }

    /// Analyse the last `FFT_SIZE` samples of `samples` (zero-padded at the
    /// front when shorter) and return `BIN_COUNT` bytes.
    pub fn analyze(&mut self, samples: &[f32]) -> Vec<u8> {
        let tail = &samples[samples.len().saturating_sub(FFT_SIZE)..];
        let pad = FFT_SIZE - tail.len();

        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { tail[i - pad] };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.buffer);

        let scale = 255.0 / (MAX_DB - MIN_DB);
        self.buffer[..BIN_COUNT]
            .iter()
            .zip(self.smoothed.iter_mut())
            .map(|(bin, smoothed)| {
                let magnitude = bin.norm() / FFT_SIZE as f32;
                *smoothed = SMOOTHING * *smoothed + (1.0 - SMOOTHING) * magnitude;
                if *smoothed <= 0.0 {
                    return 0;
                }
                let db = 20.0 * smoothed.log10();
                (scale * (db - MIN_DB)).clamp(0.0, 255.0) as u8
            })
            .collect()
    }

    /// Forget smoothing history.
    pub fn reset(&mut self) {
        self.smoothed.iter_mut().for_each(|s| *s = 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::detector::{DEFAULT_BLOW_THRESHOLD, mean_amplitude};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn noise(rng: &mut StdRng, level: f32) -> Vec<f32> {
        (0..FFT_SIZE).map(|_| rng.gen_range(-level..level)).collect()
    }

    #[test]
    fn silence_is_all_zero() {
        let mut spectrum = ByteSpectrum::new();
        let frame = spectrum.analyze(&[0.0; FFT_SIZE]);
        assert_eq!(frame.len(), BIN_COUNT);
        assert!(frame.iter().all(|&b| b == 0));
    }

    #[test]
    fn short_input_is_padded() {
        let mut spectrum = ByteSpectrum::new();
        assert_eq!(spectrum.analyze(&[]).len(), BIN_COUNT);
        assert_eq!(spectrum.analyze(&[0.5; 10]).len(), BIN_COUNT);
    }

    #[test]
    fn loud_broadband_noise_crosses_blow_threshold() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut spectrum = ByteSpectrum::new();
        let mut level = 0.0;
        for _ in 0..10 {
            level = mean_amplitude(&spectrum.analyze(&noise(&mut rng, 1.0)));
        }
        assert!(
            level > DEFAULT_BLOW_THRESHOLD,
            "expected a blow-level mean, got {level}"
        );
    }

    #[test]
    fn faint_noise_stays_below_threshold() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut spectrum = ByteSpectrum::new();
        for _ in 0..10 {
            let level = mean_amplitude(&spectrum.analyze(&noise(&mut rng, 1e-4)));
            assert!(level < DEFAULT_BLOW_THRESHOLD, "faint noise read {level}");
        }
    }

    #[test]
    fn pure_tone_concentrates_in_one_region() {
        let mut spectrum = ByteSpectrum::new();
        // Bin 32 of 256: exactly 32 periods per window, quiet enough that
        // the neighbouring bins do not saturate too.
        let tone: Vec<f32> = (0..FFT_SIZE)
            .map(|i| 0.01 * (2.0 * std::f32::consts::PI * 32.0 * i as f32 / FFT_SIZE as f32).sin())
            .collect();
        let mut frame = Vec::new();
        for _ in 0..10 {
            frame = spectrum.analyze(&tone);
        }
        assert!(frame[32] > frame[31]);
        assert!(frame[32] > frame[33]);
        assert!(frame[31] > frame[29]);
        assert_eq!(frame[100], 0);
    }

    #[test]
    fn reset_forgets_history() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut spectrum = ByteSpectrum::new();
        spectrum.analyze(&noise(&mut rng, 1.0));
        spectrum.reset();
        assert!(spectrum.analyze(&[0.0; FFT_SIZE]).iter().all(|&b| b == 0));
    }
}
