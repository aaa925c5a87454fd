use std::path::Path;

/// Background music volume.
pub const VOLUME: f32 = 0.3;

#[cfg_attr(not(feature = "audio"), allow(dead_code))]
const SAMPLE_RATE: u32 = 22050;

/// "Happy Birthday" as (MIDI note, beats). Rests are note 0.
#[rustfmt::skip]
const TUNE: &[(u8, f32)] = &[
    (67, 0.75), (67, 0.25), (69, 1.0), (67, 1.0), (72, 1.0), (71, 2.0),
    (67, 0.75), (67, 0.25), (69, 1.0), (67, 1.0), (74, 1.0), (72, 2.0),
    (67, 0.75), (67, 0.25), (79, 1.0), (76, 1.0), (72, 1.0), (71, 1.0), (69, 2.0),
    (77, 0.75), (77, 0.25), (76, 1.0), (72, 1.0), (74, 1.0), (72, 2.0),
    (0, 2.0),
];

const BEAT_SECS: f32 = 0.42;

fn note_freq(midi: u8) -> f32 {
    440.0 * 2f32.powf((midi as f32 - 69.0) / 12.0)
}

/// One pass of the generated birthday tune: soft sine tones with a short
/// attack and an exponential tail so notes do not click.
#[cfg_attr(not(feature = "audio"), allow(dead_code))]
fn melody_samples(sample_rate: u32) -> Vec<f32> {
    let rate = sample_rate as f32;
    let mut samples = Vec::new();
    for &(note, beats) in TUNE {
        let n = (rate * beats * BEAT_SECS) as usize;
        if note == 0 {
            samples.extend(std::iter::repeat_n(0.0, n));
            continue;
        }
        let freq = note_freq(note);
        let attack = (rate * 0.02) as usize;
        samples.extend((0..n).map(|i| {
            let t = i as f32 / rate;
            let env = if i < attack {
                i as f32 / attack as f32
            } else {
                (-3.0 * (i - attack) as f32 / n as f32).exp()
            };
            let tone = (t * freq * 2.0 * std::f32::consts::PI).sin()
                + 0.25 * (t * freq * 4.0 * std::f32::consts::PI).sin();
            tone * env * 0.6
        }));
    }
    samples
}

#[cfg(feature = "audio")]
mod output {
    use std::fs::File;
    use std::io::BufReader;
    use std::path::Path;

    use anyhow::{Context, Result};
    use rodio::buffer::SamplesBuffer;
    use rodio::{Decoder, OutputStream, Sink, Source};

    pub struct Output {
        _stream: OutputStream,
        sink: Sink,
    }

    impl Output {
        pub fn open(track: Option<&Path>) -> Result<Self> {
            let (stream, handle) =
                OutputStream::try_default().context("no audio output device")?;
            let sink = Sink::try_new(&handle).context("cannot create audio sink")?;
            sink.pause();
            sink.set_volume(super::VOLUME);

            match track {
                Some(path) => {
                    let file = File::open(path)
                        .with_context(|| format!("cannot open {}", path.display()))?;
                    let source = Decoder::new_looped(BufReader::new(file))
                        .with_context(|| format!("cannot decode {}", path.display()))?;
                    sink.append(source);
                }
                None => {
                    let tune = super::melody_samples(super::SAMPLE_RATE);
                    sink.append(SamplesBuffer::new(1, super::SAMPLE_RATE, tune).repeat_infinite());
                }
            }
            Ok(Self {
                _stream: stream,
                sink,
            })
        }

        pub fn set_playing(&self, playing: bool) {
            if playing {
                self.sink.play();
            } else {
                self.sink.pause();
            }
        }
    }
}

#[cfg(not(feature = "audio"))]
mod output {
    use std::path::Path;

    pub struct Output;

    impl Output {
        pub fn open(_track: Option<&Path>) -> anyhow::Result<Self> {
            anyhow::bail!("audio output support is not compiled in")
        }

        pub fn set_playing(&self, _playing: bool) {}
    }
}

/// Looping background music with an on/off toggle.
///
/// A player whose output could not be opened stays silent but still tracks
/// the toggle, so the button keeps working.
pub struct MusicPlayer {
    enabled: bool,
    output: Option<output::Output>,
}

impl MusicPlayer {
    pub fn new(track: Option<&Path>, enabled: bool) -> Self {
        let output = match output::Output::open(track) {
            Ok(output) => {
                log::info!(
                    "music ready ({})",
                    track.map_or_else(|| "generated tune".to_string(), |p| p.display().to_string())
                );
                Some(output)
            }
            Err(e) => {
                log::warn!("music disabled: {e:#}");
                None
            }
        };
        let player = Self { enabled, output };
        player.apply();
        player
    }

    /// A player that never produces sound.
    #[cfg(test)]
    pub fn without_output(enabled: bool) -> Self {
        Self {
            enabled,
            output: None,
        }
    }

    #[cfg(test)]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_audible(&self) -> bool {
        self.enabled && self.output.is_some()
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            log::debug!("music {}", if enabled { "on" } else { "off" });
            self.apply();
        }
    }

    /// Flip the toggle and return the new state.
    #[cfg(test)]
    pub fn toggle(&mut self) -> bool {
        self.set_enabled(!self.enabled);
        self.enabled
    }

    fn apply(&self) {
        if let Some(output) = &self.output {
            output.set_playing(self.enabled);
        }
    }
}

impl Drop for MusicPlayer {
    fn drop(&mut self) {
        if let Some(output) = &self.output {
            output.set_playing(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_player_tracks_toggle() {
        let mut player = MusicPlayer::without_output(true);
        assert!(player.is_enabled());
        assert!(!player.is_audible());
        assert!(!player.toggle());
        assert!(!player.is_enabled());
        assert!(player.toggle());
        player.set_enabled(false);
        assert!(!player.is_enabled());
    }

    #[test]
    fn melody_is_bounded_and_ends_in_silence() {
        let samples = melody_samples(SAMPLE_RATE);
        let beats: f32 = TUNE.iter().map(|&(_, b)| b).sum();
        let expected = SAMPLE_RATE as f32 * beats * BEAT_SECS;
        assert!((samples.len() as f32 - expected).abs() < TUNE.len() as f32);
        assert!(samples.iter().all(|s| s.abs() <= 1.0));
        assert!(samples.iter().any(|s| s.abs() > 0.3));
        assert!(samples[samples.len() - 100..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn concert_pitch() {
        assert!((note_freq(69) - 440.0).abs() < 1e-3);
        assert!((note_freq(81) - 880.0).abs() < 1e-2);
    }
}
