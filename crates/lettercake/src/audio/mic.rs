use thiserror::Error;

#[derive(Debug, Error)]
pub enum MicError {
    #[error("audio input support is not compiled in")]
    Unavailable,
    #[error("no default input device")]
    NoDevice,
    #[error("cannot read input config: {0}")]
    Config(String),
    #[error("cannot open input stream: {0}")]
    Build(String),
    #[error("cannot start input stream: {0}")]
    Play(String),
}

#[cfg(feature = "audio")]
mod inner {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};

    use super::MicError;
    use crate::audio::detector::FrameSource;
    use crate::audio::spectrum::{ByteSpectrum, FFT_SIZE};

    /// Most recent mono samples from the input callback.
    #[derive(Default)]
    struct SampleRing {
        samples: VecDeque<f32>,
        fresh: bool,
    }

    impl SampleRing {
        fn push_interleaved(&mut self, data: &[f32], channels: usize) {
            for frame in data.chunks(channels.max(1)) {
                let mono = frame.iter().sum::<f32>() / frame.len() as f32;
                self.samples.push_back(mono);
            }
            let excess = self.samples.len().saturating_sub(FFT_SIZE);
            self.samples.drain(..excess);
            self.fresh = true;
        }
    }

    /// Live microphone capture. Holding one keeps the device open; dropping
    /// it stops the stream and releases the device.
    pub struct MicInput {
        stream: Stream,
        ring: Arc<Mutex<SampleRing>>,
        spectrum: ByteSpectrum,
        scratch: Vec<f32>,
    }

    impl MicInput {
        pub fn open() -> Result<Self, MicError> {
            let host = cpal::default_host();
            let device = host.default_input_device().ok_or(MicError::NoDevice)?;
            let name = device.name().unwrap_or_else(|_| "unknown".to_string());

            let supported = device
                .default_input_config()
                .map_err(|e| MicError::Config(e.to_string()))?;
            let format = supported.sample_format();
            let config: StreamConfig = supported.into();
            if config.channels == 0 {
                return Err(MicError::Config("device reported 0 channels".into()));
            }
            log::debug!(
                "opening input '{name}': {} Hz, {} channel(s), {format:?}",
                config.sample_rate.0,
                config.channels
            );

            let ring = Arc::new(Mutex::new(SampleRing::default()));
            let stream = match format {
                SampleFormat::F32 => build::<f32>(&device, &config, ring.clone()),
                SampleFormat::I16 => build::<i16>(&device, &config, ring.clone()),
                SampleFormat::U16 => build::<u16>(&device, &config, ring.clone()),
                other => Err(MicError::Config(format!("unsupported sample format {other:?}"))),
            }?;
            stream.play().map_err(|e| MicError::Play(e.to_string()))?;
            log::info!("microphone open on '{name}'");

            Ok(Self {
                stream,
                ring,
                spectrum: ByteSpectrum::new(),
                scratch: Vec::with_capacity(FFT_SIZE),
            })
        }
    }

    fn build<T>(
        device: &cpal::Device,
        config: &StreamConfig,
        ring: Arc<Mutex<SampleRing>>,
    ) -> Result<Stream, MicError>
    where
        T: SizedSample,
        f32: FromSample<T>,
    {
        let channels = config.channels as usize;
        let mut converted = Vec::new();
        device
            .build_input_stream(
                config,
                move |data: &[T], _: &cpal::InputCallbackInfo| {
                    converted.clear();
                    converted.extend(data.iter().map(|&s| f32::from_sample(s)));
                    if let Ok(mut ring) = ring.lock() {
                        ring.push_interleaved(&converted, channels);
                    }
                },
                |err| log::warn!("input stream error: {err}"),
                None,
            )
            .map_err(|e| MicError::Build(e.to_string()))
    }

    impl FrameSource for MicInput {
        fn next_frame(&mut self) -> Option<Vec<u8>> {
            {
                let mut ring = self.ring.lock().ok()?;
                if !ring.fresh {
                    return None;
                }
                ring.fresh = false;
                self.scratch.clear();
                self.scratch.extend(ring.samples.iter().copied());
            }
            Some(self.spectrum.analyze(&self.scratch))
        }
    }

    impl Drop for MicInput {
        fn drop(&mut self) {
            if let Err(e) = self.stream.pause() {
                log::debug!("pausing input stream on close: {e}");
            }
            log::info!("microphone closed");
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn ring_downmixes_and_keeps_latest_window() {
            let mut ring = SampleRing::default();
            assert!(!ring.fresh);
            ring.push_interleaved(&[1.0, 0.0, 0.5, 0.5], 2);
            assert_eq!(ring.samples, VecDeque::from(vec![0.5, 0.5]));
            assert!(ring.fresh);

            let long: Vec<f32> = (0..FFT_SIZE * 2).map(|i| i as f32).collect();
            ring.push_interleaved(&long, 1);
            assert_eq!(ring.samples.len(), FFT_SIZE);
            assert_eq!(ring.samples.back(), Some(&((FFT_SIZE * 2 - 1) as f32)));
        }
    }
}

#[cfg(feature = "audio")]
pub use inner::MicInput;

#[cfg(not(feature = "audio"))]
pub struct MicInput;

#[cfg(not(feature = "audio"))]
impl MicInput {
    pub fn open() -> Result<Self, MicError> {
        Err(MicError::Unavailable)
    }
}

#[cfg(not(feature = "audio"))]
impl crate::audio::detector::FrameSource for MicInput {
    fn next_frame(&mut self) -> Option<Vec<u8>> {
        None
    }
}

/// Open the default microphone as a boxed frame source.
pub fn open_default() -> Result<Box<dyn crate::audio::detector::FrameSource>, MicError> {
    let mic = MicInput::open()?;
    Ok(Box::new(mic))
}
