//! Microphone blow detection and background music.
//!
//! `detector` always builds. `spectrum` needs the `audio` feature along with
//! the capture it serves; without it `mic` and `music` fall back to inert
//! stand-ins, so the rest of the card never has to care.

pub mod detector;
pub mod mic;
pub mod music;
#[cfg(feature = "audio")]
pub mod spectrum;
