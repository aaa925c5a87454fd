use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui;
use rayon::prelude::*;

use crate::letters::{ImageRef, LetterDeck};

/// Longest edge kept after decoding; scans are shown well below this.
const MAX_EDGE: u32 = 1600;

pub struct DecodedImage {
    pub size: [usize; 2],
    pub rgba: Vec<u8>,
}

/// Decode one letter scan, shrinking it to fit `MAX_EDGE`.
pub fn decode(path: &Path) -> Result<DecodedImage> {
    let image = image::open(path).with_context(|| format!("cannot decode {}", path.display()))?;
    let image = if image.width() > MAX_EDGE || image.height() > MAX_EDGE {
        image.thumbnail(MAX_EDGE, MAX_EDGE)
    } else {
        image
    };
    let rgba = image.into_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(DecodedImage {
        size,
        rgba: rgba.into_raw(),
    })
}

/// Decode every scan in the deck in parallel. Letters without a usable image
/// get `None` and render as a placeholder.
pub fn decode_all(deck: &LetterDeck) -> Vec<Option<DecodedImage>> {
    let letters: Vec<_> = deck.iter().collect();
    letters
        .par_iter()
        .map(|letter| match &letter.image {
            ImageRef::File(path) => match decode(path) {
                Ok(image) => Some(image),
                Err(e) => {
                    log::warn!("{e:#}");
                    None
                }
            },
            ImageRef::Placeholder => None,
        })
        .collect()
}

/// Letter textures, uploaded to the GPU the first time each is drawn.
pub struct ImageCache {
    pending: RefCell<Vec<Option<DecodedImage>>>,
    textures: RefCell<HashMap<usize, egui::TextureHandle>>,
}

impl ImageCache {
    pub fn new(decoded: Vec<Option<DecodedImage>>) -> Self {
        Self {
            pending: RefCell::new(decoded),
            textures: RefCell::new(HashMap::new()),
        }
    }

    #[cfg(test)]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn get_or_load(&self, ctx: &egui::Context, index: usize) -> Option<egui::TextureHandle> {
        if let Some(texture) = self.textures.borrow().get(&index) {
            return Some(texture.clone());
        }

        let decoded = self
            .pending
            .borrow_mut()
            .get_mut(index)
            .and_then(Option::take)?;
        let image = egui::ColorImage::from_rgba_unmultiplied(decoded.size, &decoded.rgba);
        let texture = ctx.load_texture(
            format!("letter-{}", index + 1),
            image,
            egui::TextureOptions::LINEAR,
        );
        self.textures.borrow_mut().insert(index, texture.clone());
        Some(texture)
    }
}
