use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

/// Letters in the built-in deck.
pub const DEFAULT_LETTER_COUNT: usize = 20;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    File(PathBuf),
    /// No scan available; rendered as a blank card.
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Letter {
    /// 1-based position in the deck.
    pub id: u32,
    pub title: String,
    pub image: ImageRef,
}

/// The ordered, fixed set of letters shown in the carousel. Never empty.
#[derive(Debug, Clone)]
pub struct LetterDeck {
    letters: Vec<Letter>,
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

fn title_for(id: u32) -> String {
    format!("Letter #{id}")
}

impl LetterDeck {
    /// `count` placeholder letters titled "Letter #1", "Letter #2", ...
    pub fn placeholder(count: usize) -> Self {
        let letters = (1..=count.max(1) as u32)
            .map(|id| Letter {
                id,
                title: title_for(id),
                image: ImageRef::Placeholder,
            })
            .collect();
        Self { letters }
    }

    /// Every image in `dir`, sorted by file name.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("cannot read letters directory {}", dir.display()))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && is_image_file(p))
            .collect();
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        if paths.is_empty() {
            bail!(
                "no letter images (png, jpg, jpeg, webp) in {}",
                dir.display()
            );
        }

        let letters = paths
            .into_iter()
            .zip(1u32..)
            .map(|(path, id)| Letter {
                id,
                title: title_for(id),
                image: ImageRef::File(path),
            })
            .collect::<Vec<_>>();
        log::info!("loaded {} letter(s) from {}", letters.len(), dir.display());
        Ok(Self { letters })
    }

    /// Load from `dir` when given, otherwise the built-in placeholder deck.
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        match dir {
            Some(dir) => Self::from_dir(dir),
            None => Ok(Self::placeholder(DEFAULT_LETTER_COUNT)),
        }
    }

    pub fn get(&self, index: usize) -> Option<&Letter> {
        self.letters.get(index)
    }

    pub fn count(&self) -> usize {
        self.letters.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Letter> {
        self.letters.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "lettercake-letters-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn placeholder_deck_has_numbered_titles() {
        let deck = LetterDeck::placeholder(DEFAULT_LETTER_COUNT);
        assert_eq!(deck.count(), 20);
        let first = deck.get(0).unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(first.title, "Letter #1");
        assert_eq!(first.image, ImageRef::Placeholder);
        assert_eq!(deck.get(19).unwrap().title, "Letter #20");
        assert!(deck.get(20).is_none());
    }

    #[test]
    fn placeholder_deck_is_never_empty() {
        assert_eq!(LetterDeck::placeholder(0).count(), 1);
    }

    #[test]
    fn load_without_dir_is_default_deck() {
        let deck = LetterDeck::load(None).unwrap();
        assert_eq!(deck.count(), DEFAULT_LETTER_COUNT);
    }

    #[test]
    fn image_extension_match_is_case_insensitive() {
        assert!(is_image_file(Path::new("a.png")));
        assert!(is_image_file(Path::new("a.JPG")));
        assert!(is_image_file(Path::new("dir/a.Jpeg")));
        assert!(is_image_file(Path::new("a.webp")));
        assert!(!is_image_file(Path::new("a.gif")));
        assert!(!is_image_file(Path::new("notes.txt")));
        assert!(!is_image_file(Path::new("png")));
    }

    #[test]
    fn directory_is_filtered_and_sorted() {
        let dir = scratch_dir("sorted");
        for name in ["03.jpg", "01.PNG", "02.webp", "readme.txt", "cover.gif"] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.join("nested.png")).unwrap();

        let deck = LetterDeck::from_dir(&dir).unwrap();
        let names: Vec<_> = deck
            .iter()
            .map(|l| match &l.image {
                ImageRef::File(p) => p.file_name().unwrap().to_string_lossy().into_owned(),
                ImageRef::Placeholder => String::new(),
            })
            .collect();
        assert_eq!(names, vec!["01.PNG", "02.webp", "03.jpg"]);
        assert_eq!(deck.get(2).unwrap().id, 3);
        assert_eq!(deck.get(2).unwrap().title, "Letter #3");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = scratch_dir("empty");
        std::fs::write(dir.join("notes.txt"), b"x").unwrap();
        let err = LetterDeck::from_dir(&dir).unwrap_err();
        assert!(err.to_string().contains("no letter images"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = std::env::temp_dir().join("lettercake-letters-does-not-exist");
        assert!(LetterDeck::load(Some(&dir)).is_err());
    }
}
