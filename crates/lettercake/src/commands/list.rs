use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::config::Config;
use crate::letters::{ImageRef, LetterDeck};

/// Print the deck the card would show for `dir`.
pub fn run(dir: Option<PathBuf>) -> Result<()> {
    let dir = match dir {
        Some(dir) => Some(dir),
        None => Config::load_or_default()?.defaults.and_then(|d| d.letters_dir),
    };
    let deck = LetterDeck::load(dir.as_deref())?;

    match &dir {
        Some(dir) => println!("{} letter(s) in {}", deck.count(), dir.display()),
        None => println!(
            "{}",
            format!("No letters directory; {} placeholder letters.", deck.count()).yellow()
        ),
    }
    for letter in deck.iter() {
        let source = match &letter.image {
            ImageRef::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            ImageRef::Placeholder => "(placeholder)".dimmed().to_string(),
        };
        println!("  {:>3}  {:<12} {}", letter.id, letter.title, source);
    }
    Ok(())
}
