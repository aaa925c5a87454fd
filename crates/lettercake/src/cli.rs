use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lettercake")]
#[command(author, version, about)]
#[command(long_about = "A birthday greeting card.\n\n\
    Blow out the candles, read a stack of hand-written letters, pop the balloon.\n\n\
    Examples:\n  \
    lettercake                    Open the card with placeholder letters (fullscreen)\n  \
    lettercake ./letters          Use the scans in ./letters as the letters\n  \
    lettercake --windowed         Open in a window\n  \
    lettercake list ./letters     Show which files become which letter")]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Directory of letter images (png, jpg, jpeg, webp)
    pub letters_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Launch in a window instead of fullscreen
    #[arg(long, global = false)]
    pub windowed: bool,

    /// Open the letters on a specific letter (1-indexed)
    #[arg(long, global = false)]
    pub letter: Option<usize>,

    /// Skip the microphone and blow out the candles by hand
    #[arg(long, global = false)]
    pub no_mic: bool,

    /// Start with the background music off
    #[arg(long, global = false)]
    pub no_music: bool,

    /// Seed for the decorations, for a reproducible card
    #[arg(long, global = false)]
    pub seed: Option<u64>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// View and modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// List the letters a directory would produce
    List {
        /// Directory of letter images; falls back to defaults.letters_dir
        dir: Option<PathBuf>,
    },

    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Display current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g. card.recipient, defaults.music, defaults.blow_threshold)
        key: String,

        /// Value to set
        value: String,
    },
}

#[derive(Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

impl Cli {
    /// Verbosity as a log filter for this crate; `RUST_LOG` still wins.
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn,lettercake=info",
            1 => "warn,lettercake=debug",
            _ => "trace",
        }
    }

    pub fn run(self) -> anyhow::Result<()> {
        match self.command {
            Some(Commands::Config { command }) => crate::commands::config::run(command),
            Some(Commands::List { dir }) => crate::commands::list::run(dir),
            Some(Commands::Completion { shell }) => {
                crate::commands::completion::run(shell);
                Ok(())
            }
            Some(Commands::Version) => {
                crate::banner::print_banner_with_version();
                Ok(())
            }
            None => {
                if let Some(dir) = &self.letters_dir {
                    if !dir.is_dir() {
                        anyhow::bail!("Directory not found: {}", dir.display());
                    }
                }
                let options = crate::app::LaunchOptions {
                    letters_dir: self.letters_dir,
                    windowed: self.windowed,
                    letter: self.letter,
                    no_mic: self.no_mic,
                    no_music: self.no_music,
                    seed: self.seed,
                };
                crate::app::run(options)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn launch_flags_parse() {
        let cli = Cli::try_parse_from([
            "lettercake",
            "letters",
            "--windowed",
            "--letter",
            "3",
            "--no-mic",
            "--seed",
            "7",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.letters_dir, Some(PathBuf::from("letters")));
        assert!(cli.windowed && cli.no_mic && !cli.no_music);
        assert_eq!(cli.letter, Some(3));
        assert_eq!(cli.seed, Some(7));
        assert_eq!(cli.log_filter(), "warn,lettercake=debug");
    }

    #[test]
    fn quiet_wins_over_verbose() {
        let cli = Cli::try_parse_from(["lettercake", "-vv", "-q"]).unwrap();
        assert_eq!(cli.log_filter(), "error");
    }

    #[test]
    fn subcommands_parse() {
        let cli =
            Cli::try_parse_from(["lettercake", "config", "set", "card.recipient", "Ada"]).unwrap();
        match cli.command {
            Some(Commands::Config {
                command: ConfigCommands::Set { key, value },
            }) => {
                assert_eq!(key, "card.recipient");
                assert_eq!(value, "Ada");
            }
            _ => panic!("expected config set"),
        }

        let cli = Cli::try_parse_from(["lettercake", "list"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::List { dir: None })));
    }
}
