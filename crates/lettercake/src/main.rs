mod app;
mod audio;
mod banner;
mod cli;
mod commands;
mod config;
mod decor;
mod letters;
mod navigation;
mod page;
mod render;
mod schedule;
mod theme;
mod transition;

use clap::Parser;
use colored::Colorize;

fn main() {
    let cli = cli::Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .format_timestamp_millis()
        .init();

    if let Err(e) = cli.run() {
        eprintln!("{} {e:#}", "error:".red().bold());
        std::process::exit(1);
    }
}
