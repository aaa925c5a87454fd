use colored::Colorize;

const BANNER: &str = r"
   _       _   _                      _
  | | ___ | |_| |_ ___ _ __ ___ __ _| | _____
  | |/ _ \| __| __/ _ \ '__/ __/ _` | |/ / _ \
  | |  __/| |_| ||  __/ | | (_| (_| |   <  __/
  |_|\___| \__|\__\___|_|  \___\__,_|_|\_\___|
";

pub fn print_banner_with_version() {
    println!("{}", BANNER.magenta().bold());
    println!(
        "  {} {}",
        "lettercake".bold(),
        env!("CARGO_PKG_VERSION").green()
    );
    println!("  {}", env!("CARGO_PKG_DESCRIPTION").dimmed());
    if cfg!(feature = "audio") {
        println!("  {}", "audio: microphone and music enabled".dimmed());
    } else {
        println!("  {}", "audio: built without the audio feature".yellow());
    }
}
