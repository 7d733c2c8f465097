use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use confini::Config;

/// Print the sections and options of an INI-style configuration file.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// Configuration file to read.
    path: PathBuf,

    /// Only print this section.
    #[arg(short, long)]
    section: Option<String>,

    /// Print values without substituting `%(option)s` and `${ENV}` references.
    #[arg(long)]
    raw: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = match Config::from_file(&cli.path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {e}", cli.path.display());
            return ExitCode::FAILURE;
        }
    };

    let mut status = ExitCode::SUCCESS;

    for section in config.sections() {
        if cli.section.as_deref().is_some_and(|s| s != section) {
            continue;
        }

        println!("[{section}]");

        for option in config.options(section) {
            let value = if cli.raw {
                config.raw_value(section, option).map(str::to_owned)
            } else {
                config.get_string(section, option)
            };

            match value {
                Ok(value) => println!("{option} = {}", value.replace('\n', "\n    ")),
                Err(e) => {
                    eprintln!("[{section}] {option}: {e}");
                    status = ExitCode::FAILURE;
                }
            }
        }

        println!();
    }

    status
}
