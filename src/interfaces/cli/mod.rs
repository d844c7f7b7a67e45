//! Command-line interface of the `aonorm` binary.

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::io::format::{aonorm_output, log_title};

const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

/// Logs a nicely formatted `aonorm` heading to the `aonorm-output` logger.
pub fn log_heading() {
    let version = if let Some(ver) = VERSION {
        format!("v{ver}")
    } else {
        "v unknown".to_string()
    };
    log_title(&format!("aonorm {version}: atomic-orbital index normalisation"));
    aonorm_output!("");
}

/// Command-line arguments of the `aonorm` binary.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// The YAML input file describing the system to normalise.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// The file to which the main output is written instead of the console.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Writes a template YAML input file to this path and exits.
    #[arg(short, long)]
    pub write_template: Option<PathBuf>,

    /// Increases the verbosity of diagnostic messages. May be given more than once.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// The level of diagnostic messages for the current verbosity.
    pub fn level_filter(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Initialises `log4rs` with diagnostics on the console and the main output on the console or in
/// a file.
///
/// # Arguments
///
/// * `output` - The file receiving everything logged to the `aonorm-output` target. If `None`,
/// the main output goes to the console.
/// * `level` - The level of diagnostic messages.
///
/// # Errors
///
/// Errors if the output file cannot be created or if a logger has already been set.
pub fn init_logging(output: Option<&Path>, level: LevelFilter) -> Result<(), anyhow::Error> {
    let console = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{h({l:<5})} {t} - {m}{n}")))
        .build();
    let main_output: Box<dyn log4rs::append::Append> = match output {
        Some(path) => Box::new(
            FileAppender::builder()
                .encoder(Box::new(PatternEncoder::new("{m}{n}")))
                .append(false)
                .build(path)?,
        ),
        None => Box::new(
            ConsoleAppender::builder()
                .encoder(Box::new(PatternEncoder::new("{m}{n}")))
                .build(),
        ),
    };
    let config = Config::builder()
        .appender(Appender::builder().build("console", Box::new(console)))
        .appender(Appender::builder().build("main-output", main_output))
        .logger(
            Logger::builder()
                .appender("main-output")
                .additive(false)
                .build("aonorm-output", LevelFilter::Info),
        )
        .build(Root::builder().appender("console").build(level))?;
    log4rs::init_config(config)?;
    Ok(())
}
