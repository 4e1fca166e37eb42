// src/main.rs

mod app_logic;
mod cli;
mod core;

use crate::core::path_utils::APP_NAME;
use crate::core::{ConfigManagerOperations, CoreConfigManager};
use clap::Parser;
use simplelog::{
    ColorChoice, CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use std::fs::File;
use std::process::ExitCode;

const LOG_FILENAME: &str = "ipo_tracker.log";

fn terminal_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/*
 * Sets up logging to stderr at the requested verbosity and, when the config
 * directory is writable, a debug-level log file next to the settings.
 */
fn init_logging(verbose: u8, config_manager: &dyn ConfigManagerOperations) {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        terminal_level(verbose),
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    let log_file = config_manager
        .config_dir()
        .map(|dir| dir.join(LOG_FILENAME))
        .and_then(|path| File::create(path).ok());
    if let Some(file) = log_file {
        loggers.push(WriteLogger::new(LevelFilter::Debug, Config::default(), file));
    }

    if let Err(e) = CombinedLogger::init(loggers) {
        eprintln!("Failed to initialize logging: {e}");
    }
}

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    let config_manager = CoreConfigManager::new(APP_NAME);
    init_logging(cli.verbose, &config_manager);
    log::debug!("Main: Starting {APP_NAME}.");

    match cli.run(&config_manager) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}
