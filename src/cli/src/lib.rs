pub mod commands;
pub mod logging;
pub mod process_command;

use anyhow::{Context, Result};

pub fn run() -> Result<()> {
    logging::setup_logging().context("Can't initialize logging")?;
    process_command::process_cli()
}
