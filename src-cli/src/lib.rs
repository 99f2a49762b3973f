pub mod cli;
pub mod commands;
pub mod config;
pub mod telemetry;

use std::path::Path;

use arx_core::error::AppError;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::cli::{Cli, Command};
use crate::config::Config;

pub fn now_rfc3339_utc() -> Result<String, AppError> {
    OffsetDateTime::now_utc().format(&Rfc3339).map_err(|e| {
        AppError::new("ARX_REPORT_TIME_INVALID", "Failed to format time")
            .with_details(e.to_string())
    })
}

/// Runs one command and returns what should be printed on stdout.
pub fn run(cli: &Cli, cwd: &Path) -> Result<String, AppError> {
    let config = Config::resolve(cli.config.as_deref(), cwd)?;
    match &cli.command {
        Command::Generate(args) => {
            let generated_at = now_rfc3339_utc()?;
            commands::execute_generate(args, &config, &generated_at)
        }
        Command::Score(args) => commands::execute_score(args, &config),
        Command::Health => commands::execute_health(&config),
    }
}
