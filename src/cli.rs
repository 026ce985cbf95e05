use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing::Level;

use crate::config::AppConfig;
use crate::errors::{config_error, AppError};

/// Command-line arguments for `diforge`.
#[derive(Parser, Debug)]
#[clap(
    name = "diforge",
    version,
    about = "Inspect and validate declarative service configuration",
    long_about = None
)]
pub struct DiforgeArgs {
    /// Services file to load instead of the default one
    #[clap(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the configured log level (trace, debug, info, warn, error)
    #[clap(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<Level>,

    #[command(subcommand)]
    pub command: DiforgeCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum DiforgeCommand {
    /// Check that every service reference names a configured service
    Validate,
    /// List configured services with their kind and sharing
    #[clap(alias = "ls")]
    Services,
}

/// Report service references that point at nothing.
///
/// Fails when at least one reference is unresolved.
pub fn handle_validate(config: &AppConfig, out: &mut impl Write) -> Result<(), AppError> {
    let unresolved = config.unresolved_references();
    if unresolved.is_empty() {
        writeln!(out, "{} service(s) OK", config.services.len())?;
        return Ok(());
    }

    for problem in &unresolved {
        writeln!(
            out,
            "service '{}' references unknown service '{}'",
            problem.service, problem.reference
        )?;
    }
    Err(config_error(format!(
        "{} unresolved service reference(s)",
        unresolved.len()
    )))
}

pub fn handle_services(config: &AppConfig, out: &mut impl Write) -> Result<(), AppError> {
    if config.services.is_empty() {
        writeln!(out, "no services configured")?;
        return Ok(());
    }

    for (name, entry) in &config.services {
        let sharing = if entry.shared { "shared" } else { "transient" };
        writeln!(
            out,
            "{name}\t{}\t{}\t{sharing}",
            entry.kind_name(),
            entry.class_name()
        )?;
    }
    Ok(())
}
