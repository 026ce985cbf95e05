use anyhow::Context;
use clap::Parser;

use diforge::cli::{handle_services, handle_validate, DiforgeArgs, DiforgeCommand};
use diforge::config::AppConfig;
use diforge::logging::init_logging;

fn main() -> anyhow::Result<()> {
    let args = DiforgeArgs::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::load_from(path.clone())
            .with_context(|| format!("loading {}", path.display()))?,
        None => AppConfig::load().context("loading default services file")?,
    };
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    init_logging(&config.logging)?;

    let mut stdout = std::io::stdout().lock();
    match args.command {
        DiforgeCommand::Validate => handle_validate(&config, &mut stdout)?,
        DiforgeCommand::Services => handle_services(&config, &mut stdout)?,
    }

    Ok(())
}
