// navi_sim/src/main.rs

use clap::Parser;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use navi_sim::cli::Cli;
use navi_sim::config::SimConfig;
use navi_sim::error::SimError;
use navi_sim::runner::Runner;

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("navi_sim=info,navi_core=info")),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), SimError> {
    let mut config = SimConfig::load(cli.scenario.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    if cli.print_config {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    Runner::new(config)?.run()?;
    Ok(())
}
