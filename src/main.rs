mod cli;

use anyhow::{Result, bail};
use clap::Parser;
use cli::{Cli, Commands};
use skiff::logging::LoggingConfig;
use skiff::{CleanupReport, ImageSweep, SkiffConfig, SkiffRuntime};
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match SkiffConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("skiff: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(path) = cli.log_file.clone() {
        config.log_file = path;
    }
    if let Some(level) = cli.log_level.clone() {
        config.log_level = level;
    }
    let quiet = cli.quiet || config.quiet;

    let logging = LoggingConfig {
        log_level: config.log_level.clone(),
        log_file: config.log_file.clone(),
        json: config.json_logs,
    };
    let _guard = match logging.init() {
        Ok(guard) => guard,
        Err(e) => {
            if !quiet {
                eprintln!("skiff: {:#}", e);
            }
            return ExitCode::FAILURE;
        }
    };

    info!("skiff {} starting", env!("CARGO_PKG_VERSION"));

    match run(cli.command, &config).await {
        Ok(line) => {
            info!("{}", line);
            if !quiet {
                println!("{}", line);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            if !quiet {
                eprintln!("skiff: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: &SkiffConfig) -> Result<String> {
    let runtime = SkiffRuntime::connect(config).await?;

    match command {
        Commands::StopContainers { container } => {
            let report = runtime.stop_containers(container.as_deref()).await?;
            summarize(report)
        }

        Commands::RemoveStopped => summarize(runtime.remove_stopped_containers().await?),

        Commands::RemoveAll => summarize(runtime.remove_all_containers().await?),

        Commands::RemoveImages { sweep } => {
            let mode = if sweep {
                ImageSweep::Sweep
            } else {
                ImageSweep::Auto
            };
            summarize(runtime.clean_images(mode).await?)
        }

        Commands::Name { prefix } => Ok(runtime.next_name(&prefix).await?),

        Commands::Ip { name } => Ok(runtime.container_ip(&name).await?.to_string()),
    }
}

/// Summary line of a report, or an error when any item failed.
fn summarize(report: CleanupReport) -> Result<String> {
    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        for failure in &failures {
            error!("{}: {:?}", failure.id, failure.status);
        }
        bail!("{} ({} failed)", report, failures.len());
    }
    Ok(report.to_string())
}
