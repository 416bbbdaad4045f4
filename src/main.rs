use std::{fs, io::{self, Write}, path::PathBuf, sync::Arc};

use clap::Parser as _;

use crate::{
    cli::{Cli, Command},
    config::Config,
    prelude::*,
    report::Stats,
    target::{Endpoint, Endpoints},
    workload::Workload,
};


mod cli;
mod config;
mod log;
mod prelude;
mod ramp;
mod report;
mod target;
mod workload;


#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;


#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Run => {
            let (config, path) = config::load(cli.config.as_deref())?;
            log::init(&config.log)?;
            log_config_source(path);
            run(config).await?;
        }

        Command::Check => {
            let (config, path) = config::load(cli.config.as_deref())?;
            check(&config, path)?;
        }

        Command::GenConfigTemplate { out } => {
            let template = config::template();
            match out {
                Some(path) => fs::write(&path, &template)
                    .with_context(|| format!("failed to write '{}'", path.display()))?,
                None => io::stdout().write_all(template.as_bytes())?,
            }
        }
    }

    Ok(())
}

fn log_config_source(path: Option<PathBuf>) {
    match path {
        Some(path) => info!("Loaded config from '{}'", path.display()),
        None => info!("No config file found, using defaults"),
    }
}

async fn run(config: Config) -> Result<()> {
    let stats = Arc::new(Stats::new());
    let workload = Arc::new(Workload::new(config.workload.clone(), Arc::clone(&stats)));

    info!(
        base_url = %config.target.base_url,
        seats = ?config.workload.seats(),
        peak_vus = config.ramp.peak_users(),
        "Starting load test of {:?}",
        config.ramp.total_duration(),
    );
    let metrics = ramp::run(workload, &config.target, &config.ramp).await?;
    stats.peak_vus(metrics.maximum_users as u64);

    let summary = stats.summary();
    println!("\n{summary}");
    info!(
        iterations = summary.iterations_completed,
        integrity_violations = summary.integrity_violations(),
        "Load test finished",
    );

    if let Some(path) = &config.report.summary_export {
        summary.write_json(path)?;
        info!("Wrote summary to '{}'", path.display());
    }

    let violations = summary.integrity_violations();
    if config.report.fail_on_integrity_violation && violations > 0 {
        bail!("{violations} booking attempt(s) got a status other than 201 or 409");
    }

    Ok(())
}

/// Validates everything that can be validated without sending requests and
/// prints the resolved plan.
fn check(config: &Config, path: Option<PathBuf>) -> Result<()> {
    let endpoints = Endpoints::new(&config.target.base_url)?;

    match path {
        Some(path) => println!("config: {}", path.display()),
        None => println!("config: defaults (no file found)"),
    }
    println!("endpoints:");
    for endpoint in Endpoint::ALL {
        println!("  POST {}", endpoints.url(endpoint));
    }
    println!("seats: {:?}", config.workload.seats());
    println!("stages:");
    for stage in &config.ramp.stages {
        println!("  {:>8} -> {} VUs", format!("{:?}", stage.duration), stage.target);
    }
    println!(
        "total: {:?}, peak: {} VUs",
        config.ramp.total_duration(),
        config.ramp.peak_users(),
    );
    println!("goose test plan: {}", config.ramp.test_plan());
    println!("Config OK");

    Ok(())
}
