// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Hearth.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

mod config;
mod notifier;
mod report;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hearth_adapters::{StoveClient, worst_case_request_time};
use hearth_core::alerts::device_slug;
use hearth_core::{CommandFacade, CoordinatorRegistry, StoveCoordinator, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::{AppConfig, ConfigSource, DEFAULT_CONFIG_PATH};
use crate::notifier::LogNotifier;

/// How often `watch` logs a summary line
const REPORT_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Parser)]
#[command(name = "hearth", version, about = "Monitor and control an HWAM SmartControl stove")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Poll the stove until interrupted, logging readings and alerts
    Watch,
    /// Read the stove once and print the cached state as JSON
    Status,
    /// Set the burn level (0-5)
    SetBurnLevel {
        #[arg(allow_negative_numbers = true)]
        level: i64,
    },
    /// Start combustion
    Start,
    /// Set the night lowering window, e.g. `set-night 22:00 06:00`
    SetNight { begin: String, end: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, source) = AppConfig::load(&cli.config)?;
    init_tracing(config.log_level.as_deref())?;

    match source {
        ConfigSource::File => info!("Loaded configuration from {}", cli.config.display()),
        ConfigSource::Environment => info!(
            "{} not found, using defaults and HEARTH_* environment variables",
            cli.config.display()
        ),
    }
    debug!("Worst-case request time: {:?}", worst_case_request_time(&config.stove));

    let client = StoveClient::new(config.stove.clone()).context("Failed to create stove client")?;
    info!("Stove endpoint: {}", client.base_url());

    let coordinator = Arc::new(
        StoveCoordinator::new(
            Arc::new(client),
            config.coordinator.clone(),
            Arc::new(LogNotifier::default()),
            Arc::new(SystemClock),
        )
        .context("Failed to create coordinator")?,
    );

    let registry = CoordinatorRegistry::new();
    registry.insert(device_slug(coordinator.name()), Arc::clone(&coordinator));

    let result = run(cli.command, &coordinator).await;
    registry.shutdown_all().await;

    if let Err(e) = &result {
        error!("{e:#}");
    }
    result
}

fn init_tracing(log_level: Option<&str>) -> Result<()> {
    // An explicit log_level wins over RUST_LOG
    let filter = match log_level {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("Invalid log_level '{directive}'"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;
    Ok(())
}

async fn run(command: Command, coordinator: &Arc<StoveCoordinator>) -> Result<()> {
    let facade = CommandFacade::new(Arc::clone(coordinator));

    match command {
        Command::Watch => watch(coordinator).await,
        Command::Status => {
            coordinator
                .refresh_now()
                .await
                .context("Failed to read the stove")?;
            println!("{}", report::status_json(coordinator)?);
            Ok(())
        }
        Command::SetBurnLevel { level } => {
            let snapshot = facade
                .submit_burn_level(level)
                .await
                .context("Failed to set burn level")?;
            info!(
                "Burn level set, stove now reports level {}",
                snapshot.operational_state.burn_level
            );
            Ok(())
        }
        Command::Start => {
            let snapshot = facade
                .submit_start_combustion()
                .await
                .context("Failed to start combustion")?;
            info!("Start command accepted, phase: {}", snapshot.operational_state.phase);
            Ok(())
        }
        Command::SetNight { begin, end } => {
            let snapshot = facade
                .submit_night_window_str(&begin, &end)
                .await
                .context("Failed to set night window")?;
            info!("Night window now {}", snapshot.schedule.night_window);
            Ok(())
        }
    }
}

async fn watch(coordinator: &Arc<StoveCoordinator>) -> Result<()> {
    info!(
        "Watching '{}' every {}s",
        coordinator.name(),
        coordinator.config().poll_interval_secs
    );

    coordinator
        .refresh_now()
        .await
        .context("Initial stove read failed")?;
    report::log_current(coordinator);

    let poll = coordinator.start_polling();
    let mut report_tick = tokio::time::interval_at(
        tokio::time::Instant::now() + REPORT_INTERVAL,
        REPORT_INTERVAL,
    );

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                info!("Shutting down");
                break;
            }
            _ = report_tick.tick() => report::log_current(coordinator),
        }
    }

    poll.stop().await;
    Ok(())
}
