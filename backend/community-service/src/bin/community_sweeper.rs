//! Cron / CLI entry point for the scheduled-post sweep
//!
//! Usage:
//!   community-sweeper run-once   promote due posts now and exit
//!   community-sweeper loop       sweep every SWEEPER_INTERVAL_SECS until stopped

use community_service::jobs::{run_sweep_cycle, start_sweeper, SweepReport};
use community_service::{CommunityHub, Config};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,community_service=debug,sqlx=warn".into());

    let json = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn usage() -> ! {
    eprintln!("Usage:");
    eprintln!("  community-sweeper run-once");
    eprintln!("  community-sweeper loop");
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let cmd = match args.get(1) {
        Some(cmd) if args.len() == 2 => cmd.as_str(),
        _ => usage(),
    };

    let config = Config::from_env()?;
    tracing::info!(env = %config.app.env, command = cmd, "Starting community-sweeper");

    let hub = Arc::new(CommunityHub::connect(&config).await?);
    let interval = Duration::from_secs(config.sweeper.interval_secs);

    match cmd {
        "run-once" => match run_sweep_cycle(&hub, interval, true).await? {
            SweepReport::Ran { promoted } => println!("Promoted {} scheduled posts", promoted),
            SweepReport::Skipped { last_run_at } => {
                println!("Skipped, last run at {}", last_run_at)
            }
        },
        "loop" => {
            tokio::select! {
                _ = start_sweeper(hub.clone(), interval) => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received, stopping sweeper");
                }
            }
        }
        _ => usage(),
    }

    Ok(())
}
