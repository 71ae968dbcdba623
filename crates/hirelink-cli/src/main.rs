use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use hirelink_core::backend::HttpAvailabilityBackend;
use hirelink_core::models::{SearchCriteria, SearchStatus};
use hirelink_core::search::{SearchConfig, SearchCoordinator};

#[derive(Debug, Parser)]
#[command(
    name = "hirelink",
    about = "Submit a car-hire availability search and stream incoming offers"
)]
struct Cli {
    /// Base URL of the booking middleware, e.g. https://api.example.com
    #[arg(long, env = "HIRELINK_BASE_URL")]
    base_url: String,

    /// Pickup UN/LOCODE, e.g. PKKHI
    #[arg(long)]
    pickup: String,

    /// Dropoff UN/LOCODE, e.g. PKLHE
    #[arg(long)]
    dropoff: String,

    /// Pickup timestamp, RFC 3339, e.g. 2025-11-03T10:00:00Z
    #[arg(long, value_parser = parse_timestamp)]
    pickup_at: DateTime<Utc>,

    /// Dropoff timestamp, RFC 3339
    #[arg(long, value_parser = parse_timestamp)]
    dropoff_at: DateTime<Utc>,

    #[arg(long)]
    driver_age: Option<u8>,

    /// Restrict results to one agreement reference
    #[arg(long)]
    agreement_ref: Option<String>,

    /// Poll cadence in milliseconds when the backend recommends none
    #[arg(long, default_value_t = 1500)]
    poll_interval_ms: u64,

    /// Long-poll wait budget in milliseconds
    #[arg(long, default_value_t = 10_000)]
    wait_ms: u64,

    /// Give up if the search has not finished after this many seconds
    #[arg(long, default_value_t = 120)]
    deadline_secs: u64,
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| format!("invalid RFC 3339 timestamp '{value}': {error}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let backend = HttpAvailabilityBackend::new(&cli.base_url)
        .context("failed to construct availability backend")?;
    let config = SearchConfig {
        poll_interval: Duration::from_millis(cli.poll_interval_ms),
        wait_budget: Duration::from_millis(cli.wait_ms),
        ..SearchConfig::default()
    };
    let coordinator = SearchCoordinator::with_config(Arc::new(backend), config);

    let criteria = SearchCriteria {
        pickup_location: cli.pickup,
        dropoff_location: cli.dropoff,
        pickup_at: Some(cli.pickup_at),
        dropoff_at: Some(cli.dropoff_at),
        driver_age: cli.driver_age,
        agreement_ref: cli.agreement_ref,
    };

    let request = coordinator.submit(&criteria).await?;
    println!("search {} submitted", request.request_id);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(cli.deadline_secs);
    let mut ticker = tokio::time::interval(Duration::from_millis(500));
    let mut printed = 0usize;

    loop {
        ticker.tick().await;

        let offers = coordinator.offers().await;
        for offer in offers.iter().skip(printed) {
            println!(
                "{:<10} {:<20} {:<28} {:>10.2} {} {:?} ({})",
                offer.vehicle_class,
                offer.supplier_name,
                offer.vehicle_make_model,
                offer.total_price,
                offer.currency,
                offer.availability_status,
                offer.supplier_offer_ref,
            );
        }
        printed = offers.len();

        let Some(snapshot) = coordinator.snapshot().await else {
            anyhow::bail!("active search disappeared");
        };

        if snapshot.status.is_terminal() {
            return Ok(match snapshot.status {
                SearchStatus::Complete => {
                    let expected = snapshot
                        .total_expected
                        .map(|total| format!("/{total}"))
                        .unwrap_or_default();
                    println!(
                        "search complete: {printed}{expected} offers, {} source(s) timed out",
                        snapshot.timed_out_sources
                    );
                    ExitCode::SUCCESS
                }
                _ => {
                    let message = coordinator
                        .last_error()
                        .await
                        .unwrap_or_else(|| "unknown poll failure".to_string());
                    eprintln!("search failed: {message}");
                    ExitCode::FAILURE
                }
            });
        }

        if tokio::time::Instant::now() >= deadline {
            coordinator.stop().await;
            eprintln!("search did not finish within {}s", cli.deadline_secs);
            return Ok(ExitCode::FAILURE);
        }
    }
}
