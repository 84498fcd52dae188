//! Scripted scenario runner and advisory monitor.
//!
//! Usage:
//!   cargo run -p railguard-cli --bin railguard-sim -- scenario animal-on-track
//!   cargo run -p railguard-cli --bin railguard-sim -- monitor TRAIN-SIM-01

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::time::Duration;
use tokio::time;

use railguard_cli::sim::{
    animal_on_track_scenario, clear_section_scenario, Scenario, TrackPath,
};
use railguard_core::Coordinate;
use railguard_sdk::{Backoff, RailguardClient};

/// Default camera position for scenarios (New Delhi area).
const CAMERA_LON: f64 = 77.210;
const CAMERA_LAT: f64 = 28.6140;

#[derive(Parser, Debug)]
#[command(author, version, about = "Railguard scenario simulator and monitor")]
struct Cli {
    /// Railguard server URL
    #[arg(long, default_value = "http://localhost:4000")]
    url: String,

    /// Operator token for mutating endpoints
    #[arg(long, default_value = "dev-operator-token")]
    token: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scripted scenario against a live server.
    Scenario {
        /// Scenario name: animal-on-track | clear-section
        name: String,

        /// Seconds of simulated movement per posted position
        #[arg(long, default_value_t = 10.0)]
        step_secs: f64,

        /// Wall-clock delay between steps
        #[arg(long, default_value_t = 1.0)]
        delay_secs: f64,
    },
    /// Poll the advisory for one train and print changes.
    Monitor {
        train_id: String,

        /// Poll interval in seconds
        #[arg(long, default_value_t = 5)]
        interval_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let client = RailguardClient::new(cli.url).with_operator_token(cli.token);

    match cli.command {
        Command::Scenario {
            name,
            step_secs,
            delay_secs,
        } => run_scenario(&client, &name, step_secs, delay_secs).await,
        Command::Monitor {
            train_id,
            interval_secs,
        } => run_monitor(&client, &train_id, interval_secs).await,
    }
}

async fn run_scenario(
    client: &RailguardClient,
    name: &str,
    step_secs: f64,
    delay_secs: f64,
) -> Result<()> {
    let camera = Coordinate::new(CAMERA_LON, CAMERA_LAT);
    let scenario = match name {
        "animal-on-track" => animal_on_track_scenario(camera),
        "clear-section" => clear_section_scenario(camera),
        other => bail!("unknown scenario: {other}"),
    };

    println!("== scenario: {} ==", scenario.name);
    setup_scenario(client, &scenario).await?;

    let mut t = 0.0;
    loop {
        let position = scenario.track.position_at(t);
        let speed = scenario.track.speed_kmh_at(t);
        client
            .send_position(&scenario.train_id, position, speed)
            .await?;

        match client.fetch_advisory(&scenario.train_id).await {
            Ok(advisory) => {
                println!(
                    "t={t:>6.0}s  pos=({:.4}, {:.4})  target={} advised={} phase={} band={}",
                    position.lon,
                    position.lat,
                    advisory["target_speed_kmh"],
                    advisory["advised_speed_kmh"],
                    advisory["phase"],
                    advisory["speed_band"],
                );
            }
            // First advisory appears after the server's next tick.
            Err(err) => println!("t={t:>6.0}s  no advisory yet ({err})"),
        }

        if scenario.track.is_complete(t) {
            break;
        }
        t += step_secs;
        time::sleep(Duration::from_secs_f64(delay_secs)).await;
    }

    println!("== scenario complete ==");
    Ok(())
}

async fn setup_scenario(client: &RailguardClient, scenario: &Scenario) -> Result<()> {
    client
        .register_camera(
            &scenario.camera_id,
            scenario.camera_location,
            &scenario.railway_section,
        )
        .await?;

    let start = scenario.track.position_at(0.0);
    client
        .register_train(
            &scenario.train_id,
            &scenario.train_name,
            start,
            scenario.track.speed_kmh_at(0.0),
            Some(scenario.max_speed_kmh),
        )
        .await?;

    if let Some((severity, category)) = scenario.alert {
        let alert = client
            .raise_alert(&scenario.camera_id, severity, category, None)
            .await?;
        println!("raised {severity:?}/{category:?} alert {}", alert.id);
    }
    Ok(())
}

async fn run_monitor(client: &RailguardClient, train_id: &str, interval_secs: u64) -> Result<()> {
    let mut ticker = time::interval(Duration::from_secs(interval_secs.max(1)));
    let mut backoff = Backoff::new(Duration::from_secs(1), Duration::from_secs(60));
    let mut last_known: Option<serde_json::Value> = None;

    loop {
        ticker.tick().await;
        if !backoff.ready() {
            continue;
        }

        match client.fetch_advisory(train_id).await {
            Ok(advisory) => {
                backoff.on_success();
                if last_known.as_ref() != Some(&advisory) {
                    println!(
                        "{}  target={} advised={} phase={} band={} alerts={}",
                        advisory["evaluated_at"],
                        advisory["target_speed_kmh"],
                        advisory["advised_speed_kmh"],
                        advisory["phase"],
                        advisory["speed_band"],
                        advisory["alert_ids"],
                    );
                    last_known = Some(advisory);
                }
            }
            Err(err) => {
                // Keep the last known advisory; just widen the poll gap.
                let delay = backoff.on_failure();
                tracing::warn!(
                    failures = backoff.consecutive_failures(),
                    "advisory fetch failed, retrying in {delay:?}: {err}"
                );
            }
        }
    }
}
