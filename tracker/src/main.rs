use anyhow::Context;
use clap::Parser;
use spotcore::feed_interface::QueryInputs;
use spotcore::math::GeoPoint;
use spotcore::processing::ControllerSnapshot;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use workflow::config::TrackerConfig;
use workflow::runner::{Runner, StartupInputs};

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Live flight spotting tracker")]
struct Args {
    /// Load tracker settings from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Observer latitude in degrees
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    lat: Option<f64>,
    /// Observer longitude in degrees
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    lon: Option<f64>,
    /// Initial compass heading in degrees
    #[arg(long)]
    heading: Option<f64>,
    /// Track a single flight number
    #[arg(long)]
    flight: Option<String>,
    #[arg(long, requires = "destination")]
    origin: Option<String>,
    #[arg(long, requires = "origin")]
    destination: Option<String>,
    #[arg(long)]
    radius_km: Option<f64>,
    #[arg(long)]
    interval_secs: Option<u64>,
    /// Use the synthetic feed instead of the live API
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Fetch once, print the result and exit
    #[arg(long, default_value_t = false)]
    once: bool,
    /// Expose the HTTP bridge while polling
    #[arg(long, default_value_t = false)]
    serve: bool,
    /// Seed for the synthetic feed
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn startup_inputs(&self, config: &TrackerConfig) -> anyhow::Result<StartupInputs> {
        let location = match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => {
                Some(GeoPoint::try_new(lat, lon).context("parsing --lat/--lon")?)
            }
            _ => None,
        };
        Ok(StartupInputs {
            location,
            heading: self.heading,
            query: QueryInputs {
                ident: self.flight.clone(),
                origin: self.origin.clone(),
                destination: self.destination.clone(),
                radius_km: Some(config.radius_km),
            },
        })
    }
}

fn print_summary(snapshot: &ControllerSnapshot) {
    println!(
        "{} -> {} flights",
        snapshot.query.as_deref().unwrap_or("-"),
        snapshot.flights.len()
    );
    for flight in &snapshot.flights {
        println!(
            "  {:<10} {:<4} {:>4} -> {:<4} eta {:<25} ({:.4}, {:.4}) track {:.0}",
            flight.label(),
            flight.airline,
            flight.origin,
            flight.destination,
            flight.arrival_time,
            flight.lat,
            flight.lon,
            flight.track
        );
    }
    match (&snapshot.flight_in_view, snapshot.in_view_distance_km) {
        (Some(flight), Some(distance)) => {
            println!("In view: {} at {:.1} km", flight.label(), distance)
        }
        _ => println!("In view: none"),
    }
    if let Some(error) = &snapshot.last_error {
        println!("Last error: {}", error);
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = if let Some(path) = &args.config {
        TrackerConfig::load(path)?
    } else {
        TrackerConfig::default()
    }
    .with_overrides(args.radius_km, args.interval_secs);
    if let Some(seed) = args.seed {
        config.generator.seed = seed;
    }

    let startup = args.startup_inputs(&config)?;
    let runner = Runner::new(config);
    let feed = runner.build_feed(args.offline)?;

    let runtime = TokioBuilder::new_current_thread()
        .enable_all()
        .build()
        .context("creating tokio runtime")?;

    runtime.block_on(async {
        if args.once {
            let snapshot = runner.execute_once(feed, startup).await?;
            print_summary(&snapshot);
        } else {
            if args.serve {
                println!(
                    "HTTP bridge on http://{} (Ctrl+C to stop)...",
                    runner.config().bind_address
                );
            }
            let last = runner.run(feed, startup, args.serve).await?;
            print_summary(&last);
        }
        Ok::<(), anyhow::Error>(())
    })
}
