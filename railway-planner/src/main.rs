use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use railway_planner::planner::{JourneyRequest, Planner, PlannerConfig, SortMode};
use railway_planner::repository::{CacheConfig, CachedLegRepository, MemoryTimetable};

/// Timetable used when `RAILWAY_TIMETABLE` is not set.
const DEFAULT_TIMETABLE: &str = "data/sample_timetable.json";

const USAGE: &str = "usage: railway-planner <from> <to> [max_transfers] [sort_code 1-6]";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn parse_request(args: &[String]) -> Result<JourneyRequest, String> {
    let (from, to) = match args {
        [from, to, ..] => (from.as_str(), to.as_str()),
        _ => return Err(USAGE.to_string()),
    };
    let mut request = JourneyRequest::new(from, to);

    if let Some(max) = args.get(2) {
        let max = max
            .parse()
            .map_err(|_| format!("max_transfers must be a number, got {max:?}"))?;
        request = request.with_max_transfers(max);
    }
    if let Some(code) = args.get(3) {
        let sort = code
            .parse()
            .ok()
            .and_then(SortMode::from_code)
            .ok_or_else(|| format!("sort code must be 1-6, got {code:?}"))?;
        request = request.with_sort(sort);
    }

    Ok(request)
}

async fn run() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let request = parse_request(&args)?;

    let path =
        std::env::var("RAILWAY_TIMETABLE").unwrap_or_else(|_| DEFAULT_TIMETABLE.to_string());
    let timetable = MemoryTimetable::from_json_file(&path)?;
    let (stations, legs) = (timetable.station_count().await, timetable.leg_count().await);
    info!(path = %path, stations, legs, "Timetable ready");

    let repo = CachedLegRepository::new(timetable, &CacheConfig::default());
    let planner = Planner::new(Arc::new(repo), PlannerConfig::default());
    let stats = planner.build_graph().await?;
    info!(
        hubs = stats.hubs,
        nodes = stats.nodes,
        rides = stats.ride_edges,
        waits = stats.wait_edges,
        "Transfer graph ready"
    );

    let itineraries = planner.search(&request).await?;
    println!("{}", serde_json::to_string_pretty(&itineraries)?);

    Ok(())
}
