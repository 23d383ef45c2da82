use std::error::Error;
use std::sync::Arc;

use colored::*;
use csv::Writer;
use dotenv::dotenv;
use futures::future::join_all;
use serde::Deserialize;
use tracing::{debug, error, info, span, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::advisory::suggest_vehicle;
use crate::config::constant::{DEMO_LOCATION_COUNT, DEMO_TRUCK_CAPACITIES};
use crate::config::SolverConfig;
use crate::domain::{OptimizationRequest, OptimizationResult};
use crate::error::RoutingError;
use crate::fixtures::data_generator::{generate_random_request, read_locations_from_csv};
use crate::optimizer::RouteOptimizer;

/// Initialize tracing and environment
fn init_tracing_and_env() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_span_events(fmt::format::FmtSpan::CLOSE))
        .try_init()?;

    dotenv().ok();
    Ok(())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RequestFile {
    Many(Vec<OptimizationRequest>),
    One(OptimizationRequest),
}

/// Requests from a JSON file (one request or an array), a location CSV, or a
/// seeded demo instance when no path is given.
fn load_requests(
    path: Option<&str>,
    config: &SolverConfig,
) -> Result<Vec<OptimizationRequest>, Box<dyn Error>> {
    let Some(path) = path else {
        info!(
            "No input given, generating demo instance with {} customers",
            DEMO_LOCATION_COUNT
        );
        return Ok(vec![generate_random_request(DEMO_LOCATION_COUNT, config.seed)]);
    };

    if path.ends_with(".csv") {
        let locations = read_locations_from_csv(path)?;
        let mut request = OptimizationRequest::new(locations, DEMO_TRUCK_CAPACITIES.len());
        if request.resolved_demands().is_some() {
            request = request.with_capacities(DEMO_TRUCK_CAPACITIES.to_vec());
        }
        return Ok(vec![request]);
    }

    let raw = std::fs::read_to_string(path)?;
    let requests = match serde_json::from_str::<RequestFile>(&raw)? {
        RequestFile::Many(requests) => requests,
        RequestFile::One(request) => vec![request],
    };
    info!("Loaded {} requests from {}", requests.len(), path);
    Ok(requests)
}

/// Solve every request on the blocking pool; results keep the input order.
pub async fn solve_all(
    optimizer: Arc<RouteOptimizer>,
    requests: Vec<OptimizationRequest>,
) -> Vec<Result<OptimizationResult, RoutingError>> {
    let handles = requests.into_iter().map(|request| {
        let optimizer = Arc::clone(&optimizer);
        tokio::task::spawn_blocking(move || optimizer.optimize(&request))
    });

    join_all(handles)
        .await
        .into_iter()
        .map(|joined| {
            joined.unwrap_or_else(|e| {
                Err(RoutingError::NoSolutionFound(format!("solver task failed: {}", e)))
            })
        })
        .collect()
}

fn print_result(request_id: usize, result: &OptimizationResult) {
    println!(
        "{} {} | {} | {}",
        format!("Request {}:", request_id).bold(),
        format!("{:.2} km", result.total_distance_km).green(),
        format!("{} vehicles used", result.vehicles_used).cyan(),
        format!(
            "{} iterations, {} improvements, {} ms",
            result.stats.iterations, result.stats.improvements, result.stats.elapsed_ms
        )
        .dimmed()
    );

    let estimates = result.travel_time_estimates(None).unwrap_or_default();
    for route in result.used_routes() {
        let suggestion = suggest_vehicle(route.distance_km, route.load as f64);
        let minutes = estimates
            .iter()
            .find(|(vehicle, _)| *vehicle == route.vehicle_id)
            .map_or(0.0, |(_, estimate)| estimate.estimated_minutes);
        let vehicle_class = suggestion
            .preferred()
            .map_or_else(|| "-".to_string(), |class| class.to_string());

        println!(
            "  vehicle {}: {} km, load {}, ~{} min, suggest {}",
            route.vehicle_id,
            route.distance_km,
            route.load,
            minutes,
            vehicle_class.yellow()
        );
        debug!("  stops: {:?}", route.location_indices());
    }
}

fn save_to_csv(
    results: &[(usize, OptimizationResult)],
    filename: &str,
) -> Result<(), Box<dyn Error>> {
    let mut wtr = Writer::from_path(filename)?;

    wtr.write_record([
        "request",
        "vehicle_id",
        "order",
        "location_index",
        "name",
        "reference",
        "cumulative_load",
        "cumulative_distance_m",
    ])?;

    for (request_id, result) in results {
        for route in result.used_routes() {
            for stop in &route.stops {
                wtr.write_record([
                    request_id.to_string(),
                    route.vehicle_id.to_string(),
                    stop.order.to_string(),
                    stop.index.to_string(),
                    stop.name.clone(),
                    stop.reference.clone().unwrap_or_default(),
                    stop.cumulative_load.to_string(),
                    stop.cumulative_distance.to_string(),
                ])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}

pub async fn run() -> Result<(), Box<dyn Error>> {
    init_tracing_and_env()?;
    let config = SolverConfig::from_env();

    let path = std::env::args().nth(1);
    let requests = {
        let span = span!(Level::INFO, "setup");
        let _guard = span.enter();
        load_requests(path.as_deref(), &config)?
    };

    let output_csv = config.output_csv.clone();
    let optimizer = Arc::new(RouteOptimizer::new(config));
    let outcomes = solve_all(optimizer, requests).await;

    let mut solved = Vec::new();
    for (request_id, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(result) => {
                print_result(request_id, &result);
                solved.push((request_id, result));
            }
            Err(e) => {
                error!("Request {} failed: {}", request_id, e);
                println!(
                    "{} {}",
                    format!("Request {}:", request_id).bold(),
                    e.to_string().red()
                );
            }
        }
    }

    save_to_csv(&solved, &output_csv)?;
    info!("Wrote {} solved requests to {}", solved.len(), output_csv);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Location;
    use std::time::Duration;

    fn quick_optimizer() -> Arc<RouteOptimizer> {
        Arc::new(RouteOptimizer::new(SolverConfig {
            time_limit: Duration::from_secs(5),
            max_iterations: 200,
            ..SolverConfig::default()
        }))
    }

    #[tokio::test]
    async fn batch_keeps_input_order_and_isolates_failures() {
        let good = generate_random_request(8, 3);
        let bad =
            OptimizationRequest::new(vec![Location::delivery(0, "Lonely", 1.3, 103.8)], 1);
        let outcomes = solve_all(quick_optimizer(), vec![good, bad]).await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].is_ok());
        assert!(matches!(outcomes[1], Err(RoutingError::Configuration(_))));
    }

    #[test]
    fn request_file_accepts_one_or_many() {
        let one = serde_json::to_string(&generate_random_request(3, 1)).unwrap();
        let many = format!("[{},{}]", one, one);
        assert!(matches!(
            serde_json::from_str::<RequestFile>(&one).unwrap(),
            RequestFile::One(_)
        ));
        assert!(matches!(
            serde_json::from_str::<RequestFile>(&many).unwrap(),
            RequestFile::Many(v) if v.len() == 2
        ));
    }

    #[test]
    fn csv_rows_cover_every_stop() {
        let optimizer = quick_optimizer();
        let result = optimizer.optimize(&generate_random_request(6, 2)).unwrap();
        let path = std::env::temp_dir().join("delivery_router_routes.csv");
        save_to_csv(&[(0, result.clone())], path.to_str().unwrap()).unwrap();

        let rows = csv::Reader::from_path(&path).unwrap().records().count();
        let expected: usize = result.used_routes().map(|r| r.stops.len()).sum();
        assert_eq!(rows, expected);
    }
}
