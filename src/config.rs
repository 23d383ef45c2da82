use std::env;
use std::time::Duration;

use dotenv::dotenv;
use tracing::{info, warn};

pub mod constant {
    pub(crate) const DEFAULT_TIME_LIMIT_SECS: u64 = 30;
    pub(crate) const DEFAULT_MAX_ITERATIONS: usize = 20_000;
    pub(crate) const DEFAULT_AVERAGE_SPEED_KMH: f64 = 50.0;
    pub(crate) const EARTH_RADIUS_KM: f64 = 6371.0;
    pub(crate) const SEED: u64 = 64;

    // Tabu tenure is re-drawn from this range every TENURE_REDRAW_PERIOD iterations.
    pub(crate) const TABU_TENURE_LOWER: usize = 11;
    pub(crate) const TABU_TENURE_UPPER: usize = 29;
    pub(crate) const TENURE_REDRAW_PERIOD: usize = 20;

    pub(crate) const MAX_SEGMENT_LEN: usize = 3;
    pub(crate) const GUIDED_PENALTY_FACTOR: f64 = 0.1;
    pub(crate) const PERTURBATION_MOVES: usize = 3;

    // Matrices at least this wide are built with rayon.
    pub(crate) const PARALLEL_MATRIX_THRESHOLD: usize = 64;

    pub(crate) const DEMO_LOCATION_COUNT: usize = 40;
    pub(crate) const DEMO_TRUCK_CAPACITIES: [u64; 3] = [120, 120, 80];
    pub(crate) const OUTPUT_CSV_PATH: &str = "optimized_routes.csv";
}

/// Solver-wide settings. Request-level overrides (time limit) win over these.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub time_limit: Duration,
    pub max_iterations: usize,
    pub seed: u64,
    pub output_csv: String,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            time_limit: Duration::from_secs(constant::DEFAULT_TIME_LIMIT_SECS),
            max_iterations: constant::DEFAULT_MAX_ITERATIONS,
            seed: constant::SEED,
            output_csv: constant::OUTPUT_CSV_PATH.to_string(),
        }
    }
}

impl SolverConfig {
    /// Load settings from the environment (and `.env` if present), falling back to defaults.
    pub fn from_env() -> Self {
        dotenv().ok();
        let mut config = SolverConfig::default();

        if let Some(secs) = read_var::<u64>("VRP_TIME_LIMIT_SECS") {
            config.time_limit = Duration::from_secs(secs);
        }
        if let Some(iterations) = read_var::<usize>("VRP_MAX_ITERATIONS") {
            config.max_iterations = iterations;
        }
        if let Some(seed) = read_var::<u64>("VRP_SEED") {
            config.seed = seed;
        }
        if let Ok(path) = env::var("VRP_OUTPUT_CSV") {
            config.output_csv = path;
        }

        info!(
            "Solver config: time limit {:?}, max iterations {}, seed {}",
            config.time_limit, config.max_iterations, config.seed
        );
        config
    }
}

fn read_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}: cannot parse '{}'", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let config = SolverConfig::default();
        assert_eq!(config.time_limit, Duration::from_secs(30));
        assert_eq!(config.seed, constant::SEED);
        assert!(constant::TABU_TENURE_LOWER < constant::TABU_TENURE_UPPER);
    }

    #[test]
    fn unparsable_variables_are_ignored() {
        env::set_var("VRP_TEST_UNPARSABLE", "soon");
        assert_eq!(read_var::<u64>("VRP_TEST_UNPARSABLE"), None);
        env::set_var("VRP_TEST_PARSABLE", " 12 ");
        assert_eq!(read_var::<u64>("VRP_TEST_PARSABLE"), Some(12));
    }
}
