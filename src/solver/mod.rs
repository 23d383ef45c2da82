pub mod construction;
pub mod plan;
pub mod repair;
pub mod tabu_search;

use std::time::Duration;

use tracing::{info, span, Level};

use crate::config::constant;
use crate::config::SolverConfig;
use crate::domain::SearchStats;
use crate::error::Result;
use crate::model::RoutingModel;
use crate::utils::Deadline;

pub use construction::path_cheapest_arc;
pub use plan::{Assignment, RoutePlan};
pub use tabu_search::tabu_search;

/// Recorded on every result produced by [`Solver`].
pub const ALGORITHM: &str = "path_cheapest_arc+guided_tabu_search";

/// Knobs of the construction and improvement phases.
#[derive(Debug, Clone)]
pub struct SearchParameters {
    pub time_limit: Duration,
    pub max_iterations: usize,
    pub seed: u64,
    /// Tenure is drawn from `lower..upper`.
    pub tenure_bounds: (usize, usize),
    pub guided_penalty_factor: f64,
    pub perturbation_moves: usize,
    /// Overrides the size-based stagnation limit.
    pub max_no_improvement: Option<usize>,
}

impl Default for SearchParameters {
    fn default() -> Self {
        SearchParameters {
            time_limit: Duration::from_secs(constant::DEFAULT_TIME_LIMIT_SECS),
            max_iterations: constant::DEFAULT_MAX_ITERATIONS,
            seed: constant::SEED,
            tenure_bounds: (constant::TABU_TENURE_LOWER, constant::TABU_TENURE_UPPER),
            guided_penalty_factor: constant::GUIDED_PENALTY_FACTOR,
            perturbation_moves: constant::PERTURBATION_MOVES,
            max_no_improvement: None,
        }
    }
}

impl From<&SolverConfig> for SearchParameters {
    fn from(config: &SolverConfig) -> Self {
        SearchParameters {
            time_limit: config.time_limit,
            max_iterations: config.max_iterations,
            seed: config.seed,
            ..SearchParameters::default()
        }
    }
}

/// Solved model: the successor relation plus what the search did to get there.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub assignment: Assignment,
    pub stats: SearchStats,
}

#[derive(Debug, Clone, Default)]
pub struct Solver {
    params: SearchParameters,
}

impl Solver {
    pub fn new(params: SearchParameters) -> Self {
        Solver { params }
    }

    pub fn params(&self) -> &SearchParameters {
        &self.params
    }

    /// Construct a first plan, then improve it until the time budget runs out.
    pub fn solve(&self, model: &RoutingModel) -> Result<SolveOutcome> {
        let solve_span = span!(
            Level::INFO,
            "solve",
            nodes = model.size(),
            vehicles = model.num_vehicles()
        );
        let _solve_guard = solve_span.enter();

        model.check_feasible()?;
        let deadline = Deadline::after(self.params.time_limit);

        let initial = path_cheapest_arc(model, &deadline)?;
        let initial_distance = initial.distance;
        info!("Initial solution distance: {}", initial_distance);

        let report = tabu_search(model, initial, &self.params, &deadline);
        let elapsed = deadline.elapsed();
        info!(
            "Best distance {} (from {}) in {:?}",
            report.best.distance, initial_distance, elapsed
        );

        Ok(SolveOutcome {
            assignment: Assignment::from_plan(&report.best, model),
            stats: SearchStats {
                initial_distance,
                iterations: report.iterations,
                improvements: report.improvements,
                elapsed_ms: elapsed.as_millis(),
            },
        })
    }
}
