//! Capacitated vehicle routing over geographic delivery stops.
//!
//! Locations become an integer distance matrix, a path-cheapest-arc plan seeds
//! a guided tabu search, and the best plan is walked back into per-vehicle
//! routes.

pub mod advisory;
pub mod config;
pub mod distance;
pub mod domain;
pub mod error;
pub mod evaluation;
pub mod extraction;
pub mod fixtures;
pub mod model;
pub mod optimizer;
pub mod runner;
pub mod solver;
pub mod utils;

pub use advisory::{estimate_travel_time, suggest_vehicle};
pub use config::SolverConfig;
pub use distance::{build_distance_matrix, haversine_km, DistanceMatrix, MatrixCache};
pub use domain::*;
pub use error::{Result, RoutingError};
pub use model::RoutingModel;
pub use optimizer::RouteOptimizer;
pub use solver::{SearchParameters, Solver};
