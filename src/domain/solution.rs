use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::advisory::{estimate_travel_time, TravelTimeEstimate};
use crate::error::Result;
use crate::utils::meters_to_km;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStop {
    pub index: usize,
    pub name: String,
    #[serde(default)]
    pub reference: Option<String>,
    /// Position in the vehicle's visiting order, starting at 0 for the depot.
    pub order: usize,
    /// Load delivered so far, including this stop.
    pub cumulative_load: u64,
    /// Meters travelled from the depot up to this stop.
    pub cumulative_distance: u64,
}

/// One vehicle's tour: depot, stops in visiting order, depot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteAssignment {
    pub vehicle_id: usize,
    pub stops: Vec<RouteStop>,
    pub distance: u64,
    pub distance_km: f64,
    pub load: u64,
}

impl RouteAssignment {
    /// A route visiting anything beyond the depot at both ends.
    pub fn is_used(&self) -> bool {
        self.stops.len() > 2
    }

    pub fn location_indices(&self) -> Vec<usize> {
        self.stops.iter().map(|s| s.index).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    pub initial_distance: u64,
    pub iterations: usize,
    pub improvements: usize,
    pub elapsed_ms: u128,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub routes: Vec<RouteAssignment>,
    pub total_distance: u64,
    pub total_distance_km: f64,
    pub total_load: u64,
    pub vehicles_used: usize,
    pub success: bool,
    pub algorithm: String,
    pub optimized_at: DateTime<Utc>,
    pub stats: SearchStats,
}

impl OptimizationResult {
    pub fn new(routes: Vec<RouteAssignment>, algorithm: &str, stats: SearchStats) -> Self {
        let total_distance = routes.iter().map(|r| r.distance).sum();
        let total_load = routes.iter().map(|r| r.load).sum();
        let vehicles_used = routes.iter().filter(|r| r.is_used()).count();

        OptimizationResult {
            routes,
            total_distance,
            total_distance_km: meters_to_km(total_distance),
            total_load,
            vehicles_used,
            success: true,
            algorithm: algorithm.to_string(),
            optimized_at: Utc::now(),
            stats,
        }
    }

    pub fn used_routes(&self) -> impl Iterator<Item = &RouteAssignment> {
        self.routes.iter().filter(|r| r.is_used())
    }

    /// Per-vehicle travel time for every used route.
    pub fn travel_time_estimates(
        &self,
        average_speed_kmh: Option<f64>,
    ) -> Result<Vec<(usize, TravelTimeEstimate)>> {
        self.used_routes()
            .map(|r| Ok((r.vehicle_id, estimate_travel_time(r.distance_km, average_speed_kmh)?)))
            .collect()
    }
}
