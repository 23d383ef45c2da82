use std::sync::Arc;
use std::time::Duration;

use tracing::{info, span, Level};

use crate::config::SolverConfig;
use crate::distance::matrix::print_dist_matrix;
use crate::distance::{build_distance_matrix, DistanceMatrix, MatrixCache};
use crate::domain::{OptimizationRequest, OptimizationResult, Shipment};
use crate::error::Result;
use crate::extraction::extract_routes;
use crate::model::RoutingModel;
use crate::solver::{SearchParameters, Solver, ALGORITHM};

/// Entry point for callers: validates a request, solves it and shapes the result.
#[derive(Debug, Clone, Default)]
pub struct RouteOptimizer {
    config: SolverConfig,
}

impl RouteOptimizer {
    pub fn new(config: SolverConfig) -> Self {
        RouteOptimizer { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn optimize(&self, request: &OptimizationRequest) -> Result<OptimizationResult> {
        request.validate()?;
        let matrix = Arc::new(build_distance_matrix(&request.locations));
        self.solve_with_matrix(request, matrix)
    }

    /// Like [`optimize`](Self::optimize), reusing the cached matrix when the
    /// locations have not changed since the last call.
    pub fn optimize_cached(
        &self,
        request: &OptimizationRequest,
        cache: &mut MatrixCache,
    ) -> Result<OptimizationResult> {
        request.validate()?;
        let matrix = cache.get_or_build(&request.locations);
        self.solve_with_matrix(request, matrix)
    }

    /// Route one shipment's orders out of its pickup warehouse on a single vehicle.
    pub fn optimize_shipment(&self, shipment: &Shipment) -> Result<OptimizationResult> {
        info!(
            "Optimizing shipment from {} with {} deliveries",
            shipment.pickup_warehouse.name,
            shipment.deliveries.len()
        );
        self.optimize(&shipment.to_request())
    }

    fn solve_with_matrix(
        &self,
        request: &OptimizationRequest,
        matrix: Arc<DistanceMatrix>,
    ) -> Result<OptimizationResult> {
        let request_span = span!(
            Level::INFO,
            "optimize",
            locations = request.locations.len(),
            vehicles = request.num_vehicles
        );
        let _request_guard = request_span.enter();
        print_dist_matrix(&matrix);

        let model = RoutingModel::new(
            matrix,
            request.depot_index,
            request.num_vehicles,
            request.vehicle_capacities.clone(),
            request.resolved_demands(),
        )?;

        let mut params = SearchParameters::from(&self.config);
        if let Some(secs) = request.time_limit_secs {
            params.time_limit = Duration::from_secs(secs);
        }

        let outcome = Solver::new(params).solve(&model)?;
        let routes = extract_routes(&model, &request.locations, &outcome.assignment)?;
        let result = OptimizationResult::new(routes, ALGORITHM, outcome.stats);

        info!(
            "Route optimization completed: {} vehicles, {} km",
            result.vehicles_used, result.total_distance_km
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Delivery, Location, Warehouse};
    use crate::error::RoutingError;

    fn quick() -> RouteOptimizer {
        RouteOptimizer::new(SolverConfig {
            time_limit: Duration::from_secs(5),
            max_iterations: 500,
            ..SolverConfig::default()
        })
    }

    #[test]
    fn shipment_orders_keep_their_numbers() {
        let shipment = Shipment {
            pickup_warehouse: Warehouse {
                name: "Tuas Hub".into(),
                latitude: 1.32,
                longitude: 103.65,
            },
            deliveries: vec![
                Delivery {
                    customer: "Jurong".into(),
                    latitude: 1.33,
                    longitude: 103.74,
                    order_number: Some("ORD-1".into()),
                    weight_kg: Some(12.0),
                },
                Delivery {
                    customer: "Clementi".into(),
                    latitude: 1.315,
                    longitude: 103.765,
                    order_number: Some("ORD-2".into()),
                    weight_kg: None,
                },
            ],
        };

        let result = quick().optimize_shipment(&shipment).unwrap();
        assert_eq!(result.routes.len(), 1);
        assert_eq!(result.vehicles_used, 1);
        let mut references: Vec<_> = result.routes[0]
            .stops
            .iter()
            .filter_map(|s| s.reference.clone())
            .collect();
        references.sort();
        assert_eq!(references, vec!["ORD-1", "ORD-2"]);
        assert_eq!(result.algorithm, ALGORITHM);
    }

    #[test]
    fn invalid_request_never_reaches_the_solver() {
        let request = OptimizationRequest::new(
            vec![
                Location::depot(0, "Depot", 1.3, 103.8),
                Location::delivery(1, "Nowhere", 95.0, 103.8),
            ],
            1,
        );
        assert!(matches!(
            quick().optimize(&request),
            Err(RoutingError::Configuration(_))
        ));
    }

    #[test]
    fn cache_survives_repeated_requests() {
        let request = OptimizationRequest::new(
            vec![
                Location::depot(0, "Depot", 1.30, 103.80),
                Location::delivery(1, "A", 1.31, 103.82),
                Location::delivery(2, "B", 1.29, 103.83),
            ],
            1,
        );
        let mut cache = MatrixCache::new();
        let first = quick().optimize_cached(&request, &mut cache).unwrap();
        assert!(!cache.is_empty());
        let second = quick().optimize_cached(&request, &mut cache).unwrap();
        assert_eq!(first.total_distance, second.total_distance);
    }
}
