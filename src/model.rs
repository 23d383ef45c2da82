//! The capacitated vehicle routing problem handed to the solver.
//!
//! Without a capacity dimension the model is a multi-vehicle travelling
//! salesman partition: every vehicle is unbounded and every demand is zero.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::distance::DistanceMatrix;
use crate::error::{config_error, no_solution, Result};

#[derive(Debug, Clone)]
pub struct CapacityDimension {
    capacities: Vec<u64>,
    demands: Vec<u64>,
}

#[derive(Debug, Clone)]
pub struct RoutingModel {
    matrix: Arc<DistanceMatrix>,
    depot: usize,
    num_vehicles: usize,
    capacity: Option<CapacityDimension>,
}

impl RoutingModel {
    /// Build the model. Capacities and demands must be supplied together or not at all.
    pub fn new(
        matrix: Arc<DistanceMatrix>,
        depot: usize,
        num_vehicles: usize,
        vehicle_capacities: Option<Vec<u64>>,
        demands: Option<Vec<u64>>,
    ) -> Result<Self> {
        let n = matrix.size();
        if n == 0 {
            return config_error("distance matrix is empty");
        }
        if num_vehicles == 0 {
            return config_error("vehicle count must be positive");
        }
        if depot >= n {
            return config_error(format!("depot index {} out of range for {} nodes", depot, n));
        }

        let capacity = match (vehicle_capacities, demands) {
            (None, None) => None,
            (Some(_), None) => return config_error("vehicle capacities given without demands"),
            (None, Some(_)) => return config_error("demands given without vehicle capacities"),
            (Some(capacities), Some(demands)) => {
                if capacities.len() != num_vehicles {
                    return config_error(format!(
                        "{} capacities for {} vehicles",
                        capacities.len(),
                        num_vehicles
                    ));
                }
                if demands.len() != n {
                    return config_error(format!(
                        "{} demands for {} locations",
                        demands.len(),
                        n
                    ));
                }
                if demands[depot] != 0 {
                    return config_error(format!(
                        "depot demand must be zero, got {}",
                        demands[depot]
                    ));
                }
                Some(CapacityDimension { capacities, demands })
            }
        };

        debug!(
            "Routing model: {} nodes, {} vehicles, depot {}, capacitated: {}",
            n,
            num_vehicles,
            depot,
            capacity.is_some()
        );

        Ok(RoutingModel {
            matrix,
            depot,
            num_vehicles,
            capacity,
        })
    }

    pub fn size(&self) -> usize {
        self.matrix.size()
    }

    pub fn depot(&self) -> usize {
        self.depot
    }

    pub fn num_vehicles(&self) -> usize {
        self.num_vehicles
    }

    pub fn is_capacitated(&self) -> bool {
        self.capacity.is_some()
    }

    pub fn matrix(&self) -> &DistanceMatrix {
        &self.matrix
    }

    #[inline]
    pub fn arc_cost(&self, from: usize, to: usize) -> u64 {
        self.matrix.get(from, to)
    }

    #[inline]
    pub fn demand(&self, node: usize) -> u64 {
        self.capacity.as_ref().map_or(0, |c| c.demands[node])
    }

    #[inline]
    pub fn capacity(&self, vehicle: usize) -> u64 {
        self.capacity
            .as_ref()
            .map_or(u64::MAX, |c| c.capacities[vehicle])
    }

    /// Every node except the depot.
    pub fn customers(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.size()).filter(move |&node| node != self.depot)
    }

    /// Cheap necessary conditions for a feasible assignment.
    pub fn check_feasible(&self) -> Result<()> {
        let Some(dimension) = &self.capacity else {
            return Ok(());
        };

        // Summed in u128 so even u64::MAX-sized entries cannot overflow.
        let total_demand: u128 = dimension.demands.iter().map(|&d| d as u128).sum();
        let total_capacity: u128 = dimension.capacities.iter().map(|&c| c as u128).sum();
        if total_demand > total_capacity {
            warn!(
                "Total demand {} exceeds fleet capacity {}",
                total_demand, total_capacity
            );
            return no_solution(format!(
                "total demand {} exceeds total fleet capacity {}",
                total_demand, total_capacity
            ));
        }

        let largest = dimension.capacities.iter().copied().max().unwrap_or(0);
        if let Some(node) = self.customers().find(|&node| dimension.demands[node] > largest) {
            warn!("Demand at node {} fits no vehicle", node);
            return no_solution(format!(
                "demand {} at location {} exceeds the largest vehicle capacity {}",
                dimension.demands[node], node, largest
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RoutingError;

    fn line_matrix(n: usize) -> Arc<DistanceMatrix> {
        let rows = (0..n)
            .map(|i| (0..n).map(|j| (i as i64 - j as i64).unsigned_abs() * 10).collect())
            .collect();
        Arc::new(DistanceMatrix::from_rows(rows).unwrap())
    }

    #[test]
    fn uncapacitated_model_has_unbounded_vehicles() {
        let model = RoutingModel::new(line_matrix(4), 0, 2, None, None).unwrap();
        assert!(!model.is_capacitated());
        assert_eq!(model.capacity(1), u64::MAX);
        assert_eq!(model.demand(3), 0);
        assert_eq!(model.arc_cost(1, 3), 20);
        assert_eq!(model.customers().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(model.check_feasible().is_ok());
    }

    #[test]
    fn half_a_capacity_dimension_is_rejected() {
        let only_caps = RoutingModel::new(line_matrix(3), 0, 1, Some(vec![5]), None);
        assert!(matches!(only_caps, Err(RoutingError::Configuration(_))));
        let only_demands = RoutingModel::new(line_matrix(3), 0, 1, None, Some(vec![0, 1, 1]));
        assert!(matches!(only_demands, Err(RoutingError::Configuration(_))));
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let caps = RoutingModel::new(line_matrix(3), 0, 2, Some(vec![5]), Some(vec![0, 1, 1]));
        assert!(matches!(caps, Err(RoutingError::Configuration(_))));
        let demands = RoutingModel::new(line_matrix(3), 0, 1, Some(vec![5]), Some(vec![0, 1]));
        assert!(matches!(demands, Err(RoutingError::Configuration(_))));
        let depot = RoutingModel::new(line_matrix(3), 0, 1, Some(vec![5]), Some(vec![2, 1, 1]));
        assert!(matches!(depot, Err(RoutingError::Configuration(_))));
        let vehicles = RoutingModel::new(line_matrix(3), 0, 0, None, None);
        assert!(matches!(vehicles, Err(RoutingError::Configuration(_))));
    }

    #[test]
    fn detects_excess_total_demand() {
        let model = RoutingModel::new(
            line_matrix(6),
            0,
            1,
            Some(vec![20]),
            Some(vec![0, 10, 10, 10, 10, 10]),
        )
        .unwrap();
        assert!(matches!(
            model.check_feasible(),
            Err(RoutingError::NoSolutionFound(_))
        ));
    }

    #[test]
    fn detects_oversized_single_demand() {
        let model = RoutingModel::new(
            line_matrix(3),
            0,
            2,
            Some(vec![10, 10]),
            Some(vec![0, 11, 1]),
        )
        .unwrap();
        assert!(matches!(
            model.check_feasible(),
            Err(RoutingError::NoSolutionFound(_))
        ));
    }

    #[test]
    fn huge_demands_do_not_overflow_the_totals() {
        let fits = RoutingModel::new(
            line_matrix(3),
            0,
            2,
            Some(vec![u64::MAX, u64::MAX]),
            Some(vec![0, u64::MAX, u64::MAX]),
        )
        .unwrap();
        assert!(fits.check_feasible().is_ok());

        let one_too_many = RoutingModel::new(
            line_matrix(4),
            0,
            2,
            Some(vec![u64::MAX, u64::MAX]),
            Some(vec![0, u64::MAX, u64::MAX, 1]),
        )
        .unwrap();
        assert!(matches!(
            one_too_many.check_feasible(),
            Err(RoutingError::NoSolutionFound(_))
        ));
    }
}
