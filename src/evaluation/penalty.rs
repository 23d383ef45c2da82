//! Guided local search penalties.
//!
//! Each arc carries a counter. Move selection adds `lambda * counter` to an
//! arc's cost, so arcs that keep showing up in local minima get steadily more
//! expensive until the search routes around them.

use tracing::trace;

use crate::model::RoutingModel;
use crate::utils::normalize_arc;

#[derive(Debug, Clone)]
pub struct GuidedPenalties {
    size: usize,
    counts: Vec<u32>,
    lambda: i64,
}

impl GuidedPenalties {
    pub fn new(size: usize) -> Self {
        GuidedPenalties {
            size,
            counts: vec![0; size * size],
            lambda: 0,
        }
    }

    #[inline]
    pub fn count(&self, from: usize, to: usize) -> u32 {
        let (a, b) = normalize_arc(from, to);
        self.counts[a * self.size + b]
    }

    pub fn lambda(&self) -> i64 {
        self.lambda
    }

    /// Set the penalty weight once, from the first local minimum's cost per arc.
    pub fn calibrate(&mut self, distance: u64, arc_count: usize, factor: f64) {
        if self.lambda > 0 || arc_count == 0 {
            return;
        }
        self.lambda = ((factor * distance as f64 / arc_count as f64).round() as i64).max(1);
    }

    /// Weighted penalty of a set of arcs.
    pub fn weight<'a>(&self, arcs: impl IntoIterator<Item = &'a (usize, usize)>) -> i64 {
        if self.lambda == 0 {
            return 0;
        }
        let total: i64 = arcs
            .into_iter()
            .map(|&(from, to)| self.count(from, to) as i64)
            .sum();
        total * self.lambda
    }

    /// Penalize the arcs of maximal utility `cost / (1 + count)` among `arcs`.
    pub fn penalize_max_utility(&mut self, arcs: &[(usize, usize)], model: &RoutingModel) {
        let utility = |&(from, to): &(usize, usize)| {
            model.arc_cost(from, to) as f64 / (1.0 + self.count(from, to) as f64)
        };
        let Some(max_utility) = arcs.iter().map(utility).reduce(f64::max) else {
            return;
        };
        if max_utility <= 0.0 {
            return;
        }

        let chosen: Vec<(usize, usize)> = arcs
            .iter()
            .filter(|arc| utility(arc) >= max_utility)
            .map(|&(from, to)| normalize_arc(from, to))
            .collect();
        for (a, b) in chosen {
            trace!("Penalizing arc ({}, {})", a, b);
            self.counts[a * self.size + b] += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::DistanceMatrix;
    use std::sync::Arc;

    fn model() -> RoutingModel {
        let rows = vec![vec![0, 4, 8], vec![4, 0, 5], vec![8, 5, 0]];
        let matrix = Arc::new(DistanceMatrix::from_rows(rows).unwrap());
        RoutingModel::new(matrix, 0, 1, None, None).unwrap()
    }

    #[test]
    fn weight_is_zero_before_calibration() {
        let mut penalties = GuidedPenalties::new(3);
        penalties.penalize_max_utility(&[(0, 1), (1, 2), (2, 0)], &model());
        assert_eq!(penalties.weight(&[(0, 2)]), 0);
    }

    #[test]
    fn longest_arc_is_penalized_first() {
        let model = model();
        let mut penalties = GuidedPenalties::new(3);
        penalties.calibrate(17, 3, 0.5);
        assert_eq!(penalties.lambda(), 3);

        let tour = [(0, 1), (1, 2), (2, 0)];
        penalties.penalize_max_utility(&tour, &model);
        assert_eq!(penalties.count(0, 2), 1);
        assert_eq!(penalties.count(2, 0), 1);
        assert_eq!(penalties.count(0, 1), 0);
        assert_eq!(penalties.weight(&[(2, 0), (1, 2)]), 3);

        // Utility of (0, 2) drops to 4.0, so (1, 2) at 5.0 is next.
        penalties.penalize_max_utility(&tour, &model);
        assert_eq!(penalties.count(1, 2), 1);
        assert_eq!(penalties.count(0, 2), 1);
    }

    #[test]
    fn calibration_happens_once() {
        let mut penalties = GuidedPenalties::new(2);
        penalties.calibrate(1000, 10, 0.1);
        penalties.calibrate(5, 10, 0.1);
        assert_eq!(penalties.lambda(), 10);
    }
}
