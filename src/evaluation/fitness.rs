use itertools::Itertools;

use crate::model::RoutingModel;

/// Distance of depot -> stops -> depot in meters. An empty route costs nothing.
pub fn route_distance(route: &[usize], model: &RoutingModel) -> u64 {
    if route.is_empty() {
        return 0;
    }
    let depot = model.depot();
    std::iter::once(depot)
        .chain(route.iter().copied())
        .chain(std::iter::once(depot))
        .tuple_windows()
        .map(|(from, to)| model.arc_cost(from, to))
        .sum()
}

/// Total demand on the route, saturating at `u64::MAX`.
pub fn route_load(route: &[usize], model: &RoutingModel) -> u64 {
    route
        .iter()
        .fold(0u64, |load, &node| load.saturating_add(model.demand(node)))
}

/// Load carried after each prefix of the route; entry `k` covers the first `k` stops.
pub fn prefix_loads(route: &[usize], model: &RoutingModel) -> Vec<u64> {
    let mut prefix = Vec::with_capacity(route.len() + 1);
    prefix.push(0);
    let mut load = 0u64;
    for &node in route {
        load = load.saturating_add(model.demand(node));
        prefix.push(load);
    }
    prefix
}

pub fn total_distance(routes: &[Vec<usize>], model: &RoutingModel) -> u64 {
    routes.iter().map(|r| route_distance(r, model)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::DistanceMatrix;
    use std::sync::Arc;

    fn model() -> RoutingModel {
        let rows = vec![
            vec![0, 4, 6, 9],
            vec![4, 0, 3, 7],
            vec![6, 3, 0, 2],
            vec![9, 7, 2, 0],
        ];
        RoutingModel::new(
            Arc::new(DistanceMatrix::from_rows(rows).unwrap()),
            0,
            2,
            Some(vec![10, 10]),
            Some(vec![0, 1, 2, 3]),
        )
        .unwrap()
    }

    #[test]
    fn distance_includes_depot_legs() {
        let model = model();
        assert_eq!(route_distance(&[1, 2, 3], &model), 4 + 3 + 2 + 9);
        assert_eq!(route_distance(&[2], &model), 12);
        assert_eq!(route_distance(&[], &model), 0);
        assert_eq!(total_distance(&[vec![1], vec![3]], &model), 8 + 18);
    }

    #[test]
    fn loads_accumulate_in_order() {
        let model = model();
        assert_eq!(route_load(&[3, 1], &model), 4);
        assert_eq!(prefix_loads(&[3, 1], &model), vec![0, 3, 4]);
    }

    #[test]
    fn loads_saturate_instead_of_overflowing() {
        let rows = vec![vec![0, 1, 1], vec![1, 0, 1], vec![1, 1, 0]];
        let model = RoutingModel::new(
            Arc::new(DistanceMatrix::from_rows(rows).unwrap()),
            0,
            1,
            Some(vec![u64::MAX]),
            Some(vec![0, u64::MAX - 1, 5]),
        )
        .unwrap();
        assert_eq!(route_load(&[1, 2], &model), u64::MAX);
        assert_eq!(prefix_loads(&[1, 2], &model), vec![0, u64::MAX - 1, u64::MAX]);
    }
}
