use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tracing::debug;

use crate::model::RoutingModel;
use crate::solver::plan::RoutePlan;

/// Cheapest feasible insertion point for `node` over every route, as (route, position, cost).
///
/// Rounded meters need not satisfy the triangle inequality, so the cost can be negative.
pub fn cheapest_insertion(
    plan: &RoutePlan,
    node: usize,
    model: &RoutingModel,
) -> Option<(usize, usize, i64)> {
    let depot = model.depot();
    let demand = model.demand(node);
    let arc = |from: usize, to: usize| model.arc_cost(from, to) as i64;
    let mut best: Option<(usize, usize, i64)> = None;

    for route in 0..plan.routes.len() {
        if !plan.fits(route, demand, model) {
            continue;
        }
        for position in 0..=plan.routes[route].len() {
            let before = plan.node_or_depot(route, position as isize - 1, depot);
            let after = plan.node_or_depot(route, position as isize, depot);
            let cost = arc(before, node) + arc(node, after) - arc(before, after);
            if best.map_or(true, |(_, _, best_cost)| cost < best_cost) {
                best = Some((route, position, cost));
            }
        }
    }
    best
}

/// Insert unrouted stops at their cheapest feasible position, largest demand first.
/// Returns the stops that fit nowhere.
pub fn reinsert_unrouted(
    plan: &mut RoutePlan,
    unrouted: impl IntoIterator<Item = usize>,
    model: &RoutingModel,
) -> Vec<usize> {
    // Max-heap on demand; ties go to the lower index.
    let mut heap: BinaryHeap<(u64, Reverse<usize>)> = unrouted
        .into_iter()
        .map(|node| (model.demand(node), Reverse(node)))
        .collect();
    let mut leftover = Vec::new();

    while let Some((_, Reverse(node))) = heap.pop() {
        match cheapest_insertion(plan, node, model) {
            Some((route, position, _)) => plan.insert(route, position, node, model),
            None => leftover.push(node),
        }
    }

    if !leftover.is_empty() {
        debug!("Repair could not place {} stops", leftover.len());
    }
    leftover
}
