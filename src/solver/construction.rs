use tracing::{debug, info, warn};

use crate::error::{no_solution, Result};
use crate::model::RoutingModel;
use crate::solver::plan::RoutePlan;
use crate::solver::repair::reinsert_unrouted;
use crate::utils::Deadline;

/// Path-cheapest-arc construction.
///
/// Vehicles are filled one after another: each starts at the depot and keeps
/// extending its tail with the unrouted stop of cheapest arc that still fits.
/// Stops nobody picked up are then placed by cheapest feasible insertion; if
/// even that fails the plan is rebuilt with the largest demands placed first.
pub fn path_cheapest_arc(model: &RoutingModel, deadline: &Deadline) -> Result<RoutePlan> {
    let mut plan = RoutePlan::empty(model);
    let mut routed = vec![false; model.size()];
    routed[model.depot()] = true;
    let mut remaining = model.size() - 1;

    for vehicle in 0..model.num_vehicles() {
        let mut tail = model.depot();
        while remaining > 0 {
            if deadline.expired() {
                warn!("Time budget expired with {} stops unrouted", remaining);
                return no_solution(format!(
                    "time budget expired during construction with {} stops unrouted",
                    remaining
                ));
            }

            let next = model
                .customers()
                .filter(|&node| !routed[node] && plan.fits(vehicle, model.demand(node), model))
                .min_by_key(|&node| (model.arc_cost(tail, node), node));

            let Some(node) = next else { break };
            let position = plan.routes[vehicle].len();
            plan.insert(vehicle, position, node, model);
            routed[node] = true;
            tail = node;
            remaining -= 1;
        }
        debug!(
            "Vehicle {} takes {} stops, load {}",
            vehicle,
            plan.routes[vehicle].len(),
            plan.loads[vehicle]
        );
    }

    if remaining > 0 {
        let unrouted: Vec<usize> = model.customers().filter(|&node| !routed[node]).collect();
        info!("Repairing {} stops left over by construction", unrouted.len());
        if !reinsert_unrouted(&mut plan, unrouted, model).is_empty() {
            return largest_demand_first(model);
        }
    }

    Ok(plan)
}

/// Rebuild from scratch by cheapest insertion, placing the largest demands first.
fn largest_demand_first(model: &RoutingModel) -> Result<RoutePlan> {
    info!("Greedy construction stuck, rebuilding by largest demand first");
    let mut plan = RoutePlan::empty(model);
    let leftover = reinsert_unrouted(&mut plan, model.customers(), model);
    if !leftover.is_empty() {
        warn!("Construction failed to place stops {:?}", leftover);
        return no_solution(format!(
            "no vehicle has room for {} remaining stops",
            leftover.len()
        ));
    }
    Ok(plan)
}
