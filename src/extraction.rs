use tracing::{debug, warn};

use crate::domain::{Location, RouteAssignment, RouteStop};
use crate::error::{config_error, no_solution, Result};
use crate::model::RoutingModel;
use crate::solver::Assignment;
use crate::utils::meters_to_km;

fn route_stop(location: &Location, order: usize, load: u64, distance: u64) -> RouteStop {
    RouteStop {
        index: location.index,
        name: location.name.clone(),
        reference: location.reference.clone(),
        order,
        cumulative_load: load,
        cumulative_distance: distance,
    }
}

/// Walk every vehicle of a solved assignment into its depot-to-depot stop sequence.
///
/// Vehicles that serve nothing still get a route: the depot twice, zero
/// distance and load.
pub fn extract_routes(
    model: &RoutingModel,
    locations: &[Location],
    assignment: &Assignment,
) -> Result<Vec<RouteAssignment>> {
    if locations.len() != model.size() {
        return config_error(format!(
            "{} locations for a {}-node model",
            locations.len(),
            model.size()
        ));
    }

    let depot = model.depot();
    let mut visited = vec![false; model.size()];
    let mut routes = Vec::with_capacity(assignment.num_vehicles());

    for vehicle_id in 0..assignment.num_vehicles() {
        let mut stops = vec![route_stop(&locations[depot], 0, 0, 0)];
        let mut previous = depot;
        let mut distance = 0;
        let mut load: u64 = 0;
        let mut cursor = assignment.first_stop(vehicle_id);

        while let Some(node) = cursor {
            if node >= model.size() || node == depot || visited[node] {
                warn!("Vehicle {} revisits node {}", vehicle_id, node);
                return no_solution(format!(
                    "assignment for vehicle {} revisits or leaves the model at node {}",
                    vehicle_id, node
                ));
            }
            visited[node] = true;
            distance += model.arc_cost(previous, node);
            load = load.saturating_add(model.demand(node));
            stops.push(route_stop(&locations[node], stops.len(), load, distance));
            previous = node;
            cursor = assignment.next_stop(node);
        }

        distance += model.arc_cost(previous, depot);
        stops.push(route_stop(&locations[depot], stops.len(), load, distance));
        debug!(
            "Vehicle {}: {} stops, {} m, load {}",
            vehicle_id,
            stops.len() - 2,
            distance,
            load
        );

        routes.push(RouteAssignment {
            vehicle_id,
            stops,
            distance,
            distance_km: meters_to_km(distance),
            load,
        });
    }

    let missing = model.customers().filter(|&node| !visited[node]).count();
    if missing > 0 {
        return no_solution(format!("{} stops are not assigned to any vehicle", missing));
    }
    Ok(routes)
}
