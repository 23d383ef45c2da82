use crate::evaluation::{route_load, total_distance};
use crate::model::RoutingModel;

/// Working solution: one stop sequence per vehicle, depot implied at both ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePlan {
    pub routes: Vec<Vec<usize>>,
    pub loads: Vec<u64>,
    pub distance: u64,
}

impl RoutePlan {
    pub fn empty(model: &RoutingModel) -> Self {
        RoutePlan {
            routes: vec![Vec::new(); model.num_vehicles()],
            loads: vec![0; model.num_vehicles()],
            distance: 0,
        }
    }

    pub fn from_routes(routes: Vec<Vec<usize>>, model: &RoutingModel) -> Self {
        let mut plan = RoutePlan {
            loads: vec![0; routes.len()],
            routes,
            distance: 0,
        };
        plan.refresh(model);
        plan
    }

    /// Recompute loads and distance from the stop sequences.
    pub fn refresh(&mut self, model: &RoutingModel) {
        self.loads = self.routes.iter().map(|r| route_load(r, model)).collect();
        self.distance = total_distance(&self.routes, model);
    }

    /// Node at `position` of `route`, or the depot past either end.
    #[inline]
    pub fn node_or_depot(&self, route: usize, position: isize, depot: usize) -> usize {
        if position < 0 {
            return depot;
        }
        self.routes[route]
            .get(position as usize)
            .copied()
            .unwrap_or(depot)
    }

    pub fn stop_count(&self) -> usize {
        self.routes.iter().map(Vec::len).sum()
    }

    /// Every arc travelled by a non-empty route, depot legs included.
    pub fn arcs(&self, depot: usize) -> Vec<(usize, usize)> {
        let mut arcs = Vec::with_capacity(self.stop_count() + self.routes.len());
        for route in self.routes.iter().filter(|r| !r.is_empty()) {
            let mut from = depot;
            for &to in route {
                arcs.push((from, to));
                from = to;
            }
            arcs.push((from, depot));
        }
        arcs
    }

    pub fn fits(&self, route: usize, extra_load: u64, model: &RoutingModel) -> bool {
        self.loads[route].saturating_add(extra_load) <= model.capacity(route)
    }

    pub fn insert(&mut self, route: usize, position: usize, node: usize, model: &RoutingModel) {
        let before = self.node_or_depot(route, position as isize - 1, model.depot());
        let after = self.node_or_depot(route, position as isize, model.depot());
        self.distance = self.distance + model.arc_cost(before, node) + model.arc_cost(node, after)
            - model.arc_cost(before, after);
        self.loads[route] = self.loads[route].saturating_add(model.demand(node));
        self.routes[route].insert(position, node);
    }

    pub fn remove(&mut self, route: usize, position: usize, model: &RoutingModel) -> usize {
        let before = self.node_or_depot(route, position as isize - 1, model.depot());
        let after = self.node_or_depot(route, position as isize + 1, model.depot());
        let node = self.routes[route].remove(position);
        self.distance = self.distance + model.arc_cost(before, after)
            - model.arc_cost(before, node)
            - model.arc_cost(node, after);
        self.loads[route] -= model.demand(node);
        node
    }
}

/// Solved assignment as a successor relation, the shape the route walker consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    depot: usize,
    first: Vec<Option<usize>>,
    next: Vec<Option<usize>>,
}

impl Assignment {
    /// `first[v]` is vehicle v's first stop; `next[node]` is the stop after `node`,
    /// `None` meaning back to the depot.
    pub fn from_parts(depot: usize, first: Vec<Option<usize>>, next: Vec<Option<usize>>) -> Self {
        Assignment { depot, first, next }
    }

    pub fn from_plan(plan: &RoutePlan, model: &RoutingModel) -> Self {
        let mut next = vec![None; model.size()];
        let mut first = Vec::with_capacity(plan.routes.len());
        for route in &plan.routes {
            first.push(route.first().copied());
            for pair in route.windows(2) {
                next[pair[0]] = Some(pair[1]);
            }
        }
        Assignment {
            depot: model.depot(),
            first,
            next,
        }
    }

    pub fn depot(&self) -> usize {
        self.depot
    }

    pub fn num_vehicles(&self) -> usize {
        self.first.len()
    }

    pub fn first_stop(&self, vehicle: usize) -> Option<usize> {
        self.first.get(vehicle).copied().flatten()
    }

    pub fn next_stop(&self, node: usize) -> Option<usize> {
        self.next.get(node).copied().flatten()
    }
}
