use crate::evaluation::route_load;
use crate::model::RoutingModel;
use crate::solver::plan::RoutePlan;

pub type ArcPair = (usize, usize);

/// A neighbourhood move over a [`RoutePlan`]. Positions index the stop sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    /// Reverse `route[from..=to]`.
    TwoOpt { route: usize, from: usize, to: usize },
    /// Take `len` stops starting at `start` out of `from_route` and insert them
    /// at `position` of `to_route` (counted after the removal).
    Relocate {
        from_route: usize,
        start: usize,
        len: usize,
        to_route: usize,
        position: usize,
    },
    /// Swap one stop between two different routes.
    Exchange {
        first_route: usize,
        first_pos: usize,
        second_route: usize,
        second_pos: usize,
    },
    /// Keep the first `first_cut` / `second_cut` stops of each route and swap the tails.
    TailSwap {
        first_route: usize,
        first_cut: usize,
        second_route: usize,
        second_cut: usize,
    },
}

/// Most arcs one move removes or adds.
pub const MAX_CHANGED_ARCS: usize = 4;

/// Arcs a move takes out of the plan and puts into it.
///
/// Unused slots hold the depot self-loop, which costs nothing, is never
/// penalized and is never tabu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArcChange {
    pub removed: [ArcPair; MAX_CHANGED_ARCS],
    pub added: [ArcPair; MAX_CHANGED_ARCS],
}

impl ArcChange {
    pub fn new(depot: usize, removed: &[ArcPair], added: &[ArcPair]) -> Self {
        let mut change = ArcChange {
            removed: [(depot, depot); MAX_CHANGED_ARCS],
            added: [(depot, depot); MAX_CHANGED_ARCS],
        };
        change.removed[..removed.len()].copy_from_slice(removed);
        change.added[..added.len()].copy_from_slice(added);
        change
    }

    /// Distance change in meters: added arcs minus removed arcs.
    pub fn delta(&self, model: &RoutingModel) -> i64 {
        let cost = |arcs: &[ArcPair]| -> i64 {
            arcs.iter().map(|&(a, b)| model.arc_cost(a, b) as i64).sum()
        };
        cost(&self.added) - cost(&self.removed)
    }
}

impl Move {
    pub fn arc_change(&self, plan: &RoutePlan, depot: usize) -> ArcChange {
        let at = |route: usize, position: isize| plan.node_or_depot(route, position, depot);

        match *self {
            Move::TwoOpt { route, from, to } => {
                let (from, to) = (from as isize, to as isize);
                let (before, first, last, after) =
                    (at(route, from - 1), at(route, from), at(route, to), at(route, to + 1));
                ArcChange::new(
                    depot,
                    &[(before, first), (last, after)],
                    &[(before, last), (first, after)],
                )
            }
            Move::Relocate {
                from_route,
                start,
                len,
                to_route,
                position,
            } => {
                let start = start as isize;
                let end = start + len as isize - 1;
                let (before, first, last, after) = (
                    at(from_route, start - 1),
                    at(from_route, start),
                    at(from_route, end),
                    at(from_route, end + 1),
                );

                // Neighbours of the insertion point in the target route once the segment is out.
                let reduced = |p: isize| -> usize {
                    if to_route == from_route && p >= start {
                        at(to_route, p + len as isize)
                    } else {
                        at(to_route, p)
                    }
                };
                let position = position as isize;
                let (x, y) = (reduced(position - 1), reduced(position));

                ArcChange::new(
                    depot,
                    &[(before, first), (last, after), (x, y)],
                    &[(before, after), (x, first), (last, y)],
                )
            }
            Move::Exchange {
                first_route,
                first_pos,
                second_route,
                second_pos,
            } => {
                let (i, j) = (first_pos as isize, second_pos as isize);
                let (pa, u, na) = (
                    at(first_route, i - 1),
                    at(first_route, i),
                    at(first_route, i + 1),
                );
                let (pb, v, nb) = (
                    at(second_route, j - 1),
                    at(second_route, j),
                    at(second_route, j + 1),
                );
                ArcChange::new(
                    depot,
                    &[(pa, u), (u, na), (pb, v), (v, nb)],
                    &[(pa, v), (v, na), (pb, u), (u, nb)],
                )
            }
            Move::TailSwap {
                first_route,
                first_cut,
                second_route,
                second_cut,
            } => {
                let (i, j) = (first_cut as isize, second_cut as isize);
                let (a_head, a_tail) = (at(first_route, i - 1), at(first_route, i));
                let (b_head, b_tail) = (at(second_route, j - 1), at(second_route, j));
                ArcChange::new(
                    depot,
                    &[(a_head, a_tail), (b_head, b_tail)],
                    &[(a_head, b_tail), (b_head, a_tail)],
                )
            }
        }
    }

    /// Apply the move in place, keeping loads and distance current.
    pub fn apply(&self, plan: &mut RoutePlan, delta: i64, model: &RoutingModel) {
        match *self {
            Move::TwoOpt { route, from, to } => {
                plan.routes[route][from..=to].reverse();
            }
            Move::Relocate {
                from_route,
                start,
                len,
                to_route,
                position,
            } => {
                let segment: Vec<usize> =
                    plan.routes[from_route].drain(start..start + len).collect();
                plan.routes[to_route].splice(position..position, segment);
            }
            Move::Exchange {
                first_route,
                first_pos,
                second_route,
                second_pos,
            } => {
                let u = plan.routes[first_route][first_pos];
                plan.routes[first_route][first_pos] = plan.routes[second_route][second_pos];
                plan.routes[second_route][second_pos] = u;
            }
            Move::TailSwap {
                first_route,
                first_cut,
                second_route,
                second_cut,
            } => {
                let a_tail = plan.routes[first_route].split_off(first_cut);
                let b_tail = plan.routes[second_route].split_off(second_cut);
                plan.routes[first_route].extend(b_tail);
                plan.routes[second_route].extend(a_tail);
            }
        }
        plan.distance = (plan.distance as i64 + delta) as u64;

        let (first, second) = self.touched_routes();
        for route in std::iter::once(first).chain(second) {
            plan.loads[route] = route_load(&plan.routes[route], model);
        }
    }

    /// Routes whose load can change under this move.
    pub fn touched_routes(&self) -> (usize, Option<usize>) {
        match *self {
            Move::TwoOpt { route, .. } => (route, None),
            Move::Relocate {
                from_route,
                to_route,
                ..
            } => (from_route, (to_route != from_route).then_some(to_route)),
            Move::Exchange {
                first_route,
                second_route,
                ..
            } => (first_route, Some(second_route)),
            Move::TailSwap {
                first_route,
                second_route,
                ..
            } => (first_route, Some(second_route)),
        }
    }
}
