use rayon::prelude::*;

use super::moves::Move;
use crate::config::constant::MAX_SEGMENT_LEN;
use crate::evaluation::{prefix_loads, GuidedPenalties};
use crate::model::RoutingModel;
use crate::solver::plan::RoutePlan;
use crate::utils::Deadline;

/// Moves scored between two deadline checks.
const SCORING_CHUNK: usize = 4096;

#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub mv: Move,
    /// Change in travelled distance.
    pub delta: i64,
    /// Distance change plus the guided penalty change; candidates are ranked by this.
    pub guided_delta: i64,
}

/// Generate every capacity-feasible move and score it, best first.
///
/// Ties keep enumeration order, so the ranking is reproducible run to run.
/// Returns `None` once the deadline passes, leaving the plan untouched.
pub fn find_neighbours(
    plan: &RoutePlan,
    model: &RoutingModel,
    penalties: &GuidedPenalties,
    deadline: &Deadline,
) -> Option<Vec<Candidate>> {
    let moves = enumerate_moves(plan, model, deadline)?;
    let depot = model.depot();

    let mut candidates: Vec<Candidate> = Vec::with_capacity(moves.len());
    for chunk in moves.chunks(SCORING_CHUNK) {
        if deadline.expired() {
            return None;
        }
        candidates.par_extend(chunk.par_iter().map(|&mv| {
            let change = mv.arc_change(plan, depot);
            let delta = change.delta(model);
            let guided_delta =
                delta + penalties.weight(&change.added) - penalties.weight(&change.removed);
            Candidate {
                mv,
                delta,
                guided_delta,
            }
        }));
    }

    candidates.par_sort_by_key(|c| c.guided_delta);
    Some(candidates)
}

pub fn enumerate_moves(
    plan: &RoutePlan,
    model: &RoutingModel,
    deadline: &Deadline,
) -> Option<Vec<Move>> {
    let routes = &plan.routes;
    let vehicles = routes.len();
    let prefix: Vec<Vec<u64>> = routes.iter().map(|r| prefix_loads(r, model)).collect();
    let mut moves = Vec::new();

    // 2-opt inside one route. Reversing the whole route changes nothing.
    for (route, stops) in routes.iter().enumerate() {
        let len = stops.len();
        for from in 0..len {
            for to in (from + 1)..len {
                if from == 0 && to == len - 1 {
                    continue;
                }
                moves.push(Move::TwoOpt { route, from, to });
            }
        }
    }

    // Relocate / or-opt of short segments, within and across routes.
    for from_route in 0..vehicles {
        if deadline.expired() {
            return None;
        }
        let from_len = routes[from_route].len();
        for len in 1..=MAX_SEGMENT_LEN.min(from_len) {
            for start in 0..=(from_len - len) {
                let segment_load = prefix[from_route][start + len] - prefix[from_route][start];
                for to_route in 0..vehicles {
                    if to_route == from_route {
                        for position in 0..=(from_len - len) {
                            if position != start {
                                moves.push(Move::Relocate {
                                    from_route,
                                    start,
                                    len,
                                    to_route,
                                    position,
                                });
                            }
                        }
                        continue;
                    }

                    let to_len = routes[to_route].len();
                    if to_len == 0 && len == from_len {
                        continue;
                    }
                    if !plan.fits(to_route, segment_load, model) {
                        continue;
                    }
                    for position in 0..=to_len {
                        moves.push(Move::Relocate {
                            from_route,
                            start,
                            len,
                            to_route,
                            position,
                        });
                    }
                }
            }
        }
    }

    for first_route in 0..vehicles {
        if deadline.expired() {
            return None;
        }
        for second_route in (first_route + 1)..vehicles {
            let (a, b) = (&routes[first_route], &routes[second_route]);
            let (load_a, load_b) = (plan.loads[first_route], plan.loads[second_route]);
            let (cap_a, cap_b) = (model.capacity(first_route), model.capacity(second_route));

            // Single-stop exchange.
            for (first_pos, &u) in a.iter().enumerate() {
                for (second_pos, &v) in b.iter().enumerate() {
                    let (du, dv) = (model.demand(u), model.demand(v));
                    let new_a = (load_a - du).saturating_add(dv);
                    let new_b = (load_b - dv).saturating_add(du);
                    if new_a <= cap_a && new_b <= cap_b {
                        moves.push(Move::Exchange {
                            first_route,
                            first_pos,
                            second_route,
                            second_pos,
                        });
                    }
                }
            }

            // 2-opt* tail exchange.
            for first_cut in 0..=a.len() {
                for second_cut in 0..=b.len() {
                    let swaps_everything = first_cut == 0 && second_cut == 0;
                    let swaps_nothing = first_cut == a.len() && second_cut == b.len();
                    if swaps_everything || swaps_nothing {
                        continue;
                    }
                    let head_a = prefix[first_route][first_cut];
                    let head_b = prefix[second_route][second_cut];
                    let new_a = head_a.saturating_add(load_b - head_b);
                    let new_b = head_b.saturating_add(load_a - head_a);
                    if new_a <= cap_a && new_b <= cap_b {
                        moves.push(Move::TailSwap {
                            first_route,
                            first_cut,
                            second_route,
                            second_cut,
                        });
                    }
                }
            }
        }
    }

    Some(moves)
}
