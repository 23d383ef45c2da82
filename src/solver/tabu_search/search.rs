use std::cmp::max;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, span, trace, Level};

use super::diversification::perform_rollback;
use super::neighborhood::find_neighbours;
use super::tabu::{choose_best_candidate, TabuList};
use crate::config::constant::TENURE_REDRAW_PERIOD;
use crate::evaluation::GuidedPenalties;
use crate::model::RoutingModel;
use crate::solver::plan::RoutePlan;
use crate::solver::SearchParameters;
use crate::utils::Deadline;

/// Mutable state threaded through the improvement loop.
#[derive(Debug)]
pub struct SearchState {
    pub current: RoutePlan,
    pub best: RoutePlan,
    pub tabu_list: TabuList,
    pub penalties: GuidedPenalties,
    pub rng: ChaCha8Rng,
    pub iteration: usize,
    pub best_iteration: usize,
    pub stagnation: usize,
    pub max_stagnation: usize,
    pub improvements: usize,
    pub local_minima: usize,
    pub rollbacks: usize,
}

impl SearchState {
    pub fn new(initial: RoutePlan, model: &RoutingModel, params: &SearchParameters) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
        let tenure = draw_tenure(&mut rng, params.tenure_bounds);
        SearchState {
            best: initial.clone(),
            current: initial,
            tabu_list: TabuList::new(tenure),
            penalties: GuidedPenalties::new(model.size()),
            rng,
            iteration: 0,
            best_iteration: 0,
            stagnation: 0,
            max_stagnation: 0,
            improvements: 0,
            local_minima: 0,
            rollbacks: 0,
        }
    }
}

/// Outcome of the improvement phase.
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub best: RoutePlan,
    pub iterations: usize,
    pub improvements: usize,
}

fn draw_tenure(rng: &mut ChaCha8Rng, (lower, upper): (usize, usize)) -> usize {
    if lower < upper {
        rng.gen_range(lower..upper)
    } else {
        lower
    }
}

/// Calculate maximum iterations without improvement based on problem size
pub fn calculate_max_no_improvement(stops: usize) -> usize {
    let scaling_factor = if stops < 50 { 15.0 } else { 9.0 };
    max(300, (scaling_factor * (stops as f64).powf(1.33)) as usize)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IterationOutcome {
    Continue,
    /// No move exists at all.
    NoMoves,
    /// The deadline passed before a move was chosen; nothing was changed.
    Interrupted,
}

/// Perform a single tabu search iteration.
fn perform_iteration(
    state: &mut SearchState,
    model: &RoutingModel,
    params: &SearchParameters,
    deadline: &Deadline,
) -> IterationOutcome {
    let iter_span = span!(Level::DEBUG, "iteration", iter = state.iteration);
    let _iter_guard = iter_span.enter();

    let Some(candidates) = find_neighbours(&state.current, model, &state.penalties, deadline)
    else {
        debug!("Deadline reached while scoring the neighbourhood");
        return IterationOutcome::Interrupted;
    };
    if candidates.is_empty() {
        debug!("Neighbourhood is empty");
        return IterationOutcome::NoMoves;
    }

    let depot = model.depot();
    let current = &state.current;
    let Some((chosen, change)) = choose_best_candidate(
        &candidates,
        &state.tabu_list,
        current.distance,
        state.best.distance,
        |candidate| candidate.mv.arc_change(current, depot),
    ) else {
        debug!("Every move is tabu, clearing tabu list");
        state.tabu_list.clear();
        state.stagnation += 1;
        return IterationOutcome::Continue;
    };

    // No move improves even the guided cost: penalize the current local minimum.
    if chosen.guided_delta >= 0 {
        let arcs = state.current.arcs(depot);
        state
            .penalties
            .calibrate(state.current.distance, arcs.len(), params.guided_penalty_factor);
        state.penalties.penalize_max_utility(&arcs, model);
        state.local_minima += 1;
    }

    trace!("chosen move: {:?} (delta {})", chosen.mv, chosen.delta);
    chosen.mv.apply(&mut state.current, chosen.delta, model);
    state.tabu_list.insert_and_adjust(&change);

    if state.current.distance < state.best.distance {
        state.best = state.current.clone();
        state.best_iteration = state.iteration;
        state.improvements += 1;
        state.max_stagnation = max(state.stagnation, state.max_stagnation);
        state.stagnation = 0;
        info!(
            "New best at iteration {}: distance = {}",
            state.iteration, state.best.distance
        );
    } else {
        state.stagnation += 1;
    }
    IterationOutcome::Continue
}

/// Improve `initial` until the deadline, the iteration cap, or prolonged stagnation.
///
/// The trajectory depends only on the seed, never on the clock, so a larger
/// budget can only extend it. The deadline is also checked while the
/// neighbourhood is built; an interrupted iteration is dropped whole.
pub fn tabu_search(
    model: &RoutingModel,
    initial: RoutePlan,
    params: &SearchParameters,
    deadline: &Deadline,
) -> SearchReport {
    let stops = initial.stop_count();
    let max_no_improvement = params
        .max_no_improvement
        .unwrap_or_else(|| calculate_max_no_improvement(stops));

    let loop_span = span!(Level::INFO, "tabu_search", stops, max_no_improvement);
    let _loop_guard = loop_span.enter();

    let mut state = SearchState::new(initial, model, params);

    while !deadline.expired() && state.iteration < params.max_iterations {
        state.iteration += 1;

        match perform_iteration(&mut state, model, params, deadline) {
            IterationOutcome::Continue => {}
            IterationOutcome::NoMoves => break,
            IterationOutcome::Interrupted => {
                state.iteration -= 1;
                break;
            }
        }

        if state.stagnation >= max_no_improvement {
            info!("ENDED EARLY AT ITERATION: {}", state.iteration);
            break;
        }
        if state.stagnation > 0 && state.stagnation % (max_no_improvement / 2).max(1) == 0 {
            state.rollbacks += 1;
            state.tabu_list.clear();
            perform_rollback(
                &mut state.current,
                &state.best,
                model,
                &mut state.rng,
                params.perturbation_moves,
            );
        }
        if state.iteration % TENURE_REDRAW_PERIOD == 0 {
            let tenure = draw_tenure(&mut state.rng, params.tenure_bounds);
            state.tabu_list.set_tenure(tenure);
        }
    }

    info!(
        "Search complete after {} iterations: best {} at iteration {}",
        state.iteration, state.best.distance, state.best_iteration
    );
    debug!(
        "Max stagnation: {}, local minima: {}, rollbacks: {}",
        max(state.stagnation, state.max_stagnation),
        state.local_minima,
        state.rollbacks
    );

    SearchReport {
        best: state.best,
        iterations: state.iteration,
        improvements: state.improvements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::DistanceMatrix;
    use std::sync::Arc;
    use std::time::Duration;

    fn grid_model(
        capacities: Option<Vec<u64>>,
        demands: Option<Vec<u64>>,
        vehicles: usize,
    ) -> RoutingModel {
        // Depot in the middle of a 3x3 grid, unit spacing scaled to 100.
        let points: Vec<(i64, i64)> = vec![
            (1, 1), (0, 0), (0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1), (2, 2),
        ];
        let rows = points
            .iter()
            .map(|&(ax, ay)| {
                points
                    .iter()
                    .map(|&(bx, by)| {
                        let (dx, dy) = ((ax - bx) as f64, (ay - by) as f64);
                        ((dx * dx + dy * dy).sqrt() * 100.0).round() as u64
                    })
                    .collect()
            })
            .collect();
        RoutingModel::new(
            Arc::new(DistanceMatrix::from_rows(rows).unwrap()),
            0,
            vehicles,
            capacities,
            demands,
        )
        .unwrap()
    }

    fn run(model: &RoutingModel, initial: &RoutePlan) -> SearchReport {
        tabu_search(
            model,
            initial.clone(),
            &params(),
            &Deadline::after(Duration::from_secs(10)),
        )
    }

    fn params() -> SearchParameters {
        SearchParameters {
            time_limit: Duration::from_secs(10),
            max_no_improvement: Some(60),
            ..SearchParameters::default()
        }
    }

    #[test]
    fn stagnation_floor_and_growth() {
        assert_eq!(calculate_max_no_improvement(5), 300);
        assert!(calculate_max_no_improvement(200) > calculate_max_no_improvement(100));
    }

    #[test]
    fn untangles_a_scrambled_ring() {
        let model = grid_model(None, None, 1);
        let initial = RoutePlan::from_routes(vec![vec![1, 8, 3, 6, 2, 7, 4, 5]], &model);
        let report = run(&model, &initial);

        // The optimum walks seven ring edges and leaves/returns through a
        // midpoint and a corner: 100 + 700 + 141.
        assert!(report.best.distance >= 941);
        assert!(report.best.distance <= 1000, "got {}", report.best.distance);
        assert!(report.improvements > 0);
    }

    #[test]
    fn never_breaks_capacity() {
        let demands = vec![0, 3, 3, 3, 3, 3, 3, 3, 3];
        let model = grid_model(Some(vec![9, 9, 9]), Some(demands), 3);
        let initial =
            RoutePlan::from_routes(vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8]], &model);
        let report = run(&model, &initial);

        assert!(report.best.distance <= initial.distance);
        assert!(report.best.loads.iter().all(|&load| load <= 9));
        let mut visited = report.best.routes.concat();
        visited.sort_unstable();
        assert_eq!(visited, (1..=8).collect::<Vec<_>>());
    }

    #[test]
    fn same_seed_same_answer() {
        let model = grid_model(None, None, 2);
        let initial = RoutePlan::from_routes(vec![vec![8, 1, 6, 3], vec![2, 7, 4, 5]], &model);
        assert_eq!(run(&model, &initial).best, run(&model, &initial).best);
    }

    #[test]
    fn expired_deadline_keeps_the_initial_plan() {
        let model = grid_model(None, None, 1);
        let initial = RoutePlan::from_routes(vec![vec![1, 8, 3, 6, 2, 7, 4, 5]], &model);
        let report = tabu_search(
            &model,
            initial.clone(),
            &params(),
            &Deadline::after(Duration::ZERO),
        );
        assert_eq!(report.best, initial);
        assert_eq!(report.iterations, 0);
    }

    #[test]
    fn interrupted_iteration_changes_nothing() {
        let model = grid_model(None, None, 1);
        let initial = RoutePlan::from_routes(vec![vec![1, 8, 3, 6, 2, 7, 4, 5]], &model);
        let mut state = SearchState::new(initial.clone(), &model, &params());
        let tabu_before = state.tabu_list.clone();

        let outcome =
            perform_iteration(&mut state, &model, &params(), &Deadline::after(Duration::ZERO));
        assert_eq!(outcome, IterationOutcome::Interrupted);
        assert_eq!(state.current, initial);
        assert_eq!(state.best, initial);
        assert_eq!(state.stagnation, 0);
        assert_eq!(state.tabu_list.tenure(), tabu_before.tenure());
        assert!(!state.tabu_list.contains((1, 8)));
    }

    #[test]
    fn single_stop_has_no_neighbourhood() {
        let model = grid_model(None, None, 1);
        let initial = RoutePlan::from_routes(vec![vec![4]], &model);
        let report = run(&model, &initial);
        assert_eq!(report.best, initial);
        assert_eq!(report.iterations, 1);
    }
}
