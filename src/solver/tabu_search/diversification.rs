use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::model::RoutingModel;
use crate::solver::plan::RoutePlan;

/// Return to the best plan found so far, then shake it so the search does not
/// retrace the same trajectory.
pub fn perform_rollback(
    current: &mut RoutePlan,
    best: &RoutePlan,
    model: &RoutingModel,
    rng: &mut ChaCha8Rng,
    perturbation_moves: usize,
) {
    *current = best.clone();
    perturb(current, model, rng, perturbation_moves);
    debug!("Rolled back to best ({}) and perturbed to {}", best.distance, current.distance);
}

/// Move `count` random stops to random feasible positions.
pub fn perturb(plan: &mut RoutePlan, model: &RoutingModel, rng: &mut ChaCha8Rng, count: usize) {
    let vehicles = plan.routes.len();

    for _ in 0..count {
        let stops = plan.stop_count();
        if stops < 2 {
            return;
        }

        // Pick the k-th stop over all routes.
        let mut k = rng.gen_range(0..stops);
        let mut from_route = 0;
        while k >= plan.routes[from_route].len() {
            k -= plan.routes[from_route].len();
            from_route += 1;
        }
        let node = plan.remove(from_route, k, model);

        let demand = model.demand(node);
        let targets: Vec<usize> = (0..vehicles)
            .filter(|&route| plan.fits(route, demand, model))
            .collect();
        // The source route always has room for the stop it just gave up.
        let to_route = targets[rng.gen_range(0..targets.len())];
        let position = rng.gen_range(0..=plan.routes[to_route].len());
        plan.insert(to_route, position, node, model);
    }
}
