pub mod diversification;
pub mod moves;
pub mod neighborhood;
pub mod search;
pub mod tabu;

pub use moves::{ArcChange, ArcPair, Move, MAX_CHANGED_ARCS};
pub use neighborhood::{find_neighbours, Candidate};
pub use search::*;
pub use tabu::{choose_best_candidate, TabuList};
