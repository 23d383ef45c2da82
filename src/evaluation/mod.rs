pub mod fitness;
pub mod penalty;

pub use fitness::*;
pub use penalty::GuidedPenalties;
