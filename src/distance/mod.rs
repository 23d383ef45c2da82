pub mod geo;
pub mod matrix;

pub use geo::haversine_km;
pub use matrix::{build_distance_matrix, DistanceMatrix, MatrixCache};
