use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info};

use super::geo::haversine_km;
use crate::config::constant::PARALLEL_MATRIX_THRESHOLD;
use crate::domain::types::Location;

/// Square matrix of integer meters, symmetric with a zero diagonal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceMatrix {
    size: usize,
    cells: Vec<u64>,
}

impl DistanceMatrix {
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn get(&self, from: usize, to: usize) -> u64 {
        self.cells[from * self.size + to]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u64]> {
        self.cells.chunks(self.size.max(1))
    }

    /// Build from explicit rows, mostly for hand-made test instances.
    /// Returns `None` unless the rows form a square, symmetric, zero-diagonal matrix.
    pub fn from_rows(rows: Vec<Vec<u64>>) -> Option<Self> {
        let size = rows.len();
        if rows.iter().any(|r| r.len() != size) {
            return None;
        }
        let cells: Vec<u64> = rows.into_iter().flatten().collect();
        let matrix = DistanceMatrix { size, cells };
        let consistent = (0..size).all(|i| {
            matrix.get(i, i) == 0 && (0..i).all(|j| matrix.get(i, j) == matrix.get(j, i))
        });
        consistent.then_some(matrix)
    }
}

fn meters_between(a: &Location, b: &Location) -> u64 {
    (haversine_km(a.coordinates(), b.coordinates()) * 1000.0).round() as u64
}

/// Create the distance matrix for `locations` from great-circle distances.
pub fn build_distance_matrix(locations: &[Location]) -> DistanceMatrix {
    let n = locations.len();
    info!("Creating distance matrix for {} locations", n);

    // Upper triangle only; the lower triangle is mirrored so symmetry is exact.
    let upper = |i: usize| -> Vec<u64> {
        ((i + 1)..n)
            .map(|j| meters_between(&locations[i], &locations[j]))
            .collect()
    };
    let triangle: Vec<Vec<u64>> = if n >= PARALLEL_MATRIX_THRESHOLD {
        (0..n).into_par_iter().map(upper).collect()
    } else {
        (0..n).map(upper).collect()
    };

    let mut cells = vec![0u64; n * n];
    for (i, row) in triangle.iter().enumerate() {
        for (offset, &meters) in row.iter().enumerate() {
            let j = i + 1 + offset;
            cells[i * n + j] = meters;
            cells[j * n + i] = meters;
        }
    }

    DistanceMatrix { size: n, cells }
}

// Print distance matrix for debugging
pub fn print_dist_matrix(matrix: &DistanceMatrix) {
    debug!("Distance matrix:");
    for row in matrix.rows() {
        debug!("{:?}", row);
    }
}

/// Caller-owned cache holding the most recently built matrix.
///
/// The cached matrix is reused only while the coordinates of the location list
/// are unchanged; any other list triggers a rebuild.
#[derive(Debug, Default)]
pub struct MatrixCache {
    entry: Option<(Vec<CoordinateKey>, Arc<DistanceMatrix>)>,
}

/// Exact bit pattern of a (latitude, longitude) pair.
type CoordinateKey = (u64, u64);

impl MatrixCache {
    pub fn new() -> Self {
        MatrixCache::default()
    }

    pub fn get_or_build(&mut self, locations: &[Location]) -> Arc<DistanceMatrix> {
        let key = coordinate_key(locations);
        if let Some((cached_key, matrix)) = &self.entry {
            if *cached_key == key {
                debug!("Reusing cached distance matrix");
                return Arc::clone(matrix);
            }
        }

        let matrix = Arc::new(build_distance_matrix(locations));
        self.entry = Some((key, Arc::clone(&matrix)));
        matrix
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }
}

fn coordinate_key(locations: &[Location]) -> Vec<CoordinateKey> {
    locations
        .iter()
        .map(|l| (l.latitude.to_bits(), l.longitude.to_bits()))
        .collect()
}
