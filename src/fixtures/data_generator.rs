use std::error::Error;

use csv::ReaderBuilder;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use crate::config::constant::DEMO_TRUCK_CAPACITIES;
use crate::domain::{Location, OptimizationRequest};

// Bounding box around Singapore, where the demo warehouse sits.
const LAT_RANGE: (f64, f64) = (1.25, 1.45);
const LON_RANGE: (f64, f64) = (103.65, 103.95);
const WAREHOUSE: (f64, f64) = (1.3521, 103.8198);

/// Reads locations from a CSV of `name,latitude,longitude[,demand[,reference]]`.
/// The first row is the depot. A header row is detected and skipped.
pub fn read_locations_from_csv(csv_path: &str) -> Result<Vec<Location>, Box<dyn Error>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(csv_path)?;

    let mut locations: Vec<Location> = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let (Some(name), Some(lat), Some(lon)) = (record.get(0), record.get(1), record.get(2))
        else {
            warn!("Skipping short row {} in {}", row + 1, csv_path);
            continue;
        };

        // Treat a first row without numeric coordinates as a header.
        let (Ok(latitude), Ok(longitude)) = (lat.parse::<f64>(), lon.parse::<f64>()) else {
            if row == 0 {
                continue;
            }
            return Err(format!("row {}: bad coordinates '{}', '{}'", row + 1, lat, lon).into());
        };

        let index = locations.len();
        let mut location = if index == 0 {
            Location::depot(index, name, latitude, longitude)
        } else {
            Location::delivery(index, name, latitude, longitude)
        };
        if let Some(demand) = record.get(3).filter(|d| !d.is_empty()) {
            location.demand = Some(demand.parse()?);
        }
        if let Some(reference) = record.get(4).filter(|r| !r.is_empty()) {
            location.reference = Some(reference.to_string());
        }
        locations.push(location);
    }

    info!("Loaded {} locations from {}", locations.len(), csv_path);
    Ok(locations)
}

/// Generates `count` deliveries scattered around the warehouse, plus the warehouse itself.
pub fn random_locations(count: usize, seed: u64) -> Vec<Location> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut locations = Vec::with_capacity(count + 1);
    locations.push(Location::depot(0, "Warehouse", WAREHOUSE.0, WAREHOUSE.1));

    for index in 1..=count {
        let latitude = rng.gen_range(LAT_RANGE.0..LAT_RANGE.1);
        let longitude = rng.gen_range(LON_RANGE.0..LON_RANGE.1);
        locations.push(
            Location::delivery(index, format!("Customer {}", index), latitude, longitude)
                .with_reference(format!("ORD-{:05}", index)),
        );
    }
    locations
}

/// Generates random customer demands for each location
///
/// The warehouse is always 0; every customer gets 1..=7 units.
pub fn generate_customer_demands(size: usize, seed: u64) -> Vec<u64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1));
    let mut demands = vec![0];
    demands.extend((1..size).map(|_| rng.gen_range(1..=7)));
    demands
}

/// A reproducible capacitated request served by the fixed demo fleet.
pub fn generate_random_request(count: usize, seed: u64) -> OptimizationRequest {
    let locations = random_locations(count, seed);
    let demands = generate_customer_demands(locations.len(), seed);
    let capacities = DEMO_TRUCK_CAPACITIES.to_vec();

    let total_demand: u64 = demands.iter().sum();
    let total_capacity: u64 = capacities.iter().sum();
    info!(
        "Generated {} customers, total demand {}, fleet capacity {}",
        count, total_demand, total_capacity
    );
    if total_capacity < total_demand {
        warn!(
            "Total fleet capacity ({}) is less than total demand ({})",
            total_capacity, total_demand
        );
    }

    let locations = locations
        .into_iter()
        .zip(&demands)
        .map(|(location, &demand)| location.with_demand(demand))
        .collect();

    OptimizationRequest::new(locations, capacities.len())
        .with_capacities(capacities)
        .with_demands(demands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn same_seed_same_instance() {
        let a = generate_random_request(12, 5);
        let b = generate_random_request(12, 5);
        assert_eq!(a.locations, b.locations);
        assert_eq!(a.demands, b.demands);
        assert_ne!(a.locations, generate_random_request(12, 6).locations);
    }

    #[test]
    fn generated_request_is_valid() {
        let request = generate_random_request(30, 64);
        request.validate().unwrap();
        assert_eq!(request.locations.len(), 31);
        assert_eq!(request.demands.as_ref().unwrap()[0], 0);
        assert_eq!(request.num_vehicles, DEMO_TRUCK_CAPACITIES.len());
    }

    #[test]
    fn reads_csv_with_header() {
        let path = std::env::temp_dir().join("delivery_router_locations.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "name,latitude,longitude,demand,reference").unwrap();
        writeln!(file, "Hub,1.30,103.80,,").unwrap();
        writeln!(file, "Shop,1.31,103.85,4,ORD-7").unwrap();
        writeln!(file, "Cafe,1.28,103.84").unwrap();
        drop(file);

        let locations = read_locations_from_csv(path.to_str().unwrap()).unwrap();
        assert_eq!(locations.len(), 3);
        assert!(locations[0].is_depot());
        assert_eq!(locations[1].demand, Some(4));
        assert_eq!(locations[1].reference.as_deref(), Some("ORD-7"));
        assert_eq!(locations[2].index, 2);
        assert_eq!(locations[2].demand, None);
    }
}
