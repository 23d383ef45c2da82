use serde::{Deserialize, Serialize};

use crate::error::{config_error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationRole {
    Depot,
    Delivery,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub index: usize,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub role: LocationRole,
    #[serde(default)]
    pub demand: Option<u64>,
    /// Order number or other external id, passed through untouched.
    #[serde(default)]
    pub reference: Option<String>,
}

impl Location {
    pub fn depot(index: usize, name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Location {
            index,
            name: name.into(),
            latitude,
            longitude,
            role: LocationRole::Depot,
            demand: None,
            reference: None,
        }
    }

    pub fn delivery(index: usize, name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Location {
            index,
            name: name.into(),
            latitude,
            longitude,
            role: LocationRole::Delivery,
            demand: None,
            reference: None,
        }
    }

    pub fn with_demand(mut self, demand: u64) -> Self {
        self.demand = Some(demand);
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn is_depot(&self) -> bool {
        self.role == LocationRole::Depot
    }

    pub fn coordinates(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleSpec {
    pub index: usize,
    pub capacity: u64,
}

/// One optimization call: the locations to serve and the fleet serving them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationRequest {
    pub locations: Vec<Location>,
    pub num_vehicles: usize,
    #[serde(default)]
    pub vehicle_capacities: Option<Vec<u64>>,
    #[serde(default)]
    pub demands: Option<Vec<u64>>,
    #[serde(default)]
    pub depot_index: usize,
    #[serde(default)]
    pub time_limit_secs: Option<u64>,
}

impl OptimizationRequest {
    pub fn new(locations: Vec<Location>, num_vehicles: usize) -> Self {
        OptimizationRequest {
            locations,
            num_vehicles,
            vehicle_capacities: None,
            demands: None,
            depot_index: 0,
            time_limit_secs: None,
        }
    }

    /// Capacitated request: capacities come from the fleet, demands from the locations.
    pub fn from_fleet(locations: Vec<Location>, fleet: &[VehicleSpec]) -> Result<Self> {
        for (position, vehicle) in fleet.iter().enumerate() {
            if vehicle.index != position {
                return config_error(format!(
                    "vehicle at position {} has index {}",
                    position, vehicle.index
                ));
            }
        }
        let demands = locations.iter().map(|l| l.demand.unwrap_or(0)).collect();
        Ok(OptimizationRequest {
            num_vehicles: fleet.len(),
            vehicle_capacities: Some(fleet.iter().map(|v| v.capacity).collect()),
            demands: Some(demands),
            locations,
            depot_index: 0,
            time_limit_secs: None,
        })
    }

    pub fn with_capacities(mut self, capacities: Vec<u64>) -> Self {
        self.vehicle_capacities = Some(capacities);
        self
    }

    pub fn with_demands(mut self, demands: Vec<u64>) -> Self {
        self.demands = Some(demands);
        self
    }

    pub fn with_depot_index(mut self, depot_index: usize) -> Self {
        self.depot_index = depot_index;
        self
    }

    pub fn with_time_limit_secs(mut self, secs: u64) -> Self {
        self.time_limit_secs = Some(secs);
        self
    }

    /// Explicit demand vector, or one gathered from per-location demands when any is set.
    pub fn resolved_demands(&self) -> Option<Vec<u64>> {
        if let Some(demands) = &self.demands {
            return Some(demands.clone());
        }
        if self.locations.iter().any(|l| l.demand.is_some()) {
            return Some(self.locations.iter().map(|l| l.demand.unwrap_or(0)).collect());
        }
        None
    }

    /// Input contract checks that do not need the distance matrix.
    pub fn validate(&self) -> Result<()> {
        if self.locations.is_empty() {
            return config_error("location list is empty");
        }
        if self.num_vehicles == 0 {
            return config_error("vehicle count must be positive");
        }
        if self.depot_index >= self.locations.len() {
            return config_error(format!(
                "depot index {} out of range for {} locations",
                self.depot_index,
                self.locations.len()
            ));
        }

        let mut depots = 0;
        for (position, location) in self.locations.iter().enumerate() {
            if location.index != position {
                return config_error(format!(
                    "location '{}' at position {} has index {}",
                    location.name, position, location.index
                ));
            }
            if !location.latitude.is_finite()
                || !location.longitude.is_finite()
                || location.latitude.abs() > 90.0
                || location.longitude.abs() > 180.0
            {
                return config_error(format!(
                    "location '{}' has invalid coordinates ({}, {})",
                    location.name, location.latitude, location.longitude
                ));
            }
            if location.is_depot() {
                depots += 1;
                if position != self.depot_index {
                    return config_error(format!(
                        "depot '{}' is at index {}, expected {}",
                        location.name, position, self.depot_index
                    ));
                }
            }
        }
        if depots != 1 {
            return config_error(format!("expected exactly one depot, found {}", depots));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub customer: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
}

/// A set of orders leaving one warehouse on a single vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    pub pickup_warehouse: Warehouse,
    pub deliveries: Vec<Delivery>,
}

impl Shipment {
    pub fn total_weight_kg(&self) -> f64 {
        self.deliveries.iter().filter_map(|d| d.weight_kg).sum()
    }

    pub fn to_request(&self) -> OptimizationRequest {
        let warehouse = &self.pickup_warehouse;
        let mut locations = vec![Location::depot(
            0,
            warehouse.name.clone(),
            warehouse.latitude,
            warehouse.longitude,
        )];

        for (offset, delivery) in self.deliveries.iter().enumerate() {
            let mut location = Location::delivery(
                offset + 1,
                delivery.customer.clone(),
                delivery.latitude,
                delivery.longitude,
            );
            location.reference = delivery.order_number.clone();
            locations.push(location);
        }

        OptimizationRequest::new(locations, 1)
    }
}
