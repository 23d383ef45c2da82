//! Rule-of-thumb helpers for dispatchers. None of this feeds back into the search.

use serde::{Deserialize, Serialize};

use crate::config::constant::DEFAULT_AVERAGE_SPEED_KMH;
use crate::error::{config_error, Result};
use crate::utils::round_to;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelTimeEstimate {
    pub distance_km: f64,
    pub estimated_hours: f64,
    pub estimated_minutes: f64,
    pub average_speed_kmh: f64,
}

/// Travel time at a constant average speed (50 km/h unless given).
pub fn estimate_travel_time(
    distance_km: f64,
    average_speed_kmh: Option<f64>,
) -> Result<TravelTimeEstimate> {
    let speed = average_speed_kmh.unwrap_or(DEFAULT_AVERAGE_SPEED_KMH);
    if !speed.is_finite() || speed <= 0.0 {
        return config_error(format!("average speed must be positive, got {}", speed));
    }
    if !distance_km.is_finite() || distance_km < 0.0 {
        return config_error(format!("distance must be non-negative, got {}", distance_km));
    }

    let hours = distance_km / speed;
    Ok(TravelTimeEstimate {
        distance_km: round_to(distance_km, 2),
        estimated_hours: round_to(hours, 2),
        estimated_minutes: round_to(hours * 60.0, 0),
        average_speed_kmh: speed,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleClass {
    Motorcycle,
    Van,
    Truck,
    Lorry,
}

impl std::fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            VehicleClass::Motorcycle => "motorcycle",
            VehicleClass::Van => "van",
            VehicleClass::Truck => "truck",
            VehicleClass::Lorry => "lorry",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleCandidate {
    #[serde(rename = "type")]
    pub class: VehicleClass,
    /// 1 is the preferred choice.
    pub priority: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSuggestion {
    pub total_weight_kg: f64,
    pub route_distance_km: f64,
    pub suggestions: Vec<VehicleCandidate>,
}

impl VehicleSuggestion {
    pub fn preferred(&self) -> Option<VehicleClass> {
        self.suggestions
            .iter()
            .min_by_key(|c| c.priority)
            .map(|c| c.class)
    }
}

/// Vehicle classes suited to a load, best first.
pub fn suggest_vehicle(route_distance_km: f64, total_weight_kg: f64) -> VehicleSuggestion {
    use VehicleClass::*;

    let ranked: &[VehicleClass] = if total_weight_kg < 100.0 && route_distance_km < 50.0 {
        &[Motorcycle, Van]
    } else if total_weight_kg < 500.0 {
        &[Van, Truck]
    } else if total_weight_kg < 2000.0 {
        &[Truck]
    } else {
        &[Lorry]
    };

    VehicleSuggestion {
        total_weight_kg,
        route_distance_km,
        suggestions: ranked
            .iter()
            .zip(1..)
            .map(|(&class, priority)| VehicleCandidate { class, priority })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RoutingError;

    #[test]
    fn default_speed_is_fifty() {
        let estimate = estimate_travel_time(100.0, None).unwrap();
        assert_eq!(estimate.estimated_hours, 2.0);
        assert_eq!(estimate.estimated_minutes, 120.0);
        assert_eq!(estimate.average_speed_kmh, 50.0);
    }

    #[test]
    fn rounds_like_a_dispatcher_would() {
        let estimate = estimate_travel_time(12.3456, Some(40.0)).unwrap();
        assert_eq!(estimate.distance_km, 12.35);
        assert_eq!(estimate.estimated_hours, 0.31);
        // 0.30864 h = 18.518 min
        assert_eq!(estimate.estimated_minutes, 19.0);
    }

    #[test]
    fn zero_distance_takes_no_time() {
        let estimate = estimate_travel_time(0.0, Some(30.0)).unwrap();
        assert_eq!(estimate.estimated_minutes, 0.0);
    }

    #[test]
    fn rejects_non_positive_speed() {
        for speed in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                estimate_travel_time(10.0, Some(speed)),
                Err(RoutingError::Configuration(_))
            ));
        }
    }

    #[test]
    fn light_short_trips_go_by_motorcycle() {
        let suggestion = suggest_vehicle(20.0, 40.0);
        assert_eq!(suggestion.preferred(), Some(VehicleClass::Motorcycle));
        assert_eq!(suggestion.suggestions.len(), 2);
        assert_eq!(suggestion.suggestions[1].class, VehicleClass::Van);
    }

    #[test]
    fn light_but_long_trips_go_by_van() {
        assert_eq!(suggest_vehicle(80.0, 150.0).preferred(), Some(VehicleClass::Van));
        assert_eq!(suggest_vehicle(80.0, 40.0).preferred(), Some(VehicleClass::Van));
    }

    #[test]
    fn heavy_loads_need_trucks_or_lorries() {
        let truck = suggest_vehicle(10.0, 500.0);
        assert_eq!(
            truck.suggestions,
            vec![VehicleCandidate {
                class: VehicleClass::Truck,
                priority: 1
            }]
        );
        assert_eq!(suggest_vehicle(10.0, 2000.0).preferred(), Some(VehicleClass::Lorry));
    }

    #[test]
    fn serializes_with_type_key() {
        let json = serde_json::to_string(&suggest_vehicle(5.0, 5.0).suggestions[0]).unwrap();
        assert_eq!(json, r#"{"type":"motorcycle","priority":1}"#);
    }
}
