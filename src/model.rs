//! Domain data carried through the planning pipeline.
//!
//! Internally every position is a [`Coordinate`] with named latitude and
//! longitude fields. The routing services speak `[longitude, latitude]`
//! arrays; [`LonLat`] is that wire shape and the only place the axis order
//! flips.

use serde::{Deserialize, Serialize};

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True when latitude is within [-90, 90] and longitude within [-180, 180].
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Wire form of a coordinate: `[longitude, latitude]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat(pub f64, pub f64);

impl From<Coordinate> for LonLat {
    fn from(coordinate: Coordinate) -> Self {
        LonLat(coordinate.longitude, coordinate.latitude)
    }
}

impl From<LonLat> for Coordinate {
    fn from(LonLat(longitude, latitude): LonLat) -> Self {
        Coordinate {
            latitude,
            longitude,
        }
    }
}

/// A deliverable address as produced by the address store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub housenumber: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postcode: String,
    pub lat: f64,
    pub lon: f64,
}

impl Address {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }

    /// Short marker label, e.g. "Freiheitsstraße 12".
    pub fn label(&self) -> String {
        format!("{} {}", self.street, self.housenumber).trim().to_string()
    }
}

/// Seconds spent at each delivery.
pub const SERVICE_DURATION_SECS: u32 = 90;
/// Parcels dropped per delivery.
pub const DELIVERY_DEMAND: u32 = 1;
/// Parcels the single vehicle can carry.
pub const VEHICLE_CAPACITY: u32 = 4;
/// Skill shared by every job and the vehicle.
pub const DELIVERY_SKILL: u32 = 1;

/// One delivery stop submitted to the optimizer.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryJob {
    /// 1-based position in the selection at request time.
    pub id: u64,
    pub location: Coordinate,
    pub service_duration_secs: u32,
    pub demand: u32,
    pub required_skills: Vec<u32>,
}

impl DeliveryJob {
    /// Builds one job per address, numbered from 1 in selection order.
    pub fn from_addresses(addresses: &[Address]) -> Vec<DeliveryJob> {
        addresses
            .iter()
            .enumerate()
            .map(|(index, address)| DeliveryJob {
                id: index as u64 + 1,
                location: address.coordinate(),
                service_duration_secs: SERVICE_DURATION_SECS,
                demand: DELIVERY_DEMAND,
                required_skills: vec![DELIVERY_SKILL],
            })
            .collect()
    }
}

/// The vehicle performing the deliveries.
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub id: u64,
    pub start: Coordinate,
    pub end: Coordinate,
    pub capacity: u32,
    pub skills: Vec<u32>,
}

impl Vehicle {
    pub fn delivery_van(start: Coordinate, end: Coordinate) -> Self {
        Self {
            id: 1,
            start,
            end,
            capacity: VEHICLE_CAPACITY,
            skills: vec![DELIVERY_SKILL],
        }
    }
}

/// A stop in optimized visiting order.
///
/// `job_id` links the stop back to the [`DeliveryJob`] (and so the address)
/// it was built from. It is `None` only if the optimizer returned a job step
/// without an id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizedStop {
    pub job_id: Option<u64>,
    pub location: Coordinate,
}

/// Distance (meters) and duration (seconds) of a route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub duration: f64,
}

/// A drivable path: every vertex of the decoded geometry plus its summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Route {
    pub coordinates: Vec<Coordinate>,
    pub summary: RouteSummary,
}

impl Route {
    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }
}
