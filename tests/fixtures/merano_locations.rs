//! Merano delivery addresses for realistic test fixtures.
//!
//! Coordinates sourced from OpenStreetMap address nodes.

use delivery_router::model::{Address, Coordinate};

/// Where the van is parked when the round starts (Obermais).
pub const VEHICLE_START: Coordinate = Coordinate::new(46.6797800, 11.1545789);

/// Where the van returns after the last delivery.
pub const DEPOT: Coordinate = Coordinate::new(46.665481, 11.158797);

/// A named address with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub street: &'static str,
    pub housenumber: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(street: &'static str, housenumber: &'static str, lat: f64, lng: f64) -> Self {
        Self {
            street,
            housenumber,
            lat,
            lng,
        }
    }

    pub fn address(&self) -> Address {
        Address {
            street: self.street.to_string(),
            housenumber: self.housenumber.to_string(),
            city: "Meran - Merano".to_string(),
            postcode: "39012".to_string(),
            lat: self.lat,
            lon: self.lng,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

// ============================================================================
// City centre
// ============================================================================

pub const CENTRE: &[Location] = &[
    Location::new("Via dei Portici - Laubengasse", "192", 46.6714920, 11.1594730),
    Location::new("Corso Libertà - Freiheitsstraße", "27", 46.6695570, 11.1606850),
    Location::new("Via Cavour - Cavourstraße", "8", 46.6691340, 11.1647520),
    Location::new("Piazza del Grano - Kornplatz", "3", 46.6720110, 11.1601330),
];

// ============================================================================
// South of the Passer
// ============================================================================

pub const SOUTH: &[Location] = &[
    Location::new("Via Goethe - Goethestraße", "14", 46.6666934, 11.1627272),
    Location::new("Via Roma - Romstraße", "55", 46.6581182, 11.1668508),
];

/// Addresses in the order a user would pick them.
pub fn selection(count: usize) -> Vec<Address> {
    CENTRE
        .iter()
        .chain(SOUTH)
        .take(count)
        .map(Location::address)
        .collect()
}
