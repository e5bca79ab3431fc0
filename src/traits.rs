//! Seams between the planning pipeline and its collaborators.
//!
//! The remote optimizer, the directions engine and the address database are
//! all reached through these traits so the pipeline can be driven by any
//! backend (or a test double).

use std::sync::Arc;

use crate::address::Street;
use crate::error::{DirectionsError, OptimizationError, UpstreamError};
use crate::model::{Address, Coordinate, OptimizedStop, Route};

/// Sends a JSON request body and returns the raw response body.
///
/// Implementations must map non-2xx statuses and timeouts to
/// [`UpstreamError`]; they never retry.
pub trait JsonTransport {
    fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<String, UpstreamError>;
}

/// Orders deliveries for a single vehicle.
pub trait RouteOptimizer {
    /// Returns one stop per delivered job in visiting order. Vehicle start
    /// and end are not stops.
    fn optimize(
        &self,
        addresses: &[Address],
        vehicle_start: Coordinate,
        vehicle_end: Coordinate,
    ) -> Result<Vec<OptimizedStop>, OptimizationError>;
}

impl<T: RouteOptimizer + ?Sized> RouteOptimizer for Arc<T> {
    fn optimize(
        &self,
        addresses: &[Address],
        vehicle_start: Coordinate,
        vehicle_end: Coordinate,
    ) -> Result<Vec<OptimizedStop>, OptimizationError> {
        (**self).optimize(addresses, vehicle_start, vehicle_end)
    }
}

/// Computes a drivable path through waypoints, in the given order.
pub trait DirectionsProvider {
    fn route(&self, waypoints: &[Coordinate]) -> Result<Route, DirectionsError>;
}

impl<T: DirectionsProvider + ?Sized> DirectionsProvider for Arc<T> {
    fn route(&self, waypoints: &[Coordinate]) -> Result<Route, DirectionsError> {
        (**self).route(waypoints)
    }
}

impl<T: JsonTransport + ?Sized> JsonTransport for Arc<T> {
    fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<String, UpstreamError> {
        (**self).post_json(url, body)
    }
}

/// Prefix search over the local address database.
pub trait AddressStore {
    /// Streets whose name has a word starting with `prefix`.
    fn streets_matching(&self, prefix: &str) -> Vec<Street>;

    /// Addresses on `street` whose house number starts with `prefix`.
    fn addresses_on(&self, street: &str, housenumber_prefix: &str) -> Vec<Address>;
}
