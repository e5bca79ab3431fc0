//! Directions client: ordered waypoints in, decoded drivable route out.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::DirectionsError;
use crate::model::{Coordinate, LonLat, Route, RouteSummary};
use crate::ors::OrsConfig;
use crate::polyline;
use crate::traits::{DirectionsProvider, JsonTransport};

#[derive(Debug, Clone)]
pub struct DirectionsClient<T> {
    transport: T,
    url: String,
}

impl<T: JsonTransport> DirectionsClient<T> {
    pub fn new(transport: T, config: &OrsConfig) -> Self {
        Self {
            transport,
            url: config.directions_url(),
        }
    }
}

impl<T: JsonTransport> DirectionsProvider for DirectionsClient<T> {
    fn route(&self, waypoints: &[Coordinate]) -> Result<Route, DirectionsError> {
        let body = build_request(waypoints);

        tracing::debug!(waypoints = waypoints.len(), url = %self.url, "requesting directions");
        let response = self.transport.post_json(&self.url, &body)?;

        let route = parse_response(&response)?;
        tracing::debug!(
            points = route.coordinates.len(),
            distance = route.summary.distance,
            duration = route.summary.duration,
            "directions returned"
        );
        Ok(route)
    }
}

/// Builds `{coordinates: [[lon, lat], ...]}`.
pub fn build_request(waypoints: &[Coordinate]) -> Value {
    let coordinates = waypoints
        .iter()
        .copied()
        .map(LonLat::from)
        .collect::<Vec<_>>();
    json!({ "coordinates": coordinates })
}

/// Decodes the first route's geometry and takes its summary as-is.
pub fn parse_response(body: &str) -> Result<Route, DirectionsError> {
    let response: DirectionsResponse = serde_json::from_str(body)
        .map_err(|err| DirectionsError::RouteParseFailed(err.to_string()))?;

    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| DirectionsError::RouteParseFailed("no routes in response".to_string()))?;

    let geometry = route
        .geometry
        .ok_or_else(|| DirectionsError::RouteParseFailed("route has no geometry".to_string()))?;

    let coordinates = polyline::decode(&geometry)?;
    if let Some(index) = coordinates.iter().position(|point| !point.is_valid()) {
        return Err(DirectionsError::RouteParseFailed(format!(
            "geometry vertex {} is out of range",
            index
        )));
    }

    Ok(Route {
        coordinates,
        summary: route.summary.unwrap_or_default(),
    })
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<RouteBody>,
}

#[derive(Debug, Deserialize)]
struct RouteBody {
    geometry: Option<String>,
    summary: Option<RouteSummary>,
}
