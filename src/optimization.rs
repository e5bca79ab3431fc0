//! VRP optimization client.
//!
//! Turns the selected addresses into VROOM-style jobs for one delivery van,
//! posts them to the optimization endpoint and reads back the visiting order
//! of the first route.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::OptimizationError;
use crate::model::{Address, Coordinate, DeliveryJob, LonLat, OptimizedStop, Vehicle};
use crate::ors::OrsConfig;
use crate::traits::{JsonTransport, RouteOptimizer};

#[derive(Debug, Clone)]
pub struct OptimizationClient<T> {
    transport: T,
    url: String,
    profile: String,
}

impl<T: JsonTransport> OptimizationClient<T> {
    pub fn new(transport: T, config: &OrsConfig) -> Self {
        Self {
            transport,
            url: config.optimization_url(),
            profile: config.profile.clone(),
        }
    }
}

impl<T: JsonTransport> RouteOptimizer for OptimizationClient<T> {
    fn optimize(
        &self,
        addresses: &[Address],
        vehicle_start: Coordinate,
        vehicle_end: Coordinate,
    ) -> Result<Vec<OptimizedStop>, OptimizationError> {
        if addresses.is_empty() {
            return Ok(Vec::new());
        }

        let jobs = DeliveryJob::from_addresses(addresses);
        let vehicle = Vehicle::delivery_van(vehicle_start, vehicle_end);
        let body = build_request(&jobs, &vehicle, &self.profile);

        tracing::debug!(jobs = jobs.len(), url = %self.url, "requesting optimization");
        let response = self.transport.post_json(&self.url, &body)?;

        let stops = parse_response(&response)?;
        tracing::debug!(stops = stops.len(), "optimization returned");
        Ok(stops)
    }
}

/// Builds the `{jobs, vehicles}` request body. Every location is written
/// longitude first.
pub fn build_request(jobs: &[DeliveryJob], vehicle: &Vehicle, profile: &str) -> Value {
    let jobs = jobs
        .iter()
        .map(|job| {
            json!({
                "id": job.id,
                "location": LonLat::from(job.location),
                "service": job.service_duration_secs,
                "delivery": [job.demand],
                "skills": job.required_skills,
            })
        })
        .collect::<Vec<_>>();

    json!({
        "jobs": jobs,
        "vehicles": [{
            "id": vehicle.id,
            "profile": profile,
            "start": LonLat::from(vehicle.start),
            "end": LonLat::from(vehicle.end),
            "capacity": [vehicle.capacity],
            "skills": vehicle.skills,
        }],
    })
}

/// Reads the job steps of the first route, in visiting order.
///
/// `start` and `end` steps mark the vehicle's own positions and are skipped;
/// untyped steps are treated as jobs.
pub fn parse_response(body: &str) -> Result<Vec<OptimizedStop>, OptimizationError> {
    let response: OptimizationResponse =
        serde_json::from_str(body).map_err(|err| OptimizationError::Malformed(err.to_string()))?;

    if !response.unassigned.is_empty() {
        let ids = response
            .unassigned
            .iter()
            .filter_map(|job| job.id)
            .collect::<Vec<_>>();
        tracing::warn!(?ids, "optimizer left jobs unassigned");
    }

    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or(OptimizationError::EmptyRoute)?;

    let stops = route
        .steps
        .into_iter()
        .filter(|step| !matches!(step.kind.as_deref(), Some("start" | "end" | "break")))
        .map(|step| -> Result<OptimizedStop, OptimizationError> {
            let location = step.location.ok_or_else(|| {
                OptimizationError::Malformed("step without location".to_string())
            })?;
            let location = Coordinate::from(location);
            if !location.is_valid() {
                return Err(OptimizationError::Malformed(format!(
                    "step location ({}, {}) is out of range",
                    location.latitude, location.longitude
                )));
            }
            Ok(OptimizedStop {
                job_id: step.id.or(step.job),
                location,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if stops.is_empty() {
        return Err(OptimizationError::EmptyRoute);
    }
    Ok(stops)
}

#[derive(Debug, Deserialize)]
struct OptimizationResponse {
    #[serde(default)]
    routes: Vec<OptimizedRouteBody>,
    #[serde(default)]
    unassigned: Vec<UnassignedJob>,
}

#[derive(Debug, Deserialize)]
struct OptimizedRouteBody {
    #[serde(default)]
    steps: Vec<StepBody>,
}

#[derive(Debug, Deserialize)]
struct StepBody {
    #[serde(rename = "type")]
    kind: Option<String>,
    location: Option<LonLat>,
    id: Option<u64>,
    /// Older VROOM releases name the job id `job`.
    job: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct UnassignedJob {
    id: Option<u64>,
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::error::UpstreamError;

    struct CannedTransport {
        response: Result<String, UpstreamError>,
        requests: RefCell<Vec<(String, Value)>>,
    }

    impl CannedTransport {
        fn new(response: Result<&str, UpstreamError>) -> Self {
            Self {
                response: response.map(str::to_string),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl JsonTransport for CannedTransport {
        fn post_json(&self, url: &str, body: &Value) -> Result<String, UpstreamError> {
            self.requests.borrow_mut().push((url.to_string(), body.clone()));
            self.response.clone()
        }
    }

    fn address(number: &str, lat: f64, lon: f64) -> Address {
        Address {
            street: "Rennweg".to_string(),
            housenumber: number.to_string(),
            city: "Meran - Merano".to_string(),
            postcode: "39012".to_string(),
            lat,
            lon,
        }
    }

    const VROOM_RESPONSE: &str = r#"{
        "code": 0,
        "summary": {"cost": 812, "routes": 1, "unassigned": 0},
        "unassigned": [],
        "routes": [{
            "vehicle": 1,
            "steps": [
                {"type": "start", "location": [11.154579, 46.67978], "arrival": 0},
                {"type": "job", "location": [11.1668508, 46.6581182], "id": 2, "job": 2, "service": 90},
                {"type": "job", "location": [11.1627272, 46.6666934], "id": 1, "job": 1, "service": 90},
                {"type": "end", "location": [11.158797, 46.665481], "arrival": 812}
            ]
        }]
    }"#;

    #[test]
    fn test_request_shape_and_axis_order() {
        let addresses = vec![address("1", 46.6666934, 11.1627272), address("2", 46.6581182, 11.1668508)];
        let jobs = DeliveryJob::from_addresses(&addresses);
        let vehicle = Vehicle::delivery_van(
            Coordinate::new(46.67978, 11.154579),
            Coordinate::new(46.665481, 11.158797),
        );

        let body = build_request(&jobs, &vehicle, "driving-car");

        assert_eq!(
            body["jobs"][0],
            json!({"id": 1, "location": [11.1627272, 46.6666934], "service": 90, "delivery": [1], "skills": [1]})
        );
        assert_eq!(body["jobs"][1]["id"], 2);
        assert_eq!(
            body["vehicles"],
            json!([{
                "id": 1,
                "profile": "driving-car",
                "start": [11.154579, 46.67978],
                "end": [11.158797, 46.665481],
                "capacity": [4],
                "skills": [1],
            }])
        );
    }

    #[test]
    fn test_parse_keeps_job_steps_in_order() {
        let stops = parse_response(VROOM_RESPONSE).unwrap();
        assert_eq!(
            stops,
            vec![
                OptimizedStop {
                    job_id: Some(2),
                    location: Coordinate::new(46.6581182, 11.1668508),
                },
                OptimizedStop {
                    job_id: Some(1),
                    location: Coordinate::new(46.6666934, 11.1627272),
                },
            ]
        );
    }

    #[test]
    fn test_parse_untyped_steps_are_jobs() {
        let body = r#"{"routes": [{"steps": [{"location": [11.16, 46.66]}, {"location": [11.17, 46.65]}]}]}"#;
        let stops = parse_response(body).unwrap();
        assert_eq!(stops.len(), 2);
        assert_eq!(stops[0].location, Coordinate::new(46.66, 11.16));
        assert_eq!(stops[0].job_id, None);
    }

    #[test]
    fn test_parse_failures() {
        assert_eq!(parse_response(r#"{"routes": []}"#), Err(OptimizationError::EmptyRoute));
        assert_eq!(parse_response(r#"{"code": 0}"#), Err(OptimizationError::EmptyRoute));
        assert_eq!(
            parse_response(r#"{"routes": [{"steps": [{"type": "start", "location": [0, 0]}]}]}"#),
            Err(OptimizationError::EmptyRoute)
        );
        assert!(matches!(parse_response("<html>"), Err(OptimizationError::Malformed(_))));
        assert!(matches!(
            parse_response(r#"{"routes": [{"steps": [{"type": "job", "id": 1}]}]}"#),
            Err(OptimizationError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_rejects_out_of_range_location() {
        let body = r#"{"routes": [{"steps": [
            {"type": "job", "id": 1, "location": [11.16, 46.66]},
            {"type": "job", "id": 2, "location": [900.0, 500.0]}
        ]}]}"#;
        assert_eq!(
            parse_response(body),
            Err(OptimizationError::Malformed(
                "step location (500, 900) is out of range".to_string()
            ))
        );
    }

    #[test]
    fn test_optimize_posts_to_configured_endpoint() {
        let config = OrsConfig {
            base_url: "http://ors.test".to_string(),
            ..OrsConfig::default()
        };
        let client = OptimizationClient::new(CannedTransport::new(Ok(VROOM_RESPONSE)), &config);

        let stops = client
            .optimize(
                &[address("1", 46.6666934, 11.1627272), address("2", 46.6581182, 11.1668508)],
                Coordinate::new(46.67978, 11.154579),
                config.depot,
            )
            .unwrap();

        assert_eq!(stops.len(), 2);
        let requests = client.transport.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, "http://ors.test/optimization");
        assert_eq!(requests[0].1["jobs"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_optimize_surfaces_upstream_status() {
        let status = UpstreamError::Status {
            url: "http://ors.test/optimization".to_string(),
            status: 401,
        };
        let client = OptimizationClient::new(
            CannedTransport::new(Err(status.clone())),
            &OrsConfig::default(),
        );

        let err = client
            .optimize(&[address("1", 46.66, 11.16)], Coordinate::new(46.68, 11.15), DEFAULT_END)
            .unwrap_err();
        assert_eq!(err, OptimizationError::Upstream(status));
        assert_eq!(client.transport.requests.borrow().len(), 1);
    }

    #[test]
    fn test_optimize_without_addresses_skips_request() {
        let client = OptimizationClient::new(CannedTransport::new(Ok("{}")), &OrsConfig::default());
        let stops = client
            .optimize(&[], Coordinate::new(46.68, 11.15), DEFAULT_END)
            .unwrap();
        assert!(stops.is_empty());
        assert!(client.transport.requests.borrow().is_empty());
    }

    const DEFAULT_END: Coordinate = crate::ors::DEFAULT_DEPOT;
}
