//! In-process stand-in for the openrouteservice HTTP API.

use std::sync::Mutex;
use std::sync::mpsc::{Receiver, Sender};

use serde_json::{Value, json};

use delivery_router::error::UpstreamError;
use delivery_router::traits::JsonTransport;

/// Geometry of a three-vertex path (decodes to 38.5,-120.2 / 40.7,-120.95 / 43.252,-126.453).
pub const THREE_POINT_GEOMETRY: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

pub const BASE_URL: &str = "http://ors.test";

/// One recorded POST.
#[derive(Debug, Clone)]
pub struct Call {
    pub url: String,
    pub body: Value,
}

/// Answers optimization and directions requests with canned bodies and
/// records every call.
pub struct RecordingTransport {
    optimization: Mutex<Result<String, u16>>,
    directions: Mutex<Result<String, u16>>,
    calls: Mutex<Vec<Call>>,
}

impl RecordingTransport {
    pub fn new(optimization: Result<Value, u16>, directions: Result<Value, u16>) -> Self {
        Self {
            optimization: Mutex::new(optimization.map(|body| body.to_string())),
            directions: Mutex::new(directions.map(|body| body.to_string())),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Replaces the canned directions answer (a body or an HTTP status).
    pub fn answer_directions(&self, directions: Result<Value, u16>) {
        *self.directions.lock().unwrap() = directions.map(|body| body.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, suffix: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.url.ends_with(suffix))
            .collect()
    }
}

impl JsonTransport for RecordingTransport {
    fn post_json(&self, url: &str, body: &Value) -> Result<String, UpstreamError> {
        self.calls.lock().unwrap().push(Call {
            url: url.to_string(),
            body: body.clone(),
        });

        let canned = if url.ends_with("/optimization") {
            self.optimization.lock().unwrap().clone()
        } else {
            self.directions.lock().unwrap().clone()
        };
        canned.map_err(|status| UpstreamError::Status {
            url: url.to_string(),
            status,
        })
    }
}

/// Holds back optimization requests matching `blocks` until released.
pub struct GatedTransport<T> {
    inner: T,
    blocks: fn(&Value) -> bool,
    entered: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

impl<T> GatedTransport<T> {
    pub fn new(
        inner: T,
        blocks: fn(&Value) -> bool,
        entered: Sender<()>,
        release: Receiver<()>,
    ) -> Self {
        Self {
            inner,
            blocks,
            entered: Mutex::new(entered),
            release: Mutex::new(release),
        }
    }
}

impl<T: JsonTransport> JsonTransport for GatedTransport<T> {
    fn post_json(&self, url: &str, body: &Value) -> Result<String, UpstreamError> {
        if (self.blocks)(body) {
            let _ = self.entered.lock().unwrap().send(());
            let _ = self.release.lock().unwrap().recv();
        }
        self.inner.post_json(url, body)
    }
}

/// Optimizer body whose route visits `locations` (`[lon, lat]`) in order,
/// framed by start and end steps.
pub fn optimization_response(jobs: &[(u64, [f64; 2])]) -> Value {
    let mut steps = vec![json!({
        "type": "start",
        "location": [11.1545789, 46.67978],
        "arrival": 0
    })];
    steps.extend(jobs.iter().map(|(id, location)| {
        json!({"type": "job", "id": id, "job": id, "location": location, "service": 90})
    }));
    steps.push(json!({"type": "end", "location": [11.158797, 46.665481], "arrival": 900}));

    json!({
        "code": 0,
        "summary": {"cost": 900, "routes": 1, "unassigned": 0},
        "unassigned": [],
        "routes": [{"vehicle": 1, "cost": 900, "steps": steps}],
    })
}

pub fn directions_response(geometry: &str, distance: f64, duration: f64) -> Value {
    json!({
        "routes": [{
            "summary": {"distance": distance, "duration": duration},
            "geometry": geometry,
            "way_points": [0, 2],
        }],
        "metadata": {"service": "routing"},
    })
}
