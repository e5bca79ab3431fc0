//! openrouteservice HTTP adapter: configuration and JSON transport.

use std::fmt;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};

use crate::error::{ConfigError, UpstreamError};
use crate::model::Coordinate;
use crate::traits::JsonTransport;

/// Where the vehicle returns after the last delivery.
pub const DEFAULT_DEPOT: Coordinate = Coordinate::new(46.665481, 11.158797);

#[derive(Clone)]
pub struct OrsConfig {
    pub base_url: String,
    pub profile: String,
    /// Sent verbatim in the `Authorization` header.
    pub api_key: String,
    pub timeout_secs: u64,
    pub depot: Coordinate,
}

impl Default for OrsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openrouteservice.org".to_string(),
            profile: "driving-car".to_string(),
            api_key: String::new(),
            timeout_secs: 20,
            depot: DEFAULT_DEPOT,
        }
    }
}

impl fmt::Debug for OrsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrsConfig")
            .field("base_url", &self.base_url)
            .field("profile", &self.profile)
            .field("api_key", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("depot", &self.depot)
            .finish()
    }
}

impl OrsConfig {
    /// Reads `ORS_API_KEY` (required) plus the optional `ORS_BASE_URL`,
    /// `ORS_PROFILE`, `ORS_TIMEOUT_SECS` and `ORS_DEPOT` ("lat,lon").
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = OrsConfig::default();

        config.api_key = lookup("ORS_API_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        if let Some(base_url) = lookup("ORS_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(profile) = lookup("ORS_PROFILE") {
            config.profile = profile;
        }
        if let Some(timeout) = lookup("ORS_TIMEOUT_SECS") {
            config.timeout_secs = timeout
                .trim()
                .parse()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidValue {
                    key: "ORS_TIMEOUT_SECS",
                    value: timeout.clone(),
                })?;
        }
        if let Some(depot) = lookup("ORS_DEPOT") {
            config.depot = parse_lat_lon(&depot).ok_or(ConfigError::InvalidValue {
                key: "ORS_DEPOT",
                value: depot.clone(),
            })?;
        }

        Ok(config)
    }

    pub fn optimization_url(&self) -> String {
        format!("{}/optimization", self.base_url)
    }

    pub fn directions_url(&self) -> String {
        format!("{}/v2/directions/{}", self.base_url, self.profile)
    }
}

fn parse_lat_lon(value: &str) -> Option<Coordinate> {
    let (lat, lon) = value.split_once(',')?;
    let coordinate = Coordinate::new(lat.trim().parse().ok()?, lon.trim().parse().ok()?);
    coordinate.is_valid().then_some(coordinate)
}

/// Blocking JSON transport with the API key and a per-request timeout.
#[derive(Debug, Clone)]
pub struct OrsTransport {
    client: reqwest::blocking::Client,
}

impl OrsTransport {
    pub fn new(config: &OrsConfig) -> Result<Self, ConfigError> {
        let mut auth =
            HeaderValue::from_str(&config.api_key).map_err(|_| ConfigError::InvalidValue {
                key: "ORS_API_KEY",
                value: "<redacted>".to_string(),
            })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }
}

impl JsonTransport for OrsTransport {
    fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<String, UpstreamError> {
        tracing::debug!(url, "POST");

        self.client
            .post(url)
            .json(body)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.text())
            .map_err(|err| {
                let err = UpstreamError::from_reqwest(url, err);
                tracing::warn!(error = %err, "upstream request failed");
                err
            })
    }
}
