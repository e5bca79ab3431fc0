//! Error types for each stage of the planning pipeline.

use std::fmt;

use crate::model::Coordinate;

/// Malformed encoded polyline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Input ended in the middle of a value.
    Truncated { index: usize },
    /// Byte outside the polyline alphabet (`?` through `~`).
    InvalidCharacter { index: usize, byte: u8 },
    /// Value has more chunks than fit in 64 bits.
    Overflow { index: usize },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Truncated { index } => {
                write!(f, "polyline truncated at byte {}", index)
            }
            DecodeError::InvalidCharacter { index, byte } => {
                write!(f, "invalid polyline byte 0x{:02x} at {}", byte, index)
            }
            DecodeError::Overflow { index } => {
                write!(f, "polyline value overflows at byte {}", index)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// A remote service call that did not produce a usable HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// Non-2xx status.
    Status { url: String, status: u16 },
    Timeout { url: String },
    /// Connection, TLS or body transfer failure.
    Transport { url: String, message: String },
}

impl UpstreamError {
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, UpstreamError::Timeout { .. })
    }

    /// Classifies a reqwest failure for `url`.
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout {
                url: url.to_string(),
            }
        } else if let Some(status) = err.status() {
            UpstreamError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            UpstreamError::Transport {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamError::Status { url, status } => {
                write!(f, "{} responded with status {}", url, status)
            }
            UpstreamError::Timeout { url } => write!(f, "{} timed out", url),
            UpstreamError::Transport { url, message } => {
                write!(f, "request to {} failed: {}", url, message)
            }
        }
    }
}

impl std::error::Error for UpstreamError {}

/// The optimizer could not produce a visiting order.
#[derive(Debug, Clone, PartialEq)]
pub enum OptimizationError {
    Upstream(UpstreamError),
    /// Response body did not have the expected shape.
    Malformed(String),
    /// No route, or a route without job steps.
    EmptyRoute,
}

impl fmt::Display for OptimizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizationError::Upstream(err) => write!(f, "optimization failed: {}", err),
            OptimizationError::Malformed(message) => {
                write!(f, "optimization failed: malformed response: {}", message)
            }
            OptimizationError::EmptyRoute => {
                write!(f, "optimization failed: response contained no stops")
            }
        }
    }
}

impl std::error::Error for OptimizationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OptimizationError::Upstream(err) => Some(err),
            _ => None,
        }
    }
}

impl From<UpstreamError> for OptimizationError {
    fn from(err: UpstreamError) -> Self {
        OptimizationError::Upstream(err)
    }
}

/// The directions service could not produce a drivable route.
#[derive(Debug, Clone, PartialEq)]
pub enum DirectionsError {
    Upstream(UpstreamError),
    /// Empty routes array, missing geometry or an unexpected body.
    RouteParseFailed(String),
    Decode(DecodeError),
}

impl fmt::Display for DirectionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectionsError::Upstream(err) => write!(f, "directions failed: {}", err),
            DirectionsError::RouteParseFailed(message) => {
                write!(f, "directions failed: {}", message)
            }
            DirectionsError::Decode(err) => write!(f, "directions failed: {}", err),
        }
    }
}

impl std::error::Error for DirectionsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DirectionsError::Upstream(err) => Some(err),
            DirectionsError::Decode(err) => Some(err),
            DirectionsError::RouteParseFailed(_) => None,
        }
    }
}

impl From<UpstreamError> for DirectionsError {
    fn from(err: UpstreamError) -> Self {
        DirectionsError::Upstream(err)
    }
}

impl From<DecodeError> for DirectionsError {
    fn from(err: DecodeError) -> Self {
        DirectionsError::Decode(err)
    }
}

/// Failure of a whole planning invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanError {
    InvalidCoordinate(Coordinate),
    Optimization(OptimizationError),
    Directions(DirectionsError),
}

impl PlanError {
    /// The upstream failure behind this error, if any.
    pub fn upstream(&self) -> Option<&UpstreamError> {
        match self {
            PlanError::Optimization(OptimizationError::Upstream(err))
            | PlanError::Directions(DirectionsError::Upstream(err)) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::InvalidCoordinate(coordinate) => write!(
                f,
                "coordinate out of range: ({}, {})",
                coordinate.latitude, coordinate.longitude
            ),
            PlanError::Optimization(err) => fmt::Display::fmt(err, f),
            PlanError::Directions(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl std::error::Error for PlanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlanError::InvalidCoordinate(_) => None,
            PlanError::Optimization(err) => Some(err),
            PlanError::Directions(err) => Some(err),
        }
    }
}

impl From<OptimizationError> for PlanError {
    fn from(err: OptimizationError) -> Self {
        PlanError::Optimization(err)
    }
}

impl From<DirectionsError> for PlanError {
    fn from(err: DirectionsError) -> Self {
        PlanError::Directions(err)
    }
}

/// Invalid or missing configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingApiKey,
    InvalidValue { key: &'static str, value: String },
    Client(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingApiKey => write!(f, "ORS_API_KEY is not set"),
            ConfigError::InvalidValue { key, value } => {
                write!(f, "invalid value for {}: {:?}", key, value)
            }
            ConfigError::Client(message) => write!(f, "cannot build HTTP client: {}", message),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<reqwest::Error> for ConfigError {
    fn from(err: reqwest::Error) -> Self {
        ConfigError::Client(err.to_string())
    }
}
