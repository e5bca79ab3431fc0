//! delivery-router
//!
//! Plans a delivery round: orders the selected addresses with a remote VRP
//! optimizer, fetches the driving path through them from a directions
//! service and decodes its polyline geometry for the map.

pub mod address;
pub mod debounce;
pub mod directions;
pub mod error;
pub mod model;
pub mod optimization;
pub mod ors;
pub mod planner;
pub mod polyline;
pub mod session;
pub mod traits;
