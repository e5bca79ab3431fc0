//! Test fixtures for delivery-router.
//!
//! Provides:
//! - Real Merano (South Tyrol) addresses and positions
//! - A recording JSON transport with canned openrouteservice responses

#![allow(dead_code, unused_imports)]

pub mod merano_locations;
pub mod transport;

pub use merano_locations::*;
pub use transport::*;
