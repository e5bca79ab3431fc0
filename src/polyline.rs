//! Encoded polyline geometry.
//!
//! Route geometries arrive from the directions service in the compact
//! polyline format: each point is a pair of zig-zag encoded deltas in
//! 1e-5 degree units, written as 5-bit chunks offset by 63 with 0x20 as
//! the continuation bit. Decoding happens once at the boundary; the rest of
//! the crate only sees [`Coordinate`] sequences.

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::model::Coordinate;

/// Fixed-point scale of the encoding (five decimal places).
const PRECISION: f64 = 1e5;

/// Offset added to each chunk to land in printable ASCII.
const CHUNK_OFFSET: u8 = 63;

const CONTINUATION_BIT: u64 = 0x20;

const CHUNK_MASK: u64 = 0x1f;

/// Shift of the last chunk accepted in one value (60 bits in total).
const MAX_SHIFT: u32 = 55;

/// A route geometry as decoded coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Coordinate>,
}

impl Polyline {
    /// Creates a new Polyline from decoded coordinate points.
    pub fn new(points: Vec<Coordinate>) -> Self {
        Self { points }
    }

    /// Decodes an encoded polyline string.
    pub fn decode(encoded: &str) -> Result<Self, DecodeError> {
        decode(encoded).map(Self::new)
    }

    /// Encodes the points back into the compact string form.
    pub fn encode(&self) -> String {
        encode(&self.points)
    }

    /// Returns a reference to the coordinate points.
    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    /// Consumes the polyline and returns the owned coordinate points.
    pub fn into_points(self) -> Vec<Coordinate> {
        self.points
    }
}

/// Decodes `encoded` into coordinates, in input order.
///
/// The empty string decodes to no points. Input that ends inside a value,
/// contains a byte outside `'?'..='~'`, or carries a value wider than 60 bits
/// is rejected with the byte offset where decoding stopped.
pub fn decode(encoded: &str) -> Result<Vec<Coordinate>, DecodeError> {
    let bytes = encoded.as_bytes();
    let mut points = Vec::with_capacity(bytes.len() / 2);
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while index < bytes.len() {
        let start = index;
        let delta_lat = next_value(bytes, &mut index)?;
        let delta_lng = next_value(bytes, &mut index)?;

        lat = lat
            .checked_add(delta_lat)
            .ok_or(DecodeError::Overflow { index: start })?;
        lng = lng
            .checked_add(delta_lng)
            .ok_or(DecodeError::Overflow { index: start })?;

        points.push(Coordinate::new(lat as f64 / PRECISION, lng as f64 / PRECISION));
    }

    Ok(points)
}

/// Reads one zig-zag varint starting at `index`, leaving `index` on the
/// byte after it.
fn next_value(bytes: &[u8], index: &mut usize) -> Result<i64, DecodeError> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;

    loop {
        let byte = *bytes
            .get(*index)
            .ok_or(DecodeError::Truncated { index: *index })?;
        if !(CHUNK_OFFSET..=126).contains(&byte) {
            return Err(DecodeError::InvalidCharacter {
                index: *index,
                byte,
            });
        }
        if shift > MAX_SHIFT {
            return Err(DecodeError::Overflow { index: *index });
        }

        let chunk = u64::from(byte - CHUNK_OFFSET);
        result |= (chunk & CHUNK_MASK) << shift;
        shift += 5;
        *index += 1;

        if chunk & CONTINUATION_BIT == 0 {
            break;
        }
    }

    let value = if result & 1 == 1 {
        !(result >> 1) as i64
    } else {
        (result >> 1) as i64
    };
    Ok(value)
}

/// Encodes coordinates into the compact polyline form.
///
/// Values are rounded to five decimal places, so `decode(&encode(points))`
/// reproduces `points` to within 1e-5 degrees.
pub fn encode(points: &[Coordinate]) -> String {
    let mut out = String::with_capacity(points.len() * 8);
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for point in points {
        let lat = (point.latitude * PRECISION).round() as i64;
        let lng = (point.longitude * PRECISION).round() as i64;
        write_value(lat.wrapping_sub(prev_lat), &mut out);
        write_value(lng.wrapping_sub(prev_lng), &mut out);
        prev_lat = lat;
        prev_lng = lng;
    }

    out
}

fn write_value(value: i64, out: &mut String) {
    let mut zigzag = ((value << 1) ^ (value >> 63)) as u64;
    while zigzag >= CONTINUATION_BIT {
        out.push(char::from((CONTINUATION_BIT | (zigzag & CHUNK_MASK)) as u8 + CHUNK_OFFSET));
        zigzag >>= 5;
    }
    out.push(char::from(zigzag as u8 + CHUNK_OFFSET));
}
