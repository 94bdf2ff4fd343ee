//! Data models for `TripKML`
//!
//! - Coordinate: validated latitude/longitude pair
//! - Waypoint: named point with an optional date
//! - `WaypointGroup` / Trip: the containers passed between pipeline stages

pub mod coordinate;
pub mod waypoint;

// Re-export all public types for convenient access
pub use coordinate::{Coordinate, CoordinateError};
pub use waypoint::{GroupLabel, Trip, Waypoint, WaypointGroup, normalize_name};
