//! `TripKML` - Convert saved itinerary web pages into KML placemark files
//!
//! This library provides the extraction pipeline that turns the embedded
//! hydration data of a captured trip page into waypoints, groups them by
//! date and renders each group as a KML document.

pub mod config;
pub mod convert;
pub mod error;
pub mod extract;
pub mod grouping;
pub mod kml;
pub mod models;

// Re-export core types for public API
pub use config::TripKmlConfig;
pub use convert::{
    Conversion, ConvertOptions, OutputFile, convert_document, derive_base_name, plan_outputs,
};
pub use error::TripKmlError;
pub use extract::{Extraction, ExtractionReport, ExtractionWarning, extract_trip};
pub use grouping::group_waypoints;
pub use kml::{RenderOptions, render_group};
pub use models::{Coordinate, GroupLabel, Trip, Waypoint, WaypointGroup};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TripKmlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
