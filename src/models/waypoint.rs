//! Waypoints, groups and the trip container

use super::Coordinate;
use crate::TripKmlError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One named place of interest
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Waypoint {
    name: String,
    coordinate: Coordinate,
    date: Option<NaiveDate>,
    source_order: usize,
}

impl Waypoint {
    /// Create a waypoint; the name is trimmed and must not be empty
    pub fn new(
        name: &str,
        coordinate: Coordinate,
        date: Option<NaiveDate>,
        source_order: usize,
    ) -> crate::Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TripKmlError::validation("waypoint name is empty"));
        }
        Ok(Self {
            name: name.to_string(),
            coordinate,
            date,
            source_order,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// Position of the first occurrence in the source document
    #[must_use]
    pub fn source_order(&self) -> usize {
        self.source_order
    }

    /// Key under which two raw entries count as the same place
    #[must_use]
    pub fn dedup_key(&self, precision: u32) -> (String, (i64, i64)) {
        (normalize_name(&self.name), self.coordinate.rounded(precision))
    }
}

/// Trim, collapse inner whitespace and lowercase a display name
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Label shared by the members of a [`WaypointGroup`]
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupLabel {
    /// Every waypoint, non-split mode
    Combined,
    /// Waypoints visited on one calendar day
    Date(NaiveDate),
    /// Waypoints without a date, split mode
    NoDate,
}

impl fmt::Display for GroupLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupLabel::Combined => f.write_str("combined"),
            GroupLabel::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            GroupLabel::NoDate => f.write_str("no date"),
        }
    }
}

/// Named, ordered run of waypoints
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WaypointGroup {
    pub label: GroupLabel,
    pub waypoints: Vec<Waypoint>,
}

impl WaypointGroup {
    #[must_use]
    pub fn new(label: GroupLabel, waypoints: Vec<Waypoint>) -> Self {
        Self { label, waypoints }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

/// Top-level container parsed from one document
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Trip {
    /// Trip title, when the page carries one
    pub title: Option<String>,
    /// All waypoints in itinerary order
    pub waypoints: Vec<Waypoint>,
}

impl Trip {
    #[must_use]
    pub fn new(title: Option<String>, waypoints: Vec<Waypoint>) -> Self {
        Self { title, waypoints }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinate() -> Coordinate {
        Coordinate::new(48.8606, 2.3376).unwrap()
    }

    #[test]
    fn test_waypoint_name_is_trimmed() {
        let wp = Waypoint::new("  Louvre ", coordinate(), None, 0).unwrap();
        assert_eq!(wp.name(), "Louvre");
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let result = Waypoint::new("   ", coordinate(), None, 0);
        assert!(matches!(result, Err(TripKmlError::Validation { .. })));
    }

    #[test]
    fn test_deserialized_waypoint_keeps_coordinate_range() {
        let result = serde_json::from_str::<Waypoint>(
            r#"{"name": "Broken", "coordinate": {"latitude": 200.0, "longitude": 0.0},
                "date": null, "source_order": 0}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_dedup_key_normalizes_name() {
        let a = Waypoint::new("Musée  du Louvre", coordinate(), None, 0).unwrap();
        let b = Waypoint::new("musée du LOUVRE", coordinate(), None, 3).unwrap();
        assert_eq!(a.dedup_key(6), b.dedup_key(6));
    }

    #[test]
    fn test_group_label_display_and_order() {
        let d1 = NaiveDate::from_ymd_opt(2023, 6, 15).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2023, 6, 16).unwrap();
        assert_eq!(GroupLabel::Date(d1).to_string(), "2023-06-15");
        assert_eq!(GroupLabel::NoDate.to_string(), "no date");
        assert_eq!(GroupLabel::Combined.to_string(), "combined");
        assert!(GroupLabel::Date(d1) < GroupLabel::Date(d2));
        assert!(GroupLabel::Date(d2) < GroupLabel::NoDate);
    }
}
