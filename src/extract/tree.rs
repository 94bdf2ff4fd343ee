//! Schema-agnostic walk over a parsed JSON payload

use serde_json::{Map, Value};
use std::collections::VecDeque;

use super::{BlockParse, PayloadParser, RawPlace};

const NAME_KEYS: &[&str] = &["name", "placeName", "displayName", "title"];
const COORDINATE_KEYS: &[(&str, &str)] = &[
    ("lat", "lng"),
    ("lat", "lon"),
    ("lat", "long"),
    ("latitude", "longitude"),
];
/// Where a place keeps its coordinates when they are not top-level
const NESTED_LOCATION_KEYS: &[&str] = &["geometry", "location", "coordinates", "position", "geo"];
const DATE_KEYS: &[&str] = &["date", "associatedDate", "startDate"];
const TRIP_TITLE_KEYS: &[&str] = &["tripTitle", "title"];

/// Finds place-shaped objects anywhere in a JSON document
pub struct TreeScanner;

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn string_field<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| map.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
}

fn coordinates_of(map: &Map<String, Value>, depth: u8) -> Option<(f64, f64)> {
    let direct = COORDINATE_KEYS.iter().find_map(|(lat_key, lon_key)| {
        Some((number(map.get(*lat_key)?)?, number(map.get(*lon_key)?)?))
    });
    if direct.is_some() || depth == 0 {
        return direct;
    }
    NESTED_LOCATION_KEYS
        .iter()
        .filter_map(|key| map.get(*key).and_then(Value::as_object))
        .find_map(|inner| coordinates_of(inner, depth - 1))
}

/// Name key present and a numeric coordinate pair reachable
fn as_place(map: &Map<String, Value>) -> Option<RawPlace> {
    if !NAME_KEYS.iter().any(|key| map.contains_key(*key)) {
        return None;
    }
    let (latitude, longitude) = coordinates_of(map, 2)?;
    Some(RawPlace {
        name: string_field(map, NAME_KEYS).map(str::to_string),
        latitude: Some(latitude),
        longitude: Some(longitude),
        date: string_field(map, DATE_KEYS).map(str::to_string),
    })
}

/// Depth-first, document order. Dates on enclosing objects flow down to
/// the places nested in them unless the place carries its own.
fn collect(value: &Value, inherited_date: Option<&str>, places: &mut Vec<RawPlace>) {
    match value {
        Value::Object(map) => {
            if let Some(mut place) = as_place(map) {
                if place.date.is_none() {
                    place.date = inherited_date.map(str::to_string);
                }
                places.push(place);
                return;
            }
            let date = string_field(map, DATE_KEYS).or(inherited_date);
            for child in map.values() {
                collect(child, date, places);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect(item, inherited_date, places);
            }
        }
        _ => {}
    }
}

/// Shallowest title-like string outside of place objects
fn find_title(root: &Value) -> Option<String> {
    let mut queue = VecDeque::from([root]);
    while let Some(value) = queue.pop_front() {
        match value {
            Value::Object(map) => {
                if as_place(map).is_some() {
                    continue;
                }
                if let Some(title) = string_field(map, TRIP_TITLE_KEYS) {
                    return Some(title.to_string());
                }
                queue.extend(map.values());
            }
            Value::Array(items) => queue.extend(items),
            _ => {}
        }
    }
    None
}

impl PayloadParser for TreeScanner {
    fn name(&self) -> &'static str {
        "tree"
    }

    fn parse(&self, payload: &str) -> Option<BlockParse> {
        let root: Value = serde_json::from_str(payload).ok()?;
        let mut places = Vec::new();
        collect(&root, None, &mut places);
        Some(BlockParse {
            title: find_title(&root),
            places,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_places_inherit_day_dates() {
        let payload = r#"{
            "trip": {"tripTitle": "Loire castles"},
            "days": [
                {"date": "2023-06-15", "stops": [
                    {"name": "Chambord", "location": {"latitude": 47.6162, "longitude": 1.5170}},
                    {"placeName": "Blois", "lat": "47.5861", "lon": "1.3359", "date": "2023-06-14"}
                ]},
                {"stops": [{"title": "Amboise", "geo": {"lat": 47.4133, "lng": 0.9826}}]}
            ]
        }"#;
        let parsed = TreeScanner.parse(payload).unwrap();
        assert_eq!(parsed.title.as_deref(), Some("Loire castles"));

        let names: Vec<_> = parsed.places.iter().map(|p| p.name.as_deref()).collect();
        assert_eq!(names, vec![Some("Chambord"), Some("Blois"), Some("Amboise")]);

        assert_eq!(parsed.places[0].date.as_deref(), Some("2023-06-15"));
        assert_eq!(parsed.places[1].date.as_deref(), Some("2023-06-14"));
        assert_eq!(parsed.places[1].latitude, Some(47.5861));
        assert_eq!(parsed.places[2].date, None);
    }

    #[test]
    fn test_nested_geometry_is_not_a_separate_place() {
        let payload = r#"[{"name": "Louvre", "geometry": {"location": {"lat": 48.8606, "lng": 2.3376},
            "viewport": {"northeast": {"lat": 48.87, "lng": 2.34}}}}]"#;
        let parsed = TreeScanner.parse(payload).unwrap();
        assert_eq!(parsed.places.len(), 1);
        assert_eq!(parsed.title, None);
    }

    #[test]
    fn test_empty_name_is_still_a_candidate() {
        let parsed = TreeScanner
            .parse(r#"{"items": [{"name": "  ", "lat": 1.0, "lng": 2.0}]}"#)
            .unwrap();
        assert_eq!(parsed.places.len(), 1);
        assert_eq!(parsed.places[0].name, None);
    }

    #[test]
    fn test_objects_without_coordinates_are_ignored() {
        let parsed = TreeScanner
            .parse(r#"{"title": "Notes", "items": [{"name": "Packing list"}, {"lat": 1.0, "lng": 2.0}]}"#)
            .unwrap();
        assert!(parsed.places.is_empty());
        assert_eq!(parsed.title.as_deref(), Some("Notes"));
    }

    #[test]
    fn test_invalid_json_is_declined() {
        assert!(TreeScanner.parse(r#"{"name": "Louvre", "lat": 48.86"#).is_none());
    }
}
