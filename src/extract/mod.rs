//! Waypoint extraction
//!
//! This module turns the raw HTML of a saved itinerary page into a [`Trip`]:
//! - Block discovery: every `<script>` payload that looks like JSON
//! - Payload parsing: strict Wanderlog schema, generic JSON walk, regex scan
//! - Normalization: names, coordinate validation, calendar dates
//! - Merge: first-seen deduplication folded across blocks

pub mod blocks;
pub mod dates;
pub mod pattern;
pub mod report;
pub mod schema;
pub mod tree;

use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

use crate::models::{Coordinate, Trip, Waypoint};
use crate::{Result, TripKmlError};

pub use blocks::{PageScan, ScriptBlock, scan_page};
pub use dates::{describe_date, parse_date};
pub use pattern::PatternScanner;
pub use report::{ExtractionReport, ExtractionWarning};
pub use schema::SchemaParser;
pub use tree::TreeScanner;

/// Decimal digits kept when comparing coordinates for duplicates
pub const DEFAULT_COORDINATE_PRECISION: u32 = 6;

/// A place-shaped object as found in a payload, before validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPlace {
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub date: Option<String>,
}

/// What one parser found in one payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockParse {
    pub title: Option<String>,
    pub places: Vec<RawPlace>,
}

/// A strategy for reading place candidates out of a script payload.
///
/// Returning `None` means the payload is not in a shape this parser
/// understands.
pub trait PayloadParser {
    fn name(&self) -> &'static str;
    fn parse(&self, payload: &str) -> Option<BlockParse>;

    /// Text-level fallbacks only run on payloads no earlier parser could read.
    fn is_fallback(&self) -> bool {
        false
    }
}

/// Parsers in the order they are tried on each block
#[must_use]
pub fn default_parsers() -> Vec<Box<dyn PayloadParser>> {
    vec![
        Box::new(SchemaParser),
        Box::new(TreeScanner),
        Box::new(PatternScanner),
    ]
}

/// Tuning knobs for [`extract_trip_with`]
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub coordinate_precision: u32,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            coordinate_precision: DEFAULT_COORDINATE_PRECISION,
        }
    }
}

/// Result of a successful extraction
#[derive(Debug, Clone)]
pub struct Extraction {
    pub trip: Trip,
    pub report: ExtractionReport,
}

/// A validated entry that has not yet been placed in document order
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub name: String,
    pub coordinate: Coordinate,
    pub date: Option<NaiveDate>,
}

/// Independent result for a single script block
#[derive(Debug, Clone, Default)]
pub struct BlockResult {
    pub index: usize,
    pub title: Option<String>,
    /// Place-shaped objects seen, valid or not
    pub place_objects: usize,
    pub candidates: Vec<Candidate>,
    pub report: ExtractionReport,
}

/// Validate one raw place, collecting recoverable problems
fn normalize(
    block: usize,
    raw: RawPlace,
    warnings: &mut Vec<ExtractionWarning>,
) -> Option<Candidate> {
    let Some(name) = raw.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) else {
        warnings.push(ExtractionWarning::MalformedEntry {
            block,
            reason: "place has no name".to_string(),
        });
        return None;
    };

    let coordinate = match (raw.latitude, raw.longitude) {
        (Some(lat), Some(lon)) => Coordinate::new(lat, lon).map_err(|e| e.to_string()),
        _ => Err("missing latitude or longitude".to_string()),
    };
    let coordinate = match coordinate {
        Ok(coordinate) => coordinate,
        Err(reason) => {
            warnings.push(ExtractionWarning::MalformedEntry {
                block,
                reason: format!("'{name}': {reason}"),
            });
            return None;
        }
    };

    let date = raw.date.as_deref().and_then(|value| {
        let parsed = parse_date(value);
        if parsed.is_none() && !value.trim().is_empty() {
            warnings.push(ExtractionWarning::DateParse {
                name: name.to_string(),
                value: value.to_string(),
            });
        }
        parsed
    });

    Some(Candidate {
        name: name.to_string(),
        coordinate,
        date,
    })
}

/// Run the parsers over one block; the first to find places wins.
///
/// Once a structured parser has read the payload, fallbacks are skipped: a
/// valid document without place-shaped objects holds no places.
#[must_use]
pub fn extract_block(block: &ScriptBlock, parsers: &[Box<dyn PayloadParser>]) -> BlockResult {
    let mut understood = false;
    let Some((parser, parsed)) = parsers.iter().find_map(|parser| {
        if understood && parser.is_fallback() {
            return None;
        }
        let parsed = parser.parse(&block.payload)?;
        understood = true;
        (!parsed.places.is_empty()).then(|| (parser.name(), parsed))
    }) else {
        debug!("Block {} holds no place-shaped data", block.index);
        return BlockResult {
            index: block.index,
            report: ExtractionReport {
                blocks_scanned: 1,
                ..Default::default()
            },
            ..Default::default()
        };
    };

    let place_objects = parsed.places.len();
    let mut warnings = Vec::new();
    let candidates: Vec<Candidate> = parsed
        .places
        .into_iter()
        .filter_map(|raw| normalize(block.index, raw, &mut warnings))
        .collect();

    debug!(
        "Block {} parsed by '{}': {} place(s), {} valid",
        block.index,
        parser,
        place_objects,
        candidates.len()
    );

    BlockResult {
        index: block.index,
        title: parsed.title,
        place_objects,
        candidates,
        report: ExtractionReport {
            blocks_scanned: 1,
            parsers_used: vec![(block.index, parser)],
            duplicates: 0,
            warnings,
        },
    }
}

/// Accumulator for the cross-block fold
#[derive(Debug, Default)]
struct Merged {
    title: Option<String>,
    waypoints: Vec<Waypoint>,
    seen: HashSet<(String, (i64, i64))>,
    entries: usize,
    place_objects: usize,
    report: ExtractionReport,
}

impl Merged {
    fn absorb(mut self, block: BlockResult, precision: u32) -> Self {
        self.title = self.title.or(block.title);
        self.place_objects += block.place_objects;

        let mut report = block.report;
        for candidate in block.candidates {
            let order = self.entries;
            self.entries += 1;

            let waypoint = match Waypoint::new(
                &candidate.name,
                candidate.coordinate,
                candidate.date,
                order,
            ) {
                Ok(waypoint) => waypoint,
                Err(e) => {
                    report.warnings.push(ExtractionWarning::MalformedEntry {
                        block: block.index,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            if self.seen.insert(waypoint.dedup_key(precision)) {
                self.waypoints.push(waypoint);
            } else {
                report.duplicates += 1;
            }
        }

        self.report = std::mem::take(&mut self.report).merge(report);
        self
    }
}

/// Extract the trip from a saved itinerary page with default options
pub fn extract_trip(html: &str) -> Result<Extraction> {
    extract_trip_with(html, &ExtractOptions::default())
}

/// Extract the trip from a saved itinerary page.
///
/// Fails with an extraction error when the page holds no place-shaped data,
/// or when every place found was malformed. Individual bad entries are
/// reported, not fatal.
#[instrument(skip(html, options), fields(bytes = html.len()))]
pub fn extract_trip_with(html: &str, options: &ExtractOptions) -> Result<Extraction> {
    let scan = scan_page(html);
    let parsers = default_parsers();

    let merged = scan
        .blocks
        .iter()
        .map(|block| extract_block(block, &parsers))
        .fold(Merged::default(), |acc, block| {
            acc.absorb(block, options.coordinate_precision)
        });

    for warning in &merged.report.warnings {
        warn!("{}", warning);
    }

    if merged.place_objects == 0 {
        return Err(TripKmlError::extraction("no waypoints found"));
    }
    if merged.waypoints.is_empty() {
        return Err(TripKmlError::extraction(format!(
            "no valid waypoints found ({} malformed entries dropped)",
            merged.report.malformed_entries()
        )));
    }

    let title = merged.title.or(scan.html_title);
    info!(
        "Extracted {} waypoint(s) for {:?}: {}",
        merged.waypoints.len(),
        title.as_deref().unwrap_or("untitled trip"),
        merged.report.summary()
    );

    Ok(Extraction {
        trip: Trip::new(title, merged.waypoints),
        report: merged.report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(scripts: &[&str]) -> String {
        let body: String = scripts
            .iter()
            .map(|s| format!("<script>{s}</script>\n"))
            .collect();
        format!("<html><head><title>Weekend – Wanderlog</title></head><body>{body}</body></html>")
    }

    #[test]
    fn test_normalize_reports_problems() {
        let mut warnings = Vec::new();

        let ok = normalize(
            0,
            RawPlace {
                name: Some(" Louvre ".to_string()),
                latitude: Some(48.8606),
                longitude: Some(2.3376),
                date: Some("someday".to_string()),
            },
            &mut warnings,
        )
        .unwrap();
        assert_eq!(ok.name, "Louvre");
        assert_eq!(ok.date, None);
        assert!(matches!(warnings[0], ExtractionWarning::DateParse { .. }));

        let out_of_range = RawPlace {
            name: Some("Nowhere".to_string()),
            latitude: Some(95.0),
            longitude: Some(0.0),
            date: None,
        };
        assert!(normalize(0, out_of_range, &mut warnings).is_none());

        let nameless = RawPlace {
            latitude: Some(1.0),
            longitude: Some(1.0),
            ..Default::default()
        };
        assert!(normalize(0, nameless, &mut warnings).is_none());
        assert_eq!(warnings.len(), 3);
    }

    #[test]
    fn test_duplicates_across_blocks_collapse() {
        let state = r#"window.__STATE__ = {"places": [
            {"name": "Louvre", "lat": 48.8606, "lng": 2.3376},
            {"name": "Orsay", "lat": 48.86, "lng": 2.3266}
        ]};"#;
        let repeat = r#"window.__STATE2__ = {"places": [
            {"name": "louvre ", "lat": 48.86060000001, "lng": 2.3376},
            {"name": "Sainte-Chapelle", "lat": 48.8554, "lng": 2.345}
        ]};"#;
        let extraction = extract_trip(&page(&[state, repeat])).unwrap();

        let names: Vec<_> = extraction.trip.waypoints.iter().map(|w| w.name()).collect();
        assert_eq!(names, vec!["Louvre", "Orsay", "Sainte-Chapelle"]);
        let orders: Vec<_> = extraction.trip.waypoints.iter().map(|w| w.source_order()).collect();
        assert_eq!(orders, vec![0, 1, 3]);
        assert_eq!(extraction.report.duplicates, 1);
        assert_eq!(extraction.report.blocks_scanned, 2);
    }

    #[test]
    fn test_html_title_is_the_fallback() {
        let state = r#"window.__STATE__ = [{"name": "Louvre", "lat": 48.8606, "lng": 2.3376}];"#;
        let extraction = extract_trip(&page(&[state])).unwrap();
        assert_eq!(extraction.trip.title.as_deref(), Some("Weekend"));
    }

    #[test]
    fn test_no_place_data_is_an_error() {
        let result = extract_trip(&page(&[r#"window.__STATE__ = {"user": {"id": 1}};"#]));
        match result {
            Err(TripKmlError::Extraction { message }) => assert_eq!(message, "no waypoints found"),
            other => panic!("expected extraction error, got {other:?}"),
        }
        assert!(extract_trip("<html></html>").is_err());
    }

    #[test]
    fn test_only_malformed_places_is_an_error() {
        let state = r#"window.__STATE__ = [{"name": "Bad", "lat": 123.0, "lng": 2.0}];"#;
        let err = extract_trip(&page(&[state])).unwrap_err();
        assert!(err.to_string().contains("1 malformed"));
    }

    #[test]
    fn test_partial_success_keeps_valid_entries() {
        let state = r#"window.__STATE__ = [
            {"name": "Bad", "lat": 123.0, "lng": 2.0},
            {"name": "Good", "lat": 12.0, "lng": 2.0, "date": "2024-02-30"}
        ];"#;
        let extraction = extract_trip(&page(&[state])).unwrap();
        assert_eq!(extraction.trip.waypoints.len(), 1);
        assert_eq!(extraction.report.malformed_entries(), 1);
        assert_eq!(extraction.report.date_parse_failures(), 1);
        assert_eq!(extraction.trip.waypoints[0].date(), None);
    }

    #[test]
    fn test_valid_json_without_places_skips_pattern_scan() {
        let state = r#"window.__MOBX_STATE__ = {
            "userStore": {"user": {"name": "Alice Smith"}},
            "mapStore": {"center": {"lat": 48.85, "lng": 2.35}}
        };"#;

        let scan = scan_page(&page(&[state]));
        assert_eq!(scan.blocks.len(), 1);
        let result = extract_block(&scan.blocks[0], &default_parsers());
        assert!(result.candidates.is_empty());
        assert!(result.report.parsers_used.is_empty());

        match extract_trip(&page(&[state])) {
            Err(TripKmlError::Extraction { message }) => assert_eq!(message, "no waypoints found"),
            other => panic!("expected extraction error, got {other:?}"),
        }
    }

    #[test]
    fn test_parser_selection_falls_through() {
        let block = ScriptBlock {
            index: 4,
            payload: r#"{"name": "Louvre", "lat": 48.8606, "lng": 2.3376, "#.to_string(),
        };
        let result = extract_block(&block, &default_parsers());
        assert_eq!(result.report.parsers_used, vec![(4, "pattern")]);
        assert_eq!(result.candidates.len(), 1);
    }
}
