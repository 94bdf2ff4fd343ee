//! Conversion orchestration
//!
//! Composes extraction, grouping and rendering and decides the output file
//! names. Nothing here touches the filesystem; callers persist the returned
//! [`OutputFile`]s.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::info;

use crate::Result;
use crate::extract::{ExtractOptions, ExtractionReport, extract_trip_with};
use crate::grouping::group_waypoints;
use crate::kml::{RenderOptions, render_group};
use crate::models::{GroupLabel, Trip};

static UNSAFE_FILE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w-]").expect("file name pattern is valid"));

const FALLBACK_BASE_NAME: &str = "trip";

/// How a trip is turned into files
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// One file per date plus a dateless file, instead of one combined file
    pub split: bool,
    /// Prefix shared by every output file name
    pub base_name: String,
    pub render: RenderOptions,
    pub extract: ExtractOptions,
}

impl ConvertOptions {
    #[must_use]
    pub fn new(base_name: &str, split: bool) -> Self {
        Self {
            split,
            base_name: base_name.to_string(),
            render: RenderOptions::default(),
            extract: ExtractOptions::default(),
        }
    }
}

/// A rendered document and the name it should be stored under
#[derive(Debug, Clone, PartialEq)]
pub struct OutputFile {
    pub file_name: String,
    pub label: GroupLabel,
    pub placemarks: usize,
    pub contents: String,
}

/// Everything produced from one input document
#[derive(Debug, Clone)]
pub struct Conversion {
    pub trip: Trip,
    pub outputs: Vec<OutputFile>,
    pub report: ExtractionReport,
}

/// File name for a group: `{base}_combined.kml`, `{base}_YYYY_MM_DD.kml`
/// or `{base}_no_date.kml`
#[must_use]
pub fn file_name_for(base: &str, label: GroupLabel) -> String {
    match label {
        GroupLabel::Combined => format!("{base}_combined.kml"),
        GroupLabel::Date(date) => format!("{base}_{}.kml", date.format("%Y_%m_%d")),
        GroupLabel::NoDate => format!("{base}_no_date.kml"),
    }
}

/// Output base name: the explicit override, else the input file stem.
/// Characters other than word characters and `-` become `_`.
#[must_use]
pub fn derive_base_name(input: &Path, override_name: Option<&str>) -> String {
    let raw = match override_name {
        Some(name) => name.trim().to_string(),
        None => input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    let sanitized = UNSAFE_FILE_CHARS.replace_all(&raw, "_").into_owned();
    if sanitized.is_empty() {
        FALLBACK_BASE_NAME.to_string()
    } else {
        sanitized
    }
}

/// Decide the set of documents to emit for a trip
pub fn plan_outputs(trip: &Trip, options: &ConvertOptions) -> Result<Vec<OutputFile>> {
    group_waypoints(&trip.waypoints, options.split)
        .into_iter()
        .map(|group| {
            let contents = render_group(trip, &group, &options.render)?;
            Ok(OutputFile {
                file_name: file_name_for(&options.base_name, group.label),
                label: group.label,
                placemarks: group.len(),
                contents,
            })
        })
        .collect()
}

/// Run the whole pipeline on a document's text
pub fn convert_document(html: &str, options: &ConvertOptions) -> Result<Conversion> {
    let extraction = extract_trip_with(html, &options.extract)?;
    let outputs = plan_outputs(&extraction.trip, options)?;
    info!(
        "Planned {} KML file(s) for {} waypoint(s)",
        outputs.len(),
        extraction.trip.waypoints.len()
    );
    Ok(Conversion {
        trip: extraction.trip,
        outputs,
        report: extraction.report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinate, Waypoint};
    use chrono::NaiveDate;
    use rstest::rstest;
    use std::path::PathBuf;

    #[rstest]
    #[case("saved/Paris trip.html", None, "Paris_trip")]
    #[case("saved/paris.html", Some("my-trip"), "my-trip")]
    #[case("saved/paris.html", Some("a/b c"), "a_b_c")]
    #[case("saved/Été à Paris.html", None, "Été_à_Paris")]
    #[case("saved/.html", Some("  "), "trip")]
    fn test_derive_base_name(
        #[case] input: &str,
        #[case] override_name: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(derive_base_name(&PathBuf::from(input), override_name), expected);
    }

    #[test]
    fn test_file_names() {
        let date = NaiveDate::from_ymd_opt(2023, 6, 5).unwrap();
        assert_eq!(file_name_for("x", GroupLabel::Combined), "x_combined.kml");
        assert_eq!(file_name_for("x", GroupLabel::Date(date)), "x_2023_06_05.kml");
        assert_eq!(file_name_for("x", GroupLabel::NoDate), "x_no_date.kml");
    }

    #[test]
    fn test_plan_outputs_split_and_combined() {
        let date = NaiveDate::from_ymd_opt(2023, 6, 15);
        let waypoints = vec![
            Waypoint::new("A", Coordinate::new(1.0, 1.0).unwrap(), date, 0).unwrap(),
            Waypoint::new("B", Coordinate::new(2.0, 2.0).unwrap(), None, 1).unwrap(),
        ];
        let trip = Trip::new(None, waypoints);

        let combined = plan_outputs(&trip, &ConvertOptions::new("t", false)).unwrap();
        assert_eq!(combined.len(), 1);
        assert_eq!(combined[0].file_name, "t_combined.kml");
        assert_eq!(combined[0].placemarks, 2);

        let split = plan_outputs(&trip, &ConvertOptions::new("t", true)).unwrap();
        let names: Vec<_> = split.iter().map(|o| o.file_name.as_str()).collect();
        assert_eq!(names, vec!["t_2023_06_15.kml", "t_no_date.kml"]);
    }
}
