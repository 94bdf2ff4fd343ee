//! Regex fallback for payloads that are not valid JSON
//!
//! Truncated or JavaScript-flavoured state blobs still contain the
//! `"name": …, "lat": …, "lng": …` fragments we care about, so this scanner
//! works on the raw text. Each coordinate pair takes the nearest name and
//! date keys that appear between it and the previous pair.

use regex::{Captures, Regex};
use std::sync::LazyLock;

use super::{BlockParse, PayloadParser, RawPlace};

const NUMBER: &str = r#""?(-?\d+(?:\.\d+)?(?:[eE][-+]?\d+)?)"?"#;
const LAT_KEY: &str = r#""(?:lat|latitude)"\s*:\s*"#;
const LON_KEY: &str = r#""(?:lng|lon|long|longitude)"\s*:\s*"#;

static LAT_LON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{LAT_KEY}{NUMBER}\s*,\s*{LON_KEY}{NUMBER}"))
        .expect("lat/lon pattern is valid")
});

static LON_LAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{LON_KEY}{NUMBER}\s*,\s*{LAT_KEY}{NUMBER}"))
        .expect("lon/lat pattern is valid")
});

static NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:name|placeName|displayName|title)"\s*:\s*"((?:[^"\\]|\\.)*)""#)
        .expect("name pattern is valid")
});

static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:date|associatedDate|startDate)"\s*:\s*(?:"((?:[^"\\]|\\.)*)"|null)"#)
        .expect("date pattern is valid")
});

static TRIP_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""tripTitle"\s*:\s*"((?:[^"\\]|\\.)*)""#).expect("trip title pattern is valid")
});

/// Pattern search over raw payload text
pub struct PatternScanner;

struct Pair {
    start: usize,
    end: usize,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// Decode JSON string escapes; falls back to the raw text
fn unescape(raw: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{raw}\"")).unwrap_or_else(|_| raw.to_string())
}

fn to_pair(caps: &Captures<'_>, lat_group: usize, lon_group: usize) -> Option<Pair> {
    let whole = caps.get(0)?;
    Some(Pair {
        start: whole.start(),
        end: whole.end(),
        latitude: caps.get(lat_group).and_then(|m| m.as_str().parse().ok()),
        longitude: caps.get(lon_group).and_then(|m| m.as_str().parse().ok()),
    })
}

fn pairs(text: &str) -> Vec<Pair> {
    let mut found: Vec<Pair> = LAT_LON
        .captures_iter(text)
        .filter_map(|caps| to_pair(&caps, 1, 2))
        .chain(LON_LAT.captures_iter(text).filter_map(|caps| to_pair(&caps, 2, 1)))
        .collect();
    found.sort_by_key(|pair| pair.start);

    let mut kept: Vec<Pair> = Vec::with_capacity(found.len());
    for pair in found {
        if kept.last().is_none_or(|last| pair.start >= last.end) {
            kept.push(pair);
        }
    }
    kept
}

impl PayloadParser for PatternScanner {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn is_fallback(&self) -> bool {
        true
    }

    fn parse(&self, payload: &str) -> Option<BlockParse> {
        let mut places = Vec::new();
        let mut window_start = 0;

        for pair in pairs(payload) {
            let window = &payload[window_start..pair.start];
            window_start = pair.end;

            // A pair with no name before it is a bare location, not a place.
            let Some(name) = NAME.captures_iter(window).last() else {
                continue;
            };
            let date = DATE
                .captures_iter(window)
                .last()
                .and_then(|caps| caps.get(1))
                .map(|m| unescape(m.as_str()));

            places.push(RawPlace {
                name: name.get(1).map(|m| unescape(m.as_str())),
                latitude: pair.latitude,
                longitude: pair.longitude,
                date,
            });
        }

        let title = TRIP_TITLE
            .captures(payload)
            .and_then(|caps| caps.get(1))
            .map(|m| unescape(m.as_str()))
            .filter(|t| !t.trim().is_empty());

        Some(BlockParse { title, places })
    }
}
