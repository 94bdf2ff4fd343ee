//! Non-fatal extraction diagnostics

use serde::Serialize;
use std::fmt;

/// A recovered problem with a single entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExtractionWarning {
    /// A place-shaped object was dropped (bad coordinate or missing name)
    MalformedEntry { block: usize, reason: String },
    /// A date could not be normalized; the waypoint was kept without one
    DateParse { name: String, value: String },
}

impl fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionWarning::MalformedEntry { block, reason } => {
                write!(f, "dropped entry in block {block}: {reason}")
            }
            ExtractionWarning::DateParse { name, value } => {
                write!(f, "unrecognized date '{value}' for '{name}', kept without date")
            }
        }
    }
}

/// Summary of one extraction run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionReport {
    /// Script blocks that looked like structured data
    pub blocks_scanned: usize,
    /// Parser name per block that produced candidates
    pub parsers_used: Vec<(usize, &'static str)>,
    /// Entries collapsed into an earlier waypoint
    pub duplicates: usize,
    pub warnings: Vec<ExtractionWarning>,
}

impl ExtractionReport {
    #[must_use]
    pub fn malformed_entries(&self) -> usize {
        self.warnings
            .iter()
            .filter(|w| matches!(w, ExtractionWarning::MalformedEntry { .. }))
            .count()
    }

    #[must_use]
    pub fn date_parse_failures(&self) -> usize {
        self.warnings
            .iter()
            .filter(|w| matches!(w, ExtractionWarning::DateParse { .. }))
            .count()
    }

    /// Combine the report of a later block into this one
    #[must_use]
    pub fn merge(mut self, other: ExtractionReport) -> Self {
        self.blocks_scanned += other.blocks_scanned;
        self.parsers_used.extend(other.parsers_used);
        self.duplicates += other.duplicates;
        self.warnings.extend(other.warnings);
        self
    }

    /// One-line summary for the end of a run
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            concat!(
                "{} block(s) scanned, {} duplicate(s) collapsed, ",
                "{} malformed entr{} dropped, {} date(s) not understood"
            ),
            self.blocks_scanned,
            self.duplicates,
            self.malformed_entries(),
            if self.malformed_entries() == 1 { "y" } else { "ies" },
            self.date_parse_failures()
        )
    }
}
