//! Discovery of embedded structured-data payloads in an HTML page

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

/// `window.__MOBX_STATE__ = ` and friends
static GLOBAL_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:window|self|globalThis)(?:\.[A-Za-z_$][\w$]*)+\s*=\s*")
        .expect("global assignment pattern is valid")
});

/// `var state = ` / `__DATA__ = ` at the start of a script
static LEADING_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:var|let|const)\s+)?[A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*\s*=\s*")
        .expect("leading assignment pattern is valid")
});

static TITLE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*[-–—|:]\s*Wanderlog\s*$").expect("title suffix pattern is valid")
});

/// One candidate payload, numbered in document order
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptBlock {
    pub index: usize,
    pub payload: String,
}

/// Everything the extractor needs from the raw HTML
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageScan {
    /// `<title>` text with the site suffix removed
    pub html_title: Option<String>,
    pub blocks: Vec<ScriptBlock>,
}

/// Collect every script payload that looks like JSON.
///
/// Hydration states are often emitted twice (one per mount point); all of
/// them are returned and the caller merges the results.
#[must_use]
pub fn scan_page(html: &str) -> PageScan {
    let document = Html::parse_document(html);

    let html_title = Selector::parse("title").ok().and_then(|selector| {
        document
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>())
            .map(|text| TITLE_SUFFIX.replace(text.trim(), "").trim().to_string())
            .filter(|text| !text.is_empty())
    });

    let mut payloads = Vec::new();
    if let Ok(selector) = Selector::parse("script") {
        for script in document.select(&selector) {
            let text = script.text().collect::<String>();
            let script_type = script.value().attr("type").unwrap_or("").to_ascii_lowercase();
            if script_type.contains("json") {
                let text = text.trim();
                if looks_structured(text) {
                    payloads.push(text.to_string());
                }
            } else {
                payloads.extend(payloads_in_script(&text));
            }
        }
    }

    let blocks: Vec<ScriptBlock> = payloads
        .into_iter()
        .enumerate()
        .map(|(index, payload)| ScriptBlock { index, payload })
        .collect();

    debug!(
        "Found {} structured script block(s), title: {:?}",
        blocks.len(),
        html_title
    );

    PageScan { html_title, blocks }
}

/// Payloads inside a JavaScript script body
fn payloads_in_script(text: &str) -> Vec<String> {
    let text = text.trim();

    let mut payloads: Vec<String> = GLOBAL_ASSIGNMENT
        .find_iter(text)
        .map(|m| &text[m.end()..])
        .filter(|rest| looks_structured(rest))
        .map(take_value)
        .collect();

    if payloads.is_empty() {
        let rest = match LEADING_ASSIGNMENT.find(text) {
            Some(m) => &text[m.end()..],
            None => text,
        };
        if looks_structured(rest) {
            payloads.push(take_value(rest));
        }
    }

    payloads
}

fn looks_structured(text: &str) -> bool {
    text.starts_with('{') || text.starts_with('[')
}

/// The balanced JSON value at the start of `text`, or everything up to a
/// trailing `;` when the value never closes.
fn take_value(text: &str) -> String {
    match balanced_end(text) {
        Some(end) => text[..end].to_string(),
        None => text.trim_end().trim_end_matches(';').to_string(),
    }
}

/// Byte offset just past the bracket closing the first one in `text`
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}
