// src/table/headers.rs

use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use tracing::{trace, warn};

use super::cell_text;
use crate::error::{Result, ScrapeError};

static HEAD_CELL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("thead th").expect("thead th selector"));
static ANY_HEADER_CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("th").expect("th selector"));

/// Header texts, preferring cells under `<thead>` and falling back to any `<th>`.
pub fn collect(table: ElementRef<'_>) -> Vec<String> {
    let headers: Vec<String> = table.select(&HEAD_CELL).map(cell_text).collect();
    if !headers.is_empty() {
        return headers;
    }
    trace!("no <thead> header cells, falling back to any <th>");
    table.select(&ANY_HEADER_CELL).map(cell_text).collect()
}

/// Exact match against `expected`; `None` accepts anything.
pub fn validate(report: &str, expected: Option<&[&str]>, actual: &[String]) -> Result<()> {
    let Some(expected) = expected else {
        return Ok(());
    };
    let matches = expected.len() == actual.len()
        && expected.iter().zip(actual).all(|(e, a)| *e == a.as_str());
    if matches {
        return Ok(());
    }
    warn!(report, ?expected, ?actual, "header mismatch");
    Err(ScrapeError::SchemaMismatch {
        report: report.to_string(),
        expected: expected.iter().map(|s| s.to_string()).collect(),
        actual: actual.to_vec(),
    })
}
