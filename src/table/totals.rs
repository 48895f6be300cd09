// src/table/totals.rs

use serde::Serialize;
use tracing::trace;

use super::normalize_placeholder;

/// Footer aggregates. Two-level tables fill only `quantity`; trade tables fill both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub quantity: Option<String>,
    pub value: Option<String>,
}

/// Which footer shape a report publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Footer {
    /// `label | total`, total kept verbatim.
    SingleTotal,
    /// `label | quantity | value`, both placeholder-normalized.
    QuantityAndValue,
}

/// Read totals from the footer cells (label cell first).
///
/// A footer whose width does not match `shape`, or no footer at all,
/// yields `None`.
pub fn extract(shape: Footer, footer: Option<&[String]>) -> Option<Totals> {
    let cells = footer?;
    match (shape, cells) {
        (Footer::SingleTotal, [_, total]) => Some(Totals {
            quantity: Some(total.clone()),
            value: None,
        }),
        (Footer::QuantityAndValue, [_, quantity, value]) => Some(Totals {
            quantity: Some(normalize_placeholder(quantity)),
            value: Some(normalize_placeholder(value)),
        }),
        _ => {
            trace!(?shape, cells = cells.len(), "footer ignored");
            None
        }
    }
}
