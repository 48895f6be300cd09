// src/table/rows.rs

use serde::Serialize;
use tracing::{debug, trace};

use super::{normalize_placeholder, Row, RowKind};

/// Turns the body rows of one table into output records.
pub trait RowStrategy {
    type Output;

    fn classify(&self, rows: &[Row]) -> Vec<Self::Output>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subitem {
    pub label: String,
    pub quantity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub label: String,
    pub quantity: String,
    pub subitems: Vec<Subitem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatTradeRecord {
    pub country: String,
    pub quantity_kg: String,
    pub value_usd: String,
}

/// Item rows open a group; subitem rows attach to the most recent item.
///
/// With `keep_subitems == false` only item rows are emitted and every item
/// keeps an empty subitem list (the unclassified-processing layout).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwoLevel {
    pub keep_subitems: bool,
}

impl TwoLevel {
    pub const NESTED: TwoLevel = TwoLevel {
        keep_subitems: true,
    };
    pub const ITEMS_ONLY: TwoLevel = TwoLevel {
        keep_subitems: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    NoCurrentItem,
    /// Index of the current item in the output list.
    HasCurrentItem(usize),
}

/// Scoped to a single `classify` call.
#[derive(Debug)]
struct Hierarchy {
    items: Vec<Item>,
    state: State,
    keep_subitems: bool,
}

impl Hierarchy {
    fn new(keep_subitems: bool) -> Self {
        Self {
            items: Vec::new(),
            state: State::NoCurrentItem,
            keep_subitems,
        }
    }

    fn feed(&mut self, idx: usize, row: &Row) {
        match (row.kind, self.state) {
            (RowKind::Item, _) => {
                self.items.push(Item {
                    label: row.text(0).to_string(),
                    quantity: row.text(1).to_string(),
                    subitems: Vec::new(),
                });
                self.state = State::HasCurrentItem(self.items.len() - 1);
            }
            (RowKind::Subitem, _) if !self.keep_subitems => {
                trace!(row = idx, "subitem ignored in items-only table");
            }
            (RowKind::Subitem, State::HasCurrentItem(current)) => {
                self.items[current].subitems.push(Subitem {
                    label: row.text(0).to_string(),
                    quantity: row.text(1).to_string(),
                });
            }
            (RowKind::Subitem, State::NoCurrentItem) => {
                // no parent to attach to: dropped, never promoted to an item
                debug!(row = idx, label = row.text(0), "subitem before any item, discarded");
            }
            (kind, _) => {
                trace!(row = idx, ?kind, cells = row.cells.len(), "row discarded");
            }
        }
    }

    fn finish(self) -> Vec<Item> {
        self.items
    }
}

impl RowStrategy for TwoLevel {
    type Output = Item;

    fn classify(&self, rows: &[Row]) -> Vec<Item> {
        let mut hierarchy = Hierarchy::new(self.keep_subitems);
        for (idx, row) in rows.iter().enumerate() {
            hierarchy.feed(idx, row);
        }
        hierarchy.finish()
    }
}

/// Country / quantity / value rows with no nesting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlatTrade;

impl RowStrategy for FlatTrade {
    type Output = FlatTradeRecord;

    fn classify(&self, rows: &[Row]) -> Vec<FlatTradeRecord> {
        rows.iter()
            .enumerate()
            .filter_map(|(idx, row)| {
                if row.kind != RowKind::Flat {
                    // single-cell rows carry notes such as "Não consta"
                    trace!(row = idx, cells = row.cells.len(), "row discarded");
                    return None;
                }
                Some(FlatTradeRecord {
                    country: row.text(0).to_string(),
                    quantity_kg: normalize_placeholder(row.text(1)),
                    value_usd: normalize_placeholder(row.text(2)),
                })
            })
            .collect()
    }
}
