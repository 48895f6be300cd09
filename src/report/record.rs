// src/report/record.rs

use serde::Serialize;

use crate::table::{Extracted, FlatTradeRecord, Item};

/// Output of a two-level (production, commercialization, processing) report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchicalRecord {
    pub year: i32,
    pub category: String,
    pub headers: Vec<String>,
    pub items: Vec<Item>,
    pub total_quantity: Option<String>,
}

/// Output of an import/export report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    pub year: i32,
    pub product_type: String,
    pub headers: Vec<String>,
    pub records: Vec<FlatTradeRecord>,
    pub total_quantity_kg: Option<String>,
    pub total_value_usd: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReportRecord {
    Hierarchical(HierarchicalRecord),
    Trade(TradeRecord),
}

impl ReportRecord {
    pub fn year(&self) -> i32 {
        match self {
            ReportRecord::Hierarchical(r) => r.year,
            ReportRecord::Trade(r) => r.year,
        }
    }
}

impl HierarchicalRecord {
    pub fn assemble(year: i32, category: &str, table: Extracted<Item>) -> Self {
        let totals = table.totals.unwrap_or_default();
        Self {
            year,
            category: category.to_string(),
            headers: table.headers,
            items: table.rows,
            total_quantity: totals.quantity,
        }
    }
}

impl TradeRecord {
    pub fn assemble(year: i32, product_type: &str, table: Extracted<FlatTradeRecord>) -> Self {
        let totals = table.totals.unwrap_or_default();
        Self {
            year,
            product_type: product_type.to_string(),
            headers: table.headers,
            records: table.rows,
            total_quantity_kg: totals.quantity,
            total_value_usd: totals.value,
        }
    }
}
