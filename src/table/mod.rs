// src/table/mod.rs

//! Generic extraction of the portal's data table.
//!
//! Every report page carries one `<table class="tb_base tb_dados">`. The
//! engine locates it, checks its header against an optional expected schema,
//! hands the body rows to a [`RowStrategy`] and reads the footer totals. The
//! per-report differences live entirely in the [`TableSpec`].

pub mod headers;
pub mod rows;
pub mod totals;

pub use rows::{FlatTrade, FlatTradeRecord, Item, RowStrategy, Subitem, TwoLevel};
pub use totals::{Footer, Totals};

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace};

use crate::error::{Result, ScrapeError};

static DATA_TABLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table.tb_base.tb_dados").expect("data table selector"));
static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("tbody").expect("tbody selector"));
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("tr selector"));
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("td selector"));
static FOOTER: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tfoot.tb_total").expect("footer selector"));

const ITEM_CLASS: &str = "tb_item";
const SUBITEM_CLASS: &str = "tb_subitem";

/// Nesting marker carried by the first cell of a two-level row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Item,
    Subitem,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub marker: Option<Marker>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Item,
    Subitem,
    Flat,
    Unclassified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub cells: Vec<Cell>,
    pub kind: RowKind,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        let kind = match (cells.len(), cells.first().and_then(|c| c.marker)) {
            (2, Some(Marker::Item)) => RowKind::Item,
            (2, Some(Marker::Subitem)) => RowKind::Subitem,
            (3, _) => RowKind::Flat,
            _ => RowKind::Unclassified,
        };
        Self { cells, kind }
    }

    /// Text of cell `idx`, or `""` when the row is shorter.
    pub fn text(&self, idx: usize) -> &str {
        self.cells.get(idx).map(|c| c.text.as_str()).unwrap_or("")
    }

    fn from_element(tr: ElementRef<'_>) -> Self {
        Self::new(tr.select(&CELL).map(cell_from_element).collect())
    }
}

/// The located table, detached from the parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTable {
    pub headers: Vec<String>,
    pub body_rows: Vec<Row>,
    /// Cell texts of the totals row, when the page has one.
    pub footer: Option<Vec<String>>,
}

/// Per-report parameters of the extraction engine.
#[derive(Debug, Clone)]
pub struct TableSpec<'a, R> {
    /// Used in diagnostics only.
    pub report: &'a str,
    pub expected_headers: Option<&'a [&'a str]>,
    pub rows: R,
    pub footer: Footer,
}

/// Headers, classified rows and totals of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted<T> {
    pub headers: Vec<String>,
    pub rows: Vec<T>,
    pub totals: Option<Totals>,
}

/// Run the full table pipeline over one page.
///
/// Header validation happens before any body row is read, so a schema
/// mismatch never yields partial output.
pub fn extract<R: RowStrategy>(
    html: &str,
    spec: &TableSpec<'_, R>,
) -> Result<Extracted<R::Output>> {
    let table = DataTable::parse(html, spec.report, spec.expected_headers)?;
    let rows = spec.rows.classify(&table.body_rows);
    let totals = totals::extract(spec.footer, table.footer.as_deref());
    debug!(
        report = spec.report,
        body_rows = table.body_rows.len(),
        kept = rows.len(),
        has_totals = totals.is_some(),
        "extracted table"
    );
    Ok(Extracted {
        headers: table.headers,
        rows,
        totals,
    })
}

impl DataTable {
    /// Parse `html`, locate the data table and read it into owned rows.
    pub fn parse(html: &str, report: &str, expected_headers: Option<&[&str]>) -> Result<Self> {
        let document = Html::parse_document(html);
        let table = locate(&document).ok_or_else(|| ScrapeError::TableNotFound {
            report: report.to_string(),
        })?;

        let header_cells = headers::collect(table);
        headers::validate(report, expected_headers, &header_cells)?;

        let body = table
            .select(&BODY)
            .next()
            .ok_or_else(|| ScrapeError::UnexpectedParseFailure {
                report: report.to_string(),
                reason: "data table has no body section".to_string(),
            })?;
        let body_rows: Vec<Row> = body.select(&ROW).map(Row::from_element).collect();
        trace!(report, rows = body_rows.len(), "read body rows");

        let footer = table
            .select(&FOOTER)
            .next()
            .map(|tfoot| tfoot.select(&CELL).map(cell_text).collect());

        Ok(Self {
            headers: header_cells,
            body_rows,
            footer,
        })
    }
}

/// First table tagged as the base data table.
pub fn locate(document: &Html) -> Option<ElementRef<'_>> {
    document.select(&DATA_TABLE).next()
}

/// Concatenate the element's text fragments, each stripped of surrounding whitespace.
pub(crate) fn cell_text(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).collect()
}

fn cell_from_element(td: ElementRef<'_>) -> Cell {
    let has_class = |name: &str| td.value().classes().any(|c| c == name);
    let marker = if has_class(ITEM_CLASS) {
        Some(Marker::Item)
    } else if has_class(SUBITEM_CLASS) {
        Some(Marker::Subitem)
    } else {
        None
    };
    Cell {
        text: cell_text(td),
        marker,
    }
}

/// `-`, empty and whitespace-only cells stand for zero in trade tables and totals.
pub fn normalize_placeholder(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        text.to_string()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn picks_the_data_table_among_other_tables() {
        let table = DataTable::parse(PRODUCTION, "producao", None).unwrap();
        assert_eq!(table.headers, vec!["Produto", "Quantidade (L)"]);
        assert_eq!(table.body_rows.len(), 6);
        assert_eq!(
            table.footer,
            Some(vec!["Total".to_string(), "43.001".to_string()])
        );
    }

    #[test]
    fn derives_row_kinds() {
        let table = DataTable::parse(PRODUCTION, "producao", None).unwrap();
        let kinds: Vec<RowKind> = table.body_rows.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RowKind::Item,
                RowKind::Subitem,
                RowKind::Subitem,
                RowKind::Item,
                RowKind::Subitem,
                RowKind::Subitem
            ]
        );

        let trade = DataTable::parse(TRADE, "importacao/vinho-mesa", None).unwrap();
        assert_eq!(trade.body_rows[0].kind, RowKind::Flat);
        assert_eq!(trade.body_rows[0].text(1), "-");
    }

    #[test]
    fn missing_table_is_reported() {
        let err = DataTable::parse("<html><body><p>manutenção</p></body></html>", "producao", None)
            .unwrap_err();
        assert!(matches!(err, ScrapeError::TableNotFound { ref report } if report == "producao"));
    }

    #[test]
    fn table_without_body_is_a_parse_failure() {
        let html = r#"<table class="tb_base tb_dados"><thead><tr><th>Produto</th></tr></thead></table>"#;
        let err = DataTable::parse(html, "producao", None).unwrap_err();
        assert!(matches!(err, ScrapeError::UnexpectedParseFailure { .. }));
    }

    #[test]
    fn missing_footer_is_not_an_error() {
        let html = r#"<table class="tb_base tb_dados">
            <thead><tr><th>Produto</th><th>Quantidade (L)</th></tr></thead>
            <tbody><tr><td class="tb_item">VINHO</td><td class="tb_item">1</td></tr></tbody>
        </table>"#;
        let table = DataTable::parse(html, "producao", None).unwrap();
        assert_eq!(table.footer, None);
    }

    #[test]
    fn cell_text_strips_each_fragment() {
        let html = r#"<table class="tb_base tb_dados"><tbody>
            <tr><td class="tb_item">  VINHO <b> FINO </b>
            </td><td class="tb_item"> 1.234 </td></tr></tbody></table>"#;
        let table = DataTable::parse(html, "producao", None).unwrap();
        assert_eq!(table.body_rows[0].text(0), "VINHOFINO");
        assert_eq!(table.body_rows[0].text(1), "1.234");
    }

    #[test]
    fn placeholders() {
        assert_eq!(normalize_placeholder("-"), "0");
        assert_eq!(normalize_placeholder(""), "0");
        assert_eq!(normalize_placeholder("   "), "0");
        assert_eq!(normalize_placeholder("1.200"), "1.200");
        assert_eq!(normalize_placeholder("-5"), "-5");
    }

    #[test]
    fn same_input_same_output() {
        let a = DataTable::parse(PRODUCTION, "producao", None).unwrap();
        let b = DataTable::parse(PRODUCTION, "producao", None).unwrap();
        assert_eq!(a, b);
    }
}
