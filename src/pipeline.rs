// src/pipeline.rs

use futures::{stream, StreamExt};
use tracing::{error, info, instrument};

use crate::config::Config;
use crate::error::Result;
use crate::fetch::{Fetcher, HttpTransport, Transport};
use crate::report::{HierarchicalRecord, Layout, Report, ReportRecord, TradeRecord};
use crate::table::{self, FlatTrade, Footer, TableSpec, TwoLevel};

/// Turn one report page into its output record. Pure: same input, same output.
pub fn parse_report(html: &str, report: Report, year: i32) -> Result<ReportRecord> {
    let slug = report.slug();
    let expected_headers = report.expected_headers();

    let record = match report.layout() {
        Layout::TwoLevel | Layout::ItemsOnly => {
            let rows = if report.layout() == Layout::TwoLevel {
                TwoLevel::NESTED
            } else {
                TwoLevel::ITEMS_ONLY
            };
            let spec = TableSpec {
                report: slug,
                expected_headers,
                rows,
                footer: Footer::SingleTotal,
            };
            let extracted = table::extract(html, &spec)?;
            ReportRecord::Hierarchical(HierarchicalRecord::assemble(year, report.label(), extracted))
        }
        Layout::Trade => {
            let spec = TableSpec {
                report: slug,
                expected_headers,
                rows: FlatTrade,
                footer: Footer::QuantityAndValue,
            };
            let extracted = table::extract(html, &spec)?;
            ReportRecord::Trade(TradeRecord::assemble(year, report.label(), extracted))
        }
    };
    Ok(record)
}

/// One fetch+parse per call; nothing is shared between calls but the fetcher.
#[derive(Debug, Clone)]
pub struct Pipeline<T = HttpTransport> {
    fetcher: Fetcher<T>,
    concurrency: usize,
}

impl Pipeline<HttpTransport> {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        Ok(Self::new(Fetcher::from_config(cfg)?, cfg.concurrency))
    }
}

impl<T: Transport> Pipeline<T> {
    pub fn new(fetcher: Fetcher<T>, concurrency: usize) -> Self {
        Self {
            fetcher,
            concurrency: concurrency.max(1),
        }
    }

    #[instrument(level = "info", skip(self, report), fields(report = %report))]
    pub async fn fetch_report(&self, report: Report, year: i32) -> Result<ReportRecord> {
        report.check_year(year)?;
        let html = self.fetcher.fetch(&report.query(year)).await?;
        let record = parse_report(&html, report, year).inspect_err(|e| {
            error!(report = %report, year, error = %e, "page did not match the expected table");
        })?;
        info!(report = %report, year, "report parsed");
        Ok(record)
    }

    /// Every report published for `year`, at most `concurrency` in flight.
    /// Results come back in catalog order.
    pub async fn fetch_all(&self, year: i32) -> Vec<(Report, Result<ReportRecord>)> {
        let reports: Vec<Report> = Report::ALL
            .into_iter()
            .filter(|r| r.years().contains(&year))
            .collect();
        info!(year, reports = reports.len(), concurrency = self.concurrency, "fetching all reports");

        let mut results: Vec<(Report, Result<ReportRecord>)> = stream::iter(reports)
            .map(|report| async move { (report, self.fetch_report(report, year).await) })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        results.sort_by_key(|(report, _)| Report::ALL.iter().position(|r| r == report));
        results
    }
}
