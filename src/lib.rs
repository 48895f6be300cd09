// src/lib.rs

pub mod config;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod report;
pub mod table;

pub use config::Config;
pub use error::{Result, ScrapeError};
pub use fetch::{Fetcher, Query, RetryPolicy};
pub use pipeline::{parse_report, Pipeline};
pub use report::{Report, ReportRecord};
