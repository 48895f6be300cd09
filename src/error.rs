// src/error.rs

use thiserror::Error;

pub type Result<T, E = ScrapeError> = std::result::Result<T, E>;

/// Everything a fetch+parse invocation can fail with.
///
/// Network-class variants are only produced once the retry budget is spent
/// (or, for a non-retryable HTTP status, on the first attempt) and carry the
/// attempt count plus the last cause. Structural variants carry the report
/// label so the caller can tell which table broke.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("upstream timed out after {attempts} attempt(s): {cause}")]
    NetworkTimeout { attempts: u32, cause: String },

    #[error("could not connect to upstream after {attempts} attempt(s): {cause}")]
    NetworkConnection { attempts: u32, cause: String },

    #[error("upstream returned HTTP {status} after {attempts} attempt(s)")]
    UpstreamHttp { status: u16, attempts: u32 },

    #[error("transport error after {attempts} attempt(s): {cause}")]
    Transport { attempts: u32, cause: String },

    #[error("data table not found in `{report}` page")]
    TableNotFound { report: String },

    #[error("unexpected header in `{report}` table: expected {expected:?}, got {actual:?}")]
    SchemaMismatch {
        report: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("failed to parse `{report}` table: {reason}")]
    UnexpectedParseFailure { report: String, reason: String },

    #[error("year {year} outside the published range {min}..={max}")]
    InvalidYear { year: i32, min: i32, max: i32 },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ScrapeError {
    /// Attempts spent before the error surfaced, for network-class errors.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            ScrapeError::NetworkTimeout { attempts, .. }
            | ScrapeError::NetworkConnection { attempts, .. }
            | ScrapeError::UpstreamHttp { attempts, .. }
            | ScrapeError::Transport { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}

/// 5xx and 429 are transient; every other 4xx is final.
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}
