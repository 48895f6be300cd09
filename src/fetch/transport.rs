// src/fetch/transport.rs

use reqwest::Client;
use std::{error::Error as _, fmt, future::Future, io, time::Duration};
use tracing::debug;
use url::Url;

use crate::error::{is_retryable_status, ScrapeError};

/// How a single GET attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    Timeout(String),
    Connection(String),
    Status(u16),
    Other(String),
}

impl TransportFailure {
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportFailure::Status(code) => is_retryable_status(*code),
            _ => true,
        }
    }

    /// Lift into the caller-facing taxonomy once no more attempts will be made.
    pub fn into_error(self, attempts: u32) -> ScrapeError {
        match self {
            TransportFailure::Timeout(cause) => ScrapeError::NetworkTimeout { attempts, cause },
            TransportFailure::Connection(cause) => {
                ScrapeError::NetworkConnection { attempts, cause }
            }
            TransportFailure::Status(status) => ScrapeError::UpstreamHttp { status, attempts },
            TransportFailure::Other(cause) => ScrapeError::Transport { attempts, cause },
        }
    }
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportFailure::Timeout(c) => write!(f, "timeout: {c}"),
            TransportFailure::Connection(c) => write!(f, "connection: {c}"),
            TransportFailure::Status(s) => write!(f, "HTTP {s}"),
            TransportFailure::Other(c) => write!(f, "{c}"),
        }
    }
}

/// One GET against the upstream portal, returning the body text.
pub trait Transport: Send + Sync {
    fn get(&self, url: &Url) -> impl Future<Output = Result<String, TransportFailure>> + Send;
}

/// `reqwest`-backed transport with per-attempt connect and read budgets.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .user_agent(concat!("vitiscraper/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ScrapeError::Config(format!("building HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<String, TransportFailure> {
        debug!(%url, "GET");
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(classify)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportFailure::Status(status.as_u16()));
        }
        resp.text().await.map_err(classify)
    }
}

fn classify(err: reqwest::Error) -> TransportFailure {
    if err.is_timeout() {
        return TransportFailure::Timeout(err.to_string());
    }
    if err.is_connect() {
        return TransportFailure::Connection(err.to_string());
    }
    // refused/reset can also surface mid-body as a plain io error
    let mut source = err.source();
    while let Some(inner) = source {
        if let Some(io_err) = inner.downcast_ref::<io::Error>() {
            match io_err.kind() {
                io::ErrorKind::ConnectionRefused
                | io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted => {
                    return TransportFailure::Connection(err.to_string())
                }
                io::ErrorKind::TimedOut => return TransportFailure::Timeout(err.to_string()),
                _ => {}
            }
        }
        source = inner.source();
    }
    TransportFailure::Other(err.to_string())
}
