// src/fetch/mod.rs

pub mod retry;
pub mod transport;

pub use retry::RetryPolicy;
pub use transport::{HttpTransport, Transport, TransportFailure};

use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::config::Config;
use crate::error::{Result, ScrapeError};

/// Query parameters selecting one report page on the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Query {
    pub category: &'static str,
    pub subcategory: Option<&'static str>,
    pub year: i32,
}

/// Issues upstream GETs with bounded retries.
///
/// Holds no per-request state; one instance can serve any number of
/// concurrent fetches. The backoff wait is a plain `.await` on a tokio timer,
/// so a retrying fetch never blocks other tasks on the runtime.
#[derive(Debug, Clone)]
pub struct Fetcher<T = HttpTransport> {
    transport: T,
    base_url: Url,
    policy: RetryPolicy,
}

impl Fetcher<HttpTransport> {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let base_url = Url::parse(&cfg.base_url)
            .map_err(|e| ScrapeError::Config(format!("base_url {:?}: {e}", cfg.base_url)))?;
        let transport = HttpTransport::new(cfg.connect_timeout(), cfg.read_timeout())?;
        Ok(Self::new(transport, base_url, cfg.retry_policy()))
    }
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T, base_url: Url, policy: RetryPolicy) -> Self {
        Self {
            transport,
            base_url,
            policy,
        }
    }

    pub fn url_for(&self, query: &Query) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("opcao", query.category);
            if let Some(sub) = query.subcategory {
                pairs.append_pair("subopcao", sub);
            }
            pairs.append_pair("ano", &query.year.to_string());
        }
        url
    }

    /// Fetch the raw page body for `query`.
    #[instrument(level = "info", skip(self, query), fields(category = query.category, subcategory = ?query.subcategory, year = query.year))]
    pub async fn fetch(&self, query: &Query) -> Result<String> {
        let url = self.url_for(query);
        self.get_with_retry(&url).await
    }

    async fn get_with_retry(&self, url: &Url) -> Result<String> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            debug!(%url, attempt, "requesting");

            let failure = match self.transport.get(url).await {
                Ok(body) => {
                    debug!(%url, attempt, bytes = body.len(), "fetched");
                    return Ok(body);
                }
                Err(failure) => failure,
            };

            if !failure.is_retryable() {
                warn!(%url, attempt, error = %failure, "not retrying");
                return Err(failure.into_error(attempt));
            }
            if attempt >= self.policy.max_attempts {
                error!(%url, attempts = attempt, error = %failure, "exhausted retries");
                return Err(failure.into_error(attempt));
            }

            let delay = self.policy.delay_for(attempt - 1);
            warn!(
                %url,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %failure,
                "retrying"
            );
            sleep(delay).await;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::{
        collections::VecDeque,
        sync::{Arc, Mutex},
        time::Duration,
    };
    use tokio::time::Instant;

    /// Replays a fixed script of outcomes and records when each call arrived.
    #[derive(Clone, Default)]
    pub(crate) struct ScriptedTransport {
        script: Arc<Mutex<VecDeque<Result<String, TransportFailure>>>>,
        calls: Arc<Mutex<Vec<(Url, Instant)>>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(
            script: impl IntoIterator<Item = Result<String, TransportFailure>>,
        ) -> Self {
            Self {
                script: Arc::new(Mutex::new(script.into_iter().collect())),
                calls: Arc::default(),
            }
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub(crate) fn urls(&self) -> Vec<Url> {
            self.calls.lock().unwrap().iter().map(|(u, _)| u.clone()).collect()
        }

        fn gaps(&self) -> Vec<Duration> {
            let calls = self.calls.lock().unwrap();
            calls.windows(2).map(|w| w[1].1 - w[0].1).collect()
        }
    }

    impl Transport for ScriptedTransport {
        async fn get(&self, url: &Url) -> Result<String, TransportFailure> {
            self.calls.lock().unwrap().push((url.clone(), Instant::now()));
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportFailure::Other("script exhausted".into())))
        }
    }

    fn fetcher(transport: ScriptedTransport) -> Fetcher<ScriptedTransport> {
        let base = Url::parse("http://upstream.test/index.php").unwrap();
        Fetcher::new(transport, base, RetryPolicy::default())
    }

    const QUERY: Query = Query {
        category: "opt_02",
        subcategory: None,
        year: 2020,
    };

    fn timeout() -> Result<String, TransportFailure> {
        Err(TransportFailure::Timeout("operation timed out".into()))
    }

    fn refused() -> Result<String, TransportFailure> {
        Err(TransportFailure::Connection("connection refused".into()))
    }

    #[test]
    fn builds_query_string() {
        let f = fetcher(ScriptedTransport::default());
        let url = f.url_for(&Query {
            category: "opt_05",
            subcategory: Some("subopt_03"),
            year: 1999,
        });
        assert_eq!(
            url.as_str(),
            "http://upstream.test/index.php?opcao=opt_05&subopcao=subopt_03&ano=1999"
        );
        assert_eq!(
            f.url_for(&QUERY).as_str(),
            "http://upstream.test/index.php?opcao=opt_02&ano=2020"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_three_timeouts() {
        let transport =
            ScriptedTransport::new([timeout(), timeout(), timeout(), Ok("<html/>".into())]);
        let body = fetcher(transport.clone()).fetch(&QUERY).await.unwrap();

        assert_eq!(body, "<html/>");
        assert_eq!(transport.call_count(), 4);

        let gaps = transport.gaps();
        assert_eq!(gaps.len(), 3);
        for (n, gap) in gaps.iter().enumerate() {
            let floor = Duration::from_secs(5 * 2u64.pow(n as u32));
            assert!(*gap >= floor + Duration::from_secs(1), "gap {n}: {gap:?}");
            assert!(*gap <= floor + Duration::from_secs(3), "gap {n}: {gap:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_five_connection_failures() {
        let transport = ScriptedTransport::new([
            refused(),
            refused(),
            refused(),
            refused(),
            refused(),
            Ok("never reached".into()),
        ]);
        let err = fetcher(transport.clone()).fetch(&QUERY).await.unwrap_err();

        assert!(
            matches!(err, ScrapeError::NetworkConnection { attempts: 5, .. }),
            "{err:?}"
        );
        assert_eq!(transport.call_count(), 5);
        assert_eq!(transport.gaps().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn client_error_fails_immediately() {
        let transport = ScriptedTransport::new([
            Err(TransportFailure::Status(404)),
            Ok("never reached".into()),
        ]);
        let err = fetcher(transport.clone()).fetch(&QUERY).await.unwrap_err();

        assert!(matches!(
            err,
            ScrapeError::UpstreamHttp {
                status: 404,
                attempts: 1
            }
        ));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn server_errors_and_throttling_are_retried() {
        let transport = ScriptedTransport::new([
            Err(TransportFailure::Status(503)),
            Err(TransportFailure::Status(429)),
            Ok("ok".into()),
        ]);
        let body = fetcher(transport.clone()).fetch(&QUERY).await.unwrap();
        assert_eq!(body, "ok");
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_server_error_surfaces_last_status() {
        let transport = ScriptedTransport::new((0..5).map(|_| Err(TransportFailure::Status(502))));
        let err = fetcher(transport.clone()).fetch(&QUERY).await.unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::UpstreamHttp {
                status: 502,
                attempts: 5
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn other_transport_errors_are_retried() {
        let transport = ScriptedTransport::new([
            Err(TransportFailure::Other("body decode".into())),
            Ok("ok".into()),
        ]);
        assert_eq!(fetcher(transport.clone()).fetch(&QUERY).await.unwrap(), "ok");
        assert_eq!(transport.call_count(), 2);
    }
}
