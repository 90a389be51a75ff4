use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use log::*;
use reqwest::{header::RETRY_AFTER, Client, StatusCode};

use crate::{
    accrual::resolver::{AccrualResolver, ResolverError},
    db_types::{AccrualReport, OrderNumber},
};

pub const DEFAULT_RESOLVER_TIMEOUT: Duration = Duration::from_secs(5);
/// Longest `Retry-After` we are prepared to wait for within a single lookup.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Backoff used while the resolver is throttling us.
///
/// - Min delay: 100ms
/// - Max delay: 5s
/// - Max attempts: 5
/// - Jitter enabled
pub fn default_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(100))
        .with_max_delay(Duration::from_secs(5))
        .with_max_times(5)
        .with_jitter()
}

/// Talks to the accrual resolver's `GET /api/orders/{number}` endpoint.
#[derive(Debug, Clone)]
pub struct HttpAccrualResolver {
    client: Client,
    base_url: String,
    backoff: ExponentialBuilder,
}

impl HttpAccrualResolver {
    /// Creates a client for the resolver at `base_url`. A bare `host:port` is treated as plain `http`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ResolverError> {
        let base_url = normalize_base_url(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ResolverError::Configuration(format!("Could not build HTTP client. {e}")))?;
        Ok(Self { client, base_url, backoff: default_backoff() })
    }

    pub fn with_backoff(mut self, backoff: ExponentialBuilder) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_once(&self, number: &OrderNumber) -> Result<AccrualReport, ResolverError> {
        let url = format!("{}/api/orders/{number}", self.base_url);
        trace!("🛰️ GET {url}");
        let response = self.client.get(&url).send().await.map_err(|e| ResolverError::Transport(e.to_string()))?;
        match response.status() {
            StatusCode::OK => {
                let body = response.bytes().await.map_err(|e| ResolverError::Transport(e.to_string()))?;
                serde_json::from_slice::<AccrualReport>(&body).map_err(|e| ResolverError::Decode(e.to_string()))
            },
            StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => Ok(AccrualReport::registered(number)),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .map(Duration::from_secs);
                Err(ResolverError::RateLimited { retry_after })
            },
            status => Err(ResolverError::UnexpectedStatus(status.as_u16())),
        }
    }
}

impl AccrualResolver for HttpAccrualResolver {
    /// Asks the resolver about `number`, retrying with backoff while it replies `429 Too Many Requests`. Any other
    /// failure is returned straight away.
    ///
    /// When a throttled reply carries `Retry-After`, the next attempt waits that long instead of the backoff delay. The
    /// backoff still decides how many attempts are made.
    async fn resolve(&self, number: &OrderNumber) -> Result<AccrualReport, ResolverError> {
        let report = (|| async { self.fetch_once(number).await })
            .retry(self.backoff)
            .when(|e| matches!(e, ResolverError::RateLimited { .. }))
            .adjust(|e, delay| match (e, delay) {
                (ResolverError::RateLimited { retry_after: Some(wait) }, Some(_)) => Some((*wait).min(MAX_RETRY_AFTER)),
                _ => delay,
            })
            .notify(|e, delay| debug!("🛰️ Resolver lookup for [{number}] failed ({e}). Retrying in {delay:?}"))
            .await?;
        trace!("🛰️ Resolver says [{number}] is {}", report.status);
        Ok(report)
    }
}

fn normalize_base_url(base_url: &str) -> Result<String, ResolverError> {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ResolverError::Configuration("The accrual resolver address is empty".into()));
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("http://{trimmed}"))
    }
}
