//! Blocking HTTP client: one Agent (connection reuse) with bounded retries.

use std::io::Read;
use std::time::Duration;

use crate::error::{CdnError, Result};

const REQUEST_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_RETRY_COUNT: usize = 2;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 250;
const MAX_RETRY_BACKOFF_MS: u64 = 5_000;

fn retry_count_from_env() -> usize {
    std::env::var("BOOTCDN_HTTP_RETRIES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(DEFAULT_RETRY_COUNT)
}

fn retry_backoff_ms_from_env() -> u64 {
    std::env::var("BOOTCDN_HTTP_RETRY_BACKOFF_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_BACKOFF_MS)
}

/// 5xx and 429 are worth another attempt; other statuses are final.
fn is_retryable(status: u16) -> bool {
    status >= 500 || status == 429
}

fn network_error(url: &str, status: Option<u16>, source: String) -> CdnError {
    CdnError::Network {
        operation: "http_get".to_string(),
        url: Some(url.to_string()),
        status,
        source,
    }
}

pub struct HttpClient {
    agent: ureq::Agent,
    retries: usize,
    backoff_ms: u64,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Client with retry settings from BOOTCDN_HTTP_RETRIES / BOOTCDN_HTTP_RETRY_BACKOFF_MS.
    pub fn new() -> Self {
        Self::with_retries(retry_count_from_env(), retry_backoff_ms_from_env())
    }

    pub fn with_retries(retries: usize, backoff_ms: u64) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_millis(REQUEST_TIMEOUT_MS))
            .user_agent(concat!("bootcdn/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            retries,
            backoff_ms,
        }
    }

    /// GET url and return body bytes. Any non-200 status is an error.
    pub fn get(&self, url: &str) -> Result<Vec<u8>> {
        match self.get_optional(url)? {
            Some(body) => Ok(body),
            None => Err(network_error(url, Some(404), "HTTP 404".to_string())),
        }
    }

    /// GET url; `Ok(None)` when the server answers 404.
    pub fn get_optional(&self, url: &str) -> Result<Option<Vec<u8>>> {
        let resp = match self.send_with_retry(url)? {
            Some(resp) => resp,
            None => return Ok(None),
        };
        let mut buf = Vec::new();
        resp.into_reader()
            .read_to_end(&mut buf)
            .map_err(|e| network_error(url, Some(200), e.to_string()))?;
        Ok(Some(buf))
    }

    fn send_with_retry(&self, url: &str) -> Result<Option<ureq::Response>> {
        let mut attempt = 0usize;
        let mut backoff = self.backoff_ms;
        loop {
            attempt += 1;
            let failure = match self.agent.get(url).call() {
                Ok(resp) if resp.status() == 200 => return Ok(Some(resp)),
                Ok(resp) => (Some(resp.status()), format!("HTTP {}", resp.status())),
                Err(ureq::Error::Status(404, _)) => return Ok(None),
                Err(ureq::Error::Status(code, _)) => (Some(code), format!("HTTP {}", code)),
                Err(e) => (None, e.to_string()),
            };
            let retryable = failure.0.map(is_retryable).unwrap_or(true);
            if retryable && attempt <= self.retries {
                std::thread::sleep(Duration::from_millis(backoff));
                backoff = next_backoff(backoff);
                continue;
            }
            return Err(network_error(url, failure.0, failure.1));
        }
    }
}

/// Delay before the following attempt: doubled, capped at MAX_RETRY_BACKOFF_MS.
fn next_backoff(current_ms: u64) -> u64 {
    current_ms.saturating_mul(2).min(MAX_RETRY_BACKOFF_MS)
}
