use crate::config::RetryPolicy;
use crate::types::Diagnostic;
use indicatif::ProgressBar;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Why a single GET attempt did not yield JSON.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("HTTP status {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Retries were exhausted. This is the fetcher's "no result" value.
#[derive(Debug, Error)]
#[error("[FAIL] {url} after {tries} tries: {last_error}")]
pub struct FetchFailure {
    pub url: String,
    pub tries: u32,
    pub last_error: FetchError,
}

impl FetchFailure {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::FetchFailed {
            url: self.url.clone(),
            tries: self.tries,
            error: self.last_error.to_string(),
        }
    }
}

/// GETs JSON documents over one shared connection pool.
#[derive(Clone, Default)]
pub struct Fetcher {
    client: reqwest::Client,
    progress: Option<ProgressBar>,
}

impl Fetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same connection pool; failure diagnostics are printed with `bar`
    /// suspended so they don't tear its line.
    pub fn with_progress(&self, bar: ProgressBar) -> Self {
        Self {
            client: self.client.clone(),
            progress: Some(bar),
        }
    }

    /// Fetches `url` as JSON, retrying under `policy`.
    ///
    /// Failures never escape as panics: after the last attempt the failure is
    /// logged and returned as `FetchFailure`.
    pub async fn fetch_json(
        &self,
        url: &str,
        policy: &RetryPolicy,
    ) -> Result<Value, FetchFailure> {
        let tries = policy.tries.max(1);
        let mut attempt = 0;

        loop {
            match self.attempt(url, policy).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt + 1 < tries => {
                    let delay = policy.delay_after(attempt);
                    debug!(url, attempt, ?delay, error = %e, "fetch attempt failed");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    let failure = FetchFailure {
                        url: url.to_string(),
                        tries,
                        last_error: e,
                    };
                    match &self.progress {
                        Some(bar) => bar.suspend(|| warn!("{}", failure)),
                        None => warn!("{}", failure),
                    }
                    return Err(failure);
                }
            }
        }
    }

    async fn attempt(&self, url: &str, policy: &RetryPolicy) -> Result<Value, FetchError> {
        let resp = self
            .client
            .get(url)
            .timeout(policy.timeout())
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = resp.bytes().await.map_err(FetchError::Transport)?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::{Duration, Instant};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_policy(tries: u32) -> RetryPolicy {
        RetryPolicy {
            tries,
            timeout_secs: 5.0,
            backoff: 2.0,
            delay_unit_ms: 20,
        }
    }

    #[tokio::test]
    async fn test_fetch_json_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"a": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = Fetcher::new();
        let value = fetcher
            .fetch_json(&format!("{}/doc", server.uri()), &fast_policy(3))
            .await
            .unwrap();

        assert_eq!(value, json!({"a": 1}));
    }

    #[tokio::test]
    async fn test_server_error_is_retried_exactly_tries_times() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let started = Instant::now();
        let failure = Fetcher::new()
            .fetch_json(&format!("{}/broken", server.uri()), &fast_policy(3))
            .await
            .unwrap_err();

        assert_eq!(failure.tries, 3);
        assert!(matches!(failure.last_error, FetchError::Status(s) if s.as_u16() == 500));
        // sleeps of 20ms and 40ms between the three attempts
        assert!(started.elapsed() >= Duration::from_millis(60));
        assert!(failure.to_string().contains("after 3 tries"));
    }

    #[tokio::test]
    async fn test_non_json_body_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .expect(2)
            .mount(&server)
            .await;

        let failure = Fetcher::new()
            .fetch_json(&server.uri(), &fast_policy(2))
            .await
            .unwrap_err();

        assert!(matches!(failure.last_error, FetchError::Json(_)));
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2])))
            .expect(1)
            .mount(&server)
            .await;

        let value = Fetcher::new()
            .fetch_json(&server.uri(), &fast_policy(4))
            .await
            .unwrap();

        assert_eq!(value, json!([1, 2]));
    }

    #[tokio::test]
    async fn test_failure_with_progress_bar_attached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let bar = ProgressBar::hidden();
        bar.set_length(4);
        let fetcher = Fetcher::new().with_progress(bar.clone());
        let failure = fetcher
            .fetch_json(&server.uri(), &fast_policy(2))
            .await
            .unwrap_err();

        assert_eq!(failure.tries, 2);
        assert_eq!(bar.position(), 0);
        assert!(!bar.is_finished());
    }

    #[tokio::test]
    async fn test_single_try_does_not_sleep() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let policy = RetryPolicy {
            delay_unit_ms: 10_000,
            ..fast_policy(1)
        };
        let started = Instant::now();
        let failure = Fetcher::new().fetch_json(&server.uri(), &policy).await.unwrap_err();

        assert_eq!(failure.tries, 1);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(matches!(
            failure.to_diagnostic(),
            Diagnostic::FetchFailed { tries: 1, .. }
        ));
    }
}
