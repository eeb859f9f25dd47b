use reqwest::StatusCode;
use reqwest::header;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::{ClientOptions, RetrySettings};
use crate::error::{ApiErrorBody, CastorError};
use crate::retry::{RetryOptions, with_retry};
use crate::utils::logging::{body_preview, with_pretty_json_debug};

/// Response header carrying the job-status URL of an accepted request.
const STATUS_URL_HEADER: &str = "content-location";

/// Response header carrying free-form progress text while a job runs.
const PROGRESS_HEADER: &str = "x-progress";

/// Options accepted by requests that may resolve through a background job.
#[derive(Default)]
pub struct QueryOptions {
    /// Called with the server-reported progress each time a poll finds the
    /// job still running. Never called after the request settles.
    pub on_progress: Option<Box<dyn Fn(&str) + Send + Sync>>,
}

/// Polls the status URL of a server-side job until it reaches a terminal state.
pub struct JobClient {
    client: reqwest::Client,
    retry: RetrySettings,
    verbose_logging: bool,
}

impl JobClient {
    pub fn new(options: &ClientOptions, client: reqwest::Client) -> Self {
        Self {
            client,
            retry: options.async_retry,
            verbose_logging: options.verbose_logging,
        }
    }

    /// Issues a single poll against `status_url` and classifies the outcome.
    ///
    /// `202 Accepted` means the job is still running and maps to the only
    /// retryable error; every other failure is terminal.
    pub async fn poll_once<T>(&self, status_url: &Url) -> Result<T, CastorError>
    where
        T: DeserializeOwned,
    {
        let resp = self
            .client
            .get(status_url.clone())
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        match resp.status() {
            StatusCode::ACCEPTED => {
                let progress = progress_header(&resp);
                debug!(url = %status_url, progress = ?progress, "Job still in progress");
                Err(CastorError::JobInProgress { progress })
            }
            status if status.is_success() => Ok(resp.json::<T>().await?),
            _ => Err(error_from_response(resp).await),
        }
    }

    /// Waits for the eventual result behind a job-status URL, polling with
    /// the configured backoff schedule and forwarding progress reports.
    pub async fn wait_for_result<T>(
        &self,
        status_url: &Url,
        message: &str,
        query: Option<&QueryOptions>,
    ) -> Result<T, CastorError>
    where
        T: DeserializeOwned,
    {
        let op = || {
            let status_url = status_url.clone();
            async move {
                match self.poll_once::<T>(&status_url).await {
                    Err(err) => {
                        report_progress(&err, query);
                        Err(err)
                    }
                    ok => ok,
                }
            }
        };

        with_retry(
            op,
            RetryOptions {
                retry: &self.retry,
                verbose_logging: self.verbose_logging,
                message,
            },
        )
        .await
    }
}

/// Extracts the job-status URL from the headers of a `202 Accepted` response.
pub fn status_url(response: &reqwest::Response) -> Result<Url, CastorError> {
    let value = response
        .headers()
        .get(STATUS_URL_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(CastorError::MissingStatusUrl)?;
    Ok(Url::parse(value)?)
}

fn progress_header(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(PROGRESS_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

fn report_progress(err: &CastorError, query: Option<&QueryOptions>) {
    let CastorError::JobInProgress {
        progress: Some(progress),
    } = err
    else {
        return;
    };
    if let Some(on_progress) = query.and_then(|options| options.on_progress.as_ref()) {
        on_progress(progress);
    }
}

/// Maps an error response onto the error taxonomy, preferring the server's
/// structured `{"error": {...}}` payload over the raw body.
pub(crate) async fn error_from_response(resp: reqwest::Response) -> CastorError {
    let status = resp.status();
    let bytes = resp.bytes().await.unwrap_or_default();

    if let Ok(body) = serde_json::from_slice::<ApiErrorBody>(&bytes) {
        with_pretty_json_debug(&body, |pretty_body| {
            debug!(%status, body = %pretty_body, "Server returned a structured error");
        });
        return CastorError::Server {
            status,
            code: body.inner.code,
            message: body.inner.message,
        };
    }

    let raw_body = String::from_utf8_lossy(&bytes);
    debug!(
        %status,
        body = %body_preview(&raw_body),
        "Server returned an unstructured error"
    );
    CastorError::UpstreamStatus(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn response_with_headers(headers: &[(&str, &str)]) -> reqwest::Response {
        let mut builder = axum::http::Response::builder().status(StatusCode::ACCEPTED);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        reqwest::Response::from(builder.body("").expect("test response"))
    }

    #[test]
    fn status_url_reads_content_location() {
        let resp = response_with_headers(&[(
            "content-location",
            "http://analytics.test/job/7/status",
        )]);
        let url = status_url(&resp).expect("status url");
        assert_eq!(url.as_str(), "http://analytics.test/job/7/status");
    }

    #[test]
    fn status_url_fails_without_content_location() {
        let resp = response_with_headers(&[]);
        let err = status_url(&resp).expect_err("header is required");
        assert!(matches!(err, CastorError::MissingStatusUrl));
        assert_eq!(err.to_string(), "No Content-Location header found");
    }

    #[test]
    fn status_url_rejects_malformed_urls() {
        let resp = response_with_headers(&[("content-location", "job/7/status")]);
        let err = status_url(&resp).expect_err("relative url must not parse");
        assert!(matches!(err, CastorError::Url(_)));
    }

    #[test]
    fn progress_header_is_forwarded_verbatim() {
        let resp = response_with_headers(&[("x-progress", "Stage 2 of 3")]);
        assert_eq!(progress_header(&resp).as_deref(), Some("Stage 2 of 3"));
    }

    #[test]
    fn report_progress_invokes_callback_only_with_progress_data() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let query = QueryOptions {
            on_progress: Some(Box::new(move |progress: &str| {
                sink.lock().expect("progress sink").push(progress.to_owned());
            })),
        };

        report_progress(
            &CastorError::JobInProgress {
                progress: Some("41% complete".to_string()),
            },
            Some(&query),
        );
        report_progress(
            &CastorError::JobInProgress { progress: None },
            Some(&query),
        );
        report_progress(&CastorError::MissingStatusUrl, Some(&query));
        report_progress(
            &CastorError::JobInProgress {
                progress: Some("never delivered".to_string()),
            },
            None,
        );

        assert_eq!(
            *seen.lock().expect("progress sink"),
            vec!["41% complete".to_string()]
        );
    }
}
