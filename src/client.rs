use reqwest::StatusCode;
use reqwest::header;
use serde::de::DeserializeOwned;
use tracing::info;
use url::Url;

use crate::config::ClientOptions;
use crate::error::CastorError;
use crate::job::{self, JobClient, QueryOptions};

/// Preference asking the server to run the query as a background job.
const PREFER_ASYNC: &str = "respond-async";

/// Entry point for issuing queries against an analytics server.
///
/// Every call owns its own poll sequence; concurrent requests share nothing
/// beyond the underlying `reqwest::Client`.
#[derive(Debug)]
pub struct Client {
    http: reqwest::Client,
    base: Url,
    options: ClientOptions,
}

impl Client {
    /// Creates a client for the endpoint in `options` with its own HTTP transport.
    pub fn new(options: ClientOptions) -> Result<Self, CastorError> {
        let http = reqwest::Client::builder().build()?;
        Self::with_http_client(options, http)
    }

    /// Creates a client reusing a caller-supplied `reqwest::Client`.
    pub fn with_http_client(
        options: ClientOptions,
        http: reqwest::Client,
    ) -> Result<Self, CastorError> {
        let base = Url::parse(&options.endpoint)?;
        Ok(Self {
            http,
            base,
            options,
        })
    }

    /// Issues a GET that the server may answer synchronously or through a
    /// background job.
    ///
    /// A `202 Accepted` response is followed to its `Content-Location` and
    /// polled until the job settles; any other success is returned directly.
    pub async fn get_async<T>(
        &self,
        path_and_query: &str,
        query: Option<&QueryOptions>,
    ) -> Result<T, CastorError>
    where
        T: DeserializeOwned,
    {
        let url = self.base.join(path_and_query)?;
        let resp = self
            .http
            .get(url.clone())
            .header(header::ACCEPT, "application/json")
            .header("Prefer", PREFER_ASYNC)
            .send()
            .await?;

        match resp.status() {
            StatusCode::ACCEPTED => {
                let status_url = job::status_url(&resp)?;
                if self.options.verbose_logging {
                    info!(url = %status_url, "Request accepted as a background job");
                }
                let message = format!("Request to {} in progress", url.path());
                let jobs = JobClient::new(&self.options, self.http.clone());
                jobs.wait_for_result(&status_url, &message, query).await
            }
            status if status.is_success() => Ok(resp.json::<T>().await?),
            _ => Err(job::error_from_response(resp).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unparseable_endpoint() {
        let err = Client::new(ClientOptions::new("not a url")).expect_err("endpoint must not parse");
        assert!(matches!(err, CastorError::Url(_)));
    }

    #[test]
    fn accepts_absolute_endpoint() {
        let client = Client::new(ClientOptions::new("http://analytics.test")).expect("client");
        assert_eq!(client.base.as_str(), "http://analytics.test/");
    }
}
