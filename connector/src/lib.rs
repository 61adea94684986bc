/*
 * SPDX-FileCopyrightText: 2025 Wavelens UG <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

pub mod auth;
pub mod jobsets;
pub mod projects;
pub mod retry;

pub use reqwest::StatusCode;
pub use retry::RetryPolicy;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, ORIGIN};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

pub type RequestType = reqwest::Method;

#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub server_url: String,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl RequestConfig {
    pub fn new(server_url: String, username: String, password: String) -> Self {
        RequestConfig {
            server_url,
            username,
            password,
            timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("invalid server url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("{method} {url} failed after {attempts} attempt(s): {source}")]
    Request {
        method: RequestType,
        url: String,
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} {url} kept answering {status}, giving up after {attempts} attempt(s)")]
    RetriesExhausted {
        method: RequestType,
        url: String,
        attempts: u32,
        status: StatusCode,
    },
    #[error("request cancelled")]
    Cancelled,
}

/// Status, typed success body and raw text of a single Hydra API exchange.
///
/// `body` is only populated for 2xx answers whose JSON matched `T`; callers
/// decide which status they consider the success shape.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub status: StatusCode,
    pub body: Option<T>,
    pub raw: String,
}

impl<T> ApiResponse<T> {
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }

    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }

    pub fn json200(&self) -> Option<&T> {
        self.body.as_ref().filter(|_| self.status == StatusCode::OK)
    }

    pub fn json201(&self) -> Option<&T> {
        self.body.as_ref().filter(|_| self.status == StatusCode::CREATED)
    }

    pub fn describe(&self) -> String {
        format!("{}:\n    {}", self.status, self.raw)
    }
}

/// Cookie-authenticated session against one Hydra instance.
///
/// Cloning is cheap and clones share the cookie store and cancellation token.
#[derive(Debug, Clone)]
pub struct HydraConnection {
    client: reqwest::Client,
    base: Url,
    retry: RetryPolicy,
    cancel: CancellationToken,
}

impl HydraConnection {
    pub fn new(config: &RequestConfig) -> Result<Self, ConnectorError> {
        let base = Url::parse(&config.server_url).map_err(|e| ConnectorError::InvalidUrl {
            url: config.server_url.clone(),
            reason: e.to_string(),
        })?;

        if base.cannot_be_a_base() {
            return Err(ConnectorError::InvalidUrl {
                url: config.server_url.clone(),
                reason: "not a base url".to_string(),
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(ConnectorError::Client)?;

        Ok(HydraConnection {
            client,
            base,
            retry: config.retry,
            cancel: CancellationToken::new(),
        })
    }

    /// Builds the client and logs in, so the returned session is ready for CRUD calls.
    pub async fn connect(config: &RequestConfig) -> Result<Self, ConnectorError> {
        let connection = Self::new(config)?;
        connection.login(&config.username, &config.password).await?;
        Ok(connection)
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn server_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ConnectorError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ConnectorError::InvalidUrl {
                url: self.base.to_string(),
                reason: "not a base url".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute<B, T>(
        &self,
        method: RequestType,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<ApiResponse<T>, ConnectorError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        let payload = body.map(serde_json::to_vec).transpose()?;
        let res = self.send(method, url, payload, None).await?;
        Ok(parse_response(res).await)
    }

    async fn send(
        &self,
        method: RequestType,
        url: Url,
        payload: Option<Vec<u8>>,
        origin: Option<&str>,
    ) -> Result<reqwest::Response, ConnectorError> {
        let mut attempt: u32 = 0;

        loop {
            let mut request = self.client.request(method.clone(), url.clone());

            if let Some(origin) = origin {
                request = request.header(ORIGIN, origin);
            }

            if let Some(payload) = &payload {
                request = request.body(payload.clone());
            }

            tracing::debug!(%method, %url, attempt, "Sending Hydra request");

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(ConnectorError::Cancelled),
                result = request.send() => result,
            };

            match result {
                Ok(res) if RetryPolicy::retry_status(res.status()) => {
                    if attempt >= self.retry.max_retries {
                        return Err(ConnectorError::RetriesExhausted {
                            method,
                            url: url.to_string(),
                            attempts: attempt + 1,
                            status: res.status(),
                        });
                    }

                    tracing::warn!(%method, %url, status = %res.status(), attempt, "Retrying Hydra request");
                }
                Ok(res) => {
                    tracing::debug!(%method, %url, status = %res.status(), "Hydra responded");
                    return Ok(res);
                }
                Err(e) => {
                    if attempt >= self.retry.max_retries || !RetryPolicy::retry_error(&e) {
                        return Err(ConnectorError::Request {
                            method,
                            url: url.to_string(),
                            attempts: attempt + 1,
                            source: e,
                        });
                    }

                    tracing::warn!(%method, %url, error = %e, attempt, "Retrying Hydra request");
                }
            }

            let wait = self.retry.backoff(attempt);
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(ConnectorError::Cancelled),
                _ = tokio::time::sleep(wait) => {}
            }

            attempt += 1;
        }
    }
}

async fn parse_response<T: DeserializeOwned>(res: reqwest::Response) -> ApiResponse<T> {
    let status = res.status();
    let raw = match res.text().await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(%status, error = %e, "Failed to read Hydra response body");
            String::new()
        }
    };

    let body = if status.is_success() {
        serde_json::from_str::<T>(&raw).ok()
    } else {
        None
    };

    ApiResponse { status, body, raw }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection(server_url: &str) -> HydraConnection {
        HydraConnection::new(&RequestConfig::new(
            server_url.to_string(),
            "admin".to_string(),
            "secret".to_string(),
        ))
        .unwrap()
    }

    #[test]
    fn test_endpoint_escapes_segments() {
        let connection = connection("https://hydra.example.org/");
        let url = connection.endpoint(&["jobset", "ofborg", "pr 1"]).unwrap();
        assert_eq!(url.as_str(), "https://hydra.example.org/jobset/ofborg/pr%201");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let connection = connection("https://example.org/hydra");
        let url = connection.endpoint(&["project", "nixpkgs"]).unwrap();
        assert_eq!(url.as_str(), "https://example.org/hydra/project/nixpkgs");
    }

    #[test]
    fn test_invalid_server_url() {
        let err = HydraConnection::new(&RequestConfig::new(
            "not a url".to_string(),
            String::new(),
            String::new(),
        ))
        .unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidUrl { .. }));
    }

    #[test]
    fn test_api_response_success_shapes() {
        let created = ApiResponse {
            status: StatusCode::CREATED,
            body: Some(1),
            raw: "1".to_string(),
        };
        assert_eq!(created.json201(), Some(&1));
        assert_eq!(created.json200(), None);

        let missing = ApiResponse::<i32> {
            status: StatusCode::OK,
            body: None,
            raw: "<html>".to_string(),
        };
        assert_eq!(missing.json200(), None);
        assert_eq!(missing.describe(), "200 OK:\n    <html>");
    }
}
