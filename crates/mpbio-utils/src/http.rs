//! Blocking HTTP client shared by all data sources.
//!
//! Every request carries the configured timeout. Transport failures, timeouts
//! and non-2xx statuses are mapped onto [`UtilsError`] so callers can degrade
//! a single source without inspecting reqwest internals.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::UtilsError;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Default user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("mpbio/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`HttpClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    /// Timeout applied to the whole request (connect + body).
    pub timeout: Duration,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Thin wrapper around a blocking reqwest client.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    settings: HttpSettings,
}

impl HttpClient {
    /// Build a client from settings.
    pub fn new(settings: HttpSettings) -> Result<Self, UtilsError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| UtilsError::FetchError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, settings })
    }

    /// Build a sibling client that differs only in its timeout.
    pub fn with_timeout(&self, timeout: Duration) -> Result<Self, UtilsError> {
        Self::new(HttpSettings {
            timeout,
            ..self.settings.clone()
        })
    }

    /// The settings this client was built with.
    pub fn settings(&self) -> &HttpSettings {
        &self.settings
    }

    /// GET `url` with query parameters and decode the JSON body.
    pub fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, UtilsError> {
        let response = self.send(url, self.client.get(url).query(query))?;
        decode_json(url, response)
    }

    /// GET `url` with query parameters and return the body as text.
    pub fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String, UtilsError> {
        let response = self.send(url, self.client.get(url).query(query))?;
        read_body(url, response)
    }

    /// POST a JSON body with extra headers and decode the JSON response.
    pub fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &B,
    ) -> Result<T, UtilsError> {
        let mut request = self.client.post(url).json(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let response = self.send(url, request)?;
        decode_json(url, response)
    }

    fn send(&self, url: &str, request: RequestBuilder) -> Result<Response, UtilsError> {
        tracing::debug!(url, timeout_ms = self.settings.timeout.as_millis() as u64, "HTTP request");

        let response = request.send().map_err(|e| map_transport_error(url, e))?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url, status = status.as_u16(), "HTTP request failed");
            return Err(UtilsError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

fn read_body(url: &str, response: Response) -> Result<String, UtilsError> {
    response.text().map_err(|e| map_transport_error(url, e))
}

fn decode_json<T: DeserializeOwned>(url: &str, response: Response) -> Result<T, UtilsError> {
    let body = read_body(url, response)?;
    serde_json::from_str(&body).map_err(|e| UtilsError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

fn map_transport_error(url: &str, err: reqwest::Error) -> UtilsError {
    if err.is_timeout() {
        UtilsError::Timeout {
            url: url.to_string(),
        }
    } else {
        UtilsError::FetchError(format!("{}: {}", url, err))
    }
}
