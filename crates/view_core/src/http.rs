//! HTTP fetch collaborator on top of `reqwest`.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, Method};
use shared::{
    domain::Value,
    protocol::{FetchRequest, FetchResponse},
};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::Fetcher;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid api origin '{origin}': {source}")]
    InvalidOrigin {
        origin: String,
        source: url::ParseError,
    },
    #[error("invalid request url '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("unsupported http method '{0}'")]
    InvalidMethod(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("response body is not valid json: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Resolves screen URLs against an API origin and sends them as JSON requests.
pub struct HttpFetcher {
    http: Client,
    origin: Url,
}

impl HttpFetcher {
    pub fn new(origin: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, origin)?)
    }

    pub fn with_client(http: Client, origin: &str) -> Result<Self, FetchError> {
        // A trailing slash keeps relative screen paths under the origin's path.
        let normalized = if origin.ends_with('/') {
            origin.to_string()
        } else {
            format!("{origin}/")
        };
        let origin = Url::parse(&normalized).map_err(|source| FetchError::InvalidOrigin {
            origin: origin.to_string(),
            source,
        })?;
        Ok(Self { http, origin })
    }

    /// Absolute URLs pass through; anything else is joined under the
    /// origin's path, leading slash or not.
    pub fn request_url(&self, url: &str) -> Result<Url, FetchError> {
        if let Ok(absolute) = Url::parse(url) {
            return Ok(absolute);
        }
        self.origin
            .join(url.trim_start_matches('/'))
            .map_err(|source| FetchError::InvalidUrl {
                url: url.to_string(),
                source,
            })
    }

    async fn send(&self, url: &str, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        let target = self.request_url(url)?;
        let method = Method::from_bytes(request.method.to_ascii_uppercase().as_bytes())
            .map_err(|_| FetchError::InvalidMethod(request.method.clone()))?;
        debug!("http: send method={method} url={target}");

        let mut builder = self.http.request(method, target);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let res = builder.send().await?.error_for_status()?;
        let bytes = res.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(FetchResponse::empty());
        }
        let data: Value = serde_json::from_slice(&bytes)?;
        Ok(FetchResponse::with_data(data))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, request: FetchRequest) -> Result<FetchResponse> {
        Ok(self.send(url, request).await?)
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
