//! Thin HTTP client for the revassignd API.

use anyhow::{bail, Context, Result};
use reqwest::StatusCode;
use revassignd::http::ErrorBody;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// A decoded response: status plus JSON body (`Null` when empty).
#[derive(Debug)]
pub struct ApiReply {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiReply {
    /// Success body, or the server's error rendered as `CODE: message`.
    pub fn into_result(self) -> Result<Value> {
        if self.status.is_success() {
            return Ok(self.body);
        }
        match serde_json::from_value::<ErrorBody>(self.body.clone()) {
            Ok(err) => bail!("{} ({}): {}", err.error.code, self.status, err.error.message),
            Err(_) => bail!("server returned {}: {}", self.status, self.body),
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("revassign-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<ApiReply> {
        let url = self.url(path);
        debug!(%url, "GET");
        let resp = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;
        Self::decode(resp).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<ApiReply> {
        let url = self.url(path);
        debug!(%url, "POST");
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {url} failed"))?;
        Self::decode(resp).await
    }

    async fn decode(resp: reqwest::Response) -> Result<ApiReply> {
        let status = resp.status();
        let bytes = resp.bytes().await.context("Failed to read response body")?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        Ok(ApiReply { status, body })
    }
}
