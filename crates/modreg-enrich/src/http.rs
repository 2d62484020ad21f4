//! Shared HTTP plumbing

use std::time::Duration;

use reqwest::{Client, RequestBuilder, redirect};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

pub const USER_AGENT: &str = concat!("modreg/", env!("CARGO_PKG_VERSION"));

pub const MAX_REDIRECTS: usize = 10;

/// A client with the crate's user agent, a per-request timeout and at most
/// [`MAX_REDIRECTS`] redirects.
pub fn client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .redirect(redirect::Policy::limited(MAX_REDIRECTS))
        .build()
        .map_err(Error::Client)
}

/// Send `request` and return the body of a 2xx response.
pub(crate) async fn fetch_bytes(request: RequestBuilder, url: &str) -> Result<Vec<u8>> {
    let http = |source| Error::Http {
        url: url.to_string(),
        source,
    };
    let response = request.send().await.map_err(http)?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        });
    }
    let body = response.bytes().await.map_err(http)?;
    Ok(body.to_vec())
}

pub(crate) async fn fetch_json<T: DeserializeOwned>(request: RequestBuilder, url: &str) -> Result<T> {
    let body = fetch_bytes(request, url).await?;
    serde_json::from_slice(&body).map_err(|source| Error::Decode {
        url: url.to_string(),
        source,
    })
}

/// Quote a value as a GraphQL string literal.
pub(crate) fn quote(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}
