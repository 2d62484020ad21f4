//! Typed GraphQL envelope

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::http;

#[derive(Serialize)]
struct Request<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct Response<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<ErrorMessage>,
}

#[derive(Deserialize)]
struct ErrorMessage {
    message: String,
}

/// POST `query` to `url` and decode `data` into `T`.
///
/// Any entry in `errors` fails the whole query.
pub(crate) async fn execute<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    token: Option<&str>,
    query: &str,
) -> Result<T> {
    let mut request = client.post(url).json(&Request { query });
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    let response: Response<T> = http::fetch_json(request, url).await?;

    if !response.errors.is_empty() {
        let messages = response
            .errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(Error::GraphQl {
            url: url.to_string(),
            messages,
        });
    }
    response.data.ok_or_else(|| Error::GraphQl {
        url: url.to_string(),
        messages: "response has no data".to_string(),
    })
}
