use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{LingoError, Result};

/// Send a provider request and require a 2xx answer.
pub(crate) async fn send_checked(provider: &str, request: RequestBuilder) -> Result<Response> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            LingoError::network(provider, format!("request timed out: {}", e))
        } else {
            LingoError::network(provider, format!("HTTP request failed: {}", e))
        }
    })?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(LingoError::response(provider, format!("API error {}: {}", status, body)));
    }

    Ok(response)
}

/// Decode a JSON body into the vendor's response shape.
pub(crate) async fn parse_json<T: DeserializeOwned>(provider: &str, response: Response) -> Result<T> {
    let body = response
        .text()
        .await
        .map_err(|e| LingoError::network(provider, format!("Failed to read response: {}", e)))?;

    debug!("{} raw response: {}", provider, body);

    serde_json::from_str(&body)
        .map_err(|e| LingoError::response(provider, format!("Failed to parse response: {}", e)))
}

/// Reject a missing or blank translation field.
pub(crate) fn require_translation(provider: &str, translation: Option<String>) -> Result<String> {
    match translation {
        Some(text) if !text.trim().is_empty() => Ok(text),
        Some(_) => Err(LingoError::response(provider, "empty translation received")),
        None => Err(LingoError::response(provider, "response contained no translation")),
    }
}
