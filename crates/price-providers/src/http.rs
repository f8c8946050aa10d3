use market_core::FetchError;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::{ProviderSettings, RateLimiter};

pub(crate) fn build_client(settings: &ProviderSettings) -> Client {
    Client::builder()
        .timeout(settings.timeout)
        .user_agent(settings.user_agent.clone())
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Send one rate-limited request and classify any failure.
///
/// There is no retry here: HTTP 429 comes back as `RateLimited` and the
/// caller decides what to do with it.
pub(crate) async fn send(
    provider: &'static str,
    limiter: &RateLimiter,
    builder: RequestBuilder,
) -> Result<Response, FetchError> {
    limiter.acquire().await;

    let response = builder.send().await.map_err(|e| {
        if e.is_timeout() || e.is_connect() {
            FetchError::transient(provider, e.to_string())
        } else {
            FetchError::classify_message(provider, &e.to_string())
        }
    })?;

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        tracing::warn!("{} returned HTTP 429", provider);
        return Err(FetchError::rate_limited(provider));
    }
    if status == StatusCode::NOT_FOUND {
        return Err(FetchError::data_absent(provider));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FetchError::classify_message(
            provider,
            &format!("HTTP {}: {}", status, body),
        ));
    }

    Ok(response)
}

pub(crate) async fn decode<T: DeserializeOwned>(provider: &'static str, response: Response) -> Result<T, FetchError> {
    let body = response
        .text()
        .await
        .map_err(|e| FetchError::transient(provider, e.to_string()))?;
    serde_json::from_str(&body).map_err(|e| FetchError::transient(provider, format!("decode: {}", e)))
}
