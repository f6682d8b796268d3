//! Authentication utilities for API requests
//!
//! This module adds the credential and attribution headers each backend
//! expects.

use crate::core::constants::APP_TITLE;

/// Add OpenRouter authentication and attribution headers to a request.
///
/// OpenRouter takes a bearer token plus two optional attribution headers
/// (`HTTP-Referer` and `X-Title`) that identify the calling application.
pub fn add_auth_headers(
    request: reqwest::RequestBuilder,
    api_key: &str,
    referer: &str,
) -> reqwest::RequestBuilder {
    request
        .header("Authorization", format!("Bearer {api_key}"))
        .header("HTTP-Referer", referer)
        .header("X-Title", APP_TITLE)
}

/// Add the Gemini API key header to a request.
pub fn add_gemini_key(request: reqwest::RequestBuilder, api_key: &str) -> reqwest::RequestBuilder {
    request.header("x-goog-api-key", api_key)
}
