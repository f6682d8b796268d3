//! Endpoint construction that tolerates stray slashes in configured base URLs.

/// Strip trailing slashes from a base URL.
///
/// ```
/// use nexus::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("https://openrouter.ai/api/v1/"), "https://openrouter.ai/api/v1");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path with exactly one slash.
///
/// ```
/// use nexus::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("https://openrouter.ai/api/v1/", "/chat/completions"),
///     "https://openrouter.ai/api/v1/chat/completions"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{endpoint}", normalize_base_url(base_url))
}
