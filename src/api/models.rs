use crate::api::{ModelsResponse, OpenRouterModel};
use crate::core::constants::CATALOG_PREVIEW_LIMIT;
use crate::utils::auth::add_auth_headers;
use crate::utils::url::construct_api_url;

pub async fn fetch_models(
    client: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    referer: &str,
) -> Result<Vec<OpenRouterModel>, Box<dyn std::error::Error + Send + Sync>> {
    let models_url = construct_api_url(base_url, "models");
    let request = client
        .get(models_url)
        .header("Content-Type", "application/json");
    let request = add_auth_headers(request, api_key, referer);

    let response = request.send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(format!("API request failed with status {status}: {error_text}").into());
    }

    let models_response = response.json::<ModelsResponse>().await?;
    Ok(models_response.data)
}

/// Narrow a catalog for display. A blank query shows the first
/// [`CATALOG_PREVIEW_LIMIT`] entries; otherwise every entry whose name or id
/// contains the query, ignoring case.
pub fn filter_models<'a>(models: &'a [OpenRouterModel], query: &str) -> Vec<&'a OpenRouterModel> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return models.iter().take(CATALOG_PREVIEW_LIMIT).collect();
    }
    models
        .iter()
        .filter(|m| {
            m.name.to_lowercase().contains(&query) || m.id.to_lowercase().contains(&query)
        })
        .collect()
}

/// Last path segment of a model id, e.g. `claude-3.5-sonnet` for
/// `anthropic/claude-3.5-sonnet`.
pub fn short_model_name(model_id: &str) -> &str {
    model_id.rsplit('/').next().unwrap_or(model_id)
}
