//! Plain-text formatting for transcript pieces printed by the front ends.

use serde_json::Value;

use crate::api::models::short_model_name;
use crate::api::OpenRouterModel;
use crate::core::constants::APP_TITLE;
use crate::core::message::ComposerAttachment;
use crate::core::session::ProviderKind;

pub const PROMPT: &str = "› ";

pub fn banner(provider: ProviderKind, model: Option<&str>) -> String {
    format!(
        "{APP_TITLE} · {} · {}\nType /help for commands, /quit to leave.",
        provider.display_name(),
        model.unwrap_or("no model selected")
    )
}

pub fn attachment_line(staged: &ComposerAttachment) -> String {
    format!(
        "📎 {} ({}, {})",
        staged.attachment.display_name(),
        staged.kind().as_str(),
        staged.attachment.mime_type
    )
}

/// Web sources cited by a grounded reply, one line each. Entries without a
/// URI are skipped.
pub fn grounding_sources(grounding: &Value) -> Vec<String> {
    let Some(chunks) = grounding.get("groundingChunks").and_then(Value::as_array) else {
        return Vec::new();
    };
    chunks
        .iter()
        .filter_map(|chunk| chunk.get("web"))
        .filter_map(|web| {
            let uri = web.get("uri").and_then(Value::as_str)?;
            let title = web
                .get("title")
                .and_then(Value::as_str)
                .filter(|title| !title.trim().is_empty())
                .unwrap_or(uri);
            Some((title, uri))
        })
        .enumerate()
        .map(|(index, (title, uri))| format!("  [{}] {title} <{uri}>", index + 1))
        .collect()
}

/// One line per catalog entry: the id, then the display name when it adds
/// anything.
pub fn model_listing(models: &[&OpenRouterModel]) -> String {
    models
        .iter()
        .map(|model| {
            let name = model.name.trim();
            if name.is_empty() || name == short_model_name(&model.id) {
                format!("  {}", model.id)
            } else {
                format!("  {:<48} {name}", model.id)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
