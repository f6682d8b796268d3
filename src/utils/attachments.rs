//! Reading local files into composer attachments.

use std::fmt;
use std::path::{Path, PathBuf};

use base64::Engine;

use crate::core::message::{Attachment, ComposerAttachment};

#[derive(Debug)]
pub struct AttachmentError {
    path: PathBuf,
    source: std::io::Error,
}

impl fmt::Display for AttachmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to read {}: {}", self.path.display(), self.source)
    }
}

impl std::error::Error for AttachmentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// MIME type for `path`, guessed from its extension.
pub fn guess_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Read `path` and encode it as a base64 attachment. The locator is the
/// path as given; the display name is the file name.
pub async fn load_attachment(path: &Path) -> Result<ComposerAttachment, AttachmentError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| AttachmentError {
            path: path.to_path_buf(),
            source,
        })?;
    let mime_type = guess_mime(path);
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    tracing::debug!(
        mime = %mime_type,
        bytes = bytes.len(),
        "loaded attachment"
    );
    let data = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(ComposerAttachment::new(
        Attachment::new(path.display().to_string(), mime_type, name),
        data,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::AttachmentKind;
    use tempfile::TempDir;

    #[test]
    fn mime_follows_extension() {
        assert_eq!(guess_mime(Path::new("photo.PNG")), "image/png");
        assert_eq!(guess_mime(Path::new("notes.pdf")), "application/pdf");
        assert_eq!(
            guess_mime(Path::new("no_extension")),
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn loads_and_encodes_file() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("pixel.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).expect("write");

        let loaded = load_attachment(&path).await.expect("load");
        assert_eq!(loaded.kind(), AttachmentKind::Image);
        assert_eq!(loaded.attachment.mime_type, "image/png");
        assert_eq!(loaded.attachment.display_name(), "pixel.png");
        assert_eq!(loaded.data, "iVBORw==");
    }

    #[tokio::test]
    async fn missing_file_reports_path() {
        let err = load_attachment(Path::new("/definitely/not/here.png"))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Failed to read /definitely/not/here.png"));
    }
}
