use std::fs;
use std::path::Path;

use crate::error::IntakeError;
use crate::models::ImagePayload;

/// A file the user picked or dropped, with its declared content type.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Reads a file from disk. The declared type comes from the extension,
    /// the same way a browser fills in `File.type`.
    pub fn from_path(path: &Path) -> Result<Self, IntakeError> {
        let name = path.display().to_string();
        let bytes = fs::read(path).map_err(|source| IntakeError::Unreadable {
            name: name.clone(),
            source,
        })?;

        let content_type = content_type_for(path);
        log::debug!("📂 Read {} ({} bytes, {})", name, bytes.len(), content_type);

        Ok(Self::new(name, content_type, bytes))
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

/// Validates and encodes selected files.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageIntake {
    max_bytes: Option<usize>,
}

impl ImageIntake {
    pub fn with_limit(max_bytes: usize) -> Self {
        Self {
            max_bytes: Some(max_bytes),
        }
    }

    pub fn max_bytes(&self) -> Option<usize> {
        self.max_bytes
    }

    pub fn accept(&self, file: &SelectedFile) -> Result<ImagePayload, IntakeError> {
        if !file.content_type.starts_with("image/") || file.bytes.is_empty() {
            log::warn!("⚠️ Rejected {} ({}, {} bytes)", file.name, file.content_type, file.bytes.len());
            return Err(IntakeError::InvalidInput {
                name: file.name.clone(),
                content_type: file.content_type.clone(),
            });
        }

        if let Some(limit) = self.max_bytes {
            if file.bytes.len() > limit {
                log::warn!("⚠️ Rejected {}: {} bytes over limit {}", file.name, file.bytes.len(), limit);
                return Err(IntakeError::TooLarge {
                    size: file.bytes.len(),
                    limit,
                });
            }
        }

        let payload = ImagePayload::encode(&file.content_type, &file.bytes);
        log::debug!("🔄 Encoded {}: {} -> {} base64 bytes", file.name, file.bytes.len(), payload.encoded_len());

        Ok(payload)
    }
}
