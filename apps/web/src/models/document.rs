use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A file accepted by the upload validator. Bytes are held in memory for the
/// session lifetime and forwarded to the matching service untouched.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
    pub uploaded_at: DateTime<Utc>,
}

/// What views get to see of a document: everything but the bytes.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentMeta {
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub size: usize,
    pub uploaded_at: DateTime<Utc>,
}

impl UploadedDocument {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            content_type: content_type.into(),
            bytes,
            uploaded_at: Utc::now(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn meta(&self) -> DocumentMeta {
        DocumentMeta {
            id: self.id,
            filename: self.filename.clone(),
            content_type: self.content_type.clone(),
            size: self.size(),
            uploaded_at: self.uploaded_at,
        }
    }
}
