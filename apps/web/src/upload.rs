//! Upload validation: file size, type and count limits applied to every document
//! before it enters session state.

use axum::extract::Multipart;
use tracing::warn;

use crate::errors::AppError;
use crate::models::document::UploadedDocument;

pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
pub const MAX_UPLOADS: usize = 10;

const PDF: &str = "application/pdf";
const DOC: &str = "application/msword";
const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

pub const ACCEPTED_MIME_TYPES: &[&str] = &[PDF, DOC, DOCX];

/// Content types browsers send when they do not know better.
const GENERIC_MIME_TYPES: &[&str] = &["", "application/octet-stream", "binary/octet-stream"];

/// Checks one file and returns the content type to forward it with.
pub fn validate_document(
    filename: &str,
    content_type: Option<&str>,
    size: usize,
) -> Result<String, AppError> {
    if size == 0 {
        return Err(AppError::Validation(format!("{filename} is empty")));
    }
    if size > MAX_FILE_SIZE {
        return Err(AppError::PayloadTooLarge(format!(
            "{filename} exceeds the 10MB size limit"
        )));
    }

    let declared = content_type.map(|c| c.trim().to_ascii_lowercase());
    if let Some(declared) = &declared {
        if ACCEPTED_MIME_TYPES.contains(&declared.as_str()) {
            return Ok(declared.clone());
        }
    }

    let generic = declared
        .as_deref()
        .map(|c| GENERIC_MIME_TYPES.contains(&c))
        .unwrap_or(true);
    match (generic, mime_from_extension(filename)) {
        (true, Some(mime)) => Ok(mime.to_string()),
        _ => Err(AppError::Validation(format!(
            "Unsupported file type for {filename}. Please upload PDF, DOC or DOCX files"
        ))),
    }
}

fn mime_from_extension(filename: &str) -> Option<&'static str> {
    let (_, extension) = filename.rsplit_once('.')?;
    match extension.to_ascii_lowercase().as_str() {
        "pdf" => Some(PDF),
        "doc" => Some(DOC),
        "docx" => Some(DOCX),
        _ => None,
    }
}

/// Reads every file field named `field_name` from a multipart body, validating each.
/// Fields with other names are ignored. Every rejected file is reported, not only
/// the first.
pub async fn read_documents(
    multipart: &mut Multipart,
    field_name: &str,
) -> Result<Vec<UploadedDocument>, AppError> {
    let mut documents = Vec::new();
    let mut rejected = Vec::new();
    let mut seen = 0;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid upload: {e}")))?
    {
        if field.name() != Some(field_name) {
            continue;
        }
        seen += 1;
        if seen > MAX_UPLOADS {
            return Err(AppError::Validation(format!(
                "A maximum of {MAX_UPLOADS} files can be uploaded at once"
            )));
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("Uploaded file has no name".to_string()))?;
        let declared = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read {filename}: {e}")))?;

        match validate_document(&filename, declared.as_deref(), bytes.len()) {
            Ok(content_type) => {
                documents.push(UploadedDocument::new(filename, content_type, bytes))
            }
            Err(e) => {
                warn!("Rejected upload: {e}");
                rejected.push(e);
            }
        }
    }

    if !rejected.is_empty() {
        return Err(combine_rejections(rejected));
    }
    if documents.is_empty() {
        return Err(AppError::Validation("No file was uploaded".to_string()));
    }

    Ok(documents)
}

/// Folds per-file rejections into one error naming every file. Stays
/// `PayloadTooLarge` only when size was the sole problem.
fn combine_rejections(rejected: Vec<AppError>) -> AppError {
    let only_size = rejected
        .iter()
        .all(|e| matches!(e, AppError::PayloadTooLarge(_)));
    let message = rejected
        .iter()
        .map(AppError::user_message)
        .collect::<Vec<_>>()
        .join("\n");
    if only_size {
        AppError::PayloadTooLarge(message)
    } else {
        AppError::Validation(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_declared_pdf() {
        assert_eq!(
            validate_document("cv.pdf", Some("application/pdf"), 1024).unwrap(),
            PDF
        );
    }

    #[test]
    fn test_generic_type_falls_back_to_extension() {
        assert_eq!(
            validate_document("cv.DOCX", Some("application/octet-stream"), 10).unwrap(),
            DOCX
        );
        assert_eq!(validate_document("cv.doc", None, 10).unwrap(), DOC);
    }

    #[test]
    fn test_rejects_unsupported_type() {
        let err = validate_document("photo.png", Some("image/png"), 10).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("photo.png")));
    }

    #[test]
    fn test_declared_type_wins_over_extension() {
        assert!(validate_document("cv.pdf", Some("text/html"), 10).is_err());
    }

    #[test]
    fn test_rejects_oversized_file() {
        let err = validate_document("big.pdf", Some(PDF), MAX_FILE_SIZE + 1).unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));
        assert!(validate_document("edge.pdf", Some(PDF), MAX_FILE_SIZE).is_ok());
    }

    #[test]
    fn test_rejects_empty_file() {
        assert!(matches!(
            validate_document("empty.pdf", Some(PDF), 0),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_file_without_extension_is_rejected() {
        assert!(validate_document("resume", None, 10).is_err());
    }

    #[test]
    fn test_rejections_name_every_file() {
        let err = combine_rejections(vec![
            validate_document("notes.txt", Some("text/plain"), 10).unwrap_err(),
            validate_document("big.pdf", Some(PDF), MAX_FILE_SIZE + 1).unwrap_err(),
        ]);
        match err {
            AppError::Validation(message) => {
                assert!(message.contains("notes.txt"));
                assert!(message.contains("big.pdf"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_size_only_rejections_stay_payload_too_large() {
        let err = combine_rejections(vec![
            validate_document("a.pdf", Some(PDF), MAX_FILE_SIZE + 1).unwrap_err(),
            validate_document("b.pdf", Some(PDF), MAX_FILE_SIZE + 1).unwrap_err(),
        ]);
        assert!(matches!(err, AppError::PayloadTooLarge(ref m) if m.contains("a.pdf") && m.contains("b.pdf")));
    }
}
