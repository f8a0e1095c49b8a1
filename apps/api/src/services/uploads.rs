//! File uploads — résumés, interview videos, and job source documents.
//!
//! Each upload is independent: a failed video for one question leaves the
//! others' URLs in place, so the user retries only what failed.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

use crate::errors::AppError;
use crate::store::ObjectStorage;

/// Storage path convention: `{userId}/{questionId}/{timestamp}.{ext}`.
pub fn upload_path(user_id: Uuid, question_id: &str, ext: &str) -> String {
    upload_path_at(user_id, question_id, Utc::now().timestamp_millis(), ext)
}

fn upload_path_at(user_id: Uuid, question_id: &str, timestamp_ms: i64, ext: &str) -> String {
    format!("{user_id}/{question_id}/{timestamp_ms}.{ext}")
}

/// Uploads one attachment and returns its public URL.
pub async fn upload_attachment(
    storage: &Arc<dyn ObjectStorage>,
    user_id: Uuid,
    question_id: &str,
    filename: &str,
    bytes: Bytes,
) -> Result<String, AppError> {
    if bytes.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }
    let ext = extension_of(filename);
    let path = upload_path(user_id, question_id, ext);
    let content_type = content_type_for(ext);

    storage
        .upload(&path, bytes, content_type)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))
}

/// Extracts the text of an uploaded source document (PDF) so the job
/// wizard can pre-fill its content from it.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, AppError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| AppError::UnprocessableEntity(format!("Could not read PDF: {e}")))?;
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(AppError::UnprocessableEntity(
            "PDF contains no extractable text".to_string(),
        ));
    }
    Ok(text)
}

fn extension_of(filename: &str) -> &str {
    filename.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("bin")
}

fn content_type_for(ext: &str) -> &'static str {
    match ext {
        "pdf" => "application/pdf",
        "webm" => "video/webm",
        "mp4" => "video/mp4",
        "doc" | "docx" => "application/msword",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::store::memory::MemoryObjectStorage;

    #[test]
    fn test_upload_path_follows_convention() {
        let user_id = Uuid::parse_str("6d9a0f5e-0000-0000-0000-000000000001").unwrap();
        assert_eq!(
            upload_path_at(user_id, "v1", 1700000000000, "webm"),
            format!("{user_id}/v1/1700000000000.webm")
        );
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(extension_of("resume.pdf"), "pdf");
        assert_eq!(extension_of("noextension"), "bin");
    }

    #[tokio::test]
    async fn test_upload_returns_public_url() {
        let memory = Arc::new(MemoryObjectStorage::new());
        let storage: Arc<dyn ObjectStorage> = memory.clone();
        let user_id = Uuid::new_v4();

        let url = upload_attachment(
            &storage,
            user_id,
            "resume",
            "resume.pdf",
            Bytes::from_static(b"%PDF-1.4 fake"),
        )
        .await
        .unwrap();
        assert!(url.starts_with("https://storage.test/bucket/"));

        let uploads = memory.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 1);
        assert!(uploads[0].0.starts_with(&format!("{user_id}/resume/")));
        assert_eq!(uploads[0].2, "application/pdf");
    }

    #[tokio::test]
    async fn test_failed_upload_is_isolated() {
        let memory = Arc::new(MemoryObjectStorage::new());
        let storage: Arc<dyn ObjectStorage> = memory.clone();
        let user_id = Uuid::new_v4();

        upload_attachment(&storage, user_id, "v1", "a.webm", Bytes::from_static(b"x"))
            .await
            .unwrap();

        memory.fail_next_upload();
        let err =
            upload_attachment(&storage, user_id, "v2", "b.webm", Bytes::from_static(b"y"))
                .await
                .unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));

        // The first upload is unaffected; only v2 needs a retry.
        assert_eq!(memory.uploads.lock().unwrap().len(), 1);
        upload_attachment(&storage, user_id, "v2", "b.webm", Bytes::from_static(b"y"))
            .await
            .unwrap();
        assert_eq!(memory.uploads.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_upload_is_rejected() {
        let storage: Arc<dyn ObjectStorage> = Arc::new(MemoryObjectStorage::new());
        let err = upload_attachment(&storage, Uuid::new_v4(), "resume", "r.pdf", Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
