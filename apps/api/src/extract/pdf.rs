// PDF text extraction backed by pdf-extract. Page text arrives already
// concatenated in page order from the underlying reader.

use bytes::Bytes;

use crate::extract::{ExtractedText, ExtractionFailure};
use crate::sources::SourceKind;

/// Extracts text from an in-memory PDF.
///
/// The parse is CPU-bound and runs on the blocking pool so a pathological
/// document cannot stall the async runtime.
pub async fn extract(data: Bytes) -> Result<ExtractedText, ExtractionFailure> {
    let parsed = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
        .await
        .map_err(|e| ExtractionFailure::Unreadable(format!("pdf worker: {e}")))?;

    let text = parsed.map_err(|e| ExtractionFailure::Unreadable(format!("pdf: {e}")))?;
    // Some PDF writers pad text runs with NULs; strip them before the
    // emptiness check so a visually blank page is reported as such.
    let text = text.replace('\0', "");

    if text.trim().is_empty() {
        return Err(ExtractionFailure::Empty);
    }
    Ok(ExtractedText::new(text, SourceKind::Pdf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_garbage_bytes_are_unreadable() {
        let err = extract(Bytes::from_static(b"definitely not a pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionFailure::Unreadable(_)));
    }

    #[tokio::test]
    async fn test_truncated_header_is_unreadable() {
        let err = extract(Bytes::from_static(b"%PDF-1.4")).await.unwrap_err();
        assert!(matches!(err, ExtractionFailure::Unreadable(_)));
    }
}
