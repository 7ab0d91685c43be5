// Office-document extraction backed by docx-rs. The capability is a build
// feature: binaries compiled without it keep the same entry point and report
// the capability as unavailable instead of failing to link.

use bytes::Bytes;

use crate::extract::{ExtractedText, ExtractionFailure};

/// Whether office-document parsing was compiled into this binary. Resolved
/// once and reported through the health endpoint.
pub const SUPPORTED: bool = cfg!(feature = "docx");

/// Extracts paragraph text in document order, one line per paragraph.
#[cfg(feature = "docx")]
pub fn extract(data: &Bytes) -> Result<ExtractedText, ExtractionFailure> {
    use docx_rs::{DocumentChild, ParagraphChild, RunChild};

    use crate::sources::SourceKind;

    let parsed =
        docx_rs::read_docx(data).map_err(|e| ExtractionFailure::Unreadable(format!("docx: {e}")))?;

    let mut paragraphs: Vec<String> = Vec::new();
    for child in parsed.document.children {
        if let DocumentChild::Paragraph(paragraph) = child {
            let mut line = String::new();
            for paragraph_child in paragraph.children {
                if let ParagraphChild::Run(run) = paragraph_child {
                    for run_child in run.children {
                        if let RunChild::Text(text) = run_child {
                            line.push_str(&text.text);
                        }
                    }
                }
            }
            if !line.trim().is_empty() {
                paragraphs.push(line);
            }
        }
    }

    if paragraphs.is_empty() {
        return Err(ExtractionFailure::Empty);
    }
    Ok(ExtractedText::new(paragraphs.join("\n"), SourceKind::Docx))
}

#[cfg(not(feature = "docx"))]
pub fn extract(_data: &Bytes) -> Result<ExtractedText, ExtractionFailure> {
    Err(ExtractionFailure::Unreadable(
        "office-document support is not compiled into this build".to_string(),
    ))
}
