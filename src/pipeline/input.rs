//! Input resolution: turn a user-supplied path or URL into an upload.
//!
//! pdfium can load straight from memory, so every input ends up as an
//! [`UploadedFile`]: the file name (used to label the document and name
//! exports) plus its raw bytes. Only PDF containers are accepted; the magic
//! bytes are checked here so callers get a meaningful error instead of a
//! pdfium parse failure.

use crate::error::DocuMindError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// pdfium tolerates junk before the header as long as it starts within this
/// many bytes.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// A PDF handed to the pipeline.
#[derive(Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedFile")
            .field("filename", &self.filename)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl UploadedFile {
    /// Wrap in-memory bytes, rejecting anything that is not a PDF.
    pub fn from_bytes(
        filename: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, DocuMindError> {
        let filename = filename.into();
        ensure_pdf_magic(&filename, &bytes)?;
        Ok(Self { filename, bytes })
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to an in-memory PDF.
///
/// If the input is a URL, download it. If it is a local file, validate it
/// exists and is readable.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<UploadedFile, DocuMindError> {
    if input.trim().is_empty() {
        return Err(DocuMindError::InvalidInput {
            input: input.to_string(),
            reason: "no file given".into(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(Path::new(input)).await
    }
}

async fn read_local(path: &Path) -> Result<UploadedFile, DocuMindError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => DocuMindError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => DocuMindError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let filename = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    UploadedFile::from_bytes(filename, bytes)
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<UploadedFile, DocuMindError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DocuMindError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            DocuMindError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            DocuMindError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(DocuMindError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| DocuMindError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());
    UploadedFile::from_bytes(filename_from_url(url), bytes.to_vec())
}

/// Pick a file name from the last URL path segment.
pub fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() {
                    return last.to_string();
                }
            }
        }
    }
    "downloaded.pdf".to_string()
}

fn ensure_pdf_magic(filename: &str, bytes: &[u8]) -> Result<(), DocuMindError> {
    let head = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW + PDF_MAGIC.len() - 1)];
    if !head.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC) {
        return Err(DocuMindError::NotAPdf {
            filename: filename.to_string(),
            magic: bytes.iter().take(PDF_MAGIC.len()).copied().collect(),
        });
    }
    Ok(())
}

/// Build the export path `<dir>/<filename>_summary.txt`.
pub fn summary_export_path(dir: &Path, filename: &str) -> PathBuf {
    dir.join(format!("{filename}_summary.txt"))
}
