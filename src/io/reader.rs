//! Document file reading.
//!
//! Only plain UTF-8 text is accepted. Word documents must be converted to
//! text before they reach this crate.

use crate::error::{IoError, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Maximum file size to read into memory (64MB).
const MAX_FILE_SIZE: u64 = 64 * 1024 * 1024;

/// Extensions that are read as plain text. Files without an extension are
/// accepted too.
pub const TEXT_EXTENSIONS: &[&str] = &["txt", "text", "md", "markdown"];

/// Reads a text document.
///
/// # Arguments
///
/// * `path` - Path to a `.txt`, `.md` or extension-less UTF-8 file.
///
/// # Errors
///
/// - [`IoError::FileNotFound`] if the path does not exist.
/// - [`IoError::UnsupportedType`] for any other extension (`.doc`, `.docx`, ...).
/// - [`IoError::EmptyFile`] if the file holds only whitespace.
/// - [`IoError::ReadFailed`] if it cannot be read, is too large, or is not UTF-8.
///
/// # Examples
///
/// ```no_run
/// use doc_segmenter::io::read_document;
///
/// let text = read_document("report.txt").unwrap();
/// ```
pub fn read_document<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy().to_string();

    if !path.exists() {
        return Err(IoError::FileNotFound { path: path_str }.into());
    }

    if let Some(extension) = path.extension().map(|e| e.to_string_lossy().to_lowercase())
        && !TEXT_EXTENSIONS.contains(&extension.as_str())
    {
        return Err(IoError::UnsupportedType {
            path: path_str,
            extension,
        }
        .into());
    }

    let read_failed = |reason: String| IoError::ReadFailed {
        path: path_str.clone(),
        reason,
    };

    let file = File::open(path).map_err(|e| read_failed(e.to_string()))?;
    let size = file
        .metadata()
        .map_err(|e| read_failed(e.to_string()))?
        .len();
    if size > MAX_FILE_SIZE {
        return Err(read_failed(format!(
            "file too large: {size} bytes (max: {MAX_FILE_SIZE} bytes)"
        ))
        .into());
    }

    let mut bytes = Vec::with_capacity(usize::try_from(size).unwrap_or(0));
    file.take(MAX_FILE_SIZE)
        .read_to_end(&mut bytes)
        .map_err(|e| read_failed(e.to_string()))?;
    let content =
        String::from_utf8(bytes).map_err(|e| read_failed(format!("invalid UTF-8: {e}")))?;

    if content.trim().is_empty() {
        return Err(IoError::EmptyFile { path: path_str }.into());
    }

    Ok(content)
}

/// File name used to identify a document in storage.
#[must_use]
pub fn document_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.to_string_lossy().to_string(),
        |name| name.to_string_lossy().to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::io::Write;
    use tempfile::TempDir;
    use test_case::test_case;

    fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(bytes).unwrap();
        path
    }

    #[test_case("doc.txt" ; "txt")]
    #[test_case("doc.md" ; "markdown")]
    #[test_case("DOC.TXT" ; "uppercase extension")]
    #[test_case("notes" ; "no extension")]
    fn test_reads_text(name: &str) {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, name, "Größe zählt.\n".as_bytes());
        assert_eq!(read_document(&path).unwrap(), "Größe zählt.\n");
    }

    #[test]
    fn test_missing_file() {
        let err = read_document("/nonexistent/doc.txt").unwrap_err();
        assert!(matches!(err, Error::Io(IoError::FileNotFound { .. })));
    }

    #[test_case("report.docx", "docx")]
    #[test_case("report.doc", "doc")]
    #[test_case("scan.pdf", "pdf")]
    fn test_unsupported_extension(name: &str, expected: &str) {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, name, b"binary");
        match read_document(&path).unwrap_err() {
            Error::Io(IoError::UnsupportedType { extension, .. }) => assert_eq!(extension, expected),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_whitespace_only_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "blank.txt", b"  \n\t\n");
        let err = read_document(&path).unwrap_err();
        assert!(matches!(err, Error::Io(IoError::EmptyFile { .. })));
    }

    #[test]
    fn test_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "bad.txt", &[0xff, 0xfe, 0x00]);
        let err = read_document(&path).unwrap_err();
        assert!(err.to_string().contains("invalid UTF-8"));
    }

    #[test]
    fn test_document_name() {
        assert_eq!(document_name(Path::new("/data/in/report.txt")), "report.txt");
        assert_eq!(document_name(Path::new("report.txt")), "report.txt");
    }
}
