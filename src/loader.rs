//! Document folder scanning.
//!
//! Reads the direct entries of the document folder in file-name order and
//! turns every supported file into one or more [`Document`]s: one per page
//! for PDFs, one per file for text. A file that cannot be read or decoded is
//! logged, recorded in [`LoadReport::failures`], and skipped; only an
//! unreadable folder fails the whole scan.

use std::path::Path;

use doc_summarizer_core::error::LoadError;
use doc_summarizer_core::models::Document;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::extract::{self, DocKind};

/// Result of scanning the document folder.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub documents: Vec<Document>,
    /// Names of the successfully loaded files, sorted.
    pub files: Vec<String>,
    /// Files that were skipped because they failed to load.
    pub failures: Vec<(String, LoadError)>,
}

/// Load every supported file directly inside `folder`.
pub fn load_folder(folder: &Path) -> Result<LoadReport, LoadError> {
    let folder_err = |source: std::io::Error| LoadError::Folder {
        path: folder.to_path_buf(),
        source,
    };

    let meta = std::fs::metadata(folder).map_err(folder_err)?;
    if !meta.is_dir() {
        return Err(folder_err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "not a directory",
        )));
    }

    let mut report = LoadReport::default();

    let walker = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| folder.to_path_buf());
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
                if path == folder {
                    return Err(folder_err(source));
                }
                warn!(path = %path.display(), error = %source, "skipping unreadable entry");
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            debug!(file = %name, "skipping hidden file");
            continue;
        }
        if !entry.file_type().is_file() {
            debug!(file = %name, "skipping non-file entry");
            continue;
        }
        let Some(kind) = DocKind::from_path(entry.path()) else {
            debug!(file = %name, "skipping unsupported file");
            continue;
        };

        match load_file(entry.path(), &name, kind) {
            Ok(docs) => {
                debug!(file = %name, documents = docs.len(), "loaded file");
                report.documents.extend(docs);
                report.files.push(name);
            }
            Err(e) => {
                warn!(file = %name, error = %e, "failed to load file");
                report.failures.push((name, e));
            }
        }
    }

    Ok(report)
}

/// Load one file into documents.
pub fn load_file(path: &Path, name: &str, kind: DocKind) -> Result<Vec<Document>, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let decode_err = |e: extract::ExtractError| LoadError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    match kind {
        DocKind::Text => {
            let content = extract::decode_text(&bytes).map_err(decode_err)?;
            Ok(vec![Document::new(name, content)])
        }
        DocKind::Pdf => {
            let pages = extract::extract_pdf_pages(&bytes).map_err(decode_err)?;
            Ok(pages
                .into_iter()
                .enumerate()
                .map(|(i, text)| Document::new(name, text).with_page(i as u32 + 1))
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_loads_supported_files_sorted() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.txt"), "Water boils at 100C.").unwrap();
        fs::write(tmp.path().join("a.txt"), "The sky is blue.").unwrap();
        fs::write(tmp.path().join("notes.md"), "# ignored").unwrap();
        fs::write(tmp.path().join(".hidden.txt"), "ignored").unwrap();
        fs::create_dir(tmp.path().join("nested.txt")).unwrap();

        let report = load_folder(tmp.path()).unwrap();
        assert_eq!(report.files, vec!["a.txt", "b.txt"]);
        assert_eq!(report.documents.len(), 2);
        assert_eq!(report.documents[0].source_file, "a.txt");
        assert_eq!(report.documents[0].content, "The sky is blue.");
        assert_eq!(report.documents[0].page, None);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_extension_case_insensitive() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("UPPER.TXT"), "shout").unwrap();
        let report = load_folder(tmp.path()).unwrap();
        assert_eq!(report.files, vec!["UPPER.TXT"]);
    }

    #[test]
    fn test_invalid_utf8_is_isolated() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("bad.txt"), b"ok\xFF").unwrap();
        fs::write(tmp.path().join("good.txt"), "fine").unwrap();

        let report = load_folder(tmp.path()).unwrap();
        assert_eq!(report.files, vec!["good.txt"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "bad.txt");
        assert!(matches!(report.failures[0].1, LoadError::Decode { .. }));
    }

    #[test]
    fn test_empty_text_file_is_listed() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("empty.txt"), "").unwrap();
        let report = load_folder(tmp.path()).unwrap();
        assert_eq!(report.files, vec!["empty.txt"]);
    }

    #[test]
    fn test_missing_folder_fails() {
        let tmp = TempDir::new().unwrap();
        let err = load_folder(&tmp.path().join("nope")).unwrap_err();
        assert!(matches!(err, LoadError::Folder { .. }));
    }

    #[test]
    fn test_file_instead_of_folder_fails() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.txt");
        fs::write(&file, "x").unwrap();
        assert!(matches!(load_folder(&file), Err(LoadError::Folder { .. })));
    }
}
