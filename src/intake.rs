//! CSV intake boundary: uploads are checked here before any text reaches the
//! validator.

use std::fs;
use std::path::Path;
use thiserror::Error;

pub const CSV_MIME_TYPE: &str = "text/csv";

/// Rows shown when the user asks for the expected format
pub const CSV_FORMAT_EXAMPLE: &[&str] = &[
    "0xd88d0f22f9bc682afa550da99062b3865088386d, 0.000056",
    "pavlik.eth, 12",
    "0x64c9525A3c3a65Ea88b06f184F074C2499578A7E, 1",
    "0xC8c30Fa803833dD1Fd6DBCDd91Ed0b301EFf87cF, 13.45",
    "0x7D52422D3A5fE9bC92D3aE8167097eE09F1b347d, 1.049",
];

/// Help text for the `address, amount` format, with the example rows
pub fn format_help() -> String {
    let mut text = String::from("One recipient per line, address and amount separated by a comma:\n");
    for row in CSV_FORMAT_EXAMPLE {
        text.push_str(row);
        text.push('\n');
    }
    text
}

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("Please upload a valid CSV file.")]
    NotCsv { file_name: String, mime_type: String },
    #[error("Could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A file handed over by the user
#[derive(Debug, Clone)]
pub struct CsvUpload {
    pub file_name: String,
    pub mime_type: String,
    pub contents: String,
}

impl CsvUpload {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            contents: contents.into(),
        }
    }
}

/// Accept an upload only if it is declared as `text/csv`
pub fn accept_upload(upload: CsvUpload) -> Result<String, IntakeError> {
    if upload.mime_type.trim().eq_ignore_ascii_case(CSV_MIME_TYPE) {
        tracing::info!("Accepted CSV upload {} ({} bytes)", upload.file_name, upload.contents.len());
        Ok(upload.contents)
    } else {
        tracing::warn!("Rejected upload {} with type {}", upload.file_name, upload.mime_type);
        Err(IntakeError::NotCsv {
            file_name: upload.file_name,
            mime_type: upload.mime_type,
        })
    }
}

/// MIME type inferred from the file extension
pub fn mime_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => CSV_MIME_TYPE,
        _ => "application/octet-stream",
    }
}

/// Load a CSV file from disk through the upload check
pub fn read_csv_file(path: &Path) -> Result<String, IntakeError> {
    let mime_type = mime_type_for(path);
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    if mime_type != CSV_MIME_TYPE {
        return Err(IntakeError::NotCsv {
            file_name,
            mime_type: mime_type.to_string(),
        });
    }

    let contents = fs::read_to_string(path).map_err(|source| IntakeError::Io {
        path: path.display().to_string(),
        source,
    })?;
    accept_upload(CsvUpload::new(file_name, mime_type, contents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipients::validate_csv;

    #[test]
    fn test_accept_csv_upload() {
        let upload = CsvUpload::new("list.csv", "text/csv", "0xabc, 1");
        assert_eq!(accept_upload(upload).unwrap(), "0xabc, 1");
    }

    #[test]
    fn test_reject_other_mime_types() {
        let upload = CsvUpload::new("list.txt", "text/plain", "0xabc, 1");
        let err = accept_upload(upload).unwrap_err();
        assert_eq!(err.to_string(), "Please upload a valid CSV file.");
        assert!(matches!(err, IntakeError::NotCsv { ref mime_type, .. } if mime_type == "text/plain"));
    }

    #[test]
    fn test_mime_type_for_extension() {
        assert_eq!(mime_type_for(Path::new("a/b/list.CSV")), CSV_MIME_TYPE);
        assert_eq!(mime_type_for(Path::new("list.xlsx")), "application/octet-stream");
        assert_eq!(mime_type_for(Path::new("list")), "application/octet-stream");
    }

    #[test]
    fn test_read_csv_file_rejects_wrong_extension_without_reading() {
        let err = read_csv_file(Path::new("/definitely/missing/list.txt")).unwrap_err();
        assert!(matches!(err, IntakeError::NotCsv { .. }));
    }

    #[test]
    fn test_read_csv_file_missing() {
        let err = read_csv_file(Path::new("/definitely/missing/list.csv")).unwrap_err();
        assert!(matches!(err, IntakeError::Io { .. }));
    }

    #[test]
    fn test_read_csv_file_round_trip() {
        let dir = std::env::temp_dir().join(format!("multisender-intake-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("recipients.csv");
        fs::write(&path, CSV_FORMAT_EXAMPLE.join("\n")).unwrap();

        let text = read_csv_file(&path).unwrap();
        let result = validate_csv(&text);
        assert_eq!(result.valid.len(), 4);
        assert_eq!(result.invalid.len(), 1);
        assert_eq!(result.invalid[0].address, "pavlik.eth");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_format_help_lists_example_rows() {
        let help = format_help();
        let lines: Vec<&str> = help.lines().collect();
        assert_eq!(lines.len(), CSV_FORMAT_EXAMPLE.len() + 1);
        assert!(lines[0].contains("address and amount"));
        assert_eq!(lines[2], "pavlik.eth, 12");
    }
}
