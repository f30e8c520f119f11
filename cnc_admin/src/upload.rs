//! Files offered for the bulk settings upload.

use std::path::Path;

use crate::ValidationError;

pub const CSV_MIME: &str = "text/csv";

/// A file picked or dropped by the operator.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvFile {
    pub name: String,
    /// Reported MIME type, may be empty.
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl CsvFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk. The MIME type is inferred from the extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime = if name.ends_with(".csv") { CSV_MIME } else { "" };
        Ok(Self::new(name, mime, bytes))
    }

    /// Accepted when the MIME type is `text/csv` or the name ends in `.csv`.
    pub fn is_acceptable(&self) -> bool {
        self.mime == CSV_MIME || self.name.ends_with(".csv")
    }

    /// MIME type sent with the multipart part.
    pub fn upload_mime(&self) -> &str {
        if self.mime.is_empty() {
            CSV_MIME
        } else {
            &self.mime
        }
    }
}

/// File picker: the single chosen file must be acceptable.
pub fn pick(file: Option<CsvFile>) -> Result<CsvFile, ValidationError> {
    file.filter(CsvFile::is_acceptable).ok_or(ValidationError::NotCsv)
}

/// Drag and drop: the first acceptable file among those dropped wins.
pub fn first_acceptable(files: Vec<CsvFile>) -> Result<CsvFile, ValidationError> {
    files
        .into_iter()
        .find(CsvFile::is_acceptable)
        .ok_or(ValidationError::NotCsv)
}
