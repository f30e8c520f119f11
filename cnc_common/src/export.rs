//! Client-side CSV export of loaded settings and users.
//!
//! Format rules:
//! - Header row of literal column names, never quoted
//! - String fields wrapped in double quotes, embedded quotes doubled
//! - Numeric fields written bare
//! - A missing warning is an empty, unquoted field
//! - Rows separated by `\n`, content is UTF-8

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::{sort_newest_first, Setting, User};

pub const SETTINGS_CSV_HEADER: [&str; 10] = [
    "Bit Id",
    "Bit Name",
    "Material Id",
    "Material",
    "RPM",
    "Feed",
    "DOC",
    "Stepover",
    "Plunge",
    "Warning",
];

pub const USERS_CSV_HEADER: [&str; 6] = ["S/N", "ID", "Name", "Email", "Role", "Created"];

/// Error type for CSV export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Refused rather than producing a header-only file.
    #[error("No {0} available to download")]
    NothingToExport(&'static str),
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV buffer error: {0}")]
    Buffer(String),
}

/// A generated file, ready to be saved where the operator asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvDownload {
    pub file_name: String,
    pub contents: String,
}

impl CsvDownload {
    pub const CONTENT_TYPE: &'static str = "text/csv;charset=utf-8;";

    /// Save into `dir` under `file_name`. Path separators in the name are replaced.
    pub fn write_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join(self.file_name.replace(['/', '\\'], "-"));
        std::fs::write(&path, self.contents.as_bytes())?;
        Ok(path)
    }
}

fn quoted(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn csv_writer() -> csv::Writer<Vec<u8>> {
    // Quoting is decided per field above, so the writer must emit fields verbatim.
    WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Buffer(e.to_string()))
}

/// Render settings in the order given. Refuses an empty list.
pub fn settings_csv(settings: &[Setting]) -> Result<String, ExportError> {
    if settings.is_empty() {
        return Err(ExportError::NothingToExport("settings"));
    }

    let mut writer = csv_writer();
    writer.write_record(SETTINGS_CSV_HEADER)?;
    for s in settings {
        writer.write_record([
            s.bit_id.to_string(),
            quoted(&s.bit_name),
            s.material_id.to_string(),
            quoted(&s.material_name),
            s.rpm.to_string(),
            s.feed.to_string(),
            s.doc.to_string(),
            s.stepover.to_string(),
            s.plunge.to_string(),
            s.warning.as_deref().map(quoted).unwrap_or_default(),
        ])?;
    }
    finish(writer)
}

/// `settings_<spindle>_<YYYY-MM-DD>.csv`; a blank spindle name becomes `spindle`.
pub fn settings_export_file_name(spindle_name: Option<&str>, date: NaiveDate) -> String {
    let name = spindle_name.filter(|n| !n.is_empty()).unwrap_or("spindle");
    format!("settings_{}_{}.csv", name, date.format("%Y-%m-%d"))
}

pub fn settings_export(
    settings: &[Setting],
    spindle_name: Option<&str>,
    date: NaiveDate,
) -> Result<CsvDownload, ExportError> {
    Ok(CsvDownload {
        file_name: settings_export_file_name(spindle_name, date),
        contents: settings_csv(settings)?,
    })
}

/// Render users newest first with a 1-based serial number column.
pub fn users_csv(users: &[User]) -> Result<String, ExportError> {
    let mut rows = users.to_vec();
    sort_newest_first(&mut rows);

    let mut writer = csv_writer();
    writer.write_record(USERS_CSV_HEADER)?;
    for (idx, user) in rows.iter().enumerate() {
        writer.write_record([
            (idx + 1).to_string(),
            user.id.to_string(),
            quoted(&user.name),
            quoted(&user.email),
            user.role_label().to_string(),
            quoted(&format_created_at(&user.created_at)),
        ])?;
    }
    finish(writer)
}

pub fn users_export(users: &[User], date: NaiveDate) -> Result<CsvDownload, ExportError> {
    Ok(CsvDownload {
        file_name: format!("users_{}.csv", date.format("%Y-%m-%d")),
        contents: users_csv(users)?,
    })
}

/// Human-readable creation timestamp. Unparseable values pass through unchanged.
pub fn format_created_at(raw: &str) -> String {
    const DISPLAY: &str = "%Y-%m-%d %H:%M:%S";

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format(DISPLAY).to_string();
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, pattern) {
            return dt.format(DISPLAY).to_string();
        }
    }
    raw.to_string()
}
