//! File extension allowlist
//!
//! A file is accepted when the text after its last `.` (lower-cased) is one of
//! [`ALLOWED_EXTENSIONS`]. No content sniffing is done here; the predictor
//! owns schema checks.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Extensions accepted for upload
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

/// Recognised tabular formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Xlsx,
    Xls,
}

impl FileFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Xlsx => "xlsx",
            FileFormat::Xls => "xls",
        }
    }

    /// Content type used for the multipart part when the client gave none
    pub fn mime_type(&self) -> &'static str {
        match self {
            FileFormat::Csv => "text/csv",
            FileFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            FileFormat::Xls => "application/vnd.ms-excel",
        }
    }

    fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "csv" => Some(FileFormat::Csv),
            "xlsx" => Some(FileFormat::Xlsx),
            "xls" => Some(FileFormat::Xls),
            _ => None,
        }
    }
}

/// Reason a file name was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No `.` in the name, or nothing after the last one
    #[error("unsupported format")]
    MissingExtension,

    #[error("unsupported format: .{0}")]
    UnsupportedExtension(String),
}

/// Check a file name against the allowlist.
///
/// # Examples
///
/// ```
/// use roi_common::validator::{validate, FileFormat, ValidationError};
///
/// assert_eq!(validate("Q3_campaigns.CSV"), Ok(FileFormat::Csv));
/// assert_eq!(validate("archive.tar.xlsx"), Ok(FileFormat::Xlsx));
/// assert_eq!(
///     validate("report.pdf"),
///     Err(ValidationError::UnsupportedExtension("pdf".to_string()))
/// );
/// assert_eq!(validate("README"), Err(ValidationError::MissingExtension));
/// ```
pub fn validate(file_name: &str) -> Result<FileFormat, ValidationError> {
    let extension = match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext.to_ascii_lowercase(),
        _ => return Err(ValidationError::MissingExtension),
    };

    FileFormat::from_extension(&extension).ok_or(ValidationError::UnsupportedExtension(extension))
}
