//! Error types for the Main List conversion pipeline.
//!
//! - [`ParseError`] - the upload could not be decoded as CSV or spreadsheet
//! - [`MissingColumns`] - required canonical fields were not found in the header
//! - [`ExportError`] - the output workbook could not be written
//! - [`ConvertError`] - top-level error of a single conversion
//! - [`ServerError`] - HTTP server errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

use crate::models::CanonicalField;

// =============================================================================
// Input Decoding Errors
// =============================================================================

/// Errors while decoding the uploaded table.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid CSV content.
    #[error("Invalid CSV format: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet could not be opened or read.
    #[error("Invalid spreadsheet: {0}")]
    Spreadsheet(String),

    /// Nothing to read.
    #[error("Input file is empty")]
    Empty,

    /// CSV delimiter must be a single-byte character.
    #[error("Unsupported CSV delimiter: {0:?}")]
    InvalidDelimiter(char),

    /// No header row found.
    #[error("No header row found")]
    NoHeaders,
}

impl From<calamine::Error> for ParseError {
    fn from(err: calamine::Error) -> Self {
        ParseError::Spreadsheet(err.to_string())
    }
}

// =============================================================================
// Header Resolution Errors
// =============================================================================

/// One or more canonical fields could not be matched to an input column.
///
/// Fields are always listed in [`CanonicalField::ALL`] order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Missing columns: {}", labels(.fields))]
pub struct MissingColumns {
    pub fields: Vec<CanonicalField>,
}

impl MissingColumns {
    /// Target-locale names of the missing fields.
    pub fn labels(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.label()).collect()
    }
}

fn labels(fields: &[CanonicalField]) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while writing the output workbook.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

// =============================================================================
// Conversion Errors (top-level)
// =============================================================================

/// Top-level conversion error.
///
/// A conversion either produces one complete workbook or fails with one of
/// these; there is no partial output.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The input could not be decoded in any supported format or encoding.
    #[error("Unreadable input: {0}")]
    UnreadableInput(#[from] ParseError),

    /// Required columns are missing.
    #[error(transparent)]
    MissingColumns(#[from] MissingColumns),

    /// The output workbook could not be produced.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

impl ConvertError {
    /// Message shown to the person who uploaded the file.
    pub fn user_message(&self) -> String {
        match self {
            ConvertError::UnreadableInput(_) => {
                "Не удалось прочитать файл. Загрузите CSV (разделитель «;») или Excel.".to_string()
            }
            ConvertError::MissingColumns(missing) => {
                format!("В файле не хватает колонок: {}", missing.labels().join(", "))
            }
            ConvertError::Export(_) => "Не удалось сформировать Excel-файл.".to_string(),
        }
    }

    /// Whether the failure is caused by the uploaded file rather than the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ConvertError::Export(_))
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Conversion error.
    #[error("Conversion error: {0}")]
    Convert(#[from] ConvertError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Failed to bind or serve.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for input decoding.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for workbook export.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for conversions.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
