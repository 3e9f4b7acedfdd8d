//! Input decoding: CSV (UTF-8 or Windows-1251) and spreadsheets into a [`Table`].
//!
//! No order-specific logic here; column meaning is resolved later.

use calamine::{Data, Reader};
use csv::{ReaderBuilder, Trim};
use serde::Serialize;
use std::io::Cursor;
use std::path::Path;

use crate::error::ParseError;
use crate::models::{Cell, Table};

/// Default CSV delimiter of marketplace exports.
pub const DEFAULT_DELIMITER: char = ';';

/// Container format of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Csv,
    Spreadsheet,
}

/// Decoded input with metadata
#[derive(Debug, Clone)]
pub struct ParsedInput {
    pub table: Table,
    pub format: InputFormat,
    /// Text encoding for CSV input, `None` for spreadsheets
    pub encoding: Option<&'static str>,
}

/// Pick the decoder from the file name, falling back to magic bytes.
pub fn detect_format(file_name: Option<&str>, bytes: &[u8]) -> InputFormat {
    let ext = file_name
        .and_then(|n| Path::new(n).extension())
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("csv") | Some("txt") => InputFormat::Csv,
        Some("xlsx") | Some("xlsm") | Some("xlsb") | Some("xls") | Some("ods") => {
            InputFormat::Spreadsheet
        }
        _ => sniff_format(bytes),
    }
}

fn sniff_format(bytes: &[u8]) -> InputFormat {
    // ZIP container (xlsx/ods) or OLE compound file (xls)
    if bytes.starts_with(b"PK\x03\x04") || bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0]) {
        InputFormat::Spreadsheet
    } else {
        InputFormat::Csv
    }
}

/// Decode CSV bytes: strict UTF-8 first, Windows-1251 otherwise.
///
/// Returns the text and the encoding that was used.
pub fn decode_content(bytes: &[u8]) -> (String, &'static str) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.trim_start_matches('\u{feff}').to_string(), "utf-8"),
        Err(_) => {
            let (text, _) = encoding_rs::WINDOWS_1251.decode_without_bom_handling(bytes);
            (text.into_owned(), "windows-1251")
        }
    }
}

/// Parse decoded CSV text with an explicit delimiter.
///
/// Header names are trimmed, data cells are kept verbatim. Fully blank rows
/// are skipped, record lengths may vary.
pub fn parse_csv_str(content: &str, delimiter: char) -> Result<Table, ParseError> {
    if content.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    if !delimiter.is_ascii() {
        return Err(ParseError::InvalidDelimiter(delimiter));
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(content.as_bytes());

    let columns: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    if columns.iter().all(|c| c.is_empty()) {
        return Err(ParseError::NoHeaders);
    }

    let mut table = Table::new(columns);
    for record in reader.records() {
        let record = record?;
        let row: Vec<Cell> = record.iter().map(Cell::from).collect();
        if row.iter().all(Cell::is_empty) {
            continue;
        }
        table.push_row(row);
    }

    Ok(table)
}

/// Parse the first worksheet of an xlsx/xls/ods workbook.
pub fn parse_spreadsheet(bytes: &[u8]) -> Result<Table, ParseError> {
    if bytes.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ParseError::Spreadsheet("workbook has no sheets".to_string()))??;

    let mut rows = range.rows();
    let header_row = rows.next().ok_or(ParseError::NoHeaders)?;
    let columns: Vec<String> = header_row
        .iter()
        .map(|c| data_to_cell(c).as_text().trim().to_string())
        .collect();
    if columns.iter().all(|c| c.is_empty()) {
        return Err(ParseError::NoHeaders);
    }

    let mut table = Table::new(columns);
    for data_row in rows {
        let row: Vec<Cell> = data_row.iter().map(data_to_cell).collect();
        if row.iter().all(Cell::is_empty) {
            continue;
        }
        table.push_row(row);
    }

    Ok(table)
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::from(s.as_str()),
        Data::Empty | Data::Error(_) => Cell::Empty,
        other => Cell::from(other.to_string().as_str()),
    }
}

/// Decode an upload of either format.
pub fn parse_bytes(
    bytes: &[u8],
    file_name: Option<&str>,
    delimiter: char,
) -> Result<ParsedInput, ParseError> {
    if bytes.is_empty() {
        return Err(ParseError::Empty);
    }

    match detect_format(file_name, bytes) {
        InputFormat::Csv => {
            let (content, encoding) = decode_content(bytes);
            let table = parse_csv_str(&content, delimiter)?;
            Ok(ParsedInput {
                table,
                format: InputFormat::Csv,
                encoding: Some(encoding),
            })
        }
        InputFormat::Spreadsheet => Ok(ParsedInput {
            table: parse_spreadsheet(bytes)?,
            format: InputFormat::Spreadsheet,
            encoding: None,
        }),
    }
}

/// Read and decode a file from disk.
pub fn parse_file<P: AsRef<Path>>(path: P, delimiter: char) -> Result<ParsedInput, ParseError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let file_name = path.file_name().and_then(|n| n.to_str());
    parse_bytes(&bytes, file_name, delimiter)
}
