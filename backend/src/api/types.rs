//! REST API types for `POST /api/preview`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ConvertError;
use crate::models::{OutputRow, RowKind};
use crate::transform::pipeline::Analysis;

/// Main List as JSON, for clients that render it themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    /// Unique job identifier
    pub job_id: String,

    /// "ready" or "empty" (no row had the target status)
    pub status: String,

    /// Header followed by body rows, exactly as written to the sheet
    pub rows: Vec<OutputRow>,

    pub metadata: PreviewMetadata,
}

/// Metadata about the conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewMetadata {
    pub input: InputMetadata,
    /// canonical field label → input column
    pub column_mapping: Vec<ColumnMapping>,
    pub ready_rows: usize,
    pub articles: usize,
    pub multi_article_shipments: usize,
}

/// Input file metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputMetadata {
    pub format: String,
    pub encoding: Option<String>,
    pub row_count: usize,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMapping {
    pub field: String,
    pub column: String,
}

impl From<Analysis> for PreviewResponse {
    fn from(analysis: Analysis) -> Self {
        let Analysis { input, conversion } = analysis;
        let list = &conversion.main_list;

        let mut rows = vec![crate::models::MainList::header()];
        rows.extend(list.rows());

        let status = if conversion.ready_rows == 0 { "empty" } else { "ready" };
        let format = match input.format {
            crate::parser::InputFormat::Csv => "csv",
            crate::parser::InputFormat::Spreadsheet => "spreadsheet",
        };

        PreviewResponse {
            job_id: Uuid::new_v4().to_string(),
            status: status.to_string(),
            metadata: PreviewMetadata {
                input: InputMetadata {
                    format: format.to_string(),
                    encoding: input.encoding,
                    row_count: input.row_count,
                    columns: input.columns,
                },
                column_mapping: conversion
                    .columns
                    .iter()
                    .map(|(field, column)| ColumnMapping {
                        field: field.label().to_string(),
                        column: column.name.clone(),
                    })
                    .collect(),
                ready_rows: conversion.ready_rows,
                articles: list.articles.len(),
                multi_article_shipments: list.shipments.len(),
            },
            rows,
        }
    }
}

impl PreviewResponse {
    /// Number of shipment lines among the rows.
    pub fn shipment_rows(&self) -> usize {
        self.rows.iter().filter(|r| r.kind == RowKind::Shipment).count()
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "rows": [],
    })
}

/// Error response for a failed conversion, with missing fields when known.
pub fn convert_error_response(err: &ConvertError) -> Value {
    let mut body = error_response(&err.user_message());
    if let ConvertError::MissingColumns(missing) = err {
        body["missingColumns"] = json!(missing.labels());
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::pipeline::{analyze_bytes, ConvertOptions};

    #[test]
    fn test_preview_from_analysis() {
        let csv = "Статус;Артикул;Количество;Номер отправления\n\
                   Ожидает отгрузки;A;2;S1\n\
                   Ожидает отгрузки;B;1;S1\n";
        let analysis = analyze_bytes(csv.as_bytes(), Some("o.csv"), &ConvertOptions::default()).unwrap();
        let preview = PreviewResponse::from(analysis);

        assert_eq!(preview.status, "ready");
        assert_eq!(preview.rows[0].kind, RowKind::Header);
        assert_eq!(preview.rows.len(), 1 + 2 + 2 + 1);
        assert_eq!(preview.shipment_rows(), 1);
        assert_eq!(preview.metadata.input.format, "csv");
        assert_eq!(preview.metadata.column_mapping.len(), 4);
        assert_eq!(preview.metadata.column_mapping[0].field, "Статус");

        let json = serde_json::to_value(&preview).unwrap();
        assert!(json.get("jobId").is_some());
        assert_eq!(json["metadata"]["multiArticleShipments"], 1);
        assert_eq!(json["rows"][1]["kind"], "article");
    }

    #[test]
    fn test_missing_columns_error_body() {
        let err = analyze_bytes(b"a;b\n1;2", None, &ConvertOptions::default()).unwrap_err();
        let body = convert_error_response(&err);

        assert_eq!(body["status"], "error");
        assert_eq!(body["missingColumns"].as_array().unwrap().len(), 4);
        assert!(body["error"].as_str().unwrap().contains("Номер отправления"));
    }
}
