//! # Mainlist - marketplace order export to a print-ready "Main List"
//!
//! Mainlist turns an order export (CSV or spreadsheet) into an xlsx packing
//! list: one row per article with its total quantity, followed by the
//! shipments that bundle several articles.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌─────────────┐   ┌─────────────┐   ┌─────────────┐
//! │   Upload    │──▶│   Parser    │──▶│  Columns +  │──▶│  Aggregate  │──▶│   Export    │
//! │ (CSV/XLSX)  │   │ (UTF-8/1251)│   │   Filter    │   │ (2 sections)│   │   (xlsx)    │
//! └─────────────┘   └─────────────┘   └─────────────┘   └─────────────┘   └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mainlist::{convert_file, ConvertOptions};
//!
//! let output = convert_file("orders.csv", &ConvertOptions::default()).unwrap();
//! println!("{} articles", output.analysis.conversion.main_list.articles.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types
//! - [`models`] - Table, canonical fields, Main List rows
//! - [`parser`] - CSV and spreadsheet decoding
//! - [`transform`] - Header resolution, filtering, aggregation, pipeline
//! - [`export`] - xlsx writer
//! - [`config`] - Server configuration
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Decoding
pub mod parser;

// Conversion
pub mod transform;

// Output
pub mod export;

// Configuration
pub mod config;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ConvertError, ExportError, MissingColumns, ParseError, ServerError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    ArticleSummary,
    CanonicalField,
    Cell,
    MainList,
    OutputRow,
    ReadyRow,
    RowKind,
    ShipmentLine,
    Table,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content,
    detect_format,
    parse_bytes,
    parse_csv_str,
    parse_file,
    parse_spreadsheet,
    InputFormat,
    ParsedInput,
};

// =============================================================================
// Re-exports - Conversion
// =============================================================================

pub use transform::{
    build_main_list,
    normalize_header,
    parse_quantity,
    resolve_columns,
    select_ready_rows,
    ColumnAliases,
    ColumnMap,
    DEFAULT_STATUS,
};

pub use transform::pipeline::{
    analyze_bytes,
    convert_bytes,
    convert_file,
    convert_table,
    Analysis,
    Conversion,
    ConvertOptions,
    ConvertOutput,
    InputInfo,
};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{write_main_list, FILE_NAME, SHEET_NAME};

// Server
pub mod server {
    pub use crate::api::server::start_server;
    pub use crate::config::ServerConfig;
}
