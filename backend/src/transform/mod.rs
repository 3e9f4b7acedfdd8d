//! Conversion module.
//!
//! - Columns: header resolution onto the canonical fields
//! - Filter: status filter and quantity coercion
//! - Aggregate: article rollup and multi-article shipments
//! - Pipeline: decode → convert → export

pub mod aggregate;
pub mod columns;
pub mod filter;
pub mod pipeline;

pub use aggregate::{build_main_list, build_note, multi_article_shipments, summarize_articles};
pub use columns::{normalize_header, resolve_columns, ColumnAliases, ColumnMap, ResolvedColumn};
pub use filter::{parse_quantity, select_ready_rows, DEFAULT_STATUS};
pub use pipeline::*;
