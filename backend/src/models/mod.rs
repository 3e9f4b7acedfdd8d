//! Domain models for the Main List conversion pipeline.
//!
//! - [`Cell`] / [`Table`] - decoded input table (ordered columns + rows of cells)
//! - [`CanonicalField`] - the four logical columns the conversion works on
//! - [`ReadyRow`] - an input row after column resolution, status filter and quantity coercion
//! - [`ArticleSummary`] / [`ShipmentLine`] - the two aggregated sections
//! - [`MainList`] / [`OutputRow`] - the final three-column table

use serde::{Deserialize, Serialize};

// =============================================================================
// Input Table
// =============================================================================

/// A single raw input value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    /// Text rendering used for grouping keys and status comparison.
    ///
    /// Text is returned verbatim: `" X1"` and `"X1"` are different keys.
    ///
    /// Integral numbers are rendered without a fractional part, so a product
    /// code stored as a number in a spreadsheet reads the same as in a CSV.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            Cell::Number(n) => n.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }
}

/// Decoded input: ordered column names and rows of cells.
///
/// Rows may be shorter than the header; missing trailing cells read as [`Cell::Empty`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

static EMPTY_CELL: Cell = Cell::Empty;

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    /// Position of a column by its exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at `row`, `column`, or [`Cell::Empty`] when out of range.
    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as JSON objects keyed by column name.
    pub fn to_records(&self) -> Vec<serde_json::Value> {
        (0..self.rows.len())
            .map(|r| {
                let obj = self
                    .columns
                    .iter()
                    .enumerate()
                    .map(|(c, name)| (name.clone(), serde_json::json!(self.cell(r, c).as_text())))
                    .collect();
                serde_json::Value::Object(obj)
            })
            .collect()
    }
}

// =============================================================================
// Canonical Fields
// =============================================================================

/// Logical column the conversion operates on, whatever its name in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CanonicalField {
    Status,
    Article,
    Quantity,
    ShipmentNumber,
}

impl CanonicalField {
    /// All fields, in reporting order.
    pub const ALL: [CanonicalField; 4] = [
        CanonicalField::Status,
        CanonicalField::Article,
        CanonicalField::Quantity,
        CanonicalField::ShipmentNumber,
    ];

    /// Name of the field as it appears in the marketplace export.
    pub fn label(&self) -> &'static str {
        match self {
            CanonicalField::Status => "Статус",
            CanonicalField::Article => "Артикул",
            CanonicalField::Quantity => "Количество",
            CanonicalField::ShipmentNumber => "Номер отправления",
        }
    }
}

impl std::fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Ready Rows
// =============================================================================

/// An order line that passed the status filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyRow {
    pub article: String,
    pub quantity: u64,
    pub shipment: String,
}

impl ReadyRow {
    pub fn new(article: impl Into<String>, quantity: u64, shipment: impl Into<String>) -> Self {
        Self {
            article: article.into(),
            quantity,
            shipment: shipment.into(),
        }
    }
}

// =============================================================================
// Aggregated Output
// =============================================================================

/// Header cells of the output table.
pub const HEADER: [&str; 3] = ["Артикул", "Количество", "КОД"];

/// Per-article rollup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub article: String,
    pub total: u64,
    /// e.g. `"2в одну, 3в одну"`, empty when every line had quantity ≤ 1
    pub note: String,
}

impl ArticleSummary {
    /// Quantity cell: `"9(2в одну, 3в одну)"` or just `"9"`.
    pub fn display_quantity(&self) -> String {
        if self.note.is_empty() {
            self.total.to_string()
        } else {
            format!("{}({})", self.total, self.note)
        }
    }
}

/// A shipment holding more than one distinct article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentLine {
    pub shipment: String,
    /// (article, summed quantity), sorted by article
    pub items: Vec<(String, u64)>,
}

impl ShipmentLine {
    /// `"A — 3; B — 3"`
    pub fn render(&self) -> String {
        self.items
            .iter()
            .map(|(article, qty)| format!("{} — {}", article, qty))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Kind of an output row; the formatter styles rows by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Header,
    Article,
    Spacer,
    Shipment,
}

/// One row of the output table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRow {
    pub kind: RowKind,
    pub cells: [String; 3],
}

impl OutputRow {
    fn new(kind: RowKind, first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            kind,
            cells: [first.into(), second.into(), String::new()],
        }
    }
}

/// Number of blank rows between the article and shipment sections.
pub const SPACER_ROWS: usize = 2;

/// The "Main List": article rollup, spacer, multi-article shipments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainList {
    pub articles: Vec<ArticleSummary>,
    pub shipments: Vec<ShipmentLine>,
}

impl MainList {
    /// Body rows (without header): articles, two blank rows, shipment lines.
    pub fn rows(&self) -> Vec<OutputRow> {
        let mut rows = Vec::with_capacity(self.articles.len() + SPACER_ROWS + self.shipments.len());

        for summary in &self.articles {
            rows.push(OutputRow::new(RowKind::Article, summary.article.clone(), summary.display_quantity()));
        }
        for _ in 0..SPACER_ROWS {
            rows.push(OutputRow::new(RowKind::Spacer, "", ""));
        }
        for line in &self.shipments {
            rows.push(OutputRow::new(RowKind::Shipment, line.render(), ""));
        }

        rows
    }

    /// Header row.
    pub fn header() -> OutputRow {
        OutputRow {
            kind: RowKind::Header,
            cells: HEADER.map(String::from),
        }
    }
}

/// Shape of a shipment line in a finished sheet: first cell non-blank text
/// containing an em-dash or semicolon, other cells empty.
pub fn is_shipment_line_shape(cells: &[String; 3]) -> bool {
    let first = cells[0].trim();
    !first.is_empty()
        && cells[1].is_empty()
        && cells[2].is_empty()
        && (first.contains('—') || first.contains(';'))
}
