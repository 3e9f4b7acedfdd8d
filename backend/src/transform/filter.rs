//! Status filter and quantity coercion.
//!
//! Bad quantities never abort a conversion: anything that is not a finite,
//! non-negative number counts as 0.

use crate::models::{CanonicalField, Cell, ReadyRow, Table};

use super::columns::ColumnMap;

/// Status of order lines that still have to be packed.
pub const DEFAULT_STATUS: &str = "Ожидает отгрузки";

/// Coerce a raw quantity to a whole count.
///
/// Numbers are truncated toward zero (`3.9` → 3); empty, non-numeric,
/// non-finite and negative values become 0.
pub fn parse_quantity(cell: &Cell) -> u64 {
    let value = match cell {
        Cell::Number(n) => *n,
        Cell::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Cell::Empty => 0.0,
    };

    if value.is_finite() && value > 0.0 {
        value.trunc() as u64
    } else {
        0
    }
}

/// Rows whose status equals `target_status` exactly.
pub fn select_ready_rows(table: &Table, columns: &ColumnMap, target_status: &str) -> Vec<ReadyRow> {
    let status = columns.index(CanonicalField::Status);
    let article = columns.index(CanonicalField::Article);
    let quantity = columns.index(CanonicalField::Quantity);
    let shipment = columns.index(CanonicalField::ShipmentNumber);

    (0..table.len())
        .filter(|&row| table.cell(row, status).as_text() == target_status)
        .map(|row| ReadyRow {
            article: table.cell(row, article).as_text(),
            quantity: parse_quantity(table.cell(row, quantity)),
            shipment: table.cell(row, shipment).as_text(),
        })
        .collect()
}
