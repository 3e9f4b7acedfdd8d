//! Header resolution: map variant column names onto the canonical fields.
//!
//! Marketplace exports rename their columns between versions and locales
//! ("Кол-во", "Количество товара", "Qty"...). Names are compared after
//! [`normalize_header`]; an exact normalized match wins, a substring match
//! is the fallback.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::MissingColumns;
use crate::models::CanonicalField;

static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\-_]+").unwrap());
static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9a-z\p{Cyrillic} ]").unwrap());
static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Normalize a header for comparison.
///
/// Trim, lower-case, `ё` → `е`, runs of whitespace/`-`/`_` → one space,
/// drop everything except digits, Latin, Cyrillic and space, collapse again.
pub fn normalize_header(name: &str) -> String {
    let lowered = name.trim().to_lowercase().replace('ё', "е");
    let spaced = SEPARATORS.replace_all(&lowered, " ");
    let stripped = DISALLOWED.replace_all(&spaced, "");
    SPACES.replace_all(&stripped, " ").trim().to_string()
}

/// Accepted header spellings per canonical field, highest priority first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnAliases {
    pub status: Vec<String>,
    pub article: Vec<String>,
    pub quantity: Vec<String>,
    pub shipment_number: Vec<String>,
}

impl Default for ColumnAliases {
    fn default() -> Self {
        fn list(names: &[&str]) -> Vec<String> {
            names.iter().map(|s| s.to_string()).collect()
        }

        Self {
            status: list(&["Статус", "Статус отправления", "Статус заказа", "Status"]),
            article: list(&[
                "Артикул",
                "Артикул товара",
                "Артикул продавца",
                "Offer ID",
                "Article",
                "SKU",
            ]),
            quantity: list(&["Количество", "Кол-во", "Количество товара", "Quantity", "Qty"]),
            shipment_number: list(&[
                "Номер отправления",
                "Номер отправки",
                "Отправление",
                "Posting number",
                "Shipment number",
            ]),
        }
    }
}

impl ColumnAliases {
    pub fn for_field(&self, field: CanonicalField) -> &[String] {
        match field {
            CanonicalField::Status => &self.status,
            CanonicalField::Article => &self.article,
            CanonicalField::Quantity => &self.quantity,
            CanonicalField::ShipmentNumber => &self.shipment_number,
        }
    }
}

/// A physical input column chosen for a canonical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedColumn {
    pub index: usize,
    pub name: String,
}

/// Result of header resolution: every canonical field has a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMap {
    columns: BTreeMap<CanonicalField, ResolvedColumn>,
}

impl ColumnMap {
    /// Position of the column backing `field` in the input table.
    pub fn index(&self, field: CanonicalField) -> usize {
        self.columns[&field].index
    }

    /// Original name of the column backing `field`.
    pub fn column(&self, field: CanonicalField) -> &str {
        &self.columns[&field].name
    }

    /// (field, column) pairs in reporting order.
    pub fn iter(&self) -> impl Iterator<Item = (CanonicalField, &ResolvedColumn)> {
        self.columns.iter().map(|(f, c)| (*f, c))
    }
}

/// Find the input column for one field, or `None`.
fn match_field(normalized: &[String], variants: &[String]) -> Option<usize> {
    let variants: Vec<String> = variants.iter().map(|v| normalize_header(v)).collect();

    // Exact: variant priority decides
    for variant in &variants {
        if let Some(idx) = normalized.iter().position(|col| col == variant) {
            return Some(idx);
        }
    }

    // Substring: column order decides
    normalized.iter().position(|col| {
        variants
            .iter()
            .any(|v| !v.is_empty() && col.contains(v.as_str()))
    })
}

/// Map every canonical field onto a column of `columns`.
///
/// Fails with the complete list of unresolved fields.
pub fn resolve_columns(
    columns: &[String],
    aliases: &ColumnAliases,
) -> Result<ColumnMap, MissingColumns> {
    let normalized: Vec<String> = columns.iter().map(|c| normalize_header(c)).collect();

    let mut resolved = BTreeMap::new();
    let mut missing = Vec::new();

    for field in CanonicalField::ALL {
        match match_field(&normalized, aliases.for_field(field)) {
            Some(index) => {
                resolved.insert(
                    field,
                    ResolvedColumn {
                        index,
                        name: columns[index].clone(),
                    },
                );
            }
            None => missing.push(field),
        }
    }

    if missing.is_empty() {
        Ok(ColumnMap { columns: resolved })
    } else {
        Err(MissingColumns { fields: missing })
    }
}
