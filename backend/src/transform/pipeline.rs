//! High-level conversion API: upload bytes → Main List workbook.
//!
//! Steps: decode → resolve headers → filter rows → aggregate → export.
//! Each call is independent; nothing is kept between conversions.
//!
//! # Example
//!
//! ```rust,ignore
//! use mainlist::{convert_file, ConvertOptions};
//!
//! let output = convert_file("orders.csv", &ConvertOptions::default())?;
//! std::fs::write("main_list.xlsx", &output.xlsx)?;
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::aggregate::build_main_list;
use super::columns::{resolve_columns, ColumnAliases, ColumnMap};
use super::filter::{select_ready_rows, DEFAULT_STATUS};
use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::error::{ConvertError, ConvertResult};
use crate::export::{write_main_list, SHEET_NAME};
use crate::models::{MainList, Table};
use crate::parser::{parse_bytes, InputFormat, DEFAULT_DELIMITER};

/// Options for a conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertOptions {
    /// Only rows with exactly this status are packed
    pub target_status: String,

    /// CSV delimiter
    pub delimiter: char,

    /// Output worksheet name
    pub sheet_name: String,

    /// Accepted header spellings
    pub aliases: ColumnAliases,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            target_status: DEFAULT_STATUS.to_string(),
            delimiter: DEFAULT_DELIMITER,
            sheet_name: SHEET_NAME.to_string(),
            aliases: ColumnAliases::default(),
        }
    }
}

/// Result of the in-memory part of a conversion
#[derive(Debug, Clone, Serialize)]
pub struct Conversion {
    pub main_list: MainList,
    pub columns: ColumnMap,
    /// Data rows in the input
    pub input_rows: usize,
    /// Rows that passed the status filter
    pub ready_rows: usize,
}

/// Decoded input information
#[derive(Debug, Clone, Serialize)]
pub struct InputInfo {
    pub format: InputFormat,
    pub encoding: Option<String>,
    pub columns: Vec<String>,
    pub row_count: usize,
}

/// Decoded input plus its conversion, before export
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub input: InputInfo,
    pub conversion: Conversion,
}

/// A finished conversion: workbook bytes plus what went into them
#[derive(Debug, Clone)]
pub struct ConvertOutput {
    pub xlsx: Vec<u8>,
    pub analysis: Analysis,
}

/// Convert an already decoded table.
///
/// Pure: same table and options always give the same result.
pub fn convert_table(table: &Table, options: &ConvertOptions) -> ConvertResult<Conversion> {
    let columns = resolve_columns(&table.columns, &options.aliases)?;
    log_success("All required columns found:");
    for (field, column) in columns.iter() {
        log_info_indent(format!("{} ← \"{}\"", field, column.name), 1);
    }

    let ready = select_ready_rows(table, &columns, &options.target_status);
    log_success(format!(
        "{} of {} rows have status \"{}\"",
        ready.len(),
        table.len(),
        options.target_status
    ));
    if ready.is_empty() {
        log_warning("No rows to pack, the list will be empty");
    }

    let main_list = build_main_list(&ready);
    log_success(format!(
        "{} articles, {} shipments with several articles",
        main_list.articles.len(),
        main_list.shipments.len()
    ));

    Ok(Conversion {
        main_list,
        columns,
        input_rows: table.len(),
        ready_rows: ready.len(),
    })
}

/// Decode and convert an upload without producing the workbook.
pub fn analyze_bytes(
    bytes: &[u8],
    file_name: Option<&str>,
    options: &ConvertOptions,
) -> ConvertResult<Analysis> {
    log_info("📖 Reading input...");
    let parsed = parse_bytes(bytes, file_name, options.delimiter)?;

    match parsed.encoding {
        Some(encoding) => log_success(format!("CSV, encoding {}", encoding)),
        None => log_success("Spreadsheet"),
    }
    log_success(format!(
        "Read {} rows, {} columns",
        parsed.table.len(),
        parsed.table.columns.len()
    ));

    let input = InputInfo {
        format: parsed.format,
        encoding: parsed.encoding.map(String::from),
        columns: parsed.table.columns.clone(),
        row_count: parsed.table.len(),
    };

    log_info("🔄 Building the main list...");
    let conversion = convert_table(&parsed.table, options)?;

    Ok(Analysis { input, conversion })
}

/// Full conversion of an upload into xlsx bytes.
pub fn convert_bytes(
    bytes: &[u8],
    file_name: Option<&str>,
    options: &ConvertOptions,
) -> ConvertResult<ConvertOutput> {
    let analysis = analyze_bytes(bytes, file_name, options)?;

    log_info("📝 Writing workbook...");
    let xlsx = write_main_list(&analysis.conversion.main_list, &options.sheet_name)?;
    log_success(format!("Workbook ready ({} bytes)", xlsx.len()));

    Ok(ConvertOutput { xlsx, analysis })
}

/// Read a file from disk and convert it.
pub fn convert_file<P: AsRef<Path>>(path: P, options: &ConvertOptions) -> ConvertResult<ConvertOutput> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| ConvertError::UnreadableInput(e.into()))?;
    let file_name = path.file_name().and_then(|n| n.to_str());
    convert_bytes(&bytes, file_name, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::models::{CanonicalField, RowKind};

    const ORDERS: &str = "\
Номер заказа;Номер отправления;Статус;Артикул;Количество;Цена
1;S1;Ожидает отгрузки;X1;2;100
1;S1;Ожидает отгрузки;X1;3;100
2;S2;Доставлен;X2;5;50
";

    #[test]
    fn test_default_options() {
        let opts = ConvertOptions::default();
        assert_eq!(opts.target_status, "Ожидает отгрузки");
        assert_eq!(opts.delimiter, ';');
        assert_eq!(opts.sheet_name, "Основной список");
    }

    #[test]
    fn test_end_to_end_scenario() {
        let analysis = analyze_bytes(ORDERS.as_bytes(), Some("orders.csv"), &ConvertOptions::default()).unwrap();
        let conversion = &analysis.conversion;

        assert_eq!(analysis.input.row_count, 3);
        assert_eq!(conversion.ready_rows, 2);

        let rows = conversion.main_list.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].cells, ["X1".to_string(), "5(2в одну, 3в одну)".into(), "".into()]);
        assert!(rows[1..].iter().all(|r| r.kind == RowKind::Spacer));
    }

    #[test]
    fn test_multi_article_shipment_listed() {
        let csv = "\
Статус;Артикул;Кол-во;Номер отправления
Ожидает отгрузки;B;3;S1
Ожидает отгрузки;A;2;S1
Ожидает отгрузки;A;1;S1
Ожидает отгрузки;A;1;S2
";
        let output = convert_bytes(csv.as_bytes(), None, &ConvertOptions::default()).unwrap();
        let list = &output.analysis.conversion.main_list;

        assert_eq!(list.articles[0].display_quantity(), "4(2в одну)");
        assert_eq!(list.articles[1].display_quantity(), "3(3в одну)");
        assert_eq!(list.shipments.len(), 1);
        assert_eq!(list.shipments[0].render(), "A — 3; B — 3");
        assert!(output.xlsx.starts_with(b"PK"));
    }

    #[test]
    fn test_missing_columns_reported() {
        let csv = "Артикул;Цена\nX1;10\n";
        let err = convert_bytes(csv.as_bytes(), None, &ConvertOptions::default()).unwrap_err();

        match err {
            ConvertError::MissingColumns(missing) => assert_eq!(
                missing.fields,
                vec![
                    CanonicalField::Status,
                    CanonicalField::Quantity,
                    CanonicalField::ShipmentNumber
                ]
            ),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_unreadable_input() {
        let err = convert_bytes(b"", Some("orders.csv"), &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, ConvertError::UnreadableInput(ParseError::Empty)));

        let err = convert_bytes(b"PK\x03\x04garbage", Some("orders.xlsx"), &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, ConvertError::UnreadableInput(_)));
    }

    #[test]
    fn test_huge_quantities_do_not_abort() {
        let csv = "\
Статус;Артикул;Количество;Номер отправления
Ожидает отгрузки;A;1e20;S1
Ожидает отгрузки;A;1e20;S2
";
        let output = convert_bytes(csv.as_bytes(), None, &ConvertOptions::default()).unwrap();
        let list = &output.analysis.conversion.main_list;

        assert_eq!(list.articles.len(), 1);
        assert_eq!(list.articles[0].total, u64::MAX);
        assert!(output.xlsx.starts_with(b"PK"));
    }

    #[test]
    fn test_padded_values_not_normalized() {
        let csv = "\
Статус;Артикул;Количество;Номер отправления
Ожидает отгрузки ;A;1;S1
 Ожидает отгрузки;A;1;S2
Ожидает отгрузки;X1;1;S3
Ожидает отгрузки; X1;2;S4
";
        let conversion = analyze_bytes(csv.as_bytes(), None, &ConvertOptions::default())
            .unwrap()
            .conversion;

        assert_eq!(conversion.ready_rows, 2);
        let articles: Vec<&str> = conversion
            .main_list
            .articles
            .iter()
            .map(|a| a.article.as_str())
            .collect();
        assert_eq!(articles, vec![" X1", "X1"]);
    }

    #[test]
    fn test_custom_status_and_delimiter() {
        let options = ConvertOptions {
            target_status: "new".to_string(),
            delimiter: ',',
            ..ConvertOptions::default()
        };
        let csv = "Status,Article,Qty,Posting number\nnew,A,1,P1\nold,B,1,P1\n";
        let conversion = analyze_bytes(csv.as_bytes(), None, &options).unwrap().conversion;

        assert_eq!(conversion.ready_rows, 1);
        assert_eq!(conversion.columns.column(CanonicalField::ShipmentNumber), "Posting number");
    }

    #[test]
    fn test_convert_table_is_repeatable() {
        let table = crate::parser::parse_csv_str(ORDERS, ';').unwrap();
        let options = ConvertOptions::default();

        let first = convert_table(&table, &options).unwrap();
        let second = convert_table(&table, &options).unwrap();
        assert_eq!(first.main_list, second.main_list);
    }

    #[test]
    fn test_convert_file_missing() {
        let err = convert_file("no-such-file.csv", &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, ConvertError::UnreadableInput(ParseError::Io(_))));
    }
}
