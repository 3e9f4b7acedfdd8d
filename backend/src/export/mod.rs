//! Print-ready xlsx output of the Main List.
//!
//! Layout: bold centered header, bordered grid, quantity column centered,
//! shipment lines bold, one page wide in portrait with narrow margins.

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};

use crate::error::ExportResult;
use crate::models::{MainList, OutputRow, RowKind};

/// Default worksheet name.
pub const SHEET_NAME: &str = "Основной список";

/// Download name of the workbook.
pub const FILE_NAME: &str = "Основной_список.xlsx";

/// Column widths in characters: article, quantity, code.
const COLUMN_WIDTHS: [f64; 3] = [30.0, 18.0, 15.0];

struct Styles {
    header: Format,
    left: Format,
    center: Format,
    bold_left: Format,
}

impl Styles {
    fn new() -> Self {
        let base = Format::new()
            .set_border(FormatBorder::Thin)
            .set_align(FormatAlign::VerticalCenter);

        Self {
            header: base.clone().set_bold().set_align(FormatAlign::Center),
            left: base.clone().set_align(FormatAlign::Left),
            center: base.clone().set_align(FormatAlign::Center),
            bold_left: base.set_bold().set_align(FormatAlign::Left),
        }
    }

    fn for_cell(&self, kind: RowKind, col: usize) -> &Format {
        match (kind, col) {
            (RowKind::Header, _) => &self.header,
            (RowKind::Shipment, 0) => &self.bold_left,
            (_, 1) => &self.center,
            _ => &self.left,
        }
    }
}

/// Render the Main List as an xlsx workbook.
pub fn write_main_list(list: &MainList, sheet_name: &str) -> ExportResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    worksheet.set_name(sheet_name)?;
    setup_page(worksheet)?;

    let styles = Styles::new();
    write_row(worksheet, 0, &MainList::header(), &styles)?;
    for (i, row) in list.rows().iter().enumerate() {
        write_row(worksheet, i as u32 + 1, row, &styles)?;
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_row(ws: &mut Worksheet, row: u32, out: &OutputRow, styles: &Styles) -> ExportResult<()> {
    for (col, value) in out.cells.iter().enumerate() {
        let format = styles.for_cell(out.kind, col);
        if value.is_empty() {
            ws.write_blank(row, col as u16, format)?;
        } else {
            ws.write_string_with_format(row, col as u16, value, format)?;
        }
    }
    Ok(())
}

fn setup_page(ws: &mut Worksheet) -> ExportResult<()> {
    for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
        ws.set_column_width(col as u16, *width)?;
    }

    ws.set_portrait();
    // One page wide, as many pages tall as needed
    ws.set_print_fit_to_pages(1, 0);
    ws.set_margins(0.5, 0.5, 0.75, 0.75, 0.3, 0.3);
    Ok(())
}
