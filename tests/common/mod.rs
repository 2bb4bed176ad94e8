#![allow(dead_code)]

use rust_xlsxwriter::{ExcelDateTime, Format, Workbook as XlsxWorkbook};
use std::path::{Path, PathBuf};

pub enum Cell {
    Text(&'static str),
    Owned(String),
    Number(f64),
    /// Excel date serial shown as yyyy-mm-dd.
    Date(u16, u8, u8),
    Empty,
}

pub use Cell::{Date, Empty, Number, Text};

pub type SheetRows = Vec<Vec<Cell>>;

/// Write an .xlsx file with the given sheets into `dir`.
pub fn write_workbook(dir: &Path, file_name: &str, sheets: Vec<(&str, SheetRows)>) -> PathBuf {
    let mut workbook = XlsxWorkbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(name).unwrap();
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                match cell {
                    Cell::Text(s) => {
                        worksheet.write_string(r as u32, c as u16, *s).unwrap();
                    }
                    Cell::Owned(s) => {
                        worksheet.write_string(r as u32, c as u16, s).unwrap();
                    }
                    Cell::Number(n) => {
                        worksheet.write_number(r as u32, c as u16, *n).unwrap();
                    }
                    Cell::Date(y, m, d) => {
                        let date = ExcelDateTime::from_ymd(*y, *m, *d).unwrap();
                        worksheet
                            .write_datetime_with_format(r as u32, c as u16, &date, &date_format)
                            .unwrap();
                    }
                    Cell::Empty => {}
                }
            }
        }
    }
    let path = dir.join(file_name);
    workbook.save(&path).unwrap();
    path
}

/// Purchase sheet with an extra "Remarks" column that is not allow-listed
/// and a "Date of Purchase" column holding real Excel dates.
pub fn purchase_rows() -> SheetRows {
    vec![
        vec![
            Text("Month"),
            Text("Branch"),
            Text("Vendor Name"),
            Text("Model No."),
            Text("Bill No."),
            Text("Remarks"),
            Text("Date of Purchase"),
        ],
        vec![
            Text("April"),
            Text("A"),
            Text("Acme Traders"),
            Text("HP 250 G8"),
            Number(101.0),
            Text("urgent"),
            Date(2024, 4, 1),
        ],
        vec![
            Text("April"),
            Text("A"),
            Text("Zenith"),
            Text("HP 240 G9"),
            Number(102.0),
            Empty,
            Date(2024, 4, 15),
        ],
        vec![
            Text("May"),
            Text("B"),
            Text("Acme Traders"),
            Text("HP 250 G8"),
            Number(103.0),
            Text("check"),
            Date(2024, 5, 2),
        ],
    ]
}

pub fn return_rows() -> SheetRows {
    vec![
        vec![
            Text("Month"),
            Text("Branch"),
            Text("Party Name"),
            Text("Return Value"),
        ],
        vec![Text("June"), Text("A"), Text("Star Infotech"), Number(45000.5)],
        vec![Text("June"), Text("B"), Text("Star Infotech"), Number(39000.0)],
        vec![Text("July"), Text("B"), Text("Delta PCs"), Number(41000.0)],
    ]
}

/// Workbook with "Purchase", "Return" and an unconfigured "Notes" sheet.
pub fn sample_workbook(dir: &Path) -> PathBuf {
    write_workbook(
        dir,
        "ggc.xlsx",
        vec![
            ("Purchase", purchase_rows()),
            ("Notes", vec![vec![Text("Anything")], vec![Text("at all")]]),
            ("Return", return_rows()),
        ],
    )
}
