//! Fixture helpers: real workbook files built with umya-spreadsheet.
//!
//! Cell text that parses as a number is stored as a numeric cell, everything
//! else as a string cell; empty text leaves the cell unset. A new workbook
//! always carries `Sheet1`, so fixtures naming other sheets keep it as an
//! extra, empty sheet.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// `(sheet name, rows)`.
pub type SheetFixture<'a> = (&'a str, &'a [&'a [&'a str]]);

pub fn build_book(sheets: &[SheetFixture<'_>]) -> umya_spreadsheet::Spreadsheet {
    let mut book = umya_spreadsheet::new_file();
    for (name, rows) in sheets {
        if book.get_sheet_by_name(name).is_none() {
            book.new_sheet(*name).expect("add sheet");
        }
        let sheet = book.get_sheet_by_name_mut(name).expect("sheet exists");
        for (r, row) in rows.iter().enumerate() {
            for (c, text) in row.iter().enumerate() {
                if text.is_empty() {
                    continue;
                }
                let cell = sheet.get_cell_mut(((c + 1) as u32, (r + 1) as u32));
                match text.parse::<f64>() {
                    Ok(number) if number.is_finite() => {
                        cell.set_value_number(number);
                    }
                    _ => {
                        cell.set_value_string(*text);
                    }
                }
            }
        }
    }
    book
}

pub fn write_xlsx(path: &Path, sheets: &[SheetFixture<'_>]) {
    let book = build_book(sheets);
    umya_spreadsheet::writer::xlsx::write(&book, path).expect("write workbook");
}

pub fn xlsx_bytes(sheets: &[SheetFixture<'_>]) -> Vec<u8> {
    let book = build_book(sheets);
    let mut buf = std::io::Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut buf).expect("write to bytes");
    buf.into_inner()
}

/// Write `sheets` to `<tempdir>/<file_name>`. Keep the `TempDir` alive while
/// the file is used.
pub fn xlsx_fixture(file_name: &str, sheets: &[SheetFixture<'_>]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join(file_name);
    write_xlsx(&path, sheets);
    (dir, path)
}

pub fn text_fixture(file_name: &str, contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join(file_name);
    std::fs::write(&path, contents).expect("write fixture");
    (dir, path)
}
