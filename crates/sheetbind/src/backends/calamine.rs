#![cfg(feature = "calamine")]

use crate::error::{Result, SheetError};
use crate::traits::{OpenWorkbook, SheetRows, WorkbookSource};
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;

use ::calamine::{Data, Range, Reader, Sheets, open_workbook_auto, open_workbook_auto_from_rs};

enum Handle {
    File(Sheets<BufReader<File>>),
    Bytes(Sheets<Cursor<Vec<u8>>>),
}

/// xlsx / xlsm / xlsb / xls / ods workbooks through calamine.
///
/// Rows are the sheet's used range, padded with empty rows above it and empty
/// cells left of it so indices match the sheet's physical rows and columns.
pub struct CalamineWorkbook {
    handle: Handle,
    names: Vec<String>,
}

impl CalamineWorkbook {
    fn cell_text(data: &Data) -> String {
        match data {
            Data::Empty => String::new(),
            Data::String(s) => s.clone(),
            Data::Float(f) => f.to_string(),
            Data::Int(i) => i.to_string(),
            Data::Bool(true) => "TRUE".to_string(),
            Data::Bool(false) => "FALSE".to_string(),
            // Serial number; date fields parse serials.
            Data::DateTime(dt) => dt.as_f64().to_string(),
            Data::DateTimeIso(s) => s.clone(),
            Data::DurationIso(s) => s.clone(),
            Data::Error(e) => e.to_string(),
            #[allow(unreachable_patterns)]
            other => other.to_string(),
        }
    }

    fn range_to_rows(range: &Range<Data>) -> SheetRows {
        let (start_row, start_col) = range.start().unwrap_or_default();
        let mut rows = vec![Vec::new(); start_row as usize];
        rows.extend(range.rows().map(|cells| {
            let mut row = vec![String::new(); start_col as usize];
            row.extend(cells.iter().map(Self::cell_text));
            row
        }));
        rows
    }
}

impl OpenWorkbook for CalamineWorkbook {
    fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let workbook = open_workbook_auto(path).map_err(|e| SheetError::open(path.display(), e))?;
        let names = workbook.sheet_names();
        Ok(Self {
            handle: Handle::File(workbook),
            names,
        })
    }

    fn open_bytes(data: Vec<u8>) -> Result<Self> {
        let workbook = open_workbook_auto_from_rs(Cursor::new(data))
            .map_err(|e| SheetError::open("workbook bytes", e))?;
        let names = workbook.sheet_names();
        Ok(Self {
            handle: Handle::Bytes(workbook),
            names,
        })
    }
}

impl WorkbookSource for CalamineWorkbook {
    fn backend_name(&self) -> &'static str {
        "calamine"
    }

    fn sheet_names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn read_sheet(&mut self, sheet: &str) -> Result<SheetRows> {
        if !self.has_sheet(sheet) {
            return Err(SheetError::MissingSheet {
                sheet: sheet.to_string(),
                available: self.names.clone(),
            });
        }
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("calamine_read_sheet", sheet).entered();
        let range = match &mut self.handle {
            Handle::File(wb) => wb.worksheet_range(sheet),
            Handle::Bytes(wb) => wb.worksheet_range(sheet),
        }
        .map_err(|e| SheetError::from_backend("calamine", e))?;
        Ok(Self::range_to_rows(&range))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_text_forms() {
        assert_eq!(CalamineWorkbook::cell_text(&Data::Empty), "");
        assert_eq!(CalamineWorkbook::cell_text(&Data::Float(3.0)), "3");
        assert_eq!(CalamineWorkbook::cell_text(&Data::Float(1.5)), "1.5");
        assert_eq!(CalamineWorkbook::cell_text(&Data::Int(-4)), "-4");
        assert_eq!(CalamineWorkbook::cell_text(&Data::Bool(true)), "TRUE");
        assert_eq!(
            CalamineWorkbook::cell_text(&Data::String("1|2".into())),
            "1|2"
        );
    }

    #[test]
    fn garbage_bytes_fail_to_open() {
        let err = match CalamineWorkbook::open_bytes(b"not a workbook".to_vec()) {
            Ok(_) => panic!("garbage opened as a workbook"),
            Err(err) => err,
        };
        assert!(matches!(err, SheetError::Open { .. }));
    }

    #[test]
    fn rows_keep_physical_positions() {
        let mut range: Range<Data> = Range::new((1, 2), (2, 3));
        range.set_value((1, 2), Data::String("ID".into()));
        range.set_value((2, 2), Data::Float(5.0));

        let rows = CalamineWorkbook::range_to_rows(&range);
        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_empty());
        assert_eq!(rows[1], vec!["", "", "ID", ""]);
        assert_eq!(rows[2], vec!["", "", "5", ""]);
    }
}
