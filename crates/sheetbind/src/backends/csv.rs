#![cfg(feature = "csv")]

use crate::error::{Result, SheetError};
use crate::traits::{OpenWorkbook, SheetRows, WorkbookSource};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const DEFAULT_SHEET: &str = "Sheet1";

#[derive(Clone, Debug)]
pub struct CsvReadOptions {
    /// Field delimiter as a single byte. Use `b'\t'` for TSV.
    pub delimiter: u8,
    /// Name of the single sheet. Defaults to the file stem when opened from a
    /// path and to `Sheet1` otherwise.
    pub sheet_name: Option<String>,
    /// Trim whitespace around every field while parsing.
    pub trim: bool,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            sheet_name: None,
            trim: false,
        }
    }
}

/// A CSV file as a single-sheet workbook. UTF-8 only; every record, the
/// first included, is a row. Blank lines read as empty rows, so row indices
/// are physical line numbers (less one) outside quoted multi-line fields.
pub struct CsvWorkbook {
    sheet_name: String,
    rows: SheetRows,
}

impl CsvWorkbook {
    pub fn open_path_with_options<P: AsRef<Path>>(
        path: P,
        options: CsvReadOptions,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| SheetError::open(path.display(), e))?;
        let fallback = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(DEFAULT_SHEET)
            .to_string();
        let sheet_name = options.sheet_name.clone().unwrap_or(fallback);
        Self::from_reader(BufReader::new(file), sheet_name, &options)
    }

    pub fn open_bytes_with_options(bytes: Vec<u8>, options: CsvReadOptions) -> Result<Self> {
        let sheet_name = options
            .sheet_name
            .clone()
            .unwrap_or_else(|| DEFAULT_SHEET.to_string());
        Self::from_reader(std::io::Cursor::new(bytes), sheet_name, &options)
    }

    fn from_reader<R: Read>(reader: R, sheet_name: String, options: &CsvReadOptions) -> Result<Self> {
        let mut rb = ::csv::ReaderBuilder::new();
        rb.delimiter(options.delimiter)
            .has_headers(false)
            // Ragged rows are fine; short rows read as empty cells.
            .flexible(true)
            .trim(if options.trim {
                ::csv::Trim::All
            } else {
                ::csv::Trim::None
            });

        let mut rows = SheetRows::new();
        // First physical line not yet accounted for by a row.
        let mut next_line = 1u64;
        for record in rb.from_reader(reader).records() {
            let record = record.map_err(|e| SheetError::from_backend("csv", e))?;
            // The parser drops blank lines; put them back as empty rows.
            if let Some(position) = record.position() {
                for _ in next_line..position.line() {
                    rows.push(Vec::new());
                }
                let embedded: u64 = record
                    .iter()
                    .map(|field| field.matches('\n').count() as u64)
                    .sum();
                next_line = position.line() + 1 + embedded;
            }
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Self { sheet_name, rows })
    }
}

impl OpenWorkbook for CsvWorkbook {
    fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_path_with_options(path, CsvReadOptions::default())
    }

    fn open_bytes(data: Vec<u8>) -> Result<Self> {
        Self::open_bytes_with_options(data, CsvReadOptions::default())
    }
}

impl WorkbookSource for CsvWorkbook {
    fn backend_name(&self) -> &'static str {
        "csv"
    }

    fn sheet_names(&self) -> Vec<String> {
        vec![self.sheet_name.clone()]
    }

    fn read_sheet(&mut self, sheet: &str) -> Result<SheetRows> {
        if sheet != self.sheet_name {
            return Err(SheetError::MissingSheet {
                sheet: sheet.to_string(),
                available: self.sheet_names(),
            });
        }
        Ok(self.rows.clone())
    }
}
