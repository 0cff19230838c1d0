//! Decode spreadsheet rows into typed records.
//!
//! A record type declares how its fields bind to sheet columns; the engine
//! resolves the header row once per sheet, builds (and caches) one field map
//! per record type, and converts every bound cell of every row.
//!
//! ```ignore
//! use sheetbind::{Connector, SheetRecord};
//!
//! #[derive(SheetRecord, Debug, Default)]
//! struct Standard {
//!     #[sheet("ID")]
//!     id: u64,
//!     #[sheet("NameOf")]
//!     name: String,
//!     #[sheet("Slice;split(|)")]
//!     slice: Vec<i32>,
//!     #[sheet("-")]
//!     scratch: String,
//! }
//!
//! let mut connector = Connector::new();
//! connector.open("people.xlsx")?;
//! let mut reader = connector.new_reader_for::<Standard>()?;
//! let mut rows: Vec<Standard> = Vec::new();
//! reader.read_all(&mut rows)?;
//! ```

extern crate self as sheetbind;

pub mod backends;
pub mod cell;
pub mod config;
pub mod connector;
pub mod decode;
pub mod directive;
pub mod error;
pub mod field_map;
pub mod header;
pub mod namer;
pub mod reader;
pub mod traits;

#[cfg(feature = "json")]
pub use cell::Json;
pub use cell::{CellField, CellScalar, Conversion, DecodeFromBytes, FieldShape};
pub use config::ReaderConfig;
pub use connector::{Connector, decode_all, read_bytes, read_file};
pub use decode::{RowDestination, RowView};
pub use error::{CellConversionError, CellFailure, Result, SheetError};
pub use field_map::{FieldBinding, FieldMap, FieldMapBuilder, FieldMapCache, SheetRecord};
pub use header::ColumnIndex;
pub use namer::{NamedSheet, SheetNamer};
pub use reader::{ReaderState, Rows, SheetReader};
pub use traits::{OpenWorkbook, SheetRows, WorkbookSource};

pub use sheetbind_macros::{BytesCell, SheetRecord};
