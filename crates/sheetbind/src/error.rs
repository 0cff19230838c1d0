//! Error types for opening sheets, building field maps and converting cells.
//!
//! - **`SheetError`**          : everything an engine operation can return
//! - **`CellConversionError`** : one failed cell, with column/row/raw text
//! - **`CellFailure`**         : the converter-level reason, before the row
//!   decoder attaches a location

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

pub type Result<T, E = SheetError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum SheetError {
    /// Bad path, unreadable bytes or an unknown container format.
    #[error("failed to open {target}: {message}")]
    Open { target: String, message: String },

    #[error("sheet `{sheet}` not found (available: {})", .available.join(", "))]
    MissingSheet {
        sheet: String,
        available: Vec<String>,
    },

    /// The destination carries no type name to infer a sheet from (maps).
    #[error("cannot infer a sheet name for `{destination}`; pass an explicit sheet namer")]
    NoSheetName { destination: &'static str },

    #[error("sheet `{sheet}` has no header row")]
    EmptyHeader { sheet: String },

    #[error("field `{field}`: invalid directive `{directive}`: {reason}")]
    InvalidDirective {
        field: String,
        directive: String,
        reason: String,
    },

    #[error("field `{field}` of type `{type_name}` cannot be bound: {reason}")]
    UnsupportedFieldType {
        field: String,
        type_name: &'static str,
        reason: String,
    },

    #[error(transparent)]
    CellConversion(#[from] CellConversionError),

    #[error("reader is not positioned on a data row ({state})")]
    NotPositioned { state: String },

    #[error("no workbook is open")]
    NotOpen,

    #[error("{backend} backend error: {message}")]
    Backend { backend: String, message: String },
}

impl SheetError {
    pub fn from_backend(backend: &str, err: impl fmt::Display) -> Self {
        SheetError::Backend {
            backend: backend.to_string(),
            message: err.to_string(),
        }
    }

    pub fn open(target: impl fmt::Display, err: impl fmt::Display) -> Self {
        SheetError::Open {
            target: target.to_string(),
            message: err.to_string(),
        }
    }

    /// The failed cell, when this error came from a conversion.
    pub fn cell(&self) -> Option<&CellConversionError> {
        match self {
            SheetError::CellConversion(cell) => Some(cell),
            _ => None,
        }
    }
}

/// A cell whose text could not be converted into its bound field.
#[derive(Debug, Error)]
#[error("cannot convert `{raw}` in column `{column}` (row {row}) into `{target_type}`: {cause}")]
pub struct CellConversionError {
    pub column: String,
    /// Data row number, 1-based past the header.
    pub row: usize,
    pub raw: String,
    pub target_type: &'static str,
    #[source]
    pub cause: CellFailure,
}

/// Why the converter rejected a cell.
#[derive(Debug, Error)]
pub enum CellFailure {
    #[error("{message}")]
    Parse { message: String },

    /// One segment of a split cell; `index` is the zero-based segment position.
    #[error("segment {index} (`{segment}`): {message}")]
    Segment {
        index: usize,
        segment: String,
        message: String,
    },

    #[error("decode hook failed: {0}")]
    Decode(Box<dyn StdError + Send + Sync>),
}

impl CellFailure {
    pub fn parse(message: impl Into<String>) -> Self {
        CellFailure::Parse {
            message: message.into(),
        }
    }

    /// Attach the cell location the row decoder knows about.
    pub fn at(
        self,
        column: &str,
        row: usize,
        raw: &str,
        target_type: &'static str,
    ) -> CellConversionError {
        CellConversionError {
            column: column.to_string(),
            row,
            raw: raw.to_string(),
            target_type,
            cause: self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_error_names_column_and_row() {
        let err: SheetError = CellFailure::parse("invalid digit found in string")
            .at("AgeOf", 3, "abc", "i64")
            .into();
        let text = err.to_string();
        assert!(text.contains("`AgeOf`"), "{text}");
        assert!(text.contains("row 3"), "{text}");
        assert!(text.contains("`abc`"), "{text}");

        let cell = err.cell().expect("cell error");
        assert_eq!(cell.target_type, "i64");
        assert!(cell.source().is_some());
    }

    #[test]
    fn missing_sheet_lists_available_names() {
        let err = SheetError::MissingSheet {
            sheet: "Nope".into(),
            available: vec!["Standard".into(), "Other".into()],
        };
        assert_eq!(
            err.to_string(),
            "sheet `Nope` not found (available: Standard, Other)"
        );
    }
}
