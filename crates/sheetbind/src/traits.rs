//! Backend boundary: a workbook is a set of named sheets, each an ordered
//! sequence of rows of cell text.

use crate::error::Result;
use std::path::Path;

/// Rows of one sheet, header included, top to bottom.
pub type SheetRows = Vec<Vec<String>>;

pub trait WorkbookSource: Send {
    /// Short backend tag used in errors and logs.
    fn backend_name(&self) -> &'static str;

    /// Sheet names in workbook order.
    fn sheet_names(&self) -> Vec<String>;

    /// Materialize every row of `sheet` as text.
    ///
    /// Repeated calls restart from the top; the handle is not consumed.
    /// Unknown sheets are [`SheetError::MissingSheet`](crate::SheetError::MissingSheet).
    fn read_sheet(&mut self, sheet: &str) -> Result<SheetRows>;

    fn has_sheet(&self, sheet: &str) -> bool {
        self.sheet_names().iter().any(|name| name == sheet)
    }
}

/// Constructors for sources that read a container format.
pub trait OpenWorkbook: WorkbookSource + Sized {
    fn open_path<P: AsRef<Path>>(path: P) -> Result<Self>;

    fn open_bytes(data: Vec<u8>) -> Result<Self>;
}
