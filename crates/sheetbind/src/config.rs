/// How a [`SheetReader`](crate::SheetReader) walks a sheet's rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Zero-based physical row holding the header; rows above it are ignored.
    pub header_row: usize,
    /// Data rows dropped right after the header.
    pub skip_rows: usize,
    /// Trim surrounding whitespace of every cell, header included.
    pub trim_cells: bool,
    /// Do not yield rows whose cells are all empty.
    pub skip_blank_rows: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            header_row: 0,
            skip_rows: 0,
            trim_cells: false,
            skip_blank_rows: false,
        }
    }
}

impl ReaderConfig {
    pub fn with_header_row(mut self, header_row: usize) -> Self {
        self.header_row = header_row;
        self
    }

    pub fn with_skip_rows(mut self, skip_rows: usize) -> Self {
        self.skip_rows = skip_rows;
        self
    }

    pub fn with_trim_cells(mut self, trim_cells: bool) -> Self {
        self.trim_cells = trim_cells;
        self
    }

    pub fn with_skip_blank_rows(mut self, skip_blank_rows: bool) -> Self {
        self.skip_blank_rows = skip_blank_rows;
        self
    }
}
