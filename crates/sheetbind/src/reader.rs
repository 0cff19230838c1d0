//! Sequential reader over one sheet.
//!
//! ```text
//!  open ─► Positioned(0) ──next──► Positioned(1) ──next──► … ──next──► Exhausted
//!              (header)             (data row 1)
//!  close() from any state ─► Closed
//! ```
//!
//! `read` is only valid on a data row. `read_all` rewinds to just after the
//! header and walks every row top to bottom.

use crate::config::ReaderConfig;
use crate::decode::{RowDestination, RowView, decode_into};
use crate::error::{Result, SheetError};
use crate::field_map::{FieldMapCache, SheetRecord};
use crate::header::{ColumnIndex, resolve_header};
use crate::namer::SheetNamer;
use crate::traits::{SheetRows, WorkbookSource};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReaderState {
    /// `0` is the header; `n >= 1` is the n-th data row.
    Positioned(usize),
    Exhausted,
    Closed,
}

impl fmt::Display for ReaderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReaderState::Positioned(0) => write!(f, "on the header row"),
            ReaderState::Positioned(n) => write!(f, "on data row {n}"),
            ReaderState::Exhausted => write!(f, "exhausted"),
            ReaderState::Closed => write!(f, "closed"),
        }
    }
}

pub struct SheetReader {
    sheet: String,
    columns: ColumnIndex,
    /// Data rows only; `None` once closed.
    rows: Option<SheetRows>,
    state: ReaderState,
    cache: Arc<FieldMapCache>,
}

impl SheetReader {
    /// Open the sheet `namer` resolves to, with the default config and the
    /// process-wide field map cache.
    pub fn open(source: &mut dyn WorkbookSource, namer: impl Into<SheetNamer>) -> Result<Self> {
        Self::open_with(
            source,
            namer.into(),
            &ReaderConfig::default(),
            FieldMapCache::global(),
        )
    }

    pub fn open_with(
        source: &mut dyn WorkbookSource,
        namer: SheetNamer,
        config: &ReaderConfig,
        cache: Arc<FieldMapCache>,
    ) -> Result<Self> {
        let sheet = namer.resolve().into_owned();
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!(
            "open_sheet",
            backend = source.backend_name(),
            sheet = sheet.as_str()
        )
        .entered();

        if !source.has_sheet(&sheet) {
            return Err(SheetError::MissingSheet {
                sheet,
                available: source.sheet_names(),
            });
        }
        let rows = source.read_sheet(&sheet)?;
        Self::from_rows(sheet, rows, config, cache)
    }

    /// Build a reader over rows already in memory, header included.
    pub fn from_rows(
        sheet: impl Into<String>,
        mut rows: SheetRows,
        config: &ReaderConfig,
        cache: Arc<FieldMapCache>,
    ) -> Result<Self> {
        let sheet = sheet.into();
        if config.trim_cells {
            for cell in rows.iter_mut().flatten() {
                let trimmed = cell.trim();
                if trimmed.len() != cell.len() {
                    *cell = trimmed.to_string();
                }
            }
        }

        let columns = resolve_header(&sheet, &rows, config.header_row)?;
        let data: SheetRows = rows
            .into_iter()
            .skip(config.header_row + 1)
            .skip(config.skip_rows)
            .filter(|row| !(config.skip_blank_rows && row.iter().all(String::is_empty)))
            .collect();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            sheet = sheet.as_str(),
            columns = columns.len(),
            rows = data.len(),
            "sheet opened"
        );

        Ok(Self {
            sheet,
            columns,
            rows: Some(data),
            state: ReaderState::Positioned(0),
            cache,
        })
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet
    }

    pub fn columns(&self) -> &ColumnIndex {
        &self.columns
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// 1-based data row the reader is on, if any.
    pub fn row_index(&self) -> Option<usize> {
        match self.state {
            ReaderState::Positioned(n) if n > 0 => Some(n),
            _ => None,
        }
    }

    /// Number of data rows; zero once closed.
    pub fn row_count(&self) -> usize {
        self.rows.as_ref().map_or(0, Vec::len)
    }

    pub fn current_cells(&self) -> Option<&[String]> {
        let n = self.row_index()?;
        self.rows.as_ref()?.get(n - 1).map(Vec::as_slice)
    }

    /// Advance to the next data row. Returns `false` (and moves to
    /// [`ReaderState::Exhausted`]) when none remain.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        match self.state {
            ReaderState::Positioned(n) if n < self.row_count() => {
                self.state = ReaderState::Positioned(n + 1);
                true
            }
            ReaderState::Positioned(_) => {
                self.state = ReaderState::Exhausted;
                false
            }
            ReaderState::Exhausted | ReaderState::Closed => false,
        }
    }

    /// Decode the current data row.
    pub fn read<D: RowDestination>(&self) -> Result<D> {
        D::decode_row(&self.current_view()?)
    }

    /// Decode the current data row into an existing record. Fields whose
    /// column is absent keep their values.
    pub fn read_into<T: SheetRecord>(&self, record: &mut T) -> Result<()> {
        let view = self.current_view()?;
        let map = self.cache.get_or_build::<T>()?;
        decode_into(record, &view, &map)
    }

    /// Rewind to just after the header and append every row to `out`, top to
    /// bottom. Stops at the first failing row; rows decoded before it stay in
    /// `out`.
    pub fn read_all<D: RowDestination>(&mut self, out: &mut Vec<D>) -> Result<()> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("read_all", sheet = self.sheet.as_str()).entered();
        self.rewind()?;
        out.reserve(self.row_count());
        while self.next() {
            out.push(self.read()?);
        }
        Ok(())
    }

    /// Iterator decoding the rows after the current position. Stops after the
    /// first error it yields.
    pub fn rows<D: RowDestination>(&mut self) -> Rows<'_, D> {
        Rows {
            reader: self,
            failed: false,
            _marker: PhantomData,
        }
    }

    /// Back to the header row.
    pub fn rewind(&mut self) -> Result<()> {
        if self.state == ReaderState::Closed {
            return Err(self.not_positioned());
        }
        self.state = ReaderState::Positioned(0);
        Ok(())
    }

    /// Release the sheet's rows. Calling it again is a no-op.
    pub fn close(&mut self) {
        if self.state != ReaderState::Closed {
            #[cfg(feature = "tracing")]
            tracing::debug!(sheet = self.sheet.as_str(), "sheet closed");
            self.rows = None;
            self.state = ReaderState::Closed;
        }
    }

    fn current_view(&self) -> Result<RowView<'_>> {
        let (Some(row), Some(cells)) = (self.row_index(), self.current_cells()) else {
            return Err(self.not_positioned());
        };
        Ok(RowView {
            cells,
            columns: &self.columns,
            row,
            cache: &self.cache,
        })
    }

    fn not_positioned(&self) -> SheetError {
        SheetError::NotPositioned {
            state: self.state.to_string(),
        }
    }
}

impl fmt::Debug for SheetReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetReader")
            .field("sheet", &self.sheet)
            .field("columns", &self.columns.len())
            .field("rows", &self.row_count())
            .field("state", &self.state)
            .finish()
    }
}

/// Rows decoded one at a time; see [`SheetReader::rows`].
pub struct Rows<'r, D> {
    reader: &'r mut SheetReader,
    failed: bool,
    _marker: PhantomData<fn() -> D>,
}

impl<D: RowDestination> Iterator for Rows<'_, D> {
    type Item = Result<D>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || !self.reader.next() {
            return None;
        }
        let item = self.reader.read();
        self.failed = item.is_err();
        Some(item)
    }
}
