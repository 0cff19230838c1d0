use crate::error::{Result, SheetError};
use rustc_hash::FxHashMap;

/// Column name → zero-based cell position for one sheet.
///
/// Policy for odd headers:
/// - empty header cells never become bindable columns;
/// - when a name repeats, the leftmost occurrence wins and later ones are dropped;
/// - names are matched exactly (case-sensitive, no trimming unless the reader
///   was configured to trim cells).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnIndex {
    /// Distinct columns in header order.
    columns: Vec<(String, usize)>,
    positions: FxHashMap<String, usize>,
}

impl ColumnIndex {
    pub fn resolve<S: AsRef<str>>(header: &[S]) -> Self {
        let mut index = ColumnIndex::default();
        for (position, cell) in header.iter().enumerate() {
            let name = cell.as_ref();
            if name.is_empty() {
                continue;
            }
            if index.positions.contains_key(name) {
                #[cfg(feature = "tracing")]
                tracing::debug!(column = name, position, "duplicate header ignored");
                continue;
            }
            index.positions.insert(name.to_string(), position);
            index.columns.push((name.to_string(), position));
        }
        index
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// `(name, position)` pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.columns.iter().map(|(name, pos)| (name.as_str(), *pos))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(|(name, _)| name.as_str())
    }
}

/// Build the column index from the header row of `rows`.
pub fn resolve_header(sheet: &str, rows: &[Vec<String>], header_row: usize) -> Result<ColumnIndex> {
    let header = rows.get(header_row).ok_or_else(|| SheetError::EmptyHeader {
        sheet: sheet.to_string(),
    })?;
    Ok(ColumnIndex::resolve(header))
}
