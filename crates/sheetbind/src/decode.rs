//! Row decoder: one row of cells into one destination value.

use crate::error::Result;
use crate::field_map::{FieldMap, FieldMapCache, SheetRecord};
use crate::header::ColumnIndex;
use crate::namer::SheetNamer;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Everything the decoder needs for one row.
#[derive(Clone, Copy, Debug)]
pub struct RowView<'a> {
    pub cells: &'a [String],
    pub columns: &'a ColumnIndex,
    /// Data row number, 1-based past the header.
    pub row: usize,
    pub cache: &'a FieldMapCache,
}

impl<'a> RowView<'a> {
    /// Cell at `position`; cells past the end of a short row read as empty.
    pub fn cell(&self, position: usize) -> &'a str {
        self.cells.get(position).map(String::as_str).unwrap_or("")
    }

    /// `(header, raw text)` for every column, in header order.
    pub fn entries(&self) -> impl Iterator<Item = (&'a str, &'a str)> + '_ {
        self.columns
            .iter()
            .map(move |(name, position)| (name, self.cell(position)))
    }
}

/// A value that one sheet row decodes into.
///
/// Implemented by `#[derive(SheetRecord)]` for the record itself, for
/// `Box<T>` of any record, and for string-keyed maps of raw cell text.
pub trait RowDestination: Sized {
    fn decode_row(row: &RowView<'_>) -> Result<Self>;

    /// Sheet to read when the caller does not name one.
    fn default_namer() -> Option<SheetNamer> {
        None
    }
}

/// Implement [`RowDestination`] for record types whose [`SheetRecord`] impl
/// is written by hand. `#[derive(SheetRecord)]` emits this for you.
///
/// ```ignore
/// impl SheetRecord for Entry { /* ... */ }
/// sheetbind::impl_row_destination!(Entry);
/// ```
#[macro_export]
macro_rules! impl_row_destination {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::RowDestination for $ty {
            fn decode_row(row: &$crate::RowView<'_>) -> $crate::Result<Self> {
                $crate::decode::decode_record::<Self>(row)
            }

            fn default_namer() -> ::core::option::Option<$crate::SheetNamer> {
                ::core::option::Option::Some($crate::SheetNamer::for_type::<Self>())
            }
        }
    )+};
}

/// Decode a fresh `T` from `row` using the cached field map.
pub fn decode_record<T: SheetRecord>(row: &RowView<'_>) -> Result<T> {
    let map = row.cache.get_or_build::<T>()?;
    let mut record = T::default();
    decode_into(&mut record, row, &map)?;
    Ok(record)
}

/// Write every bound, present column of `row` into `record`.
///
/// Bindings whose column is not in the header are skipped; only conversion
/// failures of present columns are errors.
pub fn decode_into<T>(record: &mut T, row: &RowView<'_>, map: &FieldMap<T>) -> Result<()> {
    for binding in map.bindings() {
        if binding.is_ignored() {
            continue;
        }
        let Some(position) = row.columns.position(binding.column()) else {
            #[cfg(feature = "tracing")]
            tracing::trace!(
                field = binding.path(),
                column = binding.column(),
                "column absent, field left untouched"
            );
            continue;
        };
        let raw = row.cell(position);
        binding
            .apply(record, raw)
            .map_err(|cause| cause.at(binding.column(), row.row, raw, binding.target_type()))?;
    }
    Ok(())
}

impl<T: SheetRecord> RowDestination for Box<T> {
    fn decode_row(row: &RowView<'_>) -> Result<Self> {
        let mut record = Box::<T>::default();
        let map = row.cache.get_or_build::<T>()?;
        decode_into(&mut *record, row, &map)?;
        Ok(record)
    }

    fn default_namer() -> Option<SheetNamer> {
        Some(SheetNamer::for_type::<T>())
    }
}

impl<S: BuildHasher + Default> RowDestination for HashMap<String, String, S> {
    fn decode_row(row: &RowView<'_>) -> Result<Self> {
        Ok(row
            .entries()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect())
    }
}

impl RowDestination for BTreeMap<String, String> {
    fn decode_row(row: &RowView<'_>) -> Result<Self> {
        Ok(row
            .entries()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect())
    }
}

/// Header-ordered pairs.
impl RowDestination for Vec<(String, String)> {
    fn decode_row(row: &RowView<'_>) -> Result<Self> {
        Ok(row
            .entries()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect())
    }
}
