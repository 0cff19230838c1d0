//! Cell converter: one string cell into one typed field slot.
//!
//! Every bindable field type implements [`CellField`]. The field map builder
//! asks [`CellField::shape`] which conversions the type supports and picks a
//! [`Conversion`]; the row decoder then calls [`CellField::write_cell`] with
//! the cell text, mutating the slot in place.

#[cfg(feature = "json")]
mod json;
mod scalar;

#[cfg(feature = "json")]
pub use json::Json;
pub use scalar::{CellScalar, parse_bool};

use crate::error::CellFailure;
use std::error::Error as StdError;

/// What a field type can be converted from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldShape {
    /// Parsed directly from the cell text.
    Scalar,
    /// Ordered collection; needs a `split(...)` delimiter.
    Sequence,
    /// Raw cell bytes handed to a [`DecodeFromBytes`] implementation.
    Bytes,
}

/// Conversion chosen for one binding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Conversion {
    Scalar,
    Sequence { delimiter: String },
    Bytes,
    Ignored,
}

pub trait CellField {
    fn shape() -> FieldShape;

    fn write_cell(&mut self, text: &str, conversion: &Conversion) -> Result<(), CellFailure>;
}

/// Opt-in capability for types that decode themselves from raw cell bytes.
///
/// Implement this and add `#[derive(BytesCell)]` to make the type bindable.
pub trait DecodeFromBytes {
    type Error: StdError + Send + Sync + 'static;

    fn decode_from_bytes(&mut self, data: &[u8]) -> Result<(), Self::Error>;
}

/// Hand the UTF-8 bytes of `text` to the slot's decode hook.
pub fn decode_bytes<T: DecodeFromBytes>(slot: &mut T, text: &str) -> Result<(), CellFailure> {
    slot.decode_from_bytes(text.as_bytes())
        .map_err(|err| CellFailure::Decode(Box::new(err)))
}

/// Split `text` on `delimiter` and parse every non-empty segment.
///
/// An empty cell is an empty collection.
pub fn split_cell<T: CellScalar>(text: &str, delimiter: &str) -> Result<Vec<T>, CellFailure> {
    let mut out = Vec::new();
    if text.is_empty() {
        return Ok(out);
    }
    for (index, segment) in text.split(delimiter).enumerate() {
        if segment.is_empty() {
            continue;
        }
        let value = T::parse_scalar(segment).map_err(|message| CellFailure::Segment {
            index,
            segment: segment.to_string(),
            message,
        })?;
        out.push(value);
    }
    Ok(out)
}

/// Pointer-like optional slot: an empty cell leaves it `None`.
impl<T: CellField + Default> CellField for Option<T> {
    fn shape() -> FieldShape {
        T::shape()
    }

    fn write_cell(&mut self, text: &str, conversion: &Conversion) -> Result<(), CellFailure> {
        if text.is_empty() {
            *self = None;
            return Ok(());
        }
        let mut value = T::default();
        value.write_cell(text, conversion)?;
        *self = Some(value);
        Ok(())
    }
}

impl<T: CellField> CellField for Box<T> {
    fn shape() -> FieldShape {
        T::shape()
    }

    fn write_cell(&mut self, text: &str, conversion: &Conversion) -> Result<(), CellFailure> {
        (**self).write_cell(text, conversion)
    }
}

impl<T: CellScalar> CellField for Vec<T> {
    fn shape() -> FieldShape {
        FieldShape::Sequence
    }

    fn write_cell(&mut self, text: &str, conversion: &Conversion) -> Result<(), CellFailure> {
        let Conversion::Sequence { delimiter } = conversion else {
            return Err(CellFailure::parse("collection field needs a split delimiter"));
        };
        *self = split_cell(text, delimiter)?;
        Ok(())
    }
}
