use super::{CellField, Conversion, DecodeFromBytes, FieldShape, decode_bytes};
use crate::error::CellFailure;
use serde::de::DeserializeOwned;

/// Cell holding a JSON document, decoded with serde.
///
/// ```ignore
/// #[derive(SheetRecord, Default)]
/// struct Row {
///     #[sheet("Payload")]
///     payload: Option<Json<Payload>>,
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: DeserializeOwned> DecodeFromBytes for Json<T> {
    type Error = serde_json::Error;

    fn decode_from_bytes(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.0 = serde_json::from_slice(data)?;
        Ok(())
    }
}

impl<T: DeserializeOwned> CellField for Json<T> {
    fn shape() -> FieldShape {
        FieldShape::Bytes
    }

    fn write_cell(&mut self, text: &str, _conversion: &Conversion) -> Result<(), CellFailure> {
        decode_bytes(self, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_json_cell() {
        let mut slot: Option<Json<Vec<u32>>> = None;
        slot.write_cell("[1,2,3]", &Conversion::Bytes).unwrap();
        assert_eq!(slot, Some(Json(vec![1, 2, 3])));
    }

    #[test]
    fn bad_json_is_a_decode_failure() {
        let mut slot: Json<Vec<u32>> = Json::default();
        let err = slot.write_cell("[1,", &Conversion::Bytes).unwrap_err();
        assert!(matches!(err, CellFailure::Decode(_)));
    }
}
