use crate::field_map::SheetRecord;
use std::borrow::Cow;
use std::fmt;

/// Capability for values that know which sheet they are read from.
pub trait NamedSheet {
    fn sheet_name(&self) -> String;
}

/// Which sheet of a workbook to read.
pub enum SheetNamer {
    /// A literal sheet name.
    ByName(String),
    /// A value exposing [`NamedSheet`]; wins over type-name inference.
    ByCapability(Box<dyn NamedSheet + Send + Sync>),
    /// The destination record's type name.
    ByInferredType(&'static str),
}

struct DeclaredSheet(&'static str);

impl NamedSheet for DeclaredSheet {
    fn sheet_name(&self) -> String {
        self.0.to_string()
    }
}

impl SheetNamer {
    /// Sheet for record type `T`: its declared sheet name, else its type name.
    pub fn for_type<T: SheetRecord>() -> Self {
        match T::sheet_name() {
            Some(name) => SheetNamer::ByCapability(Box::new(DeclaredSheet(name))),
            None => SheetNamer::ByInferredType(T::TYPE_NAME),
        }
    }

    pub fn for_value<T: SheetRecord>(_value: &T) -> Self {
        Self::for_type::<T>()
    }

    /// Element type of `values` decides, as for an empty destination slice.
    pub fn for_slice<T: SheetRecord>(_values: &[T]) -> Self {
        Self::for_type::<T>()
    }

    pub fn from_value<V: NamedSheet + Send + Sync + 'static>(value: V) -> Self {
        SheetNamer::ByCapability(Box::new(value))
    }

    pub fn resolve(&self) -> Cow<'_, str> {
        match self {
            SheetNamer::ByName(name) => Cow::Borrowed(name.as_str()),
            SheetNamer::ByCapability(value) => Cow::Owned(value.sheet_name()),
            SheetNamer::ByInferredType(type_name) => Cow::Borrowed(type_name),
        }
    }
}

impl From<&str> for SheetNamer {
    fn from(name: &str) -> Self {
        SheetNamer::ByName(name.to_string())
    }
}

impl From<String> for SheetNamer {
    fn from(name: String) -> Self {
        SheetNamer::ByName(name)
    }
}

impl From<&String> for SheetNamer {
    fn from(name: &String) -> Self {
        SheetNamer::ByName(name.clone())
    }
}

impl fmt::Debug for SheetNamer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetNamer::ByName(name) => f.debug_tuple("ByName").field(name).finish(),
            SheetNamer::ByCapability(value) => {
                f.debug_tuple("ByCapability").field(&value.sheet_name()).finish()
            }
            SheetNamer::ByInferredType(name) => f.debug_tuple("ByInferredType").field(name).finish(),
        }
    }
}
