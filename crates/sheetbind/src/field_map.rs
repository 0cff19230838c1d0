//! Field maps: the per-type binding plan from column names to field writers.
//!
//! A record type describes its fields once through [`SheetRecord::describe`]
//! (normally generated by `#[derive(SheetRecord)]`). The builder parses each
//! field's directives, resolves the column it binds to and picks the
//! [`Conversion`] from the field type's [`FieldShape`]. The finished
//! [`FieldMap`] is cached per type in a [`FieldMapCache`].

use crate::cell::{CellField, Conversion, FieldShape};
use crate::directive::FieldDirectives;
use crate::error::{CellFailure, Result, SheetError};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A destination record type with declarative field bindings.
///
/// Hand-written impls also need [`RowDestination`](crate::RowDestination)
/// to be read from a sheet; [`impl_row_destination!`](crate::impl_row_destination)
/// provides it.
pub trait SheetRecord: Default + Sized + 'static {
    /// Type name, the fallback sheet name.
    const TYPE_NAME: &'static str;

    /// Sheet name declared on the type; wins over [`Self::TYPE_NAME`].
    fn sheet_name() -> Option<&'static str> {
        None
    }

    fn describe(fields: &mut FieldMapBuilder<Self>) -> Result<()>;
}

type WriteFn<T> = dyn Fn(&mut T, &str, &Conversion) -> Result<(), CellFailure> + Send + Sync;

pub struct FieldBinding<T> {
    path: String,
    column: String,
    conversion: Conversion,
    target_type: &'static str,
    default: Option<String>,
    nil: Option<String>,
    write: Option<Arc<WriteFn<T>>>,
}

impl<T> FieldBinding<T> {
    /// Dotted field path; flattened fields are prefixed by their parent.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn conversion(&self) -> &Conversion {
        &self.conversion
    }

    pub fn target_type(&self) -> &'static str {
        self.target_type
    }

    pub fn is_ignored(&self) -> bool {
        self.write.is_none()
    }

    /// Cell text after `nil(...)` and `default(...)` are applied.
    pub fn effective_text<'a>(&'a self, raw: &'a str) -> &'a str {
        let text = if self.nil.as_deref() == Some(raw) { "" } else { raw };
        if text.is_empty() {
            self.default.as_deref().unwrap_or("")
        } else {
            text
        }
    }

    /// Convert `raw` into this binding's field of `record`.
    pub fn apply(&self, record: &mut T, raw: &str) -> Result<(), CellFailure> {
        match &self.write {
            Some(write) => write(record, self.effective_text(raw), &self.conversion),
            None => Ok(()),
        }
    }
}

impl<T> fmt::Debug for FieldBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBinding")
            .field("path", &self.path)
            .field("column", &self.column)
            .field("conversion", &self.conversion)
            .field("target_type", &self.target_type)
            .field("default", &self.default)
            .field("nil", &self.nil)
            .finish()
    }
}

/// Ordered bindings for one record type.
#[derive(Debug)]
pub struct FieldMap<T> {
    type_name: &'static str,
    bindings: Vec<FieldBinding<T>>,
}

impl<T: SheetRecord> FieldMap<T> {
    pub fn build() -> Result<Self> {
        let mut builder = FieldMapBuilder::new();
        T::describe(&mut builder)?;
        Ok(FieldMap {
            type_name: T::TYPE_NAME,
            bindings: builder.bindings,
        })
    }
}

impl<T> FieldMap<T> {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Bindings in declaration order, flattened fields in place.
    pub fn bindings(&self) -> &[FieldBinding<T>] {
        &self.bindings
    }

    pub fn binding(&self, path: &str) -> Option<&FieldBinding<T>> {
        self.bindings.iter().find(|b| b.path == path)
    }

    /// Non-ignored bindings reading `column`.
    pub fn bound_to<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a FieldBinding<T>> + 'a {
        self.bindings
            .iter()
            .filter(move |b| !b.is_ignored() && b.column == column)
    }
}

pub struct FieldMapBuilder<T> {
    bindings: Vec<FieldBinding<T>>,
}

impl<T: 'static> Default for FieldMapBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> FieldMapBuilder<T> {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Register a field. `directive` is the raw directive string, if any.
    pub fn field<F>(
        &mut self,
        name: &str,
        directive: Option<&str>,
        access: fn(&mut T) -> &mut F,
    ) -> Result<&mut Self>
    where
        F: CellField + 'static,
    {
        let directives = match directive {
            Some(raw) => FieldDirectives::parse(name, raw)?,
            None => FieldDirectives::default(),
        };
        if directives.is_ignored() {
            return Ok(self.ignored(name));
        }

        let target_type = std::any::type_name::<F>();
        let conversion = resolve_conversion(F::shape(), directives.split.as_deref()).map_err(
            |reason| SheetError::UnsupportedFieldType {
                field: name.to_string(),
                type_name: target_type,
                reason: reason.to_string(),
            },
        )?;

        let write: Arc<WriteFn<T>> =
            Arc::new(move |record: &mut T, text: &str, conversion: &Conversion| {
                access(record).write_cell(text, conversion)
            });
        self.bindings.push(FieldBinding {
            path: name.to_string(),
            column: directives.bound_column(name).to_string(),
            conversion,
            target_type,
            default: directives.default,
            nil: directives.nil,
            write: Some(write),
        });
        Ok(self)
    }

    /// Register a field that is never bound.
    pub fn ignored(&mut self, name: &str) -> &mut Self {
        self.bindings.push(FieldBinding {
            path: name.to_string(),
            column: crate::directive::IGNORE_MARKER.to_string(),
            conversion: Conversion::Ignored,
            target_type: "",
            default: None,
            nil: None,
            write: None,
        });
        self
    }

    /// Promote the fields of an embedded record into this map.
    pub fn flatten<R>(&mut self, name: &str, access: fn(&mut T) -> &mut R) -> Result<&mut Self>
    where
        R: SheetRecord,
    {
        let inner = FieldMap::<R>::build()?;
        for binding in inner.bindings {
            let write = binding.write.map(|inner_write| -> Arc<WriteFn<T>> {
                Arc::new(move |record: &mut T, text: &str, conversion: &Conversion| {
                    inner_write(access(record), text, conversion)
                })
            });
            self.bindings.push(FieldBinding {
                path: format!("{name}.{}", binding.path),
                column: binding.column,
                conversion: binding.conversion,
                target_type: binding.target_type,
                default: binding.default,
                nil: binding.nil,
                write,
            });
        }
        Ok(self)
    }
}

fn resolve_conversion(shape: FieldShape, split: Option<&str>) -> Result<Conversion, &'static str> {
    match (shape, split) {
        // The decode hook takes precedence over any generic handling.
        (FieldShape::Bytes, _) => Ok(Conversion::Bytes),
        (FieldShape::Sequence, Some(delimiter)) => Ok(Conversion::Sequence {
            delimiter: delimiter.to_string(),
        }),
        (FieldShape::Sequence, None) => {
            Err("collection fields need a split(...) directive and no decode hook is declared")
        }
        (FieldShape::Scalar, Some(_)) => Err("split(...) needs a collection field"),
        (FieldShape::Scalar, None) => Ok(Conversion::Scalar),
    }
}

/* ───────────────────────────── cache ───────────────────────────── */

static GLOBAL: Lazy<Arc<FieldMapCache>> = Lazy::new(|| Arc::new(FieldMapCache::new()));

/// Field maps keyed by record type.
///
/// Lookups take a shared lock; a miss takes the exclusive lock, re-checks and
/// builds, so each type is built at most once per cache. One process-wide
/// instance is created lazily on first use ([`FieldMapCache::global`]);
/// independent caches can be injected into a `Connector` or reader.
#[derive(Default)]
pub struct FieldMapCache {
    maps: RwLock<FxHashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl FieldMapCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global() -> Arc<FieldMapCache> {
        Arc::clone(&GLOBAL)
    }

    pub fn get_or_build<T: SheetRecord>(&self) -> Result<Arc<FieldMap<T>>> {
        let key = TypeId::of::<T>();
        let cached = self.maps.read().get(&key).cloned();
        if let Some(map) = cached.and_then(downcast::<T>) {
            return Ok(map);
        }

        let mut maps = self.maps.write();
        if let Some(map) = maps.get(&key).cloned().and_then(downcast::<T>) {
            return Ok(map);
        }
        let map = Arc::new(FieldMap::<T>::build()?);
        #[cfg(feature = "tracing")]
        tracing::debug!(
            record = T::TYPE_NAME,
            bindings = map.bindings().len(),
            "built field map"
        );
        maps.insert(key, map.clone());
        Ok(map)
    }

    pub fn contains<T: SheetRecord>(&self) -> bool {
        self.maps.read().contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.maps.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.read().is_empty()
    }

    /// Drop every cached map; the next lookup rebuilds.
    pub fn clear(&self) {
        self.maps.write().clear();
    }
}

impl fmt::Debug for FieldMapCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldMapCache")
            .field("types", &self.len())
            .finish()
    }
}

fn downcast<T: SheetRecord>(entry: Arc<dyn Any + Send + Sync>) -> Option<Arc<FieldMap<T>>> {
    entry.downcast::<FieldMap<T>>().ok()
}
