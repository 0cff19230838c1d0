//! Workbook handle: opens a source, hands out sheet readers and closes.

use crate::config::ReaderConfig;
use crate::decode::RowDestination;
use crate::error::{Result, SheetError};
use crate::field_map::FieldMapCache;
use crate::namer::SheetNamer;
use crate::reader::SheetReader;
use crate::traits::WorkbookSource;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

#[cfg(feature = "calamine")]
use crate::backends::CalamineWorkbook;
#[cfg(feature = "csv")]
use crate::backends::CsvWorkbook;
#[cfg(any(feature = "calamine", feature = "csv"))]
use crate::traits::OpenWorkbook;

pub struct Connector {
    source: Option<Box<dyn WorkbookSource>>,
    cache: Arc<FieldMapCache>,
    config: ReaderConfig,
}

impl Default for Connector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector {
    /// A closed connector using the process-wide field map cache.
    pub fn new() -> Self {
        Self {
            source: None,
            cache: FieldMapCache::global(),
            config: ReaderConfig::default(),
        }
    }

    pub fn with_cache(mut self, cache: Arc<FieldMapCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_config(mut self, config: ReaderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<FieldMapCache> {
        &self.cache
    }

    /// Open a workbook file, replacing any open one. `.csv` files go to the
    /// CSV backend, everything else to calamine.
    pub fn open<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("open_workbook", path = %path.display()).entered();
        self.close();
        self.source = Some(open_path(path)?);
        Ok(())
    }

    /// Open an in-memory workbook (xlsx / xls / xlsb / ods), replacing any open one.
    pub fn open_binary(&mut self, bytes: impl Into<Vec<u8>>) -> Result<()> {
        self.close();
        self.source = Some(open_bytes(bytes.into())?);
        Ok(())
    }

    /// Use an already constructed source, e.g. a [`MemoryWorkbook`](crate::backends::MemoryWorkbook).
    pub fn attach<S: WorkbookSource + 'static>(&mut self, source: S) -> &mut Self {
        self.close();
        self.source = Some(Box::new(source));
        self
    }

    pub fn is_open(&self) -> bool {
        self.source.is_some()
    }

    pub fn sheet_names(&self) -> Result<Vec<String>> {
        Ok(self.source()?.sheet_names())
    }

    /// Reader over the sheet `namer` resolves to.
    pub fn new_reader(&mut self, namer: impl Into<SheetNamer>) -> Result<SheetReader> {
        let cache = Arc::clone(&self.cache);
        let config = self.config.clone();
        let source = self.source_mut()?;
        SheetReader::open_with(source, namer.into(), &config, cache)
    }

    /// Reader over the sheet inferred from destination type `D`.
    pub fn new_reader_for<D: RowDestination>(&mut self) -> Result<SheetReader> {
        self.new_reader(default_namer::<D>()?)
    }

    /// Release the workbook. Calling it again is a no-op.
    pub fn close(&mut self) {
        if let Some(source) = self.source.take() {
            #[cfg(feature = "tracing")]
            tracing::debug!(backend = source.backend_name(), "workbook closed");
            drop(source);
        }
    }

    fn source(&self) -> Result<&dyn WorkbookSource> {
        self.source.as_deref().ok_or(SheetError::NotOpen)
    }

    fn source_mut(&mut self) -> Result<&mut dyn WorkbookSource> {
        match self.source.as_deref_mut() {
            Some(source) => Ok(source),
            None => Err(SheetError::NotOpen),
        }
    }
}

impl fmt::Debug for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("backend", &self.source.as_ref().map(|s| s.backend_name()))
            .field("config", &self.config)
            .finish()
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn open_path(path: &Path) -> Result<Box<dyn WorkbookSource>> {
    if is_csv(path) {
        #[cfg(feature = "csv")]
        return Ok(Box::new(CsvWorkbook::open_path(path)?));
        #[cfg(not(feature = "csv"))]
        return Err(SheetError::open(path.display(), "csv support is not enabled"));
    }
    #[cfg(feature = "calamine")]
    return Ok(Box::new(CalamineWorkbook::open_path(path)?));
    #[cfg(not(feature = "calamine"))]
    return Err(SheetError::open(
        path.display(),
        "workbook support is not enabled",
    ));
}

fn open_bytes(bytes: Vec<u8>) -> Result<Box<dyn WorkbookSource>> {
    #[cfg(feature = "calamine")]
    return Ok(Box::new(CalamineWorkbook::open_bytes(bytes)?));
    #[cfg(not(feature = "calamine"))]
    {
        let _ = bytes;
        Err(SheetError::open(
            "workbook bytes",
            "workbook support is not enabled",
        ))
    }
}

fn default_namer<D: RowDestination>() -> Result<SheetNamer> {
    D::default_namer().ok_or(SheetError::NoSheetName {
        destination: std::any::type_name::<D>(),
    })
}

/// Open the sheet inferred from `D` in `source`, decode every data row into
/// `out` top to bottom and close the reader, whether or not decoding failed.
/// Rows decoded before a failing row stay in `out`.
pub fn decode_all<D: RowDestination>(
    source: &mut dyn WorkbookSource,
    out: &mut Vec<D>,
) -> Result<()> {
    let mut reader = SheetReader::open(source, default_namer::<D>()?)?;
    let result = reader.read_all(out);
    reader.close();
    result
}

/// Open `path`, read the sheet inferred from `D` and close.
pub fn read_file<D: RowDestination, P: AsRef<Path>>(path: P, out: &mut Vec<D>) -> Result<()> {
    let path = path.as_ref();
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("read_file", path = %path.display()).entered();
    let mut source = open_path(path)?;
    decode_all(source.as_mut(), out)
}

/// Like [`read_file`] for a workbook held in memory.
pub fn read_bytes<D: RowDestination>(bytes: impl Into<Vec<u8>>, out: &mut Vec<D>) -> Result<()> {
    let mut source = open_bytes(bytes.into())?;
    decode_all(source.as_mut(), out)
}
