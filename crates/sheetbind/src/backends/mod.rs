pub mod memory;

pub use self::memory::MemoryWorkbook;

#[cfg(feature = "calamine")]
pub mod calamine;

#[cfg(feature = "calamine")]
pub use self::calamine::CalamineWorkbook;

#[cfg(feature = "csv")]
pub mod csv;

#[cfg(feature = "csv")]
pub use self::csv::{CsvReadOptions, CsvWorkbook};
