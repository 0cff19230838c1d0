use crate::error::{Result, SheetError};
use crate::traits::{SheetRows, WorkbookSource};

/// Sheets held in memory, in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryWorkbook {
    sheets: Vec<(String, SheetRows)>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet<N, R, C, S>(mut self, name: N, rows: R) -> Self
    where
        N: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_sheet(name, rows);
        self
    }

    /// Add a sheet, replacing any sheet of the same name in place.
    pub fn add_sheet<N, R, C, S>(&mut self, name: N, rows: R) -> &mut Self
    where
        N: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let rows: SheetRows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        match self.sheets.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = rows,
            None => self.sheets.push((name, rows)),
        }
        self
    }
}

impl WorkbookSource for MemoryWorkbook {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    fn read_sheet(&mut self, sheet: &str) -> Result<SheetRows> {
        self.sheets
            .iter()
            .find(|(name, _)| name == sheet)
            .map(|(_, rows)| rows.clone())
            .ok_or_else(|| SheetError::MissingSheet {
                sheet: sheet.to_string(),
                available: self.sheet_names(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_sheets_by_name() {
        let mut book = MemoryWorkbook::new()
            .with_sheet("A", vec![vec!["1"]])
            .with_sheet("B", vec![vec!["2"]]);
        book.add_sheet("A", vec![vec!["3", "4"]]);

        assert_eq!(book.sheet_names(), vec!["A", "B"]);
        assert_eq!(book.read_sheet("A").unwrap(), vec![vec!["3", "4"]]);
        assert!(book.has_sheet("B"));
    }

    #[test]
    fn unknown_sheet() {
        let mut book = MemoryWorkbook::new().with_sheet("A", vec![vec!["1"]]);
        match book.read_sheet("Z").unwrap_err() {
            SheetError::MissingSheet { sheet, available } => {
                assert_eq!(sheet, "Z");
                assert_eq!(available, vec!["A"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
