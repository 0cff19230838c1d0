//! Parser for per-field binding directives.
//!
//! A directive string is a `;`-separated list; parentheses protect their
//! content, so `split(;)` is a single entry.
//!
//! | entry          | meaning                                              |
//! |----------------|------------------------------------------------------|
//! | `-`, `ignore`  | never bind this field                                |
//! | `column(name)` | bind to column `name` (`column(-)` ignores)          |
//! | `name`         | bare value, same as `column(name)`                   |
//! | `split(d)`     | collection field, cell split on delimiter `d`        |
//! | `default(v)`   | use `v` when the cell is empty                       |
//! | `nil(v)`       | treat cell text equal to `v` as empty                |

use crate::error::{Result, SheetError};

pub const IGNORE_MARKER: &str = "-";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldDirectives {
    pub ignore: bool,
    /// Explicit `column(...)`.
    pub column: Option<String>,
    /// Unqualified value; loses to an explicit `column(...)`.
    pub bare: Option<String>,
    pub split: Option<String>,
    pub default: Option<String>,
    pub nil: Option<String>,
}

impl FieldDirectives {
    pub fn parse(field: &str, raw: &str) -> Result<Self> {
        let mut out = FieldDirectives::default();
        for entry in split_entries(raw) {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            if entry == IGNORE_MARKER || entry == "ignore" {
                out.ignore = true;
                continue;
            }

            let Some(open) = entry.find('(') else {
                out.bare = Some(entry.to_string());
                continue;
            };
            if !entry.ends_with(')') {
                return Err(invalid(field, entry, "missing closing parenthesis"));
            }
            let name = entry[..open].trim();
            let arg = &entry[open + 1..entry.len() - 1];
            match name {
                "column" => {
                    let arg = arg.trim();
                    if arg.is_empty() {
                        return Err(invalid(field, entry, "column name is empty"));
                    }
                    out.column = Some(arg.to_string());
                }
                "split" => {
                    if arg.is_empty() {
                        return Err(invalid(field, entry, "split delimiter is empty"));
                    }
                    out.split = Some(arg.to_string());
                }
                "default" => out.default = Some(arg.to_string()),
                "nil" => out.nil = Some(arg.to_string()),
                "ignore" if arg.trim().is_empty() => out.ignore = true,
                _ => return Err(invalid(field, entry, "unknown directive")),
            }
        }
        Ok(out)
    }

    /// True when the field must never be written.
    pub fn is_ignored(&self) -> bool {
        self.ignore
            || self.column.as_deref() == Some(IGNORE_MARKER)
            || (self.column.is_none() && self.bare.as_deref() == Some(IGNORE_MARKER))
    }

    /// Column the field binds to: explicit column, then bare value, then the
    /// declared field name.
    pub fn bound_column<'a>(&'a self, declared: &'a str) -> &'a str {
        self.column
            .as_deref()
            .or(self.bare.as_deref())
            .unwrap_or(declared)
    }
}

fn invalid(field: &str, directive: &str, reason: &str) -> SheetError {
    SheetError::InvalidDirective {
        field: field.to_string(),
        directive: directive.to_string(),
        reason: reason.to_string(),
    }
}

/// Split on `;` outside parentheses.
fn split_entries(raw: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in raw.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                entries.push(&raw[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    entries.push(&raw[start..]);
    entries
}
