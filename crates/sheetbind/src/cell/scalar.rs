use super::{CellField, Conversion, FieldShape};
use crate::error::CellFailure;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use std::fmt::Display;
use std::str::FromStr;

/// A type parsed straight from cell text; also the element type of split
/// collections.
pub trait CellScalar: Sized + Default {
    fn parse_scalar(text: &str) -> Result<Self, String>;
}

/// Empty text is the zero value, never an error.
fn write_scalar<T: CellScalar>(slot: &mut T, text: &str) -> Result<(), CellFailure> {
    *slot = if text.is_empty() {
        T::default()
    } else {
        T::parse_scalar(text).map_err(CellFailure::parse)?
    };
    Ok(())
}

macro_rules! scalar_field {
    ($($ty:ty),* $(,)?) => {
        $(
            impl CellField for $ty {
                fn shape() -> FieldShape {
                    FieldShape::Scalar
                }

                fn write_cell(&mut self, text: &str, _conversion: &Conversion) -> Result<(), CellFailure> {
                    write_scalar(self, text)
                }
            }
        )*
    };
}

macro_rules! integer_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl CellScalar for $ty {
                fn parse_scalar(text: &str) -> Result<Self, String> {
                    parse_integer(text)
                }
            }
        )*
        scalar_field!($($ty),*);
    };
}

integer_scalar!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

// Largest magnitude an f64 holds without losing integer precision (2^53).
const EXACT_F64_INT: f64 = 9_007_199_254_740_992.0;

/// Decimal integers, plus integral floats (`3.0`, `1e2`): spreadsheets store
/// every number as a double.
fn parse_integer<T>(text: &str) -> Result<T, String>
where
    T: FromStr + TryFrom<i128>,
    <T as FromStr>::Err: Display,
{
    let trimmed = text.trim();
    match trimmed.parse::<T>() {
        Ok(v) => Ok(v),
        Err(err) => match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() <= EXACT_F64_INT => {
                T::try_from(f as i128).map_err(|_| format!("`{trimmed}` is out of range"))
            }
            _ => Err(err.to_string()),
        },
    }
}

impl CellScalar for f64 {
    fn parse_scalar(text: &str) -> Result<Self, String> {
        text.trim().parse::<f64>().map_err(|e| e.to_string())
    }
}

impl CellScalar for f32 {
    fn parse_scalar(text: &str) -> Result<Self, String> {
        text.trim().parse::<f32>().map_err(|e| e.to_string())
    }
}

impl CellScalar for bool {
    fn parse_scalar(text: &str) -> Result<Self, String> {
        parse_bool(text.trim())
    }
}

impl CellScalar for String {
    fn parse_scalar(text: &str) -> Result<Self, String> {
        Ok(text.to_string())
    }
}

scalar_field!(f32, f64, bool, String);

/// `1 t T TRUE true True` / `0 f F FALSE false False`.
pub fn parse_bool(text: &str) -> Result<bool, String> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        other => Err(format!("`{other}` is not a boolean")),
    }
}

/* ───────────────────────────── dates ───────────────────────────── */

// Day zero of the 1900 date system, as spreadsheets count it.
fn serial_epoch() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)
}

fn from_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let millis = (serial * 86_400_000.0).round() as i64;
    serial_epoch()?.checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}

impl CellScalar for NaiveDate {
    fn parse_scalar(text: &str) -> Result<Self, String> {
        let trimmed = text.trim();
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return Ok(date);
        }
        trimmed
            .parse::<f64>()
            .ok()
            .and_then(from_serial)
            .map(|dt| dt.date())
            .ok_or_else(|| format!("`{trimmed}` is not a date"))
    }
}

impl CellScalar for NaiveDateTime {
    fn parse_scalar(text: &str) -> Result<Self, String> {
        let trimmed = text.trim();
        for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
                return Ok(dt);
            }
        }
        if let Some(midnight) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
        {
            return Ok(midnight);
        }
        trimmed
            .parse::<f64>()
            .ok()
            .and_then(from_serial)
            .ok_or_else(|| format!("`{trimmed}` is not a date-time"))
    }
}

scalar_field!(NaiveDate, NaiveDateTime);
