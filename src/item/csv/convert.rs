use std::{fmt, str::FromStr, sync::Arc};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::record::{FieldKind, Value};

/// ISO 8601 and other year-first forms, tried by [`Converter::DateTime`].
const ISO_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d",
    "%Y%m%d",
];

const MDY_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y",
    "%m-%d-%Y %H:%M:%S",
    "%m-%d-%Y",
    "%m.%d.%Y",
];

const DMY_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d/%m/%Y",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y",
    "%d.%m.%Y",
];

const YMD_FORMATS: &[&str] = &[
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y/%m/%d",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d",
    "%Y.%m.%d",
];

/// A caller-supplied parser, used through [`Converter::Custom`].
///
/// `parse` receives non-empty text and returns `None` when it cannot
/// produce a value.
pub trait Convert: fmt::Debug + Send + Sync {
    fn parse(&self, value: &str) -> Option<Value>;
}

/// Parses cleaned field text into a typed [`Value`].
///
/// Parsing is lenient: empty or unparsable text yields `None` (null), never
/// an error. Numbers and dates are parsed strictly, in one invariant format.
///
/// # Examples
///
/// ```
/// use csv_link::core::record::Value;
/// use csv_link::item::csv::convert::Converter;
///
/// assert_eq!(Converter::I32.parse("-42"), Some(Value::I32(-42)));
/// assert_eq!(Converter::I32.parse("4.2"), None);
/// assert_eq!(Converter::Text.parse(""), None);
/// assert!(Converter::DateMdy.parse("02/28/2023").is_some());
/// assert!(Converter::DateDmy.parse("02/28/2023").is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Converter {
    Text,
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Decimal,
    /// ISO 8601 style date and time.
    DateTime,
    /// Month first: `MM/dd/yyyy`.
    DateMdy,
    /// Day first: `dd/MM/yyyy`.
    DateDmy,
    /// Year first: `yyyy/MM/dd`.
    DateYmd,
    #[serde(skip)]
    Custom(Arc<dyn Convert>),
}

impl Converter {
    /// Default converter for a field of the given kind.
    pub fn for_kind(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Text => Converter::Text,
            FieldKind::Bool => Converter::Bool,
            FieldKind::I8 => Converter::I8,
            FieldKind::I16 => Converter::I16,
            FieldKind::I32 => Converter::I32,
            FieldKind::I64 => Converter::I64,
            FieldKind::U8 => Converter::U8,
            FieldKind::U16 => Converter::U16,
            FieldKind::U32 => Converter::U32,
            FieldKind::U64 => Converter::U64,
            FieldKind::F32 => Converter::F32,
            FieldKind::F64 => Converter::F64,
            FieldKind::Decimal => Converter::Decimal,
            FieldKind::DateTime | FieldKind::Date => Converter::DateTime,
        }
    }

    /// Every built-in converter, sorted by name.
    pub fn known() -> Vec<Converter> {
        let mut known = vec![
            Converter::Text,
            Converter::Bool,
            Converter::I8,
            Converter::I16,
            Converter::I32,
            Converter::I64,
            Converter::U8,
            Converter::U16,
            Converter::U32,
            Converter::U64,
            Converter::F32,
            Converter::F64,
            Converter::Decimal,
            Converter::DateTime,
            Converter::DateMdy,
            Converter::DateDmy,
            Converter::DateYmd,
        ];
        known.sort_by_key(Converter::name);
        known
    }

    pub fn name(&self) -> &'static str {
        match self {
            Converter::Text => "text",
            Converter::Bool => "bool",
            Converter::I8 => "i8",
            Converter::I16 => "i16",
            Converter::I32 => "i32",
            Converter::I64 => "i64",
            Converter::U8 => "u8",
            Converter::U16 => "u16",
            Converter::U32 => "u32",
            Converter::U64 => "u64",
            Converter::F32 => "f32",
            Converter::F64 => "f64",
            Converter::Decimal => "decimal",
            Converter::DateTime => "date_time",
            Converter::DateMdy => "date_mdy",
            Converter::DateDmy => "date_dmy",
            Converter::DateYmd => "date_ymd",
            Converter::Custom(_) => "custom",
        }
    }

    /// Ordered exact formats tried by a date converter.
    pub fn date_formats(&self) -> Option<&'static [&'static str]> {
        match self {
            Converter::DateTime => Some(ISO_FORMATS),
            Converter::DateMdy => Some(MDY_FORMATS),
            Converter::DateDmy => Some(DMY_FORMATS),
            Converter::DateYmd => Some(YMD_FORMATS),
            _ => None,
        }
    }

    pub fn parse(&self, value: &str) -> Option<Value> {
        if value.is_empty() {
            return None;
        }

        match self {
            Converter::Text => Some(Value::Text(value.to_string())),
            Converter::Bool => parse_bool(value).map(Value::Bool),
            Converter::I8 => number(value).map(Value::I8),
            Converter::I16 => number(value).map(Value::I16),
            Converter::I32 => number(value).map(Value::I32),
            Converter::I64 => number(value).map(Value::I64),
            Converter::U8 => number(value).map(Value::U8),
            Converter::U16 => number(value).map(Value::U16),
            Converter::U32 => number(value).map(Value::U32),
            Converter::U64 => number(value).map(Value::U64),
            Converter::F32 => number(value).map(Value::F32),
            Converter::F64 => number(value).map(Value::F64),
            Converter::Decimal => parse_decimal(value).map(Value::Decimal),
            Converter::DateTime
            | Converter::DateMdy
            | Converter::DateDmy
            | Converter::DateYmd => self
                .date_formats()
                .and_then(|formats| parse_date(value, formats))
                .map(Value::DateTime),
            Converter::Custom(convert) => convert.parse(value),
        }
    }
}

fn number<N: FromStr>(value: &str) -> Option<N> {
    value.parse().ok()
}

fn parse_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Plain decimal notation only; exponents are rejected.
fn parse_decimal(value: &str) -> Option<Decimal> {
    if value.contains(['e', 'E']) {
        return None;
    }
    Decimal::from_str(value).ok()
}

fn parse_date(value: &str, formats: &[&str]) -> Option<NaiveDateTime> {
    formats.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(value, format)
            .or_else(|_| {
                NaiveDate::parse_from_str(value, format).map(|date| date.and_time(NaiveTime::MIN))
            })
            .ok()
    })
}
