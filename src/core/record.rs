use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::{
    prelude::{FromPrimitive, ToPrimitive},
    Decimal,
};
use serde::{Deserialize, Serialize};

/// Scalar kind of a record field.
///
/// The kind selects the default converter for a field when its link does not
/// name one. `Option<T>` fields report the kind of `T`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
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
    DateTime,
    Date,
}

/// A typed value produced by a converter.
///
/// Null is represented by the absence of a value (`Option<Value>`).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Decimal(Decimal),
    DateTime(NaiveDateTime),
}

impl Value {
    /// The field kind this value was produced for.
    pub fn kind(&self) -> FieldKind {
        match self {
            Value::Text(_) => FieldKind::Text,
            Value::Bool(_) => FieldKind::Bool,
            Value::I8(_) => FieldKind::I8,
            Value::I16(_) => FieldKind::I16,
            Value::I32(_) => FieldKind::I32,
            Value::I64(_) => FieldKind::I64,
            Value::U8(_) => FieldKind::U8,
            Value::U16(_) => FieldKind::U16,
            Value::U32(_) => FieldKind::U32,
            Value::U64(_) => FieldKind::U64,
            Value::F32(_) => FieldKind::F32,
            Value::F64(_) => FieldKind::F64,
            Value::Decimal(_) => FieldKind::Decimal,
            Value::DateTime(_) => FieldKind::DateTime,
        }
    }

    /// Returns the value as an `i128` when it is an integer.
    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            Value::I8(v) => Some(v.into()),
            Value::I16(v) => Some(v.into()),
            Value::I32(v) => Some(v.into()),
            Value::I64(v) => Some(v.into()),
            Value::U8(v) => Some(v.into()),
            Value::U16(v) => Some(v.into()),
            Value::U32(v) => Some(v.into()),
            Value::U64(v) => Some(v.into()),
            _ => None,
        }
    }

    /// Returns the value as an `f64` when it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F32(v) => Some(f64::from(*v)),
            Value::F64(v) => Some(*v),
            Value::Decimal(v) => v.to_f64(),
            other => other.as_i128().map(|v| v as f64),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(v) => f.write_str(v),
            Value::Bool(v) => write!(f, "{v}"),
            Value::I8(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

/// One entry of a record's field-descriptor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// A target record populated by an import.
///
/// The importer only needs two capabilities from a record: a blank instance
/// (`Default`) and a way to set a named field. Implementations are usually
/// generated with [`csv_record!`](crate::csv_record).
///
/// # Examples
///
/// ```
/// use csv_link::core::record::{CsvRecord, FieldDescriptor, FieldKind, Value};
///
/// #[derive(Default)]
/// struct City {
///     name: String,
/// }
///
/// impl CsvRecord for City {
///     fn fields() -> &'static [FieldDescriptor] {
///         const FIELDS: &[FieldDescriptor] = &[FieldDescriptor::new("name", FieldKind::Text)];
///         FIELDS
///     }
///
///     fn set_field(&mut self, name: &str, value: Option<Value>) {
///         if name == "name" {
///             csv_link::core::record::assign(&mut self.name, value);
///         }
///     }
/// }
///
/// let mut city = City::default();
/// city.set_field("name", Some(Value::Text("Boston".to_string())));
/// assert_eq!(city.name, "Boston");
/// ```
pub trait CsvRecord: Default {
    /// The settable fields of the record.
    fn fields() -> &'static [FieldDescriptor];

    /// Sets the field named `name` (as listed in [`CsvRecord::fields`]).
    ///
    /// `None` is null: optional fields become `None`, others their default.
    fn set_field(&mut self, name: &str, value: Option<Value>);
}

/// A Rust type that can hold a converted [`Value`].
pub trait FieldValue: Sized {
    const KIND: FieldKind;

    /// Converts a value into `Self`, or `None` when the variant does not fit.
    fn from_value(value: Value) -> Option<Self>;

    /// The value assigned for null.
    fn null() -> Self;
}

/// Assigns `value` to `slot`, falling back to [`FieldValue::null`].
pub fn assign<T: FieldValue>(slot: &mut T, value: Option<Value>) {
    *slot = match value {
        Some(value) => {
            let kind = value.kind();
            T::from_value(value).unwrap_or_else(|| {
                log::warn!("{kind:?} value does not fit a {:?} field", T::KIND);
                T::null()
            })
        }
        None => T::null(),
    };
}

macro_rules! integer_field {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                const KIND: FieldKind = FieldKind::$kind;

                fn from_value(value: Value) -> Option<Self> {
                    value.as_i128().and_then(|v| <$ty>::try_from(v).ok())
                }

                fn null() -> Self {
                    Self::default()
                }
            }
        )*
    };
}

integer_field!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
);

impl FieldValue for f32 {
    const KIND: FieldKind = FieldKind::F32;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::F32(v) => Some(v),
            other => other.as_f64().map(|v| v as f32),
        }
    }

    fn null() -> Self {
        0.0
    }
}

impl FieldValue for f64 {
    const KIND: FieldKind = FieldKind::F64;

    fn from_value(value: Value) -> Option<Self> {
        value.as_f64()
    }

    fn null() -> Self {
        0.0
    }
}

impl FieldValue for Decimal {
    const KIND: FieldKind = FieldKind::Decimal;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Decimal(v) => Some(v),
            Value::F32(v) => Decimal::from_f32(v),
            Value::F64(v) => Decimal::from_f64(v),
            other => other.as_i128().and_then(Decimal::from_i128),
        }
    }

    fn null() -> Self {
        Decimal::ZERO
    }
}

impl FieldValue for bool {
    const KIND: FieldKind = FieldKind::Bool;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }

    fn null() -> Self {
        false
    }
}

impl FieldValue for String {
    const KIND: FieldKind = FieldKind::Text;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Text(v) => Some(v),
            other => Some(other.to_string()),
        }
    }

    fn null() -> Self {
        String::new()
    }
}

impl FieldValue for NaiveDateTime {
    const KIND: FieldKind = FieldKind::DateTime;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::DateTime(v) => Some(v),
            _ => None,
        }
    }

    fn null() -> Self {
        NaiveDateTime::default()
    }
}

impl FieldValue for NaiveDate {
    const KIND: FieldKind = FieldKind::Date;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::DateTime(v) => Some(v.date()),
            _ => None,
        }
    }

    fn null() -> Self {
        NaiveDate::default()
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    const KIND: FieldKind = T::KIND;

    fn from_value(value: Value) -> Option<Self> {
        T::from_value(value).map(Some)
    }

    fn null() -> Self {
        None
    }
}

/// Implements [`CsvRecord`] for a struct with `Default` and named fields.
///
/// Every listed field must implement [`FieldValue`]. Fields left out of the
/// list are never touched by an import.
///
/// # Examples
///
/// ```
/// use csv_link::csv_record;
/// use csv_link::core::record::CsvRecord;
///
/// #[derive(Default, Debug)]
/// struct Employee {
///     email: String,
///     age: Option<u8>,
/// }
///
/// csv_record!(Employee {
///     email: String,
///     age: Option<u8>,
/// });
///
/// assert_eq!(Employee::fields().len(), 2);
/// assert_eq!(Employee::fields()[1].name, "age");
/// ```
#[macro_export]
macro_rules! csv_record {
    ($record:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        impl $crate::core::record::CsvRecord for $record {
            fn fields() -> &'static [$crate::core::record::FieldDescriptor] {
                const FIELDS: &[$crate::core::record::FieldDescriptor] = &[
                    $(
                        $crate::core::record::FieldDescriptor::new(
                            stringify!($field),
                            <$ty as $crate::core::record::FieldValue>::KIND,
                        ),
                    )*
                ];
                FIELDS
            }

            fn set_field(
                &mut self,
                name: &str,
                value: ::std::option::Option<$crate::core::record::Value>,
            ) {
                $(
                    if name == stringify!($field) {
                        $crate::core::record::assign::<$ty>(&mut self.$field, value);
                        return;
                    }
                )*
                let _ = value;
            }
        }
    };
}
