//! Native field types covered by the fixed type table.

use std::collections::{BTreeSet, HashSet};
use std::hash::Hash;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::NativeType;
use crate::convert::{ConversionError, Value};

/// A field type with a built-in store mapping.
pub trait NativeField: Sized + Send + Sync + 'static {
    const NATIVE: NativeType;
    const OPTIONAL: bool = false;

    fn to_value(&self) -> Result<Value, ConversionError>;

    fn from_value(value: Value) -> Result<Self, ConversionError>;
}

/// A native type that can be an element of a store set.
pub trait SetElement: NativeField {
    const SET: NativeType;
}

impl NativeField for bool {
    const NATIVE: NativeType = NativeType::Bool;

    fn to_value(&self) -> Result<Value, ConversionError> {
        Ok(Value::Bool(*self))
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        value.into_bool()
    }
}

macro_rules! integer_field {
    ($variant:ident: $($t:ty),*) => {
        $(
            impl NativeField for $t {
                const NATIVE: NativeType = NativeType::Integer;

                fn to_value(&self) -> Result<Value, ConversionError> {
                    Ok(Value::$variant((*self).into()))
                }

                fn from_value(value: Value) -> Result<Self, ConversionError> {
                    value.into_integer(stringify!($t))
                }
            }

            impl SetElement for $t {
                const SET: NativeType = NativeType::NumberSet;
            }
        )*
    };
}

integer_field!(Int: i8, i16, i32, i64);
integer_field!(UInt: u8, u16, u32, u64);

impl NativeField for f64 {
    const NATIVE: NativeType = NativeType::Float;

    fn to_value(&self) -> Result<Value, ConversionError> {
        if self.is_finite() {
            Ok(Value::Float(*self))
        } else {
            Err(ConversionError::NonFiniteNumber)
        }
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        value.into_float()
    }
}

impl NativeField for f32 {
    const NATIVE: NativeType = NativeType::Float;

    fn to_value(&self) -> Result<Value, ConversionError> {
        f64::from(*self).to_value()
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        let float = value.into_float()?;
        if float.is_finite() && float.abs() > f64::from(f32::MAX) {
            return Err(ConversionError::OutOfRange {
                value: float.to_string(),
                target: "f32",
            });
        }
        Ok(float as f32)
    }
}

impl NativeField for String {
    const NATIVE: NativeType = NativeType::String;

    fn to_value(&self) -> Result<Value, ConversionError> {
        Ok(Value::String(self.clone()))
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        value.into_string()
    }
}

impl SetElement for String {
    const SET: NativeType = NativeType::StringSet;
}

impl NativeField for Vec<u8> {
    const NATIVE: NativeType = NativeType::Bytes;

    fn to_value(&self) -> Result<Value, ConversionError> {
        Ok(Value::Bytes(self.clone()))
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        value.into_bytes()
    }
}

impl SetElement for Vec<u8> {
    const SET: NativeType = NativeType::BytesSet;
}

impl NativeField for Uuid {
    const NATIVE: NativeType = NativeType::Uuid;

    fn to_value(&self) -> Result<Value, ConversionError> {
        Ok(Value::String(self.to_string()))
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        let raw = value.into_string()?;
        Uuid::parse_str(&raw).map_err(ConversionError::custom)
    }
}

impl NativeField for DateTime<Utc> {
    const NATIVE: NativeType = NativeType::Timestamp;

    fn to_value(&self) -> Result<Value, ConversionError> {
        Ok(Value::String(self.to_rfc3339()))
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        let raw = value.into_string()?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(ConversionError::custom)
    }
}

impl<T> NativeField for HashSet<T>
where
    T: SetElement + Eq + Hash,
{
    const NATIVE: NativeType = T::SET;

    fn to_value(&self) -> Result<Value, ConversionError> {
        self.iter()
            .map(NativeField::to_value)
            .collect::<Result<_, _>>()
            .map(Value::Set)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        value.into_set()?.into_iter().map(T::from_value).collect()
    }
}

impl<T> NativeField for BTreeSet<T>
where
    T: SetElement + Ord,
{
    const NATIVE: NativeType = T::SET;

    fn to_value(&self) -> Result<Value, ConversionError> {
        self.iter()
            .map(NativeField::to_value)
            .collect::<Result<_, _>>()
            .map(Value::Set)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        value.into_set()?.into_iter().map(T::from_value).collect()
    }
}

impl<T: NativeField> NativeField for Option<T> {
    const NATIVE: NativeType = T::NATIVE;
    const OPTIONAL: bool = true;

    fn to_value(&self) -> Result<Value, ConversionError> {
        match self {
            Some(value) => value.to_value(),
            None => Ok(Value::Null),
        }
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(None),
            value => T::from_value(value).map(Some),
        }
    }
}
