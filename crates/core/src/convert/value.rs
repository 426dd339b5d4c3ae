//! Native values and their mapping to store attributes.

use std::collections::{BTreeMap, HashMap};

use uuid::Uuid;

use super::ConversionError;
use crate::schema::StoreType;
use crate::store::AttributeValue;

/// A field value read from (or written to) a record.
///
/// This is the neutral form every [`NativeField`](crate::schema::NativeField)
/// and custom converter produces; the store type tag of the field decides how
/// it becomes an [`AttributeValue`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Set(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) | Self::UInt(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    fn is_number(&self) -> bool {
        matches!(self, Self::Int(_) | Self::UInt(_) | Self::Float(_))
    }

    /// Converts a numeric value into an integer type, rejecting lossy casts.
    pub fn into_integer<T>(self, target: &'static str) -> Result<T, ConversionError>
    where
        T: TryFrom<i64> + TryFrom<u64>,
    {
        let out_of_range = |value: String| ConversionError::OutOfRange { value, target };
        match self {
            Self::Int(i) => T::try_from(i).map_err(|_| out_of_range(i.to_string())),
            Self::UInt(u) => T::try_from(u).map_err(|_| out_of_range(u.to_string())),
            Self::Float(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                T::try_from(f as i64).map_err(|_| out_of_range(f.to_string()))
            }
            Self::Float(f) => Err(out_of_range(f.to_string())),
            other => Err(ConversionError::TypeMismatch {
                expected: "integer",
                found: other.kind(),
            }),
        }
    }

    pub fn into_float(self) -> Result<f64, ConversionError> {
        match self {
            Self::Int(i) => Ok(i as f64),
            Self::UInt(u) => Ok(u as f64),
            Self::Float(f) => Ok(f),
            other => Err(ConversionError::TypeMismatch {
                expected: "float",
                found: other.kind(),
            }),
        }
    }

    pub fn into_string(self) -> Result<String, ConversionError> {
        match self {
            Self::String(s) => Ok(s),
            other => Err(ConversionError::TypeMismatch {
                expected: "string",
                found: other.kind(),
            }),
        }
    }

    pub fn into_bytes(self) -> Result<Vec<u8>, ConversionError> {
        match self {
            Self::Bytes(b) => Ok(b),
            other => Err(ConversionError::TypeMismatch {
                expected: "bytes",
                found: other.kind(),
            }),
        }
    }

    pub fn into_bool(self) -> Result<bool, ConversionError> {
        match self {
            Self::Bool(b) => Ok(b),
            other => Err(ConversionError::TypeMismatch {
                expected: "bool",
                found: other.kind(),
            }),
        }
    }

    pub fn into_set(self) -> Result<Vec<Value>, ConversionError> {
        match self {
            Self::Set(items) => Ok(items),
            other => Err(ConversionError::TypeMismatch {
                expected: "set",
                found: other.kind(),
            }),
        }
    }
}

macro_rules! value_from {
    ($variant:ident: $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Self::$variant(value.into())
                }
            }
        )*
    };
}

value_from!(Int: i8, i16, i32, i64);
value_from!(UInt: u8, u16, u32, u64);
value_from!(Float: f32, f64);
value_from!(String: String, &str);
value_from!(Bytes: Vec<u8>, &[u8]);

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Self::String(value.to_string())
    }
}

// ============================================================================
// Numbers
// ============================================================================

/// Formats a numeric value the way the store expects it.
pub fn format_number(value: &Value) -> Result<String, ConversionError> {
    match value {
        Value::Int(i) => Ok(i.to_string()),
        Value::UInt(u) => Ok(u.to_string()),
        Value::Float(f) if f.is_finite() => Ok(f.to_string()),
        Value::Float(_) => Err(ConversionError::NonFiniteNumber),
        other => Err(ConversionError::TypeMismatch {
            expected: "number",
            found: other.kind(),
        }),
    }
}

/// Parses a store number into the narrowest fitting value.
pub fn parse_number(raw: &str) -> Result<Value, ConversionError> {
    let raw = raw.trim();
    if let Ok(i) = raw.parse::<i64>() {
        return Ok(Value::Int(i));
    }
    if let Ok(u) = raw.parse::<u64>() {
        return Ok(Value::UInt(u));
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() => Ok(Value::Float(f)),
        _ => Err(ConversionError::InvalidNumber(raw.to_string())),
    }
}

// ============================================================================
// Value -> AttributeValue
// ============================================================================

/// Converts a value into the attribute for a field tagged `store_type`.
///
/// Returns `None` for values the store cannot hold and which are therefore
/// omitted from the item: nulls and empty sets.
pub fn to_attribute(
    value: Value,
    store_type: StoreType,
) -> Result<Option<AttributeValue>, ConversionError> {
    let mismatch = |found: &Value| ConversionError::TypeMismatch {
        expected: store_type.descriptor(),
        found: found.kind(),
    };

    let attribute = match (store_type, value) {
        (_, Value::Null) => return Ok(None),
        (StoreType::String, Value::String(s)) => AttributeValue::S(s),
        (StoreType::Number, value) if value.is_number() => AttributeValue::N(format_number(&value)?),
        (StoreType::Binary, Value::Bytes(b)) => AttributeValue::B(b),
        (StoreType::Bool, Value::Bool(b)) => AttributeValue::Bool(b),
        (StoreType::StringSet, Value::Set(items)) => {
            if items.is_empty() {
                return Ok(None);
            }
            AttributeValue::Ss(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(s) => Ok(s),
                        _ => Err(ConversionError::MixedSet {
                            expected: store_type,
                        }),
                    })
                    .collect::<Result<_, _>>()?,
            )
        }
        (StoreType::NumberSet, Value::Set(items)) => {
            if items.is_empty() {
                return Ok(None);
            }
            AttributeValue::Ns(
                items
                    .iter()
                    .map(|item| {
                        if item.is_number() {
                            format_number(item)
                        } else {
                            Err(ConversionError::MixedSet {
                                expected: store_type,
                            })
                        }
                    })
                    .collect::<Result<_, _>>()?,
            )
        }
        (StoreType::BinarySet, Value::Set(items)) => {
            if items.is_empty() {
                return Ok(None);
            }
            AttributeValue::Bs(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::Bytes(b) => Ok(b),
                        _ => Err(ConversionError::MixedSet {
                            expected: store_type,
                        }),
                    })
                    .collect::<Result<_, _>>()?,
            )
        }
        (StoreType::Map, Value::Map(entries)) => AttributeValue::M(map_to_attributes(entries)?),
        (_, value) => return Err(mismatch(&value)),
    };

    Ok(Some(attribute))
}

/// Store type a value maps to when no field declaration is available, as
/// for the contents of nested maps.
pub fn infer_store_type(value: &Value) -> Result<Option<StoreType>, ConversionError> {
    let store_type = match value {
        Value::Null => return Ok(None),
        Value::Bool(_) => StoreType::Bool,
        Value::Int(_) | Value::UInt(_) | Value::Float(_) => StoreType::Number,
        Value::String(_) => StoreType::String,
        Value::Bytes(_) => StoreType::Binary,
        Value::Map(_) => StoreType::Map,
        Value::Set(items) => match items.first() {
            None => return Ok(None),
            Some(Value::String(_)) => StoreType::StringSet,
            Some(Value::Bytes(_)) => StoreType::BinarySet,
            Some(first) if first.is_number() => StoreType::NumberSet,
            Some(other) => {
                return Err(ConversionError::Unsupported(format!(
                    "set of {}",
                    other.kind()
                )))
            }
        },
    };
    Ok(Some(store_type))
}

fn map_to_attributes(
    entries: BTreeMap<String, Value>,
) -> Result<HashMap<String, AttributeValue>, ConversionError> {
    let mut attributes = HashMap::with_capacity(entries.len());
    for (name, value) in entries {
        let Some(store_type) = infer_store_type(&value).map_err(|e| e.in_field(&name))? else {
            continue;
        };
        if let Some(attribute) = to_attribute(value, store_type).map_err(|e| e.in_field(&name))? {
            attributes.insert(name, attribute);
        }
    }
    Ok(attributes)
}

// ============================================================================
// AttributeValue -> Value
// ============================================================================

/// Reads an attribute of a field tagged `store_type`.
pub fn from_attribute(
    attribute: &AttributeValue,
    store_type: StoreType,
) -> Result<Value, ConversionError> {
    match (store_type, attribute) {
        (_, AttributeValue::Null(_)) => Ok(Value::Null),
        (StoreType::String, AttributeValue::S(_))
        | (StoreType::Number, AttributeValue::N(_))
        | (StoreType::Binary, AttributeValue::B(_))
        | (StoreType::Bool, AttributeValue::Bool(_))
        | (StoreType::StringSet, AttributeValue::Ss(_))
        | (StoreType::NumberSet, AttributeValue::Ns(_))
        | (StoreType::BinarySet, AttributeValue::Bs(_))
        | (StoreType::Map, AttributeValue::M(_)) => infer_value(attribute),
        (_, other) => Err(ConversionError::TypeMismatch {
            expected: store_type.descriptor(),
            found: other.type_descriptor(),
        }),
    }
}

/// Reads an attribute without a declared type.
pub fn infer_value(attribute: &AttributeValue) -> Result<Value, ConversionError> {
    let value = match attribute {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => parse_number(n)?,
        AttributeValue::B(b) => Value::Bytes(b.clone()),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Ss(items) => Value::Set(items.iter().cloned().map(Value::String).collect()),
        AttributeValue::Ns(items) => Value::Set(
            items
                .iter()
                .map(|n| parse_number(n))
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::Bs(items) => Value::Set(items.iter().cloned().map(Value::Bytes).collect()),
        AttributeValue::M(entries) => Value::Map(
            entries
                .iter()
                .map(|(name, attribute)| {
                    infer_value(attribute)
                        .map(|value| (name.clone(), value))
                        .map_err(|e| e.in_field(name))
                })
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::L(_) => {
            return Err(ConversionError::Unsupported(
                "list attributes have no native mapping".to_string(),
            ))
        }
        AttributeValue::Null(_) => Value::Null,
    };
    Ok(value)
}
