use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{ConversionError, Value};
use crate::schema::StoreType;

/// Converts a type the fixed type table does not know about.
///
/// Registered per type on the [`SchemaRegistry`](crate::schema::SchemaRegistry);
/// fields declared with `custom::<T>()` use it. Implementations must satisfy
/// `from_value(to_value(x)) == x` for the values they accept.
pub trait TypeConverter<T>: Send + Sync {
    /// Store type tag of the produced values.
    fn store_type(&self) -> StoreType;

    fn to_value(&self, value: &T) -> Result<Value, ConversionError>;

    fn from_value(&self, value: Value) -> Result<T, ConversionError>;
}

/// Stores any serde type as a JSON string attribute.
pub struct JsonConverter<T>(PhantomData<fn() -> T>);

impl<T> JsonConverter<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for JsonConverter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TypeConverter<T> for JsonConverter<T>
where
    T: Serialize + DeserializeOwned,
{
    fn store_type(&self) -> StoreType {
        StoreType::String
    }

    fn to_value(&self, value: &T) -> Result<Value, ConversionError> {
        serde_json::to_string(value)
            .map(Value::String)
            .map_err(ConversionError::custom)
    }

    fn from_value(&self, value: Value) -> Result<T, ConversionError> {
        let json = value.into_string()?;
        serde_json::from_str(&json).map_err(ConversionError::custom)
    }
}
