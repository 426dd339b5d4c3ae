use std::fmt;

use crate::store::ScalarType;

/// Store-side type tag of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreType {
    String,
    Number,
    Binary,
    Bool,
    StringSet,
    NumberSet,
    BinarySet,
    Map,
}

impl StoreType {
    /// The store's short descriptor (`S`, `N`, `B`, `BOOL`, `SS`, `NS`, `BS`, `M`).
    pub fn descriptor(self) -> &'static str {
        match self {
            Self::String => "S",
            Self::Number => "N",
            Self::Binary => "B",
            Self::Bool => "BOOL",
            Self::StringSet => "SS",
            Self::NumberSet => "NS",
            Self::BinarySet => "BS",
            Self::Map => "M",
        }
    }

    /// The scalar type used to declare a key attribute, if this tag can be one.
    pub fn scalar(self) -> Option<ScalarType> {
        match self {
            Self::String => Some(ScalarType::S),
            Self::Number => Some(ScalarType::N),
            Self::Binary => Some(ScalarType::B),
            _ => None,
        }
    }
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor())
    }
}

/// Declared native type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    Bool,
    Integer,
    Float,
    String,
    Bytes,
    Uuid,
    Timestamp,
    StringSet,
    NumberSet,
    BytesSet,
    /// Another record stored as a map.
    Nested,
    /// A type handled by a registered converter.
    Custom,
}

impl NativeType {
    pub fn is_integer(self) -> bool {
        self == Self::Integer
    }
}

/// The fixed type table. Custom types have no entry.
pub fn store_type_for(native: NativeType) -> Option<StoreType> {
    let store_type = match native {
        NativeType::Bool => StoreType::Bool,
        NativeType::Integer | NativeType::Float => StoreType::Number,
        NativeType::String | NativeType::Uuid | NativeType::Timestamp => StoreType::String,
        NativeType::Bytes => StoreType::Binary,
        NativeType::StringSet => StoreType::StringSet,
        NativeType::NumberSet => StoreType::NumberSet,
        NativeType::BytesSet => StoreType::BinarySet,
        NativeType::Nested => StoreType::Map,
        NativeType::Custom => return None,
    };
    Some(store_type)
}
