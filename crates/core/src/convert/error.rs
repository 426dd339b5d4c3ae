use thiserror::Error;

use crate::schema::StoreType;

/// Errors raised while converting between record values and store attributes.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConversionError {
    #[error("Key shape mismatch for table {table}: {reason}")]
    KeyShapeMismatch { table: String, reason: &'static str },
    #[error("Set elements do not all fit {expected}")]
    MixedSet { expected: StoreType },
    #[error("Expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("Invalid number: {0:?}")]
    InvalidNumber(String),
    #[error("Number is not finite")]
    NonFiniteNumber,
    #[error("{value} is out of range for {target}")]
    OutOfRange { value: String, target: &'static str },
    #[error("Unsupported attribute: {0}")]
    Unsupported(String),
    #[error("{0}")]
    Custom(String),
    #[error("Field {field}: {source}")]
    Field {
        field: String,
        #[source]
        source: Box<ConversionError>,
    },
}

impl ConversionError {
    /// Attaches the field name to an error raised while converting it.
    pub fn in_field(self, field: &str) -> Self {
        match self {
            Self::Field {
                field: inner,
                source,
            } => Self::Field {
                field: format!("{field}.{inner}"),
                source,
            },
            Self::KeyShapeMismatch { .. } => self,
            other => Self::Field {
                field: field.to_string(),
                source: Box::new(other),
            },
        }
    }

    pub fn custom(message: impl std::fmt::Display) -> Self {
        Self::Custom(message.to_string())
    }
}
