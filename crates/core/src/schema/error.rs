use thiserror::Error;

/// Errors raised while building or resolving record schemas.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Type {0} is not registered as a table")]
    TableNotRegistered(String),
    #[error("Table schema {0} has no hash key")]
    MissingHashKey(String),
    #[error("Type {type_name} declares more than one {role} key")]
    DuplicateKey {
        type_name: String,
        role: &'static str,
    },
    #[error("Type {type_name} declares field {field} more than once")]
    DuplicateField { type_name: String, field: String },
    #[error("Field {field} has unsupported type {type_name}; register a converter for it")]
    UnsupportedType { field: String, type_name: String },
    #[error("Key field {field} must be a scalar string, number or binary, found {store_type}")]
    InvalidKeyType { field: String, store_type: String },
    #[error("Field {field} cannot auto-increment: {reason}")]
    InvalidAutoIncrement { field: String, reason: &'static str },
    #[error("Type {type_name} has no field {field}")]
    UnknownField { type_name: String, field: String },
    #[error("Type {0} contains itself")]
    RecursiveType(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_display() {
        assert_eq!(
            SchemaError::TableNotRegistered("Order".to_string()).to_string(),
            "Type Order is not registered as a table"
        );
        assert_eq!(
            SchemaError::DuplicateKey {
                type_name: "Order".to_string(),
                role: "hash",
            }
            .to_string(),
            "Type Order declares more than one hash key"
        );
    }
}
