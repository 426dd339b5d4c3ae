use thiserror::Error;

/// Well-known store error codes.
pub mod codes {
    pub const CONDITIONAL_CHECK_FAILED: &str = "ConditionalCheckFailedException";
    pub const INTERNAL_SERVER_ERROR: &str = "InternalServerError";
    pub const PROVISIONED_THROUGHPUT_EXCEEDED: &str = "ProvisionedThroughputExceededException";
    pub const REQUEST_LIMIT_EXCEEDED: &str = "RequestLimitExceeded";
    pub const RESOURCE_IN_USE: &str = "ResourceInUseException";
    pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";
    pub const SERVICE_UNAVAILABLE: &str = "ServiceUnavailable";
    pub const THROTTLING: &str = "ThrottlingException";
    pub const TRANSACTION_CONFLICT: &str = "TransactionConflictException";
    pub const VALIDATION: &str = "ValidationException";
}

/// Broad class of a store failure.
///
/// `Client` means the store rejected the request itself (HTTP 4xx). Note that
/// throttling is reported by the store as a client error; whether it is
/// retried depends on the retry policy's code list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Client,
    Server,
    Transport,
}

/// An error returned by a [`StoreClient`](super::StoreClient) call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct StoreError {
    pub class: ErrorClass,
    pub code: String,
    pub message: String,
}

impl StoreError {
    pub fn new(class: ErrorClass, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn client(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Client, code, message)
    }

    pub fn server(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Server, code, message)
    }

    pub fn transport(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Transport, code, message)
    }

    /// Shorthand for a `ValidationException`.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::client(codes::VALIDATION, message)
    }

    /// Shorthand for a `ResourceNotFoundException` naming a table.
    pub fn table_not_found(table_name: &str) -> Self {
        Self::client(
            codes::RESOURCE_NOT_FOUND,
            format!("Requested resource not found: Table: {table_name} not found"),
        )
    }

    pub fn is_client(&self) -> bool {
        self.class == ErrorClass::Client
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.code == code
    }
}

/// Result type for store calls.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let error = StoreError::client(codes::VALIDATION, "key is missing");
        assert_eq!(error.to_string(), "ValidationException: key is missing");
    }

    #[test]
    fn test_table_not_found_is_client_class() {
        let error = StoreError::table_not_found("orders");

        assert!(error.is_client());
        assert!(error.has_code(codes::RESOURCE_NOT_FOUND));
        assert!(error.message.contains("orders"));
    }

    #[test]
    fn test_server_error_is_not_client() {
        let error = StoreError::server(codes::INTERNAL_SERVER_ERROR, "boom");
        assert!(!error.is_client());
    }
}
