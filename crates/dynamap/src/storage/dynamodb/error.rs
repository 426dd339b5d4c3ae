//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to [`StoreError`]. Service errors keep their error
//! code; failures that never reached the service are transport errors.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::{BuildError, DisplayErrorContext, ProvideErrorMetadata, SdkError};

use dynamap_core::store::{codes, ErrorClass, StoreError};

/// Error codes DynamoDB returns for failures on its side.
const SERVER_CODES: &[&str] = &[
    codes::INTERNAL_SERVER_ERROR,
    codes::SERVICE_UNAVAILABLE,
    "InternalFailure",
];

/// Class of a service error by its code.
pub fn service_error_class(code: &str) -> ErrorClass {
    if SERVER_CODES.contains(&code) {
        ErrorClass::Server
    } else {
        ErrorClass::Client
    }
}

/// Map any SDK operation error to a StoreError.
pub fn map_sdk_error<E, R>(op: &'static str, err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: Debug + Send + Sync + 'static,
{
    let error = match &err {
        SdkError::ServiceError(service) => {
            let code = service.err().code().unwrap_or("UnknownServiceError");
            let message = service.err().message().unwrap_or_default();
            StoreError::new(service_error_class(code), code, message)
        }
        SdkError::ConstructionFailure(_) => StoreError::validation(format!(
            "{op} request could not be built: {}",
            DisplayErrorContext(&err)
        )),
        SdkError::TimeoutError(_) => {
            StoreError::transport("TimeoutError", format!("{op} timed out"))
        }
        SdkError::DispatchFailure(_) => StoreError::transport(
            "DispatchFailure",
            format!("{op} could not be sent: {}", DisplayErrorContext(&err)),
        ),
        SdkError::ResponseError(_) => StoreError::transport(
            "ResponseError",
            format!("{op} response was invalid: {}", DisplayErrorContext(&err)),
        ),
        _ => StoreError::transport("Unknown", format!("{op} failed: {}", DisplayErrorContext(&err))),
    };

    tracing::debug!(op, code = %error.code, class = ?error.class, "DynamoDB call failed");
    error
}

/// Map a request builder error (missing required field) to a StoreError.
pub fn map_build_error(err: BuildError) -> StoreError {
    StoreError::validation(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttling_is_client_class() {
        assert_eq!(service_error_class(codes::THROTTLING), ErrorClass::Client);
        assert_eq!(
            service_error_class(codes::PROVISIONED_THROUGHPUT_EXCEEDED),
            ErrorClass::Client
        );
    }

    #[test]
    fn test_internal_errors_are_server_class() {
        assert_eq!(
            service_error_class(codes::INTERNAL_SERVER_ERROR),
            ErrorClass::Server
        );
        assert_eq!(service_error_class(codes::SERVICE_UNAVAILABLE), ErrorClass::Server);
    }
}
