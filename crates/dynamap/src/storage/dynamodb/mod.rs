//! DynamoDB storage backend.
//!
//! Translates the store protocol types to `aws-sdk-dynamodb` calls. Every
//! SDK error is mapped to a [`StoreError`](dynamap_core::store::StoreError)
//! carrying the service error code, so retry decisions never look at SDK
//! types.

mod conversions;
mod error;
mod expressions;
mod store;

pub use store::DynamoDbStore;
