//! Store backend implementations.
//!
//! Both backends implement [`StoreClient`](dynamap_core::store::StoreClient):
//!
//! - `memory` (always available): in-memory tables for tests and development
//! - `dynamodb` (feature `dynamodb`): AWS DynamoDB using `aws-sdk-dynamodb`
//!
//! Build with DynamoDB:
//! ```bash
//! cargo build -p dynamap --features dynamodb
//! ```

pub mod memory;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

pub use memory::InMemoryStore;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbStore;
