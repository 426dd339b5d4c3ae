//! Resilient record mapping over hash+range key-value stores.
//!
//! This crate provides:
//! - A [`Mapper`] for typed CRUD, batch, scan and query operations
//! - Retry with exponential backoff under a time budget ([`Executor`])
//! - Windowed batch reads and writes ([`BatchOperator`])
//! - Lazy, limit-aware pagination ([`paginate`])
//! - Table creation and readiness polling ([`TableLifecycle`])
//! - An in-memory store and, behind the `dynamodb` feature, a DynamoDB store

pub mod batch;
pub mod config;
pub mod executor;
pub mod lifecycle;
pub mod mapper;
pub mod pagination;
pub mod storage;

pub use batch::{BatchOperator, BatchWriteSummary};
pub use config::Config;
pub use executor::Executor;
pub use lifecycle::{Cancellation, TableLifecycle, WaitReport};
pub use mapper::{KeyRange, Mapper, Query, ScanOptions};
pub use pagination::paginate;
#[cfg(feature = "dynamodb")]
pub use storage::DynamoDbStore;
pub use storage::InMemoryStore;

pub use dynamap_core::batch::BatchLimits;
pub use dynamap_core::convert::{RecordKey, Value};
pub use dynamap_core::retry::RetryPolicy;
pub use dynamap_core::schema::{Record, Registration, SchemaBuilder, SchemaRegistry, TableSchema};
pub use dynamap_core::store::{Condition, StoreClient, StoreError};
pub use dynamap_core::{Error, Result};
