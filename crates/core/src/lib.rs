//! Functional core of dynamap.
//!
//! Everything in this crate is free of I/O: the store protocol types and the
//! [`store::StoreClient`] trait, the record metadata registry, the value
//! converter, retry classification and batch windowing. The async shell in
//! the `dynamap` crate drives these against a real store.

pub mod batch;
pub mod convert;
pub mod error;
pub mod retry;
pub mod schema;
pub mod store;

pub use error::{Error, Result};
