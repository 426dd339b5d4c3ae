//! Record metadata: how each record type maps onto a store table.
//!
//! Record types implement [`Record`] and declare their fields on a
//! [`SchemaBuilder`]. The [`SchemaRegistry`] builds each schema once and
//! caches it for its own lifetime.

mod builder;
mod error;
mod native;
mod registry;
mod table;
mod types;

pub use builder::SchemaBuilder;
pub use error::SchemaError;
pub use native::{NativeField, SetElement};
pub use registry::{Registration, SchemaRegistry};
pub use table::{FieldSchema, Record, TableDef, TableSchema};
pub use types::{store_type_for, NativeType, StoreType};

#[cfg(test)]
pub(crate) mod fixtures {
    //! Record types shared by the core tests.

    use std::collections::{BTreeSet, HashSet};

    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    use super::{Record, SchemaBuilder};

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Order {
        pub id: i64,
        pub status: String,
    }

    impl Record for Order {
        fn describe(schema: &mut SchemaBuilder<'_, Self>) {
            schema
                .hash_key("Id", |o| &o.id, |o| &mut o.id)
                .field("Status", |o| &o.status, |o| &mut o.status);
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Address {
        pub city: String,
        pub zip: u32,
        pub tags: BTreeSet<String>,
    }

    impl Record for Address {
        fn describe(schema: &mut SchemaBuilder<'_, Self>) {
            schema
                .field("City", |a| &a.city, |a| &mut a.city)
                .field("Zip", |a| &a.zip, |a| &mut a.zip)
                .field("Tags", |a| &a.tags, |a| &mut a.tags);
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Dimensions {
        pub width: u32,
        pub height: u32,
    }

    impl Default for Dimensions {
        fn default() -> Self {
            Self {
                width: 1,
                height: 1,
            }
        }
    }

    /// Touches every entry of the type table.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Everything {
        pub owner: String,
        pub seq: u64,
        pub flag: bool,
        pub small: i8,
        pub count: i32,
        pub big: u64,
        pub ratio: f64,
        pub weight: f32,
        pub blob: Vec<u8>,
        pub id: Uuid,
        pub at: DateTime<Utc>,
        pub labels: HashSet<String>,
        pub scores: BTreeSet<i64>,
        pub chunks: HashSet<Vec<u8>>,
        pub note: Option<String>,
        pub rank: Option<u32>,
        pub address: Address,
    }

    impl Record for Everything {
        fn describe(schema: &mut SchemaBuilder<'_, Self>) {
            schema
                .alias("everything")
                .hash_key("Owner", |e| &e.owner, |e| &mut e.owner)
                .range_key("Seq", |e| &e.seq, |e| &mut e.seq)
                .field("Flag", |e| &e.flag, |e| &mut e.flag)
                .field("Small", |e| &e.small, |e| &mut e.small)
                .field("Count", |e| &e.count, |e| &mut e.count)
                .field("Big", |e| &e.big, |e| &mut e.big)
                .field("Ratio", |e| &e.ratio, |e| &mut e.ratio)
                .field("Weight", |e| &e.weight, |e| &mut e.weight)
                .field("Blob", |e| &e.blob, |e| &mut e.blob)
                .field("Uid", |e| &e.id, |e| &mut e.id)
                .field("At", |e| &e.at, |e| &mut e.at)
                .field("Labels", |e| &e.labels, |e| &mut e.labels)
                .field("Scores", |e| &e.scores, |e| &mut e.scores)
                .field("Chunks", |e| &e.chunks, |e| &mut e.chunks)
                .field("Note", |e| &e.note, |e| &mut e.note)
                .field("Rank", |e| &e.rank, |e| &mut e.rank)
                .nested("Address", |e| &e.address, |e| &mut e.address);
        }
    }

    /// Uses a custom converter for `Dimensions`.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Photo {
        pub id: String,
        pub size: Dimensions,
    }

    impl Record for Photo {
        fn describe(schema: &mut SchemaBuilder<'_, Self>) {
            schema
                .hash_key("Id", |p| &p.id, |p| &mut p.id)
                .custom("Size", |p| &p.size, |p| &mut p.size);
        }
    }
}
