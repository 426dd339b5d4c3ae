//! Scan and query parameters.

use dynamap_core::convert::Value;

/// Parameters of [`Mapper::scan`](super::Mapper::scan).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Scan a secondary index instead of the table.
    pub index_name: Option<String>,
    /// Stop after this many records.
    pub limit: Option<usize>,
    /// Records fetched per store call.
    pub page_size: Option<u32>,
    /// Overrides the configured read consistency.
    pub consistent_read: Option<bool>,
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.index_name = Some(name.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn consistent_read(mut self, consistent_read: bool) -> Self {
        self.consistent_read = Some(consistent_read);
        self
    }
}

/// Condition on the range key of a query.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyRange {
    Eq(Value),
    Lt(Value),
    Le(Value),
    Gt(Value),
    Ge(Value),
    Between(Value, Value),
    BeginsWith(Value),
}

/// Secondary index addressed by a query, with the record fields acting as
/// its keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IndexKeys {
    pub name: String,
    pub hash_field: String,
    pub range_field: Option<String>,
}

/// A key-condition query for [`Mapper::query`](super::Mapper::query).
///
/// ```ignore
/// let query = Query::new("ana")
///     .range(KeyRange::Between(10.into(), 20.into()))
///     .descending()
///     .limit(5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub(crate) hash: Value,
    pub(crate) range: Option<KeyRange>,
    pub(crate) index: Option<IndexKeys>,
    pub(crate) scan_forward: bool,
    pub(crate) limit: Option<usize>,
    pub(crate) page_size: Option<u32>,
    pub(crate) consistent_read: Option<bool>,
}

impl Query {
    /// Queries the partition holding `hash`.
    pub fn new(hash: impl Into<Value>) -> Self {
        Self {
            hash: hash.into(),
            range: None,
            index: None,
            scan_forward: true,
            limit: None,
            page_size: None,
            consistent_read: None,
        }
    }

    pub fn range(mut self, range: KeyRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Queries a secondary index keyed by the given record fields.
    pub fn index(
        mut self,
        name: impl Into<String>,
        hash_field: impl Into<String>,
        range_field: Option<&str>,
    ) -> Self {
        self.index = Some(IndexKeys {
            name: name.into(),
            hash_field: hash_field.into(),
            range_field: range_field.map(str::to_string),
        });
        self
    }

    /// Returns records in descending range key order.
    pub fn descending(mut self) -> Self {
        self.scan_forward = false;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn consistent_read(mut self, consistent_read: bool) -> Self {
        self.consistent_read = Some(consistent_read);
        self
    }
}
