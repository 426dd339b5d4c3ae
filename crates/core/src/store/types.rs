//! Store protocol types.
//!
//! These mirror the request/response shapes of a hash+range key-value store
//! without tying the core to any SDK. Backends translate them to their own
//! wire types.

use std::collections::HashMap;

/// A typed attribute value as stored by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    S(String),
    N(String),
    B(Vec<u8>),
    Bool(bool),
    Ss(Vec<String>),
    Ns(Vec<String>),
    Bs(Vec<Vec<u8>>),
    M(HashMap<String, AttributeValue>),
    L(Vec<AttributeValue>),
    Null(bool),
}

impl AttributeValue {
    pub fn as_s(&self) -> Option<&str> {
        match self {
            Self::S(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_n(&self) -> Option<&str> {
        match self {
            Self::N(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_b(&self) -> Option<&[u8]> {
        match self {
            Self::B(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Short type descriptor used in error messages (`S`, `N`, `SS`, ...).
    pub fn type_descriptor(&self) -> &'static str {
        match self {
            Self::S(_) => "S",
            Self::N(_) => "N",
            Self::B(_) => "B",
            Self::Bool(_) => "BOOL",
            Self::Ss(_) => "SS",
            Self::Ns(_) => "NS",
            Self::Bs(_) => "BS",
            Self::M(_) => "M",
            Self::L(_) => "L",
            Self::Null(_) => "NULL",
        }
    }
}

/// An item (or key) as an attribute map.
pub type Item = HashMap<String, AttributeValue>;

/// Scalar attribute types allowed for key attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    S,
    N,
    B,
}

/// A key attribute declaration used when creating tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
    pub scalar: ScalarType,
}

impl KeyAttribute {
    pub fn new(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self {
            name: name.into(),
            scalar,
        }
    }
}

/// Condition attached to a write; a failed condition is reported by the
/// store as `ConditionalCheckFailedException`.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    AttributeExists(String),
    AttributeNotExists(String),
    Equals(String, AttributeValue),
}

// ============================================================================
// Single-item requests
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct GetItemRequest {
    pub table_name: String,
    pub key: Item,
    pub consistent_read: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PutItemRequest {
    pub table_name: String,
    pub item: Item,
    pub condition: Option<Condition>,
}

/// One clause of an update expression.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateAction {
    Set { name: String, value: AttributeValue },
    Remove { name: String },
    /// Atomic numeric add (or set union for set attributes).
    Add { name: String, value: AttributeValue },
}

impl UpdateAction {
    pub fn name(&self) -> &str {
        match self {
            Self::Set { name, .. } | Self::Remove { name } | Self::Add { name, .. } => name,
        }
    }
}

/// Which attributes an update returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnValues {
    #[default]
    None,
    AllNew,
    UpdatedNew,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateItemRequest {
    pub table_name: String,
    pub key: Item,
    pub actions: Vec<UpdateAction>,
    pub condition: Option<Condition>,
    pub return_values: ReturnValues,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteItemRequest {
    pub table_name: String,
    pub key: Item,
    pub condition: Option<Condition>,
}

// ============================================================================
// Batch requests
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct BatchGetRequest {
    pub table_name: String,
    pub keys: Vec<Item>,
    pub consistent_read: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchGetOutput {
    pub items: Vec<Item>,
    pub unprocessed_keys: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteRequest {
    Put(Item),
    Delete(Item),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchWriteRequest {
    pub table_name: String,
    pub writes: Vec<WriteRequest>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchWriteOutput {
    pub unprocessed: Vec<WriteRequest>,
}

// ============================================================================
// Scan / query
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanRequest {
    pub table_name: String,
    pub index_name: Option<String>,
    pub page_size: Option<u32>,
    pub consistent_read: bool,
    pub exclusive_start_key: Option<Item>,
}

/// Condition on the range key of a query.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeCondition {
    Eq(AttributeValue),
    Lt(AttributeValue),
    Le(AttributeValue),
    Gt(AttributeValue),
    Ge(AttributeValue),
    Between(AttributeValue, AttributeValue),
    BeginsWith(AttributeValue),
}

/// Key condition of a query: hash equality plus an optional range condition.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyCondition {
    pub hash_name: String,
    pub hash_value: AttributeValue,
    pub range: Option<(String, RangeCondition)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub table_name: String,
    pub index_name: Option<String>,
    pub key_condition: KeyCondition,
    pub scan_forward: bool,
    pub page_size: Option<u32>,
    pub consistent_read: bool,
    pub exclusive_start_key: Option<Item>,
}

/// One page of a scan or query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemPage {
    pub items: Vec<Item>,
    pub last_evaluated_key: Option<Item>,
}

// ============================================================================
// Tables
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableRequest {
    pub table_name: String,
    pub hash_key: KeyAttribute,
    pub range_key: Option<KeyAttribute>,
}

/// Table status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Active,
    Creating,
    Updating,
    Deleting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescription {
    pub table_name: String,
    pub status: TableStatus,
}

impl TableDescription {
    pub fn is_ready(&self) -> bool {
        self.status == TableStatus::Active
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListTablesRequest {
    pub exclusive_start_table_name: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableNamePage {
    pub table_names: Vec<String>,
    pub last_evaluated_table_name: Option<String>,
}
