mod error;
mod paging;
mod traits;
mod types;

pub use error::{codes, ErrorClass, StoreError, StoreResult};
pub use paging::{Page, PagedRequest};
pub use traits::StoreClient;
pub use types::{
    AttributeValue, BatchGetOutput, BatchGetRequest, BatchWriteOutput, BatchWriteRequest,
    Condition, CreateTableRequest, DeleteItemRequest, GetItemRequest, Item, ItemPage,
    KeyAttribute, KeyCondition, ListTablesRequest, PutItemRequest, QueryRequest, RangeCondition,
    ReturnValues, ScalarType, ScanRequest, TableDescription, TableNamePage, TableStatus,
    UpdateAction, UpdateItemRequest, WriteRequest,
};
