//! Attribute value conversion between the store protocol and the SDK.
//!
//! Pure functions, testable without DynamoDB access.

use std::collections::HashMap;

use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue as AwsValue;

use dynamap_core::store::{AttributeValue, Item, StoreError, StoreResult};

/// SDK item map.
pub type AwsItem = HashMap<String, AwsValue>;

pub fn to_aws(value: AttributeValue) -> AwsValue {
    match value {
        AttributeValue::S(s) => AwsValue::S(s),
        AttributeValue::N(n) => AwsValue::N(n),
        AttributeValue::B(b) => AwsValue::B(Blob::new(b)),
        AttributeValue::Bool(b) => AwsValue::Bool(b),
        AttributeValue::Ss(ss) => AwsValue::Ss(ss),
        AttributeValue::Ns(ns) => AwsValue::Ns(ns),
        AttributeValue::Bs(bs) => AwsValue::Bs(bs.into_iter().map(Blob::new).collect()),
        AttributeValue::M(m) => AwsValue::M(item_to_aws(m)),
        AttributeValue::L(l) => AwsValue::L(l.into_iter().map(to_aws).collect()),
        AttributeValue::Null(n) => AwsValue::Null(n),
    }
}

pub fn from_aws(value: AwsValue) -> StoreResult<AttributeValue> {
    let value = match value {
        AwsValue::S(s) => AttributeValue::S(s),
        AwsValue::N(n) => AttributeValue::N(n),
        AwsValue::B(b) => AttributeValue::B(b.into_inner()),
        AwsValue::Bool(b) => AttributeValue::Bool(b),
        AwsValue::Ss(ss) => AttributeValue::Ss(ss),
        AwsValue::Ns(ns) => AttributeValue::Ns(ns),
        AwsValue::Bs(bs) => AttributeValue::Bs(bs.into_iter().map(Blob::into_inner).collect()),
        AwsValue::M(m) => AttributeValue::M(item_from_aws(m)?),
        AwsValue::L(l) => {
            AttributeValue::L(l.into_iter().map(from_aws).collect::<StoreResult<_>>()?)
        }
        AwsValue::Null(n) => AttributeValue::Null(n),
        other => {
            return Err(StoreError::validation(format!(
                "Unsupported attribute value from DynamoDB: {other:?}"
            )))
        }
    };
    Ok(value)
}

pub fn item_to_aws(item: Item) -> AwsItem {
    item.into_iter()
        .map(|(name, value)| (name, to_aws(value)))
        .collect()
}

pub fn item_from_aws(item: AwsItem) -> StoreResult<Item> {
    item.into_iter()
        .map(|(name, value)| from_aws(value).map(|value| (name, value)))
        .collect()
}

pub fn items_from_aws(items: Vec<AwsItem>) -> StoreResult<Vec<Item>> {
    items.into_iter().map(item_from_aws).collect()
}
