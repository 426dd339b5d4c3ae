//! Conversion between records and store items.
//!
//! Every field is converted on its own, using the store type tag from its
//! [`FieldSchema`]. These functions are pure and know nothing about the
//! store connection.

mod converter;
mod error;
mod value;

use crate::schema::{FieldSchema, TableSchema};
use crate::store::{AttributeValue, Item, UpdateAction};

pub use converter::{JsonConverter, TypeConverter};
pub use error::ConversionError;
pub use value::{
    format_number, from_attribute, infer_store_type, infer_value, parse_number, to_attribute,
    Value,
};

/// The key of one item: a hash value and, for tables with a range key, a
/// range value.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordKey {
    pub hash: Value,
    pub range: Option<Value>,
}

impl RecordKey {
    pub fn new(hash: impl Into<Value>) -> Self {
        Self {
            hash: hash.into(),
            range: None,
        }
    }

    pub fn with_range(mut self, range: impl Into<Value>) -> Self {
        self.range = Some(range.into());
        self
    }
}

/// Converts a record into a full store item. Null fields and empty sets
/// are left out.
pub fn to_store_item<R>(record: &R, schema: &TableSchema<R>) -> Result<Item, ConversionError> {
    let mut item = Item::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let value = field.read(record)?;
        if let Some(attribute) = field_attribute(field, value)? {
            item.insert(field.name.clone(), attribute);
        }
    }
    Ok(item)
}

/// Builds a record from a store item. Attributes the schema does not know
/// are ignored; fields missing from the item keep their default value.
pub fn from_store_item<R: Default>(
    schema: &TableSchema<R>,
    item: &Item,
) -> Result<R, ConversionError> {
    let mut record = R::default();
    for field in schema.fields() {
        let Some(attribute) = item.get(&field.name) else {
            continue;
        };
        let value =
            from_attribute(attribute, field.store_type).map_err(|e| e.in_field(&field.name))?;
        if value.is_null() && !field.optional {
            continue;
        }
        field.write(&mut record, value)?;
    }
    Ok(record)
}

/// Builds the key item for `hash` and optional `range`.
///
/// The range value must be present exactly when the schema declares a
/// range key.
pub fn to_store_key<R>(
    schema: &TableSchema<R>,
    hash: Value,
    range: Option<Value>,
) -> Result<Item, ConversionError> {
    let mismatch = |reason| ConversionError::KeyShapeMismatch {
        table: schema.table_name.clone(),
        reason,
    };

    let hash_field = schema
        .hash_key()
        .ok_or_else(|| mismatch("schema has no hash key"))?;

    let mut key = Item::with_capacity(2);
    key.insert(
        hash_field.name.clone(),
        field_attribute(hash_field, hash)?.ok_or_else(|| mismatch("hash value is missing"))?,
    );

    match (schema.range_key(), range) {
        (Some(range_field), Some(range)) => {
            let attribute = field_attribute(range_field, range)?
                .ok_or_else(|| mismatch("range value is missing"))?;
            key.insert(range_field.name.clone(), attribute);
        }
        (Some(_), None) => return Err(mismatch("range value is required")),
        (None, Some(_)) => return Err(mismatch("schema has no range key")),
        (None, None) => {}
    }

    Ok(key)
}

/// Key item for a [`RecordKey`].
pub fn record_key_item<R>(
    schema: &TableSchema<R>,
    key: &RecordKey,
) -> Result<Item, ConversionError> {
    to_store_key(schema, key.hash.clone(), key.range.clone())
}

/// Reads the key of a record.
pub fn key_of<R>(record: &R, schema: &TableSchema<R>) -> Result<RecordKey, ConversionError> {
    let hash_field = schema
        .hash_key()
        .ok_or_else(|| ConversionError::KeyShapeMismatch {
            table: schema.table_name.clone(),
            reason: "schema has no hash key",
        })?;

    Ok(RecordKey {
        hash: hash_field.read(record)?,
        range: schema
            .range_key()
            .map(|field| field.read(record))
            .transpose()?,
    })
}

/// Update actions for every non-key field whose value differs from the
/// field's value on `R::default()`.
///
/// Fields that changed to null or to an empty set are removed.
pub fn non_default_update<R: Default>(
    record: &R,
    schema: &TableSchema<R>,
) -> Result<Vec<UpdateAction>, ConversionError> {
    let defaults = R::default();
    let mut actions = Vec::new();

    for field in schema.fields().iter().filter(|field| !field.is_key()) {
        let value = field.read(record)?;
        if value == field.read(&defaults)? {
            continue;
        }
        let action = match field_attribute(field, value)? {
            Some(value) => UpdateAction::Set {
                name: field.name.clone(),
                value,
            },
            None => UpdateAction::Remove {
                name: field.name.clone(),
            },
        };
        actions.push(action);
    }

    Ok(actions)
}

/// Converts a value for one field, tagging errors with the field name.
pub fn field_attribute<R>(
    field: &FieldSchema<R>,
    value: Value,
) -> Result<Option<AttributeValue>, ConversionError> {
    to_attribute(value, field.store_type).map_err(|e| e.in_field(&field.name))
}
