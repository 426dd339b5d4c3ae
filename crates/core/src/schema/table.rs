use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::{NativeType, SchemaBuilder, StoreType};
use crate::convert::{ConversionError, Value};
use crate::store::KeyAttribute;

/// A record type mapped onto the store.
///
/// `describe` is called once per registry, when the type is first
/// registered or resolved, and declares the fields of the type:
///
/// ```ignore
/// impl Record for Order {
///     fn describe(schema: &mut SchemaBuilder<'_, Self>) {
///         schema
///             .hash_key("Id", |o| &o.id, |o| &mut o.id)
///             .field("Status", |o| &o.status, |o| &mut o.status);
///     }
/// }
/// ```
pub trait Record: Default + Send + Sync + 'static {
    fn describe(schema: &mut SchemaBuilder<'_, Self>);
}

pub(crate) type Reader<R> = Arc<dyn Fn(&R) -> Result<Value, ConversionError> + Send + Sync>;
pub(crate) type Writer<R> = Arc<dyn Fn(&mut R, Value) -> Result<(), ConversionError> + Send + Sync>;

/// One field of a [`TableSchema`].
pub struct FieldSchema<R> {
    pub name: String,
    pub native: NativeType,
    pub store_type: StoreType,
    pub hash_key: bool,
    pub range_key: bool,
    pub auto_increment: bool,
    pub optional: bool,
    pub(crate) reader: Reader<R>,
    pub(crate) writer: Writer<R>,
}

impl<R> FieldSchema<R> {
    pub fn is_key(&self) -> bool {
        self.hash_key || self.range_key
    }

    /// Reads the field's value from a record.
    pub fn read(&self, record: &R) -> Result<Value, ConversionError> {
        (self.reader)(record).map_err(|e| e.in_field(&self.name))
    }

    /// Writes a value into the field of a record.
    pub fn write(&self, record: &mut R, value: Value) -> Result<(), ConversionError> {
        (self.writer)(record, value).map_err(|e| e.in_field(&self.name))
    }

    /// The key attribute declaration for this field.
    pub fn key_attribute(&self) -> Option<KeyAttribute> {
        self.store_type
            .scalar()
            .map(|scalar| KeyAttribute::new(self.name.clone(), scalar))
    }
}

impl<R> Clone for FieldSchema<R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            native: self.native,
            store_type: self.store_type,
            hash_key: self.hash_key,
            range_key: self.range_key,
            auto_increment: self.auto_increment,
            optional: self.optional,
            reader: Arc::clone(&self.reader),
            writer: Arc::clone(&self.writer),
        }
    }
}

impl<R> fmt::Debug for FieldSchema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSchema")
            .field("name", &self.name)
            .field("native", &self.native)
            .field("store_type", &self.store_type)
            .field("hash_key", &self.hash_key)
            .field("range_key", &self.range_key)
            .field("auto_increment", &self.auto_increment)
            .field("optional", &self.optional)
            .finish_non_exhaustive()
    }
}

/// Immutable description of how a record type maps onto the store.
pub struct TableSchema<R> {
    pub type_name: &'static str,
    pub table_name: String,
    /// Whether the type is stored in its own table (as opposed to only
    /// nested inside other records).
    pub is_table: bool,
    pub(crate) fields: Vec<FieldSchema<R>>,
    pub(crate) hash_key: Option<usize>,
    pub(crate) range_key: Option<usize>,
}

impl<R> TableSchema<R> {
    pub fn fields(&self) -> &[FieldSchema<R>] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema<R>> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn hash_key(&self) -> Option<&FieldSchema<R>> {
        self.hash_key.map(|idx| &self.fields[idx])
    }

    pub fn range_key(&self) -> Option<&FieldSchema<R>> {
        self.range_key.map(|idx| &self.fields[idx])
    }

    pub fn auto_increment_fields(&self) -> impl Iterator<Item = &FieldSchema<R>> {
        self.fields.iter().filter(|field| field.auto_increment)
    }

    pub fn has_auto_increment(&self) -> bool {
        self.fields.iter().any(|field| field.auto_increment)
    }

    /// Reads every non-null field into a value map, as used for nesting.
    pub fn to_value_map(&self, record: &R) -> Result<BTreeMap<String, Value>, ConversionError> {
        let mut map = BTreeMap::new();
        for field in &self.fields {
            let value = field.read(record)?;
            if !value.is_null() {
                map.insert(field.name.clone(), value);
            }
        }
        Ok(map)
    }

    /// Writes the entries of a value map into a record. Unknown names are
    /// ignored; missing names leave the field untouched.
    pub fn apply_value_map(
        &self,
        record: &mut R,
        mut map: BTreeMap<String, Value>,
    ) -> Result<(), ConversionError> {
        for field in &self.fields {
            if let Some(value) = map.remove(&field.name) {
                if value.is_null() && !field.optional {
                    continue;
                }
                field.write(record, value)?;
            }
        }
        Ok(())
    }
}

impl<R> Clone for TableSchema<R> {
    fn clone(&self) -> Self {
        Self {
            type_name: self.type_name,
            table_name: self.table_name.clone(),
            is_table: self.is_table,
            fields: self.fields.clone(),
            hash_key: self.hash_key,
            range_key: self.range_key,
        }
    }
}

impl<R> fmt::Debug for TableSchema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableSchema")
            .field("type_name", &self.type_name)
            .field("table_name", &self.table_name)
            .field("is_table", &self.is_table)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Type-erased view of a table schema, enough to create the table.
pub trait TableDef: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn table_name(&self) -> &str;

    fn hash_key(&self) -> Option<KeyAttribute>;

    fn range_key(&self) -> Option<KeyAttribute>;

    fn has_auto_increment(&self) -> bool;
}

impl<R: Record> TableDef for TableSchema<R> {
    fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn table_name(&self) -> &str {
        &self.table_name
    }

    fn hash_key(&self) -> Option<KeyAttribute> {
        TableSchema::hash_key(self).and_then(FieldSchema::key_attribute)
    }

    fn range_key(&self) -> Option<KeyAttribute> {
        TableSchema::range_key(self).and_then(FieldSchema::key_attribute)
    }

    fn has_auto_increment(&self) -> bool {
        TableSchema::has_auto_increment(self)
    }
}
