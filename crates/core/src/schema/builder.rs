use std::any::type_name;
use std::collections::HashSet;
use std::sync::Arc;

use super::table::{Reader, Writer};
use super::{
    store_type_for, FieldSchema, NativeField, NativeType, Record, SchemaError, SchemaRegistry,
    StoreType, TableSchema,
};
use crate::convert::{ConversionError, Value};

/// Collects the field declarations of a record type.
///
/// Declaration errors are kept and reported when the schema is built, so
/// `describe` implementations can chain calls without handling results.
pub struct SchemaBuilder<'a, R> {
    registry: &'a SchemaRegistry,
    alias: Option<String>,
    fields: Vec<FieldSchema<R>>,
    errors: Vec<SchemaError>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Role {
    Hash,
    Range,
    Plain,
}

impl<'a, R: Record> SchemaBuilder<'a, R> {
    pub(crate) fn new(registry: &'a SchemaRegistry) -> Self {
        Self {
            registry,
            alias: None,
            fields: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Overrides the table name (defaults to the type name).
    pub fn alias(&mut self, table_name: impl Into<String>) -> &mut Self {
        self.alias = Some(table_name.into());
        self
    }

    /// Declares the hash key field.
    pub fn hash_key<T: NativeField>(
        &mut self,
        name: &str,
        get: fn(&R) -> &T,
        set: fn(&mut R) -> &mut T,
    ) -> &mut Self {
        self.native(name, Role::Hash, get, set)
    }

    /// Declares the range key field.
    pub fn range_key<T: NativeField>(
        &mut self,
        name: &str,
        get: fn(&R) -> &T,
        set: fn(&mut R) -> &mut T,
    ) -> &mut Self {
        self.native(name, Role::Range, get, set)
    }

    /// Declares a plain field.
    pub fn field<T: NativeField>(
        &mut self,
        name: &str,
        get: fn(&R) -> &T,
        set: fn(&mut R) -> &mut T,
    ) -> &mut Self {
        self.native(name, Role::Plain, get, set)
    }

    /// Marks the last declared field as auto-increment. Only integer fields
    /// qualify.
    pub fn auto_increment(&mut self) -> &mut Self {
        match self.fields.last_mut() {
            Some(field) if field.native.is_integer() => field.auto_increment = true,
            Some(field) => {
                let error = SchemaError::InvalidAutoIncrement {
                    field: field.name.clone(),
                    reason: "only integer fields can auto-increment",
                };
                self.errors.push(error);
            }
            None => self.errors.push(SchemaError::InvalidAutoIncrement {
                field: String::new(),
                reason: "no field declared yet",
            }),
        }
        self
    }

    /// Declares a field holding another record, stored as a map. The nested
    /// type is registered as a non-table schema.
    pub fn nested<N: Record>(
        &mut self,
        name: &str,
        get: fn(&R) -> &N,
        set: fn(&mut R) -> &mut N,
    ) -> &mut Self {
        let nested = match self.registry.resolve::<N>() {
            Ok(schema) => schema,
            Err(error) => {
                self.errors.push(error);
                return self;
            }
        };

        let read_schema = Arc::clone(&nested);
        let reader: Reader<R> =
            Arc::new(move |record: &R| read_schema.to_value_map(get(record)).map(Value::Map));
        let writer: Writer<R> = Arc::new(move |record: &mut R, value: Value| match value {
            Value::Map(map) => nested.apply_value_map(set(record), map),
            Value::Null => Ok(()),
            other => Err(ConversionError::TypeMismatch {
                expected: "map",
                found: other.kind(),
            }),
        });

        self.push(name, Role::Plain, NativeType::Nested, StoreType::Map, false, reader, writer)
    }

    /// Declares a field whose type is handled by a converter registered with
    /// [`SchemaRegistry::register_converter`].
    pub fn custom<T: Send + Sync + 'static>(
        &mut self,
        name: &str,
        get: fn(&R) -> &T,
        set: fn(&mut R) -> &mut T,
    ) -> &mut Self {
        let Some(converter) = self.registry.converter::<T>() else {
            self.errors.push(SchemaError::UnsupportedType {
                field: name.to_string(),
                type_name: type_name::<T>().to_string(),
            });
            return self;
        };

        let store_type = converter.store_type();
        let read_converter = Arc::clone(&converter);
        let reader: Reader<R> = Arc::new(move |record: &R| read_converter.to_value(get(record)));
        let writer: Writer<R> = Arc::new(move |record: &mut R, value: Value| {
            *set(record) = converter.from_value(value)?;
            Ok(())
        });

        self.push(name, Role::Plain, NativeType::Custom, store_type, false, reader, writer)
    }

    fn native<T: NativeField>(
        &mut self,
        name: &str,
        role: Role,
        get: fn(&R) -> &T,
        set: fn(&mut R) -> &mut T,
    ) -> &mut Self {
        let Some(store_type) = store_type_for(T::NATIVE) else {
            self.errors.push(SchemaError::UnsupportedType {
                field: name.to_string(),
                type_name: type_name::<T>().to_string(),
            });
            return self;
        };

        let reader: Reader<R> = Arc::new(move |record: &R| get(record).to_value());
        let writer: Writer<R> = Arc::new(move |record: &mut R, value: Value| {
            *set(record) = T::from_value(value)?;
            Ok(())
        });

        self.push(name, role, T::NATIVE, store_type, T::OPTIONAL, reader, writer)
    }

    #[allow(clippy::too_many_arguments)]
    fn push(
        &mut self,
        name: &str,
        role: Role,
        native: NativeType,
        store_type: StoreType,
        optional: bool,
        reader: Reader<R>,
        writer: Writer<R>,
    ) -> &mut Self {
        if role != Role::Plain && (optional || store_type.scalar().is_none()) {
            let shown = if optional {
                format!("optional {store_type}")
            } else {
                store_type.to_string()
            };
            self.errors.push(SchemaError::InvalidKeyType {
                field: name.to_string(),
                store_type: shown,
            });
            return self;
        }

        self.fields.push(FieldSchema {
            name: name.to_string(),
            native,
            store_type,
            hash_key: role == Role::Hash,
            range_key: role == Role::Range,
            auto_increment: false,
            optional,
            reader,
            writer,
        });
        self
    }

    /// Validates the declarations and produces the schema.
    pub(crate) fn build(self, is_table: bool) -> Result<TableSchema<R>, SchemaError> {
        let type_name = type_name::<R>();
        if let Some(error) = self.errors.into_iter().next() {
            return Err(error);
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    type_name: type_name.to_string(),
                    field: field.name.clone(),
                });
            }
        }

        let hash_key = single_key(&self.fields, type_name, "hash", |f| f.hash_key)?;
        let range_key = single_key(&self.fields, type_name, "range", |f| f.range_key)?;
        if is_table && hash_key.is_none() {
            return Err(SchemaError::MissingHashKey(type_name.to_string()));
        }

        Ok(TableSchema {
            type_name,
            table_name: self.alias.unwrap_or_else(|| short_name(type_name).to_string()),
            is_table,
            fields: self.fields,
            hash_key,
            range_key,
        })
    }
}

fn single_key<R>(
    fields: &[FieldSchema<R>],
    type_name: &str,
    role: &'static str,
    is_role: impl Fn(&FieldSchema<R>) -> bool,
) -> Result<Option<usize>, SchemaError> {
    let mut found = None;
    for (idx, field) in fields.iter().enumerate() {
        if is_role(field) {
            if found.is_some() {
                return Err(SchemaError::DuplicateKey {
                    type_name: type_name.to_string(),
                    role,
                });
            }
            found = Some(idx);
        }
    }
    Ok(found)
}

/// `my_crate::model::Order` -> `Order`.
pub(crate) fn short_name(type_name: &str) -> &str {
    let base = type_name.split('<').next().unwrap_or(type_name);
    base.rsplit("::").next().unwrap_or(base)
}
