use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;

use super::{Record, SchemaBuilder, SchemaError, TableDef, TableSchema};
use crate::convert::TypeConverter;

type Erased = Arc<dyn Any + Send + Sync>;

/// One immutable version of the registry contents.
#[derive(Clone, Default)]
struct Snapshot {
    schemas: HashMap<TypeId, Erased>,
    converters: HashMap<TypeId, Erased>,
}

thread_local! {
    /// Types whose `describe` is running on this thread.
    static BUILDING: RefCell<Vec<TypeId>> = const { RefCell::new(Vec::new()) };
}

/// Append-only registry of record schemas and custom converters.
///
/// Reads load the current snapshot without locking. Writers build a new
/// snapshot from the one they read and publish it with compare-and-swap,
/// starting over when another writer got there first.
#[derive(Default)]
pub struct SchemaRegistry {
    snapshot: ArcSwap<Snapshot>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `R` as a table. Idempotent; a type previously resolved as a
    /// non-table schema is republished with the table flag set.
    pub fn register<R: Record>(&self) -> Result<Arc<TableSchema<R>>, SchemaError> {
        self.publish::<R>(true)
    }

    /// Returns the schema of `R`, registering it as a non-table schema on
    /// first use.
    pub fn resolve<R: Record>(&self) -> Result<Arc<TableSchema<R>>, SchemaError> {
        match self.lookup::<R>() {
            Some(schema) => Ok(schema),
            None => self.publish::<R>(false),
        }
    }

    /// Returns the schema of `R`, which must have been registered as a table.
    pub fn resolve_table<R: Record>(&self) -> Result<Arc<TableSchema<R>>, SchemaError> {
        match self.lookup::<R>() {
            Some(schema) if schema.is_table => Ok(schema),
            _ => Err(SchemaError::TableNotRegistered(type_name::<R>().to_string())),
        }
    }

    /// Registers every type in `registrations` as a table.
    pub fn register_many(
        &self,
        registrations: &[Registration],
    ) -> Result<Vec<Arc<dyn TableDef>>, SchemaError> {
        registrations
            .iter()
            .map(|registration| (registration.register)(self))
            .collect()
    }

    /// Registers the converter used by `custom::<T>()` fields. Replaces any
    /// previous converter for `T`; schemas already built keep theirs.
    pub fn register_converter<T: 'static>(&self, converter: Arc<dyn TypeConverter<T>>) {
        let erased: Erased = Arc::new(converter);
        self.snapshot.rcu(|current| {
            let mut next = Snapshot::clone(current);
            next.converters.insert(TypeId::of::<T>(), Arc::clone(&erased));
            next
        });
        tracing::debug!(converter_type = type_name::<T>(), "Registered converter");
    }

    pub fn converter<T: 'static>(&self) -> Option<Arc<dyn TypeConverter<T>>> {
        let erased = self
            .snapshot
            .load()
            .converters
            .get(&TypeId::of::<T>())
            .cloned()?;
        erased
            .downcast::<Arc<dyn TypeConverter<T>>>()
            .ok()
            .map(|converter| Arc::clone(&*converter))
    }

    /// Number of schemas published so far.
    pub fn len(&self) -> usize {
        self.snapshot.load().schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup<R: Record>(&self) -> Option<Arc<TableSchema<R>>> {
        let erased = self
            .snapshot
            .load()
            .schemas
            .get(&TypeId::of::<R>())
            .cloned()?;
        erased.downcast::<TableSchema<R>>().ok()
    }

    fn publish<R: Record>(&self, as_table: bool) -> Result<Arc<TableSchema<R>>, SchemaError> {
        let mut built: Option<Arc<TableSchema<R>>> = None;

        loop {
            let current = self.snapshot.load_full();
            let existing = current
                .schemas
                .get(&TypeId::of::<R>())
                .cloned()
                .and_then(|erased| erased.downcast::<TableSchema<R>>().ok());

            let candidate = match existing {
                Some(schema) if schema.is_table || !as_table => return Ok(schema),
                Some(schema) => Arc::new(promote(&schema)?),
                None => match &built {
                    Some(schema) => Arc::clone(schema),
                    None => {
                        let schema = Arc::new(self.build::<R>(as_table)?);
                        built = Some(Arc::clone(&schema));
                        schema
                    }
                },
            };

            let mut next = Snapshot::clone(&current);
            let erased: Erased = candidate.clone();
            next.schemas.insert(TypeId::of::<R>(), erased);

            let previous = self.snapshot.compare_and_swap(&current, Arc::new(next));
            if Arc::ptr_eq(&*previous, &current) {
                tracing::debug!(
                    record_type = type_name::<R>(),
                    table = %candidate.table_name,
                    is_table = candidate.is_table,
                    "Published schema"
                );
                return Ok(candidate);
            }

            tracing::trace!(
                record_type = type_name::<R>(),
                "Registry changed during publish, retrying"
            );
        }
    }

    fn build<R: Record>(&self, is_table: bool) -> Result<TableSchema<R>, SchemaError> {
        let id = TypeId::of::<R>();
        let recursive = BUILDING.with(|building| {
            let mut building = building.borrow_mut();
            if building.contains(&id) {
                true
            } else {
                building.push(id);
                false
            }
        });
        if recursive {
            return Err(SchemaError::RecursiveType(type_name::<R>().to_string()));
        }

        let mut builder = SchemaBuilder::new(self);
        R::describe(&mut builder);

        BUILDING.with(|building| building.borrow_mut().retain(|entry| *entry != id));
        builder.build(is_table)
    }
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot.load();
        f.debug_struct("SchemaRegistry")
            .field("schemas", &snapshot.schemas.len())
            .field("converters", &snapshot.converters.len())
            .finish()
    }
}

/// Copy of `schema` flagged as a table.
fn promote<R>(schema: &TableSchema<R>) -> Result<TableSchema<R>, SchemaError> {
    if schema.hash_key.is_none() {
        return Err(SchemaError::MissingHashKey(schema.type_name.to_string()));
    }
    let mut table = schema.clone();
    table.is_table = true;
    Ok(table)
}

/// A record type to register, for APIs taking several types at once.
#[derive(Clone, Copy)]
pub struct Registration {
    pub type_name: &'static str,
    register: fn(&SchemaRegistry) -> Result<Arc<dyn TableDef>, SchemaError>,
}

impl Registration {
    pub fn of<R: Record>() -> Self {
        Self {
            type_name: type_name::<R>(),
            register: |registry| {
                let schema: Arc<dyn TableDef> = registry.register::<R>()?;
                Ok(schema)
            },
        }
    }

    pub fn register(&self, registry: &SchemaRegistry) -> Result<Arc<dyn TableDef>, SchemaError> {
        (self.register)(registry)
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("type_name", &self.type_name)
            .finish()
    }
}
