//! Typed access to records.
//!
//! [`Mapper`] ties the pieces together: schemas come from the shared
//! [`SchemaRegistry`], records are converted with the pure functions in
//! [`dynamap_core::convert`], and every store call goes through the
//! [`Executor`]. Record types must be registered as tables first, through
//! [`Mapper::register`], [`Mapper::create_tables`] or
//! [`Mapper::wait_until_ready`].

mod options;

use std::sync::Arc;

use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;

use dynamap_core::convert::{
    field_attribute, from_store_item, key_of, non_default_update, parse_number, record_key_item,
    to_store_item, ConversionError, RecordKey, Value,
};
use dynamap_core::schema::{
    FieldSchema, Record, Registration, SchemaError, SchemaRegistry, StoreType, TableSchema,
};
use dynamap_core::store::{
    codes, AttributeValue, Condition, CreateTableRequest, DeleteItemRequest, GetItemRequest, Item,
    KeyAttribute, KeyCondition, PutItemRequest, QueryRequest, RangeCondition, ReturnValues,
    ScalarType, ScanRequest, StoreClient, UpdateAction, UpdateItemRequest, WriteRequest,
};
use dynamap_core::{Error, Result};

use crate::batch::{BatchOperator, BatchWriteSummary};
use crate::config::Config;
use crate::executor::Executor;
use crate::lifecycle::{Cancellation, TableLifecycle, WaitReport};
use crate::pagination::paginate;

pub use options::{KeyRange, Query, ScanOptions};

const SEQUENCE_NAME: &str = "Name";
const SEQUENCE_VALUE: &str = "Value";

/// Typed data access over a [`StoreClient`]. Cheap to clone.
#[derive(Clone)]
pub struct Mapper {
    store: Arc<dyn StoreClient>,
    executor: Executor,
    registry: Arc<SchemaRegistry>,
    config: Arc<Config>,
}

impl Mapper {
    pub fn new(store: Arc<dyn StoreClient>, config: Config) -> Self {
        Self {
            store,
            executor: Executor::new(config.retry_policy()),
            registry: Arc::new(SchemaRegistry::new()),
            config: Arc::new(config),
        }
    }

    /// Shares an existing registry, e.g. one with converters registered.
    pub fn with_registry(mut self, registry: Arc<SchemaRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Registers `R` as a table record.
    pub fn register<R: Record>(&self) -> Result<Arc<TableSchema<R>>> {
        Ok(self.registry.register::<R>()?)
    }

    /// Schema of a record type already registered as a table.
    fn table<R: Record>(&self) -> Result<Arc<TableSchema<R>>> {
        Ok(self.registry.resolve_table::<R>()?)
    }

    pub fn lifecycle(&self) -> TableLifecycle {
        TableLifecycle::new(
            Arc::clone(&self.store),
            self.executor.clone(),
            self.config.poll_interval(),
        )
    }

    pub fn batch(&self) -> BatchOperator {
        BatchOperator::new(Arc::clone(&self.store), self.executor.clone())
    }

    fn table_name<R>(&self, schema: &TableSchema<R>) -> String {
        self.config.table_name(&schema.table_name)
    }

    fn consistent_read(&self, requested: Option<bool>) -> bool {
        requested.unwrap_or(self.config.consistent_read)
    }

    // ========================================================================
    // Single items
    // ========================================================================

    pub async fn get<R: Record>(&self, hash: impl Into<Value>) -> Result<Option<R>> {
        self.get_by_key(RecordKey::new(hash)).await
    }

    pub async fn get_with_range<R: Record>(
        &self,
        hash: impl Into<Value>,
        range: impl Into<Value>,
    ) -> Result<Option<R>> {
        self.get_by_key(RecordKey::new(hash).with_range(range)).await
    }

    pub async fn get_by_key<R: Record>(&self, key: RecordKey) -> Result<Option<R>> {
        let schema = self.table::<R>()?;
        let request = GetItemRequest {
            table_name: self.table_name(&schema),
            key: record_key_item(&schema, &key)?,
            consistent_read: self.config.consistent_read,
        };

        let item = self
            .executor
            .execute("get_item", || self.store.get_item(request.clone()))
            .await?;

        Ok(item
            .map(|item| from_store_item(&schema, &item))
            .transpose()?)
    }

    /// Writes a whole record, replacing any stored version.
    ///
    /// Auto-increment fields still holding their default value are assigned
    /// the next value of their sequence first, and the assigned value is
    /// left in `record`.
    pub async fn put<R: Record>(&self, record: &mut R) -> Result<()> {
        let schema = self.table::<R>()?;
        self.assign_sequences(record, &schema).await?;

        let request = PutItemRequest {
            table_name: self.table_name(&schema),
            item: to_store_item(record, &schema)?,
            condition: None,
        };

        self.executor
            .execute("put_item", || self.store.put_item(request.clone()))
            .await
    }

    /// Writes every non-key field whose value differs from the type's
    /// default and returns the stored record after the update.
    pub async fn update<R: Record>(&self, record: &R) -> Result<R> {
        let schema = self.table::<R>()?;
        let request = self.update_request(record, &schema, None, ReturnValues::AllNew)?;

        let updated = self
            .executor
            .execute("update_item", || self.store.update_item(request.clone()))
            .await?;

        let item = updated.unwrap_or(request.key);
        Ok(from_store_item(&schema, &item)?)
    }

    /// Like [`update`](Self::update), but only when `condition` holds.
    /// Returns `false` when the store rejected the condition.
    pub async fn update_if<R: Record>(&self, record: &R, condition: Condition) -> Result<bool> {
        let schema = self.table::<R>()?;
        let request =
            self.update_request(record, &schema, Some(condition), ReturnValues::None)?;

        let updated = self
            .executor
            .execute_passthrough("update_item", &[codes::CONDITIONAL_CHECK_FAILED], || {
                self.store.update_item(request.clone())
            })
            .await;

        match updated {
            Ok(_) => Ok(true),
            Err(Error::Store(err)) if err.has_code(codes::CONDITIONAL_CHECK_FAILED) => {
                tracing::debug!(table = %request.table_name, "Conditional update rejected");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn delete<R: Record>(&self, hash: impl Into<Value>) -> Result<()> {
        self.delete_by_key::<R>(RecordKey::new(hash)).await
    }

    pub async fn delete_with_range<R: Record>(
        &self,
        hash: impl Into<Value>,
        range: impl Into<Value>,
    ) -> Result<()> {
        self.delete_by_key::<R>(RecordKey::new(hash).with_range(range))
            .await
    }

    pub async fn delete_by_key<R: Record>(&self, key: RecordKey) -> Result<()> {
        let schema = self.table::<R>()?;
        let request = DeleteItemRequest {
            table_name: self.table_name(&schema),
            key: record_key_item(&schema, &key)?,
            condition: None,
        };

        self.executor
            .execute("delete_item", || self.store.delete_item(request.clone()))
            .await
    }

    /// Atomically adds `delta` to a numeric field and returns the new value.
    /// A missing item or attribute counts as zero.
    pub async fn increment<R: Record>(&self, key: RecordKey, field: &str, delta: i64) -> Result<i64> {
        let schema = self.table::<R>()?;
        let target = schema.field(field).ok_or_else(|| SchemaError::UnknownField {
            type_name: schema.type_name.to_string(),
            field: field.to_string(),
        })?;
        if target.store_type != StoreType::Number || target.is_key() {
            return Err(ConversionError::TypeMismatch {
                expected: "non-key N",
                found: target.store_type.descriptor(),
            }
            .in_field(field)
            .into());
        }

        let request = UpdateItemRequest {
            table_name: self.table_name(&schema),
            key: record_key_item(&schema, &key)?,
            actions: vec![UpdateAction::Add {
                name: target.name.clone(),
                value: AttributeValue::N(delta.to_string()),
            }],
            condition: None,
            return_values: ReturnValues::UpdatedNew,
        };

        let updated = self
            .executor
            .execute("update_item", || self.store.update_item(request.clone()))
            .await?;

        Ok(counter_value(updated.as_ref(), &target.name)?)
    }

    /// Atomically subtracts `delta` from a numeric field and returns the new
    /// value.
    pub async fn decrement<R: Record>(&self, key: RecordKey, field: &str, delta: i64) -> Result<i64> {
        let negated = delta.checked_neg().ok_or_else(|| ConversionError::OutOfRange {
            value: delta.to_string(),
            target: "i64",
        })?;
        self.increment::<R>(key, field, negated).await
    }

    fn update_request<R: Record>(
        &self,
        record: &R,
        schema: &TableSchema<R>,
        condition: Option<Condition>,
        return_values: ReturnValues,
    ) -> Result<UpdateItemRequest> {
        Ok(UpdateItemRequest {
            table_name: self.table_name(schema),
            key: record_key_item(schema, &key_of(record, schema)?)?,
            actions: non_default_update(record, schema)?,
            condition,
            return_values,
        })
    }

    async fn assign_sequences<R: Record>(&self, record: &mut R, schema: &TableSchema<R>) -> Result<()> {
        let defaults = R::default();
        for field in schema.auto_increment_fields() {
            if field.read(record)? != field.read(&defaults)? {
                continue;
            }
            let next = self.next_sequence(&schema.table_name, field).await?;
            field.write(record, Value::Int(next))?;
            tracing::debug!(table = %schema.table_name, field = %field.name, next, "Assigned sequence value");
        }
        Ok(())
    }

    async fn next_sequence<R>(&self, table_name: &str, field: &FieldSchema<R>) -> Result<i64> {
        let request = UpdateItemRequest {
            table_name: self.config.table_name(&self.config.sequence_table),
            key: Item::from([(
                SEQUENCE_NAME.to_string(),
                AttributeValue::S(format!("{table_name}#{}", field.name)),
            )]),
            actions: vec![UpdateAction::Add {
                name: SEQUENCE_VALUE.to_string(),
                value: AttributeValue::N("1".to_string()),
            }],
            condition: None,
            return_values: ReturnValues::UpdatedNew,
        };

        let updated = self
            .executor
            .execute("update_item", || self.store.update_item(request.clone()))
            .await?;

        Ok(counter_value(updated.as_ref(), SEQUENCE_VALUE)?)
    }

    // ========================================================================
    // Batches
    // ========================================================================

    /// Streams the records stored under `keys`. Keys without a record are
    /// skipped.
    pub fn batch_get<R: Record>(
        &self,
        keys: impl IntoIterator<Item = RecordKey>,
    ) -> BoxStream<'static, Result<R>> {
        let prepared = self.table::<R>().and_then(|schema| {
            let items = keys
                .into_iter()
                .map(|key| record_key_item(&schema, &key))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok((schema, items))
        });
        let (schema, keys) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => return failed(err),
        };

        self.batch()
            .batch_get(self.table_name(&schema), keys, self.config.consistent_read)
            .map(move |item| item.and_then(|item| Ok(from_store_item(&schema, &item)?)))
            .boxed()
    }

    /// Writes whole records in batches. Auto-increment fields are not
    /// assigned.
    ///
    /// Writes the store leaves unprocessed are not resubmitted; check
    /// [`BatchWriteSummary::unprocessed`].
    pub async fn batch_put<R: Record>(&self, records: &[R]) -> Result<BatchWriteSummary> {
        let schema = self.table::<R>()?;
        let writes = records
            .iter()
            .map(|record| to_store_item(record, &schema).map(WriteRequest::Put))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        self.batch()
            .batch_write(&self.table_name(&schema), writes)
            .await
    }

    /// Deletes records in batches. Unprocessed deletes are counted in the
    /// summary, not resubmitted.
    pub async fn batch_delete<R: Record>(
        &self,
        keys: impl IntoIterator<Item = RecordKey>,
    ) -> Result<BatchWriteSummary> {
        let schema = self.table::<R>()?;
        let writes = keys
            .into_iter()
            .map(|key| record_key_item(&schema, &key).map(WriteRequest::Delete))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        self.batch()
            .batch_write(&self.table_name(&schema), writes)
            .await
    }

    // ========================================================================
    // Scan / query
    // ========================================================================

    /// Lazily streams every record of the table (or index).
    pub fn scan<R: Record>(&self, options: ScanOptions) -> BoxStream<'static, Result<R>> {
        let schema = match self.table::<R>() {
            Ok(schema) => schema,
            Err(err) => return failed(err),
        };
        let request = ScanRequest {
            table_name: self.table_name(&schema),
            index_name: options.index_name,
            page_size: options.page_size,
            consistent_read: self.consistent_read(options.consistent_read),
            exclusive_start_key: None,
        };

        let store = Arc::clone(&self.store);
        paginate(
            self.executor.clone(),
            "scan",
            request,
            move |request: ScanRequest| {
                let store = Arc::clone(&store);
                async move { store.scan(request).await }
            },
            options.limit,
        )
        .map(move |item| item.and_then(|item| Ok(from_store_item(&schema, &item)?)))
        .boxed()
    }

    /// Lazily streams the records of one partition, in range key order.
    pub fn query<R: Record>(&self, query: Query) -> BoxStream<'static, Result<R>> {
        let prepared = self
            .table::<R>()
            .and_then(|schema| Ok((self.query_request(&schema, &query)?, schema)));
        let (request, schema) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => return failed(err),
        };

        let store = Arc::clone(&self.store);
        paginate(
            self.executor.clone(),
            "query",
            request,
            move |request: QueryRequest| {
                let store = Arc::clone(&store);
                async move { store.query(request).await }
            },
            query.limit,
        )
        .map(move |item| item.and_then(|item| Ok(from_store_item(&schema, &item)?)))
        .boxed()
    }

    fn query_request<R: Record>(&self, schema: &TableSchema<R>, query: &Query) -> Result<QueryRequest> {
        let mismatch = |reason| ConversionError::KeyShapeMismatch {
            table: schema.table_name.clone(),
            reason,
        };
        let named = |name: &str| {
            schema.field(name).ok_or_else(|| SchemaError::UnknownField {
                type_name: schema.type_name.to_string(),
                field: name.to_string(),
            })
        };

        let (hash_field, range_field) = match &query.index {
            Some(index) => (
                named(&index.hash_field)?,
                index.range_field.as_deref().map(named).transpose()?,
            ),
            None => (
                schema
                    .hash_key()
                    .ok_or_else(|| mismatch("schema has no hash key"))?,
                schema.range_key(),
            ),
        };

        let hash_value = field_attribute(hash_field, query.hash.clone())?
            .ok_or_else(|| mismatch("hash value is missing"))?;

        let range = match (&query.range, range_field) {
            (Some(range), Some(field)) => Some((field.name.clone(), range_condition(field, range)?)),
            (Some(_), None) => return Err(mismatch("schema has no range key").into()),
            (None, _) => None,
        };

        Ok(QueryRequest {
            table_name: self.table_name(schema),
            index_name: query.index.as_ref().map(|index| index.name.clone()),
            key_condition: KeyCondition {
                hash_name: hash_field.name.clone(),
                hash_value,
                range,
            },
            scan_forward: query.scan_forward,
            page_size: query.page_size,
            consistent_read: self.consistent_read(query.consistent_read),
            exclusive_start_key: None,
        })
    }

    // ========================================================================
    // Tables
    // ========================================================================

    /// Creates the tables of `registrations` that do not exist yet, plus the
    /// sequence table when any of them auto-increments, and waits until they
    /// are ready.
    pub async fn create_tables(
        &self,
        registrations: &[Registration],
        cancel: &Cancellation,
    ) -> Result<WaitReport> {
        let requests = self.table_requests(registrations)?;
        tracing::info!(tables = requests.len(), "Ensuring tables exist");
        self.lifecycle().create_missing(&requests, &[], cancel).await
    }

    /// Waits until the tables of `registrations` are ready.
    pub async fn wait_until_ready(
        &self,
        registrations: &[Registration],
        cancel: &Cancellation,
    ) -> Result<WaitReport> {
        let names: Vec<String> = self
            .table_requests(registrations)?
            .into_iter()
            .map(|request| request.table_name)
            .collect();
        self.lifecycle().wait_until_ready(&names, cancel).await
    }

    fn table_requests(&self, registrations: &[Registration]) -> Result<Vec<CreateTableRequest>> {
        let tables = self.registry.register_many(registrations)?;
        let mut requests = Vec::with_capacity(tables.len() + 1);

        for table in &tables {
            let hash_key = table
                .hash_key()
                .ok_or_else(|| SchemaError::MissingHashKey(table.type_name().to_string()))?;
            requests.push(CreateTableRequest {
                table_name: self.config.table_name(table.table_name()),
                hash_key,
                range_key: table.range_key(),
            });
        }

        if tables.iter().any(|table| table.has_auto_increment()) {
            requests.push(CreateTableRequest {
                table_name: self.config.table_name(&self.config.sequence_table),
                hash_key: KeyAttribute::new(SEQUENCE_NAME, ScalarType::S),
                range_key: None,
            });
        }

        Ok(requests)
    }
}

fn range_condition<R>(field: &FieldSchema<R>, range: &KeyRange) -> Result<RangeCondition> {
    let attribute = |value: &Value| -> Result<AttributeValue> {
        field_attribute(field, value.clone())?.ok_or_else(|| {
            ConversionError::TypeMismatch {
                expected: field.store_type.descriptor(),
                found: "null",
            }
            .in_field(&field.name)
            .into()
        })
    };

    Ok(match range {
        KeyRange::Eq(v) => RangeCondition::Eq(attribute(v)?),
        KeyRange::Lt(v) => RangeCondition::Lt(attribute(v)?),
        KeyRange::Le(v) => RangeCondition::Le(attribute(v)?),
        KeyRange::Gt(v) => RangeCondition::Gt(attribute(v)?),
        KeyRange::Ge(v) => RangeCondition::Ge(attribute(v)?),
        KeyRange::Between(low, high) => RangeCondition::Between(attribute(low)?, attribute(high)?),
        KeyRange::BeginsWith(v) => RangeCondition::BeginsWith(attribute(v)?),
    })
}

/// Reads the numeric attribute returned by an `ADD` update.
fn counter_value(updated: Option<&Item>, name: &str) -> std::result::Result<i64, ConversionError> {
    let raw = updated
        .and_then(|item| item.get(name))
        .and_then(AttributeValue::as_n)
        .ok_or_else(|| ConversionError::Custom(format!("update returned no numeric {name}")))?;
    parse_number(raw)?.into_integer("i64")
}

fn failed<T: Send + 'static>(err: Error) -> BoxStream<'static, Result<T>> {
    stream::once(async move { Err(err) }).boxed()
}

#[cfg(test)]
mod tests {
    use futures_util::TryStreamExt;

    use dynamap_core::schema::SchemaBuilder;
    use dynamap_core::store::{StoreError, TableStatus};

    use super::*;
    use crate::storage::memory::{InMemoryStore, Operation};

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Order {
        id: i64,
        status: String,
    }

    impl Record for Order {
        fn describe(schema: &mut SchemaBuilder<'_, Self>) {
            schema
                .alias("orders")
                .hash_key("Id", |o| &o.id, |o| &mut o.id)
                .field("Status", |o| &o.status, |o| &mut o.status);
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Event {
        owner: String,
        seq: u64,
        kind: String,
        hits: i64,
    }

    impl Record for Event {
        fn describe(schema: &mut SchemaBuilder<'_, Self>) {
            schema
                .alias("events")
                .hash_key("Owner", |e| &e.owner, |e| &mut e.owner)
                .range_key("Seq", |e| &e.seq, |e| &mut e.seq)
                .field("Kind", |e| &e.kind, |e| &mut e.kind)
                .field("Hits", |e| &e.hits, |e| &mut e.hits);
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Ticket {
        id: u64,
        title: String,
    }

    impl Record for Ticket {
        fn describe(schema: &mut SchemaBuilder<'_, Self>) {
            schema
                .alias("tickets")
                .hash_key("Id", |t| &t.id, |t| &mut t.id)
                .auto_increment()
                .field("Title", |t| &t.title, |t| &mut t.title);
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Note {
        id: i64,
    }

    impl Record for Note {
        fn describe(schema: &mut SchemaBuilder<'_, Self>) {
            schema.alias("notes").hash_key("Id", |n| &n.id, |n| &mut n.id);
        }
    }

    fn config() -> Config {
        let mut config = Config::from_lookup(|_| None);
        config.table_prefix = "test_".to_string();
        config.retry_timeout_ms = 200;
        config.retry_initial_backoff_ms = 10;
        config.poll_interval_ms = 10;
        config
    }

    async fn mapper_with_tables(store: &InMemoryStore) -> Mapper {
        let mapper = Mapper::new(Arc::new(store.clone()), config());
        let report = mapper
            .create_tables(
                &[Registration::of::<Order>(), Registration::of::<Event>(), Registration::of::<Ticket>()],
                &Cancellation::new(),
            )
            .await
            .unwrap();
        assert!(report.is_complete());
        mapper
    }

    fn event(owner: &str, seq: u64, kind: &str) -> Event {
        Event {
            owner: owner.to_string(),
            seq,
            kind: kind.to_string(),
            hits: 0,
        }
    }

    async fn seed_events(mapper: &Mapper) {
        let events = [
            event("ana", 1, "view"),
            event("ana", 2, "click"),
            event("ana", 3, "view"),
            event("ana", 4, "click"),
            event("ana", 5, "view"),
            event("bob", 1, "click"),
        ];
        mapper.batch_put(&events).await.unwrap();
    }

    fn seqs(events: &[Event]) -> Vec<u64> {
        events.iter().map(|e| e.seq).collect()
    }

    #[tokio::test]
    async fn test_order_lifecycle() {
        let store = InMemoryStore::new();
        let mapper = mapper_with_tables(&store).await;

        let mut order = Order {
            id: 1,
            status: "NEW".to_string(),
        };
        mapper.put(&mut order).await.unwrap();
        assert_eq!(mapper.get::<Order>(1).await.unwrap(), Some(order));

        let paid = Order {
            id: 1,
            status: "PAID".to_string(),
        };
        assert_eq!(mapper.update(&paid).await.unwrap(), paid);
        assert_eq!(mapper.get::<Order>(1).await.unwrap(), Some(paid));

        mapper.delete::<Order>(1).await.unwrap();
        assert_eq!(mapper.get::<Order>(1).await.unwrap(), None);
        assert_eq!(store.items("test_orders").await.len(), 0);
    }

    #[tokio::test]
    async fn test_update_leaves_default_fields_untouched() {
        let store = InMemoryStore::new();
        let mapper = mapper_with_tables(&store).await;
        let mut stored = event("ana", 1, "view");
        stored.hits = 3;
        mapper.put(&mut stored).await.unwrap();

        let updated = mapper.update(&event("ana", 1, "click")).await.unwrap();

        assert_eq!(updated.kind, "click");
        assert_eq!(updated.hits, 3);
    }

    #[tokio::test]
    async fn test_update_if_reports_failed_condition() {
        let store = InMemoryStore::new();
        let mapper = mapper_with_tables(&store).await;
        let order = Order {
            id: 9,
            status: "PAID".to_string(),
        };

        let missing = mapper
            .update_if(&order, Condition::AttributeExists("Id".to_string()))
            .await
            .unwrap();
        mapper.put(&mut order.clone()).await.unwrap();
        let present = mapper
            .update_if(
                &order,
                Condition::Equals("Status".to_string(), AttributeValue::S("PAID".to_string())),
            )
            .await
            .unwrap();

        assert!(!missing);
        assert!(present);
        assert_eq!(store.calls(Operation::UpdateItem), 2);
    }

    #[tokio::test]
    async fn test_put_assigns_auto_increment() {
        let store = InMemoryStore::new();
        let mapper = mapper_with_tables(&store).await;

        let mut first = Ticket {
            title: "first".to_string(),
            ..Default::default()
        };
        let mut second = Ticket {
            title: "second".to_string(),
            ..Default::default()
        };
        let mut explicit = Ticket {
            id: 100,
            title: "explicit".to_string(),
        };
        mapper.put(&mut first).await.unwrap();
        mapper.put(&mut second).await.unwrap();
        mapper.put(&mut explicit).await.unwrap();

        assert_eq!((first.id, second.id, explicit.id), (1, 2, 100));
        assert_eq!(mapper.get::<Ticket>(2u64).await.unwrap(), Some(second));
        assert_eq!(store.items("test_dynamap_sequences").await.len(), 1);
    }

    #[tokio::test]
    async fn test_range_key_is_required() {
        let store = InMemoryStore::new();
        let mapper = mapper_with_tables(&store).await;

        let result = mapper.get::<Event>("ana").await;

        assert!(matches!(
            result,
            Err(Error::Conversion(ConversionError::KeyShapeMismatch { .. }))
        ));
        assert_eq!(store.calls(Operation::GetItem), 0);
    }

    #[tokio::test]
    async fn test_get_with_range_and_delete_with_range() {
        let store = InMemoryStore::new();
        let mapper = mapper_with_tables(&store).await;
        seed_events(&mapper).await;

        let found = mapper.get_with_range::<Event>("ana", 2u64).await.unwrap();
        mapper.delete_with_range::<Event>("ana", 2u64).await.unwrap();

        assert_eq!(found, Some(event("ana", 2, "click")));
        assert_eq!(mapper.get_with_range::<Event>("ana", 2u64).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_increment_and_decrement() {
        let store = InMemoryStore::new();
        let mapper = mapper_with_tables(&store).await;
        let key = RecordKey::new("ana").with_range(1u64);

        assert_eq!(mapper.increment::<Event>(key.clone(), "Hits", 5).await.unwrap(), 5);
        assert_eq!(mapper.decrement::<Event>(key.clone(), "Hits", 2).await.unwrap(), 3);

        let unknown = mapper.increment::<Event>(key.clone(), "Misses", 1).await;
        let textual = mapper.increment::<Event>(key, "Kind", 1).await;
        assert!(matches!(unknown, Err(Error::Schema(SchemaError::UnknownField { .. }))));
        assert!(matches!(textual, Err(Error::Conversion(ConversionError::Field { .. }))));
    }

    #[tokio::test]
    async fn test_batch_round_trip() {
        let store = InMemoryStore::new();
        let mapper = mapper_with_tables(&store).await;
        let orders: Vec<Order> = (0..30)
            .map(|id| Order {
                id,
                status: format!("S{id}"),
            })
            .collect();

        let written = mapper.batch_put(&orders).await.unwrap();
        let read: Vec<Order> = mapper
            .batch_get::<Order>((0..35).map(RecordKey::new))
            .try_collect()
            .await
            .unwrap();
        let deleted = mapper
            .batch_delete::<Order>((0..30).map(RecordKey::new))
            .await
            .unwrap();

        assert_eq!(written.calls, 2);
        assert_eq!(read, orders);
        assert_eq!(deleted.submitted, 30);
        assert!(store.items("test_orders").await.is_empty());
    }

    #[tokio::test]
    async fn test_batch_get_with_bad_key_fails_without_calls() {
        let store = InMemoryStore::new();
        let mapper = mapper_with_tables(&store).await;

        let results: Vec<Result<Order>> = mapper
            .batch_get::<Order>([RecordKey::new("not a number")])
            .collect()
            .await;

        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
        assert_eq!(store.calls(Operation::BatchGetItem), 0);
    }

    #[tokio::test]
    async fn test_scan_with_limit() {
        let store = InMemoryStore::new().with_page_size(2);
        let mapper = mapper_with_tables(&store).await;
        seed_events(&mapper).await;

        let events: Vec<Event> = mapper
            .scan::<Event>(ScanOptions::new().limit(3))
            .try_collect()
            .await
            .unwrap();

        assert_eq!(seqs(&events), vec![1, 2, 3]);
        assert_eq!(store.calls(Operation::Scan), 2);
    }

    #[tokio::test]
    async fn test_query_range_and_direction() {
        let store = InMemoryStore::new();
        let mapper = mapper_with_tables(&store).await;
        seed_events(&mapper).await;

        let between: Vec<Event> = mapper
            .query::<Event>(Query::new("ana").range(KeyRange::Between(2u64.into(), 4u64.into())))
            .try_collect()
            .await
            .unwrap();
        let latest: Vec<Event> = mapper
            .query::<Event>(Query::new("ana").descending().limit(2))
            .try_collect()
            .await
            .unwrap();

        assert_eq!(seqs(&between), vec![2, 3, 4]);
        assert_eq!(seqs(&latest), vec![5, 4]);
    }

    #[tokio::test]
    async fn test_query_by_index_fields() {
        let store = InMemoryStore::new().with_page_size(1);
        let mapper = mapper_with_tables(&store).await;
        seed_events(&mapper).await;

        let clicks: Vec<Event> = mapper
            .query::<Event>(Query::new("click").index("by_kind", "Kind", Some("Seq")))
            .try_collect()
            .await
            .unwrap();
        let unknown: Vec<Result<Event>> = mapper
            .query::<Event>(Query::new("click").index("by_kind", "Category", None))
            .collect()
            .await;

        assert_eq!(clicks.len(), 3);
        assert!(clicks.iter().all(|e| e.kind == "click"));
        assert!(matches!(
            unknown[0],
            Err(Error::Schema(SchemaError::UnknownField { .. }))
        ));
    }

    #[tokio::test]
    async fn test_range_on_hash_only_table_is_rejected() {
        let store = InMemoryStore::new();
        let mapper = mapper_with_tables(&store).await;

        let results: Vec<Result<Order>> = mapper
            .query::<Order>(Query::new(1).range(KeyRange::Eq(1.into())))
            .collect()
            .await;

        assert!(matches!(
            results[0],
            Err(Error::Conversion(ConversionError::KeyShapeMismatch {
                reason: "schema has no range key",
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn test_create_tables_adds_prefix_and_sequence_table() {
        let store = InMemoryStore::new();
        let _mapper = mapper_with_tables(&store).await;

        for name in ["test_orders", "test_events", "test_tickets", "test_dynamap_sequences"] {
            let description = store.describe_table(name).await.unwrap();
            assert_eq!(description.status, TableStatus::Active);
        }
        assert_eq!(store.calls(Operation::CreateTable), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_ready_for_registrations() {
        let store = InMemoryStore::new().with_activation_describes(2);
        let mapper = Mapper::new(Arc::new(store.clone()), config());
        mapper
            .create_tables(&[Registration::of::<Order>()], &Cancellation::new())
            .await
            .unwrap();

        let report = mapper
            .wait_until_ready(&[Registration::of::<Order>()], &Cancellation::new())
            .await
            .unwrap();

        assert_eq!(report.rounds, 1);
        assert!(report.is_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_failures_surface_as_timeouts() {
        let store = InMemoryStore::new();
        let mapper = mapper_with_tables(&store).await;
        for _ in 0..100 {
            store.fail_next(
                Operation::GetItem,
                StoreError::server(codes::INTERNAL_SERVER_ERROR, "boom"),
            );
        }

        let result = mapper.get::<Order>(1).await;

        assert!(matches!(result, Err(Error::Timeout { .. })));
        assert_eq!(result.unwrap_err().store_code(), Some(codes::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn test_unregistered_type_is_rejected_without_calls() {
        let store = InMemoryStore::new();
        let mapper = mapper_with_tables(&store).await;

        let result = mapper.get::<Note>(1).await;
        assert!(matches!(
            result,
            Err(Error::Schema(SchemaError::TableNotRegistered(_)))
        ));

        let scanned: Vec<Result<Note>> = mapper.scan(ScanOptions::new()).collect().await;
        assert!(matches!(
            scanned.as_slice(),
            [Err(Error::Schema(SchemaError::TableNotRegistered(_)))]
        ));

        assert_eq!(store.calls(Operation::GetItem), 0);
        assert_eq!(store.calls(Operation::Scan), 0);
        assert!(matches!(
            mapper.registry().resolve_table::<Note>(),
            Err(SchemaError::TableNotRegistered(_))
        ));
    }

    #[tokio::test]
    async fn test_explicit_registration_enables_operations() {
        let store = InMemoryStore::new();
        let mapper = mapper_with_tables(&store).await;
        mapper.register::<Note>().unwrap();

        // The table itself was never created.
        let result = mapper.get::<Note>(1).await;

        assert!(matches!(result, Err(Error::ClientRejected(_))));
        assert_eq!(store.calls(Operation::GetItem), 1);
    }
}
