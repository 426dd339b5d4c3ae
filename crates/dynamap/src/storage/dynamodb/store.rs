//! DynamoDB `StoreClient` implementation.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, DeleteRequest, KeySchemaElement, KeyType, KeysAndAttributes,
    PutRequest, ReturnValue, ScalarAttributeType, TableStatus as AwsTableStatus,
    WriteRequest as AwsWriteRequest,
};
use aws_sdk_dynamodb::Client;

use dynamap_core::store::{
    BatchGetOutput, BatchGetRequest, BatchWriteOutput, BatchWriteRequest, CreateTableRequest,
    DeleteItemRequest, GetItemRequest, Item, ItemPage, KeyAttribute, ListTablesRequest,
    PutItemRequest, QueryRequest, ReturnValues, ScalarType, ScanRequest, StoreClient, StoreError,
    StoreResult, TableDescription, TableNamePage, TableStatus, UpdateItemRequest, WriteRequest,
};

use super::conversions::{item_from_aws, item_to_aws, items_from_aws};
use super::error::{map_build_error, map_sdk_error};
use super::expressions::Expression;
use crate::config::Config;

/// DynamoDB-backed store.
///
/// Performs exactly one SDK call per operation; retries are left to the
/// executor.
#[derive(Debug, Clone)]
pub struct DynamoDbStore {
    client: Client,
}

impl DynamoDbStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a store from configuration.
    ///
    /// Uses the AWS SDK default credential chain with the configured region
    /// and, when set, a custom endpoint such as DynamoDB Local.
    pub async fn from_config(config: &Config) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.aws_region.clone()));

        if let Some(endpoint) = &config.aws_endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        tracing::info!(
            region = %config.aws_region,
            endpoint = ?config.aws_endpoint_url,
            "Connected DynamoDB store"
        );
        Self::new(Client::new(&sdk_config))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn page_limit(page_size: Option<u32>) -> Option<i32> {
    page_size.map(|size| i32::try_from(size).unwrap_or(i32::MAX))
}

fn return_value(values: ReturnValues) -> ReturnValue {
    match values {
        ReturnValues::None => ReturnValue::None,
        ReturnValues::AllNew => ReturnValue::AllNew,
        ReturnValues::UpdatedNew => ReturnValue::UpdatedNew,
    }
}

fn scalar_type(scalar: ScalarType) -> ScalarAttributeType {
    match scalar {
        ScalarType::S => ScalarAttributeType::S,
        ScalarType::N => ScalarAttributeType::N,
        ScalarType::B => ScalarAttributeType::B,
    }
}

fn key_definitions(
    key: &KeyAttribute,
    key_type: KeyType,
) -> StoreResult<(KeySchemaElement, AttributeDefinition)> {
    let element = KeySchemaElement::builder()
        .attribute_name(&key.name)
        .key_type(key_type)
        .build()
        .map_err(map_build_error)?;
    let definition = AttributeDefinition::builder()
        .attribute_name(&key.name)
        .attribute_type(scalar_type(key.scalar))
        .build()
        .map_err(map_build_error)?;
    Ok((element, definition))
}

fn table_status(status: Option<&AwsTableStatus>) -> TableStatus {
    match status {
        Some(AwsTableStatus::Active) => TableStatus::Active,
        Some(AwsTableStatus::Creating) => TableStatus::Creating,
        Some(AwsTableStatus::Deleting) => TableStatus::Deleting,
        _ => TableStatus::Updating,
    }
}

fn write_to_aws(write: WriteRequest) -> StoreResult<AwsWriteRequest> {
    let request = match write {
        WriteRequest::Put(item) => AwsWriteRequest::builder().put_request(
            PutRequest::builder()
                .set_item(Some(item_to_aws(item)))
                .build()
                .map_err(map_build_error)?,
        ),
        WriteRequest::Delete(key) => AwsWriteRequest::builder().delete_request(
            DeleteRequest::builder()
                .set_key(Some(item_to_aws(key)))
                .build()
                .map_err(map_build_error)?,
        ),
    };
    Ok(request.build())
}

fn write_from_aws(write: AwsWriteRequest) -> StoreResult<Option<WriteRequest>> {
    if let Some(put) = write.put_request() {
        return Ok(Some(WriteRequest::Put(item_from_aws(put.item().clone())?)));
    }
    if let Some(delete) = write.delete_request() {
        return Ok(Some(WriteRequest::Delete(item_from_aws(delete.key().clone())?)));
    }
    Ok(None)
}

#[async_trait]
impl StoreClient for DynamoDbStore {
    async fn get_item(&self, request: GetItemRequest) -> StoreResult<Option<Item>> {
        let output = self
            .client
            .get_item()
            .table_name(request.table_name)
            .set_key(Some(item_to_aws(request.key)))
            .consistent_read(request.consistent_read)
            .send()
            .await
            .map_err(|e| map_sdk_error("GetItem", e))?;

        output.item.map(item_from_aws).transpose()
    }

    async fn put_item(&self, request: PutItemRequest) -> StoreResult<()> {
        let mut expression = Expression::new();
        let condition = request
            .condition
            .as_ref()
            .map(|condition| expression.condition(condition));
        let (names, values) = expression.into_bindings();

        self.client
            .put_item()
            .table_name(request.table_name)
            .set_item(Some(item_to_aws(request.item)))
            .set_condition_expression(condition)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(values)
            .send()
            .await
            .map_err(|e| map_sdk_error("PutItem", e))?;

        Ok(())
    }

    async fn update_item(&self, request: UpdateItemRequest) -> StoreResult<Option<Item>> {
        let mut expression = Expression::new();
        let update = expression.update(&request.actions);
        let condition = request
            .condition
            .as_ref()
            .map(|condition| expression.condition(condition));
        let (names, values) = expression.into_bindings();

        let output = self
            .client
            .update_item()
            .table_name(request.table_name)
            .set_key(Some(item_to_aws(request.key)))
            .set_update_expression(update)
            .set_condition_expression(condition)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(values)
            .return_values(return_value(request.return_values))
            .send()
            .await
            .map_err(|e| map_sdk_error("UpdateItem", e))?;

        output.attributes.map(item_from_aws).transpose()
    }

    async fn delete_item(&self, request: DeleteItemRequest) -> StoreResult<()> {
        let mut expression = Expression::new();
        let condition = request
            .condition
            .as_ref()
            .map(|condition| expression.condition(condition));
        let (names, values) = expression.into_bindings();

        self.client
            .delete_item()
            .table_name(request.table_name)
            .set_key(Some(item_to_aws(request.key)))
            .set_condition_expression(condition)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(values)
            .send()
            .await
            .map_err(|e| map_sdk_error("DeleteItem", e))?;

        Ok(())
    }

    async fn batch_get_item(&self, request: BatchGetRequest) -> StoreResult<BatchGetOutput> {
        let keys = KeysAndAttributes::builder()
            .set_keys(Some(request.keys.into_iter().map(item_to_aws).collect()))
            .consistent_read(request.consistent_read)
            .build()
            .map_err(map_build_error)?;

        let output = self
            .client
            .batch_get_item()
            .request_items(request.table_name.clone(), keys)
            .send()
            .await
            .map_err(|e| map_sdk_error("BatchGetItem", e))?;

        let items = output
            .responses
            .and_then(|mut responses| responses.remove(&request.table_name))
            .unwrap_or_default();
        let unprocessed_keys = output
            .unprocessed_keys
            .and_then(|mut unprocessed| unprocessed.remove(&request.table_name))
            .map(|keys| keys.keys().to_vec())
            .unwrap_or_default();

        Ok(BatchGetOutput {
            items: items_from_aws(items)?,
            unprocessed_keys: items_from_aws(unprocessed_keys)?,
        })
    }

    async fn batch_write_item(&self, request: BatchWriteRequest) -> StoreResult<BatchWriteOutput> {
        let writes = request
            .writes
            .into_iter()
            .map(write_to_aws)
            .collect::<StoreResult<Vec<_>>>()?;

        let output = self
            .client
            .batch_write_item()
            .request_items(request.table_name.clone(), writes)
            .send()
            .await
            .map_err(|e| map_sdk_error("BatchWriteItem", e))?;

        let unprocessed = output
            .unprocessed_items
            .and_then(|mut unprocessed| unprocessed.remove(&request.table_name))
            .unwrap_or_default()
            .into_iter()
            .filter_map(|write| write_from_aws(write).transpose())
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(BatchWriteOutput { unprocessed })
    }

    async fn scan(&self, request: ScanRequest) -> StoreResult<ItemPage> {
        // Secondary indexes do not support consistent reads.
        let consistent_read = request.consistent_read && request.index_name.is_none();

        let output = self
            .client
            .scan()
            .table_name(request.table_name)
            .set_index_name(request.index_name)
            .set_limit(page_limit(request.page_size))
            .consistent_read(consistent_read)
            .set_exclusive_start_key(request.exclusive_start_key.map(item_to_aws))
            .send()
            .await
            .map_err(|e| map_sdk_error("Scan", e))?;

        Ok(ItemPage {
            items: items_from_aws(output.items.unwrap_or_default())?,
            last_evaluated_key: output.last_evaluated_key.map(item_from_aws).transpose()?,
        })
    }

    async fn query(&self, request: QueryRequest) -> StoreResult<ItemPage> {
        let consistent_read = request.consistent_read && request.index_name.is_none();
        let mut expression = Expression::new();
        let key_condition = expression.key_condition(&request.key_condition);
        let (names, values) = expression.into_bindings();

        let output = self
            .client
            .query()
            .table_name(request.table_name)
            .set_index_name(request.index_name)
            .key_condition_expression(key_condition)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(values)
            .scan_index_forward(request.scan_forward)
            .set_limit(page_limit(request.page_size))
            .consistent_read(consistent_read)
            .set_exclusive_start_key(request.exclusive_start_key.map(item_to_aws))
            .send()
            .await
            .map_err(|e| map_sdk_error("Query", e))?;

        Ok(ItemPage {
            items: items_from_aws(output.items.unwrap_or_default())?,
            last_evaluated_key: output.last_evaluated_key.map(item_from_aws).transpose()?,
        })
    }

    async fn create_table(&self, request: CreateTableRequest) -> StoreResult<()> {
        let (hash_element, hash_definition) = key_definitions(&request.hash_key, KeyType::Hash)?;
        let mut key_schema = vec![hash_element];
        let mut attribute_definitions = vec![hash_definition];

        if let Some(range_key) = &request.range_key {
            let (element, definition) = key_definitions(range_key, KeyType::Range)?;
            key_schema.push(element);
            attribute_definitions.push(definition);
        }

        self.client
            .create_table()
            .table_name(&request.table_name)
            .set_key_schema(Some(key_schema))
            .set_attribute_definitions(Some(attribute_definitions))
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await
            .map_err(|e| map_sdk_error("CreateTable", e))?;

        tracing::debug!(table = %request.table_name, "Requested table creation");
        Ok(())
    }

    async fn describe_table(&self, table_name: &str) -> StoreResult<TableDescription> {
        let output = self
            .client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(|e| map_sdk_error("DescribeTable", e))?;

        let table = output
            .table()
            .ok_or_else(|| StoreError::table_not_found(table_name))?;

        Ok(TableDescription {
            table_name: table_name.to_string(),
            status: table_status(table.table_status()),
        })
    }

    async fn list_tables(&self, request: ListTablesRequest) -> StoreResult<TableNamePage> {
        let output = self
            .client
            .list_tables()
            .set_exclusive_start_table_name(request.exclusive_start_table_name)
            .set_limit(page_limit(request.limit))
            .send()
            .await
            .map_err(|e| map_sdk_error("ListTables", e))?;

        Ok(TableNamePage {
            table_names: output.table_names.unwrap_or_default(),
            last_evaluated_table_name: output.last_evaluated_table_name,
        })
    }
}
