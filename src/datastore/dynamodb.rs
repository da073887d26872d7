//! [`Datastore`] backed by the AWS SDK DynamoDB client.

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::BuildError;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, BillingMode, KeySchemaElement, KeyType as SdkKeyType,
    ProvisionedThroughput, ScalarAttributeType,
};
use std::collections::HashMap;
use std::time::Instant;
use tracing::debug;

use super::{Datastore, TableStatus};
use crate::conversions::{from_item, to_attribute_value, to_item};
use crate::descriptor::{KeyAttribute, KeyType, Provisioning, TableDescriptor};
use crate::errors::{DatastoreError, DatastoreErrorKind, map_sdk_error};
use crate::item::{Attributes, ItemKey};

/// DynamoDB implementation of [`Datastore`].
///
/// Reads are strongly consistent by default so a `get` right after a `put`
/// observes the write.
#[derive(Clone, Debug)]
pub struct DynamoDbDatastore {
    client: Client,
    consistent_reads: bool,
}

impl DynamoDbDatastore {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            consistent_reads: true,
        }
    }

    pub fn with_consistent_reads(mut self, consistent_reads: bool) -> Self {
        self.consistent_reads = consistent_reads;
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn build_error(err: BuildError) -> DatastoreError {
    DatastoreError::new(
        DatastoreErrorKind::Validation,
        format!("Failed to build request: {}", err),
    )
}

fn scalar_type(key_type: KeyType) -> ScalarAttributeType {
    match key_type {
        KeyType::String => ScalarAttributeType::S,
        KeyType::Number => ScalarAttributeType::N,
        KeyType::Binary => ScalarAttributeType::B,
    }
}

fn attribute_definition(key: &KeyAttribute) -> Result<AttributeDefinition, DatastoreError> {
    AttributeDefinition::builder()
        .attribute_name(&key.name)
        .attribute_type(scalar_type(key.key_type))
        .build()
        .map_err(build_error)
}

fn key_schema_element(
    key: &KeyAttribute,
    key_type: SdkKeyType,
) -> Result<KeySchemaElement, DatastoreError> {
    KeySchemaElement::builder()
        .attribute_name(&key.name)
        .key_type(key_type)
        .build()
        .map_err(build_error)
}

/// Build a SET update expression from attribute name/value pairs.
///
/// Names and values go through placeholders so reserved words are safe.
#[allow(clippy::type_complexity)]
pub fn build_set_expression(
    attrs: &Attributes,
) -> (
    String,
    HashMap<String, String>,
    HashMap<String, AttributeValue>,
) {
    let mut set_parts = Vec::with_capacity(attrs.len());
    let mut names = HashMap::new();
    let mut values = HashMap::new();

    for (i, (field, value)) in attrs.iter().enumerate() {
        let name_placeholder = format!("#f{}", i);
        let value_placeholder = format!(":v{}", i);

        set_parts.push(format!("{} = {}", name_placeholder, value_placeholder));
        names.insert(name_placeholder, field.clone());
        values.insert(value_placeholder, to_attribute_value(value));
    }

    let expression = format!("SET {}", set_parts.join(", "));
    (expression, names, values)
}

#[async_trait]
impl Datastore for DynamoDbDatastore {
    async fn list_table_names(&self) -> Result<Vec<String>, DatastoreError> {
        let mut names = Vec::new();
        let mut start: Option<String> = None;

        loop {
            let output = self
                .client
                .list_tables()
                .set_exclusive_start_table_name(start.take())
                .send()
                .await
                .map_err(map_sdk_error)?;

            names.extend(output.table_names().iter().cloned());

            match output.last_evaluated_table_name() {
                Some(last) => start = Some(last.to_string()),
                None => break,
            }
        }

        Ok(names)
    }

    async fn describe_table(&self, name: &str) -> Result<TableStatus, DatastoreError> {
        let output = self
            .client
            .describe_table()
            .table_name(name)
            .send()
            .await
            .map_err(map_sdk_error)?;

        let status = output
            .table()
            .and_then(|t| t.table_status())
            .map(|s| TableStatus::from_wire(s.as_str()))
            .unwrap_or_else(|| TableStatus::Other("UNKNOWN".to_string()));
        Ok(status)
    }

    async fn create_table(
        &self,
        descriptor: &TableDescriptor,
    ) -> Result<TableStatus, DatastoreError> {
        let mut definitions = vec![attribute_definition(descriptor.partition_key())?];
        let mut key_schema = vec![key_schema_element(
            descriptor.partition_key(),
            SdkKeyType::Hash,
        )?];
        if let Some(sort_key) = descriptor.sort_key() {
            definitions.push(attribute_definition(sort_key)?);
            key_schema.push(key_schema_element(sort_key, SdkKeyType::Range)?);
        }

        let mut request = self
            .client
            .create_table()
            .table_name(descriptor.name())
            .set_attribute_definitions(Some(definitions))
            .set_key_schema(Some(key_schema));

        request = match descriptor.provisioning() {
            Provisioning::Provisioned {
                read_capacity_units,
                write_capacity_units,
            } => {
                let throughput = ProvisionedThroughput::builder()
                    .read_capacity_units(read_capacity_units)
                    .write_capacity_units(write_capacity_units)
                    .build()
                    .map_err(build_error)?;
                request
                    .billing_mode(BillingMode::Provisioned)
                    .provisioned_throughput(throughput)
            }
            Provisioning::OnDemand => request.billing_mode(BillingMode::PayPerRequest),
        };

        let output = request.send().await.map_err(map_sdk_error)?;

        let status = output
            .table_description()
            .and_then(|d| d.table_status())
            .map(|s| TableStatus::from_wire(s.as_str()))
            .unwrap_or_else(|| TableStatus::Other("UNKNOWN".to_string()));
        Ok(status)
    }

    async fn delete_table(&self, descriptor: &TableDescriptor) -> Result<(), DatastoreError> {
        self.client
            .delete_table()
            .table_name(descriptor.name())
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(())
    }

    async fn get_item(&self, table: &str, key: &ItemKey) -> Result<Attributes, DatastoreError> {
        let start = Instant::now();
        let output = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(to_item(&key.to_attributes())))
            .consistent_read(self.consistent_reads)
            .send()
            .await
            .map_err(map_sdk_error)?;
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        debug!(table, duration_ms, "get_item");

        match output.item {
            Some(item) => from_item(item),
            None => Err(DatastoreError::item_not_found(format!(
                "Item not found: {}",
                key
            ))),
        }
    }

    async fn put_item(
        &self,
        table: &str,
        key: &ItemKey,
        attrs: &Attributes,
    ) -> Result<(), DatastoreError> {
        let mut item = to_item(attrs);
        item.extend(to_item(&key.to_attributes()));

        let start = Instant::now();
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(map_sdk_error)?;
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        debug!(table, duration_ms, "put_item");
        Ok(())
    }

    async fn update_item(
        &self,
        table: &str,
        key: &ItemKey,
        attrs: &Attributes,
    ) -> Result<(), DatastoreError> {
        let mut request = self
            .client
            .update_item()
            .table_name(table)
            .set_key(Some(to_item(&key.to_attributes())));

        // An update without attributes still upserts the bare key.
        if !attrs.is_empty() {
            let (expression, names, values) = build_set_expression(attrs);
            request = request.update_expression(expression);
            for (placeholder, attr_name) in names {
                request = request.expression_attribute_names(placeholder, attr_name);
            }
            for (placeholder, attr_value) in values {
                request = request.expression_attribute_values(placeholder, attr_value);
            }
        }

        let start = Instant::now();
        request.send().await.map_err(map_sdk_error)?;
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        debug!(table, duration_ms, "update_item");
        Ok(())
    }

    async fn delete_item(&self, table: &str, key: &ItemKey) -> Result<(), DatastoreError> {
        let start = Instant::now();
        self.client
            .delete_item()
            .table_name(table)
            .set_key(Some(to_item(&key.to_attributes())))
            .send()
            .await
            .map_err(map_sdk_error)?;
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        debug!(table, duration_ms, "delete_item");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::AttrValue;

    #[test]
    fn set_expression_uses_placeholders() {
        let mut attrs = Attributes::new();
        attrs.insert("color".into(), AttrValue::from("violet"));
        attrs.insert("size".into(), AttrValue::from(3_i64));

        let (expression, names, values) = build_set_expression(&attrs);
        assert_eq!(expression, "SET #f0 = :v0, #f1 = :v1");
        assert_eq!(names.get("#f0").map(String::as_str), Some("color"));
        assert_eq!(names.get("#f1").map(String::as_str), Some("size"));
        assert_eq!(values.get(":v0"), Some(&AttributeValue::S("violet".into())));
        assert_eq!(values.get(":v1"), Some(&AttributeValue::N("3".into())));
    }

    #[test]
    fn key_types_map_to_scalar_types() {
        assert_eq!(scalar_type(KeyType::String), ScalarAttributeType::S);
        assert_eq!(scalar_type(KeyType::Number), ScalarAttributeType::N);
        assert_eq!(scalar_type(KeyType::Binary), ScalarAttributeType::B);

        let definition = attribute_definition(&KeyAttribute::string("id")).unwrap();
        assert_eq!(definition.attribute_name(), "id");
    }
}
