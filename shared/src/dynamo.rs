//! DynamoDB-backed stores.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::retry::RetryConfig;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use tokio::sync::OnceCell;
use tracing::info;

use crate::models::{Attendance, OpenHouse};
use crate::store::{AttendeeStore, OpenHouseStore};
use crate::{Config, Error, Result};

type Item = HashMap<String, AttributeValue>;

/// Process-wide DynamoDB client, built on first use.
static CLIENT: OnceCell<Client> = OnceCell::const_new();

/// Get the shared DynamoDB client, building it from `config` on first call.
///
/// Later calls return the same client; their `config` is ignored.
pub async fn client(config: &Config) -> &'static Client {
    CLIENT.get_or_init(|| build_client(config)).await
}

async fn build_client(config: &Config) -> Client {
    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.aws_region.clone()))
        .load()
        .await;

    let mut builder = aws_sdk_dynamodb::config::Builder::from(&sdk_config);
    if let Some(endpoint) = &config.endpoint_override {
        builder = builder.endpoint_url(endpoint);
    }
    if let Some(max_retries) = config.max_retries {
        let attempts = max_retries.saturating_add(1);
        builder = builder.retry_config(RetryConfig::standard().with_max_attempts(attempts));
    }

    info!(
        region = %config.aws_region,
        endpoint_override = ?config.endpoint_override,
        max_retries = ?config.max_retries,
        "Initialized DynamoDB client"
    );

    Client::from_conf(builder.build())
}

/// Open houses table, plus the attendees table for counter setup and teardown.
#[derive(Debug, Clone)]
pub struct DynamoOpenHouseStore {
    client: Client,
    open_houses_table: String,
    attendees_table: String,
}

impl DynamoOpenHouseStore {
    pub fn new(client: Client, open_houses_table: String, attendees_table: String) -> Self {
        Self {
            client,
            open_houses_table,
            attendees_table,
        }
    }
}

#[async_trait]
impl OpenHouseStore for DynamoOpenHouseStore {
    async fn scan_open_houses(&self) -> Result<Vec<OpenHouse>> {
        let mut open_houses = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let output = self
                .client
                .scan()
                .table_name(&self.open_houses_table)
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(|e| aws_error("scan", &self.open_houses_table, e))?;

            for item in output.items() {
                open_houses.push(open_house_from_item(item)?);
            }

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(open_houses)
    }

    async fn get_open_house(&self, uuid: &str) -> Result<Option<OpenHouse>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.open_houses_table)
            .key("uuid", AttributeValue::S(uuid.to_string()))
            .send()
            .await
            .map_err(|e| aws_error("get", &self.open_houses_table, e))?;

        output.item().map(open_house_from_item).transpose()
    }

    async fn put_open_house(&self, open_house: &OpenHouse) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.open_houses_table)
            .set_item(Some(open_house_item(open_house)))
            .send()
            .await
            .map_err(|e| aws_error("put", &self.open_houses_table, e))?;
        Ok(())
    }

    async fn delete_open_house(&self, uuid: &str) -> Result<()> {
        delete_by_uuid(&self.client, &self.open_houses_table, uuid).await
    }

    async fn put_attendees(&self, attendance: &Attendance) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.attendees_table)
            .set_item(Some(attendance_item(attendance)))
            .send()
            .await
            .map_err(|e| aws_error("put", &self.attendees_table, e))?;
        Ok(())
    }

    async fn delete_attendees(&self, uuid: &str) -> Result<()> {
        delete_by_uuid(&self.client, &self.attendees_table, uuid).await
    }
}

/// Attendees table on its own.
#[derive(Debug, Clone)]
pub struct DynamoAttendeeStore {
    client: Client,
    table: String,
}

impl DynamoAttendeeStore {
    pub fn new(client: Client, table: String) -> Self {
        Self { client, table }
    }
}

#[async_trait]
impl AttendeeStore for DynamoAttendeeStore {
    async fn attendees_exist(&self, uuid: &str) -> Result<bool> {
        Ok(self.get_attendees(uuid).await?.is_some())
    }

    async fn get_attendees(&self, uuid: &str) -> Result<Option<Attendance>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key("uuid", AttributeValue::S(uuid.to_string()))
            .send()
            .await
            .map_err(|e| aws_error("get", &self.table, e))?;

        output.item().map(attendance_from_item).transpose()
    }

    async fn increment_attendees(&self, uuid: &str) -> Result<()> {
        self.client
            .update_item()
            .table_name(&self.table)
            .key("uuid", AttributeValue::S(uuid.to_string()))
            .update_expression("SET attendees = attendees + :incr")
            .expression_attribute_values(":incr", AttributeValue::N("1".to_string()))
            .send()
            .await
            .map_err(|e| aws_error("update", &self.table, e))?;
        Ok(())
    }
}

async fn delete_by_uuid(client: &Client, table: &str, uuid: &str) -> Result<()> {
    client
        .delete_item()
        .table_name(table)
        .key("uuid", AttributeValue::S(uuid.to_string()))
        .send()
        .await
        .map_err(|e| aws_error("delete", table, e))?;
    Ok(())
}

fn aws_error<E: std::error::Error>(operation: &str, table: &str, err: E) -> Error {
    Error::Aws(format!(
        "Failed to {} on {}: {}",
        operation,
        table,
        DisplayErrorContext(&err)
    ))
}

fn open_house_item(open_house: &OpenHouse) -> Item {
    HashMap::from([
        ("uuid".to_string(), AttributeValue::S(open_house.uuid.clone())),
        ("name".to_string(), AttributeValue::S(open_house.name.clone())),
        ("date".to_string(), AttributeValue::N(open_house.date.to_string())),
        ("info".to_string(), AttributeValue::S(open_house.info.clone())),
        ("visible".to_string(), AttributeValue::Bool(open_house.visible)),
    ])
}

fn open_house_from_item(item: &Item) -> Result<OpenHouse> {
    Ok(OpenHouse {
        uuid: string_attr(item, "uuid")?,
        name: string_attr(item, "name")?,
        date: number_attr(item, "date")?,
        info: string_attr(item, "info")?,
        visible: item
            .get("visible")
            .and_then(|v| v.as_bool().ok())
            .copied()
            .ok_or_else(|| malformed("visible"))?,
    })
}

fn attendance_item(attendance: &Attendance) -> Item {
    HashMap::from([
        ("uuid".to_string(), AttributeValue::S(attendance.uuid.clone())),
        ("attendees".to_string(), AttributeValue::N(attendance.attendees.to_string())),
    ])
}

fn attendance_from_item(item: &Item) -> Result<Attendance> {
    Ok(Attendance {
        uuid: string_attr(item, "uuid")?,
        attendees: number_attr(item, "attendees")?,
    })
}

fn string_attr(item: &Item, key: &str) -> Result<String> {
    item.get(key)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| malformed(key))
}

fn number_attr<T: std::str::FromStr>(item: &Item, key: &str) -> Result<T> {
    item.get(key)
        .and_then(|v| v.as_n().ok())
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| malformed(key))
}

fn malformed(key: &str) -> Error {
    Error::Internal(format!("Stored item has missing or malformed '{}'", key))
}
