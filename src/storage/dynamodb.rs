use crate::error::{MigrationError, Result};
use crate::storage::models::{Item, ATTR_UPDATED};
use async_trait::async_trait;
use aws_sdk_dynamodb::operation::scan::builders::ScanFluentBuilder;
use aws_sdk_dynamodb::types::{AttributeValue, PutRequest, WriteRequest};
use aws_sdk_dynamodb::Client;

/// Grenze inklusive: ein Item mit `Updated == cutoff` gehört zum Export
const UPDATED_SINCE_FILTER: &str = "#updated >= :cutoff";

/// Zugriff auf den Table Store, im Test durch `MockTableStore` ersetzt
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Alle Items mit `Updated >= cutoff`, über alle Scan Seiten hinweg
    async fn scan_updated_since(&self, table: &str, cutoff: i64) -> Result<Vec<Item>>;

    /// Ein BatchWriteItem Aufruf, höchstens 25 Items
    async fn batch_put(&self, table: &str, items: Vec<Item>) -> Result<()>;
}

/// DynamoDB Storage Layer
pub struct DynamoDBStore {
    client: Client,
}

impl DynamoDBStore {
    /// Erstelle neue DynamoDB Store Instanz aus einer geladenen SDK Config
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        let client = Client::new(sdk_config);
        Self { client }
    }

    fn scan_request(
        &self,
        table: &str,
        cutoff: i64,
        start_key: Option<Item>,
    ) -> ScanFluentBuilder {
        self.client
            .scan()
            .table_name(table)
            .filter_expression(UPDATED_SINCE_FILTER)
            .expression_attribute_names("#updated", ATTR_UPDATED)
            .expression_attribute_values(":cutoff", AttributeValue::N(cutoff.to_string()))
            .set_exclusive_start_key(start_key)
    }
}

#[async_trait]
impl TableStore for DynamoDBStore {
    async fn scan_updated_since(&self, table: &str, cutoff: i64) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        let mut start_key = None;

        loop {
            let page = self
                .scan_request(table, cutoff, start_key)
                .send()
                .await
                .map_err(|e| MigrationError::remote(format!("scan of table {}", table), e))?;

            let page_items = page.items.unwrap_or_default();
            tracing::debug!(table, count = page_items.len(), "Scan page received");
            items.extend(page_items);

            start_key = page.last_evaluated_key.filter(|key| !key.is_empty());
            if start_key.is_none() {
                break;
            }
        }

        Ok(items)
    }

    async fn batch_put(&self, table: &str, items: Vec<Item>) -> Result<()> {
        let requests = items
            .into_iter()
            .map(|item| {
                PutRequest::builder()
                    .set_item(Some(item))
                    .build()
                    .map(|put| WriteRequest::builder().put_request(put).build())
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| MigrationError::remote("building put request", e))?;

        let output = self
            .client
            .batch_write_item()
            .request_items(table, requests)
            .send()
            .await
            .map_err(|e| MigrationError::remote(format!("batch write to table {}", table), e))?;

        let unprocessed = output
            .unprocessed_items
            .as_ref()
            .and_then(|pending| pending.get(table))
            .map(Vec::len)
            .unwrap_or(0);
        if unprocessed > 0 {
            return Err(MigrationError::UnprocessedItems {
                table: table.to_string(),
                count: unprocessed,
            });
        }

        Ok(())
    }
}
