//! DynamoDB record store
//!
//! Talks to the managed tables through the AWS SDK. Scans return the
//! first page only; a truncated scan is logged but never continued.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_dynamodb::types::AttributeValue as DynamoValue;

use crate::config::DynamoDbConfig;
use crate::data::{AttributeValue, Filter, KEY_ATTRIBUTE, Record, RecordStore};
use crate::error::AppError;
use crate::metrics::observe_store_operation;

/// DynamoDB-backed record store
pub struct DynamoStore {
    client: DynamoClient,
}

impl DynamoStore {
    /// Create new DynamoDB client
    ///
    /// # Arguments
    /// * `config` - Region, optional endpoint and static credentials
    ///
    /// # Errors
    /// Returns error if credentials are missing
    pub fn new(config: &DynamoDbConfig) -> Result<Self, AppError> {
        use aws_sdk_dynamodb::config::{BehaviorVersion, Credentials, Region};

        let (Some(access_key_id), Some(secret_access_key)) =
            (&config.access_key_id, &config.secret_access_key)
        else {
            return Err(AppError::Config(
                "DynamoDB credentials are not configured".to_string(),
            ));
        };

        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            config.session_token.clone(),
            None,
            "friendsync-dynamodb",
        );

        let mut builder = aws_sdk_dynamodb::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .http_client(super::build_http_client())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        tracing::info!(
            region = %config.region,
            endpoint = config.endpoint_url.as_deref().unwrap_or("default"),
            "DynamoDB client configured"
        );

        Ok(Self {
            client: DynamoClient::from_conf(builder.build()),
        })
    }

    /// Wrap an already configured SDK client
    pub fn from_client(client: DynamoClient) -> Self {
        Self { client }
    }
}

fn to_dynamo(value: &AttributeValue) -> DynamoValue {
    match value {
        AttributeValue::S(s) => DynamoValue::S(s.clone()),
        AttributeValue::N(n) => DynamoValue::N(n.clone()),
        AttributeValue::Bool(b) => DynamoValue::Bool(*b),
        AttributeValue::Null(null) => DynamoValue::Null(*null),
        AttributeValue::L(items) => DynamoValue::L(items.iter().map(to_dynamo).collect()),
        AttributeValue::M(map) => DynamoValue::M(to_dynamo_item(map)),
    }
}

/// Sets and binary values have no counterpart and are dropped.
fn from_dynamo(value: &DynamoValue) -> Option<AttributeValue> {
    match value {
        DynamoValue::S(s) => Some(AttributeValue::S(s.clone())),
        DynamoValue::N(n) => Some(AttributeValue::N(n.clone())),
        DynamoValue::Bool(b) => Some(AttributeValue::Bool(*b)),
        DynamoValue::Null(null) => Some(AttributeValue::Null(*null)),
        DynamoValue::L(items) => Some(AttributeValue::L(
            items.iter().filter_map(from_dynamo).collect(),
        )),
        DynamoValue::M(map) => Some(AttributeValue::M(from_dynamo_item(map))),
        _ => None,
    }
}

fn to_dynamo_item(record: &Record) -> HashMap<String, DynamoValue> {
    record
        .iter()
        .map(|(name, value)| (name.clone(), to_dynamo(value)))
        .collect()
}

fn from_dynamo_item(item: &HashMap<String, DynamoValue>) -> Record {
    item.iter()
        .filter_map(|(name, value)| from_dynamo(value).map(|v| (name.clone(), v)))
        .collect()
}

/// Filter rendered as a DynamoDB filter expression
///
/// Attribute names go through `#fN` placeholders so reserved words
/// such as `name` or `date` stay usable.
struct FilterExpression {
    expression: String,
    names: HashMap<String, String>,
    values: HashMap<String, DynamoValue>,
}

fn render_filter(filter: &Filter) -> Option<FilterExpression> {
    if filter.is_empty() {
        return None;
    }

    let mut clauses = Vec::with_capacity(filter.conditions().len());
    let mut names = HashMap::new();
    let mut values = HashMap::new();
    for (index, (attribute, value)) in filter.conditions().iter().enumerate() {
        let name_placeholder = format!("#f{index}");
        let value_placeholder = format!(":v{index}");
        clauses.push(format!("{name_placeholder} = {value_placeholder}"));
        names.insert(name_placeholder, attribute.clone());
        values.insert(value_placeholder, to_dynamo(value));
    }

    Some(FilterExpression {
        expression: clauses.join(" AND "),
        names,
        values,
    })
}

#[async_trait]
impl RecordStore for DynamoStore {
    async fn get(&self, table: &str, key: &str) -> Result<Option<Record>, AppError> {
        let started = Instant::now();
        let output = self
            .client
            .get_item()
            .table_name(table)
            .key(KEY_ATTRIBUTE, DynamoValue::S(key.to_string()))
            .send()
            .await
            .map_err(|e| {
                observe_store_operation("get", table, "error", started.elapsed());
                AppError::Transport(format!("DynamoDB get_item failed: {}", e))
            })?;
        observe_store_operation("get", table, "success", started.elapsed());

        Ok(output.item().map(from_dynamo_item))
    }

    async fn scan(&self, table: &str, filter: &Filter) -> Result<Vec<Record>, AppError> {
        let mut request = self.client.scan().table_name(table);
        if let Some(rendered) = render_filter(filter) {
            request = request
                .filter_expression(rendered.expression)
                .set_expression_attribute_names(Some(rendered.names))
                .set_expression_attribute_values(Some(rendered.values));
        }

        let started = Instant::now();
        let output = request.send().await.map_err(|e| {
            observe_store_operation("scan", table, "error", started.elapsed());
            AppError::Transport(format!("DynamoDB scan failed: {}", e))
        })?;
        observe_store_operation("scan", table, "success", started.elapsed());

        if output.last_evaluated_key().is_some() {
            tracing::warn!(
                table = %table,
                returned = output.items().len(),
                "Scan result truncated; only the first page is used"
            );
        }

        Ok(output.items().iter().map(from_dynamo_item).collect())
    }

    async fn put(&self, table: &str, record: Record) -> Result<(), AppError> {
        if crate::data::record_key(&record).is_none() {
            return Err(AppError::MalformedRecord(format!(
                "put into {table} without `id`"
            )));
        }

        let started = Instant::now();
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(to_dynamo_item(&record)))
            .send()
            .await
            .map_err(|e| {
                observe_store_operation("put", table, "error", started.elapsed());
                AppError::Transport(format!("DynamoDB put_item failed: {}", e))
            })?;
        observe_store_operation("put", table, "success", started.elapsed());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Friend, Item};
    use crate::test_support::CapturedLogs;
    use aws_sdk_dynamodb::config::{BehaviorVersion, Credentials, Region};
    use aws_smithy_runtime::client::http::test_util::{ReplayEvent, StaticReplayClient};
    use aws_smithy_types::body::SdkBody;

    fn request() -> http::Request<SdkBody> {
        http::Request::builder()
            .uri("https://dynamodb.us-east-1.amazonaws.com/")
            .body(SdkBody::empty())
            .unwrap()
    }

    fn response(status: u16, body: &str) -> http::Response<SdkBody> {
        http::Response::builder()
            .status(status)
            .header("content-type", "application/x-amz-json-1.0")
            .body(SdkBody::from(body.to_string()))
            .unwrap()
    }

    fn replay_store(responses: Vec<http::Response<SdkBody>>) -> (DynamoStore, StaticReplayClient) {
        let http_client = StaticReplayClient::new(
            responses
                .into_iter()
                .map(|response| ReplayEvent::new(request(), response))
                .collect(),
        );
        let config = aws_sdk_dynamodb::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("AKID", "SECRET", None, None, "test"))
            .http_client(http_client.clone())
            .build();
        (
            DynamoStore::from_client(DynamoClient::from_conf(config)),
            http_client,
        )
    }

    fn sent_json(http_client: &StaticReplayClient, index: usize) -> serde_json::Value {
        let request = http_client
            .actual_requests()
            .nth(index)
            .expect("request was sent");
        serde_json::from_slice(request.body().bytes().expect("body is in memory")).unwrap()
    }

    #[tokio::test]
    async fn test_get_maps_item_and_missing_item() {
        let (store, http_client) = replay_store(vec![
            response(200, r#"{"Item":{"id":{"S":"u1"},"username":{"S":"alice"}}}"#),
            response(200, "{}"),
        ]);

        let record = store.get("User", "u1").await.unwrap().unwrap();
        assert_eq!(crate::data::record_key(&record), Some("u1"));
        assert_eq!(record.get("username"), Some(&AttributeValue::from("alice")));
        assert!(store.get("User", "u9").await.unwrap().is_none());

        let sent = sent_json(&http_client, 0);
        assert_eq!(sent["TableName"], "User");
        assert_eq!(sent["Key"]["id"]["S"], "u1");
    }

    #[tokio::test]
    async fn test_scan_sends_filter_and_warns_on_truncation() {
        let (store, http_client) = replay_store(vec![response(
            200,
            r#"{"Items":[{"id":{"S":"f1"},"user_id":{"S":"u1"},"friend_id":{"S":"u2"}}],
                "Count":1,"ScannedCount":1,"LastEvaluatedKey":{"id":{"S":"f1"}}}"#,
        )]);
        let logs = CapturedLogs::default();
        let _guard = logs.install();

        let records = store
            .scan("Friend", &Filter::equals("user_id", "u1"))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(crate::data::record_key(&records[0]), Some("f1"));
        assert!(logs.contents().contains("Scan result truncated"));

        let sent = sent_json(&http_client, 0);
        assert_eq!(sent["TableName"], "Friend");
        assert_eq!(sent["FilterExpression"], "#f0 = :v0");
        assert_eq!(sent["ExpressionAttributeNames"]["#f0"], "user_id");
        assert_eq!(sent["ExpressionAttributeValues"][":v0"]["S"], "u1");
    }

    #[tokio::test]
    async fn test_unfiltered_scan_sends_no_expression() {
        let (store, http_client) =
            replay_store(vec![response(200, r#"{"Items":[],"Count":0,"ScannedCount":0}"#)]);

        assert!(store.scan("User", &Filter::all()).await.unwrap().is_empty());

        let sent = sent_json(&http_client, 0);
        assert!(sent.get("FilterExpression").is_none());
    }

    #[tokio::test]
    async fn test_put_sends_item() {
        let (store, http_client) = replay_store(vec![response(200, "{}")]);

        store
            .put("Friend", Friend::new("u1", "u2").to_record())
            .await
            .unwrap();

        let sent = sent_json(&http_client, 0);
        assert_eq!(sent["TableName"], "Friend");
        assert_eq!(sent["Item"]["user_id"]["S"], "u1");
        assert_eq!(sent["Item"]["friend_id"]["S"], "u2");
    }

    #[tokio::test]
    async fn test_service_error_is_transport() {
        let (store, _http_client) = replay_store(vec![response(
            400,
            r#"{"__type":"com.amazonaws.dynamodb.v20120810#ResourceNotFoundException",
                "message":"Requested resource not found"}"#,
        )]);

        let result = store.scan("Missing", &Filter::all()).await;
        assert!(matches!(result, Err(AppError::Transport(_))));
    }

    #[tokio::test]
    async fn test_put_without_key_sends_nothing() {
        let (store, http_client) = replay_store(Vec::new());

        let result = store.put("User", Record::new()).await;
        assert!(matches!(result, Err(AppError::MalformedRecord(_))));
        assert_eq!(http_client.actual_requests().count(), 0);
    }

    #[test]
    fn empty_filter_renders_nothing() {
        assert!(render_filter(&Filter::all()).is_none());
    }

    #[test]
    fn filter_uses_placeholders() {
        let rendered = render_filter(&Filter::equals("user_id", "u1").and_equals("name", "x")).unwrap();

        assert_eq!(rendered.expression, "#f0 = :v0 AND #f1 = :v1");
        assert_eq!(rendered.names["#f0"], "user_id");
        assert_eq!(rendered.names["#f1"], "name");
        assert_eq!(rendered.values[":v0"], DynamoValue::S("u1".to_string()));
    }

    #[test]
    fn item_conversion_keeps_supported_types() {
        let mut nested = Record::new();
        nested.insert("theme".to_string(), "dark".into());

        let mut record = Record::new();
        record.insert("id".to_string(), "u1".into());
        record.insert("age".to_string(), AttributeValue::N("31".to_string()));
        record.insert("verified".to_string(), AttributeValue::Bool(false));
        record.insert("avatar".to_string(), AttributeValue::Null(true));
        record.insert(
            "tags".to_string(),
            AttributeValue::L(vec!["a".into(), "b".into()]),
        );
        record.insert("settings".to_string(), AttributeValue::M(nested));

        let item = to_dynamo_item(&record);
        assert_eq!(item["avatar"], DynamoValue::Null(true));
        assert_eq!(from_dynamo_item(&item), record);
    }

    #[test]
    fn string_sets_are_dropped() {
        let mut item = HashMap::new();
        item.insert("id".to_string(), DynamoValue::S("u1".to_string()));
        item.insert(
            "roles".to_string(),
            DynamoValue::Ss(vec!["admin".to_string()]),
        );

        let record = from_dynamo_item(&item);
        assert_eq!(record.len(), 1);
        assert_eq!(crate::data::record_key(&record), Some("u1"));
    }

    #[test]
    fn new_requires_credentials() {
        let result = DynamoStore::new(&DynamoDbConfig::default());
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
