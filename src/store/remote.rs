use crate::core::config::RemoteStoreConfig;
use crate::core::model::{Asset, Record, RecordId, Transaction};
use crate::core::repository::Repository;
use crate::providers::util::{http_client, with_retry};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Number, Value, json};
use tracing::{debug, instrument, warn};

const PAGE_SIZE: usize = 300;

/// Repository backed by a Firestore-style REST document store.
///
/// Each record is a document named by its id inside a collection named
/// after the record type.
pub struct RemoteRepository {
    base_url: String,
    project_id: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl RemoteRepository {
    pub fn new(config: &RemoteStoreConfig) -> Result<Self> {
        Ok(RemoteRepository {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            api_key: config.api_key.clone(),
            client: http_client()?,
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents/{}",
            self.base_url, self.project_id, collection
        )
    }

    fn document_url(&self, collection: &str, id: &RecordId) -> String {
        format!("{}/{}", self.collection_url(collection), id)
    }

    fn auth_query(&self) -> Vec<(&'static str, String)> {
        self.api_key
            .iter()
            .map(|key| ("key", key.clone()))
            .collect()
    }

    #[instrument(name = "RemoteList", skip(self), fields(collection = T::COLLECTION))]
    async fn list<T: Record>(&self) -> Result<Vec<T>> {
        let url = self.collection_url(T::COLLECTION);
        let mut records = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = self.auth_query();
            query.push(("pageSize", PAGE_SIZE.to_string()));
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let response = with_retry(|| self.client.get(&url).query(&query).send(), 3, 500)
                .await
                .with_context(|| format!("Failed to list {}", T::COLLECTION))?;
            let response = check_status(response, T::COLLECTION).await?;
            let page: ListDocumentsResponse = response
                .json()
                .await
                .with_context(|| format!("Failed to parse {} listing", T::COLLECTION))?;

            for document in page.documents {
                match decode_document::<T>(&document) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        warn!(document = %document.name, "Skipping malformed document: {e:#}")
                    }
                }
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("Listed {} {}", records.len(), T::COLLECTION);
        Ok(records)
    }

    #[instrument(
        name = "RemotePut",
        skip(self, record),
        fields(collection = T::COLLECTION, id = %record.id())
    )]
    async fn put<T: Record>(&self, record: &T) -> Result<()> {
        let url = self.document_url(T::COLLECTION, record.id());
        let body = encode_document(record)?;
        let query = self.auth_query();

        let response = with_retry(
            || self.client.patch(&url).query(&query).json(&body).send(),
            3,
            500,
        )
        .await
        .with_context(|| format!("Failed to write {} {}", T::COLLECTION, record.id()))?;
        check_status(response, T::COLLECTION).await?;
        Ok(())
    }

    #[instrument(name = "RemoteDelete", skip(self))]
    async fn delete(&self, collection: &'static str, id: &RecordId) -> Result<()> {
        let url = self.document_url(collection, id);
        let query = self.auth_query();

        let response = with_retry(|| self.client.delete(&url).query(&query).send(), 3, 500)
            .await
            .with_context(|| format!("Failed to delete {collection} {id}"))?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("Document {collection}/{id} already absent");
            return Ok(());
        }
        check_status(response, collection).await?;
        Ok(())
    }
}

async fn check_status(response: reqwest::Response, collection: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(anyhow!(
        "HTTP error: {} for collection: {} {}",
        status,
        collection,
        body.trim()
    ))
}

#[derive(Debug, Deserialize)]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

fn encode_document<T: Record>(record: &T) -> Result<Value> {
    let Value::Object(map) = serde_json::to_value(record)? else {
        return Err(anyhow!("{} record is not an object", T::COLLECTION));
    };
    let fields: Map<String, Value> = map
        .into_iter()
        .filter(|(key, _)| key != "id")
        .map(|(key, value)| (key, encode_value(value)))
        .collect();
    Ok(json!({ "fields": fields }))
}

fn decode_document<T: Record>(document: &Document) -> Result<T> {
    let mut map = Map::new();
    for (key, value) in &document.fields {
        map.insert(key.clone(), decode_value(value)?);
    }
    if !map.contains_key("id") {
        let id = document
            .name
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| anyhow!("Document name has no id: {}", document.name))?;
        map.insert("id".to_string(), Value::String(id.to_string()));
    }
    serde_json::from_value(Value::Object(map))
        .with_context(|| format!("Failed to decode document {}", document.name))
}

/// Wraps a plain JSON value in the store's typed value envelope.
fn encode_value(value: Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.into_iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => {
            let fields: Map<String, Value> = map
                .into_iter()
                .map(|(key, value)| (key, encode_value(value)))
                .collect();
            json!({ "mapValue": { "fields": fields } })
        }
    }
}

fn decode_value(value: &Value) -> Result<Value> {
    let Some((kind, inner)) = value.as_object().and_then(|m| m.iter().next()) else {
        return Err(anyhow!("Unexpected field value: {value}"));
    };
    let decoded = match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => Value::Bool(inner.as_bool().unwrap_or_default()),
        "integerValue" => {
            let raw = inner.as_str().map(str::to_string).unwrap_or_else(|| inner.to_string());
            let parsed: i64 = raw
                .parse()
                .with_context(|| format!("Invalid integer value: {raw}"))?;
            Value::Number(Number::from(parsed))
        }
        "doubleValue" => inner.clone(),
        "stringValue" | "timestampValue" => inner.clone(),
        "arrayValue" => {
            let values = inner
                .get("values")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(decode_value).collect::<Result<Vec<_>>>())
                .transpose()?
                .unwrap_or_default();
            Value::Array(values)
        }
        "mapValue" => {
            let mut map = Map::new();
            if let Some(fields) = inner.get("fields").and_then(Value::as_object) {
                for (key, value) in fields {
                    map.insert(key.clone(), decode_value(value)?);
                }
            }
            Value::Object(map)
        }
        other => return Err(anyhow!("Unsupported field type: {other}")),
    };
    Ok(decoded)
}

#[async_trait]
impl Repository for RemoteRepository {
    async fn list_transactions(&self) -> Result<Vec<Transaction>> {
        self.list().await
    }

    async fn list_assets(&self) -> Result<Vec<Asset>> {
        self.list().await
    }

    async fn put_transaction(&self, transaction: &Transaction) -> Result<()> {
        self.put(transaction).await
    }

    async fn put_asset(&self, asset: &Asset) -> Result<()> {
        self.put(asset).await
    }

    async fn delete_transaction(&self, id: &RecordId) -> Result<()> {
        self.delete(Transaction::COLLECTION, id).await
    }

    async fn delete_asset(&self, id: &RecordId) -> Result<()> {
        self.delete(Asset::COLLECTION, id).await
    }
}
