//! Reference tables endpoints of the Datadog v2 API

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::client::Client;
use super::common::HttpResponse;
use super::error::ApiError;

pub const TABLES_PATH: &str = "/api/v2/reference-tables/tables";
pub const REFERENCE_TABLE_TYPE: &str = "reference_table";

pub fn table_path(id: &str) -> String {
    format!("{}/{}", TABLES_PATH, urlencoding::encode(id))
}

/// Remote operations on reference tables
///
/// Implemented by [`Client`] against the real API. Status codes are handed
/// back untouched so callers can apply their own expectations.
#[async_trait]
pub trait ReferenceTablesApi: Send + Sync {
    async fn list_tables(&self) -> Result<TableList, ApiError>;

    async fn get_table(&self, id: &str) -> Result<HttpResponse<TableResult>, ApiError>;

    async fn create_reference_table(
        &self,
        request: &CreateTableRequest,
    ) -> Result<HttpResponse<TableResult>, ApiError>;

    async fn update_reference_table(
        &self,
        id: &str,
        request: &PatchTableRequest,
    ) -> Result<u16, ApiError>;

    async fn delete_table(&self, id: &str) -> Result<u16, ApiError>;
}

#[async_trait]
impl ReferenceTablesApi for Client {
    async fn list_tables(&self) -> Result<TableList, ApiError> {
        Ok(self.get::<TableList>(TABLES_PATH).await?.body)
    }

    async fn get_table(&self, id: &str) -> Result<HttpResponse<TableResult>, ApiError> {
        self.get(&table_path(id)).await
    }

    async fn create_reference_table(
        &self,
        request: &CreateTableRequest,
    ) -> Result<HttpResponse<TableResult>, ApiError> {
        self.post(TABLES_PATH, request).await
    }

    async fn update_reference_table(
        &self,
        id: &str,
        request: &PatchTableRequest,
    ) -> Result<u16, ApiError> {
        self.patch(&table_path(id), request).await
    }

    async fn delete_table(&self, id: &str) -> Result<u16, ApiError> {
        self.delete(&table_path(id)).await
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(flatten)]
    pub unparsed: Map<String, Value>,
}

impl SchemaField {
    pub fn new(name: &str, field_type: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: field_type.to_string(),
            unparsed: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub fields: Vec<SchemaField>,
    pub primary_keys: Vec<String>,
    #[serde(flatten)]
    pub unparsed: Map<String, Value>,
}

impl TableSchema {
    pub fn new(fields: Vec<SchemaField>, primary_keys: Vec<String>) -> Self {
        Self {
            fields,
            primary_keys,
            unparsed: Map::new(),
        }
    }
}

/// `{"data": {...}}` as returned by get and create
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableResult {
    pub data: TableData,
    #[serde(flatten)]
    pub unparsed: Map<String, Value>,
}

impl TableResult {
    pub fn new(data: TableData) -> Self {
        Self {
            data,
            unparsed: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableList {
    #[serde(default)]
    pub data: Vec<TableData>,
    #[serde(flatten)]
    pub unparsed: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<TableAttributes>,
    /// Keys this client does not know about
    #[serde(flatten)]
    pub unparsed: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<TableSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Echoed by the server in several shapes; never read back into state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_metadata: Option<Value>,
    #[serde(flatten)]
    pub unparsed: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateTableRequest {
    pub data: CreateTableData,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateTableData {
    #[serde(rename = "type")]
    pub data_type: String,
    pub attributes: CreateTableAttributes,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateTableAttributes {
    pub table_name: String,
    pub source: String,
    pub schema: TableSchema,
    pub file_metadata: FileMetadataPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// The two shapes of `file_metadata` the create endpoint accepts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FileMetadataPayload {
    LocalFile {
        upload_id: String,
    },
    CloudStorage {
        access_details: AccessDetailsPayload,
        sync_enabled: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessDetailsPayload {
    #[serde(rename = "type")]
    pub storage_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub bucket_name: String,
    pub key_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatchTableRequest {
    pub data: PatchTableData,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatchTableData {
    #[serde(rename = "type")]
    pub data_type: String,
    pub attributes: PatchTableAttributes,
}

/// Unset `description` and `tags` are sent as explicit nulls, which clears them
#[derive(Debug, Clone, Serialize)]
pub struct PatchTableAttributes {
    pub schema: TableSchema,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}
