//! In-memory stand-in for the reference tables API

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::common::HttpResponse;
use super::error::ApiError;
use super::reference_tables::{
    CreateTableRequest, FileMetadataPayload, PatchTableRequest, ReferenceTablesApi,
    TableAttributes, TableData, TableList, TableResult, REFERENCE_TABLE_TYPE,
};

#[derive(Default)]
pub struct CallCounts {
    pub list: AtomicUsize,
    pub get: AtomicUsize,
    pub create: AtomicUsize,
    pub update: AtomicUsize,
    pub delete: AtomicUsize,
}

/// Keeps tables in a map and answers the way the real service does
#[derive(Default)]
pub struct FakeTablesApi {
    tables: Mutex<BTreeMap<String, TableData>>,
    next_id: AtomicUsize,
    pub calls: CallCounts,
    pub create_status: Mutex<Option<u16>>,
    pub update_status: Mutex<Option<u16>>,
    pub delete_on_update: Mutex<bool>,
    pub delay: Mutex<Option<Duration>>,
    pub last_create: Mutex<Option<serde_json::Value>>,
    pub last_update: Mutex<Option<serde_json::Value>>,
}

impl FakeTablesApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a stored table, returning its id
    pub fn insert(&self, id: &str, attributes: TableAttributes) -> String {
        let data = TableData {
            id: Some(id.to_string()),
            data_type: Some(REFERENCE_TABLE_TYPE.to_string()),
            attributes: Some(attributes),
            unparsed: Default::default(),
        };
        self.tables.lock().unwrap().insert(id.to_string(), data);
        id.to_string()
    }

    pub fn insert_raw(&self, data: TableData) {
        let id = data.id.clone().unwrap_or_default();
        self.tables.lock().unwrap().insert(id, data);
    }

    pub fn stored(&self, id: &str) -> Option<TableData> {
        self.tables.lock().unwrap().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.tables.lock().unwrap().len()
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn not_found() -> ApiError {
        ApiError::ApiError {
            status: 404,
            message: "Not Found".to_string(),
            errors: vec!["Not Found".to_string()],
        }
    }
}

#[async_trait]
impl ReferenceTablesApi for FakeTablesApi {
    async fn list_tables(&self) -> Result<TableList, ApiError> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        Ok(TableList {
            data: self.tables.lock().unwrap().values().cloned().collect(),
            unparsed: Default::default(),
        })
    }

    async fn get_table(&self, id: &str) -> Result<HttpResponse<TableResult>, ApiError> {
        self.calls.get.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let data = self.stored(id).ok_or_else(Self::not_found)?;
        Ok(HttpResponse {
            status: 200,
            body: TableResult::new(data),
        })
    }

    async fn create_reference_table(
        &self,
        request: &CreateTableRequest,
    ) -> Result<HttpResponse<TableResult>, ApiError> {
        self.calls.create.fetch_add(1, Ordering::SeqCst);
        *self.last_create.lock().unwrap() = serde_json::to_value(request).ok();
        self.pause().await;

        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("tbl-{}", n);
        let attributes = &request.data.attributes;
        let file_metadata = match &attributes.file_metadata {
            FileMetadataPayload::LocalFile { .. } => serde_json::json!({"error_row_count": 0}),
            FileMetadataPayload::CloudStorage { access_details, .. } => serde_json::json!({
                "access_details": access_details.bucket_name,
                "sync_enabled": true
            }),
        };
        self.insert(
            &id,
            TableAttributes {
                table_name: Some(attributes.table_name.clone()),
                description: attributes.description.clone(),
                source: Some(attributes.source.clone()),
                schema: Some(attributes.schema.clone()),
                tags: attributes.tags.clone(),
                created_by: Some("creator-uuid".to_string()),
                last_updated_by: Some("creator-uuid".to_string()),
                row_count: Some(0),
                status: Some("INITIALIZED".to_string()),
                updated_at: Some("2026-01-01T00:00:00Z".to_string()),
                file_metadata: Some(file_metadata),
                unparsed: Default::default(),
            },
        );

        let status = self.create_status.lock().unwrap().unwrap_or(200);
        let data = self.stored(&id).unwrap();
        Ok(HttpResponse {
            status,
            body: TableResult::new(data),
        })
    }

    async fn update_reference_table(
        &self,
        id: &str,
        request: &PatchTableRequest,
    ) -> Result<u16, ApiError> {
        self.calls.update.fetch_add(1, Ordering::SeqCst);
        *self.last_update.lock().unwrap() = serde_json::to_value(request).ok();
        self.pause().await;

        let mut tables = self.tables.lock().unwrap();
        let table = tables.get_mut(id).ok_or_else(Self::not_found)?;
        let stored = table.attributes.get_or_insert_with(Default::default);
        let patch = &request.data.attributes;
        stored.schema = Some(patch.schema.clone());
        stored.description = patch.description.clone();
        stored.tags = patch.tags.clone();
        stored.last_updated_by = Some("updater-uuid".to_string());

        if *self.delete_on_update.lock().unwrap() {
            tables.remove(id);
        }

        Ok(self.update_status.lock().unwrap().unwrap_or(200))
    }

    async fn delete_table(&self, id: &str) -> Result<u16, ApiError> {
        self.calls.delete.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.tables
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| 200)
            .ok_or_else(Self::not_found)
    }
}
