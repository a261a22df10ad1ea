//! Reference table resource implementation

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::import::import_state_passthrough_id;
use tfplug::plan_modifier::{RequiresReplaceIfChanged, UseStateForUnknown};
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ModifyPlanRequest,
    ModifyPlanResponse, ReadResourceRequest, ReadResourceResponse, Resource,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure,
    ResourceWithImportState, ResourceWithModifyPlan, UpdateResourceRequest,
    UpdateResourceResponse, ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, NestedType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

use crate::api::ReferenceTablesApi;
use crate::reference_table::state::{
    descriptor_from_value, descriptor_to_value, file_metadata_from_value,
};
use crate::reference_table::{
    FieldType, ReferenceTableError, SourceType, StorageType, TableLifecycle,
};
use crate::DatadogProviderData;

pub const TYPE_NAME: &str = "datadog_reference_table";

#[derive(Default)]
pub struct ReferenceTableResource {
    provider_data: Option<DatadogProviderData>,
}

impl ReferenceTableResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn api(&self) -> Result<&dyn ReferenceTablesApi, Diagnostic> {
        self.provider_data
            .as_ref()
            .map(|data| data.client.as_ref())
            .ok_or_else(|| {
                Diagnostic::error(
                    "Provider not configured",
                    "Provider data was not properly configured",
                )
            })
    }

    pub fn table_schema() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description(
                "Provides a Datadog Reference Table resource. This can be used to create and \
                 manage Datadog Reference Tables for data enrichment.",
            )
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("The ID of this resource.")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("table_name", AttributeType::String)
                    .description(
                        "Unique name to identify this reference table. Used in enrichment \
                         processors and API calls.",
                    )
                    .required()
                    .plan_modifier(RequiresReplaceIfChanged)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description(
                        "Optional text describing the purpose or contents of this reference table.",
                    )
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("source", AttributeType::String)
                    .description(
                        "The source type for reference table data. Valid values are `LOCAL_FILE`, \
                         `S3`, `GCS`, `AZURE`.",
                    )
                    .required()
                    .plan_modifier(RequiresReplaceIfChanged)
                    .build(),
            )
            .attribute(
                AttributeBuilder::nested("schema", table_schema_type())
                    .description(
                        "Schema defining the structure and columns of the reference table.",
                    )
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::nested("file_metadata", file_metadata_type())
                    .description(
                        "Metadata specifying where and how to access the reference table's data file.",
                    )
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("tags", AttributeType::List(Box::new(AttributeType::String)))
                    .description("Tags for organizing and filtering reference tables.")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("created_by", AttributeType::String)
                    .description("UUID of the user who created the reference table.")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("last_updated_by", AttributeType::String)
                    .description("UUID of the user who last updated the reference table.")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("row_count", AttributeType::Number)
                    .description(
                        "The number of successfully processed rows in the reference table.",
                    )
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("status", AttributeType::String)
                    .description("The processing status of the table.")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("updated_at", AttributeType::String)
                    .description("When the reference table was last updated, in ISO 8601 format.")
                    .computed()
                    .build(),
            )
            .build()
    }

    fn table_id(state: &DynamicValue) -> Option<String> {
        state
            .get_optional_string(&AttributePath::new("id"))
            .ok()
            .flatten()
    }
}

/// `schema` block: column definitions and primary keys
fn table_schema_type() -> NestedType {
    NestedType::single(vec![
        AttributeBuilder::nested(
            "fields",
            NestedType::list(vec![
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Name of the column.")
                    .required()
                    .build(),
                AttributeBuilder::new("type", AttributeType::String)
                    .description(
                        "Data type of the column. Valid values are `STRING`, `DOUBLE`, `BOOLEAN`.",
                    )
                    .required()
                    .build(),
            ]),
        )
        .description("List of fields (columns) in the reference table.")
        .required()
        .build(),
        AttributeBuilder::new(
            "primary_keys",
            AttributeType::List(Box::new(AttributeType::String)),
        )
        .description(
            "List of field names that serve as primary keys for the table. Only one primary key \
             is supported.",
        )
        .required()
        .build(),
    ])
}

fn file_metadata_type() -> NestedType {
    NestedType::single(vec![
        AttributeBuilder::new("upload_id", AttributeType::String)
            .description(
                "Upload ID obtained from creating a reference table upload. Use this for \
                 LOCAL_FILE source type.",
            )
            .optional()
            .plan_modifier(RequiresReplaceIfChanged)
            .build(),
        AttributeBuilder::nested(
            "access_details",
            NestedType::single(vec![
                AttributeBuilder::new("type", AttributeType::String)
                    .description("Type of cloud storage. Valid values are `s3`, `gcs`, `azure`.")
                    .required()
                    .build(),
                AttributeBuilder::new("region", AttributeType::String)
                    .description("Region where the bucket is located (for S3).")
                    .optional()
                    .build(),
                AttributeBuilder::new("bucket_name", AttributeType::String)
                    .description("Name of the storage bucket.")
                    .required()
                    .build(),
                AttributeBuilder::new("key_path", AttributeType::String)
                    .description("Path to the CSV file within the bucket.")
                    .required()
                    .build(),
            ]),
        )
        .description(
            "Details for accessing a file in cloud storage. Use this for S3, GCS, or AZURE source types.",
        )
        .optional()
        .build(),
    ])
}

/// Checks the enum-typed and union attributes whose values are already known
fn validate_config(config: &DynamicValue) -> Vec<Diagnostic> {
    let mut errors: Vec<ReferenceTableError> = Vec::new();

    let source = AttributePath::new("source");
    if let Some(value) = known_string(config, &source) {
        if let Err(e) = SourceType::parse(&source, &value) {
            errors.push(e);
        }
    }

    let fields = AttributePath::new("schema").attribute("fields");
    if let Ok(Some(items)) = config.get_optional_list(&fields) {
        for i in 0..items.len() {
            let path = fields.clone().index(i as i64).attribute("type");
            if let Some(value) = known_string(config, &path) {
                if let Err(e) = FieldType::parse(&path, &value) {
                    errors.push(e);
                }
            }
        }
    }

    let file_metadata = AttributePath::new("file_metadata");
    if let Ok(block) = config.get(&file_metadata) {
        if block.is_set() {
            let upload_id = block.get("upload_id").unwrap_or(&Dynamic::Null);
            let details = block.get("access_details").unwrap_or(&Dynamic::Null);

            // Unknown values may still resolve to either variant
            let undecided = upload_id.is_unknown() || details.is_unknown();
            if !undecided && upload_id.is_set() == details.is_set() {
                errors.push(ReferenceTableError::MissingRequiredUnionVariant {
                    path: file_metadata.clone(),
                });
            }

            let type_path = file_metadata.attribute("access_details").attribute("type");
            if let Some(value) = known_string(config, &type_path) {
                if let Err(e) = StorageType::parse(&type_path, &value) {
                    errors.push(e);
                }
            }
        }
    }

    errors
        .iter()
        .map(|e| e.to_diagnostic("Invalid reference table configuration"))
        .collect()
}

fn known_string(config: &DynamicValue, path: &AttributePath) -> Option<String> {
    config.get_optional_string(path).ok().flatten()
}

#[async_trait]
impl Resource for ReferenceTableResource {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: Self::table_schema(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        ValidateResourceConfigResponse {
            diagnostics: validate_config(&request.config),
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let failed = |diagnostic: Diagnostic| CreateResourceResponse {
            new_state: DynamicValue::null(),
            diagnostics: vec![diagnostic],
        };

        let api = match self.api() {
            Ok(api) => api,
            Err(diagnostic) => return failed(diagnostic),
        };

        let desired = match descriptor_from_value(&request.planned_state) {
            Ok(desired) => desired,
            Err(e) => return failed(e.to_diagnostic("Invalid reference table configuration")),
        };

        match TableLifecycle::new(api).create(&ctx, &desired).await {
            Ok(created) => CreateResourceResponse {
                new_state: descriptor_to_value(&created),
                diagnostics: vec![],
            },
            Err(e) => failed(e.to_diagnostic("error creating reference table")),
        }
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let Some(id) = Self::table_id(&request.current_state) else {
            return ReadResourceResponse {
                new_state: None,
                diagnostics: vec![],
            };
        };

        let api = match self.api() {
            Ok(api) => api,
            Err(diagnostic) => {
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics: vec![diagnostic],
                }
            }
        };

        match TableLifecycle::new(api).read(&ctx, &id).await {
            Ok(Some(mut table)) => {
                // The server never returns file_metadata, so it comes from prior state
                let mut diagnostics = vec![];
                table.file_metadata = match file_metadata_from_value(&request.current_state) {
                    Ok(file_metadata) => file_metadata,
                    Err(e) => {
                        tracing::warn!("Dropping unreadable file_metadata for {}: {}", id, e);
                        diagnostics.push(
                            Diagnostic::warning("Ignoring stored file_metadata", e.to_string())
                                .with_attribute(
                                    e.attribute()
                                        .cloned()
                                        .unwrap_or_else(|| AttributePath::new("file_metadata")),
                                ),
                        );
                        None
                    }
                };
                ReadResourceResponse {
                    new_state: Some(descriptor_to_value(&table)),
                    diagnostics,
                }
            }
            Ok(None) => ReadResourceResponse {
                new_state: None,
                diagnostics: vec![],
            },
            Err(e) => ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![e.to_diagnostic("error retrieving reference table")],
            },
        }
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let prior_state = request.prior_state;
        let failed = |state: DynamicValue, diagnostic: Diagnostic| UpdateResourceResponse {
            new_state: state,
            diagnostics: vec![diagnostic],
        };

        let api = match self.api() {
            Ok(api) => api,
            Err(diagnostic) => return failed(prior_state, diagnostic),
        };

        let Some(id) = Self::table_id(&prior_state) else {
            return failed(
                prior_state,
                Diagnostic::error("Missing ID", "The reference table ID is not known")
                    .with_attribute(AttributePath::new("id")),
            );
        };

        let desired = match descriptor_from_value(&request.planned_state) {
            Ok(desired) => desired,
            Err(e) => {
                return failed(
                    prior_state,
                    e.to_diagnostic("Invalid reference table configuration"),
                )
            }
        };

        match TableLifecycle::new(api).update(&ctx, &id, &desired).await {
            Ok(updated) => UpdateResourceResponse {
                new_state: descriptor_to_value(&updated),
                diagnostics: vec![],
            },
            Err(e) => failed(prior_state, e.to_diagnostic("error updating reference table")),
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let Some(id) = Self::table_id(&request.prior_state) else {
            // Never created, nothing to remove
            return DeleteResourceResponse {
                diagnostics: vec![],
            };
        };

        let api = match self.api() {
            Ok(api) => api,
            Err(diagnostic) => {
                return DeleteResourceResponse {
                    diagnostics: vec![diagnostic],
                }
            }
        };

        let diagnostics = match TableLifecycle::new(api).delete(&ctx, &id).await {
            Ok(()) => vec![],
            Err(e) => vec![e.to_diagnostic("error deleting reference table")],
        };
        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for ReferenceTableResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let mut diagnostics = vec![];

        if let Some(data) = request.provider_data {
            if let Some(provider_data) = data.downcast_ref::<DatadogProviderData>() {
                self.provider_data = Some(provider_data.clone());
            } else {
                diagnostics.push(Diagnostic::error(
                    "Invalid provider data",
                    "Failed to extract DatadogProviderData from provider data",
                ));
            }
        } else {
            diagnostics.push(Diagnostic::error(
                "No provider data",
                "No provider data was provided to the resource",
            ));
        }

        ConfigureResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithModifyPlan for ReferenceTableResource {
    async fn modify_plan(&self, _ctx: Context, request: ModifyPlanRequest) -> ModifyPlanResponse {
        let result = Self::table_schema().modify_plan(
            &request.config,
            &request.prior_state,
            &request.proposed_new_state,
        );

        ModifyPlanResponse {
            planned_state: result.planned_state,
            requires_replace: result.requires_replace,
            diagnostics: result.diagnostics,
        }
    }
}

#[async_trait]
impl ResourceWithImportState for ReferenceTableResource {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse {
            imported_resources: vec![],
            diagnostics: vec![],
        };
        import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::reference_tables::{SchemaField, TableAttributes, TableSchema};
    use crate::api::test_helpers::FakeTablesApi;
    use std::sync::Arc;
    use tfplug::types::{has_errors, DiagnosticSeverity};

    async fn configured(api: &Arc<FakeTablesApi>) -> ReferenceTableResource {
        let mut resource = ReferenceTableResource::new();
        let data = DatadogProviderData::with_api(api.clone());
        let response = resource
            .configure(
                Context::new(),
                ConfigureResourceRequest {
                    provider_data: Some(Arc::new(data)),
                },
            )
            .await;
        assert!(response.diagnostics.is_empty());
        resource
    }

    fn file_metadata_s3() -> Dynamic {
        Dynamic::object([
            ("upload_id", Dynamic::Null),
            (
                "access_details",
                Dynamic::object([
                    ("type", Dynamic::string("s3")),
                    ("region", Dynamic::Null),
                    ("bucket_name", Dynamic::string("b")),
                    ("key_path", Dynamic::string("p")),
                ]),
            ),
        ])
    }

    fn plan(table_name: &str, source: &str, file_metadata: Dynamic) -> DynamicValue {
        DynamicValue::new(Dynamic::object([
            ("id", Dynamic::Unknown),
            ("table_name", Dynamic::string(table_name)),
            ("description", Dynamic::Null),
            ("source", Dynamic::string(source)),
            (
                "schema",
                Dynamic::object([
                    (
                        "fields",
                        Dynamic::List(vec![
                            Dynamic::object([
                                ("name", Dynamic::string("id")),
                                ("type", Dynamic::string("STRING")),
                            ]),
                            Dynamic::object([
                                ("name", Dynamic::string("value")),
                                ("type", Dynamic::string("DOUBLE")),
                            ]),
                        ]),
                    ),
                    ("primary_keys", Dynamic::string_list(["id"])),
                ]),
            ),
            ("file_metadata", file_metadata),
            ("tags", Dynamic::Null),
            ("created_by", Dynamic::Unknown),
            ("last_updated_by", Dynamic::Unknown),
            ("row_count", Dynamic::Unknown),
            ("status", Dynamic::Unknown),
            ("updated_at", Dynamic::Unknown),
        ]))
    }

    fn stored() -> TableAttributes {
        TableAttributes {
            table_name: Some("t1".to_string()),
            source: Some("S3".to_string()),
            schema: Some(TableSchema::new(
                vec![SchemaField::new("id", "STRING")],
                vec!["id".to_string()],
            )),
            row_count: Some(5),
            ..Default::default()
        }
    }

    fn id_state(id: &str) -> DynamicValue {
        DynamicValue::new(Dynamic::object([("id", Dynamic::string(id))]))
    }

    async fn validate(config: DynamicValue) -> Vec<Diagnostic> {
        ReferenceTableResource::new()
            .validate(
                Context::new(),
                ValidateResourceConfigRequest {
                    type_name: TYPE_NAME.to_string(),
                    config,
                },
            )
            .await
            .diagnostics
    }

    #[tokio::test]
    async fn validate_accepts_a_complete_config() {
        assert!(validate(plan("t1", "S3", file_metadata_s3())).await.is_empty());
    }

    #[tokio::test]
    async fn validate_rejects_unknown_source() {
        let diagnostics = validate(plan("t1", "WEIRD", file_metadata_s3())).await;
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].attribute.as_ref().unwrap().to_string(),
            "source"
        );
        assert!(diagnostics[0].detail.contains("WEIRD"));
    }

    #[tokio::test]
    async fn validate_skips_unknown_values() {
        let mut config = plan("t1", "S3", file_metadata_s3());
        config.mark_unknown(&AttributePath::new("source")).unwrap();
        config
            .mark_unknown(&AttributePath::new("file_metadata").attribute("upload_id"))
            .unwrap();
        assert!(validate(config).await.is_empty());
    }

    #[tokio::test]
    async fn validate_requires_exactly_one_file_metadata_variant() {
        let neither = Dynamic::object([
            ("upload_id", Dynamic::Null),
            ("access_details", Dynamic::Null),
        ]);
        let diagnostics = validate(plan("t1", "S3", neither)).await;
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].attribute.as_ref().unwrap().to_string(),
            "file_metadata"
        );

        let mut both = file_metadata_s3();
        if let Dynamic::Map(map) = &mut both {
            map.insert("upload_id".to_string(), Dynamic::string("u-1"));
        }
        assert_eq!(validate(plan("t1", "S3", both)).await.len(), 1);
    }

    #[tokio::test]
    async fn validate_checks_nested_enums() {
        let mut config = plan("t1", "S3", file_metadata_s3());
        config
            .set_string(
                &AttributePath::new("schema").attribute("fields").index(1).attribute("type"),
                "FLOAT".to_string(),
            )
            .unwrap();
        config
            .set_string(
                &AttributePath::new("file_metadata")
                    .attribute("access_details")
                    .attribute("type"),
                "S3".to_string(),
            )
            .unwrap();

        let diagnostics = validate(config).await;
        let attributes: Vec<String> = diagnostics
            .iter()
            .map(|d| d.attribute.as_ref().unwrap().to_string())
            .collect();
        assert_eq!(
            attributes,
            vec!["schema.fields[1].type", "file_metadata.access_details.type"]
        );
    }

    #[tokio::test]
    async fn create_populates_computed_state() {
        let api = Arc::new(FakeTablesApi::new());
        let resource = configured(&api).await;
        let planned = plan("t1", "S3", file_metadata_s3());

        let response = resource
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: TYPE_NAME.to_string(),
                    planned_state: planned.clone(),
                    config: planned,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        let state = response.new_state;
        assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "tbl-1");
        assert_eq!(state.get_number(&AttributePath::new("row_count")).unwrap(), 0.0);
        assert_eq!(
            state
                .get_string(
                    &AttributePath::new("file_metadata")
                        .attribute("access_details")
                        .attribute("bucket_name")
                )
                .unwrap(),
            "b"
        );

        let sent = api.last_create.lock().unwrap().clone().unwrap();
        let attributes = sent["data"]["attributes"].as_object().unwrap();
        assert!(!attributes.contains_key("description"));
        assert!(!attributes.contains_key("tags"));
    }

    #[tokio::test]
    async fn create_without_provider_data_fails() {
        let planned = plan("t1", "S3", file_metadata_s3());
        let response = ReferenceTableResource::new()
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: TYPE_NAME.to_string(),
                    planned_state: planned.clone(),
                    config: planned,
                },
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].summary, "Provider not configured");
        assert!(response.new_state.is_null());
    }

    #[tokio::test]
    async fn read_removes_missing_tables() {
        let api = Arc::new(FakeTablesApi::new());
        let resource = configured(&api).await;

        let response = resource
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: TYPE_NAME.to_string(),
                    current_state: id_state("gone"),
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        assert!(response.new_state.is_none());
    }

    #[tokio::test]
    async fn read_after_import_fills_everything_but_file_metadata() {
        let api = Arc::new(FakeTablesApi::new());
        api.insert("tbl-7", stored());
        let resource = configured(&api).await;

        let imported = resource
            .import_state(
                Context::new(),
                ImportResourceStateRequest {
                    type_name: TYPE_NAME.to_string(),
                    id: "tbl-7".to_string(),
                },
            )
            .await;
        let seeded = imported.imported_resources[0].state.clone();

        let response = resource
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: TYPE_NAME.to_string(),
                    current_state: seeded,
                },
            )
            .await;

        let state = response.new_state.unwrap();
        assert_eq!(state.get_string(&AttributePath::new("table_name")).unwrap(), "t1");
        assert_eq!(state.get_number(&AttributePath::new("row_count")).unwrap(), 5.0);
        assert!(state.get(&AttributePath::new("file_metadata")).unwrap().is_null());
        assert!(state.get(&AttributePath::new("description")).unwrap().is_null());
    }

    #[tokio::test]
    async fn read_keeps_file_metadata_from_state() {
        let api = Arc::new(FakeTablesApi::new());
        api.insert("tbl-7", stored());
        let resource = configured(&api).await;

        let mut current = plan("t1", "S3", file_metadata_s3());
        current
            .set_string(&AttributePath::new("id"), "tbl-7".to_string())
            .unwrap();

        let response = resource
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: TYPE_NAME.to_string(),
                    current_state: current,
                },
            )
            .await;

        let state = response.new_state.unwrap();
        assert_eq!(
            state
                .get_string(
                    &AttributePath::new("file_metadata")
                        .attribute("access_details")
                        .attribute("key_path")
                )
                .unwrap(),
            "p"
        );
    }

    #[tokio::test]
    async fn read_warns_about_unreadable_file_metadata() {
        let api = Arc::new(FakeTablesApi::new());
        api.insert("tbl-7", stored());
        let resource = configured(&api).await;

        let mut current = plan("t1", "S3", file_metadata_s3());
        current
            .set_string(&AttributePath::new("id"), "tbl-7".to_string())
            .unwrap();
        current
            .set_string(
                &AttributePath::new("file_metadata")
                    .attribute("access_details")
                    .attribute("type"),
                "ftp".to_string(),
            )
            .unwrap();

        let response = resource
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: TYPE_NAME.to_string(),
                    current_state: current,
                },
            )
            .await;

        assert!(!has_errors(&response.diagnostics));
        assert_eq!(response.diagnostics.len(), 1);
        let warning = &response.diagnostics[0];
        assert_eq!(warning.severity, DiagnosticSeverity::Warning);
        assert_eq!(warning.summary, "Ignoring stored file_metadata");
        assert_eq!(
            warning.attribute.as_ref().unwrap().to_string(),
            "file_metadata.access_details.type"
        );
        assert!(warning.detail.contains("ftp"));

        let state = response.new_state.unwrap();
        assert!(state.get(&AttributePath::new("file_metadata")).unwrap().is_null());
        assert_eq!(state.get_number(&AttributePath::new("row_count")).unwrap(), 5.0);
    }

    #[tokio::test]
    async fn update_then_read_reflects_server_state() {
        let api = Arc::new(FakeTablesApi::new());
        api.insert("tbl-7", stored());
        let resource = configured(&api).await;

        let mut prior = plan("t1", "S3", file_metadata_s3());
        prior
            .set_string(&AttributePath::new("id"), "tbl-7".to_string())
            .unwrap();
        let mut planned = prior.clone();
        planned
            .set_list(&AttributePath::new("tags"), vec![Dynamic::string("x")])
            .unwrap();

        let response = resource
            .update(
                Context::new(),
                UpdateResourceRequest {
                    type_name: TYPE_NAME.to_string(),
                    prior_state: prior,
                    planned_state: planned.clone(),
                    config: planned,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        let state = response.new_state;
        assert_eq!(
            state.get_list(&AttributePath::new("tags")).unwrap(),
            vec![Dynamic::string("x")]
        );
        assert_eq!(state.get_number(&AttributePath::new("row_count")).unwrap(), 5.0);
    }

    #[tokio::test]
    async fn failed_update_keeps_prior_state() {
        let api = Arc::new(FakeTablesApi::new());
        let resource = configured(&api).await;

        let mut prior = plan("t1", "S3", file_metadata_s3());
        prior
            .set_string(&AttributePath::new("id"), "missing".to_string())
            .unwrap();

        let response = resource
            .update(
                Context::new(),
                UpdateResourceRequest {
                    type_name: TYPE_NAME.to_string(),
                    prior_state: prior.clone(),
                    planned_state: prior.clone(),
                    config: prior.clone(),
                },
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].summary, "error updating reference table");
        assert_eq!(response.new_state, prior);
    }

    #[tokio::test]
    async fn delete_twice_succeeds() {
        let api = Arc::new(FakeTablesApi::new());
        api.insert("tbl-7", stored());
        let resource = configured(&api).await;

        for _ in 0..2 {
            let response = resource
                .delete(
                    Context::new(),
                    DeleteResourceRequest {
                        type_name: TYPE_NAME.to_string(),
                        prior_state: id_state("tbl-7"),
                    },
                )
                .await;
            assert!(response.diagnostics.is_empty());
        }
        assert_eq!(api.len(), 0);
    }

    async fn replaced_paths(prior: DynamicValue, proposed: DynamicValue) -> Vec<String> {
        let response = ReferenceTableResource::new()
            .modify_plan(
                Context::new(),
                ModifyPlanRequest {
                    type_name: TYPE_NAME.to_string(),
                    config: proposed.clone(),
                    prior_state: prior,
                    proposed_new_state: proposed,
                },
            )
            .await;
        assert!(response.diagnostics.is_empty());
        response
            .requires_replace
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    fn existing(table_name: &str, source: &str, file_metadata: Dynamic) -> DynamicValue {
        let mut state = plan(table_name, source, file_metadata);
        state
            .set_string(&AttributePath::new("id"), "tbl-1".to_string())
            .unwrap();
        state
    }

    #[tokio::test]
    async fn write_once_attributes_force_replacement() {
        let prior = existing("t1", "S3", file_metadata_s3());

        for name in ["t2", "T1", "t1 "] {
            let paths =
                replaced_paths(prior.clone(), existing(name, "S3", file_metadata_s3())).await;
            assert_eq!(paths, vec!["table_name"]);
        }
        for source in ["GCS", "AZURE", "LOCAL_FILE"] {
            let paths =
                replaced_paths(prior.clone(), existing("t1", source, file_metadata_s3())).await;
            assert_eq!(paths, vec!["source"]);
        }

        let local = |id: &str| {
            Dynamic::object([
                ("upload_id", Dynamic::string(id)),
                ("access_details", Dynamic::Null),
            ])
        };
        let paths = replaced_paths(
            existing("t1", "LOCAL_FILE", local("u-1")),
            existing("t1", "LOCAL_FILE", local("u-2")),
        )
        .await;
        assert_eq!(paths, vec!["file_metadata.upload_id"]);
    }

    #[tokio::test]
    async fn mutable_attributes_update_in_place() {
        let prior = existing("t1", "S3", file_metadata_s3());
        let mut proposed = prior.clone();
        proposed
            .set_string(&AttributePath::new("description"), "new".to_string())
            .unwrap();
        proposed
            .set_list(&AttributePath::new("tags"), vec![Dynamic::string("a")])
            .unwrap();

        assert!(replaced_paths(prior, proposed).await.is_empty());
    }

    #[tokio::test]
    async fn id_is_kept_from_state_during_plan() {
        let prior = existing("t1", "S3", file_metadata_s3());
        let mut proposed = prior.clone();
        proposed.mark_unknown(&AttributePath::new("id")).unwrap();

        let response = ReferenceTableResource::new()
            .modify_plan(
                Context::new(),
                ModifyPlanRequest {
                    type_name: TYPE_NAME.to_string(),
                    config: proposed.clone(),
                    prior_state: prior,
                    proposed_new_state: proposed,
                },
            )
            .await;

        assert_eq!(
            response
                .planned_state
                .get_string(&AttributePath::new("id"))
                .unwrap(),
            "tbl-1"
        );
    }

    #[tokio::test]
    async fn configure_rejects_foreign_provider_data() {
        let mut resource = ReferenceTableResource::new();
        let response = resource
            .configure(
                Context::new(),
                ConfigureResourceRequest {
                    provider_data: Some(Arc::new("not provider data")),
                },
            )
            .await;
        assert_eq!(response.diagnostics[0].summary, "Invalid provider data");
    }
}
