//! Reference table data source implementation

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse, ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, NestedType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

use crate::reference_table::state::data_source_value;
use crate::reference_table::{LookupKey, ReferenceTableError, TableLookup};
use crate::DatadogProviderData;

pub const TYPE_NAME: &str = "datadog_reference_table";

#[derive(Default)]
pub struct ReferenceTableDataSource {
    provider_data: Option<DatadogProviderData>,
}

impl ReferenceTableDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn lookup_key(config: &DynamicValue) -> LookupKey {
        let known = |name: &str| {
            config
                .get_optional_string(&AttributePath::new(name))
                .ok()
                .flatten()
        };
        LookupKey {
            id: known("id"),
            table_name: known("table_name"),
        }
    }
}

fn computed_string(name: &str, description: &str) -> tfplug::schema::Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .computed()
        .build()
}

fn summary_for(error: &ReferenceTableError) -> &'static str {
    match error {
        ReferenceTableError::NotFound { .. } => "Reference table not found",
        ReferenceTableError::MissingLookupKey => "Missing required field",
        ReferenceTableError::Transport {
            operation: "listing reference tables",
            ..
        } => "error listing reference tables",
        _ => "error retrieving reference table",
    }
}

#[async_trait]
impl DataSource for ReferenceTableDataSource {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description(
                "Use this data source to retrieve information about an existing Datadog reference table.",
            )
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description(
                        "The ID of the reference table. Required if `table_name` is not specified.",
                    )
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("table_name", AttributeType::String)
                    .description(
                        "Unique name to identify this reference table. Required if `id` is not specified.",
                    )
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(computed_string(
                "description",
                "Optional text describing the purpose or contents of this reference table.",
            ))
            .attribute(computed_string(
                "source",
                "The source type for reference table data.",
            ))
            .attribute(
                AttributeBuilder::nested(
                    "schema",
                    NestedType::single(vec![
                        AttributeBuilder::nested(
                            "fields",
                            NestedType::list(vec![
                                computed_string("name", "Name of the column."),
                                computed_string("type", "Data type of the column."),
                            ]),
                        )
                        .description("List of fields (columns) in the reference table.")
                        .computed()
                        .build(),
                        AttributeBuilder::new(
                            "primary_keys",
                            AttributeType::List(Box::new(AttributeType::String)),
                        )
                        .description(
                            "List of field names that serve as primary keys for the table.",
                        )
                        .computed()
                        .build(),
                    ]),
                )
                .description("Schema defining the structure and columns of the reference table.")
                .computed()
                .build(),
            )
            .attribute(
                AttributeBuilder::new("tags", AttributeType::List(Box::new(AttributeType::String)))
                    .description("Tags for organizing and filtering reference tables.")
                    .computed()
                    .build(),
            )
            .attribute(computed_string(
                "created_by",
                "UUID of the user who created the reference table.",
            ))
            .attribute(computed_string(
                "last_updated_by",
                "UUID of the user who last updated the reference table.",
            ))
            .attribute(
                AttributeBuilder::new("row_count", AttributeType::Number)
                    .description(
                        "The number of successfully processed rows in the reference table.",
                    )
                    .computed()
                    .build(),
            )
            .attribute(computed_string("status", "The processing status of the table."))
            .attribute(computed_string(
                "updated_at",
                "When the reference table was last updated, in ISO 8601 format.",
            ))
            .build();

        DataSourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        let mut diagnostics = vec![];

        // Unknown values may still turn into a usable key at apply time
        let is_null = |name: &str| {
            request
                .config
                .get(&AttributePath::new(name))
                .map(Dynamic::is_null)
                .unwrap_or(true)
        };
        if is_null("id") && is_null("table_name") {
            diagnostics.push(
                ReferenceTableError::MissingLookupKey
                    .to_diagnostic(summary_for(&ReferenceTableError::MissingLookupKey)),
            );
        }

        ValidateDataSourceConfigResponse { diagnostics }
    }

    async fn read(&self, ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics: vec![Diagnostic::error(
                        "Provider not configured",
                        "Provider data was not properly configured",
                    )],
                };
            }
        };

        let key = Self::lookup_key(&request.config);
        tracing::debug!("Reading reference table data source with {:?}", key);

        match TableLookup::new(provider_data.client.as_ref())
            .lookup(&ctx, &key)
            .await
        {
            Ok(table) => ReadDataSourceResponse {
                state: data_source_value(&table),
                diagnostics: vec![],
            },
            Err(e) => ReadDataSourceResponse {
                state: DynamicValue::null(),
                diagnostics: vec![e.to_diagnostic(summary_for(&e))],
            },
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for ReferenceTableDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
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
                "No provider data was provided to the data source",
            ));
        }

        ConfigureDataSourceResponse { diagnostics }
    }
}
