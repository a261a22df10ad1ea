pub mod api;
pub mod data_sources;
pub mod logging;
pub mod provider_data;
pub mod reference_table;
pub mod resources;

pub use provider_data::DatadogProviderData;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::data_source::DataSourceWithConfigure;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, DataSourceFactory, Provider,
    ProviderSchemaRequest, ProviderSchemaResponse, ResourceFactory,
};
use tfplug::resource::ResourceWithConfigure;
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

const API_KEY_ENV: [&str; 2] = ["DD_API_KEY", "DATADOG_API_KEY"];
const APP_KEY_ENV: [&str; 2] = ["DD_APP_KEY", "DATADOG_APP_KEY"];
const API_URL_ENV: [&str; 2] = ["DD_HOST", "DATADOG_HOST"];

#[derive(Default)]
pub struct DatadogProvider {
    provider_data: Option<DatadogProviderData>,
}

impl DatadogProvider {
    /// Creates an unconfigured provider and installs the `TF_LOG` subscriber
    pub fn new() -> Self {
        logging::init();
        Self::default()
    }

    pub fn provider_data(&self) -> Option<&DatadogProviderData> {
        self.provider_data.as_ref()
    }
}

/// Configured value first, then the first non-empty environment variable
fn setting(config: &DynamicValue, name: &str, env: &[&str]) -> Option<String> {
    config
        .get_optional_string(&AttributePath::new(name))
        .ok()
        .flatten()
        .filter(|value| !value.is_empty())
        .or_else(|| {
            env.iter()
                .filter_map(|var| std::env::var(var).ok())
                .find(|value| !value.is_empty())
        })
}

fn missing_setting(name: &str, env: &[&str]) -> Diagnostic {
    Diagnostic::error(
        format!("{} is required", name),
        format!(
            "Set {} in the provider configuration or the {} environment variable",
            name,
            env.join(" or ")
        ),
    )
    .with_attribute(AttributePath::new(name))
}

#[async_trait]
impl Provider for DatadogProvider {
    fn type_name(&self) -> &str {
        "datadog"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ProviderSchemaRequest,
    ) -> ProviderSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("The Datadog provider manages reference tables through the Datadog API.")
            .attribute(
                AttributeBuilder::new("api_key", AttributeType::String)
                    .description("Datadog API key. Can also be set with DD_API_KEY.")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("app_key", AttributeType::String)
                    .description("Datadog APP key. Can also be set with DD_APP_KEY.")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("api_url", AttributeType::String)
                    .description(
                        "The API URL, e.g. https://api.datadoghq.eu. Can also be set with DD_HOST.",
                    )
                    .optional()
                    .build(),
            )
            .build();

        ProviderSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        let api_key = setting(&request.config, "api_key", &API_KEY_ENV);
        let app_key = setting(&request.config, "app_key", &APP_KEY_ENV);
        let api_url = setting(&request.config, "api_url", &API_URL_ENV)
            .unwrap_or_else(|| api::DEFAULT_API_URL.to_string());

        let mut diagnostics = vec![];

        let (api_key, app_key) = match (api_key, app_key) {
            (Some(api_key), Some(app_key)) => (api_key, app_key),
            (api_key, app_key) => {
                if api_key.is_none() {
                    diagnostics.push(missing_setting("api_key", &API_KEY_ENV));
                }
                if app_key.is_none() {
                    diagnostics.push(missing_setting("app_key", &APP_KEY_ENV));
                }
                return ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                };
            }
        };

        tracing::info!("Configuring Datadog provider for {}", api_url);

        match api::Client::new(&api_url, &api_key, &app_key) {
            Ok(client) => {
                let data = DatadogProviderData::new(client);
                self.provider_data = Some(data.clone());
                ConfigureProviderResponse {
                    diagnostics,
                    provider_data: Some(Arc::new(data)),
                }
            }
            Err(e) => {
                diagnostics.push(
                    Diagnostic::error(
                        "Failed to create API client",
                        format!("Failed to create API client: {}", e),
                    )
                    .with_attribute(AttributePath::new("api_url")),
                );
                ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                }
            }
        }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut resources: HashMap<String, ResourceFactory> = HashMap::new();
        resources.insert(
            crate::resources::reference_table::TYPE_NAME.to_string(),
            Box::new(|| {
                Box::new(crate::resources::ReferenceTableResource::new())
                    as Box<dyn ResourceWithConfigure>
            }),
        );
        resources
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        let mut data_sources: HashMap<String, DataSourceFactory> = HashMap::new();
        data_sources.insert(
            crate::data_sources::reference_table::TYPE_NAME.to_string(),
            Box::new(|| {
                Box::new(crate::data_sources::ReferenceTableDataSource::new())
                    as Box<dyn DataSourceWithConfigure>
            }),
        );
        data_sources
    }
}
