//! Finding an existing table by id or by name

use tfplug::Context;

use crate::api::{with_context, ReferenceTablesApi};

use super::error::{ReferenceTableError, Result};
use super::mapper;
use super::model::TableDescriptor;

/// What the data source was asked to find. `id` wins when both are set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupKey {
    pub id: Option<String>,
    pub table_name: Option<String>,
}

pub struct TableLookup<'a> {
    api: &'a dyn ReferenceTablesApi,
}

impl<'a> TableLookup<'a> {
    pub fn new(api: &'a dyn ReferenceTablesApi) -> Self {
        Self { api }
    }

    /// Resolves the key to a table id
    ///
    /// An id is returned as given, without any remote call. A name is matched
    /// exactly against a full listing and the first match wins.
    pub async fn resolve_id(&self, ctx: &Context, key: &LookupKey) -> Result<String> {
        if let Some(id) = &key.id {
            return Ok(id.clone());
        }
        let Some(table_name) = &key.table_name else {
            return Err(ReferenceTableError::MissingLookupKey);
        };

        tracing::debug!("Looking up reference table by name {}", table_name);
        let list = with_context(ctx, self.api.list_tables())
            .await
            .map_err(ReferenceTableError::transport("listing reference tables"))?;

        let unparsed = mapper::list_unparsed_fields(&list);
        if !unparsed.is_empty() {
            return Err(ReferenceTableError::UnparsedResponseField { fields: unparsed });
        }

        let found = list.data.iter().find(|table| {
            table
                .attributes
                .as_ref()
                .and_then(|attributes| attributes.table_name.as_deref())
                == Some(table_name.as_str())
        });

        match found {
            Some(table) => table
                .id
                .clone()
                .ok_or_else(|| ReferenceTableError::MissingResponseField {
                    field: "data[].id".to_string(),
                }),
            None => Err(ReferenceTableError::not_found_name(table_name)),
        }
    }

    /// Resolves the key and fetches the table
    pub async fn lookup(&self, ctx: &Context, key: &LookupKey) -> Result<TableDescriptor> {
        let id = self.resolve_id(ctx, key).await?;

        let response = match with_context(ctx, self.api.get_table(&id)).await {
            Ok(response) => response,
            Err(e) if e.is_not_found() => return Err(ReferenceTableError::not_found_id(&id)),
            Err(e) => return Err(ReferenceTableError::transport("reading reference table")(e)),
        };

        mapper::decode_result(&response.body)
    }
}
