//! Create, read, update and delete for one reference table

use tfplug::Context;

use crate::api::{with_context, ReferenceTablesApi};

use super::error::{ReferenceTableError, Result};
use super::mapper;
use super::model::TableDescriptor;

const EXPECTED_STATUS: u16 = 200;

/// Drives the remote calls behind each lifecycle operation
///
/// Each call is attempted once. A failure part way through an operation is
/// returned as-is, with no compensating call, so the caller keeps whatever
/// state it had before the operation started.
pub struct TableLifecycle<'a> {
    api: &'a dyn ReferenceTablesApi,
}

impl<'a> TableLifecycle<'a> {
    pub fn new(api: &'a dyn ReferenceTablesApi) -> Self {
        Self { api }
    }

    /// Creates the table and returns the descriptor the server reports
    ///
    /// The request's `file_metadata` is carried into the result since the
    /// server never echoes it in a usable form.
    pub async fn create(
        &self,
        ctx: &Context,
        desired: &TableDescriptor,
    ) -> Result<TableDescriptor> {
        let payload = mapper::encode_create(desired)?;

        tracing::debug!("Creating reference table {}", desired.table_name);
        let response = with_context(ctx, self.api.create_reference_table(&payload))
            .await
            .map_err(ReferenceTableError::transport("creating reference table"))?;

        if response.status != EXPECTED_STATUS {
            return Err(ReferenceTableError::UnexpectedStatus {
                operation: "creating reference table",
                expected: EXPECTED_STATUS,
                actual: response.status,
            });
        }

        let mut created = mapper::decode_result(&response.body)?;
        created.file_metadata = desired.file_metadata.clone();

        tracing::info!(
            "Created reference table {} with ID {}",
            created.table_name,
            created.id.as_deref().unwrap_or_default()
        );
        Ok(created)
    }

    /// Fetches the current descriptor, or `None` if the table is gone
    pub async fn read(&self, ctx: &Context, id: &str) -> Result<Option<TableDescriptor>> {
        tracing::debug!("Reading reference table {}", id);

        let response = match with_context(ctx, self.api.get_table(id)).await {
            Ok(response) => response,
            Err(e) if e.is_not_found() => {
                tracing::warn!("Reference table {} no longer exists", id);
                return Ok(None);
            }
            Err(e) => return Err(ReferenceTableError::transport("reading reference table")(e)),
        };

        mapper::decode_result(&response.body).map(Some)
    }

    /// Applies the mutable attributes, then reads the table back
    ///
    /// The patch endpoint returns no usable body, so the follow-up read is
    /// what supplies the server-computed fields.
    pub async fn update(
        &self,
        ctx: &Context,
        id: &str,
        desired: &TableDescriptor,
    ) -> Result<TableDescriptor> {
        let payload = mapper::encode_update(desired);

        tracing::debug!("Updating reference table {}", id);
        let status = with_context(ctx, self.api.update_reference_table(id, &payload))
            .await
            .map_err(ReferenceTableError::transport("updating reference table"))?;

        if status != EXPECTED_STATUS {
            return Err(ReferenceTableError::UnexpectedStatus {
                operation: "updating reference table",
                expected: EXPECTED_STATUS,
                actual: status,
            });
        }

        let mut updated = self
            .read(ctx, id)
            .await?
            .ok_or_else(|| ReferenceTableError::not_found_id(id))?;
        updated.file_metadata = desired.file_metadata.clone();
        Ok(updated)
    }

    /// Deletes the table. A table that is already gone counts as deleted.
    pub async fn delete(&self, ctx: &Context, id: &str) -> Result<()> {
        tracing::debug!("Deleting reference table {}", id);

        match with_context(ctx, self.api.delete_table(id)).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::warn!("Reference table {} was already deleted", id);
                Ok(())
            }
            Err(e) => Err(ReferenceTableError::Transport {
                operation: "deleting reference table",
                source: e,
            }),
        }
    }
}
