//! Conversion between [`TableDescriptor`] and the wire payloads

use tfplug::AttributePath;

use crate::api::reference_tables::{
    self as wire, AccessDetailsPayload, CreateTableAttributes, CreateTableData,
    CreateTableRequest, FileMetadataPayload, PatchTableAttributes, PatchTableData,
    PatchTableRequest, TableData, TableList, TableResult, REFERENCE_TABLE_TYPE,
};

use super::error::{ReferenceTableError, Result};
use super::model::{
    FieldType, FileMetadata, SchemaField, SourceType, TableDescriptor, TableSchema,
};

/// Builds the create payload
///
/// `description` and `tags` are left out entirely when unset. Cloud storage
/// sources are always created with syncing enabled.
pub fn encode_create(desired: &TableDescriptor) -> Result<CreateTableRequest> {
    let file_metadata = match &desired.file_metadata {
        Some(FileMetadata::LocalFile { upload_id }) => FileMetadataPayload::LocalFile {
            upload_id: upload_id.clone(),
        },
        Some(FileMetadata::CloudStorage { access_details }) => FileMetadataPayload::CloudStorage {
            access_details: AccessDetailsPayload {
                storage_type: access_details.storage_type.as_str().to_string(),
                region: access_details.region.clone(),
                bucket_name: access_details.bucket_name.clone(),
                key_path: access_details.key_path.clone(),
            },
            sync_enabled: true,
        },
        None => {
            return Err(ReferenceTableError::MissingRequiredUnionVariant {
                path: AttributePath::new("file_metadata"),
            })
        }
    };

    Ok(CreateTableRequest {
        data: CreateTableData {
            data_type: REFERENCE_TABLE_TYPE.to_string(),
            attributes: CreateTableAttributes {
                table_name: desired.table_name.clone(),
                source: desired.source.as_str().to_string(),
                schema: encode_schema(&desired.schema),
                file_metadata,
                description: desired.description.clone(),
                tags: desired.tags.clone(),
            },
        },
    })
}

/// Builds the patch payload. Only the mutable attributes are sent, and unset
/// ones go out as nulls so the server drops any previous value.
pub fn encode_update(desired: &TableDescriptor) -> PatchTableRequest {
    PatchTableRequest {
        data: PatchTableData {
            data_type: REFERENCE_TABLE_TYPE.to_string(),
            attributes: PatchTableAttributes {
                schema: encode_schema(&desired.schema),
                description: desired.description.clone(),
                tags: desired.tags.clone(),
            },
        },
    }
}

fn encode_schema(schema: &TableSchema) -> wire::TableSchema {
    wire::TableSchema::new(
        schema
            .fields
            .iter()
            .map(|field| wire::SchemaField::new(&field.name, field.field_type.as_str()))
            .collect(),
        schema.primary_keys.clone(),
    )
}

/// Decodes a single-table response, envelope included
pub fn decode_result(result: &TableResult) -> Result<TableDescriptor> {
    let mut unparsed: Vec<String> = result.unparsed.keys().cloned().collect();
    unparsed.extend(
        unparsed_fields(&result.data)
            .into_iter()
            .map(|field| format!("data.{}", field)),
    );
    if !unparsed.is_empty() {
        unparsed.sort();
        return Err(ReferenceTableError::UnparsedResponseField { fields: unparsed });
    }
    decode(&result.data)
}

/// Builds a fresh descriptor from a response record
///
/// Optional attributes the server left out come back as `None`, so stale
/// values never survive a read. `file_metadata` is not part of the response
/// model and is always `None` here.
pub fn decode(data: &TableData) -> Result<TableDescriptor> {
    let unparsed = unparsed_fields(data);
    if !unparsed.is_empty() {
        return Err(ReferenceTableError::UnparsedResponseField { fields: unparsed });
    }

    let id = data.id.clone().ok_or_else(|| missing("id"))?;
    let attributes = data.attributes.as_ref().ok_or_else(|| missing("attributes"))?;

    let table_name = attributes
        .table_name
        .clone()
        .ok_or_else(|| missing("attributes.table_name"))?;
    let source = attributes
        .source
        .as_deref()
        .ok_or_else(|| missing("attributes.source"))?;
    let source = SourceType::parse(&AttributePath::new("source"), source)?;
    let schema = attributes
        .schema
        .as_ref()
        .ok_or_else(|| missing("attributes.schema"))?;

    Ok(TableDescriptor {
        id: Some(id),
        table_name,
        description: attributes.description.clone(),
        source,
        schema: decode_schema(schema)?,
        file_metadata: None,
        tags: attributes.tags.clone(),
        created_by: attributes.created_by.clone(),
        last_updated_by: attributes.last_updated_by.clone(),
        row_count: attributes.row_count,
        status: attributes.status.clone(),
        updated_at: attributes.updated_at.clone(),
    })
}

fn decode_schema(schema: &wire::TableSchema) -> Result<TableSchema> {
    let fields_path = AttributePath::new("schema").attribute("fields");
    let fields = schema
        .fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let path = fields_path.clone().index(i as i64).attribute("type");
            Ok(SchemaField {
                name: field.name.clone(),
                field_type: FieldType::parse(&path, &field.field_type)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(TableSchema {
        fields,
        primary_keys: schema.primary_keys.clone(),
    })
}

/// Names of response keys this client does not model, as dotted paths
/// relative to the table record
pub fn unparsed_fields(data: &TableData) -> Vec<String> {
    let mut fields: Vec<String> = data.unparsed.keys().cloned().collect();
    if let Some(attributes) = &data.attributes {
        fields.extend(
            attributes
                .unparsed
                .keys()
                .map(|key| format!("attributes.{}", key)),
        );
        if let Some(schema) = &attributes.schema {
            fields.extend(
                schema
                    .unparsed
                    .keys()
                    .map(|key| format!("attributes.schema.{}", key)),
            );
            for (i, field) in schema.fields.iter().enumerate() {
                fields.extend(
                    field
                        .unparsed
                        .keys()
                        .map(|key| format!("attributes.schema.fields[{}].{}", i, key)),
                );
            }
        }
    }
    fields.sort();
    fields
}

/// Same as [`unparsed_fields`] for every listed table, plus envelope keys
pub fn list_unparsed_fields(list: &TableList) -> Vec<String> {
    let mut fields: Vec<String> = list.unparsed.keys().cloned().collect();
    for (i, table) in list.data.iter().enumerate() {
        fields.extend(
            unparsed_fields(table)
                .into_iter()
                .map(|field| format!("data[{}].{}", i, field)),
        );
    }
    fields.sort();
    fields
}

fn missing(field: &str) -> ReferenceTableError {
    ReferenceTableError::MissingResponseField {
        field: field.to_string(),
    }
}
