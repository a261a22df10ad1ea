//! Conversion between [`TableDescriptor`] and Terraform values

use tfplug::{AttributePath, Dynamic, DynamicValue, TfplugError};

use super::error::{ReferenceTableError, Result};
use super::model::{
    AccessDetails, FieldType, FileMetadata, SchemaField, SourceType, StorageType,
    TableDescriptor, TableSchema,
};

/// Reads a config, plan or state object into a descriptor
///
/// Enum-typed strings are validated here. `file_metadata` becomes `None` when
/// neither variant is set; when both are, `upload_id` wins.
pub fn descriptor_from_value(value: &DynamicValue) -> Result<TableDescriptor> {
    let table_name = required_string(value, &AttributePath::new("table_name"))?;
    let source_path = AttributePath::new("source");
    let source = SourceType::parse(&source_path, &required_string(value, &source_path)?)?;

    let mut descriptor = TableDescriptor::new(table_name, source, schema_from_value(value)?);
    descriptor.id = optional_string(value, &AttributePath::new("id"))?;
    descriptor.description = optional_string(value, &AttributePath::new("description"))?;
    descriptor.file_metadata = file_metadata_from_value(value)?;
    descriptor.tags = optional_string_list(value, &AttributePath::new("tags"))?;
    descriptor.created_by = optional_string(value, &AttributePath::new("created_by"))?;
    descriptor.last_updated_by = optional_string(value, &AttributePath::new("last_updated_by"))?;
    descriptor.status = optional_string(value, &AttributePath::new("status"))?;
    descriptor.updated_at = optional_string(value, &AttributePath::new("updated_at"))?;
    descriptor.row_count = match value.get(&AttributePath::new("row_count")) {
        Ok(Dynamic::Number(n)) => Some(*n as i64),
        _ => None,
    };

    Ok(descriptor)
}

fn schema_from_value(value: &DynamicValue) -> Result<TableSchema> {
    let fields_path = AttributePath::new("schema").attribute("fields");
    let items = value
        .get_list(&fields_path)
        .map_err(|e| invalid(&fields_path, e))?;

    let mut fields = Vec::with_capacity(items.len());
    for i in 0..items.len() {
        let field_path = fields_path.clone().index(i as i64);
        let name = required_string(value, &field_path.clone().attribute("name"))?;
        let type_path = field_path.attribute("type");
        let field_type = FieldType::parse(&type_path, &required_string(value, &type_path)?)?;
        fields.push(SchemaField { name, field_type });
    }

    let keys_path = AttributePath::new("schema").attribute("primary_keys");
    let primary_keys = optional_string_list(value, &keys_path)?.ok_or_else(|| {
        ReferenceTableError::InvalidConfiguration {
            path: keys_path.clone(),
            reason: "primary_keys is required".to_string(),
        }
    })?;

    Ok(TableSchema {
        fields,
        primary_keys,
    })
}

/// Reads the write-only `file_metadata` block, if any variant is set
pub fn file_metadata_from_value(value: &DynamicValue) -> Result<Option<FileMetadata>> {
    let root = AttributePath::new("file_metadata");

    if let Some(upload_id) = optional_string(value, &root.clone().attribute("upload_id"))? {
        return Ok(Some(FileMetadata::LocalFile { upload_id }));
    }

    let details = root.attribute("access_details");
    match value.get(&details) {
        Ok(d) if d.is_set() => {}
        _ => return Ok(None),
    }

    let type_path = details.clone().attribute("type");
    let storage_type = StorageType::parse(&type_path, &required_string(value, &type_path)?)?;

    Ok(Some(FileMetadata::CloudStorage {
        access_details: AccessDetails {
            storage_type,
            region: optional_string(value, &details.clone().attribute("region"))?,
            bucket_name: required_string(value, &details.clone().attribute("bucket_name"))?,
            key_path: required_string(value, &details.attribute("key_path"))?,
        },
    }))
}

/// Full resource state, `file_metadata` included
pub fn descriptor_to_value(descriptor: &TableDescriptor) -> DynamicValue {
    let mut value = data_source_value(descriptor);
    if let Dynamic::Map(map) = &mut value.value {
        map.insert(
            "file_metadata".to_string(),
            file_metadata_to_dynamic(descriptor.file_metadata.as_ref()),
        );
    }
    value
}

/// State for the data source, which has no `file_metadata`
pub fn data_source_value(descriptor: &TableDescriptor) -> DynamicValue {
    let fields = descriptor
        .schema
        .fields
        .iter()
        .map(|field| {
            Dynamic::object([
                ("name", Dynamic::string(&field.name)),
                ("type", Dynamic::string(field.field_type.as_str())),
            ])
        })
        .collect();

    DynamicValue::new(Dynamic::object([
        ("id", Dynamic::from_option(descriptor.id.clone())),
        ("table_name", Dynamic::string(&descriptor.table_name)),
        ("description", Dynamic::from_option(descriptor.description.clone())),
        ("source", Dynamic::string(descriptor.source.as_str())),
        (
            "schema",
            Dynamic::object([
                ("fields", Dynamic::List(fields)),
                (
                    "primary_keys",
                    Dynamic::string_list(descriptor.schema.primary_keys.iter().cloned()),
                ),
            ]),
        ),
        (
            "tags",
            descriptor
                .tags
                .as_ref()
                .map(|tags| Dynamic::string_list(tags.iter().cloned()))
                .unwrap_or(Dynamic::Null),
        ),
        ("created_by", Dynamic::from_option(descriptor.created_by.clone())),
        (
            "last_updated_by",
            Dynamic::from_option(descriptor.last_updated_by.clone()),
        ),
        (
            "row_count",
            descriptor
                .row_count
                .map(|n| Dynamic::Number(n as f64))
                .unwrap_or(Dynamic::Null),
        ),
        ("status", Dynamic::from_option(descriptor.status.clone())),
        ("updated_at", Dynamic::from_option(descriptor.updated_at.clone())),
    ]))
}

fn file_metadata_to_dynamic(file_metadata: Option<&FileMetadata>) -> Dynamic {
    match file_metadata {
        None => Dynamic::Null,
        Some(FileMetadata::LocalFile { upload_id }) => Dynamic::object([
            ("upload_id", Dynamic::string(upload_id)),
            ("access_details", Dynamic::Null),
        ]),
        Some(FileMetadata::CloudStorage { access_details }) => Dynamic::object([
            ("upload_id", Dynamic::Null),
            (
                "access_details",
                Dynamic::object([
                    ("type", Dynamic::string(access_details.storage_type.as_str())),
                    ("region", Dynamic::from_option(access_details.region.clone())),
                    ("bucket_name", Dynamic::string(&access_details.bucket_name)),
                    ("key_path", Dynamic::string(&access_details.key_path)),
                ]),
            ),
        ]),
    }
}

fn required_string(value: &DynamicValue, path: &AttributePath) -> Result<String> {
    value.get_string(path).map_err(|e| invalid(path, e))
}

fn optional_string(value: &DynamicValue, path: &AttributePath) -> Result<Option<String>> {
    value.get_optional_string(path).map_err(|e| invalid(path, e))
}

fn optional_string_list(value: &DynamicValue, path: &AttributePath) -> Result<Option<Vec<String>>> {
    let Some(items) = value.get_optional_list(path).map_err(|e| invalid(path, e))? else {
        return Ok(None);
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                ReferenceTableError::InvalidConfiguration {
                    path: path.clone().index(i as i64),
                    reason: format!("expected string, got {}", item.type_name()),
                }
            })
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

fn invalid(path: &AttributePath, error: TfplugError) -> ReferenceTableError {
    let reason = if error.is_missing() {
        "value is required".to_string()
    } else {
        error.to_string()
    };
    ReferenceTableError::InvalidConfiguration {
        path: path.clone(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(file_metadata: Dynamic) -> DynamicValue {
        DynamicValue::new(Dynamic::object([
            ("id", Dynamic::Unknown),
            ("table_name", Dynamic::string("t1")),
            ("description", Dynamic::Null),
            ("source", Dynamic::string("S3")),
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
            ("row_count", Dynamic::Unknown),
        ]))
    }

    fn s3_metadata() -> Dynamic {
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

    #[test]
    fn reads_config_into_descriptor() {
        let descriptor = descriptor_from_value(&config(s3_metadata())).unwrap();

        assert_eq!(descriptor.id, None);
        assert_eq!(descriptor.table_name, "t1");
        assert_eq!(descriptor.source, SourceType::S3);
        assert_eq!(descriptor.schema.fields[1].field_type, FieldType::Double);
        assert_eq!(descriptor.schema.primary_keys, vec!["id"]);
        assert_eq!(descriptor.tags, None);
        assert_eq!(descriptor.row_count, None);
        match descriptor.file_metadata {
            Some(FileMetadata::CloudStorage { access_details }) => {
                assert_eq!(access_details.storage_type, StorageType::S3);
                assert_eq!(access_details.region, None);
                assert_eq!(access_details.bucket_name, "b");
            }
            other => panic!("Expected cloud storage, got {:?}", other),
        }
    }

    #[test]
    fn unknown_source_names_the_field() {
        let mut value = config(s3_metadata());
        value
            .set_string(&AttributePath::new("source"), "WEIRD".to_string())
            .unwrap();

        match descriptor_from_value(&value) {
            Err(ReferenceTableError::InvalidEnumValue { path, value, .. }) => {
                assert_eq!(path.to_string(), "source");
                assert_eq!(value, "WEIRD");
            }
            other => panic!("Expected InvalidEnumValue, got {:?}", other),
        }
    }

    #[test]
    fn unknown_storage_type_names_the_nested_field() {
        let mut value = config(s3_metadata());
        value
            .set_string(
                &AttributePath::new("file_metadata")
                    .attribute("access_details")
                    .attribute("type"),
                "S3".to_string(),
            )
            .unwrap();

        match descriptor_from_value(&value) {
            Err(ReferenceTableError::InvalidEnumValue { path, .. }) => {
                assert_eq!(path.to_string(), "file_metadata.access_details.type")
            }
            other => panic!("Expected InvalidEnumValue, got {:?}", other),
        }
    }

    #[test]
    fn upload_id_takes_precedence() {
        let metadata = Dynamic::object([
            ("upload_id", Dynamic::string("upload-1")),
            ("access_details", Dynamic::Null),
        ]);
        let descriptor = descriptor_from_value(&config(metadata)).unwrap();
        assert_eq!(
            descriptor.file_metadata,
            Some(FileMetadata::LocalFile {
                upload_id: "upload-1".to_string()
            })
        );
    }

    #[test]
    fn absent_file_metadata_is_none() {
        let descriptor = descriptor_from_value(&config(Dynamic::Null)).unwrap();
        assert_eq!(descriptor.file_metadata, None);

        let empty = Dynamic::object([
            ("upload_id", Dynamic::Null),
            ("access_details", Dynamic::Null),
        ]);
        let descriptor = descriptor_from_value(&config(empty)).unwrap();
        assert_eq!(descriptor.file_metadata, None);
    }

    #[test]
    fn missing_table_name_is_a_configuration_error() {
        let mut value = config(s3_metadata());
        value.set_null(&AttributePath::new("table_name")).unwrap();

        match descriptor_from_value(&value) {
            Err(ReferenceTableError::InvalidConfiguration { path, .. }) => {
                assert_eq!(path.to_string(), "table_name")
            }
            other => panic!("Expected InvalidConfiguration, got {:?}", other),
        }
    }

    #[test]
    fn state_round_trips_through_descriptor() {
        let mut descriptor = descriptor_from_value(&config(s3_metadata())).unwrap();
        descriptor.id = Some("tbl-1".to_string());
        descriptor.tags = Some(vec![]);
        descriptor.row_count = Some(5);
        descriptor.status = Some("DONE".to_string());

        let state = descriptor_to_value(&descriptor);
        assert_eq!(
            state.get_list(&AttributePath::new("tags")).unwrap(),
            Vec::<Dynamic>::new()
        );
        assert_eq!(state.get_number(&AttributePath::new("row_count")).unwrap(), 5.0);
        assert!(state
            .get(&AttributePath::new("description"))
            .unwrap()
            .is_null());

        assert_eq!(descriptor_from_value(&state).unwrap(), descriptor);
    }

    #[test]
    fn data_source_state_has_no_file_metadata() {
        let descriptor = descriptor_from_value(&config(s3_metadata())).unwrap();
        let state = data_source_value(&descriptor);
        assert!(state.get(&AttributePath::new("file_metadata")).is_err());
    }
}
