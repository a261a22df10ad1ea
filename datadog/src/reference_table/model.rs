//! Typed description of a reference table
//!
//! Strings only become enum values through the `parse` constructors below,
//! which is where values outside the allowed sets are rejected.

use tfplug::AttributePath;

use super::error::{ReferenceTableError, Result};

/// Where the table's rows come from. Fixed once the table exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    LocalFile,
    S3,
    Gcs,
    Azure,
}

impl SourceType {
    pub const VALUES: &'static [&'static str] = &["LOCAL_FILE", "S3", "GCS", "AZURE"];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::LocalFile => "LOCAL_FILE",
            SourceType::S3 => "S3",
            SourceType::Gcs => "GCS",
            SourceType::Azure => "AZURE",
        }
    }

    pub fn parse(path: &AttributePath, value: &str) -> Result<Self> {
        match value {
            "LOCAL_FILE" => Ok(SourceType::LocalFile),
            "S3" => Ok(SourceType::S3),
            "GCS" => Ok(SourceType::Gcs),
            "AZURE" => Ok(SourceType::Azure),
            _ => Err(invalid(path, value, Self::VALUES)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Double,
    Boolean,
}

impl FieldType {
    pub const VALUES: &'static [&'static str] = &["STRING", "DOUBLE", "BOOLEAN"];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "STRING",
            FieldType::Double => "DOUBLE",
            FieldType::Boolean => "BOOLEAN",
        }
    }

    pub fn parse(path: &AttributePath, value: &str) -> Result<Self> {
        match value {
            "STRING" => Ok(FieldType::String),
            "DOUBLE" => Ok(FieldType::Double),
            "BOOLEAN" => Ok(FieldType::Boolean),
            _ => Err(invalid(path, value, Self::VALUES)),
        }
    }
}

/// Cloud provider holding the source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    S3,
    Gcs,
    Azure,
}

impl StorageType {
    pub const VALUES: &'static [&'static str] = &["s3", "gcs", "azure"];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::S3 => "s3",
            StorageType::Gcs => "gcs",
            StorageType::Azure => "azure",
        }
    }

    pub fn parse(path: &AttributePath, value: &str) -> Result<Self> {
        match value {
            "s3" => Ok(StorageType::S3),
            "gcs" => Ok(StorageType::Gcs),
            "azure" => Ok(StorageType::Azure),
            _ => Err(invalid(path, value, Self::VALUES)),
        }
    }
}

fn invalid(
    path: &AttributePath,
    value: &str,
    allowed: &'static [&'static str],
) -> ReferenceTableError {
    ReferenceTableError::InvalidEnumValue {
        path: path.clone(),
        value: value.to_string(),
        allowed,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub name: String,
    pub field_type: FieldType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub fields: Vec<SchemaField>,
    pub primary_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDetails {
    pub storage_type: StorageType,
    pub region: Option<String>,
    pub bucket_name: String,
    pub key_path: String,
}

/// How the initial contents reach the service. Write-only: sent on create,
/// never read back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileMetadata {
    LocalFile { upload_id: String },
    CloudStorage { access_details: AccessDetails },
}

/// Everything known about one reference table
///
/// `None` in an optional field means absent; `Some(vec![])` for tags is an
/// explicit empty list and is kept distinct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub id: Option<String>,
    pub table_name: String,
    pub description: Option<String>,
    pub source: SourceType,
    pub schema: TableSchema,
    pub file_metadata: Option<FileMetadata>,
    pub tags: Option<Vec<String>>,

    // Server-populated
    pub created_by: Option<String>,
    pub last_updated_by: Option<String>,
    pub row_count: Option<i64>,
    pub status: Option<String>,
    pub updated_at: Option<String>,
}

impl TableDescriptor {
    pub fn new(table_name: impl Into<String>, source: SourceType, schema: TableSchema) -> Self {
        Self {
            id: None,
            table_name: table_name.into(),
            description: None,
            source,
            schema,
            file_metadata: None,
            tags: None,
            created_by: None,
            last_updated_by: None,
            row_count: None,
            status: None,
            updated_at: None,
        }
    }
}
