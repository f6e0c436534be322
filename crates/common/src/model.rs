//! Extracted SDK model and the `sdk_info.json` hand-off format
//!
//! The catalog records (`TypeRecord`, `OperationRecord`, `EnumRecord`) are
//! produced by the source catalog builder. The resolved records
//! (`ResolvedShape`, `ResolvedField`, `ApiOperation`) are what gets written to
//! the intermediate model and read back by the generators.
//!
//! Serialized member names follow the layout the provider glue already
//! consumes (`api_method`, `receiver`, `request_struct`, ...).

use crate::{CodegenError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// `importN` alias -> import path, for one source file
pub type ImportTable = BTreeMap<String, String>;

/// One field of a parsed struct declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRecord {
    /// Field name, empty for embedded fields
    pub name: String,
    /// Normalized type expression as written in source
    pub raw_type: String,
    /// Raw struct tag including its quotes, empty when absent
    pub tag: String,
}

impl FieldRecord {
    pub fn new(name: impl Into<String>, raw_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_type: raw_type.into(),
            tag: String::new(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn is_embedded(&self) -> bool {
        self.name.is_empty()
    }
}

/// One parsed struct declaration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeRecord {
    pub name: String,
    pub fields: Vec<FieldRecord>,
    /// Path of the declaring file, relative to the walked root
    pub file: String,
    /// Import aliases of the declaring file
    pub imports: ImportTable,
}

impl TypeRecord {
    pub fn new(name: impl Into<String>, fields: Vec<FieldRecord>) -> Self {
        Self {
            name: name.into(),
            fields,
            ..Default::default()
        }
    }
}

/// A method parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// One method declaration with a receiver
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OperationRecord {
    pub name: String,
    /// Receiver type name with any pointer marker removed
    pub owning_type: String,
    pub file: String,
    pub params: Vec<Parameter>,
    pub returns: Vec<String>,
    /// Import aliases of the declaring file
    pub imports: ImportTable,
}

/// One named constant of an integer-backed enum type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumVariant {
    pub name: String,
    pub ordinal: i64,
}

/// An integer-backed named type and its typed constants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EnumRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file: String,
    pub variants: Vec<EnumVariant>,
}

impl EnumRecord {
    /// Map an ordinal to its symbolic name.
    ///
    /// Unmapped ordinals are an error rather than a silent `UNKNOWN`.
    pub fn symbol_for(&self, ordinal: i64) -> Result<&str> {
        self.variants
            .iter()
            .find(|v| v.ordinal == ordinal)
            .map(|v| v.name.as_str())
            .ok_or_else(|| {
                CodegenError::Lookup(format!(
                    "enum {} has no variant with ordinal {}",
                    self.name, ordinal
                ))
            })
    }
}

/// One node of an expanded field tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedField {
    pub name: String,
    #[serde(rename = "type")]
    pub raw_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,
    #[serde(rename = "is_struct", default, skip_serializing_if = "is_false")]
    pub is_composite: bool,
    #[serde(rename = "fields", default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ResolvedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_path: Option<String>,
}

impl ResolvedField {
    /// A non-composite leaf
    pub fn leaf(name: impl Into<String>, raw_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_type: raw_type.into(),
            tag: String::new(),
            is_composite: false,
            children: Vec::new(),
            import_alias: None,
            import_path: None,
        }
    }

    /// A composite node with the given children
    pub fn composite(
        name: impl Into<String>,
        raw_type: impl Into<String>,
        children: Vec<ResolvedField>,
    ) -> Self {
        Self {
            is_composite: true,
            children,
            ..Self::leaf(name, raw_type)
        }
    }
}

/// Root of an expanded field tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedShape {
    pub name: String,
    #[serde(rename = "type")]
    pub raw_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file: String,
    #[serde(default)]
    pub fields: Vec<ResolvedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_path: Option<String>,
}

/// The callable part of a classified operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMethod {
    pub name: String,
    #[serde(rename = "receiver")]
    pub owning_type: String,
    pub file: String,
    #[serde(default)]
    pub params: Vec<Parameter>,
}

/// A classified operation with its resolved request and response shapes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiOperation {
    #[serde(rename = "api_method")]
    pub method: ApiMethod,
    #[serde(
        rename = "request_struct",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub request_shape: Option<ResolvedShape>,
    #[serde(
        rename = "response_struct",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub response_shape: Option<ResolvedShape>,
}

/// The serialized extraction output (`sdk_info.json`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IntermediateModel {
    /// Module identifier as requested, version suffix included
    #[serde(rename = "package")]
    pub namespace_identifier: String,
    /// Module (or sub-package) path without version
    #[serde(rename = "package_path")]
    pub namespace_path: String,
    #[serde(rename = "api_request_response_struct", default)]
    pub operations: Vec<ApiOperation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enums: Vec<EnumRecord>,
}

impl IntermediateModel {
    /// Parse a model from its JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            CodegenError::Serialization(format!("Failed to parse intermediate model: {}", e))
        })
    }

    /// Load a model from an `sdk_info.json` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| CodegenError::io(path, e))?;
        Self::from_json(&content)
    }

    /// Pretty JSON rendering, as written to disk
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            CodegenError::Serialization(format!("Failed to serialize intermediate model: {}", e))
        })
    }

    /// Write the model to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json_pretty()?;
        fs::write(path, json).map_err(|e| CodegenError::io(path, e))
    }

    /// First operation with the given name
    pub fn find_operation(&self, name: &str) -> Option<&ApiOperation> {
        self.operations.iter().find(|op| op.method.name == name)
    }

    /// Enum record with the given type name
    pub fn enum_named(&self, name: &str) -> Option<&EnumRecord> {
        self.enums.iter().find(|e| e.name == name)
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}
