//! Go code generation from an extracted SDK model
//!
//! This crate turns an [`IntermediateModel`](provider_codegen_common::IntermediateModel)
//! into provider glue code:
//! - a namespace client aggregating every API type of one SDK namespace
//! - Terraform data sources with schema and flatten functions for one operation
//!
//! Generated files are formatted with `gofmt` when it is available.

pub mod datasource;
pub mod formatter;
pub mod namespace;
pub mod schema;
mod templates;

pub use datasource::{DatasourceGenerator, DatasourceNames, RenderedDatasource, LOOKUP_KEY};
pub use formatter::{format_best_effort, Gofmt, SourceFormatter};
pub use namespace::{
    client_field_name, client_fields, namespace_token, ClientField, NamespaceClientGenerator,
    RenderedClient,
};
pub use schema::{is_error_branch, NodeKind, SchemaNode, SchemaPlan, TfType};

use std::path::PathBuf;

/// A file written by one of the generators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    /// Whether the external formatter succeeded on it
    pub formatted: bool,
}
