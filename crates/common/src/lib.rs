//! Common types and utilities for provider-codegen
//!
//! This crate contains the extracted SDK model shared by the parser and the
//! generator, the `sdk_info.json` hand-off format, the error taxonomy, the
//! settings file and a few naming helpers.

pub mod model;
pub mod naming;
pub mod settings;

pub use model::{
    ApiMethod, ApiOperation, EnumRecord, EnumVariant, FieldRecord, ImportTable,
    IntermediateModel, OperationRecord, Parameter, ResolvedField, ResolvedShape, TypeRecord,
};
pub use settings::Settings;

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while extracting or generating
#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("I/O error on {}: {source}", path.display())]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Formatting error: {0}")]
    Formatting(String),

    #[error("Lookup error: {0}")]
    Lookup(String),

    #[error("Template error: {0}")]
    Template(String),
}

impl CodegenError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        CodegenError::FileIo {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for CodegenError {
    fn from(err: serde_json::Error) -> Self {
        CodegenError::Serialization(err.to_string())
    }
}

/// Result type for extraction and generation operations
pub type Result<T> = std::result::Result<T, CodegenError>;
