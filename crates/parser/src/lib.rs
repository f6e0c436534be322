//! Go SDK extraction for provider-codegen
//!
//! This crate turns a downloaded Go SDK module into the intermediate model
//! (`sdk_info.json`) consumed by the generators.
//!
//! ## Pipeline
//!
//! - [`ModuleCache`] locates `module[@version]` in the Go module cache
//! - [`SourceCatalog`] walks the package and records structs, receiver
//!   methods and integer-backed enums (via tree-sitter)
//! - [`StructResolver`] expands a type into its field tree, cutting cycles
//! - [`select_api_operations`] keeps the operations whose owning type looks
//!   like an API type and [`ApiClassifier`] resolves their request/response
//!   shapes
//! - [`OperationFilter`] optionally narrows the result to one receiver or a
//!   keyword
//!
//! [`SdkExtractor`] runs all of the above.

pub mod classifier;
pub mod extractor;
pub mod filter;
pub mod module_cache;
pub mod normalizer;
pub mod resolver;
pub mod source;

pub use classifier::{
    request_type, response_type, select_api_operations, ApiClassifier, OperationPredicate,
    OwningTypeSuffix,
};
pub use extractor::{ExtractRequest, Extraction, SdkExtractor};
pub use filter::{dependency_closure, OperationFilter};
pub use module_cache::{ModuleCache, ModuleSpec};
pub use resolver::{is_ignored_field, StructResolver, VisitingStack};
pub use source::{EnumCatalog, SourceCatalog, TypeCatalog};
