//! Go source cataloging
//!
//! Walks an SDK package directory and records its struct declarations,
//! receiver methods and integer-backed enums.
//!
//! ## Usage
//! ```rust,ignore
//! use provider_codegen_parser::source::SourceCatalog;
//!
//! let catalog = SourceCatalog::build(Path::new("pkg/mod/github.com/acme/widgets-go-client/v4@v4.0.1"))?;
//! println!("{} operations", catalog.operations.len());
//! ```

mod catalog;
mod parser;

pub use catalog::{EnumCatalog, SourceCatalog, TypeCatalog};
pub use parser::{parse_int_literal, GoSourceParser, ParsedFile, TypedConst};
