use super::parser::{GoSourceParser, TypedConst};
use provider_codegen_common::{
    CodegenError, EnumRecord, EnumVariant, OperationRecord, Result, TypeRecord,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Struct declarations keyed by name
pub type TypeCatalog = HashMap<String, TypeRecord>;

/// Integer-backed enum types keyed by name
pub type EnumCatalog = BTreeMap<String, EnumRecord>;

/// Everything extracted from one source tree
#[derive(Debug, Clone, Default)]
pub struct SourceCatalog {
    pub types: TypeCatalog,
    pub enums: EnumCatalog,
    /// Operations in walk order
    pub operations: Vec<OperationRecord>,
}

impl SourceCatalog {
    /// Walk `root` and catalog every `.go` file below it
    ///
    /// Files that do not parse are skipped. A missing or unreadable root is an error.
    pub fn build(root: &Path) -> Result<Self> {
        let metadata = fs::metadata(root).map_err(|e| CodegenError::io(root, e))?;
        if !metadata.is_dir() {
            return Err(CodegenError::Configuration(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        let mut parser = GoSourceParser::new()?;
        let mut catalog = Self::default();
        let mut integer_types: Vec<(String, String)> = Vec::new();
        let mut typed_consts: Vec<TypedConst> = Vec::new();
        let mut file_count = 0usize;

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                CodegenError::io(path, e.into())
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() || !is_go_source(path) {
                continue;
            }

            let display_path = path
                .strip_prefix(root)
                .unwrap_or(path)
                .to_string_lossy()
                .into_owned();
            let Some(source) = read_source(path, &display_path) else {
                continue;
            };

            let parsed = match parser.parse_source(&source, &display_path) {
                Ok(parsed) => parsed,
                Err(e) => {
                    debug!("Skipping {}: {}", display_path, e);
                    continue;
                },
            };
            file_count += 1;

            for record in parsed.types {
                catalog.insert_type(record);
            }
            catalog.operations.extend(parsed.operations);
            integer_types.extend(
                parsed
                    .integer_types
                    .into_iter()
                    .map(|name| (name, parsed.path.clone())),
            );
            typed_consts.extend(parsed.typed_consts);
        }

        catalog.enums = build_enums(integer_types, &typed_consts);

        info!(
            "Cataloged {} files under {}: {} types, {} operations, {} enums",
            file_count,
            root.display(),
            catalog.types.len(),
            catalog.operations.len(),
            catalog.enums.len()
        );

        Ok(catalog)
    }

    /// Insert a type; a later declaration with the same name wins
    pub fn insert_type(&mut self, record: TypeRecord) {
        if let Some(previous) = self.types.get(&record.name) {
            debug!(
                "Type {} declared in {} replaces the declaration in {}",
                record.name, record.file, previous.file
            );
        }
        self.types.insert(record.name.clone(), record);
    }

    /// Merge types and enums from another catalog, its declarations winning
    pub fn merge_types(&mut self, other: SourceCatalog) {
        for record in other.types.into_values() {
            self.insert_type(record);
        }
        self.enums.extend(other.enums);
    }

    /// Keep only the named types
    pub fn retain_types(&mut self, keep: &HashSet<String>) {
        self.types.retain(|name, _| keep.contains(name));
    }
}

fn is_go_source(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".go") && !name.ends_with("_test.go")
}

fn build_enums(integer_types: Vec<(String, String)>, consts: &[TypedConst]) -> EnumCatalog {
    let mut enums = EnumCatalog::new();

    for (name, file) in integer_types {
        let prefix = format!("{}_", name.to_uppercase());
        let variants: Vec<EnumVariant> = consts
            .iter()
            .filter(|c| c.type_name == name)
            .map(|c| EnumVariant {
                name: c.name.strip_prefix(&prefix).unwrap_or(&c.name).to_string(),
                ordinal: c.value,
            })
            .collect();

        if variants.is_empty() {
            continue;
        }
        enums.insert(
            name.clone(),
            EnumRecord {
                name,
                file,
                variants,
            },
        );
    }

    enums
}

/// File text, or `None` when it cannot be read as UTF-8
fn read_source(path: &Path, display_path: &str) -> Option<String> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Skipping {}: {}", display_path, e);
            return None;
        },
    };
    match String::from_utf8(bytes) {
        Ok(source) => Some(source),
        Err(_) => {
            debug!("Skipping {}: not valid UTF-8", display_path);
            None
        },
    }
}
