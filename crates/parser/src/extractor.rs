//! SDK extraction pipeline
//!
//! Locates a module, catalogs its sources, classifies the API surface and
//! assembles the [`IntermediateModel`] written to `sdk_info.json`.

use crate::classifier::{select_api_operations, ApiClassifier, OperationPredicate, OwningTypeSuffix};
use crate::filter::{dependency_closure, OperationFilter};
use crate::module_cache::{ModuleCache, ModuleSpec};
use crate::normalizer::base_name;
use crate::source::{EnumCatalog, SourceCatalog};
use provider_codegen_common::{
    ApiOperation, EnumRecord, IntermediateModel, OperationRecord, ResolvedField, Result,
    Settings,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What to extract
#[derive(Debug, Clone, Default)]
pub struct ExtractRequest {
    /// `module[@version]`
    pub package: String,
    /// Sub-package recorded as the namespace path when the module has an `api/` directory
    pub api_package: Option<String>,
    pub filter: OperationFilter,
}

/// Extraction result plus the counts reported to the user
#[derive(Debug, Clone)]
pub struct Extraction {
    pub model: IntermediateModel,
    pub package_dir: PathBuf,
    /// Operations accepted by the classifier and filter
    pub operation_count: usize,
    /// Types left in the catalog after filtering
    pub type_count: usize,
}

/// Runs the extraction pipeline against a module cache
pub struct SdkExtractor<P = OwningTypeSuffix> {
    cache: ModuleCache,
    predicate: P,
}

impl SdkExtractor<OwningTypeSuffix> {
    pub fn new(cache: ModuleCache, settings: &Settings) -> Self {
        Self::with_predicate(cache, OwningTypeSuffix::new(&settings.api_suffix))
    }
}

impl<P: OperationPredicate> SdkExtractor<P> {
    pub fn with_predicate(cache: ModuleCache, predicate: P) -> Self {
        Self { cache, predicate }
    }

    /// Locate the requested module and extract it
    pub fn extract(&self, request: &ExtractRequest) -> Result<Extraction> {
        let spec = ModuleSpec::parse(&request.package);
        info!("Locating module {}", spec.path);
        let mut package_dir = self.cache.locate(&spec)?;
        let mut namespace_path = spec.path.clone();
        info!("Found module at {}", package_dir.display());

        if let Some(api_package) = request.api_package.as_deref().filter(|p| !p.is_empty()) {
            let api_dir = package_dir.join("api");
            if api_dir.is_dir() {
                package_dir = api_dir;
                namespace_path = api_package.to_string();
            }
        }

        self.extract_dir(&package_dir, &request.package, &namespace_path, &request.filter)
    }

    /// Extract from a package directory that is already on disk
    pub fn extract_dir(
        &self,
        package_dir: &Path,
        identifier: &str,
        namespace_path: &str,
        filter: &OperationFilter,
    ) -> Result<Extraction> {
        info!("Extracting declarations from {}", package_dir.display());
        let mut catalog = SourceCatalog::build(package_dir)?;

        if let Some(models_dir) = package_dir.parent().map(|p| p.join("models")) {
            if models_dir.is_dir() && models_dir != package_dir {
                info!("Merging declarations from {}", models_dir.display());
                match SourceCatalog::build(&models_dir) {
                    Ok(models) => catalog.merge_types(models),
                    Err(e) => debug!("Ignoring models directory: {}", e),
                }
            }
        }

        let selected: Vec<OperationRecord> =
            select_api_operations(&self.predicate, &catalog.operations)
                .filter(|op| filter.matches(op))
                .cloned()
                .collect();

        if !filter.is_all() {
            let refs: Vec<&OperationRecord> = selected.iter().collect();
            let closure = dependency_closure(&refs, &catalog.types);
            catalog.retain_types(&closure);
            info!(
                "Filtered to {} operations and {} types",
                selected.len(),
                catalog.types.len()
            );
        }

        let classifier = ApiClassifier::new(&catalog.types, &self.predicate);
        let operations: Vec<ApiOperation> = selected.iter().map(|op| classifier.build(op)).collect();
        let enums = referenced_enums(&operations, &catalog.enums);

        Ok(Extraction {
            model: IntermediateModel {
                namespace_identifier: identifier.to_string(),
                namespace_path: namespace_path.to_string(),
                operations,
                enums,
            },
            package_dir: package_dir.to_path_buf(),
            operation_count: selected.len(),
            type_count: catalog.types.len(),
        })
    }
}

/// Enums whose type appears anywhere in the operations' shapes
fn referenced_enums(operations: &[ApiOperation], enums: &EnumCatalog) -> Vec<EnumRecord> {
    fn visit(fields: &[ResolvedField], enums: &EnumCatalog, used: &mut BTreeSet<String>) {
        for field in fields {
            let base = base_name(&field.raw_type);
            if enums.contains_key(&base) {
                used.insert(base);
            }
            visit(&field.children, enums, used);
        }
    }

    let mut used = BTreeSet::new();
    for op in operations {
        for shape in op.request_shape.iter().chain(op.response_shape.iter()) {
            visit(&shape.fields, enums, &mut used);
        }
    }

    used.into_iter()
        .filter_map(|name| enums.get(&name).cloned())
        .collect()
}
