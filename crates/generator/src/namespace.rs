//! Namespace client generation
//!
//! Emits one Go file per SDK namespace holding a `Client` struct with one
//! field per API owning type, plus the constructor that wires them to a shared
//! transport client.

use crate::formatter::{format_best_effort, SourceFormatter};
use crate::templates::{self, NAMESPACE_CLIENT};
use crate::GeneratedFile;
use provider_codegen_common::{CodegenError, IntermediateModel, Result, Settings};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tera::{Context, Tera};
use tracing::info;

/// Owning type that is the transport client itself rather than an API
pub const TRANSPORT_TYPE: &str = "ApiClient";

static NAMESPACE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/([a-z0-9-]+)-go-client/").expect("namespace pattern is valid"));

/// Namespace token of a module path
///
/// # Examples
/// ```
/// use provider_codegen_generator::namespace_token;
///
/// let token = namespace_token("github.com/nutanix/ntnx-api-golang-clients/monitoring-go-client/v4");
/// assert_eq!(token.unwrap(), "monitoring");
/// ```
pub fn namespace_token(namespace_path: &str) -> Result<String> {
    NAMESPACE_TOKEN
        .captures(namespace_path)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| {
            CodegenError::Configuration(format!(
                "Cannot derive a namespace from '{}': expected a '<name>-go-client' path segment",
                namespace_path
            ))
        })
}

/// Client struct field name for an owning type
///
/// `WidgetsApi` -> `WidgetAPIInstance`, `VolumeApi` -> `VolumeAPI`,
/// `Volume` -> `VolumeAPI`.
pub fn client_field_name(owning_type: &str) -> String {
    match owning_type.strip_suffix("Api") {
        Some(base) => match base.strip_suffix('s') {
            Some(singular) => format!("{}APIInstance", singular),
            None => format!("{}API", base),
        },
        None => format!("{}API", owning_type),
    }
}

/// One field of the generated `Client` struct
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientField {
    pub field_name: String,
    pub api_type: String,
    pub constructor: String,
}

/// Client fields for a set of owning types
///
/// Types are taken in sorted order without duplicates. Only `...Api` types are
/// API clients, so the transport type and models are skipped. A name already taken gets a counter suffix starting at 1.
pub fn client_fields<'a>(owning_types: impl IntoIterator<Item = &'a str>) -> Vec<ClientField> {
    let distinct: BTreeSet<&str> = owning_types
        .into_iter()
        .filter(|t| *t != TRANSPORT_TYPE && t.ends_with("Api"))
        .collect();

    let mut used = HashSet::new();
    distinct
        .into_iter()
        .map(|api_type| {
            let candidate = client_field_name(api_type);
            let mut field_name = candidate.clone();
            let mut counter = 1;
            while used.contains(&field_name) {
                field_name = format!("{}{}", candidate, counter);
                counter += 1;
            }
            used.insert(field_name.clone());
            ClientField {
                field_name,
                api_type: api_type.to_string(),
                constructor: format!("New{}", api_type),
            }
        })
        .collect()
}

/// Rendered namespace client, not yet written
#[derive(Debug, Clone)]
pub struct RenderedClient {
    pub namespace: String,
    pub source: String,
}

/// Generates the namespace client file
pub struct NamespaceClientGenerator<'a> {
    tera: Tera,
    settings: &'a Settings,
}

impl<'a> NamespaceClientGenerator<'a> {
    pub fn new(settings: &'a Settings) -> Result<Self> {
        Ok(Self {
            tera: templates::load_templates()?,
            settings,
        })
    }

    /// Render the client source for a model
    pub fn render(&self, model: &IntermediateModel) -> Result<RenderedClient> {
        let namespace = namespace_token(&model.namespace_path)?;
        let fields = client_fields(
            model
                .operations
                .iter()
                .map(|op| op.method.owning_type.as_str()),
        );
        let client_alias = namespace.split('-').next().unwrap_or(&namespace).to_string();

        let mut context = Context::new();
        context.insert("namespace", &namespace);
        context.insert("api_import_path", &format!("{}/api", model.namespace_path));
        context.insert("client_import_path", &format!("{}/client", model.namespace_path));
        context.insert("client_alias", &client_alias);
        context.insert("provider_module", &self.settings.provider_module);
        context.insert("transport_port", &self.settings.transport_port);
        context.insert("fields", &fields);

        let source = templates::render(&self.tera, NAMESPACE_CLIENT, &context)?;
        Ok(RenderedClient { namespace, source })
    }

    /// Write `<output_dir>/<namespace>/<namespace>.go` and format it
    pub fn generate(
        &self,
        model: &IntermediateModel,
        output_dir: &Path,
        formatter: &dyn SourceFormatter,
    ) -> Result<GeneratedFile> {
        let rendered = self.render(model)?;

        let dir = output_dir.join(&rendered.namespace);
        fs::create_dir_all(&dir).map_err(|e| CodegenError::io(&dir, e))?;
        let path = dir.join(format!("{}.go", rendered.namespace));
        fs::write(&path, &rendered.source).map_err(|e| CodegenError::io(&path, e))?;
        info!("Wrote namespace client to {}", path.display());

        let formatted = format_best_effort(formatter, &path);
        Ok(GeneratedFile { path, formatted })
    }
}
