//! Terraform data source generation
//!
//! Renders a read-only data source for one operation: the schema of its
//! response payload, a read function that calls the SDK and the flatten
//! functions mapping SDK values onto schema keys.

use crate::formatter::{format_best_effort, SourceFormatter};
use crate::namespace::{client_field_name, client_fields, namespace_token};
use crate::schema::{
    EnumTable, FlattenFn, NodeKind, ObjectAccess, RootCall, SchemaNode, SchemaPlan,
    Source, TfType, UnionBranch,
};
use crate::templates::{self, DATA_SOURCE};
use crate::GeneratedFile;
use provider_codegen_common::naming::{to_camel_case, to_snake_case};
use provider_codegen_common::{
    ApiOperation, CodegenError, EnumVariant, IntermediateModel, Result, Settings,
};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tera::{Context, Tera};
use tracing::info;

/// Attribute used to look the object up
pub const LOOKUP_KEY: &str = "ext_id";

/// Names derived for one data source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasourceNames {
    pub namespace: String,
    /// Terraform data source name, e.g. `nutanix_monitoringv2_get_alert_by_id`
    pub resource_name: String,
    pub func_name: String,
    pub read_func_name: String,
    /// Field of the provider's `conns.Client` holding the namespace client
    pub client_field: String,
    pub file_name: String,
}

impl DatasourceNames {
    pub fn new(prefix: &str, namespace: &str, method: &str) -> Self {
        let resource_name = format!(
            "{}_{}_{}",
            prefix,
            to_snake_case(namespace),
            to_snake_case(method)
        );
        let func_name = format!("Datasource{}", to_camel_case(&resource_name));
        let camel_namespace = to_camel_case(namespace);
        let client_field = format!(
            "{}API",
            camel_namespace
                .strip_suffix("v2")
                .unwrap_or(&camel_namespace)
        );

        Self {
            namespace: namespace.to_string(),
            read_func_name: format!("{}Read", func_name),
            file_name: format!("data_source_{}.go", to_snake_case(&resource_name)),
            resource_name,
            func_name,
            client_field,
        }
    }
}

/// Rendered data source, not yet written
#[derive(Debug, Clone)]
pub struct RenderedDatasource {
    pub names: DatasourceNames,
    pub source: String,
}

#[derive(Serialize)]
struct FlattenView {
    name: String,
    param_type: String,
    union: Option<UnionBranch>,
    statements: Vec<String>,
}

#[derive(Serialize)]
struct EnumTableView {
    table: String,
    flatten: String,
    go_type: String,
    enum_name: String,
    variants: Vec<EnumVariant>,
}

#[derive(Serialize)]
struct RootCallView {
    flatten: String,
    argument: String,
}

/// Generates data source files
pub struct DatasourceGenerator<'a> {
    tera: Tera,
    settings: &'a Settings,
}

impl<'a> DatasourceGenerator<'a> {
    pub fn new(settings: &'a Settings) -> Result<Self> {
        Ok(Self {
            tera: templates::load_templates()?,
            settings,
        })
    }

    /// Namespace used when none is given: `<token>v2`
    pub fn default_namespace(model: &IntermediateModel) -> Result<String> {
        Ok(format!("{}v2", namespace_token(&model.namespace_path)?))
    }

    /// Render the data source for `method`
    pub fn render(
        &self,
        model: &IntermediateModel,
        method: &str,
        namespace: Option<&str>,
    ) -> Result<RenderedDatasource> {
        let operation = model.find_operation(method).ok_or_else(|| {
            CodegenError::Lookup(format!(
                "API method '{}' not found in intermediate model",
                method
            ))
        })?;
        let shape = operation.response_shape.as_ref().ok_or_else(|| {
            CodegenError::Lookup(format!(
                "No response structure found for API method '{}'",
                method
            ))
        })?;

        let namespace = match namespace.filter(|ns| !ns.is_empty()) {
            Some(ns) => ns.to_string(),
            None => Self::default_namespace(model)?,
        };
        let names = DatasourceNames::new(&self.settings.provider_prefix, &namespace, method);

        let plan = SchemaPlan::build(shape, &model.enums, &[LOOKUP_KEY]);
        info!(
            "Planned {} root attributes and {} flatten functions for {}",
            plan.root.len(),
            plan.flatten_fns.len(),
            names.resource_name
        );

        let mut context = Context::new();
        context.insert("namespace", &names.namespace);
        context.insert("resource_name", &names.resource_name);
        context.insert("func_name", &names.func_name);
        context.insert("read_func_name", &names.read_func_name);
        context.insert("client_field", &names.client_field);
        context.insert("api_field", &api_field(model, operation));
        context.insert("method_name", &operation.method.name);
        context.insert("provider_module", &self.settings.provider_module);
        context.insert("needs_fmt", &plan.needs_fmt());
        context.insert("imports", &plan.imports);
        context.insert("schema_fields", &render_schema(&plan.root, 3));
        context.insert("root_call", &plan.root_call.as_ref().map(root_call_view));
        context.insert(
            "enum_tables",
            &plan.enum_tables.iter().map(enum_table_view).collect::<Vec<_>>(),
        );
        context.insert(
            "flatten_fns",
            &plan
                .flatten_fns
                .iter()
                .map(|f| self.flatten_view(f))
                .collect::<Vec<_>>(),
        );

        let source = templates::render(&self.tera, DATA_SOURCE, &context)?;
        Ok(RenderedDatasource { names, source })
    }

    /// Write `<output_dir>/<namespace>/data_source_<name>.go` and format it
    pub fn generate(
        &self,
        model: &IntermediateModel,
        method: &str,
        namespace: Option<&str>,
        output_dir: &Path,
        formatter: &dyn SourceFormatter,
    ) -> Result<GeneratedFile> {
        let rendered = self.render(model, method, namespace)?;

        let dir = output_dir.join(&rendered.names.namespace);
        fs::create_dir_all(&dir).map_err(|e| CodegenError::io(&dir, e))?;
        let path = dir.join(&rendered.names.file_name);
        fs::write(&path, &rendered.source).map_err(|e| CodegenError::io(&path, e))?;
        info!("Wrote data source to {}", path.display());

        let formatted = format_best_effort(formatter, &path);
        Ok(GeneratedFile { path, formatted })
    }

    fn flatten_view(&self, f: &FlattenFn) -> FlattenView {
        let indent = if f.union.is_some() { 2 } else { 1 };
        FlattenView {
            name: f.name.clone(),
            param_type: f.param_type.clone(),
            union: f.union.clone(),
            statements: f
                .fields
                .iter()
                .map(|node| flatten_statement(node, &self.settings.time_layout, indent))
                .collect(),
        }
    }
}

/// Namespace client field for the operation's owning type
fn api_field(model: &IntermediateModel, operation: &ApiOperation) -> String {
    let owning_type = operation.method.owning_type.as_str();
    client_fields(model.operations.iter().map(|op| op.method.owning_type.as_str()))
        .into_iter()
        .find(|f| f.api_type == owning_type)
        .map(|f| f.field_name)
        .unwrap_or_else(|| client_field_name(owning_type))
}

fn root_call_view(call: &RootCall) -> RootCallView {
    RootCallView {
        flatten: call.flatten.clone(),
        argument: call.argument.clone(),
    }
}

fn enum_table_view(table: &EnumTable) -> EnumTableView {
    // A repeated ordinal would be a duplicate map key in Go
    let mut seen = HashSet::new();
    let variants = table
        .record
        .variants
        .iter()
        .filter(|v| seen.insert(v.ordinal))
        .filter_map(|v| {
            let name = table.record.symbol_for(v.ordinal).ok()?;
            Some(EnumVariant {
                name: name.to_string(),
                ordinal: v.ordinal,
            })
        })
        .collect();

    EnumTableView {
        table: table.table.clone(),
        flatten: table.flatten.clone(),
        go_type: table.go_type.clone(),
        enum_name: table.record.name.clone(),
        variants,
    }
}

/// Schema map entries for one scope
pub fn render_schema(nodes: &[SchemaNode], depth: usize) -> String {
    let mut out = String::new();
    for node in nodes {
        write_schema_node(&mut out, node, depth);
    }
    out
}

fn write_schema_node(out: &mut String, node: &SchemaNode, depth: usize) {
    let pad = "\t".repeat(depth);
    let _ = writeln!(out, "{}\"{}\": {{", pad, node.key);
    let _ = writeln!(out, "{}\tType:     schema.{},", pad, node.tf_type().as_go());
    let _ = writeln!(out, "{}\tComputed: true,", pad);

    match &node.kind {
        NodeKind::Object { .. } => {
            let _ = writeln!(out, "{}\tElem: &schema.Resource{{", pad);
            let _ = writeln!(out, "{}\t\tSchema: map[string]*schema.Schema{{", pad);
            out.push_str(&render_schema(&node.children, depth + 3));
            let _ = writeln!(out, "{}\t\t}},", pad);
            let _ = writeln!(out, "{}\t}},", pad);
        },
        NodeKind::ScalarList { elem, .. } => {
            let _ = writeln!(out, "{}\tElem: &schema.Schema{{Type: schema.{}}},", pad, elem.as_go());
        },
        NodeKind::EnumList { .. } | NodeKind::Opaque => {
            let _ = writeln!(
                out,
                "{}\tElem: &schema.Schema{{Type: schema.{}}},",
                pad,
                TfType::String.as_go()
            );
        },
        _ => {},
    }

    let _ = writeln!(out, "{}}},", pad);
}

/// Go statements filling `item[key]` for one field
pub fn flatten_statement(node: &SchemaNode, time_layout: &str, depth: usize) -> String {
    let receiver = match node.source {
        Source::Receiver => "pr",
        Source::UnionValue => "v",
    };
    let access = format!("{}.{}", receiver, node.go_name);
    let key = &node.key;

    let body = match &node.kind {
        NodeKind::Scalar { pointer: true, .. } | NodeKind::Map { pointer: true } => format!(
            "if {a} != nil {{\n\titem[\"{k}\"] = *{a}\n}}",
            a = access,
            k = key
        ),
        NodeKind::Scalar { pointer: false, .. }
        | NodeKind::ScalarList {
            elem_pointer: false,
            ..
        }
        | NodeKind::Map { pointer: false } => format!("item[\"{}\"] = {}", key, access),
        NodeKind::ScalarList {
            elem_pointer: true, ..
        } => format!(
            "if {a} != nil {{\n\tvalues := make([]interface{{}}, 0, len({a}))\n\tfor _, e := range {a} {{\n\t\tif e != nil {{\n\t\t\tvalues = append(values, *e)\n\t\t}}\n\t}}\n\titem[\"{k}\"] = values\n}}",
            a = access,
            k = key
        ),
        NodeKind::Time { pointer: true } => format!(
            "if {a} != nil {{\n\titem[\"{k}\"] = {a}.Format(\"{l}\")\n}}",
            a = access,
            k = key,
            l = time_layout
        ),
        NodeKind::Time { pointer: false } => format!(
            "item[\"{}\"] = {}.Format(\"{}\")",
            key, access, time_layout
        ),
        NodeKind::Enum { flatten, pointer } => {
            let (open, arg) = if *pointer {
                (format!("if {} != nil {{", access), format!("*{}", access))
            } else {
                ("{".to_string(), access.clone())
            };
            format!(
                "{open}\n\tname, err := {f}({arg})\n\tif err != nil {{\n\t\treturn nil, err\n\t}}\n\titem[\"{k}\"] = name\n}}",
                open = open,
                f = flatten,
                arg = arg,
                k = key
            )
        },
        NodeKind::EnumList {
            flatten,
            elem_pointer,
        } => {
            let (guard, arg) = if *elem_pointer {
                ("\t\tif e == nil {\n\t\t\tcontinue\n\t\t}\n", "*e")
            } else {
                ("", "e")
            };
            format!(
                "if {a} != nil {{\n\tnames := make([]string, 0, len({a}))\n\tfor _, e := range {a} {{\n{g}\t\tname, err := {f}({arg})\n\t\tif err != nil {{\n\t\t\treturn nil, err\n\t\t}}\n\t\tnames = append(names, name)\n\t}}\n\titem[\"{k}\"] = names\n}}",
                a = access,
                g = guard,
                f = flatten,
                arg = arg,
                k = key
            )
        },
        NodeKind::Object { flatten, access: how } => match how {
            ObjectAccess::Pointer => format!(
                "if {a} != nil {{\n\tnested, err := {f}({a})\n\tif err != nil {{\n\t\treturn nil, err\n\t}}\n\titem[\"{k}\"] = nested\n}}",
                a = access,
                f = flatten,
                k = key
            ),
            ObjectAccess::Value => format!(
                "{{\n\tnested, err := {f}(&{a})\n\tif err != nil {{\n\t\treturn nil, err\n\t}}\n\titem[\"{k}\"] = nested\n}}",
                a = access,
                f = flatten,
                k = key
            ),
            ObjectAccess::Slice { elem_pointer } => format!(
                "if {a} != nil {{\n\tnested := make([]map[string]interface{{}}, 0, len({a}))\n\tfor i := range {a} {{\n\t\tflat, err := {f}({amp}{a}[i])\n\t\tif err != nil {{\n\t\t\treturn nil, err\n\t\t}}\n\t\tnested = append(nested, flat...)\n\t}}\n\titem[\"{k}\"] = nested\n}}",
                a = access,
                f = flatten,
                amp = if *elem_pointer { "" } else { "&" },
                k = key
            ),
        },
        NodeKind::Opaque => format!("// {}: not flattened", key),
    };

    indent(&body, depth)
}

fn indent(body: &str, depth: usize) -> String {
    let pad = "\t".repeat(depth);
    body.lines()
        .map(|line| format!("{}{}", pad, line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(key: &str, go_name: &str, kind: NodeKind) -> SchemaNode {
        SchemaNode {
            key: key.to_string(),
            go_name: go_name.to_string(),
            source: Source::Receiver,
            kind,
            children: Vec::new(),
        }
    }

    #[test]
    fn test_names() {
        let names = DatasourceNames::new("nutanix", "monitoringv2", "GetAlertById");
        assert_eq!(names.resource_name, "nutanix_monitoringv2_get_alert_by_id");
        assert_eq!(names.func_name, "DatasourceNutanixMonitoringv2GetAlertById");
        assert_eq!(names.read_func_name, "DatasourceNutanixMonitoringv2GetAlertByIdRead");
        assert_eq!(names.client_field, "MonitoringAPI");
        assert_eq!(names.file_name, "data_source_nutanix_monitoringv2_get_alert_by_id.go");
    }

    #[test]
    fn test_pointer_scalar_is_nil_guarded() {
        let statement = flatten_statement(
            &node(
                "name",
                "Name",
                NodeKind::Scalar {
                    tf: TfType::String,
                    pointer: true,
                },
            ),
            "2006-01-02T15:04:05Z07:00",
            0,
        );
        assert_eq!(statement, "if pr.Name != nil {\n\titem[\"name\"] = *pr.Name\n}");
    }

    #[test]
    fn test_pointer_map_is_dereferenced() {
        let statement = flatten_statement(
            &node("labels", "Labels", NodeKind::Map { pointer: true }),
            "",
            0,
        );
        assert_eq!(statement, "if pr.Labels != nil {\n\titem[\"labels\"] = *pr.Labels\n}");

        let statement = flatten_statement(
            &node("labels", "Labels", NodeKind::Map { pointer: false }),
            "",
            0,
        );
        assert_eq!(statement, "item[\"labels\"] = pr.Labels");
    }

    #[test]
    fn test_time_uses_layout() {
        let mut created = node("created_time", "CreatedTime", NodeKind::Time { pointer: false });
        created.source = Source::UnionValue;
        let statement = flatten_statement(&created, "2006-01-02", 1);
        assert_eq!(statement, "\titem[\"created_time\"] = v.CreatedTime.Format(\"2006-01-02\")");
    }

    #[test]
    fn test_slice_object_takes_element_address() {
        let statement = flatten_statement(
            &node(
                "links",
                "Links",
                NodeKind::Object {
                    flatten: "flattenApiLink".to_string(),
                    access: ObjectAccess::Slice {
                        elem_pointer: false,
                    },
                },
            ),
            "",
            0,
        );
        assert!(statement.contains("flattenApiLink(&pr.Links[i])"));
        assert!(statement.contains("item[\"links\"] = nested"));
    }

    #[test]
    fn test_schema_entry_for_nested_object() {
        let mut owner = node(
            "owner",
            "Owner",
            NodeKind::Object {
                flatten: "flattenOwner".to_string(),
                access: ObjectAccess::Pointer,
            },
        );
        owner.children = vec![node(
            "tags",
            "Tags",
            NodeKind::ScalarList {
                elem: TfType::String,
                elem_pointer: false,
            },
        )];

        let text = render_schema(&[owner], 0);
        assert!(text.starts_with("\"owner\": {\n\tType:     schema.TypeList,"));
        assert!(text.contains("Elem: &schema.Resource{"));
        assert!(text.contains("\"tags\": {"));
        assert!(text.contains("Elem: &schema.Schema{Type: schema.TypeString},"));
    }

    #[test]
    fn test_opaque_field_is_a_comment() {
        let statement = flatten_statement(&node("parent", "Parent", NodeKind::Opaque), "", 1);
        assert_eq!(statement, "\t// parent: not flattened");
    }
}
