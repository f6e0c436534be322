//! Schema and flatten planning for one response shape
//!
//! A [`SchemaPlan`] is built once from a [`ResolvedShape`] and drives both the
//! Terraform schema text and the flatten functions, so the two always agree
//! on keys.
//!
//! ## Rules
//!
//! - Composite fields become nested `TypeList` blocks with their own flatten
//!   function (one per distinct Go type and structure)
//! - Union members (`oneOfType*`) are never emitted themselves; the first
//!   composite success branch of a scope has its fields spliced into that
//!   scope and is read through `GetValue()`
//! - Keys are `snake_case` field names, suffixed `_2`, `_3`, ... on repeats
//!   within one nesting level

use provider_codegen_common::naming::{capitalize, to_snake_case};
use provider_codegen_common::{EnumRecord, ResolvedField, ResolvedShape};
use provider_codegen_parser::normalizer::{base_name, element_type, import_alias, is_time};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::LazyLock;
use tracing::debug;

/// Name prefix of discriminated union members
pub const UNION_PREFIX: &str = "oneOfType";

static ERROR_STATUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[45]\d\d").expect("status pattern is valid"));

static QUALIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z_][A-Za-z0-9_]*)\.").expect("qualifier pattern is valid"));

/// Whether a union member carries an HTTP error payload (`oneOfType400`, ...)
pub fn is_error_branch(name: &str) -> bool {
    let suffix = name.strip_prefix(UNION_PREFIX).unwrap_or(name);
    match suffix.parse::<u32>() {
        Ok(status) => (400..600).contains(&status),
        Err(_) => ERROR_STATUS.is_match(suffix),
    }
}

/// Terraform schema value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TfType {
    String,
    Int,
    Bool,
    Float,
    List,
    Map,
}

impl TfType {
    pub fn as_go(&self) -> &'static str {
        match self {
            TfType::String => "TypeString",
            TfType::Int => "TypeInt",
            TfType::Bool => "TypeBool",
            TfType::Float => "TypeFloat",
            TfType::List => "TypeList",
            TfType::Map => "TypeMap",
        }
    }

    /// Scalar Go type to schema type
    pub fn for_scalar(go_type: &str) -> Option<TfType> {
        match go_type {
            "string" => Some(TfType::String),
            "int" | "int8" | "int16" | "int32" | "int64" | "uint" | "uint8" | "uint16"
            | "uint32" | "uint64" => Some(TfType::Int),
            "bool" => Some(TfType::Bool),
            "float32" | "float64" => Some(TfType::Float),
            _ => None,
        }
    }
}

/// How a nested object is held by its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectAccess {
    Pointer,
    Value,
    Slice { elem_pointer: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Scalar { tf: TfType, pointer: bool },
    ScalarList { elem: TfType, elem_pointer: bool },
    Map { pointer: bool },
    Time { pointer: bool },
    Enum { flatten: String, pointer: bool },
    EnumList { flatten: String, elem_pointer: bool },
    Object { flatten: String, access: ObjectAccess },
    /// In the schema but not flattened (recursion cut or unsupported type)
    Opaque,
}

/// Where a flatten function reads a field from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// The function's `pr` argument
    Receiver,
    /// The value returned by `pr.GetValue()`
    UnionValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaNode {
    pub key: String,
    pub go_name: String,
    pub source: Source,
    pub kind: NodeKind,
    pub children: Vec<SchemaNode>,
}

impl SchemaNode {
    pub fn tf_type(&self) -> TfType {
        match &self.kind {
            NodeKind::Scalar { tf, .. } => *tf,
            NodeKind::Time { .. } | NodeKind::Enum { .. } => TfType::String,
            NodeKind::Map { .. } => TfType::Map,
            NodeKind::ScalarList { .. }
            | NodeKind::EnumList { .. }
            | NodeKind::Object { .. }
            | NodeKind::Opaque => TfType::List,
        }
    }
}

/// The spliced success branch of a union holder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnionBranch {
    /// Type asserted on `GetValue()`
    pub go_type: String,
    pub slice: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenFn {
    pub name: String,
    /// Qualified Go type the function takes a pointer to
    pub param_type: String,
    pub union: Option<UnionBranch>,
    pub fields: Vec<SchemaNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumTable {
    pub flatten: String,
    pub table: String,
    pub go_type: String,
    pub record: EnumRecord,
}

/// One import of the generated file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoImport {
    pub alias: String,
    pub path: String,
}

/// How the read function reaches the payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootCall {
    pub flatten: String,
    /// Go expression passed to `flatten`
    pub argument: String,
}

/// Everything needed to render a data source for one response shape
#[derive(Debug, Clone, Default)]
pub struct SchemaPlan {
    pub root: Vec<SchemaNode>,
    pub root_call: Option<RootCall>,
    pub flatten_fns: Vec<FlattenFn>,
    pub enum_tables: Vec<EnumTable>,
    pub imports: Vec<GoImport>,
}

impl SchemaPlan {
    /// Plan the payload of `shape`
    ///
    /// When the first field is a composite envelope (usually `Data`) its
    /// fields form the root; otherwise the shape's own fields do. `reserved`
    /// keys are already taken at the root (e.g., `ext_id`).
    pub fn build(shape: &ResolvedShape, enums: &[EnumRecord], reserved: &[&str]) -> SchemaPlan {
        let mut builder = PlanBuilder::new(enums);
        let pkg = Package {
            path: shape.import_path.clone(),
            hint: shape.import_alias.clone(),
        };

        let envelope = shape
            .fields
            .first()
            .filter(|f| f.is_composite && !f.children.is_empty())
            .filter(|f| {
                let t = f.raw_type.trim().trim_start_matches('*');
                !t.starts_with("[]") && !t.starts_with("map[")
            });

        let (root_field, argument) = match envelope {
            Some(field) => {
                let go_name = go_field_name(field);
                let argument = if field.raw_type.trim().starts_with('*') {
                    format!("resp.{}", go_name)
                } else {
                    format!("&resp.{}", go_name)
                };
                (field.clone(), argument)
            },
            None => (
                ResolvedField::composite(
                    &shape.name,
                    format!("*{}", shape.name),
                    shape.fields.clone(),
                ),
                "resp".to_string(),
            ),
        };

        let (kind, root) = builder.object_kind(&root_field, &pkg, reserved);
        let root_call = match kind {
            NodeKind::Object { flatten, .. } => Some(RootCall { flatten, argument }),
            _ => None,
        };

        builder.finish(root, root_call)
    }

    /// Whether the rendered file needs the `fmt` package
    pub fn needs_fmt(&self) -> bool {
        !self.enum_tables.is_empty() || self.flatten_fns.iter().any(|f| f.union.is_some())
    }
}

/// Package a field's type is declared in
#[derive(Debug, Clone, Default)]
struct Package {
    path: Option<String>,
    hint: Option<String>,
}

/// Key allocation for one nesting level
struct KeyScope {
    taken: HashSet<String>,
}

impl KeyScope {
    fn new(reserved: &[&str]) -> Self {
        Self {
            taken: reserved.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn claim(&mut self, base: &str) -> String {
        let mut key = base.to_string();
        let mut n = 1;
        while self.taken.contains(&key) {
            n += 1;
            key = format!("{}_{}", base, n);
        }
        self.taken.insert(key.clone());
        key
    }
}

struct PlanBuilder<'a> {
    enums: HashMap<&'a str, &'a EnumRecord>,
    /// import path -> alias
    aliases: BTreeMap<String, String>,
    flatten_fns: Vec<FlattenFn>,
    flatten_index: HashMap<(String, String), String>,
    enum_tables: BTreeMap<String, EnumTable>,
    used_names: HashSet<String>,
}

impl<'a> PlanBuilder<'a> {
    fn new(enums: &'a [EnumRecord]) -> Self {
        Self {
            enums: enums.iter().map(|e| (e.name.as_str(), e)).collect(),
            aliases: BTreeMap::new(),
            flatten_fns: Vec::new(),
            flatten_index: HashMap::new(),
            enum_tables: BTreeMap::new(),
            used_names: HashSet::new(),
        }
    }

    fn finish(mut self, root: Vec<SchemaNode>, root_call: Option<RootCall>) -> SchemaPlan {
        // Children register before parents; emit the root first
        self.flatten_fns.reverse();
        let enum_tables: Vec<EnumTable> = self.enum_tables.into_values().collect();

        let mut used = BTreeSet::new();
        let mut note = |go_type: &str| {
            for cap in QUALIFIER.captures_iter(go_type) {
                used.insert(cap[1].to_string());
            }
        };
        for f in &self.flatten_fns {
            note(&f.param_type);
            if let Some(union) = &f.union {
                note(&union.go_type);
            }
        }
        for table in &enum_tables {
            note(&table.go_type);
        }

        let imports = self
            .aliases
            .into_iter()
            .filter(|(_, alias)| used.contains(alias))
            .map(|(path, alias)| GoImport { alias, path })
            .collect();

        SchemaPlan {
            root,
            root_call,
            flatten_fns: self.flatten_fns,
            enum_tables,
            imports,
        }
    }

    /// Schema nodes of one scope plus its spliced union branch, if any
    fn build_scope(
        &mut self,
        fields: &[ResolvedField],
        pkg: &Package,
        reserved: &[&str],
    ) -> (Vec<SchemaNode>, Option<UnionBranch>) {
        let mut keys = KeyScope::new(reserved);
        let mut nodes = Vec::new();
        let mut union = None;

        for field in fields {
            if !field.name.starts_with(UNION_PREFIX) {
                nodes.push(self.build_node(field, pkg, &mut keys, Source::Receiver));
                continue;
            }
            if union.is_some()
                || is_error_branch(&field.name)
                || !field.is_composite
                || field.children.is_empty()
            {
                debug!("Dropping union member {} ({})", field.name, field.raw_type);
                continue;
            }

            let branch_pkg = field_package(field, pkg);
            let Some(go_type) = self.union_value_type(field, pkg) else {
                continue;
            };
            let spliced: Vec<SchemaNode> = field
                .children
                .iter()
                .filter(|child| !child.name.starts_with(UNION_PREFIX))
                .map(|child| self.build_node(child, &branch_pkg, &mut keys, Source::UnionValue))
                .collect();
            if spliced.is_empty() {
                continue;
            }

            nodes.extend(spliced);
            union = Some(UnionBranch {
                slice: go_type.starts_with("[]"),
                go_type,
            });
        }

        (nodes, union)
    }

    fn build_node(
        &mut self,
        field: &ResolvedField,
        pkg: &Package,
        keys: &mut KeyScope,
        source: Source,
    ) -> SchemaNode {
        let go_name = go_field_name(field);
        let key = keys.claim(&to_snake_case(&go_name));

        let (kind, children) = if field.is_composite {
            self.object_kind(field, pkg, &[])
        } else {
            (self.leaf_kind(field, pkg), Vec::new())
        };

        SchemaNode {
            key,
            go_name,
            source,
            kind,
            children,
        }
    }

    fn object_kind(
        &mut self,
        field: &ResolvedField,
        pkg: &Package,
        reserved: &[&str],
    ) -> (NodeKind, Vec<SchemaNode>) {
        let raw = field.raw_type.trim();
        let unwrapped = raw.trim_start_matches('*');
        if field.children.is_empty() || unwrapped.starts_with("map[") {
            return (NodeKind::Opaque, Vec::new());
        }

        let access = match unwrapped.strip_prefix("[]") {
            Some(elem) => ObjectAccess::Slice {
                elem_pointer: elem.trim_start().starts_with('*'),
            },
            None if raw.starts_with('*') => ObjectAccess::Pointer,
            None => ObjectAccess::Value,
        };

        let elem_pkg = field_package(field, pkg);
        let (children, union) = self.build_scope(&field.children, &elem_pkg, reserved);
        if children.is_empty() {
            return (NodeKind::Opaque, Vec::new());
        }
        let Some(go_type) = self.qualify(field, pkg) else {
            return (NodeKind::Opaque, Vec::new());
        };

        let flatten = self.register_flatten(go_type, union, &children);
        (NodeKind::Object { flatten, access }, children)
    }

    fn leaf_kind(&mut self, field: &ResolvedField, pkg: &Package) -> NodeKind {
        let raw = field.raw_type.trim();
        let pointer = raw.starts_with('*');
        let unwrapped = raw.trim_start_matches('*');
        let list_elem = unwrapped.strip_prefix("[]").map(str::trim_start);

        if is_time(unwrapped) {
            return match list_elem {
                Some(_) => NodeKind::Opaque,
                None => NodeKind::Time { pointer },
            };
        }

        if let Some(record) = self.enums.get(base_name(raw).as_str()).copied() {
            if unwrapped.starts_with("map[") {
                return NodeKind::Opaque;
            }
            let Some(go_type) = self.qualify(field, pkg) else {
                return NodeKind::Opaque;
            };
            let flatten = self.register_enum(record, go_type);
            return match list_elem {
                Some(elem) => NodeKind::EnumList {
                    flatten,
                    elem_pointer: elem.starts_with('*'),
                },
                None => NodeKind::Enum { flatten, pointer },
            };
        }

        if unwrapped.starts_with("map[") {
            return NodeKind::Map { pointer };
        }

        if let Some(elem) = list_elem {
            return match TfType::for_scalar(elem.trim_start_matches('*')) {
                Some(tf) => NodeKind::ScalarList {
                    elem: tf,
                    elem_pointer: elem.starts_with('*'),
                },
                None => NodeKind::Opaque,
            };
        }

        match TfType::for_scalar(unwrapped) {
            Some(tf) => NodeKind::Scalar { tf, pointer },
            None => NodeKind::Opaque,
        }
    }

    /// Qualified element type of a field, e.g. `import1.Alert`
    fn qualify(&mut self, field: &ResolvedField, pkg: &Package) -> Option<String> {
        let base = base_name(&field.raw_type);
        let elem = element_type(&field.raw_type);

        if elem.contains('.') {
            // Only `importN` qualifiers can be mapped to a path
            let alias = import_alias(&elem)?;
            let path = field.import_path.as_deref()?;
            let alias = self.alias_for(path, Some(alias.as_str()));
            return Some(format!("{}.{}", alias, base));
        }

        match &pkg.path {
            Some(path) => {
                let alias = self.alias_for(path, pkg.hint.as_deref());
                Some(format!("{}.{}", alias, base))
            },
            None => {
                debug!("No package known for {}; leaving it unqualified", base);
                Some(base)
            },
        }
    }

    /// Type returned by `GetValue()` for a union member
    fn union_value_type(&mut self, field: &ResolvedField, pkg: &Package) -> Option<String> {
        let qualified = self.qualify(field, pkg)?;
        let unwrapped = field.raw_type.trim().trim_start_matches('*');
        Some(match unwrapped.strip_prefix("[]") {
            Some(elem) if elem.trim_start().starts_with('*') => format!("[]*{}", qualified),
            Some(_) => format!("[]{}", qualified),
            None => qualified,
        })
    }

    fn alias_for(&mut self, path: &str, hint: Option<&str>) -> String {
        if let Some(alias) = self.aliases.get(path) {
            return alias.clone();
        }
        let taken: HashSet<&String> = self.aliases.values().collect();
        let alias = match hint {
            Some(hint) if !taken.contains(&hint.to_string()) => hint.to_string(),
            _ => (1..)
                .map(|n| format!("import{}", n))
                .find(|candidate| !taken.contains(candidate))
                .unwrap_or_default(),
        };
        self.aliases.insert(path.to_string(), alias.clone());
        alias
    }

    fn unique_name(&mut self, base: &str) -> String {
        let mut name = base.to_string();
        let mut n = 1;
        while self.used_names.contains(&name) {
            n += 1;
            name = format!("{}{}", base, n);
        }
        self.used_names.insert(name.clone());
        name
    }

    fn register_flatten(
        &mut self,
        go_type: String,
        union: Option<UnionBranch>,
        fields: &[SchemaNode],
    ) -> String {
        let signature = format!("{:?}{:?}", union, fields);
        let index_key = (go_type.clone(), signature);
        if let Some(name) = self.flatten_index.get(&index_key) {
            return name.clone();
        }

        let name = self.unique_name(&format!("flatten{}", capitalize(&base_name(&go_type))));
        self.flatten_index.insert(index_key, name.clone());
        self.flatten_fns.push(FlattenFn {
            name: name.clone(),
            param_type: go_type,
            union,
            fields: fields.to_vec(),
        });
        name
    }

    fn register_enum(&mut self, record: &EnumRecord, go_type: String) -> String {
        if let Some(table) = self.enum_tables.get(&go_type) {
            return table.flatten.clone();
        }

        let flatten = self.unique_name(&format!("flatten{}", capitalize(&record.name)));
        let table = self.unique_name(&format!("{}Names", lower_first(&record.name)));
        self.enum_tables.insert(
            go_type.clone(),
            EnumTable {
                flatten: flatten.clone(),
                table,
                go_type,
                record: record.clone(),
            },
        );
        flatten
    }
}

/// Go selector for a field; embedded fields are selected by type name
fn go_field_name(field: &ResolvedField) -> String {
    if field.name.is_empty() {
        base_name(&field.raw_type)
    } else {
        field.name.clone()
    }
}

fn field_package(field: &ResolvedField, pkg: &Package) -> Package {
    match &field.import_alias {
        Some(alias) => Package {
            path: field.import_path.clone(),
            hint: Some(alias.clone()),
        },
        None => pkg.clone(),
    }
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
