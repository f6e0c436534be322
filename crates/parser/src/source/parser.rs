//! Single-file Go declaration extraction on top of tree-sitter

use crate::normalizer::normalize;
use provider_codegen_common::{
    CodegenError, FieldRecord, ImportTable, OperationRecord, Parameter, Result, TypeRecord,
};
use regex::Regex;
use std::sync::LazyLock;
use tree_sitter::{Node, Parser};

/// Methods that exist for JSON plumbing on every generated model
const IGNORED_METHODS: &[&str] = &[
    "UnmarshalJSON",
    "MarshalJSON",
    "SetValue",
    "GetValue",
    "SetData",
    "GetData",
];

const INTEGER_TYPES: &[&str] = &[
    "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16", "uint32", "uint64",
];

static IMPORT_ALIAS_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^import\d+$").expect("import alias pattern is valid"));

/// A constant declared with an explicit named type and an integer value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedConst {
    pub name: String,
    pub type_name: String,
    pub value: i64,
}

/// Declarations found in one Go source file
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    /// Path relative to the walked root
    pub path: String,
    pub imports: ImportTable,
    pub types: Vec<TypeRecord>,
    pub operations: Vec<OperationRecord>,
    /// Named types whose underlying type is an integer
    pub integer_types: Vec<String>,
    pub typed_consts: Vec<TypedConst>,
}

/// Go source parser
///
/// Wraps a tree-sitter parser configured for Go. A file whose syntax tree
/// contains error nodes is rejected as a whole rather than partially read.
pub struct GoSourceParser {
    parser: Parser,
}

impl GoSourceParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| {
                CodegenError::Configuration(format!("Failed to load Go grammar: {}", e))
            })?;
        Ok(Self { parser })
    }

    /// Parse Go source text; `path` is only used for records and errors
    pub fn parse_source(&mut self, source: &str, path: &str) -> Result<ParsedFile> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| CodegenError::Parse {
                path: path.into(),
                message: "parser returned no syntax tree".to_string(),
            })?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(CodegenError::Parse {
                path: path.into(),
                message: "source contains syntax errors".to_string(),
            });
        }

        let src = source.as_bytes();
        let mut parsed = ParsedFile {
            path: path.to_string(),
            ..Default::default()
        };

        let mut cursor = root.walk();
        let top_level: Vec<Node> = root.named_children(&mut cursor).collect();

        // Imports first so every record below sees the full table
        for node in top_level.iter().filter(|n| n.kind() == "import_declaration") {
            collect_imports(*node, src, &mut parsed.imports);
        }

        for node in top_level {
            match node.kind() {
                "type_declaration" => collect_types(node, src, &mut parsed),
                "method_declaration" => {
                    if let Some(operation) = method_record(node, src, &parsed) {
                        parsed.operations.push(operation);
                    }
                },
                "const_declaration" => collect_consts(node, src, &mut parsed.typed_consts),
                _ => {},
            }
        }

        Ok(parsed)
    }
}

fn text<'a>(node: Node, src: &'a [u8]) -> &'a str {
    node.utf8_text(src).unwrap_or_default()
}

fn collect_imports(decl: Node, src: &[u8], imports: &mut ImportTable) {
    let mut cursor = decl.walk();
    for child in decl.named_children(&mut cursor) {
        match child.kind() {
            "import_spec" => add_import(child, src, imports),
            "import_spec_list" => {
                let mut inner = child.walk();
                for spec in child.named_children(&mut inner) {
                    if spec.kind() == "import_spec" {
                        add_import(spec, src, imports);
                    }
                }
            },
            _ => {},
        }
    }
}

fn add_import(spec: Node, src: &[u8], imports: &mut ImportTable) {
    let (Some(alias), Some(path)) = (
        spec.child_by_field_name("name"),
        spec.child_by_field_name("path"),
    ) else {
        return;
    };

    let alias = text(alias, src);
    if IMPORT_ALIAS_NAME.is_match(alias) {
        let path = text(path, src).trim_matches(|c| c == '"' || c == '`');
        imports.insert(alias.to_string(), path.to_string());
    }
}

fn collect_types(decl: Node, src: &[u8], parsed: &mut ParsedFile) {
    let mut cursor = decl.walk();
    for spec in decl.named_children(&mut cursor) {
        if spec.kind() != "type_spec" {
            continue;
        }
        let (Some(name), Some(ty)) = (
            spec.child_by_field_name("name"),
            spec.child_by_field_name("type"),
        ) else {
            continue;
        };
        let name = text(name, src).to_string();

        match ty.kind() {
            "struct_type" => parsed.types.push(TypeRecord {
                name,
                fields: struct_fields(ty, src),
                file: parsed.path.clone(),
                imports: parsed.imports.clone(),
            }),
            "type_identifier" if INTEGER_TYPES.contains(&text(ty, src)) => {
                parsed.integer_types.push(name);
            },
            _ => {},
        }
    }
}

fn struct_fields(struct_type: Node, src: &[u8]) -> Vec<FieldRecord> {
    let mut fields = Vec::new();
    let mut cursor = struct_type.walk();

    for list in struct_type.named_children(&mut cursor) {
        if list.kind() != "field_declaration_list" {
            continue;
        }
        let mut list_cursor = list.walk();
        for decl in list.named_children(&mut list_cursor) {
            if decl.kind() != "field_declaration" {
                continue;
            }
            let Some(ty) = decl.child_by_field_name("type") else {
                continue;
            };

            let mut name_cursor = decl.walk();
            let names: Vec<&str> = decl
                .children_by_field_name("name", &mut name_cursor)
                .map(|n| text(n, src))
                .collect();

            if names.is_empty() {
                // Embedded: the optional `*` sits before the type node
                let raw = std::str::from_utf8(&src[decl.start_byte()..ty.end_byte()])
                    .unwrap_or_default();
                fields.push(FieldRecord::new("", normalize(raw)));
                continue;
            }

            let raw_type = normalize(text(ty, src));
            let tag = decl
                .child_by_field_name("tag")
                .map(|t| text(t, src).to_string())
                .unwrap_or_default();
            for name in names {
                fields.push(FieldRecord::new(name, raw_type.clone()).with_tag(tag.clone()));
            }
        }
    }

    fields
}

fn method_record(node: Node, src: &[u8], parsed: &ParsedFile) -> Option<OperationRecord> {
    let name = text(node.child_by_field_name("name")?, src);
    if IGNORED_METHODS.contains(&name) {
        return None;
    }
    let owning_type = receiver_type(node.child_by_field_name("receiver")?, src)?;

    let params = node
        .child_by_field_name("parameters")
        .map(|list| parameters(list, src))
        .unwrap_or_default();

    let returns = match node.child_by_field_name("result") {
        None => Vec::new(),
        Some(result) if result.kind() == "parameter_list" => parameters(result, src)
            .into_iter()
            .map(|p| p.type_name)
            .collect(),
        Some(result) => vec![normalize(text(result, src))],
    };

    Some(OperationRecord {
        name: name.to_string(),
        owning_type,
        file: parsed.path.clone(),
        params,
        returns,
        imports: parsed.imports.clone(),
    })
}

fn receiver_type(receiver: Node, src: &[u8]) -> Option<String> {
    let mut cursor = receiver.walk();
    let decl = receiver
        .named_children(&mut cursor)
        .find(|n| n.kind() == "parameter_declaration")?;

    let mut ty = decl.child_by_field_name("type")?;
    if ty.kind() == "pointer_type" {
        let mut inner = ty.walk();
        ty = ty.named_children(&mut inner).next()?;
    }
    if ty.kind() == "generic_type" {
        ty = ty.child_by_field_name("type")?;
    }
    Some(text(ty, src).trim_start_matches('*').to_string())
}

fn parameters(list: Node, src: &[u8]) -> Vec<Parameter> {
    let mut params = Vec::new();
    let mut cursor = list.walk();

    for decl in list.named_children(&mut cursor) {
        let type_name = match (decl.kind(), decl.child_by_field_name("type")) {
            ("parameter_declaration", Some(ty)) => normalize(text(ty, src)),
            ("variadic_parameter_declaration", Some(ty)) => {
                format!("...{}", normalize(text(ty, src)))
            },
            _ => continue,
        };

        let mut name_cursor = decl.walk();
        let names: Vec<&str> = decl
            .children_by_field_name("name", &mut name_cursor)
            .map(|n| text(n, src))
            .collect();

        if names.is_empty() {
            params.push(Parameter::new("", type_name));
        } else {
            for name in names {
                params.push(Parameter::new(name, type_name.clone()));
            }
        }
    }

    params
}

fn collect_consts(decl: Node, src: &[u8], consts: &mut Vec<TypedConst>) {
    // A spec without values repeats the type and expressions above it
    let mut previous: Option<(Option<String>, Vec<String>)> = None;
    let mut iota = 0i64;

    let mut cursor = decl.walk();
    for spec in decl.named_children(&mut cursor) {
        if spec.kind() != "const_spec" {
            continue;
        }

        if let Some(values) = spec.child_by_field_name("value") {
            let mut value_cursor = values.walk();
            let exprs = values
                .named_children(&mut value_cursor)
                .map(|expr| text(expr, src).to_string())
                .collect();
            let ty = spec.child_by_field_name("type").map(|ty| text(ty, src).to_string());
            previous = Some((ty, exprs));
        }

        if let Some((Some(type_name), exprs)) = &previous {
            let mut name_cursor = spec.walk();
            let names = spec.children_by_field_name("name", &mut name_cursor);
            for (name, expr) in names.zip(exprs) {
                let name = text(name, src);
                if name == "_" {
                    continue;
                }
                if let Some(value) = eval_const_expr(expr, iota) {
                    consts.push(TypedConst {
                        name: name.to_string(),
                        type_name: type_name.clone(),
                        value,
                    });
                }
            }
        }
        iota += 1;
    }
}

/// Evaluate an integer constant expression: a literal, `iota`, or one binary
/// operation (`+`, `-`, `*`, `<<`) over those
fn eval_const_expr(expr: &str, iota: i64) -> Option<i64> {
    let operand = |s: &str| {
        let s = s.trim().trim_start_matches('(').trim_end_matches(')').trim();
        if s == "iota" {
            Some(iota)
        } else {
            parse_int_literal(s)
        }
    };

    if let Some(value) = operand(expr) {
        return Some(value);
    }
    if let Some((lhs, rhs)) = expr.split_once("<<") {
        return operand(lhs)?.checked_shl(u32::try_from(operand(rhs)?).ok()?);
    }
    for op in ['+', '-', '*'] {
        if let Some((lhs, rhs)) = expr.trim().split_once(op).filter(|(l, _)| !l.trim().is_empty()) {
            let (lhs, rhs) = (operand(lhs)?, operand(rhs)?);
            return match op {
                '+' => lhs.checked_add(rhs),
                '-' => lhs.checked_sub(rhs),
                _ => lhs.checked_mul(rhs),
            };
        }
    }
    None
}

/// Parse a Go integer literal (decimal, hex, octal or binary, `_` separators allowed)
pub fn parse_int_literal(literal: &str) -> Option<i64> {
    let literal = literal.trim();
    let (negative, digits) = match literal.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, literal),
    };
    let digits = digits.replace('_', "");

    let (radix, body) = match digits.get(..2) {
        Some("0x") | Some("0X") => (16, &digits[2..]),
        Some("0o") | Some("0O") => (8, &digits[2..]),
        Some("0b") | Some("0B") => (2, &digits[2..]),
        _ if digits.len() > 1 && digits.starts_with('0') => (8, &digits[1..]),
        _ => (10, digits.as_str()),
    };

    let value = i64::from_str_radix(body, radix).ok()?;
    Some(if negative { -value } else { value })
}
