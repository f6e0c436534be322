//! Type expression normalization
//!
//! Type strings come straight from Go source, so they may span lines or carry
//! pointer, slice, map and package decorations. These helpers reduce them to
//! something usable as a catalog key. All of them are total: unrecognized
//! forms are stripped as far as possible and returned as-is otherwise.

use regex::Regex;
use std::sync::LazyLock;

static IMPORT_ALIAS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bimport\d+\b").expect("import alias pattern is valid"));

/// Collapse whitespace runs (including newlines and tabs) to single spaces and trim
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip pointer, slice, map-key and array-size wrappers plus any package
/// qualifier, leaving the declared type name
///
/// # Examples
/// ```
/// use provider_codegen_parser::normalizer::base_name;
///
/// assert_eq!(base_name("*import1.GetAlertApiResponse"), "GetAlertApiResponse");
/// assert_eq!(base_name("[]import2.ApiLink"), "ApiLink");
/// assert_eq!(base_name("map[string]*Widget"), "Widget");
/// ```
pub fn base_name(type_str: &str) -> String {
    let mut s = type_str.trim();

    loop {
        let before = s;
        s = s.trim_start_matches('*').trim_start();
        if let Some(rest) = s.strip_prefix("[]") {
            s = rest.trim_start();
        } else if let Some(rest) = strip_map_key(s) {
            s = rest.trim_start();
        } else if let Some(rest) = strip_array_len(s) {
            s = rest.trim_start();
        }
        if s == before {
            break;
        }
    }

    let s = match s.rfind('.') {
        Some(idx) => &s[idx + 1..],
        None => s,
    };
    s.trim().to_string()
}

/// `importN` package alias used in a type string, if any
pub fn import_alias(type_str: &str) -> Option<String> {
    IMPORT_ALIAS
        .find(type_str)
        .map(|m| m.as_str().to_string())
}

/// Whether the type is a slice, ignoring a leading pointer
pub fn is_slice(type_str: &str) -> bool {
    type_str.trim().trim_start_matches('*').starts_with("[]")
}

/// Whether the type is a pointer
pub fn is_pointer(type_str: &str) -> bool {
    type_str.trim().starts_with('*')
}

/// Element type of a (pointer to a) slice or pointer, qualifier kept
///
/// `[]*import1.Alert` -> `import1.Alert`, `*Widget` -> `Widget`
pub fn element_type(type_str: &str) -> String {
    let s = type_str.trim().trim_start_matches('*');
    let s = s.strip_prefix("[]").unwrap_or(s);
    s.trim_start_matches('*').trim().to_string()
}

/// Whether the type mentions `time.Time`
pub fn is_time(type_str: &str) -> bool {
    type_str.contains("time.Time")
}

fn strip_map_key(s: &str) -> Option<&str> {
    let rest = s.strip_prefix("map[")?;
    let mut depth = 1usize;
    for (idx, ch) in rest.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&rest[idx + 1..]);
                }
            },
            _ => {},
        }
    }
    None
}

fn strip_array_len(s: &str) -> Option<&str> {
    let rest = s.strip_prefix('[')?;
    let close = rest.find(']')?;
    let len = &rest[..close];
    if !len.is_empty() && len.chars().all(|c| c.is_ascii_digit()) {
        Some(&rest[close + 1..])
    } else {
        None
    }
}
