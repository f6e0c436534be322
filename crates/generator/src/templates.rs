//! Template loading and management

use provider_codegen_common::naming::{to_camel_case, to_snake_case};
use provider_codegen_common::{CodegenError, Result};
use std::collections::HashMap;
use tera::{Tera, Value};

pub const NAMESPACE_CLIENT: &str = "namespace_client.go";
pub const DATA_SOURCE: &str = "data_source.go";

/// Load all templates
pub fn load_templates() -> Result<Tera> {
    let mut tera = Tera::default();

    tera.register_filter("camel_case", camel_case_filter);
    tera.register_filter("snake_case", snake_case_filter);

    tera.add_raw_template(
        NAMESPACE_CLIENT,
        include_str!("../templates/namespace_client.go.tera"),
    )
    .map_err(|e| {
        CodegenError::Template(format!("Failed to load {} template: {}", NAMESPACE_CLIENT, e))
    })?;

    tera.add_raw_template(DATA_SOURCE, include_str!("../templates/data_source.go.tera"))
        .map_err(|e| {
            CodegenError::Template(format!("Failed to load {} template: {}", DATA_SOURCE, e))
        })?;

    Ok(tera)
}

/// Render a loaded template, keeping tera's error chain in the message
pub fn render(tera: &Tera, name: &str, context: &tera::Context) -> Result<String> {
    tera.render(name, context)
        .map_err(|e| CodegenError::Template(format!("Failed to render {}: {:?}", name, e)))
}

/// Filter to convert a `-`/`_` separated name to CamelCase
fn camel_case_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("camel_case filter expects a string"))?;
    Ok(Value::String(to_camel_case(s)))
}

/// Filter to convert an identifier to snake_case
fn snake_case_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("snake_case filter expects a string"))?;
    Ok(Value::String(to_snake_case(s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_load() {
        let tera = load_templates().unwrap();
        let names: Vec<&str> = tera.get_template_names().collect();
        assert!(names.contains(&NAMESPACE_CLIENT));
        assert!(names.contains(&DATA_SOURCE));
    }

    #[test]
    fn test_case_filters() {
        let args = HashMap::new();
        let camel = camel_case_filter(&Value::String("data-protection".into()), &args).unwrap();
        assert_eq!(camel, Value::String("DataProtection".into()));

        let snake = snake_case_filter(&Value::String("GetAlertById".into()), &args).unwrap();
        assert_eq!(snake, Value::String("get_alert_by_id".into()));

        assert!(camel_case_filter(&Value::Bool(true), &args).is_err());
    }
}
