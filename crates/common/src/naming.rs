//! Identifier case conversion shared by the generators

/// Convert an identifier to snake_case
///
/// Acronym runs stay together (`IPAddress` -> `ip_address`, `ExtID` -> `ext_id`)
/// and `-`, `.` and spaces become separators.
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    let chars: Vec<char> = s.chars().collect();

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() {
            let should_add_underscore = i > 0
                && (chars[i - 1].is_lowercase()
                    || chars[i - 1].is_ascii_digit()
                    || (chars[i - 1].is_uppercase()
                        && i + 1 < chars.len()
                        && chars[i + 1].is_lowercase()));
            if should_add_underscore && !result.ends_with('_') {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
        } else if ch == '-' || ch == ' ' || ch == '.' {
            if !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
        } else {
            result.push(ch);
        }
    }

    while result.contains("__") {
        result = result.replace("__", "_");
    }

    result.trim_matches('_').to_string()
}

/// Convert a `-` or `_` separated identifier to CamelCase
///
/// Only the first letter of each part is touched, so `getAlertById` parts keep
/// their inner casing.
pub fn to_camel_case(s: &str) -> String {
    s.split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect()
}

/// Uppercase the first character
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("GetAlertById"), "get_alert_by_id");
        assert_eq!(to_snake_case("ExtId"), "ext_id");
        assert_eq!(to_snake_case("IPAddress"), "ip_address");
        assert_eq!(to_snake_case("ExtID"), "ext_id");
        assert_eq!(to_snake_case("Ipv4Config"), "ipv4_config");
        assert_eq!(to_snake_case("monitoring-v2"), "monitoring_v2");
        assert_eq!(
            to_snake_case("nutanix_monitoringv2_get_alert_by_id"),
            "nutanix_monitoringv2_get_alert_by_id"
        );
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(to_camel_case("clustermgmt"), "Clustermgmt");
        assert_eq!(to_camel_case("data-protection"), "DataProtection");
        assert_eq!(
            to_camel_case("nutanix_monitoringv2_get_alert_by_id"),
            "NutanixMonitoringv2GetAlertById"
        );
        assert_eq!(to_camel_case(""), "");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("widget"), "Widget");
        assert_eq!(capitalize(""), "");
    }
}
