//! Base tags derived from process-wide configuration.

/// Environment variable consulted for the deployment environment label.
pub const DEFAULT_ENVIRONMENT_VAR: &str = "ENVIRONMENT";

/// Tags appended to every exported metric.
///
/// Order is fixed: `environment:<env>` (when the trimmed value is non-empty)
/// then `app:<app_name>` (when non-empty).
pub fn base_tags(app_name: &str, environment: Option<&str>) -> Vec<String> {
    let mut tags = Vec::with_capacity(2);

    if let Some(env) = environment.map(str::trim).filter(|e| !e.is_empty()) {
        tags.push(format!("environment:{env}"));
    }
    if !app_name.is_empty() {
        tags.push(format!("app:{app_name}"));
    }

    tags
}

/// Read the environment label from `var`. Unset or non-unicode reads as `None`.
pub fn environment_from(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

/// Final tag set for one metric: parsed tags first, then base tags.
pub fn compose_tags(parsed: &[String], base: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(parsed.len() + base.len());
    out.extend_from_slice(parsed);
    out.extend_from_slice(base);
    out
}
