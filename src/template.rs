//! Template interpolation for catalog values
//!
//! Stream paths, static query params and added record fields may reference
//! `{{ partition.<field> }}` and `{{ config.<field> }}`. Rendering fails on
//! undefined variables so a malformed catalog entry never produces a request
//! against a half-rendered path.

use crate::error::{Error, Result};
use crate::types::JsonValue;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Matches `{{ root.path.to.value }}`
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)*)\s*\}\}")
        .expect("template regex is valid")
});

/// Values available to templates
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    /// Non-secret tap settings (`start_date`, `end_date`, `api_url`)
    pub config: JsonValue,
    /// Values of the partition being read
    pub partition: JsonValue,
}

impl TemplateContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context with config values
    pub fn with_config(config: JsonValue) -> Self {
        Self {
            config,
            partition: JsonValue::Null,
        }
    }

    /// Copy of this context scoped to one partition
    #[must_use]
    pub fn for_partition(&self, partition: JsonValue) -> Self {
        Self {
            config: self.config.clone(),
            partition,
        }
    }

    /// Look up a dotted variable such as `partition.form_id`
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        let mut parts = path.split('.');
        let root = match parts.next()? {
            "config" => &self.config,
            "partition" => &self.partition,
            _ => return None,
        };

        parts.try_fold(root, |current, part| current.get(part))
    }
}

/// Render a template, failing on the first undefined variable
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    if !has_templates(template) {
        return Ok(template.to_string());
    }

    let mut missing: Vec<String> = Vec::new();
    let rendered = TEMPLATE_REGEX.replace_all(template, |caps: &Captures<'_>| {
        let var = &caps[1];
        match ctx.get(var).filter(|v| !v.is_null()) {
            Some(value) => value_to_string(value),
            None => {
                missing.push(var.to_string());
                String::new()
            }
        }
    });

    if missing.is_empty() {
        Ok(rendered.into_owned())
    } else {
        Err(Error::undefined_var(missing.join(", ")))
    }
}

/// Render a template into a JSON value.
///
/// A template consisting of a single variable keeps the variable's JSON
/// type; anything else renders to a string.
pub fn render_value(template: &str, ctx: &TemplateContext) -> Result<JsonValue> {
    if let Some(caps) = TEMPLATE_REGEX.captures(template) {
        if caps[0].len() == template.trim().len() {
            return ctx
                .get(&caps[1])
                .cloned()
                .ok_or_else(|| Error::undefined_var(&caps[1]));
        }
    }
    render(template, ctx).map(JsonValue::String)
}

/// Check if a string contains template variables
pub fn has_templates(s: &str) -> bool {
    TEMPLATE_REGEX.is_match(s)
}

/// Variable names referenced by a template
pub fn extract_variables(template: &str) -> Vec<String> {
    TEMPLATE_REGEX
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .collect()
}

fn value_to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Null => String::new(),
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ctx() -> TemplateContext {
        TemplateContext::with_config(json!({
            "start_date": "2024-07-01",
            "api_url": "https://api.hubapi.com"
        }))
        .for_partition(json!({"form_id": "f-123", "object_type": "deal", "portal": 42}))
    }

    #[test]
    fn test_partition_path() {
        let path = render("/form-integrations/v1/submissions/forms/{{ partition.form_id }}", &ctx())
            .unwrap();
        assert_eq!(path, "/form-integrations/v1/submissions/forms/f-123");
    }

    #[test]
    fn test_config_and_partition_together() {
        let rendered = render("{{ config.api_url }}/crm/v3/properties/{{partition.object_type}}", &ctx())
            .unwrap();
        assert_eq!(rendered, "https://api.hubapi.com/crm/v3/properties/deal");
    }

    #[test]
    fn test_undefined_variable_is_an_error() {
        let err = render("/forms/{{ partition.missing }}", &ctx()).unwrap_err();
        assert!(err.to_string().contains("partition.missing"));

        let err = render("{{ secrets.token }}", &ctx()).unwrap_err();
        assert!(matches!(err, Error::UndefinedVariable { .. }));
    }

    #[test]
    fn test_plain_strings_pass_through() {
        assert_eq!(render("/crm/v3/owners", &ctx()).unwrap(), "/crm/v3/owners");
        assert!(!has_templates("{ not a template }"));
    }

    #[test]
    fn test_render_value_keeps_type() {
        assert_eq!(render_value("{{ partition.portal }}", &ctx()).unwrap(), json!(42));
        assert_eq!(
            render_value("portal-{{ partition.portal }}", &ctx()).unwrap(),
            json!("portal-42")
        );
        assert_eq!(render_value("static", &ctx()).unwrap(), json!("static"));
    }

    #[test]
    fn test_extract_variables() {
        assert_eq!(
            extract_variables("{{ config.start_date }} / {{ partition.form_id }}"),
            vec!["config.start_date", "partition.form_id"]
        );
    }
}
