//! `{{path}}` template scanning and substitution.
//!
//! Grounded on the teacher's `Template`/`TemplatePart` structural split
//! between static and expression spans, trimmed to the narrower grammar
//! this engine needs: no filter pipeline, no `$node`/`$input` magic
//! variables, no whitespace-stripping markers. An expression is just a
//! path (see [`nebula_value::path`]) into the execution context.

use indexmap::IndexMap;
use nebula_value::{Path, Value};

/// One chunk of a parsed template: literal text, or an expression to
/// resolve against the interpolation context.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TemplatePart {
    Static(String),
    Expression { raw: String, path: Path },
}

/// A template split into static and expression parts, parsed once and
/// reusable across multiple contexts.
#[derive(Debug, Clone)]
pub struct Template {
    parts: Vec<TemplatePart>,
}

impl Template {
    /// Scan `source` for non-overlapping `{{ ... }}` expressions.
    ///
    /// Inner text is trimmed before being parsed as a path. A `{{` with no
    /// matching `}}` is treated as literal static text for the remainder
    /// of the template, matching the "leave unresolved expressions
    /// literal" rule used for resolution failures.
    #[must_use]
    pub fn parse(source: &str) -> Self {
        let mut parts = Vec::new();
        let mut rest = source;

        loop {
            match rest.find("{{") {
                None => {
                    if !rest.is_empty() {
                        parts.push(TemplatePart::Static(rest.to_string()));
                    }
                    break;
                }
                Some(start) => {
                    if start > 0 {
                        parts.push(TemplatePart::Static(rest[..start].to_string()));
                    }
                    let after_open = &rest[start + 2..];
                    match after_open.find("}}") {
                        None => {
                            parts.push(TemplatePart::Static(rest[start..].to_string()));
                            break;
                        }
                        Some(end) => {
                            let inner = after_open[..end].trim();
                            let raw = format!("{{{{{inner}}}}}", inner = &after_open[..end]);
                            parts.push(TemplatePart::Expression {
                                raw,
                                path: Path::parse(inner),
                            });
                            rest = &after_open[end + 2..];
                        }
                    }
                }
            }
        }

        Self { parts }
    }

    /// Render this template against a context value, substituting each
    /// resolvable expression with its natural textual form and leaving
    /// unresolved expressions as their original literal `{{ ... }}` text.
    #[must_use]
    pub fn render(&self, context: &Value) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                TemplatePart::Static(text) => out.push_str(text),
                TemplatePart::Expression { raw, path } => {
                    match nebula_value::path::resolve(context, path) {
                        Ok(value) => out.push_str(&value.to_interpolated_string()),
                        Err(_) => out.push_str(raw),
                    }
                }
            }
        }
        out
    }
}

/// Interpolate `{{path}}` expressions throughout a template string or a
/// whole `Value` tree (recursing into arrays and object fields).
pub struct Interpolator;

impl Interpolator {
    /// Interpolate a single template string against `context`.
    #[must_use]
    pub fn interpolate_string(template: &str, context: &Value) -> String {
        Template::parse(template).render(context)
    }

    /// Interpolate every string found anywhere inside `value`, recursing
    /// into arrays and objects. Non-string scalars pass through untouched.
    #[must_use]
    pub fn interpolate_value(value: &Value, context: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(Self::interpolate_string(s, context)),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| Self::interpolate_value(item, context))
                    .collect(),
            ),
            Value::Object(map) => {
                let mut out = IndexMap::with_capacity(map.len());
                for (k, v) in map {
                    out.insert(k.clone(), Self::interpolate_value(v, context));
                }
                Value::Object(out)
            }
            other => other.clone(),
        }
    }

    /// Parse `raw` as JSON and interpolate every string found anywhere in
    /// the resulting tree. A parse failure yields `Value::Null` rather
    /// than propagating an error — used for raw JSON fragments (e.g. a
    /// webhook body) that arrive as text and may not parse.
    #[must_use]
    pub fn interpolate_json(raw: &str, context: &Value) -> Value {
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(json) => match Value::try_from(json) {
                Ok(value) => Self::interpolate_value(&value, context),
                Err(_) => Value::Null,
            },
            Err(_) => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn context() -> Value {
        let mut user = IndexMap::new();
        user.insert("name".to_string(), Value::from("ada"));
        user.insert("age".to_string(), Value::Integer(30));
        let mut root = IndexMap::new();
        root.insert("user".to_string(), Value::Object(user));
        Value::Object(root)
    }

    #[test]
    fn substitutes_resolvable_expression() {
        let out = Interpolator::interpolate_string("hello {{user.name}}!", &context());
        assert_eq!(out, "hello ada!");
    }

    #[test]
    fn trims_inner_whitespace() {
        let out = Interpolator::interpolate_string("age: {{ user.age }}", &context());
        assert_eq!(out, "age: 30");
    }

    #[test]
    fn leaves_unresolved_expression_literal() {
        let out = Interpolator::interpolate_string("{{user.missing}}", &context());
        assert_eq!(out, "{{user.missing}}");
    }

    #[test]
    fn leaves_unterminated_expression_literal() {
        let out = Interpolator::interpolate_string("hello {{user.name", &context());
        assert_eq!(out, "hello {{user.name");
    }

    #[test]
    fn empty_path_renders_whole_context_as_json() {
        let out = Interpolator::interpolate_string("{{}}", &context());
        assert!(out.starts_with('{') && out.contains("\"user\""));
    }

    #[test]
    fn recurses_through_arrays_and_objects() {
        let mut map = IndexMap::new();
        map.insert(
            "greeting".to_string(),
            Value::Array(vec![Value::from("hi {{user.name}}")]),
        );
        let templated = Value::Object(map);
        let rendered = Interpolator::interpolate_value(&templated, &context());
        let greeting = rendered.get("greeting").unwrap().index(0).unwrap();
        assert_eq!(greeting, &Value::from("hi ada"));
    }

    #[test]
    fn non_overlapping_multiple_expressions() {
        let out = Interpolator::interpolate_string(
            "{{user.name}} is {{user.age}}",
            &context(),
        );
        assert_eq!(out, "ada is 30");
    }

    #[test]
    fn interpolate_json_parses_raw_and_recurses() {
        let raw = r#"{"greeting": "hi {{user.name}}", "age": "{{user.age}}"}"#;
        let out = Interpolator::interpolate_json(raw, &context());
        assert_eq!(out.get("greeting"), Some(&Value::from("hi ada")));
        assert_eq!(out.get("age"), Some(&Value::from("30")));
    }

    #[test]
    fn interpolate_json_parse_failure_yields_null() {
        let out = Interpolator::interpolate_json("{not valid json", &context());
        assert_eq!(out, Value::Null);
    }
}
