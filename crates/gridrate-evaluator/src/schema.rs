//! JSON rendering and validation of the evaluation schema

use crate::error::SchemaValidationError;
use gridrate_domain::{EvaluationSchema, FieldKind, FieldRole, WordEvaluation};
use serde_json::{json, Map, Value};

/// Render the contract as a JSON Schema document
///
/// The output is what the prompt shows and what guided decoding enforces.
pub fn to_json_schema(schema: &EvaluationSchema) -> Value {
    let mut properties = Map::new();
    for field in &schema.fields {
        let mut property = json!({
            "title": title_case(field.name),
            "description": field.description,
            "type": field.kind.type_name(),
        });
        if let FieldKind::Integer { min, max } = field.kind {
            property["minimum"] = json!(min);
            property["maximum"] = json!(max);
        }
        properties.insert(field.name.to_string(), property);
    }

    json!({
        "title": schema.title,
        "type": "object",
        "properties": properties,
        "required": schema.required_fields(),
    })
}

/// Render the contract as pretty-printed JSON Schema text
pub fn to_json_schema_string(schema: &EvaluationSchema) -> String {
    // Serializing a Value built from string keys cannot fail
    serde_json::to_string_pretty(&to_json_schema(schema)).unwrap_or_default()
}

/// Validate a parsed JSON value against the contract
///
/// Checks every declared field for presence, type and range, then builds
/// the evaluation. Unknown extra fields are ignored.
pub fn validate(schema: &EvaluationSchema, value: &Value) -> Result<WordEvaluation, SchemaValidationError> {
    let fail = |reason: String| SchemaValidationError {
        payload: value.to_string(),
        reason,
    };

    let obj = value
        .as_object()
        .ok_or_else(|| fail("payload is not a JSON object".to_string()))?;

    for field in &schema.fields {
        let Some(v) = obj.get(field.name) else {
            if field.required {
                return Err(fail(format!("missing required field '{}'", field.name)));
            }
            continue;
        };

        match field.kind {
            FieldKind::String => {
                if !v.is_string() {
                    return Err(fail(format!("field '{}' must be a string", field.name)));
                }
            }
            FieldKind::Integer { min, max } => {
                let n = v
                    .as_i64()
                    .ok_or_else(|| fail(format!("field '{}' must be an integer", field.name)))?;
                if n < min || n > max {
                    return Err(fail(format!(
                        "field '{}' value {} out of range [{}, {}]",
                        field.name, n, min, max
                    )));
                }
            }
        }
    }

    let word = role_value(schema, obj, FieldRole::Word)
        .and_then(|(name, v)| v.as_str().ok_or_else(|| format!("field '{}' must be a string", name)))
        .map_err(&fail)?;
    let analysis = role_value(schema, obj, FieldRole::Analysis)
        .and_then(|(name, v)| v.as_str().ok_or_else(|| format!("field '{}' must be a string", name)))
        .map_err(&fail)?;
    let rating = role_value(schema, obj, FieldRole::Rating)
        .and_then(|(name, v)| v.as_i64().ok_or_else(|| format!("field '{}' must be an integer", name)))
        .map_err(&fail)?;

    WordEvaluation::new(word, analysis, rating).map_err(fail)
}

/// Field name and value the contract assigns to `role`
fn role_value<'v>(
    schema: &EvaluationSchema,
    obj: &'v Map<String, Value>,
    role: FieldRole,
) -> Result<(&'static str, &'v Value), String> {
    let field = schema
        .field_for(role)
        .ok_or_else(|| format!("contract declares no {:?} field", role))?;
    let value = obj
        .get(field.name)
        .ok_or_else(|| format!("missing field '{}'", field.name))?;
    Ok((field.name, value))
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
