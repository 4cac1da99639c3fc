//! Reading specification and configuration files.

use anyhow::{bail, Context, Result};
use conform_spec::{connector_schema, normalize, sort_specs, FieldSpec};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Read and parse a JSON file.
pub fn read_json(path: &Path) -> Result<Value> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Turn a specification document into sorted field specs.
///
/// Accepts a raw JSON-Schema object, a connector definition wrapping one in
/// `connectionSpecification`, or an already normalized array of field specs.
pub fn specs_from_value(value: &Value, root: &str) -> Result<Vec<FieldSpec>> {
    match value {
        Value::Array(_) => {
            let mut specs: Vec<FieldSpec> = serde_json::from_value(value.clone())
                .context("Invalid normalized field list")?;
            sort_specs(&mut specs);
            debug!("Loaded {} pre-normalized specs", specs.len());
            Ok(specs)
        }
        Value::Object(_) => Ok(normalize(connector_schema(value), root)),
        other => bail!("Expected a schema object or a field list, got {}", json_type(other)),
    }
}

/// Read a specification file into sorted field specs.
pub fn load_specs(path: &Path, root: &str) -> Result<Vec<FieldSpec>> {
    let value = read_json(path)?;
    specs_from_value(&value, root).with_context(|| format!("Unusable specification {}", path.display()))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
