//! Connector specification normalization.
//!
//! Converts a raw connector schema (a `properties` map plus a `required`
//! list, with `oneOf` unions under object properties) into an ordered list
//! of [`FieldSpec`]s. Shape problems never fail: whatever cannot be derived
//! is skipped and the rest is returned.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::field::{literal_text, FieldKind, FieldSpec};
use crate::order::{assign_orders, sort_specs};

/// Return the schema inside a fetched connector definition.
///
/// Definitions fetched from the backend wrap the schema in
/// `connectionSpecification`; a bare schema is returned as-is.
pub fn connector_schema(value: &Value) -> &Value {
    value.get("connectionSpecification").unwrap_or(value)
}

/// Normalize a connector schema into ordered field specs.
///
/// # Arguments
///
/// * `schema` - Schema object with `properties` and `required`
/// * `root` - Path prefix for every field (e.g. `config`); empty for bare keys
///
/// # Returns
///
/// Top-level specs sorted by order, with `oneOf` branches embedded in their
/// parent's `specs`. Non-object input yields an empty list.
pub fn normalize(schema: &Value, root: &str) -> Vec<FieldSpec> {
    let mut specs = normalize_properties(schema, root, None, None);
    sort_specs(&mut specs);
    debug!("Normalized {} top-level fields under '{}'", specs.len(), root);
    specs
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn required_keys(schema: &Value) -> Vec<&str> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|keys| keys.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

/// Normalize one schema level.
///
/// `branch` tags every produced spec with its branch label, `skip` excludes
/// the discriminant key of a `oneOf` branch.
fn normalize_properties(
    schema: &Value,
    path: &str,
    branch: Option<&str>,
    skip: Option<&str>,
) -> Vec<FieldSpec> {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        debug!("Schema at '{}' has no properties", path);
        return Vec::new();
    };
    let required = required_keys(schema);

    let entries: Vec<(&String, &Value)> = properties
        .iter()
        .filter(|(key, _)| Some(key.as_str()) != skip)
        .filter(|(_, property)| property.is_object())
        .collect();

    let declared: Vec<Option<i64>> = entries
        .iter()
        .map(|(_, property)| property.get("order").and_then(Value::as_i64))
        .collect();
    let orders = assign_orders(&declared);

    entries
        .into_iter()
        .zip(orders)
        .filter_map(|((key, property), order)| {
            let mut spec =
                normalize_property(key, property, path, required.contains(&key.as_str()))?;
            spec.order = order;
            spec.parent = branch.map(str::to_string);
            Some(spec)
        })
        .collect()
}

/// Resolve the field kind of a property, or `None` when it is unsupported.
fn property_kind(property: &Value) -> Option<FieldKind> {
    match property.get("type") {
        Some(Value::String(name)) => FieldKind::from_schema_type(name),
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(Value::as_str)
            .find(|name| *name != "null")
            .and_then(FieldKind::from_schema_type),
        Some(_) => None,
        None => {
            if property.get("oneOf").is_some() || property.get("properties").is_some() {
                return Some(FieldKind::Object);
            }
            let literal = property
                .get("const")
                .or_else(|| property.get("default"))
                .or_else(|| property.get("enum").and_then(|e| e.get(0)));
            Some(literal.and_then(FieldKind::from_literal).unwrap_or(FieldKind::String))
        }
    }
}

fn normalize_property(key: &str, property: &Value, path: &str, required: bool) -> Option<FieldSpec> {
    let Some(kind) = property_kind(property) else {
        let ty = property.get("type").cloned().unwrap_or_default();
        warn!("Skipping field '{}': unsupported type {}", join_path(path, key), ty);
        return None;
    };

    let title = property
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or(key)
        .to_string();

    let mut spec = if kind == FieldKind::Object {
        match property.get("oneOf").and_then(Value::as_array) {
            Some(branches) => normalize_one_of(key, branches, path, title),
            None => {
                let group_path = join_path(path, key);
                let mut group = FieldSpec::new(group_path.clone(), FieldKind::Object, title);
                group.specs = normalize_properties(property, &group_path, None, None);
                group
            }
        }
    } else {
        let mut leaf = FieldSpec::new(join_path(path, key), kind, title);
        leaf.default = property
            .get("default")
            .and_then(|value| coerce_default(kind, value));
        leaf.secret = flag(property, "airbyte_secret") || flag(property, "secret");
        leaf.options = property
            .get("enum")
            .and_then(Value::as_array)
            .map(|values| values.iter().map(literal_text).collect())
            .unwrap_or_default();
        leaf.const_value = property.get("const").cloned();
        leaf.pattern = property
            .get("pattern")
            .and_then(Value::as_str)
            .map(str::to_string);
        leaf.multiline = flag(property, "multiline");
        leaf.placeholder = property
            .get("examples")
            .and_then(|examples| examples.get(0))
            .map(literal_text);
        leaf.minimum = property.get("minimum").and_then(Value::as_i64);
        leaf.maximum = property.get("maximum").and_then(Value::as_i64);
        leaf
    };

    spec.required = required;
    spec.description = property
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string);
    Some(spec)
}

fn flag(property: &Value, key: &str) -> bool {
    property.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Keep a schema default only when it fits the field kind.
///
/// Array defaults are reduced to a list of scalar strings; anything else is dropped.
fn coerce_default(kind: FieldKind, value: &Value) -> Option<Value> {
    match (kind, value) {
        (FieldKind::Array, Value::Array(items)) => {
            if items.iter().all(|item| !item.is_array() && !item.is_object() && !item.is_null()) {
                Some(Value::Array(
                    items.iter().map(|item| Value::String(literal_text(item))).collect(),
                ))
            } else {
                None
            }
        }
        (FieldKind::String, Value::String(_))
        | (FieldKind::Boolean, Value::Bool(_)) => Some(value.clone()),
        (FieldKind::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => Some(value.clone()),
        _ => {
            debug!("Dropping default {} for {} field", value, kind);
            None
        }
    }
}

/// Literal value a branch assigns to the discriminant key.
fn branch_value(branch: &Map<String, Value>, discriminant: &str) -> Option<String> {
    let property = branch.get("properties")?.get(discriminant)?;
    property
        .get("const")
        .or_else(|| {
            property
                .get("enum")
                .and_then(Value::as_array)
                .filter(|values| values.len() == 1)
                .and_then(|values| values.first())
        })
        .or_else(|| property.get("default"))
        .map(literal_text)
}

/// Choose the discriminant key shared by every branch.
///
/// Candidates are the keys required by every branch, in the first branch's
/// `required` order. A candidate that carries a literal in every branch wins;
/// otherwise the first candidate is used.
fn pick_discriminant(branches: &[&Map<String, Value>]) -> Option<String> {
    let first = branches.first()?;
    let candidates: Vec<&str> = first
        .get("required")
        .and_then(Value::as_array)
        .map(|keys| keys.iter().filter_map(Value::as_str).collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter()
        .filter(|key| {
            branches.iter().all(|branch| {
                branch
                    .get("required")
                    .and_then(Value::as_array)
                    .is_some_and(|keys| keys.iter().any(|k| k.as_str() == Some(*key)))
            })
        })
        .collect();

    candidates
        .iter()
        .find(|key| branches.iter().all(|branch| branch_value(branch, key).is_some()))
        .or_else(|| candidates.first())
        .map(|key| key.to_string())
}

fn normalize_one_of(key: &str, branches: &[Value], path: &str, title: String) -> FieldSpec {
    let branches: Vec<&Map<String, Value>> =
        branches.iter().filter_map(Value::as_object).collect();
    let object_path = join_path(path, key);
    let discriminant = pick_discriminant(&branches);

    let mut labels: Vec<String> = Vec::with_capacity(branches.len());
    for (index, branch) in branches.iter().enumerate() {
        let title = branch.get("title").and_then(Value::as_str).map(str::to_string);
        let label = discriminant
            .as_deref()
            .and_then(|d| branch_value(branch, d))
            .or_else(|| title.clone())
            .unwrap_or_else(|| format!("option_{}", index));
        if !labels.contains(&label) {
            labels.push(label);
            continue;
        }

        // Each label owns its children, so a repeated one must be renamed
        let renamed = title
            .filter(|title| !labels.contains(title))
            .unwrap_or_else(|| format!("{}_{}", label, index));
        warn!(
            "Field '{}' has duplicate branch '{}'; renamed to '{}'",
            object_path, label, renamed
        );
        labels.push(renamed);
    }

    let Some(discriminant) = discriminant else {
        warn!(
            "Field '{}' has no discriminant shared by all branches; rendering as plain choice",
            object_path
        );
        let mut spec = FieldSpec::new(object_path, FieldKind::Object, title);
        spec.options = labels;
        return spec;
    };

    let mut spec = FieldSpec::new(
        join_path(&object_path, &discriminant),
        FieldKind::Object,
        title,
    );
    for (branch, label) in branches.iter().zip(&labels) {
        let branch_schema = Value::Object((*branch).clone());
        spec.specs.extend(normalize_properties(
            &branch_schema,
            &object_path,
            Some(label.as_str()),
            Some(discriminant.as_str()),
        ));
    }
    spec.options = labels;
    spec.discriminant = Some(discriminant);
    spec
}
