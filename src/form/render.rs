//! Field renderer.
//!
//! Turns the active spec list into a flat, depth-annotated list of widget
//! descriptors. A host UI mounts them however it likes; edits go back
//! through [`super::ConfigForm`] keyed by the widget's `field`.

use conform_spec::{FieldKind, FieldSpec};
use serde::Serialize;

use super::binding::FormBinding;
use super::branch::default_branch;
use super::value::FieldValue;
use super::view::ViewState;

/// Control to mount for one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum Control {
    /// Fixed value, not editable
    ReadOnly { value: String },
    /// Masked input. `value` is `None` while masked and `filled` tells
    /// whether there is anything behind the mask.
    Secret {
        value: Option<String>,
        masked: bool,
        filled: bool,
        read_only: bool,
    },
    Select {
        options: Vec<String>,
        selected: Option<String>,
    },
    Text {
        value: String,
        pattern: Option<String>,
        multiline: bool,
        placeholder: Option<String>,
    },
    Integer { text: String },
    Switch { on: bool },
    Tags { values: Vec<String>, buffer: String },
    /// Branch selector of a `oneOf` object; its active children follow it
    Branch {
        options: Vec<String>,
        selected: Option<String>,
    },
    /// Heading for a plain nested object; its children follow it
    Group,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Widget {
    pub field: String,
    pub label: String,
    pub required: bool,
    /// Nesting level, 0 for top-level fields
    pub depth: usize,
    #[serde(flatten)]
    pub control: Control,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub helper: Option<String>,
}

impl Widget {
    /// Whether the host can edit this widget.
    pub fn is_editable(&self) -> bool {
        !matches!(
            self.control,
            Control::ReadOnly { .. } | Control::Group | Control::Secret { read_only: true, .. }
        )
    }
}

/// Render specs in ascending order, parents before their active children.
///
/// Works on either the full or the active list: for branching objects only
/// the children of the selected branch are rendered.
pub fn render<B: FormBinding + ?Sized>(specs: &[FieldSpec], binding: &B, view: &ViewState) -> Vec<Widget> {
    let mut widgets = Vec::new();
    render_level(specs.iter().collect(), binding, view, 0, &mut widgets);
    widgets
}

fn render_level<B: FormBinding + ?Sized>(
    mut specs: Vec<&FieldSpec>,
    binding: &B,
    view: &ViewState,
    depth: usize,
    out: &mut Vec<Widget>,
) {
    specs.sort_by_key(|spec| spec.order);

    for spec in specs {
        let value = binding.value(&spec.field).cloned().unwrap_or_default();
        let control = control_for(spec, &value, view);

        let children: Vec<&FieldSpec> = match &control {
            Control::Branch {
                selected: Some(selected),
                ..
            } => spec.children_for(selected).collect(),
            Control::Group => spec.specs.iter().collect(),
            _ => Vec::new(),
        };

        out.push(Widget {
            field: spec.field.clone(),
            label: spec.title.clone(),
            required: spec.required,
            depth,
            control,
            error: binding.error(&spec.field).map(|e| e.to_string()),
            helper: spec.description.clone(),
        });

        if !children.is_empty() {
            render_level(children, binding, view, depth + 1, out);
        }
    }
}

fn control_for(spec: &FieldSpec, value: &FieldValue, view: &ViewState) -> Control {
    if spec.kind == FieldKind::Object {
        if spec.is_group() {
            return Control::Group;
        }
        let selected = value
            .as_str()
            .filter(|v| spec.options.iter().any(|o| o.as_str() == *v))
            .map(str::to_string)
            .or_else(|| default_branch(spec));
        return Control::Branch {
            options: spec.options.clone(),
            selected,
        };
    }

    if spec.secret && (spec.kind == FieldKind::String || spec.const_value.is_some()) {
        let text = spec.const_text().unwrap_or_else(|| value.to_string());
        let masked = !view.is_secret_visible(&spec.field);
        return Control::Secret {
            filled: !text.is_empty(),
            value: (!masked).then_some(text),
            masked,
            read_only: spec.const_value.is_some(),
        };
    }

    if let Some(fixed) = spec.const_text() {
        return Control::ReadOnly { value: fixed };
    }

    match spec.kind {
        FieldKind::String | FieldKind::Integer if !spec.options.is_empty() => Control::Select {
            options: spec.options.clone(),
            selected: (!value.is_blank()).then(|| value.to_string()),
        },
        FieldKind::String => Control::Text {
            value: value.to_string(),
            pattern: spec.pattern.clone(),
            multiline: spec.multiline,
            placeholder: spec.placeholder.clone(),
        },
        FieldKind::Integer => Control::Integer {
            text: view
                .integer_text(&spec.field)
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string()),
        },
        FieldKind::Boolean => Control::Switch {
            on: value.as_bool().unwrap_or(false),
        },
        FieldKind::Array => Control::Tags {
            values: value.as_array().map(<[String]>::to_vec).unwrap_or_default(),
            buffer: view.tag_buffer(&spec.field).to_string(),
        },
        FieldKind::Object => Control::Group,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::binding::{FieldRules, FormState, ValidationError};
    use conform_spec::normalize;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn spec(field: &str, kind: FieldKind, order: i64) -> FieldSpec {
        let mut spec = FieldSpec::new(field, kind, field);
        spec.order = order;
        spec
    }

    fn controls(widgets: &[Widget]) -> Vec<(&str, usize)> {
        widgets.iter().map(|w| (w.field.as_str(), w.depth)).collect()
    }

    #[test]
    fn test_renders_in_order() {
        let specs = vec![
            spec("c", FieldKind::String, 2),
            spec("a", FieldKind::Integer, 0),
            spec("b", FieldKind::Boolean, 0),
        ];
        let widgets = render(&specs, &FormState::new(), &ViewState::new());
        assert_eq!(controls(&widgets), vec![("a", 0), ("b", 0), ("c", 0)]);
    }

    #[test]
    fn test_control_per_type() {
        let mut const_spec = spec("mode", FieldKind::String, 0);
        const_spec.const_value = Some(json!("disable"));
        let mut select = spec("method", FieldKind::String, 1);
        select.options = vec!["GET".to_string(), "POST".to_string()];
        let mut text = spec("query", FieldKind::String, 2);
        text.multiline = true;
        text.pattern = Some("^SELECT".to_string());
        let specs = vec![
            const_spec,
            select,
            text,
            spec("port", FieldKind::Integer, 3),
            spec("ssl", FieldKind::Boolean, 4),
            spec("schemas", FieldKind::Array, 5),
        ];

        let mut binding = FormState::new();
        binding.set_value("port", FieldValue::Integer(5432));
        binding.set_value("ssl", FieldValue::Boolean(true));
        binding.set_value("schemas", FieldValue::Array(vec!["public".to_string()]));
        let widgets = render(&specs, &binding, &ViewState::new());

        assert_eq!(widgets[0].control, Control::ReadOnly { value: "disable".to_string() });
        assert_eq!(
            widgets[1].control,
            Control::Select {
                options: vec!["GET".to_string(), "POST".to_string()],
                selected: None
            }
        );
        assert_eq!(
            widgets[2].control,
            Control::Text {
                value: String::new(),
                pattern: Some("^SELECT".to_string()),
                multiline: true,
                placeholder: None
            }
        );
        assert_eq!(widgets[3].control, Control::Integer { text: "5432".to_string() });
        assert_eq!(widgets[4].control, Control::Switch { on: true });
        assert_eq!(
            widgets[5].control,
            Control::Tags {
                values: vec!["public".to_string()],
                buffer: String::new()
            }
        );
    }

    #[test]
    fn test_const_secret_stays_masked() {
        let mut key = spec("key", FieldKind::String, 0);
        key.secret = true;
        key.const_value = Some(json!("fixed-token"));
        let mut empty = spec("empty", FieldKind::String, 1);
        empty.secret = true;
        let specs = vec![key, empty];

        let binding = FormState::new();
        let widgets = render(&specs, &binding, &ViewState::new());
        assert_eq!(
            widgets[0].control,
            Control::Secret { value: None, masked: true, filled: true, read_only: true }
        );
        assert!(!widgets[0].is_editable());
        assert_eq!(
            widgets[1].control,
            Control::Secret { value: None, masked: true, filled: false, read_only: false }
        );
        let json = serde_json::to_string(&widgets).unwrap();
        assert!(!json.contains("fixed-token"));
    }

    #[test]
    fn test_secret_masked_by_default() {
        let mut a = spec("a", FieldKind::String, 0);
        a.secret = true;
        a.default = Some(json!("hunter2"));
        let mut b = spec("b", FieldKind::String, 1);
        b.secret = true;
        let specs = vec![a, b];

        let mut binding = FormState::new();
        binding.set_value("a", FieldValue::String("hunter2".to_string()));
        binding.set_value("b", FieldValue::String("s3cret".to_string()));
        let mut view = ViewState::new();

        let widgets = render(&specs, &binding, &view);
        assert_eq!(
            widgets[0].control,
            Control::Secret { value: None, masked: true, filled: true, read_only: false }
        );
        let json = serde_json::to_string(&widgets).unwrap();
        assert!(!json.contains("hunter2"));

        view.toggle_secret("a");
        let widgets = render(&specs, &binding, &view);
        assert_eq!(
            widgets[0].control,
            Control::Secret {
                value: Some("hunter2".to_string()),
                masked: false,
                filled: true,
                read_only: false,
            }
        );
        assert_eq!(
            widgets[1].control,
            Control::Secret { value: None, masked: true, filled: true, read_only: false }
        );
    }

    #[test]
    fn test_branch_renders_selected_children_only() {
        let specs = normalize(
            &json!({
                "properties": {
                    "ssl_mode": {
                        "type": "object",
                        "oneOf": [
                            { "required": ["mode"], "properties": { "mode": { "const": "disable" } } },
                            {
                                "required": ["mode", "ca_certificate"],
                                "properties": {
                                    "mode": { "const": "verify-ca" },
                                    "ca_certificate": { "type": "string", "airbyte_secret": true }
                                }
                            }
                        ]
                    }
                }
            }),
            "config",
        );

        let mut binding = FormState::new();
        let widgets = render(&specs, &binding, &ViewState::new());
        assert_eq!(controls(&widgets), vec![("config.ssl_mode.mode", 0)]);

        binding.set_value("config.ssl_mode.mode", FieldValue::String("verify-ca".to_string()));
        let widgets = render(&specs, &binding, &ViewState::new());
        assert_eq!(
            controls(&widgets),
            vec![("config.ssl_mode.mode", 0), ("config.ssl_mode.ca_certificate", 1)]
        );
        assert!(widgets[1].required);
    }

    #[test]
    fn test_group_renders_children() {
        let mut group = spec("tunnel", FieldKind::Object, 0);
        group.specs = vec![spec("tunnel.port", FieldKind::Integer, 1), spec("tunnel.host", FieldKind::String, 0)];
        let widgets = render(&[group], &FormState::new(), &ViewState::new());
        assert_eq!(widgets[0].control, Control::Group);
        assert!(!widgets[0].is_editable());
        assert_eq!(
            controls(&widgets),
            vec![("tunnel", 0), ("tunnel.host", 1), ("tunnel.port", 1)]
        );
    }

    #[test]
    fn test_error_and_helper_text() {
        let mut host = spec("host", FieldKind::String, 0);
        host.required = true;
        host.description = Some("Hostname of the database".to_string());
        let mut binding = FormState::new();
        binding.register("host", FieldRules::from_spec(&host));
        binding.validate_field("host");

        let widgets = render(&[host], &binding, &ViewState::new());
        assert_eq!(widgets[0].error, Some(ValidationError::Required.to_string()));
        assert_eq!(widgets[0].helper.as_deref(), Some("Hostname of the database"));
    }

    #[test]
    fn test_integer_shows_raw_text() {
        let specs = vec![spec("port", FieldKind::Integer, 0)];
        let mut view = ViewState::new();
        view.set_integer_text("port", "12a");
        let widgets = render(&specs, &FormState::new(), &view);
        assert_eq!(widgets[0].control, Control::Integer { text: "12a".to_string() });
    }
}
