//! Schema-driven connector configuration form.
//!
//! [`ConfigForm`] ties the pieces together: it keeps the full normalized spec
//! list, derives the active list from the branch selections, keeps the form
//! binding's registered-field set in step with it and queues change events.
//! Every mutating call leaves binding, active list and view state
//! consistent before it returns; the host re-renders afterwards.

pub mod binding;
pub mod branch;
pub mod events;
pub mod render;
pub mod tags;
pub mod value;
pub mod view;

pub use binding::{FieldRules, FormBinding, FormState, ValidationError};
pub use branch::{BranchOutcome, BranchSwitch, Selections};
pub use events::FormEvent;
pub use render::{Control, Widget};
pub use value::{parse_integer, FieldValue, IntegerParseError};
pub use view::ViewState;

use conform_spec::{connector_schema, normalize, sort_specs, FieldKind, FieldSpec};
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, info};

use branch::{find_spec, registered_specs, resolve, same_registration};

/// Error for an operation the form cannot apply.
///
/// These are caller mistakes (unknown paths, wrong control type), never
/// problems with the schema itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// No active field has this path.
    UnknownField(String),
    /// The field is fixed by a `const`.
    ReadOnly(String),
    /// The field does not support the requested operation.
    WrongKind { path: String, kind: FieldKind },
    /// The value is not one of the field's options or branches.
    UnknownOption { path: String, value: String },
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::UnknownField(path) => write!(f, "No active field '{}'", path),
            FormError::ReadOnly(path) => write!(f, "Field '{}' is read-only", path),
            FormError::WrongKind { path, kind } => {
                write!(f, "Field '{}' is a {} field", path, kind)
            }
            FormError::UnknownOption { path, value } => {
                write!(f, "'{}' is not an option of '{}'", value, path)
            }
        }
    }
}

impl std::error::Error for FormError {}

/// One failed field in a [`ValidationReport`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub path: String,
    pub title: String,
    pub error: ValidationError,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.error)
    }
}

/// Outcome of validating every active field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub errors: Vec<FieldError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A connector configuration form over a [`FormBinding`].
pub struct ConfigForm<B: FormBinding = FormState> {
    root: String,
    full: Vec<FieldSpec>,
    active: Vec<FieldSpec>,
    selections: Selections,
    binding: B,
    view: ViewState,
    events: Vec<FormEvent>,
}

impl<B: FormBinding> ConfigForm<B> {
    /// Build a form from already normalized specs.
    ///
    /// Branch selections start from values already present in the binding,
    /// then the field defaults. Every active field is registered.
    pub fn new(binding: B, mut specs: Vec<FieldSpec>, root: &str) -> Self {
        sort_specs(&mut specs);
        let mut form = Self {
            root: root.to_string(),
            full: Vec::new(),
            active: Vec::new(),
            selections: Selections::new(),
            binding,
            view: ViewState::new(),
            events: Vec::new(),
        };
        form.install(specs);
        form
    }

    /// Normalize a raw connector schema (or a definition wrapping one) and
    /// build a form from it.
    pub fn from_schema(binding: B, schema: &Value, root: &str) -> Self {
        Self::new(binding, normalize(connector_schema(schema), root), root)
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Active specs (branching objects hold only their selected children).
    pub fn specs(&self) -> &[FieldSpec] {
        &self.active
    }

    /// Every spec including inactive branches.
    pub fn full_specs(&self) -> &[FieldSpec] {
        &self.full
    }

    pub fn selections(&self) -> &Selections {
        &self.selections
    }

    pub fn binding(&self) -> &B {
        &self.binding
    }

    pub fn binding_mut(&mut self) -> &mut B {
        &mut self.binding
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Look up an active spec by path.
    pub fn spec(&self, path: &str) -> Option<&FieldSpec> {
        find_spec(&self.active, path)
    }

    pub fn value(&self, path: &str) -> Option<&FieldValue> {
        self.binding.value(path)
    }

    /// Drain queued events, oldest first.
    pub fn take_events(&mut self) -> Vec<FormEvent> {
        std::mem::take(&mut self.events)
    }

    /// Replace the specification with a newer one.
    ///
    /// Fields that keep identical rules keep their values; everything else
    /// from the previous spec is unregistered.
    pub fn replace_specs(&mut self, mut specs: Vec<FieldSpec>) {
        sort_specs(&mut specs);
        self.install(specs);
        let fields = registered_specs(&self.active).len();
        info!("Specification replaced: {} active fields", fields);
        self.events.push(FormEvent::SpecReplaced { fields });
    }

    /// Replace the specification from a raw connector schema.
    pub fn replace_schema(&mut self, schema: &Value) {
        let specs = normalize(connector_schema(schema), &self.root);
        self.replace_specs(specs);
    }

    /// Populate the form from a saved configuration.
    ///
    /// `values` is the nested configuration object below the root, as
    /// produced by [`ConfigForm::to_json`]. Branch choices are taken from
    /// it first so the matching fields get registered.
    pub fn load_values(&mut self, values: &Value) {
        let mut wanted = self.selections.clone();
        collect_branch_values(&self.full, values, &self.root, &mut wanted);
        let (active, selections) = resolve(&self.full, &wanted);
        self.apply_active(active, selections);

        let updates: Vec<(String, FieldValue)> = registered_specs(&self.active)
            .into_iter()
            .filter(|spec| spec.const_value.is_none() && !spec.is_branching())
            .filter_map(|spec| {
                lookup(values, relative_path(&self.root, &spec.field))
                    .map(|value| (spec.field.clone(), FieldValue::from_json(spec.kind, value)))
            })
            .collect();
        debug!("Loaded {} saved values", updates.len());
        for (path, value) in updates {
            self.binding.set_value(&path, value);
        }
        self.view.clear();
    }

    /// Set a field's value.
    ///
    /// Setting a string on a branching field switches the branch.
    pub fn set_value(&mut self, path: &str, value: FieldValue) -> Result<(), FormError> {
        let spec = self.editable_spec(path)?;
        let kind = spec.kind;
        if spec.is_branching() {
            return match value {
                FieldValue::String(branch) => self.select(path, &branch),
                _ => Err(FormError::WrongKind {
                    path: path.to_string(),
                    kind,
                }),
            };
        }
        if kind == FieldKind::Integer {
            self.view.clear_integer_text(path);
        }
        self.store(path, value);
        Ok(())
    }

    /// Apply typed text to a string or integer field.
    pub fn input_text(&mut self, path: &str, text: &str) -> Result<(), FormError> {
        let kind = self.editable_spec(path)?.kind;
        match kind {
            FieldKind::String => {
                self.store(path, FieldValue::String(text.to_string()));
                Ok(())
            }
            FieldKind::Integer => self.input_integer(path, text),
            kind => Err(FormError::WrongKind {
                path: path.to_string(),
                kind,
            }),
        }
    }

    /// Parse integer input and bind the result.
    ///
    /// Text that is not a whole number, blank text included, binds `Empty`
    /// and records an [`ValidationError::InvalidInteger`] on the field.
    pub fn input_integer(&mut self, path: &str, text: &str) -> Result<(), FormError> {
        let spec = self.editable_spec(path)?;
        if spec.kind != FieldKind::Integer {
            return Err(FormError::WrongKind {
                path: path.to_string(),
                kind: spec.kind,
            });
        }
        self.view.set_integer_text(path, text);
        match parse_integer(text) {
            Ok(value) => self.store(path, value),
            Err(e) => {
                self.store(path, FieldValue::Empty);
                self.binding
                    .set_error(path, Some(ValidationError::InvalidInteger { input: e.input }));
            }
        }
        Ok(())
    }

    /// Flip a boolean switch.
    pub fn toggle_bool(&mut self, path: &str) -> Result<bool, FormError> {
        let spec = self.editable_spec(path)?;
        if spec.kind != FieldKind::Boolean {
            return Err(FormError::WrongKind {
                path: path.to_string(),
                kind: spec.kind,
            });
        }
        let on = !self
            .binding
            .value(path)
            .and_then(FieldValue::as_bool)
            .unwrap_or(false);
        self.store(path, FieldValue::Boolean(on));
        Ok(on)
    }

    /// Choose an option of an enum field or a branch of a `oneOf` object.
    ///
    /// Re-selecting the active branch is a no-op: nothing is unregistered,
    /// re-registered or reported.
    pub fn select(&mut self, path: &str, option: &str) -> Result<(), FormError> {
        let spec = self.editable_spec(path)?;
        if !spec.options.iter().any(|o| o == option) {
            return Err(FormError::UnknownOption {
                path: path.to_string(),
                value: option.to_string(),
            });
        }
        if !spec.is_branching() {
            let value = FieldValue::from_json(spec.kind, &Value::String(option.to_string()));
            self.store(path, value);
            return Ok(());
        }

        match branch::select_branch(&self.full, &self.selections, path, option) {
            BranchOutcome::Unchanged => Ok(()),
            BranchOutcome::UnknownField | BranchOutcome::NotActive => {
                Err(FormError::UnknownField(path.to_string()))
            }
            BranchOutcome::UnknownBranch => Err(FormError::UnknownOption {
                path: path.to_string(),
                value: option.to_string(),
            }),
            BranchOutcome::Switched(switch) => {
                self.apply_switch(switch);
                Ok(())
            }
        }
    }

    /// Toggle masking of a secret field. Returns true when now visible.
    pub fn toggle_secret(&mut self, path: &str) -> Result<bool, FormError> {
        let spec = self.spec(path).ok_or_else(|| FormError::UnknownField(path.to_string()))?;
        if !spec.secret {
            return Err(FormError::WrongKind {
                path: path.to_string(),
                kind: spec.kind,
            });
        }
        Ok(self.view.toggle_secret(path))
    }

    /// Replace the tag editor's text buffer.
    pub fn tag_input(&mut self, path: &str, text: &str) -> Result<(), FormError> {
        self.array_spec(path)?;
        let buffer = self.view.tag_buffer_mut(path);
        buffer.clear();
        buffer.push_str(text);
        Ok(())
    }

    /// Enter in the tag editor: commit the buffer as a new tag.
    pub fn tag_commit(&mut self, path: &str) -> Result<(), FormError> {
        let mut values = self.array_values(path)?;
        if tags::commit(&mut values, self.view.tag_buffer_mut(path)) {
            self.store(path, FieldValue::Array(values));
        }
        Ok(())
    }

    /// Backspace in the tag editor: edit the buffer, or drop the last tag when it is empty.
    pub fn tag_backspace(&mut self, path: &str) -> Result<(), FormError> {
        let mut values = self.array_values(path)?;
        if tags::backspace(&mut values, self.view.tag_buffer_mut(path)) {
            self.store(path, FieldValue::Array(values));
        }
        Ok(())
    }

    /// Delete one tag chip by index.
    pub fn tag_remove(&mut self, path: &str, index: usize) -> Result<(), FormError> {
        let mut values = self.array_values(path)?;
        if tags::remove_at(&mut values, index).is_some() {
            self.store(path, FieldValue::Array(values));
        }
        Ok(())
    }

    /// Widget descriptors for the current state.
    pub fn render(&self) -> Vec<Widget> {
        render::render(&self.active, &self.binding, &self.view)
    }

    /// Validate every active field through the binding.
    pub fn validate(&mut self) -> ValidationReport {
        let targets: Vec<(String, String)> = registered_specs(&self.active)
            .into_iter()
            .map(|spec| (spec.field.clone(), spec.title.clone()))
            .collect();

        let mut report = ValidationReport::default();
        for (path, title) in targets {
            if self.binding.validate_field(&path) {
                continue;
            }
            if let Some(error) = self.binding.error(&path) {
                report.errors.push(FieldError {
                    path,
                    title,
                    error: error.clone(),
                });
            }
        }
        debug!("Validation finished with {} errors", report.errors.len());
        report
    }

    /// Nested JSON of every active, non-blank value, keyed below the root.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        for spec in registered_specs(&self.active) {
            let Some(value) = self.binding.value(&spec.field) else {
                continue;
            };
            if value.is_blank() {
                continue;
            }
            insert_path(&mut out, relative_path(&self.root, &spec.field), value.to_json());
        }
        Value::Object(out)
    }

    fn install(&mut self, specs: Vec<FieldSpec>) {
        let mut wanted = Selections::new();
        collect_bound_branches(&specs, &self.binding, &mut wanted);
        let (active, selections) = resolve(&specs, &wanted);
        self.full = specs;
        self.apply_active(active, selections);
    }

    /// Move to a new active list, unregistering what left and registering what joined.
    fn apply_active(&mut self, active: Vec<FieldSpec>, selections: Selections) {
        let new_registered: Vec<FieldSpec> =
            registered_specs(&active).into_iter().cloned().collect();

        for path in self.binding.registered() {
            let kept = new_registered.iter().any(|new| {
                new.field == path
                    && find_spec(&self.active, &path).is_some_and(|old| same_registration(old, new))
            });
            if !kept {
                self.binding.unregister(&path);
                self.view.forget(&path);
            }
        }

        self.active = active;
        self.selections = selections;
        for spec in &new_registered {
            if !self.binding.is_registered(&spec.field) {
                register_spec(&mut self.binding, spec);
            }
            if let Some(choice) = self.selections.get(&spec.field) {
                self.binding
                    .set_value(&spec.field, FieldValue::String(choice.clone()));
            }
        }
    }

    fn apply_switch(&mut self, switch: BranchSwitch) {
        for path in &switch.removed {
            self.binding.unregister(path);
            self.view.forget(path);
        }
        self.active = switch.specs;
        self.selections = switch.selections;
        for spec in &switch.added {
            register_spec(&mut self.binding, spec);
        }
        // Nested discriminants that joined hold their default branch
        for spec in &switch.added {
            if let Some(choice) = self.selections.get(&spec.field) {
                self.binding
                    .set_value(&spec.field, FieldValue::String(choice.clone()));
            }
        }
        self.binding
            .set_value(&switch.parent, FieldValue::String(switch.next.clone()));

        self.events.push(FormEvent::ValueChanged {
            path: switch.parent.clone(),
            value: FieldValue::String(switch.next.clone()),
        });
        self.events.push(FormEvent::BranchChanged {
            parent: switch.parent,
            previous: switch.previous,
            next: switch.next,
        });
    }

    fn store(&mut self, path: &str, value: FieldValue) {
        self.binding.set_value(path, value.clone());
        self.events.push(FormEvent::ValueChanged {
            path: path.to_string(),
            value,
        });
    }

    fn editable_spec(&self, path: &str) -> Result<&FieldSpec, FormError> {
        let spec = self
            .spec(path)
            .filter(|spec| spec.has_value())
            .ok_or_else(|| FormError::UnknownField(path.to_string()))?;
        if spec.const_value.is_some() {
            return Err(FormError::ReadOnly(path.to_string()));
        }
        Ok(spec)
    }

    fn array_spec(&self, path: &str) -> Result<&FieldSpec, FormError> {
        let spec = self.editable_spec(path)?;
        if spec.kind != FieldKind::Array {
            return Err(FormError::WrongKind {
                path: path.to_string(),
                kind: spec.kind,
            });
        }
        Ok(spec)
    }

    fn array_values(&self, path: &str) -> Result<Vec<String>, FormError> {
        self.array_spec(path)?;
        Ok(self
            .binding
            .value(path)
            .and_then(FieldValue::as_array)
            .map(<[String]>::to_vec)
            .unwrap_or_default())
    }
}

/// Register a spec and seed its value from `const` or `default` when unset.
fn register_spec<B: FormBinding>(binding: &mut B, spec: &FieldSpec) {
    binding.register(&spec.field, FieldRules::from_spec(spec));
    if let Some(fixed) = &spec.const_value {
        binding.set_value(&spec.field, FieldValue::from_json(spec.kind, fixed));
        return;
    }
    if spec.is_branching() || binding.value(&spec.field).is_some() {
        return;
    }
    if let Some(default) = &spec.default {
        binding.set_value(&spec.field, FieldValue::from_json(spec.kind, default));
    }
}

/// Branch choices already present in the binding.
fn collect_bound_branches<B: FormBinding>(specs: &[FieldSpec], binding: &B, out: &mut Selections) {
    for spec in specs {
        if spec.is_branching()
            && let Some(choice) = binding.value(&spec.field).and_then(FieldValue::as_str)
        {
            out.insert(spec.field.clone(), choice.to_string());
        }
        collect_bound_branches(&spec.specs, binding, out);
    }
}

/// Branch choices present in a saved configuration.
fn collect_branch_values(specs: &[FieldSpec], values: &Value, root: &str, out: &mut Selections) {
    for spec in specs {
        if spec.is_branching()
            && let Some(choice) = lookup(values, relative_path(root, &spec.field)).and_then(Value::as_str)
        {
            out.insert(spec.field.clone(), choice.to_string());
        }
        collect_branch_values(&spec.specs, values, root, out);
    }
}

/// Strip the root prefix from a field path.
fn relative_path<'a>(root: &str, path: &'a str) -> &'a str {
    if root.is_empty() {
        return path;
    }
    path.strip_prefix(root)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(path)
}

fn lookup<'a>(values: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(values, |node, key| node.as_object()?.get(key))
}

fn insert_path(out: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            out.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let node = out
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            if let Value::Object(child) = node {
                insert_path(child, rest, value);
            }
        }
    }
}
