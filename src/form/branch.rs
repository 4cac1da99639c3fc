//! Conditional branch selection for `oneOf` objects.
//!
//! The full normalized spec list carries every branch. The active list is
//! derived from it and a [`Selections`] map: each branching object keeps
//! only the children of its selected branch. Switching a branch is a pure
//! function that reports exactly which registered fields leave and join.

use conform_spec::field::literal_text;
use conform_spec::FieldSpec;
use std::collections::BTreeMap;
use tracing::debug;

/// Selected branch per discriminant path.
pub type Selections = BTreeMap<String, String>;

/// Result of a successful branch switch.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchSwitch {
    /// Discriminant path that changed
    pub parent: String,
    pub previous: Option<String>,
    pub next: String,
    /// Completed selections after the switch (inactive discriminants pruned)
    pub selections: Selections,
    /// New active spec list
    pub specs: Vec<FieldSpec>,
    /// Registered paths that left the form
    pub removed: Vec<String>,
    /// Value-bearing specs that joined the form
    pub added: Vec<FieldSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BranchOutcome {
    /// The branch was already selected; nothing to do.
    Unchanged,
    /// No branching field has this path.
    UnknownField,
    /// The field exists but sits inside a branch that is not selected.
    NotActive,
    /// The value is not one of the field's branches.
    UnknownBranch,
    Switched(BranchSwitch),
}

/// Default branch of a branching field: its default when valid, else the first option.
pub fn default_branch(spec: &FieldSpec) -> Option<String> {
    spec.default
        .as_ref()
        .map(literal_text)
        .filter(|value| spec.options.contains(value))
        .or_else(|| spec.options.first().cloned())
}

/// Derive the active spec list from the full list and the current selections.
///
/// Missing or invalid selections fall back to [`default_branch`]. The returned
/// selections contain exactly the discriminants that are active.
pub fn resolve(full: &[FieldSpec], selections: &Selections) -> (Vec<FieldSpec>, Selections) {
    let mut resolved = Selections::new();
    let specs = resolve_level(full, selections, &mut resolved);
    (specs, resolved)
}

fn resolve_level(specs: &[FieldSpec], selections: &Selections, resolved: &mut Selections) -> Vec<FieldSpec> {
    specs
        .iter()
        .map(|spec| {
            let mut active = spec.clone();
            if spec.is_branching() {
                let choice = selections
                    .get(&spec.field)
                    .filter(|choice| spec.options.contains(*choice))
                    .cloned()
                    .or_else(|| default_branch(spec));
                let children: Vec<FieldSpec> = choice
                    .as_deref()
                    .map(|choice| spec.children_for(choice).cloned().collect())
                    .unwrap_or_default();
                if let Some(choice) = choice {
                    resolved.insert(spec.field.clone(), choice);
                }
                active.specs = resolve_level(&children, selections, resolved);
            } else if spec.is_group() {
                active.specs = resolve_level(&spec.specs, selections, resolved);
            }
            active
        })
        .collect()
}

/// Flatten an active list into the specs that own a bound value, in render order.
pub fn registered_specs(active: &[FieldSpec]) -> Vec<&FieldSpec> {
    let mut out = Vec::new();
    collect_registered(active, &mut out);
    out
}

fn collect_registered<'a>(specs: &'a [FieldSpec], out: &mut Vec<&'a FieldSpec>) {
    for spec in specs {
        if spec.has_value() {
            out.push(spec);
        }
        collect_registered(&spec.specs, out);
    }
}

/// Find a spec anywhere in a (full or active) tree.
pub fn find_spec<'a>(specs: &'a [FieldSpec], path: &str) -> Option<&'a FieldSpec> {
    specs.iter().find_map(|spec| {
        if spec.field == path {
            Some(spec)
        } else {
            find_spec(&spec.specs, path)
        }
    })
}

/// Two specs for the same path register identical rules and defaults.
pub(crate) fn same_registration(a: &FieldSpec, b: &FieldSpec) -> bool {
    a.field == b.field
        && a.kind == b.kind
        && a.required == b.required
        && a.secret == b.secret
        && a.pattern == b.pattern
        && a.minimum == b.minimum
        && a.maximum == b.maximum
        && a.options == b.options
        && a.default == b.default
        && a.const_value == b.const_value
}

/// Select branch `value` for the discriminant at `path`.
///
/// Selecting the branch that is already active is [`BranchOutcome::Unchanged`].
/// Otherwise the switch lists the registered fields that must be unregistered
/// (everything under the previous branch that the new branch does not also
/// register identically) and the fields that must be registered.
pub fn select_branch(full: &[FieldSpec], selections: &Selections, path: &str, value: &str) -> BranchOutcome {
    let Some(spec) = find_spec(full, path).filter(|spec| spec.is_branching()) else {
        return BranchOutcome::UnknownField;
    };
    if !spec.options.iter().any(|option| option == value) {
        return BranchOutcome::UnknownBranch;
    }

    let (old_active, old_selections) = resolve(full, selections);
    let Some(previous) = old_selections.get(path).cloned() else {
        return BranchOutcome::NotActive;
    };
    if previous == value {
        return BranchOutcome::Unchanged;
    }

    let mut wanted = old_selections.clone();
    wanted.insert(path.to_string(), value.to_string());
    let (new_active, new_selections) = resolve(full, &wanted);

    let old_registered = registered_specs(&old_active);
    let new_registered = registered_specs(&new_active);

    let removed: Vec<String> = old_registered
        .iter()
        .filter(|old| !new_registered.iter().any(|new| same_registration(old, new)))
        .map(|old| old.field.clone())
        .collect();
    let added: Vec<FieldSpec> = new_registered
        .iter()
        .filter(|new| !old_registered.iter().any(|old| same_registration(old, new)))
        .map(|new| (*new).clone())
        .collect();

    debug!(
        "Branch '{}' switched {} -> {}: -{} +{} fields",
        path,
        previous,
        value,
        removed.len(),
        added.len()
    );

    BranchOutcome::Switched(BranchSwitch {
        parent: path.to_string(),
        previous: Some(previous),
        next: value.to_string(),
        selections: new_selections,
        specs: new_active,
        removed,
        added,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use conform_spec::normalize;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn three_way() -> Vec<FieldSpec> {
        normalize(
            &json!({
                "required": ["auth"],
                "properties": {
                    "host": { "type": "string" },
                    "auth": {
                        "type": "object",
                        "oneOf": [
                            {
                                "required": ["method", "user", "password"],
                                "properties": {
                                    "method": { "const": "basic" },
                                    "user": { "type": "string" },
                                    "password": { "type": "string", "airbyte_secret": true }
                                }
                            },
                            {
                                "required": ["method"],
                                "properties": { "method": { "const": "none" } }
                            },
                            {
                                "required": ["method", "token"],
                                "properties": {
                                    "method": { "const": "token" },
                                    "token": { "type": "string", "airbyte_secret": true },
                                    "user": { "type": "string" }
                                }
                            }
                        ]
                    }
                }
            }),
            "config",
        )
    }

    fn paths(specs: &[&FieldSpec]) -> Vec<String> {
        specs.iter().map(|s| s.field.clone()).collect()
    }

    fn switched(outcome: BranchOutcome) -> BranchSwitch {
        match outcome {
            BranchOutcome::Switched(switch) => switch,
            other => panic!("Expected a switch, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_uses_first_branch_by_default() {
        let (active, selections) = resolve(&three_way(), &Selections::new());
        assert_eq!(selections.get("config.auth.method").map(String::as_str), Some("basic"));
        assert_eq!(
            paths(&registered_specs(&active)),
            vec!["config.host", "config.auth.method", "config.auth.user", "config.auth.password"]
        );
    }

    #[test]
    fn test_resolve_honors_spec_default() {
        let mut full = three_way();
        full[1].default = Some(json!("none"));
        let (active, _) = resolve(&full, &Selections::new());
        assert_eq!(paths(&registered_specs(&active)), vec!["config.host", "config.auth.method"]);
    }

    #[test]
    fn test_resolve_ignores_unknown_selection() {
        let mut selections = Selections::new();
        selections.insert("config.auth.method".to_string(), "bogus".to_string());
        let (_, resolved) = resolve(&three_way(), &selections);
        assert_eq!(resolved.get("config.auth.method").map(String::as_str), Some("basic"));
    }

    #[test]
    fn test_exactly_one_branch_active() {
        let full = three_way();
        for branch in ["basic", "none", "token"] {
            let mut selections = Selections::new();
            selections.insert("config.auth.method".to_string(), branch.to_string());
            let (active, _) = resolve(&full, &selections);
            let auth = &active[1];
            assert!(auth.specs.iter().all(|child| child.parent.as_deref() == Some(branch)));
        }
    }

    #[test]
    fn test_switch_removes_only_previous_branch_fields() {
        let full = three_way();
        let (_, selections) = resolve(&full, &Selections::new());

        let switch = switched(select_branch(&full, &selections, "config.auth.method", "token"));
        assert_eq!(switch.previous.as_deref(), Some("basic"));
        assert_eq!(switch.next, "token");
        // basic.user is required, token.user is not: different rules, so it is re-registered
        assert_eq!(switch.removed, vec!["config.auth.user", "config.auth.password"]);
        let added: Vec<&str> = switch.added.iter().map(|s| s.field.as_str()).collect();
        assert_eq!(added, vec!["config.auth.token", "config.auth.user"]);
    }

    #[test]
    fn test_switch_back_leaves_no_residue() {
        let full = three_way();
        let (_, selections) = resolve(&full, &Selections::new());
        let to_none = switched(select_branch(&full, &selections, "config.auth.method", "none"));
        assert_eq!(
            paths(&registered_specs(&to_none.specs)),
            vec!["config.host", "config.auth.method"]
        );
        assert!(to_none.added.is_empty());

        let back = switched(select_branch(&full, &to_none.selections, "config.auth.method", "basic"));
        assert!(back.removed.is_empty());
        assert_eq!(back.added.len(), 2);
    }

    #[test]
    fn test_same_branch_is_unchanged() {
        let full = three_way();
        let (_, selections) = resolve(&full, &Selections::new());
        assert_eq!(
            select_branch(&full, &selections, "config.auth.method", "basic"),
            BranchOutcome::Unchanged
        );
    }

    #[test]
    fn test_unknown_field_and_branch() {
        let full = three_way();
        let selections = Selections::new();
        assert_eq!(
            select_branch(&full, &selections, "config.host", "x"),
            BranchOutcome::UnknownField
        );
        assert_eq!(
            select_branch(&full, &selections, "config.auth.method", "oauth"),
            BranchOutcome::UnknownBranch
        );
    }

    #[test]
    fn test_nested_branch_inactive_and_pruned() {
        let full = normalize(
            &json!({
                "properties": {
                    "tunnel": {
                        "oneOf": [
                            { "required": ["kind"], "properties": { "kind": { "const": "none" } } },
                            {
                                "required": ["kind"],
                                "properties": {
                                    "kind": { "const": "ssh" },
                                    "auth": {
                                        "oneOf": [
                                            { "required": ["via"], "properties": { "via": { "const": "key" }, "key": { "type": "string" } } },
                                            { "required": ["via"], "properties": { "via": { "const": "password" }, "password": { "type": "string" } } }
                                        ]
                                    }
                                }
                            }
                        ]
                    }
                }
            }),
            "",
        );
        let (_, selections) = resolve(&full, &Selections::new());
        assert_eq!(
            select_branch(&full, &selections, "tunnel.auth.via", "password"),
            BranchOutcome::NotActive
        );

        let to_ssh = switched(select_branch(&full, &selections, "tunnel.kind", "ssh"));
        assert_eq!(to_ssh.selections.get("tunnel.auth.via").map(String::as_str), Some("key"));
        let to_password = switched(select_branch(&full, &to_ssh.selections, "tunnel.auth.via", "password"));
        assert_eq!(to_password.removed, vec!["tunnel.auth.key"]);

        let to_none = switched(select_branch(&full, &to_password.selections, "tunnel.kind", "none"));
        assert_eq!(to_none.removed, vec!["tunnel.auth.via", "tunnel.auth.password"]);
        assert!(!to_none.selections.contains_key("tunnel.auth.via"));
    }
}
