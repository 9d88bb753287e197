//! Member and lifecycle diff checking
//!
//! Compares the implementation being replaced with the incoming one to find
//! changes that swapping the method table alone would not carry over.
//!
//! Both checks compare *textual forms* (see [`Value::to_text`]). That is an
//! approximation: values that print differently are reported even when
//! equivalent, and distinct objects that print the same are missed.

use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};

use crate::component::{ClassComponent, Component};
use crate::error::Diagnostic;
use crate::value::{FieldMap, Value};

/// Hooks compared across updates. Unmount hooks are left out on purpose.
pub const LIFECYCLE_HOOKS: [&str; 2] = ["component_will_mount", "component_did_mount"];

/// Fields with this prefix are proxy bookkeeping and never diffed
pub const INTERNAL_KEY_PREFIX: &str = "__proxy__";

/// Field values to replay onto live instances
pub type FieldPatches = FieldMap;

/// Result of a diff check
#[derive(Debug, Clone, PartialEq)]
pub enum DiffOutcome {
    /// Nothing changed
    Match,
    /// Changed fields that live instances can regenerate
    Replayable(FieldPatches),
    /// Changes that can only be reported
    Unsupported(Vec<Diagnostic>),
    /// A throwaway instance could not be built; nothing to report
    ProbeFailed(String),
}

impl DiffOutcome {
    /// Patches to replay, if any
    pub fn patches(&self) -> Option<&FieldPatches> {
        match self {
            DiffOutcome::Replayable(patches) => Some(patches),
            _ => None,
        }
    }

    /// Diagnostics to report
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            DiffOutcome::Unsupported(diagnostics) => diagnostics,
            _ => &[],
        }
    }

    /// Consume into the patches, empty unless replayable
    pub fn into_patches(self) -> FieldPatches {
        match self {
            DiffOutcome::Replayable(patches) => patches,
            _ => FieldPatches::new(),
        }
    }
}

/// Compare the mount hooks of `previous` and `next`.
///
/// A function-like `previous` has no hooks, so any hook on `next` counts as
/// changed.
pub fn check_lifecycle_hooks(component_name: &str, previous: &Component, next: &ClassComponent) -> DiffOutcome {
    let previous_text = |hook: &str| match previous {
        Component::Class(class) => class.prototype().member_text(hook),
        _ => Value::Undefined.to_text(),
    };

    let diagnostics: Vec<Diagnostic> = LIFECYCLE_HOOKS
        .into_iter()
        .filter_map(|hook| {
            let next_text = next.prototype().member_text(hook);
            (previous_text(hook) != next_text).then(|| Diagnostic::UnsupportedLifecycleChange {
                component: component_name.to_string(),
                hook: hook.to_string(),
                source: next_text,
            })
        })
        .collect();

    if diagnostics.is_empty() {
        DiffOutcome::Match
    } else {
        DiffOutcome::Unsupported(diagnostics)
    }
}

/// Compare instance fields of throwaway instances of `previous` and `next`.
///
/// The previous instance is seen through the relinked method table, so it
/// can regenerate if either implementation provides the capability.
pub fn check_instance_fields(component_name: &str, previous: &Component, next: &ClassComponent) -> DiffOutcome {
    let (previous_fields, previous_regenerates) = match probe(previous) {
        Ok(probed) => probed,
        Err(reason) => return DiffOutcome::ProbeFailed(reason),
    };
    let next_fields = match probe_class(next) {
        Ok(fields) => fields,
        Err(reason) => return DiffOutcome::ProbeFailed(reason),
    };
    let regenerates = previous_regenerates || next.regenerator().is_some();

    let keys: BTreeSet<&String> = previous_fields
        .keys()
        .chain(next_fields.keys())
        .filter(|key| !key.starts_with(INTERNAL_KEY_PREFIX))
        .collect();

    let mut patches = FieldPatches::new();
    let mut diagnostics = Vec::new();

    for key in keys {
        let next_value = next_fields.get(key).cloned().unwrap_or_default();
        let previous_text = previous_fields.get(key).map(Value::to_text).unwrap_or_else(|| Value::Undefined.to_text());
        let next_text = next_value.to_text();

        if previous_text == next_text {
            continue;
        }

        if regenerates {
            patches.insert(key.clone(), next_value);
        } else {
            diagnostics.push(Diagnostic::UnsupportedFieldChange {
                component: component_name.to_string(),
                field: key.clone(),
                value: next_text,
            });
        }
    }

    if !patches.is_empty() {
        DiffOutcome::Replayable(patches)
    } else if !diagnostics.is_empty() {
        DiffOutcome::Unsupported(diagnostics)
    } else {
        DiffOutcome::Match
    }
}

/// Build throwaway fields for any implementation; function-like ones have none
fn probe(component: &Component) -> Result<(FieldMap, bool), String> {
    match component {
        Component::Class(class) => Ok((probe_class(class)?, class.regenerator().is_some())),
        Component::Function(_) => Ok((FieldMap::new(), false)),
        Component::Wrapper(wrapper) => match wrapper.current() {
            Some(current) => probe(&current),
            None => Err("wrapper has no implementation".to_string()),
        },
    }
}

/// Run an initializer with inert arguments, treating a panic as a failure
fn probe_class(class: &ClassComponent) -> Result<FieldMap, String> {
    let props = Value::object();
    let context = Value::object();

    match panic::catch_unwind(AssertUnwindSafe(|| class.initialize(&props, &context))) {
        Ok(result) => result,
        Err(payload) => Err(payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "initializer panicked".to_string())),
    }
}
