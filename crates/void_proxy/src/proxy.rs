//! Live component proxy
//!
//! A [`ProxyHandle`] owns one [`StableWrapper`] for its whole life. Updates
//! swap the implementation behind the wrapper; the wrapper itself, and every
//! instance built from it, keep their identity.
//!
//! Instances are not patched at update time. Each update bumps a generation
//! counter, and an instance whose generation is behind replays the pending
//! field patches right before its next render.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::component::Component;
use crate::config::ProxyConfig;
use crate::diff::{self, DiffOutcome, FieldPatches};
use crate::error::{Diagnostic, ProxyError, Result};
use crate::instance::Instance;
use crate::registry::ProxyRegistry;
use crate::statics::{self, PropertyDescriptor, StaticMembers};
use crate::value::{FieldMap, Value};

/// What an update did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateOutcome {
    /// A new implementation was installed
    Applied,
    /// The implementation was already current
    Unchanged,
}

/// Summary of one update, for reload tooling
#[derive(Debug, Clone, Serialize)]
pub struct UpdateReport {
    /// What happened
    pub outcome: UpdateOutcome,
    /// Generation after the update
    pub generation: u64,
    /// Display name after the update
    pub display_name: String,
    /// Changes that could not be hot-applied
    pub diagnostics: Vec<Diagnostic>,
    /// Fields that will be replayed onto live instances
    pub injected_fields: Vec<String>,
}

impl UpdateReport {
    /// Whether a new implementation was installed
    pub fn is_applied(&self) -> bool {
        self.outcome == UpdateOutcome::Applied
    }
}

/// Mutable state behind a wrapper
struct ProxyState {
    /// `None` until the first update
    current: Option<Component>,
    generation: u64,
    name: String,
    name_sealed: bool,
    display_name: String,
    statics: StaticMembers,
    saved_descriptors: StaticMembers,
    injected: FieldPatches,
}

impl ProxyState {
    fn report(&self, outcome: UpdateOutcome) -> UpdateReport {
        UpdateReport {
            outcome,
            generation: self.generation,
            display_name: self.display_name.clone(),
            diagnostics: Vec::new(),
            injected_fields: self.injected.keys().cloned().collect(),
        }
    }
}

struct WrapperInner {
    state: Mutex<ProxyState>,
    config: Arc<ProxyConfig>,
}

/// The constructor handed out to the host; its identity never changes
#[derive(Clone)]
pub struct StableWrapper {
    inner: Arc<WrapperInner>,
}

impl StableWrapper {
    pub(crate) fn new(config: Arc<ProxyConfig>) -> Self {
        Self {
            inner: Arc::new(WrapperInner {
                state: Mutex::new(ProxyState {
                    current: None,
                    generation: 0,
                    name: String::new(),
                    name_sealed: false,
                    display_name: config.fallback_name.clone(),
                    statics: StaticMembers::new(),
                    saved_descriptors: StaticMembers::new(),
                    injected: FieldPatches::new(),
                }),
                config,
            }),
        }
    }

    /// Reference identity
    pub fn ptr_eq(&self, other: &StableWrapper) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Primary name
    pub fn name(&self) -> String {
        self.inner.state.lock().name.clone()
    }

    /// Display name, following the current implementation
    pub fn display_name(&self) -> String {
        self.inner.state.lock().display_name.clone()
    }

    /// Freeze the primary name; later renames are skipped silently
    pub fn seal_name(&self) {
        self.inner.state.lock().name_sealed = true;
    }

    /// Current generation
    pub fn generation(&self) -> u64 {
        self.inner.state.lock().generation
    }

    /// Whether the current implementation is class-like
    pub fn is_class(&self) -> bool {
        self.current().is_some_and(|c| c.is_class())
    }

    /// Snapshot of the static members
    pub fn statics(&self) -> StaticMembers {
        self.inner.state.lock().statics.clone()
    }

    /// Static member names
    pub fn static_keys(&self) -> Vec<String> {
        self.inner.state.lock().statics.keys().cloned().collect()
    }

    /// Descriptor of one static member
    pub fn static_descriptor(&self, key: &str) -> Option<PropertyDescriptor> {
        self.inner.state.lock().statics.get(key).cloned()
    }

    /// Read a static member, calling its getter if it has one
    pub fn static_value(&self, key: &str) -> Option<Value> {
        let descriptor = self.static_descriptor(key)?;
        Some(descriptor.read())
    }

    /// Assign a static member the way the host would.
    ///
    /// Goes through a setter when there is one. Returns `false` when the
    /// member is read-only.
    pub fn set_static(&self, key: &str, value: impl Into<Value>) -> bool {
        let value = value.into();
        let setter = {
            let mut state = self.inner.state.lock();
            match state.statics.get_mut(key) {
                Some(PropertyDescriptor::Data { value: slot, writable: true, .. }) => {
                    *slot = value;
                    return true;
                }
                Some(PropertyDescriptor::Data { .. }) | Some(PropertyDescriptor::Accessor { set: None, .. }) => {
                    return false;
                }
                Some(PropertyDescriptor::Accessor { set: Some(set), .. }) => set.clone(),
                None => {
                    state.statics.insert(key.to_string(), PropertyDescriptor::data(value));
                    return true;
                }
            }
        };

        setter.set(value);
        true
    }

    /// Define a static member directly on the wrapper
    pub fn define_static(&self, key: impl Into<String>, descriptor: PropertyDescriptor) {
        self.inner.state.lock().statics.insert(key.into(), descriptor);
    }

    /// Build a live instance from the current implementation
    pub fn construct(&self, props: Value, context: Value) -> Result<Instance> {
        let (current, generation, display_name) = {
            let state = self.inner.state.lock();
            (state.current.clone(), state.generation, state.display_name.clone())
        };

        match current {
            Some(Component::Class(class)) => {
                let fields = class
                    .initialize(&props, &context)
                    .map_err(|message| ProxyError::construction_failed(&display_name, message))?;

                Ok(Instance::new(
                    self.clone(),
                    props,
                    context,
                    fields,
                    class.prototype().lifecycle_hooks(),
                    class.regenerator().cloned(),
                    generation,
                ))
            }
            Some(Component::Function(_)) => Ok(Instance::new(
                self.clone(),
                props,
                context,
                FieldMap::new(),
                Default::default(),
                None,
                generation,
            )),
            Some(Component::Wrapper(_)) | None => Err(ProxyError::construction_failed(
                display_name,
                "proxy has no implementation",
            )),
        }
    }

    /// Produce output for `instance`.
    ///
    /// Replays pending field patches first if the instance is behind, then
    /// delegates to the current implementation.
    pub fn render(&self, instance: &mut Instance) -> Value {
        if !instance.is_instance_of(self) {
            log::warn!(
                "Instance {} does not belong to '{}', not rendering",
                instance.id().0,
                self.display_name()
            );
            return Value::Undefined;
        }

        let (current, generation, patches) = {
            let state = self.inner.state.lock();
            let patches = (instance.generation() != state.generation).then(|| state.injected.clone());
            (state.current.clone(), state.generation, patches)
        };

        if let Some(patches) = patches {
            if let Some(Component::Class(class)) = &current {
                if let Some(regenerator) = class.regenerator() {
                    instance.relink_regenerator(regenerator.clone());
                }
            }
            let applied = instance.apply_patches(&patches, generation);
            if applied > 0 {
                log::debug!(
                    "Replayed {} field(s) onto instance {} at generation {}",
                    applied,
                    instance.id().0,
                    generation
                );
            }
        }

        match current {
            Some(Component::Class(class)) => match class.prototype().render() {
                Some(render) => render.call(instance, &[]),
                None => {
                    log::warn!("{} has no render method", self.display_name());
                    Value::Null
                }
            },
            Some(Component::Function(function)) => function.call(instance.props(), instance.context()),
            Some(Component::Wrapper(_)) | None => Value::Undefined,
        }
    }

    /// Call a method resolved through the current implementation's prototype
    pub fn invoke(&self, instance: &mut Instance, method: &str, args: &[Value]) -> Option<Value> {
        let method = match self.current()? {
            Component::Class(class) => class.prototype().get(method).cloned()?,
            _ => return None,
        };
        Some(method.call(instance, args))
    }

    pub(crate) fn current(&self) -> Option<Component> {
        self.inner.state.lock().current.clone()
    }

    /// Install `next`, which must not be a wrapper.
    fn apply(&self, next: Component) -> UpdateReport {
        let config = &self.inner.config;

        let previous = {
            let state = self.inner.state.lock();
            if state.current.as_ref().is_some_and(|current| current.ptr_eq(&next)) {
                return state.report(UpdateOutcome::Unchanged);
            }
            state.current.clone()
        };

        let display_name = config.resolve_display_name(next.display_name().as_deref(), next.name().as_deref());
        let next_statics = next.statics();
        let previous_statics = previous.as_ref().map(Component::statics);

        // Probes run user code, so they happen before the state lock is taken.
        let mut diagnostics = Vec::new();
        let mut injected = FieldPatches::new();
        if let (Component::Class(class), Some(previous)) = (&next, &previous) {
            if config.diff_lifecycle {
                diagnostics.extend(diff::check_lifecycle_hooks(&display_name, previous, class).diagnostics().iter().cloned());
            }
            if config.diff_fields {
                match diff::check_instance_fields(&display_name, previous, class) {
                    DiffOutcome::Replayable(patches) => injected = patches,
                    DiffOutcome::Unsupported(found) => diagnostics.extend(found),
                    DiffOutcome::ProbeFailed(reason) => {
                        log::debug!("Skipped field diff for {}: {}", display_name, reason);
                    }
                    DiffOutcome::Match => {}
                }
            }
        }

        let report = {
            let mut guard = self.inner.state.lock();
            let state = &mut *guard;

            state.generation += 1;
            state.current = Some(next.clone());

            if state.name_sealed {
                log::debug!("Name of '{}' is sealed, keeping it", state.name);
            } else {
                state.name = display_name.clone();
            }
            state.display_name = display_name.clone();

            state.saved_descriptors = statics::transfer(
                &mut state.statics,
                &state.saved_descriptors,
                previous_statics.as_ref(),
                &next_statics,
            );

            state.injected = match next {
                Component::Class(_) => injected,
                _ => FieldPatches::new(),
            };

            let mut report = state.report(UpdateOutcome::Applied);
            report.diagnostics = diagnostics;
            report
        };

        for diagnostic in &report.diagnostics {
            diagnostic.emit(config.strict_diagnostics);
        }
        log::debug!(
            "Updated '{}' to a {} implementation, generation {}",
            report.display_name,
            next.kind_name(),
            report.generation
        );

        report
    }
}

impl PartialEq for StableWrapper {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for StableWrapper {}

impl fmt::Display for StableWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.current() {
            Some(current) => f.write_str(&current.source()),
            None => f.write_str(&self.name()),
        }
    }
}

impl fmt::Debug for StableWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("StableWrapper")
            .field("display_name", &state.display_name)
            .field("generation", &state.generation)
            .finish_non_exhaustive()
    }
}

/// Long-lived public identity for one proxied implementation
#[derive(Clone)]
pub struct ProxyHandle {
    wrapper: StableWrapper,
    registry: Arc<ProxyRegistry>,
}

impl ProxyHandle {
    pub(crate) fn new(wrapper: StableWrapper, registry: Arc<ProxyRegistry>) -> Self {
        Self { wrapper, registry }
    }

    /// The stable wrapper
    pub fn get(&self) -> StableWrapper {
        self.wrapper.clone()
    }

    /// Swap the behaviour behind the wrapper.
    ///
    /// Fails only if `next` is not a component. Passing a wrapper installs
    /// that wrapper's current implementation instead, so proxies never nest.
    pub fn update(&self, next: impl Into<Value>) -> Result<UpdateReport> {
        match next.into() {
            Value::Component(component) => Ok(self.update_component(component)),
            other => Err(ProxyError::invalid_implementation(other.type_name())),
        }
    }

    /// Current generation
    pub fn generation(&self) -> u64 {
        self.wrapper.generation()
    }

    /// Reference identity
    pub fn ptr_eq(&self, other: &ProxyHandle) -> bool {
        self.wrapper.ptr_eq(&other.wrapper)
    }

    /// Implementation currently behind the wrapper; used to resolve cycles
    pub(crate) fn current(&self) -> Option<Component> {
        self.wrapper.current()
    }

    pub(crate) fn update_component(&self, next: Component) -> UpdateReport {
        if let Component::Wrapper(wrapper) = &next {
            let underlying = match self.registry.find(&next) {
                Some(handle) => handle.current(),
                None => wrapper.current(),
            };

            return match underlying {
                Some(underlying) => {
                    log::debug!("Resolved wrapper '{}' to its current implementation", wrapper.display_name());
                    self.update_component(underlying)
                }
                None => {
                    let state = self.wrapper.inner.state.lock();
                    state.report(UpdateOutcome::Unchanged)
                }
            };
        }

        self.wrapper.apply(next)
    }
}

impl PartialEq for ProxyHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ProxyHandle {}

impl fmt::Debug for ProxyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyHandle").field("wrapper", &self.wrapper).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ClassComponent, FunctionComponent};

    fn registry() -> Arc<ProxyRegistry> {
        Arc::new(ProxyRegistry::new())
    }

    #[test]
    fn test_invalid_implementation() {
        let handle = registry()
            .obtain(FunctionComponent::new("function A() {}", |_, _| Value::Null))
            .unwrap();

        let err = handle.update(Value::Int(5)).unwrap_err();
        assert!(matches!(err, ProxyError::InvalidImplementation { found: "int" }));
        assert_eq!(handle.generation(), 1);
    }

    #[test]
    fn test_same_implementation_is_noop() {
        let component = ClassComponent::new("class A {}").with_name("A").into_component();
        let handle = registry().obtain(component.clone()).unwrap();

        let report = handle.update(component).unwrap();

        assert_eq!(report.outcome, UpdateOutcome::Unchanged);
        assert_eq!(report.generation, 1);
    }

    #[test]
    fn test_sealed_name_keeps_primary_name() {
        let handle = registry()
            .obtain(ClassComponent::new("class A {}").with_name("A"))
            .unwrap();
        let wrapper = handle.get();
        wrapper.seal_name();

        let report = handle.update(ClassComponent::new("class B {}").with_name("B")).unwrap();

        assert!(report.is_applied());
        assert_eq!(wrapper.name(), "A");
        assert_eq!(wrapper.display_name(), "B");
        assert_eq!(wrapper.to_string(), "class B {}");
    }

    #[test]
    fn test_set_static_respects_descriptors() {
        let handle = registry()
            .obtain(
                FunctionComponent::new("function A() {}", |_, _| Value::Null)
                    .with_static("count", 1)
                    .with_static_descriptor(
                        "fixed",
                        PropertyDescriptor::Data {
                            value: Value::Int(1),
                            writable: false,
                            enumerable: true,
                            configurable: true,
                        },
                    ),
            )
            .unwrap();
        let wrapper = handle.get();

        assert!(wrapper.set_static("count", 2));
        assert!(!wrapper.set_static("fixed", 2));
        assert!(wrapper.set_static("fresh", "x"));

        assert_eq!(wrapper.static_value("count"), Some(Value::Int(2)));
        assert_eq!(wrapper.static_value("fixed"), Some(Value::Int(1)));
        assert_eq!(wrapper.static_value("fresh"), Some(Value::from("x")));
    }

    #[test]
    fn test_construction_failure_surfaces() {
        let handle = registry()
            .obtain(
                ClassComponent::new("class A {}")
                    .with_name("A")
                    .with_initializer(|props, _| match props.get("id") {
                        Some(id) => Ok([("id".to_string(), id.clone())].into_iter().collect()),
                        None => Err("id is required".into()),
                    }),
            )
            .unwrap();

        let err = handle.get().construct(Value::object(), Value::object()).unwrap_err();
        assert!(matches!(err, ProxyError::ConstructionFailed { .. }));

        let props = Value::object_from([("id", Value::Int(9))]);
        let instance = handle.get().construct(props, Value::object()).unwrap();
        assert_eq!(instance.field("id"), Some(&Value::Int(9)));
    }

    #[test]
    fn test_render_rejects_foreign_instance() {
        let registry = registry();
        let a = registry.obtain(FunctionComponent::new("function A() {}", |_, _| Value::from("a"))).unwrap();
        let b = registry.obtain(FunctionComponent::new("function B() {}", |_, _| Value::from("b"))).unwrap();

        let mut instance = a.get().construct(Value::object(), Value::object()).unwrap();

        assert_eq!(b.get().render(&mut instance), Value::Undefined);
        assert_eq!(instance.render(), Value::from("a"));
    }

    #[test]
    fn test_report_serializes() {
        let handle = registry()
            .obtain(ClassComponent::new("class A {}").with_name("A"))
            .unwrap();
        let report = handle.update(ClassComponent::new("class A2 {}").with_name("A")).unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"], "applied");
        assert_eq!(json["generation"], 2);
        assert_eq!(json["display_name"], "A");
    }
}
