//! Live component instances
//!
//! Instances are built by a [`StableWrapper`] and keep a reference to it for
//! their whole life. Each instance remembers the proxy generation it last
//! synchronized with; pending field patches are applied through
//! [`Instance::apply_patches`] right before a render.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::component::{Method, Regenerator};
use crate::diff::FieldPatches;
use crate::proxy::StableWrapper;
use crate::value::{FieldMap, Value};

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a component instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

impl InstanceId {
    fn next() -> Self {
        Self(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A live instance of a proxied component
pub struct Instance {
    id: InstanceId,
    wrapper: StableWrapper,
    props: Value,
    context: Value,
    fields: FieldMap,
    /// Lifecycle hooks as they were when the instance was built
    hooks: BTreeMap<String, Method>,
    regenerator: Option<Regenerator>,
    generation: u64,
    mounted: bool,
}

impl Instance {
    pub(crate) fn new(
        wrapper: StableWrapper,
        props: Value,
        context: Value,
        fields: FieldMap,
        hooks: BTreeMap<String, Method>,
        regenerator: Option<Regenerator>,
        generation: u64,
    ) -> Self {
        Self {
            id: InstanceId::next(),
            wrapper,
            props,
            context,
            fields,
            hooks,
            regenerator,
            generation,
            mounted: false,
        }
    }

    /// Get the instance ID
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// The wrapper this instance was built from
    pub fn wrapper(&self) -> &StableWrapper {
        &self.wrapper
    }

    /// Check if this instance was built by `wrapper`
    pub fn is_instance_of(&self, wrapper: &StableWrapper) -> bool {
        self.wrapper.ptr_eq(wrapper)
    }

    /// Get the props
    pub fn props(&self) -> &Value {
        &self.props
    }

    /// Replace the props
    pub fn set_props(&mut self, props: Value) {
        self.props = props;
    }

    /// Get the context
    pub fn context(&self) -> &Value {
        &self.context
    }

    /// Read a field
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Write a field
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// All fields
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Generation this instance last synchronized with
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether mount hooks have run
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Whether this instance can regenerate fields
    pub fn supports_regeneration(&self) -> bool {
        self.regenerator.is_some()
    }

    /// Re-apply one field through the regeneration capability.
    ///
    /// Returns `false` when the instance has no such capability.
    pub fn regenerate(&mut self, key: &str, value: &Value) -> bool {
        match &self.regenerator {
            Some(regenerator) => {
                regenerator.apply(&mut self.fields, key, value);
                true
            }
            None => false,
        }
    }

    /// Bring the instance up to `generation` by replaying `patches`.
    ///
    /// Does nothing when already in sync. Returns the number of fields applied.
    pub fn apply_patches(&mut self, patches: &FieldPatches, generation: u64) -> usize {
        if self.generation == generation {
            return 0;
        }

        let mut applied = 0;
        for (key, value) in patches {
            if self.regenerate(key, value) {
                applied += 1;
            } else {
                log::debug!("Instance {} cannot regenerate field '{}'", self.id.0, key);
            }
        }

        self.generation = generation;
        applied
    }

    /// Source text of a lifecycle hook bound to this instance
    pub fn hook_source(&self, hook: &str) -> Option<&str> {
        self.hooks.get(hook).map(Method::source)
    }

    /// Produce output through the wrapper
    pub fn render(&mut self) -> Value {
        let wrapper = self.wrapper.clone();
        wrapper.render(self)
    }

    /// Run the mount hooks bound at construction
    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }
        self.mounted = true;

        for hook in crate::diff::LIFECYCLE_HOOKS {
            self.call_hook(hook);
        }
    }

    /// Call a prototype method through the wrapper's current implementation
    pub fn invoke(&mut self, method: &str, args: &[Value]) -> Option<Value> {
        let wrapper = self.wrapper.clone();
        wrapper.invoke(self, method, args)
    }

    pub(crate) fn relink_regenerator(&mut self, regenerator: Regenerator) {
        self.regenerator = Some(regenerator);
    }

    fn call_hook(&mut self, hook: &str) -> Option<Value> {
        let method = self.hooks.get(hook).cloned()?;
        Some(method.call(self, &[]))
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("fields", &self.fields)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
