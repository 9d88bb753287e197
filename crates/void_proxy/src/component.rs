//! Component implementations
//!
//! A component is either class-like (a prototype of named methods plus an
//! instance initializer) or function-like (a render function of props and
//! context). A third variant carries a [`StableWrapper`] so that wrappers can
//! be passed back in wherever an implementation is expected.
//!
//! Identity is reference identity: two components built from identical code
//! are still distinct.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::diff::LIFECYCLE_HOOKS;
use crate::instance::Instance;
use crate::proxy::StableWrapper;
use crate::statics::{PropertyDescriptor, StaticMembers};
use crate::value::{FieldMap, Value};

type MethodFn = dyn Fn(&mut Instance, &[Value]) -> Value + Send + Sync;
type InitializerFn = dyn Fn(&Value, &Value) -> Result<FieldMap, String> + Send + Sync;
type RenderFn = dyn Fn(&Value, &Value) -> Value + Send + Sync;
type RegenerateFn = dyn Fn(&mut FieldMap, &str, &Value) + Send + Sync;

/// A named method with its source text
#[derive(Clone)]
pub struct Method {
    name: Arc<str>,
    source: Arc<str>,
    body: Arc<MethodFn>,
}

impl Method {
    /// Create a method from its name, source text and body
    pub fn new<F>(name: &str, source: &str, body: F) -> Self
    where
        F: Fn(&mut Instance, &[Value]) -> Value + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            source: source.into(),
            body: Arc::new(body),
        }
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source text, the method's textual form
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Call the method with `instance` as receiver
    pub fn call(&self, instance: &mut Instance, args: &[Value]) -> Value {
        (self.body)(instance, args)
    }

    /// Check if two methods are the same function
    pub fn ptr_eq(&self, other: &Method) -> bool {
        Arc::ptr_eq(&self.body, &other.body)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Method table of a class-like component
#[derive(Clone, Debug, Default)]
pub struct Prototype {
    methods: BTreeMap<String, Method>,
}

impl Prototype {
    /// Look up a method
    pub fn get(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    /// The render method, if any
    pub fn render(&self) -> Option<&Method> {
        self.get("render")
    }

    /// Textual form of a member; `undefined` when absent
    pub fn member_text(&self, name: &str) -> String {
        self.get(name)
            .map(|m| m.source().to_string())
            .unwrap_or_else(|| Value::Undefined.to_text())
    }

    /// Recognized lifecycle hooks defined on this prototype
    pub fn lifecycle_hooks(&self) -> BTreeMap<String, Method> {
        LIFECYCLE_HOOKS
            .iter()
            .filter_map(|hook| self.get(hook).map(|m| (hook.to_string(), m.clone())))
            .collect()
    }

    /// Method names
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    fn insert(&mut self, method: Method) {
        self.methods.insert(method.name().to_string(), method);
    }
}

/// Instance-level entry point that re-applies a field value.
///
/// This is the regeneration capability: when present, changed field
/// initializers can be replayed onto instances that already exist.
#[derive(Clone)]
pub struct Regenerator(Arc<RegenerateFn>);

impl Regenerator {
    /// Create a regenerator from a custom application function
    pub fn new<F>(apply: F) -> Self
    where
        F: Fn(&mut FieldMap, &str, &Value) + Send + Sync + 'static,
    {
        Self(Arc::new(apply))
    }

    /// Regenerator that assigns the new value as-is
    pub fn assign() -> Self {
        Self::new(|fields, key, value| {
            fields.insert(key.to_string(), value.clone());
        })
    }

    /// Apply one field value
    pub fn apply(&self, fields: &mut FieldMap, key: &str, value: &Value) {
        (self.0)(fields, key, value)
    }
}

impl fmt::Debug for Regenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Regenerator")
    }
}

/// A stateful, class-like component
pub struct ClassComponent {
    name: Option<String>,
    display_name: Option<String>,
    source: String,
    statics: StaticMembers,
    prototype: Prototype,
    initializer: Option<Arc<InitializerFn>>,
    regenerator: Option<Regenerator>,
}

impl ClassComponent {
    /// Create a class with the given source text and no members
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            name: None,
            display_name: None,
            source: source.into(),
            statics: StaticMembers::new(),
            prototype: Prototype::default(),
            initializer: None,
            regenerator: None,
        }
    }

    /// Set the class name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set an explicit display name
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Add a prototype method
    pub fn with_method<F>(mut self, name: &str, source: &str, body: F) -> Self
    where
        F: Fn(&mut Instance, &[Value]) -> Value + Send + Sync + 'static,
    {
        self.prototype.insert(Method::new(name, source, body));
        self
    }

    /// Add the render method
    pub fn with_render<F>(self, source: &str, render: F) -> Self
    where
        F: Fn(&Instance) -> Value + Send + Sync + 'static,
    {
        self.with_method("render", source, move |instance, _| render(instance))
    }

    /// Set the instance field initializer
    pub fn with_initializer<F>(mut self, init: F) -> Self
    where
        F: Fn(&Value, &Value) -> Result<FieldMap, String> + Send + Sync + 'static,
    {
        self.initializer = Some(Arc::new(init));
        self
    }

    /// Initialize instances with a fixed set of field values
    pub fn with_fields<K, I>(self, fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let fields: FieldMap = fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.with_initializer(move |_, _| Ok(fields.clone()))
    }

    /// Give instances the plain-assignment regeneration capability
    pub fn with_regeneration(self) -> Self {
        self.with_regenerator(Regenerator::assign())
    }

    /// Give instances a custom regeneration capability
    pub fn with_regenerator(mut self, regenerator: Regenerator) -> Self {
        self.regenerator = Some(regenerator);
        self
    }

    /// Add an enumerable, writable static value
    pub fn with_static(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_static_descriptor(key, PropertyDescriptor::data(value))
    }

    /// Add a static member with an explicit descriptor
    pub fn with_static_descriptor(mut self, key: impl Into<String>, descriptor: PropertyDescriptor) -> Self {
        self.statics.insert(key.into(), descriptor);
        self
    }

    /// Class name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Explicit display name
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Source text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Own static members
    pub fn statics(&self) -> &StaticMembers {
        &self.statics
    }

    /// Method table
    pub fn prototype(&self) -> &Prototype {
        &self.prototype
    }

    /// Regeneration capability
    pub fn regenerator(&self) -> Option<&Regenerator> {
        self.regenerator.as_ref()
    }

    /// Run the field initializer; no initializer means no fields
    pub fn initialize(&self, props: &Value, context: &Value) -> Result<FieldMap, String> {
        match &self.initializer {
            Some(init) => init(props, context),
            None => Ok(FieldMap::new()),
        }
    }

    /// Wrap into a shareable component
    pub fn into_component(self) -> Component {
        Component::Class(Arc::new(self))
    }
}

/// A function-like component: a pure render function of props and context
pub struct FunctionComponent {
    name: Option<String>,
    display_name: Option<String>,
    source: String,
    statics: StaticMembers,
    body: Arc<RenderFn>,
}

impl FunctionComponent {
    /// Create a function component from its source text and render body
    pub fn new<F>(source: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Value, &Value) -> Value + Send + Sync + 'static,
    {
        Self {
            name: None,
            display_name: None,
            source: source.into(),
            statics: StaticMembers::new(),
            body: Arc::new(body),
        }
    }

    /// Set the function name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set an explicit display name
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Add an enumerable, writable static value
    pub fn with_static(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_static_descriptor(key, PropertyDescriptor::data(value))
    }

    /// Add a static member with an explicit descriptor
    pub fn with_static_descriptor(mut self, key: impl Into<String>, descriptor: PropertyDescriptor) -> Self {
        self.statics.insert(key.into(), descriptor);
        self
    }

    /// Function name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Explicit display name
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Source text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Own static members
    pub fn statics(&self) -> &StaticMembers {
        &self.statics
    }

    /// Render with the given props and context
    pub fn call(&self, props: &Value, context: &Value) -> Value {
        (self.body)(props, context)
    }

    /// Wrap into a shareable component
    pub fn into_component(self) -> Component {
        Component::Function(Arc::new(self))
    }
}

/// Any value that can stand behind a proxy
#[derive(Clone)]
pub enum Component {
    /// Class-like implementation
    Class(Arc<ClassComponent>),
    /// Function-like implementation
    Function(Arc<FunctionComponent>),
    /// A wrapper produced by a proxy handle
    Wrapper(StableWrapper),
}

impl Component {
    /// Reference identity
    pub fn ptr_eq(&self, other: &Component) -> bool {
        match (self, other) {
            (Component::Class(a), Component::Class(b)) => Arc::ptr_eq(a, b),
            (Component::Function(a), Component::Function(b)) => Arc::ptr_eq(a, b),
            (Component::Wrapper(a), Component::Wrapper(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Whether this is a stateful, class-like implementation
    pub fn is_class(&self) -> bool {
        match self {
            Component::Class(_) => true,
            Component::Function(_) => false,
            Component::Wrapper(wrapper) => wrapper.current().is_some_and(|c| c.is_class()),
        }
    }

    /// Short kind label for logs
    pub fn kind_name(&self) -> &'static str {
        match self {
            Component::Class(_) => "class",
            Component::Function(_) => "function",
            Component::Wrapper(_) => "wrapper",
        }
    }

    /// Plain name
    pub fn name(&self) -> Option<String> {
        match self {
            Component::Class(c) => c.name().map(str::to_string),
            Component::Function(f) => f.name().map(str::to_string),
            Component::Wrapper(w) => Some(w.name()),
        }
    }

    /// Explicit display name
    pub fn display_name(&self) -> Option<String> {
        match self {
            Component::Class(c) => c.display_name().map(str::to_string),
            Component::Function(f) => f.display_name().map(str::to_string),
            Component::Wrapper(w) => Some(w.display_name()),
        }
    }

    /// Own static members
    pub fn statics(&self) -> StaticMembers {
        match self {
            Component::Class(c) => c.statics().clone(),
            Component::Function(f) => f.statics().clone(),
            Component::Wrapper(w) => w.statics(),
        }
    }

    /// Textual form (source text)
    pub fn source(&self) -> String {
        match self {
            Component::Class(c) => c.source().to_string(),
            Component::Function(f) => f.source().to_string(),
            Component::Wrapper(w) => w.to_string(),
        }
    }
}

impl From<ClassComponent> for Component {
    fn from(class: ClassComponent) -> Self {
        class.into_component()
    }
}

impl From<FunctionComponent> for Component {
    fn from(function: FunctionComponent) -> Self {
        function.into_component()
    }
}

impl From<StableWrapper> for Component {
    fn from(wrapper: StableWrapper) -> Self {
        Component::Wrapper(wrapper)
    }
}

impl From<ClassComponent> for Value {
    fn from(class: ClassComponent) -> Self {
        Value::Component(class.into_component())
    }
}

impl From<FunctionComponent> for Value {
    fn from(function: FunctionComponent) -> Self {
        Value::Component(function.into_component())
    }
}

impl From<StableWrapper> for Value {
    fn from(wrapper: StableWrapper) -> Self {
        Value::Component(Component::Wrapper(wrapper))
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("kind", &self.kind_name())
            .field("name", &self.name())
            .finish()
    }
}
