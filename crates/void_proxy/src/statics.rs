//! Static member transfer
//!
//! Class-level members live on the stable wrapper. Each update copies the
//! new implementation's descriptors onto the wrapper and drops the ones the
//! new implementation no longer has, while leaving members the host set on
//! the wrapper itself alone.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// Keys inherent to every constructor; never transferred
pub const RESERVED_STATICS: [&str; 6] = ["length", "name", "arguments", "caller", "prototype", "toString"];

/// Map of static member name to descriptor
pub type StaticMembers = BTreeMap<String, PropertyDescriptor>;

/// Getter half of an accessor
#[derive(Clone)]
pub struct Getter(Arc<dyn Fn() -> Value + Send + Sync>);

impl Getter {
    /// Create a getter
    pub fn new<F>(get: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(get))
    }

    /// Read through the getter
    pub fn get(&self) -> Value {
        (self.0)()
    }

    /// Check if both are the same function
    pub fn ptr_eq(&self, other: &Getter) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Setter half of an accessor
#[derive(Clone)]
pub struct Setter(Arc<dyn Fn(Value) + Send + Sync>);

impl Setter {
    /// Create a setter
    pub fn new<F>(set: F) -> Self
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        Self(Arc::new(set))
    }

    /// Write through the setter
    pub fn set(&self, value: Value) {
        (self.0)(value)
    }

    /// Check if both are the same function
    pub fn ptr_eq(&self, other: &Setter) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

fn same_accessor<T>(a: &Option<T>, b: &Option<T>, eq: impl Fn(&T, &T) -> bool) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Descriptor of one static member
#[derive(Clone)]
pub enum PropertyDescriptor {
    /// Plain value
    Data {
        value: Value,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    },
    /// Getter and/or setter
    Accessor {
        get: Option<Getter>,
        set: Option<Setter>,
        enumerable: bool,
        configurable: bool,
    },
}

impl PropertyDescriptor {
    /// Enumerable, writable, configurable value
    pub fn data(value: impl Into<Value>) -> Self {
        PropertyDescriptor::Data {
            value: value.into(),
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Non-enumerable value, the shape of a class method
    pub fn hidden(value: impl Into<Value>) -> Self {
        PropertyDescriptor::Data {
            value: value.into(),
            writable: true,
            enumerable: false,
            configurable: true,
        }
    }

    /// Enumerable accessor
    pub fn accessor(get: Option<Getter>, set: Option<Setter>) -> Self {
        PropertyDescriptor::Accessor {
            get,
            set,
            enumerable: true,
            configurable: true,
        }
    }

    /// Mark as non-configurable
    pub fn sealed(mut self) -> Self {
        match &mut self {
            PropertyDescriptor::Data { configurable, .. }
            | PropertyDescriptor::Accessor { configurable, .. } => *configurable = false,
        }
        self
    }

    /// Whether the member shows up in enumeration
    pub fn is_enumerable(&self) -> bool {
        match self {
            PropertyDescriptor::Data { enumerable, .. }
            | PropertyDescriptor::Accessor { enumerable, .. } => *enumerable,
        }
    }

    /// Whether the member may be redefined or removed
    pub fn is_configurable(&self) -> bool {
        match self {
            PropertyDescriptor::Data { configurable, .. }
            | PropertyDescriptor::Accessor { configurable, .. } => *configurable,
        }
    }

    /// Current value: the data value, or the getter's result
    pub fn read(&self) -> Value {
        match self {
            PropertyDescriptor::Data { value, .. } => value.clone(),
            PropertyDescriptor::Accessor { get: Some(get), .. } => get.get(),
            PropertyDescriptor::Accessor { get: None, .. } => Value::Undefined,
        }
    }

    /// Copy of this descriptor that can later be redefined or removed
    pub fn configurable_copy(&self) -> Self {
        let mut copy = self.clone();
        match &mut copy {
            PropertyDescriptor::Data { configurable, .. }
            | PropertyDescriptor::Accessor { configurable, .. } => *configurable = true,
        }
        copy
    }

    /// Same value/accessors, writability and enumerability.
    ///
    /// Configurability is ignored since transferred copies are always made
    /// configurable.
    pub fn same_shape(&self, other: &PropertyDescriptor) -> bool {
        match (self, other) {
            (
                PropertyDescriptor::Data { value: a, writable: wa, enumerable: ea, .. },
                PropertyDescriptor::Data { value: b, writable: wb, enumerable: eb, .. },
            ) => a == b && wa == wb && ea == eb,
            (
                PropertyDescriptor::Accessor { get: ga, set: sa, enumerable: ea, .. },
                PropertyDescriptor::Accessor { get: gb, set: sb, enumerable: eb, .. },
            ) => {
                ea == eb
                    && same_accessor(ga, gb, Getter::ptr_eq)
                    && same_accessor(sa, sb, Setter::ptr_eq)
            }
            _ => false,
        }
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyDescriptor::Data { value, writable, enumerable, configurable } => f
                .debug_struct("Data")
                .field("value", value)
                .field("writable", writable)
                .field("enumerable", enumerable)
                .field("configurable", configurable)
                .finish(),
            PropertyDescriptor::Accessor { get, set, enumerable, configurable } => f
                .debug_struct("Accessor")
                .field("get", &get.is_some())
                .field("set", &set.is_some())
                .field("enumerable", enumerable)
                .field("configurable", configurable)
                .finish(),
        }
    }
}

/// Check if a key is inherent to constructors
pub fn is_reserved(key: &str) -> bool {
    RESERVED_STATICS.contains(&key)
}

/// Move the wrapper's statics from `previous` to `next`.
///
/// `saved` is the snapshot returned by the previous call; the new snapshot
/// is returned and must be passed to the next one.
pub fn transfer(
    target: &mut StaticMembers,
    saved: &StaticMembers,
    previous: Option<&StaticMembers>,
    next: &StaticMembers,
) -> StaticMembers {
    let mut snapshot = StaticMembers::new();

    for (key, descriptor) in next.iter().filter(|(key, _)| !is_reserved(key)) {
        let copy = descriptor.configurable_copy();

        match target.get(key) {
            Some(existing) if existing.same_shape(&copy) => {}
            Some(existing) if !existing.is_configurable() => {
                log::debug!("Static '{}' is sealed on the wrapper, keeping it", key);
                continue;
            }
            _ => {
                target.insert(key.clone(), copy.clone());
            }
        }

        snapshot.insert(key.clone(), copy);
    }

    let stale: BTreeSet<&String> = saved
        .keys()
        .chain(previous.into_iter().flat_map(|p| p.keys()))
        .filter(|key| !is_reserved(key) && !next.contains_key(*key))
        .collect();

    for key in stale {
        match target.get(key) {
            Some(existing) if !existing.is_configurable() => {
                log::debug!("Static '{}' is sealed on the wrapper, not removing it", key);
            }
            Some(_) => {
                target.remove(key);
            }
            None => {}
        }
    }

    snapshot
}
