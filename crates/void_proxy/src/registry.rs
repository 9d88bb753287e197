//! Proxy registry
//!
//! Process-wide list of (implementation, handle) pairs. The host builds one
//! registry at startup and shares it; every proxy request goes through it so
//! that an implementation is never wrapped twice and a wrapper passed back
//! in resolves to the handle that owns it.
//!
//! Entries are never removed. The list is compared by reference identity.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::component::Component;
use crate::config::ProxyConfig;
use crate::error::{ProxyError, Result};
use crate::proxy::{ProxyHandle, StableWrapper};
use crate::value::Value;

/// Registry of live proxies
pub struct ProxyRegistry {
    /// Known implementations and wrappers, with the handle managing each
    entries: RwLock<Vec<(Component, ProxyHandle)>>,
    /// Configuration handed to every wrapper
    config: Arc<ProxyConfig>,
}

impl ProxyRegistry {
    /// Create an empty registry with the default configuration
    pub fn new() -> Self {
        Self::with_config(ProxyConfig::default())
    }

    /// Create an empty registry
    pub fn with_config(config: ProxyConfig) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            config: Arc::new(config),
        }
    }

    /// The configuration
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Find the handle managing `component`
    pub fn find(&self, component: &Component) -> Option<ProxyHandle> {
        self.entries
            .read()
            .iter()
            .find(|(key, _)| key.ptr_eq(component))
            .map(|(_, handle)| handle.clone())
    }

    /// Record that `handle` manages `component`
    pub fn add(&self, component: Component, handle: ProxyHandle) {
        self.entries.write().push((component, handle));
    }

    /// Get the handle for an implementation, creating it on first request.
    ///
    /// Passing a wrapper returns the handle that owns it. The new handle is
    /// registered under both the implementation and its wrapper.
    pub fn obtain(self: &Arc<Self>, component: impl Into<Value>) -> Result<ProxyHandle> {
        let component = match component.into() {
            Value::Component(component) => component,
            other => return Err(ProxyError::invalid_implementation(other.type_name())),
        };

        if let Some(existing) = self.find(&component) {
            return Ok(existing);
        }

        let wrapper = StableWrapper::new(Arc::clone(&self.config));
        let handle = ProxyHandle::new(wrapper.clone(), Arc::clone(self));
        let report = handle.update_component(component.clone());

        // The initial update ran user code without the lock held; someone may
        // have registered the same implementation meanwhile.
        let mut entries = self.entries.write();
        if let Some((_, existing)) = entries.iter().find(|(key, _)| key.ptr_eq(&component)) {
            return Ok(existing.clone());
        }
        entries.push((component, handle.clone()));
        entries.push((Component::Wrapper(wrapper), handle.clone()));

        log::debug!("Created proxy for '{}'", report.display_name);
        Ok(handle)
    }

    /// Number of registered entries (implementations and wrappers)
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for ProxyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
