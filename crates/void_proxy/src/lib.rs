//! # void_proxy - Live Component Proxies
//!
//! Identity-preserving proxies for UI component implementations, the piece
//! underneath hot-reload of a mounted component tree.
//!
//! ## Overview
//!
//! The host asks the registry for a proxy of a component and from then on
//! only ever holds the proxy's [`StableWrapper`]. When the component's code
//! changes, reload tooling hands the new implementation to
//! [`ProxyHandle::update`]; the wrapper keeps its identity, its statics and
//! method table follow the new implementation, and live instances pick up
//! replayable field changes the next time they render.
//!
//! Changes that cannot be applied to live instances (a changed mount hook,
//! a changed field on an instance without the regeneration capability) are
//! reported as [`Diagnostic`]s, never raised.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐
//! │ Reload tooling  │────▶│  ProxyRegistry  │ (impl, handle) pairs
//! │ (new impl)      │     └────────┬────────┘
//! └─────────────────┘              │ obtain / find
//!                                  ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │  diff checker   │◀────│   ProxyHandle   │ update(next)
//! │  static transfer│     └────────┬────────┘
//! └─────────────────┘              │ get
//!                                  ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │    Instance     │◀────│  StableWrapper  │ construct / render
//! │ (per mount)     │     └─────────────────┘
//! └─────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use void_proxy::prelude::*;
//!
//! let registry = Arc::new(ProxyRegistry::new());
//!
//! let counter = ClassComponent::new("class Counter { step = 1 }")
//!     .with_name("Counter")
//!     .with_fields([("step", Value::Int(1))])
//!     .with_render("render() { return this.step }", |this| {
//!         this.field("step").cloned().unwrap_or_default()
//!     });
//!
//! let handle = registry.obtain(counter)?;
//! let mut instance = handle.get().construct(Value::object(), Value::object())?;
//! instance.render();
//!
//! // Later, after a rebuild:
//! let report = handle.update(next_counter)?;
//! for diagnostic in &report.diagnostics {
//!     eprintln!("{}", diagnostic);
//! }
//! instance.render(); // picks up the new code
//! ```

mod component;
mod config;
mod diff;
mod error;
mod instance;
mod proxy;
mod registry;
mod statics;
mod value;

pub use component::{ClassComponent, Component, FunctionComponent, Method, Prototype, Regenerator};
pub use config::ProxyConfig;
pub use diff::{
    check_instance_fields, check_lifecycle_hooks, DiffOutcome, FieldPatches, INTERNAL_KEY_PREFIX,
    LIFECYCLE_HOOKS,
};
pub use error::{Diagnostic, ProxyError, Result, DIAGNOSTIC_TAG};
pub use instance::{Instance, InstanceId};
pub use proxy::{ProxyHandle, StableWrapper, UpdateOutcome, UpdateReport};
pub use registry::ProxyRegistry;
pub use statics::{transfer, Getter, PropertyDescriptor, Setter, StaticMembers, RESERVED_STATICS};
pub use value::{FieldMap, Value};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::component::{ClassComponent, Component, FunctionComponent};
    pub use crate::config::ProxyConfig;
    pub use crate::error::{Diagnostic, ProxyError, Result};
    pub use crate::instance::Instance;
    pub use crate::proxy::{ProxyHandle, StableWrapper, UpdateReport};
    pub use crate::registry::ProxyRegistry;
    pub use crate::statics::PropertyDescriptor;
    pub use crate::value::Value;
}
