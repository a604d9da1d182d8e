//! Service module - handler tables, registry, and dispatch.
//!
//! Provides:
//! - [`Service`] / [`ServiceBuilder`] - a named handler table built at
//!   construction time, with typed parameter descriptors and overloads
//! - [`ServiceRegistry`] - name bindings and dotted-method resolution
//! - the dispatcher that binds wire params, ranks overloads, and invokes
//!
//! # Example
//!
//! ```
//! use wirerpc::{ParamKind, ParamSpec, Service, ServiceRegistry};
//!
//! let service = Service::builder("service")
//!     .method(
//!         "singleParam",
//!         vec![ParamSpec::new("string", ParamKind::String)],
//!         |args| Ok(args[0].clone()),
//!     )
//!     .build();
//!
//! let mut registry = ServiceRegistry::new();
//! assert!(registry.add_service(&service));
//! assert!(registry.resolve("service.singleParam").is_some());
//! ```

mod descriptor;
mod dispatch;
mod registry;

pub use descriptor::{
    DeferredHandler, DeferredReply, HandlerError, ParamDir, ParamKind, ParamSpec, Service,
    ServiceBuilder, SyncHandler,
};
pub use registry::ServiceRegistry;

pub(crate) use dispatch::{dispatch, DispatchContext};
