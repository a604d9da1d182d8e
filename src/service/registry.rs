//! Service registry: name bindings and method resolution.
//!
//! The registry maps service names to registered [`Service`] instances and
//! resolves a dotted method name to `(service, unqualified method)`. A full
//! method name splits at its *last* dot, so dotted service names match
//! literally and the longest prefix wins by construction.

use std::collections::HashMap;
use std::sync::Arc;

use super::descriptor::Service;

/// Holds registered services keyed by resolved service name.
#[derive(Default)]
pub struct ServiceRegistry {
    services: HashMap<String, Arc<Service>>,
}

impl ServiceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service.
    ///
    /// Returns `false` when the service's name is already bound or the same
    /// instance is already present; the registry is unchanged in that case.
    pub fn add_service(&mut self, service: &Arc<Service>) -> bool {
        if self.services.contains_key(service.name()) {
            tracing::warn!(name = service.name(), "service name already registered");
            return false;
        }
        self.services
            .insert(service.name().to_string(), service.clone());
        true
    }

    /// Remove a service by instance identity.
    ///
    /// Returns `false` for an instance that is not registered, including one
    /// that was already removed.
    pub fn remove_service(&mut self, service: &Arc<Service>) -> bool {
        match self.services.get(service.name()) {
            Some(registered) if Arc::ptr_eq(registered, service) => {
                self.services.remove(service.name());
                true
            }
            _ => false,
        }
    }

    /// Resolve a full method name to its service and unqualified method.
    ///
    /// A name without a dot addresses the anonymous service. Returns `None`
    /// when no service is bound under the prefix; the caller replies
    /// MethodNotFound.
    pub fn resolve(&self, full_method: &str) -> Option<(Arc<Service>, String)> {
        let (prefix, method) = match full_method.rsplit_once('.') {
            Some((prefix, method)) => (prefix, method),
            None => ("", full_method),
        };

        self.services
            .get(prefix)
            .map(|service| (service.clone(), method.to_string()))
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether no services are registered.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
