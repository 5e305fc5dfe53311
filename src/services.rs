// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Request-scoped service lookup
//!
//! Services are keyed by type name. Only lookup is modelled here; lifetimes
//! beyond singleton and transient registrations belong to the host container.

use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A resolved service instance
#[derive(Clone)]
pub struct ServiceInstance {
    type_name: Arc<str>,
    instance: Arc<dyn Any + Send + Sync>,
}

impl ServiceInstance {
    /// Wrap a value as a service of the given type name
    pub fn new<T: Any + Send + Sync>(type_name: impl Into<Arc<str>>, value: T) -> Self {
        Self {
            type_name: type_name.into(),
            instance: Arc::new(value),
        }
    }

    /// Wrap a shared value
    pub fn from_arc(type_name: impl Into<Arc<str>>, instance: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            type_name: type_name.into(),
            instance,
        }
    }

    /// Registered type name
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Borrow the instance as a concrete type
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.instance.downcast_ref::<T>()
    }

    /// Get the instance as a shared concrete type
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.instance.clone().downcast::<T>().ok()
    }
}

impl PartialEq for ServiceInstance {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.instance, &other.instance)
    }
}

impl fmt::Debug for ServiceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceInstance")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Lookup of services by type name
pub trait ServiceProvider: Send + Sync {
    /// Resolve a service; `None` when the type is not registered
    fn get_service(&self, type_name: &str) -> Option<ServiceInstance>;
}

type ServiceFactory = Arc<dyn Fn() -> ServiceInstance + Send + Sync>;

#[derive(Clone)]
enum Registration {
    Singleton(ServiceInstance),
    Transient(ServiceFactory),
}

/// A simple service registry
#[derive(Clone, Default)]
pub struct ServiceCollection {
    registrations: Arc<RwLock<HashMap<String, Registration>>>,
}

impl ServiceCollection {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one shared instance
    pub fn add_singleton<T: Any + Send + Sync>(&self, type_name: &str, value: T) -> &Self {
        self.registrations.write().insert(
            type_name.to_string(),
            Registration::Singleton(ServiceInstance::new(type_name, value)),
        );
        self
    }

    /// Register a factory called on every lookup
    pub fn add_transient<T, F>(&self, type_name: &str, factory: F) -> &Self
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let name: Arc<str> = Arc::from(type_name);
        let factory: ServiceFactory =
            Arc::new(move || ServiceInstance::new(name.clone(), factory()));
        self.registrations
            .write()
            .insert(type_name.to_string(), Registration::Transient(factory));
        self
    }

    /// Whether a type name is registered
    pub fn contains(&self, type_name: &str) -> bool {
        self.registrations.read().contains_key(type_name)
    }

    /// Number of registrations
    pub fn len(&self) -> usize {
        self.registrations.read().len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.registrations.read().is_empty()
    }
}

impl ServiceProvider for ServiceCollection {
    fn get_service(&self, type_name: &str) -> Option<ServiceInstance> {
        let registration = self.registrations.read().get(type_name).cloned()?;
        Some(match registration {
            Registration::Singleton(instance) => instance,
            Registration::Transient(factory) => factory(),
        })
    }
}

impl fmt::Debug for ServiceCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registrations = self.registrations.read();
        let mut names: Vec<&String> = registrations.keys().collect();
        names.sort();
        f.debug_struct("ServiceCollection")
            .field("registrations", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, PartialEq)]
    struct Clock {
        now: u64,
    }

    #[test]
    fn test_singleton_is_shared() {
        let services = ServiceCollection::new();
        services.add_singleton("Clock", Clock { now: 7 });

        let first = services.get_service("Clock").unwrap();
        let second = services.get_service("Clock").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.downcast_ref::<Clock>(), Some(&Clock { now: 7 }));
        assert!(services.get_service("Missing").is_none());
    }

    #[test]
    fn test_transient_is_created_per_lookup() {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = created.clone();
        let services = ServiceCollection::new();
        services.add_transient("Clock", move || Clock {
            now: counter.fetch_add(1, Ordering::SeqCst) as u64,
        });

        let first = services.get_service("Clock").unwrap();
        let second = services.get_service("Clock").unwrap();
        assert_ne!(first, second);
        assert_eq!(second.downcast::<Clock>().map(|c| c.now), Some(1));
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }
}
