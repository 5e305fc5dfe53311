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

//! Scoped property lifetime
//!
//! Controller properties can be declared as living in view data (shared with
//! the view of the current request) or in temp data (carried to the next
//! request). At request entry [`PropertyLifetimeManager::init`] restores
//! their values; at request exit [`PropertyLifetimeManager::save`] writes
//! back the values that changed.
//!
//! Properties are declared per controller type in a
//! [`PropertyLifetimeRegistry`]; controllers are represented as
//! [`ModelObject`]s.

use indexmap::IndexMap;
use log::{trace, warn};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::model::{ModelObject, ModelValue};

const TEMP_DATA_PREFIX: &str = "TempDataProperty-";
const VIEW_DATA_PREFIX: &str = "ViewDataProperty-";

/// Where a property value lives between entry and exit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifetimeSource {
    /// Shared with the view of the current request
    ViewData,
    /// Carried to the next request
    TempData,
}

impl LifetimeSource {
    fn key(self, property: &str) -> String {
        match self {
            Self::ViewData => format!("{VIEW_DATA_PREFIX}{property}"),
            Self::TempData => format!("{TEMP_DATA_PREFIX}{property}"),
        }
    }
}

/// A property tagged with its lifetime source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifetimeProperty {
    /// Property name on the controller
    pub name: String,
    /// Lifetime source
    pub source: LifetimeSource,
}

impl LifetimeProperty {
    /// A view-data property
    pub fn view_data(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: LifetimeSource::ViewData,
        }
    }

    /// A temp-data property
    pub fn temp_data(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: LifetimeSource::TempData,
        }
    }
}

/// Values carried across requests
///
/// Reading a value with [`TempDataStore::get`] marks it for deletion at the
/// end of the request; [`TempDataStore::peek`] does not.
pub trait TempDataStore {
    /// Read a value and mark it as consumed
    fn get(&mut self, key: &str) -> Option<ModelValue>;

    /// Read a value without consuming it
    fn peek(&self, key: &str) -> Option<ModelValue>;

    /// Store a value, keeping it for the next request
    fn set(&mut self, key: &str, value: ModelValue);
}

/// In-memory temp data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TempDataDictionary {
    values: IndexMap<String, ModelValue>,
    consumed: HashSet<String>,
}

impl TempDataDictionary {
    /// Create empty temp data
    pub fn new() -> Self {
        Self::default()
    }

    /// Temp data loaded from a previous request
    pub fn from_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, ModelValue)>,
        K: Into<String>,
    {
        Self {
            values: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            consumed: HashSet::new(),
        }
    }

    /// Whether a value was consumed during this request
    pub fn is_consumed(&self, key: &str) -> bool {
        self.consumed.contains(key)
    }

    /// Values to persist for the next request
    pub fn retained(&self) -> impl Iterator<Item = (&String, &ModelValue)> {
        self.values
            .iter()
            .filter(|(key, _)| !self.consumed.contains(*key))
    }
}

impl TempDataStore for TempDataDictionary {
    fn get(&mut self, key: &str) -> Option<ModelValue> {
        let value = self.values.get(key).cloned();
        if value.is_some() {
            self.consumed.insert(key.to_string());
        }
        value
    }

    fn peek(&self, key: &str) -> Option<ModelValue> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: ModelValue) {
        self.consumed.remove(key);
        self.values.insert(key.to_string(), value);
    }
}

/// Values shared with the view of the current request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewDataDictionary {
    values: IndexMap<String, ModelValue>,
}

impl ViewDataDictionary {
    /// Create empty view data
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a value
    pub fn get(&self, key: &str) -> Option<&ModelValue> {
        self.values.get(key)
    }

    /// Store a value
    pub fn set(&mut self, key: impl Into<String>, value: ModelValue) {
        self.values.insert(key.into(), value);
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The stores a lifetime manager reads from and writes to
pub struct PropertyLifetimeContext<'a> {
    /// Temp data of the request
    pub temp_data: &'a mut dyn TempDataStore,
    /// View data of the request
    pub view_data: &'a mut ViewDataDictionary,
}

impl<'a> PropertyLifetimeContext<'a> {
    /// Bundle the stores
    pub fn new(temp_data: &'a mut dyn TempDataStore, view_data: &'a mut ViewDataDictionary) -> Self {
        Self {
            temp_data,
            view_data,
        }
    }
}

/// Lifetime-tagged properties declared per controller type
#[derive(Debug, Clone, Default)]
pub struct PropertyLifetimeRegistry {
    types: IndexMap<String, Vec<LifetimeProperty>>,
}

impl PropertyLifetimeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the lifetime properties of a controller type
    pub fn with_type(
        mut self,
        type_name: impl Into<String>,
        properties: impl IntoIterator<Item = LifetimeProperty>,
    ) -> Self {
        self.types
            .entry(type_name.into())
            .or_default()
            .extend(properties);
        self
    }

    /// Properties declared for a type
    pub fn properties(&self, type_name: &str) -> &[LifetimeProperty] {
        self.types.get(type_name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// A manager for one request
    pub fn create_manager(self: &Arc<Self>) -> PropertyLifetimeManager {
        PropertyLifetimeManager::new(self.clone())
    }
}

#[derive(Debug, Clone)]
struct LifetimeItem {
    property: LifetimeProperty,
    original_value: Option<ModelValue>,
}

/// Restores and saves lifetime properties for one request
#[derive(Debug)]
pub struct PropertyLifetimeManager {
    registry: Arc<PropertyLifetimeRegistry>,
    tracked: HashMap<String, Vec<LifetimeItem>>,
    initial: bool,
}

impl PropertyLifetimeManager {
    /// Create a manager over declared properties
    pub fn new(registry: Arc<PropertyLifetimeRegistry>) -> Self {
        Self {
            registry,
            tracked: HashMap::new(),
            initial: true,
        }
    }

    /// Restore the lifetime properties of a controller
    ///
    /// The first initialization of a request consumes temp data; later ones
    /// only peek so the value survives for the next request.
    pub fn init(&mut self, instance: &mut ModelObject, context: &mut PropertyLifetimeContext<'_>) {
        let type_name = instance.type_name().to_string();
        let mut items = Vec::new();

        for property in self.registry.properties(&type_name) {
            let key = property.source.key(&property.name);
            let original_value = match property.source {
                LifetimeSource::TempData if self.initial => context.temp_data.get(&key),
                LifetimeSource::TempData => context.temp_data.peek(&key),
                LifetimeSource::ViewData => context.view_data.get(&key).cloned(),
            }
            .filter(|value| !value.is_null());

            if let Some(value) = &original_value {
                trace!("Restoring '{}' of '{type_name}' from '{key}'", property.name);
                instance.set(property.name.clone(), value.clone());
            }

            items.push(LifetimeItem {
                property: property.clone(),
                original_value,
            });
        }

        self.tracked.insert(type_name, items);
        self.initial = false;
    }

    /// Write back the lifetime properties that changed since [`init`]
    ///
    /// [`init`]: PropertyLifetimeManager::init
    pub fn save(&self, instance: &ModelObject, context: &mut PropertyLifetimeContext<'_>) {
        let Some(items) = self.tracked.get(instance.type_name()) else {
            warn!(
                "Lifetime properties of '{}' saved without being initialized",
                instance.type_name()
            );
            return;
        };

        for item in items {
            let current = instance.get(&item.property.name).cloned().unwrap_or(ModelValue::Null);
            let unchanged = match &item.original_value {
                Some(original) => *original == current,
                None => current.is_null(),
            };
            if unchanged {
                continue;
            }

            let key = item.property.source.key(&item.property.name);
            trace!("Saving changed property '{}' to '{key}'", item.property.name);
            match item.property.source {
                LifetimeSource::TempData => context.temp_data.set(&key, current),
                LifetimeSource::ViewData => context.view_data.set(key, current),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn registry() -> Arc<PropertyLifetimeRegistry> {
        Arc::new(PropertyLifetimeRegistry::new().with_type(
            "HomeController",
            [
                LifetimeProperty::temp_data("Message"),
                LifetimeProperty::view_data("Title"),
            ],
        ))
    }

    fn controller() -> ModelObject {
        let mut controller = ModelObject::new("HomeController");
        controller.set("Message", ModelValue::Null);
        controller.set("Title", ModelValue::Null);
        controller
    }

    #[test]
    fn test_init_restores_and_consumes_temp_data() {
        let mut temp_data =
            TempDataDictionary::from_values([("TempDataProperty-Message", ModelValue::from("saved"))]);
        let mut view_data = ViewDataDictionary::new();
        view_data.set("ViewDataProperty-Title", ModelValue::from("Home"));

        let mut manager = registry().create_manager();
        let mut instance = controller();
        manager.init(
            &mut instance,
            &mut PropertyLifetimeContext::new(&mut temp_data, &mut view_data),
        );

        assert_eq!(instance.get("Message"), Some(&ModelValue::from("saved")));
        assert_eq!(instance.get("Title"), Some(&ModelValue::from("Home")));
        assert!(temp_data.is_consumed("TempDataProperty-Message"));
    }

    #[test]
    fn test_later_init_only_peeks() {
        let mut temp_data =
            TempDataDictionary::from_values([("TempDataProperty-Message", ModelValue::from("saved"))]);
        let mut view_data = ViewDataDictionary::new();
        let mut manager = registry().create_manager();

        let mut other = ModelObject::new("OtherController");
        manager.init(
            &mut other,
            &mut PropertyLifetimeContext::new(&mut temp_data, &mut view_data),
        );
        let mut instance = controller();
        manager.init(
            &mut instance,
            &mut PropertyLifetimeContext::new(&mut temp_data, &mut view_data),
        );

        assert_eq!(instance.get("Message"), Some(&ModelValue::from("saved")));
        assert!(!temp_data.is_consumed("TempDataProperty-Message"));
    }

    #[test]
    fn test_save_writes_only_changed_values() {
        let mut temp_data =
            TempDataDictionary::from_values([("TempDataProperty-Message", ModelValue::from("saved"))]);
        let mut view_data = ViewDataDictionary::new();
        let mut manager = registry().create_manager();
        let mut instance = controller();
        manager.init(
            &mut instance,
            &mut PropertyLifetimeContext::new(&mut temp_data, &mut view_data),
        );

        instance.set("Title", ModelValue::from("Updated"));
        manager.save(
            &instance,
            &mut PropertyLifetimeContext::new(&mut temp_data, &mut view_data),
        );

        assert_eq!(
            view_data.get("ViewDataProperty-Title"),
            Some(&ModelValue::from("Updated"))
        );
        // Message kept its restored value, so the consumed entry is not re-added.
        assert!(temp_data.is_consumed("TempDataProperty-Message"));
        assert_eq!(temp_data.retained().count(), 0);
    }

    #[test]
    fn test_changed_temp_data_is_retained() {
        let mut temp_data = TempDataDictionary::new();
        let mut view_data = ViewDataDictionary::new();
        let mut manager = registry().create_manager();
        let mut instance = controller();
        manager.init(
            &mut instance,
            &mut PropertyLifetimeContext::new(&mut temp_data, &mut view_data),
        );

        instance.set("Message", ModelValue::from("Saved!"));
        manager.save(
            &instance,
            &mut PropertyLifetimeContext::new(&mut temp_data, &mut view_data),
        );

        let retained: Vec<(&String, &ModelValue)> = temp_data.retained().collect();
        assert_eq!(
            retained,
            vec![(&"TempDataProperty-Message".to_string(), &ModelValue::from("Saved!"))]
        );
        assert!(view_data.is_empty());
    }
}
