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

//! Binder-type override
//!
//! Metadata may nominate a binder by name. Names are looked up in a
//! [`BinderTypeRegistry`] when the binder is resolved, and the nominated
//! binder is activated for every bind with access to the request services.

use async_trait::async_trait;
use log::trace;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{BindingError, BindingResult};
use crate::registry::{
    ModelBinder, ModelBinderProvider, ModelBinderProviderContext, ModelBindingContext,
    ProviderOutcome,
};
use crate::services::ServiceProvider;

/// Creates a binder instance from the request services
pub type BinderActivator =
    Arc<dyn Fn(&dyn ServiceProvider) -> BindingResult<Arc<dyn ModelBinder>> + Send + Sync>;

/// Binders that metadata can nominate by name
#[derive(Clone, Default)]
pub struct BinderTypeRegistry {
    activators: Arc<RwLock<HashMap<String, BinderActivator>>>,
}

impl BinderTypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an activator under a binder name, replacing any previous one
    pub fn register<F>(&self, binder_type: impl Into<String>, activator: F) -> &Self
    where
        F: Fn(&dyn ServiceProvider) -> BindingResult<Arc<dyn ModelBinder>> + Send + Sync + 'static,
    {
        self.activators
            .write()
            .insert(binder_type.into(), Arc::new(activator));
        self
    }

    /// Register a shared binder instance that needs no services
    pub fn register_binder(
        &self,
        binder_type: impl Into<String>,
        binder: Arc<dyn ModelBinder>,
    ) -> &Self {
        self.register(binder_type, move |_| Ok(binder.clone()))
    }

    /// Whether a binder name is registered
    pub fn contains(&self, binder_type: &str) -> bool {
        self.activators.read().contains_key(binder_type)
    }

    fn activator(&self, binder_type: &str) -> Option<BinderActivator> {
        self.activators.read().get(binder_type).cloned()
    }
}

impl fmt::Debug for BinderTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let activators = self.activators.read();
        let mut names: Vec<&String> = activators.keys().collect();
        names.sort();
        f.debug_struct("BinderTypeRegistry")
            .field("binder_types", &names)
            .finish()
    }
}

/// Activates the nominated binder and delegates to it
#[derive(Clone)]
pub struct BinderTypeModelBinder {
    binder_type: String,
    activator: BinderActivator,
}

impl fmt::Debug for BinderTypeModelBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinderTypeModelBinder")
            .field("binder_type", &self.binder_type)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ModelBinder for BinderTypeModelBinder {
    async fn bind_model(&self, context: &mut ModelBindingContext<'_>) -> BindingResult<()> {
        trace!(
            "Activating binder '{}' for model '{}'",
            self.binder_type,
            context.model_name()
        );
        let binder = (self.activator)(context.request().services())?;
        binder.bind_model(context).await
    }
}

/// Supplies [`BinderTypeModelBinder`] when a binder name is nominated
#[derive(Debug, Clone, Default)]
pub struct BinderTypeModelBinderProvider {
    registry: BinderTypeRegistry,
}

impl BinderTypeModelBinderProvider {
    /// Create a provider over a registry
    pub fn new(registry: BinderTypeRegistry) -> Self {
        Self { registry }
    }
}

impl ModelBinderProvider for BinderTypeModelBinderProvider {
    fn get_binder(
        &self,
        context: &mut ModelBinderProviderContext<'_>,
    ) -> BindingResult<ProviderOutcome> {
        let Some(binder_type) = context.binding_info().binder_type.clone() else {
            return Ok(ProviderOutcome::Declined);
        };
        let activator = self
            .registry
            .activator(&binder_type)
            .ok_or_else(|| BindingError::unknown_binder_type(binder_type.clone()))?;
        Ok(ProviderOutcome::binder(BinderTypeModelBinder {
            binder_type,
            activator,
        }))
    }
}
