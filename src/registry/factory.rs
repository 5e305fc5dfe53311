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

//! Binder resolution
//!
//! The factory walks the provider chain for a piece of metadata and caches
//! the winner per (metadata identity, binding info). Resolving a
//! self-referential type revisits metadata that is still being resolved;
//! such a revisit receives a [`PlaceholderBinder`] that is pointed at the
//! real binder once the outer resolution finishes.

use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, trace, warn};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use super::binder::ModelBinder;
use super::context::ModelBindingContext;
use super::provider::{ModelBinderProvider, ModelBinderProviderContext, ProviderOutcome};
use crate::config::BindingOptions;
use crate::error::BindingResult;
use crate::model::{BindingInfo, ModelMetadata, ModelMetadataIdentity, ModelMetadataProvider};

type BinderCacheKey = (ModelMetadataIdentity, BindingInfo);

/// Stand-in for a binder whose resolution is still in progress
pub struct PlaceholderBinder {
    inner: OnceLock<Weak<dyn ModelBinder>>,
}

impl PlaceholderBinder {
    fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    fn resolve(&self, binder: &Arc<dyn ModelBinder>) {
        if self.inner.set(Arc::downgrade(binder)).is_err() {
            warn!("Placeholder binder was resolved twice");
        }
    }
}

impl fmt::Debug for PlaceholderBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaceholderBinder")
            .field("resolved", &self.inner.get().is_some())
            .finish()
    }
}

#[async_trait]
impl ModelBinder for PlaceholderBinder {
    async fn bind_model(&self, context: &mut ModelBindingContext<'_>) -> BindingResult<()> {
        match self.inner.get().and_then(Weak::upgrade) {
            Some(binder) => binder.bind_model(context).await,
            None => {
                warn!(
                    "Binder for model '{}' is no longer available",
                    context.model_name()
                );
                Ok(())
            }
        }
    }
}

enum ScopeEntry {
    InProgress(Option<Arc<PlaceholderBinder>>),
    Resolved(Option<Arc<dyn ModelBinder>>),
}

/// Bookkeeping of one top-level resolution
#[derive(Default)]
pub struct ResolutionScope {
    entries: HashMap<BinderCacheKey, ScopeEntry>,
}

/// Resolves binders through the ordered provider chain
pub struct ModelBinderFactory {
    providers: Vec<Arc<dyn ModelBinderProvider>>,
    metadata_provider: Arc<dyn ModelMetadataProvider>,
    options: Arc<BindingOptions>,
    cache: DashMap<BinderCacheKey, Option<Arc<dyn ModelBinder>>>,
}

impl ModelBinderFactory {
    /// Create a factory over providers in priority order
    pub fn new(
        providers: Vec<Arc<dyn ModelBinderProvider>>,
        metadata_provider: Arc<dyn ModelMetadataProvider>,
        options: Arc<BindingOptions>,
    ) -> Self {
        Self {
            providers,
            metadata_provider,
            options,
            cache: DashMap::new(),
        }
    }

    /// Providers in priority order
    pub fn providers(&self) -> &[Arc<dyn ModelBinderProvider>] {
        &self.providers
    }

    /// Metadata provider
    pub fn metadata_provider(&self) -> &dyn ModelMetadataProvider {
        self.metadata_provider.as_ref()
    }

    /// Binding options
    pub fn options(&self) -> &BindingOptions {
        &self.options
    }

    /// Number of cached resolutions
    pub fn cached_binder_count(&self) -> usize {
        self.cache.len()
    }

    /// Resolve the binder for metadata; `None` when no provider accepts it
    pub fn create_binder(
        &self,
        metadata: Arc<ModelMetadata>,
        binding_info: BindingInfo,
    ) -> BindingResult<Option<Arc<dyn ModelBinder>>> {
        let key = (metadata.identity().clone(), binding_info.clone());
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached.value().clone());
        }

        let mut scope = ResolutionScope::default();
        let binder = self.create_binder_in_scope(&mut scope, metadata, binding_info)?;

        // Every binder of the graph is kept alive by the cache; placeholders
        // only hold weak references.
        for (key, entry) in scope.entries {
            if let ScopeEntry::Resolved(resolved) = entry {
                self.cache.entry(key).or_insert(resolved);
            }
        }

        Ok(binder)
    }

    pub(crate) fn create_binder_in_scope(
        &self,
        scope: &mut ResolutionScope,
        metadata: Arc<ModelMetadata>,
        binding_info: BindingInfo,
    ) -> BindingResult<Option<Arc<dyn ModelBinder>>> {
        let key = (metadata.identity().clone(), binding_info.clone());

        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached.value().clone());
        }

        match scope.entries.get_mut(&key) {
            Some(ScopeEntry::Resolved(resolved)) => return Ok(resolved.clone()),
            Some(ScopeEntry::InProgress(placeholder)) => {
                trace!(
                    "Using placeholder binder for recursive model type '{}'",
                    metadata.model_type()
                );
                let placeholder = placeholder.get_or_insert_with(|| Arc::new(PlaceholderBinder::new()));
                let binder: Arc<dyn ModelBinder> = placeholder.clone();
                return Ok(Some(binder));
            }
            None => {}
        }

        scope
            .entries
            .insert(key.clone(), ScopeEntry::InProgress(None));

        let mut resolved = None;
        {
            let mut context =
                ModelBinderProviderContext::new(self, scope, metadata.clone(), binding_info);
            for provider in &self.providers {
                if let ProviderOutcome::Binder(binder) = provider.get_binder(&mut context)? {
                    trace!(
                        "Provider {provider:?} supplied a binder for '{}'",
                        metadata.model_type()
                    );
                    resolved = Some(binder);
                    break;
                }
            }
        }

        if resolved.is_none() {
            debug!(
                "Could not create a binder for model type '{}'",
                metadata.model_type()
            );
        }

        let previous = scope
            .entries
            .insert(key, ScopeEntry::Resolved(resolved.clone()));
        if let (Some(ScopeEntry::InProgress(Some(placeholder))), Some(binder)) =
            (previous, &resolved)
        {
            placeholder.resolve(binder);
        }

        Ok(resolved)
    }
}

impl fmt::Debug for ModelBinderFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelBinderFactory")
            .field("providers", &self.providers)
            .field("cached_binders", &self.cache.len())
            .finish()
    }
}
