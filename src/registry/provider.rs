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

//! Binder provider strategy

use std::fmt;
use std::sync::Arc;

use super::binder::ModelBinder;
use super::factory::{ModelBinderFactory, ResolutionScope};
use crate::config::BindingOptions;
use crate::error::BindingResult;
use crate::model::{BindingInfo, BindingSource, ModelMetadata, ModelMetadataProvider, ModelType};

/// Answer of a provider asked for a binder
#[derive(Debug, Clone)]
pub enum ProviderOutcome {
    /// The provider handles the model with this binder
    Binder(Arc<dyn ModelBinder>),
    /// The provider does not handle the model
    Declined,
}

impl ProviderOutcome {
    /// Wrap a binder
    pub fn binder(binder: impl ModelBinder + 'static) -> Self {
        Self::Binder(Arc::new(binder))
    }
}

/// A strategy that may supply a binder for some metadata
///
/// Providers are consulted in registration order and the first binder
/// returned wins. Returning `Err` signals a configuration defect.
pub trait ModelBinderProvider: Send + Sync + fmt::Debug {
    /// Offer a binder for the metadata in the context
    fn get_binder(&self, context: &mut ModelBinderProviderContext<'_>)
    -> BindingResult<ProviderOutcome>;
}

/// What a provider sees while a binder is resolved
pub struct ModelBinderProviderContext<'a> {
    factory: &'a ModelBinderFactory,
    scope: &'a mut ResolutionScope,
    metadata: Arc<ModelMetadata>,
    binding_info: BindingInfo,
}

impl<'a> ModelBinderProviderContext<'a> {
    pub(crate) fn new(
        factory: &'a ModelBinderFactory,
        scope: &'a mut ResolutionScope,
        metadata: Arc<ModelMetadata>,
        binding_info: BindingInfo,
    ) -> Self {
        Self {
            factory,
            scope,
            metadata,
            binding_info,
        }
    }

    /// Metadata of the model
    pub fn metadata(&self) -> &Arc<ModelMetadata> {
        &self.metadata
    }

    /// Binding configuration of the model
    pub fn binding_info(&self) -> &BindingInfo {
        &self.binding_info
    }

    /// Declared binding source
    pub fn binding_source(&self) -> Option<&BindingSource> {
        self.binding_info.binding_source.as_ref()
    }

    /// Binding options
    pub fn options(&self) -> &BindingOptions {
        self.factory.options()
    }

    /// Metadata provider
    pub fn metadata_provider(&self) -> &dyn ModelMetadataProvider {
        self.factory.metadata_provider()
    }

    /// Resolve the binder of child metadata, such as a property or element
    pub fn create_binder(
        &mut self,
        metadata: Arc<ModelMetadata>,
    ) -> BindingResult<Option<Arc<dyn ModelBinder>>> {
        let binding_info = BindingInfo::from_metadata(&metadata);
        self.factory
            .create_binder_in_scope(self.scope, metadata, binding_info)
    }

    /// Resolve the binder of a type
    pub fn create_binder_for_type(
        &mut self,
        model_type: &ModelType,
    ) -> BindingResult<(Arc<ModelMetadata>, Option<Arc<dyn ModelBinder>>)> {
        let metadata = self.metadata_provider().metadata_for_type(model_type)?;
        let binder = self.create_binder(metadata.clone())?;
        Ok((metadata, binder))
    }
}
