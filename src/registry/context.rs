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

//! Binding context threaded through a bind
//!
//! A top-level context is created per parameter. Composite binders derive a
//! nested context per element or property with
//! [`ModelBindingContext::enter_nested_scope`]; the nested context borrows the
//! parent's model state, so errors recorded by children land in the same
//! dictionary and the parent is inaccessible until the child is dropped.

use log::warn;
use std::sync::Arc;

use super::binder::ModelBindingResult;
use crate::config::BindingOptions;
use crate::error::{BindingError, BindingResult};
use crate::model::{BindingInfo, BindingSource, ModelMetadata};
use crate::request::RequestContext;
use crate::state::{ModelError, ModelStateDictionary, ValidationStateDictionary};
use crate::value_provider::{ValueProvider, ValueProviderResult, filter_value_provider};

/// Mutable state of one bind
pub struct ModelBindingContext<'a> {
    request: &'a RequestContext,
    options: &'a BindingOptions,
    original_value_provider: Arc<dyn ValueProvider>,
    value_provider: Arc<dyn ValueProvider>,
    model_state: &'a mut ModelStateDictionary,
    validation_state: &'a mut ValidationStateDictionary,
    metadata: Arc<ModelMetadata>,
    model_name: String,
    field_name: String,
    binder_model_name: Option<String>,
    binding_source: Option<BindingSource>,
    is_top_level: bool,
    depth: usize,
    result: Option<ModelBindingResult>,
}

impl<'a> ModelBindingContext<'a> {
    /// Create the context of a top-level bind
    ///
    /// The value provider is narrowed to the declared binding source when
    /// that source is not greedy.
    #[allow(clippy::too_many_arguments)]
    pub fn top_level(
        request: &'a RequestContext,
        options: &'a BindingOptions,
        value_provider: Arc<dyn ValueProvider>,
        model_state: &'a mut ModelStateDictionary,
        validation_state: &'a mut ValidationStateDictionary,
        metadata: Arc<ModelMetadata>,
        binding_info: &BindingInfo,
        field_name: impl Into<String>,
        model_name: impl Into<String>,
    ) -> Self {
        let binding_source = binding_info.binding_source.clone();
        let filtered = match &binding_source {
            Some(source) if !source.is_greedy() => filter_value_provider(&value_provider, source),
            _ => value_provider.clone(),
        };

        Self {
            request,
            options,
            original_value_provider: value_provider,
            value_provider: filtered,
            model_state,
            validation_state,
            metadata,
            model_name: model_name.into(),
            field_name: field_name.into(),
            binder_model_name: binding_info.binder_model_name.clone(),
            binding_source,
            is_top_level: true,
            depth: 0,
            result: None,
        }
    }

    /// Derive the context for an element or property
    ///
    /// Fails with [`BindingError::Cancelled`] when the request was aborted
    /// and with [`BindingError::RecursionDepthExceeded`] past the configured
    /// depth.
    pub fn enter_nested_scope(
        &mut self,
        metadata: Arc<ModelMetadata>,
        field_name: impl Into<String>,
        model_name: impl Into<String>,
    ) -> BindingResult<ModelBindingContext<'_>> {
        if self.request.cancellation_token().is_cancelled() {
            return Err(BindingError::Cancelled);
        }

        let model_name = model_name.into();
        let depth = self.depth + 1;
        if depth > self.options.max_model_binding_recursion_depth {
            return Err(BindingError::RecursionDepthExceeded {
                model_name,
                max_depth: self.options.max_model_binding_recursion_depth,
            });
        }

        let binding_source = metadata.binding_source().cloned();
        let value_provider = match &binding_source {
            Some(source) if !source.is_greedy() => {
                filter_value_provider(&self.original_value_provider, source)
            }
            _ => self.value_provider.clone(),
        };

        Ok(ModelBindingContext {
            request: self.request,
            options: self.options,
            original_value_provider: self.original_value_provider.clone(),
            value_provider,
            model_state: &mut *self.model_state,
            validation_state: &mut *self.validation_state,
            binder_model_name: metadata.binder_model_name().map(str::to_string),
            metadata,
            model_name,
            field_name: field_name.into(),
            binding_source,
            is_top_level: false,
            depth,
            result: None,
        })
    }

    /// The request being bound
    pub fn request(&self) -> &'a RequestContext {
        self.request
    }

    /// Binding options
    pub fn options(&self) -> &BindingOptions {
        self.options
    }

    /// Values visible to this bind
    pub fn value_provider(&self) -> &Arc<dyn ValueProvider> {
        &self.value_provider
    }

    /// Replace the values visible to this bind
    pub fn set_value_provider(&mut self, value_provider: Arc<dyn ValueProvider>) {
        self.value_provider = value_provider;
    }

    /// Look up values for the current model name
    pub fn value(&self) -> ValueProviderResult {
        self.value_provider.get_value(&self.model_name)
    }

    /// Shared model state
    pub fn model_state(&mut self) -> &mut ModelStateDictionary {
        &mut *self.model_state
    }

    /// Shared validation state
    pub fn validation_state(&mut self) -> &mut ValidationStateDictionary {
        &mut *self.validation_state
    }

    /// Record an error against the current model name
    pub fn add_model_error(&mut self, error: ModelError) -> bool {
        let key = self.model_name.clone();
        self.model_state.try_add_model_error(&key, error)
    }

    /// Metadata of the model
    pub fn metadata(&self) -> &Arc<ModelMetadata> {
        &self.metadata
    }

    /// Dotted/indexed name of the model
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Name of the field; the binder model name or the property name
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Declared binder model name
    pub fn binder_model_name(&self) -> Option<&str> {
        self.binder_model_name.as_deref()
    }

    /// Declared binding source
    pub fn binding_source(&self) -> Option<&BindingSource> {
        self.binding_source.as_ref()
    }

    /// Whether this is the bind of a parameter rather than a child
    pub fn is_top_level(&self) -> bool {
        self.is_top_level
    }

    /// Nesting depth; zero at the top level
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Set the result; the first result set wins
    pub fn set_result(&mut self, result: ModelBindingResult) {
        if self.result.is_some() {
            warn!(
                "Ignoring second binding result for model '{}'",
                self.model_name
            );
            return;
        }
        self.result = Some(result);
    }

    /// The result, if set
    pub fn result(&self) -> Option<&ModelBindingResult> {
        self.result.as_ref()
    }

    /// Take the result, leaving the slot unset
    pub fn take_result(&mut self) -> Option<ModelBindingResult> {
        self.result.take()
    }

    /// The produced model, if the bind succeeded
    pub fn into_model(self) -> Option<crate::model::ModelValue> {
        self.result.and_then(ModelBindingResult::into_model)
    }
}
