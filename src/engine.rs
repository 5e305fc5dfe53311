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

//! Model binding engine - the main entry point for binding action parameters

use futures::future::try_join_all;
use indexmap::IndexMap;
use log::{debug, trace};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::config::BindingOptions;
use crate::error::{BindingError, BindingResult};
use crate::formatters::{InputFormatter, create_standard_input_formatters};
use crate::model::{
    BindingInfo, DefaultModelMetadataProvider, ModelMetadataProvider, ModelValue,
    ParameterDescriptor,
};
use crate::registry::{
    BinderTypeRegistry, ModelBinderFactory, ModelBinderProvider, ModelBindingContext,
    ModelBindingResult, create_standard_providers,
};
use crate::request::RequestContext;
use crate::state::{ModelStateDictionary, ValidationStateDictionary};
use crate::value_provider::{
    CompositeValueProvider, ValueProvider, ValueProviderFactory,
    create_standard_value_provider_factories, filter_value_provider,
};

/// Arguments bound for an action, with the state collected while binding
#[derive(Debug)]
pub struct BoundArguments {
    arguments: IndexMap<String, ModelValue>,
    model_state: ModelStateDictionary,
    validation_state: ValidationStateDictionary,
}

impl BoundArguments {
    /// The bound value of a parameter; absent when binding produced nothing
    pub fn get(&self, name: &str) -> Option<&ModelValue> {
        self.arguments.get(name)
    }

    /// Deserialize the bound value of a parameter into a Rust type
    pub fn get_typed<T: DeserializeOwned>(&self, name: &str) -> Option<Result<T, serde_json::Error>> {
        self.arguments
            .get(name)
            .map(|value| value.clone().into_typed())
    }

    /// Bound arguments in parameter order
    pub fn arguments(&self) -> &IndexMap<String, ModelValue> {
        &self.arguments
    }

    /// Whether no model errors were recorded
    pub fn is_valid(&self) -> bool {
        self.model_state.is_valid()
    }

    /// Errors and attempted values of every parameter
    pub fn model_state(&self) -> &ModelStateDictionary {
        &self.model_state
    }

    /// Models exempt from validation
    pub fn validation_state(&self) -> &ValidationStateDictionary {
        &self.validation_state
    }

    /// Split into arguments and model state
    pub fn into_parts(self) -> (IndexMap<String, ModelValue>, ModelStateDictionary) {
        (self.arguments, self.model_state)
    }
}

/// Binds action parameters from a request
///
/// Binder resolutions are cached across requests, so one engine should be
/// shared by every request of an application.
#[derive(Debug, Clone)]
pub struct ModelBindingEngine {
    factory: Arc<ModelBinderFactory>,
    value_provider_factories: Vec<Arc<dyn ValueProviderFactory>>,
    metadata_provider: Arc<dyn ModelMetadataProvider>,
    options: Arc<BindingOptions>,
}

impl Default for ModelBindingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelBindingEngine {
    /// Create an engine with the standard providers and default options
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start configuring an engine
    pub fn builder() -> ModelBindingEngineBuilder {
        ModelBindingEngineBuilder::default()
    }

    /// Binding options
    pub fn options(&self) -> &BindingOptions {
        &self.options
    }

    /// Binder factory
    pub fn factory(&self) -> &ModelBinderFactory {
        &self.factory
    }

    /// Metadata provider
    pub fn metadata_provider(&self) -> &dyn ModelMetadataProvider {
        self.metadata_provider.as_ref()
    }

    /// Build the composite value provider of a request
    ///
    /// Factories run in priority order; a factory without data for the
    /// request contributes nothing.
    pub async fn create_value_provider(
        &self,
        request: &RequestContext,
    ) -> BindingResult<Arc<dyn ValueProvider>> {
        let mut providers = Vec::with_capacity(self.value_provider_factories.len());
        for factory in &self.value_provider_factories {
            if request.cancellation_token().is_cancelled() {
                return Err(BindingError::Cancelled);
            }
            if let Some(provider) = factory.create_value_provider(request).await? {
                providers.push(provider);
            }
        }
        trace!("Created composite value provider with {} sources", providers.len());
        Ok(Arc::new(CompositeValueProvider::new(providers)))
    }

    /// Bind one parameter
    ///
    /// The model name is the declared binder model name, else the parameter
    /// name when the value provider has data under it, else the empty prefix.
    /// `Ok(None)` means no binder handles the parameter or the binder left the
    /// result unset.
    pub async fn bind_parameter(
        &self,
        request: &RequestContext,
        parameter: &ParameterDescriptor,
        value_provider: &Arc<dyn ValueProvider>,
        model_state: &mut ModelStateDictionary,
        validation_state: &mut ValidationStateDictionary,
    ) -> BindingResult<Option<ModelBindingResult>> {
        let metadata = self.metadata_provider.metadata_for_parameter(parameter)?;
        let binding_info = parameter
            .binding_info
            .clone()
            .merged_with(&BindingInfo::from_metadata(&metadata));

        let Some(binder) = self
            .factory
            .create_binder(metadata.clone(), binding_info.clone())?
        else {
            debug!(
                "Could not create a binder for parameter '{}' of type '{}'",
                parameter.name, parameter.model_type
            );
            return Ok(None);
        };

        let field_name = binding_info
            .binder_model_name
            .clone()
            .unwrap_or_else(|| parameter.name.clone());
        let model_name = match &binding_info.binder_model_name {
            Some(name) => name.clone(),
            None => {
                let visible = match &binding_info.binding_source {
                    Some(source) if !source.is_greedy() => {
                        filter_value_provider(value_provider, source)
                    }
                    _ => value_provider.clone(),
                };
                if visible.contains_prefix(&parameter.name) {
                    parameter.name.clone()
                } else {
                    trace!(
                        "No values under '{}'; binding parameter at the empty prefix",
                        parameter.name
                    );
                    String::new()
                }
            }
        };

        debug!(
            "Binding parameter '{}' of type '{}' at '{model_name}'",
            parameter.name, parameter.model_type
        );
        let mut context = ModelBindingContext::top_level(
            request,
            &self.options,
            value_provider.clone(),
            model_state,
            validation_state,
            metadata,
            &binding_info,
            field_name,
            model_name,
        );
        binder.bind_model(&mut context).await?;
        Ok(context.take_result())
    }

    /// Bind every parameter of an action
    ///
    /// Parameters are bound concurrently against one value provider; their
    /// model states are merged in parameter order. Parameters without a
    /// successful result are left out of the arguments.
    pub async fn bind_arguments(
        &self,
        request: &RequestContext,
        parameters: &[ParameterDescriptor],
    ) -> BindingResult<BoundArguments> {
        let value_provider = self.create_value_provider(request).await?;
        let max_errors = self.options.max_model_validation_errors;

        let bound = try_join_all(parameters.iter().map(|parameter| {
            let value_provider = &value_provider;
            async move {
                let mut model_state = ModelStateDictionary::with_max_errors(max_errors);
                let mut validation_state = ValidationStateDictionary::new();
                let result = self
                    .bind_parameter(
                        request,
                        parameter,
                        value_provider,
                        &mut model_state,
                        &mut validation_state,
                    )
                    .await?;
                Ok::<_, BindingError>((parameter, result, model_state, validation_state))
            }
        }))
        .await?;

        let mut arguments = IndexMap::with_capacity(parameters.len());
        let mut model_state = ModelStateDictionary::with_max_errors(max_errors);
        let mut validation_state = ValidationStateDictionary::new();
        for (parameter, result, parameter_state, parameter_validation) in bound {
            model_state.merge(parameter_state);
            validation_state.merge(parameter_validation);
            if let Some(ModelBindingResult::Success(model)) = result {
                arguments.insert(parameter.name.clone(), model);
            }
        }

        Ok(BoundArguments {
            arguments,
            model_state,
            validation_state,
        })
    }
}

/// Builder for [`ModelBindingEngine`]
#[derive(Default)]
pub struct ModelBindingEngineBuilder {
    metadata_provider: Option<Arc<dyn ModelMetadataProvider>>,
    options: Option<BindingOptions>,
    binder_types: Option<BinderTypeRegistry>,
    input_formatters: Option<Vec<Arc<dyn InputFormatter>>>,
    providers: Option<Vec<Arc<dyn ModelBinderProvider>>>,
    value_provider_factories: Option<Vec<Arc<dyn ValueProviderFactory>>>,
}

impl ModelBindingEngineBuilder {
    /// Use a metadata provider
    pub fn metadata_provider(mut self, metadata_provider: Arc<dyn ModelMetadataProvider>) -> Self {
        self.metadata_provider = Some(metadata_provider);
        self
    }

    /// Use binding options
    pub fn options(mut self, options: BindingOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Binders that metadata can nominate by name
    pub fn binder_types(mut self, binder_types: BinderTypeRegistry) -> Self {
        self.binder_types = Some(binder_types);
        self
    }

    /// Formatters used for body binding
    pub fn input_formatters(mut self, formatters: Vec<Arc<dyn InputFormatter>>) -> Self {
        self.input_formatters = Some(formatters);
        self
    }

    /// Replace the standard provider chain
    pub fn providers(mut self, providers: Vec<Arc<dyn ModelBinderProvider>>) -> Self {
        self.providers = Some(providers);
        self
    }

    /// Replace the standard value provider factories
    pub fn value_provider_factories(mut self, factories: Vec<Arc<dyn ValueProviderFactory>>) -> Self {
        self.value_provider_factories = Some(factories);
        self
    }

    /// Build the engine
    pub fn build(self) -> ModelBindingEngine {
        let metadata_provider = self
            .metadata_provider
            .unwrap_or_else(|| Arc::new(DefaultModelMetadataProvider::new()));
        let options = Arc::new(self.options.unwrap_or_default());
        let providers = self.providers.unwrap_or_else(|| {
            create_standard_providers(
                self.binder_types.unwrap_or_default(),
                self.input_formatters
                    .unwrap_or_else(create_standard_input_formatters),
            )
        });

        ModelBindingEngine {
            factory: Arc::new(ModelBinderFactory::new(
                providers,
                metadata_provider.clone(),
                options.clone(),
            )),
            value_provider_factories: self
                .value_provider_factories
                .unwrap_or_else(create_standard_value_provider_factories),
            metadata_provider,
            options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BindingSource, ComplexTypeDefinition, ModelType, PropertyDefinition};
    use crate::state::ModelError;
    use pretty_assertions::assert_eq;
    use tokio_util::sync::CancellationToken;

    fn engine() -> ModelBindingEngine {
        ModelBindingEngine::builder()
            .metadata_provider(Arc::new(
                DefaultModelMetadataProvider::new().with_complex_type(
                    ComplexTypeDefinition::new("Filter")
                        .property(PropertyDefinition::new("Page", ModelType::int32()))
                        .property(PropertyDefinition::new("Term", ModelType::string())),
                ),
            ))
            .build()
    }

    #[tokio::test]
    async fn test_parameter_name_prefix_and_empty_prefix_fallback() {
        let engine = engine();
        let prefixed = RequestContext::builder()
            .query_string("filter.Page=2&filter.Term=rust")
            .build();
        let bare = RequestContext::builder()
            .query_string("Page=3&Term=async")
            .build();
        let parameters = [ParameterDescriptor::new("filter", ModelType::complex("Filter"))];

        for (request, page) in [(prefixed, 2), (bare, 3)] {
            let bound = engine.bind_arguments(&request, &parameters).await.unwrap();
            let filter = bound.get("filter").and_then(ModelValue::as_object).unwrap();
            assert_eq!(filter.get("Page"), Some(&ModelValue::Integer(page)));
        }
    }

    #[tokio::test]
    async fn test_arguments_and_merged_errors() {
        let engine = engine();
        let request = RequestContext::builder()
            .query_string("id=abc&name=Ada")
            .route_value("version", "2")
            .build();
        let parameters = [
            ParameterDescriptor::new("id", ModelType::int32()),
            ParameterDescriptor::new("name", ModelType::string()),
            ParameterDescriptor::new("version", ModelType::int64()).with_binding_info(
                BindingInfo::default().with_source(BindingSource::Path),
            ),
            ParameterDescriptor::new("missing", ModelType::int32()),
        ];

        let bound = engine.bind_arguments(&request, &parameters).await.unwrap();
        let names: Vec<&str> = bound.arguments().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["name", "version"]);
        assert_eq!(bound.get_typed::<String>("name").unwrap().unwrap(), "Ada");
        assert_eq!(bound.get("version"), Some(&ModelValue::Integer(2)));
        assert!(!bound.is_valid());
        assert_eq!(
            bound.model_state().errors_for("id"),
            &[ModelError::NonPropertyAttemptedValueIsInvalid {
                attempted_value: "abc".into(),
                target_type: "Int32".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_cancelled_request() {
        let token = CancellationToken::new();
        token.cancel();
        let request = RequestContext::builder()
            .query("id", "1")
            .cancellation_token(token)
            .build();
        let result = engine()
            .bind_arguments(&request, &[ParameterDescriptor::new("id", ModelType::int32())])
            .await;
        assert_eq!(result.err(), Some(BindingError::Cancelled));
    }

    #[tokio::test]
    async fn test_binder_resolutions_are_cached() {
        let engine = engine();
        let request = RequestContext::builder().query("id", "1").build();
        let parameters = [ParameterDescriptor::new("id", ModelType::int32())];
        engine.bind_arguments(&request, &parameters).await.unwrap();
        let cached = engine.factory().cached_binder_count();
        engine.bind_arguments(&request, &parameters).await.unwrap();
        assert_eq!(engine.factory().cached_binder_count(), cached);
        assert!(cached > 0);
    }
}
