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

//! Built-in model binders and their providers
//!
//! Binders are organized by what they bind:
//! - `simple`: one raw value converted to a primitive
//! - `structural`: collections, dictionaries, pairs and complex objects
//! - `source`: request parts outside the value providers

pub mod simple;
pub mod source;
pub mod structural;

pub use simple::{
    ByteArrayModelBinder, ByteArrayModelBinderProvider, EnumTypeModelBinder,
    EnumTypeModelBinderProvider, FloatingPointModelBinder, FloatingPointModelBinderProvider,
    SimpleTypeModelBinder, SimpleTypeModelBinderProvider,
};
pub use source::{
    BinderActivator, BinderTypeModelBinder, BinderTypeModelBinderProvider, BinderTypeRegistry,
    BodyModelBinder, BodyModelBinderProvider, CancellationTokenModelBinder,
    CancellationTokenModelBinderProvider, FormCollectionModelBinder,
    FormCollectionModelBinderProvider, FormFileModelBinder, FormFileModelBinderProvider,
    FormFileShape, HeaderModelBinder, HeaderModelBinderProvider, ServicesModelBinder,
    ServicesModelBinderProvider,
};
pub use structural::{
    ArrayModelBinderProvider, CollectionModelBinder, CollectionModelBinderProvider,
    ComplexTypeModelBinder, ComplexTypeModelBinderProvider, DictionaryModelBinder,
    DictionaryModelBinderProvider, KeyValuePairModelBinder, KeyValuePairModelBinderProvider,
};

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use super::BinderTypeRegistry;
    use crate::config::BindingOptions;
    use crate::error::BindingResult;
    use crate::formatters::{InputFormatter, create_standard_input_formatters};
    use crate::model::{
        BindingInfo, DefaultModelMetadataProvider, ModelMetadata, ModelMetadataProvider,
        ModelType, ParameterDescriptor,
    };
    use crate::registry::{
        ModelBinder, ModelBinderFactory, ModelBindingContext, ModelBindingResult,
        create_standard_providers,
    };
    use crate::request::RequestContext;
    use crate::state::{ModelStateDictionary, ValidationStateDictionary};
    use crate::value_provider::{
        CompositeValueProvider, SourceValueProvider, ValueProvider,
        create_standard_value_provider_factories,
    };

    /// What a test bind left behind
    #[derive(Debug)]
    pub struct Bound {
        pub result: Option<ModelBindingResult>,
        pub model_state: ModelStateDictionary,
        pub validation_state: ValidationStateDictionary,
    }

    /// Run one binder against the query string of a request
    pub async fn bind_with(
        binder: &dyn ModelBinder,
        request: &RequestContext,
        options: &BindingOptions,
        metadata: Arc<ModelMetadata>,
        model_name: &str,
    ) -> Bound {
        let value_provider: Arc<dyn ValueProvider> = Arc::new(SourceValueProvider::query(request));
        let mut model_state = ModelStateDictionary::with_max_errors(options.max_model_validation_errors);
        let mut validation_state = ValidationStateDictionary::new();
        let binding_info = BindingInfo::from_metadata(&metadata);

        let result = {
            let mut context = ModelBindingContext::top_level(
                request,
                options,
                value_provider,
                &mut model_state,
                &mut validation_state,
                metadata,
                &binding_info,
                model_name,
                model_name,
            );
            binder.bind_model(&mut context).await.unwrap();
            context.take_result()
        };

        Bound {
            result,
            model_state,
            validation_state,
        }
    }

    /// Binds through the standard provider chain and value providers
    pub struct Harness {
        metadata_provider: Arc<DefaultModelMetadataProvider>,
        options: BindingOptions,
        binder_types: BinderTypeRegistry,
        formatters: Vec<Arc<dyn InputFormatter>>,
    }

    impl Harness {
        pub fn new(metadata_provider: DefaultModelMetadataProvider) -> Self {
            Self {
                metadata_provider: Arc::new(metadata_provider),
                options: BindingOptions::default(),
                binder_types: BinderTypeRegistry::new(),
                formatters: create_standard_input_formatters(),
            }
        }

        pub fn with_options(mut self, options: BindingOptions) -> Self {
            self.options = options;
            self
        }

        pub fn with_binder_types(mut self, binder_types: BinderTypeRegistry) -> Self {
            self.binder_types = binder_types;
            self
        }

        pub fn with_formatters(mut self, formatters: Vec<Arc<dyn InputFormatter>>) -> Self {
            self.formatters = formatters;
            self
        }

        fn factory(&self) -> ModelBinderFactory {
            ModelBinderFactory::new(
                create_standard_providers(self.binder_types.clone(), self.formatters.clone()),
                self.metadata_provider.clone(),
                Arc::new(self.options.clone()),
            )
        }

        /// Resolve the binder of a type
        pub fn resolve(
            &self,
            model_type: &ModelType,
        ) -> BindingResult<Option<Arc<dyn ModelBinder>>> {
            let metadata = self.metadata_provider.metadata_for_type(model_type)?;
            let binding_info = BindingInfo::from_metadata(&metadata);
            self.factory().create_binder(metadata, binding_info)
        }

        /// Resolve the binder of a parameter
        pub fn resolve_parameter(
            &self,
            parameter: &ParameterDescriptor,
        ) -> BindingResult<Option<Arc<dyn ModelBinder>>> {
            let (metadata, binding_info) = self.parameter_metadata(parameter)?;
            self.factory().create_binder(metadata, binding_info)
        }

        fn parameter_metadata(
            &self,
            parameter: &ParameterDescriptor,
        ) -> BindingResult<(Arc<ModelMetadata>, BindingInfo)> {
            let metadata = self.metadata_provider.metadata_for_parameter(parameter)?;
            let binding_info = parameter
                .binding_info
                .clone()
                .merged_with(&BindingInfo::from_metadata(&metadata));
            Ok((metadata, binding_info))
        }

        /// Bind a type at a model name
        pub async fn bind(
            &self,
            request: &RequestContext,
            model_type: ModelType,
            model_name: &str,
        ) -> Bound {
            let metadata = self.metadata_provider.metadata_for_type(&model_type).unwrap();
            let binding_info = BindingInfo::from_metadata(&metadata);
            self.run(request, metadata, binding_info, model_name, model_name)
                .await
                .unwrap()
        }

        /// Bind a parameter at a model name
        pub async fn bind_parameter(
            &self,
            request: &RequestContext,
            parameter: &ParameterDescriptor,
            model_name: &str,
        ) -> Bound {
            self.try_bind_parameter(request, parameter, model_name)
                .await
                .unwrap()
        }

        /// Bind a parameter, surfacing binding errors
        pub async fn try_bind_parameter(
            &self,
            request: &RequestContext,
            parameter: &ParameterDescriptor,
            model_name: &str,
        ) -> BindingResult<Bound> {
            let (metadata, binding_info) = self.parameter_metadata(parameter)?;
            let field_name = binding_info
                .binder_model_name
                .clone()
                .unwrap_or_else(|| parameter.name.clone());
            self.run(request, metadata, binding_info, &field_name, model_name)
                .await
        }

        async fn run(
            &self,
            request: &RequestContext,
            metadata: Arc<ModelMetadata>,
            binding_info: BindingInfo,
            field_name: &str,
            model_name: &str,
        ) -> BindingResult<Bound> {
            let binder = self
                .factory()
                .create_binder(metadata.clone(), binding_info.clone())?;

            let mut providers = Vec::new();
            for factory in create_standard_value_provider_factories() {
                if let Some(provider) = factory.create_value_provider(request).await? {
                    providers.push(provider);
                }
            }
            let value_provider: Arc<dyn ValueProvider> =
                Arc::new(CompositeValueProvider::new(providers));

            let mut model_state =
                ModelStateDictionary::with_max_errors(self.options.max_model_validation_errors);
            let mut validation_state = ValidationStateDictionary::new();

            let result = {
                let mut context = ModelBindingContext::top_level(
                    request,
                    &self.options,
                    value_provider,
                    &mut model_state,
                    &mut validation_state,
                    metadata,
                    &binding_info,
                    field_name,
                    model_name,
                );
                if let Some(binder) = binder {
                    binder.bind_model(&mut context).await?;
                }
                context.take_result()
            };

            Ok(Bound {
                result,
                model_state,
                validation_state,
            })
        }
    }
}
