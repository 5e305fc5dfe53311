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

//! Array and list binding
//!
//! Elements come either as repeated values of the model name
//! (`items=1&items=2`) or as indexed children (`items[0]`, `items[1]`).
//! Indexed children use explicit names listed under `items.index` when
//! present; otherwise indexes count up from zero until the value provider
//! has nothing under `items[i]`. Elements that do not bind are skipped.

use async_trait::async_trait;
use log::{debug, trace};
use std::sync::Arc;

use super::bind_child;
use crate::error::BindingResult;
use crate::model::{Culture, ModelMetadata, ModelType, ModelValue};
use crate::registry::{
    ModelBinder, ModelBinderProvider, ModelBinderProviderContext, ModelBindingContext,
    ModelBindingResult, ProviderOutcome,
};
use crate::value_provider::{
    CompositeValueProvider, ElementalValueProvider, ValueProvider, create_index_model_name,
    create_property_model_name,
};

/// Binds arrays and lists element by element
#[derive(Debug, Clone)]
pub struct CollectionModelBinder {
    element_metadata: Arc<ModelMetadata>,
    element_binder: Arc<dyn ModelBinder>,
}

impl CollectionModelBinder {
    /// Create a binder from the element metadata and binder
    pub fn new(element_metadata: Arc<ModelMetadata>, element_binder: Arc<dyn ModelBinder>) -> Self {
        Self {
            element_metadata,
            element_binder,
        }
    }

    /// Bind every element found under the current model name
    ///
    /// The caller checks that the value provider contains the model name.
    pub(crate) async fn bind_elements(
        &self,
        context: &mut ModelBindingContext<'_>,
    ) -> BindingResult<Vec<ModelValue>> {
        let value = context.value();
        if value.is_none() {
            self.bind_indexed_elements(context).await
        } else {
            let key = context.model_name().to_string();
            context.model_state().set_model_value(&key, value.values());
            let culture = value
                .culture()
                .cloned()
                .unwrap_or_else(|| context.request().culture().clone());
            self.bind_simple_elements(context, value.values(), culture)
                .await
        }
    }

    async fn bind_simple_elements(
        &self,
        context: &mut ModelBindingContext<'_>,
        values: &[String],
        culture: Culture,
    ) -> BindingResult<Vec<ModelValue>> {
        let model_name = context.model_name().to_string();
        let field_name = context.field_name().to_string();
        let mut elements = Vec::with_capacity(values.len());

        for raw in values {
            let mut child = context.enter_nested_scope(
                self.element_metadata.clone(),
                field_name.as_str(),
                model_name.as_str(),
            )?;
            let element_provider: Arc<dyn ValueProvider> =
                Arc::new(CompositeValueProvider::new(vec![
                    Arc::new(ElementalValueProvider::new(
                        model_name.as_str(),
                        raw.as_str(),
                        culture.clone(),
                    )),
                    child.value_provider().clone(),
                ]));
            child.set_value_provider(element_provider);

            self.element_binder.bind_model(&mut child).await?;
            if let Some(ModelBindingResult::Success(element)) = child.take_result() {
                elements.push(element);
            }
        }

        Ok(elements)
    }

    async fn bind_indexed_elements(
        &self,
        context: &mut ModelBindingContext<'_>,
    ) -> BindingResult<Vec<ModelValue>> {
        let model_name = context.model_name().to_string();
        let field_name = context.field_name().to_string();
        let explicit = context
            .value_provider()
            .get_value(&create_property_model_name(&model_name, "index"));

        let mut elements = Vec::new();

        if !explicit.is_none() {
            for index in explicit.values() {
                let element_name = create_index_model_name(&model_name, index);
                if let Some(element) = self
                    .bind_element(context, &field_name, element_name)
                    .await?
                {
                    elements.push(element);
                }
            }
            return Ok(elements);
        }

        for index in 0usize.. {
            let element_name = create_index_model_name(&model_name, index);
            if !context.value_provider().contains_prefix(&element_name) {
                trace!("Stopping at '{element_name}': no values under this prefix");
                break;
            }
            match self.bind_element(context, &field_name, element_name).await? {
                Some(element) => elements.push(element),
                None => debug!("Skipping element {index} of '{model_name}'"),
            }
        }

        Ok(elements)
    }

    async fn bind_element(
        &self,
        context: &mut ModelBindingContext<'_>,
        field_name: &str,
        element_name: String,
    ) -> BindingResult<Option<ModelValue>> {
        let result = bind_child(
            context,
            self.element_metadata.clone(),
            &self.element_binder,
            field_name,
            element_name,
        )
        .await?;
        Ok(result.and_then(ModelBindingResult::into_model))
    }
}

#[async_trait]
impl ModelBinder for CollectionModelBinder {
    async fn bind_model(&self, context: &mut ModelBindingContext<'_>) -> BindingResult<()> {
        if !context.value_provider().contains_prefix(context.model_name()) {
            if context.is_top_level() {
                context.set_result(ModelBindingResult::Success(ModelValue::List(Vec::new())));
            } else {
                debug!("Found no value for model '{}'", context.model_name());
            }
            return Ok(());
        }

        let elements = self.bind_elements(context).await?;
        context.set_result(ModelBindingResult::Success(ModelValue::List(elements)));
        Ok(())
    }
}

fn create_collection_binder(
    context: &mut ModelBinderProviderContext<'_>,
    element_type: &ModelType,
) -> BindingResult<ProviderOutcome> {
    let (element_metadata, element_binder) = context.create_binder_for_type(element_type)?;
    match element_binder {
        Some(element_binder) => Ok(ProviderOutcome::binder(CollectionModelBinder::new(
            element_metadata,
            element_binder,
        ))),
        None => {
            debug!("No binder for element type '{element_type}'; collection stays unbound");
            Ok(ProviderOutcome::Declined)
        }
    }
}

/// Supplies [`CollectionModelBinder`] for arrays other than `byte[]`
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayModelBinderProvider;

impl ModelBinderProvider for ArrayModelBinderProvider {
    fn get_binder(
        &self,
        context: &mut ModelBinderProviderContext<'_>,
    ) -> BindingResult<ProviderOutcome> {
        let model_type = context.metadata().model_type().clone();
        match model_type.underlying_or_model_type() {
            ModelType::Array(element) if !model_type.is_byte_array() => {
                create_collection_binder(context, element)
            }
            _ => Ok(ProviderOutcome::Declined),
        }
    }
}

/// Supplies [`CollectionModelBinder`] for lists
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionModelBinderProvider;

impl ModelBinderProvider for CollectionModelBinderProvider {
    fn get_binder(
        &self,
        context: &mut ModelBinderProviderContext<'_>,
    ) -> BindingResult<ProviderOutcome> {
        let model_type = context.metadata().model_type().clone();
        match model_type.underlying_or_model_type() {
            ModelType::List(element) => create_collection_binder(context, element),
            _ => Ok(ProviderOutcome::Declined),
        }
    }
}
