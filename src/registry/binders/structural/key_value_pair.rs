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

//! Key/value pair binder

use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

use super::bind_child;
use crate::error::BindingResult;
use crate::model::{ModelMetadata, ModelType, ModelValue};
use crate::registry::{
    ModelBinder, ModelBinderProvider, ModelBinderProviderContext, ModelBindingContext,
    ModelBindingResult, ProviderOutcome,
};
use crate::state::ModelError;
use crate::value_provider::create_property_model_name;

#[derive(Debug, Clone)]
struct PairPart {
    name: &'static str,
    metadata: Arc<ModelMetadata>,
    binder: Arc<dyn ModelBinder>,
}

/// Binds `Key` and `Value` under the model name
#[derive(Debug, Clone)]
pub struct KeyValuePairModelBinder {
    key: PairPart,
    value: PairPart,
}

impl KeyValuePairModelBinder {
    /// Create a binder from the key and value parts
    pub fn new(
        key_metadata: Arc<ModelMetadata>,
        key_binder: Arc<dyn ModelBinder>,
        value_metadata: Arc<ModelMetadata>,
        value_binder: Arc<dyn ModelBinder>,
    ) -> Self {
        Self {
            key: PairPart {
                name: "Key",
                metadata: key_metadata,
                binder: key_binder,
            },
            value: PairPart {
                name: "Value",
                metadata: value_metadata,
                binder: value_binder,
            },
        }
    }

    async fn bind_part(
        context: &mut ModelBindingContext<'_>,
        part: &PairPart,
    ) -> BindingResult<(String, Option<ModelValue>)> {
        let model_name = create_property_model_name(context.model_name(), part.name);
        let result = bind_child(
            context,
            part.metadata.clone(),
            &part.binder,
            part.name,
            model_name.clone(),
        )
        .await?;
        Ok((model_name, result.and_then(ModelBindingResult::into_model)))
    }
}

#[async_trait]
impl ModelBinder for KeyValuePairModelBinder {
    async fn bind_model(&self, context: &mut ModelBindingContext<'_>) -> BindingResult<()> {
        let (key_name, key) = Self::bind_part(context, &self.key).await?;
        let (value_name, value) = Self::bind_part(context, &self.value).await?;

        let (key, value) = match (key, value) {
            (Some(key), Some(value)) => (key, value),
            (Some(key), None) => {
                context
                    .model_state()
                    .try_add_model_error(&value_name, ModelError::MissingKeyOrValue);
                (key, ModelValue::Null)
            }
            (None, Some(value)) => {
                context
                    .model_state()
                    .try_add_model_error(&key_name, ModelError::MissingKeyOrValue);
                (ModelValue::Null, value)
            }
            (None, None) => {
                debug!("Found no key or value for model '{}'", context.model_name());
                return Ok(());
            }
        };

        context.set_result(ModelBindingResult::Success(ModelValue::Pair(
            Box::new(key),
            Box::new(value),
        )));
        Ok(())
    }
}

/// Supplies [`KeyValuePairModelBinder`] for key/value pairs
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyValuePairModelBinderProvider;

impl ModelBinderProvider for KeyValuePairModelBinderProvider {
    fn get_binder(
        &self,
        context: &mut ModelBinderProviderContext<'_>,
    ) -> BindingResult<ProviderOutcome> {
        if !matches!(
            context.metadata().model_type().underlying_or_model_type(),
            ModelType::KeyValuePair(..)
        ) {
            return Ok(ProviderOutcome::Declined);
        }

        let properties = context
            .metadata_provider()
            .metadata_for_properties(context.metadata())?;
        let [key_metadata, value_metadata] = properties.as_slice() else {
            return Ok(ProviderOutcome::Declined);
        };
        let (key_metadata, value_metadata) = (key_metadata.clone(), value_metadata.clone());

        let key_binder = context.create_binder(key_metadata.clone())?;
        let value_binder = context.create_binder(value_metadata.clone())?;

        match (key_binder, value_binder) {
            (Some(key_binder), Some(value_binder)) => {
                Ok(ProviderOutcome::binder(KeyValuePairModelBinder::new(
                    key_metadata,
                    key_binder,
                    value_metadata,
                    value_binder,
                )))
            }
            _ => Ok(ProviderOutcome::Declined),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DefaultModelMetadataProvider;
    use crate::registry::binders::test_support::Harness;
    use crate::request::RequestContext;
    use pretty_assertions::assert_eq;

    fn pair_type() -> ModelType {
        ModelType::key_value_pair(ModelType::string(), ModelType::int32())
    }

    #[tokio::test]
    async fn test_binds_both_sides() {
        let harness = Harness::new(DefaultModelMetadataProvider::new());
        let request = RequestContext::builder()
            .query_string("pair.Key=a&pair.Value=1")
            .build();
        let bound = harness.bind(&request, pair_type(), "pair").await;
        assert_eq!(
            bound.result,
            Some(ModelBindingResult::Success(ModelValue::Pair(
                Box::new(ModelValue::from("a")),
                Box::new(ModelValue::Integer(1)),
            )))
        );
        assert!(bound.model_state.is_valid());
    }

    #[tokio::test]
    async fn test_missing_value_is_recorded() {
        let harness = Harness::new(DefaultModelMetadataProvider::new());
        let request = RequestContext::builder().query("pair.Key", "a").build();
        let bound = harness.bind(&request, pair_type(), "pair").await;
        assert_eq!(
            bound.result,
            Some(ModelBindingResult::Success(ModelValue::Pair(
                Box::new(ModelValue::from("a")),
                Box::new(ModelValue::Null),
            )))
        );
        assert_eq!(
            bound.model_state.errors_for("pair.Value"),
            &[ModelError::MissingKeyOrValue]
        );
    }

    #[tokio::test]
    async fn test_neither_side_leaves_result_unset() {
        let harness = Harness::new(DefaultModelMetadataProvider::new());
        let request = RequestContext::builder().query("other", "1").build();
        let bound = harness.bind(&request, pair_type(), "pair").await;
        assert_eq!(bound.result, None);
        assert!(bound.model_state.is_valid());
    }
}
