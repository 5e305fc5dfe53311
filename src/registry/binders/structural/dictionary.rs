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

//! Dictionary binding
//!
//! Entries are first looked for in the indexed pair form
//! `dict[0].Key=a&dict[0].Value=1`. When that yields nothing, the immediate
//! children of the prefix are treated as keys: `dict[a]=1&dict[b]=2`.

use async_trait::async_trait;
use log::{debug, trace};
use std::sync::Arc;

use super::{CollectionModelBinder, bind_child};
use crate::error::BindingResult;
use crate::model::{Culture, ModelMetadata, ModelType, ModelValue, TypeCoercion};
use crate::registry::{
    ModelBinder, ModelBinderProvider, ModelBinderProviderContext, ModelBindingContext,
    ModelBindingResult, ProviderOutcome,
};

/// Binds dictionaries from indexed pairs or keyed children
#[derive(Debug, Clone)]
pub struct DictionaryModelBinder {
    pairs: CollectionModelBinder,
    key_metadata: Arc<ModelMetadata>,
    value_metadata: Arc<ModelMetadata>,
    value_binder: Arc<dyn ModelBinder>,
}

impl DictionaryModelBinder {
    /// Create a binder from the pair binder and the key and value parts
    pub fn new(
        pairs: CollectionModelBinder,
        key_metadata: Arc<ModelMetadata>,
        value_metadata: Arc<ModelMetadata>,
        value_binder: Arc<dyn ModelBinder>,
    ) -> Self {
        Self {
            pairs,
            key_metadata,
            value_metadata,
            value_binder,
        }
    }

    async fn bind_keyed_entries(
        &self,
        context: &mut ModelBindingContext<'_>,
        entries: &mut Vec<(ModelValue, ModelValue)>,
    ) -> BindingResult<()> {
        let model_name = context.model_name().to_string();
        let field_name = context.field_name().to_string();
        let keys = context.value_provider().keys_from_prefix(&model_name);
        let allow_undefined = context.options().allow_binding_undefined_value_to_enum_type;

        for (key_text, full_key) in keys {
            let key = match TypeCoercion::convert(
                &key_text,
                &self.key_metadata,
                &Culture::invariant(),
                allow_undefined,
            ) {
                Ok(key) => key,
                Err(error) => {
                    trace!("Skipping dictionary key '{key_text}' of '{model_name}': {error}");
                    continue;
                }
            };

            let result = bind_child(
                context,
                self.value_metadata.clone(),
                &self.value_binder,
                &field_name,
                full_key,
            )
            .await?;

            if let Some(ModelBindingResult::Success(value)) = result {
                insert_entry(entries, key, value);
            }
        }

        Ok(())
    }
}

/// Later duplicates overwrite earlier entries in place
fn insert_entry(entries: &mut Vec<(ModelValue, ModelValue)>, key: ModelValue, value: ModelValue) {
    match entries.iter_mut().find(|(existing, _)| *existing == key) {
        Some(entry) => entry.1 = value,
        None => entries.push((key, value)),
    }
}

#[async_trait]
impl ModelBinder for DictionaryModelBinder {
    async fn bind_model(&self, context: &mut ModelBindingContext<'_>) -> BindingResult<()> {
        if !context.value_provider().contains_prefix(context.model_name()) {
            if context.is_top_level() {
                context.set_result(ModelBindingResult::Success(ModelValue::Dictionary(
                    Vec::new(),
                )));
            } else {
                debug!("Found no value for model '{}'", context.model_name());
            }
            return Ok(());
        }

        let mut entries = Vec::new();
        for pair in self.pairs.bind_elements(context).await? {
            if let ModelValue::Pair(key, value) = pair {
                if key.is_null() {
                    continue;
                }
                insert_entry(&mut entries, *key, *value);
            }
        }

        if entries.is_empty() {
            self.bind_keyed_entries(context, &mut entries).await?;
        }

        context.set_result(ModelBindingResult::Success(ModelValue::Dictionary(entries)));
        Ok(())
    }
}

/// Supplies [`DictionaryModelBinder`] for dictionaries
#[derive(Debug, Clone, Copy, Default)]
pub struct DictionaryModelBinderProvider;

impl ModelBinderProvider for DictionaryModelBinderProvider {
    fn get_binder(
        &self,
        context: &mut ModelBinderProviderContext<'_>,
    ) -> BindingResult<ProviderOutcome> {
        let model_type = context.metadata().model_type().clone();
        let ModelType::Dictionary(key_type, value_type) = model_type.underlying_or_model_type()
        else {
            return Ok(ProviderOutcome::Declined);
        };

        let pair_type = ModelType::KeyValuePair(key_type.clone(), value_type.clone());
        let (pair_metadata, pair_binder) = context.create_binder_for_type(&pair_type)?;
        let (value_metadata, value_binder) = context.create_binder_for_type(value_type)?;
        let key_metadata = context.metadata_provider().metadata_for_type(key_type)?;

        match (pair_binder, value_binder) {
            (Some(pair_binder), Some(value_binder)) => {
                Ok(ProviderOutcome::binder(DictionaryModelBinder::new(
                    CollectionModelBinder::new(pair_metadata, pair_binder),
                    key_metadata,
                    value_metadata,
                    value_binder,
                )))
            }
            _ => {
                debug!("No binder for the entries of '{model_type}'; dictionary stays unbound");
                Ok(ProviderOutcome::Declined)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComplexTypeDefinition, DefaultModelMetadataProvider, PropertyDefinition};
    use crate::registry::binders::test_support::Harness;
    use crate::request::RequestContext;
    use pretty_assertions::assert_eq;

    fn entries(pairs: &[(&str, i64)]) -> Option<ModelBindingResult> {
        Some(ModelBindingResult::Success(ModelValue::Dictionary(
            pairs
                .iter()
                .map(|(key, value)| (ModelValue::from(*key), ModelValue::Integer(*value)))
                .collect(),
        )))
    }

    #[tokio::test]
    async fn test_keyed_entries_in_discovery_order() {
        let harness = Harness::new(DefaultModelMetadataProvider::new());
        let request = RequestContext::builder()
            .query_string("dict[Key2]=2&dict[Key1]=1")
            .build();
        let bound = harness
            .bind(
                &request,
                ModelType::dictionary(ModelType::string(), ModelType::int32()),
                "dict",
            )
            .await;
        assert_eq!(bound.result, entries(&[("Key2", 2), ("Key1", 1)]));
    }

    #[tokio::test]
    async fn test_indexed_pairs_take_precedence() {
        let harness = Harness::new(DefaultModelMetadataProvider::new());
        let request = RequestContext::builder()
            .query_string("dict[0].Key=a&dict[0].Value=1&dict[1].Key=a&dict[1].Value=3")
            .build();
        let bound = harness
            .bind(
                &request,
                ModelType::dictionary(ModelType::string(), ModelType::int32()),
                "dict",
            )
            .await;
        assert_eq!(bound.result, entries(&[("a", 3)]));
    }

    #[tokio::test]
    async fn test_unconvertible_keys_are_excluded() {
        let harness = Harness::new(DefaultModelMetadataProvider::new());
        let request = RequestContext::builder()
            .query_string("dict[1]=10&dict[two]=20")
            .build();
        let bound = harness
            .bind(
                &request,
                ModelType::dictionary(ModelType::int32(), ModelType::int32()),
                "dict",
            )
            .await;
        assert_eq!(
            bound.result,
            Some(ModelBindingResult::Success(ModelValue::Dictionary(vec![(
                ModelValue::Integer(1),
                ModelValue::Integer(10)
            )])))
        );
        assert!(bound.model_state.is_valid());
    }

    #[tokio::test]
    async fn test_complex_values() {
        let harness = Harness::new(DefaultModelMetadataProvider::new().with_complex_type(
            ComplexTypeDefinition::new("Item").property(PropertyDefinition::new(
                "Count",
                ModelType::int32(),
            )),
        ));
        let request = RequestContext::builder()
            .query_string("dict[apples].Count=3")
            .build();
        let bound = harness
            .bind(
                &request,
                ModelType::dictionary(ModelType::string(), ModelType::complex("Item")),
                "dict",
            )
            .await;
        let model = bound.result.and_then(ModelBindingResult::into_model).unwrap();
        let entries = model.as_dictionary().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, ModelValue::from("apples"));
        assert_eq!(
            entries[0].1.as_object().and_then(|item| item.get("Count")),
            Some(&ModelValue::Integer(3))
        );
    }
}
