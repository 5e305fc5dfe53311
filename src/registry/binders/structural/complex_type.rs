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

//! Complex object binder
//!
//! A fresh instance is initialised with property defaults, then every
//! bindable property is bound at `ModelName.PropertyName` and successes are
//! assigned. A nested object is only created when the value provider has
//! data under its prefix or a property takes its value from a source other
//! than the value provider.

use async_trait::async_trait;
use log::{debug, trace};
use rust_decimal::Decimal;
use std::sync::Arc;

use super::bind_child;
use crate::error::{BindingError, BindingResult};
use crate::model::{
    EnumValue, FloatingPointType, ModelMetadata, ModelObject, ModelType, ModelValue, SimpleType,
};
use crate::registry::{
    ModelBinder, ModelBinderProvider, ModelBinderProviderContext, ModelBindingContext,
    ModelBindingResult, ProviderOutcome,
};
use crate::value_provider::create_property_model_name;

#[derive(Debug, Clone)]
struct PropertyBinder {
    metadata: Arc<ModelMetadata>,
    binder: Option<Arc<dyn ModelBinder>>,
}

impl PropertyBinder {
    fn is_bindable(&self) -> bool {
        self.binder.is_some() && self.metadata.is_binding_allowed() && !self.metadata.is_read_only()
    }

    fn name(&self) -> &str {
        self.metadata.name().unwrap_or_default()
    }

    fn field_name(&self) -> &str {
        self.metadata.binder_model_name().unwrap_or(self.name())
    }

    /// Whether the property is fed by something other than the value provider
    fn has_independent_source(&self) -> bool {
        self.metadata
            .binding_source()
            .is_some_and(|source| source.is_greedy() || !source.is_from_request())
    }
}

/// Binds the properties of a registered complex type
#[derive(Debug, Clone)]
pub struct ComplexTypeModelBinder {
    type_name: String,
    properties: Vec<PropertyBinder>,
}

impl ComplexTypeModelBinder {
    fn can_create_model(&self, context: &ModelBindingContext<'_>) -> bool {
        let greedy = context
            .binding_source()
            .is_some_and(|source| source.is_greedy());
        if !context.is_top_level() && greedy {
            return false;
        }
        if context.is_top_level() {
            return true;
        }
        if context.value_provider().contains_prefix(context.model_name()) {
            return true;
        }
        self.properties
            .iter()
            .any(|property| property.is_bindable() && property.has_independent_source())
    }

    fn create_model(&self) -> ModelObject {
        let mut object = ModelObject::new(self.type_name.clone());
        for property in &self.properties {
            let value = property
                .metadata
                .default_value()
                .cloned()
                .unwrap_or_else(|| default_value_for(&property.metadata));
            object.set(property.name(), value);
        }
        object
    }
}

/// The value a property holds before binding assigns it
fn default_value_for(metadata: &ModelMetadata) -> ModelValue {
    match metadata.model_type() {
        ModelType::Simple(SimpleType::Boolean) => ModelValue::Boolean(false),
        ModelType::Simple(SimpleType::Char) => ModelValue::Char('\0'),
        ModelType::Simple(
            SimpleType::Int8 | SimpleType::Int16 | SimpleType::Int32 | SimpleType::Int64,
        ) => ModelValue::Integer(0),
        ModelType::Simple(
            SimpleType::UInt8 | SimpleType::UInt16 | SimpleType::UInt32 | SimpleType::UInt64,
        ) => ModelValue::UnsignedInteger(0),
        ModelType::FloatingPoint(FloatingPointType::Float32 | FloatingPointType::Float64) => {
            ModelValue::Float(0.0)
        }
        ModelType::FloatingPoint(FloatingPointType::Decimal) => ModelValue::Decimal(Decimal::ZERO),
        ModelType::Enum(name) => ModelValue::Enum(EnumValue {
            enum_name: name.clone(),
            value: 0,
            name: metadata
                .enum_definition()
                .and_then(|definition| definition.name_of(0)),
        }),
        _ => ModelValue::Null,
    }
}

#[async_trait]
impl ModelBinder for ComplexTypeModelBinder {
    async fn bind_model(&self, context: &mut ModelBindingContext<'_>) -> BindingResult<()> {
        if !self.can_create_model(context) {
            debug!(
                "Not creating '{}' for model '{}': no values under its prefix",
                self.type_name,
                context.model_name()
            );
            return Ok(());
        }

        let mut model = self.create_model();
        let prefix = context.model_name().to_string();

        for property in &self.properties {
            let Some(binder) = property.binder.as_ref().filter(|_| property.is_bindable()) else {
                trace!("Skipping property '{}' of '{}'", property.name(), self.type_name);
                continue;
            };

            let field_name = property.field_name();
            let model_name = create_property_model_name(&prefix, field_name);
            let result = bind_child(
                context,
                property.metadata.clone(),
                binder,
                field_name,
                model_name,
            )
            .await?;

            if let Some(ModelBindingResult::Success(value)) = result {
                model.set(property.name(), value);
            }
        }

        context.set_result(ModelBindingResult::Success(ModelValue::Object(model)));
        Ok(())
    }
}

/// Supplies [`ComplexTypeModelBinder`] for complex types
///
/// A complex type without a default constructor is a configuration error.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplexTypeModelBinderProvider;

impl ModelBinderProvider for ComplexTypeModelBinderProvider {
    fn get_binder(
        &self,
        context: &mut ModelBinderProviderContext<'_>,
    ) -> BindingResult<ProviderOutcome> {
        let metadata = context.metadata().clone();
        if !metadata.is_complex_type()
            || metadata.is_collection_type()
            || !metadata.is_binding_allowed()
        {
            return Ok(ProviderOutcome::Declined);
        }

        let type_name = metadata.model_type().underlying_or_model_type().type_name();
        if !metadata.has_default_constructor() {
            return Err(BindingError::missing_default_constructor(type_name));
        }

        let property_metadata = context.metadata_provider().metadata_for_properties(&metadata)?;
        let mut properties = Vec::with_capacity(property_metadata.len());
        for property in property_metadata.iter() {
            let binder = if property.is_binding_allowed() && !property.is_read_only() {
                context.create_binder(property.clone())?
            } else {
                None
            };
            properties.push(PropertyBinder {
                metadata: property.clone(),
                binder,
            });
        }

        Ok(ProviderOutcome::binder(ComplexTypeModelBinder {
            type_name,
            properties,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComplexTypeDefinition, DefaultModelMetadataProvider, PropertyDefinition};
    use crate::registry::binders::test_support::Harness;
    use crate::request::RequestContext;
    use crate::state::ModelError;
    use pretty_assertions::assert_eq;

    fn person_provider() -> DefaultModelMetadataProvider {
        DefaultModelMetadataProvider::new()
            .with_complex_type(
                ComplexTypeDefinition::new("Person")
                    .property(PropertyDefinition::new("Name", ModelType::string()))
                    .property(PropertyDefinition::new("Age", ModelType::int32()))
                    .property(PropertyDefinition::new(
                        "Score",
                        ModelType::decimal(),
                    ))
                    .property(
                        PropertyDefinition::new("Id", ModelType::int32())
                            .read_only()
                            .default_value(ModelValue::Integer(7)),
                    )
                    .property(PropertyDefinition::new("Address", ModelType::complex("Address"))),
            )
            .with_complex_type(
                ComplexTypeDefinition::new("Address")
                    .property(PropertyDefinition::new("City", ModelType::string())),
            )
    }

    #[tokio::test]
    async fn test_partial_input_still_produces_instance() {
        let harness = Harness::new(person_provider());
        let request = RequestContext::builder()
            .query_string("person.Name=Ada&person.Age=abc&person.Id=99")
            .build();
        let bound = harness
            .bind(&request, ModelType::complex("Person"), "person")
            .await;

        let model = bound.result.and_then(ModelBindingResult::into_model).unwrap();
        let person = model.as_object().unwrap();
        assert_eq!(person.get("Name"), Some(&ModelValue::from("Ada")));
        assert_eq!(person.get("Age"), Some(&ModelValue::Integer(0)));
        assert_eq!(person.get("Score"), Some(&ModelValue::Decimal(Decimal::ZERO)));
        assert_eq!(person.get("Id"), Some(&ModelValue::Integer(7)));
        // No values under person.Address, so the nested object is not created.
        assert_eq!(person.get("Address"), Some(&ModelValue::Null));

        let keys: Vec<&str> = bound.model_state.keys_with_errors().collect();
        assert_eq!(keys, vec!["person.Age"]);
        assert_eq!(
            bound.model_state.errors_for("person.Age"),
            &[ModelError::AttemptedValueIsInvalid {
                attempted_value: "abc".into(),
                field: "Age".into(),
                target_type: "Int32".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_nested_object_created_with_prefix() {
        let harness = Harness::new(person_provider());
        let request = RequestContext::builder()
            .query("person.Address.City", "Paris")
            .build();
        let bound = harness
            .bind(&request, ModelType::complex("Person"), "person")
            .await;
        let model = bound.result.and_then(ModelBindingResult::into_model).unwrap();
        let city = model
            .as_object()
            .and_then(|person| person.get("Address"))
            .and_then(ModelValue::as_object)
            .and_then(|address| address.get("City"));
        assert_eq!(city, Some(&ModelValue::from("Paris")));
    }

    #[test]
    fn test_missing_default_constructor_is_configuration_error() {
        let harness = Harness::new(DefaultModelMetadataProvider::new().with_complex_type(
            ComplexTypeDefinition::new("Money").without_default_constructor(),
        ));
        let error = harness
            .resolve(&ModelType::complex("Money"))
            .expect_err("binder creation should fail");
        assert!(error.is_configuration_error());
        assert_eq!(error, BindingError::missing_default_constructor("Money"));
    }
}
