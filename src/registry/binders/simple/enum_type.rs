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

//! Enum binder

use async_trait::async_trait;
use std::sync::Arc;

use super::bind_single_value;
use crate::error::{BindingError, BindingResult};
use crate::model::{EnumDefinition, TypeCoercion};
use crate::registry::{
    ModelBinder, ModelBinderProvider, ModelBinderProviderContext, ModelBindingContext,
    ProviderOutcome,
};

/// Binds member names or underlying integers
#[derive(Debug, Clone)]
pub struct EnumTypeModelBinder {
    definition: Arc<EnumDefinition>,
    allow_undefined: bool,
}

impl EnumTypeModelBinder {
    /// Create a binder for an enum
    ///
    /// With `allow_undefined` an integer that names no member binds as-is.
    pub fn new(definition: Arc<EnumDefinition>, allow_undefined: bool) -> Self {
        Self {
            definition,
            allow_undefined,
        }
    }
}

#[async_trait]
impl ModelBinder for EnumTypeModelBinder {
    async fn bind_model(&self, context: &mut ModelBindingContext<'_>) -> BindingResult<()> {
        bind_single_value(context, |text, _culture| {
            TypeCoercion::convert_enum(text, &self.definition, self.allow_undefined)
        });
        Ok(())
    }
}

/// Supplies [`EnumTypeModelBinder`] for enum metadata
#[derive(Debug, Clone, Copy, Default)]
pub struct EnumTypeModelBinderProvider;

impl ModelBinderProvider for EnumTypeModelBinderProvider {
    fn get_binder(
        &self,
        context: &mut ModelBinderProviderContext<'_>,
    ) -> BindingResult<ProviderOutcome> {
        let metadata = context.metadata();
        if !metadata.is_enum() {
            return Ok(ProviderOutcome::Declined);
        }

        let definition = metadata
            .enum_definition()
            .cloned()
            .ok_or_else(|| BindingError::unknown_model_type(metadata.model_type().type_name()))?;
        let allow_undefined = context.options().allow_binding_undefined_value_to_enum_type;

        Ok(ProviderOutcome::binder(EnumTypeModelBinder::new(
            Arc::new(definition),
            allow_undefined,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BindingOptions;
    use crate::model::{
        DefaultModelMetadataProvider, EnumValue, ModelMetadataProvider, ModelType, ModelValue,
    };
    use crate::registry::ModelBindingResult;
    use crate::registry::binders::test_support::{Bound, bind_with};
    use crate::request::RequestContext;
    use crate::state::ModelError;
    use pretty_assertions::assert_eq;

    fn color() -> EnumDefinition {
        EnumDefinition::new("Color")
            .member("Red", 0)
            .member("Green", 1)
            .member("Blue", 2)
    }

    async fn bind(raw: &str, allow_undefined: bool) -> Bound {
        let metadata_provider = DefaultModelMetadataProvider::new().with_enum(color());
        let metadata = metadata_provider
            .metadata_for_type(&ModelType::enumeration("Color"))
            .unwrap();
        let request = RequestContext::builder().query("color", raw).build();
        bind_with(
            &EnumTypeModelBinder::new(Arc::new(color()), allow_undefined),
            &request,
            &BindingOptions::default(),
            metadata,
            "color",
        )
        .await
    }

    #[tokio::test]
    async fn test_binds_member_name_case_insensitively() {
        let bound = bind("green", false).await;
        assert_eq!(
            bound.result,
            Some(ModelBindingResult::Success(ModelValue::Enum(EnumValue {
                enum_name: "Color".into(),
                value: 1,
                name: Some("Green".into()),
            })))
        );
    }

    #[tokio::test]
    async fn test_undefined_value_strict() {
        let bound = bind("99", false).await;
        assert_eq!(bound.result, None);
        assert_eq!(
            bound.model_state.errors_for("color"),
            &[ModelError::UndefinedEnumValue {
                attempted_value: "99".into(),
                enum_name: "Color".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_undefined_value_permissive() {
        let bound = bind("99", true).await;
        assert_eq!(
            bound.result,
            Some(ModelBindingResult::Success(ModelValue::Enum(EnumValue {
                enum_name: "Color".into(),
                value: 99,
                name: None,
            })))
        );
        assert!(bound.model_state.is_valid());
    }
}
