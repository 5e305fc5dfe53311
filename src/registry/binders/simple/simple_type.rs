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

//! Strings, booleans, integers, dates and URIs

use async_trait::async_trait;

use super::bind_single_value;
use crate::error::BindingResult;
use crate::model::{ModelType, SimpleType, TypeCoercion};
use crate::registry::{
    ModelBinder, ModelBinderProvider, ModelBinderProviderContext, ModelBindingContext,
    ProviderOutcome,
};

/// Converts the first raw value with the culture it was written in
#[derive(Debug, Clone, Copy)]
pub struct SimpleTypeModelBinder {
    target: SimpleType,
}

impl SimpleTypeModelBinder {
    /// Create a binder for a simple type
    pub fn new(target: SimpleType) -> Self {
        Self { target }
    }
}

#[async_trait]
impl ModelBinder for SimpleTypeModelBinder {
    async fn bind_model(&self, context: &mut ModelBindingContext<'_>) -> BindingResult<()> {
        let target = self.target;
        bind_single_value(context, |text, culture| {
            TypeCoercion::convert_simple(text, target, culture)
        });
        Ok(())
    }
}

/// Supplies [`SimpleTypeModelBinder`] for simple types and their nullable forms
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleTypeModelBinderProvider;

impl ModelBinderProvider for SimpleTypeModelBinderProvider {
    fn get_binder(
        &self,
        context: &mut ModelBinderProviderContext<'_>,
    ) -> BindingResult<ProviderOutcome> {
        match context.metadata().model_type().underlying_or_model_type() {
            ModelType::Simple(target) => Ok(ProviderOutcome::binder(SimpleTypeModelBinder::new(
                *target,
            ))),
            _ => Ok(ProviderOutcome::Declined),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BindingOptions;
    use crate::model::{Culture, ModelMetadata, ModelValue};
    use crate::registry::ModelBindingResult;
    use crate::registry::binders::test_support::bind_with;
    use crate::request::RequestContext;
    use crate::state::ModelError;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::sync::Arc;

    #[rstest]
    #[case(SimpleType::Int32, "42", ModelValue::Integer(42))]
    #[case(SimpleType::Boolean, "True", ModelValue::Boolean(true))]
    #[case(SimpleType::String, "hello", ModelValue::String("hello".into()))]
    #[case(SimpleType::UInt8, "255", ModelValue::UnsignedInteger(255))]
    #[tokio::test]
    async fn test_binds_valid_values(
        #[case] target: SimpleType,
        #[case] raw: &str,
        #[case] expected: ModelValue,
    ) {
        let request = RequestContext::builder().query("value", raw).build();
        let bound = bind_with(
            &SimpleTypeModelBinder::new(target),
            &request,
            &BindingOptions::default(),
            Arc::new(ModelMetadata::for_type(ModelType::Simple(target))),
            "value",
        )
        .await;

        assert_eq!(bound.result, Some(ModelBindingResult::Success(expected)));
        assert!(bound.model_state.is_valid());
        assert_eq!(bound.model_state.attempted_value("value"), Some(raw));
    }

    #[tokio::test]
    async fn test_missing_and_blank_values_leave_result_unset() {
        let request = RequestContext::builder().query("blank", "  ").build();
        for name in ["missing", "blank"] {
            let bound = bind_with(
                &SimpleTypeModelBinder::new(SimpleType::Int32),
                &request,
                &BindingOptions::default(),
                Arc::new(ModelMetadata::for_type(ModelType::int32())),
                name,
            )
            .await;
            assert_eq!(bound.result, None);
            assert!(bound.model_state.is_valid());
        }
    }

    #[tokio::test]
    async fn test_malformed_value_records_error() {
        let request = RequestContext::builder().query("age", "abc").build();
        let bound = bind_with(
            &SimpleTypeModelBinder::new(SimpleType::Int32),
            &request,
            &BindingOptions::default(),
            Arc::new(ModelMetadata::for_type(ModelType::int32())),
            "age",
        )
        .await;

        assert_eq!(bound.result, None);
        assert_eq!(
            bound.model_state.errors_for("age"),
            &[ModelError::NonPropertyAttemptedValueIsInvalid {
                attempted_value: "abc".into(),
                target_type: "Int32".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_query_values_use_invariant_culture() {
        let request = RequestContext::builder()
            .query("when", "2024-03-01")
            .culture(Culture::from_name("de-DE").unwrap())
            .build();
        let bound = bind_with(
            &SimpleTypeModelBinder::new(SimpleType::Date),
            &request,
            &BindingOptions::default(),
            Arc::new(ModelMetadata::for_type(ModelType::Simple(SimpleType::Date))),
            "when",
        )
        .await;
        assert_eq!(
            bound.result.and_then(ModelBindingResult::into_model),
            Some(ModelValue::Date(
                chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
            ))
        );
    }
}
