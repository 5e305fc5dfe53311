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

//! Request body binder
//!
//! The body is read once and handed to the first input formatter accepting
//! the request media type. Formatter failures become model-state errors;
//! failures reading the body propagate.

use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

use crate::error::{BindingError, BindingResult};
use crate::formatters::InputFormatter;
use crate::model::{BindingSource, ModelValue};
use crate::registry::{
    ModelBinder, ModelBinderProvider, ModelBinderProviderContext, ModelBindingContext,
    ModelBindingResult, ProviderOutcome,
};
use crate::state::ModelError;

/// Reads the request body through the registered input formatters
#[derive(Debug, Clone)]
pub struct BodyModelBinder {
    formatters: Vec<Arc<dyn InputFormatter>>,
}

impl BodyModelBinder {
    /// Create a binder over the given formatters
    pub fn new(formatters: Vec<Arc<dyn InputFormatter>>) -> Self {
        Self { formatters }
    }

    fn model_state_key(context: &ModelBindingContext<'_>) -> String {
        if context.is_top_level() {
            context.binder_model_name().unwrap_or_default().to_string()
        } else {
            context.model_name().to_string()
        }
    }
}

#[async_trait]
impl ModelBinder for BodyModelBinder {
    async fn bind_model(&self, context: &mut ModelBindingContext<'_>) -> BindingResult<()> {
        let request = context.request();
        let key = Self::model_state_key(context);
        let media_type = request.media_type();

        let Some(formatter) = self
            .formatters
            .iter()
            .find(|formatter| formatter.can_read(media_type.as_deref()))
        else {
            debug!("No input formatter accepts content type {media_type:?}");
            let content_type = request.content_type().unwrap_or_default().to_string();
            context
                .model_state()
                .try_add_model_error(&key, ModelError::UnsupportedContentType { content_type });
            context.set_result(ModelBindingResult::Failed);
            return Ok(());
        };

        let body = request.read_body().await?;
        if body.is_empty() {
            if context.options().allow_empty_input_in_body_model_binding {
                context.set_result(ModelBindingResult::Success(ModelValue::Null));
            } else {
                context
                    .model_state()
                    .try_add_model_error(&key, ModelError::MissingRequestBody);
                context.set_result(ModelBindingResult::Failed);
            }
            return Ok(());
        }

        match formatter.read(body, context.metadata()) {
            Ok(model) => context.set_result(ModelBindingResult::Success(model)),
            Err(error) => {
                debug!("Input formatter {formatter:?} rejected the body: {error}");
                context.model_state().try_add_model_error(
                    &key,
                    ModelError::InvalidInput {
                        detail: error.to_string(),
                    },
                );
                context.set_result(ModelBindingResult::Failed);
            }
        }
        Ok(())
    }
}

/// Supplies [`BodyModelBinder`] for the body binding source
#[derive(Debug, Clone, Default)]
pub struct BodyModelBinderProvider {
    formatters: Vec<Arc<dyn InputFormatter>>,
}

impl BodyModelBinderProvider {
    /// Create a provider over the given formatters
    pub fn new(formatters: Vec<Arc<dyn InputFormatter>>) -> Self {
        Self { formatters }
    }
}

impl ModelBinderProvider for BodyModelBinderProvider {
    fn get_binder(
        &self,
        context: &mut ModelBinderProviderContext<'_>,
    ) -> BindingResult<ProviderOutcome> {
        if context.binding_source() != Some(&BindingSource::Body) {
            return Ok(ProviderOutcome::Declined);
        }
        if self.formatters.is_empty() {
            return Err(BindingError::NoInputFormatters {
                model_type: context.metadata().model_type().type_name(),
            });
        }
        Ok(ProviderOutcome::binder(BodyModelBinder::new(
            self.formatters.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BindingOptions;
    use crate::model::{
        BindingInfo, ComplexTypeDefinition, DefaultModelMetadataProvider, ModelType,
        ParameterDescriptor, PropertyDefinition,
    };
    use crate::registry::binders::test_support::Harness;
    use crate::request::RequestContext;
    use pretty_assertions::assert_eq;

    fn harness() -> Harness {
        Harness::new(DefaultModelMetadataProvider::new().with_complex_type(
            ComplexTypeDefinition::new("Order")
                .property(PropertyDefinition::new("Id", ModelType::int32())),
        ))
    }

    fn body_parameter() -> ParameterDescriptor {
        ParameterDescriptor::new("order", ModelType::complex("Order"))
            .with_binding_info(BindingInfo::default().with_source(BindingSource::Body))
    }

    #[tokio::test]
    async fn test_reads_json_body() {
        let request = RequestContext::builder()
            .content_type("application/json; charset=utf-8")
            .body(r#"{"Id":5}"#)
            .build();
        let bound = harness()
            .bind_parameter(&request, &body_parameter(), "order")
            .await;
        let model = bound.result.and_then(ModelBindingResult::into_model).unwrap();
        assert_eq!(
            model.as_object().and_then(|order| order.get("Id")),
            Some(&ModelValue::Integer(5))
        );
    }

    #[tokio::test]
    async fn test_formatter_errors_land_in_model_state() {
        let request = RequestContext::builder()
            .content_type("application/json")
            .body("{")
            .build();
        let bound = harness()
            .bind_parameter(&request, &body_parameter(), "order")
            .await;
        assert_eq!(bound.result, Some(ModelBindingResult::Failed));
        assert!(matches!(
            bound.model_state.errors_for(""),
            [ModelError::InvalidInput { .. }]
        ));
    }

    #[tokio::test]
    async fn test_unsupported_content_type() {
        let request = RequestContext::builder()
            .content_type("application/xml")
            .body("<order/>")
            .build();
        let bound = harness()
            .bind_parameter(&request, &body_parameter(), "order")
            .await;
        assert_eq!(bound.result, Some(ModelBindingResult::Failed));
        assert_eq!(
            bound.model_state.errors_for(""),
            &[ModelError::UnsupportedContentType {
                content_type: "application/xml".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_empty_body() {
        let request = RequestContext::builder()
            .content_type("application/json")
            .build();

        let strict = harness()
            .bind_parameter(&request, &body_parameter(), "order")
            .await;
        assert_eq!(strict.result, Some(ModelBindingResult::Failed));
        assert_eq!(
            strict.model_state.errors_for(""),
            &[ModelError::MissingRequestBody]
        );

        let permissive = harness()
            .with_options(BindingOptions {
                allow_empty_input_in_body_model_binding: true,
                ..BindingOptions::default()
            })
            .bind_parameter(&request, &body_parameter(), "order")
            .await;
        assert_eq!(
            permissive.result,
            Some(ModelBindingResult::Success(ModelValue::Null))
        );
        assert!(permissive.model_state.is_valid());
    }

    #[test]
    fn test_no_formatters_is_configuration_error() {
        let error = harness()
            .with_formatters(Vec::new())
            .resolve_parameter(&body_parameter())
            .expect_err("body binding without formatters should fail");
        assert_eq!(
            error,
            BindingError::NoInputFormatters {
                model_type: "Order".into()
            }
        );
    }
}
