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

//! Raw form binder

use async_trait::async_trait;
use log::trace;

use crate::error::BindingResult;
use crate::model::{ModelType, ModelValue};
use crate::registry::{
    ModelBinder, ModelBinderProvider, ModelBinderProviderContext, ModelBindingContext,
    ModelBindingResult, ProviderOutcome,
};
use crate::request::FormCollection;

/// Binds the whole request form; empty without a form content type
#[derive(Debug, Clone, Copy, Default)]
pub struct FormCollectionModelBinder;

#[async_trait]
impl ModelBinder for FormCollectionModelBinder {
    async fn bind_model(&self, context: &mut ModelBindingContext<'_>) -> BindingResult<()> {
        let request = context.request();
        let form = if request.has_form_content_type() {
            request.read_form().await?.clone()
        } else {
            trace!("Request has no form content type; binding an empty form");
            FormCollection::new()
        };
        context.set_result(ModelBindingResult::Success(ModelValue::Form(form)));
        Ok(())
    }
}

/// Supplies [`FormCollectionModelBinder`] for `FormCollection` models
#[derive(Debug, Clone, Copy, Default)]
pub struct FormCollectionModelBinderProvider;

impl ModelBinderProvider for FormCollectionModelBinderProvider {
    fn get_binder(
        &self,
        context: &mut ModelBinderProviderContext<'_>,
    ) -> BindingResult<ProviderOutcome> {
        if *context.metadata().model_type().underlying_or_model_type() == ModelType::FormCollection
        {
            Ok(ProviderOutcome::binder(FormCollectionModelBinder))
        } else {
            Ok(ProviderOutcome::Declined)
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

    #[tokio::test]
    async fn test_urlencoded_form() {
        let harness = Harness::new(DefaultModelMetadataProvider::new());
        let request = RequestContext::builder()
            .content_type("application/x-www-form-urlencoded")
            .body("name=Ada&tag=a&tag=b")
            .build();
        let bound = harness.bind(&request, ModelType::FormCollection, "form").await;
        let Some(ModelBindingResult::Success(ModelValue::Form(form))) = bound.result else {
            panic!("expected a bound form, got {:?}", bound.result);
        };
        assert_eq!(form.get("tag"), Some(&["a".to_string(), "b".to_string()][..]));
    }

    #[tokio::test]
    async fn test_no_form_content_type() {
        let harness = Harness::new(DefaultModelMetadataProvider::new());
        let request = RequestContext::builder().body("name=Ada").build();
        let bound = harness.bind(&request, ModelType::FormCollection, "form").await;
        assert_eq!(
            bound.result,
            Some(ModelBindingResult::Success(ModelValue::Form(FormCollection::new())))
        );
    }
}
