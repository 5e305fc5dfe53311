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

//! Request cancellation token binder

use async_trait::async_trait;

use crate::error::BindingResult;
use crate::model::{ModelType, ModelValue};
use crate::registry::{
    ModelBinder, ModelBinderProvider, ModelBinderProviderContext, ModelBindingContext,
    ModelBindingResult, ProviderOutcome,
};

/// Binds the request cancellation token
#[derive(Debug, Clone, Copy, Default)]
pub struct CancellationTokenModelBinder;

#[async_trait]
impl ModelBinder for CancellationTokenModelBinder {
    async fn bind_model(&self, context: &mut ModelBindingContext<'_>) -> BindingResult<()> {
        let token = context.request().cancellation_token().clone();
        let key = context.model_name().to_string();
        context.validation_state().suppress_validation(&key);
        context.set_result(ModelBindingResult::Success(ModelValue::CancellationToken(
            token,
        )));
        Ok(())
    }
}

/// Supplies [`CancellationTokenModelBinder`]
#[derive(Debug, Clone, Copy, Default)]
pub struct CancellationTokenModelBinderProvider;

impl ModelBinderProvider for CancellationTokenModelBinderProvider {
    fn get_binder(
        &self,
        context: &mut ModelBinderProviderContext<'_>,
    ) -> BindingResult<ProviderOutcome> {
        if *context.metadata().model_type() == ModelType::CancellationToken {
            Ok(ProviderOutcome::binder(CancellationTokenModelBinder))
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
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_binds_request_token() {
        let token = CancellationToken::new();
        let request = RequestContext::builder()
            .cancellation_token(token.clone())
            .build();
        let harness = Harness::new(DefaultModelMetadataProvider::new());
        let bound = harness
            .bind(&request, ModelType::CancellationToken, "token")
            .await;

        let Some(ModelBindingResult::Success(ModelValue::CancellationToken(bound_token))) =
            bound.result
        else {
            panic!("expected the request token, got {:?}", bound.result);
        };
        token.cancel();
        assert!(bound_token.is_cancelled());
        assert!(bound.validation_state.is_suppressed("token"));
    }
}
