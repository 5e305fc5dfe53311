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

//! Service registry binder

use async_trait::async_trait;
use log::trace;

use crate::error::{BindingError, BindingResult};
use crate::model::{BindingSource, ModelValue};
use crate::registry::{
    ModelBinder, ModelBinderProvider, ModelBinderProviderContext, ModelBindingContext,
    ModelBindingResult, ProviderOutcome,
};

/// Resolves the model from the request services
///
/// A missing registration is a configuration error, also for nullable
/// model types.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServicesModelBinder;

#[async_trait]
impl ModelBinder for ServicesModelBinder {
    async fn bind_model(&self, context: &mut ModelBindingContext<'_>) -> BindingResult<()> {
        let type_name = context
            .metadata()
            .model_type()
            .underlying_or_model_type()
            .type_name();

        let model = match context.request().services().get_service(&type_name) {
            Some(service) => ModelValue::Service(service),
            None => {
                trace!("No service '{type_name}' registered");
                return Err(BindingError::service_not_registered(type_name));
            }
        };

        let key = context.model_name().to_string();
        context.validation_state().suppress_validation(&key);
        context.set_result(ModelBindingResult::Success(model));
        Ok(())
    }
}

/// Supplies [`ServicesModelBinder`] for the services binding source
#[derive(Debug, Clone, Copy, Default)]
pub struct ServicesModelBinderProvider;

impl ModelBinderProvider for ServicesModelBinderProvider {
    fn get_binder(
        &self,
        context: &mut ModelBinderProviderContext<'_>,
    ) -> BindingResult<ProviderOutcome> {
        if context.binding_source() == Some(&BindingSource::Services) {
            Ok(ProviderOutcome::binder(ServicesModelBinder))
        } else {
            Ok(ProviderOutcome::Declined)
        }
    }
}
