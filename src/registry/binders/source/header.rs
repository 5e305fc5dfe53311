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

//! Request header binder

use async_trait::async_trait;
use log::debug;

use crate::error::BindingResult;
use crate::model::{BindingSource, ModelType, ModelValue};
use crate::registry::{
    ModelBinder, ModelBinderProvider, ModelBinderProviderContext, ModelBindingContext,
    ModelBindingResult, ProviderOutcome,
};

/// Reads the header named by the field name
#[derive(Debug, Clone, Copy)]
pub struct HeaderModelBinder {
    is_collection: bool,
}

impl HeaderModelBinder {
    /// Binder producing one comma-joined string
    pub fn single() -> Self {
        Self {
            is_collection: false,
        }
    }

    /// Binder producing the comma-separated items of every header line
    pub fn collection() -> Self {
        Self {
            is_collection: true,
        }
    }
}

#[async_trait]
impl ModelBinder for HeaderModelBinder {
    async fn bind_model(&self, context: &mut ModelBindingContext<'_>) -> BindingResult<()> {
        let request = context.request();
        let header_name = context.field_name().to_string();
        let values = request.headers().get_all(&header_name);
        if values.is_empty() {
            debug!("Found no header '{header_name}' for model '{}'", context.model_name());
            return Ok(());
        }

        let model = if self.is_collection {
            ModelValue::List(
                values
                    .iter()
                    .flat_map(|line| line.split(','))
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(ModelValue::from)
                    .collect(),
            )
        } else {
            ModelValue::String(values.join(","))
        };

        let key = context.model_name().to_string();
        context.model_state().set_model_value(&key, values);
        context.set_result(ModelBindingResult::Success(model));
        Ok(())
    }
}

/// Supplies [`HeaderModelBinder`] for strings and string collections
/// declared to come from a header
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderModelBinderProvider;

impl ModelBinderProvider for HeaderModelBinderProvider {
    fn get_binder(
        &self,
        context: &mut ModelBinderProviderContext<'_>,
    ) -> BindingResult<ProviderOutcome> {
        let from_header = context
            .binding_source()
            .is_some_and(|source| source.can_accept_data_from(&BindingSource::Header));
        if !from_header {
            return Ok(ProviderOutcome::Declined);
        }

        let model_type = context.metadata().model_type().underlying_or_model_type();
        if *model_type == ModelType::string() {
            return Ok(ProviderOutcome::binder(HeaderModelBinder::single()));
        }
        if matches!(model_type, ModelType::Array(_) | ModelType::List(_))
            && model_type.is_collection_of(&ModelType::string())
        {
            return Ok(ProviderOutcome::binder(HeaderModelBinder::collection()));
        }

        debug!("Header binding supports only strings and string collections, not '{model_type}'");
        Ok(ProviderOutcome::Declined)
    }
}
