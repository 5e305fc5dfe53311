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

//! Base64 byte array binder

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::debug;

use crate::error::BindingResult;
use crate::model::ModelValue;
use crate::registry::{
    ModelBinder, ModelBinderProvider, ModelBinderProviderContext, ModelBindingContext,
    ModelBindingResult, ProviderOutcome,
};
use crate::state::ModelError;

/// Decodes the first raw value as standard base64
///
/// ASCII whitespace inside the value is ignored; a blank value is absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteArrayModelBinder;

#[async_trait]
impl ModelBinder for ByteArrayModelBinder {
    async fn bind_model(&self, context: &mut ModelBindingContext<'_>) -> BindingResult<()> {
        let value = context.value();
        if value.is_none() {
            debug!("Found no value for model '{}'", context.model_name());
            return Ok(());
        }

        let key = context.model_name().to_string();
        context.model_state().set_model_value(&key, value.values());

        let Some(text) = value.first_value() else {
            return Ok(());
        };
        if text.trim().is_empty() {
            return Ok(());
        }

        let compact: String = text
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        match STANDARD.decode(compact) {
            Ok(bytes) => context.set_result(ModelBindingResult::Success(ModelValue::Bytes(bytes))),
            Err(error) => {
                debug!("Value of model '{key}' is not valid base64: {error}");
                context.add_model_error(ModelError::InvalidBase64 {
                    attempted_value: text.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Supplies [`ByteArrayModelBinder`] for `byte[]`
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteArrayModelBinderProvider;

impl ModelBinderProvider for ByteArrayModelBinderProvider {
    fn get_binder(
        &self,
        context: &mut ModelBinderProviderContext<'_>,
    ) -> BindingResult<ProviderOutcome> {
        if context.metadata().model_type().is_byte_array() {
            Ok(ProviderOutcome::binder(ByteArrayModelBinder))
        } else {
            Ok(ProviderOutcome::Declined)
        }
    }
}
