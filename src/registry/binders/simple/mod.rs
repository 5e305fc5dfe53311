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

//! Binders converting one raw value into a primitive

mod byte_array;
mod enum_type;
mod floating_point;
mod simple_type;

pub use byte_array::{ByteArrayModelBinder, ByteArrayModelBinderProvider};
pub use enum_type::{EnumTypeModelBinder, EnumTypeModelBinderProvider};
pub use floating_point::{FloatingPointModelBinder, FloatingPointModelBinderProvider};
pub use simple_type::{SimpleTypeModelBinder, SimpleTypeModelBinderProvider};

use log::debug;

use crate::model::{CoercionError, CoercionResult, Culture, MetadataKind, ModelMetadata, ModelValue};
use crate::registry::{ModelBindingContext, ModelBindingResult};
use crate::state::ModelError;

/// Bind the first raw value of the model name through `convert`
///
/// Absent and blank values leave the result unset without an error.
/// Conversion failures are recorded against the model name.
pub(crate) fn bind_single_value<F>(context: &mut ModelBindingContext<'_>, convert: F)
where
    F: FnOnce(&str, &Culture) -> CoercionResult<ModelValue>,
{
    let value = context.value();
    if value.is_none() {
        debug!("Found no value for model '{}'", context.model_name());
        return;
    }

    let key = context.model_name().to_string();
    context.model_state().set_model_value(&key, value.values());

    let Some(text) = value.first_value() else {
        return;
    };
    if text.trim().is_empty() {
        debug!("Found a blank value for model '{key}'");
        return;
    }

    let culture = value
        .culture()
        .cloned()
        .unwrap_or_else(|| context.request().culture().clone());

    match convert(text, &culture) {
        Ok(model) => context.set_result(ModelBindingResult::Success(model)),
        Err(error) => {
            debug!("Could not convert value of model '{key}': {error}");
            let model_error = conversion_error(context.metadata(), text, error);
            context.add_model_error(model_error);
        }
    }
}

/// Map a conversion failure onto the model-state error shown for it
pub(crate) fn conversion_error(
    metadata: &ModelMetadata,
    attempted_value: &str,
    error: CoercionError,
) -> ModelError {
    match error {
        CoercionError::UndefinedEnumValue { enum_name, .. } => ModelError::UndefinedEnumValue {
            attempted_value: attempted_value.to_string(),
            enum_name,
        },
        _ => {
            let field = match metadata.kind() {
                MetadataKind::Property => Some(metadata.display_name()),
                _ => None,
            };
            ModelError::attempted_value_is_invalid(
                attempted_value,
                field.as_deref(),
                metadata.model_type().type_name(),
            )
        }
    }
}
