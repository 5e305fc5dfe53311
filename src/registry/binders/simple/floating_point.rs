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

//! Single, double and decimal binder

use async_trait::async_trait;

use super::bind_single_value;
use crate::error::BindingResult;
use crate::model::{FloatingPointType, ModelType, NumberStyles, TypeCoercion};
use crate::registry::{
    ModelBinder, ModelBinderProvider, ModelBinderProviderContext, ModelBindingContext,
    ProviderOutcome,
};

/// Parses floating point text with a fixed number-style policy
#[derive(Debug, Clone, Copy)]
pub struct FloatingPointModelBinder {
    target: FloatingPointType,
    styles: NumberStyles,
}

impl FloatingPointModelBinder {
    /// Create a binder using [`NumberStyles::FLOATING_POINT_BINDING`]
    pub fn new(target: FloatingPointType) -> Self {
        Self::with_styles(target, NumberStyles::FLOATING_POINT_BINDING)
    }

    /// Create a binder with explicit number styles
    pub fn with_styles(target: FloatingPointType, styles: NumberStyles) -> Self {
        Self { target, styles }
    }
}

#[async_trait]
impl ModelBinder for FloatingPointModelBinder {
    async fn bind_model(&self, context: &mut ModelBindingContext<'_>) -> BindingResult<()> {
        let (target, styles) = (self.target, self.styles);
        bind_single_value(context, |text, culture| {
            TypeCoercion::convert_floating_point(text, target, culture, styles)
        });
        Ok(())
    }
}

/// Supplies [`FloatingPointModelBinder`] for float, double and decimal
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatingPointModelBinderProvider;

impl ModelBinderProvider for FloatingPointModelBinderProvider {
    fn get_binder(
        &self,
        context: &mut ModelBinderProviderContext<'_>,
    ) -> BindingResult<ProviderOutcome> {
        match context.metadata().model_type().underlying_or_model_type() {
            ModelType::FloatingPoint(target) => Ok(ProviderOutcome::binder(
                FloatingPointModelBinder::new(*target),
            )),
            _ => Ok(ProviderOutcome::Declined),
        }
    }
}
