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

//! Model binder trait and binding results

use async_trait::async_trait;
use std::fmt;

use super::context::ModelBindingContext;
use crate::error::BindingResult;
use crate::model::ModelValue;

/// Outcome of a bind stored in the context's result slot
#[derive(Debug, Clone, PartialEq)]
pub enum ModelBindingResult {
    /// A model was produced
    Success(ModelValue),
    /// Binding was attempted and failed
    Failed,
}

impl ModelBindingResult {
    /// Whether a model was produced
    pub fn is_model_set(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The produced model
    pub fn model(&self) -> Option<&ModelValue> {
        match self {
            Self::Success(model) => Some(model),
            Self::Failed => None,
        }
    }

    /// Take the produced model
    pub fn into_model(self) -> Option<ModelValue> {
        match self {
            Self::Success(model) => Some(model),
            Self::Failed => None,
        }
    }
}

/// Binds one model from the data visible through a binding context
///
/// A binder reports its outcome by setting the context result. Leaving the
/// result unset means "no value"; field errors go to the model state.
/// Returning `Err` aborts the whole bind and is reserved for configuration
/// defects, request I/O failures and cancellation.
#[async_trait]
pub trait ModelBinder: Send + Sync + fmt::Debug {
    /// Bind the model described by the context
    async fn bind_model(&self, context: &mut ModelBindingContext<'_>) -> BindingResult<()>;
}
