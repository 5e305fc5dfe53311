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

//! Binders composing child binds: collections, dictionaries, pairs, objects

mod collection;
mod complex_type;
mod dictionary;
mod key_value_pair;

pub use collection::{ArrayModelBinderProvider, CollectionModelBinder, CollectionModelBinderProvider};
pub use complex_type::{ComplexTypeModelBinder, ComplexTypeModelBinderProvider};
pub use dictionary::{DictionaryModelBinder, DictionaryModelBinderProvider};
pub use key_value_pair::{KeyValuePairModelBinder, KeyValuePairModelBinderProvider};

use std::sync::Arc;

use crate::error::BindingResult;
use crate::model::ModelMetadata;
use crate::registry::{ModelBinder, ModelBindingContext, ModelBindingResult};

/// Bind a child model in a nested scope and hand back its result
pub(crate) async fn bind_child(
    context: &mut ModelBindingContext<'_>,
    metadata: Arc<ModelMetadata>,
    binder: &Arc<dyn ModelBinder>,
    field_name: &str,
    model_name: String,
) -> BindingResult<Option<ModelBindingResult>> {
    let mut child = context.enter_nested_scope(metadata, field_name, model_name)?;
    binder.bind_model(&mut child).await?;
    Ok(child.take_result())
}
