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

//! Model binder registry
//!
//! Binders are resolved from metadata by asking an ordered list of
//! [`ModelBinderProvider`]s; the first provider returning a binder wins.

#![warn(missing_docs)]

pub mod binder;
pub mod binders;
pub mod context;
pub mod factory;
pub mod provider;

pub use binder::{ModelBinder, ModelBindingResult};
pub use binders::BinderTypeRegistry;
pub use context::ModelBindingContext;
pub use factory::ModelBinderFactory;
pub use provider::{ModelBinderProvider, ModelBinderProviderContext, ProviderOutcome};

use std::sync::Arc;

use crate::formatters::InputFormatter;
use binders::{
    ArrayModelBinderProvider, BinderTypeModelBinderProvider, BodyModelBinderProvider,
    ByteArrayModelBinderProvider, CancellationTokenModelBinderProvider,
    CollectionModelBinderProvider, ComplexTypeModelBinderProvider, DictionaryModelBinderProvider,
    EnumTypeModelBinderProvider, FloatingPointModelBinderProvider,
    FormCollectionModelBinderProvider, FormFileModelBinderProvider, HeaderModelBinderProvider,
    KeyValuePairModelBinderProvider, ServicesModelBinderProvider, SimpleTypeModelBinderProvider,
};

/// Create the built-in providers in resolution order
///
/// Source-restricted providers come first so a declared source wins over the
/// model type; the complex type provider is the catch-all.
pub fn create_standard_providers(
    binder_types: BinderTypeRegistry,
    formatters: Vec<Arc<dyn InputFormatter>>,
) -> Vec<Arc<dyn ModelBinderProvider>> {
    vec![
        Arc::new(BinderTypeModelBinderProvider::new(binder_types)),
        Arc::new(ServicesModelBinderProvider),
        Arc::new(BodyModelBinderProvider::new(formatters)),
        Arc::new(HeaderModelBinderProvider),
        Arc::new(FloatingPointModelBinderProvider),
        Arc::new(EnumTypeModelBinderProvider),
        Arc::new(SimpleTypeModelBinderProvider),
        Arc::new(CancellationTokenModelBinderProvider),
        Arc::new(ByteArrayModelBinderProvider),
        Arc::new(FormFileModelBinderProvider),
        Arc::new(FormCollectionModelBinderProvider),
        Arc::new(KeyValuePairModelBinderProvider),
        Arc::new(DictionaryModelBinderProvider),
        Arc::new(ArrayModelBinderProvider),
        Arc::new(CollectionModelBinderProvider),
        Arc::new(ComplexTypeModelBinderProvider),
    ]
}
