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

//! Model binding for web request data
//!
//! Turns raw, untyped request values (query string, form fields, route
//! segments, headers, uploaded files, request body) into typed models while
//! collecting per-field errors keyed by dotted/indexed model names.
//!
//! The entry point is [`ModelBindingEngine`]; binders are resolved through an
//! ordered chain of [`ModelBinderProvider`]s driven by [`ModelMetadata`].

pub mod config;
pub mod engine;
pub mod error;
pub mod formatters;
pub mod lifetime;
pub mod model;
pub mod registry;
pub mod request;
pub mod services;
pub mod state;
pub mod value_provider;

// Re-export main types
pub use config::BindingOptions;
pub use engine::{BoundArguments, ModelBindingEngine, ModelBindingEngineBuilder};
pub use error::{BindingError, BindingResult, RequestError};
pub use formatters::{InputFormatter, InputFormatterError, JsonInputFormatter};
pub use lifetime::{
    LifetimeProperty, LifetimeSource, PropertyLifetimeContext, PropertyLifetimeManager,
    PropertyLifetimeRegistry, TempDataDictionary, TempDataStore, ViewDataDictionary,
};
pub use model::{
    BindingInfo, BindingSource, ComplexTypeDefinition, Culture, DefaultModelMetadataProvider,
    EnumDefinition, ModelMetadata, ModelMetadataProvider, ModelObject, ModelType, ModelValue,
    ParameterDescriptor, PropertyDefinition,
};
pub use registry::{
    BinderTypeRegistry, ModelBinder, ModelBinderFactory, ModelBinderProvider,
    ModelBinderProviderContext, ModelBindingContext, ModelBindingResult, ProviderOutcome,
    create_standard_providers,
};
pub use request::{FormCollection, FormFile, RequestContext};
pub use services::{ServiceCollection, ServiceProvider};
pub use state::{ModelError, ModelStateDictionary, ValidationStateDictionary};
pub use value_provider::{ValueProvider, ValueProviderResult};
