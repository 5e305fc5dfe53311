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

//! Shared fixtures for integration tests

#![allow(dead_code)]

use model_binding::{
    BindingOptions, ComplexTypeDefinition, DefaultModelMetadataProvider, EnumDefinition,
    ModelBindingEngine, ModelType, PropertyDefinition,
};
use std::sync::Arc;

/// Route log records to the test output when `RUST_LOG` is set
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Types used across the integration tests
pub fn fixture_metadata() -> DefaultModelMetadataProvider {
    DefaultModelMetadataProvider::new()
        .with_enum(
            EnumDefinition::new("Color")
                .member("Red", 0)
                .member("Green", 1)
                .member("Blue", 2),
        )
        .with_complex_type(
            ComplexTypeDefinition::new("Person")
                .property(PropertyDefinition::new("Name", ModelType::string()))
                .property(PropertyDefinition::new("Age", ModelType::int32()))
                .property(PropertyDefinition::new("Email", ModelType::string()))
                .property(PropertyDefinition::new("Favorite", ModelType::enumeration("Color")))
                .property(PropertyDefinition::new("Address", ModelType::complex("Address"))),
        )
        .with_complex_type(
            ComplexTypeDefinition::new("Address")
                .property(PropertyDefinition::new("City", ModelType::string()))
                .property(PropertyDefinition::new("Zip", ModelType::string())),
        )
        .with_complex_type(
            ComplexTypeDefinition::new("Node")
                .property(PropertyDefinition::new("Value", ModelType::int32()))
                .property(PropertyDefinition::new("Next", ModelType::complex("Node")))
                .property(PropertyDefinition::new(
                    "Children",
                    ModelType::list(ModelType::complex("Node")),
                )),
        )
}

/// Engine over the fixture types
pub fn engine() -> ModelBindingEngine {
    engine_with(BindingOptions::default())
}

/// Engine over the fixture types with custom options
pub fn engine_with(options: BindingOptions) -> ModelBindingEngine {
    init_logging();
    ModelBindingEngine::builder()
        .metadata_provider(Arc::new(fixture_metadata()))
        .options(options)
        .build()
}
