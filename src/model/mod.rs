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

//! Type model, metadata and bound values
//!
//! This module provides the structural type language used to describe
//! binding targets, the metadata derived from it, and the dynamic value graph
//! that binders produce.

#![warn(missing_docs)]

pub mod binding_source;
pub mod culture;
pub mod definitions;
pub mod metadata;
pub mod provider;
pub mod type_coercion;
pub mod types;
pub mod value;

pub use binding_source::BindingSource;
pub use culture::{Culture, NumberStyles, normalize_number};
pub use definitions::{ComplexTypeDefinition, EnumDefinition, PropertyDefinition};
pub use metadata::{
    BindingInfo, MetadataKind, ModelClassification, ModelMetadata, ModelMetadataIdentity,
    ParameterDescriptor,
};
pub use provider::{DefaultModelMetadataProvider, ModelMetadataProvider};
pub use type_coercion::{CoercionError, CoercionResult, TypeCoercion};
pub use types::{FloatingPointType, ModelType, SimpleType};
pub use value::{EnumValue, ModelObject, ModelValue};
