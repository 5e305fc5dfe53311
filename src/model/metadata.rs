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

//! Model metadata
//!
//! [`ModelMetadata`] describes one bindable target: a type, a property of a
//! complex type, or an action parameter. Metadata is produced and cached by a
//! [`ModelMetadataProvider`](super::ModelMetadataProvider); property and
//! element metadata are resolved lazily through the provider so that
//! self-referential types terminate.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::binding_source::BindingSource;
use super::definitions::{ComplexTypeDefinition, EnumDefinition, PropertyDefinition};
use super::types::{ModelType, SimpleType};
use super::value::ModelValue;

/// What a piece of metadata describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetadataKind {
    /// A type on its own
    Type,
    /// A property of a complex type
    Property,
    /// An action parameter
    Parameter,
}

/// Identity of a metadata entry, used as a cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelMetadataIdentity {
    /// Kind of target
    pub kind: MetadataKind,
    /// Target type
    pub model_type: ModelType,
    /// Property or parameter name
    pub name: Option<String>,
    /// Declaring type of a property
    pub container_type: Option<ModelType>,
}

impl ModelMetadataIdentity {
    /// Identity of a type
    pub fn for_type(model_type: ModelType) -> Self {
        Self {
            kind: MetadataKind::Type,
            model_type,
            name: None,
            container_type: None,
        }
    }

    /// Identity of a property
    pub fn for_property(
        model_type: ModelType,
        name: impl Into<String>,
        container_type: ModelType,
    ) -> Self {
        Self {
            kind: MetadataKind::Property,
            model_type,
            name: Some(name.into()),
            container_type: Some(container_type),
        }
    }

    /// Identity of a parameter
    pub fn for_parameter(model_type: ModelType, name: impl Into<String>) -> Self {
        Self {
            kind: MetadataKind::Parameter,
            model_type,
            name: Some(name.into()),
            container_type: None,
        }
    }
}

/// Structural classification of a model; exactly one holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelClassification {
    /// Converted from one string
    Primitive,
    /// Named enum
    Enum,
    /// Sequence of elements
    Collection,
    /// Keyed entries
    Dictionary,
    /// Object with properties or an opaque framework type
    Complex,
}

impl ModelClassification {
    /// Classify a model type
    pub fn of(model_type: &ModelType) -> Self {
        match model_type.underlying_or_model_type() {
            ModelType::Simple(_) | ModelType::FloatingPoint(_) => Self::Primitive,
            ModelType::Array(element) if **element == ModelType::Simple(SimpleType::UInt8) => {
                Self::Primitive
            }
            ModelType::Enum(_) => Self::Enum,
            ModelType::Array(_) | ModelType::List(_) | ModelType::FormFileCollection => {
                Self::Collection
            }
            ModelType::Dictionary(_, _) => Self::Dictionary,
            _ => Self::Complex,
        }
    }
}

/// Binding configuration declared for a parameter or property
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BindingInfo {
    /// Declared binding source
    pub binding_source: Option<BindingSource>,
    /// Name used instead of the property or parameter name
    pub binder_model_name: Option<String>,
    /// Registered binder type to use
    pub binder_type: Option<String>,
}

impl BindingInfo {
    /// Binding info declared on metadata
    pub fn from_metadata(metadata: &ModelMetadata) -> Self {
        Self {
            binding_source: metadata.binding_source().cloned(),
            binder_model_name: metadata.binder_model_name().map(str::to_string),
            binder_type: metadata.binder_type().map(str::to_string),
        }
    }

    /// Fill unset fields from `fallback`
    pub fn merged_with(mut self, fallback: &BindingInfo) -> Self {
        if self.binding_source.is_none() {
            self.binding_source = fallback.binding_source.clone();
        }
        if self.binder_model_name.is_none() {
            self.binder_model_name = fallback.binder_model_name.clone();
        }
        if self.binder_type.is_none() {
            self.binder_type = fallback.binder_type.clone();
        }
        self
    }

    /// Declare a binding source
    pub fn with_source(mut self, source: BindingSource) -> Self {
        self.binding_source = Some(source);
        self
    }

    /// Declare a binder model name
    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.binder_model_name = Some(name.into());
        self
    }

    /// Declare a binder type
    pub fn with_binder_type(mut self, binder_type: impl Into<String>) -> Self {
        self.binder_type = Some(binder_type.into());
        self
    }
}

/// An action parameter to bind
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    /// Parameter name
    pub name: String,
    /// Parameter type
    pub model_type: ModelType,
    /// Declared binding configuration
    pub binding_info: BindingInfo,
}

impl ParameterDescriptor {
    /// Create a parameter without binding configuration
    pub fn new(name: impl Into<String>, model_type: ModelType) -> Self {
        Self {
            name: name.into(),
            model_type,
            binding_info: BindingInfo::default(),
        }
    }

    /// Attach binding configuration
    pub fn with_binding_info(mut self, binding_info: BindingInfo) -> Self {
        self.binding_info = binding_info;
        self
    }
}

/// Description of a bindable target
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMetadata {
    identity: ModelMetadataIdentity,
    classification: ModelClassification,
    binding_source: Option<BindingSource>,
    binder_model_name: Option<String>,
    binder_type: Option<String>,
    is_required: bool,
    is_binding_allowed: bool,
    is_read_only: bool,
    default_value: Option<ModelValue>,
    enum_definition: Option<Arc<EnumDefinition>>,
    complex_definition: Option<Arc<ComplexTypeDefinition>>,
}

impl ModelMetadata {
    /// Metadata for a type without declarations
    pub fn for_type(model_type: ModelType) -> Self {
        let classification = ModelClassification::of(&model_type);
        Self {
            identity: ModelMetadataIdentity::for_type(model_type),
            classification,
            binding_source: None,
            binder_model_name: None,
            binder_type: None,
            is_required: false,
            is_binding_allowed: true,
            is_read_only: false,
            default_value: None,
            enum_definition: None,
            complex_definition: None,
        }
    }

    pub(crate) fn with_identity(mut self, identity: ModelMetadataIdentity) -> Self {
        self.identity = identity;
        self
    }

    pub(crate) fn with_binding_info(mut self, info: &BindingInfo) -> Self {
        if info.binding_source.is_some() {
            self.binding_source = info.binding_source.clone();
        }
        if info.binder_model_name.is_some() {
            self.binder_model_name = info.binder_model_name.clone();
        }
        if info.binder_type.is_some() {
            self.binder_type = info.binder_type.clone();
        }
        self
    }

    pub(crate) fn with_default_source(mut self, source: Option<BindingSource>) -> Self {
        self.binding_source = source;
        self
    }

    pub(crate) fn with_binding_disallowed(mut self) -> Self {
        self.is_binding_allowed = false;
        self
    }

    pub(crate) fn with_enum_definition(mut self, definition: Arc<EnumDefinition>) -> Self {
        self.enum_definition = Some(definition);
        self
    }

    pub(crate) fn with_complex_definition(
        mut self,
        definition: Arc<ComplexTypeDefinition>,
    ) -> Self {
        self.complex_definition = Some(definition);
        self
    }

    pub(crate) fn with_property(mut self, property: &PropertyDefinition) -> Self {
        self = self.with_binding_info(&BindingInfo {
            binding_source: property.binding_source.clone(),
            binder_model_name: property.binder_model_name.clone(),
            binder_type: property.binder_type.clone(),
        });
        self.is_required = property.is_required;
        self.is_binding_allowed = self.is_binding_allowed && property.is_binding_allowed;
        self.is_read_only = property.is_read_only;
        self.default_value = property.default_value.clone();
        self
    }

    /// Identity used as a cache key
    pub fn identity(&self) -> &ModelMetadataIdentity {
        &self.identity
    }

    /// What the metadata describes
    pub fn kind(&self) -> MetadataKind {
        self.identity.kind
    }

    /// The target type
    pub fn model_type(&self) -> &ModelType {
        &self.identity.model_type
    }

    /// Structural classification
    pub fn classification(&self) -> ModelClassification {
        self.classification
    }

    /// Whether the type has no string converter
    pub fn is_complex_type(&self) -> bool {
        !matches!(
            self.classification,
            ModelClassification::Primitive | ModelClassification::Enum
        )
    }

    /// Whether the type is a collection or dictionary
    pub fn is_collection_type(&self) -> bool {
        matches!(
            self.classification,
            ModelClassification::Collection | ModelClassification::Dictionary
        )
    }

    /// Whether the type is an enum
    pub fn is_enum(&self) -> bool {
        self.classification == ModelClassification::Enum
    }

    /// Element type of a collection or dictionary
    pub fn element_type(&self) -> Option<ModelType> {
        if self.is_collection_type() {
            self.model_type().element_type()
        } else {
            None
        }
    }

    /// Declared binding source
    pub fn binding_source(&self) -> Option<&BindingSource> {
        self.binding_source.as_ref()
    }

    /// Declared binder model name
    pub fn binder_model_name(&self) -> Option<&str> {
        self.binder_model_name.as_deref()
    }

    /// Declared binder type
    pub fn binder_type(&self) -> Option<&str> {
        self.binder_type.as_deref()
    }

    /// Whether a value is required
    pub fn is_required(&self) -> bool {
        self.is_required
    }

    /// Whether binding is allowed
    pub fn is_binding_allowed(&self) -> bool {
        self.is_binding_allowed
    }

    /// Whether the property cannot be assigned
    pub fn is_read_only(&self) -> bool {
        self.is_read_only
    }

    /// Value assigned to a freshly constructed container
    pub fn default_value(&self) -> Option<&ModelValue> {
        self.default_value.as_ref()
    }

    /// Property or parameter name
    pub fn name(&self) -> Option<&str> {
        self.identity.name.as_deref()
    }

    /// Declaring type of a property
    pub fn container_type(&self) -> Option<&ModelType> {
        self.identity.container_type.as_ref()
    }

    /// Name shown in error messages
    pub fn display_name(&self) -> String {
        match self.name() {
            Some(name) => name.to_string(),
            None => self.model_type().type_name(),
        }
    }

    /// Enum members, for enum metadata
    pub fn enum_definition(&self) -> Option<&EnumDefinition> {
        self.enum_definition.as_deref()
    }

    /// Complex type declaration, for registered complex types
    pub fn complex_definition(&self) -> Option<&ComplexTypeDefinition> {
        self.complex_definition.as_deref()
    }

    /// Whether the binder can construct an instance
    pub fn has_default_constructor(&self) -> bool {
        match self.model_type().underlying_or_model_type() {
            ModelType::Complex(_) => self
                .complex_definition
                .as_ref()
                .is_some_and(|definition| definition.has_default_constructor()),
            ModelType::Opaque(_) => false,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(
            ModelClassification::of(&ModelType::int32()),
            ModelClassification::Primitive
        );
        assert_eq!(
            ModelClassification::of(&ModelType::byte_array()),
            ModelClassification::Primitive
        );
        assert_eq!(
            ModelClassification::of(&ModelType::nullable(ModelType::enumeration("Color"))),
            ModelClassification::Enum
        );
        assert_eq!(
            ModelClassification::of(&ModelType::list(ModelType::string())),
            ModelClassification::Collection
        );
        assert_eq!(
            ModelClassification::of(&ModelType::dictionary(
                ModelType::string(),
                ModelType::int32()
            )),
            ModelClassification::Dictionary
        );
        assert_eq!(
            ModelClassification::of(&ModelType::key_value_pair(
                ModelType::string(),
                ModelType::int32()
            )),
            ModelClassification::Complex
        );
    }

    #[test]
    fn test_element_type_only_for_collections() {
        let list = ModelMetadata::for_type(ModelType::list(ModelType::int32()));
        assert_eq!(list.element_type(), Some(ModelType::int32()));
        assert!(list.is_complex_type());

        let bytes = ModelMetadata::for_type(ModelType::byte_array());
        assert_eq!(bytes.element_type(), None);
        assert!(!bytes.is_complex_type());
    }

    #[test]
    fn test_binding_info_merge() {
        let declared = BindingInfo::default().with_model_name("q");
        let fallback = BindingInfo::default()
            .with_source(BindingSource::Query)
            .with_model_name("ignored");
        let merged = declared.merged_with(&fallback);
        assert_eq!(merged.binding_source, Some(BindingSource::Query));
        assert_eq!(merged.binder_model_name.as_deref(), Some("q"));
    }
}
