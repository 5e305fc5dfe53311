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

//! Model metadata provider
//!
//! The provider answers metadata queries for types, properties and
//! parameters. [`DefaultModelMetadataProvider`] serves registered enum and
//! complex type definitions and caches every answer per identity.

use dashmap::DashMap;
use log::trace;
use std::fmt;
use std::sync::Arc;

use super::binding_source::BindingSource;
use super::definitions::{ComplexTypeDefinition, EnumDefinition};
use super::metadata::{ModelMetadata, ModelMetadataIdentity, ParameterDescriptor};
use super::types::ModelType;
use crate::error::{BindingError, BindingResult};

/// Source of model metadata
///
/// Answers must be deterministic: the binder factory caches binders keyed by
/// metadata identity.
pub trait ModelMetadataProvider: Send + Sync + fmt::Debug {
    /// Metadata for a type
    fn metadata_for_type(&self, model_type: &ModelType) -> BindingResult<Arc<ModelMetadata>>;

    /// Metadata for the bindable properties of a type, in declaration order
    fn metadata_for_properties(
        &self,
        container: &ModelMetadata,
    ) -> BindingResult<Arc<Vec<Arc<ModelMetadata>>>>;

    /// Metadata for an action parameter
    fn metadata_for_parameter(
        &self,
        parameter: &ParameterDescriptor,
    ) -> BindingResult<Arc<ModelMetadata>>;
}

/// Metadata provider backed by registered type definitions
pub struct DefaultModelMetadataProvider {
    enums: DashMap<String, Arc<EnumDefinition>>,
    complex_types: DashMap<String, Arc<ComplexTypeDefinition>>,
    excluded_types: Vec<ModelType>,
    type_cache: DashMap<ModelType, Arc<ModelMetadata>>,
    property_cache: DashMap<ModelType, Arc<Vec<Arc<ModelMetadata>>>>,
}

impl DefaultModelMetadataProvider {
    /// Create a provider without registered types
    pub fn new() -> Self {
        Self {
            enums: DashMap::new(),
            complex_types: DashMap::new(),
            excluded_types: vec![ModelType::Type, ModelType::Stream],
            type_cache: DashMap::new(),
            property_cache: DashMap::new(),
        }
    }

    /// Register an enum definition
    pub fn with_enum(self, definition: EnumDefinition) -> Self {
        self.register_enum(definition);
        self
    }

    /// Register a complex type definition
    pub fn with_complex_type(self, definition: ComplexTypeDefinition) -> Self {
        self.register_complex_type(definition);
        self
    }

    /// Exclude a type from binding
    pub fn with_excluded_type(mut self, model_type: ModelType) -> Self {
        self.excluded_types.push(model_type);
        self.clear_cache();
        self
    }

    /// Register an enum definition
    pub fn register_enum(&self, definition: EnumDefinition) {
        self.enums
            .insert(definition.name().to_string(), Arc::new(definition));
        self.clear_cache();
    }

    /// Register a complex type definition
    pub fn register_complex_type(&self, definition: ComplexTypeDefinition) {
        self.complex_types
            .insert(definition.name().to_string(), Arc::new(definition));
        self.clear_cache();
    }

    /// Number of cached type entries
    pub fn cached_type_count(&self) -> usize {
        self.type_cache.len()
    }

    fn clear_cache(&self) {
        self.type_cache.clear();
        self.property_cache.clear();
    }

    fn default_binding_source(model_type: &ModelType) -> Option<BindingSource> {
        match model_type.underlying_or_model_type() {
            ModelType::CancellationToken => Some(BindingSource::Special),
            ModelType::FormFile | ModelType::FormFileCollection | ModelType::FormCollection => {
                Some(BindingSource::FormFile)
            }
            other if other.is_collection_of(&ModelType::FormFile) => Some(BindingSource::FormFile),
            _ => None,
        }
    }

    fn is_excluded(&self, model_type: &ModelType) -> bool {
        let underlying = model_type.underlying_or_model_type();
        self.excluded_types.iter().any(|excluded| excluded == underlying)
    }

    fn create_type_metadata(&self, model_type: &ModelType) -> BindingResult<ModelMetadata> {
        let mut metadata = ModelMetadata::for_type(model_type.clone())
            .with_default_source(Self::default_binding_source(model_type));

        match model_type.underlying_or_model_type() {
            ModelType::Enum(name) => {
                let definition = self
                    .enums
                    .get(name)
                    .map(|entry| entry.value().clone())
                    .ok_or_else(|| BindingError::unknown_model_type(name.clone()))?;
                metadata = metadata.with_enum_definition(definition);
            }
            ModelType::Complex(name) => {
                let definition = self
                    .complex_types
                    .get(name)
                    .map(|entry| entry.value().clone())
                    .ok_or_else(|| BindingError::unknown_model_type(name.clone()))?;
                metadata = metadata.with_complex_definition(definition);
            }
            _ => {}
        }

        if self.is_excluded(model_type) {
            metadata = metadata.with_binding_disallowed();
        }

        Ok(metadata)
    }

    fn property_metadata(
        &self,
        container: &ModelType,
        name: &str,
        model_type: &ModelType,
    ) -> BindingResult<ModelMetadata> {
        let base = self.metadata_for_type(model_type)?;
        Ok((*base).clone().with_identity(ModelMetadataIdentity::for_property(
            model_type.clone(),
            name,
            container.clone(),
        )))
    }
}

impl Default for DefaultModelMetadataProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DefaultModelMetadataProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultModelMetadataProvider")
            .field("enums", &self.enums.len())
            .field("complex_types", &self.complex_types.len())
            .field("excluded_types", &self.excluded_types)
            .finish()
    }
}

impl ModelMetadataProvider for DefaultModelMetadataProvider {
    fn metadata_for_type(&self, model_type: &ModelType) -> BindingResult<Arc<ModelMetadata>> {
        if let Some(cached) = self.type_cache.get(model_type) {
            return Ok(cached.value().clone());
        }

        trace!("Creating metadata for type '{model_type}'");
        let metadata = Arc::new(self.create_type_metadata(model_type)?);
        self.type_cache.insert(model_type.clone(), metadata.clone());
        Ok(metadata)
    }

    fn metadata_for_properties(
        &self,
        container: &ModelMetadata,
    ) -> BindingResult<Arc<Vec<Arc<ModelMetadata>>>> {
        let container_type = container.model_type().underlying_or_model_type();
        if let Some(cached) = self.property_cache.get(container_type) {
            return Ok(cached.value().clone());
        }

        let mut properties = Vec::new();
        match container_type {
            ModelType::Complex(name) => {
                let definition = self
                    .complex_types
                    .get(name)
                    .map(|entry| entry.value().clone())
                    .ok_or_else(|| BindingError::unknown_model_type(name.clone()))?;

                for property in definition.properties() {
                    let metadata = self
                        .property_metadata(container_type, property.name(), property.model_type())?
                        .with_property(property);
                    properties.push(Arc::new(metadata));
                }
            }
            ModelType::KeyValuePair(key, value) => {
                properties.push(Arc::new(self.property_metadata(container_type, "Key", key)?));
                properties.push(Arc::new(self.property_metadata(
                    container_type,
                    "Value",
                    value,
                )?));
            }
            _ => {}
        }

        let properties = Arc::new(properties);
        self.property_cache
            .insert(container_type.clone(), properties.clone());
        Ok(properties)
    }

    fn metadata_for_parameter(
        &self,
        parameter: &ParameterDescriptor,
    ) -> BindingResult<Arc<ModelMetadata>> {
        let base = self.metadata_for_type(&parameter.model_type)?;
        let metadata = (*base)
            .clone()
            .with_identity(ModelMetadataIdentity::for_parameter(
                parameter.model_type.clone(),
                parameter.name.clone(),
            ))
            .with_binding_info(&parameter.binding_info);
        Ok(Arc::new(metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::definitions::PropertyDefinition;
    use crate::model::metadata::{BindingInfo, MetadataKind};

    fn provider() -> DefaultModelMetadataProvider {
        DefaultModelMetadataProvider::new()
            .with_enum(EnumDefinition::new("Color").member("Red", 0))
            .with_complex_type(
                ComplexTypeDefinition::new("Node")
                    .property(PropertyDefinition::new("Name", ModelType::string()))
                    .property(PropertyDefinition::new("Next", ModelType::complex("Node"))),
            )
    }

    #[test]
    fn test_metadata_is_cached() {
        let provider = provider();
        let first = provider.metadata_for_type(&ModelType::int32()).unwrap();
        let second = provider.metadata_for_type(&ModelType::int32()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(provider.cached_type_count(), 1);
    }

    #[test]
    fn test_self_referential_properties_terminate() {
        let provider = provider();
        let node = provider
            .metadata_for_type(&ModelType::complex("Node"))
            .unwrap();
        let properties = provider.metadata_for_properties(&node).unwrap();
        assert_eq!(properties.len(), 2);
        assert_eq!(properties[1].name(), Some("Next"));
        assert_eq!(properties[1].kind(), MetadataKind::Property);
        assert_eq!(properties[1].container_type(), Some(&ModelType::complex("Node")));

        let nested = provider.metadata_for_properties(&properties[1]).unwrap();
        assert!(Arc::ptr_eq(&properties, &nested));
    }

    #[test]
    fn test_unknown_types_are_configuration_errors() {
        let provider = provider();
        assert_eq!(
            provider
                .metadata_for_type(&ModelType::complex("Missing"))
                .unwrap_err(),
            BindingError::unknown_model_type("Missing")
        );
        assert!(provider
            .metadata_for_type(&ModelType::enumeration("Shade"))
            .is_err());
    }

    #[test]
    fn test_default_binding_sources() {
        let provider = provider();
        let token = provider
            .metadata_for_type(&ModelType::CancellationToken)
            .unwrap();
        assert_eq!(token.binding_source(), Some(&BindingSource::Special));

        let files = provider
            .metadata_for_type(&ModelType::list(ModelType::FormFile))
            .unwrap();
        assert_eq!(files.binding_source(), Some(&BindingSource::FormFile));

        let stream = provider.metadata_for_type(&ModelType::Stream).unwrap();
        assert!(!stream.is_binding_allowed());
    }

    #[test]
    fn test_parameter_binding_info_overrides_type() {
        let provider = provider();
        let parameter = ParameterDescriptor::new("id", ModelType::int32()).with_binding_info(
            BindingInfo::default()
                .with_source(BindingSource::Path)
                .with_model_name("key"),
        );
        let metadata = provider.metadata_for_parameter(&parameter).unwrap();
        assert_eq!(metadata.kind(), MetadataKind::Parameter);
        assert_eq!(metadata.binding_source(), Some(&BindingSource::Path));
        assert_eq!(metadata.binder_model_name(), Some("key"));
    }
}
