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

//! Declarations of named enum and complex types
//!
//! Rust has no runtime reflection, so applications describe the shape of
//! their bindable types once and register the definitions with the
//! [`DefaultModelMetadataProvider`](super::DefaultModelMetadataProvider).

use serde::{Deserialize, Serialize};

use super::binding_source::BindingSource;
use super::types::ModelType;
use super::value::ModelValue;

/// A named enum and its members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDefinition {
    name: String,
    members: Vec<(String, i64)>,
    is_flags: bool,
}

impl EnumDefinition {
    /// Create an enum without members
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            is_flags: false,
        }
    }

    /// Create a flags enum whose members combine bitwise
    pub fn flags(name: impl Into<String>) -> Self {
        Self {
            is_flags: true,
            ..Self::new(name)
        }
    }

    /// Add a member
    pub fn member(mut self, name: impl Into<String>, value: i64) -> Self {
        self.members.push((name.into(), value));
        self
    }

    /// Enum type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether members combine bitwise
    pub fn is_flags(&self) -> bool {
        self.is_flags
    }

    /// Members in declaration order
    pub fn members(&self) -> &[(String, i64)] {
        &self.members
    }

    /// Value of a member, compared case-insensitively
    pub fn value_of(&self, member: &str) -> Option<i64> {
        self.members
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(member))
            .map(|(_, value)| *value)
    }

    /// Member name for a value; flags values are rendered as `A, B`
    ///
    /// Returns `None` when the value is not defined.
    pub fn name_of(&self, value: i64) -> Option<String> {
        if let Some((name, _)) = self.members.iter().find(|(_, v)| *v == value) {
            return Some(name.clone());
        }

        if !self.is_flags || value == 0 {
            return None;
        }

        let mut remaining = value;
        let mut names = Vec::new();
        for (name, member) in &self.members {
            if *member != 0 && value & member == *member {
                names.push(name.as_str());
                remaining &= !member;
            }
        }

        if remaining == 0 {
            Some(names.join(", "))
        } else {
            None
        }
    }

    /// Whether the value is a member or, for flags enums, a combination of members
    pub fn is_defined(&self, value: i64) -> bool {
        self.name_of(value).is_some()
    }
}

/// A named complex type and its bindable properties
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexTypeDefinition {
    name: String,
    properties: Vec<PropertyDefinition>,
    has_default_constructor: bool,
}

impl ComplexTypeDefinition {
    /// Create a complex type with a default constructor
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            has_default_constructor: true,
        }
    }

    /// Add a property
    pub fn property(mut self, property: PropertyDefinition) -> Self {
        self.properties.push(property);
        self
    }

    /// Mark the type as not constructible by the binder
    pub fn without_default_constructor(mut self) -> Self {
        self.has_default_constructor = false;
        self
    }

    /// Type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Properties in declaration order
    pub fn properties(&self) -> &[PropertyDefinition] {
        &self.properties
    }

    /// Whether the binder can construct an instance
    pub fn has_default_constructor(&self) -> bool {
        self.has_default_constructor
    }
}

/// Declaration of one property of a complex type
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDefinition {
    pub(crate) name: String,
    pub(crate) model_type: ModelType,
    pub(crate) binding_source: Option<BindingSource>,
    pub(crate) binder_model_name: Option<String>,
    pub(crate) binder_type: Option<String>,
    pub(crate) is_required: bool,
    pub(crate) is_read_only: bool,
    pub(crate) is_binding_allowed: bool,
    pub(crate) default_value: Option<ModelValue>,
}

impl PropertyDefinition {
    /// Create a writable, bindable property
    pub fn new(name: impl Into<String>, model_type: ModelType) -> Self {
        Self {
            name: name.into(),
            model_type,
            binding_source: None,
            binder_model_name: None,
            binder_type: None,
            is_required: false,
            is_read_only: false,
            is_binding_allowed: true,
            default_value: None,
        }
    }

    /// Restrict the property to a binding source
    pub fn from_source(mut self, source: BindingSource) -> Self {
        self.binding_source = Some(source);
        self
    }

    /// Bind from the query string
    pub fn from_query(self) -> Self {
        self.from_source(BindingSource::Query)
    }

    /// Bind from the route
    pub fn from_route(self) -> Self {
        self.from_source(BindingSource::Path)
    }

    /// Bind from form fields
    pub fn from_form(self) -> Self {
        self.from_source(BindingSource::Form)
    }

    /// Bind from a request header named like the property
    pub fn from_header(self) -> Self {
        self.from_source(BindingSource::Header)
    }

    /// Bind from the request body
    pub fn from_body(self) -> Self {
        self.from_source(BindingSource::Body)
    }

    /// Resolve from the service registry
    pub fn from_services(self) -> Self {
        self.from_source(BindingSource::Services)
    }

    /// Bind with a registered binder type
    pub fn with_binder(mut self, binder_type: impl Into<String>) -> Self {
        self.binder_type = Some(binder_type.into());
        self
    }

    /// Bind under a different name than the property name
    pub fn binder_model_name(mut self, name: impl Into<String>) -> Self {
        self.binder_model_name = Some(name.into());
        self
    }

    /// Mark the property as required
    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    /// Mark the property as read-only; it is never assigned
    pub fn read_only(mut self) -> Self {
        self.is_read_only = true;
        self
    }

    /// Exclude the property from binding
    pub fn bind_never(mut self) -> Self {
        self.is_binding_allowed = false;
        self
    }

    /// Value assigned when a fresh instance is constructed
    pub fn default_value(mut self, value: ModelValue) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Property name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Property type
    pub fn model_type(&self) -> &ModelType {
        &self.model_type
    }
}
