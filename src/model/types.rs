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

//! Type system definitions for bindable models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Types converted from a single string with a culture-aware converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimpleType {
    /// Text, bound without conversion
    String,
    /// true/false
    Boolean,
    /// Single character
    Char,
    /// 8-bit signed integer
    Int8,
    /// 16-bit signed integer
    Int16,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 8-bit unsigned integer
    UInt8,
    /// 16-bit unsigned integer
    UInt16,
    /// 32-bit unsigned integer
    UInt32,
    /// 64-bit unsigned integer
    UInt64,
    /// Date and time with offset
    DateTime,
    /// Calendar date
    Date,
    /// Absolute URI
    Uri,
}

impl SimpleType {
    /// Type name used in messages and metadata
    pub fn name(&self) -> &'static str {
        match self {
            SimpleType::String => "String",
            SimpleType::Boolean => "Boolean",
            SimpleType::Char => "Char",
            SimpleType::Int8 => "SByte",
            SimpleType::Int16 => "Int16",
            SimpleType::Int32 => "Int32",
            SimpleType::Int64 => "Int64",
            SimpleType::UInt8 => "Byte",
            SimpleType::UInt16 => "UInt16",
            SimpleType::UInt32 => "UInt32",
            SimpleType::UInt64 => "UInt64",
            SimpleType::DateTime => "DateTime",
            SimpleType::Date => "Date",
            SimpleType::Uri => "Uri",
        }
    }

    /// Inclusive range for signed integer types
    pub fn signed_range(&self) -> Option<(i64, i64)> {
        match self {
            SimpleType::Int8 => Some((i8::MIN as i64, i8::MAX as i64)),
            SimpleType::Int16 => Some((i16::MIN as i64, i16::MAX as i64)),
            SimpleType::Int32 => Some((i32::MIN as i64, i32::MAX as i64)),
            SimpleType::Int64 => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }

    /// Inclusive upper bound for unsigned integer types
    pub fn unsigned_max(&self) -> Option<u64> {
        match self {
            SimpleType::UInt8 => Some(u8::MAX as u64),
            SimpleType::UInt16 => Some(u16::MAX as u64),
            SimpleType::UInt32 => Some(u32::MAX as u64),
            SimpleType::UInt64 => Some(u64::MAX),
            _ => None,
        }
    }
}

/// Floating point types bound with a fixed number-style policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FloatingPointType {
    /// 32-bit IEEE float
    Float32,
    /// 64-bit IEEE float
    Float64,
    /// 96-bit decimal
    Decimal,
}

impl FloatingPointType {
    /// Type name used in messages and metadata
    pub fn name(&self) -> &'static str {
        match self {
            FloatingPointType::Float32 => "Single",
            FloatingPointType::Float64 => "Double",
            FloatingPointType::Decimal => "Decimal",
        }
    }
}

/// Structural description of a bindable target type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelType {
    /// Primitive converted from one string
    Simple(SimpleType),
    /// Floating point number
    FloatingPoint(FloatingPointType),
    /// Optional wrapper around a value type
    Nullable(Box<ModelType>),
    /// Named enum registered with the metadata provider
    Enum(String),
    /// Fixed array of elements
    Array(Box<ModelType>),
    /// Growable list of elements
    List(Box<ModelType>),
    /// Dictionary with key and value types
    Dictionary(Box<ModelType>, Box<ModelType>),
    /// Key/value pair
    KeyValuePair(Box<ModelType>, Box<ModelType>),
    /// Named complex type with bindable properties
    Complex(String),
    /// Named type without bindable structure (services, interfaces)
    Opaque(String),
    /// One uploaded file
    FormFile,
    /// All uploaded files of a field
    FormFileCollection,
    /// The raw form
    FormCollection,
    /// Request cancellation token
    CancellationToken,
    /// Reflection type handle, never bound
    Type,
    /// Raw stream, never bound
    Stream,
}

impl ModelType {
    /// String type
    pub fn string() -> Self {
        ModelType::Simple(SimpleType::String)
    }

    /// Boolean type
    pub fn boolean() -> Self {
        ModelType::Simple(SimpleType::Boolean)
    }

    /// 32-bit integer type
    pub fn int32() -> Self {
        ModelType::Simple(SimpleType::Int32)
    }

    /// 64-bit integer type
    pub fn int64() -> Self {
        ModelType::Simple(SimpleType::Int64)
    }

    /// 64-bit float type
    pub fn float64() -> Self {
        ModelType::FloatingPoint(FloatingPointType::Float64)
    }

    /// Decimal type
    pub fn decimal() -> Self {
        ModelType::FloatingPoint(FloatingPointType::Decimal)
    }

    /// Byte array, bound from base64
    pub fn byte_array() -> Self {
        ModelType::Array(Box::new(ModelType::Simple(SimpleType::UInt8)))
    }

    /// Nullable wrapper
    pub fn nullable(inner: ModelType) -> Self {
        ModelType::Nullable(Box::new(inner))
    }

    /// Array of elements
    pub fn array(element: ModelType) -> Self {
        ModelType::Array(Box::new(element))
    }

    /// List of elements
    pub fn list(element: ModelType) -> Self {
        ModelType::List(Box::new(element))
    }

    /// Dictionary
    pub fn dictionary(key: ModelType, value: ModelType) -> Self {
        ModelType::Dictionary(Box::new(key), Box::new(value))
    }

    /// Key/value pair
    pub fn key_value_pair(key: ModelType, value: ModelType) -> Self {
        ModelType::KeyValuePair(Box::new(key), Box::new(value))
    }

    /// Named complex type
    pub fn complex(name: impl Into<String>) -> Self {
        ModelType::Complex(name.into())
    }

    /// Named enum type
    pub fn enumeration(name: impl Into<String>) -> Self {
        ModelType::Enum(name.into())
    }

    /// Named opaque type
    pub fn opaque(name: impl Into<String>) -> Self {
        ModelType::Opaque(name.into())
    }

    /// The type with any nullable wrapper removed
    pub fn underlying_or_model_type(&self) -> &ModelType {
        match self {
            ModelType::Nullable(inner) => inner.underlying_or_model_type(),
            other => other,
        }
    }

    /// Whether this is a nullable wrapper
    pub fn is_nullable(&self) -> bool {
        matches!(self, ModelType::Nullable(_))
    }

    /// Whether this is the base64-bound byte array
    pub fn is_byte_array(&self) -> bool {
        matches!(self, ModelType::Array(element) if **element == ModelType::Simple(SimpleType::UInt8))
    }

    /// Element type of a collection; a dictionary's elements are key/value pairs
    pub fn element_type(&self) -> Option<ModelType> {
        match self.underlying_or_model_type() {
            ModelType::Array(element) | ModelType::List(element) => Some((**element).clone()),
            ModelType::Dictionary(key, value) => Some(ModelType::KeyValuePair(
                key.clone(),
                value.clone(),
            )),
            ModelType::FormFileCollection => Some(ModelType::FormFile),
            _ => None,
        }
    }

    /// Whether this is a collection of the given element type
    pub fn is_collection_of(&self, element: &ModelType) -> bool {
        self.element_type().as_ref() == Some(element)
    }

    /// Type name used in messages and service lookups
    pub fn type_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelType::Simple(simple) => write!(f, "{}", simple.name()),
            ModelType::FloatingPoint(float) => write!(f, "{}", float.name()),
            ModelType::Nullable(inner) => write!(f, "Nullable<{inner}>"),
            ModelType::Enum(name) | ModelType::Complex(name) | ModelType::Opaque(name) => {
                write!(f, "{name}")
            }
            ModelType::Array(element) => write!(f, "{element}[]"),
            ModelType::List(element) => write!(f, "List<{element}>"),
            ModelType::Dictionary(key, value) => write!(f, "Dictionary<{key}, {value}>"),
            ModelType::KeyValuePair(key, value) => write!(f, "KeyValuePair<{key}, {value}>"),
            ModelType::FormFile => write!(f, "FormFile"),
            ModelType::FormFileCollection => write!(f, "FormFileCollection"),
            ModelType::FormCollection => write!(f, "FormCollection"),
            ModelType::CancellationToken => write!(f, "CancellationToken"),
            ModelType::Type => write!(f, "Type"),
            ModelType::Stream => write!(f, "Stream"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(ModelType::int32().to_string(), "Int32");
        assert_eq!(
            ModelType::dictionary(ModelType::string(), ModelType::list(ModelType::int32()))
                .to_string(),
            "Dictionary<String, List<Int32>>"
        );
        assert_eq!(ModelType::byte_array().to_string(), "Byte[]");
        assert_eq!(
            ModelType::nullable(ModelType::decimal()).to_string(),
            "Nullable<Decimal>"
        );
    }

    #[test]
    fn test_element_types() {
        assert_eq!(
            ModelType::list(ModelType::complex("Person")).element_type(),
            Some(ModelType::complex("Person"))
        );
        assert_eq!(
            ModelType::dictionary(ModelType::string(), ModelType::int32()).element_type(),
            Some(ModelType::key_value_pair(ModelType::string(), ModelType::int32()))
        );
        assert_eq!(
            ModelType::FormFileCollection.element_type(),
            Some(ModelType::FormFile)
        );
        assert!(ModelType::int32().element_type().is_none());
    }

    #[test]
    fn test_underlying_type() {
        let nullable = ModelType::nullable(ModelType::int32());
        assert!(nullable.is_nullable());
        assert_eq!(nullable.underlying_or_model_type(), &ModelType::int32());
        assert!(ModelType::byte_array().is_byte_array());
        assert!(!ModelType::array(ModelType::int32()).is_byte_array());
    }
}
