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

//! Bound model values
//!
//! Binders produce [`ModelValue`]s: a dynamic object graph shaped by the
//! model metadata. The graph converts to JSON and, through serde, into any
//! `DeserializeOwned` Rust type.

use chrono::{DateTime, FixedOffset, NaiveDate};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::request::{FormCollection, FormFile};
use crate::services::ServiceInstance;

/// A bound value
#[derive(Debug, Clone)]
pub enum ModelValue {
    /// No value
    Null,
    /// Boolean value
    Boolean(bool),
    /// Single character
    Char(char),
    /// Signed integer of any width
    Integer(i64),
    /// Unsigned integer of any width
    UnsignedInteger(u64),
    /// IEEE float
    Float(f64),
    /// Decimal number
    Decimal(Decimal),
    /// Text
    String(String),
    /// Date and time with offset
    DateTime(DateTime<FixedOffset>),
    /// Calendar date
    Date(NaiveDate),
    /// Absolute URI
    Uri(Url),
    /// Enum member or raw enum value
    Enum(EnumValue),
    /// Byte sequence
    Bytes(Vec<u8>),
    /// Array or list elements in bind order
    List(Vec<ModelValue>),
    /// Dictionary entries in discovery order
    Dictionary(Vec<(ModelValue, ModelValue)>),
    /// Key/value pair
    Pair(Box<ModelValue>, Box<ModelValue>),
    /// Complex object
    Object(ModelObject),
    /// One uploaded file
    File(FormFile),
    /// Several uploaded files
    Files(Vec<FormFile>),
    /// The raw form
    Form(FormCollection),
    /// Instance resolved from the service registry
    Service(ServiceInstance),
    /// The request cancellation token
    CancellationToken(CancellationToken),
}

/// A value of a named enum
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    /// Enum type name
    pub enum_name: String,
    /// Underlying integer value
    pub value: i64,
    /// Member name(s) when the value is defined
    pub name: Option<String>,
}

/// A bound complex object
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelObject {
    type_name: String,
    properties: IndexMap<String, ModelValue>,
}

impl ModelObject {
    /// Create an object without properties
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            properties: IndexMap::new(),
        }
    }

    /// Type name of the object
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Get a property value
    pub fn get(&self, name: &str) -> Option<&ModelValue> {
        self.properties.get(name)
    }

    /// Set a property value, keeping declaration order for existing properties
    pub fn set(&mut self, name: impl Into<String>, value: ModelValue) {
        self.properties.insert(name.into(), value);
    }

    /// Iterate properties in declaration order
    pub fn properties(&self) -> impl Iterator<Item = (&String, &ModelValue)> {
        self.properties.iter()
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the object has no properties
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl ModelValue {
    /// Create a string value
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Check if this is the null value
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the type name for this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Boolean(_) => "Boolean",
            Self::Char(_) => "Char",
            Self::Integer(_) => "Integer",
            Self::UnsignedInteger(_) => "UnsignedInteger",
            Self::Float(_) => "Float",
            Self::Decimal(_) => "Decimal",
            Self::String(_) => "String",
            Self::DateTime(_) => "DateTime",
            Self::Date(_) => "Date",
            Self::Uri(_) => "Uri",
            Self::Enum(_) => "Enum",
            Self::Bytes(_) => "Bytes",
            Self::List(_) => "List",
            Self::Dictionary(_) => "Dictionary",
            Self::Pair(_, _) => "Pair",
            Self::Object(_) => "Object",
            Self::File(_) => "File",
            Self::Files(_) => "Files",
            Self::Form(_) => "Form",
            Self::Service(_) => "Service",
            Self::CancellationToken(_) => "CancellationToken",
        }
    }

    /// Try to get a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get a signed integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::UnsignedInteger(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    /// Try to get a boolean
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get list elements
    pub fn as_list(&self) -> Option<&[ModelValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Try to get an object
    pub fn as_object(&self) -> Option<&ModelObject> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Try to get dictionary entries
    pub fn as_dictionary(&self) -> Option<&[(ModelValue, ModelValue)]> {
        match self {
            Self::Dictionary(entries) => Some(entries),
            _ => None,
        }
    }

    /// Text form of a scalar, used for dictionary keys and display
    pub fn to_string_value(&self) -> Option<String> {
        match self {
            Self::String(s) => Some(s.clone()),
            Self::Boolean(b) => Some(b.to_string()),
            Self::Char(c) => Some(c.to_string()),
            Self::Integer(i) => Some(i.to_string()),
            Self::UnsignedInteger(u) => Some(u.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Decimal(d) => Some(d.to_string()),
            Self::DateTime(dt) => Some(dt.to_rfc3339()),
            Self::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Self::Uri(u) => Some(u.to_string()),
            Self::Enum(e) => Some(e.name.clone().unwrap_or_else(|| e.value.to_string())),
            _ => None,
        }
    }

    /// Convert to JSON
    pub fn to_json(&self) -> Value {
        Value::from(self.clone())
    }

    /// Deserialize the bound graph into a Rust type
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::from(self))
    }
}

impl PartialEq for ModelValue {
    fn eq(&self, other: &Self) -> bool {
        use ModelValue::*;
        match (self, other) {
            (Null, Null) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (Char(a), Char(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (UnsignedInteger(a), UnsignedInteger(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Decimal(a), Decimal(b)) => a == b,
            (String(a), String(b)) => a == b,
            (DateTime(a), DateTime(b)) => a == b,
            (Date(a), Date(b)) => a == b,
            (Uri(a), Uri(b)) => a == b,
            (Enum(a), Enum(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (List(a), List(b)) => a == b,
            (Dictionary(a), Dictionary(b)) => a == b,
            (Pair(ak, av), Pair(bk, bv)) => ak == bk && av == bv,
            (Object(a), Object(b)) => a == b,
            (File(a), File(b)) => a == b,
            (Files(a), Files(b)) => a == b,
            (Form(a), Form(b)) => a == b,
            (Service(a), Service(b)) => a == b,
            // Tokens carry no comparable state beyond cancellation.
            (CancellationToken(a), CancellationToken(b)) => a.is_cancelled() == b.is_cancelled(),
            _ => false,
        }
    }
}

/// Convert from serde_json::Value to ModelValue
impl From<Value> for ModelValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Boolean(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    Self::UnsignedInteger(u)
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(items.into_iter().map(ModelValue::from).collect()),
            Value::Object(map) => {
                let mut object = ModelObject::new("");
                for (key, value) in map {
                    object.set(key, ModelValue::from(value));
                }
                Self::Object(object)
            }
        }
    }
}

/// Convert from ModelValue to serde_json::Value
impl From<ModelValue> for Value {
    fn from(model_value: ModelValue) -> Self {
        match model_value {
            ModelValue::Null | ModelValue::Service(_) | ModelValue::CancellationToken(_) => {
                Value::Null
            }
            ModelValue::Boolean(b) => Value::Bool(b),
            ModelValue::Char(c) => Value::String(c.to_string()),
            ModelValue::Integer(i) => Value::Number(i.into()),
            ModelValue::UnsignedInteger(u) => Value::Number(u.into()),
            ModelValue::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            // Decimals travel as strings to keep their precision.
            ModelValue::Decimal(d) => Value::String(d.to_string()),
            ModelValue::String(s) => Value::String(s),
            ModelValue::DateTime(dt) => Value::String(dt.to_rfc3339()),
            ModelValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            ModelValue::Uri(u) => Value::String(u.to_string()),
            ModelValue::Enum(e) => match e.name {
                Some(name) => Value::String(name),
                None => Value::Number(e.value.into()),
            },
            ModelValue::Bytes(bytes) => {
                Value::Array(bytes.into_iter().map(|b| Value::Number(b.into())).collect())
            }
            ModelValue::List(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            ModelValue::Dictionary(entries) => {
                let mut map = serde_json::Map::new();
                for (key, value) in entries {
                    let key = key.to_string_value().unwrap_or_default();
                    map.insert(key, Value::from(value));
                }
                Value::Object(map)
            }
            ModelValue::Pair(key, value) => {
                let mut map = serde_json::Map::new();
                map.insert("key".to_string(), Value::from(*key));
                map.insert("value".to_string(), Value::from(*value));
                Value::Object(map)
            }
            ModelValue::Object(object) => {
                let mut map = serde_json::Map::new();
                for (key, value) in object.properties {
                    map.insert(key, Value::from(value));
                }
                Value::Object(map)
            }
            ModelValue::File(file) => file.to_json(),
            ModelValue::Files(files) => Value::Array(files.iter().map(FormFile::to_json).collect()),
            ModelValue::Form(form) => form.to_json(),
        }
    }
}

impl Serialize for ModelValue {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let json_value: Value = self.clone().into();
        json_value.serialize(serializer)
    }
}

impl fmt::Display for ModelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_string_value() {
            Some(text) => write!(f, "{text}"),
            None => write!(f, "{}", self.to_json()),
        }
    }
}

impl From<&str> for ModelValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ModelValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for ModelValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for ModelValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}
