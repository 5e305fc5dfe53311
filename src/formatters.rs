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

//! Input formatters reading the request body into a model

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::model::{Culture, ModelMetadata, ModelObject, ModelType, ModelValue, TypeCoercion};

/// Errors raised by an input formatter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputFormatterError {
    /// The body is not well-formed for the media type
    #[error("The input was not valid: {reason}")]
    Malformed {
        /// Parser message
        reason: String,
    },

    /// The body is well-formed but does not fit the model type
    #[error("The input does not match the type '{model_type}': {reason}")]
    TypeMismatch {
        /// Target model type
        model_type: String,
        /// Why the value does not fit
        reason: String,
    },
}

impl InputFormatterError {
    /// Create a malformed input error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(model_type: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TypeMismatch {
            model_type: model_type.into(),
            reason: reason.into(),
        }
    }
}

/// Reads a request body of some media types into a model
pub trait InputFormatter: Send + Sync + fmt::Debug {
    /// Whether this formatter handles the media type
    fn can_read(&self, media_type: Option<&str>) -> bool;

    /// Read a non-empty body into the model described by `metadata`
    fn read(&self, body: &[u8], metadata: &ModelMetadata) -> Result<ModelValue, InputFormatterError>;
}

/// JSON input formatter backed by `serde_json`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonInputFormatter;

impl JsonInputFormatter {
    fn shape(value: ModelValue, metadata: &ModelMetadata) -> Result<ModelValue, InputFormatterError> {
        let model_type = metadata.model_type().underlying_or_model_type();
        match (model_type, value) {
            (_, ModelValue::Null) => Ok(ModelValue::Null),
            (ModelType::Simple(_) | ModelType::FloatingPoint(_) | ModelType::Enum(_), value) => {
                let text = value.to_string_value().ok_or_else(|| {
                    InputFormatterError::type_mismatch(model_type.type_name(), "expected a scalar")
                })?;
                TypeCoercion::convert(&text, metadata, &Culture::invariant(), true).map_err(
                    |error| InputFormatterError::type_mismatch(model_type.type_name(), error.to_string()),
                )
            }
            (ModelType::Complex(name), ModelValue::Object(object)) => {
                let mut typed = ModelObject::new(name.clone());
                for (key, value) in object.properties() {
                    typed.set(key.clone(), value.clone());
                }
                Ok(ModelValue::Object(typed))
            }
            (ModelType::Complex(_), _) => Err(InputFormatterError::type_mismatch(
                model_type.type_name(),
                "expected an object",
            )),
            (ModelType::Array(_) | ModelType::List(_), value @ ModelValue::List(_)) => Ok(value),
            (ModelType::Array(_) | ModelType::List(_), _) => Err(
                InputFormatterError::type_mismatch(model_type.type_name(), "expected an array"),
            ),
            (_, value) => Ok(value),
        }
    }
}

impl InputFormatter for JsonInputFormatter {
    fn can_read(&self, media_type: Option<&str>) -> bool {
        let Some(media_type) = media_type else {
            return false;
        };
        let media_type = media_type.to_ascii_lowercase();
        media_type == "application/json"
            || media_type == "text/json"
            || (media_type.starts_with("application/") && media_type.ends_with("+json"))
    }

    fn read(&self, body: &[u8], metadata: &ModelMetadata) -> Result<ModelValue, InputFormatterError> {
        let json: serde_json::Value = serde_json::from_slice(body)
            .map_err(|error| InputFormatterError::malformed(error.to_string()))?;
        Self::shape(ModelValue::from(json), metadata)
    }
}

/// Formatters registered by default
pub fn create_standard_input_formatters() -> Vec<Arc<dyn InputFormatter>> {
    vec![Arc::new(JsonInputFormatter)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(Some("application/json"), true)]
    #[case(Some("Application/JSON"), true)]
    #[case(Some("text/json"), true)]
    #[case(Some("application/problem+json"), true)]
    #[case(Some("application/xml"), false)]
    #[case(None, false)]
    fn test_json_media_types(#[case] media_type: Option<&str>, #[case] expected: bool) {
        assert_eq!(JsonInputFormatter.can_read(media_type), expected);
    }

    #[test]
    fn test_reads_object_as_named_type() {
        let metadata = ModelMetadata::for_type(ModelType::complex("Person"));
        let value = JsonInputFormatter
            .read(br#"{"Name":"Ada","Age":36}"#, &metadata)
            .unwrap();
        let person = value.as_object().unwrap();
        assert_eq!(person.type_name(), "Person");
        assert_eq!(person.get("Age"), Some(&ModelValue::Integer(36)));
    }

    #[test]
    fn test_malformed_and_mismatched_input() {
        let metadata = ModelMetadata::for_type(ModelType::complex("Person"));
        assert!(matches!(
            JsonInputFormatter.read(b"{", &metadata),
            Err(InputFormatterError::Malformed { .. })
        ));
        assert!(matches!(
            JsonInputFormatter.read(b"[1]", &metadata),
            Err(InputFormatterError::TypeMismatch { .. })
        ));

        let number = ModelMetadata::for_type(ModelType::int32());
        assert_eq!(
            JsonInputFormatter.read(b"42", &number).unwrap(),
            ModelValue::Integer(42)
        );
    }
}
