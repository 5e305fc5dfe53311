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

//! Field-level binding errors recorded in the model state

use thiserror::Error;

/// A structured error recorded against a model name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A property value could not be converted
    #[error("The value '{attempted_value}' is not valid for {field}.")]
    AttemptedValueIsInvalid {
        /// The raw text
        attempted_value: String,
        /// Display name of the field
        field: String,
        /// Name of the target type
        target_type: String,
    },

    /// A top-level value could not be converted
    #[error("The value '{attempted_value}' is not valid.")]
    NonPropertyAttemptedValueIsInvalid {
        /// The raw text
        attempted_value: String,
        /// Name of the target type
        target_type: String,
    },

    /// An enum value is not a defined member
    #[error("The value '{attempted_value}' is invalid.")]
    UndefinedEnumValue {
        /// The raw text
        attempted_value: String,
        /// Name of the enum
        enum_name: String,
    },

    /// Text is not valid base64
    #[error("The value '{attempted_value}' is not a valid Base64 string.")]
    InvalidBase64 {
        /// The raw text
        attempted_value: String,
    },

    /// One side of a key/value pair is missing
    #[error("A value is required.")]
    MissingKeyOrValue,

    /// The body is empty but a model was expected
    #[error("A non-empty request body is required.")]
    MissingRequestBody,

    /// No input formatter handles the content type
    #[error("Unsupported content type '{content_type}'.")]
    UnsupportedContentType {
        /// The request content type
        content_type: String,
    },

    /// An input formatter rejected the body
    #[error("{detail}")]
    InvalidInput {
        /// Formatter message
        detail: String,
    },

    /// The maximum number of errors was reached
    #[error("The maximum number of allowed model errors has been reached.")]
    TooManyModelErrors,

    /// Error raised by a custom binder
    #[error("{0}")]
    Custom(String),
}

impl ModelError {
    /// Conversion error for a value; property errors name the field
    pub fn attempted_value_is_invalid(
        attempted_value: impl Into<String>,
        field: Option<&str>,
        target_type: impl Into<String>,
    ) -> Self {
        match field {
            Some(field) => Self::AttemptedValueIsInvalid {
                attempted_value: attempted_value.into(),
                field: field.to_string(),
                target_type: target_type.into(),
            },
            None => Self::NonPropertyAttemptedValueIsInvalid {
                attempted_value: attempted_value.into(),
                target_type: target_type.into(),
            },
        }
    }

    /// Custom error message
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}
