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

//! Error types for model binding
//!
//! Field-level problems (malformed input) never surface here: they are
//! accumulated as [`ModelError`](crate::state::ModelError) entries in the
//! model state. [`BindingError`] is reserved for configuration defects,
//! request I/O failures and cancellation, all of which interrupt the bind.

use thiserror::Error;

/// Result type for binding operations
pub type BindingResult<T> = Result<T, BindingError>;

/// Errors that interrupt a bind operation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindingError {
    /// Complex type cannot be constructed
    #[error("Type '{type_name}' must have a default constructor to be bound as a complex type")]
    MissingDefaultConstructor {
        /// The complex type name
        type_name: String,
    },

    /// Binder type nominated by metadata is not registered
    #[error("Binder type '{binder_type}' is not registered as a model binder")]
    UnknownBinderType {
        /// The nominated binder name
        binder_type: String,
    },

    /// Nominated binder failed to activate
    #[error("Binder type '{binder_type}' could not be activated: {reason}")]
    BinderActivationFailed {
        /// The nominated binder name
        binder_type: String,
        /// Reason for the failure
        reason: String,
    },

    /// Service registry has no registration for the requested type
    #[error("No service for type '{type_name}' has been registered")]
    ServiceNotRegistered {
        /// The requested service type
        type_name: String,
    },

    /// Metadata provider does not know a named type
    #[error("Model type '{type_name}' is not known to the metadata provider")]
    UnknownModelType {
        /// The unknown type name
        type_name: String,
    },

    /// Body binding was requested but no input formatter is configured
    #[error("No input formatters are configured to bind '{model_type}' from the request body")]
    NoInputFormatters {
        /// The model type bound from the body
        model_type: String,
    },

    /// Recursive binding went deeper than allowed
    #[error("Model binding exceeded the maximum recursion depth of {max_depth} at '{model_name}'")]
    RecursionDepthExceeded {
        /// Model name at which the limit was hit
        model_name: String,
        /// Configured maximum depth
        max_depth: usize,
    },

    /// Reading the request failed
    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    /// Bind operation was cancelled
    #[error("Model binding was cancelled")]
    Cancelled,
}

impl BindingError {
    /// Create a missing default constructor error
    pub fn missing_default_constructor(type_name: impl Into<String>) -> Self {
        Self::MissingDefaultConstructor {
            type_name: type_name.into(),
        }
    }

    /// Create an unknown binder type error
    pub fn unknown_binder_type(binder_type: impl Into<String>) -> Self {
        Self::UnknownBinderType {
            binder_type: binder_type.into(),
        }
    }

    /// Create a binder activation error
    pub fn binder_activation_failed(
        binder_type: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::BinderActivationFailed {
            binder_type: binder_type.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing service error
    pub fn service_not_registered(type_name: impl Into<String>) -> Self {
        Self::ServiceNotRegistered {
            type_name: type_name.into(),
        }
    }

    /// Create an unknown model type error
    pub fn unknown_model_type(type_name: impl Into<String>) -> Self {
        Self::UnknownModelType {
            type_name: type_name.into(),
        }
    }

    /// Whether this error signals a development-time configuration defect
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, Self::Request(_) | Self::Cancelled)
    }

    /// Whether this error signals cancellation
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Errors raised while reading request data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    /// The request body could not be read
    #[error("Failed to read the request body: {reason}")]
    BodyRead {
        /// Reason for the failure
        reason: String,
    },

    /// The form could not be read
    #[error("Failed to read the request form: {reason}")]
    FormRead {
        /// Reason for the failure
        reason: String,
    },
}

impl RequestError {
    /// Create a body read error
    pub fn body_read(reason: impl Into<String>) -> Self {
        Self::BodyRead {
            reason: reason.into(),
        }
    }

    /// Create a form read error
    pub fn form_read(reason: impl Into<String>) -> Self {
        Self::FormRead {
            reason: reason.into(),
        }
    }
}
