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

//! Binding configuration options

use serde::{Deserialize, Serialize};

/// Configuration for model binding behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingOptions {
    /// Whether an integer outside an enum's defined members binds as-is
    pub allow_binding_undefined_value_to_enum_type: bool,

    /// Whether an empty request body is accepted when binding from the body
    pub allow_empty_input_in_body_model_binding: bool,

    /// Maximum nesting depth of recursive binds
    pub max_model_binding_recursion_depth: usize,

    /// Maximum number of errors recorded in the model state
    pub max_model_validation_errors: usize,
}

impl BindingOptions {
    /// Create a configuration that rejects undefined enum values and empty bodies
    pub fn strict() -> Self {
        Self {
            allow_binding_undefined_value_to_enum_type: false,
            allow_empty_input_in_body_model_binding: false,
            max_model_binding_recursion_depth: 16,
            max_model_validation_errors: 50,
        }
    }

    /// Create a configuration that accepts undefined enum values and empty bodies
    pub fn permissive() -> Self {
        Self {
            allow_binding_undefined_value_to_enum_type: true,
            allow_empty_input_in_body_model_binding: true,
            max_model_binding_recursion_depth: 64,
            max_model_validation_errors: 1_000,
        }
    }

    /// Create a configuration for testing
    pub fn testing() -> Self {
        Self {
            max_model_binding_recursion_depth: 8,
            max_model_validation_errors: 10,
            ..Self::default()
        }
    }

    /// Load options from a JSON document; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for BindingOptions {
    fn default() -> Self {
        Self {
            allow_binding_undefined_value_to_enum_type: false,
            allow_empty_input_in_body_model_binding: false,
            max_model_binding_recursion_depth: 32,
            max_model_validation_errors: 200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_options_default() {
        let options = BindingOptions::default();
        assert!(!options.allow_binding_undefined_value_to_enum_type);
        assert!(!options.allow_empty_input_in_body_model_binding);
        assert_eq!(options.max_model_binding_recursion_depth, 32);
        assert_eq!(options.max_model_validation_errors, 200);
    }

    #[test]
    fn test_binding_options_presets() {
        assert!(BindingOptions::permissive().allow_binding_undefined_value_to_enum_type);
        assert!(!BindingOptions::strict().allow_binding_undefined_value_to_enum_type);
        assert_eq!(BindingOptions::testing().max_model_validation_errors, 10);
    }

    #[test]
    fn test_binding_options_from_json() {
        let options = BindingOptions::from_json(
            r#"{ "allow_binding_undefined_value_to_enum_type": true, "max_model_validation_errors": 5 }"#,
        )
        .unwrap();
        assert!(options.allow_binding_undefined_value_to_enum_type);
        assert_eq!(options.max_model_validation_errors, 5);
        assert_eq!(options.max_model_binding_recursion_depth, 32);
    }
}
