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

//! Binding sources: where a value is expected to come from

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag classifying the origin of bound data
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingSource {
    /// Query string values
    Query,
    /// Form fields
    Form,
    /// Route segments
    Path,
    /// Request headers
    Header,
    /// Request body read by an input formatter
    Body,
    /// Request-scoped service registry
    Services,
    /// Uploaded files
    FormFile,
    /// Framework values such as the cancellation token
    Special,
    /// Composite of form, route and query values
    ModelBinding,
    /// Application-defined source
    Custom {
        /// Identifier compared for equality
        id: String,
        /// Whether the source supplies a whole model at once
        is_greedy: bool,
        /// Whether the data comes from the request
        is_from_request: bool,
    },
}

impl BindingSource {
    /// Create a custom binding source
    pub fn custom(id: impl Into<String>, is_greedy: bool, is_from_request: bool) -> Self {
        BindingSource::Custom {
            id: id.into(),
            is_greedy,
            is_from_request,
        }
    }

    /// Identifier of the source
    pub fn id(&self) -> &str {
        match self {
            BindingSource::Query => "Query",
            BindingSource::Form => "Form",
            BindingSource::Path => "Path",
            BindingSource::Header => "Header",
            BindingSource::Body => "Body",
            BindingSource::Services => "Services",
            BindingSource::FormFile => "FormFile",
            BindingSource::Special => "Special",
            BindingSource::ModelBinding => "ModelBinding",
            BindingSource::Custom { id, .. } => id,
        }
    }

    /// Greedy sources bind a whole model at once instead of value by value
    pub fn is_greedy(&self) -> bool {
        match self {
            BindingSource::Body
            | BindingSource::Header
            | BindingSource::Services
            | BindingSource::FormFile
            | BindingSource::Special => true,
            BindingSource::Query
            | BindingSource::Form
            | BindingSource::Path
            | BindingSource::ModelBinding => false,
            BindingSource::Custom { is_greedy, .. } => *is_greedy,
        }
    }

    /// Whether the data is read from the request
    pub fn is_from_request(&self) -> bool {
        match self {
            BindingSource::Services | BindingSource::Special => false,
            BindingSource::Custom {
                is_from_request, ..
            } => *is_from_request,
            _ => true,
        }
    }

    /// Whether this source accepts data that was claimed for `other`
    ///
    /// `ModelBinding` is a composite and accepts form, route and query data.
    pub fn can_accept_data_from(&self, other: &BindingSource) -> bool {
        if self == other {
            return true;
        }

        match self {
            BindingSource::ModelBinding => matches!(
                other,
                BindingSource::Form | BindingSource::Path | BindingSource::Query
            ),
            _ => false,
        }
    }
}

impl fmt::Display for BindingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_accept_data_from() {
        assert!(BindingSource::Header.can_accept_data_from(&BindingSource::Header));
        assert!(!BindingSource::Query.can_accept_data_from(&BindingSource::Header));
        assert!(BindingSource::ModelBinding.can_accept_data_from(&BindingSource::Query));
        assert!(BindingSource::ModelBinding.can_accept_data_from(&BindingSource::Path));
        assert!(!BindingSource::ModelBinding.can_accept_data_from(&BindingSource::Header));
        assert!(!BindingSource::Query.can_accept_data_from(&BindingSource::ModelBinding));
    }

    #[test]
    fn test_source_flags() {
        assert!(BindingSource::Body.is_greedy());
        assert!(!BindingSource::Form.is_greedy());
        assert!(!BindingSource::Services.is_from_request());
        assert!(BindingSource::Header.is_from_request());

        let custom = BindingSource::custom("Cookie", false, true);
        assert!(!custom.is_greedy());
        assert!(custom.can_accept_data_from(&BindingSource::custom("Cookie", false, true)));
        assert_eq!(custom.to_string(), "Cookie");
    }
}
