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

//! Value providers
//!
//! A value provider is a flat, culture-aware, prefix-addressable source of
//! raw string values. Query string, form, route and jQuery-style form
//! providers are combined behind a [`CompositeValueProvider`] and can be
//! narrowed to a [`BindingSource`].

pub mod composite;
pub mod elemental;
pub mod factory;
pub mod jquery;
pub mod names;
pub mod prefix_container;
pub mod source;

use indexmap::IndexMap;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

use crate::model::{BindingSource, Culture};

pub use composite::CompositeValueProvider;
pub use elemental::ElementalValueProvider;
pub use factory::{
    FormValueProviderFactory, JQueryFormValueProviderFactory, QueryStringValueProviderFactory,
    RouteValueProviderFactory, ValueProviderFactory, create_standard_value_provider_factories,
};
pub use jquery::{JQueryFormValueProvider, normalize_jquery_key};
pub use names::{create_index_model_name, create_property_model_name};
pub use prefix_container::PrefixContainer;
pub use source::SourceValueProvider;

/// Raw values found for a key
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValueProviderResult {
    /// Nothing was found; distinct from an empty string
    #[default]
    None,
    /// One or more raw values with the culture they were written in
    Values {
        /// The raw values, never empty
        values: SmallVec<[String; 1]>,
        /// Culture used to convert the values
        culture: Culture,
    },
}

impl ValueProviderResult {
    /// Result for the given values; no values gives [`ValueProviderResult::None`]
    pub fn new<I, S>(values: I, culture: Culture) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: SmallVec<[String; 1]> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            Self::None
        } else {
            Self::Values { values, culture }
        }
    }

    /// Result holding a single value
    pub fn single(value: impl Into<String>, culture: Culture) -> Self {
        Self::new([value.into()], culture)
    }

    /// Whether nothing was found
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// All raw values
    pub fn values(&self) -> &[String] {
        match self {
            Self::None => &[],
            Self::Values { values, .. } => values.as_slice(),
        }
    }

    /// The first raw value
    pub fn first_value(&self) -> Option<&str> {
        self.values().first().map(String::as_str)
    }

    /// Number of raw values
    pub fn len(&self) -> usize {
        self.values().len()
    }

    /// Culture of the values
    pub fn culture(&self) -> Option<&Culture> {
        match self {
            Self::None => None,
            Self::Values { culture, .. } => Some(culture),
        }
    }

    /// All values joined with commas, as recorded in the model state
    pub fn attempted_value(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Values { values, .. } => Some(values.join(",")),
        }
    }
}

/// Outcome of narrowing a provider to a binding source
pub enum FilterOutcome {
    /// The provider serves the source as it is
    Unchanged,
    /// The provider has nothing for the source
    Excluded,
    /// A narrower provider serves the source
    Replaced(Arc<dyn ValueProvider>),
}

/// A source of raw values addressed by model name
pub trait ValueProvider: Send + Sync + fmt::Debug {
    /// Whether any key equals the prefix or is nested under it
    fn contains_prefix(&self, prefix: &str) -> bool;

    /// Values for an exact key
    fn get_value(&self, key: &str) -> ValueProviderResult;

    /// Immediate child keys of a prefix mapped to full keys
    fn keys_from_prefix(&self, _prefix: &str) -> IndexMap<String, String> {
        IndexMap::new()
    }

    /// Narrow the provider to data a binding source accepts
    fn filter(&self, _source: &BindingSource) -> FilterOutcome {
        FilterOutcome::Unchanged
    }
}

/// Provider without values
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyValueProvider;

impl ValueProvider for EmptyValueProvider {
    fn contains_prefix(&self, _prefix: &str) -> bool {
        false
    }

    fn get_value(&self, _key: &str) -> ValueProviderResult {
        ValueProviderResult::None
    }

    fn filter(&self, _source: &BindingSource) -> FilterOutcome {
        FilterOutcome::Excluded
    }
}

/// Narrow a shared provider to a binding source
pub fn filter_value_provider(
    provider: &Arc<dyn ValueProvider>,
    source: &BindingSource,
) -> Arc<dyn ValueProvider> {
    match provider.filter(source) {
        FilterOutcome::Unchanged => provider.clone(),
        FilterOutcome::Excluded => Arc::new(EmptyValueProvider),
        FilterOutcome::Replaced(filtered) => filtered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_values() {
        let result = ValueProviderResult::new(["1", "2"], Culture::invariant());
        assert_eq!(result.first_value(), Some("1"));
        assert_eq!(result.attempted_value().as_deref(), Some("1,2"));
        assert_eq!(result.len(), 2);

        let empty_string = ValueProviderResult::single("", Culture::invariant());
        assert!(!empty_string.is_none());
        assert_eq!(empty_string.first_value(), Some(""));

        let none = ValueProviderResult::new(Vec::<String>::new(), Culture::invariant());
        assert!(none.is_none());
        assert_eq!(none.first_value(), None);
    }
}
