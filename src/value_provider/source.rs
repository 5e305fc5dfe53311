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

//! Value provider over key/value pairs of one binding source

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::prefix_container::PrefixContainer;
use super::{FilterOutcome, ValueProvider, ValueProviderResult};
use crate::model::{BindingSource, Culture};
use crate::request::{FormCollection, RequestContext};

/// Query, form or route values tagged with their binding source
#[derive(Debug, Clone)]
pub struct SourceValueProvider {
    source: BindingSource,
    values: IndexMap<String, SmallVec<[String; 1]>>,
    prefixes: PrefixContainer,
    culture: Culture,
}

impl SourceValueProvider {
    /// Create a provider from pairs; repeated keys collect several values
    pub fn new<I, K, V>(source: BindingSource, pairs: I, culture: Culture) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut keys = Vec::new();
        let mut values: IndexMap<String, SmallVec<[String; 1]>> = IndexMap::new();

        for (key, value) in pairs {
            let key = key.into();
            let lookup = key.to_ascii_lowercase();
            if !values.contains_key(&lookup) {
                keys.push(key);
            }
            values.entry(lookup).or_default().push(value.into());
        }

        Self {
            source,
            values,
            prefixes: PrefixContainer::new(keys),
            culture,
        }
    }

    /// Query string values, converted with the invariant culture
    pub fn query(request: &RequestContext) -> Self {
        Self::new(
            BindingSource::Query,
            request.query().iter().map(|(k, v)| (k.as_str(), v.as_str())),
            Culture::invariant(),
        )
    }

    /// Route values, converted with the invariant culture
    pub fn route(request: &RequestContext) -> Self {
        Self::new(
            BindingSource::Path,
            request
                .route_values()
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
            Culture::invariant(),
        )
    }

    /// Form fields, converted with the request culture
    pub fn form(form: &FormCollection, culture: Culture) -> Self {
        Self::new(
            BindingSource::Form,
            form.fields().flat_map(|(name, values)| {
                values.iter().map(move |value| (name.as_str(), value.as_str()))
            }),
            culture,
        )
    }

    /// Binding source of the values
    pub fn binding_source(&self) -> &BindingSource {
        &self.source
    }

    /// Culture of the values
    pub fn culture(&self) -> &Culture {
        &self.culture
    }
}

impl ValueProvider for SourceValueProvider {
    fn contains_prefix(&self, prefix: &str) -> bool {
        self.prefixes.contains_prefix(prefix)
    }

    fn get_value(&self, key: &str) -> ValueProviderResult {
        match self.values.get(&key.to_ascii_lowercase()) {
            Some(values) => ValueProviderResult::Values {
                values: values.clone(),
                culture: self.culture.clone(),
            },
            None => ValueProviderResult::None,
        }
    }

    fn keys_from_prefix(&self, prefix: &str) -> IndexMap<String, String> {
        self.prefixes.keys_from_prefix(prefix)
    }

    fn filter(&self, source: &BindingSource) -> FilterOutcome {
        if source.can_accept_data_from(&self.source) {
            FilterOutcome::Unchanged
        } else {
            FilterOutcome::Excluded
        }
    }
}
