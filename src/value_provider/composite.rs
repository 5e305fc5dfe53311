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

//! Ordered aggregation of value providers

use indexmap::IndexMap;
use std::sync::Arc;

use super::{FilterOutcome, ValueProvider, ValueProviderResult};
use crate::model::BindingSource;

/// Queries providers in priority order; the first provider with a value wins
#[derive(Debug, Clone, Default)]
pub struct CompositeValueProvider {
    providers: Vec<Arc<dyn ValueProvider>>,
}

impl CompositeValueProvider {
    /// Create a composite over providers in priority order
    pub fn new(providers: Vec<Arc<dyn ValueProvider>>) -> Self {
        Self { providers }
    }

    /// Append a provider with the lowest priority
    pub fn push(&mut self, provider: Arc<dyn ValueProvider>) {
        self.providers.push(provider);
    }

    /// Providers in priority order
    pub fn providers(&self) -> &[Arc<dyn ValueProvider>] {
        &self.providers
    }

    /// Number of providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether there are no providers
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl ValueProvider for CompositeValueProvider {
    fn contains_prefix(&self, prefix: &str) -> bool {
        self.providers
            .iter()
            .any(|provider| provider.contains_prefix(prefix))
    }

    fn get_value(&self, key: &str) -> ValueProviderResult {
        self.providers
            .iter()
            .map(|provider| provider.get_value(key))
            .find(|result| !result.is_none())
            .unwrap_or_default()
    }

    fn keys_from_prefix(&self, prefix: &str) -> IndexMap<String, String> {
        self.providers
            .iter()
            .map(|provider| provider.keys_from_prefix(prefix))
            .find(|keys| !keys.is_empty())
            .unwrap_or_default()
    }

    fn filter(&self, source: &BindingSource) -> FilterOutcome {
        let mut changed = false;
        let mut filtered = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            match provider.filter(source) {
                FilterOutcome::Unchanged => filtered.push(provider.clone()),
                FilterOutcome::Excluded => changed = true,
                FilterOutcome::Replaced(replacement) => {
                    changed = true;
                    filtered.push(replacement);
                }
            }
        }

        if !changed {
            FilterOutcome::Unchanged
        } else if filtered.is_empty() {
            FilterOutcome::Excluded
        } else {
            FilterOutcome::Replaced(Arc::new(Self::new(filtered)))
        }
    }
}
