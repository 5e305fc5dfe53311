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

//! Single-value provider used to bind collection elements one by one

use super::{ValueProvider, ValueProviderResult};
use crate::model::Culture;

/// Exposes one raw value under one key
#[derive(Debug, Clone)]
pub struct ElementalValueProvider {
    key: String,
    value: String,
    culture: Culture,
}

impl ElementalValueProvider {
    /// Create a provider answering `key` with `value`
    pub fn new(key: impl Into<String>, value: impl Into<String>, culture: Culture) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            culture,
        }
    }
}

impl ValueProvider for ElementalValueProvider {
    fn contains_prefix(&self, prefix: &str) -> bool {
        if prefix.is_empty() {
            return true;
        }
        if self.key.len() < prefix.len() || !self.key.is_char_boundary(prefix.len()) {
            return false;
        }
        let (head, rest) = self.key.split_at(prefix.len());
        head.eq_ignore_ascii_case(prefix) && matches!(rest.as_bytes().first(), None | Some(b'.') | Some(b'['))
    }

    fn get_value(&self, key: &str) -> ValueProviderResult {
        if key.eq_ignore_ascii_case(&self.key) {
            ValueProviderResult::single(self.value.clone(), self.culture.clone())
        } else {
            ValueProviderResult::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_key() {
        let provider = ElementalValueProvider::new("items", "4", Culture::invariant());
        assert_eq!(provider.get_value("Items").first_value(), Some("4"));
        assert!(provider.get_value("items[0]").is_none());
        assert!(provider.contains_prefix("items"));
        assert!(!provider.contains_prefix("item"));
    }
}
