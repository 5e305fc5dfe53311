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

//! Form values posted with jQuery bracket notation
//!
//! jQuery serializes `{ a: { b: [1, 2] } }` as `a[b][]=1&a[b][]=2`. Keys are
//! rewritten into model-name notation: named brackets become dotted
//! segments, numeric indexes are kept and trailing empty brackets vanish.

use indexmap::IndexMap;

use super::source::SourceValueProvider;
use super::{FilterOutcome, ValueProvider, ValueProviderResult};
use crate::model::{BindingSource, Culture};
use crate::request::FormCollection;

/// Rewrite a jQuery bracketed key into model-name notation
pub fn normalize_jquery_key(key: &str) -> String {
    if !key.contains('[') {
        return key.to_string();
    }

    let mut normalized = String::with_capacity(key.len());
    let mut rest = key;

    while let Some(open) = rest.find('[') {
        normalized.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find(']') else {
            // Unbalanced bracket, keep the remainder verbatim.
            normalized.push_str(&rest[open..]);
            return normalized;
        };

        let segment = &after_open[..close];
        if segment.is_empty() {
            // `a[]` denotes a collection of `a`.
        } else if segment.bytes().all(|b| b.is_ascii_digit()) {
            normalized.push('[');
            normalized.push_str(segment);
            normalized.push(']');
        } else {
            normalized.push('.');
            normalized.push_str(segment);
        }
        rest = &after_open[close + 1..];
    }

    normalized.push_str(rest);
    normalized
}

/// Form provider over jQuery-normalized keys
#[derive(Debug, Clone)]
pub struct JQueryFormValueProvider {
    inner: SourceValueProvider,
}

impl JQueryFormValueProvider {
    /// Create the provider from a parsed form
    pub fn new(form: &FormCollection, culture: Culture) -> Self {
        let pairs = form.fields().flat_map(|(name, values)| {
            let key = normalize_jquery_key(name);
            values
                .iter()
                .map(move |value| (key.clone(), value.clone()))
        });
        Self {
            inner: SourceValueProvider::new(BindingSource::Form, pairs, culture),
        }
    }
}

impl ValueProvider for JQueryFormValueProvider {
    fn contains_prefix(&self, prefix: &str) -> bool {
        self.inner.contains_prefix(prefix)
    }

    fn get_value(&self, key: &str) -> ValueProviderResult {
        self.inner.get_value(key)
    }

    fn keys_from_prefix(&self, prefix: &str) -> IndexMap<String, String> {
        self.inner.keys_from_prefix(prefix)
    }

    fn filter(&self, source: &BindingSource) -> FilterOutcome {
        self.inner.filter(source)
    }
}
