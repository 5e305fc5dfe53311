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

//! Validation exemptions for bound models

use indexmap::IndexMap;

/// Validation instructions for one bound model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationStateEntry {
    /// Skip validation of the model and its children
    pub suppress_validation: bool,
}

/// Per-model-name validation instructions produced during binding
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationStateDictionary {
    entries: IndexMap<String, ValidationStateEntry>,
}

impl ValidationStateDictionary {
    /// Create an empty dictionary
    pub fn new() -> Self {
        Self::default()
    }

    /// Exempt a model from validation
    pub fn suppress_validation(&mut self, key: &str) {
        self.entries
            .entry(key.to_string())
            .or_default()
            .suppress_validation = true;
    }

    /// Whether a model is exempt from validation
    pub fn is_suppressed(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| entry.suppress_validation)
    }

    /// Entry for a model name
    pub fn get(&self, key: &str) -> Option<&ValidationStateEntry> {
        self.entries.get(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add the entries of another dictionary
    pub fn merge(&mut self, other: ValidationStateDictionary) {
        for (key, entry) in other.entries {
            let target = self.entries.entry(key).or_default();
            target.suppress_validation |= entry.suppress_validation;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suppress_validation() {
        let mut state = ValidationStateDictionary::new();
        state.suppress_validation("clock");
        assert!(state.is_suppressed("clock"));
        assert!(!state.is_suppressed("other"));
        assert_eq!(state.len(), 1);
    }
}
