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

//! Model state dictionary
//!
//! Entries are keyed by model name (`person.Addresses[0].City`) and keep
//! insertion order, so error reporting is stable across runs.

use indexmap::IndexMap;
use log::warn;

use super::model_error::ModelError;

/// Default limit on recorded errors
pub const DEFAULT_MAX_MODEL_ERRORS: usize = 200;

/// Raw value and errors recorded for one model name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelStateEntry {
    /// Raw values as received
    pub raw_values: Vec<String>,
    /// Raw values joined with commas
    pub attempted_value: Option<String>,
    /// Errors in the order they were recorded
    pub errors: Vec<ModelError>,
}

/// Insertion-ordered map from model name to raw value and errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStateDictionary {
    entries: IndexMap<String, ModelStateEntry>,
    max_allowed_errors: usize,
    error_count: usize,
    has_reached_max_errors: bool,
}

impl ModelStateDictionary {
    /// Create an empty dictionary with the default error limit
    pub fn new() -> Self {
        Self::with_max_errors(DEFAULT_MAX_MODEL_ERRORS)
    }

    /// Create an empty dictionary that records at most `max_allowed_errors` errors
    pub fn with_max_errors(max_allowed_errors: usize) -> Self {
        Self {
            entries: IndexMap::new(),
            max_allowed_errors,
            error_count: 0,
            has_reached_max_errors: false,
        }
    }

    /// Record the raw value submitted for a model name
    pub fn set_model_value(&mut self, key: &str, raw_values: &[String]) {
        let entry = self.entries.entry(key.to_string()).or_default();
        entry.raw_values = raw_values.to_vec();
        entry.attempted_value = Some(raw_values.join(","));
    }

    /// Record an error; returns `false` once the error limit has been reached
    ///
    /// Reaching the limit records a single [`ModelError::TooManyModelErrors`]
    /// entry; every later error is dropped.
    pub fn try_add_model_error(&mut self, key: &str, error: ModelError) -> bool {
        if self.has_reached_max_errors {
            return false;
        }

        if self.error_count + 1 >= self.max_allowed_errors {
            self.record_max_errors_reached(key);
            return false;
        }

        self.push_error(key, error);
        true
    }

    fn record_max_errors_reached(&mut self, key: &str) {
        if self.has_reached_max_errors {
            return;
        }
        warn!(
            "Model state reached the maximum of {} errors",
            self.max_allowed_errors
        );
        self.has_reached_max_errors = true;
        self.push_error(key, ModelError::TooManyModelErrors);
    }

    fn push_error(&mut self, key: &str, error: ModelError) {
        self.entries
            .entry(key.to_string())
            .or_default()
            .errors
            .push(error);
        self.error_count += 1;
    }

    /// Whether no errors were recorded
    pub fn is_valid(&self) -> bool {
        self.error_count == 0
    }

    /// Total number of recorded errors
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Whether the error limit was reached
    pub fn has_reached_max_errors(&self) -> bool {
        self.has_reached_max_errors
    }

    /// Configured error limit
    pub fn max_allowed_errors(&self) -> usize {
        self.max_allowed_errors
    }

    /// Entry for a model name
    pub fn get(&self, key: &str) -> Option<&ModelStateEntry> {
        self.entries.get(key)
    }

    /// Errors recorded for a model name
    pub fn errors_for(&self, key: &str) -> &[ModelError] {
        self.entries
            .get(key)
            .map(|entry| entry.errors.as_slice())
            .unwrap_or(&[])
    }

    /// Attempted value recorded for a model name
    pub fn attempted_value(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .and_then(|entry| entry.attempted_value.as_deref())
    }

    /// Model names that have errors, in insertion order
    pub fn keys_with_errors(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.errors.is_empty())
            .map(|(key, _)| key.as_str())
    }

    /// All entries in insertion order
    pub fn entries(&self) -> impl Iterator<Item = (&String, &ModelStateEntry)> {
        self.entries.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the dictionary has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append the entries of another dictionary, honoring this error limit
    ///
    /// A truncated dictionary stays truncated: its
    /// [`ModelError::TooManyModelErrors`] marker is carried over.
    pub fn merge(&mut self, other: ModelStateDictionary) {
        let mut marker_seen = false;
        for (key, entry) in other.entries {
            if entry.attempted_value.is_some() {
                self.set_model_value(&key, &entry.raw_values);
            } else {
                self.entries.entry(key.clone()).or_default();
            }
            for error in entry.errors {
                if error == ModelError::TooManyModelErrors {
                    marker_seen = true;
                    self.record_max_errors_reached(&key);
                    continue;
                }
                self.try_add_model_error(&key, error);
            }
        }
        if other.has_reached_max_errors && !marker_seen {
            self.record_max_errors_reached("");
        }
    }
}

impl Default for ModelStateDictionary {
    fn default() -> Self {
        Self::new()
    }
}
