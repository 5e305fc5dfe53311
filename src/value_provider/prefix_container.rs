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

//! Prefix lookups over dotted and indexed keys
//!
//! A key `a.b[0].c` has the prefixes `a`, `a.b`, `a.b[0]` and `a.b[0].c`.
//! Comparisons are ASCII case-insensitive.

use indexmap::IndexMap;

/// Index of keys answering prefix queries
#[derive(Debug, Clone, Default)]
pub struct PrefixContainer {
    /// Keys in discovery order
    keys: Vec<String>,
    /// Lowercased keys, sorted for binary search
    sorted: Vec<String>,
}

impl PrefixContainer {
    /// Build a container from keys in discovery order
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        let mut sorted: Vec<String> = keys.iter().map(|key| key.to_ascii_lowercase()).collect();
        sorted.sort();
        sorted.dedup();
        Self { keys, sorted }
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    /// Whether the container has no keys
    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Whether any key equals `prefix` or continues it with `.` or `[`
    ///
    /// The empty prefix matches when there is at least one key.
    pub fn contains_prefix(&self, prefix: &str) -> bool {
        if prefix.is_empty() {
            return !self.sorted.is_empty();
        }

        let prefix = prefix.to_ascii_lowercase();
        let start = self.sorted.partition_point(|key| key.as_str() < prefix.as_str());
        self.sorted[start..]
            .iter()
            .take_while(|key| key.starts_with(prefix.as_str()))
            .any(|key| is_prefix_boundary(key, prefix.len()))
    }

    /// Immediate children of `prefix`, mapped to their full keys
    ///
    /// For keys `dict[a].x` and `dict.b` the children of `dict` are
    /// `a -> dict[a]` and `b -> dict.b`. Discovery order is preserved and the
    /// first spelling of a child wins.
    pub fn keys_from_prefix(&self, prefix: &str) -> IndexMap<String, String> {
        let mut result = IndexMap::new();
        let prefix_lower = prefix.to_ascii_lowercase();

        for key in &self.keys {
            let Some(rest) = strip_prefix_ignore_case(key, &prefix_lower) else {
                continue;
            };

            let child = if prefix.is_empty() {
                let end = rest.find(['.', '[']).unwrap_or(rest.len());
                if end == 0 {
                    None
                } else {
                    Some((rest[..end].to_string(), rest[..end].to_string()))
                }
            } else if let Some(after_dot) = rest.strip_prefix('.') {
                let end = after_dot.find(['.', '[']).unwrap_or(after_dot.len());
                let segment = &after_dot[..end];
                let full = &key[..prefix.len() + 1 + end];
                (!segment.is_empty()).then(|| (segment.to_string(), full.to_string()))
            } else if let Some(after_bracket) = rest.strip_prefix('[') {
                after_bracket.find(']').map(|end| {
                    let segment = &after_bracket[..end];
                    let full = &key[..prefix.len() + 1 + end + 1];
                    (segment.to_string(), full.to_string())
                })
            } else {
                None
            };

            if let Some((segment, full)) = child {
                result.entry(segment).or_insert(full);
            }
        }

        result
    }
}

fn is_prefix_boundary(key: &str, prefix_len: usize) -> bool {
    match key.as_bytes().get(prefix_len) {
        None => true,
        Some(b'.') | Some(b'[') => true,
        Some(_) => false,
    }
}

/// Remainder of `key` after a case-insensitive prefix ending at a boundary
fn strip_prefix_ignore_case<'a>(key: &'a str, prefix_lower: &str) -> Option<&'a str> {
    if prefix_lower.is_empty() {
        return Some(key);
    }
    if key.len() < prefix_lower.len() || !key.is_char_boundary(prefix_lower.len()) {
        return None;
    }
    let (head, rest) = key.split_at(prefix_lower.len());
    if !head.eq_ignore_ascii_case(prefix_lower) {
        return None;
    }
    match rest.as_bytes().first() {
        Some(b'.') | Some(b'[') => Some(rest),
        _ => None,
    }
}
