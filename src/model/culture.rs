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

//! Culture-aware number formatting rules
//!
//! A [`Culture`] carries the separators and date pattern used when text from
//! a value provider is converted. [`NumberStyles`] restricts which numeric
//! notations are accepted; [`normalize_number`] rewrites culture-specific
//! text into the invariant form understood by Rust's parsers.

use serde::{Deserialize, Serialize};
use std::ops::BitOr;

/// Formatting conventions of a culture
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Culture {
    name: String,
    decimal_separator: char,
    group_separator: char,
    short_date_pattern: String,
}

impl Culture {
    /// Create a culture with explicit separators and a chrono date pattern
    pub fn new(
        name: impl Into<String>,
        decimal_separator: char,
        group_separator: char,
        short_date_pattern: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            decimal_separator,
            group_separator,
            short_date_pattern: short_date_pattern.into(),
        }
    }

    /// The invariant culture
    pub fn invariant() -> Self {
        Self::new("", '.', ',', "%m/%d/%Y")
    }

    /// Look up one of the built-in cultures by name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "" | "invariant" => Some(Self::invariant()),
            "en-us" => Some(Self::new("en-US", '.', ',', "%m/%d/%Y")),
            "en-gb" => Some(Self::new("en-GB", '.', ',', "%d/%m/%Y")),
            "de-de" => Some(Self::new("de-DE", ',', '.', "%d.%m.%Y")),
            "fr-fr" => Some(Self::new("fr-FR", ',', '\u{202F}', "%d/%m/%Y")),
            _ => None,
        }
    }

    /// Culture name; empty for the invariant culture
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decimal separator
    pub fn decimal_separator(&self) -> char {
        self.decimal_separator
    }

    /// Thousands separator
    pub fn group_separator(&self) -> char {
        self.group_separator
    }

    /// chrono pattern of the culture's short date
    pub fn short_date_pattern(&self) -> &str {
        &self.short_date_pattern
    }

    fn is_group_separator(&self, c: char) -> bool {
        if c == self.group_separator {
            return true;
        }
        // Space-like group separators are typed in several ways.
        is_space_separator(self.group_separator) && is_space_separator(c)
    }
}

impl Default for Culture {
    fn default() -> Self {
        Self::invariant()
    }
}

fn is_space_separator(c: char) -> bool {
    matches!(c, ' ' | '\u{00A0}' | '\u{202F}')
}

/// Permitted elements of a numeric string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct NumberStyles(u16);

impl NumberStyles {
    /// No optional elements
    pub const NONE: NumberStyles = NumberStyles(0);
    /// Leading whitespace
    pub const ALLOW_LEADING_WHITE: NumberStyles = NumberStyles(1);
    /// Trailing whitespace
    pub const ALLOW_TRAILING_WHITE: NumberStyles = NumberStyles(1 << 1);
    /// Leading sign
    pub const ALLOW_LEADING_SIGN: NumberStyles = NumberStyles(1 << 2);
    /// Trailing sign
    pub const ALLOW_TRAILING_SIGN: NumberStyles = NumberStyles(1 << 3);
    /// Decimal point
    pub const ALLOW_DECIMAL_POINT: NumberStyles = NumberStyles(1 << 4);
    /// Thousands separators
    pub const ALLOW_THOUSANDS: NumberStyles = NumberStyles(1 << 5);
    /// Exponent notation
    pub const ALLOW_EXPONENT: NumberStyles = NumberStyles(1 << 6);

    /// Style used for integer conversion
    pub const INTEGER: NumberStyles = NumberStyles(
        Self::ALLOW_LEADING_WHITE.0 | Self::ALLOW_TRAILING_WHITE.0 | Self::ALLOW_LEADING_SIGN.0,
    );

    /// Plain float: whitespace, leading sign, decimal point, exponent
    pub const FLOAT: NumberStyles = NumberStyles(
        Self::INTEGER.0 | Self::ALLOW_DECIMAL_POINT.0 | Self::ALLOW_EXPONENT.0,
    );

    /// Policy of the floating point binders
    pub const FLOATING_POINT_BINDING: NumberStyles = NumberStyles(
        Self::FLOAT.0 | Self::ALLOW_THOUSANDS.0 | Self::ALLOW_TRAILING_SIGN.0,
    );

    /// Whether every flag of `other` is set
    pub fn contains(self, other: NumberStyles) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for NumberStyles {
    type Output = NumberStyles;

    fn bitor(self, rhs: Self) -> Self::Output {
        NumberStyles(self.0 | rhs.0)
    }
}

/// Rewrite culture-formatted numeric text into invariant notation
///
/// Returns `None` when the text contains an element the style rejects.
/// The result contains only an optional `-`, digits, an optional `.` and an
/// optional `e` exponent, so it parses with `str::parse` for every numeric
/// type.
pub fn normalize_number(text: &str, culture: &Culture, styles: NumberStyles) -> Option<String> {
    let mut rest = text;

    if styles.contains(NumberStyles::ALLOW_LEADING_WHITE) {
        rest = rest.trim_start();
    }
    if styles.contains(NumberStyles::ALLOW_TRAILING_WHITE) {
        rest = rest.trim_end();
    }

    let mut negative = false;
    let mut signed = false;

    if styles.contains(NumberStyles::ALLOW_LEADING_SIGN) {
        if let Some(stripped) = rest.strip_prefix('-') {
            negative = true;
            signed = true;
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('+') {
            signed = true;
            rest = stripped;
        }
    }

    if !signed && styles.contains(NumberStyles::ALLOW_TRAILING_SIGN) {
        if let Some(stripped) = rest.strip_suffix('-') {
            negative = true;
            rest = stripped;
        } else if let Some(stripped) = rest.strip_suffix('+') {
            rest = stripped;
        }
    }

    let mut normalized = String::with_capacity(rest.len() + 1);
    if negative {
        normalized.push('-');
    }

    let mut chars = rest.chars().peekable();
    let mut mantissa_digits = 0usize;
    let mut seen_decimal = false;

    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            normalized.push(c);
            mantissa_digits += 1;
        } else if c == culture.decimal_separator()
            && styles.contains(NumberStyles::ALLOW_DECIMAL_POINT)
            && !seen_decimal
        {
            normalized.push('.');
            seen_decimal = true;
        } else if culture.is_group_separator(c)
            && styles.contains(NumberStyles::ALLOW_THOUSANDS)
            && !seen_decimal
            && mantissa_digits > 0
        {
            // Thousands separators carry no value.
        } else {
            break;
        }
        chars.next();
    }

    if mantissa_digits == 0 {
        return None;
    }

    if let Some(&c) = chars.peek() {
        if (c == 'e' || c == 'E') && styles.contains(NumberStyles::ALLOW_EXPONENT) {
            chars.next();
            normalized.push('e');
            if let Some(&sign) = chars.peek() {
                if sign == '-' || sign == '+' {
                    normalized.push(sign);
                    chars.next();
                }
            }
            let mut exponent_digits = 0usize;
            while let Some(&d) = chars.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                normalized.push(d);
                exponent_digits += 1;
                chars.next();
            }
            if exponent_digits == 0 {
                return None;
            }
        }
    }

    if chars.next().is_some() {
        return None;
    }

    Some(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1234.5", "", Some("1234.5"))]
    #[case(" -12 ", "", Some("-12"))]
    #[case("1,234.5", "en-US", Some("1234.5"))]
    #[case("1.234,5", "de-DE", Some("1234.5"))]
    #[case("1 234,5", "fr-FR", Some("1234.5"))]
    #[case("12-", "", Some("-12"))]
    #[case("1.5e3", "", Some("1.5e3"))]
    #[case("1.5e", "", None)]
    #[case("abc", "", None)]
    #[case("", "", None)]
    #[case(".", "", None)]
    #[case("1.2.3", "", None)]
    fn test_normalize_floating_point(
        #[case] input: &str,
        #[case] culture: &str,
        #[case] expected: Option<&str>,
    ) {
        let culture = Culture::from_name(culture).unwrap();
        assert_eq!(
            normalize_number(input, &culture, NumberStyles::FLOATING_POINT_BINDING).as_deref(),
            expected
        );
    }

    #[test]
    fn test_integer_style_rejects_fractions_and_thousands() {
        let culture = Culture::invariant();
        assert_eq!(
            normalize_number("42", &culture, NumberStyles::INTEGER).as_deref(),
            Some("42")
        );
        assert!(normalize_number("4.2", &culture, NumberStyles::INTEGER).is_none());
        assert!(normalize_number("4,200", &culture, NumberStyles::INTEGER).is_none());
        assert!(normalize_number("42-", &culture, NumberStyles::INTEGER).is_none());
    }

    #[test]
    fn test_exponent_requires_style() {
        let culture = Culture::invariant();
        let no_exponent = NumberStyles::INTEGER | NumberStyles::ALLOW_DECIMAL_POINT;
        assert!(normalize_number("1e5", &culture, no_exponent).is_none());
        assert_eq!(
            normalize_number("1e5", &culture, NumberStyles::FLOAT).as_deref(),
            Some("1e5")
        );
    }

    #[test]
    fn test_builtin_cultures() {
        let german = Culture::from_name("de-DE").unwrap();
        assert_eq!(german.decimal_separator(), ',');
        assert_eq!(german.group_separator(), '.');
        assert_eq!(german.short_date_pattern(), "%d.%m.%Y");
        assert!(Culture::from_name("xx-XX").is_none());
        assert_eq!(Culture::default(), Culture::invariant());
    }
}
