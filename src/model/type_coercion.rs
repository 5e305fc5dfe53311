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

//! Conversion of raw request text into typed values

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

use super::culture::{Culture, NumberStyles, normalize_number};
use super::definitions::EnumDefinition;
use super::metadata::ModelMetadata;
use super::types::{FloatingPointType, ModelType, SimpleType};
use super::value::{EnumValue, ModelValue};

/// Result type for type coercion operations
pub type CoercionResult<T> = Result<T, CoercionError>;

/// Errors that can occur during type coercion
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    /// The text does not have the format of the target type
    #[error("'{value}' is not a valid {target_type}")]
    InvalidFormat {
        /// The offending text
        value: String,
        /// Name of the target type
        target_type: String,
    },

    /// The number does not fit the target type
    #[error("'{value}' is outside the range of {target_type}")]
    OutOfRange {
        /// The offending text
        value: String,
        /// Name of the target type
        target_type: String,
    },

    /// The enum value is not a member
    #[error("'{value}' is not defined for enum {enum_name}")]
    UndefinedEnumValue {
        /// The offending text
        value: String,
        /// Name of the enum
        enum_name: String,
    },

    /// The target type has no text converter
    #[error("Type '{target_type}' cannot be converted from text")]
    Unsupported {
        /// Name of the target type
        target_type: String,
    },
}

impl CoercionError {
    fn invalid(value: &str, target_type: impl Into<String>) -> Self {
        Self::InvalidFormat {
            value: value.to_string(),
            target_type: target_type.into(),
        }
    }

    fn out_of_range(value: &str, target_type: impl Into<String>) -> Self {
        Self::OutOfRange {
            value: value.to_string(),
            target_type: target_type.into(),
        }
    }
}

/// Type coercion utility for request text
pub struct TypeCoercion;

impl TypeCoercion {
    /// Convert text to the type described by `metadata`
    ///
    /// Nullable wrappers are converted as their underlying type. Enum values
    /// outside the defined members are rejected unless `allow_undefined_enum`
    /// is set.
    pub fn convert(
        text: &str,
        metadata: &ModelMetadata,
        culture: &Culture,
        allow_undefined_enum: bool,
    ) -> CoercionResult<ModelValue> {
        match metadata.model_type().underlying_or_model_type() {
            ModelType::Simple(simple) => Self::convert_simple(text, *simple, culture),
            ModelType::FloatingPoint(float) => Self::convert_floating_point(
                text,
                *float,
                culture,
                NumberStyles::FLOATING_POINT_BINDING,
            ),
            ModelType::Enum(name) => match metadata.enum_definition() {
                Some(definition) => Self::convert_enum(text, definition, allow_undefined_enum),
                None => Err(CoercionError::Unsupported {
                    target_type: name.clone(),
                }),
            },
            other => Err(CoercionError::Unsupported {
                target_type: other.type_name(),
            }),
        }
    }

    /// Convert text to a simple type
    pub fn convert_simple(
        text: &str,
        target: SimpleType,
        culture: &Culture,
    ) -> CoercionResult<ModelValue> {
        match target {
            SimpleType::String => Ok(ModelValue::String(text.to_string())),
            SimpleType::Boolean => Self::convert_boolean(text),
            SimpleType::Char => Self::convert_char(text),
            SimpleType::Int8 | SimpleType::Int16 | SimpleType::Int32 | SimpleType::Int64 => {
                Self::convert_signed(text, target, culture)
            }
            SimpleType::UInt8 | SimpleType::UInt16 | SimpleType::UInt32 | SimpleType::UInt64 => {
                Self::convert_unsigned(text, target, culture)
            }
            SimpleType::DateTime => Self::convert_datetime(text, culture),
            SimpleType::Date => Self::convert_date(text, culture),
            SimpleType::Uri => Url::parse(text.trim())
                .map(ModelValue::Uri)
                .map_err(|_| CoercionError::invalid(text, target.name())),
        }
    }

    /// Convert text to a floating point type with the given number styles
    pub fn convert_floating_point(
        text: &str,
        target: FloatingPointType,
        culture: &Culture,
        styles: NumberStyles,
    ) -> CoercionResult<ModelValue> {
        let normalized = normalize_number(text, culture, styles)
            .ok_or_else(|| CoercionError::invalid(text, target.name()))?;

        match target {
            FloatingPointType::Float32 => {
                let value = f32::from_str(&normalized)
                    .map_err(|_| CoercionError::invalid(text, target.name()))?;
                if !value.is_finite() {
                    return Err(CoercionError::out_of_range(text, target.name()));
                }
                Ok(ModelValue::Float(f64::from(value)))
            }
            FloatingPointType::Float64 => {
                let value = f64::from_str(&normalized)
                    .map_err(|_| CoercionError::invalid(text, target.name()))?;
                if !value.is_finite() {
                    return Err(CoercionError::out_of_range(text, target.name()));
                }
                Ok(ModelValue::Float(value))
            }
            FloatingPointType::Decimal => {
                let parsed = if normalized.contains('e') {
                    Decimal::from_scientific(&normalized)
                } else {
                    Decimal::from_str(&normalized)
                };
                parsed
                    .map(ModelValue::Decimal)
                    .map_err(|_| CoercionError::out_of_range(text, target.name()))
            }
        }
    }

    /// Convert text to an enum value
    ///
    /// Accepts the underlying integer or member names, case-insensitively;
    /// several comma-separated names are combined bitwise.
    pub fn convert_enum(
        text: &str,
        definition: &EnumDefinition,
        allow_undefined: bool,
    ) -> CoercionResult<ModelValue> {
        let trimmed = text.trim();
        let starts_numeric = trimmed
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit() || c == '-' || c == '+');

        let value = if starts_numeric {
            let normalized = normalize_number(trimmed, &Culture::invariant(), NumberStyles::INTEGER)
                .ok_or_else(|| CoercionError::invalid(text, definition.name()))?;
            i64::from_str(&normalized)
                .map_err(|_| CoercionError::out_of_range(text, definition.name()))?
        } else {
            let mut combined = 0i64;
            for member in trimmed.split(',') {
                let member = member.trim();
                let value = definition
                    .value_of(member)
                    .ok_or_else(|| CoercionError::invalid(text, definition.name()))?;
                combined |= value;
            }
            combined
        };

        let name = definition.name_of(value);
        if name.is_none() && !allow_undefined {
            return Err(CoercionError::UndefinedEnumValue {
                value: text.to_string(),
                enum_name: definition.name().to_string(),
            });
        }

        Ok(ModelValue::Enum(EnumValue {
            enum_name: definition.name().to_string(),
            value,
            name,
        }))
    }

    fn convert_boolean(text: &str) -> CoercionResult<ModelValue> {
        let trimmed = text.trim();
        if trimmed.eq_ignore_ascii_case("true") {
            Ok(ModelValue::Boolean(true))
        } else if trimmed.eq_ignore_ascii_case("false") {
            Ok(ModelValue::Boolean(false))
        } else {
            Err(CoercionError::invalid(text, SimpleType::Boolean.name()))
        }
    }

    fn convert_char(text: &str) -> CoercionResult<ModelValue> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(ModelValue::Char(c)),
            _ => {
                // A single character surrounded by whitespace is accepted.
                let mut trimmed = text.trim().chars();
                match (trimmed.next(), trimmed.next()) {
                    (Some(c), None) => Ok(ModelValue::Char(c)),
                    _ => Err(CoercionError::invalid(text, SimpleType::Char.name())),
                }
            }
        }
    }

    fn convert_signed(
        text: &str,
        target: SimpleType,
        culture: &Culture,
    ) -> CoercionResult<ModelValue> {
        let normalized = normalize_number(text, culture, NumberStyles::INTEGER)
            .ok_or_else(|| CoercionError::invalid(text, target.name()))?;
        let value = i64::from_str(&normalized)
            .map_err(|_| CoercionError::out_of_range(text, target.name()))?;

        match target.signed_range() {
            Some((min, max)) if value >= min && value <= max => Ok(ModelValue::Integer(value)),
            _ => Err(CoercionError::out_of_range(text, target.name())),
        }
    }

    fn convert_unsigned(
        text: &str,
        target: SimpleType,
        culture: &Culture,
    ) -> CoercionResult<ModelValue> {
        let normalized = normalize_number(text, culture, NumberStyles::INTEGER)
            .ok_or_else(|| CoercionError::invalid(text, target.name()))?;

        // "-0" is the only negative text an unsigned type accepts.
        let digits = match normalized.strip_prefix('-') {
            Some(rest) if rest.chars().all(|c| c == '0') => rest,
            Some(_) => return Err(CoercionError::out_of_range(text, target.name())),
            None => normalized.as_str(),
        };

        let value =
            u64::from_str(digits).map_err(|_| CoercionError::out_of_range(text, target.name()))?;

        match target.unsigned_max() {
            Some(max) if value <= max => Ok(ModelValue::UnsignedInteger(value)),
            _ => Err(CoercionError::out_of_range(text, target.name())),
        }
    }

    fn convert_datetime(text: &str, culture: &Culture) -> CoercionResult<ModelValue> {
        let trimmed = text.trim();

        if let Ok(value) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(ModelValue::DateTime(value));
        }

        for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
            if let Ok(value) = NaiveDateTime::parse_from_str(trimmed, pattern) {
                return Ok(ModelValue::DateTime(utc(value)));
            }
        }

        let culture_pattern = format!("{} %H:%M:%S", culture.short_date_pattern());
        if let Ok(value) = NaiveDateTime::parse_from_str(trimmed, &culture_pattern) {
            return Ok(ModelValue::DateTime(utc(value)));
        }

        match parse_date(trimmed, culture) {
            Some(date) => Ok(ModelValue::DateTime(utc(date.and_time(NaiveTime::default())))),
            None => Err(CoercionError::invalid(text, SimpleType::DateTime.name())),
        }
    }

    fn convert_date(text: &str, culture: &Culture) -> CoercionResult<ModelValue> {
        parse_date(text.trim(), culture)
            .map(ModelValue::Date)
            .ok_or_else(|| CoercionError::invalid(text, SimpleType::Date.name()))
    }
}

fn parse_date(text: &str, culture: &Culture) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, culture.short_date_pattern()))
        .ok()
}

fn utc(value: NaiveDateTime) -> DateTime<FixedOffset> {
    value.and_utc().fixed_offset()
}
