//! Scalar kinds: Str, Float, Integer, DateTime, YesNo
//!
//! Set-time validation and normalization. Everything here is silent on
//! failure except the two required-field cases called out in the module
//! docs of [`crate::fields`].

use super::{FieldState, TypedField, Value};
use crate::error::{Result, ValidationError};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Timelike};
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};

impl TypedField {
    /// Str kind: coerce, length-check, enumerate, pattern-check, trim.
    pub(super) fn set_text(&mut self, value: Value) -> Result<()> {
        let mut text = value.as_text().unwrap_or_default();

        if let Some(min) = self.schema.min_length {
            if text.chars().count() < min {
                text.clear();
            }
        }

        if let Some(max) = self.schema.max_length {
            if text.chars().count() > max {
                text = text.chars().take(max).collect();
            }
        }

        if !self.schema.allowed.is_empty() && !text.is_empty() {
            text = match_allowed(&self.schema.allowed, &text).unwrap_or_default();
        }

        if let Some(pattern) = &self.schema.pattern {
            if !text.is_empty() {
                let group_matched = pattern
                    .regex
                    .captures(&text)
                    .and_then(|caps| caps.name(pattern.group))
                    .is_some();
                if !group_matched {
                    text.clear();
                }
            }
        }

        let text = text.trim().to_string();
        if text.is_empty() {
            if self.required {
                return Err(ValidationError::missing_required(self.schema.name).into());
            }
            return Ok(());
        }

        self.state = FieldState::Text(text);
        Ok(())
    }

    /// Float/Integer kinds: bounds reject the whole assignment, keeping
    /// the prior state; in-range values are rounded half-up.
    pub(super) fn set_number(&mut self, value: Value, integer: bool) -> Result<()> {
        let Some(number) = value.as_decimal() else {
            return Ok(());
        };

        if let Some(min) = self.schema.min_value {
            if number < min {
                return Ok(());
            }
        }
        if let Some(max) = self.schema.max_value {
            if number > max {
                return Ok(());
            }
        }

        let precision = if integer { 0 } else { self.schema.precision };
        let rounded = number.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);

        self.state = FieldState::Number(rounded);
        Ok(())
    }

    /// DateTime kind: structured or parseable input; a zero or negative
    /// year is invalid. Required + invalid is the error case.
    pub(super) fn set_datetime(&mut self, value: Value) -> Result<()> {
        let parsed = match &value {
            Value::DateTime(dt) => Some(*dt),
            Value::Str(s) => parse_datetime(s),
            _ => None,
        };

        match parsed.filter(|dt| dt.year() > 0) {
            Some(dt) => {
                self.state = FieldState::Date(dt);
                Ok(())
            }
            None if self.required => Err(ValidationError::new("invalid date value")
                .with_field(self.schema.name)
                .into()),
            None => Ok(()),
        }
    }

    /// YesNo kind: truthy/falsy input maps to `Yes`/`No`; anything else
    /// is a no-op.
    pub(super) fn set_yes_no(&mut self, value: Value) -> Result<()> {
        let answer = match &value {
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            Value::Float(f) => Some(*f != 0.0),
            Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                "yes" | "y" | "1" | "true" => Some(true),
                "no" | "n" | "0" | "false" => Some(false),
                _ => None,
            },
            _ => None,
        };

        if let Some(answer) = answer {
            self.state = FieldState::Text(if answer { "Yes" } else { "No" }.to_string());
        }
        Ok(())
    }

    /// Render a validated number at the field's precision
    pub(super) fn format_number(&self, number: Decimal) -> String {
        match self.kind {
            super::FieldKind::Integer => number.trunc().to_string(),
            _ => {
                let mut rescaled = number;
                rescaled.rescale(self.schema.precision);
                rescaled.to_string()
            }
        }
    }
}

/// Match input against the allowed-value set.
///
/// Each allowed entry is used as a case-insensitive partial pattern, not
/// an exact string; the first matching entry is the canonical value.
fn match_allowed(allowed: &[&'static str], input: &str) -> Option<String> {
    for entry in allowed {
        if let Ok(regex) = Regex::new(&format!("(?i){}", entry)) {
            if regex.is_match(input) {
                return Some(entry.to_string());
            }
        }
    }
    None
}

/// Parse a date/time string in the accepted input shapes: RFC 3339,
/// `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` and bare `YYYY-MM-DD`.
/// Naive inputs are given a zero UTC offset.
pub fn parse_datetime(input: &str) -> Option<DateTime<FixedOffset>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt);
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0)?;
        return Some(midnight.and_utc().fixed_offset());
    }

    None
}

/// Format a date for output: a bare date at exactly midnight, otherwise
/// a full timestamp with offset.
pub fn format_datetime(dt: &DateTime<FixedOffset>) -> String {
    if dt.hour() == 0 && dt.minute() == 0 && dt.second() == 0 && dt.nanosecond() == 0 {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{FieldKind, FieldSchema, Resolved, ResolveContext};
    use once_cell::sync::Lazy;
    use rust_decimal::Decimal;

    static TEST_SCHEMAS: Lazy<Vec<FieldSchema>> = Lazy::new(|| {
        vec![
            FieldSchema::new("plain", FieldKind::Str),
            FieldSchema::new("bounded", FieldKind::Str)
                .with_min_length(3)
                .with_max_length(5),
            FieldSchema::new("changefreq", FieldKind::Str)
                .with_allowed(&["always", "hourly", "daily", "weekly", "monthly", "yearly", "never"]),
            FieldSchema::new("language", FieldKind::Str)
                .with_pattern(r"^(?P<lang>[a-z]{2,3})$", "lang"),
            FieldSchema::new("priority", FieldKind::Float)
                .with_min_value(Decimal::ZERO)
                .with_max_value(Decimal::ONE)
                .with_precision(1),
            FieldSchema::new("duration", FieldKind::Integer)
                .with_min_value(Decimal::ZERO)
                .with_max_value(Decimal::from(28_800)),
            FieldSchema::new("lastmod", FieldKind::DateTime),
            FieldSchema::new("when", FieldKind::DateTime).required(),
            FieldSchema::new("live", FieldKind::YesNo),
        ]
    });

    fn field(name: &str) -> TypedField {
        TypedField::new(
            TEST_SCHEMAS
                .iter()
                .find(|s| s.name == name)
                .expect("unknown test schema"),
        )
    }

    fn scalar(field: &TypedField) -> Option<String> {
        match field.resolve(&ResolveContext::new()).unwrap() {
            Some(Resolved::Scalar(s)) => Some(s),
            None => None,
            other => panic!("unexpected resolution: {:?}", other),
        }
    }

    #[test]
    fn test_str_trims() {
        let mut f = field("plain");
        f.set("  hello  ".into()).unwrap();
        assert_eq!(scalar(&f).as_deref(), Some("hello"));
    }

    #[test]
    fn test_str_coerces_numbers() {
        let mut f = field("plain");
        f.set(42i64.into()).unwrap();
        assert_eq!(scalar(&f).as_deref(), Some("42"));
    }

    #[test]
    fn test_str_min_length_rejects() {
        let mut f = field("bounded");
        f.set("ab".into()).unwrap();
        assert!(!f.is_set());
    }

    #[test]
    fn test_str_max_length_truncates() {
        let mut f = field("bounded");
        f.set("truncated".into()).unwrap();
        assert_eq!(scalar(&f).as_deref(), Some("trunc"));
    }

    #[test]
    fn test_allowed_partial_case_insensitive() {
        // Partial pattern matching is deliberate: "Always!" still
        // resolves to the canonical entry.
        let mut f = field("changefreq");
        f.set("Always!".into()).unwrap();
        assert_eq!(scalar(&f).as_deref(), Some("always"));

        let mut f = field("changefreq");
        f.set("WEEKLY".into()).unwrap();
        assert_eq!(scalar(&f).as_deref(), Some("weekly"));
    }

    #[test]
    fn test_allowed_rejects_unknown() {
        let mut f = field("changefreq");
        f.set("sometimes".into()).unwrap();
        assert!(!f.is_set());
    }

    #[test]
    fn test_pattern_named_group() {
        let mut f = field("language");
        f.set("en".into()).unwrap();
        assert_eq!(scalar(&f).as_deref(), Some("en"));

        let mut f = field("language");
        f.set("english".into()).unwrap();
        assert!(!f.is_set());
    }

    #[test]
    fn test_float_precision_rendering() {
        let mut f = field("priority");
        f.set(0.55f64.into()).unwrap();
        assert_eq!(scalar(&f).as_deref(), Some("0.6"));

        let mut f = field("priority");
        f.set(1i64.into()).unwrap();
        assert_eq!(scalar(&f).as_deref(), Some("1.0"));
    }

    #[test]
    fn test_float_out_of_range_keeps_previous() {
        let mut f = field("priority");
        f.set(0.5f64.into()).unwrap();
        f.set(1.5f64.into()).unwrap();
        assert_eq!(scalar(&f).as_deref(), Some("0.5"));
    }

    #[test]
    fn test_float_accepts_numeric_text() {
        let mut f = field("priority");
        f.set("0.81".into()).unwrap();
        assert_eq!(scalar(&f).as_deref(), Some("0.8"));
    }

    #[test]
    fn test_integer_rounds_to_whole() {
        let mut f = field("duration");
        f.set(119.6f64.into()).unwrap();
        assert_eq!(scalar(&f).as_deref(), Some("120"));
    }

    #[test]
    fn test_datetime_bare_date_at_midnight() {
        let mut f = field("lastmod");
        f.set("2013-11-16 00:00:00".into()).unwrap();
        assert_eq!(scalar(&f).as_deref(), Some("2013-11-16"));
    }

    #[test]
    fn test_datetime_full_timestamp_unchanged() {
        let mut f = field("lastmod");
        f.set("2013-11-16T19:00:00+00:00".into()).unwrap();
        assert_eq!(scalar(&f).as_deref(), Some("2013-11-16T19:00:00+00:00"));
    }

    #[test]
    fn test_datetime_invalid_optional_stays_unset() {
        let mut f = field("lastmod");
        f.set("not a date".into()).unwrap();
        assert!(!f.is_set());
    }

    #[test]
    fn test_datetime_invalid_required_errors() {
        let mut f = field("when");
        assert!(f.set("not a date".into()).is_err());
    }

    #[test]
    fn test_yes_no_mappings() {
        let mut f = field("live");
        f.set(true.into()).unwrap();
        assert_eq!(scalar(&f).as_deref(), Some("Yes"));

        f.set("n".into()).unwrap();
        assert_eq!(scalar(&f).as_deref(), Some("No"));

        f.set("maybe".into()).unwrap();
        // Unrecognized input leaves the previous value in place.
        assert_eq!(scalar(&f).as_deref(), Some("No"));
    }

    #[test]
    fn test_parse_datetime_shapes() {
        assert!(parse_datetime("2020-01-01").is_some());
        assert!(parse_datetime("2020-01-01 12:30:00").is_some());
        assert!(parse_datetime("2020-01-01T12:30:00").is_some());
        assert!(parse_datetime("2020-01-01T12:30:00+02:00").is_some());
        assert!(parse_datetime("garbage").is_none());
    }
}
