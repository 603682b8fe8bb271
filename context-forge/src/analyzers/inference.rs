//! Type inference for raw string tokens.
//!
//! A single value is classified with a fixed precedence:
//! boolean, then 64-bit integer, then finite decimal, then one of the
//! recognised timestamp layouts, and finally plain string. Blank input has no
//! type at all and is reported as [`ColumnType::Unknown`].
//!
//! Columns are typed by a majority vote over the per-value results, see
//! [`most_common_type`].
//!
//! # Example
//!
//! ```rust
//! use context_forge::analyzers::inference::{infer_type, most_common_type};
//! use context_forge::model::ColumnType;
//!
//! assert_eq!(infer_type(Some("42")), ColumnType::Integer);
//! assert_eq!(infer_type(Some("2024-01-15")), ColumnType::Timestamp);
//!
//! let votes = ["1", "2", "x"].into_iter().map(|v| infer_type(Some(v)));
//! assert_eq!(most_common_type(votes), ColumnType::Integer);
//! ```

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::ColumnType;

/// Timestamp layouts recognised by inference. Every pattern is anchored so
/// only whole-value matches count.
struct TimestampPatterns {
    date_iso: Regex,
    datetime_iso: Regex,
    date_us: Regex,
    datetime_space: Regex,
}

impl TimestampPatterns {
    // These patterns are compile-time constants and known to be valid
    #[allow(clippy::expect_used)]
    fn new() -> Self {
        Self {
            date_iso: Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date pattern"),
            datetime_iso: Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}$")
                .expect("valid datetime pattern"),
            date_us: Regex::new(r"^[0-9]{2}/[0-9]{2}/[0-9]{4}$").expect("valid US date pattern"),
            datetime_space: Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2}$")
                .expect("valid datetime pattern"),
        }
    }

    fn is_match(&self, value: &str) -> bool {
        self.date_iso.is_match(value)
            || self.datetime_iso.is_match(value)
            || self.date_us.is_match(value)
            || self.datetime_space.is_match(value)
    }
}

static TIMESTAMP_PATTERNS: Lazy<TimestampPatterns> = Lazy::new(TimestampPatterns::new);

/// Classifies a single raw value.
pub fn infer_type(value: Option<&str>) -> ColumnType {
    let Some(value) = value else {
        return ColumnType::Unknown;
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return ColumnType::Unknown;
    }

    if trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("false") {
        return ColumnType::Boolean;
    }

    if trimmed.parse::<i64>().is_ok() {
        return ColumnType::Integer;
    }

    if is_finite_decimal(trimmed) {
        return ColumnType::Decimal;
    }

    if TIMESTAMP_PATTERNS.is_match(trimmed) {
        return ColumnType::Timestamp;
    }

    ColumnType::String
}

/// `true` for anything that parses as a finite `f64`.
///
/// `inf` and `NaN` spellings parse but are not numbers a table would hold.
pub fn is_finite_decimal(value: &str) -> bool {
    value.parse::<f64>().is_ok_and(f64::is_finite)
}

/// Majority vote over inferred types.
///
/// Ties go to the type seen first. No votes yields [`ColumnType::String`].
pub fn most_common_type<I>(types: I) -> ColumnType
where
    I: IntoIterator<Item = ColumnType>,
{
    let mut counts: IndexMap<ColumnType, usize> = IndexMap::new();
    for ty in types {
        *counts.entry(ty).or_insert(0) += 1;
    }

    let mut best: Option<(ColumnType, usize)> = None;
    for (ty, count) in counts {
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((ty, count)),
        }
    }
    best.map_or(ColumnType::String, |(ty, _)| ty)
}
