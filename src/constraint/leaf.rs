//! Leaf constraints: type membership, numeric range and string pattern

use super::{Outcome, judge};
use crate::error::{Error, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Value Kinds
// =============================================================================

/// Runtime kind of a configuration value
///
/// `Number` is the common supertype of `Integer` and `Float`, `Any` admits
/// every value. Neither is ever reported by [`ValueKind::of`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    Bool,
    Integer,
    Float,
    Number,
    String,
    Array,
    Object,
    Any,
}

impl ValueKind {
    /// Exact kind of a value
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(n) if n.is_f64() => ValueKind::Float,
            Value::Number(_) => ValueKind::Integer,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    /// Check membership, honoring the `Number` and `Any` supertypes
    #[must_use]
    pub fn admits(self, value: &Value) -> bool {
        match self {
            ValueKind::Any => true,
            ValueKind::Number => value.is_number(),
            kind => ValueKind::of(value) == kind,
        }
    }

    /// Short name used in diagnostics
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Integer => "int",
            ValueKind::Float => "float",
            ValueKind::Number => "number",
            ValueKind::String => "str",
            ValueKind::Array => "list",
            ValueKind::Object => "dict",
            ValueKind::Any => "any",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Type Constraint
// =============================================================================

/// Passes when the value belongs to one of the expected kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeConstraint {
    kinds: Vec<ValueKind>,
    strict: bool,
}

impl TypeConstraint {
    /// Accept any of `kinds`
    pub fn new(kinds: impl IntoIterator<Item = ValueKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
            strict: false,
        }
    }

    /// Only accept the exact kind of the value, ignoring supertypes
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Accepted kinds, in declaration order
    pub fn kinds(&self) -> &[ValueKind] {
        &self.kinds
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    fn accepts(&self, value: &Value) -> bool {
        if self.strict {
            let actual = ValueKind::of(value);
            self.kinds.iter().any(|kind| *kind == actual)
        } else {
            self.kinds.iter().any(|kind| kind.admits(value))
        }
    }

    fn kind_list(&self) -> String {
        self.kinds
            .iter()
            .map(|kind| kind.name())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Failure message of this constraint
    pub fn description(&self) -> String {
        format!("should match one of the types in ({})", self.kind_list())
    }

    pub(crate) fn evaluate(&self, value: &Value) -> Outcome {
        judge(Ok(self.accepts(value)), || self.description())
    }
}

impl fmt::Display for TypeConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type({})", self.kind_list())
    }
}

// =============================================================================
// Range Constraint
// =============================================================================

/// One side of a [`RangeConstraint`]
///
/// Integer bounds are compared exactly against integer values; a float on
/// either side switches the comparison to `f64`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeBound {
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl RangeBound {
    /// Bound carrying the same number as `number`
    pub fn of(number: &Number) -> Option<Self> {
        if let Some(i) = number.as_i64() {
            Some(RangeBound::Int(i))
        } else if let Some(u) = number.as_u64() {
            Some(RangeBound::UInt(u))
        } else {
            number.as_f64().map(RangeBound::Float)
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            RangeBound::Int(i) => i as f64,
            RangeBound::UInt(u) => u as f64,
            RangeBound::Float(f) => f,
        }
    }

    /// Numeric ordering; `None` only when a float side is NaN
    pub fn compare(self, other: RangeBound) -> Option<Ordering> {
        match (self, other) {
            (RangeBound::Int(a), RangeBound::Int(b)) => Some(a.cmp(&b)),
            (RangeBound::UInt(a), RangeBound::UInt(b)) => Some(a.cmp(&b)),
            (RangeBound::Int(a), RangeBound::UInt(b)) => Some(match u64::try_from(a) {
                Ok(a) => a.cmp(&b),
                Err(_) => Ordering::Less,
            }),
            (RangeBound::UInt(_), RangeBound::Int(_)) => {
                other.compare(self).map(Ordering::reverse)
            }
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }
}

impl fmt::Display for RangeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeBound::Int(i) => write!(f, "{i}"),
            RangeBound::UInt(u) => write!(f, "{u}"),
            RangeBound::Float(x) => write!(f, "{x}"),
        }
    }
}

impl From<i32> for RangeBound {
    fn from(i: i32) -> Self {
        RangeBound::Int(i64::from(i))
    }
}

impl From<i64> for RangeBound {
    fn from(i: i64) -> Self {
        RangeBound::Int(i)
    }
}

impl From<u64> for RangeBound {
    fn from(u: u64) -> Self {
        RangeBound::UInt(u)
    }
}

impl From<f64> for RangeBound {
    fn from(f: f64) -> Self {
        RangeBound::Float(f)
    }
}

/// Passes when a numeric value lies between two optional bounds
///
/// Bounds are exclusive unless `allow_equals` is set. A missing bound leaves
/// that side open.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RangeConstraint {
    min: Option<RangeBound>,
    max: Option<RangeBound>,
    allow_equals: bool,
}

impl RangeConstraint {
    /// Create an exclusive range; `None` leaves a side open
    pub fn new(min: Option<RangeBound>, max: Option<RangeBound>) -> Self {
        Self {
            min,
            max,
            allow_equals: false,
        }
    }

    /// Exclusive range with both bounds set
    pub fn between(min: impl Into<RangeBound>, max: impl Into<RangeBound>) -> Self {
        Self::new(Some(min.into()), Some(max.into()))
    }

    /// Range open above
    pub fn at_least(min: impl Into<RangeBound>) -> Self {
        Self::new(Some(min.into()), None)
    }

    /// Range open below
    pub fn at_most(max: impl Into<RangeBound>) -> Self {
        Self::new(None, Some(max.into()))
    }

    /// Whether a value equal to a bound passes
    #[must_use]
    pub fn allow_equals(mut self, allow: bool) -> Self {
        self.allow_equals = allow;
        self
    }

    /// Shorthand for `allow_equals(true)`
    #[must_use]
    pub fn inclusive(self) -> Self {
        self.allow_equals(true)
    }

    /// Lower bound, if any
    pub fn min(&self) -> Option<RangeBound> {
        self.min
    }

    /// Upper bound, if any
    pub fn max(&self) -> Option<RangeBound> {
        self.max
    }

    /// Whether bounds are inclusive
    pub fn is_inclusive(&self) -> bool {
        self.allow_equals
    }

    fn test(&self, value: &Value) -> std::result::Result<bool, String> {
        let v = value
            .as_number()
            .and_then(RangeBound::of)
            .ok_or_else(|| {
                format!(
                    "'{}' is not comparable with a number",
                    ValueKind::of(value)
                )
            })?;

        let accepted = |bound: Option<RangeBound>, wanted: Ordering| {
            bound.is_none_or(|b| match v.compare(b) {
                Some(Ordering::Equal) => self.allow_equals,
                Some(order) => order == wanted,
                None => false,
            })
        };
        Ok(accepted(self.min, Ordering::Greater) && accepted(self.max, Ordering::Less))
    }

    fn interval(&self) -> String {
        let (open, close) = if self.allow_equals {
            ('[', ']')
        } else {
            ('(', ')')
        };
        let min = self.min.map_or_else(|| "-inf".to_string(), |m| m.to_string());
        let max = self.max.map_or_else(|| "inf".to_string(), |m| m.to_string());
        format!("{open}{min}, {max}{close}")
    }

    /// Failure message of this constraint
    pub fn description(&self) -> String {
        format!("should be in range {}", self.interval())
    }

    pub(crate) fn evaluate(&self, value: &Value) -> Outcome {
        judge(self.test(value), || self.description())
    }
}

impl fmt::Display for RangeConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "range{}", self.interval())
    }
}

// =============================================================================
// String Pattern Constraint
// =============================================================================

/// How a pattern is applied to the candidate string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// The whole string must match
    #[default]
    FullMatch,
    /// The match must start at the beginning of the string
    Match,
    /// The pattern may match anywhere
    Search,
}

impl MatchMode {
    /// Mode name as written in rule literals
    pub fn as_str(self) -> &'static str {
        match self {
            MatchMode::FullMatch => "fullmatch",
            MatchMode::Match => "match",
            MatchMode::Search => "search",
        }
    }
}

impl FromStr for MatchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fullmatch" => Ok(MatchMode::FullMatch),
            "match" => Ok(MatchMode::Match),
            "search" => Ok(MatchMode::Search),
            other => Err(Error::InvalidRule {
                rule: format!("\"{other}\""),
                reason: "match mode must be one of fullmatch, match, search".into(),
            }),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pattern compilation flags, using the conventional integer bit values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PatternFlags(u32);

impl PatternFlags {
    pub const NONE: PatternFlags = PatternFlags(0);
    pub const IGNORECASE: PatternFlags = PatternFlags(2);
    pub const MULTILINE: PatternFlags = PatternFlags(8);
    pub const DOTALL: PatternFlags = PatternFlags(16);
    pub const UNICODE: PatternFlags = PatternFlags(32);
    pub const VERBOSE: PatternFlags = PatternFlags(64);

    const SUPPORTED: u32 = 2 | 8 | 16 | 32 | 64;

    /// Build flags from raw bits, rejecting bits that have no regex counterpart
    pub fn from_bits(bits: u32) -> Result<Self> {
        if bits & !Self::SUPPORTED != 0 {
            return Err(Error::InvalidRule {
                rule: format!("flags={bits}"),
                reason: format!("unsupported flag bits {:#x}", bits & !Self::SUPPORTED),
            });
        }
        Ok(PatternFlags(bits))
    }

    /// Raw flag bits
    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: PatternFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for PatternFlags {
    type Output = PatternFlags;

    fn bitor(self, rhs: PatternFlags) -> PatternFlags {
        PatternFlags(self.0 | rhs.0)
    }
}

/// Passes when a string value matches a regular expression
#[derive(Debug, Clone)]
pub struct PatternConstraint {
    pattern: String,
    mode: MatchMode,
    flags: PatternFlags,
    regex: Regex,
}

impl PatternConstraint {
    /// Full-match pattern without flags
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        Self::with_options(pattern, MatchMode::FullMatch, PatternFlags::NONE)
    }

    pub fn with_options(
        pattern: impl Into<String>,
        mode: MatchMode,
        flags: PatternFlags,
    ) -> Result<Self> {
        let pattern = pattern.into();
        // A trailing comment in verbose mode would swallow the closing anchor.
        let body = if flags.contains(PatternFlags::VERBOSE) {
            format!("{pattern}\n")
        } else {
            pattern.clone()
        };
        let expr = match mode {
            MatchMode::FullMatch => format!(r"\A(?:{body})\z"),
            MatchMode::Match => format!(r"\A(?:{body})"),
            MatchMode::Search => body,
        };

        let regex = RegexBuilder::new(&expr)
            .case_insensitive(flags.contains(PatternFlags::IGNORECASE))
            .multi_line(flags.contains(PatternFlags::MULTILINE))
            .dot_matches_new_line(flags.contains(PatternFlags::DOTALL))
            .ignore_whitespace(flags.contains(PatternFlags::VERBOSE))
            .build()
            .map_err(|source| Error::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;

        Ok(Self {
            pattern,
            mode,
            flags,
            regex,
        })
    }

    /// Pattern source as given
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn flags(&self) -> PatternFlags {
        self.flags
    }

    fn test(&self, value: &Value) -> std::result::Result<bool, String> {
        let text = value.as_str().ok_or_else(|| {
            format!(
                "expected string or bytes-like object, got '{}'",
                ValueKind::of(value)
            )
        })?;
        Ok(self.regex.is_match(text))
    }

    /// Failure message of this constraint
    pub fn description(&self) -> String {
        format!(
            "should match pattern \"{}\" (f={}, flags={})",
            self.pattern,
            self.mode,
            self.flags.bits()
        )
    }

    pub(crate) fn evaluate(&self, value: &Value) -> Outcome {
        judge(self.test(value), || self.description())
    }
}

impl fmt::Display for PatternConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pattern(\"{}\", {})", self.pattern, self.mode)
    }
}

// =============================================================================
// Tests
// =============================================================================
