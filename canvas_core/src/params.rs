//! # Parameter Schemas and State
//!
//! Every module declares an ordered list of [`ParameterSpec`]s. A spec knows
//! its label, unit, default and admissible range, and converts raw user text
//! into a typed [`ParamValue`].
//!
//! A module's live state is a [`ModuleParameterState`]: an open map from
//! parameter name to value. Names that were never entered simply fall back
//! to the schema default when a [`ParameterSet`] resolves them for a design
//! generator.
//!
//! ## Example
//!
//! ```rust
//! use canvas_core::params::{ModuleParameterState, ParameterSet, ParameterSpec, ParamValue};
//!
//! const SPECS: &[ParameterSpec] = &[
//!     ParameterSpec::number("span", "Clear span", "mm", 1200.0, 300.0, 6000.0),
//! ];
//!
//! let mut state = ModuleParameterState::new();
//! let value = SPECS[0].parse("lintel", "1500").unwrap();
//! state.insert("span".to_string(), value);
//!
//! let params = ParameterSet::new("lintel", SPECS, &state);
//! assert_eq!(params.number("span").unwrap(), 1500.0);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{CanvasError, CanvasResult};

/// Open map of parameter name to entered value, owned by one module session.
pub type ModuleParameterState = BTreeMap<String, ParamValue>;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl ParamValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParamValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            ParamValue::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Flag(true) => f.write_str("Yes"),
            ParamValue::Flag(false) => f.write_str("No"),
            ParamValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{:.0}", n),
            ParamValue::Number(n) => write!(f, "{}", n),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

/// Type, default and admissible values of a parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    /// Real number within `[min, max]`
    Number { default: f64, min: f64, max: f64 },
    /// Whole number within `[min, max]`
    Integer { default: i64, min: i64, max: i64 },
    /// One of a fixed list of labels
    Choice {
        default: &'static str,
        options: &'static [&'static str],
    },
    /// Yes/no switch
    Flag { default: bool },
    /// Short free text (marks, labels)
    Text { default: &'static str, max_len: usize },
}

/// Static description of one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSpec {
    /// Key in [`ModuleParameterState`]
    pub name: &'static str,
    /// Form label
    pub label: &'static str,
    /// Unit shown next to the field; empty when dimensionless
    pub unit: &'static str,
    pub kind: ParamKind,
}

impl ParameterSpec {
    pub const fn number(
        name: &'static str,
        label: &'static str,
        unit: &'static str,
        default: f64,
        min: f64,
        max: f64,
    ) -> Self {
        ParameterSpec {
            name,
            label,
            unit,
            kind: ParamKind::Number { default, min, max },
        }
    }

    pub const fn integer(
        name: &'static str,
        label: &'static str,
        unit: &'static str,
        default: i64,
        min: i64,
        max: i64,
    ) -> Self {
        ParameterSpec {
            name,
            label,
            unit,
            kind: ParamKind::Integer { default, min, max },
        }
    }

    pub const fn choice(
        name: &'static str,
        label: &'static str,
        options: &'static [&'static str],
        default: &'static str,
    ) -> Self {
        ParameterSpec {
            name,
            label,
            unit: "",
            kind: ParamKind::Choice { default, options },
        }
    }

    pub const fn flag(name: &'static str, label: &'static str, default: bool) -> Self {
        ParameterSpec {
            name,
            label,
            unit: "",
            kind: ParamKind::Flag { default },
        }
    }

    pub const fn text(name: &'static str, label: &'static str, default: &'static str, max_len: usize) -> Self {
        ParameterSpec {
            name,
            label,
            unit: "",
            kind: ParamKind::Text { default, max_len },
        }
    }

    /// The schema default as a value
    pub fn default_value(&self) -> ParamValue {
        match self.kind {
            ParamKind::Number { default, .. } => ParamValue::Number(default),
            ParamKind::Integer { default, .. } => ParamValue::Number(default as f64),
            ParamKind::Choice { default, .. } => ParamValue::Text(default.to_string()),
            ParamKind::Flag { default } => ParamValue::Flag(default),
            ParamKind::Text { default, .. } => ParamValue::Text(default.to_string()),
        }
    }

    /// Parse raw form text into a validated value.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` when the text is not of the right type or lies
    /// outside the admissible range.
    pub fn parse(&self, module: &str, raw: &str) -> CanvasResult<ParamValue> {
        let trimmed = raw.trim();
        let invalid = |reason: String| CanvasError::invalid_parameter(module, self.name, raw, reason);

        match self.kind {
            ParamKind::Number { .. } => {
                let n: f64 = trimmed
                    .parse()
                    .map_err(|_| invalid(format!("{} must be a number", self.label)))?;
                self.check(module, &ParamValue::Number(n))
            }
            ParamKind::Integer { .. } => {
                let n: i64 = trimmed
                    .parse()
                    .map_err(|_| invalid(format!("{} must be a whole number", self.label)))?;
                self.check(module, &ParamValue::Number(n as f64))
            }
            ParamKind::Choice { .. } => self.check(module, &ParamValue::Text(trimmed.to_string())),
            ParamKind::Flag { .. } => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "on" | "1" => Ok(ParamValue::Flag(true)),
                "false" | "no" | "n" | "off" | "0" => Ok(ParamValue::Flag(false)),
                _ => Err(invalid(format!("{} must be yes or no", self.label))),
            },
            ParamKind::Text { .. } => self.check(module, &ParamValue::Text(trimmed.to_string())),
        }
    }

    /// Validate an already-typed value (e.g. read from a project file) and
    /// return its canonical form.
    pub fn check(&self, module: &str, value: &ParamValue) -> CanvasResult<ParamValue> {
        let invalid = |reason: String| CanvasError::invalid_parameter(module, self.name, value.to_string(), reason);

        match (self.kind, value) {
            (ParamKind::Number { min, max, .. }, ParamValue::Number(n)) => {
                if !n.is_finite() {
                    return Err(invalid(format!("{} must be a finite number", self.label)));
                }
                if *n < min || *n > max {
                    return Err(invalid(format!(
                        "{} must be between {} and {}",
                        self.label,
                        ParamValue::Number(min),
                        ParamValue::Number(max)
                    )));
                }
                Ok(ParamValue::Number(*n))
            }
            (ParamKind::Integer { min, max, .. }, ParamValue::Number(n)) => {
                if n.fract() != 0.0 {
                    return Err(invalid(format!("{} must be a whole number", self.label)));
                }
                if *n < min as f64 || *n > max as f64 {
                    return Err(invalid(format!("{} must be between {} and {}", self.label, min, max)));
                }
                Ok(ParamValue::Number(*n))
            }
            (ParamKind::Choice { options, .. }, ParamValue::Text(s)) => options
                .iter()
                .find(|o| o.eq_ignore_ascii_case(s))
                .map(|o| ParamValue::Text(o.to_string()))
                .ok_or_else(|| invalid(format!("{} must be one of: {}", self.label, options.join(", ")))),
            (ParamKind::Flag { .. }, ParamValue::Flag(b)) => Ok(ParamValue::Flag(*b)),
            (ParamKind::Text { max_len, .. }, ParamValue::Text(s)) => {
                if s.is_empty() {
                    return Err(invalid(format!("{} cannot be empty", self.label)));
                }
                if s.chars().count() > max_len {
                    return Err(invalid(format!("{} is limited to {} characters", self.label, max_len)));
                }
                Ok(ParamValue::Text(s.clone()))
            }
            _ => Err(invalid(format!("wrong value type for {}", self.label))),
        }
    }

    /// Hint text for the form field (range or options)
    pub fn hint(&self) -> String {
        match self.kind {
            ParamKind::Number { min, max, .. } => {
                format!("{} to {}", ParamValue::Number(min), ParamValue::Number(max))
            }
            ParamKind::Integer { min, max, .. } => format!("{} to {}", min, max),
            ParamKind::Choice { options, .. } => options.join(" / "),
            ParamKind::Flag { .. } => "yes / no".to_string(),
            ParamKind::Text { max_len, .. } => format!("up to {} characters", max_len),
        }
    }
}

/// Validate a whole parameter map against a schema, e.g. after loading a
/// project file. Returns the canonicalized map.
pub fn validate_state(
    module: &str,
    specs: &[ParameterSpec],
    state: &ModuleParameterState,
) -> CanvasResult<ModuleParameterState> {
    state
        .iter()
        .map(|(name, value)| {
            let spec = specs
                .iter()
                .find(|s| s.name == name.as_str())
                .ok_or_else(|| CanvasError::unknown_parameter(module, name.as_str()))?;
            Ok((name.clone(), spec.check(module, value)?))
        })
        .collect()
}

/// Build a state holding every schema default.
pub fn defaults(specs: &[ParameterSpec]) -> ModuleParameterState {
    specs
        .iter()
        .map(|s| (s.name.to_string(), s.default_value()))
        .collect()
}

/// One row of the parameter table shown in the form and in reports.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParameter {
    pub spec: &'static ParameterSpec,
    /// Effective value (entered or default)
    pub value: ParamValue,
    /// True when the user has not entered this parameter
    pub is_default: bool,
}

/// Read-only view of a module's parameters with schema defaults applied.
///
/// Design generators read their inputs exclusively through this type.
#[derive(Debug, Clone, Copy)]
pub struct ParameterSet<'a> {
    module: &'static str,
    specs: &'static [ParameterSpec],
    values: &'a ModuleParameterState,
}

impl<'a> ParameterSet<'a> {
    pub fn new(module: &'static str, specs: &'static [ParameterSpec], values: &'a ModuleParameterState) -> Self {
        ParameterSet { module, specs, values }
    }

    /// Module id these parameters belong to
    pub fn module(&self) -> &'static str {
        self.module
    }

    fn value(&self, name: &str) -> CanvasResult<ParamValue> {
        let spec = self
            .specs
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| CanvasError::missing_parameter(name))?;
        Ok(self
            .values
            .get(name)
            .cloned()
            .unwrap_or_else(|| spec.default_value()))
    }

    fn wrong_type(&self, name: &str, value: &ParamValue) -> CanvasError {
        CanvasError::invalid_parameter(self.module, name, value.to_string(), "wrong value type")
    }

    pub fn number(&self, name: &str) -> CanvasResult<f64> {
        let value = self.value(name)?;
        value.as_number().ok_or_else(|| self.wrong_type(name, &value))
    }

    /// Whole-number parameter as a count
    pub fn count(&self, name: &str) -> CanvasResult<usize> {
        let n = self.number(name)?;
        if n < 0.0 || n.fract() != 0.0 {
            return Err(CanvasError::invalid_parameter(self.module, name, n.to_string(), "must be a non-negative whole number"));
        }
        Ok(n as usize)
    }

    pub fn choice(&self, name: &str) -> CanvasResult<String> {
        let value = self.value(name)?;
        match value {
            ParamValue::Text(s) => Ok(s),
            other => Err(self.wrong_type(name, &other)),
        }
    }

    pub fn flag(&self, name: &str) -> CanvasResult<bool> {
        let value = self.value(name)?;
        value.as_flag().ok_or_else(|| self.wrong_type(name, &value))
    }

    pub fn text(&self, name: &str) -> CanvasResult<String> {
        self.choice(name)
    }

    /// All parameters in schema order with their effective values
    pub fn resolved(&self) -> Vec<ResolvedParameter> {
        self.specs
            .iter()
            .map(|spec| match self.values.get(spec.name) {
                Some(v) => ResolvedParameter {
                    spec,
                    value: v.clone(),
                    is_default: false,
                },
                None => ResolvedParameter {
                    spec,
                    value: spec.default_value(),
                    is_default: true,
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SPECS: &[ParameterSpec] = &[
        ParameterSpec::number("span", "Span", "mm", 1200.0, 300.0, 6000.0),
        ParameterSpec::integer("bars", "Number of bars", "", 3, 2, 10),
        ParameterSpec::choice("grade", "Concrete grade", &["M20", "M25", "M30"], "M20"),
        ParameterSpec::flag("drain", "Side drains", true),
        ParameterSpec::text("mark", "Mark", "01", 8),
    ];

    #[rstest]
    #[case("1500", ParamValue::Number(1500.0))]
    #[case("  300 ", ParamValue::Number(300.0))]
    #[case("6000.0", ParamValue::Number(6000.0))]
    fn test_parse_number_ok(#[case] raw: &str, #[case] expected: ParamValue) {
        assert_eq!(SPECS[0].parse("lintel", raw).unwrap(), expected);
    }

    #[rstest]
    #[case("abc")]
    #[case("")]
    #[case("NaN")]
    #[case("inf")]
    #[case("299.9")]
    #[case("7000")]
    fn test_parse_number_rejected(#[case] raw: &str) {
        let err = SPECS[0].parse("lintel", raw).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(SPECS[1].parse("m", "4").unwrap(), ParamValue::Number(4.0));
        assert!(SPECS[1].parse("m", "4.5").is_err());
        assert!(SPECS[1].parse("m", "1").is_err());
    }

    #[test]
    fn test_parse_choice_is_case_insensitive_and_canonical() {
        let grade = SPECS[2].parse("m", "m25").unwrap();
        assert_eq!(grade.as_text(), Some("M25"));
        assert_eq!(grade.as_number(), None);
        assert!(SPECS[2].parse("m", "M90").is_err());
    }

    #[rstest]
    #[case("yes", true)]
    #[case("On", true)]
    #[case("0", false)]
    #[case("false", false)]
    fn test_parse_flag(#[case] raw: &str, #[case] expected: bool) {
        assert_eq!(SPECS[3].parse("m", raw).unwrap(), ParamValue::Flag(expected));
    }

    #[test]
    fn test_parse_text_length() {
        assert!(SPECS[4].parse("m", "A1").is_ok());
        assert!(SPECS[4].parse("m", "").is_err());
        assert!(SPECS[4].parse("m", "TOO-LONG-MARK").is_err());
    }

    #[test]
    fn test_parameter_set_falls_back_to_defaults() {
        let mut state = ModuleParameterState::new();
        state.insert("span".into(), ParamValue::Number(2000.0));
        let set = ParameterSet::new("lintel", SPECS, &state);

        assert_eq!(set.number("span").unwrap(), 2000.0);
        assert_eq!(set.count("bars").unwrap(), 3);
        assert_eq!(set.choice("grade").unwrap(), "M20");
        assert!(set.flag("drain").unwrap());
        assert!(set.number("unknown").is_err());

        let resolved = set.resolved();
        assert_eq!(resolved.len(), SPECS.len());
        assert!(!resolved[0].is_default);
        assert!(resolved[1].is_default);
    }

    #[test]
    fn test_validate_state_rejects_unknown_names() {
        let mut state = defaults(SPECS);
        assert!(validate_state("m", SPECS, &state).is_ok());

        state.insert("colour".into(), ParamValue::Text("red".into()));
        let err = validate_state("m", SPECS, &state).unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_PARAMETER");
    }

    #[test]
    fn test_value_json_shape() {
        let mut state = ModuleParameterState::new();
        state.insert("span".into(), ParamValue::Number(1200.0));
        state.insert("drain".into(), ParamValue::Flag(false));
        state.insert("grade".into(), ParamValue::Text("M25".into()));
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"drain":false,"grade":"M25","span":1200.0}"#);
        let back: ModuleParameterState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_display_trims_whole_numbers() {
        assert_eq!(ParamValue::Number(450.0).to_string(), "450");
        assert_eq!(ParamValue::Number(0.08).to_string(), "0.08");
    }
}
