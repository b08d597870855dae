// Copyright (C) 2023 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FormatResult};

use regex::{Regex, RegexBuilder};
use thiserror::Error;
use typed_builder::TypedBuilder;

use crate::checking_types::{Range, RangeError, State};
use crate::document::TypeSelection;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid document type '{0}' (expected xml, json or auto)")]
    InvalidType(String),
    #[error("Invalid threshold '{spec}': {reason}")]
    Threshold { spec: String, reason: String },
    #[error("Invalid string check '{spec}': {reason}")]
    StringCheck { spec: String, reason: String },
    #[error("Invalid URL '{url}': {reason}")]
    Url { url: String, reason: String },
    #[error("Invalid host header '{0}'")]
    HostHeader(String),
}

/// Warning and critical ranges for one query path.
///
/// The raw strings are kept verbatim for the perfdata levels; an empty string
/// means "no range".
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdSpec {
    pub warning: String,
    pub critical: String,
    warning_range: Option<Range>,
    critical_range: Option<Range>,
}

impl ThresholdSpec {
    pub fn new(warning: &str, critical: &str) -> Result<Self, RangeError> {
        let range = |raw: &str| match raw {
            "" => Ok(None),
            raw => raw.parse::<Range>().map(Some),
        };
        Ok(Self {
            warning_range: range(warning)?,
            critical_range: range(critical)?,
            warning: warning.to_string(),
            critical: critical.to_string(),
        })
    }

    pub fn evaluate(&self, value: f64) -> State {
        let alerts = |range: &Option<Range>| range.as_ref().is_some_and(|r| r.alerts(value));
        if alerts(&self.critical_range) {
            State::Crit
        } else if alerts(&self.warning_range) {
            State::Warn
        } else {
            State::Ok
        }
    }

    pub fn perfdata_levels(&self) -> (String, String) {
        (self.warning.clone(), self.critical.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedStatus {
    Ok,
    Warning,
    Critical,
}

impl ExpectedStatus {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ok" => Some(Self::Ok),
            "warning" => Some(Self::Warning),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl From<ExpectedStatus> for State {
    fn from(value: ExpectedStatus) -> Self {
        match value {
            ExpectedStatus::Ok => State::Ok,
            ExpectedStatus::Warning => State::Warn,
            ExpectedStatus::Critical => State::Crit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseSensitivity {
    Sensitive,
    Insensitive,
}

impl Display for CaseSensitivity {
    fn fmt(&self, f: &mut Formatter) -> FormatResult {
        match self {
            Self::Sensitive => write!(f, "case-sensitive"),
            Self::Insensitive => write!(f, "case-insensitive"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StringCheckSpec {
    pub regex: Regex,
    pub expected_status: ExpectedStatus,
    pub case_sensitivity: CaseSensitivity,
}

impl StringCheckSpec {
    // A match yields the expected status. Without a match, only an expected "ok"
    // is an alert (the pattern is required); for "warning"/"critical" the pattern
    // describes a failure that is simply absent.
    pub fn evaluate(&self, text: &str) -> State {
        match (self.regex.is_match(text), self.expected_status) {
            (true, expected) => expected.into(),
            (false, ExpectedStatus::Ok) => State::Crit,
            (false, ExpectedStatus::Warning | ExpectedStatus::Critical) => State::Ok,
        }
    }
}

/// Everything the query checks need, built once from the command line.
#[derive(Debug, TypedBuilder)]
pub struct CheckParameters {
    pub queries: Vec<String>,
    #[builder(default = TypeSelection::Auto)]
    pub type_selection: TypeSelection,
    #[builder(default)]
    pub thresholds: HashMap<String, ThresholdSpec>,
    #[builder(default)]
    pub string_checks: HashMap<String, StringCheckSpec>,
    #[builder(default = false)]
    pub perfdata: bool,
}

/// Parses `path:warning:critical` specs. Later specs for the same path win.
pub fn parse_thresholds<S: AsRef<str>>(
    specs: &[S],
) -> Result<HashMap<String, ThresholdSpec>, ConfigError> {
    specs
        .iter()
        .map(|spec| parse_threshold(spec.as_ref()))
        .collect()
}

fn parse_threshold(spec: &str) -> Result<(String, ThresholdSpec), ConfigError> {
    let error = |reason: &str| ConfigError::Threshold {
        spec: spec.to_string(),
        reason: reason.to_string(),
    };

    let mut parts = spec.splitn(3, ':');
    let path = parts.next().unwrap_or_default();
    let warning = parts.next().unwrap_or_default();
    let critical = parts.next().unwrap_or_default();

    if path.is_empty() {
        return Err(error("missing path"));
    }
    if warning.is_empty() && critical.is_empty() {
        return Err(error("neither warning nor critical given"));
    }

    let threshold = ThresholdSpec::new(warning, critical).map_err(|e| error(&e.to_string()))?;
    Ok((path.to_string(), threshold))
}

/// Parses `path:regex:status[:flags]` specs. Later specs for the same path win.
pub fn parse_string_checks<S: AsRef<str>>(
    specs: &[S],
) -> Result<HashMap<String, StringCheckSpec>, ConfigError> {
    specs
        .iter()
        .map(|spec| parse_string_check(spec.as_ref()))
        .collect()
}

// The path ends at the first colon. Status and flags are taken from the right,
// so the regex in between may contain colons itself.
fn parse_string_check(spec: &str) -> Result<(String, StringCheckSpec), ConfigError> {
    let error = |reason: String| ConfigError::StringCheck {
        spec: spec.to_string(),
        reason,
    };

    let Some((path, rest)) = spec.split_once(':') else {
        return Err(error("expected path:regex:status[:flags]".to_string()));
    };
    if path.is_empty() {
        return Err(error("missing path".to_string()));
    }
    let Some((head, last)) = rest.rsplit_once(':') else {
        return Err(error("expected path:regex:status[:flags]".to_string()));
    };

    let (regex, status, flags) = match ExpectedStatus::parse(last) {
        Some(status) => (head, status, ""),
        None => {
            let Some((regex, status)) = head.rsplit_once(':') else {
                return Err(error(format!(
                    "invalid status '{}' (expected ok, warning or critical)",
                    last
                )));
            };
            let Some(status) = ExpectedStatus::parse(status) else {
                return Err(error(format!(
                    "invalid status '{}' (expected ok, warning or critical)",
                    status
                )));
            };
            (regex, status, last)
        }
    };

    let case_sensitivity = match flags {
        "c" => CaseSensitivity::Sensitive,
        "" | "i" => CaseSensitivity::Insensitive,
        other => {
            return Err(error(format!(
                "invalid flags '{}' (expected c or i)",
                other
            )))
        }
    };

    let regex = RegexBuilder::new(regex)
        .case_insensitive(case_sensitivity == CaseSensitivity::Insensitive)
        .build()
        .map_err(|e| error(e.to_string()))?;

    Ok((
        path.to_string(),
        StringCheckSpec {
            regex,
            expected_status: status,
            case_sensitivity,
        },
    ))
}

#[cfg(test)]
mod test_parse_thresholds {
    use super::*;

    #[test]
    fn test_warn_crit() {
        let t = parse_thresholds(&["path:10:20"]).unwrap();
        assert_eq!(t["path"].warning, "10");
        assert_eq!(t["path"].critical, "20");
    }

    #[test]
    fn test_crit_only() {
        let t = parse_thresholds(&["path::20"]).unwrap();
        assert_eq!(t["path"].warning, "");
        assert_eq!(t["path"].critical, "20");
    }

    #[test]
    fn test_warn_only() {
        let t = parse_thresholds(&["//cpu:80"]).unwrap();
        assert_eq!(t["//cpu"].warning, "80");
        assert_eq!(t["//cpu"].critical, "");
    }

    #[test]
    fn test_critical_may_be_a_full_range() {
        let t = parse_thresholds(&["//temp:50:10:60"]).unwrap();
        assert_eq!(t["//temp"].warning, "50");
        assert_eq!(t["//temp"].critical, "10:60");
    }

    #[test]
    fn test_last_one_wins() {
        let t = parse_thresholds(&["p:1:2", "p:3:4"]).unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t["p"].warning, "3");
    }

    #[test]
    fn test_missing_path() {
        assert!(matches!(
            parse_thresholds(&[":10:20"]),
            Err(ConfigError::Threshold { .. })
        ));
    }

    #[test]
    fn test_missing_bounds() {
        assert!(parse_thresholds(&["path"]).is_err());
        assert!(parse_thresholds(&["path::"]).is_err());
    }

    #[test]
    fn test_invalid_range() {
        assert!(parse_thresholds(&["path:abc:20"]).is_err());
    }

    #[test]
    fn test_evaluate() {
        let t = ThresholdSpec::new("80", "95").unwrap();
        assert_eq!(t.evaluate(50.), State::Ok);
        assert_eq!(t.evaluate(85.), State::Warn);
        assert_eq!(t.evaluate(96.), State::Crit);
    }

    #[test]
    fn test_evaluate_critical_only() {
        let t = ThresholdSpec::new("", "@0:0").unwrap();
        assert_eq!(t.evaluate(0.), State::Crit);
        assert_eq!(t.evaluate(1.), State::Ok);
    }
}
