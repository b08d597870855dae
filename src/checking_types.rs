// Copyright (C) 2023 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum State {
    Ok,
    Warn,
    Crit,
    Unknown,
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter) -> FormatResult {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Warn => write!(f, "WARNING"),
            Self::Crit => write!(f, "CRITICAL"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl From<State> for i32 {
    fn from(value: State) -> Self {
        match value {
            State::Ok => 0,
            State::Warn => 1,
            State::Crit => 2,
            State::Unknown => 3,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum RangeError {
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("start {start} is greater than end {end}")]
    StartAfterEnd { start: f64, end: f64 },
}

// The usual monitoring plugin range syntax:
// * `10`     alert outside 0..10
// * `10:`    alert below 10
// * `~:10`   alert above 10
// * `10:20`  alert outside 10..20
// * `@10:20` alert inside 10..20
// A missing start means 0, `~` means negative infinity and a missing end positive infinity.
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    pub start: f64,
    pub end: f64,
    pub alert_inside: bool,
}

impl Range {
    pub fn alerts(&self, value: f64) -> bool {
        let inside = self.start <= value && value <= self.end;
        inside == self.alert_inside
    }
}

impl FromStr for Range {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (alert_inside, s) = match s.strip_prefix('@') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let parse = |text: &str| {
            text.trim()
                .parse::<f64>()
                .map_err(|_| RangeError::NotANumber(text.to_string()))
        };

        let (start, end) = match s.split_once(':') {
            Some((start, end)) => (
                match start {
                    "" => 0.,
                    "~" => f64::NEG_INFINITY,
                    start => parse(start)?,
                },
                match end {
                    "" => f64::INFINITY,
                    end => parse(end)?,
                },
            ),
            None => (0., parse(s)?),
        };

        if start > end {
            return Err(RangeError::StartAfterEnd { start, end });
        }

        Ok(Self {
            start,
            end,
            alert_inside,
        })
    }
}

// Perfdata entry. Value and levels are kept as the literal text from the document
// and the command line, so nothing is lost to float formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub name: String,
    pub value: String,
    pub levels: Option<(String, String)>,
}

impl Display for Metric {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        write!(f, "{}={}", self.name, self.value)?;
        if let Some((warn, crit)) = &self.levels {
            write!(f, ";{};{}", warn, crit)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckItem {
    pub state: State,
    text: String,
}

impl Display for CheckItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        // The pipe symbol indicates end of service output and start of metrics.
        // Replace any (e.g. from a document value) by a Unicode "Light vertical bar"
        write!(f, "{}", self.text.replace('|', "\u{2758}"))
    }
}

impl CheckItem {
    fn new(state: State, text: &str) -> Option<Self> {
        if text.is_empty() {
            return None;
        };

        Some(Self {
            state,
            text: text.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckResult {
    Summary(CheckItem),
    Metric(Metric),
}

impl CheckResult {
    pub fn summary(state: State, text: &str) -> Option<CheckResult> {
        CheckItem::new(state, text).map(Self::Summary)
    }

    pub fn metric(
        name: &str,
        value: &str,
        levels: Option<(String, String)>,
    ) -> Option<CheckResult> {
        Some(CheckResult::Metric(Metric {
            name: name.to_string(),
            value: value.to_string(),
            levels,
        }))
    }
}



#[cfg(test)]
mod test_metric {
    use super::*;

    #[test]
    fn test_without_levels() {
        let m = Metric {
            name: "cpu".to_string(),
            value: "85".to_string(),
            levels: None,
        };
        assert_eq!(m.to_string(), "cpu=85");
    }

    #[test]
    fn test_with_raw_levels() {
        let m = Metric {
            name: "load".to_string(),
            value: "1.5".to_string(),
            levels: Some(("@1:2".to_string(), "".to_string())),
        };
        assert_eq!(m.to_string(), "load=1.5;@1:2;");
    }

    #[test]
    fn test_value_is_printed_verbatim() {
        let m = Metric {
            name: "id".to_string(),
            value: "12345678901234567".to_string(),
            levels: None,
        };
        assert_eq!(m.to_string(), "id=12345678901234567");
    }

    #[test]
    fn test_empty_summary_is_dropped() {
        assert_eq!(CheckResult::summary(State::Ok, ""), None);
    }
}
