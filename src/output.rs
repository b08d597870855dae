// Copyright (C) 2023 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

use crate::checking_types::{CheckResult, State};
use std::fmt::{Display, Formatter, Result as FormatResult};

pub const SHORT_NAME: &str = "JSON_XML";

pub struct Output {
    pub worst_state: State,
    check_results: Vec<CheckResult>,
}

impl Display for Output {
    fn fmt(&self, f: &mut Formatter) -> FormatResult {
        fn write_joined<T: Display>(
            f: &mut Formatter,
            mut iter: impl Iterator<Item = T>,
            start: &'static str,
            joiner: &'static str,
        ) -> FormatResult {
            if let Some(item) = iter.next() {
                write!(f, "{}{}", start, item)?;
            };
            for item in iter {
                write!(f, "{}{}", joiner, item)?;
            }
            Ok(())
        }

        write!(f, "{} {}", SHORT_NAME, self.worst_state)?;

        let summaries = self.check_results.iter().filter_map(|cr| match cr {
            CheckResult::Summary(check_item) => Some(check_item),
            _ => None,
        });
        write_joined(f, summaries, " - ", ", ")?;

        let metrics = self.check_results.iter().filter_map(|cr| match cr {
            CheckResult::Metric(metric) => Some(metric),
            _ => None,
        });
        write_joined(f, metrics, "\n|", " ")?;

        Ok(())
    }
}

impl Output {
    pub fn from_check_results(check_results: Vec<CheckResult>) -> Self {
        let worst_state = check_results
            .iter()
            .filter_map(|cr| match cr {
                CheckResult::Summary(check_item) => Some(check_item.state),
                _ => None,
            })
            .max()
            .unwrap_or(State::Ok);

        Self {
            worst_state,
            check_results,
        }
    }

    pub fn from_summary(state: State, text: &str) -> Self {
        Self::from_check_results(CheckResult::summary(state, text).into_iter().collect())
    }
}

#[cfg(test)]
mod test_output_format {
    use super::*;

    fn summary(state: State, text: &str) -> CheckResult {
        CheckResult::summary(state, text).unwrap()
    }

    fn metric(name: &str, value: &str, levels: Option<(&str, &str)>) -> CheckResult {
        CheckResult::metric(
            name,
            value,
            levels.map(|(w, c)| (w.to_string(), c.to_string())),
        )
        .unwrap()
    }

    #[test]
    fn test_no_check_results_is_ok() {
        let output = Output::from_check_results(vec![]);
        assert_eq!(output.worst_state, State::Ok);
        assert_eq!(format!("{}", output), "JSON_XML OK");
    }

    #[test]
    fn test_summaries_are_joined_in_order() {
        let output = Output::from_check_results(vec![
            summary(State::Ok, "$.a: 1"),
            summary(State::Warn, "$.b: 2 (THRESHOLD WARNING)"),
            summary(State::Ok, "$.c: 3"),
        ]);
        assert_eq!(output.worst_state, State::Warn);
        assert_eq!(
            format!("{}", output),
            "JSON_XML WARNING - $.a: 1, $.b: 2 (THRESHOLD WARNING), $.c: 3"
        );
    }

    #[test]
    fn test_worst_state_is_order_independent() {
        let states = [State::Warn, State::Crit, State::Ok, State::Unknown];
        for rotation in 0..states.len() {
            let mut rotated = states;
            rotated.rotate_left(rotation);
            let output = Output::from_check_results(
                rotated.iter().map(|s| summary(*s, "x")).collect(),
            );
            assert_eq!(output.worst_state, State::Unknown);
        }
    }

    #[test]
    fn test_metrics_on_second_line() {
        let output = Output::from_check_results(vec![
            summary(State::Crit, "//cpu: 99 (THRESHOLD CRITICAL)"),
            metric("cpu", "99", Some(("80", "95"))),
            summary(State::Ok, "//mem: 12"),
            metric("mem", "12", None),
        ]);
        assert_eq!(
            format!("{}", output),
            "JSON_XML CRITICAL - //cpu: 99 (THRESHOLD CRITICAL), //mem: 12\n|cpu=99;80;95 mem=12"
        );
    }

    #[test]
    fn test_from_summary() {
        let output = Output::from_summary(State::Unknown, "Invalid document type 'yaml'");
        assert_eq!(i32::from(output.worst_state), 3);
        assert_eq!(
            format!("{}", output),
            "JSON_XML UNKNOWN - Invalid document type 'yaml'"
        );
    }

    #[test]
    fn test_cleanup_pipe() {
        let output = Output::from_check_results(vec![
            summary(State::Ok, "$.v: a|b"),
            metric("x", "1", None),
        ]);
        assert_eq!(format!("{}", output), "JSON_XML OK - $.v: a\u{2758}b\n|x=1");
    }
}
