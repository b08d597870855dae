// Copyright (C) 2023 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

use tracing::{event, Level};

use crate::checking_types::{CheckResult, Metric, State};
use crate::config::CheckParameters;
use crate::document::Document;
use crate::label::perf_label;

#[derive(Debug, PartialEq)]
pub struct QueryOutcome {
    pub query: String,
    pub display: Option<String>,
    pub label: String,
    pub state: State,
    pub text: String,
    pub metric: Option<Metric>,
}

impl QueryOutcome {
    fn into_check_results(self, perfdata: bool) -> Vec<Option<CheckResult>> {
        let mut results = vec![CheckResult::summary(self.state, &self.text)];
        if perfdata {
            results.push(self.metric.map(CheckResult::Metric));
        }
        results
    }
}

pub fn collect_query_checks(document: &Document, params: &CheckParameters) -> Vec<CheckResult> {
    params
        .queries
        .iter()
        .flat_map(|query| check_query(document, query, params).into_check_results(params.perfdata))
        .flatten()
        .collect()
}

// String checks take precedence over thresholds. The threshold levels still
// annotate the metric, whichever of the two decided the state.
pub fn check_query(document: &Document, query: &str, params: &CheckParameters) -> QueryOutcome {
    let label = perf_label(query, document.format());

    let value = match document.extract(query) {
        Ok(value) => value,
        Err(err) => {
            event!(Level::INFO, query, %err, "query failed");
            return QueryOutcome {
                query: query.to_string(),
                display: None,
                label,
                state: State::Crit,
                text: format!("{}: {}", query, err),
                metric: None,
            };
        }
    };

    let threshold = params.thresholds.get(query);

    let (state, text) = if let Some(string_check) = params.string_checks.get(query) {
        let state = string_check.evaluate(&value.display);
        (
            state,
            format!(
                "{}: {} (STRING CHECK {}) ({})",
                query, value.display, state, string_check.case_sensitivity
            ),
        )
    } else if let (Some(numeric), Some(threshold)) = (value.numeric, threshold) {
        let state = threshold.evaluate(numeric);
        (
            state,
            format!("{}: {} (THRESHOLD {})", query, value.display, state),
        )
    } else {
        (State::Ok, format!("{}: {}", query, value.display))
    };

    let metric = value.perf_value().map(|perf_value| Metric {
        name: label.clone(),
        value: perf_value,
        levels: threshold.map(|t| t.perfdata_levels()),
    });

    QueryOutcome {
        query: query.to_string(),
        display: Some(value.display),
        label,
        state,
        text,
        metric,
    }
}

#[cfg(test)]
mod test_check_query {
    use super::*;
    use crate::config::{parse_string_checks, parse_thresholds};
    use crate::document::DocumentFormat;

    fn json(content: &str) -> Document {
        Document::parse(DocumentFormat::Json, content).unwrap()
    }

    fn xml(content: &str) -> Document {
        Document::parse(DocumentFormat::Xml, content).unwrap()
    }

    fn params(queries: &[&str], thresholds: &[&str], string_checks: &[&str]) -> CheckParameters {
        CheckParameters::builder()
            .queries(queries.iter().map(|q| q.to_string()).collect())
            .thresholds(parse_thresholds(thresholds).unwrap())
            .string_checks(parse_string_checks(string_checks).unwrap())
            .perfdata(true)
            .build()
    }

    #[test]
    fn test_plain_value() {
        let outcome = check_query(&json(r#"{"name":"db1"}"#), "$.name", &params(&[], &[], &[]));
        assert_eq!(outcome.state, State::Ok);
        assert_eq!(outcome.text, "$.name: db1");
        assert_eq!(outcome.label, "name");
        assert_eq!(outcome.metric, None);
    }

    #[test]
    fn test_string_check_required_pattern_found() {
        let outcome = check_query(
            &json(r#"{"status":"ok"}"#),
            "$.status",
            &params(&[], &[], &["$.status:^ok$:ok"]),
        );
        assert_eq!(outcome.state, State::Ok);
        assert_eq!(
            outcome.text,
            "$.status: ok (STRING CHECK OK) (case-insensitive)"
        );
    }

    #[test]
    fn test_string_check_required_pattern_missing() {
        let outcome = check_query(
            &json(r#"{"status":"degraded"}"#),
            "$.status",
            &params(&[], &[], &["$.status:^ok$:ok"]),
        );
        assert_eq!(outcome.state, State::Crit);
        assert_eq!(
            outcome.text,
            "$.status: degraded (STRING CHECK CRITICAL) (case-insensitive)"
        );
    }

    #[test]
    fn test_string_check_failure_pattern() {
        let p = params(&[], &[], &["$.status:degraded:warning:c"]);
        let found = check_query(&json(r#"{"status":"degraded"}"#), "$.status", &p);
        assert_eq!(found.state, State::Warn);
        assert_eq!(
            found.text,
            "$.status: degraded (STRING CHECK WARNING) (case-sensitive)"
        );
        let absent = check_query(&json(r#"{"status":"DEGRADED"}"#), "$.status", &p);
        assert_eq!(absent.state, State::Ok);
        assert_eq!(
            absent.text,
            "$.status: DEGRADED (STRING CHECK OK) (case-sensitive)"
        );
    }

    #[test]
    fn test_threshold() {
        let outcome = check_query(
            &xml("<root><cpu>85</cpu></root>"),
            "//cpu",
            &params(&[], &["//cpu:80:95"], &[]),
        );
        assert_eq!(outcome.state, State::Warn);
        assert_eq!(outcome.text, "//cpu: 85 (THRESHOLD WARNING)");
        assert_eq!(
            outcome.metric,
            Some(Metric {
                name: "cpu".to_string(),
                value: "85".to_string(),
                levels: Some(("80".to_string(), "95".to_string())),
            })
        );
    }

    #[test]
    fn test_threshold_ignored_for_text() {
        let outcome = check_query(
            &json(r#"{"v":"n/a"}"#),
            "$.v",
            &params(&[], &["$.v:1:2"], &[]),
        );
        assert_eq!(outcome.state, State::Ok);
        assert_eq!(outcome.text, "$.v: n/a");
        assert_eq!(outcome.metric, None);
    }

    #[test]
    fn test_boolean_threshold() {
        let outcome = check_query(
            &json(r#"{"up":false}"#),
            "$.up",
            &params(&[], &["$.up::1:"], &[]),
        );
        assert_eq!(outcome.state, State::Crit);
        assert_eq!(outcome.text, "$.up: false (THRESHOLD CRITICAL)");
    }

    #[test]
    fn test_string_check_preempts_threshold() {
        let outcome = check_query(
            &json(r#"{"load": 99}"#),
            "$.load",
            &params(&[], &["$.load:10:20"], &["$.load:^\\d+$:ok"]),
        );
        assert_eq!(outcome.state, State::Ok);
        assert_eq!(
            outcome.text,
            "$.load: 99 (STRING CHECK OK) (case-insensitive)"
        );
        // the metric still carries the threshold levels
        assert_eq!(
            outcome.metric.unwrap().levels,
            Some(("10".to_string(), "20".to_string()))
        );
    }

    #[test]
    fn test_no_results() {
        let outcome = check_query(&json(r#"{"a":1}"#), "$.b", &params(&[], &[], &[]));
        assert_eq!(outcome.state, State::Crit);
        assert_eq!(outcome.text, "$.b: no results");
        assert_eq!(outcome.display, None);
    }

    #[test]
    fn test_evaluation_failure() {
        let outcome = check_query(&xml("<r/>"), "//[", &params(&[], &[], &[]));
        assert_eq!(outcome.state, State::Crit);
        assert!(outcome.text.starts_with("//[: query evaluation failed ("));
    }
}
