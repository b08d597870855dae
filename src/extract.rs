// Copyright (C) 2023 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;
use serde_json_path::JsonPath;
use sxd_document::Package;
use sxd_xpath::Value as XPathValue;
use thiserror::Error;
use tracing::debug;

use crate::document::Document;

static NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+\.?\d*$").unwrap());

#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("query evaluation failed ({0})")]
    Evaluation(String),
    #[error("no results")]
    NoResults,
}

/// The first match of a query, normalized for display and threshold checks.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedValue {
    pub display: String,
    pub numeric: Option<f64>,
}

impl ExtractedValue {
    pub fn is_numeric(&self) -> bool {
        self.numeric.is_some()
    }

    /// The value as it goes into perfdata: the matched text itself, or 1/0 for booleans.
    pub fn perf_value(&self) -> Option<String> {
        let numeric = self.numeric?;
        if NUMERIC.is_match(&self.display) {
            Some(self.display.clone())
        } else {
            Some(numeric.to_string())
        }
    }

    fn from_text(text: String) -> Self {
        let numeric = if NUMERIC.is_match(&text) {
            text.parse().ok()
        } else {
            None
        };
        Self {
            display: text,
            numeric,
        }
    }

    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::from_text("null".to_string()),
            JsonValue::Bool(b) => Self {
                display: b.to_string(),
                numeric: Some(if *b { 1. } else { 0. }),
            },
            JsonValue::Number(n) => Self::from_text(n.to_string()),
            JsonValue::String(s) => Self::from_text(s.clone()),
            JsonValue::Array(items) => Self {
                display: format!("[Array with {} elements]", items.len()),
                numeric: None,
            },
            JsonValue::Object(map) => Self {
                display: format!("[Object with {} keys]", map.len()),
                numeric: None,
            },
        }
    }

    pub fn from_xml_text(text: &str) -> Self {
        Self::from_text(text.trim().to_string())
    }
}

impl Document {
    /// Evaluates `query` and normalizes the first match. Further matches are ignored.
    pub fn extract(&self, query: &str) -> Result<ExtractedValue, QueryError> {
        let value = match self {
            Self::Json(value) => extract_json(value, query),
            Self::Xml(package) => extract_xml(package, query),
        };
        debug!(query, ?value, "extracted");
        value
    }
}

fn extract_json(value: &JsonValue, query: &str) -> Result<ExtractedValue, QueryError> {
    let path = JsonPath::parse(query).map_err(|e| QueryError::Evaluation(e.to_string()))?;
    let nodes = path.query(value);
    let first = nodes.first().ok_or(QueryError::NoResults)?;
    Ok(ExtractedValue::from_json(first))
}

fn extract_xml(package: &Package, query: &str) -> Result<ExtractedValue, QueryError> {
    let document = package.as_document();
    let value = sxd_xpath::evaluate_xpath(&document, query)
        .map_err(|e| QueryError::Evaluation(e.to_string()))?;
    let text = match value {
        XPathValue::Nodeset(nodes) => nodes
            .document_order()
            .first()
            .map(|node| node.string_value())
            .ok_or(QueryError::NoResults)?,
        // Scalar expressions like count(//item) count as a single match.
        scalar => scalar.string(),
    };
    Ok(ExtractedValue::from_xml_text(&text))
}


#[cfg(test)]
mod test_extract_xml {
    use super::*;
    use crate::document::DocumentFormat;

    fn doc(xml: &str) -> Document {
        Document::parse(DocumentFormat::Xml, xml).unwrap()
    }

    #[test]
    fn test_trimmed_numeric_text() {
        assert_eq!(
            doc("<root><cpu>\n  85\n</cpu></root>").extract("//cpu"),
            Ok(ExtractedValue {
                display: "85".to_string(),
                numeric: Some(85.)
            })
        );
    }

    #[test]
    fn test_text() {
        assert_eq!(
            doc("<root><state>running</state></root>").extract("/root/state"),
            Ok(ExtractedValue {
                display: "running".to_string(),
                numeric: None
            })
        );
    }

    #[test]
    fn test_booleans_are_plain_text() {
        assert!(!doc("<r><up>true</up></r>")
            .extract("//up")
            .unwrap()
            .is_numeric());
    }

    #[test]
    fn test_attribute() {
        assert_eq!(
            doc(r#"<r><disk free="42"/></r>"#)
                .extract("//disk/@free")
                .unwrap()
                .numeric,
            Some(42.)
        );
    }

    #[test]
    fn test_first_in_document_order() {
        assert_eq!(
            doc("<r><v>1</v><v>2</v></r>").extract("//v").unwrap().display,
            "1"
        );
    }

    #[test]
    fn test_scalar_expression() {
        assert_eq!(
            doc("<r><v>1</v><v>2</v></r>")
                .extract("count(//v)")
                .unwrap()
                .numeric,
            Some(2.)
        );
    }

    #[test]
    fn test_no_results() {
        assert_eq!(
            doc("<r><v>1</v></r>").extract("//missing"),
            Err(QueryError::NoResults)
        );
    }

    #[test]
    fn test_invalid_expression() {
        assert!(matches!(
            doc("<r/>").extract("//["),
            Err(QueryError::Evaluation(_))
        ));
    }
}
