// Copyright (C) 2023 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::str::FromStr;

use serde_json::Value as JsonValue;
use sxd_document::Package;
use thiserror::Error;
use tracing::debug;

use crate::config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Xml,
    Json,
}

impl Display for DocumentFormat {
    fn fmt(&self, f: &mut Formatter) -> FormatResult {
        match self {
            Self::Xml => write!(f, "XML"),
            Self::Json => write!(f, "JSON"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSelection {
    Auto,
    Fixed(DocumentFormat),
}

impl FromStr for TypeSelection {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "xml" => Ok(Self::Fixed(DocumentFormat::Xml)),
            "json" => Ok(Self::Fixed(DocumentFormat::Json)),
            _ => Err(ConfigError::InvalidType(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Cannot auto-detect document type (use --type xml or --type json)")]
    Undetectable,
    #[error("Failed to parse JSON document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to parse XML document: {0}")]
    Xml(String),
}

impl TypeSelection {
    /// Decides the format: the content type header first, then the first
    /// non-whitespace character of the body.
    pub fn resolve(
        &self,
        content_type: Option<&str>,
        content: &str,
    ) -> Result<DocumentFormat, ParseError> {
        let format = match self {
            Self::Fixed(format) => Some(*format),
            Self::Auto => from_content_type(content_type).or_else(|| sniff(content)),
        };
        debug!(?format, ?content_type, "document format");
        format.ok_or(ParseError::Undetectable)
    }
}

fn from_content_type(content_type: Option<&str>) -> Option<DocumentFormat> {
    let content_type = content_type?.to_ascii_lowercase();
    if content_type.contains("json") {
        Some(DocumentFormat::Json)
    } else if content_type.contains("xml") {
        Some(DocumentFormat::Xml)
    } else {
        None
    }
}

fn sniff(content: &str) -> Option<DocumentFormat> {
    match content.trim_start().chars().next()? {
        '{' | '[' => Some(DocumentFormat::Json),
        '<' => Some(DocumentFormat::Xml),
        _ => None,
    }
}

/// A parsed document. Read-only once created.
pub enum Document {
    Json(JsonValue),
    Xml(Package),
}

impl Document {
    pub fn parse(format: DocumentFormat, content: &str) -> Result<Self, ParseError> {
        match format {
            DocumentFormat::Json => Ok(Self::Json(serde_json::from_str(content)?)),
            DocumentFormat::Xml => sxd_document::parser::parse(content)
                .map(Self::Xml)
                .map_err(|e| ParseError::Xml(describe_xml_error(content, &e))),
        }
    }

    pub fn format(&self) -> DocumentFormat {
        match self {
            Self::Json(_) => DocumentFormat::Json,
            Self::Xml(_) => DocumentFormat::Xml,
        }
    }
}

// sxd-document only exposes the byte offset; the error kinds are only
// reachable through its Display output ("XML parsing error at 13: {A, B}").
fn describe_xml_error(content: &str, err: &sxd_document::parser::Error) -> String {
    let rendered = err.to_string();
    let kinds = rendered
        .split_once(": ")
        .map(|(_, kinds)| kinds.trim_matches(|c| c == '{' || c == '}'))
        .unwrap_or_default()
        .split(", ")
        .filter(|kind| !kind.is_empty())
        .map(split_camel_case)
        .collect::<Vec<_>>()
        .join(", ");

    let before = content.get(..err.location()).unwrap_or(content);
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().unwrap_or_default().chars().count() + 1;

    if kinds.is_empty() {
        format!("line {}, column {}", line, column)
    } else {
        format!("{} at line {}, column {}", kinds, line, column)
    }
}

fn split_camel_case(kind: &str) -> String {
    let mut out = String::new();
    for (i, c) in kind.chars().enumerate() {
        if c.is_uppercase() && i > 0 {
            out.push(' ');
        }
        out.extend(c.to_lowercase());
    }
    out
}
