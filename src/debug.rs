// Copyright (C) 2023 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! `--debug`: show what was fetched and which queries could be written against it.

use std::fmt::Write;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;
use sxd_document::dom::{ChildOfElement, ChildOfRoot, Element};
use sxd_document::Package;

use crate::checking_types::CheckResult;
use crate::document::{Document, TypeSelection};
use crate::extract::ExtractedValue;
use crate::http::{ClientConfig, ProcessedResponse, RequestConfig};
use crate::runner::fetch_document;

// Arrays may be huge; the first few elements show the pattern.
const MAX_ARRAY_ITEMS: usize = 3;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

pub async fn dump(
    client_cfg: ClientConfig,
    request_cfg: RequestConfig,
    type_selection: TypeSelection,
) -> Result<String, Vec<CheckResult>> {
    let (response, document) = fetch_document(client_cfg, request_cfg, type_selection).await?;
    Ok(render(&response, &document))
}

pub fn render(response: &ProcessedResponse, document: &Document) -> String {
    let mut out = String::new();
    // Writing to a String can't fail.
    let _ = writeln!(out, "=== Response ===");
    let _ = writeln!(out, "Status: {}", response.status);
    let _ = writeln!(
        out,
        "Content-Type: {}",
        response.content_type().unwrap_or("(none)")
    );
    let _ = writeln!(out, "Detected format: {}", document.format());
    let _ = writeln!(out, "Size: {} bytes", response.body.length);
    let _ = writeln!(out, "\n=== Raw content ===\n{}", response.body.text.trim_end());
    let _ = writeln!(out, "\n=== Structure ===\n{}", structure(document).trim_end());
    let _ = writeln!(out, "\n=== Available paths ===");
    for (path, sample) in discover_paths(document) {
        let _ = writeln!(out, "{} = {}", path, sample);
    }
    out
}

fn structure(document: &Document) -> String {
    match document {
        Document::Json(value) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        Document::Xml(package) => {
            let mut out = String::new();
            for element in root_elements(package) {
                xml_outline(element, 0, &mut out);
            }
            out
        }
    }
}

/// All paths of the document in document order, with the value a query for
/// that path would show.
pub fn discover_paths(document: &Document) -> Vec<(String, String)> {
    let mut paths = Vec::new();
    match document {
        Document::Json(value) => json_paths(value, "$", &mut paths),
        Document::Xml(package) => {
            for element in root_elements(package) {
                xml_paths(element, "", &mut paths);
            }
        }
    }
    paths
}

fn json_paths(value: &JsonValue, path: &str, paths: &mut Vec<(String, String)>) {
    match value {
        JsonValue::Object(map) => {
            for (key, child) in map {
                let child_path = if IDENTIFIER.is_match(key) {
                    format!("{}.{}", path, key)
                } else {
                    format!("{}['{}']", path, key.replace('\'', "\\'"))
                };
                paths.push((child_path.clone(), ExtractedValue::from_json(child).display));
                json_paths(child, &child_path, paths);
            }
        }
        JsonValue::Array(items) => {
            for (index, child) in items.iter().take(MAX_ARRAY_ITEMS).enumerate() {
                let child_path = format!("{}[{}]", path, index);
                paths.push((child_path.clone(), ExtractedValue::from_json(child).display));
                json_paths(child, &child_path, paths);
            }
        }
        _ => {}
    }
}

fn root_elements(package: &Package) -> Vec<Element<'_>> {
    package
        .as_document()
        .root()
        .children()
        .into_iter()
        .filter_map(|child| match child {
            ChildOfRoot::Element(element) => Some(element),
            _ => None,
        })
        .collect()
}

fn child_elements<'d>(element: Element<'d>) -> Vec<Element<'d>> {
    element
        .children()
        .into_iter()
        .filter_map(|child| match child {
            ChildOfElement::Element(element) => Some(element),
            _ => None,
        })
        .collect()
}

fn own_text(element: Element) -> String {
    element
        .children()
        .into_iter()
        .filter_map(|child| match child {
            ChildOfElement::Text(text) => Some(text.text().to_string()),
            _ => None,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

fn xml_sample(element: Element) -> String {
    match child_elements(element).len() {
        0 => ExtractedValue::from_xml_text(&own_text(element)).display,
        n => format!("[Element with {} children]", n),
    }
}

fn xml_paths(element: Element, parent: &str, paths: &mut Vec<(String, String)>) {
    let path = format!("{}/{}", parent, element.name().local_part());
    xml_element_paths(element, path, paths);
}

fn xml_element_paths(element: Element, path: String, paths: &mut Vec<(String, String)>) {
    paths.push((path.clone(), xml_sample(element)));
    for attribute in element.attributes() {
        paths.push((
            format!("{}/@{}", path, attribute.name().local_part()),
            attribute.value().trim().to_string(),
        ));
    }

    let children = child_elements(element);
    for (index, child) in children.iter().enumerate() {
        let name = child.name().local_part();
        let siblings = children
            .iter()
            .filter(|c| c.name().local_part() == name)
            .count();
        let child_path = if siblings > 1 {
            let position = children[..=index]
                .iter()
                .filter(|c| c.name().local_part() == name)
                .count();
            format!("{}/{}[{}]", path, name, position)
        } else {
            format!("{}/{}", path, name)
        };
        xml_element_paths(*child, child_path, paths);
    }
}

fn xml_outline(element: Element, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let attributes: String = element
        .attributes()
        .iter()
        .map(|a| format!(" @{}={:?}", a.name().local_part(), a.value()))
        .collect();
    let children = child_elements(element);
    if children.is_empty() {
        let _ = writeln!(
            out,
            "{}{}{}: {:?}",
            indent,
            element.name().local_part(),
            attributes,
            own_text(element)
        );
    } else {
        let _ = writeln!(out, "{}{}{}", indent, element.name().local_part(), attributes);
        for child in children {
            xml_outline(child, depth + 1, out);
        }
    }
}
