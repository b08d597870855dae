// Copyright (C) 2023 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

use crate::document::DocumentFormat;

const FALLBACK_LABEL: &str = "value";

/// Derives a perfdata metric name from a query.
///
/// Labels are not guaranteed to be unique: `//a/b` and `//a_b` share one.
pub fn perf_label(query: &str, format: DocumentFormat) -> String {
    let stripped = match format {
        DocumentFormat::Xml => query.replace("//", "").replace('/', "_"),
        DocumentFormat::Json => {
            let query = query
                .strip_prefix("$.")
                .or_else(|| query.strip_prefix('$'))
                .unwrap_or(query);
            query.replace(['[', ']', '.', '$', '*', '?', '@', '(', ')'], "_")
        }
    };

    let mut label = String::with_capacity(stripped.len());
    for c in stripped.chars() {
        let c = if c.is_ascii_alphanumeric() { c } else { '_' };
        if c == '_' && label.ends_with('_') {
            continue;
        }
        label.push(c);
    }

    match label.trim_matches('_') {
        "" => FALLBACK_LABEL.to_string(),
        label => label.to_string(),
    }
}
