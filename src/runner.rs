// Copyright (C) 2023 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

use std::error::Error;
use std::time::Duration;

use reqwest::{StatusCode, Url};
use tracing::info;

use crate::checking_types::{CheckResult, State};
use crate::checks;
use crate::config::CheckParameters;
use crate::document::{Document, TypeSelection};
use crate::http::{self, ClientConfig, ProcessedResponse, RequestConfig};

pub async fn collect_checks(
    client_cfg: ClientConfig,
    request_cfg: RequestConfig,
    params: CheckParameters,
) -> Vec<CheckResult> {
    let (response, document) = match fetch_document(client_cfg, request_cfg, params.type_selection).await
    {
        Ok(fetched) => fetched,
        Err(check_results) => return check_results,
    };
    info!(
        status = %response.status,
        format = %document.format(),
        queries = params.queries.len(),
        "document ready"
    );

    checks::collect_query_checks(&document, &params)
}

/// Fetches and parses the document. Any failure here is final for the whole run
/// and comes back as the check result to report.
pub async fn fetch_document(
    client_cfg: ClientConfig,
    request_cfg: RequestConfig,
    type_selection: TypeSelection,
) -> Result<(ProcessedResponse, Document), Vec<CheckResult>> {
    let url = request_cfg.url.clone();
    let timeout = client_cfg.timeout;

    let response = match http::perform_request(client_cfg, request_cfg).await {
        Ok(response) => response,
        Err(err) => return Err(check_reqwest_error(err, &url, timeout)),
    };

    if !response.status.is_success() {
        return Err(check_status(response.status));
    }

    let document = type_selection
        .resolve(response.content_type(), &response.body.text)
        .and_then(|format| Document::parse(format, &response.body.text));
    match document {
        Ok(document) => Ok((response, document)),
        Err(err) => Err(CheckResult::summary(State::Crit, &err.to_string())
            .into_iter()
            .collect()),
    }
}

fn check_status(status: StatusCode) -> Vec<CheckResult> {
    CheckResult::summary(State::Crit, &format!("HTTP request failed: {}", status))
        .into_iter()
        .collect()
}

fn check_reqwest_error(err: reqwest::Error, url: &Url, timeout: Duration) -> Vec<CheckResult> {
    let mut source = err.source();
    let mut causes = Vec::new();
    while let Some(s) = source {
        causes.push(s.to_string());
        source = s.source();
    }

    let text = if err.is_timeout() {
        format!(
            "Could not connect to {} within specified timeout: {} seconds",
            url,
            timeout.as_secs()
        )
    } else if causes.is_empty() {
        err.to_string()
    } else {
        format!("{}: {}", err, causes.join(": "))
    };

    // The errors coming from reqwest are usually short and don't contain
    // newlines, but the output has to stay on one line.
    CheckResult::summary(State::Crit, &text.replace('\n', " - "))
        .into_iter()
        .collect()
}
