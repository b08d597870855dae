// Copyright (C) 2023 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

pub use client::ClientConfig;
pub use request::{Body, ProcessedResponse, RequestConfig};

mod client;
mod request;

pub async fn perform_request(
    client_cfg: ClientConfig,
    request_cfg: RequestConfig,
) -> Result<ProcessedResponse, reqwest::Error> {
    let client = client::build(client_cfg)?;
    request::send(client, request_cfg).await
}
