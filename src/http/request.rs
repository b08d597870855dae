// Copyright (C) 2023 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

use bytes::Bytes;
use encoding_rs::{Encoding, UTF_8};
use mime::Mime;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, HOST},
    Client, RequestBuilder, Result as ReqwestResult, StatusCode, Url,
};
use tracing::{event, span, Instrument, Level};

pub struct RequestConfig {
    pub url: Url,
    pub host_header: Option<HeaderValue>,
}

pub struct ProcessedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Body,
}

impl ProcessedResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }
}

#[cfg_attr(test, derive(PartialEq, Debug))]
pub struct Body {
    pub text: String,
    pub length: usize,
}

pub async fn send(client: Client, cfg: RequestConfig) -> ReqwestResult<ProcessedResponse> {
    let span = span!(Level::INFO, "send_request", url = %cfg.url);
    receive(client, cfg).instrument(span).await
}

async fn receive(client: Client, cfg: RequestConfig) -> ReqwestResult<ProcessedResponse> {
    let response = prepare_request(client, cfg).send().await?;

    let headers = response.headers().to_owned();
    let status = response.status();

    event!(target: "debug_headers", Level::DEBUG, "HTTP headers: \n{:#?}", headers);

    let body = process_body(response.bytes().await, &headers)?;

    event!(target: "debug_content", Level::TRACE, "Page content: \n{}", body.text);

    Ok(ProcessedResponse {
        status,
        headers,
        body,
    })
}

fn prepare_request(client: Client, request_cfg: RequestConfig) -> RequestBuilder {
    let req = client.get(request_cfg.url);

    if let Some(host) = request_cfg.host_header {
        req.header(HOST, host)
    } else {
        req
    }
}

// The body is decoded with the charset announced in the content type, falling back to UTF-8.
// Borrowed from reqwest::async_impl::response::Response::text_with_charset, which doesn't
// let us keep the raw length.
fn process_body(bytes: ReqwestResult<Bytes>, headers: &HeaderMap) -> ReqwestResult<Body> {
    let bytes = bytes?;

    let length = bytes.len();
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<Mime>().ok());
    let encoding = content_type
        .as_ref()
        .and_then(|mime| mime.get_param("charset").map(|charset| charset.as_str()))
        .and_then(|name| Encoding::for_label(name.as_bytes()))
        .unwrap_or(UTF_8);

    let (text, _, _) = encoding.decode(&bytes);

    Ok(Body {
        text: text.into_owned(),
        length,
    })
}
