// Copyright (C) 2023 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

use reqwest::{Client, Result as ReqwestResult};
use std::time::Duration;

pub struct ClientConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub disable_certificate_verification: bool,
}

pub fn build(cfg: ClientConfig) -> ReqwestResult<Client> {
    reqwest::Client::builder()
        .use_rustls_tls()
        .danger_accept_invalid_certs(cfg.disable_certificate_verification)
        .timeout(cfg.timeout)
        .user_agent(cfg.user_agent)
        .build()
}
