// Copyright (C) 2023 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

use std::time::Duration;

use clap::error::ErrorKind;
use clap::Parser;
use reqwest::{header::HeaderValue, Url};

use crate::checking_types::State;
use crate::config::{parse_string_checks, parse_thresholds, CheckParameters, ConfigError};
use crate::document::TypeSelection;
use crate::http::{ClientConfig, RequestConfig};
use crate::output::Output;

const DEFAULT_USER_AGENT: &str = "check_json_xml";

pub const SAMPLES: &str = "\
Check a JSON status field, it must read \"ok\":
  check_json_xml -H api.example.com -p /health -q '$.status' -s '$.status:^ok$:ok'

Alert when an error message shows up (case-sensitive):
  check_json_xml -H api.example.com -p /health -q '$.message' -s '$.message:ERROR:critical:c'

Thresholds on an XML value, with perfdata:
  check_json_xml -H 10.0.0.5 --port 8080 -p /stats.xml -T xml -q '//cpu' -l '//cpu:80:95' --perfdata

Several values at once, critical if no worker is up:
  check_json_xml -H app.example.com --ssl --port 443 -p /status -q '$.workers.up' -q '$.queue.length' \\
    -l '$.workers.up::1:' -l '$.queue.length:100:500' --perfdata

Explore a document and list the available paths:
  check_json_xml -H api.example.com -p /health --debug
";

#[derive(Parser, Debug)]
#[command(about = "Check values in a JSON or XML document fetched over HTTP(S)", version)]
pub struct Cli {
    /// Host name or IP address to connect to
    #[arg(short = 'H', long, required_unless_present = "samples")]
    pub hostname: Option<String>,

    /// URL path of the document
    #[arg(short, long, required_unless_present = "samples")]
    pub path: Option<String>,

    /// Port
    #[arg(long, default_value_t = 80)]
    pub port: u16,

    /// Use HTTPS
    #[arg(long, default_value_t = false)]
    pub ssl: bool,

    /// Don't verify the server certificate
    #[arg(long, default_value_t = false)]
    pub insecure: bool,

    /// Send this value as Host header
    #[arg(long)]
    pub host_header: Option<String>,

    /// Set timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Set user-agent
    #[arg(long)]
    pub user_agent: Option<String>,

    /// JSONPath or XPath query, may be repeated
    #[arg(short, long = "query", required_unless_present_any = ["samples", "debug"])]
    pub queries: Vec<String>,

    /// Document type: xml, json or auto
    #[arg(short = 'T', long = "type", default_value = "auto")]
    pub document_type: String,

    /// Threshold as QUERY:WARNING:CRITICAL, using monitoring plugin ranges
    #[arg(short, long = "limit")]
    pub limits: Vec<String>,

    /// String check as QUERY:REGEX:STATUS[:FLAGS], STATUS one of ok/warning/critical,
    /// FLAGS c (case-sensitive) or i (case-insensitive, default)
    #[arg(short, long = "string-checks")]
    pub string_checks: Vec<String>,

    /// Add performance data for numeric values
    #[arg(long, default_value_t = false)]
    pub perfdata: bool,

    /// Print the document and all available paths instead of checking
    #[arg(long, default_value_t = false)]
    pub debug: bool,

    /// Print usage examples
    #[arg(long, default_value_t = false)]
    pub samples: bool,

    /// Verbose logging to stderr (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn url(&self) -> Result<Url, ConfigError> {
        let scheme = if self.ssl { "https" } else { "http" };
        let path = self.path.as_deref().unwrap_or_default();
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        let url = format!(
            "{}://{}:{}{}",
            scheme,
            self.hostname.as_deref().unwrap_or_default(),
            self.port,
            path
        );
        Url::parse(&url).map_err(|e| ConfigError::Url {
            url,
            reason: e.to_string(),
        })
    }

    /// Validates everything the user gave us before anything touches the network.
    pub fn into_configs(
        self,
    ) -> Result<(ClientConfig, RequestConfig, CheckParameters), ConfigError> {
        let url = self.url()?;
        let type_selection = self.document_type.parse::<TypeSelection>()?;
        let thresholds = parse_thresholds(&self.limits)?;
        let string_checks = parse_string_checks(&self.string_checks)?;
        let host_header = self
            .host_header
            .map(|host| HeaderValue::from_str(&host).map_err(|_| ConfigError::HostHeader(host)))
            .transpose()?;

        Ok((
            ClientConfig {
                user_agent: self
                    .user_agent
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
                timeout: Duration::from_secs(self.timeout),
                disable_certificate_verification: self.insecure,
            },
            RequestConfig { url, host_header },
            CheckParameters::builder()
                .queries(self.queries)
                .type_selection(type_selection)
                .thresholds(thresholds)
                .string_checks(string_checks)
                .perfdata(self.perfdata)
                .build(),
        ))
    }
}

/// Turns a failed argument parse into plugin output. Help and version requests
/// are not failures and yield `None`, clap prints those itself.
pub fn usage_error_output(err: &clap::Error) -> Option<Output> {
    match err.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => None,
        _ => {
            let rendered = err.to_string();
            let first_line = rendered
                .lines()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("Invalid arguments");
            Some(Output::from_summary(State::Unknown, first_line))
        }
    }
}

#[test]
fn verify_cli() {
    use clap::CommandFactory;
    Cli::command().debug_assert()
}
