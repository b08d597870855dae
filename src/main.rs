// Copyright (C) 2023 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

use anyhow::{anyhow, Result as AnyhowResult};
use check_json_xml::checking_types::State;
use check_json_xml::cli::{usage_error_output, Cli, SAMPLES};
use check_json_xml::output::Output;
use check_json_xml::{debug, runner};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(err) => match usage_error_output(&err) {
            Some(output) => exit_with(output),
            None => err.exit(),
        },
    };

    if args.samples {
        print!("{}", SAMPLES);
        std::process::exit(0);
    }

    if let Err(err) = init_tracing(args.verbose) {
        eprintln!("{}", err);
    }

    let debug_mode = args.debug;
    let (client_cfg, request_cfg, check_params) = match args.into_configs() {
        Ok(configs) => configs,
        Err(err) => exit_with(Output::from_summary(State::Unknown, &err.to_string())),
    };

    if debug_mode {
        match debug::dump(client_cfg, request_cfg, check_params.type_selection).await {
            Ok(dump) => {
                print!("{}", dump);
                std::process::exit(0);
            }
            Err(check_results) => exit_with(Output::from_check_results(check_results)),
        }
    }

    exit_with(Output::from_check_results(
        runner::collect_checks(client_cfg, request_cfg, check_params).await,
    ))
}

fn exit_with(output: Output) -> ! {
    println!("{}", output);
    std::process::exit(output.worst_state.into());
}

// Logs go to stderr, stdout is reserved for the plugin output.
fn init_tracing(verbose: u8) -> AnyhowResult<()> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose > 1)
        .try_init()
        .map_err(|e| anyhow!("Failed to set up logging: {}", e))
}
