// Copyright (C) 2023 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

pub mod checking_types;
pub mod checks;
pub mod cli;
pub mod config;
pub mod debug;
pub mod document;
pub mod extract;
pub mod http;
pub mod label;
pub mod output;
pub mod runner;
