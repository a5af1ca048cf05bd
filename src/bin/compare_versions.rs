// {{{ Copyright (c) Paul R. Tagliamonte <paultag@debian.org>, 2024
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE. }}}

//! `dpkg --compare-versions <a> <rel> <b>`: exits 0 if the relation holds,
//! 1 if it doesn't, and 2 on a usage error (bad relation token, unparsable
//! version), matching the original's `ohshit`-on-bad-input behaviour.

use anyhow::Result;
use clap::Parser;
use dpkg_core::version::compare_cli::compare;
use log::LevelFilter;

const DEFAULT_LEVEL_FILTER: LevelFilter = LevelFilter::Warn;

/// Compare two Debian package versions.
#[derive(Debug, Parser)]
#[clap(about, long_about = None, version)]
struct Args {
    /// Set the logging level. One of [off|error|warn|info|debug|trace]. You
    /// can also leave this unset and use the RUST_LOG env variable.
    #[clap(long = "log-level")]
    log_level: Option<LevelFilter>,

    /// First version, or the empty string / `<unknown>` for "no version".
    a: String,

    /// Relation token: le, lt, eq, ne, ge, gt (each with an optional `-nl`
    /// suffix), or the legacy spellings <, <=, <<, =, >, >=, >>.
    relation: String,

    /// Second version, or the empty string / `<unknown>` for "no version".
    b: String,
}

fn init_logger(level: Option<LevelFilter>) {
    match (std::env::var(env_logger::DEFAULT_FILTER_ENV).ok(), level) {
        (Some(_), None) => {
            env_logger::Builder::from_default_env().init();
        }
        _ => {
            env_logger::Builder::new()
                .filter(Some(env!("CARGO_CRATE_NAME")), level.unwrap_or(DEFAULT_LEVEL_FILTER))
                .init();
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.log_level);

    match compare(&args.a, &args.relation, &args.b) {
        Ok(holds) => std::process::exit(if holds { 0 } else { 1 }),
        Err(err) => {
            log::error!("{err}");
            std::process::exit(2);
        }
    }
}

// vim: foldmethod=marker
