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

//! `dpkg --get-selections` / `--set-selections` / `--clear-selections`,
//! backed by [dpkg_core::selections].
//!
//! This binary loads `<admindir>/status` into a [Database] to answer `get`,
//! and to resolve the packages named by `set`/`clear` -- but, same as
//! [print_architecture](../print_architecture/index.html), this crate has no
//! status-file writer, so `set` and `clear` report what they *would* have
//! written (via `get-selections`-style output on stdout) rather than
//! persisting it. A real front-end would pair this with its own writer.

use std::fs;
use std::io::{stdin, stdout, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dpkg_core::control::RawParagraph;
use dpkg_core::db::{parse_paragraph_into, Database, ParseFlags};
use dpkg_core::selections::{clear_selections, get_selections, set_selections};
use log::LevelFilter;

const DEFAULT_LEVEL_FILTER: LevelFilter = LevelFilter::Warn;

/// Read or change which packages are wanted installed, held, or removed.
#[derive(Debug, Parser)]
#[clap(about, long_about = None, version)]
struct Args {
    /// Set the logging level. One of [off|error|warn|info|debug|trace]. You
    /// can also leave this unset and use the RUST_LOG env variable.
    #[clap(long = "log-level")]
    log_level: Option<LevelFilter>,

    /// Directory holding the `status` file, as `dpkg --admindir` would take.
    #[clap(long, default_value = "/var/lib/dpkg")]
    admindir: String,

    /// Native architecture to parse `status` against.
    #[clap(long, default_value = "amd64")]
    native: String,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print selections, one `name[:arch]\tstate` line per package.
    Get {
        /// Glob patterns to filter by; every selected package if omitted.
        patterns: Vec<String>,
    },
    /// Read `name[:arch]\tstate` lines from stdin and report the result.
    Set,
    /// Mark every non-essential package for removal and report the result.
    Clear,
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

/// Load every `Package`/`Status` paragraph out of `<admindir>/status` into a
/// fresh [Database], the way `dpkg`'s own `modstatdb_init` populates
/// `installed` from the same file. Paragraphs are blank-line separated, per
/// the deb822 convention this crate's parser already assumes.
fn load_status(admindir: &str, native: &str) -> Result<Database> {
    let path = format!("{admindir}/status");
    let text = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;

    let mut db = Database::new(native);
    for block in text.split("\n\n") {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }
        let paragraph = RawParagraph::parse(block).with_context(|| format!("parsing a paragraph in {path}"))?;
        parse_paragraph_into(&mut db, &paragraph, ParseFlags::empty())
            .with_context(|| format!("loading a paragraph in {path}"))?;
    }
    Ok(db)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.log_level);

    let mut db = load_status(&args.admindir, &args.native)?;

    match &args.command {
        Command::Get { patterns } => {
            let patterns: Vec<&str> = patterns.iter().map(String::as_str).collect();
            let stdout = stdout();
            let mut out = stdout.lock();
            let not_found = get_selections(&mut db, &patterns, &mut out)?;
            for pattern in not_found {
                eprintln!("No packages found matching {pattern}.");
            }
        }
        Command::Set => {
            set_selections(&mut db, stdin().lock())?;
            log::warn!("{}/status was not rewritten; this binary has no status-file writer", args.admindir);
            let mut out = stdout().lock();
            get_selections(&mut db, &[], &mut out)?;
        }
        Command::Clear => {
            clear_selections(&mut db);
            log::warn!("{}/status was not rewritten; this binary has no status-file writer", args.admindir);
            let mut out = stdout().lock();
            get_selections(&mut db, &[], &mut out)?;
        }
    }

    stdout().flush()?;
    Ok(())
}

// vim: foldmethod=marker
