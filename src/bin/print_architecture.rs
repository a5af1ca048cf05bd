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

//! `dpkg --print-architecture`, `--print-foreign-architectures` and
//! `--add-architecture`, backed by [dpkg_core::arch::ArchRegistry].
//!
//! Unlike the real `dpkg`, architectures added with `add-foreign` aren't
//! persisted anywhere -- there's no `/var/lib/dpkg/arch` file in this crate's
//! scope -- so `add-foreign` only demonstrates the registry call; run it
//! together with `--foreign NAME` in the same invocation to see the effect.

use anyhow::Result;
use clap::{Parser, Subcommand};
use dpkg_core::arch::ArchRegistry;
use log::LevelFilter;

const DEFAULT_LEVEL_FILTER: LevelFilter = LevelFilter::Warn;

/// Print or manipulate the architectures `dpkg` knows about.
#[derive(Debug, Parser)]
#[clap(about, long_about = None, version)]
struct Args {
    /// Set the logging level. One of [off|error|warn|info|debug|trace]. You
    /// can also leave this unset and use the RUST_LOG env variable.
    #[clap(long = "log-level")]
    log_level: Option<LevelFilter>,

    /// The native (`dpkg --print-architecture`) architecture name.
    #[clap(long, default_value = "amd64")]
    native: String,

    /// Architectures to register as foreign before running the command,
    /// in order, as `dpkg --add-architecture` would.
    #[clap(long = "add-foreign")]
    add_foreign: Vec<String>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the native architecture. Default if no subcommand is given.
    Print,
    /// Print every architecture previously registered as foreign.
    PrintForeign,
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

    let archs = ArchRegistry::new(&args.native);
    for name in &args.add_foreign {
        archs.add_foreign(name);
    }

    match args.command {
        Command::Print => println!("{}", archs.native().name()),
        Command::PrintForeign => {
            for arch in archs.foreign() {
                println!("{}", arch.name());
            }
        }
    }

    Ok(())
}

// vim: foldmethod=marker
