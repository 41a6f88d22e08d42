// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! CLI options of a step server binary.
//!
//! A step server is a binary compiled together with its step definitions, so
//! the crate ships no binary of its own. Instead, [`Opts`] gives such a
//! binary the listener and logging options in one go:
//!
//! ```rust,no_run
//! use cuke_wire::{cli, step::Dispatch, Registry};
//!
//! let mut registry = Registry::new();
//! registry.given("a started calculator", Dispatch::new(|| {})).unwrap();
//!
//! let opts = cli::Opts::parsed();
//! opts.init_tracing();
//! opts.serve(&registry).unwrap();
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use smart_default::SmartDefault;
use tracing_subscriber::filter::LevelFilter;

pub use clap::{Args, Parser};

use crate::{error::Result, step::Registry, wire::Server};

/// Port the wire protocol uses by default.
pub const DEFAULT_PORT: u16 = 3902;

/// Host the server listens on by default.
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// CLI options of a step server.
#[derive(Clone, Debug, SmartDefault, clap::Parser)]
#[command(
    name = "cuke-wire",
    about = "Serves step definitions to a Cucumber runner over the wire protocol"
)]
pub struct Opts {
    /// Address to listen on.
    #[arg(long, value_name = "ip", default_value_t = DEFAULT_HOST)]
    #[default(DEFAULT_HOST)]
    pub host: IpAddr,

    /// Port to listen on.
    #[arg(short, long, value_name = "port", default_value_t = DEFAULT_PORT)]
    #[default(DEFAULT_PORT)]
    pub port: u16,

    /// Keep accepting connections after the first one is closed.
    #[arg(short, long)]
    pub keep_serving: bool,

    /// Verbosity of logs.
    ///
    /// Warnings and errors only by default, `-v` adds the server lifecycle,
    /// `-vv` every command, `-vvv` everything.
    #[arg(short, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log nothing.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Opts {
    /// Shortcut for [`clap::Parser::parse()`], which doesn't require the trait
    /// being imported.
    #[must_use]
    pub fn parsed() -> Self {
        <Self as Parser>::parse()
    }

    /// Address to listen on.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Maximum level of logged events.
    #[must_use]
    pub const fn level_filter(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::OFF;
        }
        match self.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Initializes a global [`tracing::Subscriber`] writing formatted events
    /// into STDERR, filtered by the [`level_filter()`].
    ///
    /// Does nothing if a global subscriber is set already.
    ///
    /// [`level_filter()`]: Self::level_filter
    pub fn init_tracing(&self) {
        let res = tracing_subscriber::fmt()
            .with_max_level(self.level_filter())
            .with_writer(std::io::stderr)
            .try_init();
        if res.is_err() {
            tracing::debug!("global subscriber is set already");
        }
    }

    /// Binds a [`Server`] to the [`addr()`] and serves the `registry`.
    ///
    /// # Errors
    ///
    /// If binding or serving fails. See [`Server::serve()`] for details.
    ///
    /// [`addr()`]: Self::addr
    pub fn serve(&self, registry: &Registry) -> Result<()> {
        Server::bind(self.addr(), registry)?
            .keep_serving(self.keep_serving)
            .serve()
    }
}
