// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! TCP listener serving wire protocol [`Session`]s.

use std::{
    io::{self, BufReader},
    net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs},
};

use derive_more::with_trait::Debug;

use super::Session;
use crate::{error::Result, step::Registry};

/// TCP server accepting orchestrator connections one at a time.
///
/// Every connection gets its own [`Session`], so scenario contexts never
/// leak between connections, while the [`Registry`] is shared.
#[derive(Debug)]
pub struct Server<'r> {
    /// Step definitions served.
    #[debug(skip)]
    registry: &'r Registry,

    /// Bound listener.
    listener: TcpListener,

    /// Whether to accept further connections once one is closed.
    keep_serving: bool,
}

impl<'r> Server<'r> {
    /// Binds a new [`Server`] to the given address.
    ///
    /// # Errors
    ///
    /// If the address cannot be bound.
    pub fn bind(addr: impl ToSocketAddrs, registry: &'r Registry) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        tracing::info!(
            addr = %listener.local_addr()?,
            steps = registry.len(),
            "listening",
        );
        Ok(Self { registry, listener, keep_serving: false })
    }

    /// Sets whether to accept further connections once one is closed.
    ///
    /// By default, the [`Server`] stops after its first connection.
    #[must_use]
    pub const fn keep_serving(mut self, yes: bool) -> Self {
        self.keep_serving = yes;
        self
    }

    /// Address this [`Server`] is bound to.
    ///
    /// # Errors
    ///
    /// If the underlying socket fails to report it.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves connections until the first one is closed, or forever if
    /// [`keep_serving()`] is enabled.
    ///
    /// # Errors
    ///
    /// If accepting a connection fails. A failed [`Session`] is an error only
    /// when not [`keep_serving()`]: otherwise it is logged and the next
    /// connection is accepted.
    ///
    /// [`keep_serving()`]: Self::keep_serving
    pub fn serve(&self) -> Result<()> {
        loop {
            let (stream, peer) = self.listener.accept()?;
            match self.serve_connection(stream, peer) {
                Err(e) if self.keep_serving => {
                    tracing::error!(%peer, error = %e, "session failed");
                }
                res if !self.keep_serving => return res,
                _ => {}
            }
        }
    }

    /// Accepts a single connection and serves it until closed.
    ///
    /// # Errors
    ///
    /// If accepting the connection fails, or its [`Session`] fails.
    pub fn serve_one(&self) -> Result<()> {
        let (stream, peer) = self.listener.accept()?;
        self.serve_connection(stream, peer)
    }

    fn serve_connection(&self, stream: TcpStream, peer: SocketAddr) -> Result<()> {
        tracing::info!(%peer, "connection accepted");

        let reader = BufReader::new(stream.try_clone()?);
        let res = Session::new(self.registry, reader, stream).run();

        tracing::info!(%peer, "connection closed");
        res
    }
}
