// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Errors terminating a wire protocol [`Session`].
//!
//! Failures of individual steps are not among them: those are reported to
//! the orchestrator as `fail` responses, and the [`Session`] goes on.
//!
//! [`Session`]: crate::Session

use std::io;

use derive_more::with_trait::{Display, Error, From};

/// Error terminating a wire protocol [`Session`].
///
/// [`Session`]: crate::Session
#[derive(Debug, Display, Error, From)]
pub enum WireError {
    /// I/O error while reading a command or writing a response.
    #[display("I/O operation failed: {_0}")]
    Io(io::Error),

    /// Command line is not valid JSON.
    #[display("invalid JSON in command `{line}`: {source}")]
    #[from(ignore)]
    InvalidJson {
        /// Offending command line.
        #[error(not(source))]
        line: String,

        /// Error reported by the JSON parser.
        source: serde_json::Error,
    },

    /// Command line is valid JSON, but not a command envelope.
    #[display("malformed command `{line}`: {reason}")]
    #[from(ignore)]
    Malformed {
        /// Offending command line.
        #[error(not(source))]
        line: String,

        /// What is wrong with the command.
        #[error(not(source))]
        reason: String,
    },

    /// Response failed to encode.
    #[display("failed to encode response: {_0}")]
    Encode(serde_json::Error),
}

impl WireError {
    /// Creates a new [`WireError::Malformed`].
    #[must_use]
    pub fn malformed(line: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed { line: line.into(), reason: reason.into() }
    }
}

/// Result type alias using [`WireError`].
pub type Result<T> = std::result::Result<T, WireError>;
