// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Source location of a step definition.
//!
//! A [`Location`] is reported back to the orchestrator as the `source` of a
//! matched step, so IDEs can jump to the definition.

use std::panic;

use derive_more::with_trait::{Debug, Display};

/// Location of a step definition inside the test code.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("{path}:{line}")]
pub struct Location {
    /// Path to the file where the step definition is located.
    pub path: &'static str,

    /// Line of the file where the step definition is located.
    pub line: u32,
}

impl Location {
    /// Creates a new [`Location`] with the given path and line.
    #[must_use]
    pub const fn new(path: &'static str, line: u32) -> Self {
        Self { path, line }
    }

    /// Placeholder [`Location`] for steps defined without one.
    #[must_use]
    pub const fn unknown() -> Self {
        Self::new("unknown", 0)
    }

    /// Returns the [`Location`] of the caller of a `#[track_caller]`
    /// function.
    #[must_use]
    #[track_caller]
    pub fn caller() -> Self {
        let loc = panic::Location::caller();
        Self::new(loc.file(), loc.line())
    }

    /// Returns the file path.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        self.path
    }

    /// Returns the line number.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Expands to the [`Location`] of its invocation.
///
/// ```rust
/// let loc = cuke_wire::location!();
/// assert_eq!(loc.path(), file!());
/// ```
#[macro_export]
macro_rules! location {
    () => {
        $crate::step::Location::new(file!(), line!())
    };
}
