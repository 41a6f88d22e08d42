// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [Cucumber wire protocol][1]: newline-delimited JSON commands from an
//! orchestrator, each answered with exactly one JSON response line.
//!
//! [1]: https://github.com/cucumber/cucumber-ruby-wire

pub mod command;
pub mod response;
pub mod server;
pub mod session;

#[doc(inline)]
pub use self::{
    command::{BeginScenario, Command, Invoke, StepId, StepMatches},
    response::{FailureDetails, MatchedArgument, MatchedStep, Response, SNIPPET},
    server::Server,
    session::Session,
};
