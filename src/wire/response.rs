// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Responses sent back to the orchestrator: `["success", payload?]` or
//! `["fail", payload?]`.

use serde::{Serialize, Serializer};

use crate::step::{StepError, StepMatch};

/// Snippet returned for undefined steps.
pub const SNIPPET: &str = "given(...){}";

/// Wire protocol response.
#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    /// `["success"]`
    Success,

    /// `["success", [matched...]]`
    StepMatches(Vec<MatchedStep>),

    /// `["success", snippet]`
    Snippet(String),

    /// `["fail"]`, or `["fail", {exception, message}]` when there is a
    /// description.
    Fail(Option<FailureDetails>),
}

impl Response {
    /// Creates a `fail` [`Response`] describing the given [`StepError`].
    #[must_use]
    pub fn failed(err: &StepError) -> Self {
        Self::Fail(Some(FailureDetails::from(err)))
    }

    /// Indicates whether this is a `success` [`Response`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        !matches!(self, Self::Fail(_))
    }
}

impl Serialize for Response {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Success => ("success",).serialize(serializer),
            Self::StepMatches(matches) => {
                ("success", matches).serialize(serializer)
            }
            Self::Snippet(snippet) => ("success", snippet).serialize(serializer),
            Self::Fail(None) => ("fail",).serialize(serializer),
            Self::Fail(Some(details)) => ("fail", details).serialize(serializer),
        }
    }
}

/// Step definition matching a `step_matches` request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchedStep {
    /// Captured arguments.
    pub args: Vec<MatchedArgument>,

    /// Id of the step definition, as a decimal string.
    pub id: String,

    /// Pattern of the step definition.
    pub regexp: String,

    /// Location of the step definition.
    pub source: String,
}

impl From<StepMatch<'_>> for MatchedStep {
    fn from(matched: StepMatch<'_>) -> Self {
        Self {
            args: matched
                .arguments
                .into_iter()
                .map(|arg| MatchedArgument { pos: arg.position, val: arg.value })
                .collect(),
            id: matched.id.to_string(),
            regexp: matched.definition.pattern().to_owned(),
            source: matched.definition.location().to_string(),
        }
    }
}

/// Captured argument of a [`MatchedStep`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct MatchedArgument {
    /// Offset in the step text, in Unicode code points.
    pub pos: usize,

    /// Captured text.
    pub val: String,
}

/// Description of a failed `invoke`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FailureDetails {
    /// Exception class name. Always empty.
    pub exception: String,

    /// Failure message.
    pub message: String,
}

impl From<&StepError> for FailureDetails {
    fn from(err: &StepError) -> Self {
        Self { exception: String::new(), message: err.to_string() }
    }
}
