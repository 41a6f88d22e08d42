// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Errors of defining and invoking steps.

use derive_more::with_trait::{Display, Error, From};

use super::capture::ParamKind;

/// Result of a step invocation.
pub type StepResult = Result<(), StepError>;

/// Explicit failure raised by a step body.
///
/// This is the counterpart of a failed assertion: the message is reported to
/// the orchestrator as is.
///
/// ```rust
/// use cuke_wire::step::Failure;
///
/// fn check(result: f64) -> Result<(), Failure> {
///     if result != 120.0 {
///         return Err(Failure::new(format!("expected 120, got {result}")));
///     }
///     Ok(())
/// }
/// # assert!(check(120.0).is_ok());
/// ```
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
#[display("{message}")]
pub struct Failure {
    /// Human-readable description of what went wrong.
    #[error(not(source))]
    pub message: String,
}

impl Failure {
    /// Creates a new [`Failure`] with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Error of invoking a step definition.
#[derive(Debug, Display, Error, From)]
pub enum StepError {
    /// Captured text couldn't be converted into the declared parameter kind.
    #[display("cannot convert `{value}` to {kind}")]
    #[from(ignore)]
    Conversion {
        /// Offending captured text.
        #[error(not(source))]
        value: String,

        /// Declared kind of the parameter.
        kind: ParamKind,
    },

    /// Step body failed an assertion.
    #[display("{_0}")]
    Failed(Failure),

    /// Step body failed in an unexpected way.
    #[display("unknown exception: {_0}")]
    Unexpected(#[error(not(source))] anyhow::Error),
}

impl StepError {
    /// Creates a new [`StepError::Conversion`].
    #[must_use]
    pub fn conversion(value: impl Into<String>, kind: ParamKind) -> Self {
        Self::Conversion { value: value.into(), kind }
    }

    /// Creates a new [`StepError::Failed`] with the given message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(Failure::new(message))
    }

    /// Creates a new [`StepError::Unexpected`] with the given message.
    #[must_use]
    pub fn unexpected(message: impl Display) -> Self {
        Self::Unexpected(anyhow::anyhow!("{message}"))
    }

    /// Indicates whether this error was raised by an unexpected failure,
    /// rather than a described one.
    #[must_use]
    pub const fn is_unexpected(&self) -> bool {
        matches!(self, Self::Unexpected(_))
    }
}

/// Error of defining a step.
#[derive(Debug, Display, Error)]
pub enum DefineError {
    /// Pattern is not a valid regular expression.
    #[display("invalid step pattern `{pattern}`: {source}")]
    InvalidPattern {
        /// Pattern source as given.
        pattern: String,

        /// Error reported by the regex compiler.
        source: regex::Error,
    },
}

/// Conversion of a step body return value into a [`StepResult`].
pub trait IntoStepResult {
    /// Performs the conversion.
    fn into_step_result(self) -> StepResult;
}

impl IntoStepResult for () {
    fn into_step_result(self) -> StepResult {
        Ok(())
    }
}

impl<E: Into<StepError>> IntoStepResult for Result<(), E> {
    fn into_step_result(self) -> StepResult {
        self.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_names_value_and_kind() {
        let err = StepError::conversion("abc", ParamKind::Integer);
        assert_eq!(err.to_string(), "cannot convert `abc` to integer");
        assert!(!err.is_unexpected());
    }

    #[test]
    fn failure_message_is_reported_verbatim() {
        let err = StepError::from(Failure::new("expected 3, got 4"));
        assert_eq!(err.to_string(), "expected 3, got 4");
    }

    #[test]
    fn unexpected_is_tagged() {
        let err = StepError::from(anyhow::anyhow!("disk full"));
        assert_eq!(err.to_string(), "unknown exception: disk full");
        assert!(err.is_unexpected());
    }

    #[test]
    fn unit_is_success() {
        assert!(().into_step_result().is_ok());
    }

    #[test]
    fn result_errors_are_converted() {
        let res: Result<(), Failure> = Err(Failure::new("nope"));
        let err = res.into_step_result().unwrap_err();
        assert!(matches!(err, StepError::Failed(f) if f.message == "nope"));
    }

    #[test]
    fn invalid_pattern_mentions_source() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = DefineError::InvalidPattern { pattern: "(".into(), source };
        assert!(err.to_string().starts_with("invalid step pattern `(`"));
    }
}
