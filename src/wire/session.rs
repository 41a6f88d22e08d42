// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Wire protocol [`Session`] over a single command stream.

use std::io::{BufRead, Write};

use derive_more::with_trait::Debug;

use super::{
    command::{Command, Invoke, StepMatches},
    response::{MatchedStep, Response, SNIPPET},
};
use crate::{
    error::Result,
    panic_trap,
    step::{ContextStore, Registry, StepError},
};

/// Wire protocol session: reads commands line by line and answers each of
/// them with exactly one response line.
///
/// ```rust
/// use cuke_wire::{step::Dispatch, Registry, Session};
///
/// let mut registry = Registry::new();
/// registry.given("hello", Dispatch::new(|| {})).unwrap();
///
/// let input = b"[\"step_matches\",{\"name_to_match\":\"hello\"}]\n[\"invoke\",{\"id\":\"0\",\"args\":[]}]\n";
/// let mut output = Vec::new();
/// Session::new(&registry, &input[..], &mut output).run().unwrap();
///
/// let output = String::from_utf8(output).unwrap();
/// let mut lines = output.lines();
/// assert!(lines.next().unwrap().starts_with(r#"["success",[{"args":[],"id":"0""#));
/// assert_eq!(lines.next(), Some(r#"["success"]"#));
/// ```
#[derive(Debug)]
pub struct Session<'r, R, W> {
    /// Step definitions to match and run.
    registry: &'r Registry,

    /// Contexts of the current scenario.
    contexts: ContextStore,

    /// Source of commands.
    #[debug(skip)]
    reader: R,

    /// Sink of responses.
    #[debug(skip)]
    writer: W,
}

impl<'r, R: BufRead, W: Write> Session<'r, R, W> {
    /// Creates a new [`Session`] reading commands from the `reader` and
    /// writing responses into the `writer`.
    #[must_use]
    pub fn new(registry: &'r Registry, reader: R, writer: W) -> Self {
        Self { registry, contexts: ContextStore::new(), reader, writer }
    }

    /// Serves commands until the end of input.
    ///
    /// Blank lines are skipped. Every response is flushed as soon as it is
    /// written.
    ///
    /// # Errors
    ///
    /// If reading or writing fails, or a line is not a command envelope. The
    /// session is over in any of these cases.
    pub fn run(&mut self) -> Result<()> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                tracing::debug!("end of input");
                return Ok(());
            }
            let command = line.trim();
            if command.is_empty() {
                continue;
            }

            let response = self.handle(command.parse()?);
            let mut encoded = serde_json::to_vec(&response)?;
            encoded.push(b'\n');
            self.writer.write_all(&encoded)?;
            self.writer.flush()?;
        }
    }

    /// Executes the given [`Command`], returning the [`Response`] to it.
    pub fn handle(&mut self, command: Command) -> Response {
        tracing::debug!(command = command.name(), "received");
        match command {
            Command::StepMatches(StepMatches { name_to_match }) => {
                Response::StepMatches(
                    self.registry
                        .find(&name_to_match)
                        .map(MatchedStep::from)
                        .into_iter()
                        .collect(),
                )
            }
            Command::BeginScenario(begin) => {
                tracing::debug!(tags = ?begin.tags, "scenario begins");
                self.contexts.begin();
                Response::Success
            }
            Command::EndScenario => {
                self.contexts.end();
                Response::Success
            }
            Command::Invoke(invoke) => match self.invoke(invoke) {
                Ok(()) => Response::Success,
                Err(e) => {
                    tracing::debug!(error = %e, "step failed");
                    Response::failed(&e)
                }
            },
            Command::SnippetText => Response::Snippet(SNIPPET.to_owned()),
            Command::Unknown(name) => {
                tracing::warn!(%name, "unknown command");
                Response::Fail(None)
            }
        }
    }

    fn invoke(&mut self, invoke: Invoke) -> std::result::Result<(), StepError> {
        let id = invoke.id.resolve()?;
        let (args, table) = invoke.split_args()?;

        let (registry, contexts) = (self.registry, &mut self.contexts);
        let found = panic_trap::run(|| {
            registry.run(id, &args, table.as_ref(), contexts)
        })??;
        if !found {
            tracing::warn!(id, "no step definition to invoke");
        }
        Ok(())
    }

    /// Contexts of the current scenario.
    #[must_use]
    pub const fn contexts(&self) -> &ContextStore {
        &self.contexts
    }

    /// Consumes this [`Session`] returning its reader and writer.
    #[must_use]
    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        step::{Dispatch, Location},
        WireError,
    };

    fn serve(registry: &Registry, input: &str) -> Result<Vec<String>> {
        let mut output = Vec::new();
        Session::new(registry, input.as_bytes(), &mut output).run()?;
        Ok(String::from_utf8(output)
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect())
    }

    #[test]
    fn answers_every_line() {
        let output = serve(
            &Registry::new(),
            "[\"begin_scenario\"]\n\n  \n[\"end_scenario\"]\r\n[\"nope\"]\n",
        )
        .unwrap();

        assert_eq!(output, [r#"["success"]"#, r#"["success"]"#, r#"["fail"]"#]);
    }

    #[test]
    fn last_line_without_newline() {
        let output = serve(&Registry::new(), r#"["snippet_text"]"#).unwrap();
        assert_eq!(output, [r#"["success","given(...){}"]"#]);
    }

    #[test]
    fn malformed_envelope_ends_session() {
        let err = serve(&Registry::new(), "[\"begin_scenario\"]\n{}\n[\"end_scenario\"]\n")
            .unwrap_err();
        assert!(matches!(err, WireError::Malformed { ref line, .. } if line == "{}"));
    }

    #[test]
    fn unknown_id_succeeds_without_running_anything() {
        let mut registry = Registry::new();
        _ = registry
            .define(
                "hello",
                Location::unknown(),
                Dispatch::new::<_, (), _>(|| panic!("must not run")),
            )
            .unwrap();

        let output = serve(
            &registry,
            "[\"invoke\",{\"id\":\"7\",\"args\":[]}]\n[\"snippet_text\"]\n",
        )
        .unwrap();
        assert_eq!(output, [r#"["success"]"#, r#"["success","given(...){}"]"#]);
    }

    #[test]
    fn panics_become_failures() {
        let mut registry = Registry::new();
        _ = registry
            .define(
                r"(\d+) equals (\d+)",
                Location::unknown(),
                Dispatch::new(|a: u32, b: u32| assert!(a == b, "{a} != {b}")),
            )
            .unwrap();

        let output = serve(
            &registry,
            "[\"invoke\",{\"id\":\"0\",\"args\":[\"1\",\"2\"]}]\n\
             [\"invoke\",{\"id\":\"0\",\"args\":[\"2\",\"2\"]}]\n",
        )
        .unwrap();
        assert_eq!(
            output,
            [
                r#"["fail",{"exception":"","message":"1 != 2"}]"#,
                r#"["success"]"#,
            ],
        );
    }

    #[test]
    fn scenario_lifecycle_is_tracked() {
        let registry = Registry::new();
        let mut session = Session::new(&registry, &b""[..], Vec::new());

        assert!(!session.contexts().is_active());
        assert!(session.handle(Command::BeginScenario(Default::default())).is_success());
        assert!(session.contexts().is_active());
        assert!(session.handle(Command::EndScenario).is_success());
        assert!(!session.contexts().is_active());

        let (_, written) = session.into_inner();
        assert!(written.is_empty());
    }
}
