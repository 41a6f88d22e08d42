// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Commands sent by the orchestrator, one JSON array per line:
//! `[name, payload?]`.

use std::str::FromStr;

use derive_more::with_trait::Display;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

use crate::{error::WireError, step::StepError, Table};

/// Decoded wire protocol command.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// `step_matches`: asks which step definition matches the given text.
    StepMatches(StepMatches),

    /// `begin_scenario`: a new scenario starts.
    BeginScenario(BeginScenario),

    /// `end_scenario`: the current scenario is over.
    EndScenario,

    /// `invoke`: runs a previously matched step definition.
    Invoke(Invoke),

    /// `snippet_text`: asks for a snippet of an undefined step.
    SnippetText,

    /// Any command this crate doesn't know.
    Unknown(String),
}

impl Command {
    /// Name of this [`Command`] on the wire.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::StepMatches(_) => "step_matches",
            Self::BeginScenario(_) => "begin_scenario",
            Self::EndScenario => "end_scenario",
            Self::Invoke(_) => "invoke",
            Self::SnippetText => "snippet_text",
            Self::Unknown(name) => name,
        }
    }
}

impl FromStr for Command {
    type Err = WireError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let value = serde_json::from_str::<Value>(line).map_err(|source| {
            WireError::InvalidJson { line: line.to_owned(), source }
        })?;
        let Value::Array(items) = value else {
            return Err(WireError::malformed(line, "not a JSON array"));
        };

        let mut items = items.into_iter();
        let name = match items.next() {
            Some(Value::String(name)) => name,
            Some(_) => {
                return Err(WireError::malformed(
                    line,
                    "command name is not a string",
                ));
            }
            None => return Err(WireError::malformed(line, "empty array")),
        };
        let payload = items.next().unwrap_or(Value::Null);

        Ok(match name.as_str() {
            "step_matches" => Self::StepMatches(decode(line, &name, payload)?),
            "begin_scenario" => Self::BeginScenario(
                // Payload is informational only.
                serde_json::from_value(payload).unwrap_or_default(),
            ),
            "end_scenario" => Self::EndScenario,
            "invoke" => Self::Invoke(decode(line, &name, payload)?),
            "snippet_text" => Self::SnippetText,
            _ => Self::Unknown(name),
        })
    }
}

fn decode<T: DeserializeOwned>(
    line: &str,
    name: &str,
    payload: Value,
) -> Result<T, WireError> {
    serde_json::from_value(payload).map_err(|e| {
        WireError::malformed(line, format!("invalid `{name}` payload: {e}"))
    })
}

/// Payload of a [`Command::StepMatches`].
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct StepMatches {
    /// Step text to match.
    pub name_to_match: String,
}

/// Payload of a [`Command::BeginScenario`].
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct BeginScenario {
    /// Tags of the scenario.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Id of a step definition, as sent in an [`Invoke`].
///
/// The wire protocol sends ids as decimal strings, though numbers are
/// accepted too.
#[derive(Clone, Debug, Deserialize, Display, PartialEq)]
#[serde(untagged)]
pub enum StepId {
    /// Id sent as a string.
    #[display("{_0}")]
    Text(String),

    /// Id sent as a number.
    #[display("{_0}")]
    Number(serde_json::Number),
}

impl StepId {
    /// Resolves this [`StepId`] into a registry index.
    ///
    /// # Errors
    ///
    /// If this [`StepId`] is not a non-negative integer.
    pub fn resolve(&self) -> Result<usize, StepError> {
        let id = match self {
            Self::Text(s) => s.trim().parse().ok(),
            Self::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        };
        id.ok_or_else(|| StepError::failed(format!("invalid step id `{self}`")))
    }
}

/// Payload of a [`Command::Invoke`].
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Invoke {
    /// Id of the step definition to run.
    pub id: StepId,

    /// Captured arguments, optionally followed by a data table.
    #[serde(default)]
    pub args: Vec<Value>,
}

impl Invoke {
    /// Splits the [`args`] into positional strings and a trailing
    /// [`Table`].
    ///
    /// The last argument is a [`Table`] if it is not a string.
    ///
    /// # Errors
    ///
    /// If the [`Table`] is not an array of arrays of strings, or any other
    /// argument is not a string.
    ///
    /// [`args`]: Self::args
    pub fn split_args(self) -> Result<(Vec<String>, Option<Table>), StepError> {
        let mut args = self.args;
        let table = match args.last() {
            Some(last) if !last.is_string() => args
                .pop()
                .map(serde_json::from_value::<Table>)
                .transpose()
                .map_err(|e| {
                    StepError::failed(format!("invalid table argument: {e}"))
                })?,
            _ => None,
        };
        let positional = args
            .into_iter()
            .enumerate()
            .map(|(n, arg)| match arg {
                Value::String(s) => Ok(s),
                other => Err(StepError::failed(format!(
                    "argument {n} is not a string: {other}",
                ))),
            })
            .collect::<Result<_, _>>()?;
        Ok((positional, table))
    }
}
