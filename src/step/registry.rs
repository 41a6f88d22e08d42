// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Registry`] of step definitions and matching of step text against them.

use std::slice;

use derive_more::with_trait::{Debug, Display};
use regex::Regex;

use super::{
    context::ContextStore,
    dispatch::Dispatch,
    error::{DefineError, StepError},
    location::Location,
};
use crate::Table;

/// Step definition registered in a [`Registry`].
#[derive(Debug, Display)]
#[display("{pattern} --> {location}")]
pub struct StepDefinition {
    /// Pattern source, as given on registration.
    pattern: String,

    /// [`pattern`](Self::pattern) anchored to match whole step text only.
    #[debug(skip)]
    regex: Regex,

    /// Where the step is defined.
    location: Location,

    /// Handler of the step.
    dispatch: Dispatch,
}

impl StepDefinition {
    /// Pattern source, as given on registration.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Where the step is defined.
    #[must_use]
    pub const fn location(&self) -> Location {
        self.location
    }

    /// Handler of the step.
    #[must_use]
    pub const fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }
}

/// Capture group of a [`StepMatch`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Argument {
    /// Captured text.
    pub value: String,

    /// Offset of the captured text in the step text, counted in Unicode code
    /// points.
    pub position: usize,
}

/// Successful match of step text against a [`StepDefinition`].
#[derive(Clone, Debug)]
pub struct StepMatch<'me> {
    /// Id of the matched [`StepDefinition`] in its [`Registry`].
    pub id: usize,

    /// Matched [`StepDefinition`].
    pub definition: &'me StepDefinition,

    /// Capture groups in pattern order, the whole match excluded.
    pub arguments: Vec<Argument>,
}

/// Ordered collection of [`StepDefinition`]s.
///
/// The id of a definition is its index in registration order. Matching tries
/// definitions in this order, so the first registered of overlapping
/// patterns always wins.
///
/// ```rust
/// use cuke_wire::step::{Dispatch, Location, Registry};
///
/// let mut registry = Registry::new();
/// let id = registry
///     .define(r"add (\d+) and (\d+)", Location::unknown(), Dispatch::new(|a: u32, b: u32| {
///         assert!(a + b > 0);
///     }))
///     .unwrap();
///
/// let matched = registry.find("add 100 and 200").unwrap();
/// assert_eq!(matched.id, id);
/// assert_eq!(matched.arguments[1].value, "200");
/// assert_eq!(matched.arguments[1].position, 12);
///
/// assert!(registry.find("add 100 and 200 twice").is_none());
/// ```
#[derive(Debug, Default)]
pub struct Registry {
    definitions: Vec<StepDefinition>,
}

impl Registry {
    /// Creates a new empty [`Registry`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new step definition, returning its id.
    ///
    /// # Errors
    ///
    /// If the `pattern` is not a valid [`Regex`].
    pub fn define(
        &mut self,
        pattern: impl Into<String>,
        location: Location,
        dispatch: Dispatch,
    ) -> Result<usize, DefineError> {
        let pattern = pattern.into();
        let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(
            |source| DefineError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            },
        )?;

        let id = self.definitions.len();
        tracing::debug!(id, %pattern, %location, "step defined");
        self.definitions.push(StepDefinition {
            pattern,
            regex,
            location,
            dispatch,
        });
        Ok(id)
    }

    /// Registers a new [Given] step definition located at the caller.
    ///
    /// # Errors
    ///
    /// If the `pattern` is not a valid [`Regex`].
    ///
    /// [Given]: https://cucumber.io/docs/gherkin/reference#given
    #[track_caller]
    pub fn given(
        &mut self,
        pattern: impl Into<String>,
        dispatch: Dispatch,
    ) -> Result<usize, DefineError> {
        self.define(pattern, Location::caller(), dispatch)
    }

    /// Registers a new [When] step definition located at the caller.
    ///
    /// # Errors
    ///
    /// If the `pattern` is not a valid [`Regex`].
    ///
    /// [When]: https://cucumber.io/docs/gherkin/reference#when
    #[track_caller]
    pub fn when(
        &mut self,
        pattern: impl Into<String>,
        dispatch: Dispatch,
    ) -> Result<usize, DefineError> {
        self.define(pattern, Location::caller(), dispatch)
    }

    /// Registers a new [Then] step definition located at the caller.
    ///
    /// # Errors
    ///
    /// If the `pattern` is not a valid [`Regex`].
    ///
    /// [Then]: https://cucumber.io/docs/gherkin/reference#then
    #[track_caller]
    pub fn then(
        &mut self,
        pattern: impl Into<String>,
        dispatch: Dispatch,
    ) -> Result<usize, DefineError> {
        self.define(pattern, Location::caller(), dispatch)
    }

    /// Returns the first [`StepDefinition`] matching the whole `text`, if
    /// any.
    #[must_use]
    pub fn find(&self, text: &str) -> Option<StepMatch<'_>> {
        self.definitions.iter().enumerate().find_map(|(id, definition)| {
            let captures = definition.regex.captures(text)?;
            let arguments = captures
                .iter()
                .skip(1)
                .map(|group| match group {
                    Some(m) => Argument {
                        value: m.as_str().to_owned(),
                        position: code_point_offset(text, m.start()),
                    },
                    // Group didn't participate: point past the end of text.
                    None => Argument {
                        value: String::new(),
                        position: text.chars().count(),
                    },
                })
                .collect();
            Some(StepMatch { id, definition, arguments })
        })
    }

    /// Invokes the [`StepDefinition`] with the given `id`.
    ///
    /// Returns `false` if there is no such definition, without invoking
    /// anything.
    ///
    /// # Errors
    ///
    /// If the step handler fails. The error is returned as is.
    ///
    /// # Panics
    ///
    /// If the `args` or the `table` don't fit the handler, as described in
    /// [`Dispatch::invoke()`].
    pub fn run(
        &self,
        id: usize,
        args: &[String],
        table: Option<&Table>,
        contexts: &mut ContextStore,
    ) -> Result<bool, StepError> {
        let Some(definition) = self.get(id) else {
            return Ok(false);
        };
        tracing::debug!(id, pattern = %definition.pattern, "invoking step");
        definition.dispatch.invoke(contexts, args, table).map(|()| true)
    }

    /// Returns the [`StepDefinition`] with the given `id`, if any.
    #[must_use]
    pub fn get(&self, id: usize) -> Option<&StepDefinition> {
        self.definitions.get(id)
    }

    /// Number of registered [`StepDefinition`]s.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Indicates whether no [`StepDefinition`] is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Iterates over [`StepDefinition`]s in registration order.
    pub fn iter(&self) -> slice::Iter<'_, StepDefinition> {
        self.definitions.iter()
    }
}

impl<'me> IntoIterator for &'me Registry {
    type Item = &'me StepDefinition;
    type IntoIter = slice::Iter<'me, StepDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Converts a byte offset into `text` to an offset in Unicode code points.
fn code_point_offset(text: &str, byte_offset: usize) -> usize {
    text.get(..byte_offset).map_or(0, |prefix| prefix.chars().count())
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;

    fn noop() -> Dispatch {
        Dispatch::new(|| {})
    }

    #[test]
    fn ids_follow_registration_order() {
        let mut registry = Registry::new();
        assert_eq!(registry.define("a", Location::unknown(), noop()).unwrap(), 0);
        assert_eq!(registry.define("b", Location::unknown(), noop()).unwrap(), 1);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(1).map(StepDefinition::pattern), Some("b"));
    }

    #[test]
    fn matches_without_captures() {
        let mut registry = Registry::new();
        _ = registry.define("hello", Location::unknown(), noop()).unwrap();

        let matched = registry.find("hello").unwrap();
        assert_eq!(matched.id, 0);
        assert!(matched.arguments.is_empty());
        assert_eq!(matched.definition.pattern(), "hello");
    }

    #[test]
    fn first_registered_wins() {
        let mut registry = Registry::new();
        _ = registry.define(r"input (\d+)", Location::unknown(), noop()).unwrap();
        _ = registry.define(r"input (.+)", Location::unknown(), noop()).unwrap();
        _ = registry.define(r"input (\d+)", Location::unknown(), noop()).unwrap();

        assert_eq!(registry.find("input 42").unwrap().id, 0);
        assert_eq!(registry.find("input forty two").unwrap().id, 1);
    }

    #[test]
    fn matches_whole_text_only() {
        let mut registry = Registry::new();
        _ = registry.define(r"input (\d+)", Location::unknown(), noop()).unwrap();

        assert!(registry.find("input 1 extra").is_none());
        assert!(registry.find("an input 1").is_none());
        assert!(registry.find("input 1").is_some());
    }

    #[test]
    fn alternation_is_anchored_as_a_whole() {
        let mut registry = Registry::new();
        _ = registry.define("a|ab", Location::unknown(), noop()).unwrap();

        assert!(registry.find("ab").is_some());
        assert!(registry.find("abc").is_none());
    }

    #[test]
    fn positions_are_code_points() {
        let mut registry = Registry::new();
        _ = registry.define("我输入: (.+)", Location::unknown(), noop()).unwrap();

        let matched = registry.find("我输入: 你好").unwrap();
        assert_eq!(
            matched.arguments,
            [Argument { value: "你好".into(), position: 5 }],
        );
    }

    #[test]
    fn positions_of_several_groups() {
        let mut registry = Registry::new();
        _ = registry
            .define(r"calculator add (\d+) and (\d+)", Location::unknown(), noop())
            .unwrap();

        let matched = registry.find("calculator add 100 and 200").unwrap();
        let positions: Vec<_> =
            matched.arguments.iter().map(|a| a.position).collect();
        assert_eq!(positions, [15, 23]);
    }

    #[test]
    fn unmatched_optional_group_points_past_end() {
        let mut registry = Registry::new();
        _ = registry
            .define(r"(\d+) items?( each)?", Location::unknown(), noop())
            .unwrap();

        let matched = registry.find("3 items").unwrap();
        assert_eq!(matched.arguments[1], Argument { value: String::new(), position: 7 });
    }

    #[test]
    fn no_match_is_none() {
        let mut registry = Registry::new();
        assert!(registry.find("anything").is_none());
        _ = registry.define("hello", Location::unknown(), noop()).unwrap();
        assert!(registry.find("goodbye").is_none());
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let mut registry = Registry::new();
        let err = registry
            .define("unclosed (", Location::unknown(), noop())
            .unwrap_err();

        assert!(matches!(err, DefineError::InvalidPattern { ref pattern, .. } if pattern == "unclosed ("));
        assert!(registry.is_empty());
    }

    #[test]
    fn run_unknown_id_does_nothing() {
        let calls = Rc::new(Cell::new(0));
        let mut registry = Registry::new();
        _ = registry
            .define("hello", Location::unknown(), Dispatch::new({
                let calls = Rc::clone(&calls);
                move || calls.set(calls.get() + 1)
            }))
            .unwrap();

        let ran = registry.run(1, &[], None, &mut ContextStore::new()).unwrap();
        assert!(!ran);
        assert_eq!(calls.get(), 0);

        let ran = registry.run(0, &[], None, &mut ContextStore::new()).unwrap();
        assert!(ran);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    #[should_panic(expected = "expects 1 argument(s), but 2 given")]
    fn run_with_wrong_arity_fails_fast() {
        let mut registry = Registry::new();
        _ = registry
            .define(r"input (\d+)", Location::unknown(), Dispatch::new(|_: i32| {}))
            .unwrap();

        drop(registry.run(
            0,
            &["1".into(), "2".into()],
            None,
            &mut ContextStore::new(),
        ));
    }

    #[test]
    fn given_when_then_record_caller_location() {
        let mut registry = Registry::new();
        let line = line!() + 1;
        let id = registry.given("hello", noop()).unwrap();
        _ = registry.when("press", noop()).unwrap();
        _ = registry.then("see", noop()).unwrap();

        let location = registry.get(id).unwrap().location();
        assert_eq!(location, Location::new(file!(), line));
        assert_eq!(registry.iter().count(), 3);
    }

    #[test]
    fn displays_pattern_and_location() {
        let mut registry = Registry::new();
        _ = registry
            .define("hello", Location::new("steps.rs", 7), noop())
            .unwrap();

        assert_eq!(registry.get(0).unwrap().to_string(), "hello --> steps.rs:7");
    }
}
