// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Scenario-scoped contexts shared between step invocations.
//!
//! A context plays the role of a [Cucumber] world: every step asking for the
//! same type during one [scenario][0] receives the same instance, created
//! lazily via [`Default`], and dropped once the [scenario][0] ends.
//!
//! [0]: https://cucumber.io/docs/gherkin/reference#descriptions
//! [Cucumber]: https://cucumber.io

use std::{
    any::{self, Any, TypeId},
    collections::HashMap,
};

use derive_more::with_trait::Debug;

/// Lifecycle state of a [`ContextStore`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ScenarioState {
    /// No scenario has begun, or the last one has ended.
    #[default]
    NoScenario,

    /// A scenario has begun and not ended yet.
    ScenarioActive,
}

/// Per-scenario storage of context instances, one per type.
#[derive(Debug, Default)]
pub struct ContextStore {
    /// Scenario lifecycle state.
    state: ScenarioState,

    /// Context instances keyed by their type.
    #[debug("{:?}", entries.keys().collect::<Vec<_>>())]
    entries: HashMap<TypeId, Box<dyn Any>>,
}

impl ContextStore {
    /// Creates a new empty [`ContextStore`] with no active scenario.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins a new scenario, dropping all the contexts of the previous one.
    pub fn begin(&mut self) {
        self.clear();
        self.state = ScenarioState::ScenarioActive;
    }

    /// Ends the current scenario, dropping all its contexts.
    pub fn end(&mut self) {
        self.clear();
        self.state = ScenarioState::NoScenario;
    }

    /// Returns the context of type `T`, creating it if absent.
    pub fn ensure<T: Default + 'static>(&mut self) -> &mut T {
        let id = TypeId::of::<T>();
        self.entries
            .entry(id)
            .or_insert_with(|| {
                tracing::trace!(context = any::type_name::<T>(), "creating");
                Box::new(T::default())
            })
            .downcast_mut::<T>()
            // Entries are keyed by the `TypeId` of the boxed value.
            .unwrap_or_else(|| unreachable!())
    }

    /// Returns the context of type `T`, if it was created in this scenario.
    #[must_use]
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.entries.get(&TypeId::of::<T>())?.downcast_ref()
    }

    /// Current [`ScenarioState`].
    #[must_use]
    pub const fn state(&self) -> ScenarioState {
        self.state
    }

    /// Indicates whether a scenario is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == ScenarioState::ScenarioActive
    }

    /// Number of live contexts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Indicates whether no context is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn clear(&mut self) {
        if !self.entries.is_empty() {
            tracing::trace!(contexts = self.entries.len(), "dropping");
        }
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::ptr;

    use derive_more::with_trait::Debug;

    use super::*;

    #[derive(Debug, Default)]
    struct Calculator {
        digits: Vec<f64>,
    }

    #[derive(Default)]
    struct Counter(u32);

    #[test]
    fn starts_empty_without_scenario() {
        let store = ContextStore::new();
        assert_eq!(store.state(), ScenarioState::NoScenario);
        assert!(store.is_empty());
    }

    #[test]
    fn ensure_returns_same_instance_within_scenario() {
        let mut store = ContextStore::new();
        store.begin();

        let first: *const Calculator = store.ensure::<Calculator>();
        store.ensure::<Calculator>().digits.push(1.5);
        let second: *const Calculator = store.ensure::<Calculator>();

        assert!(ptr::eq(first, second));
        assert_eq!(store.ensure::<Calculator>().digits, [1.5]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn distinct_types_get_distinct_instances() {
        let mut store = ContextStore::new();
        store.ensure::<Counter>().0 = 7;
        store.ensure::<Calculator>().digits.push(2.0);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get::<Counter>().map(|c| c.0), Some(7));
    }

    #[test]
    fn ensure_works_without_explicit_scenario() {
        let mut store = ContextStore::new();
        store.ensure::<Counter>().0 += 1;
        store.ensure::<Counter>().0 += 1;

        assert!(!store.is_active());
        assert_eq!(store.get::<Counter>().map(|c| c.0), Some(2));
    }

    #[test]
    fn end_then_begin_resets_contexts() {
        let mut store = ContextStore::new();
        store.begin();
        store.ensure::<Counter>().0 = 1024;
        store.end();

        assert_eq!(store.state(), ScenarioState::NoScenario);
        assert!(store.get::<Counter>().is_none());

        store.begin();
        assert_eq!(store.ensure::<Counter>().0, 0);
    }

    #[test]
    fn begin_twice_is_same_as_once() {
        let mut store = ContextStore::new();
        store.begin();
        store.ensure::<Counter>().0 = 3;
        store.begin();

        assert!(store.is_active());
        assert!(store.is_empty());
        store.begin();
        assert!(store.is_empty());
    }

    #[test]
    fn debug_lists_context_types() {
        let mut store = ContextStore::new();
        _ = store.ensure::<Counter>();

        let debug = format!("{store:?}");
        assert!(debug.contains("NoScenario"));
        assert!(debug.contains(&format!("{:?}", TypeId::of::<Counter>())));
    }
}
