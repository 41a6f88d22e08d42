// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Binding of captured step arguments to typed step handlers.
//!
//! A step handler is a plain closure. Its signature declares the shape of
//! the step:
//!
//! | shape                     | constructor                             | signature                                  |
//! |---------------------------|-----------------------------------------|--------------------------------------------|
//! | no-arg / positional       | [`Dispatch::new()`]                     | `Fn(A1, .., An)`                           |
//! | positional + table        | [`Dispatch::with_table()`]              | `Fn(A1, .., An, &Table)`                   |
//! | context + positional      | [`Dispatch::with_context()`]            | `Fn(&mut C, A1, .., An)`                   |
//! | context + positional + table | [`Dispatch::with_context_and_table()`] | `Fn(&mut C, A1, .., An, &Table)`         |
//!
//! where every `Ai` is a [`Capture`] type and `C` is any [`Default`] type
//! resolved through the [`ContextStore`]. Handlers return either `()` or a
//! [`Result`] whose error converts into a [`StepError`].
//!
//! [`StepError`]: super::StepError

use derive_more::with_trait::Debug;

use super::{
    capture::{Capture, Captures, ParamKind},
    context::ContextStore,
    error::{IntoStepResult, StepResult},
};
use crate::Table;

/// Closure taking positional captures only.
///
/// Implemented for every `Fn(A1, .., An) -> R` with up to 8 [`Capture`]
/// arguments.
pub trait StepFn<Args, Out>: 'static {
    /// Declared parameter kinds.
    fn params() -> Vec<ParamKind>;

    /// Converts the `captures` and calls this closure.
    ///
    /// # Errors
    ///
    /// If a capture fails to convert, or the closure itself fails.
    fn call(&self, captures: &mut Captures<'_>) -> StepResult;
}

/// Closure taking positional captures followed by a [`Table`].
pub trait TableStepFn<Args, Out>: 'static {
    /// Declared parameter kinds.
    fn params() -> Vec<ParamKind>;

    /// Converts the `captures` and calls this closure with the `table`.
    ///
    /// # Errors
    ///
    /// If a capture fails to convert, or the closure itself fails.
    fn call(&self, captures: &mut Captures<'_>, table: &Table) -> StepResult;
}

/// Closure taking a context of type `C` followed by positional captures.
pub trait ContextStepFn<C, Args, Out>: 'static {
    /// Declared parameter kinds.
    fn params() -> Vec<ParamKind>;

    /// Converts the `captures` and calls this closure with the `context`.
    ///
    /// # Errors
    ///
    /// If a capture fails to convert, or the closure itself fails.
    fn call(&self, context: &mut C, captures: &mut Captures<'_>) -> StepResult;
}

/// Closure taking a context of type `C`, positional captures and a
/// [`Table`].
pub trait ContextTableStepFn<C, Args, Out>: 'static {
    /// Declared parameter kinds.
    fn params() -> Vec<ParamKind>;

    /// Converts the `captures` and calls this closure with the `context` and
    /// the `table`.
    ///
    /// # Errors
    ///
    /// If a capture fails to convert, or the closure itself fails.
    fn call(
        &self,
        context: &mut C,
        captures: &mut Captures<'_>,
        table: &Table,
    ) -> StepResult;
}

macro_rules! impl_step_fns {
    ($($arg:ident),*) => {
        impl<F, R, $($arg,)*> StepFn<($($arg,)*), R> for F
        where
            F: Fn($($arg),*) -> R + 'static,
            R: IntoStepResult,
            $($arg: Capture,)*
        {
            fn params() -> Vec<ParamKind> {
                vec![$($arg::KIND),*]
            }

            #[allow(non_snake_case, unused_variables)]
            fn call(&self, captures: &mut Captures<'_>) -> StepResult {
                $(let $arg = captures.next::<$arg>()?;)*
                (self)($($arg),*).into_step_result()
            }
        }

        impl<F, R, $($arg,)*> TableStepFn<($($arg,)*), R> for F
        where
            F: Fn($($arg,)* &Table) -> R + 'static,
            R: IntoStepResult,
            $($arg: Capture,)*
        {
            fn params() -> Vec<ParamKind> {
                vec![$($arg::KIND,)* ParamKind::Table]
            }

            #[allow(non_snake_case, unused_variables)]
            fn call(
                &self,
                captures: &mut Captures<'_>,
                table: &Table,
            ) -> StepResult {
                $(let $arg = captures.next::<$arg>()?;)*
                (self)($($arg,)* table).into_step_result()
            }
        }

        impl<F, C, R, $($arg,)*> ContextStepFn<C, ($($arg,)*), R> for F
        where
            F: Fn(&mut C, $($arg),*) -> R + 'static,
            C: Default + 'static,
            R: IntoStepResult,
            $($arg: Capture,)*
        {
            fn params() -> Vec<ParamKind> {
                vec![ParamKind::Context, $($arg::KIND),*]
            }

            #[allow(non_snake_case, unused_variables)]
            fn call(
                &self,
                context: &mut C,
                captures: &mut Captures<'_>,
            ) -> StepResult {
                $(let $arg = captures.next::<$arg>()?;)*
                (self)(context, $($arg),*).into_step_result()
            }
        }

        impl<F, C, R, $($arg,)*> ContextTableStepFn<C, ($($arg,)*), R> for F
        where
            F: Fn(&mut C, $($arg,)* &Table) -> R + 'static,
            C: Default + 'static,
            R: IntoStepResult,
            $($arg: Capture,)*
        {
            fn params() -> Vec<ParamKind> {
                vec![ParamKind::Context, $($arg::KIND,)* ParamKind::Table]
            }

            #[allow(non_snake_case, unused_variables)]
            fn call(
                &self,
                context: &mut C,
                captures: &mut Captures<'_>,
                table: &Table,
            ) -> StepResult {
                $(let $arg = captures.next::<$arg>()?;)*
                (self)(context, $($arg,)* table).into_step_result()
            }
        }
    };
}

impl_step_fns!();
impl_step_fns!(A1);
impl_step_fns!(A1, A2);
impl_step_fns!(A1, A2, A3);
impl_step_fns!(A1, A2, A3, A4);
impl_step_fns!(A1, A2, A3, A4, A5);
impl_step_fns!(A1, A2, A3, A4, A5, A6);
impl_step_fns!(A1, A2, A3, A4, A5, A6, A7);
impl_step_fns!(A1, A2, A3, A4, A5, A6, A7, A8);

/// Call shape of a step handler, erased to a uniform signature.
#[derive(Debug)]
enum Shape {
    #[debug("NoArgs")]
    NoArgs(Box<dyn Fn() -> StepResult>),

    #[debug("Positional")]
    Positional(Box<dyn Fn(&mut Captures<'_>) -> StepResult>),

    #[debug("PositionalTable")]
    PositionalTable(Box<dyn Fn(&mut Captures<'_>, &Table) -> StepResult>),

    #[debug("Context")]
    Context(Box<dyn Fn(&mut ContextStore, &mut Captures<'_>) -> StepResult>),

    #[debug("ContextTable")]
    ContextTable(
        Box<dyn Fn(&mut ContextStore, &mut Captures<'_>, &Table) -> StepResult>,
    ),
}

/// Type-erased step handler together with its declared parameters.
///
/// ```rust
/// use cuke_wire::step::{ContextStore, Dispatch, ParamKind};
///
/// #[derive(Default)]
/// struct Calculator {
///     digits: Vec<f64>,
/// }
///
/// let enter = Dispatch::with_context(|calc: &mut Calculator, n: f64| {
///     calc.digits.push(n);
/// });
/// assert_eq!(enter.params(), [ParamKind::Context, ParamKind::Real]);
///
/// let mut contexts = ContextStore::new();
/// enter.invoke(&mut contexts, &["2.5".into()], None).unwrap();
/// assert_eq!(contexts.ensure::<Calculator>().digits, [2.5]);
/// ```
#[derive(Debug)]
pub struct Dispatch {
    /// Declared parameter kinds, in order.
    params: Vec<ParamKind>,

    /// Number of positional captures consumed.
    arity: usize,

    /// Erased handler.
    shape: Shape,
}

impl Dispatch {
    /// Binds a handler taking positional captures only (possibly none).
    #[must_use]
    pub fn new<Args, Out, F>(handler: F) -> Self
    where
        F: StepFn<Args, Out>,
    {
        let params = F::params();
        let shape = if params.is_empty() {
            Shape::NoArgs(Box::new(move || {
                handler.call(&mut Captures::new(&[]))
            }))
        } else {
            Shape::Positional(Box::new(move |captures: &mut Captures<'_>| {
                handler.call(captures)
            }))
        };
        Self::from_parts(params, shape)
    }

    /// Binds a handler taking positional captures and a trailing [`Table`].
    #[must_use]
    pub fn with_table<Args, Out, F>(handler: F) -> Self
    where
        F: TableStepFn<Args, Out>,
    {
        Self::from_parts(
            F::params(),
            Shape::PositionalTable(Box::new(
                move |captures: &mut Captures<'_>, table: &Table| {
                    handler.call(captures, table)
                },
            )),
        )
    }

    /// Binds a handler taking a scenario context and positional captures.
    #[must_use]
    pub fn with_context<C, Args, Out, F>(handler: F) -> Self
    where
        C: Default + 'static,
        F: ContextStepFn<C, Args, Out>,
    {
        Self::from_parts(
            F::params(),
            Shape::Context(Box::new(
                move |contexts: &mut ContextStore, captures: &mut Captures<'_>| {
                    handler.call(contexts.ensure::<C>(), captures)
                },
            )),
        )
    }

    /// Binds a handler taking a scenario context, positional captures and a
    /// trailing [`Table`].
    #[must_use]
    pub fn with_context_and_table<C, Args, Out, F>(handler: F) -> Self
    where
        C: Default + 'static,
        F: ContextTableStepFn<C, Args, Out>,
    {
        Self::from_parts(
            F::params(),
            Shape::ContextTable(Box::new(
                move |contexts: &mut ContextStore,
                      captures: &mut Captures<'_>,
                      table: &Table| {
                    handler.call(contexts.ensure::<C>(), captures, table)
                },
            )),
        )
    }

    fn from_parts(params: Vec<ParamKind>, shape: Shape) -> Self {
        let arity = params
            .iter()
            .filter(|k| !matches!(k, ParamKind::Context | ParamKind::Table))
            .count();
        Self { params, arity, shape }
    }

    /// Declared parameter kinds, in order.
    #[must_use]
    pub fn params(&self) -> &[ParamKind] {
        &self.params
    }

    /// Number of positional captures this handler consumes.
    #[must_use]
    pub const fn arity(&self) -> usize {
        self.arity
    }

    /// Indicates whether this handler declares a trailing [`Table`].
    #[must_use]
    pub fn takes_table(&self) -> bool {
        self.params.last() == Some(&ParamKind::Table)
    }

    /// Converts the `args` and calls the handler, resolving its context (if
    /// any) from the `contexts`.
    ///
    /// # Errors
    ///
    /// If an argument fails to convert, or the handler fails.
    ///
    /// # Panics
    ///
    /// If the number of `args` differs from the [`arity()`], or the handler
    /// declares a [`Table`] and none is given. Both mean the step pattern and
    /// its handler disagree.
    ///
    /// [`arity()`]: Self::arity
    pub fn invoke(
        &self,
        contexts: &mut ContextStore,
        args: &[String],
        table: Option<&Table>,
    ) -> StepResult {
        let mut captures = Captures::new(args);
        assert!(
            captures.remaining() == self.arity,
            "step handler expects {} argument(s), but {} given: {args:?}",
            self.arity,
            captures.remaining(),
        );
        if table.is_some() && !self.takes_table() {
            tracing::warn!("step handler takes no table, ignoring the given one");
        }

        match &self.shape {
            Shape::NoArgs(f) => f(),
            Shape::Positional(f) => f(&mut captures),
            Shape::PositionalTable(f) => f(&mut captures, required(table)),
            Shape::Context(f) => f(contexts, &mut captures),
            Shape::ContextTable(f) => {
                f(contexts, &mut captures, required(table))
            }
        }
    }
}

fn required(table: Option<&Table>) -> &Table {
    table.unwrap_or_else(|| {
        panic!("step handler expects a table, but none given")
    })
}
