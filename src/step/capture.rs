// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Conversion of captured step text into typed step parameters.

use std::slice;

use derive_more::with_trait::Display;

use super::error::StepError;

/// Kind of a step handler parameter.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum ParamKind {
    /// Scenario-scoped context, resolved implicitly.
    #[display("context")]
    Context,

    /// Base-10 integer.
    #[display("integer")]
    Integer,

    /// Decimal number.
    #[display("real")]
    Real,

    /// Text passed through unchanged.
    #[display("text")]
    Text,

    /// Data table, passed as a whole.
    #[display("table")]
    Table,
}

/// Type which can be produced from a single regex capture.
pub trait Capture: Sized {
    /// [`ParamKind`] this type is declared as.
    const KIND: ParamKind;

    /// Converts the captured `value`.
    ///
    /// # Errors
    ///
    /// [`StepError::Conversion`] if `value` doesn't represent [`Self::KIND`].
    fn from_capture(value: &str) -> Result<Self, StepError>;
}

impl Capture for String {
    const KIND: ParamKind = ParamKind::Text;

    fn from_capture(value: &str) -> Result<Self, StepError> {
        Ok(value.to_owned())
    }
}

macro_rules! impl_capture_via_from_str {
    ($kind:ident: $($ty:ty),+ $(,)?) => {$(
        impl Capture for $ty {
            const KIND: ParamKind = ParamKind::$kind;

            fn from_capture(value: &str) -> Result<Self, StepError> {
                value
                    .parse()
                    .map_err(|_| StepError::conversion(value, Self::KIND))
            }
        }
    )+};
}

impl_capture_via_from_str!(
    Integer: i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize,
);
impl_capture_via_from_str!(Real: f32, f64);

/// Ordered, consuming view over the positional captures of a step
/// invocation.
#[derive(Clone, Debug)]
pub struct Captures<'a> {
    values: slice::Iter<'a, String>,
}

impl<'a> Captures<'a> {
    /// Creates [`Captures`] over the given `values`, in match order.
    #[must_use]
    pub fn new(values: &'a [String]) -> Self {
        Self { values: values.iter() }
    }

    /// Number of captures not consumed yet.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.values.len()
    }

    /// Consumes the next capture, converting it into `T`.
    ///
    /// # Errors
    ///
    /// [`StepError::Conversion`] if the capture doesn't represent `T`.
    ///
    /// # Panics
    ///
    /// If all captures are consumed already. Dispatchers verify the arity
    /// before converting anything.
    pub fn next<T: Capture>(&mut self) -> Result<T, StepError> {
        let value = self.values.next().unwrap_or_else(|| {
            panic!("no capture left for a `{}` parameter", T::KIND)
        });
        T::from_capture(value)
    }
}
