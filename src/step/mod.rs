// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Step definitions: their [`Registry`], typed [`Dispatch`] of captured
//! arguments and scenario-scoped [`ContextStore`].

pub mod capture;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod location;
pub mod registry;

#[doc(inline)]
pub use self::{
    capture::{Capture, Captures, ParamKind},
    context::{ContextStore, ScenarioState},
    dispatch::{
        ContextStepFn, ContextTableStepFn, Dispatch, StepFn, TableStepFn,
    },
    error::{DefineError, Failure, IntoStepResult, StepError, StepResult},
    location::Location,
    registry::{Argument, Registry, StepDefinition, StepMatch},
};
