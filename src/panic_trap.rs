// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Trapping of panics raised by step handlers.

use std::{
    any::Any,
    cell::Cell,
    panic::{self, AssertUnwindSafe},
    sync::Once,
};

use crate::step::{Failure, StepError};

/// Type-erased payload of a caught panic.
pub type Payload = Box<dyn Any + Send + 'static>;

thread_local! {
    /// Whether the current thread is inside [`run()`].
    static TRAPPING: Cell<bool> = const { Cell::new(false) };
}

/// Runs the given closure, turning a panic inside it into a [`StepError`].
///
/// A trapped panic is reported to the runner, so it isn't printed by the
/// panic hook: its location is logged at the `DEBUG` level instead. Panics
/// outside of [`run()`] (and on other threads) reach the previous hook as
/// usual.
///
/// # Errors
///
/// If the closure panics. See [`into_step_error()`] for how the payload is
/// interpreted.
pub fn run<T>(f: impl FnOnce() -> T) -> Result<T, StepError> {
    install_hook();

    let outer = TRAPPING.with(|t| t.replace(true));
    let res = panic::catch_unwind(AssertUnwindSafe(f));
    TRAPPING.with(|t| t.set(outer));

    res.map_err(into_step_error)
}

/// Wraps the current panic hook once per process, silencing it for the
/// threads inside [`run()`].
fn install_hook() {
    static HOOK: Once = Once::new();

    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if TRAPPING.with(Cell::get) {
                if let Some(loc) = info.location() {
                    tracing::debug!(%loc, "step panicked");
                }
            } else {
                previous(info);
            }
        }));
    });
}

/// Interprets a panic `payload` as a [`StepError`].
///
/// Textual payloads (produced by `panic!`, `assert!` and friends) and
/// [`Failure`]s are described failures. An [`anyhow::Error`] or any other
/// payload is an unexpected one.
#[must_use]
pub fn into_step_error(payload: Payload) -> StepError {
    let payload = match payload.downcast::<String>() {
        Ok(msg) => return StepError::failed(*msg),
        Err(p) => p,
    };
    let payload = match payload.downcast::<&'static str>() {
        Ok(msg) => return StepError::failed(*msg),
        Err(p) => p,
    };
    let payload = match payload.downcast::<Failure>() {
        Ok(failure) => return StepError::Failed(*failure),
        Err(p) => p,
    };
    match payload.downcast::<anyhow::Error>() {
        Ok(err) => StepError::Unexpected(*err),
        Err(_) => StepError::unexpected("opaque panic payload"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_value_through() {
        assert_eq!(run(|| 42).unwrap(), 42);
    }

    #[test]
    fn formatted_panic_is_failure() {
        let err = run(|| panic!("expected {}, got {}", 3, 4)).unwrap_err();
        assert!(!err.is_unexpected());
        assert_eq!(err.to_string(), "expected 3, got 4");
    }

    #[test]
    fn static_str_panic_is_failure() {
        let err = run(|| panic!("plain")).unwrap_err();
        assert_eq!(err.to_string(), "plain");
    }

    #[test]
    fn assertion_message_is_kept() {
        let err = run(|| assert_eq!(1 + 1, 3, "math is broken")).unwrap_err();
        assert!(err.to_string().contains("math is broken"));
    }

    #[test]
    fn failure_payload_is_failure() {
        let err =
            run(|| panic::panic_any(Failure::new("typed failure"))).unwrap_err();
        assert!(matches!(err, StepError::Failed(ref f) if f.message == "typed failure"));
    }

    #[test]
    fn anyhow_payload_is_unexpected() {
        let err = run(|| panic::panic_any(anyhow::anyhow!("disk full")))
            .unwrap_err();
        assert_eq!(err.to_string(), "unknown exception: disk full");
    }

    #[test]
    fn trapping_is_scoped_to_run() {
        assert!(!TRAPPING.with(Cell::get));

        let err = run(|| {
            assert!(TRAPPING.with(Cell::get));
            let inner = run(|| panic!("inner")).unwrap_err();
            assert_eq!(inner.to_string(), "inner");
            assert!(TRAPPING.with(Cell::get), "inner run resets the outer one");
            panic!("outer")
        })
        .unwrap_err();

        assert_eq!(err.to_string(), "outer");
        assert!(!TRAPPING.with(Cell::get));
    }

    #[test]
    fn other_threads_are_not_trapping() {
        run(|| {
            let elsewhere = std::thread::spawn(|| TRAPPING.with(Cell::get));
            assert!(!elsewhere.join().unwrap());
        })
        .unwrap();
    }

    #[test]
    fn opaque_payload_is_unexpected() {
        let err = run(|| panic::panic_any(42_u8)).unwrap_err();
        assert!(err.is_unexpected());
        assert_eq!(err.to_string(), "unknown exception: opaque panic payload");
    }
}
