//! Panic interception for the UI thread.
//!
//! Window procedures and tray handlers run inside [`guard`], which catches a
//! panic, reports it and lets the message loop carry on. The process-wide
//! panic hook asks [`is_guarded`] so it leaves those panics to the guard and
//! only handles the ones that are really fatal.

use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};

thread_local! {
    static DEPTH: Cell<u32> = const { Cell::new(0) };
}

/// True while the current thread is inside [`guard`].
pub fn is_guarded() -> bool {
    DEPTH.with(Cell::get) > 0
}

/// Message carried by a panic payload.
pub fn panic_reason(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Run `f`. If it panics, pass the reason to `report` and return `fallback`.
pub fn guard<R>(fallback: R, report: impl FnOnce(&str), f: impl FnOnce() -> R) -> R {
    DEPTH.with(|d| d.set(d.get() + 1));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    DEPTH.with(|d| d.set(d.get() - 1));

    match result {
        Ok(value) => value,
        Err(payload) => {
            report(&panic_reason(payload.as_ref()));
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn returns_value_without_reporting() {
        let reported = RefCell::new(Vec::<String>::new());

        let value = guard(0, |r| reported.borrow_mut().push(r.to_string()), || 7);

        assert_eq!(value, 7);
        assert!(reported.borrow().is_empty());
    }

    #[test]
    fn panic_is_reported_and_replaced_by_fallback() {
        let reported = RefCell::new(Vec::<String>::new());

        let value = guard(
            -1,
            |r| reported.borrow_mut().push(r.to_string()),
            || -> i32 { panic!("tray handler failed") },
        );

        assert_eq!(value, -1);
        assert_eq!(*reported.borrow(), ["tray handler failed"]);
    }

    #[test]
    fn formatted_panic_messages_are_kept() {
        let code = 42;
        let mut reason = String::new();

        guard((), |r| reason = r.to_string(), || panic!("bad command {code}"));

        assert_eq!(reason, "bad command 42");
    }

    #[test]
    fn guarded_flag_tracks_nesting_and_unwinding() {
        assert!(!is_guarded());

        let inner = guard(
            false,
            |_| {},
            || {
                assert!(is_guarded());
                guard((), |_| {}, || panic!("nested"));
                is_guarded()
            },
        );

        assert!(inner, "outer guard still active after the nested panic");
        assert!(!is_guarded());
    }

    #[test]
    fn unknown_payloads_get_a_generic_reason() {
        let payload: Box<dyn Any + Send> = Box::new(5u8);

        assert_eq!(panic_reason(payload.as_ref()), "unknown panic");
    }
}
