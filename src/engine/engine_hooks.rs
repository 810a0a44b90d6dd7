//! engine::engine_hooks
//!
//! Test-only hook for fault injection inside a push.
//!
//! # Architecture
//!
//! A push updates the remote reference before it writes the repository row
//! and the ledger entry. The hook fires between the two, so a test can
//! simulate a crash there (by panicking) and observe what is left behind.
//!
//! # Usage
//!
//! ```ignore
//! use repomirror::engine::engine_hooks;
//!
//! engine_hooks::set_after_ref_update(|| panic!("simulated crash"));
//! // ... run a push in a spawned task and observe the panic ...
//! engine_hooks::clear();
//! ```
//!
//! # Thread Safety
//!
//! Hooks live in thread-local storage. Tests using them must run the push
//! on the thread that installed the hook (the default `#[tokio::test]`
//! runtime is single-threaded).
//!
//! # Invariants
//!
//! - Only compiled under `cfg(test)` or the `fault_injection` feature
//! - Each test must call `clear()` when done

use std::cell::RefCell;

type Hook = Box<dyn Fn()>;

thread_local! {
    static AFTER_REF_UPDATE: RefCell<Option<Hook>> = const { RefCell::new(None) };
}

/// Run `hook` after the remote reference is updated, before any record
/// is written.
pub fn set_after_ref_update(hook: impl Fn() + 'static) {
    AFTER_REF_UPDATE.with(|h| *h.borrow_mut() = Some(Box::new(hook)));
}

/// Remove all hooks on this thread.
pub fn clear() {
    AFTER_REF_UPDATE.with(|h| *h.borrow_mut() = None);
}

pub(crate) fn run_after_ref_update() {
    AFTER_REF_UPDATE.with(|h| {
        if let Some(hook) = h.borrow().as_ref() {
            hook();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn hook_runs_until_cleared() {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        set_after_ref_update(move || c.set(c.get() + 1));

        run_after_ref_update();
        clear();
        run_after_ref_update();

        assert_eq!(count.get(), 1);
    }
}
