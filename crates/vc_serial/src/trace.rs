//! Per-thread stack of the type paths being converted.
//!
//! The facade pushes the target type on entry and pops it on exit, and an
//! error raised underneath records a snapshot such as
//! `` `SerializedList` -> `TypeWrapper` -> `i32` ``. The stack is only
//! maintained with the `debug` feature in debug builds; otherwise every
//! function here is a no-op.

#[cfg(all(debug_assertions, feature = "debug"))]
mod imp {
    use alloc::string::String;
    use alloc::vec::Vec;
    use core::cell::RefCell;
    use core::fmt::Write;

    std::thread_local! {
        static TYPE_PATH_STACK: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
    }

    /// Pops its entry when dropped.
    pub(crate) struct TraceGuard(());

    impl Drop for TraceGuard {
        fn drop(&mut self) {
            TYPE_PATH_STACK.with_borrow_mut(|stack| {
                stack.pop();
            });
        }
    }

    pub(crate) fn enter(type_path: &'static str) -> TraceGuard {
        TYPE_PATH_STACK.with_borrow_mut(|stack| stack.push(type_path));
        TraceGuard(())
    }

    pub(crate) fn snapshot() -> Option<String> {
        TYPE_PATH_STACK.with_borrow(|stack| {
            let (first, rest) = stack.split_first()?;
            let mut out = alloc::format!("`{first}`");
            for path in rest {
                let _ = write!(out, " -> `{path}`");
            }
            Some(out)
        })
    }
}

#[cfg(not(all(debug_assertions, feature = "debug")))]
mod imp {
    use alloc::string::String;

    pub(crate) struct TraceGuard;

    #[inline(always)]
    pub(crate) fn enter(_: &'static str) -> TraceGuard {
        TraceGuard
    }

    #[inline(always)]
    pub(crate) fn snapshot() -> Option<String> {
        None
    }
}

pub(crate) use imp::{enter, snapshot};

// -----------------------------------------------------------------------------
// Tests
