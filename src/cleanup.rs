// {{{ Copyright (c) Paul R. Tagliamonte <paultag@debian.org>, 2024
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE. }}}

//! A stack of undo closures, standing in for `dpkg`'s own
//! `push_cleanup`/`pop_cleanup`/`ohshit` longjmp machinery.
//!
//! The original walks a global stack of handlers on a fatal error, each
//! tagged with a bitmask saying whether it should run on abort, on normal
//! completion, or both. There's no `setjmp`/`longjmp` equivalent worth
//! reaching for here: a [CleanupStack] is pushed into a scope, handlers are
//! registered as that scope does work that needs undoing, and either the
//! scope discards them one by one as each step finishes cleanly, or an
//! early return via `?` drops the stack with work still pending, at which
//! point [Drop] unwinds whatever's left as though the whole scope had
//! aborted.

/// When a [CleanupStack] handler is eligible to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    /// Run only when the guarded scope is unwinding on error.
    OnAbort,
    /// Run only when the guarded scope is popped as part of normal,
    /// successful completion.
    OnNormalExit,
    /// Run regardless of how the scope ends.
    Both,
}

impl Trigger {
    fn fires_on(self, outcome: Outcome) -> bool {
        matches!(
            (self, outcome),
            (Trigger::Both, _) | (Trigger::OnAbort, Outcome::Abort) | (Trigger::OnNormalExit, Outcome::Normal)
        )
    }
}

/// Why a [CleanupStack] is being unwound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The guarded scope completed successfully.
    Normal,
    /// The guarded scope is unwinding because of a fatal error.
    Abort,
}

/// A LIFO stack of `(Trigger, handler)` pairs.
///
/// Handlers are plain `FnOnce` closures rather than a trait object per
/// call site, since every push site in this crate captures a small,
/// owned set of paths to undo a single filesystem step -- there's no
/// shared state across handlers worth a named type for.
#[derive(Default)]
pub struct CleanupStack {
    handlers: Vec<(Trigger, Box<dyn FnOnce() + Send>)>,
}

impl CleanupStack {
    /// An empty stack.
    pub fn new() -> Self {
        CleanupStack { handlers: Vec::new() }
    }

    /// Register `handler`, to run (per `trigger`) the next time the stack
    /// unwinds at or past this point.
    pub fn push(&mut self, trigger: Trigger, handler: impl FnOnce() + Send + 'static) {
        self.handlers.push((trigger, Box::new(handler)));
    }

    /// Remove the most recently pushed handler without running it -- the
    /// guarded step succeeded and there's nothing left to undo.
    pub fn discard(&mut self) {
        self.handlers.pop();
    }

    /// Pop and, if `trigger.fires_on(outcome)`, run the most recently
    /// pushed handler.
    pub fn pop(&mut self, outcome: Outcome) {
        if let Some((trigger, handler)) = self.handlers.pop() {
            if trigger.fires_on(outcome) {
                handler();
            }
        }
    }

    /// Pop every remaining handler, in LIFO order, running each one whose
    /// trigger matches `outcome`.
    pub fn unwind(&mut self, outcome: Outcome) {
        while !self.handlers.is_empty() {
            self.pop(outcome);
        }
    }
}

impl Drop for CleanupStack {
    /// A stack dropped with handlers still registered means the scope that
    /// owned it left without explicitly discarding or popping them -- an
    /// early return via `?` is the common case. Treat that the same as an
    /// abort: run whatever's left under [Outcome::Abort].
    fn drop(&mut self) {
        if !self.handlers.is_empty() {
            self.unwind(Outcome::Abort);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn discard_skips_the_handler() {
        let ran = Arc::new(AtomicBool::new(false));
        let mut stack = CleanupStack::new();
        let flag = ran.clone();
        stack.push(Trigger::Both, move || flag.store(true, Ordering::SeqCst));
        stack.discard();
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[test]
    fn drop_unwinds_pending_handlers_as_abort() {
        let ran = Arc::new(AtomicBool::new(false));
        {
            let flag = ran.clone();
            let mut stack = CleanupStack::new();
            stack.push(Trigger::OnAbort, move || flag.store(true, Ordering::SeqCst));
        }
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn on_normal_exit_handler_does_not_fire_on_abort() {
        let ran = Arc::new(AtomicBool::new(false));
        let mut stack = CleanupStack::new();
        let flag = ran.clone();
        stack.push(Trigger::OnNormalExit, move || flag.store(true, Ordering::SeqCst));
        stack.unwind(Outcome::Abort);
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[test]
    fn lifo_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut stack = CleanupStack::new();
        for i in 0..3 {
            let order = order.clone();
            stack.push(Trigger::Both, move || order.lock().unwrap().push(i));
        }
        stack.unwind(Outcome::Normal);
        assert_eq!(*order.lock().unwrap(), vec![2, 1, 0]);
    }
}

// vim: foldmethod=marker
