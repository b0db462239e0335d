//! Stack growth for the recursive evaluator.
//!
//! Nested expressions and `DEF` calls recurse on the host stack. Each
//! recursion point goes through [`ensure_sufficient_stack`], so the
//! configured call-depth limit is what stops a runaway program, whatever
//! stack size the calling thread was spawned with.

/// Minimum stack space to keep available before recursing.
const RED_ZONE: usize = 128 * 1024;

/// Size of each new stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, moving to a fresh stack segment first if less than the red
/// zone remains.
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
