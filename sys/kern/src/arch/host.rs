// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host stand-in for the architecture layer.
//!
//! Lets the scheduler build and run under the host test suite. There is no
//! register state to move and no interrupt to mask, so most of this is
//! deliberately nothing; what remains records just enough (the computed
//! initial stack pointer and resume point) for creation-time tests to
//! check.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::task::{Task, STACK_RESERVE_WORDS};

/// Stand-in for the saved register context.
#[derive(Debug)]
pub struct SavedState {
    pub sp: usize,
    pub pc: usize,
}

impl SavedState {
    pub(crate) const ZERO: Self = Self { sp: 0, pc: 0 };
}

/// Computes the same initial placement the real architecture would: stack
/// pointer one reserve window below the stack top, resume point at the
/// springboard.
pub(crate) fn reinitialize(task: &mut Task) {
    let sp = task.stack_base as usize
        + (task.stack_words - STACK_RESERVE_WORDS) * 4;
    task.save = SavedState {
        sp,
        pc: crate::task::springboard as usize,
    };
}

/// The scheduler has already updated its bookkeeping by the time this is
/// called; on a host there are no registers to move.
pub(crate) unsafe fn switch_context(
    _prev: *mut SavedState,
    _next: *const SavedState,
) {
}

pub(crate) fn start_first_task(_task: &Task) -> ! {
    panic!("entering task context");
}

/// On hardware this is `swi`; here the trap is just a call.
pub(crate) fn yield_trap() {
    crate::sched::yield_now();
}

pub(crate) fn wait_for_interrupt() {
    // No timer will ever tick here, so waiting would hang the test
    // runner. Misuse gets a diagnostic instead.
    panic!("wait_for_interrupt with nothing runnable");
}

pub(crate) fn enable_interrupts() {}

pub(crate) fn with_interrupts_masked<R>(body: impl FnOnce() -> R) -> R {
    body()
}

impl crate::atomic::AtomicExt for AtomicBool {
    type Primitive = bool;
    fn swap_polyfill(&self, value: bool, ordering: Ordering) -> bool {
        self.swap(value, ordering)
    }
}
