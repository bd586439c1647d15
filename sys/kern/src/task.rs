// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Implementation of tasks.
//!
//! A task is a function of no arguments running on a caller-provided stack.
//! Its bookkeeping record, the [`Task`] control block, lives in the fixed
//! pool inside the scheduler singleton and is addressed everywhere by pool
//! index. List membership (ready band, sleep list) is stored intrusively as
//! index links, so the TCB is in at most one list at a time and the whole
//! arrangement stays in safe code.

use crate::err::CreateError;
use crate::startup::with_sched;

/// Number of words kept free between the top of a task's stack buffer and
/// its initial stack pointer. A stack must be at least this large.
pub(crate) const STACK_RESERVE_WORDS: usize = 16;

/// Internal representation of a task.
///
/// The fields are `pub(crate)` rather than `pub` so that only the scheduler
/// can touch them; applications deal purely in entry functions, stacks, and
/// priorities.
pub(crate) struct Task {
    /// Saved machine state, restored when the task next gets the CPU. The
    /// context-switch primitive writes this directly, so its layout is
    /// architecture-defined.
    pub(crate) save: crate::arch::SavedState,
    /// Caller-provided stack buffer. The kernel never reads or writes it;
    /// only the task itself (and the trap entry sequences running on the
    /// task's behalf) do.
    pub(crate) stack_base: *mut u32,
    pub(crate) stack_words: usize,
    /// The task's entry function, called from the springboard on first
    /// switch-in.
    pub(crate) entry: fn(),
    /// Scheduling band, fixed at creation.
    pub(crate) priority: Priority,
    /// State used to make scheduling decisions.
    pub(crate) state: TaskState,
    /// Remaining ticks until a Sleeping task becomes Ready. Meaningless in
    /// any other state.
    pub(crate) wake_ticks: u32,
    /// Intrusive links. Their meaning depends on which list the task is
    /// currently on: the FIFO of its ready band, or the sleep list.
    pub(crate) queue_next: Option<usize>,
    pub(crate) queue_prev: Option<usize>,
}

impl Task {
    /// An unoccupied pool slot. Also the post-`reset` contents of every
    /// slot.
    pub(crate) const EMPTY: Task = Task {
        save: crate::arch::SavedState::ZERO,
        stack_base: core::ptr::null_mut(),
        stack_words: 0,
        entry: unused_slot_entry,
        priority: Priority::new(0),
        state: TaskState::Stopped,
        wake_ticks: 0,
        queue_next: None,
        queue_prev: None,
    };
}

/// Placeholder entry for pool slots that have never been created. Never
/// called: empty slots are Stopped and Stopped tasks are not scheduled.
fn unused_slot_entry() {}

/// State used to make scheduling decisions.
///
/// Together with the `current` slot and the two list kinds, this is also a
/// location tag: a Ready task is on its band's FIFO, a Sleeping task is on
/// the sleep list, a Running task is in the `current` slot, and a Stopped
/// task is on no list at all.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TaskState {
    /// Waiting in its priority band's FIFO for the CPU.
    Ready,
    /// On the CPU right now. At most one task is Running at any time.
    Running,
    /// Waiting on the sleep list for a tick countdown to expire.
    Sleeping,
    /// Out of service: an unoccupied pool slot, or a task retired after
    /// its entry function returned.
    Stopped,
}

/// Indicates priority of a task.
///
/// Priorities are small numbers starting from zero. Numerically lower
/// priorities are more important, so priority 0 is the most likely to be
/// scheduled, followed by 1, and so forth.
///
/// There is deliberately no `PartialOrd`/`Ord` on this type: with inverted
/// numeric order, `>` would read as "numerically greater" to one person
/// and "more important" to the next. Use `is_more_important_than`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
#[repr(transparent)]
pub struct Priority(u8);

impl Priority {
    /// Makes a priority from `level`, masking it into the supported 0..=31
    /// range.
    pub const fn new(level: u8) -> Self {
        Self(level & 0x1F)
    }

    /// Checks if `self` is strictly more important than `other`.
    ///
    /// This is easier to read than comparing the numeric values of the
    /// priorities, since lower numbers are more important.
    pub fn is_more_important_than(self, other: Self) -> bool {
        self.0 < other.0
    }

    /// The index of this priority's ready band.
    pub(crate) fn band(self) -> usize {
        usize::from(self.0)
    }
}

/// Registers a task with the scheduler.
///
/// `entry` is called on the first switch-in and is expected to loop
/// forever; a task whose entry function returns is retired (marked Stopped)
/// and never scheduled again. `stack` must hold at least
/// [`STACK_RESERVE_WORDS`] words and is owned by the task from here on.
/// `priority` has already been masked to the supported range by
/// [`Priority::new`].
///
/// Tasks are expected to be created before `startup::start`; creation from
/// task context is tolerated (the scheduler lock masks interrupts) but the
/// new task is only considered at the next scheduling point.
pub fn create(
    entry: fn(),
    stack: &'static mut [u32],
    priority: Priority,
) -> Result<(), CreateError> {
    let base = stack.as_mut_ptr();
    let words = stack.len();
    with_sched(|sched| sched.create_task(entry, base, words, priority))
}

/// First code executed by every task, on the task's own stack in task
/// context with interrupts still masked from the switch-in.
///
/// Enables interrupts, runs the entry function, and retires the task if the
/// entry function ever returns.
pub(crate) extern "C" fn springboard() -> ! {
    let entry = with_sched(|sched| sched.current_entry());
    crate::arch::enable_interrupts();
    entry();

    // The entry function returned. Take the task out of service and give
    // the CPU away for good.
    with_sched(|sched| sched.stop_current());
    loop {
        crate::sched::yield_now();
    }
}
