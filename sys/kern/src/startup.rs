// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Kernel startup and singleton access.

use core::cell::UnsafeCell;
use core::convert::Infallible;
use core::sync::atomic::{AtomicBool, Ordering};

use crate::atomic::AtomicExt;
use crate::err::StartError;
use crate::sched::{NextTask, Scheduler};

/// Set while a mutable reference to the scheduler exists somewhere in
/// kernel code, so a second one can never be produced. Together with the
/// interrupt masking that keeps the tick path out, this makes `with_sched`
/// an ad-hoc mutex.
static SCHED_IN_USE: AtomicBool = AtomicBool::new(false);

/// The scheduler singleton. Shared between task context and interrupt
/// context; all access funnels through `with_sched`.
static SCHEDULER: SchedulerCell =
    SchedulerCell(UnsafeCell::new(Scheduler::new()));

struct SchedulerCell(UnsafeCell<Scheduler>);

// Safety: the cell's contents are only reached through `with_sched`, which
// masks interrupts and enforces exclusivity with `SCHED_IN_USE`. There is
// exactly one core.
unsafe impl Sync for SchedulerCell {}

/// Runs `body` with exclusive access to the scheduler, interrupts masked
/// for the duration.
///
/// To preserve uniqueness of the `&mut` passed into `body`, this detects
/// any attempt to call it recursively and panics.
pub(crate) fn with_sched<R>(body: impl FnOnce(&mut Scheduler) -> R) -> R {
    crate::arch::with_interrupts_masked(|| {
        if SCHED_IN_USE.swap_polyfill(true, Ordering::Acquire) {
            panic!(); // recursive use of with_sched
        }
        // Safety: the flag check above means no other `&mut` to the
        // scheduler exists, and interrupts are masked so the trap paths
        // cannot create one underneath us.
        let sched = unsafe { &mut *SCHEDULER.0.get() };
        let r = body(sched);
        SCHED_IN_USE.store(false, Ordering::Release);
        r
    })
}

/// Zeroes the scheduler state. Must precede any other kernel call, and
/// must not be called again once tasks are running.
pub fn init() {
    with_sched(|sched| sched.reset());
}

/// Transfers control to the most important Ready task. Does not return on
/// success; the boot context is abandoned, not saved.
///
/// Fails, before touching any machine state, if no task is Ready; the
/// application either created no tasks or stopped them all pre-start.
pub fn start() -> Result<Infallible, StartError> {
    let first = with_sched(|sched| match sched.select_and_commit() {
        NextTask::SwitchTo { next, .. } => Some(sched.task_ptr(next)),
        NextTask::Same => None,
    });
    match first {
        // Safety: the pointer refers into the static pool and nothing else
        // can be mutating it; interrupts are still masked and will stay
        // so until the first task's springboard opens them.
        Some(task) => crate::arch::start_first_task(unsafe { &*task }),
        None => Err(StartError::NoReadyTask),
    }
}
