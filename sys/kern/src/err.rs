// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Kernel error taxonomy.
//!
//! Only configuration mistakes are expressible as errors, and only before
//! the scheduler is running: once started, the tick engine cannot fail, and
//! violated internal invariants are treated as programmer bugs that
//! `uassert!`-and-halt rather than propagate.

/// Ways task creation can be refused.
///
/// The original design dropped these on the floor silently; surfacing them
/// lets an application notice a misconfigured image before it boots.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CreateError {
    /// Every slot in the fixed task pool is already in use.
    PoolExhausted,
    /// The supplied stack cannot hold the context window reserved at its
    /// top. This also covers the degenerate zero-length stack.
    StackTooSmall,
}

/// Ways `startup::start` can be refused.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StartError {
    /// No task was Ready at start time. Returned before any hand-off to
    /// task context, so the caller can still report it.
    NoReadyTask,
}
