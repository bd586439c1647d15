// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Provides a fake atomic swap for situations where you _really_ know what
//! you're doing.
//!
//! The ARMv5TE has atomic loads and stores but no atomic read-modify-write
//! instructions, so `core::sync::atomic` omits `swap` on that target. This
//! trait fakes it with a load/store pair. That is, in general, not safe:
//! the caller wanted an atomic swap and is getting a sequence. It is sound
//! here only because
//!
//! 1. there is exactly one core, and
//! 2. every call site holds interrupts masked across the swap, so nothing
//!    can run between the load and the store.
//!
//! If either point is wrong in your case, do not use this, it will go
//! badly for you.
//!
//! Everything in this crate is conditional on `target_arch = "arm"`, so
//! accidentally pulling it into a host build won't substitute the bogus
//! implementation where a real one exists.

#![no_std]

#[cfg(target_arch = "arm")]
use core::sync::atomic::{AtomicBool, Ordering};

#[cfg(target_arch = "arm")]
pub trait AtomicBoolExt {
    fn swap(&self, val: bool, order: Ordering) -> bool;
}

#[cfg(target_arch = "arm")]
impl AtomicBoolExt for AtomicBool {
    #[inline]
    fn swap(&self, val: bool, order: Ordering) -> bool {
        let rv = self.load(order);
        self.store(val, order);
        rv
    }
}
