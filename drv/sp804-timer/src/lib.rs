// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! SP804 dual-timer driver.
//!
//! Only the first timer of a pair is used, as the kernel tick source: a
//! 32-bit periodic down-counter whose wrap raises the interrupt. The
//! second timer's registers (offset 0x20) are left alone.

#![no_std]

use bitflags::bitflags;

// Register byte offsets, timer 1 of the pair.
const TIMER1LOAD: usize = 0x00;
const TIMER1VALUE: usize = 0x04;
const TIMER1CONTROL: usize = 0x08;
const TIMER1INTCLR: usize = 0x0c;
const TIMER1MIS: usize = 0x14;

bitflags! {
    /// TimerXControl.
    pub struct Control: u32 {
        const ONESHOT = 1 << 0;
        const SIZE_32BIT = 1 << 1;
        const INT_ENABLE = 1 << 5;
        const PERIODIC = 1 << 6;
        const ENABLE = 1 << 7;
    }
}

/// Handle to a memory-mapped SP804 pair.
pub struct Timer {
    base: usize,
}

impl Timer {
    /// Makes a handle for the SP804 at `base`.
    ///
    /// # Safety
    ///
    /// `base` must be the address of an SP804 register block.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    fn reg(&self, offset: usize) -> *mut u32 {
        (self.base + offset) as *mut u32
    }

    /// Programs a periodic interrupt every `reload + 1` counts of the
    /// timer reference clock (1 MHz on the versatile board, so 999 gives
    /// the kernel's 1 ms tick).
    pub fn start_periodic(&mut self, reload: u32) {
        let control = Control::ENABLE
            | Control::PERIODIC
            | Control::INT_ENABLE
            | Control::SIZE_32BIT;
        unsafe {
            // Quiesce while reprogramming.
            self.reg(TIMER1CONTROL).write_volatile(0);
            self.reg(TIMER1LOAD).write_volatile(reload);
            self.reg(TIMER1CONTROL).write_volatile(control.bits());
        }
    }

    /// Acknowledges the pending interrupt. Any write clears it.
    pub fn clear_interrupt(&mut self) {
        unsafe { self.reg(TIMER1INTCLR).write_volatile(1) }
    }

    /// Masked interrupt status for this timer.
    pub fn is_pending(&self) -> bool {
        unsafe { self.reg(TIMER1MIS).read_volatile() & 1 != 0 }
    }

    /// Instantaneous counter value, for diagnostics.
    pub fn value(&self) -> u32 {
        unsafe { self.reg(TIMER1VALUE).read_volatile() }
    }
}
