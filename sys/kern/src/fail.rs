// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Support for recording kernel failures such that they can be found by
//! tooling.
//!
//! The kernel has no console of its own, so death is reported through two
//! symbols a debugger (or a post-mortem memory dump) can inspect:
//!
//! - `kern::fail::KERNEL_HAS_FAILED` is a `bool`, false from boot, set to
//!   true on the way into `die` (explicitly or via `panic!`). Any other
//!   value means memory was corrupted on the way down.
//!
//! - `kern::fail::KERNEL_EPITAPH` is a byte buffer receiving as much of
//!   the failure message (UTF-8) as fits, truncated, NUL-padded. Trim
//!   trailing NULs when printing.

use core::fmt::{Display, Write};
use core::sync::atomic::Ordering;

/// Flag that gets set by all failure reporting paths, giving tools a
/// one-stop shop for kernel triage.
#[used]
static mut KERNEL_HAS_FAILED: bool = false;

const EPITAPH_LEN: usize = 128;

#[used]
static mut KERNEL_EPITAPH: [u8; EPITAPH_LEN] = [0; EPITAPH_LEN];

fn begin_epitaph() -> &'static mut [u8; EPITAPH_LEN] {
    // A plain read-modify-write: ARMv5 has no atomic swap, and failure
    // paths run on one core with no recovery, so this cannot race
    // meaningfully.
    let previous_fail = unsafe {
        core::ptr::replace(core::ptr::addr_of_mut!(KERNEL_HAS_FAILED), true)
    };
    if previous_fail {
        // A second failure arrived while reporting the first, suggesting
        // a recursive panic. Keep the original epitaph and park.
        park()
    }

    // Safety: only the single successful flag transition above reaches
    // this, so the reference cannot alias.
    unsafe { &mut *core::ptr::addr_of_mut!(KERNEL_EPITAPH) }
}

/// Records `msg` as the kernel's last words and parks the CPU.
#[inline(always)]
pub fn die(msg: impl Display) -> ! {
    die_impl(&msg)
}

#[inline(never)]
fn die_impl(msg: &dyn Display) -> ! {
    let buf = begin_epitaph();
    let mut writer = EpitaphWriter { dest: buf };
    write!(writer, "{msg}").ok();
    park()
}

fn park() -> ! {
    loop {
        // Platform-independent NOP.
        core::sync::atomic::fence(Ordering::SeqCst);
    }
}

struct EpitaphWriter {
    dest: &'static mut [u8],
}

impl Write for EpitaphWriter {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let s = s.as_bytes();
        let n = s.len().min(self.dest.len());
        let (dest, leftovers) = {
            let taken = core::mem::take(&mut self.dest);
            taken.split_at_mut(n)
        };
        dest.copy_from_slice(&s[..n]);
        self.dest = leftovers;
        Ok(())
    }
}

#[cfg(target_os = "none")]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo<'_>) -> ! {
    die(info)
}
