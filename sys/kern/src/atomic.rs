// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Kernel atomic type support.
//!
//! The ARM926 is an ARMv5TE core: it has atomic loads and stores but no
//! atomic read-modify-write operations, so `core::sync::atomic` omits
//! `swap` on that target. This trait names the one operation the kernel
//! needs, and each `arch` module supplies it: natively where the hardware
//! can, and as a masked-interrupts polyfill where it cannot.

use core::sync::atomic::Ordering;

pub(crate) trait AtomicExt {
    type Primitive;
    fn swap_polyfill(
        &self,
        value: Self::Primitive,
        ordering: Ordering,
    ) -> Self::Primitive;
}
