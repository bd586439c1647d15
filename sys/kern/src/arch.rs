// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Architecture-specific support.
//!
//! In practice, this works by
//!
//! - Conditionally defining a nested module (below).
//! - `pub use`-ing its contents
//!
//! Thus, all architecture-specific types and functions show up right here
//! in the `arch` module, tailored for the current target. For this to
//! work, each architecture support module must define the same set of
//! names.
//!
//! Real hardware means the ARM926; anything else gets the host stand-in,
//! which exists so the scheduler proper can be exercised by `cargo test`
//! on a development machine.

cfg_if::cfg_if! {
    if #[cfg(target_arch = "arm")] {
        pub mod arm926;
        pub use arm926::*;
    } else {
        pub mod host;
        pub use host::*;
    }
}
