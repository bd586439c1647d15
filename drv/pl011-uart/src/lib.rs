// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! PL011 UART driver.
//!
//! Polled transmit only: the UART is a diagnostic byte sink for this
//! system, not part of its correctness, so there is no interrupt plumbing
//! and no receive path. Writers spin on the TX-FIFO-full flag.

#![no_std]

use bitflags::bitflags;

// Register byte offsets.
const UARTDR: usize = 0x00;
const UARTFR: usize = 0x18;
const UARTIBRD: usize = 0x24;
const UARTFBRD: usize = 0x28;
const UARTLCR_H: usize = 0x2c;
const UARTCR: usize = 0x30;

// UARTLCR_H fields.
const LCR_H_FEN: u32 = 1 << 4;
const LCR_H_WLEN_8: u32 = 0b11 << 5;

// UARTCR fields.
const CR_UARTEN: u32 = 1 << 0;
const CR_TXE: u32 = 1 << 8;
const CR_RXE: u32 = 1 << 9;

bitflags! {
    /// UARTFR, the flag register.
    pub struct Flags: u32 {
        const BUSY = 1 << 3;
        const RXFE = 1 << 4;
        const TXFF = 1 << 5;
    }
}

/// Handle to a memory-mapped PL011.
pub struct Uart {
    base: usize,
}

impl Uart {
    /// Makes a handle for the PL011 at `base`.
    ///
    /// # Safety
    ///
    /// `base` must be the address of a PL011 register block. Multiple
    /// handles to the same device are tolerated; concurrent writers
    /// interleave bytes at worst.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    fn reg(&self, offset: usize) -> *mut u32 {
        (self.base + offset) as *mut u32
    }

    fn flags(&self) -> Flags {
        // Safety: in-range register read on the block the constructor
        // vouched for.
        Flags::from_bits_truncate(unsafe { self.reg(UARTFR).read_volatile() })
    }

    /// Programs 115200-8N1 with FIFOs enabled and turns the UART on.
    ///
    /// The divisor pair assumes the versatile board's 24 MHz UARTCLK:
    /// 24e6 / (16 * 115200) = 13 + 1/64.
    pub fn init(&mut self) {
        unsafe {
            self.reg(UARTCR).write_volatile(0);
            self.reg(UARTIBRD).write_volatile(13);
            self.reg(UARTFBRD).write_volatile(1);
            self.reg(UARTLCR_H).write_volatile(LCR_H_FEN | LCR_H_WLEN_8);
            self.reg(UARTCR).write_volatile(CR_UARTEN | CR_TXE | CR_RXE);
        }
    }

    /// Queues one byte, spinning while the TX FIFO is full.
    pub fn putc(&mut self, byte: u8) {
        while self.flags().contains(Flags::TXFF) {}
        unsafe { self.reg(UARTDR).write_volatile(u32::from(byte)) }
    }

    /// Writes a string, expanding `\n` to `\r\n` for terminal consumption.
    pub fn puts(&mut self, s: &str) {
        for byte in s.bytes() {
            if byte == b'\n' {
                self.putc(b'\r');
            }
            self.putc(byte);
        }
    }
}

impl core::fmt::Write for Uart {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.puts(s);
        Ok(())
    }
}
