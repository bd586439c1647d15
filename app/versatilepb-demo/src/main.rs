// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Demo application for QEMU's versatilepb machine.
//!
//! Boots the kernel with three tasks: two equal-priority printers that
//! sleep between lines, and an idle task in the lowest band so the ready
//! bank never drains.
//!
//! Build and run (armv5te-none-eabi is a tier 3 target, so core comes
//! from source):
//!
//! ```text
//! cargo +nightly build -p versatilepb-demo --release \
//!     --target armv5te-none-eabi -Zbuild-std=core
//! qemu-system-arm -M versatilepb -nographic \
//!     -kernel target/armv5te-none-eabi/release/versatilepb-demo
//! ```

#![cfg_attr(target_arch = "arm", no_std)]
#![cfg_attr(target_arch = "arm", no_main)]

#[cfg(target_arch = "arm")]
mod demo {
    use core::arch::global_asm;
    use core::ptr::addr_of_mut;

    use drv_pl011_uart::Uart;
    use drv_pl190_vic::Vic;
    use drv_sp804_timer::Timer;
    use kern::err::CreateError;
    use kern::sched;
    use kern::task::{self, Priority};

    // Peripheral placement on the versatilepb.
    const UART0_BASE: usize = 0x101f_1000;
    const TIMER01_BASE: usize = 0x101e_2000;
    const VIC_BASE: usize = 0x1014_0000;

    /// VIC line wired to the TIMER0/1 pair.
    const TIMER01_IRQ: u32 = 4;

    /// One tick per millisecond from the 1 MHz timer reference.
    const TICK_RELOAD: u32 = 1_000 - 1;

    const STACK_WORDS: usize = 256;

    static mut PING_STACK: [u32; STACK_WORDS] = [0; STACK_WORDS];
    static mut PONG_STACK: [u32; STACK_WORDS] = [0; STACK_WORDS];
    static mut IDLE_STACK: [u32; STACK_WORDS] = [0; STACK_WORDS];

    // Boot entry. QEMU's -kernel loader starts us in Supervisor mode with
    // interrupts masked. Give IRQ mode its stack, settle back in
    // Supervisor mode on the boot stack, zero .bss, and enter main.
    global_asm!(
        "
        .section .text.start
        .globl _start
        _start:
            msr cpsr_c, #0xD2
            ldr sp, =_irq_stack_top
            msr cpsr_c, #0xD3
            ldr sp, =_boot_stack_top

            ldr r0, =__bss_start
            ldr r1, =__bss_end
            mov r2, #0
        2:  cmp r0, r1
            strlo r2, [r0], #4
            blo 2b

            bl main
        3:  b 3b
        .ltorg
        "
    );

    fn uart() -> Uart {
        // Safety: UART0_BASE is the PL011 on this machine. Tasks each
        // make their own handle; concurrent writers interleave bytes at
        // worst.
        unsafe { Uart::new(UART0_BASE) }
    }

    /// Tick acknowledgment hook, called by the kernel's IRQ prologue
    /// before the scheduler runs.
    #[no_mangle]
    extern "C" fn kernel_timer_irq() {
        // Safety: the same register blocks main configured.
        let mut timer = unsafe { Timer::new(TIMER01_BASE) };
        timer.clear_interrupt();
        unsafe { Vic::new(VIC_BASE) }.complete();
    }

    fn ping() {
        loop {
            uart().puts("ping\n");
            sched::sleep(500);
        }
    }

    fn pong() {
        loop {
            uart().puts("pong\n");
            sched::sleep(1000);
        }
    }

    /// Lowest band; keeps the ready bank non-empty so a sleeping printer
    /// always has something to hand the CPU to.
    fn idle() {
        loop {}
    }

    fn must_create(
        console: &mut Uart,
        what: &str,
        result: Result<(), CreateError>,
    ) {
        if result.is_err() {
            console.puts("versatilepb-demo: could not create task: ");
            console.puts(what);
            console.puts("\n");
            loop {}
        }
    }

    #[no_mangle]
    extern "C" fn main() -> ! {
        let mut console = uart();
        console.init();
        console.puts("versatilepb-demo: booting\n");

        // Safety: boot context, interrupts masked, timer interrupt not
        // yet enabled at the controller.
        unsafe { kern::arch::install_vectors() };

        kern::startup::init();

        // Safety: each stack is handed to exactly one task, here, once.
        let ping_stack = unsafe { &mut *addr_of_mut!(PING_STACK) };
        let pong_stack = unsafe { &mut *addr_of_mut!(PONG_STACK) };
        let idle_stack = unsafe { &mut *addr_of_mut!(IDLE_STACK) };

        must_create(
            &mut console,
            "ping",
            task::create(ping, ping_stack, Priority::new(0)),
        );
        must_create(
            &mut console,
            "pong",
            task::create(pong, pong_stack, Priority::new(0)),
        );
        must_create(
            &mut console,
            "idle",
            task::create(idle, idle_stack, Priority::new(31)),
        );

        // The 1 ms tick, routed through the VIC. The CPU's I bit stays
        // set until the first task runs, so nothing fires early.
        unsafe { Timer::new(TIMER01_BASE) }.start_periodic(TICK_RELOAD);
        unsafe { Vic::new(VIC_BASE) }.enable(TIMER01_IRQ);

        console.puts("versatilepb-demo: starting scheduler\n");
        match kern::startup::start() {
            Err(_) => {
                console.puts("versatilepb-demo: no runnable task\n");
                loop {}
            }
            Ok(never) => match never {},
        }
    }
}

/// The image only makes sense on the ARM target; host builds of the
/// workspace get a stub so `cargo test --workspace` stays green.
#[cfg(not(target_arch = "arm"))]
fn main() {
    eprintln!("versatilepb-demo only runs on armv5te-none-eabi");
}
