#![no_std]
#![deny(missing_docs)]
//! # millis
//! A millisecond uptime counter for interrupt-driven targets.
//!
//! The application claims the counter once with [start], arranges for a
//! hardware timer to fire once per millisecond (on AVR targets [start]
//! programs timer 0 itself) and calls [isr_tick] from the handler;
//! [now_ms] reads the count from anywhere. The counter is a [portable_atomic] `AtomicU32`, so
//! the main-loop read can never observe a half-updated value even on cores
//! whose native word is 8 bits, and the crate itself needs no
//! `critical-section` plumbing.
//!
//! The count wraps after about 49.7 days. [Stopwatch] measures intervals
//! with wrapping arithmetic, so a measurement spanning the wrap stays
//! correct as long as it is shorter than the full period.

use portable_atomic::{AtomicBool, AtomicU32, Ordering};

static TICKS: AtomicU32 = AtomicU32::new(0);
static STARTED: AtomicBool = AtomicBool::new(false);

/// Claims the counter and, on AVR targets, programs timer 0 to interrupt
/// once per millisecond. Returns `false` if the counter was already
/// claimed, leaving the running configuration untouched.
pub fn start() -> bool {
    if STARTED.swap(true, Ordering::Relaxed) {
        return false;
    }
    #[cfg(target_arch = "avr")]
    avr::start_timer0();
    true
}

#[cfg(target_arch = "avr")]
mod avr {
    const TCCR0A: *mut u8 = 0x44 as *mut u8;
    const TCCR0B: *mut u8 = 0x45 as *mut u8;
    const OCR0A: *mut u8 = 0x47 as *mut u8;
    const TIMSK0: *mut u8 = 0x6e as *mut u8;

    /// CTC at 16 MHz / 64 / 250 = 1 kHz, compare-match interrupt enabled.
    pub(super) fn start_timer0() {
        unsafe {
            TCCR0A.write_volatile(0x02);
            TCCR0B.write_volatile(0x03);
            OCR0A.write_volatile(249);
            TIMSK0.write_volatile(0x02);
        }
    }
}

/// Advances the counter by one millisecond. Call from the timer interrupt
/// handler, and from nowhere else.
pub fn isr_tick() {
    // The ISR is the only writer, so load/store needs no RMW cycle.
    TICKS.store(TICKS.load(Ordering::Relaxed).wrapping_add(1), Ordering::Relaxed);
}

/// Milliseconds since the timer started, wrapping at 2^32.
pub fn now_ms() -> u32 {
    TICKS.load(Ordering::Relaxed)
}

const fn elapsed_between(now: u32, started_at: u32) -> u32 {
    now.wrapping_sub(started_at)
}

/// Measures elapsed time against the uptime counter.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started_at: u32,
}

impl Stopwatch {
    /// Starts measuring from the current uptime.
    pub fn start() -> Self {
        Self {
            started_at: now_ms(),
        }
    }

    /// Milliseconds elapsed since the start, valid across counter wrap.
    pub fn elapsed_ms(&self) -> u32 {
        elapsed_between(now_ms(), self.started_at)
    }

    /// Restarts the measurement from the current uptime.
    pub fn restart(&mut self) {
        self.started_at = now_ms();
    }
}
