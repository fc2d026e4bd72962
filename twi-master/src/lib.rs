#![no_std]
#![deny(missing_docs)]
//! # twi-master
//! A no-std single-master driver for AVR-style TWI (I2C) peripherals.
//!
//! This family of hardware does not bit-bang: the module shifts whole bytes
//! and reports a status code after every phase, so the driver is a small
//! state machine that triggers a phase, busy-waits on the completion flag,
//! and verifies the reported status before moving on. Any mismatch aborts
//! the transaction and is surfaced to the caller, who is responsible for
//! issuing [close](Twi::close) to leave the bus clean.
//!
//! The register file is abstracted behind [TwiRegisters] so the engine can
//! be driven by simulated hardware in tests; on an ATmega328P the
//! `Atmega328p` binding provides the real registers.
//!
//! The driver supports a single master only: no arbitration, no clock
//! stretching, no slave mode.

mod error;
mod registers;
pub use error::{TwiError, TwiResult};
#[cfg(target_arch = "avr")]
pub use registers::Atmega328p;
pub use registers::{TWI_STATUS_MASK, TwiControl, TwiRegisters, TwiStatus};

const CPU_HZ: u32 = 16_000_000;
const BUS_HZ: u32 = 100_000;
/// TWBR value for the standard-mode bus clock: (CPU / bus - 16) / 2.
const BIT_RATE_DIVISOR: u8 = ((CPU_HZ / BUS_HZ - 16) / 2) as u8;

const CTRL_START: TwiControl = TwiControl::new()
    .with_interrupt(true)
    .with_start(true)
    .with_enable(true);
const CTRL_STOP: TwiControl = TwiControl::new()
    .with_interrupt(true)
    .with_stop(true)
    .with_enable(true);
const CTRL_TRANSMIT: TwiControl = TwiControl::new().with_interrupt(true).with_enable(true);
const CTRL_RECEIVE_ACK: TwiControl = TwiControl::new()
    .with_interrupt(true)
    .with_ack(true)
    .with_enable(true);
const CTRL_RECEIVE_NACK: TwiControl = CTRL_TRANSMIT;

/// TWI master transaction engine over a register file `R`.
///
/// A transaction is opened with [open](Twi::open), which retains the slave
/// address so register reads can issue a repeated start without the caller
/// re-specifying it, and is terminated with [close](Twi::close). All
/// operations block until the hardware raises its completion flag; by
/// default the wait is unbounded, matching the hardware's lack of a
/// timeout. Use [with_retry_limit](Twi::with_retry_limit) to bound it.
pub struct Twi<R> {
    regs: R,
    enabled: bool,
    address: u8,
    retry_limit: Option<u32>,
}

impl<R: TwiRegisters> Twi<R> {
    /// Creates a driver over the given register file. The module starts
    /// disabled; call [enable](Twi::enable) before opening a transaction.
    pub fn new(regs: R) -> Self {
        Self {
            regs,
            enabled: false,
            address: 0,
            retry_limit: None,
        }
    }

    /// Bounds every completion-flag busy-wait to `limit` polls, after
    /// which the operation fails with [`TwiError::RetriesExceeded`]. A
    /// slave that never completes a phase would otherwise hang forever.
    pub fn with_retry_limit(mut self, limit: u32) -> Self {
        self.retry_limit = Some(limit);
        self
    }

    /// Releases the register file.
    pub fn free(self) -> R {
        self.regs
    }

    /// Configures and enables the module: bus pull-ups, bit rate, module
    /// enable. Does nothing if already enabled.
    pub fn enable(&mut self) {
        if self.enabled {
            return;
        }
        self.enabled = true;

        self.regs.set_pullups(true);
        self.regs.set_bit_rate(BIT_RATE_DIVISOR);

        let control = self.regs.control();
        self.regs.set_control(
            control
                .with_ack(true)
                .with_enable(true)
                .with_interrupt_enable(true),
        );
    }

    /// Disables the module and releases the bus pull-ups. Does nothing if
    /// already disabled.
    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        self.enabled = false;

        let control = self.regs.control();
        self.regs.set_control(
            control
                .with_ack(false)
                .with_enable(false)
                .with_interrupt_enable(false),
        );
        self.regs.set_pullups(false);
    }

    /// Whether the module is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Opens a write transaction to the slave at the given 7-bit address:
    /// start condition, then SLA+W. The address is retained for the
    /// repeated start of a subsequent register read.
    pub fn open(&mut self, address: u8) -> TwiResult<()> {
        if !self.enabled {
            return Err(TwiError::NotEnabled);
        }
        self.address = address;

        self.step(CTRL_START, TwiStatus::Start)?;

        self.regs.set_data(address << 1);
        self.step(CTRL_TRANSMIT, TwiStatus::AddressWriteAck)?;
        Ok(())
    }

    /// Terminates the transaction with a stop condition. Callable from any
    /// state, including after a failed phase, to leave the bus clean; the
    /// hardware clears the stop bit itself, so there is nothing to wait on.
    pub fn close(&mut self) {
        self.regs.set_control(CTRL_STOP);
    }

    /// Transmits one data byte and verifies the slave's ACK. The
    /// transaction stays open for further writes.
    pub fn write_byte(&mut self, data: u8) -> TwiResult<()> {
        self.regs.set_data(data);
        self.step(CTRL_TRANSMIT, TwiStatus::DataWriteAck)
    }

    /// Transmits a run of data bytes, failing on the first missing ACK.
    pub fn write(&mut self, data: &[u8]) -> TwiResult<()> {
        for &byte in data {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    /// Reads one byte from a slave register: register select, repeated
    /// start, SLA+R, then a single NACK-terminated receive cycle.
    pub fn read_register(&mut self, reg: u8) -> TwiResult<u8> {
        self.select_register(reg)?;
        self.step(CTRL_RECEIVE_NACK, TwiStatus::DataReadNack)?;
        Ok(self.regs.data())
    }

    /// Reads `buf.len()` bytes starting at a slave register. The slave's
    /// register pointer auto-increments, so this is one select followed by
    /// n-1 ACK-terminated receive cycles and one final NACK-terminated
    /// cycle that tells the slave to stop driving data.
    pub fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> TwiResult<()> {
        let Some(last) = buf.len().checked_sub(1) else {
            return Ok(());
        };
        self.select_register(reg)?;

        for byte in &mut buf[..last] {
            self.step(CTRL_RECEIVE_ACK, TwiStatus::DataReadAck)?;
            *byte = self.regs.data();
        }
        self.step(CTRL_RECEIVE_NACK, TwiStatus::DataReadNack)?;
        buf[last] = self.regs.data();
        Ok(())
    }

    /// Tells the slave which register to read, then switches the bus to
    /// read direction: register byte, repeated start, SLA+R.
    fn select_register(&mut self, reg: u8) -> TwiResult<()> {
        self.regs.set_data(reg);
        self.step(CTRL_TRANSMIT, TwiStatus::DataWriteAck)?;

        self.step(CTRL_START, TwiStatus::RepeatedStart)?;

        self.regs.set_data((self.address << 1) | 0x01);
        self.step(CTRL_TRANSMIT, TwiStatus::AddressReadAck)?;
        Ok(())
    }

    /// Triggers one bus phase and verifies the status code it completes
    /// with. On mismatch the transaction is dead; the engine does not
    /// auto-recover.
    fn step(&mut self, control: TwiControl, expected: TwiStatus) -> TwiResult<()> {
        self.regs.set_control(control);
        self.wait()?;

        let found = self.regs.status() & TWI_STATUS_MASK;
        if found != expected as u8 {
            return Err(TwiError::UnexpectedStatus { expected, found });
        }
        Ok(())
    }

    /// Spins on the completion flag.
    fn wait(&mut self) -> TwiResult<()> {
        let mut tries: u32 = 0;
        loop {
            if self.regs.control().interrupt() {
                return Ok(());
            }
            if let Some(limit) = self.retry_limit {
                tries += 1;
                if tries > limit {
                    return Err(TwiError::RetriesExceeded);
                }
            }
        }
    }
}
