use bitfield_struct::bitfield;

/// Control register of an AVR-style TWI module (TWCR).
///
/// Writing this register drives the hardware state machine: setting
/// [interrupt](TwiControl::interrupt) clears the completion flag and starts
/// the next bus action, while [start](TwiControl::start) and
/// [stop](TwiControl::stop) request the corresponding bus conditions.
#[bitfield(u8)]
pub struct TwiControl {
    /// TWIE: raise an interrupt request when the completion flag sets.
    pub interrupt_enable: bool,
    #[bits(1)]
    reserved: u8,
    /// TWEN: enable the TWI module and take over the bus pins.
    pub enable: bool,
    /// TWWC: write collision flag (read-only in hardware).
    pub write_collision: bool,
    /// TWSTO: generate a stop condition.
    pub stop: bool,
    /// TWSTA: generate a (repeated) start condition.
    pub start: bool,
    /// TWEA: answer the next received byte with ACK instead of NACK.
    pub ack: bool,
    /// TWINT: completion flag. Set by hardware when a bus action finishes;
    /// cleared by writing a 1, which starts the next action.
    pub interrupt: bool,
}

/// Status codes reported by the hardware after each transaction phase, as
/// read from the status register with the prescaler bits masked off.
/// Master-transmitter and master-receiver modes only; this driver never
/// acts as a slave and does not arbitrate against other masters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TwiStatus {
    /// A start condition has been transmitted.
    Start = 0x08,
    /// A repeated start condition has been transmitted.
    RepeatedStart = 0x10,
    /// SLA+W has been transmitted and ACK received.
    AddressWriteAck = 0x18,
    /// A data byte has been transmitted and ACK received.
    DataWriteAck = 0x28,
    /// SLA+R has been transmitted and ACK received.
    AddressReadAck = 0x40,
    /// A data byte has been received and ACK returned.
    DataReadAck = 0x50,
    /// A data byte has been received and NACK returned.
    DataReadNack = 0x58,
}

/// The status register keeps the bit-rate prescaler in its low two bits;
/// they must be masked off before comparing against a status code.
pub const TWI_STATUS_MASK: u8 = 0xfc;

/// Register file of a TWI module.
///
/// This is the hardware seam of the driver: the transaction engine in
/// [`Twi`](crate::Twi) is written entirely against this trait, so it can
/// run over memory-mapped registers on the target or over scripted
/// registers in tests.
pub trait TwiRegisters {
    /// Read the control register.
    fn control(&mut self) -> TwiControl;
    /// Write the control register.
    fn set_control(&mut self, value: TwiControl);
    /// Read the raw status register, including prescaler bits.
    fn status(&mut self) -> u8;
    /// Read the data register.
    fn data(&mut self) -> u8;
    /// Write the data register.
    fn set_data(&mut self, value: u8);
    /// Program the bit-rate divisor.
    fn set_bit_rate(&mut self, divisor: u8);
    /// Switch the internal pull-ups on the bus pins.
    fn set_pullups(&mut self, enabled: bool);
}

#[cfg(target_arch = "avr")]
mod atmega328p {
    use super::{TwiControl, TwiRegisters};

    const TWBR: *mut u8 = 0xb8 as *mut u8;
    const TWSR: *mut u8 = 0xb9 as *mut u8;
    const TWDR: *mut u8 = 0xbb as *mut u8;
    const TWCR: *mut u8 = 0xbc as *mut u8;
    const DDRC: *mut u8 = 0x27 as *mut u8;
    const PORTC: *mut u8 = 0x28 as *mut u8;

    // SDA and SCL sit on port C pins 4 and 5.
    const PIN_MASK: u8 = 0x30;

    /// The TWI register file of an ATmega328P.
    pub struct Atmega328p(());

    impl Atmega328p {
        /// Conjures the register file out of thin air.
        ///
        /// # Safety
        /// There is one TWI module per chip; the caller must ensure at most
        /// one `Atmega328p` value exists in the program.
        pub const unsafe fn steal() -> Self {
            Self(())
        }
    }

    impl TwiRegisters for Atmega328p {
        fn control(&mut self) -> TwiControl {
            TwiControl::from_bits(unsafe { TWCR.read_volatile() })
        }

        fn set_control(&mut self, value: TwiControl) {
            unsafe { TWCR.write_volatile(value.into_bits()) }
        }

        fn status(&mut self) -> u8 {
            unsafe { TWSR.read_volatile() }
        }

        fn data(&mut self) -> u8 {
            unsafe { TWDR.read_volatile() }
        }

        fn set_data(&mut self, value: u8) {
            unsafe { TWDR.write_volatile(value) }
        }

        fn set_bit_rate(&mut self, divisor: u8) {
            unsafe { TWBR.write_volatile(divisor) }
        }

        fn set_pullups(&mut self, enabled: bool) {
            // Pull-up is active with the direction bit clear and the port
            // bit set.
            unsafe {
                DDRC.write_volatile(DDRC.read_volatile() & !PIN_MASK);
                let port = PORTC.read_volatile();
                if enabled {
                    PORTC.write_volatile(port | PIN_MASK);
                } else {
                    PORTC.write_volatile(port & !PIN_MASK);
                }
            }
        }
    }
}

#[cfg(target_arch = "avr")]
pub use atmega328p::Atmega328p;
