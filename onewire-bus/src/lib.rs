#![no_std]
#![deny(missing_docs)]
//! # onewire-bus
//! A no-std 1-Wire bus master for microcontrollers without a dedicated
//! 1-Wire peripheral.
//!
//! The [OneWireBus] trait defines the operations of the protocol: presence
//! detection, bit and byte transfer, ROM addressing and the alarm search.
//! The byte-level and ROM-level operations are provided as default methods
//! built from the bit-level primitives, so an implementation only has to
//! supply the electrical layer.
//!
//! [SoftOneWire] is the bundled implementation: it bit-bangs the protocol
//! over a single open-drain GPIO pin using software-timed delays.

mod bitbang;
mod crc;
mod error;
mod traits;
pub use bitbang::SoftOneWire;
pub use crc::Crc8;
pub use error::OneWireError;
pub use traits::OneWireBus;

/// Result type for 1-Wire operations.
pub type OneWireResult<T, E> = Result<T, OneWireError<E>>;

/// Command to read the ROM code of the only slave on the bus.
///
/// This command can only be used when there is one slave on the bus. If it
/// is issued with more than one slave present, a data collision occurs when
/// all the slaves attempt to respond at the same time.
pub const ONEWIRE_READ_ROM_CMD: u8 = 0x33;

/// Command to address a specific slave by its 64-bit ROM code.
///
/// Only the slave that exactly matches the ROM code sequence following this
/// command responds to the subsequent function command; all other slaves
/// wait for the next reset pulse.
pub const ONEWIRE_MATCH_ROM_CMD: u8 = 0x55;

/// Command to address all slaves on the bus simultaneously.
///
/// Useful for broadcast actions such as starting a temperature conversion
/// on every sensor at once. A read command may only follow this if there is
/// a single slave on the bus.
pub const ONEWIRE_SKIP_ROM_CMD: u8 = 0xcc;

/// Command to search for devices on the 1-Wire bus.
pub const ONEWIRE_SEARCH_ROM_CMD: u8 = 0xf0;

/// Command to search for devices in alarm state on the 1-Wire bus.
///
/// Identical to the ROM search except that only slaves with a set alarm
/// flag respond. After every alarm search cycle the master must start over
/// with a reset pulse.
pub const ONEWIRE_ALARM_SEARCH_CMD: u8 = 0xec;
