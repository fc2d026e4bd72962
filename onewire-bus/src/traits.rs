use crate::{
    Crc8, ONEWIRE_ALARM_SEARCH_CMD, ONEWIRE_MATCH_ROM_CMD, ONEWIRE_READ_ROM_CMD,
    ONEWIRE_SKIP_ROM_CMD, OneWireError, OneWireResult,
};

/// Trait for a 1-Wire bus master.
///
/// An implementation supplies the electrical layer: the presence-detect
/// cycle and single-bit transfer slots. Byte transfer, ROM addressing and
/// the alarm search are provided on top of those as default methods, so
/// they behave identically for every implementation.
pub trait OneWireBus {
    /// The error type of the underlying hardware.
    type BusError;

    /// Resets the bus and listens for a presence pulse.
    ///
    /// Returns `true` if at least one slave answered the reset pulse.
    /// The cycle occupies a fixed time window regardless of the outcome,
    /// so callers may treat it as constant-time.
    fn detect_presence(&mut self) -> OneWireResult<bool, Self::BusError>;

    /// Writes a single bit in one time slot.
    fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Self::BusError>;

    /// Reads a single bit in one time slot.
    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError>;

    /// Writes one byte, least-significant bit first.
    fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Self::BusError> {
        let mut mask: u8 = 0x01;
        while mask > 0 {
            self.write_bit(byte & mask != 0)?;
            mask <<= 1;
        }
        Ok(())
    }

    /// Reads one byte, least-significant bit first.
    fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError> {
        let mut byte: u8 = 0;
        let mut mask: u8 = 0x01;
        while mask > 0 {
            if self.read_bit()? {
                byte |= mask;
            }
            mask <<= 1;
        }
        Ok(byte)
    }

    /// Polls a slave performing a long-running operation, such as a
    /// temperature conversion. A busy slave holds the line low during read
    /// slots, so this is the complement of [read_bit](OneWireBus::read_bit).
    fn is_busy(&mut self) -> OneWireResult<bool, Self::BusError> {
        Ok(!self.read_bit()?)
    }

    /// Reads the ROM code of the only slave on the bus and verifies its CRC.
    ///
    /// Fails with [`OneWireError::NoDevicePresent`] if nothing answers the
    /// reset pulse, and with [`OneWireError::InvalidCrc`] if the stored CRC
    /// does not match the one computed over the first seven bytes; nothing
    /// is returned to the caller in either case.
    ///
    /// Never issue this with more than one slave on the bus: all slaves
    /// respond simultaneously and corrupt each other's signal.
    fn read_rom(&mut self) -> OneWireResult<[u8; 8], Self::BusError> {
        if !self.detect_presence()? {
            return Err(OneWireError::NoDevicePresent);
        }
        self.write_byte(ONEWIRE_READ_ROM_CMD)?;
        let mut rom = [0u8; 8];
        for byte in rom.iter_mut() {
            *byte = self.read_byte()?;
        }
        if !Crc8::validate(&rom) {
            return Err(OneWireError::InvalidCrc);
        }
        Ok(rom)
    }

    /// Selects exactly one slave by its ROM code.
    ///
    /// All slaves that do not match ignore subsequent commands until the
    /// next reset pulse.
    fn match_rom(&mut self, rom: &[u8; 8]) -> OneWireResult<(), Self::BusError> {
        self.write_byte(ONEWIRE_MATCH_ROM_CMD)?;
        for &byte in rom {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    /// Addresses every slave on the bus at once without sending a ROM code.
    ///
    /// Only safe for commands that are harmless when broadcast, such as a
    /// conversion trigger. A read may only follow this on a single-slave bus.
    fn skip_rom(&mut self) -> OneWireResult<(), Self::BusError> {
        self.write_byte(ONEWIRE_SKIP_ROM_CMD)
    }

    /// Checks whether a slave has its alarm flag set.
    ///
    /// Issues a reset, sends the alarm search command and reads two
    /// response bits. If the line stays high for both (1,1), no slave
    /// responded and the result is `Ok(false)`. Otherwise a slave is
    /// answering with the first bit of its ROM code and its complement;
    /// the master writes the first bit back to keep that slave selected
    /// and returns `Ok(true)`.
    ///
    /// This is not a full bit-level tree search: it keeps a single slave
    /// selected only when at most one device can respond with a given ROM
    /// prefix, which holds for a bus populated with one device family.
    /// With several simultaneously alarmed devices of differing prefixes
    /// the selection is undefined.
    fn alarm_search(&mut self) -> OneWireResult<bool, Self::BusError> {
        if !self.detect_presence()? {
            return Err(OneWireError::NoDevicePresent);
        }
        self.write_byte(ONEWIRE_ALARM_SEARCH_CMD)?;

        let first = self.read_bit()?;
        let second = self.read_bit()?;
        // Equal bits means the line was never pulled low: nothing answered.
        // (0,0) cannot occur with a single responding device.
        if first == second {
            return Ok(false);
        }
        self.write_bit(first)?;
        Ok(true)
    }

    /// Full multi-device ROM discovery. Unsupported; always returns
    /// [`OneWireError::Unimplemented`].
    fn search_rom(&mut self) -> OneWireResult<(), Self::BusError> {
        Err(OneWireError::Unimplemented)
    }
}
