#![no_std]
#![deny(missing_docs)]
//! # ds18b20
//! A no-std driver for the DS18B20 1-Wire digital thermometer.
//!
//! The driver is generic over any [OneWireBus] master. A [Ds18b20] value
//! holds the addressing mode and the configuration to program into the
//! device: constructed with [new](Ds18b20::new) it broadcasts over a
//! single-device bus, while [with_rom](Ds18b20::with_rom) pins it to one
//! sensor on a shared bus.
//!
//! Temperatures are fixed-point [`I12F4`] values in degrees Celsius, the
//! device's native format: the 16-bit scratchpad reading is the temperature
//! in units of 1/16 °C.

use embedded_hal::delay::DelayNs;
use fixed::types::I12F4;
use onewire_bus::{OneWireBus, OneWireError, OneWireResult};

/// Temperature in degrees Celsius, in the device's native 1/16 °C steps.
pub type Temperature = I12F4;

/// Family code in the first ROM byte of every DS18B20.
pub const DS18B20_FAMILY_CODE: u8 = 0x28;

const CONVERT_TEMP_CMD: u8 = 0x44;
const READ_SCRATCHPAD_CMD: u8 = 0xbe;
const WRITE_SCRATCHPAD_CMD: u8 = 0x4e;

/// Interval between busy polls while a conversion is running.
const CONVERSION_POLL_MS: u32 = 5;

/// Errors of the DS18B20 driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ds18b20Error<E> {
    /// A bus-level failure.
    Bus(OneWireError<E>),
    /// Alarm thresholds outside the device's measurable span of
    /// -55..=125 °C, or the low threshold above the high one.
    AlarmOutOfRange,
}

impl<E> From<OneWireError<E>> for Ds18b20Error<E> {
    fn from(err: OneWireError<E>) -> Self {
        Self::Bus(err)
    }
}

/// Result type for DS18B20 operations.
pub type Ds18b20Result<T, E> = Result<T, Ds18b20Error<E>>;

/// Measurement resolution, as stored in the scratchpad configuration byte.
///
/// The discriminants are the full configuration byte values: the resolution
/// field occupies bits 5 and 6 and all other bits read as shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Resolution {
    /// 9 bits, 0.5 °C steps.
    Bits9 = 0x1f,
    /// 10 bits, 0.25 °C steps.
    Bits10 = 0x3f,
    /// 11 bits, 0.125 °C steps.
    Bits11 = 0x5f,
    /// 12 bits, 0.0625 °C steps. The power-on default.
    Bits12 = 0x7f,
}

impl Resolution {
    /// Recovers the resolution from a scratchpad configuration byte.
    pub const fn from_config(config: u8) -> Self {
        match (config >> 5) & 0x3 {
            0 => Self::Bits9,
            1 => Self::Bits10,
            2 => Self::Bits11,
            _ => Self::Bits12,
        }
    }

    /// Worst-case conversion time at this resolution, per the datasheet.
    pub const fn max_conversion_time_ms(self) -> u32 {
        match self {
            Self::Bits9 => 94,
            Self::Bits10 => 188,
            Self::Bits11 => 375,
            Self::Bits12 => 750,
        }
    }

    /// Low bits of the raw reading that the device leaves undefined at
    /// this resolution.
    const fn undefined_bits(self) -> i16 {
        match self {
            Self::Bits9 => 0x7,
            Self::Bits10 => 0x3,
            Self::Bits11 => 0x1,
            Self::Bits12 => 0x0,
        }
    }
}

/// The device's 9-byte scratchpad, as returned by a read and already
/// CRC-verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scratchpad(pub [u8; 9]);

impl Scratchpad {
    /// The raw 16-bit temperature reading, in 1/16 °C units.
    pub fn raw_temperature(&self) -> i16 {
        i16::from_le_bytes([self.0[0], self.0[1]])
    }

    /// The high alarm threshold, in whole degrees.
    pub fn alarm_high(&self) -> i8 {
        self.0[2] as i8
    }

    /// The low alarm threshold, in whole degrees.
    pub fn alarm_low(&self) -> i8 {
        self.0[3] as i8
    }

    /// The configured resolution.
    pub fn resolution(&self) -> Resolution {
        Resolution::from_config(self.0[4])
    }

    /// The temperature in degrees Celsius.
    ///
    /// At resolutions below 12 bits the device leaves the lowest fraction
    /// bits of the reading undefined; they are masked off here so a reading
    /// never reports precision the conversion did not have.
    pub fn temperature(&self) -> Temperature {
        let raw = self.raw_temperature() & !self.resolution().undefined_bits();
        Temperature::from_bits(raw)
    }
}

/// A DS18B20 digital thermometer on a 1-Wire bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ds18b20 {
    rom: Option<[u8; 8]>,
    resolution: Resolution,
    alarm_low: i8,
    alarm_high: i8,
}

impl Default for Ds18b20 {
    fn default() -> Self {
        Self::new()
    }
}

impl Ds18b20 {
    /// Creates a driver that addresses the bus with broadcast commands.
    /// Only valid when the sensor is the sole slave on the bus.
    ///
    /// The configuration defaults to 12-bit resolution with the alarm
    /// window wide open.
    pub const fn new() -> Self {
        Self {
            rom: None,
            resolution: Resolution::Bits12,
            alarm_low: -55,
            alarm_high: 125,
        }
    }

    /// Pins the driver to the sensor with the given ROM code, for buses
    /// with more than one slave.
    pub const fn with_rom(mut self, rom: [u8; 8]) -> Self {
        self.rom = Some(rom);
        self
    }

    /// Sets the resolution to program on the next scratchpad write.
    pub const fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// The currently configured resolution.
    pub const fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Resets the bus and selects this sensor, by ROM code if one was
    /// given and by broadcast otherwise.
    fn address<B: OneWireBus>(&self, bus: &mut B) -> OneWireResult<(), B::BusError> {
        if !bus.detect_presence()? {
            return Err(OneWireError::NoDevicePresent);
        }
        match &self.rom {
            Some(rom) => bus.match_rom(rom),
            None => bus.skip_rom(),
        }
    }

    /// Reads the sensor's ROM code. Single-slave buses only.
    pub fn read_rom<B: OneWireBus>(&self, bus: &mut B) -> OneWireResult<[u8; 8], B::BusError> {
        bus.read_rom()
    }

    /// Triggers a temperature conversion without waiting for it.
    ///
    /// The conversion takes up to
    /// [max_conversion_time_ms](Resolution::max_conversion_time_ms); while
    /// it runs the sensor reports busy on read slots.
    pub fn start_conversion<B: OneWireBus>(&self, bus: &mut B) -> OneWireResult<(), B::BusError> {
        self.address(bus)?;
        bus.write_byte(CONVERT_TEMP_CMD)
    }

    /// Runs a full measurement: triggers a conversion, polls until the
    /// sensor reports ready, then reads the result back.
    pub fn read_temperature<B, D>(
        &self,
        bus: &mut B,
        delay: &mut D,
    ) -> OneWireResult<Temperature, B::BusError>
    where
        B: OneWireBus,
        D: DelayNs,
    {
        self.start_conversion(bus)?;
        while bus.is_busy()? {
            delay.delay_ms(CONVERSION_POLL_MS);
        }
        Ok(self.read_scratchpad(bus)?.temperature())
    }

    /// Reads the 9-byte scratchpad and verifies its CRC.
    pub fn read_scratchpad<B: OneWireBus>(
        &self,
        bus: &mut B,
    ) -> OneWireResult<Scratchpad, B::BusError> {
        self.address(bus)?;
        bus.write_byte(READ_SCRATCHPAD_CMD)?;
        let mut data = [0u8; 9];
        for byte in data.iter_mut() {
            *byte = bus.read_byte()?;
        }
        // Reset to stop the sensor from clocking out the scratchpad again.
        bus.detect_presence()?;
        if !onewire_bus::Crc8::validate(&data) {
            return Err(OneWireError::InvalidCrc);
        }
        Ok(Scratchpad(data))
    }

    /// Writes the alarm thresholds and configuration byte to the
    /// scratchpad. Volatile; the device reloads EEPROM values on power-up.
    fn write_scratchpad<B: OneWireBus>(&self, bus: &mut B) -> OneWireResult<(), B::BusError> {
        self.address(bus)?;
        bus.write_byte(WRITE_SCRATCHPAD_CMD)?;
        bus.write_byte(self.alarm_high as u8)?;
        bus.write_byte(self.alarm_low as u8)?;
        bus.write_byte(self.resolution as u8)
    }

    /// Programs a new measurement resolution into the device.
    pub fn set_resolution<B: OneWireBus>(
        &mut self,
        bus: &mut B,
        resolution: Resolution,
    ) -> OneWireResult<(), B::BusError> {
        self.resolution = resolution;
        self.write_scratchpad(bus)
    }

    /// Programs the alarm thresholds, in whole degrees Celsius.
    ///
    /// The sensor raises its alarm flag after a conversion whose result
    /// lies outside `low..=high`. Both thresholds must lie within the
    /// device's -55..=125 °C span and `low` must not exceed `high`.
    pub fn set_alarms<B: OneWireBus>(
        &mut self,
        bus: &mut B,
        low: i8,
        high: i8,
    ) -> Ds18b20Result<(), B::BusError> {
        if low < -55 || high > 125 || low > high {
            return Err(Ds18b20Error::AlarmOutOfRange);
        }
        self.alarm_low = low;
        self.alarm_high = high;
        self.write_scratchpad(bus)?;
        Ok(())
    }

    /// Checks whether this sensor is flagging an alarm, using the bus
    /// alarm search.
    pub fn check_alarm<B: OneWireBus>(&self, bus: &mut B) -> OneWireResult<bool, B::BusError> {
        bus.alarm_search()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_round_trips_through_the_config_byte() {
        for res in [
            Resolution::Bits9,
            Resolution::Bits10,
            Resolution::Bits11,
            Resolution::Bits12,
        ] {
            assert_eq!(Resolution::from_config(res as u8), res);
        }
    }

    #[test]
    fn conversion_time_doubles_per_bit() {
        assert_eq!(Resolution::Bits9.max_conversion_time_ms(), 94);
        assert_eq!(Resolution::Bits12.max_conversion_time_ms(), 750);
    }
}
