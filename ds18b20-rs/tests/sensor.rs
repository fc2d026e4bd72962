//! Exercises the driver against a scripted bus that records every byte the
//! driver puts on the wire.

use std::collections::VecDeque;
use std::convert::Infallible;

use ds18b20::{Ds18b20, Ds18b20Error, Resolution, Temperature};
use embedded_hal::delay::DelayNs;
use onewire_bus::{Crc8, OneWireBus, OneWireError, OneWireResult};

#[derive(Default)]
struct FakeBus {
    present: bool,
    read_bits: VecDeque<bool>,
    read_bytes: VecDeque<u8>,
    written_bytes: Vec<u8>,
    written_bits: Vec<bool>,
    resets: usize,
}

impl FakeBus {
    fn with_device() -> Self {
        Self {
            present: true,
            ..Self::default()
        }
    }

    fn queue_bytes(&mut self, bytes: &[u8]) {
        self.read_bytes.extend(bytes);
    }

    fn queue_bits(&mut self, bits: &[bool]) {
        self.read_bits.extend(bits);
    }
}

impl OneWireBus for FakeBus {
    type BusError = Infallible;

    fn detect_presence(&mut self) -> OneWireResult<bool, Infallible> {
        self.resets += 1;
        Ok(self.present)
    }

    fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Infallible> {
        self.written_bits.push(bit);
        Ok(())
    }

    fn read_bit(&mut self) -> OneWireResult<bool, Infallible> {
        // An idle line reads high.
        Ok(self.read_bits.pop_front().unwrap_or(true))
    }

    // Byte transfer is scripted directly so tests can queue whole frames.
    fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Infallible> {
        self.written_bytes.push(byte);
        Ok(())
    }

    fn read_byte(&mut self) -> OneWireResult<u8, Infallible> {
        Ok(self.read_bytes.pop_front().unwrap_or(0xff))
    }
}

struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

fn scratchpad(temp: i16, th: i8, tl: i8, config: u8) -> [u8; 9] {
    let [lsb, msb] = temp.to_le_bytes();
    let mut data = [lsb, msb, th as u8, tl as u8, config, 0xff, 0x0c, 0x10, 0x00];
    data[8] = Crc8::of(&data[..8]);
    data
}

#[test]
fn full_measurement_at_twelve_bits() {
    let mut bus = FakeBus::with_device();
    // Two busy polls, then ready.
    bus.queue_bits(&[false, false, true]);
    bus.queue_bytes(&scratchpad(0x0191, 75, 70, 0x7f));

    let sensor = Ds18b20::new();
    let temp = sensor.read_temperature(&mut bus, &mut NoDelay).unwrap();
    assert_eq!(temp, Temperature::from_bits(0x0191)); // 25.0625 degrees

    // Broadcast convert, broadcast scratchpad read.
    assert_eq!(bus.written_bytes, [0xcc, 0x44, 0xcc, 0xbe]);
    // One reset per command plus the one terminating the scratchpad read.
    assert_eq!(bus.resets, 3);
}

#[test]
fn negative_readings_keep_their_sign() {
    let mut bus = FakeBus::with_device();
    bus.queue_bytes(&scratchpad(-162, 75, 70, 0x7f));

    let pad = Ds18b20::new().read_scratchpad(&mut bus).unwrap();
    assert_eq!(pad.raw_temperature(), -162);
    assert_eq!(pad.temperature(), Temperature::from_bits(-162)); // -10.125
}

#[test]
fn low_resolution_masks_the_undefined_bits() {
    let mut bus = FakeBus::with_device();
    // Raw 0x0191 with the 9-bit config: the low three bits are undefined.
    bus.queue_bytes(&scratchpad(0x0191, 75, 70, 0x1f));

    let pad = Ds18b20::new().read_scratchpad(&mut bus).unwrap();
    assert_eq!(pad.resolution(), Resolution::Bits9);
    assert_eq!(pad.temperature(), Temperature::from_bits(0x0190)); // 25.0
}

#[test]
fn corrupted_scratchpad_is_rejected() {
    let mut bus = FakeBus::with_device();
    let mut data = scratchpad(0x0191, 75, 70, 0x7f);
    data[1] ^= 0x40;
    bus.queue_bytes(&data);

    assert_eq!(
        Ds18b20::new().read_scratchpad(&mut bus),
        Err(OneWireError::InvalidCrc)
    );
}

#[test]
fn rom_addressing_selects_one_sensor() {
    let rom = [0x28, 0x6e, 0x38, 0xdd, 0x06, 0x00, 0x00, 0x39];
    let mut bus = FakeBus::with_device();

    let sensor = Ds18b20::new().with_rom(rom);
    sensor.start_conversion(&mut bus).unwrap();

    let mut expected = vec![0x55];
    expected.extend(rom);
    expected.push(0x44);
    assert_eq!(bus.written_bytes, expected);
}

#[test]
fn empty_bus_reports_no_device() {
    let mut bus = FakeBus::default();
    assert_eq!(
        Ds18b20::new().start_conversion(&mut bus),
        Err(OneWireError::NoDevicePresent)
    );
}

#[test]
fn alarm_thresholds_are_written_high_then_low() {
    let mut bus = FakeBus::with_device();
    let mut sensor = Ds18b20::new().with_resolution(Resolution::Bits10);
    sensor.set_alarms(&mut bus, 18, 29).unwrap();

    assert_eq!(bus.written_bytes, [0xcc, 0x4e, 29, 18, 0x3f]);
}

#[test]
fn inverted_or_out_of_span_alarms_are_rejected() {
    let mut bus = FakeBus::with_device();
    let mut sensor = Ds18b20::new();

    assert_eq!(
        sensor.set_alarms(&mut bus, 30, 20),
        Err(Ds18b20Error::AlarmOutOfRange)
    );
    assert_eq!(
        sensor.set_alarms(&mut bus, -60, 20),
        Err(Ds18b20Error::AlarmOutOfRange)
    );
    // Nothing reached the wire.
    assert!(bus.written_bytes.is_empty());
    assert_eq!(bus.resets, 0);
}

#[test]
fn alarm_search_reports_a_flagged_sensor() {
    let mut bus = FakeBus::with_device();
    // A responder whose first ROM bit is 0: bit then complement.
    bus.queue_bits(&[false, true]);

    assert_eq!(Ds18b20::new().check_alarm(&mut bus), Ok(true));
    assert_eq!(bus.written_bytes, [0xec]);
    // The master echoes the ROM bit to keep the responder selected.
    assert_eq!(bus.written_bits, [false]);
}

#[test]
fn quiet_alarm_search_reports_none() {
    let mut bus = FakeBus::with_device();
    bus.queue_bits(&[true, true]);

    assert_eq!(Ds18b20::new().check_alarm(&mut bus), Ok(false));
    assert!(bus.written_bits.is_empty());
}
