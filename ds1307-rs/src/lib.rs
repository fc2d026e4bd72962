#![no_std]
#![deny(missing_docs)]
//! # ds1307
//! A no-std driver for the DS1307 real-time clock.
//!
//! The device keeps time in seven BCD registers. The driver mirrors them in
//! a [Ds1307] value: the setters validate and update the mirror only, and
//! [transfer](Ds1307::transfer) / [update](Ds1307::update) move the whole
//! block to and from the device in one TWI transaction, so the calendar is
//! never written half-updated across a register boundary.
//!
//! Hours are kept in whichever of the device's two formats is selected with
//! [set_mode](Ds1307::set_mode): 24-hour, or 12-hour with an AM/PM flag.

use twi_master::{Twi, TwiError, TwiRegisters};

/// The device's fixed 7-bit bus address.
pub const DS1307_ADDRESS: u8 = 0x68;

const SECONDS_REG: u8 = 0x00;
const CONTROL_REG: u8 = 0x07;

/// Bit 7 of the seconds register stops the oscillator while set.
const CLOCK_HALT_BIT: u8 = 0x80;
/// Bit 6 of the hours register selects 12-hour format.
const MODE_12H_BIT: u8 = 0x40;
/// In 12-hour format, bit 5 of the hours register flags PM.
const PM_BIT: u8 = 0x20;

/// DS1307 driver errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ds1307Error {
    /// A bus transaction failed.
    Twi(TwiError),
    /// A calendar or time field was out of range, such as February 30th.
    InvalidDateTime,
}

impl From<TwiError> for Ds1307Error {
    fn from(err: TwiError) -> Self {
        Self::Twi(err)
    }
}

/// Result type for DS1307 operations.
pub type Ds1307Result<T> = Result<T, Ds1307Error>;

/// The hour format the device is keeping time in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HourMode {
    /// Hours 0 through 23.
    H24,
    /// Hours 1 through 12 with an AM/PM flag.
    H12,
}

/// AM/PM flag for 12-hour mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meridiem {
    /// Midnight to noon.
    Am,
    /// Noon to midnight.
    Pm,
}

/// Square-wave output modes of the SQW/OUT pin, as control register values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SquareWave {
    /// Output held low.
    Off = 0x00,
    /// 1 Hz.
    Hz1 = 0x10,
    /// 4.096 kHz.
    Khz4 = 0x11,
    /// 8.192 kHz.
    Khz8 = 0x12,
    /// 32.768 kHz.
    Khz32 = 0x13,
}

const fn dec2bcd(dec: u8) -> u8 {
    ((dec / 10) << 4) | (dec % 10)
}

const fn bcd2dec(bcd: u8) -> u8 {
    (bcd >> 4) * 10 + (bcd & 0x0f)
}

const fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

const fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// A DS1307 real-time clock, mirroring the device's calendar registers.
///
/// The mirror starts at 2000-01-01 00:00:00 in 24-hour mode; call
/// [update](Ds1307::update) to load the device's actual state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ds1307 {
    year: u16,
    month: u8,
    day: u8,
    weekday: u8,
    hour: u8,
    minute: u8,
    second: u8,
    mode: HourMode,
    meridiem: Meridiem,
    halted: bool,
}

impl Default for Ds1307 {
    fn default() -> Self {
        Self::new()
    }
}

impl Ds1307 {
    /// Creates a driver mirror at 2000-01-01 00:00:00, a Saturday.
    pub const fn new() -> Self {
        Self {
            year: 2000,
            month: 1,
            day: 1,
            weekday: 7,
            hour: 0,
            minute: 0,
            second: 0,
            mode: HourMode::H24,
            meridiem: Meridiem::Am,
            halted: false,
        }
    }

    /// The calendar year, 2000 through 2099.
    pub const fn year(&self) -> u16 {
        self.year
    }

    /// The calendar month, 1 through 12.
    pub const fn month(&self) -> u8 {
        self.month
    }

    /// The day of the month.
    pub const fn day(&self) -> u8 {
        self.day
    }

    /// The day of the week, 1 through 7. The device only increments it at
    /// midnight; which day is 1 is up to the application.
    pub const fn weekday(&self) -> u8 {
        self.weekday
    }

    /// The hour, in the currently selected [HourMode].
    pub const fn hour(&self) -> u8 {
        self.hour
    }

    /// The minute.
    pub const fn minute(&self) -> u8 {
        self.minute
    }

    /// The second.
    pub const fn second(&self) -> u8 {
        self.second
    }

    /// The AM/PM flag. Meaningful in 12-hour mode only.
    pub const fn meridiem(&self) -> Meridiem {
        self.meridiem
    }

    /// The currently selected hour format.
    pub const fn mode(&self) -> HourMode {
        self.mode
    }

    /// Whether the oscillator was halted as of the last
    /// [update](Ds1307::update).
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    /// Switches the mirrored hour between the device's two formats,
    /// converting the current value. Takes effect on the device at the
    /// next [transfer](Ds1307::transfer).
    pub fn set_mode(&mut self, mode: HourMode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        match mode {
            HourMode::H12 => {
                self.meridiem = if self.hour < 12 {
                    Meridiem::Am
                } else {
                    Meridiem::Pm
                };
                self.hour = match self.hour % 12 {
                    0 => 12,
                    h => h,
                };
            }
            HourMode::H24 => {
                let h = self.hour % 12;
                self.hour = match self.meridiem {
                    Meridiem::Am => h,
                    Meridiem::Pm => h + 12,
                };
            }
        }
    }

    /// Sets the mirrored time of day in 24-hour format, switching the
    /// mirror to that mode.
    pub fn set_24hms(&mut self, hour: u8, minute: u8, second: u8) -> Ds1307Result<()> {
        if hour > 23 || minute > 59 || second > 59 {
            return Err(Ds1307Error::InvalidDateTime);
        }
        self.mode = HourMode::H24;
        self.hour = hour;
        self.minute = minute;
        self.second = second;
        Ok(())
    }

    /// Sets the mirrored time of day in 12-hour format, switching the
    /// mirror to that mode.
    pub fn set_12hms(
        &mut self,
        hour: u8,
        minute: u8,
        second: u8,
        meridiem: Meridiem,
    ) -> Ds1307Result<()> {
        if hour == 0 || hour > 12 || minute > 59 || second > 59 {
            return Err(Ds1307Error::InvalidDateTime);
        }
        self.mode = HourMode::H12;
        self.hour = hour;
        self.minute = minute;
        self.second = second;
        self.meridiem = meridiem;
        Ok(())
    }

    /// Sets the mirrored calendar date. The year must lie within the
    /// device's 2000 through 2099 century and the day must exist in the
    /// given month, leap years included.
    pub fn set_ymd(&mut self, year: u16, month: u8, day: u8) -> Ds1307Result<()> {
        if !(2000..=2099).contains(&year)
            || !(1..=12).contains(&month)
            || day == 0
            || day > days_in_month(year, month)
        {
            return Err(Ds1307Error::InvalidDateTime);
        }
        self.year = year;
        self.month = month;
        self.day = day;
        Ok(())
    }

    /// Sets the mirrored day of the week, 1 through 7.
    pub fn set_dow(&mut self, weekday: u8) -> Ds1307Result<()> {
        if !(1..=7).contains(&weekday) {
            return Err(Ds1307Error::InvalidDateTime);
        }
        self.weekday = weekday;
        Ok(())
    }

    /// Encodes the mirror into the device's seven calendar registers.
    fn encode_registers(&self) -> [u8; 7] {
        let seconds = dec2bcd(self.second) | if self.halted { CLOCK_HALT_BIT } else { 0 };
        let hours = match self.mode {
            HourMode::H24 => dec2bcd(self.hour),
            HourMode::H12 => {
                let pm = match self.meridiem {
                    Meridiem::Am => 0,
                    Meridiem::Pm => PM_BIT,
                };
                dec2bcd(self.hour) | MODE_12H_BIT | pm
            }
        };
        [
            seconds,
            dec2bcd(self.minute),
            hours,
            self.weekday,
            dec2bcd(self.day),
            dec2bcd(self.month),
            dec2bcd((self.year - 2000) as u8),
        ]
    }

    /// Decodes the device's seven calendar registers into the mirror.
    fn decode_registers(&mut self, regs: &[u8; 7]) {
        self.halted = regs[0] & CLOCK_HALT_BIT != 0;
        self.second = bcd2dec(regs[0] & 0x7f);
        self.minute = bcd2dec(regs[1]);
        if regs[2] & MODE_12H_BIT != 0 {
            self.mode = HourMode::H12;
            self.hour = bcd2dec(regs[2] & 0x1f);
            self.meridiem = if regs[2] & PM_BIT != 0 {
                Meridiem::Pm
            } else {
                Meridiem::Am
            };
        } else {
            self.mode = HourMode::H24;
            self.hour = bcd2dec(regs[2] & 0x3f);
        }
        self.weekday = regs[3];
        self.day = bcd2dec(regs[4]);
        self.month = bcd2dec(regs[5]);
        self.year = 2000 + bcd2dec(regs[6]) as u16;
    }

    /// Writes the whole mirrored calendar to the device in one
    /// transaction.
    pub fn transfer<R: TwiRegisters>(&self, twi: &mut Twi<R>) -> Ds1307Result<()> {
        let result = (|| {
            twi.open(DS1307_ADDRESS)?;
            twi.write_byte(SECONDS_REG)?;
            twi.write(&self.encode_registers())
        })();
        twi.close();
        result.map_err(Ds1307Error::Twi)
    }

    /// Reads the whole calendar from the device into the mirror in one
    /// transaction. The mirror is untouched on failure.
    pub fn update<R: TwiRegisters>(&mut self, twi: &mut Twi<R>) -> Ds1307Result<()> {
        let mut regs = [0u8; 7];
        let result = (|| {
            twi.open(DS1307_ADDRESS)?;
            twi.read_registers(SECONDS_REG, &mut regs)
        })();
        twi.close();
        result.map_err(Ds1307Error::Twi)?;
        self.decode_registers(&regs);
        Ok(())
    }

    /// Stops the oscillator. The calendar registers hold their values and
    /// timekeeping resumes from them on [start](Ds1307::start).
    pub fn halt<R: TwiRegisters>(&mut self, twi: &mut Twi<R>) -> Ds1307Result<()> {
        self.set_clock_halt(twi, true)
    }

    /// Restarts a halted oscillator.
    pub fn start<R: TwiRegisters>(&mut self, twi: &mut Twi<R>) -> Ds1307Result<()> {
        self.set_clock_halt(twi, false)
    }

    /// Read-modify-write of the clock-halt bit, preserving the seconds
    /// count the device is carrying.
    fn set_clock_halt<R: TwiRegisters>(&mut self, twi: &mut Twi<R>, halt: bool) -> Ds1307Result<()> {
        let result = (|| {
            twi.open(DS1307_ADDRESS)?;
            twi.read_register(SECONDS_REG)
        })();
        twi.close();
        let seconds = result.map_err(Ds1307Error::Twi)?;

        let seconds = if halt {
            seconds | CLOCK_HALT_BIT
        } else {
            seconds & !CLOCK_HALT_BIT
        };
        let result = (|| {
            twi.open(DS1307_ADDRESS)?;
            twi.write(&[SECONDS_REG, seconds])
        })();
        twi.close();
        result.map_err(Ds1307Error::Twi)?;
        self.halted = halt;
        Ok(())
    }

    /// Programs the SQW/OUT pin mode.
    pub fn set_square_wave<R: TwiRegisters>(
        &self,
        twi: &mut Twi<R>,
        mode: SquareWave,
    ) -> Ds1307Result<()> {
        let result = (|| {
            twi.open(DS1307_ADDRESS)?;
            twi.write(&[CONTROL_REG, mode as u8])
        })();
        twi.close();
        result.map_err(Ds1307Error::Twi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bcd_round_trips_every_register_value() {
        for dec in 0..100 {
            assert_eq!(bcd2dec(dec2bcd(dec)), dec);
        }
        assert_eq!(dec2bcd(59), 0x59);
        assert_eq!(bcd2dec(0x12), 12);
    }

    #[test]
    fn century_leap_years() {
        assert!(is_leap_year(2000));
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(2023));
        assert!(!is_leap_year(2100));
    }

    #[test]
    fn date_validation_tracks_the_month_length() {
        let mut rtc = Ds1307::new();
        rtc.set_ymd(2024, 2, 29).unwrap();
        assert_eq!(rtc.set_ymd(2023, 2, 29), Err(Ds1307Error::InvalidDateTime));
        assert_eq!(rtc.set_ymd(2024, 4, 31), Err(Ds1307Error::InvalidDateTime));
        assert_eq!(rtc.set_ymd(2024, 0, 1), Err(Ds1307Error::InvalidDateTime));
        assert_eq!(rtc.set_ymd(1999, 12, 31), Err(Ds1307Error::InvalidDateTime));
    }

    #[test]
    fn time_validation_depends_on_the_mode() {
        let mut rtc = Ds1307::new();
        rtc.set_24hms(23, 59, 59).unwrap();
        assert_eq!(rtc.set_24hms(24, 0, 0), Err(Ds1307Error::InvalidDateTime));

        rtc.set_12hms(12, 0, 0, Meridiem::Am).unwrap();
        assert_eq!(
            rtc.set_12hms(0, 0, 0, Meridiem::Am),
            Err(Ds1307Error::InvalidDateTime)
        );
        assert_eq!(
            rtc.set_12hms(13, 0, 0, Meridiem::Pm),
            Err(Ds1307Error::InvalidDateTime)
        );
    }

    #[test]
    fn mode_switch_converts_the_hour() {
        let mut rtc = Ds1307::new();
        rtc.set_24hms(0, 15, 0).unwrap();
        rtc.set_mode(HourMode::H12);
        assert_eq!(rtc.hour(), 12);
        assert_eq!(rtc.meridiem(), Meridiem::Am);

        rtc.set_24hms(17, 30, 0).unwrap();
        rtc.set_mode(HourMode::H12);
        assert_eq!(rtc.hour(), 5);
        assert_eq!(rtc.meridiem(), Meridiem::Pm);

        rtc.set_mode(HourMode::H24);
        assert_eq!(rtc.hour(), 17);

        rtc.set_12hms(12, 0, 0, Meridiem::Pm).unwrap();
        rtc.set_mode(HourMode::H24);
        assert_eq!(rtc.hour(), 12);
    }

    #[test]
    fn registers_encode_in_device_order() {
        let mut rtc = Ds1307::new();
        rtc.set_ymd(2026, 8, 23).unwrap();
        rtc.set_dow(1).unwrap();
        rtc.set_24hms(17, 30, 59).unwrap();
        assert_eq!(
            rtc.encode_registers(),
            [0x59, 0x30, 0x17, 0x01, 0x23, 0x08, 0x26]
        );
    }

    #[test]
    fn twelve_hour_encoding_carries_the_mode_and_pm_bits() {
        let mut rtc = Ds1307::new();
        rtc.set_12hms(11, 0, 0, Meridiem::Pm).unwrap();
        // 0x40 mode bit, 0x20 PM bit, BCD 11.
        assert_eq!(rtc.encode_registers()[2], 0x71);

        rtc.set_12hms(11, 0, 0, Meridiem::Am).unwrap();
        assert_eq!(rtc.encode_registers()[2], 0x51);
    }

    #[test]
    fn decoding_recovers_mode_and_halt_state() {
        let mut rtc = Ds1307::new();
        rtc.decode_registers(&[0x80 | 0x42, 0x05, 0x40 | 0x20 | 0x12, 0x03, 0x29, 0x02, 0x24]);
        assert!(rtc.is_halted());
        assert_eq!(rtc.second(), 42);
        assert_eq!(rtc.minute(), 5);
        assert_eq!(rtc.mode(), HourMode::H12);
        assert_eq!(rtc.hour(), 12);
        assert_eq!(rtc.meridiem(), Meridiem::Pm);
        assert_eq!(rtc.weekday(), 3);
        assert_eq!((rtc.year(), rtc.month(), rtc.day()), (2024, 2, 29));
    }

    #[test]
    fn decoding_a_24_hour_device_masks_the_format_bits() {
        let mut rtc = Ds1307::new();
        rtc.decode_registers(&[0x00, 0x00, 0x23, 0x01, 0x01, 0x01, 0x00]);
        assert_eq!(rtc.mode(), HourMode::H24);
        assert_eq!(rtc.hour(), 23);
        assert!(!rtc.is_halted());
    }
}
