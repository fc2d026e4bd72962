#![no_std]
#![deny(missing_docs)]
//! # lcd1602
//! A no-std driver for HD44780-compatible 16x2 character displays wired
//! behind a PCF8574 TWI port expander.
//!
//! The expander exposes eight pins: the controller's four-bit data bus on
//! the high nibble, and register-select, enable and backlight control on
//! the low nibble. Every byte for the controller therefore crosses the bus
//! as two expander frames, high nibble first, each clocked in by pulsing
//! the enable line.
//!
//! The controller has no readable status over this wiring, so the driver
//! paces itself with worst-case execution delays from the datasheet
//! instead of polling the busy flag.

use embedded_hal::delay::DelayNs;
use twi_master::{Twi, TwiError, TwiRegisters, TwiResult};

/// Default bus address of a PCF8574 backpack with its address pins open.
pub const LCD1602_ADDRESS: u8 = 0x27;

/// Display rows.
pub const LINES: u8 = 2;
/// Characters per row.
pub const COLUMNS: u8 = 16;

// Expander low-nibble pins.
const COMMAND_MODE: u8 = 0x00;
const DATA_MODE: u8 = 0x01;
const ENABLE: u8 = 0x04;
const BACKLIGHT: u8 = 0x08;

const CMD_CLEAR: u8 = 0x01;
const CMD_HOME: u8 = 0x02;
const CMD_DISPLAY_OFF: u8 = 0x08;
const CMD_DISPLAY_ON: u8 = 0x0c;
const CMD_FUNCTION_4BIT_2LINE: u8 = 0x28;
const CMD_SET_DDRAM: u8 = 0x80;

/// DDRAM address distance between the two rows.
const LINE_OFFSET: u8 = 0x40;

/// Ordinary commands and data writes finish within 39 us.
const EXECUTE_US: u32 = 39;
/// Clear and home walk the whole DDRAM and need 1.53 ms.
const SLOW_EXECUTE_US: u32 = 1530;

/// LCD driver errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lcd1602Error {
    /// A bus transaction failed.
    Twi(TwiError),
    /// A cursor position outside the 16x2 character grid.
    InvalidPosition,
}

impl From<TwiError> for Lcd1602Error {
    fn from(err: TwiError) -> Self {
        Self::Twi(err)
    }
}

/// Result type for LCD operations.
pub type Lcd1602Result<T> = Result<T, Lcd1602Error>;

/// A 16x2 character display behind a PCF8574 expander.
pub struct Lcd1602<D> {
    address: u8,
    delay: D,
    backlight: bool,
}

impl<D: DelayNs> Lcd1602<D> {
    /// Creates a driver for the display at the default expander address,
    /// with the backlight on.
    pub fn new(delay: D) -> Self {
        Self::with_address(delay, LCD1602_ADDRESS)
    }

    /// Creates a driver for a backpack strapped to a non-default address.
    pub fn with_address(delay: D, address: u8) -> Self {
        Self {
            address,
            delay,
            backlight: true,
        }
    }

    /// Releases the delay provider.
    pub fn free(self) -> D {
        self.delay
    }

    fn flags(&self, mode: u8) -> u8 {
        mode | if self.backlight { BACKLIGHT } else { 0 }
    }

    /// Puts the controller into 4-bit, 2-line mode and leaves it cleared
    /// with the display on.
    ///
    /// The controller powers up in 8-bit mode; the datasheet reset
    /// sequence sends the 8-bit function nibble three times with settle
    /// delays before the switch to 4-bit transfers, and works from any
    /// state the controller was left in.
    pub fn init<R: TwiRegisters>(&mut self, twi: &mut Twi<R>) -> Lcd1602Result<()> {
        self.delay.delay_ms(16);
        let result = (|| {
            twi.open(self.address)?;
            self.latch(twi, 0x30 | self.flags(COMMAND_MODE))?;
            self.delay.delay_us(4100);
            self.latch(twi, 0x30 | self.flags(COMMAND_MODE))?;
            self.delay.delay_us(100);
            self.latch(twi, 0x30 | self.flags(COMMAND_MODE))?;
            self.delay.delay_us(100);
            self.latch(twi, 0x20 | self.flags(COMMAND_MODE))
        })();
        twi.close();
        result?;

        self.command(twi, CMD_FUNCTION_4BIT_2LINE)?;
        self.command(twi, CMD_DISPLAY_ON)?;
        self.clear(twi)
    }

    /// Clears the display and returns the cursor to the origin.
    pub fn clear<R: TwiRegisters>(&mut self, twi: &mut Twi<R>) -> Lcd1602Result<()> {
        self.command(twi, CMD_CLEAR)
    }

    /// Returns the cursor to the origin without clearing.
    pub fn home<R: TwiRegisters>(&mut self, twi: &mut Twi<R>) -> Lcd1602Result<()> {
        self.command(twi, CMD_HOME)
    }

    /// Switches the display on or off. DDRAM contents are kept.
    pub fn set_display<R: TwiRegisters>(
        &mut self,
        twi: &mut Twi<R>,
        on: bool,
    ) -> Lcd1602Result<()> {
        self.command(twi, if on { CMD_DISPLAY_ON } else { CMD_DISPLAY_OFF })
    }

    /// Switches the backlight and applies it immediately. The new state
    /// also rides along with every subsequent frame.
    pub fn set_backlight<R: TwiRegisters>(
        &mut self,
        twi: &mut Twi<R>,
        on: bool,
    ) -> Lcd1602Result<()> {
        self.backlight = on;
        let result = (|| {
            twi.open(self.address)?;
            twi.write_byte(self.flags(COMMAND_MODE))
        })();
        twi.close();
        result?;
        Ok(())
    }

    /// Moves the cursor to the given row and column.
    pub fn set_position<R: TwiRegisters>(
        &mut self,
        twi: &mut Twi<R>,
        line: u8,
        column: u8,
    ) -> Lcd1602Result<()> {
        if line >= LINES || column >= COLUMNS {
            return Err(Lcd1602Error::InvalidPosition);
        }
        self.command(twi, CMD_SET_DDRAM | (line * LINE_OFFSET + column))
    }

    /// Writes one character at the cursor. The controller uses an ASCII
    /// superset; bytes pass through untranslated.
    pub fn write_char<R: TwiRegisters>(&mut self, twi: &mut Twi<R>, ch: u8) -> Lcd1602Result<()> {
        self.transmit(twi, ch, DATA_MODE)?;
        self.delay.delay_us(EXECUTE_US);
        Ok(())
    }

    /// Writes a string starting at the cursor. Text longer than the line
    /// runs off the visible area.
    pub fn print<R: TwiRegisters>(&mut self, twi: &mut Twi<R>, text: &str) -> Lcd1602Result<()> {
        for ch in text.bytes() {
            self.write_char(twi, ch)?;
        }
        Ok(())
    }

    fn command<R: TwiRegisters>(&mut self, twi: &mut Twi<R>, cmd: u8) -> Lcd1602Result<()> {
        self.transmit(twi, cmd, COMMAND_MODE)?;
        self.delay.delay_us(match cmd {
            CMD_CLEAR | CMD_HOME => SLOW_EXECUTE_US,
            _ => EXECUTE_US,
        });
        Ok(())
    }

    /// Sends one controller byte as two expander frames, high nibble
    /// first.
    fn transmit<R: TwiRegisters>(&mut self, twi: &mut Twi<R>, byte: u8, mode: u8) -> TwiResult<()> {
        let flags = self.flags(mode);
        let result = (|| {
            twi.open(self.address)?;
            self.latch(twi, (byte & 0xf0) | flags)?;
            self.latch(twi, (byte << 4) | flags)
        })();
        twi.close();
        result
    }

    /// Clocks one frame into the controller by pulsing the enable pin.
    fn latch<R: TwiRegisters>(&mut self, twi: &mut Twi<R>, frame: u8) -> TwiResult<()> {
        twi.write_byte(frame | ENABLE)?;
        self.delay.delay_us(1);
        twi.write_byte(frame & !ENABLE)
    }
}
