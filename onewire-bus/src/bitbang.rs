use crate::{OneWireBus, OneWireResult};
use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

// Standard-speed timing windows, in microseconds. The asymmetric write
// slots are the timing contract of the protocol: a slave samples the line
// roughly 30 us into a slot, so a short low pulse reads as 1 and a long
// one as 0. Changing any of these risks misinterpretation by the slave.
const RESET_LOW_US: u32 = 480;
const PRESENCE_SAMPLE_US: u32 = 60;
const RESET_RECOVERY_US: u32 = 420;
const WRITE_ONE_LOW_US: u32 = 1;
const WRITE_ONE_HIGH_US: u32 = 64;
const WRITE_ZERO_LOW_US: u32 = 60;
const WRITE_ZERO_HIGH_US: u32 = 5;
const READ_INIT_US: u32 = 1;
const READ_SAMPLE_US: u32 = 14;
const READ_RECOVERY_US: u32 = 45;

/// A software-timed 1-Wire master over a single open-drain GPIO pin.
///
/// The pin must be configured open-drain with a pull-up on the line:
/// driving it low pulls the bus down, driving it high releases the bus to
/// the pull-up so slaves can answer. The line is sampled through
/// [`InputPin`] while released.
///
/// All operations block and busy-wait through `delay`; the microsecond
/// windows only hold if the delay source is accurate at that scale and
/// interrupts do not stretch a slot.
pub struct SoftOneWire<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> SoftOneWire<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// Creates a master on `pin`, releasing the line.
    pub fn new(mut pin: P, delay: D) -> Result<Self, P::Error> {
        pin.set_high()?;
        Ok(Self { pin, delay })
    }

    /// Releases the pin and delay source.
    pub fn free(self) -> (P, D) {
        (self.pin, self.delay)
    }

    fn pull_low(&mut self) -> Result<(), P::Error> {
        self.pin.set_low()
    }

    fn release(&mut self) -> Result<(), P::Error> {
        self.pin.set_high()
    }
}

impl<P, D> OneWireBus for SoftOneWire<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    type BusError = P::Error;

    fn detect_presence(&mut self) -> OneWireResult<bool, Self::BusError> {
        // Reset pulse, then sample: a slave answers by pulling the line
        // low within 60 us of the release.
        self.pull_low()?;
        self.delay.delay_us(RESET_LOW_US);
        self.release()?;
        self.delay.delay_us(PRESENCE_SAMPLE_US);

        let presence = self.pin.is_low()?;

        // Pad out the cycle so it takes the same time either way.
        self.delay.delay_us(RESET_RECOVERY_US);
        Ok(presence)
    }

    fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Self::BusError> {
        if bit {
            self.pull_low()?;
            self.delay.delay_us(WRITE_ONE_LOW_US);
            self.release()?;
            self.delay.delay_us(WRITE_ONE_HIGH_US);
        } else {
            self.pull_low()?;
            self.delay.delay_us(WRITE_ZERO_LOW_US);
            self.release()?;
            self.delay.delay_us(WRITE_ZERO_HIGH_US);
        }
        Ok(())
    }

    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError> {
        // A read slot starts like a write-one; the slave holds the line
        // low past the 15 us sample point to transmit a 0.
        self.pull_low()?;
        self.delay.delay_us(READ_INIT_US);
        self.release()?;
        self.delay.delay_us(READ_SAMPLE_US);

        let bit = self.pin.is_high()?;

        self.delay.delay_us(READ_RECOVERY_US);
        Ok(bit)
    }
}
