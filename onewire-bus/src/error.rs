/// 1-Wire communication error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneWireError<E> {
    /// Encapsulates the error type of the underlying pin.
    Pin(E),
    /// No device answered the presence-detect cycle.
    NoDevicePresent,
    /// The CRC stored in a ROM code or scratchpad does not match the CRC
    /// computed over the preceding bytes.
    InvalidCrc,
    /// The operation is not implemented, such as the full ROM search.
    Unimplemented,
}

impl<E> From<E> for OneWireError<E> {
    fn from(pin: E) -> Self {
        Self::Pin(pin)
    }
}
