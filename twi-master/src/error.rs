use crate::TwiStatus;

/// TWI transaction errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwiError {
    /// The module has not been enabled.
    NotEnabled,
    /// The hardware reported a different status than the transaction phase
    /// expected. The bus is left mid-transaction; the caller must close.
    UnexpectedStatus {
        /// The status code this phase requires to proceed.
        expected: TwiStatus,
        /// The masked status code the hardware reported instead.
        found: u8,
    },
    /// The completion flag never rose within the configured retry limit.
    RetriesExceeded,
}

/// Result type for TWI operations.
pub type TwiResult<T> = Result<T, TwiError>;
