use thiserror::Error;

use crate::{ephemeris::EphemerisStatus, prelude::Constellation};

/// Errors that may rise when decoding navigation messages
/// or calculating satellite states.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum Error {
    /// Bounded stream does not hold enough bits
    #[error("not enough bits available")]
    NotEnoughBits,
    /// Field width exceeds the 64-bit capacity
    #[error("invalid field width: {0} bits")]
    InvalidFieldWidth(usize),
    /// GLONASS string failed the error detection
    #[error("uncorrectable navigation string")]
    UncorrectableString,
    /// Message tag does not match the decoder being used
    #[error("unexpected message type {found} (expecting {expected})")]
    UnexpectedMessageType { expected: u8, found: u8 },
    /// Decoded quantity outside its published physical bounds
    #[error("{0} out of range")]
    OutOfRange(&'static str),
    /// Issue of data mismatch between subframes / pages
    #[error("issue of data mismatch")]
    IssueOfDataMismatch,
    /// GPS LNAV word parity check failure
    #[error("word parity error")]
    ParityError,
    /// SBAS message CRC failure
    #[error("checksum mismatch")]
    ChecksumMismatch,
    /// Signal code number is not known
    #[error("unknown signal code {0}")]
    UnknownCode(u8),
    /// Satellite number does not exist for this code
    #[error("invalid satellite number {0}")]
    InvalidSatellite(u16),
    /// Record is not usable at the requested time
    #[error("unusable ephemeris: {0}")]
    UnusableEphemeris(EphemerisStatus),
    /// Kepler equation solver did not converge
    #[error("kepler solver did not converge")]
    KeplerNonConvergence,
    /// Constellation is not supported by this operation
    #[error("{0} not supported")]
    UnsupportedConstellation(Constellation),
    /// Record variant does not match its signal identifier
    #[error("ephemeris data does not match the constellation")]
    ConstellationMismatch,
    /// No group delay defined for this signal
    #[error("no group delay for this signal")]
    NoGroupDelay,
    /// GLONASS frequency channel is unknown
    #[error("unknown frequency channel")]
    UnknownFrequencyChannel,
    /// GLONASS orbital slot outside 1..=28
    #[error("invalid orbital slot {0}")]
    InvalidSlot(u16),
    /// GLONASS frequency channel outside 1..=14
    #[error("invalid frequency channel {0}")]
    InvalidFrequencyChannel(u16),
    /// Illegal time description
    #[error("invalid time")]
    InvalidTime,
}
