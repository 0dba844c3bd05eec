//! Navigation message decoders.
//!
//! Every decoder reads the raw bits through a bounded [BitStream]
//! and validates the decoded quantities before touching the
//! ephemeris it produces or updates.
use crate::{bits, stream::BitStream};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod beidou;
pub mod galileo;
pub mod glonass;
pub mod gps;
pub mod sbas;

/// Where an ephemeris was decoded from
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NavSource {
    /// GPS or QZSS legacy navigation message
    GpsLnav,
    /// GLONASS FDMA navigation strings
    GloFdma,
    /// Galileo I/NAV
    GalInav,
    /// BeiDou D1
    BdsD1,
    /// SBAS message type 9
    SbasL1,
    /// Provided by an external source (assistance data, files...)
    #[default]
    External,
}

impl std::fmt::Display for NavSource {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::GpsLnav => write!(f, "LNAV"),
            Self::GloFdma => write!(f, "GLO-FDMA"),
            Self::GalInav => write!(f, "I/NAV"),
            Self::BdsD1 => write!(f, "D1"),
            Self::SbasL1 => write!(f, "SBAS-L1"),
            Self::External => write!(f, "external"),
        }
    }
}

/// Word width of GPS LNAV and BeiDou D1 messages
pub(crate) const WORD_BITS: usize = 30;

/// Packs up to ten 30-bit words (right aligned) into a bounded stream,
/// first word first.
pub(crate) fn word_stream<const N: usize>(words: &[u32; N]) -> BitStream<[u8; 38]> {
    let mut buf = [0_u8; 38];
    let count = N.min(10);
    for (index, word) in words.iter().take(count).enumerate() {
        bits::set_unsigned(&mut buf, index * WORD_BITS, WORD_BITS, (*word & 0x3fff_ffff) as u64);
    }
    BitStream::new(buf, count * WORD_BITS)
}

/// Reads an unsigned field split in two chunks at absolute positions.
/// The cursor is left where it was.
pub(crate) fn split_unsigned<B: AsRef<[u8]>>(
    stream: &mut BitStream<B>,
    (pos1, len1): (usize, usize),
    (pos2, len2): (usize, usize),
) -> Result<u64, crate::prelude::Error> {
    let origin = stream.offset();
    stream.seek(pos1)?;
    let value = stream.read_unsigned_split(len1, pos2 - pos1 - len1, len2);
    stream.seek(origin)?;
    value
}

/// Reads a two's complement field split in two chunks at absolute positions
pub(crate) fn split_signed<B: AsRef<[u8]>>(
    stream: &mut BitStream<B>,
    (pos1, len1): (usize, usize),
    (pos2, len2): (usize, usize),
) -> Result<i64, crate::prelude::Error> {
    let origin = stream.offset();
    stream.seek(pos1)?;
    let value = stream.read_signed_split(len1, pos2 - pos1 - len1, len2);
    stream.seek(origin)?;
    value
}
