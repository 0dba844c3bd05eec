//! GPS legacy navigation health words
use bitflags::bitflags;
use num_traits::FromPrimitive;

use crate::{health::Health, signal::Code};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Accuracy value [m] for each URA index
pub const URA_VALUES: [f64; 16] = [
    2.0, 2.8, 4.0, 5.7, 8.0, 11.3, 16.0, 32.0, 64.0, 128.0, 256.0, 512.0, 1024.0, 2048.0, 4096.0,
    6144.0,
];

/// Accuracy is not known
pub(crate) const INVALID_URA: f64 = -1.0;

/// Converts a URA index to metres. Returns a negative (invalid)
/// accuracy for indices out of the table.
pub fn decode_ura_index(index: u8) -> f64 {
    URA_VALUES
        .get(index as usize)
        .copied()
        .unwrap_or(INVALID_URA)
}

/// Converts an accuracy [m] to the smallest URA index covering it.
/// Negative, non finite or excessive accuracies have no index.
pub fn encode_ura(ura: f64) -> Option<u8> {
    if !(ura >= 0.0) {
        return None;
    }
    URA_VALUES
        .iter()
        .position(|value| *value >= ura)
        .map(|index| index as u8)
}

/// NAV data health indication (3 MSBs of the 8-bit health words)
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NavDataHealth {
    AllDataOk = 0,
    ParityError = 1,
    TlmHowError = 2,
    ZCountError = 3,
    Subframes123Error = 4,
    Subframes45Error = 5,
    UploadedDataError = 6,
    AllDataError = 7,
}

bitflags! {
    /// Set of [NavDataHealth] indications to disregard
    #[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct NavDhiMask: u8 {
        const PARITY = 0x02;
        const TLM_HOW = 0x04;
        const ZCOUNT = 0x08;
        const SUBFRAMES_123 = 0x10;
        const SUBFRAMES_45 = 0x20;
        const UPLOADED_DATA = 0x40;
        const ALL_DATA = 0x80;
    }
}

/// Signal component health (5 LSBs of the health words)
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ComponentHealth {
    AllSignalsOk = 0,
    AllSignalsWeak = 1,
    AllSignalsDead = 2,
    AllSignalsNoData = 3,
    L1PWeak = 4,
    L1PDead = 5,
    L1PNoData = 6,
    L2PWeak = 7,
    L2PDead = 8,
    L2PNoData = 9,
    L1CWeak = 10,
    L1CDead = 11,
    L1CNoData = 12,
    L2CWeak = 13,
    L2CDead = 14,
    L2CNoData = 15,
    L1L2PWeak = 16,
    L1L2PDead = 17,
    L1L2PNoData = 18,
    L1L2CWeak = 19,
    L1L2CDead = 20,
    L1L2CNoData = 21,
    L1Weak = 22,
    L1Dead = 23,
    L1NoData = 24,
    L2Weak = 25,
    L2Dead = 26,
    L2NoData = 27,
    TemporarilyOut = 28,
    WillBeTemporarilyOut = 29,
    OnlyUraValid = 30,
    MultipleProblems = 31,
}

impl ComponentHealth {
    /// Interprets the 5 LSBs of a health word
    pub fn from_bits(health_bits: u8) -> Self {
        Self::from_u8(health_bits & 0x1f).unwrap_or(Self::MultipleProblems)
    }
    /// Problems affecting every signal
    fn is_general_issue(&self) -> bool {
        matches!(
            self,
            Self::AllSignalsWeak
                | Self::AllSignalsDead
                | Self::AllSignalsNoData
                | Self::TemporarilyOut
                | Self::WillBeTemporarilyOut
                | Self::OnlyUraValid
                | Self::MultipleProblems
        )
    }
    fn affects_l1c(&self) -> bool {
        matches!(
            self,
            Self::L1CWeak
                | Self::L1CDead
                | Self::L1CNoData
                | Self::L1L2CWeak
                | Self::L1L2CDead
                | Self::L1L2CNoData
                | Self::L1Weak
                | Self::L1Dead
                | Self::L1NoData
        )
    }
    fn affects_l2c(&self) -> bool {
        matches!(
            self,
            Self::L2CWeak
                | Self::L2CDead
                | Self::L2CNoData
                | Self::L1L2CWeak
                | Self::L1L2CDead
                | Self::L1L2CNoData
                | Self::L2Weak
                | Self::L2Dead
                | Self::L2NoData
        )
    }
    fn affects_l1p(&self) -> bool {
        matches!(
            self,
            Self::L1PWeak
                | Self::L1PDead
                | Self::L1PNoData
                | Self::L1L2PWeak
                | Self::L1L2PDead
                | Self::L1L2PNoData
                | Self::L1Weak
                | Self::L1Dead
                | Self::L1NoData
        )
    }
    fn affects_l2p(&self) -> bool {
        matches!(
            self,
            Self::L2PWeak
                | Self::L2PDead
                | Self::L2PNoData
                | Self::L1L2PWeak
                | Self::L1L2PDead
                | Self::L1L2PNoData
                | Self::L2Weak
                | Self::L2Dead
                | Self::L2NoData
        )
    }
}

/// NAV data health summary bit (MSB of the 6-bit word): 0 means all NAV data OK
fn nav_data_summary_ok(health_bits: u8) -> bool {
    (health_bits >> 5) & 0x01 == 0
}

/// Arbitrates a 6-bit health word (summary bit + 5 signal component bits)
/// for given GPS signal. The summary bit only applies to L1 C/A and L1 P(Y).
/// L5 health is not interpreted and reported as [Health::Unknown]
/// unless a general issue is indicated.
pub fn six_bit_health(health_bits: u8, code: Code) -> Health {
    let summary_applies = matches!(code, Code::GpsL1CA | Code::AuxGps | Code::GpsL1P);
    if summary_applies && !nav_data_summary_ok(health_bits) {
        return Health::Unhealthy;
    }

    let component = ComponentHealth::from_bits(health_bits);
    if component.is_general_issue() {
        return Health::Unhealthy;
    }

    match code {
        Code::GpsL1CA | Code::AuxGps => Health::from(!component.affects_l1c()),
        Code::GpsL2CM | Code::GpsL2CL | Code::GpsL2CX => Health::from(!component.affects_l2c()),
        Code::GpsL1P => Health::from(!component.affects_l1p()),
        Code::GpsL2P => Health::from(!component.affects_l2p()),
        _ => Health::Unknown,
    }
}

/// True unless the 6-bit health word declares `code` unhealthy
pub fn check_6bit_health_word(health_bits: u8, code: Code) -> bool {
    six_bit_health(health_bits, code).is_usable()
}

/// True if the NAV data health indication (3 MSBs) reports no error,
/// or an error that is part of `ignored`.
pub fn check_nav_dhi(health_bits: u8, ignored: NavDhiMask) -> bool {
    let dhi = (health_bits >> 5) & 0x07;
    if dhi == NavDataHealth::AllDataOk as u8 {
        return true;
    }
    ignored.bits() & (1 << dhi) != 0
}

/// Arbitrates an 8-bit health word: NAV data health indication first,
/// then the 6-bit rule.
pub fn check_8bit_health_word(health_bits: u8, code: Code) -> bool {
    if !check_nav_dhi(health_bits, NavDhiMask::empty()) {
        return false;
    }
    check_6bit_health_word(health_bits, code)
}

/// Arbitrates a 6-bit health word from the almanac page 25:
/// summary set along with all signal bits set means unusable.
pub fn check_page25_health_word(health_bits: u8, code: Code) -> bool {
    let component = ComponentHealth::from_bits(health_bits);
    if !nav_data_summary_ok(health_bits) && component == ComponentHealth::MultipleProblems {
        return false;
    }
    check_6bit_health_word(health_bits, code)
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn six_bit_words() {
        for (bits, code, healthy) in [
            (0x00, Code::GpsL1CA, true),
            (0x00, Code::GpsL2CM, true),
            (0x2B, Code::GpsL1CA, false),
            (0x2B, Code::GpsL2CM, true),
            (0x0B, Code::GpsL1CA, false),
            (0x0B, Code::GpsL2CM, true),
            (0x2E, Code::GpsL1CA, false),
            (0x2E, Code::GpsL2CM, false),
            (0x0E, Code::GpsL1CA, true),
            (0x0E, Code::GpsL2CM, false),
            (0x04, Code::GpsL1P, false),
            (0x07, Code::GpsL2P, false),
            (0x20, Code::GpsL1P, false),
            (0x01, Code::GpsL2P, false),
            (0x00, Code::GpsL5I, true),
            (0x01, Code::GpsL5X, false),
            (0x1c, Code::GpsL2CL, false),
        ] {
            assert_eq!(
                check_6bit_health_word(bits, code),
                healthy,
                "health word 0x{:02x} for {}",
                bits,
                code
            );
        }
        assert_eq!(six_bit_health(0x00, Code::GpsL5Q), Health::Unknown);
        assert_eq!(six_bit_health(0x00, Code::GpsL1CA), Health::Healthy);
    }
    #[test]
    fn nav_data_health() {
        // parity error
        assert!(!check_nav_dhi(0x20, NavDhiMask::empty()));
        assert!(check_nav_dhi(0x20, NavDhiMask::PARITY));
        // TLM/HOW error, masked
        assert!(check_nav_dhi(0x40, NavDhiMask::TLM_HOW | NavDhiMask::ZCOUNT));
        // all data bad
        assert!(!check_nav_dhi(0xe0, NavDhiMask::TLM_HOW | NavDhiMask::ZCOUNT));
        assert!(check_nav_dhi(0x1f, NavDhiMask::empty()));

        assert!(check_8bit_health_word(0x00, Code::GpsL1CA));
        assert!(!check_8bit_health_word(0x60, Code::GpsL2CM));
        assert!(!check_8bit_health_word(0x0b, Code::GpsL1CA));
    }
    #[test]
    fn almanac_page25() {
        assert!(!check_page25_health_word(0x3f, Code::GpsL2CM));
        assert!(!check_page25_health_word(0x3f, Code::GpsL1CA));
        assert!(check_page25_health_word(0x0e, Code::GpsL1CA));
        assert!(!check_page25_health_word(0x1f, Code::GpsL2CM));
    }
    #[test]
    fn user_range_accuracy() {
        for (ura, index) in [
            (0.0, Some(0)),
            (2.0, Some(0)),
            (2.5, Some(1)),
            (6144.0, Some(15)),
            (6144.5, None),
            (-1.0, None),
            (f64::NAN, None),
        ] {
            assert_eq!(encode_ura(ura), index, "encode_ura({})", ura);
        }
        assert_eq!(decode_ura_index(0), 2.0);
        assert_eq!(decode_ura_index(15), 6144.0);
        assert_eq!(decode_ura_index(16), INVALID_URA);
    }
}
