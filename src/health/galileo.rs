//! Galileo signal health and data validity
use bitflags::bitflags;

use crate::{
    health::{Health, SignalHealth},
    signal::Code,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

bitflags! {
    /// Galileo health status (HS, 2 bits) and data validity status (DVS)
    /// per signal, laid out the way RINEX does.
    #[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct GalileoHealth: u16 {
        const E1B_DVS = 0x001;
        const E1B_HS0 = 0x002;
        const E1B_HS1 = 0x004;
        const E5A_DVS = 0x008;
        const E5A_HS0 = 0x010;
        const E5A_HS1 = 0x020;
        const E5B_DVS = 0x040;
        const E5B_HS0 = 0x080;
        const E5B_HS1 = 0x100;
    }
}

impl GalileoHealth {
    /// Builds from the I/NAV word type 5 indications
    pub fn from_inav(e5b_hs: u8, e1b_hs: u8, e5b_dvs: bool, e1b_dvs: bool) -> Self {
        let mut health = Self::empty();
        health.set(Self::E1B_DVS, e1b_dvs);
        health.set(Self::E1B_HS0, e1b_hs & 0x01 != 0);
        health.set(Self::E1B_HS1, e1b_hs & 0x02 != 0);
        health.set(Self::E5B_DVS, e5b_dvs);
        health.set(Self::E5B_HS0, e5b_hs & 0x01 != 0);
        health.set(Self::E5B_HS1, e5b_hs & 0x02 != 0);
        health
    }
    /// Packs the E1-B and E5b indications into the 8-bit
    /// [crate::ephemeris::Ephemeris] health field:
    /// E1-B DVS, E1-B HS (2), E5b DVS, E5b HS (2), LSB first.
    pub fn to_compact(&self) -> u8 {
        let bits = self.bits();
        ((bits & 0x07) | (((bits >> 6) & 0x07) << 3)) as u8
    }
    /// Inverse of [Self::to_compact]
    pub fn from_compact(bits: u8) -> Self {
        let bits = bits as u16;
        Self::from_bits_truncate((bits & 0x07) | (((bits >> 3) & 0x07) << 6))
    }
    fn component(&self, dvs: Self, hs: Self) -> Health {
        Health::from(!self.intersects(dvs | hs))
    }
}

impl SignalHealth for GalileoHealth {
    fn signal_health(&self, code: Code) -> Health {
        match code {
            Code::GalE1B | Code::GalE1C | Code::GalE1X | Code::AuxGal => {
                self.component(Self::E1B_DVS, Self::E1B_HS0 | Self::E1B_HS1)
            },
            Code::GalE5I | Code::GalE5Q | Code::GalE5X => {
                self.component(Self::E5A_DVS, Self::E5A_HS0 | Self::E5A_HS1)
            },
            Code::GalE7I | Code::GalE7Q | Code::GalE7X => {
                self.component(Self::E5B_DVS, Self::E5B_HS0 | Self::E5B_HS1)
            },
            _ => Health::Unknown,
        }
    }
}
