//! Signal identification
use crate::{
    constants::Carrier,
    prelude::{Constellation, Error, SV},
};

use num_traits::FromPrimitive;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// GLONASS frequency channels are stored as 1..=14,
/// which maps to the broadcast FCN -7..=+6
pub(crate) const GLO_FCN_OFFSET: i32 = 8;

/// Signal [Code]s, numbered the way receivers report them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, FromPrimitive, ToPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Code {
    /// GPS L1 C/A
    GpsL1CA = 0,
    /// GPS L2C (M)
    GpsL2CM = 1,
    /// SBAS L1
    SbasL1CA = 2,
    /// GLONASS L1 open FDMA
    GloL1OF = 3,
    /// GLONASS L2 open FDMA
    GloL2OF = 4,
    /// GPS L1 P(Y)
    GpsL1P = 5,
    /// GPS L2 P(Y)
    GpsL2P = 6,
    GpsL2CL = 7,
    GpsL2CX = 8,
    /// GPS L5
    GpsL5I = 9,
    GpsL5Q = 10,
    GpsL5X = 11,
    /// BeiDou-2 B1I
    Bds2B1 = 12,
    /// BeiDou-2 B2I
    Bds2B2 = 13,
    /// Galileo E1
    GalE1B = 14,
    GalE1C = 15,
    GalE1X = 16,
    /// Galileo E6
    GalE6B = 17,
    GalE6C = 18,
    GalE6X = 19,
    /// Galileo E5b
    GalE7I = 20,
    GalE7Q = 21,
    GalE7X = 22,
    /// Galileo E5 AltBOC
    GalE8I = 23,
    GalE8Q = 24,
    GalE8X = 25,
    /// Galileo E5a
    GalE5I = 26,
    GalE5Q = 27,
    GalE5X = 28,
    /// GLONASS L1 precise (encrypted)
    GloL1P = 29,
    /// GLONASS L2 precise (encrypted)
    GloL2P = 30,
    /// QZSS L1 C/A
    QzsL1CA = 31,
    /// QZSS L1C
    QzsL1CI = 32,
    QzsL1CQ = 33,
    QzsL1CX = 34,
    /// QZSS L2C
    QzsL2CM = 35,
    QzsL2CL = 36,
    QzsL2CX = 37,
    /// QZSS L5
    QzsL5I = 38,
    QzsL5Q = 39,
    QzsL5X = 40,
    /// SBAS L5
    SbasL5I = 41,
    SbasL5Q = 42,
    SbasL5X = 43,
    /// BeiDou-3 B1C
    Bds3B1CI = 44,
    Bds3B1CQ = 45,
    Bds3B1CX = 46,
    /// BeiDou-3 B2a
    Bds3B5I = 47,
    Bds3B5Q = 48,
    Bds3B5X = 49,
    /// BeiDou-3 B2b
    Bds3B7I = 50,
    Bds3B7Q = 51,
    Bds3B7X = 52,
    /// BeiDou-3 B3I
    Bds3B3I = 53,
    Bds3B3Q = 54,
    Bds3B3X = 55,
    /// GPS L1C
    GpsL1CI = 56,
    GpsL1CQ = 57,
    GpsL1CX = 58,
    /// Auxiliary antenna signals
    AuxGps = 59,
    AuxSbas = 60,
    AuxGal = 61,
    AuxQzs = 62,
    AuxBds = 63,
}

/// Number of defined [Code]s
pub const CODE_COUNT: u8 = 64;

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            Self::GpsL1CA => "GPS L1CA",
            Self::GpsL2CM => "GPS L2CM",
            Self::GpsL2CL => "GPS L2CL",
            Self::GpsL2CX => "GPS L2C",
            Self::GpsL1P => "GPS L1P",
            Self::GpsL2P => "GPS L2P",
            Self::GpsL5I => "GPS L5I",
            Self::GpsL5Q => "GPS L5Q",
            Self::GpsL5X => "GPS L5",
            Self::GpsL1CI => "GPS L1CI",
            Self::GpsL1CQ => "GPS L1CQ",
            Self::GpsL1CX => "GPS L1C",
            Self::AuxGps => "GPS AUX",
            Self::SbasL1CA => "SBAS L1",
            Self::SbasL5I => "SBAS L5I",
            Self::SbasL5Q => "SBAS L5Q",
            Self::SbasL5X => "SBAS L5",
            Self::AuxSbas => "SBAS AUX",
            Self::GloL1OF => "GLO L1OF",
            Self::GloL2OF => "GLO L2OF",
            Self::GloL1P => "GLO L1P",
            Self::GloL2P => "GLO L2P",
            Self::Bds2B1 => "BDS B1",
            Self::Bds2B2 => "BDS B2",
            Self::Bds3B1CI => "BDS3 B1CI",
            Self::Bds3B1CQ => "BDS3 B1CQ",
            Self::Bds3B1CX => "BDS3 B1C",
            Self::Bds3B5I => "BDS3 B5I",
            Self::Bds3B5Q => "BDS3 B5Q",
            Self::Bds3B5X => "BDS3 B5",
            Self::Bds3B7I => "BDS3 B7I",
            Self::Bds3B7Q => "BDS3 B7Q",
            Self::Bds3B7X => "BDS3 B7",
            Self::Bds3B3I => "BDS3 B3I",
            Self::Bds3B3Q => "BDS3 B3Q",
            Self::Bds3B3X => "BDS3 B3",
            Self::AuxBds => "BDS AUX",
            Self::GalE1B => "GAL E1B",
            Self::GalE1C => "GAL E1C",
            Self::GalE1X => "GAL E1",
            Self::GalE6B => "GAL E6B",
            Self::GalE6C => "GAL E6C",
            Self::GalE6X => "GAL E6",
            Self::GalE7I => "GAL E5bI",
            Self::GalE7Q => "GAL E5bQ",
            Self::GalE7X => "GAL E5b",
            Self::GalE8I => "GAL E8I",
            Self::GalE8Q => "GAL E8Q",
            Self::GalE8X => "GAL E8",
            Self::GalE5I => "GAL E5aI",
            Self::GalE5Q => "GAL E5aQ",
            Self::GalE5X => "GAL E5a",
            Self::AuxGal => "GAL AUX",
            Self::QzsL1CA => "QZS L1CA",
            Self::QzsL1CI => "QZS L1CI",
            Self::QzsL1CQ => "QZS L1CQ",
            Self::QzsL1CX => "QZS L1C",
            Self::QzsL2CM => "QZS L2CM",
            Self::QzsL2CL => "QZS L2CL",
            Self::QzsL2CX => "QZS L2C",
            Self::QzsL5I => "QZS L5I",
            Self::QzsL5Q => "QZS L5Q",
            Self::QzsL5X => "QZS L5",
            Self::AuxQzs => "QZS AUX",
        };
        f.write_str(s)
    }
}

impl TryFrom<u8> for Code {
    type Error = Error;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_u8(value).ok_or(Error::UnknownCode(value))
    }
}

impl Code {
    /// Returns the [Constellation] this [Code] belongs to.
    /// All augmentation systems are reported as [Constellation::SBAS].
    pub fn constellation(&self) -> Constellation {
        match self {
            Self::GpsL1CA
            | Self::GpsL2CM
            | Self::GpsL2CL
            | Self::GpsL2CX
            | Self::GpsL1P
            | Self::GpsL2P
            | Self::GpsL5I
            | Self::GpsL5Q
            | Self::GpsL5X
            | Self::GpsL1CI
            | Self::GpsL1CQ
            | Self::GpsL1CX
            | Self::AuxGps => Constellation::GPS,
            Self::SbasL1CA | Self::SbasL5I | Self::SbasL5Q | Self::SbasL5X | Self::AuxSbas => {
                Constellation::SBAS
            },
            Self::GloL1OF | Self::GloL2OF | Self::GloL1P | Self::GloL2P => Constellation::Glonass,
            Self::Bds2B1
            | Self::Bds2B2
            | Self::Bds3B1CI
            | Self::Bds3B1CQ
            | Self::Bds3B1CX
            | Self::Bds3B5I
            | Self::Bds3B5Q
            | Self::Bds3B5X
            | Self::Bds3B7I
            | Self::Bds3B7Q
            | Self::Bds3B7X
            | Self::Bds3B3I
            | Self::Bds3B3Q
            | Self::Bds3B3X
            | Self::AuxBds => Constellation::BeiDou,
            Self::GalE1B
            | Self::GalE1C
            | Self::GalE1X
            | Self::GalE6B
            | Self::GalE6C
            | Self::GalE6X
            | Self::GalE7I
            | Self::GalE7Q
            | Self::GalE7X
            | Self::GalE8I
            | Self::GalE8Q
            | Self::GalE8X
            | Self::GalE5I
            | Self::GalE5Q
            | Self::GalE5X
            | Self::AuxGal => Constellation::Galileo,
            Self::QzsL1CA
            | Self::QzsL1CI
            | Self::QzsL1CQ
            | Self::QzsL1CX
            | Self::QzsL2CM
            | Self::QzsL2CL
            | Self::QzsL2CX
            | Self::QzsL5I
            | Self::QzsL5Q
            | Self::QzsL5X
            | Self::AuxQzs => Constellation::QZSS,
        }
    }
    /// True for GPS L5 codes
    pub fn is_gps_l5(&self) -> bool {
        matches!(self, Self::GpsL5I | Self::GpsL5Q | Self::GpsL5X)
    }
    /// True for QZSS L5 codes
    pub fn is_qzss_l5(&self) -> bool {
        matches!(self, Self::QzsL5I | Self::QzsL5Q | Self::QzsL5X)
    }
    /// True for GLONASS FDMA codes on L1
    pub(crate) fn is_glonass_l1(&self) -> bool {
        matches!(self, Self::GloL1OF | Self::GloL1P)
    }
    /// True for GLONASS FDMA codes on L2
    pub(crate) fn is_glonass_l2(&self) -> bool {
        matches!(self, Self::GloL2OF | Self::GloL2P)
    }
    /// Nominal carrier frequency [Hz].
    /// GLONASS FDMA codes return the channel 0 frequency.
    pub fn carrier_frequency(&self) -> f64 {
        match self {
            Self::GpsL1CA | Self::GpsL1P | Self::GpsL1CI | Self::GpsL1CQ | Self::GpsL1CX => {
                Carrier::GPS_L1
            },
            Self::AuxGps => Carrier::GPS_L1,
            Self::GpsL2CM | Self::GpsL2CL | Self::GpsL2CX | Self::GpsL2P => Carrier::GPS_L2,
            Self::GpsL5I | Self::GpsL5Q | Self::GpsL5X => Carrier::GPS_L5,
            Self::SbasL1CA | Self::AuxSbas => Carrier::SBAS_L1,
            Self::SbasL5I | Self::SbasL5Q | Self::SbasL5X => Carrier::SBAS_L5,
            Self::GloL1OF | Self::GloL1P => Carrier::GLO_L1,
            Self::GloL2OF | Self::GloL2P => Carrier::GLO_L2,
            Self::Bds2B1 | Self::AuxBds => Carrier::BDS2_B1,
            Self::Bds2B2 => Carrier::BDS2_B2,
            Self::Bds3B1CI | Self::Bds3B1CQ | Self::Bds3B1CX => Carrier::BDS3_B1C,
            Self::Bds3B5I | Self::Bds3B5Q | Self::Bds3B5X => Carrier::BDS3_B5,
            Self::Bds3B7I | Self::Bds3B7Q | Self::Bds3B7X => Carrier::BDS3_B7,
            Self::Bds3B3I | Self::Bds3B3Q | Self::Bds3B3X => Carrier::BDS3_B3,
            Self::GalE1B | Self::GalE1C | Self::GalE1X | Self::AuxGal => Carrier::GAL_E1,
            Self::GalE6B | Self::GalE6C | Self::GalE6X => Carrier::GAL_E6,
            Self::GalE7I | Self::GalE7Q | Self::GalE7X => Carrier::GAL_E7,
            Self::GalE8I | Self::GalE8Q | Self::GalE8X => Carrier::GAL_E8,
            Self::GalE5I | Self::GalE5Q | Self::GalE5X => Carrier::GAL_E5,
            Self::QzsL1CA | Self::QzsL1CI | Self::QzsL1CQ | Self::QzsL1CX | Self::AuxQzs => {
                Carrier::QZS_L1
            },
            Self::QzsL2CM | Self::QzsL2CL | Self::QzsL2CX => Carrier::QZS_L2,
            Self::QzsL5I | Self::QzsL5Q | Self::QzsL5X => Carrier::QZS_L5,
        }
    }
}

/// First satellite number and number of satellites, per constellation
pub(crate) fn satellite_range(constellation: Constellation) -> Option<(u16, u16)> {
    match constellation {
        Constellation::GPS => Some((1, 32)),
        Constellation::Glonass => Some((1, 28)),
        Constellation::BeiDou => Some((1, 37)),
        Constellation::Galileo => Some((1, 50)),
        Constellation::QZSS => Some((193, 10)),
        c if c.is_sbas() => Some((120, 19)),
        _ => None,
    }
}

/// [SignalId] identifies one signal broadcast by one satellite.
/// Ordering follows (constellation, code, satellite number).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SignalId {
    /// Satellite number: PRN for CDMA constellations,
    /// orbital slot (or frequency channel prior mapping) for GLONASS
    pub sat: u16,
    /// Signal [Code]
    pub code: Code,
}

impl std::fmt::Display for SignalId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} {}", self.code, self.sat)
    }
}

impl PartialOrd for SignalId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SignalId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

impl SignalId {
    /// Builds a new [SignalId], verifying the satellite number
    /// exists for this [Code].
    pub fn new(sat: u16, code: Code) -> Result<Self, Error> {
        let sid = Self { sat, code };
        if sid.is_valid() {
            Ok(sid)
        } else {
            Err(Error::InvalidSatellite(sat))
        }
    }
    /// True if the satellite number exists for this [Code]
    pub fn is_valid(&self) -> bool {
        match satellite_range(self.code.constellation()) {
            Some((first, count)) => self.sat >= first && self.sat < first + count,
            None => false,
        }
    }
    /// Returns [Constellation] of this signal
    pub fn constellation(&self) -> Constellation {
        self.code.constellation()
    }
    /// Zero based index of this satellite within its constellation
    pub fn code_index(&self) -> Option<u16> {
        let (first, _) = satellite_range(self.constellation())?;
        self.sat.checked_sub(first)
    }
    /// Converts to [SV]. SBAS satellites are reported with their PRN - 100,
    /// the way RINEX numbers them.
    pub fn sv(&self) -> SV {
        let constellation = self.constellation();
        let prn = if constellation.is_sbas() {
            self.sat.saturating_sub(100)
        } else {
            self.sat
        };
        SV::new(constellation, prn.min(u8::MAX as u16) as u8)
    }
    /// Composite sorting key: (constellation, code, satellite number)
    pub fn key(&self) -> u32 {
        let constellation: u32 = match self.constellation() {
            Constellation::GPS => 0,
            Constellation::Glonass => 2,
            Constellation::BeiDou => 3,
            Constellation::QZSS => 4,
            Constellation::Galileo => 5,
            _ => 1,
        };
        (constellation << 24) | ((self.code as u32) << 16) | self.sat as u32
    }
    /// Carrier frequency [Hz]. GLONASS FDMA signals require the
    /// frequency channel (1..=14), see [crate::fcn::FcnRegistry].
    pub fn carrier_frequency(&self, fcn: Option<u16>) -> Result<f64, Error> {
        if self.code.is_glonass_l1() || self.code.is_glonass_l2() {
            let fcn = fcn.ok_or(Error::UnknownFrequencyChannel)?;
            if !(1..=14).contains(&fcn) {
                return Err(Error::InvalidFrequencyChannel(fcn));
            }
            let k = (fcn as i32 - GLO_FCN_OFFSET) as f64;
            if self.code.is_glonass_l1() {
                Ok(Carrier::GLO_L1 + k * Carrier::GLO_L1_DELTA)
            } else {
                Ok(Carrier::GLO_L2 + k * Carrier::GLO_L2_DELTA)
            }
        } else {
            Ok(self.code.carrier_frequency())
        }
    }
}
