//! Broadcast ephemeris data model
use crate::{
    constants::{Carrier, GPS_PI},
    decoder::NavSource,
    health::{encode_ura, six_bit_health, Health, SignalHealth},
    prelude::{Constellation, Error, GpsTime, Vector3},
    signal::{Code, SignalId},
};

#[cfg(feature = "log")]
use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod glonass;
mod kepler;
mod sbas;
mod state;
mod status;

pub use kepler::solve_kepler;
pub use state::SatelliteState;
pub use status::{ephemeris_status, EphemerisStatus};

/// Keplerian orbital elements and clock polynomial,
/// shared by GPS, QZSS, BeiDou and Galileo.
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeplerParameters {
    /// Group delays [s]. GPS/QZSS: [TGD, TGD L5],
    /// BeiDou: [TGD1, TGD2], Galileo: [BGD E1/E5a, BGD E1/E5b]
    pub tgd: [f64; 2],
    /// Cosine harmonic correction to the orbit radius [m]
    pub crc: f64,
    /// Sine harmonic correction to the orbit radius [m]
    pub crs: f64,
    /// Cosine harmonic correction to the argument of latitude [rad]
    pub cuc: f64,
    /// Sine harmonic correction to the argument of latitude [rad]
    pub cus: f64,
    /// Cosine harmonic correction to the inclination [rad]
    pub cic: f64,
    /// Sine harmonic correction to the inclination [rad]
    pub cis: f64,
    /// Mean motion difference [rad.s⁻¹]
    pub dn: f64,
    /// Mean anomaly at reference time [rad]
    pub m0: f64,
    /// Eccentricity
    pub ecc: f64,
    /// Square root of the semi major axis [m^1/2]
    pub sqrta: f64,
    /// Longitude of the ascending node at weekly epoch [rad]
    pub omega0: f64,
    /// Rate of right ascension [rad.s⁻¹]
    pub omegadot: f64,
    /// Argument of perigee [rad]
    pub w: f64,
    /// Inclination at reference time [rad]
    pub inc: f64,
    /// Rate of inclination [rad.s⁻¹]
    pub inc_dot: f64,
    /// Clock bias [s]
    pub af0: f64,
    /// Clock drift [s.s⁻¹]
    pub af1: f64,
    /// Clock drift rate [s.s⁻²]
    pub af2: f64,
    /// Clock reference time
    pub toc: GpsTime,
    /// Issue of data, clock
    pub iodc: u16,
    /// Issue of data, ephemeris
    pub iode: u16,
}

/// Direct position parameters broadcast by SBAS GEOs
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct XyzParameters {
    /// ECEF position at toe [m]
    pub pos: Vector3<f64>,
    /// ECEF velocity at toe [m.s⁻¹]
    pub vel: Vector3<f64>,
    /// ECEF acceleration at toe [m.s⁻²]
    pub acc: Vector3<f64>,
    /// Clock offset [s]
    pub a_gf0: f64,
    /// Clock drift [s.s⁻¹]
    pub a_gf1: f64,
}

/// GLONASS immediate data, expressed in PZ-90
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GlonassParameters {
    /// Relative deviation of the carrier frequency
    pub gamma: f64,
    /// Clock correction [s]
    pub tau: f64,
    /// L1/L2 equipment delay [s]
    pub d_tau: f64,
    /// Position at tb [m]
    pub pos: Vector3<f64>,
    /// Velocity at tb [m.s⁻¹]
    pub vel: Vector3<f64>,
    /// Luni-solar acceleration at tb [m.s⁻²]
    pub acc: Vector3<f64>,
    /// Frequency channel (1..=14), 0 when unknown
    pub fcn: u16,
    /// Issue of data (7 LSBs of tb)
    pub iod: u8,
}

/// Constellation specific payload of an [Ephemeris]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EphemerisData {
    /// GPS, QZSS, BeiDou and Galileo
    Kepler(KeplerParameters),
    /// SBAS
    Xyz(XyzParameters),
    /// GLONASS
    Glonass(GlonassParameters),
}

impl EphemerisData {
    /// Builds the payload matching this [Constellation]
    pub fn for_constellation(constellation: Constellation) -> Result<Self, Error> {
        match constellation {
            Constellation::GPS
            | Constellation::QZSS
            | Constellation::BeiDou
            | Constellation::Galileo => Ok(Self::Kepler(Default::default())),
            Constellation::Glonass => Ok(Self::Glonass(Default::default())),
            c if c.is_sbas() => Ok(Self::Xyz(Default::default())),
            c => Err(Error::UnsupportedConstellation(c)),
        }
    }
    /// True if this payload is the one expected for given [Constellation]
    pub fn matches(&self, constellation: Constellation) -> bool {
        match self {
            Self::Kepler(_) => matches!(
                constellation,
                Constellation::GPS
                    | Constellation::QZSS
                    | Constellation::BeiDou
                    | Constellation::Galileo
            ),
            Self::Xyz(_) => constellation.is_sbas(),
            Self::Glonass(_) => constellation == Constellation::Glonass,
        }
    }
}

/// Ephemeris of one satellite, accumulated from the decoded
/// subframes, pages or strings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ephemeris {
    /// Signal this ephemeris was decoded from
    pub sid: SignalId,
    /// Reference time, in GPS time
    pub toe: GpsTime,
    /// User range accuracy [m], negative when unknown
    pub ura: f64,
    /// Curve fit interval [s]
    pub fit_interval: u32,
    /// Decoder declared the content consistent
    pub valid: bool,
    /// Broadcast health bits
    pub health_bits: u8,
    /// Where this ephemeris comes from
    pub source: NavSource,
    /// Constellation specific payload
    pub data: EphemerisData,
}

impl Ephemeris {
    /// Builds an empty (invalid) [Ephemeris] for this signal,
    /// with the payload matching its constellation.
    pub fn new(sid: SignalId) -> Self {
        let constellation = sid.constellation();
        let data = match constellation {
            Constellation::Glonass => EphemerisData::Glonass(Default::default()),
            c if c.is_sbas() => EphemerisData::Xyz(Default::default()),
            _ => EphemerisData::Kepler(Default::default()),
        };
        Self {
            sid,
            data,
            toe: GpsTime::UNKNOWN,
            ura: 0.0,
            fit_interval: 0,
            valid: false,
            health_bits: 0,
            source: NavSource::default(),
        }
    }

    /// Copies and returns [Ephemeris] with updated reference time
    pub fn with_toe(&self, toe: GpsTime) -> Self {
        let mut s = self.clone();
        s.toe = toe;
        s
    }

    /// Copies and returns [Ephemeris] with updated fit interval [s]
    pub fn with_fit_interval(&self, fit_interval: u32) -> Self {
        let mut s = self.clone();
        s.fit_interval = fit_interval;
        s
    }

    /// Copies and returns [Ephemeris] with updated health bits
    pub fn with_health_bits(&self, health_bits: u8) -> Self {
        let mut s = self.clone();
        s.health_bits = health_bits;
        s
    }

    /// Copies and returns [Ephemeris] with updated accuracy [m]
    pub fn with_ura(&self, ura: f64) -> Self {
        let mut s = self.clone();
        s.ura = ura;
        s
    }

    /// Returns [Constellation] of this [Ephemeris]
    pub fn constellation(&self) -> Constellation {
        self.sid.constellation()
    }

    /// True if the payload variant matches the signal constellation
    pub fn is_consistent(&self) -> bool {
        self.data.matches(self.constellation())
    }

    /// Keplerian payload
    pub fn kepler(&self) -> Result<&KeplerParameters, Error> {
        match &self.data {
            EphemerisData::Kepler(k) if self.is_consistent() => Ok(k),
            _ => Err(Error::ConstellationMismatch),
        }
    }

    /// Mutable Keplerian payload
    pub fn kepler_mut(&mut self) -> Result<&mut KeplerParameters, Error> {
        let consistent = self.is_consistent();
        match &mut self.data {
            EphemerisData::Kepler(k) if consistent => Ok(k),
            _ => Err(Error::ConstellationMismatch),
        }
    }

    /// SBAS payload
    pub fn xyz(&self) -> Result<&XyzParameters, Error> {
        match &self.data {
            EphemerisData::Xyz(x) if self.is_consistent() => Ok(x),
            _ => Err(Error::ConstellationMismatch),
        }
    }

    /// Mutable SBAS payload
    pub fn xyz_mut(&mut self) -> Result<&mut XyzParameters, Error> {
        let consistent = self.is_consistent();
        match &mut self.data {
            EphemerisData::Xyz(x) if consistent => Ok(x),
            _ => Err(Error::ConstellationMismatch),
        }
    }

    /// GLONASS payload
    pub fn glonass(&self) -> Result<&GlonassParameters, Error> {
        match &self.data {
            EphemerisData::Glonass(g) if self.is_consistent() => Ok(g),
            _ => Err(Error::ConstellationMismatch),
        }
    }

    /// Mutable GLONASS payload
    pub fn glonass_mut(&mut self) -> Result<&mut GlonassParameters, Error> {
        let consistent = self.is_consistent();
        match &mut self.data {
            EphemerisData::Glonass(g) if consistent => Ok(g),
            _ => Err(Error::ConstellationMismatch),
        }
    }

    /// Compares two ephemerides, disregarding where they were decoded from.
    pub fn equal(&self, rhs: &Self) -> bool {
        self.sid == rhs.sid
            && self.ura == rhs.ura
            && self.fit_interval == rhs.fit_interval
            && self.valid == rhs.valid
            && self.health_bits == rhs.health_bits
            && self.toe.wn == rhs.toe.wn
            && self.toe.tow == rhs.toe.tow
            && self.data == rhs.data
    }

    /// Issue of data. BeiDou does not broadcast one: a CRC-24Q
    /// over the requantized orbital elements identifies the set instead.
    pub fn iod(&self) -> Result<u32, Error> {
        match self.constellation() {
            Constellation::BeiDou => Ok(iod_crc(self.kepler()?)),
            Constellation::GPS | Constellation::Galileo | Constellation::QZSS => {
                Ok(self.kepler()?.iode as u32)
            },
            Constellation::Glonass => Ok(self.glonass()?.iod as u32),
            c => Err(Error::UnsupportedConstellation(c)),
        }
    }

    /// Group delay [s] to remove from the iono-free satellite clock,
    /// for given signal [Code].
    pub fn tgd_correction(&self, code: Code) -> Result<f64, Error> {
        if code.constellation() != self.constellation() {
            return Err(Error::ConstellationMismatch);
        }
        match self.constellation() {
            Constellation::GPS => {
                let tgd = &self.kepler()?.tgd;
                let gamma = (Carrier::GPS_L1 / code.carrier_frequency()).powi(2);
                if code.is_gps_l5() {
                    Ok(tgd[1] * gamma)
                } else {
                    Ok(tgd[0] * gamma)
                }
            },
            Constellation::QZSS => {
                let tgd = &self.kepler()?.tgd;
                let gamma = (Carrier::QZS_L1 / code.carrier_frequency()).powi(2);
                if code.is_qzss_l5() {
                    Ok(tgd[1] * gamma)
                } else {
                    Ok(tgd[0] * gamma)
                }
            },
            Constellation::BeiDou => {
                let tgd = &self.kepler()?.tgd;
                match code {
                    Code::Bds2B1 => Ok(tgd[0]),
                    Code::Bds2B2 => Ok(tgd[1]),
                    _ => {
                        #[cfg(feature = "log")]
                        debug!("{}: no group delay for {}", self.sid, code);
                        Err(Error::NoGroupDelay)
                    },
                }
            },
            Constellation::Galileo => {
                let tgd = &self.kepler()?.tgd;
                let gamma = (Carrier::GAL_E1 / code.carrier_frequency()).powi(2);
                match code {
                    Code::GalE5I | Code::GalE5Q | Code::GalE5X => Ok(gamma * tgd[0]),
                    Code::GalE1B
                    | Code::GalE1C
                    | Code::GalE1X
                    | Code::GalE7I
                    | Code::GalE7Q
                    | Code::GalE7X => Ok(gamma * tgd[1]),
                    _ => {
                        #[cfg(feature = "log")]
                        debug!("{}: no group delay for {}", self.sid, code);
                        Err(Error::NoGroupDelay)
                    },
                }
            },
            Constellation::Glonass => {
                let glo = self.glonass()?;
                if code.is_glonass_l1() {
                    Ok(0.0)
                } else if code.is_glonass_l2() {
                    Ok(glo.d_tau)
                } else {
                    Err(Error::NoGroupDelay)
                }
            },
            c => Err(Error::UnsupportedConstellation(c)),
        }
    }
}

impl SignalHealth for Ephemeris {
    /// Ephemerides that were not decoded yet are presumed healthy,
    /// so the satellite keeps being tracked.
    fn signal_health(&self, code: Code) -> Health {
        if !self.valid {
            return Health::Unknown;
        }
        match code.constellation() {
            Constellation::GPS => {
                if encode_ura(self.ura).is_none() {
                    Health::Unhealthy
                } else {
                    six_bit_health(self.health_bits, code)
                }
            },
            Constellation::Glonass | Constellation::BeiDou | Constellation::Galileo => {
                if !(self.ura >= 0.0) {
                    Health::Unhealthy
                } else {
                    Health::from(self.health_bits == 0)
                }
            },
            _ => Health::from(self.health_bits == 0),
        }
    }
}

/// Quantizes `value / unit` the way the broadcast does (truncation)
fn quantize(value: f64, unit: f64) -> i64 {
    (value / unit) as i64
}

/// CRC-24Q over the requantized Keplerian set,
/// identifying a BeiDou ephemeris
fn iod_crc(k: &KeplerParameters) -> u32 {
    use crate::bits::{set_signed, set_unsigned};
    use crate::constants::p2;

    let fields: [(usize, i64); 18] = [
        (14, quantize(k.inc_dot, GPS_PI * p2(-43))),
        (11, quantize(k.af2, p2(-66))),
        (22, quantize(k.af1, p2(-50))),
        (24, quantize(k.af0, p2(-33))),
        (18, quantize(k.crs, p2(-6))),
        (16, quantize(k.dn, GPS_PI * p2(-43))),
        (32, quantize(k.m0, GPS_PI * p2(-31))),
        (18, quantize(k.cuc, p2(-31))),
        (32, quantize(k.ecc, p2(-33))),
        (18, quantize(k.cus, p2(-31))),
        (32, quantize(k.sqrta, p2(-19))),
        (18, quantize(k.cic, p2(-31))),
        (32, quantize(k.omega0, GPS_PI * p2(-31))),
        (18, quantize(k.cis, p2(-31))),
        (32, quantize(k.inc, GPS_PI * p2(-31))),
        (18, quantize(k.crc, p2(-6))),
        (32, quantize(k.w, GPS_PI * p2(-31))),
        (24, quantize(k.omegadot, GPS_PI * p2(-43))),
    ];

    let mut buf = [0_u8; 52];
    let mut pos = 0;
    for (len, value) in fields {
        // e and sqrt(A) are unsigned: the len LSBs are the same
        set_signed(&mut buf, pos, len, value);
        pos += len;
    }
    // 5 padding bits
    set_unsigned(&mut buf, pos, 5, 0);

    let crc24q = crc::Crc::<u32>::new(&crc::CRC_24_LTE_A);
    crc24q.checksum(&buf)
}
