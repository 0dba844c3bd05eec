//! Almanac: long term, reduced precision orbital elements
use crate::{
    ephemeris::{Ephemeris, EphemerisData, KeplerParameters, SatelliteState, XyzParameters},
    geodesy,
    health::{check_6bit_health_word, check_nav_dhi, NavDhiMask},
    prelude::{Constellation, Error, GpsTime, Vector3},
    signal::SignalId,
    time::WN_UNKNOWN,
};

#[cfg(feature = "log")]
use log::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Keplerian almanac elements (GPS)
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlmanacKepler {
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
    /// Inclination, offset included [rad]
    pub inc: f64,
    /// Clock bias [s]
    pub af0: f64,
    /// Clock drift [s.s⁻¹]
    pub af1: f64,
}

/// SBAS almanac: GEO position, velocity and acceleration at toa
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlmanacXyz {
    pub pos: Vector3<f64>,
    pub vel: Vector3<f64>,
    pub acc: Vector3<f64>,
}

/// GLONASS almanac elements, in PZ-90
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlmanacGlonass {
    /// Longitude of the first ascending node [semi-circles]
    pub lambda: f64,
    /// Time of the first ascending node passage [s]
    pub t_lambda: f64,
    /// Inclination at t_lambda [semi-circles]
    pub i: f64,
    /// Draconian period at t_lambda [s]
    pub t: f64,
    /// Draconian period rate [s/orbital period²]
    pub t_dot: f64,
    /// Eccentricity at t_lambda
    pub epsilon: f64,
    /// Argument of perigee at t_lambda [semi-circles]
    pub omega: f64,
}

/// Constellation specific almanac payload
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AlmanacData {
    Kepler(AlmanacKepler),
    Xyz(AlmanacXyz),
    Glonass(AlmanacGlonass),
}

/// Almanac of one satellite
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlmanacEntry {
    pub sid: SignalId,
    /// Reference time of almanac. Week number is often unknown
    /// until the reference week page was received.
    pub toa: GpsTime,
    /// User range accuracy [m]
    pub ura: f64,
    /// Curve fit interval [s]
    pub fit_interval: u32,
    pub valid: bool,
    /// 8-bit health word: NAV data health (3 MSB) and signal components (5 LSB)
    pub health_bits: u8,
    pub data: AlmanacData,
}

/// Almanac reference week (subframe 5 page 25)
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlmanacReferenceWeek {
    /// Reference week number, rollover resolved
    pub wna: u16,
    /// Reference time of almanac [s]
    pub toa: u32,
}

/// 6-bit health words of the almanac health pages
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlmanacHealth {
    /// Health word for PRN 1..=32 (index = PRN - 1)
    pub health_bits: [u8; 32],
    /// Bit n set when `health_bits[n]` was decoded
    pub valid_mask: u32,
}

impl AlmanacHealth {
    /// Health word of this PRN, if it was decoded
    pub fn health(&self, prn: u8) -> Option<u8> {
        let index = prn.checked_sub(1)? as usize;
        if index < 32 && self.valid_mask & (1 << index) != 0 {
            Some(self.health_bits[index])
        } else {
            None
        }
    }
}

impl AlmanacEntry {
    /// Builds an empty (invalid) almanac for this signal
    pub fn new(sid: SignalId) -> Self {
        let data = match sid.constellation() {
            Constellation::Glonass => AlmanacData::Glonass(Default::default()),
            c if c.is_sbas() => AlmanacData::Xyz(Default::default()),
            _ => AlmanacData::Kepler(Default::default()),
        };
        Self {
            sid,
            data,
            toa: GpsTime::UNKNOWN,
            ura: 0.0,
            fit_interval: 0,
            valid: false,
            health_bits: 0,
        }
    }

    /// Almanac health: NAV data health indications that do not
    /// affect the almanac content are ignored.
    pub fn is_healthy(&self) -> bool {
        let ignored = NavDhiMask::TLM_HOW | NavDhiMask::ZCOUNT | NavDhiMask::SUBFRAMES_123;
        check_nav_dhi(self.health_bits, ignored)
            && check_6bit_health_word(self.health_bits & 0x1f, self.sid.code)
    }

    /// True if this almanac is usable at time `t`
    pub fn is_valid_at(&self, t: &GpsTime) -> bool {
        if !self.valid || !self.is_healthy() {
            return false;
        }
        if self.fit_interval == 0 {
            #[cfg(feature = "log")]
            warn!("{}: almanac fit interval=0", self.sid);
            return false;
        }
        if self.toa.wn == WN_UNKNOWN || self.toa.wn == 0 {
            return false;
        }
        t.diff(&self.toa).abs() <= (self.fit_interval / 2) as f64
    }

    /// Semantic equality
    pub fn equal(&self, rhs: &Self) -> bool {
        self.sid == rhs.sid
            && self.ura == rhs.ura
            && self.fit_interval == rhs.fit_interval
            && self.valid == rhs.valid
            && self.health_bits == rhs.health_bits
            && self.toa.wn == rhs.toa.wn
            && self.toa.tow == rhs.toa.tow
            && self.data == rhs.data
    }

    /// Expresses this almanac as an [Ephemeris] propagated
    /// with the same models. GLONASS almanacs are not convertible.
    pub fn to_ephemeris(&self) -> Result<Ephemeris, Error> {
        let data = match &self.data {
            AlmanacData::Kepler(k) if self.sid.constellation() == Constellation::GPS => {
                EphemerisData::Kepler(KeplerParameters {
                    m0: k.m0,
                    ecc: k.ecc,
                    sqrta: k.sqrta,
                    omega0: k.omega0,
                    omegadot: k.omegadot,
                    w: k.w,
                    inc: k.inc,
                    af0: k.af0,
                    af1: k.af1,
                    toc: self.toa,
                    ..Default::default()
                })
            },
            AlmanacData::Xyz(xyz) if self.sid.constellation().is_sbas() => {
                EphemerisData::Xyz(XyzParameters {
                    pos: xyz.pos,
                    vel: xyz.vel,
                    acc: xyz.acc,
                    ..Default::default()
                })
            },
            _ => return Err(Error::UnsupportedConstellation(self.sid.constellation())),
        };
        let mut eph = Ephemeris::new(self.sid);
        eph.toe = self.toa;
        eph.ura = self.ura;
        eph.fit_interval = self.fit_interval;
        eph.valid = self.valid;
        eph.health_bits = self.health_bits;
        eph.data = data;
        Ok(eph)
    }

    /// Satellite state at time `t`, regardless of the almanac validity
    pub fn state_unchecked(&self, t: &GpsTime) -> Result<SatelliteState, Error> {
        self.to_ephemeris()?.state_unchecked(t)
    }

    /// Satellite state at time `t`. Fails if the almanac is not usable at that time.
    pub fn state(&self, t: &GpsTime) -> Result<SatelliteState, Error> {
        if !self.is_valid_at(t) {
            return Err(Error::OutOfRange("almanac validity"));
        }
        self.state_unchecked(t)
    }

    /// (azimuth, elevation) [rad] at time `t`, seen from `reference` (ECEF [m])
    pub fn azimuth_elevation(
        &self,
        t: &GpsTime,
        reference: &Vector3<f64>,
    ) -> Result<(f64, f64), Error> {
        let state = self.state_unchecked(t)?;
        Ok(geodesy::azimuth_elevation(&state.position, reference))
    }

    /// Doppler shift [Hz] at time `t`, seen by a static receiver at `reference`
    pub fn doppler(&self, t: &GpsTime, reference: &Vector3<f64>) -> Result<f64, Error> {
        let eph = self.to_ephemeris()?;
        let state = eph.state_unchecked(t)?;
        eph.doppler_from_state(&state, reference, &Vector3::zeros())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::signal::Code;

    fn gps_almanac() -> AlmanacEntry {
        let sid = SignalId::new(7, Code::GpsL1CA).unwrap();
        let mut alm = AlmanacEntry::new(sid);
        alm.valid = true;
        alm.ura = 900.0;
        alm.fit_interval = 140 * 3600;
        alm.toa = GpsTime::new(1939, 405504.0);
        alm.data = AlmanacData::Kepler(AlmanacKepler {
            m0: 2.1,
            ecc: 0.0108,
            sqrta: 5153.6,
            omega0: -0.8,
            omegadot: -8.0E-9,
            w: 0.7,
            inc: 0.96,
            af0: 1.0E-5,
            af1: 0.0,
        });
        alm
    }

    #[test]
    fn almanac_validity() {
        let alm = gps_almanac();
        assert!(alm.is_valid_at(&alm.toa));
        assert!(alm.is_valid_at(&alm.toa.add_secs(70.0 * 3600.0)));
        assert!(!alm.is_valid_at(&alm.toa.add_secs(70.0 * 3600.0 + 1.0)));

        let mut unknown_week = alm.clone();
        unknown_week.toa.wn = WN_UNKNOWN;
        assert!(!unknown_week.is_valid_at(&alm.toa));

        let mut no_fit = alm.clone();
        no_fit.fit_interval = 0;
        assert!(!no_fit.is_valid_at(&alm.toa));

        let mut invalid = alm.clone();
        invalid.valid = false;
        assert!(!invalid.is_valid_at(&alm.toa));
    }

    #[test]
    fn almanac_health() {
        let mut alm = gps_almanac();
        for (health_bits, healthy) in [
            (0x00, true),
            // TLM/HOW, Z-count and SF1-3 errors do not affect the almanac
            (0x40, true),
            (0x60, true),
            (0x80, true),
            (0xa0, false),
            (0xe0, false),
            (0x1c, false),
            (0x1f, false),
        ] {
            alm.health_bits = health_bits;
            assert_eq!(alm.is_healthy(), healthy, "health=0x{:02x}", health_bits);
        }
    }

    #[test]
    fn almanac_propagation() {
        let alm = gps_almanac();
        let state = alm.state(&alm.toa.add_secs(600.0)).unwrap();
        let radius = state.position.norm();
        assert!(radius > 2.6E7 && radius < 2.7E7, "r={}", radius);
        let speed = state.velocity.norm();
        assert!(speed > 2.5E3 && speed < 4.5E3, "v={}", speed);

        assert!(alm.state(&alm.toa.add_secs(100.0 * 3600.0)).is_err());
        assert!(alm.state_unchecked(&alm.toa.add_secs(100.0 * 3600.0)).is_ok());

        let reference = Vector3::new(4_627_000.0, 119_000.0, 4_373_000.0);
        let (az, el) = alm.azimuth_elevation(&alm.toa, &reference).unwrap();
        assert!((0.0..2.0 * std::f64::consts::PI).contains(&az));
        assert!(el.abs() <= std::f64::consts::FRAC_PI_2);

        let doppler = alm.doppler(&alm.toa, &reference).unwrap();
        assert!(doppler.abs() < 2.5E4, "doppler={}", doppler);

        let sid = SignalId::new(4, Code::GloL1OF).unwrap();
        let glo = AlmanacEntry::new(sid);
        assert_eq!(
            glo.state_unchecked(&alm.toa).err(),
            Some(Error::UnsupportedConstellation(Constellation::Glonass))
        );
    }

    #[test]
    fn sbas_almanac() {
        let sid = SignalId::new(131, Code::SbasL1CA).unwrap();
        let mut alm = AlmanacEntry::new(sid);
        alm.valid = true;
        alm.toa = GpsTime::new(2000, 1000.0);
        alm.fit_interval = 3600;
        alm.data = AlmanacData::Xyz(AlmanacXyz {
            pos: Vector3::new(4.2E7, 0.0, 0.0),
            vel: Vector3::new(0.0, 1.0, 0.0),
            acc: Vector3::zeros(),
        });
        let state = alm.state(&GpsTime::new(2000, 1010.0)).unwrap();
        assert_eq!(state.position, Vector3::new(4.2E7, 10.0, 0.0));
        assert_eq!(state.iode, 0);
    }

    #[test]
    fn health_pages() {
        let mut health = AlmanacHealth::default();
        health.health_bits[24] = 0x3f;
        health.valid_mask = 0xff00_0000;
        assert_eq!(health.health(25), Some(0x3f));
        assert_eq!(health.health(1), None);
        assert_eq!(health.health(0), None);
        assert_eq!(health.health(33), None);
    }
}
