//! Satellite state calculations
use crate::{
    constants::SPEED_OF_LIGHT,
    ephemeris::{
        glonass::glonass_state, kepler::kepler_state, sbas::sbas_state, Ephemeris,
        EphemerisData, EphemerisStatus,
    },
    geodesy,
    prelude::{Constellation, Error, GpsTime, Vector3},
};

#[cfg(feature = "log")]
use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Satellite state at a given instant, in ECEF
/// (WGS84 or PZ-90 depending on the constellation).
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SatelliteState {
    /// Position [m]
    pub position: Vector3<f64>,
    /// Velocity [m.s⁻¹]
    pub velocity: Vector3<f64>,
    /// Acceleration [m.s⁻²]
    pub acceleration: Vector3<f64>,
    /// Satellite clock error [s]
    pub clock_error: f64,
    /// Satellite clock drift [s.s⁻¹]
    pub clock_rate_error: f64,
    /// Issue of data, clock
    pub iodc: u16,
    /// Issue of data, ephemeris
    pub iode: u16,
}

impl Ephemeris {
    /// Satellite state at time `t`, provided this [Ephemeris]
    /// is [EphemerisStatus::Valid] at that time.
    pub fn state(&self, t: &GpsTime) -> Result<SatelliteState, Error> {
        let status = self.status_at(t);
        if status != EphemerisStatus::Valid {
            return Err(Error::UnusableEphemeris(status));
        }
        self.state_unchecked(t)
    }

    /// Satellite state at time `t`, regardless of the validity status.
    /// Mostly meant for tests and long term predictions.
    pub fn state_unchecked(&self, t: &GpsTime) -> Result<SatelliteState, Error> {
        match &self.data {
            EphemerisData::Kepler(k) if self.is_consistent() => kepler_state(self, k, t),
            EphemerisData::Glonass(glo) if self.is_consistent() => glonass_state(self, glo, t),
            EphemerisData::Xyz(xyz) if self.is_consistent() => sbas_state(self, xyz, t),
            _ => Err(Error::ConstellationMismatch),
        }
    }

    /// Satellite (azimuth, elevation) [rad] at time `t`, seen from
    /// `reference` (ECEF [m]). Azimuth lies within [0, 2π[.
    pub fn azimuth_elevation(
        &self,
        t: &GpsTime,
        reference: &Vector3<f64>,
    ) -> Result<(f64, f64), Error> {
        let state = self.state(t)?;
        Ok(geodesy::azimuth_elevation(&state.position, reference))
    }

    /// Same as [Self::azimuth_elevation], regardless of the validity status.
    pub fn azimuth_elevation_unchecked(
        &self,
        t: &GpsTime,
        reference: &Vector3<f64>,
    ) -> Result<(f64, f64), Error> {
        let state = self.state_unchecked(t)?;
        Ok(geodesy::azimuth_elevation(&state.position, reference))
    }

    /// Doppler shift [Hz] observed on this signal at time `t`,
    /// by a receiver located at `ref_pos` (ECEF [m]) and
    /// moving at `ref_vel` (ECEF [m.s⁻¹]).
    /// GLONASS records need to know their frequency channel.
    pub fn doppler(
        &self,
        t: &GpsTime,
        ref_pos: &Vector3<f64>,
        ref_vel: &Vector3<f64>,
    ) -> Result<f64, Error> {
        let state = self.state(t)?;
        self.doppler_from_state(&state, ref_pos, ref_vel)
    }

    pub(crate) fn doppler_from_state(
        &self,
        state: &SatelliteState,
        ref_pos: &Vector3<f64>,
        ref_vel: &Vector3<f64>,
    ) -> Result<f64, Error> {
        let fcn = match self.constellation() {
            Constellation::Glonass => match self.glonass()?.fcn {
                0 => None,
                fcn => Some(fcn),
            },
            _ => None,
        };
        let carrier = self.sid.carrier_frequency(fcn)?;

        let los = state.position - ref_pos;
        let distance = los.norm();
        if distance == 0.0 {
            return Err(Error::OutOfRange("line of sight"));
        }
        let rate = los.dot(&(state.velocity + ref_vel)) / distance;
        let doppler = carrier * rate / SPEED_OF_LIGHT;

        #[cfg(feature = "log")]
        debug!("{}: range rate {:.3} m/s, doppler {:.3} Hz", self.sid, rate, doppler);

        Ok(doppler)
    }
}
