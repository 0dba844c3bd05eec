//! GPS to UTC conversion parameters
use crate::{
    constants::WEEK_SECS,
    prelude::{Error, GpsTime},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const DAY_SECS: f64 = 86_400.0;

/// GPS to UTC offset model, with the next scheduled leap second
#[derive(Debug, Copy, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UtcParameters {
    /// Bias [s]
    pub a0: f64,
    /// Drift [s.s⁻¹]
    pub a1: f64,
    /// Drift rate [s.s⁻²], null for the legacy message
    pub a2: f64,
    /// Reference time of the polynomial
    pub tot: GpsTime,
    /// GPS time at which the leap second becomes effective
    pub t_lse: GpsTime,
    /// Leap seconds before `t_lse` [s]
    pub dt_ls: i8,
    /// Leap seconds after `t_lse` [s]
    pub dt_lsf: i8,
}

impl UtcParameters {
    /// Builds [UtcParameters] from broadcast fields. The leap second
    /// takes effect at the end of day `dn` (1 to 7) of week `wn_lsf`.
    pub fn from_broadcast(
        a0: f64,
        a1: f64,
        tot: GpsTime,
        wn_lsf: i16,
        dn: u8,
        dt_ls: i8,
        dt_lsf: i8,
    ) -> Result<Self, Error> {
        if !(1..=7).contains(&dn) {
            return Err(Error::OutOfRange("dn"));
        }
        let mut params = Self {
            a0,
            a1,
            a2: 0.0,
            tot,
            t_lse: GpsTime::new(wn_lsf, dn as f64 * DAY_SECS).normalized(),
            dt_ls,
            dt_lsf,
        };
        // broadcast event time is in UTC
        let dt = params.t_lse.diff(&tot);
        params.t_lse = params.t_lse.add_secs(dt_ls as f64 + a0 + a1 * dt);
        Ok(params)
    }

    fn polynomial(&self, dt: f64) -> f64 {
        self.a0 + self.a1 * dt + self.a2 * dt * dt
    }

    /// Offset [s] to subtract from GPS time `t` to obtain UTC.
    pub fn gps_utc_offset(&self, t: &GpsTime) -> f64 {
        let dt = t.diff(&self.tot);
        let offset = self.polynomial(dt);
        if t.diff(&self.t_lse) >= 1.0 {
            offset + self.dt_lsf as f64
        } else {
            offset + self.dt_ls as f64
        }
    }

    /// Offset [s] to subtract from UTC time `utc`, expressed as a
    /// GPS week and time of week, to obtain GPS time.
    pub fn utc_gps_offset(&self, utc: &GpsTime) -> f64 {
        let dt = utc.diff(&self.tot) + self.dt_ls as f64;
        let offset = self.polynomial(dt);
        let leap = if utc.diff(&self.t_lse) >= -(self.dt_ls as f64) - offset {
            self.dt_lsf
        } else {
            self.dt_ls
        };
        -(offset + leap as f64)
    }

    /// True while `t` lies within the inserted leap second
    pub fn is_leap_second_event(&self, t: &GpsTime) -> bool {
        let dt = t.diff(&self.t_lse);
        (0.0..1.0).contains(&dt)
    }

    /// True if `t_lse` lies within one week of `t`
    pub fn is_leap_second_pending(&self, t: &GpsTime) -> bool {
        let dt = self.t_lse.diff(t);
        dt >= 0.0 && dt < WEEK_SECS
    }
}
