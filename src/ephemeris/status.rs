//! Ephemeris validity state machine
use crate::{
    ephemeris::{Ephemeris, EphemerisData},
    health::SignalHealth,
    prelude::{Constellation, GpsTime},
    time::WN_UNKNOWN,
};

#[cfg(feature = "log")]
use log::{error, info};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Usability of an [Ephemeris], checks being applied in declaration order:
/// the first failing check determines the status.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EphemerisStatus {
    /// No record at all
    Null,
    /// Record was never (or not entirely) decoded
    Invalid,
    /// Reference week number is zero
    WnEqZero,
    /// Curve fit interval is zero
    FitIntervalEqZero,
    /// Satellite declared unhealthy
    Unhealthy,
    /// Requested time lies outside the fit interval
    TooOld,
    /// Usable
    Valid,
}

impl std::fmt::Display for EphemerisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Invalid => write!(f, "invalid"),
            Self::WnEqZero => write!(f, "wn=0"),
            Self::FitIntervalEqZero => write!(f, "fit interval=0"),
            Self::Unhealthy => write!(f, "unhealthy"),
            Self::TooOld => write!(f, "too old"),
            Self::Valid => write!(f, "valid"),
        }
    }
}

impl EphemerisStatus {
    /// True for [EphemerisStatus::Valid]
    pub fn is_valid(&self) -> bool {
        *self == Self::Valid
    }
}

/// Evaluates the status of an optional [Ephemeris] at time `t`
pub fn ephemeris_status(ephemeris: Option<&Ephemeris>, t: &GpsTime) -> EphemerisStatus {
    match ephemeris {
        Some(ephemeris) => ephemeris.status_at(t),
        None => {
            #[cfg(feature = "log")]
            error!("null ephemeris");
            EphemerisStatus::Null
        },
    }
}

/// Resolves unknown week numbers, assuming both times
/// lie within half a week of each other. When neither is known,
/// an arbitrary week is used: only the difference matters.
fn fake_gps_wns(toe: &GpsTime, t: &GpsTime) -> (GpsTime, GpsTime) {
    let (mut toe, mut t) = (*toe, *t);
    match (toe.wn == WN_UNKNOWN, t.wn == WN_UNKNOWN) {
        (true, true) => {
            toe.wn = 2;
            t.match_weeks(&toe);
        },
        (true, false) => toe.match_weeks(&t),
        (false, true) => t.match_weeks(&toe),
        (false, false) => {},
    }
    (toe, t)
}

impl Ephemeris {
    /// Time independent status: any status but [EphemerisStatus::TooOld].
    pub fn status(&self) -> EphemerisStatus {
        if !self.valid {
            #[cfg(feature = "log")]
            info!("{}: ephemeris invalid", self.sid);
            EphemerisStatus::Invalid
        } else if self.toe.wn == 0 {
            #[cfg(feature = "log")]
            error!("{}: ephemeris wn=0", self.sid);
            EphemerisStatus::WnEqZero
        } else if self.fit_interval == 0 {
            #[cfg(feature = "log")]
            error!("{}: ephemeris fit interval=0", self.sid);
            EphemerisStatus::FitIntervalEqZero
        } else if !self.is_healthy(self.sid.code) {
            #[cfg(feature = "log")]
            info!("{}: ephemeris unhealthy", self.sid);
            EphemerisStatus::Unhealthy
        } else {
            EphemerisStatus::Valid
        }
    }

    /// Status at time `t`
    pub fn status_at(&self, t: &GpsTime) -> EphemerisStatus {
        let status = self.status();
        if status != EphemerisStatus::Valid {
            return status;
        }
        if !self.is_valid_at(t) {
            #[cfg(feature = "log")]
            info!("{}: ephemeris too old at {}", self.sid, t);
            return EphemerisStatus::TooOld;
        }
        EphemerisStatus::Valid
    }

    /// Validity window, `(begin, end)`. GPS, QZSS, GLONASS and SBAS
    /// reference times sit in the middle of the fit interval,
    /// BeiDou and Galileo ones at the beginning.
    pub fn validity_window(&self) -> (GpsTime, GpsTime) {
        match self.constellation() {
            Constellation::BeiDou | Constellation::Galileo => (
                self.toe,
                self.toe.add_secs(self.fit_interval as f64),
            ),
            _ => {
                let half = (self.fit_interval / 2) as f64;
                (self.toe.add_secs(-half), self.toe.add_secs(half))
            },
        }
    }

    /// True if `t` lies within the fit interval.
    /// Keplerian records also require the clock reference time to be
    /// known and within the same window.
    pub fn is_valid_at(&self, t: &GpsTime) -> bool {
        let (toe, t) = fake_gps_wns(&self.toe, t);
        let eph = self.with_toe(toe);
        let (begin, end) = eph.validity_window();
        if !t.in_range(&begin, &end) {
            return false;
        }
        if let EphemerisData::Kepler(k) = &self.data {
            if k.toc.wn == 0 || !k.toc.in_range(&begin, &end) {
                return false;
            }
        }
        true
    }
}
