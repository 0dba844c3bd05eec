//! GNSS time representations
use crate::{
    constants::WEEK_SECS,
    prelude::{Duration, Epoch, Error, TimeScale},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Week number is not known
pub const WN_UNKNOWN: i16 = -1;

/// Time of week is not known
pub const TOW_UNKNOWN: f64 = -1.0;

/// Default GPS week reference, used to resolve the broadcast
/// week number rollover (10 and 8 bit week numbers).
pub const GPS_WEEK_REFERENCE: u16 = 1876;

/// Offset between BeiDou and GPS week numbers
pub(crate) const BDS_WEEK_TO_GPS_WEEK: i16 = 1356;

/// Offset between BeiDou and GPS seconds of week
pub(crate) const BDS_SECOND_TO_GPS_SECOND: f64 = 14.0;

/// Offset between Galileo and GPS week numbers
pub(crate) const GAL_WEEK_TO_GPS_WEEK: i16 = 1024;

/// UTC(SU) is UTC + 3h
const UTC_SU_OFFSET_HOURS: f64 = 3.0;

/// Time expressed as a week number and time of week, in GPS time.
/// The week number may be unknown ([WN_UNKNOWN]).
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GpsTime {
    /// Week number, counted from 1980-01-06
    pub wn: i16,
    /// Seconds into the week
    pub tow: f64,
}

impl Default for GpsTime {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl std::fmt::Display for GpsTime {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "wn={} tow={:.3}", self.wn, self.tow)
    }
}

impl GpsTime {
    /// Totally unknown time
    pub const UNKNOWN: Self = Self {
        wn: WN_UNKNOWN,
        tow: TOW_UNKNOWN,
    };

    /// Builds a new [GpsTime]
    pub fn new(wn: i16, tow: f64) -> Self {
        Self { wn, tow }
    }

    /// True if both week number and time of week are legal
    pub fn is_valid(&self) -> bool {
        self.tow.is_finite() && self.tow >= 0.0 && self.tow < WEEK_SECS && self.wn >= 0
    }

    /// True if week number is known
    pub fn has_week(&self) -> bool {
        self.wn != WN_UNKNOWN
    }

    /// Wraps the time of week into [0, 1 week[, carrying into the week number.
    /// An unknown week number is left untouched.
    pub fn normalize(&mut self) {
        if !self.tow.is_finite() {
            return;
        }
        let weeks = (self.tow / WEEK_SECS).floor();
        self.tow -= weeks * WEEK_SECS;
        if self.tow >= WEEK_SECS {
            // rounding
            self.tow -= WEEK_SECS;
        }
        if self.wn != WN_UNKNOWN {
            self.wn = self.wn.saturating_add(weeks as i16);
        }
    }

    /// Returns a normalized copy
    pub fn normalized(&self) -> Self {
        let mut t = *self;
        t.normalize();
        t
    }

    /// Returns `self` + `secs`, normalized.
    pub fn add_secs(&self, secs: f64) -> Self {
        let mut t = *self;
        t.tow += secs;
        t.normalize();
        t
    }

    /// Time difference in seconds (self - rhs).
    /// If either week number is unknown, both times are assumed
    /// to be within half a week of each other.
    pub fn diff(&self, rhs: &Self) -> f64 {
        let mut dt = self.tow - rhs.tow;
        if self.wn == WN_UNKNOWN || rhs.wn == WN_UNKNOWN {
            if dt > WEEK_SECS / 2.0 {
                dt -= WEEK_SECS;
            }
            if dt < -WEEK_SECS / 2.0 {
                dt += WEEK_SECS;
            }
        } else {
            dt += (self.wn as f64 - rhs.wn as f64) * WEEK_SECS;
        }
        dt
    }

    /// Fills in the week number from `reference`, assuming
    /// both times are separated by less than half a week.
    pub fn match_weeks(&mut self, reference: &Self) {
        if reference.wn == WN_UNKNOWN {
            return;
        }
        self.wn = reference.wn;
        let dt = self.tow - reference.tow;
        if dt > WEEK_SECS / 2.0 {
            self.wn = self.wn.saturating_sub(1);
        } else if dt < -WEEK_SECS / 2.0 {
            self.wn = self.wn.saturating_add(1);
        }
    }

    /// True if `begin` <= `self` <= `end`
    pub fn in_range(&self, begin: &Self, end: &Self) -> bool {
        let since_begin = self.diff(begin);
        if since_begin < 0.0 {
            return false;
        }
        since_begin <= end.diff(begin)
    }

    /// Converts to [Epoch] in [TimeScale::GPST].
    /// Unknown week numbers are not convertible.
    pub fn to_epoch(&self) -> Option<Epoch> {
        if !self.is_valid() {
            return None;
        }
        Some(Epoch::from_gpst_seconds(
            self.wn as f64 * WEEK_SECS + self.tow,
        ))
    }

    /// Builds from any [Epoch], expressed in GPS time.
    pub fn from_epoch(epoch: Epoch) -> Self {
        let secs = epoch.to_gpst_seconds();
        let wn = (secs / WEEK_SECS).floor();
        Self {
            wn: wn as i16,
            tow: secs - wn * WEEK_SECS,
        }
    }
}

impl From<GpsTime> for Option<Epoch> {
    fn from(t: GpsTime) -> Self {
        t.to_epoch()
    }
}

impl From<Epoch> for GpsTime {
    fn from(epoch: Epoch) -> Self {
        Self::from_epoch(epoch)
    }
}

/// Resolves a 10-bit week number against a reference week,
/// assuming the current week cannot precede the reference.
pub fn adjust_week_cycle(wn_raw: u16, wn_ref: u16) -> u16 {
    adjust_cycle(wn_raw, wn_ref, 1024)
}

/// Resolves an 8-bit week number against a reference week,
/// assuming the current week cannot precede the reference.
pub fn adjust_week_cycle256(wn_raw: u16, wn_ref: u16) -> u16 {
    adjust_cycle(wn_raw, wn_ref, 256)
}

fn adjust_cycle(wn_raw: u16, wn_ref: u16, cycle: u32) -> u16 {
    if wn_raw >= wn_ref {
        return wn_raw;
    }
    let (raw, reference) = (wn_raw as u32, wn_ref as u32);
    (raw + cycle * ((reference + cycle - 1 - raw) / cycle)) as u16
}

/// GLONASS time, as broadcast in strings 1, 4 and 5.
/// Expressed in UTC(SU).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GloTime {
    /// Four year interval number, starting from 1996
    pub n4: u8,
    /// Day number within the four year interval (1..=1461)
    pub nt: u16,
    /// Hours
    pub h: u8,
    /// Minutes
    pub m: u8,
    /// Seconds (may reach 60 during a leap second)
    pub s: f64,
}

const GLO_EPOCH_YEAR: i32 = 1996;
const GLO_N4_MAX: u8 = 31;
const YEAR_DAYS: u16 = 365;
const LEAP_YEAR_DAYS: u16 = 366;

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// (month, day of month) for given day of year (1 based)
fn month_day(year: i32, doy: u16) -> Option<(u8, u8)> {
    let february = if is_leap_year(year) { 29 } else { 28 };
    let months = [31, february, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    let mut day = doy;
    for (index, len) in months.iter().enumerate() {
        if day >= 1 && day <= *len {
            return Some((index as u8 + 1, day as u8));
        }
        day = day.checked_sub(*len)?;
    }
    None
}

impl GloTime {
    /// Year of cycle (1..=4) and day of year
    fn year_of_cycle(&self) -> Result<(u16, u16), Error> {
        match self.nt {
            0 => Err(Error::InvalidTime),
            nt if nt <= LEAP_YEAR_DAYS => Ok((1, nt)),
            nt if nt <= LEAP_YEAR_DAYS + YEAR_DAYS => Ok((2, nt - LEAP_YEAR_DAYS)),
            nt if nt <= LEAP_YEAR_DAYS + 2 * YEAR_DAYS => {
                Ok((3, nt - LEAP_YEAR_DAYS - YEAR_DAYS))
            },
            nt if nt <= LEAP_YEAR_DAYS + 3 * YEAR_DAYS => {
                Ok((4, nt - LEAP_YEAR_DAYS - 2 * YEAR_DAYS))
            },
            _ => Err(Error::InvalidTime),
        }
    }

    /// Converts to [Epoch] (UTC).
    pub fn to_epoch(&self) -> Result<Epoch, Error> {
        if self.n4 == 0 || self.n4 > GLO_N4_MAX {
            return Err(Error::InvalidTime);
        }
        if self.h > 23 || self.m > 59 || !self.s.is_finite() || self.s < 0.0 || self.s >= 61.0 {
            return Err(Error::InvalidTime);
        }
        let (year_of_cycle, doy) = self.year_of_cycle()?;
        let year = GLO_EPOCH_YEAR + 4 * (self.n4 as i32 - 1) + (year_of_cycle as i32 - 1);
        let (month, day) = month_day(year, doy).ok_or(Error::InvalidTime)?;

        // an ongoing leap second is removed, then added back
        let leap = self.s >= 60.0;
        let secs = if leap { self.s - 1.0 } else { self.s };

        let whole = secs.floor();

        let utc_su = Epoch::maybe_from_gregorian(
            year,
            month,
            day,
            self.h,
            self.m,
            whole as u8,
            0,
            TimeScale::UTC,
        )
        .map_err(|_| Error::InvalidTime)?
            + Duration::from_seconds(secs - whole);

        let mut utc = utc_su - Duration::from_seconds(UTC_SU_OFFSET_HOURS * 3600.0);
        if leap {
            utc += Duration::from_seconds(1.0);
        }
        Ok(utc)
    }

    /// Converts to [GpsTime], taking leap seconds into account.
    pub fn to_gps(&self) -> Result<GpsTime, Error> {
        let epoch = self.to_epoch()?;
        Ok(GpsTime::from_epoch(epoch))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn validity() {
        for (t, valid) in [
            (GpsTime::new(1892, 0.0), true),
            (GpsTime::new(0, 604799.9), true),
            (GpsTime::new(1892, 604800.0), false),
            (GpsTime::new(1892, -1.0), false),
            (GpsTime::new(WN_UNKNOWN, 10.0), false),
            (GpsTime::new(1892, f64::NAN), false),
            (GpsTime::UNKNOWN, false),
        ] {
            assert_eq!(t.is_valid(), valid, "{}", t);
        }
    }
    #[test]
    fn normalization() {
        for (t, expected) in [
            (GpsTime::new(1000, -1.0), GpsTime::new(999, 604799.0)),
            (GpsTime::new(1000, 604800.0), GpsTime::new(1001, 0.0)),
            (GpsTime::new(1000, 2.0 * 604800.0 + 5.0), GpsTime::new(1002, 5.0)),
            (GpsTime::new(1000, -604800.0 - 5.0), GpsTime::new(998, 604795.0)),
            (GpsTime::new(WN_UNKNOWN, 604805.0), GpsTime::new(WN_UNKNOWN, 5.0)),
            (GpsTime::new(WN_UNKNOWN, -5.0), GpsTime::new(WN_UNKNOWN, 604795.0)),
            (GpsTime::new(i16::MAX, 604805.0), GpsTime::new(i16::MAX, 5.0)),
            (GpsTime::new(i16::MAX - 1, 3.0 * 604800.0), GpsTime::new(i16::MAX, 0.0)),
        ] {
            assert_eq!(t.normalized(), expected, "normalize({})", t);
        }
    }
    #[test]
    fn differences() {
        let t0 = GpsTime::new(1000, 100.0);
        assert_eq!(GpsTime::new(1001, 100.0).diff(&t0), 604800.0);
        assert_eq!(GpsTime::new(999, 50.0).diff(&t0), -604850.0);
        assert_eq!(GpsTime::new(WN_UNKNOWN, 604700.0).diff(&t0), -200.0);
        assert_eq!(
            GpsTime::new(1000, 604700.0).diff(&GpsTime::new(WN_UNKNOWN, 100.0)),
            -200.0
        );
        assert_eq!(GpsTime::new(WN_UNKNOWN, 300.0).diff(&t0), 200.0);
        assert_eq!(t0.add_secs(604800.0 - 50.0), GpsTime::new(1001, 50.0));
    }
    #[test]
    fn week_matching() {
        let reference = GpsTime::new(1000, 302400.0 + 10.0);
        let mut t = GpsTime::new(WN_UNKNOWN, 5.0);
        t.match_weeks(&reference);
        assert_eq!(t.wn, 1001);
        let mut t = GpsTime::new(WN_UNKNOWN, 302400.0);
        t.match_weeks(&reference);
        assert_eq!(t.wn, 1000);

        let reference = GpsTime::new(1000, 1.0);
        let mut t = GpsTime::new(WN_UNKNOWN, 604000.0);
        t.match_weeks(&reference);
        assert_eq!(t.wn, 999);

        let mut t = GpsTime::new(WN_UNKNOWN, 604000.0);
        t.match_weeks(&GpsTime::UNKNOWN);
        assert_eq!(t.wn, WN_UNKNOWN);

        // last representable week
        let mut t = GpsTime::new(WN_UNKNOWN, 5.0);
        t.match_weeks(&GpsTime::new(i16::MAX, 604000.0));
        assert_eq!(t.wn, i16::MAX);
    }
    #[test]
    fn ranges() {
        let begin = GpsTime::new(1000, 604000.0);
        let end = GpsTime::new(1001, 100.0);
        assert!(GpsTime::new(1000, 604000.0).in_range(&begin, &end));
        assert!(GpsTime::new(1001, 0.0).in_range(&begin, &end));
        assert!(GpsTime::new(1001, 100.0).in_range(&begin, &end));
        assert!(!GpsTime::new(1001, 100.5).in_range(&begin, &end));
        assert!(!GpsTime::new(1000, 603999.0).in_range(&begin, &end));
    }
    #[test]
    fn week_rollover() {
        for (raw, reference, expected) in [
            (1876, 1876, 1876),
            (2000, 1876, 2000),
            (852, 1876, 1876),
            (853, 1876, 1877),
            (851, 1876, 2899),
            (0, 1024, 1024),
            (1023, 1024, 2047),
        ] {
            assert_eq!(
                adjust_week_cycle(raw, reference),
                expected,
                "adjust_week_cycle({}, {})",
                raw,
                reference
            );
        }
        for (raw, reference, expected) in [
            (84, 1876, 1876),
            (85, 1876, 1877),
            (83, 1876, 2131),
            (1900, 1876, 1900),
        ] {
            assert_eq!(
                adjust_week_cycle256(raw, reference),
                expected,
                "adjust_week_cycle256({}, {})",
                raw,
                reference
            );
        }
    }
    #[test]
    fn epoch_conversion() {
        let t = GpsTime::new(1892, 301517.0);
        let epoch = t.to_epoch().unwrap();
        assert_eq!(epoch.time_scale, TimeScale::GPST);
        let back = GpsTime::from_epoch(epoch);
        assert_eq!(back.wn, 1892);
        assert!((back.tow - 301517.0).abs() < 1.0E-6);
        assert!(GpsTime::new(WN_UNKNOWN, 10.0).to_epoch().is_none());
    }
    #[test]
    fn glonass_time() {
        // 2016-04-13 14:45:00 UTC(SU)
        let glo = GloTime {
            n4: 6,
            nt: 104,
            h: 14,
            m: 45,
            s: 0.0,
        };
        let gps = glo.to_gps().unwrap();
        assert_eq!(gps.wn, 1892);
        assert!((gps.tow - 301517.0).abs() < 1.0E-6, "tow: {}", gps.tow);

        // first day of year of cycle #2, 2017
        let glo = GloTime {
            n4: 6,
            nt: 367,
            h: 3,
            m: 0,
            s: 0.0,
        };
        let epoch = glo.to_epoch().unwrap();
        assert_eq!(epoch, Epoch::from_gregorian_utc_at_midnight(2017, 1, 1));

        // fractional seconds rounding up to the next minute
        let glo = GloTime {
            n4: 6,
            nt: 104,
            h: 14,
            m: 44,
            s: 59.999_999_999_9,
        };
        let epoch = glo.to_epoch().unwrap();
        let next = GloTime { m: 45, s: 0.0, ..glo }.to_epoch().unwrap();
        assert!((next - epoch).to_seconds().abs() < 1.0E-6);

        for (n4, nt) in [(0, 1), (32, 1), (6, 0), (6, 1462)] {
            let glo = GloTime {
                n4,
                nt,
                h: 0,
                m: 0,
                s: 0.0,
            };
            assert_eq!(glo.to_gps(), Err(Error::InvalidTime), "n4={} nt={}", n4, nt);
        }
    }
    #[test]
    fn day_of_year() {
        assert_eq!(month_day(2016, 60), Some((2, 29)));
        assert_eq!(month_day(2017, 60), Some((3, 1)));
        assert_eq!(month_day(2016, 366), Some((12, 31)));
        assert_eq!(month_day(2017, 366), None);
        assert_eq!(month_day(2017, 1), Some((1, 1)));
    }
}
