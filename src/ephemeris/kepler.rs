//! Keplerian orbit propagation (GPS, QZSS, BeiDou, Galileo)
use crate::{
    constants::{DtrF, MaxIterNumber, Omega, GM, KEPLER_CONVERGENCE},
    ephemeris::{Ephemeris, KeplerParameters, SatelliteState},
    prelude::{Constellation, Error, GpsTime, Vector3},
    time::BDS_SECOND_TO_GPS_SECOND,
};

#[cfg(feature = "log")]
use log::error;

use std::f64::consts::TAU;

/// Solves the Kepler equation `M = E - e sin(E)` for the eccentric anomaly,
/// Newton iterations seeded with the mean anomaly.
/// Returns E [rad] and the number of iterations that were needed.
pub fn solve_kepler(mean_anomaly: f64, ecc: f64) -> Result<(f64, u8), Error> {
    if !mean_anomaly.is_finite() || !(0.0..1.0).contains(&ecc) {
        return Err(Error::KeplerNonConvergence);
    }
    let ma = mean_anomaly.rem_euclid(TAU);
    let mut ea = ma;
    for iter in 1..=MaxIterNumber::KEPLER {
        let next = ea + (ma - ea + ecc * ea.sin()) / (1.0 - ecc * ea.cos());
        let delta = (next - ea).abs();
        ea = next;
        if delta <= KEPLER_CONVERGENCE {
            return Ok((ea, iter));
        }
    }
    Err(Error::KeplerNonConvergence)
}

/// Constellation dependent (GM, earth rotation rate, relativistic F) triplet
fn earth_model(constellation: Constellation) -> Result<(f64, f64, f64), Error> {
    match constellation {
        Constellation::GPS | Constellation::QZSS => Ok((GM::GPS, Omega::GPS, DtrF::GPS)),
        Constellation::Galileo => Ok((GM::GAL, Omega::GPS, DtrF::GAL)),
        Constellation::BeiDou => Ok((GM::BDS, Omega::BDS, DtrF::BDS)),
        c => {
            #[cfg(feature = "log")]
            error!("{} is not propagated with keplerian elements", c);
            Err(Error::UnsupportedConstellation(c))
        },
    }
}

pub(crate) fn kepler_state(
    eph: &Ephemeris,
    k: &KeplerParameters,
    t: &GpsTime,
) -> Result<SatelliteState, Error> {
    let constellation = eph.constellation();
    let (gm, omega_e, dtr_f) = earth_model(constellation)?;

    // satellite clock, iono free form
    let tgd = eph.tgd_correction(eph.sid.code)?;
    let dt = t.diff(&k.toc);
    let mut clock_error = k.af0 + dt * (k.af1 + dt * k.af2) - tgd;
    let clock_rate_error = k.af1 + 2.0 * dt * k.af2;

    let dt = t.diff(&eph.toe) - clock_error;

    let a = k.sqrta * k.sqrta;
    let ma_dot = (gm / (a * a * a)).sqrt() + k.dn;
    let ma = k.m0 + ma_dot * dt;

    let (ea, _) = solve_kepler(ma, k.ecc)?;
    let ecc = k.ecc;
    let (sin_ea, cos_ea) = ea.sin_cos();

    let temp = 1.0 - ecc * cos_ea;
    let ea_dot = ma_dot / temp;
    let ea_acc = -ea_dot * ea_dot * ecc * sin_ea / temp;

    // true anomaly + argument of perigee
    let temp2 = (1.0 - ecc * ecc).sqrt();
    let al = (temp2 * sin_ea).atan2(cos_ea - ecc) + k.w;
    let al_dot = temp2 * ea_dot / temp;
    let al_acc = 2.0 * al_dot * ea_acc / ea_dot;
    let al_dot_sqr = al_dot * al_dot;

    let (sin2al, cos2al) = (2.0 * al).sin_cos();

    // argument of latitude
    let dal = k.cus * sin2al + k.cuc * cos2al;
    let dal_dot = 2.0 * al_dot * (k.cus * cos2al - k.cuc * sin2al);
    let dal_acc = -4.0 * al_dot_sqr * dal + al_acc / al_dot * dal_dot;

    let cal = al + dal;
    let cal_dot = al_dot + dal_dot;
    let cal_acc = al_acc + dal_acc;

    // radius
    let dr = k.crs * sin2al + k.crc * cos2al;
    let dr_dot = 2.0 * al_dot * (k.crs * cos2al - k.crc * sin2al);
    let dr_acc = -4.0 * al_dot_sqr * dr + al_acc / al_dot * dr_dot;

    let r = a * temp + dr;
    let r_dot = a * ecc * sin_ea * ea_dot + dr_dot;
    let r_acc = a * ecc * ea_dot * ea_dot * cos_ea + a * ecc * ea_acc * sin_ea + dr_acc;

    clock_error += dtr_f * ecc * k.sqrta * sin_ea;

    // inclination
    let dinc = k.cis * sin2al + k.cic * cos2al;
    let dinc_dot = 2.0 * al_dot * (k.cis * cos2al - k.cic * sin2al);
    let dinc_acc = -4.0 * al_dot_sqr * dinc + al_acc / al_dot * dinc_dot;

    let inc = k.inc + k.inc_dot * dt + dinc;
    let inc_dot = k.inc_dot + dinc_dot;
    let inc_acc = dinc_acc;
    let (sin_inc, cos_inc) = inc.sin_cos();

    // orbital plane
    let (sin_cal, cos_cal) = cal.sin_cos();
    let x = r * cos_cal;
    let y = r * sin_cal;
    let x_dot = r_dot * cos_cal - y * cal_dot;
    let y_dot = r_dot * sin_cal + x * cal_dot;
    let cal_dot_sqr = cal_dot * cal_dot;
    let x_acc = -cal_dot_sqr * x - cal_acc * y - 2.0 * cal_dot * r_dot * sin_cal + r_acc * cos_cal;
    let y_acc = -cal_dot_sqr * y + cal_acc * x + 2.0 * cal_dot * r_dot * cos_cal + r_acc * sin_cal;

    // longitude of the ascending node
    let om_dot = k.omegadot - omega_e;
    let om = match constellation {
        Constellation::BeiDou => {
            k.omega0 + dt * om_dot - omega_e * (eph.toe.tow - BDS_SECOND_TO_GPS_SECOND)
        },
        _ => k.omega0 + dt * om_dot - omega_e * eph.toe.tow,
    };
    let (sin_om, cos_om) = om.sin_cos();

    let position = Vector3::new(
        x * cos_om - y * cos_inc * sin_om,
        x * sin_om + y * cos_inc * cos_om,
        y * sin_inc,
    );

    let temp = y_dot * cos_inc - y * sin_inc * inc_dot;
    let velocity = Vector3::new(
        -om_dot * position[1] + x_dot * cos_om - temp * sin_om,
        om_dot * position[0] + x_dot * sin_om + temp * cos_om,
        y * cos_inc * inc_dot + y_dot * sin_inc,
    );

    let common_1 = velocity[2] * inc_dot - om_dot * x_dot + y * inc_acc * sin_inc
        - y_acc * cos_inc
        + inc_dot * y_dot * sin_inc;
    let common_2 = x_acc + y * om_dot * inc_dot * sin_inc - om_dot * y_dot * cos_inc;
    let acceleration = Vector3::new(
        -om_dot * velocity[1] + sin_om * common_1 + cos_om * common_2,
        om_dot * velocity[0] - cos_om * common_1 + sin_om * common_2,
        sin_inc * (-y * inc_dot * inc_dot + y_acc) + cos_inc * (y * inc_acc + 2.0 * inc_dot * y_dot),
    );

    Ok(SatelliteState {
        position,
        velocity,
        acceleration,
        clock_error,
        clock_rate_error,
        iodc: k.iodc,
        iode: k.iode,
    })
}
