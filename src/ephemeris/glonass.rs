//! GLONASS orbit propagation: RK4 integration of the PZ-90
//! equations of motion (central term, J2, earth rotation, luni-solar).
use nalgebra::{Vector3, Vector6};

use crate::{
    constants::{GloIntegration, Omega, Pz90, GM},
    ephemeris::{Ephemeris, GlonassParameters, SatelliteState},
    prelude::{Error, GpsTime},
};

/// Time derivative of the (position, velocity) state
fn derivative(state: &Vector6<f64>, acc: &Vector3<f64>) -> Vector6<f64> {
    let (x, y, z) = (state[0], state[1], state[2]);
    let (vx, vy) = (state[3], state[4]);

    let r = (x * x + y * y + z * z).sqrt();
    let m_r3 = GM::GLO / (r * r * r);
    let inv_r2 = 1.0 / (r * r);
    let g = 1.5 * Pz90::J02 * m_r3 * Pz90::A_E * Pz90::A_E * inv_r2;
    let lg = 1.0 - 5.0 * z * z * inv_r2;
    let omega_sqr = Omega::GLO * Omega::GLO;

    Vector6::new(
        state[3],
        state[4],
        state[5],
        -m_r3 * x - g * x * lg + omega_sqr * x + 2.0 * Omega::GLO * vy + acc[0],
        -m_r3 * y - g * y * lg + omega_sqr * y - 2.0 * Omega::GLO * vx + acc[1],
        -m_r3 * z - g * z * (2.0 + lg) + acc[2],
    )
}

/// Integrates `state` over `dt` seconds, in at most
/// [GloIntegration::MAX_STEP_NUM] steps of about
/// [GloIntegration::MAX_STEP_LENGTH].
fn integrate(state: Vector6<f64>, acc: &Vector3<f64>, dt: f64) -> Vector6<f64> {
    let steps = ((dt.abs() / GloIntegration::MAX_STEP_LENGTH).ceil() as u32)
        .min(GloIntegration::MAX_STEP_NUM);
    if steps == 0 {
        return state;
    }
    let h = dt / steps as f64;
    let mut y = state;
    for _ in 0..steps {
        let k1 = derivative(&y, acc);
        let k2 = derivative(&(y + k1 * (h / 2.0)), acc);
        let k3 = derivative(&(y + k2 * (h / 2.0)), acc);
        let k4 = derivative(&(y + k3 * h), acc);
        y += (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0);
    }
    y
}

pub(crate) fn glonass_state(
    eph: &Ephemeris,
    glo: &GlonassParameters,
    t: &GpsTime,
) -> Result<SatelliteState, Error> {
    let tgd = eph.tgd_correction(eph.sid.code)?;
    let dt = t.diff(&eph.toe);

    let clock_error = -glo.tau + glo.gamma * dt - tgd;
    let clock_rate_error = glo.gamma;

    let dt = dt - clock_error;

    let initial = Vector6::new(
        glo.pos[0], glo.pos[1], glo.pos[2], glo.vel[0], glo.vel[1], glo.vel[2],
    );
    let y = integrate(initial, &glo.acc, dt);
    let dydt = derivative(&y, &glo.acc);

    Ok(SatelliteState {
        position: Vector3::new(y[0], y[1], y[2]),
        velocity: Vector3::new(y[3], y[4], y[5]),
        acceleration: Vector3::new(dydt[3], dydt[4], dydt[5]),
        clock_error,
        clock_rate_error,
        iodc: glo.iod as u16,
        iode: glo.iod as u16,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn no_integration() {
        let state = Vector6::new(1.0E7, 2.0E7, 3.0E6, 1.0E3, -2.0E3, 5.0E2);
        let acc = Vector3::new(1.0E-6, 0.0, 0.0);
        assert_eq!(integrate(state, &acc, 0.0), state);
    }
    #[test]
    fn energy_conservation() {
        // circular equatorial orbit, expressed in the rotating frame
        let r = 25_510_000.0_f64;
        let v_inertial = (GM::GLO / r).sqrt();
        let state = Vector6::new(r, 0.0, 0.0, 0.0, v_inertial - Omega::GLO * r, 0.0);
        let acc = Vector3::zeros();
        for dt in [-900.0, 300.0, 900.0] {
            let y = integrate(state, &acc, dt);
            let radius = (y[0] * y[0] + y[1] * y[1] + y[2] * y[2]).sqrt();
            // J2 makes the orbit slightly non circular
            assert!((radius - r).abs() < 1.0E3, "dt={}: r={}", dt, radius);
            assert!(y[2].abs() < 1.0E-6, "dt={}: left the equatorial plane", dt);
        }
    }
    #[test]
    fn step_bound() {
        // beyond 15 minutes, steps grow larger than 30s
        let state = Vector6::new(1.9E7, 1.5E7, 0.0, -1.0E3, 2.0E3, 2.5E3);
        let acc = Vector3::zeros();
        let far = integrate(state, &acc, 3600.0);
        assert!(far.iter().all(|v| v.is_finite()));
    }
}
