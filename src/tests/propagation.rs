use crate::{
    almanac::AlmanacKepler,
    constants::SPEED_OF_LIGHT,
    ephemeris::solve_kepler,
    prelude::*,
    tests::toolkit::{assert_close, glonass_ephemeris, gps_ephemeris, GLONASS_FCN},
};

use rand::{rngs::StdRng, Rng, SeedableRng};
use std::f64::consts::{FRAC_PI_2, TAU};

#[test]
fn kepler_solver_contract() {
    let mut rng = StdRng::seed_from_u64(0x6e6176);
    for _ in 0..10_000 {
        let ecc = rng.gen_range(0.0..=0.02);
        let ma = rng.gen_range(-4.0 * TAU..4.0 * TAU);
        let (ea, iter) = solve_kepler(ma, ecc).unwrap();
        assert!(iter <= 10, "e={} M={}: {} iterations", ecc, ma, iter);
        let residual = ea - ecc * ea.sin() - ma.rem_euclid(TAU);
        assert!(residual.abs() < 1.0E-12, "e={} M={}: {:e}", ecc, ma, residual);
    }
    for ecc in [1.0, 1.5, 10.0] {
        assert_eq!(solve_kepler(0.3, ecc), Err(Error::KeplerNonConvergence));
    }
}

#[test]
fn glonass_reference_time() {
    let eph = glonass_ephemeris();
    let glo = eph.glonass().unwrap();
    let state = eph.state(&eph.toe).unwrap();

    // satellite clock offset only
    assert_close(state.clock_error, -glo.tau, 1.0E-15, "clock error");
    assert_eq!(state.clock_rate_error, glo.gamma);
    assert!((state.position - glo.pos).norm() < 1.0);
    assert!((state.velocity - glo.vel).norm() < 1.0E-3);
    assert_eq!(state.iode, glo.iod as u16);
}

#[test]
fn glonass_propagation() {
    let eph = glonass_ephemeris();
    let glo = eph.glonass().unwrap().clone();
    let mut previous = glo.pos;
    for minutes in [5.0_f64, 10.0, 15.0, -5.0, -15.0] {
        let t = eph.toe.add_secs(minutes * 60.0);
        let state = eph.state(&t).unwrap();
        let radius = state.position.norm();
        assert!(
            radius > 25.4E6 && radius < 25.7E6,
            "{} min: radius {}",
            minutes,
            radius
        );
        // travelled distance consistent with orbital speed
        let travelled = (state.position - glo.pos).norm();
        let expected = glo.vel.norm() * minutes.abs() * 60.0;
        assert!(
            (travelled - expected).abs() < 0.1 * expected,
            "{} min: {} m (expecting ~{} m)",
            minutes,
            travelled,
            expected
        );
        assert!(state.position != previous);
        previous = state.position;
    }

    // past the fit interval
    let t = eph.toe.add_secs(2101.0);
    assert_eq!(
        eph.state(&t),
        Err(Error::UnusableEphemeris(EphemerisStatus::TooOld))
    );
}

#[test]
fn glonass_doppler() {
    let eph = glonass_ephemeris();
    let state = eph.state(&eph.toe).unwrap();

    // observer right below the satellite
    let reference = state.position.normalize() * 6_378_137.0;
    let (_, elevation) = eph.azimuth_elevation(&eph.toe, &reference).unwrap();
    assert!(elevation > 89.0_f64.to_radians(), "{}", elevation);

    let ref_vel = Vector3::new(10.0, -20.0, 5.0);
    let doppler = eph.doppler(&eph.toe, &reference, &ref_vel).unwrap();

    let los = state.position - reference;
    let rate = los.dot(&(state.velocity + ref_vel)) / los.norm();
    let carrier = eph.sid.carrier_frequency(Some(GLONASS_FCN)).unwrap();
    assert_close(doppler, carrier * rate / SPEED_OF_LIGHT, 1.0E-6, "doppler");
}

#[test]
fn gps_orbit() {
    let eph = gps_ephemeris();
    let k = eph.kepler().unwrap();
    let a = k.sqrta * k.sqrta;

    for hours in [-1.9, -1.0, 0.0, 1.0, 1.9] {
        let t = eph.toe.add_secs(hours * 3600.0);
        let state = eph.state(&t).unwrap();

        let radius = state.position.norm();
        assert!(
            radius >= a * (1.0 - k.ecc) - 1.0 && radius <= a * (1.0 + k.ecc) + 1.0,
            "{} h: radius {}",
            hours,
            radius
        );

        // velocity and acceleration consistent with finite differences
        let before = eph.state(&t.add_secs(-0.5)).unwrap();
        let after = eph.state(&t.add_secs(0.5)).unwrap();
        let velocity = after.position - before.position;
        assert!(
            (velocity - state.velocity).norm() < 1.0E-2,
            "{} h: {} vs {}",
            hours,
            velocity,
            state.velocity
        );
        let acceleration = after.velocity - before.velocity;
        assert!(
            (acceleration - state.acceleration).norm() < 1.0E-3,
            "{} h: {} vs {}",
            hours,
            acceleration,
            state.acceleration
        );

        // clock polynomial, relativistic term below 100 ns
        let dt = t.diff(&k.toc);
        let polynomial = k.af0 + k.af1 * dt;
        assert!((state.clock_error - polynomial).abs() < 1.0E-7);
        assert_eq!(state.iodc, 33);
        assert_eq!(state.iode, 33);
    }
}

#[test]
fn almanac_against_ephemeris() {
    let eph = gps_ephemeris();
    let k = eph.kepler().unwrap();

    // almanac carrying the same orbit
    let mut almanac = AlmanacEntry::new(eph.sid);
    almanac.toa = eph.toe;
    almanac.valid = true;
    almanac.ura = 900.0;
    almanac.fit_interval = 140 * 3600;
    almanac.data = AlmanacData::Kepler(AlmanacKepler {
        m0: k.m0,
        ecc: k.ecc,
        sqrta: k.sqrta,
        omega0: k.omega0,
        omegadot: k.omegadot,
        w: k.w,
        inc: k.inc,
        af0: k.af0,
        af1: k.af1,
    });

    let t = eph.toe.add_secs(1800.0);
    let from_almanac = almanac.state(&t).unwrap();
    let from_ephemeris = eph.state(&t).unwrap();
    // mean motion correction is not broadcast in almanacs
    assert!((from_almanac.position - from_ephemeris.position).norm() < 50.0E3);

    let reference = Vector3::new(4_696_989.0, 723_994.0, 4_239_678.0);
    let (az, el) = almanac.azimuth_elevation(&t, &reference).unwrap();
    let (az_eph, el_eph) = eph.azimuth_elevation(&t, &reference).unwrap();
    assert!((0.0..TAU).contains(&az));
    assert!((-FRAC_PI_2..=FRAC_PI_2).contains(&el));
    assert!((el - el_eph).abs() < 0.01);
    assert!((az - az_eph).abs() < 0.01 || (az - az_eph).abs() > TAU - 0.01);
}

#[test]
fn direct_position() {
    let sid = SignalId::new(123, Code::SbasL1CA).unwrap();
    let toe = GpsTime::new(2000, 3600.0);
    let mut eph = Ephemeris::new(sid).with_toe(toe).with_fit_interval(240);
    eph.valid = true;
    eph.ura = 4.0;
    let xyz = eph.xyz_mut().unwrap();
    xyz.pos = Vector3::new(4.0E7, 2.4E6, -4.0E3);
    xyz.vel = Vector3::new(1.0, -1.0, 0.5);
    xyz.acc = Vector3::new(1.0E-4, 0.0, -1.0E-4);

    let state = eph.state(&toe.add_secs(100.0)).unwrap();
    let expected = Vector3::new(4.0E7 + 100.0 + 0.5, 2.4E6 - 100.0, -4.0E3 + 50.0 - 0.5);
    assert!((state.position - expected).norm() < 1.0E-6);
    assert_eq!(state.acceleration, Vector3::new(1.0E-4, 0.0, -1.0E-4));

    assert_eq!(
        eph.state(&toe.add_secs(121.0)),
        Err(Error::UnusableEphemeris(EphemerisStatus::TooOld))
    );
    assert!(eph.state_unchecked(&toe.add_secs(121.0)).is_ok());
}
