//! SBAS GEO propagation: constant acceleration model
use crate::{
    ephemeris::{Ephemeris, SatelliteState, XyzParameters},
    prelude::{Error, GpsTime},
};

pub(crate) fn sbas_state(
    eph: &Ephemeris,
    xyz: &XyzParameters,
    t: &GpsTime,
) -> Result<SatelliteState, Error> {
    let dt = t.diff(&eph.toe);
    let clock_error = xyz.a_gf0 + dt * xyz.a_gf1;
    let clock_rate_error = xyz.a_gf1;

    let dt = dt - clock_error;

    Ok(SatelliteState {
        position: xyz.pos + xyz.vel * dt + xyz.acc * (0.5 * dt * dt),
        velocity: xyz.vel + xyz.acc * dt,
        acceleration: xyz.acc,
        clock_error,
        clock_rate_error,
        // not broadcast
        iodc: 0,
        iode: 0,
    })
}
