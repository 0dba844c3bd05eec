//! Broadcast ionospheric models
use bitflags::bitflags;

use crate::{
    constants::{GPS_PI, SPEED_OF_LIGHT},
    time::GpsTime,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Klobuchar model, as broadcast in GPS subframe 4 page 18
#[derive(Debug, Copy, Clone, Default, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KbModel {
    /// Alpha coefficients
    /// ((s), (s.semi-circle⁻¹), (s.semi-circle⁻²), (s.semi-circle⁻³))
    pub alpha: (f64, f64, f64, f64),
    /// Beta coefficients
    /// ((s), (s.semi-circle⁻¹), (s.semi-circle⁻²), (s.semi-circle⁻³))
    pub beta: (f64, f64, f64, f64),
}

fn cubic(c: (f64, f64, f64, f64), x: f64) -> f64 {
    c.0 + x * (c.1 + x * (c.2 + x * c.3))
}

impl KbModel {
    /// L1 ionospheric delay [m] seen at `t` from a receiver at
    /// latitude `lat` and longitude `lon`, towards a satellite at
    /// `azimuth` and `elevation`. All angles in radians.
    pub fn delay(&self, t: &GpsTime, lat: f64, lon: f64, azimuth: f64, elevation: f64) -> f64 {
        // semi-circles from here on
        let e = elevation / GPS_PI;
        let phi_u = lat / GPS_PI;
        let lam_u = lon / GPS_PI;

        let psi = 0.0137 / (e + 0.11) - 0.022;
        let phi_i = (phi_u + psi * azimuth.cos()).clamp(-0.416, 0.416);
        let lam_i = lam_u + psi * azimuth.sin() / (phi_i * GPS_PI).cos();
        let phi_m = phi_i + 0.064 * ((lam_i - 1.617) * GPS_PI).cos();

        let t_local = (4.32E4 * lam_i + t.tow).rem_euclid(86_400.0);

        let amplitude = cubic(self.alpha, phi_m).max(0.0);
        let period = cubic(self.beta, phi_m).max(72_000.0);

        let x = 2.0 * GPS_PI * (t_local - 50_400.0) / period;
        let slant = 1.0 + 16.0 * (0.53 - e).powi(3);

        let dt = if x.abs() < 1.57 {
            let x2 = x * x;
            slant * (5.0E-9 + amplitude * (1.0 - x2 / 2.0 + x2 * x2 / 24.0))
        } else {
            slant * 5.0E-9
        };
        dt * SPEED_OF_LIGHT
    }
}

bitflags! {
    /// NeQuick-G disturbance flags, one per region
    #[derive(Debug, Default, Clone, Copy)]
    #[derive(PartialEq, PartialOrd)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct NgRegionFlags: u16 {
        const REGION5 = 0x01;
        const REGION4 = 0x02;
        const REGION3 = 0x04;
        const REGION2 = 0x08;
        const REGION1 = 0x10;
    }
}

/// NeQuick-G model, as broadcast in Galileo I/NAV word 5
#[derive(Debug, Clone, Default, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NgModel {
    /// a_i coefficients
    /// (sfu, (sfu.degree⁻¹), (sfu.degree⁻²))
    pub a: (f64, f64, f64),
    /// Disturbance flags
    pub region: NgRegionFlags,
}

impl NgModel {
    /// Effective ionisation level [sfu] at modified dip latitude `modip` (degrees)
    pub fn effective_ionisation(&self, modip: f64) -> f64 {
        let az = self.a.0 + modip * (self.a.1 + modip * self.a.2);
        az.max(0.0)
    }
}
