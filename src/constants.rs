//! const values of GNSS

/// Speed of light in vacuum [m.s⁻¹]
pub(crate) const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// GPS value of PI, as used in the broadcast scale factors
pub(crate) const GPS_PI: f64 = 3.1415926535898;

/// Seconds in one GPS week
pub(crate) const WEEK_SECS: f64 = 604_800.0;

/// Earth gravitational constant, per constellation
pub(crate) struct GM;

impl GM {
    pub const GPS: f64 = 3.986005E14;
    pub const BDS: f64 = 3.986004418E14;
    pub const GLO: f64 = 3.986004418E14;
    pub const GAL: f64 = 3.986004418E14;
}

/// Earth rotation rate [rad.s⁻¹]
pub(crate) struct Omega;

impl Omega {
    pub const GPS: f64 = 7.2921151467E-5;
    pub const BDS: f64 = 7.292115E-5;
    pub const GLO: f64 = 7.292115E-5;
}

/// - 2 * sqrt(gm) / c / c
pub(crate) struct DtrF;

impl DtrF {
    pub const GPS: f64 = -0.000000000444280763339306;
    pub const BDS: f64 = -0.00000000044428073090439775;
    pub const GAL: f64 = -0.00000000044428073090439775;
}

/// PZ-90 Earth model, used by the GLONASS propagator
pub(crate) struct Pz90;

impl Pz90 {
    /// Equatorial radius [m]
    pub const A_E: f64 = 6_378_136.0;
    /// Second zonal harmonic
    pub const J02: f64 = 1.08262575E-3;
}

pub(crate) struct MaxIterNumber;

impl MaxIterNumber {
    /// Maximum number of iterations to solve the Kepler equation
    pub const KEPLER: u8 = 20;
}

/// Kepler solver convergence threshold [rad]
pub(crate) const KEPLER_CONVERGENCE: f64 = 1.0E-12;

/// GLONASS RK4 integration bounds
pub(crate) struct GloIntegration;

impl GloIntegration {
    /// Nominal integration step [s]
    pub const MAX_STEP_LENGTH: f64 = 30.0;
    /// Maximum number of integration steps
    pub const MAX_STEP_NUM: u32 = 30;
}

/// Carrier frequencies [Hz]
pub(crate) struct Carrier;

impl Carrier {
    pub const GPS_L1: f64 = 1.57542E9;
    pub const GPS_L2: f64 = 1.22760E9;
    pub const GPS_L5: f64 = 115.0 * 10.23E6;
    pub const SBAS_L1: f64 = 1.023E6 * 1540.0;
    pub const SBAS_L5: f64 = 1.023E6 * 1150.0;
    pub const GLO_L1: f64 = 1.602E9;
    pub const GLO_L2: f64 = 1.246E9;
    pub const GLO_L1_DELTA: f64 = 5.625E5;
    pub const GLO_L2_DELTA: f64 = 4.375E5;
    pub const BDS2_B1: f64 = 1.023E6 * (1540.0 - 14.0);
    pub const BDS2_B2: f64 = 1.023E6 * 1180.0;
    pub const BDS3_B1C: f64 = 154.0 * 10.23E6;
    pub const BDS3_B3: f64 = 124.0 * 10.23E6;
    pub const BDS3_B7: f64 = 118.0 * 10.23E6;
    pub const BDS3_B5: f64 = 115.0 * 10.23E6;
    pub const GAL_E1: f64 = 1.023E6 * 1540.0;
    pub const GAL_E6: f64 = 1.023E6 * 1250.0;
    pub const GAL_E7: f64 = 1.023E6 * 1180.0;
    pub const GAL_E8: f64 = 1.023E6 * 1165.0;
    pub const GAL_E5: f64 = 1.023E6 * 1150.0;
    pub const QZS_L1: f64 = 1.57542E9;
    pub const QZS_L2: f64 = 1.22760E9;
    pub const QZS_L5: f64 = 115.0 * 10.23E6;
}

/// Powers of two used by the broadcast scale factors
#[inline]
pub(crate) fn p2(exp: i32) -> f64 {
    2.0_f64.powi(exp)
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn powers_of_two() {
        assert_eq!(p2(0), 1.0);
        assert_eq!(p2(11), 2048.0);
        assert_eq!(p2(-11), 1.0 / 2048.0);
        assert_eq!(p2(-30), 9.313225746154785e-10);
        assert_eq!(p2(-9), 0.001953125);
    }
}
