//! WGS84 geodesy helpers, used by the elevation / azimuth calculations
use nalgebra::{Matrix3, Vector3};

/// WGS84 semi major axis [m]
const WGS84_A: f64 = 6_378_137.0;

/// WGS84 flattening
const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// Converts ECEF coordinates [m] to geodetic (latitude [rad], longitude [rad], altitude [m]).
/// Iterative resolution, converging in a few steps for terrestrial and orbital positions.
pub(crate) fn ecef2llh(ecef: &Vector3<f64>) -> (f64, f64, f64) {
    let e2 = WGS84_F * (2.0 - WGS84_F);
    let p = (ecef[0] * ecef[0] + ecef[1] * ecef[1]).sqrt();
    let lon = ecef[1].atan2(ecef[0]);

    if p < 1.0E-9 {
        // on the polar axis
        let b = WGS84_A * (1.0 - WGS84_F);
        let lat = if ecef[2] >= 0.0 {
            std::f64::consts::FRAC_PI_2
        } else {
            -std::f64::consts::FRAC_PI_2
        };
        return (lat, 0.0, ecef[2].abs() - b);
    }

    let mut lat = ecef[2].atan2(p * (1.0 - e2));
    let mut alt = 0.0;
    for _ in 0..10 {
        let sin_lat = lat.sin();
        let n = WGS84_A / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        alt = p / lat.cos() - n;
        let next = ecef[2].atan2(p * (1.0 - e2 * n / (n + alt)));
        let converged = (next - lat).abs() < 1.0E-12;
        lat = next;
        if converged {
            break;
        }
    }
    (lat, lon, alt)
}

/// ECEF to local North East Down rotation matrix, at given geodetic coordinates
fn ecef2ned_matrix(lat: f64, lon: f64) -> Matrix3<f64> {
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();
    Matrix3::new(
        -sin_lat * cos_lon,
        -sin_lat * sin_lon,
        cos_lat,
        -sin_lon,
        cos_lon,
        0.0,
        -cos_lat * cos_lon,
        -cos_lat * sin_lon,
        -sin_lat,
    )
}

/// Azimuth and elevation [rad] of `target` seen from `reference`, both ECEF [m].
/// Azimuth is wrapped to [0, 2π[.
pub(crate) fn azimuth_elevation(target: &Vector3<f64>, reference: &Vector3<f64>) -> (f64, f64) {
    let (lat, lon, _) = ecef2llh(reference);
    let ned = ecef2ned_matrix(lat, lon) * (target - reference);

    let mut azimuth = ned[1].atan2(ned[0]);
    if azimuth < 0.0 {
        azimuth += 2.0 * std::f64::consts::PI;
    }
    let horizontal = (ned[0] * ned[0] + ned[1] * ned[1]).sqrt();
    let elevation = (-ned[2]).atan2(horizontal);
    (azimuth, elevation)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};
    #[test]
    fn geodetic_coordinates() {
        let (lat, lon, alt) = ecef2llh(&Vector3::new(WGS84_A, 0.0, 0.0));
        assert!(lat.abs() < 1.0E-12);
        assert!(lon.abs() < 1.0E-12);
        assert!(alt.abs() < 1.0E-6);

        let (lat, lon, alt) = ecef2llh(&Vector3::new(0.0, WGS84_A + 1000.0, 0.0));
        assert!(lat.abs() < 1.0E-12);
        assert!((lon - FRAC_PI_2).abs() < 1.0E-12);
        assert!((alt - 1000.0).abs() < 1.0E-6);

        let b = WGS84_A * (1.0 - WGS84_F);
        let (lat, _, alt) = ecef2llh(&Vector3::new(0.0, 0.0, -b - 10.0));
        assert_eq!(lat, -FRAC_PI_2);
        assert!((alt - 10.0).abs() < 1.0E-6);
    }
    #[test]
    fn zenith_and_horizon() {
        let reference = Vector3::new(WGS84_A, 0.0, 0.0);

        let (_, el) = azimuth_elevation(&Vector3::new(WGS84_A + 20.0E6, 0.0, 0.0), &reference);
        assert!((el - FRAC_PI_2).abs() < 1.0E-9);

        // due north, on the horizon
        let (az, el) = azimuth_elevation(&Vector3::new(WGS84_A, 0.0, 1000.0), &reference);
        assert!(az.abs() < 1.0E-9 || (az - 2.0 * PI).abs() < 1.0E-9);
        assert!(el.abs() < 1.0E-9);

        // due east
        let (az, el) = azimuth_elevation(&Vector3::new(WGS84_A, 1000.0, 0.0), &reference);
        assert!((az - FRAC_PI_2).abs() < 1.0E-9);
        assert!(el.abs() < 1.0E-9);

        // due west
        let (az, _) = azimuth_elevation(&Vector3::new(WGS84_A, -1000.0, 0.0), &reference);
        assert!((az - 3.0 * FRAC_PI_2).abs() < 1.0E-9);
    }
}
