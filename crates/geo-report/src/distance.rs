//! Great-circle distance on a spherical Earth

/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two (lat, lon) points in km.
///
/// Symmetric in its arguments and exactly zero for bitwise-identical
/// points. Out-of-range coordinates are not rejected; the formula is
/// applied as-is.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push the intermediate term a hair outside [0, 1],
    // which would make the square roots NaN
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_haversine_known_distances() {
        // NYC to London: ~5,570 km
        let dist = haversine_km(40.7128, -74.0060, 51.5074, -0.1278);
        assert!((dist - 5570.0).abs() < 50.0);

        // Same point: 0 km
        let dist = haversine_km(0.0, 0.0, 0.0, 0.0);
        assert_eq!(dist, 0.0);

        // Quarter of the equator
        let dist = haversine_km(0.0, 0.0, 0.0, 90.0);
        let quarter = EARTH_RADIUS_KM * std::f64::consts::FRAC_PI_2;
        assert!((dist - quarter).abs() < 1e-6);
    }

    #[test]
    fn test_haversine_identical_point_is_exactly_zero() {
        let dist = haversine_km(48.8566, 2.3522, 48.8566, 2.3522);
        assert_eq!(dist, 0.0);
    }

    #[test]
    fn test_haversine_antipodal_is_finite() {
        // Antipodal points sit right at the clamp boundary
        let dist = haversine_km(90.0, 0.0, -90.0, 0.0);
        assert!(dist.is_finite());
        assert!((dist - EARTH_RADIUS_KM * std::f64::consts::PI).abs() < 1.0);
    }

    proptest! {
        #[test]
        fn prop_symmetric(
            lat1 in -90.0f64..90.0,
            lon1 in -180.0f64..180.0,
            lat2 in -90.0f64..90.0,
            lon2 in -180.0f64..180.0,
        ) {
            let ab = haversine_km(lat1, lon1, lat2, lon2);
            let ba = haversine_km(lat2, lon2, lat1, lon1);
            prop_assert!((ab - ba).abs() < 1e-9);
        }

        #[test]
        fn prop_self_distance_zero(lat in -90.0f64..90.0, lon in -180.0f64..180.0) {
            prop_assert_eq!(haversine_km(lat, lon, lat, lon), 0.0);
        }

        #[test]
        fn prop_never_nan_or_negative(
            lat1 in -90.0f64..90.0,
            lon1 in -180.0f64..180.0,
            lat2 in -90.0f64..90.0,
            lon2 in -180.0f64..180.0,
        ) {
            let d = haversine_km(lat1, lon1, lat2, lon2);
            prop_assert!(d.is_finite());
            prop_assert!(d >= 0.0);
        }
    }
}
