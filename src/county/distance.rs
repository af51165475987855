//! Great-circle distance on a spherical Earth.

use geo::{Distance, HaversineMeasure, Point};

/// Mean Earth radius used for all county distances
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Haversine distance in miles between two points (x = lon, y = lat)
pub fn distance_between(a: Point, b: Point) -> f64 {
    HaversineMeasure::new(EARTH_RADIUS_MILES).distance(a, b)
}

/// Haversine distance in miles between two lat/lon pairs given in degrees
pub fn distance_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    distance_between(Point::new(lon1, lat1), Point::new(lon2, lat2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn springfield() -> Point {
        Point::new(-89.6501, 39.7817)
    }

    fn chicago() -> Point {
        Point::new(-87.6298, 41.8781)
    }

    #[test]
    fn test_identical_points_are_zero() {
        assert_eq!(distance_between(springfield(), springfield()), 0.0);
        assert_eq!(distance_miles(0.0, 0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let ab = distance_between(springfield(), chicago());
        let ba = distance_between(chicago(), springfield());
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn test_known_distance() {
        // Springfield, IL to Chicago, IL is roughly 180 miles as the crow flies
        let d = distance_miles(39.7817, -89.6501, 41.8781, -87.6298);
        assert!(d > 175.0 && d < 190.0, "got {}", d);
        assert!((d - distance_between(springfield(), chicago())).abs() < 1e-9);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let d = distance_miles(0.0, 0.0, 1.0, 0.0);
        let expected = EARTH_RADIUS_MILES * std::f64::consts::PI / 180.0;
        assert!((d - expected).abs() < 1e-6);
    }
}
