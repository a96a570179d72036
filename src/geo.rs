use geo_types::Point;

/// Mean earth radius in metres.
pub const EARTH_RADIUS: f64 = 6_371_000.0;

/// Great-circle distance in metres between two points given as
/// (longitude, latitude) in degrees.
pub fn haversine_distance(a: Point<f64>, b: Point<f64>) -> f64 {
    let phi1 = a.y().to_radians();
    let phi2 = b.y().to_radians();
    let delta_phi = (b.y() - a.y()).to_radians();
    let delta_lambda = (b.x() - a.x()).to_radians();

    let sq = |x: f64| x * x;

    // rounding can push h just past 1 for near-antipodal points
    let h = (sq((delta_phi / 2.0).sin()) + phi1.cos() * phi2.cos() * sq((delta_lambda / 2.0).sin()))
        .clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS * h.sqrt().atan2((1.0 - h).sqrt())
}

#[test]
fn zero_distance_for_same_point() {
    let p = Point::new(75.88, 26.40);
    assert_eq!(haversine_distance(p, p), 0.0);
}

#[test]
fn one_degree_of_longitude_on_the_equator() {
    let origin = Point::new(0.0, 0.0);
    let east = Point::new(1.0, 0.0);

    let distance = haversine_distance(origin, east);
    assert!((distance - 111_194.9).abs() < 1.0);
}

#[test]
fn distance_is_symmetric() {
    let jaipur = Point::new(75.7873, 26.9124);
    let tonk = Point::new(75.7895, 26.1664);

    let there = haversine_distance(jaipur, tonk);
    let back = haversine_distance(tonk, jaipur);

    assert!((there - back).abs() < 1e-6);
    assert!(there > 80_000.0 && there < 85_000.0);
}

#[test]
fn antipodal_points_are_half_the_circumference_apart() {
    let half_circumference = std::f64::consts::PI * EARTH_RADIUS;

    for tenths in -450..=450 {
        let latitude = f64::from(tenths) / 10.0;
        let a = Point::new(0.0, latitude);
        let b = Point::new(180.0, -latitude);

        let distance = haversine_distance(a, b);
        assert!(!distance.is_nan(), "NaN at latitude {}", latitude);
        assert!((distance - half_circumference).abs() < 1.0);
    }

    let distance = haversine_distance(Point::new(0.0, -41.355), Point::new(180.0, 41.355));
    assert!(!distance.is_nan());
}
