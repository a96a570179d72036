use oso::{Oso, PolarClass};

use crate::auth::{Platform, User};
use crate::entities::Booking;
use crate::error::Error;
use crate::notify::Topic;

pub fn new() -> Result<Oso, Error> {
    let mut o = Oso::new();

    o.register_class(Platform::get_polar_class())?;
    o.register_class(User::get_polar_class())?;
    o.register_class(Booking::get_polar_class())?;
    o.register_class(Topic::get_polar_class())?;

    o.load_str(include_str!("rules.polar"))?;

    Ok(o)
}

#[cfg(test)]
fn user(id: &str, roles: &[&str]) -> User {
    User::new(id.into(), roles.iter().map(|role| role.to_string()).collect())
}

#[test]
fn platform_role_test() {
    let authorizor = new().unwrap();

    let student = user("s1", &["student"]);
    let passenger = user("p1", &["passenger"]);
    let driver = user("d1", &["driver"]);
    let admin = user("a1", &["admin"]);

    let result = authorizor.is_allowed(student.clone(), "request_booking", Platform);
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(passenger.clone(), "request_booking", Platform);
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(driver.clone(), "request_booking", Platform);
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(driver.clone(), "list_driver_bookings", Platform);
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(student.clone(), "list_driver_bookings", Platform);
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(driver.clone(), "update_driver", Platform);
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(driver.clone(), "read_driver", Platform);
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(student.clone(), "read_driver", Platform);
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(student.clone(), "list_stations", Platform);
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(student.clone(), "manage_stations", Platform);
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(admin.clone(), "manage_stations", Platform);
    assert_eq!(result.unwrap(), true);
}

#[test]
fn booking_driver_role_test() {
    let authorizor = new().unwrap();

    let passenger = user("p1", &["student"]);
    let driver = user("d1", &["driver"]);
    let other_driver = user("d2", &["driver"]);

    let booking = Booking::new(
        passenger.id.clone(),
        "a".into(),
        "b".into(),
        Some(driver.id.clone()),
    );

    let result = authorizor.is_allowed(driver.clone(), "update_status", booking.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(other_driver.clone(), "update_status", booking.clone());
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(passenger.clone(), "update_status", booking.clone());
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(passenger.clone(), "read", booking.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(driver.clone(), "read", booking.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(other_driver.clone(), "read", booking.clone());
    assert_eq!(result.unwrap(), false);
}

#[test]
fn unassigned_booking_test() {
    let authorizor = new().unwrap();

    let passenger = user("p1", &["student"]);
    let driver = user("d1", &["driver"]);

    let booking = Booking::new(passenger.id.clone(), "a".into(), "b".into(), None);

    let result = authorizor.is_allowed(driver.clone(), "update_status", booking.clone());
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(driver.clone(), "read", booking.clone());
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(passenger.clone(), "update_status", booking.clone());
    assert_eq!(result.unwrap(), false);
}

#[test]
fn topic_subscription_test() {
    let authorizor = new().unwrap();

    let passenger = user("p1", &["student"]);
    let driver = user("d1", &["driver"]);

    let result = authorizor.is_allowed(passenger.clone(), "subscribe", Topic::Passenger("p1".into()));
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(passenger.clone(), "subscribe", Topic::Passenger("p2".into()));
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(passenger.clone(), "subscribe", Topic::Driver("p1".into()));
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(driver.clone(), "subscribe", Topic::Driver("d1".into()));
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(driver.clone(), "subscribe", Topic::Driver("d2".into()));
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(driver.clone(), "subscribe", Topic::Passenger("d1".into()));
    assert_eq!(result.unwrap(), true);
}
