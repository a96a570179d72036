use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BookingStore, DriverRegistry, StationDirectory};
use crate::entities::{Booking, Driver, Station};
use crate::error::{invalid_input_error, not_found_error, Error};

/// Process-local store. Collections keep insertion order so that listings
/// and driver selection are deterministic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    drivers: RwLock<Vec<Driver>>,
    stations: RwLock<Vec<Station>>,
    bookings: RwLock<Vec<Booking>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DriverRegistry for MemoryStore {
    #[tracing::instrument(skip(self))]
    async fn find_available_drivers(&self) -> Result<Vec<Driver>, Error> {
        let drivers = self.drivers.read().await;

        Ok(drivers.iter().filter(|d| d.is_available()).cloned().collect())
    }

    #[tracing::instrument(skip(self))]
    async fn find_driver(&self, id: &str) -> Result<Option<Driver>, Error> {
        let drivers = self.drivers.read().await;

        Ok(drivers.iter().find(|d| d.id == id).cloned())
    }

    #[tracing::instrument(skip(self))]
    async fn save_driver(&self, driver: &Driver) -> Result<(), Error> {
        let mut drivers = self.drivers.write().await;

        match drivers.iter_mut().find(|d| d.id == driver.id) {
            Some(existing) => *existing = driver.clone(),
            None => drivers.push(driver.clone()),
        }

        Ok(())
    }
}

#[async_trait]
impl StationDirectory for MemoryStore {
    #[tracing::instrument(skip(self))]
    async fn find_station(&self, id: &str) -> Result<Option<Station>, Error> {
        let stations = self.stations.read().await;

        Ok(stations.iter().find(|s| s.id == id).cloned())
    }

    #[tracing::instrument(skip(self))]
    async fn list_stations(&self) -> Result<Vec<Station>, Error> {
        Ok(self.stations.read().await.clone())
    }

    #[tracing::instrument(skip(self))]
    async fn insert_station(&self, station: &Station) -> Result<(), Error> {
        let mut stations = self.stations.write().await;

        if stations.iter().any(|s| s.id == station.id) {
            return Err(invalid_input_error());
        }

        stations.push(station.clone());

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_station(&self, id: &str) -> Result<bool, Error> {
        let mut stations = self.stations.write().await;
        let before = stations.len();

        stations.retain(|s| s.id != id);

        Ok(stations.len() != before)
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    #[tracing::instrument(skip(self))]
    async fn insert_booking(&self, booking: &Booking) -> Result<(), Error> {
        let mut bookings = self.bookings.write().await;

        if bookings.iter().any(|b| b.id == booking.id) {
            return Err(invalid_input_error());
        }

        bookings.push(booking.clone());

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn update_booking(&self, booking: &Booking) -> Result<(), Error> {
        let mut bookings = self.bookings.write().await;

        let existing = bookings
            .iter_mut()
            .find(|b| b.id == booking.id)
            .ok_or_else(not_found_error)?;

        *existing = booking.clone();

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn find_booking(&self, id: Uuid) -> Result<Option<Booking>, Error> {
        let bookings = self.bookings.read().await;

        Ok(bookings.iter().find(|b| b.id == id).cloned())
    }

    #[tracing::instrument(skip(self))]
    async fn find_bookings_by_passenger(&self, passenger_id: &str) -> Result<Vec<Booking>, Error> {
        let bookings = self.bookings.read().await;

        Ok(bookings
            .iter()
            .filter(|b| b.passenger_id == passenger_id)
            .cloned()
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn find_bookings_by_driver(&self, driver_id: &str) -> Result<Vec<Booking>, Error> {
        let bookings = self.bookings.read().await;

        Ok(bookings
            .iter()
            .filter(|b| b.is_assigned_to(driver_id))
            .cloned()
            .collect())
    }
}

#[test]
fn available_drivers_keep_registration_order() {
    use tokio_test::block_on;

    let store = MemoryStore::new();

    for (id, available) in [("d1", true), ("d2", false), ("d3", true)] {
        let mut driver = Driver::new(id.into());
        driver.update(Some(available), Some("a".into()));
        block_on(store.save_driver(&driver)).unwrap();
    }

    // re-saving keeps the original position
    let mut driver = block_on(store.find_driver("d1")).unwrap().unwrap();
    driver.update(None, Some("b".into()));
    block_on(store.save_driver(&driver)).unwrap();

    let ids: Vec<String> = block_on(store.find_available_drivers())
        .unwrap()
        .into_iter()
        .map(|d| d.id)
        .collect();

    assert_eq!(ids, vec!["d1".to_string(), "d3".to_string()]);
}

#[test]
fn station_ids_are_unique() {
    use tokio_test::block_on;

    let store = MemoryStore::new();
    let station = Station::new("a".into(), "Gate".into(), None, None).unwrap();

    block_on(store.insert_station(&station)).unwrap();
    let err = block_on(store.insert_station(&station)).unwrap_err();
    assert!(err.is_invalid_input_error());

    assert!(block_on(store.delete_station("a")).unwrap());
    assert!(!block_on(store.delete_station("a")).unwrap());
    assert!(block_on(store.find_station("a")).unwrap().is_none());
}

#[test]
fn bookings_are_queryable_by_party() {
    use tokio_test::block_on;

    let store = MemoryStore::new();

    let first = Booking::new("p1".into(), "a".into(), "b".into(), Some("d1".into()));
    let second = Booking::new("p1".into(), "b".into(), "a".into(), None);
    let third = Booking::new("p2".into(), "a".into(), "c".into(), Some("d1".into()));

    for booking in [&first, &second, &third] {
        block_on(store.insert_booking(booking)).unwrap();
    }

    let by_passenger = block_on(store.find_bookings_by_passenger("p1")).unwrap();
    assert_eq!(by_passenger, vec![first.clone(), second.clone()]);

    let by_driver = block_on(store.find_bookings_by_driver("d1")).unwrap();
    assert_eq!(by_driver, vec![first.clone(), third.clone()]);

    let missing = Booking::new("p3".into(), "a".into(), "b".into(), None);
    let err = block_on(store.update_booking(&missing)).unwrap_err();
    assert!(err.is_not_found_error());
}
