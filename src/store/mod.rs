mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{Booking, Driver, Station};
use crate::error::Error;

#[async_trait]
pub trait DriverRegistry: Send + Sync {
    /// Drivers currently taking rides, in registration order.
    async fn find_available_drivers(&self) -> Result<Vec<Driver>, Error>;
    async fn find_driver(&self, id: &str) -> Result<Option<Driver>, Error>;
    async fn save_driver(&self, driver: &Driver) -> Result<(), Error>;
}

#[async_trait]
pub trait StationDirectory: Send + Sync {
    async fn find_station(&self, id: &str) -> Result<Option<Station>, Error>;
    async fn list_stations(&self) -> Result<Vec<Station>, Error>;
    /// Fails with an invalid input error when the id is taken.
    async fn insert_station(&self, station: &Station) -> Result<(), Error>;
    /// Returns false when no station had that id.
    async fn delete_station(&self, id: &str) -> Result<bool, Error>;
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn insert_booking(&self, booking: &Booking) -> Result<(), Error>;
    async fn update_booking(&self, booking: &Booking) -> Result<(), Error>;
    async fn find_booking(&self, id: Uuid) -> Result<Option<Booking>, Error>;
    async fn find_bookings_by_passenger(&self, passenger_id: &str) -> Result<Vec<Booking>, Error>;
    async fn find_bookings_by_driver(&self, driver_id: &str) -> Result<Vec<Booking>, Error>;
}

pub trait Store: DriverRegistry + StationDirectory + BookingStore {}

impl<T> Store for T where T: DriverRegistry + StationDirectory + BookingStore {}
