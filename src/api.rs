use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::auth::User;
use crate::entities::{Booking, BookingStatus, Driver, Station};
use crate::error::Error;
use crate::notify::Topic;

#[async_trait]
pub trait BookingAPI {
    async fn request_booking(
        &self,
        user: User,
        pickup_station_id: String,
        destination_station_id: String,
    ) -> Result<Booking, Error>;

    async fn update_booking_status(
        &self,
        user: User,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<Booking, Error>;

    async fn find_booking(&self, user: User, id: Uuid) -> Result<Booking, Error>;
    async fn find_passenger_bookings(&self, user: User) -> Result<Vec<Booking>, Error>;
    async fn find_driver_bookings(&self, user: User) -> Result<Vec<Booking>, Error>;
}

#[async_trait]
pub trait DriverAPI {
    async fn find_driver(&self, user: User) -> Result<Driver, Error>;

    async fn update_driver(
        &self,
        user: User,
        available: Option<bool>,
        current_station_id: Option<String>,
    ) -> Result<Driver, Error>;
}

#[async_trait]
pub trait StationAPI {
    async fn list_stations(&self, user: User) -> Result<Vec<Station>, Error>;

    async fn create_station(
        &self,
        user: User,
        id: Option<String>,
        name: String,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Station, Error>;

    async fn delete_station(&self, user: User, id: String) -> Result<(), Error>;
}

#[async_trait]
pub trait SubscriptionAPI {
    async fn subscribe(&self, user: User, topic: Topic) -> Result<broadcast::Receiver<Booking>, Error>;
}

pub trait API: BookingAPI + DriverAPI + StationAPI + SubscriptionAPI {}

pub type DynAPI = Arc<dyn API + Send + Sync>;
