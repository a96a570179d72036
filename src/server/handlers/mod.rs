pub mod bookings;
pub mod drivers;
pub mod health;
pub mod stations;
pub mod topics;
