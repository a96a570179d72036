mod booking;
mod driver;
mod station;

pub use booking::{Booking, Status as BookingStatus, TransitionPolicy};
pub use driver::Driver;
pub use station::Station;
