use super::Engine;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::{
    api::SubscriptionAPI,
    auth::User,
    entities::Booking,
    error::Error,
    notify::Topic,
};

#[async_trait]
impl SubscriptionAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn subscribe(&self, user: User, topic: Topic) -> Result<broadcast::Receiver<Booking>, Error> {
        self.authorize(user, "subscribe", topic.clone())?;

        self.notifier.subscribe(&topic).await
    }
}

#[test]
fn callers_subscribe_to_their_own_topics_only() {
    use std::sync::Arc;

    use crate::api::BookingAPI;
    use crate::entities::{BookingStatus, Driver, TransitionPolicy};
    use crate::notify::Hub;
    use crate::store::{DriverRegistry, MemoryStore};
    use tokio_test::block_on;

    let store = Arc::new(MemoryStore::new());
    let engine = Engine::new(store.clone(), Arc::new(Hub::new(8)), TransitionPolicy::Loose).unwrap();

    let mut driver = Driver::new("d1".into());
    driver.update(Some(true), Some("a".into()));
    block_on(store.save_driver(&driver)).unwrap();

    let passenger = User::new("p1".into(), vec!["student".into()]);
    let driver = User::new("d1".into(), vec!["driver".into()]);

    let err = block_on(engine.subscribe(passenger.clone(), Topic::Passenger("p2".into()))).unwrap_err();
    assert!(err.is_unauthorized_error());

    let err = block_on(engine.subscribe(passenger.clone(), Topic::Driver("p1".into()))).unwrap_err();
    assert!(err.is_unauthorized_error());

    let mut driver_rx = block_on(engine.subscribe(driver.clone(), Topic::Driver("d1".into()))).unwrap();
    let mut passenger_rx =
        block_on(engine.subscribe(passenger.clone(), Topic::Passenger("p1".into()))).unwrap();

    let booking = block_on(engine.request_booking(passenger, "a".into(), "b".into())).unwrap();
    assert_eq!(driver_rx.try_recv().unwrap(), booking);
    assert!(passenger_rx.try_recv().is_err());

    let updated =
        block_on(engine.update_booking_status(driver, booking.id, BookingStatus::Accepted)).unwrap();
    assert_eq!(passenger_rx.try_recv().unwrap(), updated);
}
