use super::{select_driver, Engine};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::BookingAPI,
    auth::{Platform, User},
    entities::{Booking, BookingStatus},
    error::{invalid_input_error, not_found_error, Error},
    notify::Topic,
    store::{BookingStore, DriverRegistry},
};

#[async_trait]
impl BookingAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn request_booking(
        &self,
        user: User,
        pickup_station_id: String,
        destination_station_id: String,
    ) -> Result<Booking, Error> {
        self.authorize(user.clone(), "request_booking", Platform)?;

        if pickup_station_id.trim().is_empty() || destination_station_id.trim().is_empty() {
            return Err(invalid_input_error());
        }

        // no lock is held between reading candidates and saving the booking, so
        // two concurrent requests may pick the same driver
        let candidates = self.store.find_available_drivers().await?;

        tracing::info!("selecting among {} available drivers", candidates.len());

        let driver = select_driver(self.store.as_ref(), &candidates, &pickup_station_id).await?;

        let booking = Booking::new(
            user.id,
            pickup_station_id,
            destination_station_id,
            driver.map(|d| d.id),
        );

        self.store.insert_booking(&booking).await?;

        match &booking.driver_id {
            Some(driver_id) => {
                self.notify(Topic::Driver(driver_id.clone()), &booking).await;
            }
            None => {
                tracing::warn!(booking_id = %booking.id, "no driver available, booking left unassigned");
            }
        }

        Ok(booking)
    }

    #[tracing::instrument(skip(self))]
    async fn update_booking_status(
        &self,
        user: User,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<Booking, Error> {
        let mut booking = self
            .store
            .find_booking(id)
            .await?
            .ok_or_else(not_found_error)?;

        // unassigned and foreign bookings are rejected alike
        self.authorize(user.clone(), "update_status", booking.clone())?;

        booking.update_status(status, self.transition_policy)?;

        self.store.update_booking(&booking).await?;

        tracing::info!(booking_id = %booking.id, %status, "booking status updated");

        self.notify(Topic::Passenger(booking.passenger_id.clone()), &booking)
            .await;

        Ok(booking)
    }

    #[tracing::instrument(skip(self))]
    async fn find_booking(&self, user: User, id: Uuid) -> Result<Booking, Error> {
        let booking = self
            .store
            .find_booking(id)
            .await?
            .ok_or_else(not_found_error)?;

        self.authorize(user.clone(), "read", booking.clone())?;

        Ok(booking)
    }

    #[tracing::instrument(skip(self))]
    async fn find_passenger_bookings(&self, user: User) -> Result<Vec<Booking>, Error> {
        self.authorize(user.clone(), "list_passenger_bookings", Platform)?;

        self.store.find_bookings_by_passenger(&user.id).await
    }

    #[tracing::instrument(skip(self))]
    async fn find_driver_bookings(&self, user: User) -> Result<Vec<Booking>, Error> {
        self.authorize(user.clone(), "list_driver_bookings", Platform)?;

        self.store.find_bookings_by_driver(&user.id).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::{broadcast, Mutex};
    use tokio_test::block_on;
    use uuid::Uuid;

    use crate::api::BookingAPI;
    use crate::auth::User;
    use crate::engine::Engine;
    use crate::entities::{Booking, BookingStatus, Driver, Station, TransitionPolicy};
    use crate::error::{database_error, notification_error, Error};
    use crate::notify::{Notifier, Topic};
    use crate::store::{BookingStore, DriverRegistry, MemoryStore, StationDirectory};

    #[derive(Default)]
    struct RecordingNotifier {
        published: Mutex<Vec<(Topic, Booking)>>,
        failing: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn publish(&self, topic: &Topic, booking: &Booking) -> Result<(), Error> {
            if self.failing {
                return Err(notification_error());
            }

            self.published
                .lock()
                .await
                .push((topic.clone(), booking.clone()));

            Ok(())
        }

        async fn subscribe(&self, _: &Topic) -> Result<broadcast::Receiver<Booking>, Error> {
            Err(notification_error())
        }
    }

    /// In-memory store whose booking writes can be switched to fail.
    #[derive(Default)]
    struct TestStore {
        inner: MemoryStore,
        broken: AtomicBool,
    }

    impl TestStore {
        fn check(&self) -> Result<(), Error> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(database_error("connection reset"));
            }

            Ok(())
        }
    }

    #[async_trait]
    impl DriverRegistry for TestStore {
        async fn find_available_drivers(&self) -> Result<Vec<Driver>, Error> {
            self.inner.find_available_drivers().await
        }

        async fn find_driver(&self, id: &str) -> Result<Option<Driver>, Error> {
            self.inner.find_driver(id).await
        }

        async fn save_driver(&self, driver: &Driver) -> Result<(), Error> {
            self.inner.save_driver(driver).await
        }
    }

    #[async_trait]
    impl StationDirectory for TestStore {
        async fn find_station(&self, id: &str) -> Result<Option<Station>, Error> {
            self.inner.find_station(id).await
        }

        async fn list_stations(&self) -> Result<Vec<Station>, Error> {
            self.inner.list_stations().await
        }

        async fn insert_station(&self, station: &Station) -> Result<(), Error> {
            self.inner.insert_station(station).await
        }

        async fn delete_station(&self, id: &str) -> Result<bool, Error> {
            self.inner.delete_station(id).await
        }
    }

    #[async_trait]
    impl BookingStore for TestStore {
        async fn insert_booking(&self, booking: &Booking) -> Result<(), Error> {
            self.check()?;
            self.inner.insert_booking(booking).await
        }

        async fn update_booking(&self, booking: &Booking) -> Result<(), Error> {
            self.check()?;
            self.inner.update_booking(booking).await
        }

        async fn find_booking(&self, id: Uuid) -> Result<Option<Booking>, Error> {
            self.inner.find_booking(id).await
        }

        async fn find_bookings_by_passenger(&self, passenger_id: &str) -> Result<Vec<Booking>, Error> {
            self.inner.find_bookings_by_passenger(passenger_id).await
        }

        async fn find_bookings_by_driver(&self, driver_id: &str) -> Result<Vec<Booking>, Error> {
            self.inner.find_bookings_by_driver(driver_id).await
        }
    }

    struct Fixture {
        store: Arc<TestStore>,
        notifier: Arc<RecordingNotifier>,
        engine: Engine,
    }

    impl Fixture {
        fn new(policy: TransitionPolicy, failing: bool) -> Self {
            block_on(Self::build(policy, failing))
        }

        async fn build(policy: TransitionPolicy, failing: bool) -> Self {
            let store = Arc::new(TestStore::default());
            let notifier = Arc::new(RecordingNotifier {
                failing,
                ..Default::default()
            });

            for (id, latitude, longitude) in [("a", 0.0, 0.0), ("b", 0.0, 1.0), ("c", 0.0, 5.0)] {
                let station = Station::new(
                    id.into(),
                    id.to_uppercase(),
                    Some(latitude),
                    Some(longitude),
                )
                .unwrap();
                store.insert_station(&station).await.unwrap();
            }

            let engine = Engine::new(store.clone(), notifier.clone(), policy).unwrap();

            Self {
                store,
                notifier,
                engine,
            }
        }

        async fn add_driver(&self, id: &str, station_id: &str, available: bool) {
            let mut driver = Driver::new(id.into());
            driver.update(Some(available), Some(station_id.into()));
            self.store.save_driver(&driver).await.unwrap();
        }

        fn published(&self) -> Vec<(Topic, Booking)> {
            block_on(self.notifier.published.lock()).clone()
        }

        fn stored(&self, id: Uuid) -> Booking {
            block_on(self.store.find_booking(id)).unwrap().unwrap()
        }
    }

    fn passenger(id: &str) -> User {
        User::new(id.into(), vec!["student".into()])
    }

    fn driver(id: &str) -> User {
        User::new(id.into(), vec!["driver".into()])
    }

    #[test]
    fn nearest_driver_is_assigned_and_notified() {
        let f = Fixture::new(TransitionPolicy::Loose, false);
        block_on(f.add_driver("d1", "b", true));
        block_on(f.add_driver("d2", "c", true));

        let booking =
            block_on(f.engine.request_booking(passenger("p1"), "a".into(), "c".into())).unwrap();

        assert_eq!(booking.driver_id.as_deref(), Some("d1"));
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.passenger_id, "p1");

        assert_eq!(f.published(), vec![(Topic::Driver("d1".into()), booking)]);
    }

    #[test]
    fn exact_match_is_preferred() {
        let f = Fixture::new(TransitionPolicy::Loose, false);
        block_on(f.add_driver("d2", "b", true));
        block_on(f.add_driver("d1", "a", true));

        let booking =
            block_on(f.engine.request_booking(passenger("p1"), "a".into(), "c".into())).unwrap();

        assert_eq!(booking.driver_id.as_deref(), Some("d1"));
    }

    #[test]
    fn unavailable_drivers_are_ignored() {
        let f = Fixture::new(TransitionPolicy::Loose, false);
        block_on(f.add_driver("d1", "a", false));

        let booking =
            block_on(f.engine.request_booking(passenger("p1"), "a".into(), "b".into())).unwrap();

        assert!(booking.driver_id.is_none());
        assert_eq!(booking.status, BookingStatus::Pending);
        assert!(f.published().is_empty());
    }

    #[test]
    fn booking_round_trips_through_the_store() {
        let f = Fixture::new(TransitionPolicy::Loose, false);
        block_on(f.add_driver("d1", "a", true));

        let booking =
            block_on(f.engine.request_booking(passenger("p1"), "a".into(), "b".into())).unwrap();

        assert_eq!(f.stored(booking.id), booking);

        let read = block_on(f.engine.find_booking(passenger("p1"), booking.id)).unwrap();
        assert_eq!(read, booking);
    }

    #[test]
    fn unknown_stations_still_create_a_booking() {
        let f = Fixture::new(TransitionPolicy::Loose, false);
        block_on(f.add_driver("d1", "b", true));

        let booking =
            block_on(f.engine.request_booking(passenger("p1"), "nowhere".into(), "b".into()))
                .unwrap();

        assert!(booking.driver_id.is_none());
    }

    #[test]
    fn blank_station_ids_are_rejected() {
        let f = Fixture::new(TransitionPolicy::Loose, false);

        let err = block_on(f.engine.request_booking(passenger("p1"), " ".into(), "b".into()))
            .unwrap_err();

        assert!(err.is_invalid_input_error());
    }

    #[test]
    fn drivers_cannot_request_bookings() {
        let f = Fixture::new(TransitionPolicy::Loose, false);

        let err = block_on(f.engine.request_booking(driver("d1"), "a".into(), "b".into()))
            .unwrap_err();

        assert!(err.is_unauthorized_error());
    }

    #[test]
    fn assigned_driver_updates_status_and_passenger_is_notified() {
        let f = Fixture::new(TransitionPolicy::Loose, false);
        block_on(f.add_driver("d1", "a", true));

        let booking =
            block_on(f.engine.request_booking(passenger("p1"), "a".into(), "b".into())).unwrap();

        let updated = block_on(f.engine.update_booking_status(
            driver("d1"),
            booking.id,
            BookingStatus::Accepted,
        ))
        .unwrap();

        assert_eq!(updated.status, BookingStatus::Accepted);
        assert_eq!(updated.driver_id, booking.driver_id);
        assert_eq!(f.stored(booking.id).status, BookingStatus::Accepted);

        let published = f.published();
        assert_eq!(published.len(), 2);
        assert_eq!(published[1], (Topic::Passenger("p1".into()), updated));
    }

    #[test]
    fn other_callers_are_unauthorized() {
        let f = Fixture::new(TransitionPolicy::Loose, false);
        block_on(f.add_driver("d1", "a", true));

        let booking =
            block_on(f.engine.request_booking(passenger("p1"), "a".into(), "b".into())).unwrap();

        for user in [driver("d2"), passenger("p1"), User::new("d1 ".into(), vec![])] {
            let err = block_on(f.engine.update_booking_status(
                user,
                booking.id,
                BookingStatus::Accepted,
            ))
            .unwrap_err();

            assert!(err.is_unauthorized_error());
        }

        assert_eq!(f.stored(booking.id).status, BookingStatus::Pending);
    }

    #[test]
    fn unassigned_booking_is_unauthorized_for_everyone() {
        let f = Fixture::new(TransitionPolicy::Loose, false);

        let booking =
            block_on(f.engine.request_booking(passenger("p1"), "a".into(), "b".into())).unwrap();

        let err = block_on(f.engine.update_booking_status(
            driver("d1"),
            booking.id,
            BookingStatus::Accepted,
        ))
        .unwrap_err();

        assert!(err.is_unauthorized_error());
    }

    #[test]
    fn missing_booking_is_not_found_for_everyone() {
        let f = Fixture::new(TransitionPolicy::Loose, false);

        for user in [driver("d1"), passenger("p1")] {
            let err = block_on(f.engine.update_booking_status(
                user.clone(),
                Uuid::new_v4(),
                BookingStatus::Accepted,
            ))
            .unwrap_err();
            assert!(err.is_not_found_error());

            let err = block_on(f.engine.find_booking(user, Uuid::new_v4())).unwrap_err();
            assert!(err.is_not_found_error());
        }
    }

    #[test]
    fn repeated_update_is_idempotent() {
        let f = Fixture::new(TransitionPolicy::Strict, false);
        block_on(f.add_driver("d1", "a", true));

        let booking =
            block_on(f.engine.request_booking(passenger("p1"), "a".into(), "b".into())).unwrap();

        let accept = || {
            block_on(f.engine.update_booking_status(
                driver("d1"),
                booking.id,
                BookingStatus::Accepted,
            ))
            .unwrap()
        };

        let first = accept();
        let second = accept();

        assert_eq!(first.status, second.status);
        assert_eq!(first.driver_id, second.driver_id);

        // one for the driver, one per update for the passenger
        assert_eq!(f.published().len(), 3);
    }

    #[test]
    fn loose_policy_lets_the_driver_skip_ahead() {
        let f = Fixture::new(TransitionPolicy::Loose, false);
        block_on(f.add_driver("d1", "a", true));

        let booking =
            block_on(f.engine.request_booking(passenger("p1"), "a".into(), "b".into())).unwrap();

        let updated = block_on(f.engine.update_booking_status(
            driver("d1"),
            booking.id,
            BookingStatus::Completed,
        ))
        .unwrap();

        assert_eq!(updated.status, BookingStatus::Completed);
    }

    #[test]
    fn strict_policy_rejects_skipping_ahead() {
        let f = Fixture::new(TransitionPolicy::Strict, false);
        block_on(f.add_driver("d1", "a", true));

        let booking =
            block_on(f.engine.request_booking(passenger("p1"), "a".into(), "b".into())).unwrap();

        let err = block_on(f.engine.update_booking_status(
            driver("d1"),
            booking.id,
            BookingStatus::Completed,
        ))
        .unwrap_err();

        assert!(err.is_invalid_invocation_error());
        assert_eq!(f.stored(booking.id).status, BookingStatus::Pending);
    }

    #[test]
    fn notification_failures_are_swallowed() {
        let f = Fixture::new(TransitionPolicy::Loose, true);
        block_on(f.add_driver("d1", "a", true));

        let booking =
            block_on(f.engine.request_booking(passenger("p1"), "a".into(), "b".into())).unwrap();
        assert_eq!(booking.driver_id.as_deref(), Some("d1"));

        let updated = block_on(f.engine.update_booking_status(
            driver("d1"),
            booking.id,
            BookingStatus::Started,
        ))
        .unwrap();
        assert_eq!(updated.status, BookingStatus::Started);
    }

    #[test]
    fn store_failures_surface_as_server_errors() {
        let f = Fixture::new(TransitionPolicy::Loose, false);
        block_on(f.add_driver("d1", "a", true));

        let booking =
            block_on(f.engine.request_booking(passenger("p1"), "a".into(), "b".into())).unwrap();
        assert_eq!(f.published().len(), 1);

        f.store.broken.store(true, Ordering::SeqCst);

        let err = block_on(f.engine.request_booking(passenger("p2"), "a".into(), "c".into()))
            .unwrap_err();
        assert!(err.is_server_error());
        assert_eq!(err.code, 2);

        let err = block_on(f.engine.update_booking_status(
            driver("d1"),
            booking.id,
            BookingStatus::Accepted,
        ))
        .unwrap_err();
        assert!(err.is_server_error());

        // nothing went out for the failed writes
        assert_eq!(f.published().len(), 1);
        assert_eq!(f.stored(booking.id).status, BookingStatus::Pending);
        assert!(block_on(f.store.find_bookings_by_passenger("p2")).unwrap().is_empty());
    }

    #[test]
    fn bookings_are_listed_per_party() {
        let f = Fixture::new(TransitionPolicy::Loose, false);
        block_on(f.add_driver("d1", "a", true));

        let first =
            block_on(f.engine.request_booking(passenger("p1"), "a".into(), "b".into())).unwrap();
        let second =
            block_on(f.engine.request_booking(passenger("p2"), "a".into(), "c".into())).unwrap();

        let mine = block_on(f.engine.find_passenger_bookings(passenger("p1"))).unwrap();
        assert_eq!(mine, vec![first.clone()]);

        let assigned = block_on(f.engine.find_driver_bookings(driver("d1"))).unwrap();
        assert_eq!(assigned, vec![first, second]);

        let err = block_on(f.engine.find_driver_bookings(passenger("p1"))).unwrap_err();
        assert!(err.is_unauthorized_error());
    }

    #[test]
    fn strangers_cannot_read_a_booking() {
        let f = Fixture::new(TransitionPolicy::Loose, false);
        block_on(f.add_driver("d1", "a", true));

        let booking =
            block_on(f.engine.request_booking(passenger("p1"), "a".into(), "b".into())).unwrap();

        assert!(block_on(f.engine.find_booking(driver("d1"), booking.id)).is_ok());

        let err = block_on(f.engine.find_booking(passenger("p2"), booking.id)).unwrap_err();
        assert!(err.is_unauthorized_error());
    }

    #[tokio::test]
    async fn concurrent_requests_may_share_a_driver() {
        let f = Fixture::build(TransitionPolicy::Loose, false).await;
        f.add_driver("d1", "a", true).await;

        let (first, second) = tokio::join!(
            f.engine
                .request_booking(passenger("p1"), "a".into(), "b".into()),
            f.engine
                .request_booking(passenger("p2"), "a".into(), "c".into()),
        );

        assert_eq!(first.unwrap().driver_id.as_deref(), Some("d1"));
        assert_eq!(second.unwrap().driver_id.as_deref(), Some("d1"));
    }
}
