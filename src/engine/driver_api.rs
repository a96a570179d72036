use super::Engine;

use async_trait::async_trait;

use crate::{
    api::DriverAPI,
    auth::{Platform, User},
    entities::Driver,
    error::{invalid_input_error, not_found_error, Error},
    store::{DriverRegistry, StationDirectory},
};

#[async_trait]
impl DriverAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn find_driver(&self, user: User) -> Result<Driver, Error> {
        self.authorize(user.clone(), "read_driver", Platform)?;

        self.store
            .find_driver(&user.id)
            .await?
            .ok_or_else(not_found_error)
    }

    #[tracing::instrument(skip(self))]
    async fn update_driver(
        &self,
        user: User,
        available: Option<bool>,
        current_station_id: Option<String>,
    ) -> Result<Driver, Error> {
        self.authorize(user.clone(), "update_driver", Platform)?;

        if let Some(station_id) = &current_station_id {
            if self.store.find_station(station_id).await?.is_none() {
                tracing::info!("unknown station {:?}", station_id);
                return Err(invalid_input_error());
            }
        }

        let mut driver = match self.store.find_driver(&user.id).await? {
            Some(driver) => driver,
            None => {
                tracing::info!("registering driver {}", &user.id);
                Driver::new(user.id.clone())
            }
        };

        driver.update(available, current_station_id);

        self.store.save_driver(&driver).await?;

        Ok(driver)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio_test::block_on;

    use crate::api::DriverAPI;
    use crate::auth::User;
    use crate::engine::Engine;
    use crate::entities::{Station, TransitionPolicy};
    use crate::notify::Hub;
    use crate::store::{DriverRegistry, MemoryStore, StationDirectory};

    fn engine(store: Arc<MemoryStore>) -> Engine {
        Engine::new(store, Arc::new(Hub::new(8)), TransitionPolicy::Loose).unwrap()
    }

    #[test]
    fn first_update_registers_the_driver() {
        let store = Arc::new(MemoryStore::new());
        let station = Station::new("a".into(), "Gate".into(), None, None).unwrap();
        block_on(store.insert_station(&station)).unwrap();

        let engine = engine(store.clone());
        let user = User::new("d1".into(), vec!["driver".into()]);

        let err = block_on(engine.find_driver(user.clone())).unwrap_err();
        assert!(err.is_not_found_error());

        let driver = block_on(engine.update_driver(user.clone(), Some(true), Some("a".into()))).unwrap();
        assert!(driver.is_available());
        assert!(driver.is_at("a"));

        let available = block_on(store.find_available_drivers()).unwrap();
        assert_eq!(available, vec![driver.clone()]);

        let driver = block_on(engine.update_driver(user.clone(), Some(false), None)).unwrap();
        assert!(!driver.is_available());
        assert!(driver.is_at("a"));
        assert!(block_on(store.find_available_drivers()).unwrap().is_empty());

        assert_eq!(block_on(engine.find_driver(user)).unwrap(), driver);
    }

    #[test]
    fn unknown_station_is_rejected() {
        let engine = engine(Arc::new(MemoryStore::new()));
        let user = User::new("d1".into(), vec!["driver".into()]);

        let err = block_on(engine.update_driver(user, Some(true), Some("x".into()))).unwrap_err();
        assert!(err.is_invalid_input_error());
    }

    #[test]
    fn only_drivers_may_register() {
        let engine = engine(Arc::new(MemoryStore::new()));
        let user = User::new("s1".into(), vec!["student".into()]);

        let err = block_on(engine.update_driver(user, Some(true), None)).unwrap_err();
        assert!(err.is_unauthorized_error());
    }
}
