use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::StationAPI,
    auth::{Platform, User},
    entities::Station,
    error::{not_found_error, Error},
    store::StationDirectory,
};

#[async_trait]
impl StationAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn list_stations(&self, user: User) -> Result<Vec<Station>, Error> {
        self.authorize(user.clone(), "list_stations", Platform)?;

        self.store.list_stations().await
    }

    #[tracing::instrument(skip(self))]
    async fn create_station(
        &self,
        user: User,
        id: Option<String>,
        name: String,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Station, Error> {
        self.authorize(user.clone(), "manage_stations", Platform)?;

        let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let station = Station::new(id, name, latitude, longitude)?;

        self.store.insert_station(&station).await?;

        Ok(station)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_station(&self, user: User, id: String) -> Result<(), Error> {
        self.authorize(user.clone(), "manage_stations", Platform)?;

        if !self.store.delete_station(&id).await? {
            return Err(not_found_error());
        }

        Ok(())
    }
}

#[test]
fn admins_manage_stations() {
    use std::sync::Arc;

    use crate::entities::TransitionPolicy;
    use crate::notify::Hub;
    use crate::store::MemoryStore;
    use tokio_test::block_on;

    let engine = Engine::new(
        Arc::new(MemoryStore::new()),
        Arc::new(Hub::new(8)),
        TransitionPolicy::Loose,
    )
    .unwrap();

    let admin = User::new("a1".into(), vec!["admin".into()]);
    let student = User::new("s1".into(), vec!["student".into()]);

    let err = block_on(engine.create_station(student.clone(), None, "Gate".into(), None, None))
        .unwrap_err();
    assert!(err.is_unauthorized_error());

    let gate = block_on(engine.create_station(
        admin.clone(),
        Some("gate".into()),
        "Main Gate".into(),
        Some(26.40),
        Some(75.87),
    ))
    .unwrap();

    let library = block_on(engine.create_station(admin.clone(), None, "Library".into(), None, None))
        .unwrap();
    assert!(!library.id.is_empty());

    let err = block_on(engine.create_station(admin.clone(), Some("gate".into()), "Again".into(), None, None))
        .unwrap_err();
    assert!(err.is_invalid_input_error());

    let stations = block_on(engine.list_stations(student.clone())).unwrap();
    assert_eq!(stations, vec![gate, library]);

    let err = block_on(engine.delete_station(student.clone(), "gate".into())).unwrap_err();
    assert!(err.is_unauthorized_error());

    block_on(engine.delete_station(admin.clone(), "gate".into())).unwrap();

    let err = block_on(engine.delete_station(admin.clone(), "gate".into())).unwrap_err();
    assert!(err.is_not_found_error());
}
