mod extract;
mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{delete, get, patch, post},
    Router,
};

use crate::api::{DynAPI, API};
use crate::error::{unexpected_error, Error};
use crate::server::handlers::{bookings, drivers, health, stations, topics};

pub fn router(api: DynAPI) -> Router {
    Router::new()
        .route("/health", get(health::check))
        .route("/bookings", post(bookings::create))
        .route("/bookings/:id", get(bookings::find))
        .route("/bookings/:id/status", patch(bookings::update_status))
        .route("/passengers/me/bookings", get(bookings::find_mine_as_passenger))
        .route("/drivers/me", get(drivers::find).patch(drivers::update))
        .route("/drivers/me/bookings", get(bookings::find_mine_as_driver))
        .route("/stations", get(stations::list).post(stations::create))
        .route("/stations/:id", delete(stations::delete))
        .route("/topics/:role/:id", get(topics::subscribe))
        .layer(Extension(api))
}

pub async fn serve<T: API + Sync + Send + 'static>(api: T, addr: SocketAddr) -> Result<(), Error> {
    let app = router(Arc::new(api) as DynAPI);

    tracing::info!("listening on {}", addr);

    axum::Server::try_bind(&addr)
        .map_err(|err| {
            tracing::error!("failed to bind {}: {}", addr, err);
            unexpected_error()
        })?
        .serve(app.into_make_service())
        .await
        .map_err(|err| {
            tracing::error!("server stopped: {}", err);
            unexpected_error()
        })
}
