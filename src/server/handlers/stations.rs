use axum::extract::{Extension, Json, Path};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::api::DynAPI;
use crate::auth::User;
use crate::entities::Station;
use crate::error::Error;

#[derive(Serialize, Deserialize)]
pub struct CreateParams {
    id: Option<String>,
    name: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

pub async fn list(Extension(api): Extension<DynAPI>, user: User) -> Result<Json<Vec<Station>>, Error> {
    let stations = api.list_stations(user).await?;

    Ok(stations.into())
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    user: User,
    Json(params): Json<CreateParams>,
) -> Result<(StatusCode, Json<Station>), Error> {
    let station = api
        .create_station(user, params.id, params.name, params.latitude, params.longitude)
        .await?;

    Ok((StatusCode::CREATED, station.into()))
}

pub async fn delete(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<String>,
) -> Result<StatusCode, Error> {
    api.delete_station(user, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
