use axum::extract::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::DynAPI;
use crate::auth::User;
use crate::entities::Driver;
use crate::error::Error;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateParams {
    available: Option<bool>,
    current_station_id: Option<String>,
}

pub async fn find(Extension(api): Extension<DynAPI>, user: User) -> Result<Json<Driver>, Error> {
    let driver = api.find_driver(user).await?;

    Ok(driver.into())
}

pub async fn update(
    Extension(api): Extension<DynAPI>,
    user: User,
    Json(params): Json<UpdateParams>,
) -> Result<Json<Driver>, Error> {
    let driver = api
        .update_driver(user, params.available, params.current_station_id)
        .await?;

    Ok(driver.into())
}
