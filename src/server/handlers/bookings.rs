use axum::extract::{Extension, Json, Path};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::DynAPI;
use crate::auth::User;
use crate::entities::{Booking, BookingStatus};
use crate::error::Error;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateParams {
    pickup_station_id: String,
    destination_station_id: String,
}

#[derive(Serialize, Deserialize)]
pub struct UpdateStatusParams {
    status: String,
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    user: User,
    Json(params): Json<CreateParams>,
) -> Result<(StatusCode, Json<Booking>), Error> {
    let booking = api
        .request_booking(user, params.pickup_station_id, params.destination_station_id)
        .await?;

    Ok((StatusCode::CREATED, booking.into()))
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, Error> {
    let booking = api.find_booking(user, id).await?;

    Ok(booking.into())
}

pub async fn update_status(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<Uuid>,
    Json(params): Json<UpdateStatusParams>,
) -> Result<Json<Booking>, Error> {
    let status: BookingStatus = params.status.parse()?;
    let booking = api.update_booking_status(user, id, status).await?;

    Ok(booking.into())
}

pub async fn find_mine_as_passenger(
    Extension(api): Extension<DynAPI>,
    user: User,
) -> Result<Json<Vec<Booking>>, Error> {
    let bookings = api.find_passenger_bookings(user).await?;

    Ok(bookings.into())
}

pub async fn find_mine_as_driver(
    Extension(api): Extension<DynAPI>,
    user: User,
) -> Result<Json<Vec<Booking>>, Error> {
    let bookings = api.find_driver_bookings(user).await?;

    Ok(bookings.into())
}
