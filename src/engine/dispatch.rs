use std::collections::HashMap;

use geo_types::Point;

use crate::entities::Driver;
use crate::error::Error;
use crate::geo::haversine_distance;
use crate::store::StationDirectory;

/// Picks a driver for a pickup station.
///
/// A candidate already waiting at the pickup station wins outright (the first
/// one in `candidates` order). Otherwise the candidate whose station is closest
/// to the pickup station is chosen, earlier candidates winning ties. Candidates
/// without a station, or whose station has no coordinates, are never chosen by
/// distance; neither is anyone when the pickup station itself cannot be placed.
#[tracing::instrument(skip(stations, candidates), fields(candidates = candidates.len()))]
pub async fn select_driver<S>(
    stations: &S,
    candidates: &[Driver],
    pickup_station_id: &str,
) -> Result<Option<Driver>, Error>
where
    S: StationDirectory + ?Sized,
{
    if let Some(driver) = candidates.iter().find(|d| d.is_at(pickup_station_id)) {
        tracing::info!(driver_id = %driver.id, "exact match at pickup station");
        return Ok(Some(driver.clone()));
    }

    let origin = match stations
        .find_station(pickup_station_id)
        .await?
        .and_then(|station| station.coordinates())
    {
        Some(origin) => origin,
        None => {
            tracing::info!("pickup station cannot be placed, no nearest match");
            return Ok(None);
        }
    };

    // resolve every distinct candidate station once
    let mut positions: HashMap<&str, Option<Point<f64>>> = HashMap::new();

    for station_id in candidates.iter().filter_map(|d| d.current_station_id.as_deref()) {
        if positions.contains_key(station_id) {
            continue;
        }

        let position = stations
            .find_station(station_id)
            .await?
            .and_then(|station| station.coordinates());

        positions.insert(station_id, position);
    }

    let mut nearest: Option<(&Driver, f64)> = None;

    for driver in candidates.iter() {
        let position = driver
            .current_station_id
            .as_deref()
            .and_then(|id| positions.get(id).copied().flatten());

        let position = match position {
            Some(position) => position,
            None => continue,
        };

        let distance = haversine_distance(origin, position);

        if distance.is_nan() {
            tracing::warn!(driver_id = %driver.id, "distance is not a number, skipping");
            continue;
        }

        match nearest {
            Some((_, best)) if distance >= best => {}
            _ => nearest = Some((driver, distance)),
        }
    }

    match nearest {
        Some((driver, distance)) => {
            tracing::info!(driver_id = %driver.id, distance, "nearest match");
            Ok(Some(driver.clone()))
        }
        None => {
            tracing::info!("no candidate could be placed");
            Ok(None)
        }
    }
}
