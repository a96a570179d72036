use geo_types::Point;
use serde::{Deserialize, Serialize};

use crate::error::{invalid_input_error, Error};

/// A named pickup/drop point. Coordinates are optional; a station without
/// both of them cannot take part in distance comparisons.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub id: String,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Station {
    pub fn new(
        id: String,
        name: String,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Self, Error> {
        if id.trim().is_empty() || name.trim().is_empty() {
            return Err(invalid_input_error());
        }

        if let Some(latitude) = latitude {
            if !(-90.0..=90.0).contains(&latitude) {
                return Err(invalid_input_error());
            }
        }

        if let Some(longitude) = longitude {
            if !(-180.0..=180.0).contains(&longitude) {
                return Err(invalid_input_error());
            }
        }

        Ok(Self {
            id,
            name,
            latitude,
            longitude,
        })
    }

    pub fn coordinates(&self) -> Option<Point<f64>> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Point::new(longitude, latitude)),
            _ => None,
        }
    }
}

#[test]
fn coordinates_require_both_components() {
    let station = Station::new("a".into(), "Gate".into(), Some(26.4), None).unwrap();
    assert!(station.coordinates().is_none());

    let station = Station::new("a".into(), "Gate".into(), Some(26.4), Some(75.8)).unwrap();
    let point = station.coordinates().unwrap();
    assert_eq!(point.x(), 75.8);
    assert_eq!(point.y(), 26.4);
}

#[test]
fn rejects_out_of_range_coordinates() {
    let result = Station::new("a".into(), "Gate".into(), Some(91.0), Some(0.0));
    assert!(result.unwrap_err().is_invalid_input_error());

    let result = Station::new("a".into(), "Gate".into(), Some(0.0), Some(-181.0));
    assert!(result.unwrap_err().is_invalid_input_error());

    let result = Station::new("a".into(), " ".into(), None, None);
    assert!(result.unwrap_err().is_invalid_input_error());
}
