use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A driver as seen by the dispatch engine: whether they take rides right
/// now and which station they are waiting at.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: String,
    pub available: bool,
    pub current_station_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Driver {
    pub fn new(user_id: String) -> Self {
        Self {
            id: user_id,
            available: false,
            current_station_id: None,
            updated_at: Utc::now(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn is_at(&self, station_id: &str) -> bool {
        self.current_station_id.as_deref() == Some(station_id)
    }

    #[tracing::instrument]
    pub fn update(&mut self, available: Option<bool>, current_station_id: Option<String>) {
        if let Some(available) = available {
            self.available = available;
        }

        if let Some(station_id) = current_station_id {
            self.current_station_id = Some(station_id);
        }

        self.updated_at = Utc::now();
    }
}

#[test]
fn new_driver_is_unavailable() {
    let driver = Driver::new("d1".into());

    assert!(!driver.is_available());
    assert!(!driver.is_at("a"));
}

#[test]
fn update_only_touches_given_fields() {
    let mut driver = Driver::new("d1".into());

    driver.update(Some(true), Some("a".into()));
    assert!(driver.is_available());
    assert!(driver.is_at("a"));

    driver.update(None, Some("b".into()));
    assert!(driver.is_available());
    assert!(driver.is_at("b"));

    driver.update(Some(false), None);
    assert!(!driver.is_available());
    assert!(driver.is_at("b"));
}
