use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{invalid_input_error, invalid_invocation_error, Error};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, PolarClass)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    #[polar(attribute)]
    pub passenger_id: String,
    #[polar(attribute)]
    pub driver_id: Option<String>,
    pub pickup_station_id: String,
    pub destination_station_id: String,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Pending,
    Accepted,
    Started,
    Arrived,
    Completed,
    Cancelled,
}

/// How strictly status updates follow the ride lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// The assigned driver may set any status at any time.
    #[default]
    Loose,
    /// Only lifecycle edges (plus repeats and cancellation) are accepted.
    Strict,
}

impl Status {
    pub const ALL: [Status; 6] = [
        Self::Pending,
        Self::Accepted,
        Self::Started,
        Self::Arrived,
        Self::Completed,
        Self::Cancelled,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::Started => "STARTED",
            Self::Arrived => "ARRIVED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    pub fn can_transition_to(&self, next: Status) -> bool {
        if *self == next {
            return true;
        }

        match (self, next) {
            (Self::Pending, Self::Accepted)
            | (Self::Accepted, Self::Started)
            | (Self::Started, Self::Arrived)
            | (Self::Arrived, Self::Completed) => true,
            (current, Self::Cancelled) => !current.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();

        Self::ALL
            .into_iter()
            .find(|status| status.name().eq_ignore_ascii_case(name))
            .ok_or_else(invalid_input_error)
    }
}

impl FromStr for TransitionPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "loose" => Ok(Self::Loose),
            "strict" => Ok(Self::Strict),
            _ => Err(invalid_input_error()),
        }
    }
}

impl Booking {
    pub fn new(
        passenger_id: String,
        pickup_station_id: String,
        destination_station_id: String,
        driver_id: Option<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            passenger_id,
            driver_id,
            pickup_station_id,
            destination_station_id,
            status: Status::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_assigned_to(&self, driver_id: &str) -> bool {
        self.driver_id.as_deref() == Some(driver_id)
    }

    #[tracing::instrument(skip(self), fields(id = %self.id, current = %self.status))]
    pub fn update_status(&mut self, status: Status, policy: TransitionPolicy) -> Result<(), Error> {
        // an unassigned booking stays PENDING
        if self.driver_id.is_none() {
            return Err(invalid_invocation_error());
        }

        if policy == TransitionPolicy::Strict && !self.status.can_transition_to(status) {
            tracing::info!("transition rejected by strict policy");
            return Err(invalid_invocation_error());
        }

        self.status = status;
        self.updated_at = Utc::now();

        Ok(())
    }
}

#[test]
fn new_booking_is_pending() {
    let booking = Booking::new("p1".into(), "a".into(), "b".into(), None);

    assert_eq!(booking.status, Status::Pending);
    assert!(booking.driver_id.is_none());
    assert_eq!(booking.created_at, booking.updated_at);
}

#[test]
fn status_names_parse_case_insensitively() {
    assert_eq!("ACCEPTED".parse::<Status>().unwrap(), Status::Accepted);
    assert_eq!("arrived".parse::<Status>().unwrap(), Status::Arrived);
    assert_eq!(" Cancelled ".parse::<Status>().unwrap(), Status::Cancelled);
    assert!("DRIVING".parse::<Status>().unwrap_err().is_invalid_input_error());
    assert!("".parse::<Status>().is_err());
}

#[test]
fn status_serializes_as_upper_case_name() {
    let json = serde_json::to_string(&Status::Started).unwrap();
    assert_eq!(json, "\"STARTED\"");

    for status in Status::ALL {
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, format!("\"{}\"", status.name()));
    }
}

#[test]
fn booking_serializes_with_camel_case_fields() {
    let booking = Booking::new("p1".into(), "a".into(), "b".into(), Some("d1".into()));
    let value = serde_json::to_value(&booking).unwrap();

    assert_eq!(value["passengerId"], "p1");
    assert_eq!(value["driverId"], "d1");
    assert_eq!(value["pickupStationId"], "a");
    assert_eq!(value["destinationStationId"], "b");
    assert_eq!(value["status"], "PENDING");
}

#[test]
fn strict_transitions_follow_the_lifecycle() {
    use Status::*;

    assert!(Pending.can_transition_to(Accepted));
    assert!(Accepted.can_transition_to(Started));
    assert!(Started.can_transition_to(Arrived));
    assert!(Arrived.can_transition_to(Completed));

    assert!(Pending.can_transition_to(Cancelled));
    assert!(Arrived.can_transition_to(Cancelled));
    assert!(!Completed.can_transition_to(Cancelled));

    assert!(!Pending.can_transition_to(Completed));
    assert!(!Started.can_transition_to(Accepted));
    assert!(!Cancelled.can_transition_to(Pending));

    for status in Status::ALL {
        assert!(status.can_transition_to(status));
    }
}

#[test]
fn loose_policy_allows_any_status() {
    let mut booking = Booking::new("p1".into(), "a".into(), "b".into(), Some("d1".into()));

    booking
        .update_status(Status::Completed, TransitionPolicy::Loose)
        .unwrap();
    assert_eq!(booking.status, Status::Completed);

    booking
        .update_status(Status::Pending, TransitionPolicy::Loose)
        .unwrap();
    assert_eq!(booking.status, Status::Pending);
}

#[test]
fn strict_policy_rejects_skipping_ahead() {
    let mut booking = Booking::new("p1".into(), "a".into(), "b".into(), Some("d1".into()));

    let err = booking
        .update_status(Status::Completed, TransitionPolicy::Strict)
        .unwrap_err();
    assert!(err.is_invalid_invocation_error());
    assert_eq!(booking.status, Status::Pending);

    booking
        .update_status(Status::Accepted, TransitionPolicy::Strict)
        .unwrap();
    booking
        .update_status(Status::Accepted, TransitionPolicy::Strict)
        .unwrap();
    assert_eq!(booking.status, Status::Accepted);
}

#[test]
fn unassigned_booking_cannot_change_status() {
    let mut booking = Booking::new("p1".into(), "a".into(), "b".into(), None);

    let err = booking
        .update_status(Status::Accepted, TransitionPolicy::Loose)
        .unwrap_err();
    assert!(err.is_invalid_invocation_error());
    assert_eq!(booking.status, Status::Pending);
}
