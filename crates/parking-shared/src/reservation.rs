//! Reservations of a place in a parking

use chrono::{Local, NaiveDateTime, TimeZone as _};

use crate::{
    errors::ConversionError,
    id::{ParkingId, ReservationId, SectorId},
    time::{Seconds, Timestamp},
    uac::Login,
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Awaiting,
    InProgress,
    CompletedManually,
    CompletedAutomatically,
    Cancelled,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: ReservationId,
    pub parking_id: ParkingId,
    #[serde(default)]
    pub sector_id: Option<SectorId>,
    #[serde(default)]
    pub sector_name: Option<String>,
    pub begin_time: Timestamp,
    pub end_time: Timestamp,
    pub status: ReservationStatus,
    /// Only included in the staff view
    #[serde(default)]
    pub client_login: Option<Login>,
}

/// A validated reservation request
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDraft {
    pub parking_id: ParkingId,
    pub begin_time: Timestamp,
    pub end_time: Timestamp,
}

pub const RESERVATION_MAX_DURATION: Seconds = Seconds::new(24 * 60 * 60);

/// Format used for date time entry
pub const RESERVATION_INPUT_FORMAT: &str = "%Y-%m-%d %H:%M";

impl Reservation {
    /// Only reservations that have not started yet may be cancelled
    pub fn can_be_cancelled(&self, now: Timestamp) -> bool {
        self.status == ReservationStatus::Awaiting && !now.has_reached(self.begin_time)
    }
}

impl ReservationDraft {
    pub fn new(
        parking_id: ParkingId,
        begin_time: Timestamp,
        end_time: Timestamp,
        now: Timestamp,
    ) -> Result<Self, ConversionError> {
        if !begin_time.has_reached(now) {
            return Err(ConversionError::InvalidFormat {
                expected: "a start time in the future",
            });
        }
        if begin_time.has_reached(end_time) {
            return Err(ConversionError::InvalidFormat {
                expected: "an end time after the start time",
            });
        }
        if begin_time.until(end_time) > RESERVATION_MAX_DURATION {
            return Err(ConversionError::InvalidFormat {
                expected: "a reservation of at most 24 hours",
            });
        }
        Ok(Self {
            parking_id,
            begin_time,
            end_time,
        })
    }
}

/// Parses a local date time as typed by the user
pub fn parse_local_datetime(input: &str) -> Result<Timestamp, ConversionError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ConversionError::Empty);
    }
    let invalid = ConversionError::InvalidFormat {
        expected: "YYYY-MM-DD HH:MM",
    };
    let naive = NaiveDateTime::parse_from_str(input, RESERVATION_INPUT_FORMAT)
        .map_err(|_| invalid.clone())?;
    let local = Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or(invalid.clone())?;
    let secs = u64::try_from(local.timestamp()).map_err(|_| invalid)?;
    Ok(Timestamp::from_unix_secs(secs))
}
