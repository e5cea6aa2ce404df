use std::fmt::{self, Display};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::Error;
use crate::realtime::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    Active,
    Completed,
}

impl DonationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::Active => "active",
            DonationStatus::Completed => "completed",
        }
    }
}

impl Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DonationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(DonationStatus::Active),
            "completed" => Ok(DonationStatus::Completed),
            other => Err(Error::Validation(format!("invalid donation status: {}", other))),
        }
    }
}

/// The canonical donation record used everywhere above the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donation {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub title: String,
    pub description: String,
    pub quantity: String,
    pub location: String,
    pub distance: Option<String>,
    pub pickup_time: String,
    pub status: DonationStatus,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Donation {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Row shape as it crosses the sqlx boundary. Status travels as text and is
/// parsed exactly here.
#[derive(Debug, Clone, FromRow)]
pub struct DonationRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub title: String,
    pub description: String,
    pub quantity: String,
    pub location: String,
    pub distance: Option<String>,
    pub pickup_time: String,
    pub status: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DonationRow> for Donation {
    type Error = Error;

    fn try_from(row: DonationRow) -> Result<Self, Self::Error> {
        Ok(Donation {
            id: row.id,
            organization_id: row.organization_id,
            title: row.title,
            description: row.description,
            quantity: row.quantity,
            location: row.location,
            distance: row.distance,
            pickup_time: row.pickup_time,
            status: row.status.parse()?,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewDonation {
    pub organization_id: Uuid,
    pub title: String,
    pub description: String,
    pub quantity: String,
    pub location: String,
    pub distance: Option<String>,
    pub pickup_time: String,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_text_round_trip() {
        assert_eq!("active".parse::<DonationStatus>().unwrap(), DonationStatus::Active);
        assert_eq!("completed".parse::<DonationStatus>().unwrap(), DonationStatus::Completed);
        assert_eq!(DonationStatus::Active.as_str(), "active");
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!("cancelled".parse::<DonationStatus>().is_err());
        assert!("".parse::<DonationStatus>().is_err());
    }
}
