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
pub enum RequestStatus {
    Active,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Active => "active",
            RequestStatus::Completed => "completed",
            RequestStatus::Cancelled => "cancelled",
        }
    }
}

impl Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(RequestStatus::Active),
            "completed" => Ok(RequestStatus::Completed),
            "cancelled" => Ok(RequestStatus::Cancelled),
            other => Err(Error::Validation(format!("invalid request status: {}", other))),
        }
    }
}

/// A receiver's stated need for food, independent of any donation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub description: String,
    pub people_count: i32,
    pub pickup_date: String,
    pub pickup_time: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

impl Record for FoodRequest {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct FoodRequestRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub description: String,
    pub people_count: i32,
    pub pickup_date: String,
    pub pickup_time: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<FoodRequestRow> for FoodRequest {
    type Error = Error;

    fn try_from(row: FoodRequestRow) -> Result<Self, Self::Error> {
        Ok(FoodRequest {
            id: row.id,
            user_id: row.user_id,
            description: row.description,
            people_count: row.people_count,
            pickup_date: row.pickup_date,
            pickup_time: row.pickup_time,
            status: row.status.parse()?,
            created_at: row.created_at,
        })
    }
}
