use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Donor,
    Receiver,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Donor => "donor",
            Role::Receiver => "receiver",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "donor" => Ok(Role::Donor),
            "receiver" => Ok(Role::Receiver),
            other => Err(Error::Validation(format!("invalid role: {}", other))),
        }
    }
}

/// Profile record bound one-to-one to an authenticated account. The id is the
/// owning user's id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub contact_person: String,
    pub email: String,
    pub contact_number: String,
    pub address: String,
    pub role: Role,
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct OrganizationRow {
    pub id: Uuid,
    pub name: String,
    pub contact_person: String,
    pub email: String,
    pub contact_number: String,
    pub address: String,
    pub role: String,
    pub profile_image: Option<String>,
}

impl TryFrom<OrganizationRow> for Organization {
    type Error = Error;

    fn try_from(row: OrganizationRow) -> Result<Self, Self::Error> {
        Ok(Organization {
            id: row.id,
            name: row.name,
            contact_person: row.contact_person,
            email: row.email,
            contact_number: row.contact_number,
            address: row.address,
            role: row.role.parse()?,
            profile_image: row.profile_image,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewOrganization {
    pub name: String,
    pub contact_person: String,
    pub email: String,
    pub contact_number: String,
    pub address: String,
    pub role: Role,
    pub profile_image: Option<String>,
}
