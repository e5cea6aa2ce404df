use actix_web::web::{Data, Json};
use serde::Deserialize;
use sqlx::{query_as, PgPool};

use crate::context::UserInfo;
use crate::error::Error;
use crate::models::organization::{Organization, OrganizationRow, Role};
use crate::models::user::User;

/// Own profile. A missing row is created on the spot from the signup
/// metadata carried on the user, so accounts predating their profile still
/// get one on first fetch.
pub async fn me(me: UserInfo, db: Data<PgPool>) -> Result<Json<Organization>, Error> {
    let mut conn = db.acquire().await?;
    if let Some(row) = query_as::<_, OrganizationRow>("SELECT * FROM organizations WHERE id = $1")
        .bind(me.id)
        .fetch_optional(&mut conn)
        .await?
    {
        return Ok(Json(row.try_into()?));
    }

    let user = query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(me.id)
        .fetch_optional(&mut conn)
        .await?
        .ok_or(Error::NotFound)?;
    let meta = user.metadata();
    let name = meta
        .name
        .unwrap_or_else(|| user.email.split('@').next().unwrap_or_default().to_owned());
    let role = meta
        .role
        .as_deref()
        .and_then(|r| r.parse::<Role>().ok())
        .unwrap_or(Role::Donor);
    let row: OrganizationRow = query_as(
        r#"INSERT INTO organizations (id, name, contact_person, email, contact_number, address, role)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *"#,
    )
    .bind(me.id)
    .bind(&name)
    .bind(meta.contact_person.unwrap_or_default())
    .bind(&user.email)
    .bind(meta.contact_number.unwrap_or_default())
    .bind(meta.address.unwrap_or_default())
    .bind(role.as_str())
    .fetch_one(&mut conn)
    .await?;
    Ok(Json(row.try_into()?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfile {
    pub name: String,
    pub contact_person: String,
    pub email: String,
    pub contact_number: String,
    pub address: String,
    pub role: Role,
    pub profile_image: Option<String>,
}

pub async fn update(me: UserInfo, Json(req): Json<UpdateProfile>, db: Data<PgPool>) -> Result<Json<Organization>, Error> {
    if req.name.trim().is_empty() {
        return Err(Error::Validation("name must not be empty".into()));
    }
    let mut conn = db.acquire().await?;
    let row: OrganizationRow = query_as(
        r#"UPDATE organizations
        SET name = $1, contact_person = $2, email = $3, contact_number = $4, address = $5, role = $6, profile_image = $7
        WHERE id = $8
        RETURNING *"#,
    )
    .bind(&req.name)
    .bind(&req.contact_person)
    .bind(&req.email)
    .bind(&req.contact_number)
    .bind(&req.address)
    .bind(req.role.as_str())
    .bind(&req.profile_image)
    .bind(me.id)
    .fetch_optional(&mut conn)
    .await?
    .ok_or(Error::NotFound)?;
    Ok(Json(row.try_into()?))
}
