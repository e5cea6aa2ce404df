pub mod donation;
pub mod ocr;
pub mod organization;
pub mod request;
pub mod upload;
pub mod verify;

use std::ops::Add;

use actix_web::cookie::{time::OffsetDateTime, Cookie, CookieBuilder};
use actix_web::http::StatusCode;
use actix_web::web::{Data, Json};
use actix_web::{HttpResponse, HttpResponseBuilder};
use hex::ToHex;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use sqlx::{query, query_as, PgPool};
use uuid::Uuid;

use crate::context::UserInfo;
use crate::error::Error;
use crate::middlewares::jwt::{Claim, JWT_SECRET, JWT_TOKEN};
use crate::models::organization::NewOrganization;
use crate::models::user::User;
use crate::response::CreateResponse;
use crate::tokener::{Jwt, Tokener};

fn hash_password(pass: &str, slt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(pass);
    hasher.update(slt);
    hasher.finalize().encode_hex()
}

fn random_salt() -> String {
    const CHARS: &[u8] = b"1234567890abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut slt = String::new();
    let mut rng = thread_rng();
    for _ in 0..32 {
        let i = rng.gen_range(0..CHARS.len());
        slt.push(CHARS[i] as char);
    }
    slt
}

#[derive(Debug, Clone, Deserialize)]
pub struct Signup {
    pub email: String,
    pub password: String,
    pub organization: NewOrganization,
}

pub async fn signup(Json(Signup { email, password, organization }): Json<Signup>, db: Data<PgPool>) -> Result<Json<CreateResponse>, Error> {
    let email = email.trim().to_owned();
    if email.is_empty() || !email.contains('@') {
        return Err(Error::Validation("a valid email is required".into()));
    }
    if password.len() < 8 {
        return Err(Error::Validation("password must be at least 8 characters".into()));
    }
    let mut tx = db.begin().await?;
    let (exists,): (bool,) = query_as("SELECT EXISTS(SELECT id FROM users WHERE email = $1)")
        .bind(&email)
        .fetch_one(&mut tx)
        .await?;
    if exists {
        return Err(Error::BusinessError(format!("an account for {} already exists", email)));
    }
    let id = Uuid::new_v4();
    let slt = random_salt();
    let metadata = json!({
        "name": organization.name,
        "contact_person": organization.contact_person,
        "contact_number": organization.contact_number,
        "address": organization.address,
        "role": organization.role.as_str(),
    });
    query("INSERT INTO users (id, email, password, salt, metadata) VALUES ($1, $2, $3, $4, $5)")
        .bind(id)
        .bind(&email)
        .bind(hash_password(&password, &slt))
        .bind(&slt)
        .bind(metadata.to_string())
        .execute(&mut tx)
        .await?;
    query(
        r#"INSERT INTO organizations (id, name, contact_person, email, contact_number, address, role, profile_image)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
    )
    .bind(id)
    .bind(&organization.name)
    .bind(&organization.contact_person)
    .bind(&organization.email)
    .bind(&organization.contact_number)
    .bind(&organization.address)
    .bind(organization.role.as_str())
    .bind(&organization.profile_image)
    .execute(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(Json(CreateResponse { id }))
}

#[derive(Deserialize)]
pub struct Login {
    pub email: String,
    pub password: String,
}

pub async fn login(Json(Login { email, password }): Json<Login>, db: Data<PgPool>) -> Result<HttpResponse, Error> {
    let mut conn = db.acquire().await?;
    if let Some(user) = query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&mut conn)
        .await?
    {
        if hash_password(&password, &user.salt) != user.password {
            return Err(Error::Unauthorized("invalid email or password".into()));
        }
        let claim = Claim {
            user: user.id.to_string(),
            exp: chrono::Utc::now().add(chrono::Duration::days(30)).timestamp(),
        };
        let secret = dotenv::var(JWT_SECRET)?;
        let tokener = Jwt::new(secret.as_bytes().to_owned());
        let token = tokener.gen_token(&claim)?;
        return Ok(HttpResponse::build(StatusCode::OK)
            .cookie(Cookie::new(JWT_TOKEN, token.clone()))
            .json(json!({ "token": token, "user_id": user.id })));
    }
    Err(Error::Unauthorized("invalid email or password".into()))
}

pub async fn logout() -> HttpResponse {
    HttpResponseBuilder::new(StatusCode::OK)
        .cookie(CookieBuilder::new(JWT_TOKEN, "").expires(OffsetDateTime::now_utc()).finish())
        .finish()
}

#[derive(Debug, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub email: String,
}

pub async fn session(me: UserInfo, db: Data<PgPool>) -> Result<Json<Session>, Error> {
    let mut conn = db.acquire().await?;
    let (email,): (String,) = query_as("SELECT email FROM users WHERE id = $1")
        .bind(me.id)
        .fetch_optional(&mut conn)
        .await?
        .ok_or(Error::NotFound)?;
    Ok(Json(Session { id: me.id, email }))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn same_input_hashes_the_same() {
        assert_eq!(hash_password("pass", "salt"), hash_password("pass", "salt"));
        assert_ne!(hash_password("pass", "salt"), hash_password("pass", "other"));
    }

    #[test]
    fn salts_are_long_and_random() {
        let a = random_salt();
        let b = random_salt();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }
}
