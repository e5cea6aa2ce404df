use actix_web::web::{Data, Json, Path, Query};
use serde::Deserialize;
use sqlx::{query_as, query_scalar, PgPool};
use uuid::Uuid;

use crate::context::UserInfo;
use crate::error::Error;
use crate::models::request::{FoodRequest, FoodRequestRow, RequestStatus};
use crate::realtime::{ChangeEvent, Hub};
use crate::request::Pagination;
use crate::response::{DeleteResponse, List, UpdateResponse};
use crate::tracking::track;

const TABLE: &str = "requests";

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub description: String,
    pub people_count: i32,
    pub pickup_date: String,
    pub pickup_time: String,
}

pub async fn create(me: UserInfo, Json(req): Json<CreateRequest>, db: Data<PgPool>, hub: Data<Hub>) -> Result<Json<FoodRequest>, Error> {
    if req.description.trim().is_empty() {
        return Err(Error::Validation("description must not be empty".into()));
    }
    if req.people_count <= 0 {
        return Err(Error::Validation("people count must be positive".into()));
    }
    let created = track("create_request", async {
        let mut conn = db.acquire().await?;
        let row: FoodRequestRow = query_as(
            r#"INSERT INTO requests (id, user_id, description, people_count, pickup_date, pickup_time, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'active')
            RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(me.id)
        .bind(req.description.trim())
        .bind(req.people_count)
        .bind(&req.pickup_date)
        .bind(&req.pickup_time)
        .fetch_one(&mut conn)
        .await?;
        let request: FoodRequest = row.try_into()?;
        hub.publish(ChangeEvent::insert(TABLE, serde_json::to_value(&request)?));
        Ok(request)
    })
    .await?;
    Ok(Json(created))
}

pub async fn list(me: UserInfo, Query(Pagination { page, size }): Query<Pagination>, db: Data<PgPool>) -> Result<Json<List<FoodRequest>>, Error> {
    let mut conn = db.acquire().await?;
    let total: i64 = query_scalar("SELECT COUNT(*) FROM requests WHERE user_id = $1")
        .bind(me.id)
        .fetch_one(&mut conn)
        .await?;
    let rows: Vec<FoodRequestRow> = query_as(
        "SELECT * FROM requests WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(me.id)
    .bind(size)
    .bind((page - 1) * size)
    .fetch_all(&mut conn)
    .await?;
    let requests = rows.into_iter().map(TryInto::try_into).collect::<Result<Vec<FoodRequest>, Error>>()?;
    Ok(Json(List::new(requests, total)))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: RequestStatus,
}

/// Owner-scoped close-out: an active request can be completed or cancelled
/// by its owner. Anybody else's call matches zero rows.
pub async fn update_status(
    me: UserInfo,
    request_id: Path<(Uuid,)>,
    Json(StatusUpdate { status }): Json<StatusUpdate>,
    db: Data<PgPool>,
    hub: Data<Hub>,
) -> Result<Json<UpdateResponse>, Error> {
    if status == RequestStatus::Active {
        return Err(Error::Validation("a request can only be completed or cancelled".into()));
    }
    let request_id = request_id.into_inner().0;
    let mut conn = db.acquire().await?;
    let row: Option<FoodRequestRow> = query_as(
        r#"UPDATE requests SET status = $1
        WHERE id = $2 AND user_id = $3 AND status = 'active'
        RETURNING *"#,
    )
    .bind(status.as_str())
    .bind(request_id)
    .bind(me.id)
    .fetch_optional(&mut conn)
    .await?;
    match row {
        Some(row) => {
            let request: FoodRequest = row.try_into()?;
            hub.publish(ChangeEvent::update(TABLE, serde_json::to_value(&request)?));
            Ok(Json(UpdateResponse::new(1)))
        }
        None => Ok(Json(UpdateResponse::new(0))),
    }
}

pub async fn delete_request(me: UserInfo, request_id: Path<(Uuid,)>, db: Data<PgPool>, hub: Data<Hub>) -> Result<Json<DeleteResponse>, Error> {
    let request_id = request_id.into_inner().0;
    let mut conn = db.acquire().await?;
    let row: Option<FoodRequestRow> = query_as("DELETE FROM requests WHERE id = $1 AND user_id = $2 RETURNING *")
        .bind(request_id)
        .bind(me.id)
        .fetch_optional(&mut conn)
        .await?;
    match row {
        Some(row) => {
            let request: FoodRequest = row.try_into()?;
            hub.publish(ChangeEvent::delete(TABLE, serde_json::to_value(&request)?));
            Ok(Json(DeleteResponse::new(1)))
        }
        None => Ok(Json(DeleteResponse::new(0))),
    }
}
