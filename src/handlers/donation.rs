use actix_multipart::Multipart;
use actix_web::web::{Data, Json, Path};
use actix_web::HttpResponse;
use futures_util::TryStreamExt;
use serde::Deserialize;
use uuid::Uuid;

use crate::context::UserInfo;
use crate::draft::{ImageUpload, ItemEntry};
use crate::error::Error;
use crate::models::donation::{Donation, DonationStatus};
use crate::repository::donation::DonationRepository;
use crate::response::{DeleteResponse, List, UpdateResponse};
use crate::tracking::{track, OperationGuard};

#[derive(Debug, Deserialize)]
pub struct DonationPayload {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub quantity: String,
    pub location: String,
    #[serde(default)]
    pub distance: Option<String>,
    pub pickup_time: String,
}

fn extension_of(filename: Option<&str>) -> Option<String> {
    filename.and_then(|f| f.rsplit_once('.')).map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Multipart submission: a `data` part carrying the donation fields as JSON
/// and an optional `image` part. The accumulated draft persists exactly
/// once; a rapid duplicate under the same title and pickup window is
/// rejected while the first is in flight.
pub async fn create(
    me: UserInfo,
    mut payload: Multipart,
    repo: Data<DonationRepository>,
    guard: Data<OperationGuard>,
) -> Result<Json<Donation>, Error> {
    let mut data: Option<DonationPayload> = None;
    let mut image: Option<ImageUpload> = None;
    while let Some(mut field) = payload.try_next().await? {
        let disposition = field.content_disposition();
        let name = disposition.get_name().unwrap_or_default().to_owned();
        let filename = disposition.get_filename().map(|f| f.to_owned());
        let mut content = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            content.extend_from_slice(&chunk);
        }
        match name.as_str() {
            "data" => data = Some(serde_json::from_slice(&content)?),
            "image" => {
                image = Some(ImageUpload {
                    content,
                    extension: extension_of(filename.as_deref()),
                })
            }
            _ => {}
        }
    }
    let data = data.ok_or_else(|| Error::Validation("missing donation data".into()))?;

    let confirmed = ItemEntry::new(&data.title, &data.description, &data.quantity)?
        .with_photo(image)
        .schedule(&data.pickup_time)?
        .confirm_address(&data.location, data.distance)?;
    let key = confirmed.dedup_key();
    let donation = track("create_donation", guard.run(&key, repo.create(confirmed.submit(me.id)))).await?;
    Ok(Json(donation))
}

pub async fn list(me: UserInfo, repo: Data<DonationRepository>) -> Result<Json<List<Donation>>, Error> {
    let donations = track("list_donations", repo.list_mine(me.id)).await?;
    let total = donations.len() as i64;
    Ok(Json(List::new(donations, total)))
}

pub async fn available(repo: Data<DonationRepository>) -> Result<HttpResponse, Error> {
    let listing = track("list_available_donations", repo.list_available()).await?;
    Ok(HttpResponse::Ok().json(&*listing))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: DonationStatus,
}

pub async fn update_status(
    me: UserInfo,
    donation_id: Path<(Uuid,)>,
    Json(StatusUpdate { status }): Json<StatusUpdate>,
    repo: Data<DonationRepository>,
) -> Result<Json<UpdateResponse>, Error> {
    let donation_id = donation_id.into_inner().0;
    let updated = track("update_donation_status", repo.update_status(donation_id, me.id, status)).await?;
    Ok(Json(UpdateResponse::new(updated)))
}

pub async fn rescue(me: UserInfo, donation_id: Path<(Uuid,)>, repo: Data<DonationRepository>) -> Result<Json<Donation>, Error> {
    let donation_id = donation_id.into_inner().0;
    let donation = track("rescue_donation", repo.rescue(donation_id, me.id)).await?;
    Ok(Json(donation))
}

pub async fn delete_donation(me: UserInfo, donation_id: Path<(Uuid,)>, repo: Data<DonationRepository>) -> Result<Json<DeleteResponse>, Error> {
    let donation_id = donation_id.into_inner().0;
    let deleted = track("delete_donation", repo.delete(donation_id, me.id)).await?;
    Ok(Json(DeleteResponse::new(deleted)))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn extension_is_taken_from_the_filename() {
        assert_eq!(extension_of(Some("photo.JPG")), Some("jpg".into()));
        assert_eq!(extension_of(Some("archive.tar.gz")), Some("gz".into()));
        assert_eq!(extension_of(Some("noext")), None);
        assert_eq!(extension_of(None), None);
    }
}
