use std::sync::Arc;
use std::time::Duration;

use sqlx::{query_as, PgPool};
use uuid::Uuid;

use crate::draft::Submission;
use crate::error::Error;
use crate::models::donation::{Donation, DonationRow, DonationStatus};
use crate::realtime::{ChangeEvent, Hub};
use crate::repository::cache::TtlCache;
use crate::storer::{public_url, FileStorer};

pub const AVAILABLE_TTL: Duration = Duration::from_secs(60);

const TABLE: &str = "donations";

/// All donation persistence goes through here: one instance per application,
/// owning the available-listing cache and publishing row changes to the hub.
pub struct DonationRepository {
    pool: PgPool,
    storer: Arc<dyn FileStorer>,
    hub: Hub,
    available: TtlCache<Vec<Donation>>,
}

impl DonationRepository {
    pub fn new(pool: PgPool, storer: Arc<dyn FileStorer>, hub: Hub) -> Self {
        Self::with_ttl(pool, storer, hub, AVAILABLE_TTL)
    }

    pub fn with_ttl(pool: PgPool, storer: Arc<dyn FileStorer>, hub: Hub, ttl: Duration) -> Self {
        Self {
            pool,
            storer,
            hub,
            available: TtlCache::new(ttl),
        }
    }

    /// Uploads the image first, then inserts the row. Status is always
    /// stored as active regardless of what the caller accumulated.
    pub async fn create(&self, submission: Submission) -> Result<Donation, Error> {
        let image_url = match &submission.image {
            Some(image) => {
                let name = self.storer.write(&image.content, image.extension.as_deref())?;
                Some(public_url(&name))
            }
            None => None,
        };
        let data = submission.donation;
        let mut conn = self.pool.acquire().await?;
        let row: DonationRow = query_as(
            r#"INSERT INTO donations
            (id, organization_id, title, description, quantity, location, distance, pickup_time, status, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'active', $9)
            RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(data.organization_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.quantity)
        .bind(&data.location)
        .bind(&data.distance)
        .bind(&data.pickup_time)
        .bind(&image_url)
        .fetch_one(&mut conn)
        .await?;
        let donation: Donation = row.try_into()?;
        self.invalidate();
        self.hub.publish(ChangeEvent::insert(TABLE, serde_json::to_value(&donation)?));
        Ok(donation)
    }

    pub async fn list_mine(&self, owner: Uuid) -> Result<Vec<Donation>, Error> {
        let mut conn = self.pool.acquire().await?;
        let rows: Vec<DonationRow> = query_as(
            "SELECT * FROM donations WHERE organization_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner)
        .fetch_all(&mut conn)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Active donations system-wide. Reads inside the cache window share the
    /// stored listing without touching the database.
    pub async fn list_available(&self) -> Result<Arc<Vec<Donation>>, Error> {
        if let Some(cached) = self.available.get() {
            return Ok(cached);
        }
        let mut conn = self.pool.acquire().await?;
        let rows: Vec<DonationRow> = query_as(
            "SELECT * FROM donations WHERE status = 'active' ORDER BY created_at DESC",
        )
        .fetch_all(&mut conn)
        .await?;
        let listing = rows.into_iter().map(TryInto::try_into).collect::<Result<Vec<Donation>, Error>>()?;
        Ok(self.available.put(listing))
    }

    /// Owner-scoped status change. The row filter carries the owner and the
    /// current status, so a non-owner's call, or any call against a
    /// completed donation, matches zero rows.
    pub async fn update_status(&self, id: Uuid, owner: Uuid, status: DonationStatus) -> Result<usize, Error> {
        let mut conn = self.pool.acquire().await?;
        let row: Option<DonationRow> = query_as(
            r#"UPDATE donations SET status = $1, updated_at = NOW()
            WHERE id = $2 AND organization_id = $3 AND status = 'active'
            RETURNING *"#,
        )
        .bind(status.as_str())
        .bind(id)
        .bind(owner)
        .fetch_optional(&mut conn)
        .await?;
        match row {
            Some(row) => {
                let donation: Donation = row.try_into()?;
                self.invalidate();
                self.hub.publish(ChangeEvent::update(TABLE, serde_json::to_value(&donation)?));
                Ok(1)
            }
            None => Ok(0),
        }
    }

    /// Receiver-side claim: completes an active donation owned by somebody
    /// else. An owner cannot rescue their own listing, and a completed
    /// donation cannot be rescued again.
    pub async fn rescue(&self, id: Uuid, claimer: Uuid) -> Result<Donation, Error> {
        let mut conn = self.pool.acquire().await?;
        let row: Option<DonationRow> = query_as(
            r#"UPDATE donations SET status = 'completed', updated_at = NOW()
            WHERE id = $1 AND organization_id <> $2 AND status = 'active'
            RETURNING *"#,
        )
        .bind(id)
        .bind(claimer)
        .fetch_optional(&mut conn)
        .await?;
        let row = row.ok_or(Error::NotFound)?;
        let donation: Donation = row.try_into()?;
        self.invalidate();
        self.hub.publish(ChangeEvent::update(TABLE, serde_json::to_value(&donation)?));
        Ok(donation)
    }

    pub async fn delete(&self, id: Uuid, owner: Uuid) -> Result<usize, Error> {
        let mut conn = self.pool.acquire().await?;
        let row: Option<DonationRow> = query_as(
            "DELETE FROM donations WHERE id = $1 AND organization_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&mut conn)
        .await?;
        match row {
            Some(row) => {
                let donation: Donation = row.try_into()?;
                self.invalidate();
                self.hub.publish(ChangeEvent::delete(TABLE, serde_json::to_value(&donation)?));
                Ok(1)
            }
            None => Ok(0),
        }
    }

    /// Drops the cached available listing. Called by every write; TTL expiry
    /// remains the backstop for changes made by other instances.
    pub fn invalidate(&self) {
        self.available.invalidate();
    }
}
