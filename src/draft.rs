//! Donation submission flow. A draft advances through fixed review stages,
//! validating and accumulating fields at each step; only the final stage can
//! produce the insertable record, and it does so by consuming the draft, so
//! a given draft submits at most once.

use uuid::Uuid;

use crate::error::Error;
use crate::models::donation::NewDonation;

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub content: Vec<u8>,
    pub extension: Option<String>,
}

#[derive(Debug)]
pub struct ItemEntry {
    title: String,
    description: String,
    quantity: String,
}

impl ItemEntry {
    pub fn new(title: &str, description: &str, quantity: &str) -> Result<Self, Error> {
        let title = title.trim();
        let quantity = quantity.trim();
        if title.is_empty() {
            return Err(Error::Validation("title must not be empty".into()));
        }
        if quantity.is_empty() {
            return Err(Error::Validation("quantity must not be empty".into()));
        }
        Ok(Self {
            title: title.to_owned(),
            description: description.trim().to_owned(),
            quantity: quantity.to_owned(),
        })
    }

    pub fn with_photo(self, image: Option<ImageUpload>) -> PhotoReview {
        PhotoReview { item: self, image }
    }
}

#[derive(Debug)]
pub struct PhotoReview {
    item: ItemEntry,
    image: Option<ImageUpload>,
}

impl PhotoReview {
    pub fn schedule(self, pickup_time: &str) -> Result<ScheduleReview, Error> {
        let pickup_time = pickup_time.trim();
        if pickup_time.is_empty() {
            return Err(Error::Validation("pickup window must not be empty".into()));
        }
        Ok(ScheduleReview {
            item: self.item,
            image: self.image,
            pickup_time: pickup_time.to_owned(),
        })
    }
}

#[derive(Debug)]
pub struct ScheduleReview {
    item: ItemEntry,
    image: Option<ImageUpload>,
    pickup_time: String,
}

impl ScheduleReview {
    pub fn confirm_address(self, location: &str, distance: Option<String>) -> Result<AddressConfirm, Error> {
        let location = location.trim();
        if location.is_empty() {
            return Err(Error::Validation("pickup address must not be empty".into()));
        }
        Ok(AddressConfirm {
            item: self.item,
            image: self.image,
            pickup_time: self.pickup_time,
            location: location.to_owned(),
            distance,
        })
    }
}

#[derive(Debug)]
pub struct AddressConfirm {
    item: ItemEntry,
    image: Option<ImageUpload>,
    pickup_time: String,
    location: String,
    distance: Option<String>,
}

impl AddressConfirm {
    /// Key for the duplicate-submission guard. Two drafts describing the
    /// same item over the same pickup window collide on purpose.
    pub fn dedup_key(&self) -> String {
        format!("donation:{}|{}", self.item.title, self.pickup_time)
    }

    pub fn submit(self, owner: Uuid) -> Submission {
        Submission {
            donation: NewDonation {
                organization_id: owner,
                title: self.item.title,
                description: self.item.description,
                quantity: self.item.quantity,
                location: self.location,
                distance: self.distance,
                pickup_time: self.pickup_time,
            },
            image: self.image,
        }
    }
}

#[derive(Debug)]
pub struct Submission {
    pub donation: NewDonation,
    pub image: Option<ImageUpload>,
}

#[cfg(test)]
mod test {
    use super::*;

    fn confirmed() -> AddressConfirm {
        ItemEntry::new("Bread", "day-old loaves", "2kg")
            .unwrap()
            .with_photo(None)
            .schedule("today until 18:00")
            .unwrap()
            .confirm_address("Mannerheimintie 1", Some("0.5 km".into()))
            .unwrap()
    }

    #[test]
    fn full_flow_accumulates_fields() {
        let owner = Uuid::new_v4();
        let submission = confirmed().submit(owner);
        let donation = submission.donation;
        assert_eq!(donation.organization_id, owner);
        assert_eq!(donation.title, "Bread");
        assert_eq!(donation.quantity, "2kg");
        assert_eq!(donation.pickup_time, "today until 18:00");
        assert_eq!(donation.location, "Mannerheimintie 1");
    }

    #[test]
    fn empty_title_is_rejected_at_item_entry() {
        assert!(ItemEntry::new("  ", "", "2kg").is_err());
    }

    #[test]
    fn empty_quantity_is_rejected_at_item_entry() {
        assert!(ItemEntry::new("Bread", "", " ").is_err());
    }

    #[test]
    fn empty_pickup_window_is_rejected_at_schedule() {
        let entry = ItemEntry::new("Bread", "", "2kg").unwrap();
        assert!(entry.with_photo(None).schedule("").is_err());
    }

    #[test]
    fn empty_address_is_rejected_at_confirm() {
        let entry = ItemEntry::new("Bread", "", "2kg").unwrap();
        let scheduled = entry.with_photo(None).schedule("today").unwrap();
        assert!(scheduled.confirm_address(" ", None).is_err());
    }

    #[test]
    fn dedup_key_covers_title_and_window() {
        let key = confirmed().dedup_key();
        assert_eq!(key, "donation:Bread|today until 18:00");
    }

    #[actix_web::test]
    async fn double_submission_persists_once() {
        use crate::tracking::OperationGuard;
        use futures::{pin_mut, poll};
        use std::sync::atomic::{AtomicUsize, Ordering};

        let guard = OperationGuard::new();
        let inserts = AtomicUsize::new(0);
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let key = confirmed().dedup_key();
        let first = guard.run(&key, async {
            rx.await.ok();
            inserts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        pin_mut!(first);
        assert!(poll!(&mut first).is_pending());

        // The rapid second click lands while the first insert is in flight.
        let second = guard
            .run(&key, async {
                inserts.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await;
        assert!(second.is_err());

        tx.send(()).ok();
        first.await.unwrap();
        assert_eq!(inserts.load(Ordering::SeqCst), 1);
    }
}
