use actix_web::web::{Data, Query};
use actix_web::HttpResponse;
use bytes::Bytes;
use futures::stream;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::context::UserInfo;
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

/// Row-level change notification. `new` carries the row after an insert or
/// update, `old` the row before an update or delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: String,
    pub op: ChangeOp,
    pub new: Option<Value>,
    pub old: Option<Value>,
}

impl ChangeEvent {
    pub fn insert(table: &str, new: Value) -> Self {
        Self {
            table: table.to_owned(),
            op: ChangeOp::Insert,
            new: Some(new),
            old: None,
        }
    }

    pub fn update(table: &str, new: Value) -> Self {
        Self {
            table: table.to_owned(),
            op: ChangeOp::Update,
            new: Some(new),
            old: None,
        }
    }

    pub fn delete(table: &str, old: Value) -> Self {
        Self {
            table: table.to_owned(),
            op: ChangeOp::Delete,
            new: None,
            old: Some(old),
        }
    }

    /// Whether the affected row belongs to the given user, judged by the
    /// owner column of either payload.
    pub fn owned_by(&self, user_id: Uuid) -> bool {
        let owner = |v: &Value| {
            v.get("organization_id")
                .or_else(|| v.get("user_id"))
                .and_then(Value::as_str)
                .map(|s| s.to_owned())
        };
        let id = user_id.to_string();
        self.new.as_ref().and_then(&owner) == Some(id.clone()) || self.old.as_ref().and_then(&owner) == Some(id)
    }
}

/// Fan-out point for change notifications. Publishing never blocks; events
/// sent while nobody is subscribed are dropped.
#[derive(Debug, Clone)]
pub struct Hub {
    tx: broadcast::Sender<ChangeEvent>,
}

impl Hub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, event: ChangeEvent) {
        self.tx.send(event).ok();
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

pub trait Record {
    fn id(&self) -> Uuid;
}

/// Merges one change event into a local list: inserts prepend, updates
/// replace the matching row by id, deletes remove it. Events for unknown
/// ids are dropped; the last event wins.
pub fn apply<T>(rows: &mut Vec<T>, event: &ChangeEvent)
where
    T: Record + DeserializeOwned,
{
    match event.op {
        ChangeOp::Insert => {
            if let Some(new) = &event.new {
                if let Ok(row) = serde_json::from_value::<T>(new.clone()) {
                    rows.insert(0, row);
                }
            }
        }
        ChangeOp::Update => {
            if let Some(new) = &event.new {
                if let Ok(row) = serde_json::from_value::<T>(new.clone()) {
                    if let Some(slot) = rows.iter_mut().find(|r| r.id() == row.id()) {
                        *slot = row;
                    }
                }
            }
        }
        ChangeOp::Delete => {
            if let Some(old) = &event.old {
                if let Some(id) = old.get("id").and_then(Value::as_str).and_then(|s| s.parse::<Uuid>().ok()) {
                    rows.retain(|r| r.id() != id);
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub table: String,
    #[serde(default)]
    pub mine: bool,
}

/// Server-sent event stream of row changes for one table, optionally
/// restricted to rows owned by the caller. The subscription ends when the
/// client goes away and the stream is dropped.
pub async fn events(user: UserInfo, Query(query): Query<EventsQuery>, hub: Data<Hub>) -> Result<HttpResponse, Error> {
    if query.table != "donations" && query.table != "requests" {
        return Err(Error::Validation(format!("unknown table: {}", query.table)));
    }
    let rx = hub.subscribe();
    let owner = if query.mine { Some(user.id) } else { None };

    let body = stream::unfold((rx, query.table, owner), |(mut rx, table, owner)| async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if event.table != table {
                        continue;
                    }
                    if let Some(uid) = owner {
                        if !event.owned_by(uid) {
                            continue;
                        }
                    }
                    let json = match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(_) => continue,
                    };
                    let frame = Bytes::from(format!("event: {}\ndata: {}\n\n", event.table, json));
                    return Some((Ok::<_, Error>(frame), (rx, table, owner)));
                }
                // Slow consumers skip what they missed and carry on.
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(body))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::models::donation::{Donation, DonationStatus};
    use chrono::Utc;

    fn donation(id: Uuid, owner: Uuid, title: &str) -> Donation {
        Donation {
            id,
            organization_id: owner,
            title: title.into(),
            description: String::new(),
            quantity: "2kg".into(),
            location: "Helsinki".into(),
            distance: None,
            pickup_time: "today until 18:00".into(),
            status: DonationStatus::Active,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn insert_prepends() {
        let owner = Uuid::new_v4();
        let existing = donation(Uuid::new_v4(), owner, "Soup");
        let incoming = donation(Uuid::new_v4(), owner, "Bread");
        let mut rows = vec![existing];

        let event = ChangeEvent::insert("donations", serde_json::to_value(&incoming).unwrap());
        apply(&mut rows, &event);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].title, "Bread");
    }

    #[test]
    fn update_replaces_matching_row() {
        let owner = Uuid::new_v4();
        let id = Uuid::new_v4();
        let mut rows = vec![donation(id, owner, "Bread")];

        let mut updated = donation(id, owner, "Bread");
        updated.status = DonationStatus::Completed;
        let event = ChangeEvent::update("donations", serde_json::to_value(&updated).unwrap());
        apply(&mut rows, &event);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, DonationStatus::Completed);
    }

    #[test]
    fn update_for_unknown_id_is_ignored() {
        let owner = Uuid::new_v4();
        let mut rows = vec![donation(Uuid::new_v4(), owner, "Bread")];

        let stranger = donation(Uuid::new_v4(), owner, "Soup");
        let event = ChangeEvent::update("donations", serde_json::to_value(&stranger).unwrap());
        apply(&mut rows, &event);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Bread");
    }

    #[test]
    fn delete_removes_by_id() {
        let owner = Uuid::new_v4();
        let id = Uuid::new_v4();
        let gone = donation(id, owner, "Bread");
        let mut rows = vec![gone.clone(), donation(Uuid::new_v4(), owner, "Soup")];

        let event = ChangeEvent::delete("donations", serde_json::to_value(&gone).unwrap());
        apply(&mut rows, &event);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Soup");
    }

    #[test]
    fn ownership_filter_checks_both_payloads() {
        let owner = Uuid::new_v4();
        let row = donation(Uuid::new_v4(), owner, "Bread");
        let value = serde_json::to_value(&row).unwrap();

        assert!(ChangeEvent::insert("donations", value.clone()).owned_by(owner));
        assert!(ChangeEvent::delete("donations", value).owned_by(owner));
        assert!(!ChangeEvent::insert("donations", serde_json::to_value(&donation(Uuid::new_v4(), Uuid::new_v4(), "Soup")).unwrap()).owned_by(owner));
    }

    #[actix_web::test]
    async fn hub_delivers_published_events() {
        let hub = Hub::new(8);
        let mut rx = hub.subscribe();

        let row = donation(Uuid::new_v4(), Uuid::new_v4(), "Bread");
        hub.publish(ChangeEvent::insert("donations", serde_json::to_value(&row).unwrap()));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.op, ChangeOp::Insert);
        assert_eq!(event.table, "donations");
    }
}
