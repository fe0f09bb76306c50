//! In-memory application state for item reports.
//!
//! All mutation goes through [`ItemStore::apply`] with a [`Command`], which
//! either applies completely and returns an [`Event`] or leaves the state
//! untouched and returns a [`StoreError`]. Nothing is persisted.

use chrono::{Duration, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Category, DashboardStats, Disposition, Item, ItemStatus};

/// Fields supplied by a user when reporting an item.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub disposition: Disposition,
    pub title: String,
    pub category: Category,
    pub description: String,
    pub location: String,
    pub date: String,
    pub reporter_id: String,
    pub image_url: Option<String>,
}

/// Editable fields of an existing report. Disposition cannot change.
#[derive(Debug, Clone)]
pub struct ItemUpdate {
    pub title: String,
    pub category: Category,
    pub description: String,
    pub location: String,
    pub date: String,
    /// `None` keeps the current image.
    pub image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Command {
    Report(NewItem),
    Update { id: String, changes: ItemUpdate },
    SetStatus { id: String, status: ItemStatus },
    Resolve { id: String },
    ConfirmMatch {
        lost_item_id: String,
        found_item_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Reported { id: String },
    Updated { id: String },
    StatusChanged { id: String, status: ItemStatus },
    Matched {
        lost_item_id: String,
        found_item_id: String,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("item not found: {0}")]
    NotFound(String),
    #[error("item {id} is not a {expected} item")]
    WrongDisposition { id: String, expected: Disposition },
    #[error("item {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: ItemStatus,
        to: ItemStatus,
    },
}

/// Whether an administrator may move an item from `from` to `to`.
///
/// MATCHED is only reachable through [`Command::ConfirmMatch`], and
/// RESOLVED is terminal.
pub fn can_transition(from: ItemStatus, to: ItemStatus) -> bool {
    match (from, to) {
        (ItemStatus::Resolved, _) => false,
        (ItemStatus::Matched, ItemStatus::Resolved) => true,
        (ItemStatus::Matched, ItemStatus::Reported | ItemStatus::UnderReview | ItemStatus::Matched) => {
            false
        }
        (ItemStatus::Reported | ItemStatus::UnderReview, ItemStatus::Matched) => false,
        (
            ItemStatus::Reported | ItemStatus::UnderReview,
            ItemStatus::Reported | ItemStatus::UnderReview | ItemStatus::Resolved,
        ) => true,
    }
}

fn can_be_matched(status: ItemStatus) -> bool {
    match status {
        ItemStatus::Reported | ItemStatus::UnderReview => true,
        ItemStatus::Matched | ItemStatus::Resolved => false,
    }
}

#[derive(Debug, Clone, Default)]
pub struct ItemStore {
    /// Newest first.
    items: Vec<Item>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<Item>) -> Self {
        Self { items }
    }

    /// A store holding the campus demo reports.
    pub fn seeded() -> Self {
        Self::with_items(seed_items())
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn items_for_reporter(&self, reporter_id: &str) -> Vec<&Item> {
        self.items
            .iter()
            .filter(|i| i.reporter_id == reporter_id)
            .collect()
    }

    /// Items eligible as match candidates: everything not yet resolved.
    pub fn match_candidates(&self) -> Vec<Item> {
        self.items
            .iter()
            .filter(|i| i.status != ItemStatus::Resolved)
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> DashboardStats {
        let mut stats = DashboardStats {
            total: self.items.len(),
            ..Default::default()
        };
        for item in &self.items {
            match item.disposition {
                Disposition::Lost => stats.total_lost += 1,
                Disposition::Found => stats.total_found += 1,
            }
            match item.status {
                ItemStatus::Resolved => stats.resolved_cases += 1,
                ItemStatus::Reported | ItemStatus::UnderReview | ItemStatus::Matched => {
                    stats.pending_cases += 1
                }
            }
        }
        stats
    }

    pub fn apply(&mut self, command: Command) -> Result<Event, StoreError> {
        match command {
            Command::Report(new) => {
                let id = Uuid::new_v4().simple().to_string();
                self.items.insert(
                    0,
                    Item {
                        id: id.clone(),
                        disposition: new.disposition,
                        title: new.title,
                        category: new.category,
                        description: new.description,
                        location: new.location,
                        date: new.date,
                        status: ItemStatus::Reported,
                        reporter_id: new.reporter_id,
                        image_url: new.image_url,
                        matched_item_id: None,
                    },
                );
                Ok(Event::Reported { id })
            }
            Command::Update { id, changes } => {
                let item = self.get_mut(&id)?;
                item.title = changes.title;
                item.category = changes.category;
                item.description = changes.description;
                item.location = changes.location;
                item.date = changes.date;
                if changes.image_url.is_some() {
                    item.image_url = changes.image_url;
                }
                Ok(Event::Updated { id })
            }
            Command::SetStatus { id, status } => self.set_status(id, status),
            Command::Resolve { id } => self.set_status(id, ItemStatus::Resolved),
            Command::ConfirmMatch {
                lost_item_id,
                found_item_id,
            } => self.confirm_match(lost_item_id, found_item_id),
        }
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Item, StoreError> {
        self.items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn set_status(&mut self, id: String, status: ItemStatus) -> Result<Event, StoreError> {
        let item = self.get_mut(&id)?;
        if !can_transition(item.status, status) {
            return Err(StoreError::InvalidTransition {
                id,
                from: item.status,
                to: status,
            });
        }
        item.status = status;
        Ok(Event::StatusChanged { id, status })
    }

    fn check_matchable(&self, id: &str, expected: Disposition) -> Result<(), StoreError> {
        let item = self
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if item.disposition != expected {
            return Err(StoreError::WrongDisposition {
                id: id.to_string(),
                expected,
            });
        }
        if !can_be_matched(item.status) {
            return Err(StoreError::InvalidTransition {
                id: id.to_string(),
                from: item.status,
                to: ItemStatus::Matched,
            });
        }
        Ok(())
    }

    fn confirm_match(
        &mut self,
        lost_item_id: String,
        found_item_id: String,
    ) -> Result<Event, StoreError> {
        self.check_matchable(&lost_item_id, Disposition::Lost)?;
        self.check_matchable(&found_item_id, Disposition::Found)?;

        for item in self.items.iter_mut() {
            if item.id == lost_item_id {
                item.status = ItemStatus::Matched;
                item.matched_item_id = Some(found_item_id.clone());
            } else if item.id == found_item_id {
                item.status = ItemStatus::Matched;
                item.matched_item_id = Some(lost_item_id.clone());
            }
        }

        tracing::info!(lost = %lost_item_id, found = %found_item_id, "match confirmed");
        Ok(Event::Matched {
            lost_item_id,
            found_item_id,
        })
    }
}

/// The five demo reports, dated today and yesterday.
pub fn seed_items() -> Vec<Item> {
    let today = Utc::now().date_naive();
    let yesterday = today - Duration::days(1);
    let today = today.format("%Y-%m-%d").to_string();
    let yesterday = yesterday.format("%Y-%m-%d").to_string();

    let seed = |id: &str,
                disposition: Disposition,
                title: &str,
                category: Category,
                description: &str,
                location: &str,
                date: &str,
                status: ItemStatus,
                reporter_id: &str| Item {
        id: id.to_string(),
        disposition,
        title: title.to_string(),
        category,
        description: description.to_string(),
        location: location.to_string(),
        date: date.to_string(),
        status,
        reporter_id: reporter_id.to_string(),
        image_url: None,
        matched_item_id: None,
    };

    vec![
        seed(
            "1",
            Disposition::Lost,
            "Silver MacBook Pro 14\"",
            Category::Electronics,
            "Left it in the library study room 3B. Has a sticker of a cat on the lid.",
            "Main Library",
            &today,
            ItemStatus::Reported,
            "u1",
        ),
        seed(
            "2",
            Disposition::Found,
            "Grey Apple Laptop",
            Category::Electronics,
            "Found near the study rooms. Locked.",
            "Main Library",
            &today,
            ItemStatus::Reported,
            "u2",
        ),
        seed(
            "3",
            Disposition::Lost,
            "Blue Hydroflask",
            Category::Other,
            "Dented on the bottom, has a climbing sticker.",
            "Gym",
            &yesterday,
            ItemStatus::Resolved,
            "u1",
        ),
        seed(
            "4",
            Disposition::Found,
            "Car Keys (Toyota)",
            Category::Keys,
            "Found in the parking lot B.",
            "Parking Lot B",
            &yesterday,
            ItemStatus::UnderReview,
            "u3",
        ),
        seed(
            "5",
            Disposition::Lost,
            "Black Leather Wallet",
            Category::Accessories,
            "Contains ID for John Doe. Lost near cafeteria.",
            "Cafeteria",
            &today,
            ItemStatus::Reported,
            "u4",
        ),
    ]
}
