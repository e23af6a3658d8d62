pub mod compound;
pub mod sqlite;

use std::collections::BTreeSet;

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::ident::UserId;

pub use compound::CompoundCareerStore;
pub use sqlite::SqliteCareerStore;

/// Career state kept for one user identity.
///
/// `items_granted` only ever moves from false to true.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCareerRecord {
    #[serde(rename = "careerId", default)]
    career_id: String,
    #[serde(rename = "careerItemsGranted", default)]
    items_granted: bool,
    #[serde(rename = "careerAppliedAttributes", default)]
    applied_attributes: BTreeSet<String>,
}

impl UserCareerRecord {
    pub fn assigned(&self) -> Option<&str> {
        if self.career_id.is_empty() {
            None
        } else {
            Some(&self.career_id)
        }
    }

    pub fn assign(&mut self, career_id: &str) {
        self.career_id = career_id.to_string();
    }

    pub fn items_granted(&self) -> bool {
        self.items_granted
    }

    pub fn mark_items_granted(&mut self) {
        self.items_granted = true;
    }

    pub fn applied_attributes(&self) -> &BTreeSet<String> {
        &self.applied_attributes
    }

    pub fn set_applied_attributes(&mut self, ids: BTreeSet<String>) {
        self.applied_attributes = ids;
    }
}

#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    InvalidData(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Sqlite(err) => write!(f, "sqlite error: {}", err),
            StoreError::InvalidData(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sqlite(err)
    }
}

/// Durable per-user career records. Missing users read as an empty record.
pub trait CareerStore: Send + Sync {
    fn record(&self, user: UserId) -> Result<UserCareerRecord, StoreError>;
    fn save(&mut self, user: UserId, record: &UserCareerRecord) -> Result<(), StoreError>;
    /// Copy `from`'s record verbatim onto `to`. No-op when `from` has none.
    fn copy_record(&mut self, from: UserId, to: UserId) -> Result<(), StoreError>;
}

/// ECS handle to whichever store the host installed.
#[derive(Resource)]
pub struct CareerStores(pub Box<dyn CareerStore>);

impl CareerStores {
    pub fn new(store: impl CareerStore + 'static) -> Self {
        Self(Box::new(store))
    }

    pub fn store(&self) -> &dyn CareerStore {
        self.0.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn CareerStore {
        self.0.as_mut()
    }
}
