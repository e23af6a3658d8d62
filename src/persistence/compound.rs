use std::collections::HashMap;

use bevy_utils::tracing::warn;
use serde_json::{Map, Value};

use crate::core::ident::UserId;
use crate::persistence::{CareerStore, StoreError, UserCareerRecord};

/// Key of the sub-tree this crate owns inside each user's persistent compound.
pub const CAREER_ROOT: &str = "careers";

/// In-memory stand-in for the host's per-user key-value compound.
///
/// Only the `careers` sub-tree is read or written; sibling keys belong to the host.
#[derive(Debug, Default, Clone)]
pub struct CompoundCareerStore {
    compounds: HashMap<UserId, Map<String, Value>>,
}

impl CompoundCareerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compound(&self, user: UserId) -> Option<&Map<String, Value>> {
        self.compounds.get(&user)
    }

    pub fn compound_mut(&mut self, user: UserId) -> &mut Map<String, Value> {
        self.compounds.entry(user).or_default()
    }
}

impl CareerStore for CompoundCareerStore {
    fn record(&self, user: UserId) -> Result<UserCareerRecord, StoreError> {
        let Some(tree) = self
            .compounds
            .get(&user)
            .and_then(|compound| compound.get(CAREER_ROOT))
        else {
            return Ok(UserCareerRecord::default());
        };
        match serde_json::from_value(tree.clone()) {
            Ok(record) => Ok(record),
            Err(err) => {
                warn!("career data for {} unreadable, starting fresh: {}", user, err);
                Ok(UserCareerRecord::default())
            }
        }
    }

    fn save(&mut self, user: UserId, record: &UserCareerRecord) -> Result<(), StoreError> {
        let tree = serde_json::to_value(record)
            .map_err(|err| StoreError::InvalidData(format!("encode career record: {}", err)))?;
        self.compound_mut(user).insert(CAREER_ROOT.to_string(), tree);
        Ok(())
    }

    fn copy_record(&mut self, from: UserId, to: UserId) -> Result<(), StoreError> {
        let Some(tree) = self
            .compounds
            .get(&from)
            .and_then(|compound| compound.get(CAREER_ROOT))
            .cloned()
        else {
            return Ok(());
        };
        self.compound_mut(to).insert(CAREER_ROOT.to_string(), tree);
        Ok(())
    }
}
