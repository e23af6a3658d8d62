use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};

use bevy_ecs::prelude::*;
use bevy_utils::tracing::{debug, error, info, warn};

use crate::career::catalog::{CareerCatalog, CareerDefinition};
use crate::career::host::CareerHost;
use crate::core::ident::{NamespacedId, UserId};
use crate::persistence::CareerStore;

static MISSING_ATTRIBUTES_WARNED: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionRejected {
    /// The user already has a career and choices are permanent.
    Locked,
    /// The user already has exactly this career.
    AlreadyAssigned,
    UnknownCareer,
    /// The user's record could not be read or written. Nothing was applied or granted.
    StoreUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOutcome {
    pub career_id: String,
    pub previous: Option<String>,
    pub resources_granted: bool,
}

/// Per-user career state machine: Unassigned → Assigned(id), and Assigned → Assigned(other)
/// only while choices are unlocked.
#[derive(Resource, Debug, Default)]
pub struct CareerAssignmentService;

impl CareerAssignmentService {
    pub fn new() -> Self {
        Self
    }

    /// Re-apply the bonuses of the user's current career. Safe to call on every reconnect.
    pub fn apply_existing(
        &self,
        user: UserId,
        catalog: &CareerCatalog,
        store: &mut dyn CareerStore,
        host: &mut CareerHost,
    ) {
        let mut record = match store.record(user) {
            Ok(record) => record,
            Err(err) => {
                error!("cannot read career record for {}: {}", user, err);
                return;
            }
        };
        let Some(def) = record.assigned().and_then(|id| catalog.find(id)) else {
            return;
        };
        let previous = record.applied_attributes().clone();
        if !apply_bonuses(user, def, &previous, host) {
            return;
        }
        let next = bonus_set(def);
        if next != previous {
            record.set_applied_attributes(next);
            if let Err(err) = store.save(user, &record) {
                error!("cannot save career record for {}: {}", user, err);
            }
        }
    }

    /// The new state is saved before any effect reaches the host, so a failed save
    /// leaves the user untouched and the one-time grant can never run twice.
    pub fn choose(
        &self,
        user: UserId,
        career_id: &str,
        catalog: &CareerCatalog,
        store: &mut dyn CareerStore,
        host: &mut CareerHost,
    ) -> Result<ChoiceOutcome, SelectionRejected> {
        let mut record = store.record(user).map_err(|err| {
            error!("cannot read career record for {}: {}", user, err);
            SelectionRejected::StoreUnavailable
        })?;
        let previous = record.assigned().map(str::to_string);
        check_selection(previous.as_deref(), career_id, catalog.lock_after_choice())?;
        let def = catalog
            .find(career_id)
            .ok_or(SelectionRejected::UnknownCareer)?;

        let previous_bonuses = record.applied_attributes().clone();
        let grant = !record.items_granted();
        record.assign(&def.id);
        if grant {
            record.mark_items_granted();
        }
        if host.attributes.is_some() {
            record.set_applied_attributes(bonus_set(def));
        }
        store.save(user, &record).map_err(|err| {
            error!("cannot save career record for {}: {}", user, err);
            SelectionRejected::StoreUnavailable
        })?;

        apply_bonuses(user, def, &previous_bonuses, host);
        if grant {
            grant_starting_resources(user, def, host);
        }
        info!("{} chose career {}", user, def.id);

        Ok(ChoiceOutcome {
            career_id: def.id.clone(),
            previous,
            resources_granted: grant,
        })
    }
}

/// Logs the missing attribute service once per process. Returns whether this call logged.
fn warn_missing_attributes() -> bool {
    if MISSING_ATTRIBUTES_WARNED.swap(true, Ordering::Relaxed) {
        return false;
    }
    warn!("attribute service not available, career bonuses are disabled");
    true
}

fn bonus_set(def: &CareerDefinition) -> BTreeSet<String> {
    def.bonus_ids().map(|id| id.to_string()).collect()
}

/// Apply `def`'s bonuses and retract the ones in `previous` the user no longer earns.
///
/// Returns `false` when the attribute service is missing and nothing was touched.
fn apply_bonuses(
    user: UserId,
    def: &CareerDefinition,
    previous: &BTreeSet<String>,
    host: &mut CareerHost,
) -> bool {
    let Some(attributes) = host.attributes.as_mut() else {
        warn_missing_attributes();
        return false;
    };

    for bonus in &def.attributes {
        if let Err(err) = attributes.set_extra(user, &bonus.attribute_id, bonus.value) {
            warn!("applying {} to {} failed: {}", bonus.attribute_id, user, err);
        }
    }

    let next = bonus_set(def);
    for stale in previous.difference(&next) {
        let Some(id) = NamespacedId::try_parse(stale) else {
            continue;
        };
        if let Err(err) = attributes.reset_extra(user, &id) {
            debug!("ignoring reset of {} for {}: {}", id, user, err);
        }
    }
    true
}

fn check_selection(
    current: Option<&str>,
    requested: &str,
    lock_after_choice: bool,
) -> Result<(), SelectionRejected> {
    match current {
        Some(_) if lock_after_choice => Err(SelectionRejected::Locked),
        Some(current) if current == requested => Err(SelectionRejected::AlreadyAssigned),
        _ => Ok(()),
    }
}

/// Hand out `def`'s starting resources. Overflow lands next to the user.
fn grant_starting_resources(user: UserId, def: &CareerDefinition, host: &mut CareerHost) {
    for resource in &def.starting_resources {
        if !host.registry.contains(&resource.resource_id) {
            warn!("starting resource {} does not exist", resource.resource_id);
            continue;
        }
        let leftover = host
            .holdings
            .insert(user, &resource.resource_id, resource.count);
        if leftover > 0 {
            host.holdings
                .drop_near(user, &resource.resource_id, leftover.min(resource.count));
        }
    }
}
