use bevy_ecs::prelude::*;
use bevy_ecs::schedule::SystemSet;

use crate::career::catalog::CareerCatalog;
use crate::career::host::CareerHost;
use crate::career::prompt::PromptScheduler;
use crate::career::service::CareerAssignmentService;
use crate::core::config::CareerConfig;
use crate::persistence::CareerStores;
use crate::sync::server::{CareerInbox, Outbox};
use crate::systems::host_events::{career_event_system, ConnectedUsers, HostEventQueue};
use crate::systems::inbox::career_inbox_system;
use crate::systems::prompt::prompt_system;
use crate::systems::{advance_clock_system, HostClock};

/// Canonical tick ordering for the update stream.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum TickSet {
    Intake,
    Careers,
    Prompt,
    Time,
}

/// Build the ECS world with the loaded catalog and the host's collaborators.
pub fn create_world(
    config: &CareerConfig,
    catalog: CareerCatalog,
    stores: CareerStores,
    host: CareerHost,
) -> World {
    let mut world = World::new();
    world.insert_resource(HostClock::default());
    world.insert_resource(HostEventQueue::default());
    world.insert_resource(ConnectedUsers::default());
    world.insert_resource(CareerInbox::default());
    world.insert_resource(Outbox::default());
    world.insert_resource(CareerAssignmentService::new());
    world.insert_resource(PromptScheduler::new(config.prompt_interval_ticks));
    world.insert_resource(catalog);
    world.insert_resource(stores);
    world.insert_resource(host);
    world
}

/// Build the system schedule in the canonical order.
pub fn create_schedule() -> Schedule {
    let mut schedule = Schedule::default();

    schedule.configure_sets((TickSet::Intake, TickSet::Careers, TickSet::Prompt, TickSet::Time).chain());

    schedule.add_systems((
        career_event_system.in_set(TickSet::Intake),
        career_inbox_system.in_set(TickSet::Careers),
        prompt_system.in_set(TickSet::Prompt),
        advance_clock_system.in_set(TickSet::Time),
    ));

    schedule
}
