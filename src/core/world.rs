use bevy_ecs::prelude::*;

use crate::career::catalog::CareerCatalog;
use crate::career::host::CareerHost;
use crate::command::{run_career_command, CommandOutcome};
use crate::core::config::CareerConfig;
use crate::core::ecs::{create_schedule, create_world};
use crate::core::ident::UserId;
use crate::data::careers::load_career_catalog;
use crate::persistence::{CareerStores, StoreError, UserCareerRecord};
use crate::sync::server::{CareerInbox, InboundHandle, Outbound, Outbox};
use crate::systems::host_events::{HostEvent, HostEventQueue};
use crate::systems::HostClock;

/// Wrapper around the ECS world and schedule. Owning it means owning the update stream.
pub struct CareerServer {
    world: World,
    schedule: Schedule,
}

impl CareerServer {
    /// Load the catalog from `config` and wire the host's store and collaborators in.
    pub fn new(config: &CareerConfig, stores: CareerStores, host: CareerHost) -> Self {
        let catalog = load_career_catalog(&config.catalog_path, host.registry.as_ref());
        Self::with_catalog(config, catalog, stores, host)
    }

    pub fn with_catalog(
        config: &CareerConfig,
        catalog: CareerCatalog,
        stores: CareerStores,
        host: CareerHost,
    ) -> Self {
        Self {
            world: create_world(config, catalog, stores, host),
            schedule: create_schedule(),
        }
    }

    /// Sender for network threads. Frames are decoded on receipt and handled on the next tick.
    pub fn inbound_handle(&self) -> InboundHandle {
        self.world.resource::<CareerInbox>().handle()
    }

    pub fn connect(&mut self, user: UserId) {
        self.push_event(HostEvent::UserConnected(user));
    }

    pub fn clone_user(&mut self, from: UserId, to: UserId) {
        self.push_event(HostEvent::UserCloned { from, to });
    }

    pub fn disconnect(&mut self, user: UserId) {
        self.push_event(HostEvent::UserDisconnected(user));
    }

    /// Operator `career` command, answered immediately.
    pub fn run_command(&mut self, user: UserId) -> CommandOutcome {
        self.world.resource_scope(|world, mut outbox: Mut<Outbox>| {
            run_career_command(
                user,
                world.resource::<CareerCatalog>(),
                world.resource::<CareerStores>().store(),
                &mut outbox,
            )
        })
    }

    /// Run one tick and hand back everything queued for delivery.
    pub fn tick(&mut self) -> Vec<Outbound> {
        self.schedule.run(&mut self.world);
        self.drain_outbound()
    }

    /// Messages queued outside a tick, such as command replies.
    pub fn drain_outbound(&mut self) -> Vec<Outbound> {
        self.world.resource_mut::<Outbox>().drain()
    }

    pub fn catalog(&self) -> &CareerCatalog {
        self.world.resource::<CareerCatalog>()
    }

    pub fn record(&self, user: UserId) -> Result<UserCareerRecord, StoreError> {
        self.world.resource::<CareerStores>().store().record(user)
    }

    pub fn now(&self) -> u64 {
        self.world.resource::<HostClock>().tick
    }

    fn push_event(&mut self, event: HostEvent) {
        self.world.resource_mut::<HostEventQueue>().0.push(event);
    }
}
