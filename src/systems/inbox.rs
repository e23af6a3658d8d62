use bevy_ecs::prelude::*;

use crate::career::catalog::CareerCatalog;
use crate::career::host::CareerHost;
use crate::career::service::CareerAssignmentService;
use crate::persistence::CareerStores;
use crate::sync::server::{handle_request, CareerInbox, Outbox};

/// System: Handles every client request received since the last tick, in arrival order.
pub fn career_inbox_system(
    inbox: Res<CareerInbox>,
    service: Res<CareerAssignmentService>,
    catalog: Res<CareerCatalog>,
    mut stores: ResMut<CareerStores>,
    mut host: ResMut<CareerHost>,
    mut outbox: ResMut<Outbox>,
) {
    for inbound in inbox.drain() {
        handle_request(
            inbound,
            &service,
            &catalog,
            stores.store_mut(),
            &mut host,
            &mut outbox,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::career::service::tests::{fake_host, sample_catalog};
    use crate::core::ident::UserId;
    use crate::persistence::CompoundCareerStore;
    use crate::sync::messages::CareerMessage;
    use crate::sync::server::Outbound;

    #[test]
    fn drains_requests_in_order() {
        let (host, _log) = fake_host(64, true);
        let mut world = World::new();
        world.insert_resource(CareerInbox::default());
        world.insert_resource(CareerAssignmentService::new());
        world.insert_resource(sample_catalog(true));
        world.insert_resource(CareerStores::new(CompoundCareerStore::new()));
        world.insert_resource(host);
        world.insert_resource(Outbox::default());

        let handle = world.resource::<CareerInbox>().handle();
        let submit = |id: &str| {
            CareerMessage::SubmitChoice {
                career_id: id.to_string(),
            }
            .encode()
            .unwrap()
        };
        handle.receive(UserId(1), submit("mage")).unwrap();
        handle.receive(UserId(1), submit("warrior")).unwrap();

        let mut schedule = Schedule::default();
        schedule.add_systems(career_inbox_system);
        schedule.run(&mut world);

        let sent = world.resource_mut::<Outbox>().drain();
        assert_eq!(sent.len(), 1);
        assert!(matches!(sent[0], Outbound::Packet { user: UserId(1), .. }));
        let record = world.resource::<CareerStores>().store().record(UserId(1)).unwrap();
        assert_eq!(record.assigned(), Some("mage"));
    }
}
