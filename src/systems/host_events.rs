use std::collections::BTreeSet;

use bevy_ecs::prelude::*;
use bevy_utils::tracing::{debug, error};

use crate::career::catalog::CareerCatalog;
use crate::career::host::CareerHost;
use crate::career::service::CareerAssignmentService;
use crate::core::ident::UserId;
use crate::persistence::CareerStores;

/// Session lifecycle callbacks from the host, applied at the start of the next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    UserConnected(UserId),
    /// A user's identity was recreated (respawn); the record follows it.
    UserCloned { from: UserId, to: UserId },
    UserDisconnected(UserId),
}

#[derive(Resource, Debug, Default)]
pub struct HostEventQueue(pub Vec<HostEvent>);

/// Users currently in the session, visited by the prompt scheduler every tick.
#[derive(Resource, Debug, Default)]
pub struct ConnectedUsers(pub BTreeSet<UserId>);

pub fn career_event_system(
    mut events: ResMut<HostEventQueue>,
    mut connected: ResMut<ConnectedUsers>,
    service: Res<CareerAssignmentService>,
    catalog: Res<CareerCatalog>,
    mut stores: ResMut<CareerStores>,
    mut host: ResMut<CareerHost>,
) {
    for event in std::mem::take(&mut events.0) {
        match event {
            HostEvent::UserConnected(user) => {
                connected.0.insert(user);
                service.apply_existing(user, &catalog, stores.store_mut(), &mut host);
            }
            HostEvent::UserCloned { from, to } => {
                if let Err(err) = stores.store_mut().copy_record(from, to) {
                    error!("cannot copy career record from {} to {}: {}", from, to, err);
                }
                connected.0.remove(&from);
                connected.0.insert(to);
                service.apply_existing(to, &catalog, stores.store_mut(), &mut host);
            }
            HostEvent::UserDisconnected(user) => {
                connected.0.remove(&user);
                debug!("{} disconnected", user);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::career::service::tests::{fake_host, sample_catalog, HostLog};
    use crate::persistence::CompoundCareerStore;

    fn world_with(store: CompoundCareerStore) -> (World, Arc<Mutex<HostLog>>) {
        let (host, log) = fake_host(64, true);
        let mut world = World::new();
        world.insert_resource(HostEventQueue::default());
        world.insert_resource(ConnectedUsers::default());
        world.insert_resource(CareerAssignmentService::new());
        world.insert_resource(sample_catalog(true));
        world.insert_resource(CareerStores::new(store));
        world.insert_resource(host);
        (world, log)
    }

    fn run(world: &mut World, events: Vec<HostEvent>) {
        world.resource_mut::<HostEventQueue>().0 = events;
        let mut schedule = Schedule::default();
        schedule.add_systems(career_event_system);
        schedule.run(world);
    }

    #[test]
    fn connect_reapplies_existing_career() {
        let mut seeded = CompoundCareerStore::new();
        let (mut setup_host, _) = fake_host(64, true);
        CareerAssignmentService::new()
            .choose(UserId(1), "mage", &sample_catalog(true), &mut seeded, &mut setup_host)
            .unwrap();

        let (mut world, log) = world_with(seeded);
        run(&mut world, vec![HostEvent::UserConnected(UserId(1))]);

        assert!(world.resource::<ConnectedUsers>().0.contains(&UserId(1)));
        let log = log.lock().unwrap();
        assert_eq!(log.extras.get(&(UserId(1), "minecraft:y".to_string())), Some(&3.0));
        assert_eq!(log.extras.get(&(UserId(1), "minecraft:z".to_string())), Some(&4.0));
        assert!(log.held.is_empty());
        assert!(world.resource::<HostEventQueue>().0.is_empty());
    }

    #[test]
    fn clone_carries_record_to_new_identity() {
        let mut seeded = CompoundCareerStore::new();
        let (mut setup_host, _) = fake_host(64, true);
        CareerAssignmentService::new()
            .choose(UserId(1), "warrior", &sample_catalog(true), &mut seeded, &mut setup_host)
            .unwrap();

        let (mut world, log) = world_with(seeded);
        run(
            &mut world,
            vec![
                HostEvent::UserConnected(UserId(1)),
                HostEvent::UserCloned {
                    from: UserId(1),
                    to: UserId(2),
                },
            ],
        );

        let record = world.resource::<CareerStores>().store().record(UserId(2)).unwrap();
        assert_eq!(record.assigned(), Some("warrior"));
        assert!(record.items_granted());
        assert_eq!(
            world.resource::<ConnectedUsers>().0.iter().copied().collect::<Vec<_>>(),
            [UserId(2)]
        );
        let log = log.lock().unwrap();
        assert_eq!(log.extras.get(&(UserId(2), "minecraft:x".to_string())), Some(&1.0));
    }

    #[test]
    fn disconnect_keeps_record() {
        let (mut world, _log) = world_with(CompoundCareerStore::new());
        run(
            &mut world,
            vec![
                HostEvent::UserConnected(UserId(7)),
                HostEvent::UserDisconnected(UserId(7)),
            ],
        );
        assert!(world.resource::<ConnectedUsers>().0.is_empty());
        let record = world.resource::<CareerStores>().store().record(UserId(7)).unwrap();
        assert_eq!(record.assigned(), None);
    }
}
