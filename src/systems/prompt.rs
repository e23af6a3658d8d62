use bevy_ecs::prelude::*;
use bevy_utils::tracing::error;

use crate::career::prompt::PromptScheduler;
use crate::persistence::CareerStores;
use crate::sync::server::Outbox;
use crate::systems::host_events::ConnectedUsers;
use crate::systems::HostClock;

/// System: Reminds connected users without a career to pick one.
pub fn prompt_system(
    clock: Res<HostClock>,
    connected: Res<ConnectedUsers>,
    stores: Res<CareerStores>,
    mut scheduler: ResMut<PromptScheduler>,
    mut outbox: ResMut<Outbox>,
) {
    for &user in connected.0.iter() {
        let assigned = match stores.store().record(user) {
            Ok(record) => record.assigned().is_some(),
            Err(err) => {
                error!("cannot read career record for {}: {}", user, err);
                continue;
            }
        };
        if let Some(notice) = scheduler.on_tick(user, assigned, clock.tick) {
            outbox.notice(user, notice);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::career::prompt::PROMPT_COMMAND;
    use crate::core::ident::UserId;
    use crate::persistence::{CareerStore, CompoundCareerStore, UserCareerRecord};
    use crate::sync::server::Outbound;

    #[test]
    fn only_unassigned_users_are_prompted() {
        let mut store = CompoundCareerStore::new();
        let mut record = UserCareerRecord::default();
        record.assign("mage");
        store.save(UserId(2), &record).unwrap();

        let mut world = World::new();
        world.insert_resource(HostClock { tick: 40 });
        world.insert_resource(ConnectedUsers([UserId(1), UserId(2)].into_iter().collect()));
        world.insert_resource(CareerStores::new(store));
        world.insert_resource(PromptScheduler::new(20));
        world.insert_resource(Outbox::default());

        let mut schedule = Schedule::default();
        schedule.add_systems(prompt_system);
        schedule.run(&mut world);
        schedule.run(&mut world);

        let sent = world.resource_mut::<Outbox>().drain();
        assert_eq!(sent.len(), 1);
        let Outbound::Notice { user, notice } = &sent[0] else {
            panic!("expected notice, got {:?}", sent[0]);
        };
        assert_eq!(*user, UserId(1));
        assert_eq!(notice.shortcut.as_deref(), Some(PROMPT_COMMAND));
        assert!(!world.resource::<PromptScheduler>().is_tracking(UserId(2)));
    }
}
