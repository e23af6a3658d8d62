pub mod host_events;
pub mod inbox;
pub mod prompt;

use bevy_ecs::prelude::*;

/// Host logical time, one unit per update-stream tick.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HostClock {
    pub tick: u64,
}

impl HostClock {
    pub fn advance(&mut self) {
        self.tick += 1;
    }
}

/// System: Advances the host clock.
pub fn advance_clock_system(mut clock: ResMut<HostClock>) {
    clock.advance();
}
