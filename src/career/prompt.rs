use std::collections::HashMap;

use bevy_ecs::prelude::*;

use crate::career::host::Notice;
use crate::core::ident::UserId;

/// 60 seconds at 20 ticks per second.
pub const DEFAULT_PROMPT_INTERVAL_TICKS: u64 = 1200;
pub const PROMPT_TEXT: &str = "You have not chosen a career yet. Click [Choose career] to open the picker.";
pub const PROMPT_COMMAND: &str = "/career";

/// Periodic reminder for users without a career.
///
/// Entries are only removed once a user is assigned; disconnected users keep theirs.
#[derive(Resource, Debug, Clone)]
pub struct PromptScheduler {
    interval: u64,
    last_prompt: HashMap<UserId, u64>,
}

impl Default for PromptScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_PROMPT_INTERVAL_TICKS)
    }
}

impl PromptScheduler {
    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
            last_prompt: HashMap::new(),
        }
    }

    /// Called once per tick per connected user.
    pub fn on_tick(&mut self, user: UserId, assigned: bool, now: u64) -> Option<Notice> {
        if assigned {
            self.last_prompt.remove(&user);
            return None;
        }
        let last = self.last_prompt.get(&user).copied().unwrap_or(0);
        if now.saturating_sub(last) < self.interval {
            return None;
        }
        self.last_prompt.insert(user, now);
        Some(Notice::with_shortcut(PROMPT_TEXT, PROMPT_COMMAND))
    }

    pub fn is_tracking(&self, user: UserId) -> bool {
        self.last_prompt.contains_key(&user)
    }

    pub fn tracked(&self) -> usize {
        self.last_prompt.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_once_per_interval() {
        let mut scheduler = PromptScheduler::new(1200);
        let user = UserId(1);

        assert!(scheduler.on_tick(user, false, 10).is_none());
        assert!(scheduler.on_tick(user, false, 1199).is_none());
        let notice = scheduler.on_tick(user, false, 1200).unwrap();
        assert_eq!(notice.shortcut.as_deref(), Some(PROMPT_COMMAND));
        assert!(scheduler.on_tick(user, false, 1201).is_none());
        assert!(scheduler.on_tick(user, false, 2399).is_none());
        assert!(scheduler.on_tick(user, false, 2400).is_some());
    }

    #[test]
    fn assignment_stops_tracking() {
        let mut scheduler = PromptScheduler::new(20);
        let user = UserId(2);
        assert!(scheduler.on_tick(user, false, 40).is_some());
        assert!(scheduler.is_tracking(user));

        assert!(scheduler.on_tick(user, true, 100).is_none());
        assert!(!scheduler.is_tracking(user));
        assert_eq!(scheduler.tracked(), 0);
    }

    #[test]
    fn users_are_tracked_independently() {
        let mut scheduler = PromptScheduler::new(20);
        assert!(scheduler.on_tick(UserId(1), false, 20).is_some());
        assert!(scheduler.on_tick(UserId(2), false, 25).is_some());
        assert!(scheduler.on_tick(UserId(1), false, 30).is_none());
        assert!(scheduler.on_tick(UserId(1), false, 40).is_some());
        assert_eq!(scheduler.tracked(), 2);
    }
}
