//! The `career` operator command: opens the picker unless the user's choice is locked.

use crate::career::catalog::CareerCatalog;
use crate::career::host::Notice;
use crate::core::ident::UserId;
use crate::persistence::CareerStore;
use crate::sync::server::{picker_available, Outbox, PICKER_LOCKED_NOTICE};

pub const COMMAND_NAME: &str = "career";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Locked,
    SnapshotSent,
}

pub fn run_career_command(
    user: UserId,
    catalog: &CareerCatalog,
    store: &dyn CareerStore,
    outbox: &mut Outbox,
) -> CommandOutcome {
    if !picker_available(user, catalog, store) {
        outbox.notice(user, Notice::plain(PICKER_LOCKED_NOTICE));
        return CommandOutcome::Locked;
    }
    outbox.send_snapshot(user, catalog, store);
    CommandOutcome::SnapshotSent
}

/// Match a raw command line such as `/career` or `career`.
pub fn is_career_command(line: &str) -> bool {
    line.trim().trim_start_matches('/') == COMMAND_NAME
}
