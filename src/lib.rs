// Re-export core modules for use by the binary or other consumers
pub mod career;
pub mod command;
pub mod core;
pub mod data;
pub mod persistence;
pub mod sync;
pub mod systems;

// Expose the server facade and types the host needs to drive it
pub use crate::career::host::{CareerHost, Notice};
pub use crate::command::CommandOutcome;
pub use crate::core::config::CareerConfig;
pub use crate::core::ident::{NamespacedId, UserId};
pub use crate::core::world::CareerServer;
pub use crate::persistence::{CareerStores, CompoundCareerStore, SqliteCareerStore};
pub use crate::sync::server::Outbound;
