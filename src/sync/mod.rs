//! Client/server picker protocol: wire codec, messages, the server dispatcher and the
//! client-side picker model.

pub mod client;
pub mod messages;
pub mod server;
pub mod wire;

pub use client::CareerPicker;
pub use messages::{CareerMessage, CareerSnapshot, CareerSummary};
pub use server::{CareerInbox, InboundHandle, Outbound, Outbox};
pub use wire::ProtoError;
