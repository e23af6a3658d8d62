use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use bevy_ecs::prelude::*;
use bevy_utils::tracing::{debug, error, warn};
use bytes::Bytes;

use crate::career::catalog::CareerCatalog;
use crate::career::host::{CareerHost, Notice};
use crate::career::service::CareerAssignmentService;
use crate::core::ident::UserId;
use crate::persistence::CareerStore;
use crate::sync::messages::{CareerMessage, CareerSnapshot};
use crate::sync::wire::ProtoError;

pub const PICKER_LOCKED_NOTICE: &str = "Career already chosen; the picker is locked.";

/// Client request that passed decoding and bounds checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientRequest {
    RequestSnapshot,
    SubmitChoice { career_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub user: UserId,
    pub request: ClientRequest,
}

/// Messages produced on the update stream, drained by the host's network layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Packet { user: UserId, payload: Bytes },
    Notice { user: UserId, notice: Notice },
}

/// Requests waiting for the next tick. Shared with network threads via [`InboundHandle`].
#[derive(Resource, Debug, Default, Clone)]
pub struct CareerInbox {
    queue: Arc<Mutex<VecDeque<Inbound>>>,
}

/// Cloneable sender for network receipt threads.
#[derive(Debug, Clone)]
pub struct InboundHandle {
    queue: Arc<Mutex<VecDeque<Inbound>>>,
}

impl CareerInbox {
    pub fn handle(&self) -> InboundHandle {
        InboundHandle {
            queue: self.queue.clone(),
        }
    }

    pub fn drain(&self) -> Vec<Inbound> {
        match self.queue.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(poisoned) => poisoned.into_inner().drain(..).collect(),
        }
    }
}

impl InboundHandle {
    /// Decode a frame from `user` and queue it for the update stream.
    pub fn receive(&self, user: UserId, frame: Bytes) -> Result<(), ProtoError> {
        let request = match CareerMessage::decode(frame)? {
            CareerMessage::RequestSnapshot => ClientRequest::RequestSnapshot,
            CareerMessage::SubmitChoice { career_id } => ClientRequest::SubmitChoice { career_id },
            CareerMessage::Snapshot(_) => {
                return Err(ProtoError::Malformed("snapshot is server-to-client only"))
            }
        };
        self.push(Inbound { user, request });
        Ok(())
    }

    pub fn push(&self, inbound: Inbound) {
        match self.queue.lock() {
            Ok(mut queue) => queue.push_back(inbound),
            Err(poisoned) => poisoned.into_inner().push_back(inbound),
        }
    }
}

#[derive(Resource, Debug, Default)]
pub struct Outbox(pub Vec<Outbound>);

impl Outbox {
    pub fn notice(&mut self, user: UserId, notice: Notice) {
        self.0.push(Outbound::Notice { user, notice });
    }

    pub fn send(&mut self, user: UserId, message: &CareerMessage) {
        match message.encode() {
            Ok(payload) => self.0.push(Outbound::Packet { user, payload }),
            Err(err) => error!("cannot encode career message for {}: {}", user, err),
        }
    }

    /// Push a fresh snapshot of the catalog and `user`'s assignment.
    pub fn send_snapshot(&mut self, user: UserId, catalog: &CareerCatalog, store: &dyn CareerStore) {
        match store.record(user) {
            Ok(record) => {
                let snapshot = CareerSnapshot::build(catalog, &record);
                self.send(user, &CareerMessage::Snapshot(snapshot));
            }
            Err(err) => error!("cannot read career record for {}: {}", user, err),
        }
    }

    pub fn drain(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.0)
    }
}

/// Whether `user` may open the picker: choices unlocked, or nothing chosen yet.
pub fn picker_available(user: UserId, catalog: &CareerCatalog, store: &dyn CareerStore) -> bool {
    if !catalog.lock_after_choice() {
        return true;
    }
    match store.record(user) {
        Ok(record) => record.assigned().is_none(),
        Err(err) => {
            error!("cannot read career record for {}: {}", user, err);
            false
        }
    }
}

/// Handle one queued request. Runs on the update stream only.
pub fn handle_request(
    inbound: Inbound,
    service: &CareerAssignmentService,
    catalog: &CareerCatalog,
    store: &mut dyn CareerStore,
    host: &mut CareerHost,
    outbox: &mut Outbox,
) {
    let user = inbound.user;
    match inbound.request {
        ClientRequest::RequestSnapshot => {
            if picker_available(user, catalog, store) {
                outbox.send_snapshot(user, catalog, store);
            } else {
                outbox.notice(user, Notice::plain(PICKER_LOCKED_NOTICE));
            }
        }
        ClientRequest::SubmitChoice { career_id } => {
            match service.choose(user, &career_id, catalog, store, host) {
                Ok(_) => outbox.send_snapshot(user, catalog, store),
                Err(rejected) => debug!("{} choice of {} rejected: {:?}", user, career_id, rejected),
            }
        }
    }
}

/// Decode failures are the sender's problem; log and move on.
pub fn receive_or_log(handle: &InboundHandle, user: UserId, frame: Bytes) {
    if let Err(err) = handle.receive(user, frame) {
        warn!("dropping career message from {}: {}", user, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::career::service::tests::{fake_host, sample_catalog};
    use crate::persistence::CompoundCareerStore;

    fn snapshot_in(outbound: &Outbound) -> CareerSnapshot {
        let Outbound::Packet { payload, .. } = outbound else {
            panic!("expected packet, got {:?}", outbound);
        };
        match CareerMessage::decode(payload.clone()).unwrap() {
            CareerMessage::Snapshot(snapshot) => snapshot,
            other => panic!("expected snapshot, got {:?}", other),
        }
    }

    fn request(user: UserId, request: ClientRequest) -> Inbound {
        Inbound { user, request }
    }

    #[test]
    fn receive_decodes_and_queues_client_messages() {
        let inbox = CareerInbox::default();
        let handle = inbox.handle();
        let frame = CareerMessage::SubmitChoice {
            career_id: "mage".to_string(),
        }
        .encode()
        .unwrap();

        handle.receive(UserId(1), frame).unwrap();
        receive_or_log(&handle, UserId(1), Bytes::from_static(&[0x42]));

        assert_eq!(
            inbox.drain(),
            [request(
                UserId(1),
                ClientRequest::SubmitChoice {
                    career_id: "mage".to_string()
                }
            )]
        );
        assert!(inbox.drain().is_empty());
    }

    #[test]
    fn snapshots_from_clients_are_refused() {
        let inbox = CareerInbox::default();
        let frame = CareerMessage::Snapshot(CareerSnapshot::default())
            .encode()
            .unwrap();
        assert!(inbox.handle().receive(UserId(1), frame).is_err());
        assert!(inbox.drain().is_empty());
    }

    #[test]
    fn request_snapshot_respects_lock() {
        let catalog = sample_catalog(true);
        let mut store = CompoundCareerStore::new();
        let (mut host, _log) = fake_host(64, true);
        let service = CareerAssignmentService::new();
        let mut outbox = Outbox::default();
        let user = UserId(3);

        handle_request(
            request(user, ClientRequest::RequestSnapshot),
            &service,
            &catalog,
            &mut store,
            &mut host,
            &mut outbox,
        );
        let sent = outbox.drain();
        assert_eq!(sent.len(), 1);
        let snapshot = snapshot_in(&sent[0]);
        assert_eq!(snapshot.careers.len(), 2);
        assert_eq!(snapshot.selected_id, None);

        service
            .choose(user, "mage", &catalog, &mut store, &mut host)
            .unwrap();
        handle_request(
            request(user, ClientRequest::RequestSnapshot),
            &service,
            &catalog,
            &mut store,
            &mut host,
            &mut outbox,
        );
        assert_eq!(
            outbox.drain(),
            [Outbound::Notice {
                user,
                notice: Notice::plain(PICKER_LOCKED_NOTICE)
            }]
        );
    }

    #[test]
    fn successful_choice_pushes_authoritative_snapshot() {
        let catalog = sample_catalog(true);
        let mut store = CompoundCareerStore::new();
        let (mut host, _log) = fake_host(64, true);
        let service = CareerAssignmentService::new();
        let mut outbox = Outbox::default();
        let user = UserId(4);

        handle_request(
            request(
                user,
                ClientRequest::SubmitChoice {
                    career_id: "warrior".to_string(),
                },
            ),
            &service,
            &catalog,
            &mut store,
            &mut host,
            &mut outbox,
        );
        let sent = outbox.drain();
        assert_eq!(snapshot_in(&sent[0]).selected_id.as_deref(), Some("warrior"));

        handle_request(
            request(
                user,
                ClientRequest::SubmitChoice {
                    career_id: "mage".to_string(),
                },
            ),
            &service,
            &catalog,
            &mut store,
            &mut host,
            &mut outbox,
        );
        assert!(outbox.drain().is_empty());
    }

    #[test]
    fn unlocked_catalog_always_serves_picker() {
        let catalog = sample_catalog(false);
        let mut store = CompoundCareerStore::new();
        let (mut host, _log) = fake_host(64, true);
        let service = CareerAssignmentService::new();
        service
            .choose(UserId(5), "mage", &catalog, &mut store, &mut host)
            .unwrap();
        assert!(picker_available(UserId(5), &catalog, &store));
    }
}
