use bytes::Bytes;

use crate::core::ident::NamespacedId;
use crate::sync::messages::{CareerMessage, CareerSnapshot, CareerSummary};
use crate::sync::wire::ProtoError;

/// Client-side picker state. Every snapshot replaces the whole dataset.
#[derive(Debug, Clone, Default)]
pub struct CareerPicker {
    snapshot: CareerSnapshot,
    cursor: usize,
    awaiting_reply: bool,
}

impl CareerPicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a frame from the server. Returns `true` when the picker changed.
    pub fn receive(&mut self, frame: Bytes) -> Result<bool, ProtoError> {
        match CareerMessage::decode(frame)? {
            CareerMessage::Snapshot(snapshot) => {
                self.replace(snapshot);
                Ok(true)
            }
            _ => Err(ProtoError::Malformed("client-to-server message sent to client")),
        }
    }

    pub fn replace(&mut self, snapshot: CareerSnapshot) {
        self.cursor = snapshot
            .selected_id
            .as_deref()
            .and_then(|selected| snapshot.careers.iter().position(|c| c.id == selected))
            .unwrap_or(0);
        self.snapshot = snapshot;
        self.awaiting_reply = false;
    }

    pub fn careers(&self) -> &[CareerSummary] {
        &self.snapshot.careers
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.snapshot.selected_id.as_deref()
    }

    pub fn current(&self) -> Option<&CareerSummary> {
        self.snapshot.careers.get(self.cursor)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn next(&mut self) {
        let len = self.snapshot.careers.len();
        if len > 0 {
            self.cursor = (self.cursor + 1) % len;
        }
    }

    pub fn previous(&mut self) {
        let len = self.snapshot.careers.len();
        if len > 0 {
            self.cursor = (self.cursor + len - 1) % len;
        }
    }

    pub fn can_navigate(&self) -> bool {
        self.snapshot.careers.len() > 1
    }

    pub fn can_submit(&self) -> bool {
        if self.awaiting_reply {
            return false;
        }
        match self.current() {
            Some(current) => self.selected_id() != Some(current.id.as_str()),
            None => false,
        }
    }

    /// Encode a choice of the highlighted career. Disabled until the next snapshot arrives.
    pub fn submit(&mut self) -> Option<Result<Bytes, ProtoError>> {
        if !self.can_submit() {
            return None;
        }
        let career_id = self.current()?.id.clone();
        self.awaiting_reply = true;
        Some(CareerMessage::SubmitChoice { career_id }.encode())
    }
}

/// Translation key for an attribute line in the picker.
pub fn attribute_label_key(attribute: &NamespacedId) -> String {
    let path = attribute.path().replace('/', ".");
    if attribute.is_default_namespace() {
        format!("attribute.name.{}", path)
    } else {
        format!("attribute.name.{}.{}", attribute.namespace(), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str) -> CareerSummary {
        CareerSummary {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            icon: NamespacedId::try_parse("book").unwrap(),
            attributes: Vec::new(),
            resources: Vec::new(),
        }
    }

    fn snapshot(ids: &[&str], selected: Option<&str>) -> CareerSnapshot {
        CareerSnapshot {
            careers: ids.iter().map(|id| summary(id)).collect(),
            selected_id: selected.map(str::to_string),
        }
    }

    #[test]
    fn cursor_starts_on_assigned_career_and_wraps() {
        let mut picker = CareerPicker::new();
        picker.replace(snapshot(&["warrior", "mage", "scout"], Some("scout")));
        assert_eq!(picker.cursor(), 2);
        assert!(!picker.can_submit());

        picker.next();
        assert_eq!(picker.current().unwrap().id, "warrior");
        picker.previous();
        picker.previous();
        assert_eq!(picker.current().unwrap().id, "mage");
        assert!(picker.can_submit());
    }

    #[test]
    fn snapshot_fully_replaces_dataset() {
        let mut picker = CareerPicker::new();
        picker.replace(snapshot(&["warrior", "mage", "scout"], None));
        picker.next();
        picker.next();

        let frame = CareerMessage::Snapshot(snapshot(&["mage"], Some("mage")))
            .encode()
            .unwrap();
        assert!(picker.receive(frame).unwrap());

        assert_eq!(picker.careers().len(), 1);
        assert_eq!(picker.cursor(), 0);
        assert_eq!(picker.selected_id(), Some("mage"));
        assert!(!picker.can_navigate());
    }

    #[test]
    fn submit_waits_for_authoritative_reply() {
        let mut picker = CareerPicker::new();
        picker.replace(snapshot(&["warrior", "mage"], None));

        let frame = picker.submit().unwrap().unwrap();
        assert_eq!(
            CareerMessage::decode(frame).unwrap(),
            CareerMessage::SubmitChoice {
                career_id: "warrior".to_string()
            }
        );
        assert!(picker.submit().is_none());

        picker.replace(snapshot(&["warrior", "mage"], Some("warrior")));
        assert!(!picker.can_submit());
        picker.next();
        assert!(picker.can_submit());
    }

    #[test]
    fn empty_picker_cannot_submit() {
        let mut picker = CareerPicker::new();
        picker.next();
        assert!(picker.submit().is_none());
        assert!(picker
            .receive(CareerMessage::RequestSnapshot.encode().unwrap())
            .is_err());
    }

    #[test]
    fn attribute_keys_follow_namespace() {
        let vanilla = NamespacedId::try_parse("generic.max_health").unwrap();
        let modded = NamespacedId::try_parse("forge:reach/entity").unwrap();
        assert_eq!(attribute_label_key(&vanilla), "attribute.name.generic.max_health");
        assert_eq!(attribute_label_key(&modded), "attribute.name.forge.reach.entity");
    }
}
