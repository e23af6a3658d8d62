use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::career::catalog::{AttributeBonus, CareerCatalog, CareerDefinition, StartingResource};
use crate::core::ident::NamespacedId;
use crate::persistence::UserCareerRecord;
use crate::sync::wire::{
    clamp_chars, get_bool, get_count, get_f64, get_ident, get_utf, put_bool, put_count, put_f64,
    put_ident, put_utf, ProtoError, MAX_DESCRIPTION_LEN, MAX_ID_LEN, MAX_NAME_LEN,
};

pub const MSG_REQUEST_SNAPSHOT: u8 = 0x00;
pub const MSG_SUBMIT_CHOICE: u8 = 0x01;
pub const MSG_SNAPSHOT: u8 = 0x02;

/// Everything that travels over the career channel.
///
/// Encoding: one type byte, then the type-specific payload.
/// - `RequestSnapshot` (client → server): no payload
/// - `SubmitChoice` (client → server): career id, string ≤ 64
/// - `Snapshot` (server → client): see [`CareerSnapshot`]
#[derive(Debug, Clone, PartialEq)]
pub enum CareerMessage {
    RequestSnapshot,
    SubmitChoice { career_id: String },
    Snapshot(CareerSnapshot),
}

/// Picker line for one career, as the client sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct CareerSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: NamespacedId,
    pub attributes: Vec<AttributeBonus>,
    pub resources: Vec<StartingResource>,
}

/// Full picker dataset plus the receiving user's assignment.
///
/// Encoding:
/// - careers: VarInt count, then per career
///   - id (≤ 64), name (≤ 64), description (≤ 256), icon identifier
///   - attributes: VarInt count, then identifier + f64 each
///   - resources: VarInt count, then identifier + VarInt count each
/// - selected: bool presence flag, then id (≤ 64) when present
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CareerSnapshot {
    pub careers: Vec<CareerSummary>,
    pub selected_id: Option<String>,
}

impl CareerSummary {
    /// Text fields are clamped to the wire bounds so the client can always decode them.
    pub fn from_definition(def: &CareerDefinition) -> Self {
        Self {
            id: clamp_chars(&def.id, MAX_ID_LEN),
            name: clamp_chars(&def.name, MAX_NAME_LEN),
            description: clamp_chars(&def.description, MAX_DESCRIPTION_LEN),
            icon: def.icon.clone(),
            attributes: def.attributes.clone(),
            resources: def.starting_resources.clone(),
        }
    }

    fn encode(&self, buf: &mut BytesMut) -> Result<(), ProtoError> {
        put_utf(buf, &self.id, MAX_ID_LEN)?;
        put_utf(buf, &self.name, MAX_NAME_LEN)?;
        put_utf(buf, &self.description, MAX_DESCRIPTION_LEN)?;
        put_ident(buf, &self.icon)?;
        put_count(buf, self.attributes.len())?;
        for bonus in &self.attributes {
            put_ident(buf, &bonus.attribute_id)?;
            put_f64(buf, bonus.value);
        }
        put_count(buf, self.resources.len())?;
        for resource in &self.resources {
            put_ident(buf, &resource.resource_id)?;
            put_count(buf, resource.count as usize)?;
        }
        Ok(())
    }

    fn decode(buf: &mut Bytes) -> Result<Self, ProtoError> {
        let id = get_utf(buf, MAX_ID_LEN)?;
        let name = get_utf(buf, MAX_NAME_LEN)?;
        let description = get_utf(buf, MAX_DESCRIPTION_LEN)?;
        let icon = get_ident(buf)?;

        let attribute_count = get_count(buf)?;
        let mut attributes = Vec::with_capacity(attribute_count.min(buf.remaining()));
        for _ in 0..attribute_count {
            attributes.push(AttributeBonus {
                attribute_id: get_ident(buf)?,
                value: get_f64(buf)?,
            });
        }

        let resource_count = get_count(buf)?;
        let mut resources = Vec::with_capacity(resource_count.min(buf.remaining()));
        for _ in 0..resource_count {
            let resource_id = get_ident(buf)?;
            let count = get_count(buf)?;
            resources.push(StartingResource {
                resource_id,
                count: count as u32,
            });
        }

        Ok(Self {
            id,
            name,
            description,
            icon,
            attributes,
            resources,
        })
    }
}

impl CareerSnapshot {
    /// Build the snapshot a user's picker should show, in catalog order.
    pub fn build(catalog: &CareerCatalog, record: &UserCareerRecord) -> Self {
        Self {
            careers: catalog
                .careers()
                .iter()
                .map(CareerSummary::from_definition)
                .collect(),
            selected_id: record.assigned().map(|id| clamp_chars(id, MAX_ID_LEN)),
        }
    }

    fn encode(&self, buf: &mut BytesMut) -> Result<(), ProtoError> {
        put_count(buf, self.careers.len())?;
        for career in &self.careers {
            career.encode(buf)?;
        }
        put_bool(buf, self.selected_id.is_some());
        if let Some(selected) = &self.selected_id {
            put_utf(buf, selected, MAX_ID_LEN)?;
        }
        Ok(())
    }

    fn decode(buf: &mut Bytes) -> Result<Self, ProtoError> {
        let count = get_count(buf)?;
        let mut careers = Vec::with_capacity(count.min(buf.remaining()));
        for _ in 0..count {
            careers.push(CareerSummary::decode(buf)?);
        }
        let selected_id = if get_bool(buf)? {
            Some(get_utf(buf, MAX_ID_LEN)?)
        } else {
            None
        };
        Ok(Self {
            careers,
            selected_id,
        })
    }
}

impl CareerMessage {
    pub fn encode(&self) -> Result<Bytes, ProtoError> {
        let mut buf = BytesMut::new();
        match self {
            CareerMessage::RequestSnapshot => buf.put_u8(MSG_REQUEST_SNAPSHOT),
            CareerMessage::SubmitChoice { career_id } => {
                buf.put_u8(MSG_SUBMIT_CHOICE);
                put_utf(&mut buf, career_id, MAX_ID_LEN)?;
            }
            CareerMessage::Snapshot(snapshot) => {
                buf.put_u8(MSG_SNAPSHOT);
                snapshot.encode(&mut buf)?;
            }
        }
        Ok(buf.freeze())
    }

    pub fn decode(mut p: Bytes) -> Result<Self, ProtoError> {
        if p.is_empty() {
            return Err(ProtoError::TooShort { need: 1, got: 0 });
        }
        let t = p.get_u8();
        let message = match t {
            MSG_REQUEST_SNAPSHOT => CareerMessage::RequestSnapshot,
            MSG_SUBMIT_CHOICE => CareerMessage::SubmitChoice {
                career_id: get_utf(&mut p, MAX_ID_LEN)?,
            },
            MSG_SNAPSHOT => CareerMessage::Snapshot(CareerSnapshot::decode(&mut p)?),
            _ => return Err(ProtoError::UnknownType(t)),
        };
        if p.has_remaining() {
            return Err(ProtoError::Malformed("trailing bytes after message"));
        }
        Ok(message)
    }
}
