//! Field encodings shared by every career message.
//!
//! - strings: VarInt byte length + UTF-8, length bounded in characters on decode
//! - VarInt: 7-bit groups, little-endian, continuation bit 0x80, at most 5 bytes
//! - doubles: 8 bytes, big-endian IEEE-754
//! - identifiers: `namespace:path` as a bounded string

use bytes::{Buf, BufMut};

use crate::core::ident::NamespacedId;

pub const MAX_ID_LEN: usize = 64;
pub const MAX_NAME_LEN: usize = 64;
pub const MAX_DESCRIPTION_LEN: usize = 256;
pub const MAX_IDENT_LEN: usize = 32767;

const MAX_VAR_INT_BYTES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtoError {
    TooShort { need: usize, got: usize },
    UnknownType(u8),
    TooLong { max: usize, got: usize },
    Malformed(&'static str),
}

impl std::fmt::Display for ProtoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtoError::TooShort { need, got } => {
                write!(f, "message too short: need {need}, got {got}")
            }
            ProtoError::UnknownType(t) => write!(f, "unknown message type: 0x{t:02x}"),
            ProtoError::TooLong { max, got } => {
                write!(f, "field too long: max {max}, got {got}")
            }
            ProtoError::Malformed(s) => write!(f, "malformed message: {s}"),
        }
    }
}

impl std::error::Error for ProtoError {}

fn need(buf: &impl Buf, len: usize) -> Result<(), ProtoError> {
    if buf.remaining() < len {
        return Err(ProtoError::TooShort {
            need: len,
            got: buf.remaining(),
        });
    }
    Ok(())
}

pub fn put_var_int(buf: &mut impl BufMut, value: i32) {
    let mut v = value as u32;
    loop {
        if v & !0x7F == 0 {
            buf.put_u8(v as u8);
            return;
        }
        buf.put_u8((v & 0x7F) as u8 | 0x80);
        v >>= 7;
    }
}

pub fn get_var_int(buf: &mut impl Buf) -> Result<i32, ProtoError> {
    let mut value = 0u32;
    for group in 0..MAX_VAR_INT_BYTES {
        need(&*buf, 1)?;
        let b = buf.get_u8();
        value |= ((b & 0x7F) as u32) << (7 * group);
        if b & 0x80 == 0 {
            return Ok(value as i32);
        }
    }
    Err(ProtoError::Malformed("varint longer than 5 bytes"))
}

/// Non-negative VarInt, used for counts and lengths.
pub fn put_count(buf: &mut impl BufMut, count: usize) -> Result<(), ProtoError> {
    let count = i32::try_from(count).map_err(|_| ProtoError::TooLong {
        max: i32::MAX as usize,
        got: count,
    })?;
    put_var_int(buf, count);
    Ok(())
}

pub fn get_count(buf: &mut impl Buf) -> Result<usize, ProtoError> {
    let count = get_var_int(buf)?;
    usize::try_from(count).map_err(|_| ProtoError::Malformed("negative count"))
}

pub fn put_utf(buf: &mut impl BufMut, value: &str, max_chars: usize) -> Result<(), ProtoError> {
    let chars = value.chars().count();
    if chars > max_chars {
        return Err(ProtoError::TooLong {
            max: max_chars,
            got: chars,
        });
    }
    put_count(buf, value.len())?;
    buf.put_slice(value.as_bytes());
    Ok(())
}

pub fn get_utf(buf: &mut impl Buf, max_chars: usize) -> Result<String, ProtoError> {
    let len = get_count(buf)?;
    // A char is at most 4 bytes; anything longer cannot fit the bound.
    if len > max_chars * 4 {
        return Err(ProtoError::TooLong {
            max: max_chars * 4,
            got: len,
        });
    }
    need(&*buf, len)?;
    let mut raw = vec![0u8; len];
    buf.copy_to_slice(&mut raw);
    let value = String::from_utf8(raw).map_err(|_| ProtoError::Malformed("invalid utf-8"))?;
    let chars = value.chars().count();
    if chars > max_chars {
        return Err(ProtoError::TooLong {
            max: max_chars,
            got: chars,
        });
    }
    Ok(value)
}

pub fn put_bool(buf: &mut impl BufMut, value: bool) {
    buf.put_u8(if value { 1 } else { 0 });
}

pub fn get_bool(buf: &mut impl Buf) -> Result<bool, ProtoError> {
    need(&*buf, 1)?;
    match buf.get_u8() {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(ProtoError::Malformed("boolean out of range")),
    }
}

pub fn put_f64(buf: &mut impl BufMut, value: f64) {
    buf.put_f64(value);
}

pub fn get_f64(buf: &mut impl Buf) -> Result<f64, ProtoError> {
    need(&*buf, 8)?;
    Ok(buf.get_f64())
}

pub fn put_ident(buf: &mut impl BufMut, id: &NamespacedId) -> Result<(), ProtoError> {
    put_utf(buf, &id.to_string(), MAX_IDENT_LEN)
}

pub fn get_ident(buf: &mut impl Buf) -> Result<NamespacedId, ProtoError> {
    let raw = get_utf(buf, MAX_IDENT_LEN)?;
    NamespacedId::try_parse(&raw).ok_or(ProtoError::Malformed("invalid identifier"))
}

/// Cut `value` down to `max_chars` characters without splitting a code point.
pub fn clamp_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((end, _)) => value[..end].to_string(),
        None => value.to_string(),
    }
}
