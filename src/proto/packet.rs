use std::str::FromStr;

use super::{ProtoError, types::*};
use crate::hid::ReportLayout;

/// One outbound HID report. Always exactly `layout.size()` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report(Vec<u8>);

impl Report {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for Report {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Value carried by a slot write or simple command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Payload {
    #[default]
    None,
    Bytes(Vec<u8>),
    Text(String),
    Byte(u8),
}

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::None => &[],
            Payload::Bytes(b) => b,
            Payload::Text(s) => s.as_bytes(),
            Payload::Byte(b) => std::slice::from_ref(b),
        }
    }
}

impl From<Vec<u8>> for Payload {
    fn from(b: Vec<u8>) -> Self {
        Payload::Bytes(b)
    }
}

impl From<&[u8]> for Payload {
    fn from(b: &[u8]) -> Self {
        Payload::Bytes(b.to_vec())
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<u8> for Payload {
    fn from(b: u8) -> Self {
        Payload::Byte(b)
    }
}

/// Parses `hex:<digits>`, `text:<utf8>`, `byte:<0-255>` or `none`.
impl FromStr for Payload {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "none" {
            return Ok(Payload::None);
        }
        let (kind, value) = s.split_once(':').ok_or_else(|| {
            ProtoError::InvalidPayloadType(format!("'{s}' has no hex:/text:/byte: prefix"))
        })?;
        match kind {
            "hex" => hex::decode(value)
                .map(Payload::Bytes)
                .map_err(|e| ProtoError::InvalidPayloadType(format!("bad hex: {e}"))),
            "text" => Ok(Payload::Text(value.to_string())),
            "byte" => value
                .parse::<u8>()
                .map(Payload::Byte)
                .map_err(|e| ProtoError::InvalidPayloadType(format!("bad byte '{value}': {e}"))),
            other => Err(ProtoError::InvalidPayloadType(format!(
                "unsupported payload kind '{other}'"
            ))),
        }
    }
}

/// Build one report: header, then each present tag byte, then payload,
/// zero-padded to the layout's report size.
pub fn encode(
    layout: ReportLayout,
    message: Option<Message>,
    slot_id: Option<u8>,
    field: Option<MessageField>,
    payload: &[u8],
) -> Result<Report, ProtoError> {
    let size = layout.size();
    let mut raw = Vec::with_capacity(size);
    raw.extend_from_slice(layout.header());
    if let Some(m) = message {
        raw.push(m.code());
    }
    if let Some(s) = slot_id {
        raw.push(s);
    }
    if let Some(f) = field {
        raw.push(f.code());
    }
    if raw.len() + payload.len() > size {
        return Err(ProtoError::PayloadTooLarge {
            len: payload.len(),
            capacity: size - raw.len(),
        });
    }
    raw.extend_from_slice(payload);
    raw.resize(size, 0);

    tracing::trace!(
        msg = ?message,
        slot_id = ?slot_id,
        field = ?field,
        len = payload.len(),
        "encoded report"
    );
    Ok(Report(raw))
}
