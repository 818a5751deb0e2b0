use std::fmt;

const STANDARD_SLOT_NAMES: [&str; 12] = [
    "1a", "2a", "3a", "4a", "5a", "6a", "1b", "2b", "3b", "4b", "5b", "6b",
];

pub const RSA_SLOTS: std::ops::RangeInclusive<u8> = 25..=28;
pub const ECC_SLOTS: std::ops::RangeInclusive<u8> = 29..=60;

/// Key-label replies the firmware sends for RSA 1-4 and ECC 1-29.
const KEY_LABEL_SLOTS: std::ops::RangeInclusive<u8> = 25..=57;

/// Subtracted from label replies numbered 16 or above.
const SECOND_ROW_OFFSET: u8 = 6;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SlotError {
    #[error("Unknown slot number: {0}")]
    UnknownSlot(u8),
}

pub fn slot_name(number: u8) -> Result<String, SlotError> {
    match number {
        1..=12 => Ok(STANDARD_SLOT_NAMES[usize::from(number - 1)].to_string()),
        n if RSA_SLOTS.contains(&n) => Ok(format!("RSA Key {}", n - RSA_SLOTS.start() + 1)),
        n if ECC_SLOTS.contains(&n) => Ok(format!("ECC Key {}", n - ECC_SLOTS.start() + 1)),
        n => Err(SlotError::UnknownSlot(n)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub number: u8,
    pub name: String,
    pub label: String,
}

impl Slot {
    pub fn new(number: u8, label: impl Into<String>) -> Result<Self, SlotError> {
        Ok(Self {
            number,
            name: slot_name(number)?,
            label: label.into(),
        })
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.label.is_empty() {
            write!(f, "Slot {}: <empty>", self.name)
        } else {
            write!(f, "Slot {}: {}", self.name, self.label)
        }
    }
}

/// Text content of a device reply: bytes up to the first NUL.
pub fn report_text(report: &[u8]) -> String {
    let end = report.iter().position(|b| *b == 0).unwrap_or(report.len());
    String::from_utf8_lossy(&report[..end]).into_owned()
}

/// Split a `<slot byte>|<label>` reply.
pub fn parse_label_reply(report: &[u8]) -> Option<(u8, String)> {
    let sep = report.iter().position(|b| *b == b'|')?;
    let number = *report.first().filter(|_| sep > 0)?;
    Some((number, report_text(&report[sep + 1..])))
}

/// Slots 1..=12 from `GetLabels` replies.
pub fn parse_labels<'a>(replies: impl IntoIterator<Item = &'a [u8]>) -> Vec<Slot> {
    replies
        .into_iter()
        .filter_map(parse_label_reply)
        .filter_map(|(number, label)| {
            let number = if number >= 16 {
                number - SECOND_ROW_OFFSET
            } else {
                number
            };
            if (1..=12).contains(&number) {
                Slot::new(number, label).ok()
            } else {
                tracing::debug!(number, "ignoring label reply");
                None
            }
        })
        .collect()
}

/// RSA/ECC key slots from `GetLabels` key-label replies.
pub fn parse_key_labels<'a>(replies: impl IntoIterator<Item = &'a [u8]>) -> Vec<Slot> {
    replies
        .into_iter()
        .filter_map(parse_label_reply)
        .filter(|(number, _)| KEY_LABEL_SLOTS.contains(number))
        .filter_map(|(number, label)| Slot::new(number, label).ok())
        .collect()
}
