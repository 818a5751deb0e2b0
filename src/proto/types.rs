use std::fmt;
use std::str::FromStr;

use super::ProtoError;

/// Largest payload that fits a single report next to the header, message
/// tag and one size marker: 64 - 4 - 1 - 1.
pub const MAX_LARGE_PAYLOAD_SIZE: usize = 58;

/// Size marker meaning "more chunks follow".
pub const CONTINUATION_MARKER: u8 = 0xFF;

/// Slot id that asks `GetLabels` for the key-slot labels.
pub const KEY_LABELS_SLOT: u8 = 107;

pub const LABEL_REPLIES: usize = 12;
pub const KEY_LABEL_REPLIES: usize = 33;
pub const WIPE_REPLIES: usize = 8;

/// Large responses (signatures, RSA moduli, plaintexts) arrive as this many
/// 64-byte reports.
pub const RESPONSE_SEGMENTS: usize = 8;
pub const SEGMENT_RETRIES: u32 = 10;

pub const BACKUP_KEY_SLOT: u8 = 132;
/// Ed25519 with the backup flag set.
pub const BACKUP_KEY_TYPE: u8 = 161;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Message {
    SetPin = 0xE1,
    SetSdPin = 0xE2,
    SetPdPin = 0xE3,
    SetTime = 0xE4,
    GetLabels = 0xE5,
    SetSlot = 0xE6,
    WipeSlot = 0xE7,
    SetU2fPriv = 0xE8,
    WipeU2fPriv = 0xE9,
    SetU2fCert = 0xEA,
    WipeU2fCert = 0xEB,
    GetPubKey = 0xEC,
    SignChallenge = 0xED,
    WipePriv = 0xEE,
    SetPriv = 0xEF,
    Decrypt = 0xF0,
    Restore = 0xF1,
}

impl Message {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl From<Message> for u8 {
    fn from(m: Message) -> u8 {
        m.code()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageField {
    Label = 1,
    Username = 2,
    NextKey2 = 3,
    Delay2 = 4,
    Password = 5,
    NextKey3 = 6,
    Delay3 = 7,
    TfaType = 8,
    TotpKey = 9,
    YubiAuth = 10,
    IdleTimeout = 11,
    WipeMode = 12,
    KeyTypeSpeed = 13,
    KeyLayout = 14,
    Url = 15,
    NextKey1 = 16,
    Delay1 = 17,
    NextKey4 = 18,
    NextKey5 = 19,
    BackupMode = 20,
    SshChallengeMode = 21,
    PgpChallengeMode = 22,
    SecProfileMode = 23,
    LedBrightness = 24,
}

const FIELD_NAMES: &[(&str, MessageField)] = &[
    ("label", MessageField::Label),
    ("username", MessageField::Username),
    ("nextkey2", MessageField::NextKey2),
    ("delay2", MessageField::Delay2),
    ("password", MessageField::Password),
    ("nextkey3", MessageField::NextKey3),
    ("delay3", MessageField::Delay3),
    ("tfatype", MessageField::TfaType),
    ("totpkey", MessageField::TotpKey),
    ("yubiauth", MessageField::YubiAuth),
    ("idletimeout", MessageField::IdleTimeout),
    ("wipemode", MessageField::WipeMode),
    ("keytypespeed", MessageField::KeyTypeSpeed),
    ("keylayout", MessageField::KeyLayout),
    ("url", MessageField::Url),
    ("nextkey1", MessageField::NextKey1),
    ("delay1", MessageField::Delay1),
    ("nextkey4", MessageField::NextKey4),
    ("nextkey5", MessageField::NextKey5),
    ("backupmode", MessageField::BackupMode),
    ("sshchallengemode", MessageField::SshChallengeMode),
    ("pgpchallengemode", MessageField::PgpChallengeMode),
    ("secprofilemode", MessageField::SecProfileMode),
    ("ledbrightness", MessageField::LedBrightness),
];

impl MessageField {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        FIELD_NAMES
            .iter()
            .find(|(_, f)| *f == self)
            .map(|(n, _)| *n)
            .unwrap_or("unknown")
    }
}

impl From<MessageField> for u8 {
    fn from(f: MessageField) -> u8 {
        f.code()
    }
}

impl fmt::Display for MessageField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MessageField {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        FIELD_NAMES
            .iter()
            .find(|(n, _)| *n == wanted)
            .map(|(_, f)| *f)
            .ok_or_else(|| ProtoError::UnknownField(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum KeyType {
    Ed25519 = 1,
    P256 = 2,
    Secp256k1 = 3,
}

impl From<KeyType> for u8 {
    fn from(k: KeyType) -> u8 {
        k as u8
    }
}

impl FromStr for KeyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ed25519" | "1" => Ok(KeyType::Ed25519),
            "p256" | "nist256p1" | "2" => Ok(KeyType::P256),
            "secp256k1" | "3" => Ok(KeyType::Secp256k1),
            other => Err(format!("unknown ECC key type '{other}'")),
        }
    }
}
