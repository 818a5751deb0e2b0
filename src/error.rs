use crate::hid::HidError;
use crate::proto::ProtoError;
use crate::slot::SlotError;
use crate::up::UpError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HID: {0}")]
    Hid(#[from] HidError),
    #[error("Protocol: {0}")]
    Proto(#[from] ProtoError),
    #[error("Slot: {0}")]
    Slot(#[from] SlotError),
    #[error("User presence: {0}")]
    Up(#[from] UpError),
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("OnlyKey unavailable after {attempts} attempt(s): {reason}")]
    TransportUnavailable { attempts: u32, reason: String },
    #[error("OnlyKey at {0} is already claimed by another session")]
    DeviceBusy(String),
    #[error("Failed to read signature from OnlyKey: {0}")]
    SignatureReadFailed(#[source] ProtoError),
    #[error("Failed to read decrypted data from OnlyKey: {0}")]
    DecryptReadFailed(#[source] ProtoError),
    #[error("Failed to read public key from OnlyKey: {0}")]
    PublicKeyReadFailed(#[source] ProtoError),
    #[error("Failed to read backup key from OnlyKey")]
    BackupKeyReadFailed,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
