use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::hid::ReportLayout;
use crate::proto::{KeyType, MessageField, Payload};
use crate::session::SessionConfig;

pub const CONNECT_RETRIES: u32 = 5;
pub const CONNECT_DELAY_MS: u64 = 1500;
pub const CONFIRM_TIMEOUT_SECS: u64 = 120;

/// `$XDG_RUNTIME_DIR`, else the per-user data directory.
pub fn default_lock_dir() -> Option<PathBuf> {
    std::env::var("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .ok()
        .or_else(|| {
            directories::ProjectDirs::from("", "", "onlykey-hid")
                .map(|dirs| dirs.data_dir().to_path_buf())
        })
}

/// Hex-encoded command-line bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexBytes(pub Vec<u8>);

impl FromStr for HexBytes {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex::decode(s.trim().trim_start_matches("0x")).map(HexBytes)
    }
}

#[derive(clap::Parser, Debug, Clone)]
#[command(name = "onlykey-hid", version, about = "Talk to an OnlyKey over USB HID")]
pub struct Config {
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Report framing: posix (64 bytes) or windows (65 bytes). Defaults to the host platform.
    #[arg(long, global = true)]
    pub layout: Option<ReportLayout>,
    #[arg(long, default_value_t = CONNECT_RETRIES, global = true)]
    pub connect_retries: u32,
    #[arg(long, default_value_t = CONNECT_DELAY_MS, global = true)]
    pub connect_delay_ms: u64,
    /// How long to wait for the challenge code to be confirmed.
    #[arg(long, default_value_t = CONFIRM_TIMEOUT_SECS, global = true)]
    pub confirm_timeout_secs: u64,
    /// Directory for the per-device claim lock files.
    #[arg(long, global = true)]
    pub lock_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

/// `hex:<digits>`, `text:<string>`, `byte:<n>` or `none`.
fn parse_payload(s: &str) -> Result<Payload, String> {
    s.parse::<Payload>().map_err(|e| e.to_string())
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    #[command(flatten)]
    Device(DeviceCommand),
    /// Print the challenge code for a payload without touching the device.
    Challenge { data: HexBytes },
    /// Print the slot number table.
    Slots,
    /// Check HID access and device presence.
    Doctor,
}

/// Commands that need an open session.
#[derive(clap::Subcommand, Debug, Clone)]
pub enum DeviceCommand {
    /// List the labels of the 12 credential slots.
    Labels,
    /// List the labels of the RSA and ECC key slots.
    KeyLabels,
    /// Write one field of a credential slot.
    SetSlot {
        slot: u8,
        field: MessageField,
        /// hex:<digits>, text:<string>, byte:<n> or none
        #[arg(value_parser = parse_payload)]
        value: Payload,
    },
    /// Wipe every field of a credential slot.
    WipeSlot { slot: u8 },
    /// Sign a hex-encoded challenge with a key slot.
    Sign { slot: u8, data: HexBytes },
    /// Decrypt a hex-encoded ciphertext with a key slot.
    Decrypt { slot: u8, data: HexBytes },
    /// Fetch the public key of a key slot.
    Pubkey { slot: u8 },
    /// Set the device clock. Defaults to now.
    SetTime { unix_secs: Option<u64> },
    /// Load an ECC private key.
    SetEccKey {
        slot: u8,
        key_type: KeyType,
        key: HexBytes,
    },
    /// Load an RSA private key.
    SetRsaKey {
        slot: u8,
        /// Raw key-type byte (size and usage flags).
        key_type: u8,
        key: HexBytes,
    },
    /// Generate the Ed25519 backup key and print it.
    BackupKey,
}

impl Config {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            layout: self.layout.unwrap_or_default(),
            connect_retries: self.connect_retries,
            connect_delay: Duration::from_millis(self.connect_delay_ms),
            confirm_timeout: Duration::from_secs(self.confirm_timeout_secs),
            lock_dir: self.lock_dir.clone().or_else(default_lock_dir),
            ..SessionConfig::default()
        }
    }
}
