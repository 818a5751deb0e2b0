pub mod device;
pub mod report;
pub mod transport;

pub use device::{matches_onlykey, HidApiBackend};
pub use report::ReportLayout;
pub use transport::{DeviceInfo, HidBackend, HidHandle};

#[derive(Debug, thiserror::Error)]
pub enum HidError {
    #[error("Failed to initialise HID API: {0}")]
    Init(String),
    #[error("HID enumerate error: {0}")]
    Enumerate(String),
    #[error("No OnlyKey found among {0} HID device(s)")]
    NoMatchingDevice(usize),
    #[error("Failed to open {path}: {reason}")]
    Open { path: String, reason: String },
    #[error("HID read error: {0}")]
    Read(String),
    #[error("HID write error: {0}")]
    Write(String),
    #[error("Short write: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },
}
