use std::time::Duration;

use super::HidError;

/// One enumerated HID interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub vendor_id: u16,
    pub product_id: u16,
    pub serial_number: Option<String>,
    pub interface_number: i32,
    pub usage_page: u16,
    pub path: String,
}

/// Device discovery and opening. Implemented over hidapi in production and
/// scripted in tests.
pub trait HidBackend {
    fn enumerate(&mut self) -> Result<Vec<DeviceInfo>, HidError>;
    fn open(&mut self, info: &DeviceInfo) -> Result<Box<dyn HidHandle>, HidError>;
}

/// An open device. Dropping the handle closes it.
pub trait HidHandle {
    fn write(&mut self, data: &[u8]) -> Result<usize, HidError>;

    /// Read up to `len` bytes. Returns an empty vector when nothing arrived
    /// within `timeout`.
    fn read(&mut self, len: usize, timeout: Duration) -> Result<Vec<u8>, HidError>;
}

/// Write a whole frame or fail.
pub fn write_all(handle: &mut dyn HidHandle, data: &[u8]) -> Result<(), HidError> {
    let written = handle.write(data)?;
    if written < data.len() {
        return Err(HidError::ShortWrite {
            written,
            expected: data.len(),
        });
    }
    tracing::trace!(len = data.len(), "HID tx");
    Ok(())
}
