use std::ffi::CString;
use std::time::Duration;

use hidapi::{HidApi, HidDevice};

use super::transport::{DeviceInfo, HidBackend, HidHandle};
use super::HidError;

pub const DEVICE_IDS: [(u16, u16); 2] = [
    (0x16C0, 0x0486), // OnlyKey (Teensy ids)
    (0x1D50, 0x60FC), // OnlyKey (OpenMoko ids)
];

/// Serial reported by the configuration-mode firmware interface.
pub const CONFIG_SERIAL_SENTINEL: &str = "1000000000";

pub const CONFIG_USAGE_PAGE: u16 = 0xFFAB;
pub const CONFIG_INTERFACE: i32 = 2;
pub const DATA_USAGE_PAGE: u16 = 0xF1D0;
pub const DATA_INTERFACE: i32 = 1;

/// The OnlyKey exposes several HID interfaces. Only one of them accepts the
/// 0xFF-headed command reports; which one depends on the firmware mode
/// (signalled by the serial number) and on whether the platform reports
/// usage pages or only interface numbers.
pub fn matches_onlykey(info: &DeviceInfo) -> bool {
    if !DEVICE_IDS.contains(&(info.vendor_id, info.product_id)) {
        return false;
    }
    if info.serial_number.as_deref() == Some(CONFIG_SERIAL_SENTINEL) {
        info.usage_page == CONFIG_USAGE_PAGE || info.interface_number == CONFIG_INTERFACE
    } else {
        info.usage_page == DATA_USAGE_PAGE || info.interface_number == DATA_INTERFACE
    }
}

pub struct HidApiBackend {
    api: HidApi,
}

impl HidApiBackend {
    pub fn new() -> Result<Self, HidError> {
        let api = HidApi::new().map_err(|e| HidError::Init(e.to_string()))?;
        Ok(Self { api })
    }
}

impl HidBackend for HidApiBackend {
    fn enumerate(&mut self) -> Result<Vec<DeviceInfo>, HidError> {
        self.api
            .refresh_devices()
            .map_err(|e| HidError::Enumerate(e.to_string()))?;
        let devices = self
            .api
            .device_list()
            .map(|d| DeviceInfo {
                vendor_id: d.vendor_id(),
                product_id: d.product_id(),
                serial_number: d.serial_number().map(str::to_string),
                interface_number: d.interface_number(),
                usage_page: d.usage_page(),
                path: d.path().to_string_lossy().into_owned(),
            })
            .collect::<Vec<_>>();
        tracing::debug!(count = devices.len(), "HID devices enumerated");
        Ok(devices)
    }

    fn open(&mut self, info: &DeviceInfo) -> Result<Box<dyn HidHandle>, HidError> {
        let open_err = |reason: String| HidError::Open {
            path: info.path.clone(),
            reason,
        };
        let path = CString::new(info.path.as_str()).map_err(|e| open_err(e.to_string()))?;
        let device = self
            .api
            .open_path(&path)
            .map_err(|e| open_err(e.to_string()))?;
        device
            .set_blocking_mode(false)
            .map_err(|e| open_err(e.to_string()))?;
        tracing::info!(path = %info.path, "OnlyKey opened");
        Ok(Box::new(HidApiHandle { device }))
    }
}

struct HidApiHandle {
    device: HidDevice,
}

impl HidHandle for HidApiHandle {
    fn write(&mut self, data: &[u8]) -> Result<usize, HidError> {
        self.device
            .write(data)
            .map_err(|e| HidError::Write(e.to_string()))
    }

    fn read(&mut self, len: usize, timeout: Duration) -> Result<Vec<u8>, HidError> {
        let mut buf = vec![0u8; len];
        let millis = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
        let got = self
            .device
            .read_timeout(&mut buf, millis)
            .map_err(|e| HidError::Read(e.to_string()))?;
        buf.truncate(got);
        tracing::trace!(len = got, "HID rx");
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(serial: &str, usage_page: u16, interface_number: i32) -> DeviceInfo {
        DeviceInfo {
            vendor_id: 0x16C0,
            product_id: 0x0486,
            serial_number: Some(serial.to_string()),
            interface_number,
            usage_page,
            path: "/dev/hidraw3".to_string(),
        }
    }

    #[test]
    fn test_data_interface_matched_by_usage_page_or_interface() {
        assert!(matches_onlykey(&info("ABC123", DATA_USAGE_PAGE, 0)));
        assert!(matches_onlykey(&info("ABC123", 0, DATA_INTERFACE)));
        assert!(!matches_onlykey(&info("ABC123", CONFIG_USAGE_PAGE, 0)));
    }

    #[test]
    fn test_config_serial_selects_config_interface() {
        assert!(matches_onlykey(&info(CONFIG_SERIAL_SENTINEL, CONFIG_USAGE_PAGE, 0)));
        assert!(matches_onlykey(&info(CONFIG_SERIAL_SENTINEL, 0, CONFIG_INTERFACE)));
        assert!(!matches_onlykey(&info(CONFIG_SERIAL_SENTINEL, DATA_USAGE_PAGE, DATA_INTERFACE)));
    }

    #[test]
    fn test_foreign_ids_rejected() {
        let mut d = info("ABC123", DATA_USAGE_PAGE, DATA_INTERFACE);
        d.vendor_id = 0x1050;
        assert!(!matches_onlykey(&d));

        let mut d = info("ABC123", DATA_USAGE_PAGE, DATA_INTERFACE);
        d.vendor_id = 0x1D50;
        d.product_id = 0x60FC;
        assert!(matches_onlykey(&d));
    }
}
