#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use onlykey_hid::hid::{DeviceInfo, HidBackend, HidError, HidHandle, ReportLayout};
use onlykey_hid::proto::ReadPlan;
use onlykey_hid::SessionConfig;

/// In-memory stand-in for the key: records frames written and, after each
/// write, queues the replies scripted for it.
#[derive(Default)]
pub struct Wire {
    pub written: Vec<Vec<u8>>,
    pub readable: VecDeque<Vec<u8>>,
    pub replies_per_write: VecDeque<Vec<Vec<u8>>>,
    pub reads_made: usize,
}

pub type SharedWire = Rc<RefCell<Wire>>;

pub fn wire() -> SharedWire {
    Rc::new(RefCell::new(Wire::default()))
}

pub struct ScriptedHandle(pub SharedWire);

impl HidHandle for ScriptedHandle {
    fn write(&mut self, data: &[u8]) -> Result<usize, HidError> {
        let mut w = self.0.borrow_mut();
        w.written.push(data.to_vec());
        if let Some(replies) = w.replies_per_write.pop_front() {
            w.readable.extend(replies);
        }
        Ok(data.len())
    }

    fn read(&mut self, _len: usize, _timeout: Duration) -> Result<Vec<u8>, HidError> {
        let mut w = self.0.borrow_mut();
        w.reads_made += 1;
        Ok(w.readable.pop_front().unwrap_or_default())
    }
}

pub struct ScriptedBackend {
    pub devices: Vec<DeviceInfo>,
    /// Enumerations that return nothing before `devices` shows up.
    pub absent_for: usize,
    pub enumerations: usize,
    pub wire: SharedWire,
}

impl ScriptedBackend {
    pub fn new(devices: Vec<DeviceInfo>) -> Self {
        Self {
            devices,
            absent_for: 0,
            enumerations: 0,
            wire: wire(),
        }
    }
}

impl HidBackend for ScriptedBackend {
    fn enumerate(&mut self) -> Result<Vec<DeviceInfo>, HidError> {
        self.enumerations += 1;
        if self.enumerations <= self.absent_for {
            return Ok(vec![]);
        }
        Ok(self.devices.clone())
    }

    fn open(&mut self, _info: &DeviceInfo) -> Result<Box<dyn HidHandle>, HidError> {
        Ok(Box::new(ScriptedHandle(self.wire.clone())))
    }
}

pub fn onlykey(path: &str) -> DeviceInfo {
    DeviceInfo {
        vendor_id: 0x1D50,
        product_id: 0x60FC,
        serial_number: Some("OK1234".to_string()),
        interface_number: 1,
        usage_page: 0xF1D0,
        path: path.to_string(),
    }
}

pub fn keyboard() -> DeviceInfo {
    DeviceInfo {
        vendor_id: 0x046D,
        product_id: 0xC31C,
        serial_number: None,
        interface_number: 0,
        usage_page: 0x0001,
        path: "/dev/hidraw0".to_string(),
    }
}

pub fn fast_config(lock_dir: Option<PathBuf>) -> SessionConfig {
    SessionConfig {
        layout: ReportLayout::Posix,
        connect_retries: 5,
        connect_delay: Duration::from_millis(20),
        confirm_timeout: Duration::from_secs(1),
        lock_dir,
        read_timeout: Duration::ZERO,
        label_delay: Duration::ZERO,
        settle_delay: Duration::ZERO,
        backup_key_delay: Duration::ZERO,
        response: ReadPlan {
            first_poll_interval: Duration::ZERO,
            first_poll_attempts: 3,
            ..ReadPlan::default()
        },
    }
}

pub fn segments(count: usize) -> Vec<Vec<u8>> {
    (0..count).map(|i| vec![i as u8 + 1; 64]).collect()
}

/// Text reply padded to a full report.
pub fn text_report(text: &[u8]) -> Vec<u8> {
    let mut r = text.to_vec();
    r.resize(64, 0);
    r
}
