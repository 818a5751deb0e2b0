pub mod claim;
mod ops;

pub use claim::DeviceClaim;

use std::path::PathBuf;
use std::time::Duration;

use crate::config::{default_lock_dir, CONFIRM_TIMEOUT_SECS, CONNECT_DELAY_MS, CONNECT_RETRIES};
use crate::error::{Error, Result};
use crate::hid::{matches_onlykey, transport::write_all, HidBackend, HidError, HidHandle, ReportLayout};
use crate::proto::{encode, send_chunks, ChunkFraming, Message, MessageField, ReadPlan};
use crate::slot::report_text;

/// Upper bound on stale reports discarded before a request.
const MAX_DRAIN_READS: usize = 16;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub layout: ReportLayout,
    pub connect_retries: u32,
    pub connect_delay: Duration,
    pub confirm_timeout: Duration,
    /// `None` disables the per-device claim.
    pub lock_dir: Option<PathBuf>,
    pub read_timeout: Duration,
    /// Pause between `GetLabels` and reading the replies.
    pub label_delay: Duration,
    /// Pause before draining stale reports ahead of a key operation.
    pub settle_delay: Duration,
    /// Pause between requesting the backup key and reading it back.
    pub backup_key_delay: Duration,
    pub response: ReadPlan,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            layout: ReportLayout::native(),
            connect_retries: CONNECT_RETRIES,
            connect_delay: Duration::from_millis(CONNECT_DELAY_MS),
            confirm_timeout: Duration::from_secs(CONFIRM_TIMEOUT_SECS),
            lock_dir: default_lock_dir(),
            read_timeout: Duration::from_millis(100),
            label_delay: Duration::from_millis(500),
            settle_delay: Duration::from_secs(1),
            backup_key_delay: Duration::from_millis(500),
            response: ReadPlan::default(),
        }
    }
}

/// An open, exclusively owned connection to one OnlyKey.
pub struct Session {
    handle: Box<dyn HidHandle>,
    config: SessionConfig,
    path: Option<String>,
    _claim: Option<DeviceClaim>,
}

impl Session {
    /// Find, claim and open the OnlyKey, retrying the whole procedure
    /// `connect_retries` times. A device claimed by another session fails
    /// immediately.
    pub fn connect(backend: &mut dyn HidBackend, config: SessionConfig) -> Result<Self> {
        let attempts = config.connect_retries.max(1);
        let mut last_error = String::new();
        for attempt in 1..=attempts {
            match Self::try_open(backend, &config) {
                Ok((handle, path, claim)) => {
                    tracing::info!(path = %path, attempt, "connected");
                    return Ok(Self {
                        handle,
                        config,
                        path: Some(path),
                        _claim: claim,
                    });
                }
                Err(Error::DeviceBusy(path)) => return Err(Error::DeviceBusy(path)),
                Err(e) => {
                    tracing::debug!(attempt, error = %e, "connect failed");
                    last_error = e.to_string();
                }
            }
            if attempt < attempts {
                std::thread::sleep(config.connect_delay);
            }
        }
        Err(Error::TransportUnavailable {
            attempts,
            reason: last_error,
        })
    }

    fn try_open(
        backend: &mut dyn HidBackend,
        config: &SessionConfig,
    ) -> Result<(Box<dyn HidHandle>, String, Option<DeviceClaim>)> {
        let devices = backend.enumerate()?;
        let info = devices
            .iter()
            .find(|d| matches_onlykey(d))
            .cloned()
            .ok_or(HidError::NoMatchingDevice(devices.len()))?;
        let claim = match &config.lock_dir {
            Some(dir) => Some(DeviceClaim::acquire(dir, &info.path)?),
            None => None,
        };
        let handle = backend.open(&info)?;
        Ok((handle, info.path, claim))
    }

    /// Wrap an already-open handle. No claim is taken.
    pub fn from_handle(handle: Box<dyn HidHandle>, config: SessionConfig) -> Self {
        Self {
            handle,
            config,
            path: None,
            _claim: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn device_path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn close(self) {
        tracing::info!(path = ?self.path, "closing session");
    }

    /// Encode and write a single report.
    pub fn send_message(
        &mut self,
        message: Message,
        slot_id: Option<u8>,
        field: Option<MessageField>,
        payload: &[u8],
    ) -> Result<()> {
        let report = encode(self.config.layout, Some(message), slot_id, field, payload)?;
        tracing::debug!(msg = ?message, slot_id = ?slot_id, len = payload.len(), "sending message");
        write_all(self.handle.as_mut(), report.as_bytes())?;
        Ok(())
    }

    /// Chunk `payload` across as many reports as it needs.
    pub fn send_large(&mut self, message: Message, framing: ChunkFraming, payload: &[u8]) -> Result<usize> {
        let layout = self.config.layout;
        let handle = self.handle.as_mut();
        let sent = send_chunks(layout, Some(message), framing, payload, |report| {
            write_all(&mut *handle, report.as_bytes())
        })?;
        tracing::debug!(msg = ?message, len = payload.len(), reports = sent, "sent large message");
        Ok(sent)
    }

    pub fn read_report(&mut self, timeout: Duration) -> Result<Vec<u8>> {
        Ok(self.handle.read(self.config.layout.size(), timeout)?)
    }

    pub fn read_text(&mut self) -> Result<String> {
        let report = self.read_report(self.config.read_timeout)?;
        Ok(report_text(&report))
    }

    /// Discard replies left over from earlier requests.
    pub fn drain_pending(&mut self) -> Result<usize> {
        let mut drained = 0;
        while drained < MAX_DRAIN_READS {
            if self.read_report(self.config.read_timeout)?.is_empty() {
                break;
            }
            drained += 1;
        }
        if drained > 0 {
            tracing::debug!(drained, "discarded stale reports");
        }
        Ok(drained)
    }

    fn settle(&mut self) -> Result<()> {
        std::thread::sleep(self.config.settle_delay);
        self.drain_pending()?;
        Ok(())
    }
}
