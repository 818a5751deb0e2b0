use std::time::Duration;

use super::{ProtoError, types::*};
use crate::hid::{report::HID_REPORT_SIZE, HidHandle};

/// Polling budget for one multi-report response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadPlan {
    pub expected_parts: usize,
    pub report_size: usize,
    pub timeout_per_read: Duration,
    pub retries_per_part: u32,
    /// Delay before each poll while the device is still computing.
    pub first_poll_interval: Duration,
    pub first_poll_attempts: u32,
}

impl Default for ReadPlan {
    fn default() -> Self {
        Self {
            expected_parts: RESPONSE_SEGMENTS,
            report_size: HID_REPORT_SIZE,
            timeout_per_read: Duration::from_millis(100),
            retries_per_part: SEGMENT_RETRIES,
            first_poll_interval: Duration::from_millis(500),
            // RSA-4096 operations take up to ~9 s on the device.
            first_poll_attempts: 40,
        }
    }
}

enum ReadState {
    AwaitingFirstByte { polls: u32 },
    AwaitingSegment { index: usize, attempts: u32, last_len: usize },
    Complete,
}

/// Poll `handle` for `plan.expected_parts` reports and concatenate them.
///
/// The first report may take a long time (the device is signing or waiting
/// for the user), so it is polled at `first_poll_interval` and any non-empty
/// read is accepted. Every later report must arrive full-size within
/// `retries_per_part` reads.
pub fn read_fixed(handle: &mut dyn HidHandle, plan: &ReadPlan) -> Result<Vec<u8>, ProtoError> {
    let mut buf = Vec::with_capacity(plan.expected_parts * plan.report_size);
    if plan.expected_parts == 0 {
        return Ok(buf);
    }

    let mut state = ReadState::AwaitingFirstByte { polls: 0 };
    loop {
        state = match state {
            ReadState::AwaitingFirstByte { polls } => {
                if polls >= plan.first_poll_attempts {
                    return Err(ProtoError::DeviceUnresponsive {
                        waited: plan.first_poll_interval * polls,
                    });
                }
                std::thread::sleep(plan.first_poll_interval);
                let data = handle.read(plan.report_size, plan.timeout_per_read)?;
                if data.is_empty() {
                    ReadState::AwaitingFirstByte { polls: polls + 1 }
                } else {
                    tracing::debug!(segment = 0, len = data.len(), polls = polls + 1, "segment received");
                    buf.extend_from_slice(&data);
                    next_segment(1, plan)
                }
            }
            ReadState::AwaitingSegment { index, attempts, last_len } => {
                if attempts >= plan.retries_per_part {
                    tracing::warn!(segment = index, last_len, "segment read timed out");
                    return Err(ProtoError::SegmentReadTimeout {
                        segment: index,
                        expected: plan.report_size,
                        actual: last_len,
                    });
                }
                let data = handle.read(plan.report_size, plan.timeout_per_read)?;
                if data.len() == plan.report_size {
                    tracing::debug!(segment = index, attempts = attempts + 1, "segment received");
                    buf.extend_from_slice(&data);
                    next_segment(index + 1, plan)
                } else {
                    ReadState::AwaitingSegment {
                        index,
                        attempts: attempts + 1,
                        last_len: data.len(),
                    }
                }
            }
            ReadState::Complete => return Ok(buf),
        };
    }
}

fn next_segment(index: usize, plan: &ReadPlan) -> ReadState {
    if index >= plan.expected_parts {
        ReadState::Complete
    } else {
        ReadState::AwaitingSegment {
            index,
            attempts: 0,
            last_len: 0,
        }
    }
}
