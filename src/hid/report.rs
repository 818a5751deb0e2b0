use std::fmt;
use std::str::FromStr;

/// Header for hidraw/IOKit style transports: no report-ID byte.
pub const POSIX_HEADER: &[u8] = &[0xFF, 0xFF, 0xFF, 0xFF];
/// Windows HID writes carry a leading report-ID byte (always 0).
pub const WINDOWS_HEADER: &[u8] = &[0x00, 0xFF, 0xFF, 0xFF, 0xFF];

pub const POSIX_REPORT_SIZE: usize = 64;
pub const WINDOWS_REPORT_SIZE: usize = 65;

/// Size of one inbound data report, independent of the outbound framing.
pub const HID_REPORT_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportLayout {
    Posix,
    Windows,
}

impl ReportLayout {
    pub fn native() -> Self {
        if cfg!(windows) {
            ReportLayout::Windows
        } else {
            ReportLayout::Posix
        }
    }

    pub fn size(self) -> usize {
        match self {
            ReportLayout::Posix => POSIX_REPORT_SIZE,
            ReportLayout::Windows => WINDOWS_REPORT_SIZE,
        }
    }

    pub fn header(self) -> &'static [u8] {
        match self {
            ReportLayout::Posix => POSIX_HEADER,
            ReportLayout::Windows => WINDOWS_HEADER,
        }
    }

    /// Bytes available after the header.
    pub fn body_capacity(self) -> usize {
        self.size() - self.header().len()
    }
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self::native()
    }
}

impl fmt::Display for ReportLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportLayout::Posix => write!(f, "posix"),
            ReportLayout::Windows => write!(f, "windows"),
        }
    }
}

impl FromStr for ReportLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "posix" | "64" => Ok(ReportLayout::Posix),
            "windows" | "65" => Ok(ReportLayout::Windows),
            other => Err(format!("unknown report layout '{other}' (expected posix or windows)")),
        }
    }
}
