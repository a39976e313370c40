use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetArchitecture {
    C64,
    Vic20,
    C128,
    Plus4,
}

impl TargetArchitecture {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetArchitecture::C64 => "c64",
            TargetArchitecture::Vic20 => "vic20",
            TargetArchitecture::C128 => "c128",
            TargetArchitecture::Plus4 => "plus4",
        }
    }

    /// Lookup by lowercase name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "c64" => Some(TargetArchitecture::C64),
            "vic20" => Some(TargetArchitecture::Vic20),
            "c128" => Some(TargetArchitecture::C128),
            "plus4" => Some(TargetArchitecture::Plus4),
            _ => None,
        }
    }
}

impl fmt::Display for TargetArchitecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TargetError {
    #[error("unknown target `{0}`")]
    UnknownTarget(String),
    #[error("target `{0}` is not implemented yet")]
    TargetNotImplemented(TargetArchitecture),
    #[error("invalid target config for `{target}`: {reason}")]
    InvalidConfig { target: TargetArchitecture, reason: String },
}

/// A zero-page range the host machine claims for itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReservedRange {
    pub start: u16,
    pub end: u16,
    pub reason: &'static str,
}

impl ReservedRange {
    pub fn contains(&self, address: u16) -> bool {
        (self.start..=self.end).contains(&address)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRange {
    pub start: u16,
    pub end: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZeroPageConfig {
    pub reserved_ranges: Vec<ReservedRange>,
    pub safe_range: AddressRange,
    pub usable_bytes: u16,
}

impl ZeroPageConfig {
    pub fn is_address_reserved(&self, address: u16) -> bool {
        self.reserved_ranges.iter().any(|r| r.contains(address))
    }

    pub fn get_reservation_reason(&self, address: u16) -> Option<&'static str> {
        self.reserved_ranges.iter().find(|r| r.contains(address)).map(|r| r.reason)
    }

    /// In the safe window and not claimed by the host.
    pub fn is_address_safe(&self, address: u16) -> bool {
        (self.safe_range.start..=self.safe_range.end).contains(&address)
            && !self.is_address_reserved(address)
    }

    /// Every byte of `[start, start+len)` must be safe.
    pub fn does_allocation_fit(&self, start: u16, len: u16) -> bool {
        if len == 0 {
            return false;
        }
        let Some(last) = start.checked_add(len - 1) else { return false };
        (start..=last).all(|addr| self.is_address_safe(addr))
    }

    /// Load-time validation of static data.
    pub fn validate(&self, target: TargetArchitecture) -> Result<(), TargetError> {
        let invalid = |reason: String| TargetError::InvalidConfig { target, reason };
        if self.safe_range.start > self.safe_range.end {
            return Err(invalid(format!(
                "safe range ${:02X}..${:02X} is inverted",
                self.safe_range.start, self.safe_range.end
            )));
        }
        for range in &self.reserved_ranges {
            if range.start > range.end {
                return Err(invalid(format!(
                    "reserved range ${:02X}..${:02X} is empty",
                    range.start, range.end
                )));
            }
        }
        for (i, a) in self.reserved_ranges.iter().enumerate() {
            for b in &self.reserved_ranges[i + 1..] {
                if a.start <= b.end && b.start <= a.end {
                    return Err(invalid(format!(
                        "reserved ranges ${:02X}..${:02X} and ${:02X}..${:02X} overlap",
                        a.start, a.end, b.start, b.end
                    )));
                }
            }
        }
        let safe_len = self.safe_range.end - self.safe_range.start + 1;
        let reserved_in_safe: u16 = self
            .reserved_ranges
            .iter()
            .map(|r| {
                let start = r.start.max(self.safe_range.start);
                let end = r.end.min(self.safe_range.end);
                if start <= end { end - start + 1 } else { 0 }
            })
            .sum();
        let expected = safe_len - reserved_in_safe;
        if self.usable_bytes != expected {
            return Err(invalid(format!(
                "usable_bytes is {} but the ranges give {}",
                self.usable_bytes, expected
            )));
        }
        Ok(())
    }
}

/// Static facts about one machine the backend must honor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetConfig {
    pub architecture: TargetArchitecture,
    pub cpu: &'static str,
    pub clock_speed_mhz: f64,
    pub total_memory: u32,
    pub zero_page: ZeroPageConfig,
    pub graphics_chip: Option<&'static str>,
    pub sound_chip: Option<&'static str>,
    pub implemented: bool,
}

impl TargetConfig {
    pub fn validate(&self) -> Result<(), TargetError> {
        self.zero_page.validate(self.architecture)
    }
}
