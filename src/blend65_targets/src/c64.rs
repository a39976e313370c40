//! C64-specific zero-page knowledge: categorized map plus a first-fit
//! allocator suggestion over the safe window.

use crate::config::TargetArchitecture;
use crate::registry::get_target_config;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZeroPageCategory {
    Safe,
    ReservedCpu,
    ReservedKernal,
}

/// Category of one zero-page address on the C64.
pub fn categorize(address: u8) -> ZeroPageCategory {
    match address {
        0x00..=0x01 => ZeroPageCategory::ReservedCpu,
        0x90..=0xFF => ZeroPageCategory::ReservedKernal,
        _ => ZeroPageCategory::Safe,
    }
}

/// Tracks zero-page occupancy during allocation and suggests holes.
#[derive(Debug, Clone)]
pub struct C64ZeroPageAllocator {
    taken: [bool; 256],
}

impl Default for C64ZeroPageAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl C64ZeroPageAllocator {
    pub fn new() -> Self {
        Self { taken: [false; 256] }
    }

    /// First contiguous safe hole of `size` bytes, if one is left.
    pub fn suggest_zero_page_allocation(&self, size: u16) -> Option<u16> {
        if size == 0 {
            return None;
        }
        let zp = &get_target_config(TargetArchitecture::C64, false).ok()?.zero_page;
        let mut run_start: Option<u16> = None;
        let mut run_len: u16 = 0;
        for address in zp.safe_range.start..=zp.safe_range.end {
            let free = zp.is_address_safe(address) && !self.taken[address as usize];
            if free {
                if run_start.is_none() {
                    run_start = Some(address);
                    run_len = 0;
                }
                run_len += 1;
                if run_len == size {
                    return run_start;
                }
            } else {
                run_start = None;
                run_len = 0;
            }
        }
        None
    }

    /// Claim a hole, returning its start.
    pub fn allocate(&mut self, size: u16) -> Option<u16> {
        let start = self.suggest_zero_page_allocation(size)?;
        for address in start..start + size {
            self.taken[address as usize] = true;
        }
        Some(start)
    }

    pub fn mark_taken(&mut self, address: u16) {
        if let Some(slot) = self.taken.get_mut(address as usize) {
            *slot = true;
        }
    }

    pub fn bytes_free(&self) -> u16 {
        let zp = match get_target_config(TargetArchitecture::C64, false) {
            Ok(config) => &config.zero_page,
            Err(_) => return 0,
        };
        (zp.safe_range.start..=zp.safe_range.end)
            .filter(|&a| zp.is_address_safe(a) && !self.taken[a as usize])
            .count() as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_match_the_memory_map() {
        assert_eq!(categorize(0x00), ZeroPageCategory::ReservedCpu);
        assert_eq!(categorize(0x02), ZeroPageCategory::Safe);
        assert_eq!(categorize(0x8F), ZeroPageCategory::Safe);
        assert_eq!(categorize(0x90), ZeroPageCategory::ReservedKernal);
        assert_eq!(categorize(0xFF), ZeroPageCategory::ReservedKernal);
    }

    #[test]
    fn allocation_is_first_fit_and_advances() {
        let mut allocator = C64ZeroPageAllocator::new();
        assert_eq!(allocator.allocate(2), Some(0x02));
        assert_eq!(allocator.allocate(1), Some(0x04));
        assert_eq!(allocator.bytes_free(), 142 - 3);
    }

    #[test]
    fn allocation_skips_marked_bytes() {
        let mut allocator = C64ZeroPageAllocator::new();
        allocator.mark_taken(0x02);
        allocator.mark_taken(0x04);
        // First two-byte hole after the marks is $05.
        assert_eq!(allocator.suggest_zero_page_allocation(2), Some(0x05));
    }

    #[test]
    fn oversized_requests_fail() {
        let allocator = C64ZeroPageAllocator::new();
        assert_eq!(allocator.suggest_zero_page_allocation(143), None);
        assert_eq!(allocator.suggest_zero_page_allocation(0), None);
    }
}
