//! The static per-target configuration table. Loaded and validated once
//! per process; read-only afterwards.

use crate::config::{
    AddressRange, ReservedRange, TargetArchitecture, TargetConfig, TargetError, ZeroPageConfig,
};
use log::debug;
use std::sync::OnceLock;

fn build_configs() -> Vec<TargetConfig> {
    vec![
        TargetConfig {
            architecture: TargetArchitecture::C64,
            cpu: "MOS 6510",
            clock_speed_mhz: 0.985,
            total_memory: 65536,
            zero_page: ZeroPageConfig {
                reserved_ranges: vec![
                    ReservedRange { start: 0x00, end: 0x01, reason: "6510 CPU I/O port" },
                    ReservedRange { start: 0x90, end: 0xFF, reason: "KERNAL workspace" },
                ],
                safe_range: AddressRange { start: 0x02, end: 0x8F },
                usable_bytes: 142,
            },
            graphics_chip: Some("VIC-II"),
            sound_chip: Some("SID"),
            implemented: true,
        },
        TargetConfig {
            architecture: TargetArchitecture::Vic20,
            cpu: "MOS 6502",
            clock_speed_mhz: 1.108,
            total_memory: 65536,
            zero_page: ZeroPageConfig {
                reserved_ranges: vec![
                    ReservedRange { start: 0x00, end: 0x8F, reason: "BASIC and KERNAL workspace" },
                    ReservedRange { start: 0x90, end: 0x9F, reason: "KERNAL I/O status" },
                ],
                safe_range: AddressRange { start: 0xA0, end: 0xFE },
                usable_bytes: 95,
            },
            graphics_chip: Some("VIC"),
            sound_chip: None,
            implemented: false,
        },
        TargetConfig {
            architecture: TargetArchitecture::C128,
            cpu: "MOS 8502",
            clock_speed_mhz: 1.0,
            total_memory: 131072,
            zero_page: ZeroPageConfig {
                reserved_ranges: vec![
                    ReservedRange { start: 0x00, end: 0x01, reason: "8502 CPU I/O port" },
                    ReservedRange { start: 0x90, end: 0xFF, reason: "KERNAL and MMU workspace" },
                ],
                safe_range: AddressRange { start: 0x02, end: 0x8F },
                usable_bytes: 142,
            },
            graphics_chip: Some("VIC-IIe"),
            sound_chip: Some("SID"),
            implemented: false,
        },
        TargetConfig {
            architecture: TargetArchitecture::Plus4,
            cpu: "MOS 7501",
            clock_speed_mhz: 0.886,
            total_memory: 65536,
            zero_page: ZeroPageConfig {
                reserved_ranges: vec![
                    ReservedRange { start: 0x00, end: 0x01, reason: "7501 CPU I/O port" },
                    ReservedRange { start: 0x90, end: 0xFF, reason: "KERNAL workspace" },
                ],
                safe_range: AddressRange { start: 0x02, end: 0x8F },
                usable_bytes: 142,
            },
            graphics_chip: Some("TED"),
            sound_chip: Some("TED"),
            implemented: false,
        },
    ]
}

/// All configs, validated on first access. Invalid static data is a
/// programming error, so validation failure panics here rather than
/// surfacing to users.
pub fn all_targets() -> &'static [TargetConfig] {
    static CONFIGS: OnceLock<Vec<TargetConfig>> = OnceLock::new();
    CONFIGS.get_or_init(|| {
        let configs = build_configs();
        for config in &configs {
            if let Err(err) = config.validate() {
                panic!("built-in target config is invalid: {err}");
            }
        }
        debug!("target registry loaded with {} configs", configs.len());
        configs
    })
}

pub fn get_target_config(
    architecture: TargetArchitecture,
    allow_unimplemented: bool,
) -> Result<&'static TargetConfig, TargetError> {
    let config = all_targets()
        .iter()
        .find(|c| c.architecture == architecture)
        .ok_or_else(|| TargetError::UnknownTarget(architecture.to_string()))?;
    if !config.implemented && !allow_unimplemented {
        return Err(TargetError::TargetNotImplemented(architecture));
    }
    Ok(config)
}

/// Lookup by lowercase string, e.g. `"c64"`.
pub fn get_target_config_by_name(
    name: &str,
    allow_unimplemented: bool,
) -> Result<&'static TargetConfig, TargetError> {
    let architecture = TargetArchitecture::parse(&name.to_lowercase())
        .ok_or_else(|| TargetError::UnknownTarget(name.to_string()))?;
    get_target_config(architecture, allow_unimplemented)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_config_validates() {
        for config in all_targets() {
            assert!(config.validate().is_ok(), "{} config invalid", config.architecture);
        }
    }

    #[test]
    fn c64_is_implemented_and_has_142_usable_bytes() {
        let config = get_target_config(TargetArchitecture::C64, false).unwrap();
        assert_eq!(config.zero_page.usable_bytes, 142);
        assert_eq!(config.cpu, "MOS 6510");
    }

    #[test]
    fn unimplemented_target_needs_the_escape_hatch() {
        assert_eq!(
            get_target_config(TargetArchitecture::Vic20, false),
            Err(TargetError::TargetNotImplemented(TargetArchitecture::Vic20))
        );
        assert!(get_target_config(TargetArchitecture::Vic20, true).is_ok());
    }

    #[test]
    fn string_lookup_is_case_insensitive() {
        assert!(get_target_config_by_name("C64", false).is_ok());
        assert_eq!(
            get_target_config_by_name("amiga", false),
            Err(TargetError::UnknownTarget("amiga".into()))
        );
    }

    #[test]
    fn c64_safe_range_predicates() {
        let zp = &get_target_config(TargetArchitecture::C64, false).unwrap().zero_page;
        assert!(zp.is_address_reserved(0x00));
        assert_eq!(zp.get_reservation_reason(0x90), Some("KERNAL workspace"));
        assert!(zp.is_address_safe(0x02));
        assert!(zp.is_address_safe(0x8F));
        assert!(!zp.is_address_safe(0x90));
        assert!(zp.does_allocation_fit(0x02, 142));
        assert!(!zp.does_allocation_fit(0x02, 143));
        assert!(!zp.does_allocation_fit(0x8F, 2));
    }
}
