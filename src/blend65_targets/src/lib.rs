pub mod analyses;
pub mod c64;
pub mod config;
pub mod registry;

pub use analyses::{
    preferred_register, zero_page_priority, Common6502Analyzer, FunctionStackUsage,
    PreferredRegister, RegisterHintFlags, StackUsageReport,
};
pub use c64::{categorize, C64ZeroPageAllocator, ZeroPageCategory};
pub use config::{
    AddressRange, ReservedRange, TargetArchitecture, TargetConfig, TargetError, ZeroPageConfig,
};
pub use registry::{all_targets, get_target_config, get_target_config_by_name};
