//! Hardware-aware analyses shared by every 6502-family target.

pub mod register_hints;
pub mod stack_usage;
pub mod zero_page;

pub use register_hints::{preferred_register, PreferredRegister, RegisterHintFlags};
pub use stack_usage::{Common6502Analyzer, FunctionStackUsage, StackUsageReport};
pub use zero_page::zero_page_priority;
