pub mod builder;
pub mod debug;
pub mod error;
pub mod ids;
pub mod instr;
pub mod lowering;
pub mod module;
pub mod optimizer;
pub mod types;
pub mod verify;

pub use builder::{IlFunctionBuilder, IlModuleBuilder};
pub use error::{IlError, IlResult};
pub use ids::{BlockId, TempId};
pub use instr::{IlInstruction, InstructionMeta, Opcode, Operand};
pub use lowering::IlGenerator;
pub use module::{IlBlock, IlFunction, IlGlobal, IlMapEntry, IlModule, IlParam, IlString};
pub use optimizer::Optimizer;
pub use types::{IlType, PointeeWidth};
pub use verify::IlVerifier;
