pub mod ast;
pub mod metadata;
pub mod source;
pub mod span;
pub mod walk;

pub use ast::NodeId;
pub use metadata::{MetadataMap, MetadataValue, OptimizationMetadataKey};
pub use source::{FileId, SourceRegistry};
pub use span::{Position, SourceLocation};
