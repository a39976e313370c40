use crate::ids::BlockId;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum IlError {
    #[error("function `{0}` has no blocks")]
    EmptyFunction(String),
    #[error("block {0} has no terminator")]
    MissingTerminator(BlockId),
    #[error("block {0} has a terminator before its last instruction")]
    EarlyTerminator(BlockId),
    #[error("duplicate block id {0}")]
    DuplicateBlockId(BlockId),
    #[error("jump to unknown block {0}")]
    UnknownBlockTarget(BlockId),
    #[error("instruction writes no result where one is required: {0}")]
    MissingResult(String),
    #[error("cannot lower `{0}`: {1}")]
    Unsupported(String, String),
}

pub type IlResult<T> = Result<T, IlError>;
