use super::category::DiagnosticCategory;
use super::severity::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable diagnostic rule identifiers. The numeric code and the string form
/// are part of the tool's external contract and never change meaning.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    // Lexical / syntactic (1000-1999), produced by the front end but part
    // of the shared code space so reports stay uniform.
    UnexpectedToken,
    UnterminatedString,
    InvalidNumberLiteral,

    // Declarations (2000-2999)
    DuplicateDeclaration,
    UndefinedSymbol,
    ExportNotModuleScope,
    ConstReassignment,

    // Types (3000-3999)
    TypeMismatch,
    UnknownType,
    ArgumentCountMismatch,
    InvalidReturnType,
    IndexOutOfRange,
    NotCallable,
    InvalidCondition,
    InvalidCoercion,

    // Flow (4000-4999)
    UnreachableCode,
    UsedBeforeAssigned,
    PossiblyUninitialized,
    MissingReturn,
    UnusedVariable,
    WriteOnlyVariable,

    // Hardware (5000-5999)
    RecursionProhibited,
    StackOverflowRisk,
    ZeroPageOverflow,

    // Configuration (6000-6999)
    InvalidOptionValue,

    // Internal (9000-9999)
    LivenessIterationLimit,
    InternalError,
}

impl DiagnosticCode {
    pub fn number(self) -> u16 {
        match self {
            DiagnosticCode::UnexpectedToken => 1001,
            DiagnosticCode::UnterminatedString => 1002,
            DiagnosticCode::InvalidNumberLiteral => 1003,
            DiagnosticCode::DuplicateDeclaration => 2001,
            DiagnosticCode::UndefinedSymbol => 2002,
            DiagnosticCode::ExportNotModuleScope => 2003,
            DiagnosticCode::ConstReassignment => 2004,
            DiagnosticCode::TypeMismatch => 3001,
            DiagnosticCode::UnknownType => 3002,
            DiagnosticCode::ArgumentCountMismatch => 3003,
            DiagnosticCode::InvalidReturnType => 3004,
            DiagnosticCode::IndexOutOfRange => 3005,
            DiagnosticCode::NotCallable => 3006,
            DiagnosticCode::InvalidCondition => 3007,
            DiagnosticCode::InvalidCoercion => 3008,
            DiagnosticCode::UnreachableCode => 4001,
            DiagnosticCode::UsedBeforeAssigned => 4002,
            DiagnosticCode::PossiblyUninitialized => 4003,
            DiagnosticCode::MissingReturn => 4004,
            DiagnosticCode::UnusedVariable => 4005,
            DiagnosticCode::WriteOnlyVariable => 4006,
            DiagnosticCode::RecursionProhibited => 5001,
            DiagnosticCode::StackOverflowRisk => 5002,
            DiagnosticCode::ZeroPageOverflow => 5003,
            DiagnosticCode::InvalidOptionValue => 6001,
            DiagnosticCode::LivenessIterationLimit => 9001,
            DiagnosticCode::InternalError => 9002,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::UnexpectedToken => "UNEXPECTED_TOKEN",
            DiagnosticCode::UnterminatedString => "UNTERMINATED_STRING",
            DiagnosticCode::InvalidNumberLiteral => "INVALID_NUMBER_LITERAL",
            DiagnosticCode::DuplicateDeclaration => "DUPLICATE_DECLARATION",
            DiagnosticCode::UndefinedSymbol => "UNDEFINED_SYMBOL",
            DiagnosticCode::ExportNotModuleScope => "EXPORT_NOT_MODULE_SCOPE",
            DiagnosticCode::ConstReassignment => "CONST_REASSIGNMENT",
            DiagnosticCode::TypeMismatch => "TYPE_MISMATCH",
            DiagnosticCode::UnknownType => "UNKNOWN_TYPE",
            DiagnosticCode::ArgumentCountMismatch => "ARGUMENT_COUNT_MISMATCH",
            DiagnosticCode::InvalidReturnType => "INVALID_RETURN_TYPE",
            DiagnosticCode::IndexOutOfRange => "INDEX_OUT_OF_RANGE",
            DiagnosticCode::NotCallable => "NOT_CALLABLE",
            DiagnosticCode::InvalidCondition => "INVALID_CONDITION",
            DiagnosticCode::InvalidCoercion => "INVALID_COERCION",
            DiagnosticCode::UnreachableCode => "UNREACHABLE_CODE",
            DiagnosticCode::UsedBeforeAssigned => "USED_BEFORE_ASSIGNED",
            DiagnosticCode::PossiblyUninitialized => "POSSIBLY_UNINITIALIZED",
            DiagnosticCode::MissingReturn => "MISSING_RETURN",
            DiagnosticCode::UnusedVariable => "UNUSED_VARIABLE",
            DiagnosticCode::WriteOnlyVariable => "WRITE_ONLY_VARIABLE",
            DiagnosticCode::RecursionProhibited => "RECURSION_PROHIBITED",
            DiagnosticCode::StackOverflowRisk => "STACK_OVERFLOW_RISK",
            DiagnosticCode::ZeroPageOverflow => "ZERO_PAGE_OVERFLOW",
            DiagnosticCode::InvalidOptionValue => "INVALID_OPTION_VALUE",
            DiagnosticCode::LivenessIterationLimit => "LIVENESS_ITERATION_LIMIT",
            DiagnosticCode::InternalError => "INTERNAL_ERROR",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            DiagnosticCode::UnreachableCode
            | DiagnosticCode::PossiblyUninitialized
            | DiagnosticCode::UnusedVariable
            | DiagnosticCode::WriteOnlyVariable
            | DiagnosticCode::StackOverflowRisk
            | DiagnosticCode::ZeroPageOverflow
            | DiagnosticCode::LivenessIterationLimit => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn category(self) -> DiagnosticCategory {
        match self {
            DiagnosticCode::UnexpectedToken => DiagnosticCategory::Syntactic,
            DiagnosticCode::UnterminatedString | DiagnosticCode::InvalidNumberLiteral => {
                DiagnosticCategory::Lexical
            }
            DiagnosticCode::DuplicateDeclaration
            | DiagnosticCode::UndefinedSymbol
            | DiagnosticCode::ExportNotModuleScope
            | DiagnosticCode::ConstReassignment => DiagnosticCategory::Declaration,
            DiagnosticCode::TypeMismatch
            | DiagnosticCode::UnknownType
            | DiagnosticCode::ArgumentCountMismatch
            | DiagnosticCode::InvalidReturnType
            | DiagnosticCode::IndexOutOfRange
            | DiagnosticCode::NotCallable
            | DiagnosticCode::InvalidCondition
            | DiagnosticCode::InvalidCoercion => DiagnosticCategory::Type,
            DiagnosticCode::UnreachableCode
            | DiagnosticCode::UsedBeforeAssigned
            | DiagnosticCode::PossiblyUninitialized
            | DiagnosticCode::MissingReturn
            | DiagnosticCode::UnusedVariable
            | DiagnosticCode::WriteOnlyVariable => DiagnosticCategory::Flow,
            DiagnosticCode::RecursionProhibited
            | DiagnosticCode::StackOverflowRisk
            | DiagnosticCode::ZeroPageOverflow => DiagnosticCategory::Hardware,
            DiagnosticCode::InvalidOptionValue => DiagnosticCategory::Config,
            DiagnosticCode::LivenessIterationLimit | DiagnosticCode::InternalError => {
                DiagnosticCategory::Internal
            }
        }
    }

    pub fn default_message(self) -> &'static str {
        match self {
            DiagnosticCode::UnexpectedToken => "Unexpected token",
            DiagnosticCode::UnterminatedString => "Unterminated string literal",
            DiagnosticCode::InvalidNumberLiteral => "Invalid number literal",
            DiagnosticCode::DuplicateDeclaration => "Name is already declared in this scope",
            DiagnosticCode::UndefinedSymbol => "Use of an undeclared name",
            DiagnosticCode::ExportNotModuleScope => "Only module-scope declarations can be exported",
            DiagnosticCode::ConstReassignment => "Cannot assign to a constant",
            DiagnosticCode::TypeMismatch => "Types are not compatible",
            DiagnosticCode::UnknownType => "Unknown type name",
            DiagnosticCode::ArgumentCountMismatch => "Wrong number of arguments",
            DiagnosticCode::InvalidReturnType => "Return value does not match the function's return type",
            DiagnosticCode::IndexOutOfRange => "Array index is out of range",
            DiagnosticCode::NotCallable => "Expression is not callable",
            DiagnosticCode::InvalidCondition => "Condition must be a boolean expression",
            DiagnosticCode::InvalidCoercion => "No implicit conversion between these types",
            DiagnosticCode::UnreachableCode => "Statement is unreachable",
            DiagnosticCode::UsedBeforeAssigned => "Variable is read before it is assigned",
            DiagnosticCode::PossiblyUninitialized => "Variable may be read before it is assigned",
            DiagnosticCode::MissingReturn => "Not all paths return a value",
            DiagnosticCode::UnusedVariable => "Variable is never used",
            DiagnosticCode::WriteOnlyVariable => "Variable is written but never read",
            DiagnosticCode::RecursionProhibited => "Recursion is not supported on this target",
            DiagnosticCode::StackOverflowRisk => "Call chain may overflow the hardware stack",
            DiagnosticCode::ZeroPageOverflow => "Zero-page allocation does not fit",
            DiagnosticCode::InvalidOptionValue => "Invalid configuration value",
            DiagnosticCode::LivenessIterationLimit => "Liveness analysis hit its iteration limit",
            DiagnosticCode::InternalError => "Internal compiler error",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
