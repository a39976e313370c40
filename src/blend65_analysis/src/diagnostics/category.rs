use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure taxonomy. Every diagnostic code belongs to exactly one category.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCategory {
    Lexical,
    Syntactic,
    Declaration,
    Type,
    Flow,
    Hardware,
    Config,
    Internal,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticCategory::Lexical => "lexical",
            DiagnosticCategory::Syntactic => "syntactic",
            DiagnosticCategory::Declaration => "declaration",
            DiagnosticCategory::Type => "type",
            DiagnosticCategory::Flow => "flow",
            DiagnosticCategory::Hardware => "hardware",
            DiagnosticCategory::Config => "config",
            DiagnosticCategory::Internal => "internal",
        };
        f.write_str(name)
    }
}
