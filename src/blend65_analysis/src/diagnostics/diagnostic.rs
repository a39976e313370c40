use super::category::DiagnosticCategory;
use super::code::DiagnosticCode;
use super::severity::Severity;
use blend65_syntax::span::SourceLocation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One reported finding: rule code, severity, message, and where.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub category: DiagnosticCategory,
    pub message: String,
    pub location: SourceLocation,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: code.severity(),
            category: code.category(),
            code,
            message: message.into(),
            location: SourceLocation::default(),
        }
    }

    /// Diagnostic carrying the code's default message.
    pub fn with_default_message(code: DiagnosticCode) -> Self {
        Self::new(code, code.default_message())
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        debug_assert!(matches!(code.severity(), Severity::Error));
        Self::new(code, message)
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        debug_assert!(matches!(code.severity(), Severity::Warning));
        Self::new(code, message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.code.as_str(), self.severity, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_and_category_come_from_the_code() {
        let d = Diagnostic::with_default_message(DiagnosticCode::TypeMismatch);
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.category, DiagnosticCategory::Type);
    }

    #[test]
    fn display_is_code_severity_message() {
        let d = Diagnostic::new(DiagnosticCode::UnusedVariable, "variable `x` is never used");
        insta::assert_snapshot!(d.to_string(), @"UNUSED_VARIABLE: warning: variable `x` is never used");
    }
}
