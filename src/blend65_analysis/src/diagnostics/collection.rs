use super::code::DiagnosticCode;
use super::diagnostic::Diagnostic;
use super::severity::Severity;
use serde::{Deserialize, Serialize};

/// Append-only list of diagnostics for one phase or one whole compilation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticCollection {
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn add_error(&mut self, code: DiagnosticCode, message: impl Into<String>) {
        self.add(Diagnostic::error(code, message));
    }

    pub fn add_warning(&mut self, code: DiagnosticCode, message: impl Into<String>) {
        self.add(Diagnostic::warning(code, message));
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn extend(&mut self, other: DiagnosticCollection) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Stable source ordering within one phase: file, line, column, code.
    /// Applied at phase boundaries so later-phase diagnostics never move in
    /// front of earlier-phase ones.
    pub fn sort(&mut self) {
        self.diagnostics.sort_by(|a, b| {
            a.location
                .sort_key()
                .cmp(&b.location.sort_key())
                .then_with(|| a.code.as_str().cmp(b.code.as_str()))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blend65_syntax::span::{Position, SourceLocation};

    fn at(line: u32, column: u32) -> SourceLocation {
        SourceLocation::new(
            Some("main.b65".into()),
            Position::new(line, column, 0),
            Position::new(line, column + 1, 1),
        )
    }

    #[test]
    fn counts_by_severity() {
        let mut c = DiagnosticCollection::new();
        c.add_error(DiagnosticCode::TypeMismatch, "byte vs boolean");
        c.add_warning(DiagnosticCode::UnusedVariable, "unused `tmp`");
        c.add_warning(DiagnosticCode::UnreachableCode, "after return");
        assert!(c.has_errors());
        assert_eq!(c.error_count(), 1);
        assert_eq!(c.warning_count(), 2);
    }

    #[test]
    fn sort_orders_by_position_then_code() {
        let mut c = DiagnosticCollection::new();
        c.add(Diagnostic::with_default_message(DiagnosticCode::UnusedVariable).with_location(at(9, 2)));
        c.add(Diagnostic::with_default_message(DiagnosticCode::TypeMismatch).with_location(at(3, 7)));
        c.add(Diagnostic::with_default_message(DiagnosticCode::DuplicateDeclaration).with_location(at(3, 7)));
        c.sort();
        let codes: Vec<_> = c.iter().map(|d| d.code).collect();
        assert_eq!(
            codes,
            vec![
                DiagnosticCode::DuplicateDeclaration,
                DiagnosticCode::TypeMismatch,
                DiagnosticCode::UnusedVariable,
            ]
        );
    }
}
