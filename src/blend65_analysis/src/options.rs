use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticCollection};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Requested optimization effort. `O0` disables everything.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptimizationLevel {
    #[default]
    O0,
    O1,
    O2,
    O3,
    Os,
    Oz,
}

impl OptimizationLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "O0" => Some(OptimizationLevel::O0),
            "O1" => Some(OptimizationLevel::O1),
            "O2" => Some(OptimizationLevel::O2),
            "O3" => Some(OptimizationLevel::O3),
            "Os" => Some(OptimizationLevel::Os),
            "Oz" => Some(OptimizationLevel::Oz),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OptimizationLevel::O0 => "O0",
            OptimizationLevel::O1 => "O1",
            OptimizationLevel::O2 => "O2",
            OptimizationLevel::O3 => "O3",
            OptimizationLevel::Os => "Os",
            OptimizationLevel::Oz => "Oz",
        }
    }
}

impl fmt::Display for OptimizationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebugMode {
    #[default]
    None,
    Inline,
    Vice,
    Both,
}

impl DebugMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(DebugMode::None),
            "inline" => Some(DebugMode::Inline),
            "vice" => Some(DebugMode::Vice),
            "both" => Some(DebugMode::Both),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    #[default]
    Asm,
    Prg,
    Both,
    Crt,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asm" => Some(OutputFormat::Asm),
            "prg" => Some(OutputFormat::Prg),
            "both" => Some(OutputFormat::Both),
            "crt" => Some(OutputFormat::Crt),
            _ => None,
        }
    }
}

const KNOWN_TARGETS: &[&str] = &["c64", "vic20", "c128", "plus4"];

/// Validated build configuration, as the CLI hands it to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileOptions {
    pub target: String,
    pub optimization: OptimizationLevel,
    pub debug: DebugMode,
    pub output_format: OutputFormat,
    pub run_advanced_analysis: bool,
    pub strict: bool,
    pub load_address: u16,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            target: "c64".into(),
            optimization: OptimizationLevel::O0,
            debug: DebugMode::None,
            output_format: OutputFormat::Asm,
            run_advanced_analysis: false,
            strict: false,
            load_address: 0x0801,
        }
    }
}

/// Unvalidated configuration, exactly as read from a config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCompileOptions {
    pub target: Option<String>,
    pub optimization: Option<String>,
    pub debug: Option<String>,
    pub output_format: Option<String>,
    pub run_advanced_analysis: Option<bool>,
    pub strict: Option<bool>,
    pub load_address: Option<u32>,
}

impl RawCompileOptions {
    /// Validate every field against its closed value set. Unknown values
    /// produce config diagnostics and fall back to the default.
    pub fn validate(&self) -> (CompileOptions, DiagnosticCollection) {
        let mut options = CompileOptions::default();
        let mut diagnostics = DiagnosticCollection::new();
        let mut invalid = |field: &str, value: &str| {
            diagnostics.add(Diagnostic::error(
                DiagnosticCode::InvalidOptionValue,
                format!("invalid value `{value}` for option `{field}`"),
            ));
        };
        if let Some(target) = &self.target {
            let lower = target.to_lowercase();
            if KNOWN_TARGETS.contains(&lower.as_str()) {
                options.target = lower;
            } else {
                invalid("target", target);
            }
        }
        if let Some(opt) = &self.optimization {
            match OptimizationLevel::parse(opt) {
                Some(level) => options.optimization = level,
                None => invalid("optimization", opt),
            }
        }
        if let Some(debug) = &self.debug {
            match DebugMode::parse(debug) {
                Some(mode) => options.debug = mode,
                None => invalid("debug", debug),
            }
        }
        if let Some(format) = &self.output_format {
            match OutputFormat::parse(format) {
                Some(f) => options.output_format = f,
                None => invalid("outputFormat", format),
            }
        }
        if let Some(run) = self.run_advanced_analysis {
            options.run_advanced_analysis = run;
        }
        if let Some(strict) = self.strict {
            options.strict = strict;
        }
        if let Some(addr) = self.load_address {
            match u16::try_from(addr) {
                Ok(addr) => options.load_address = addr,
                Err(_) => invalid("loadAddress", &addr.to_string()),
            }
        }
        (options, diagnostics)
    }
}

/// Knobs for the semantic analyzer itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub run_advanced_analysis: bool,
    /// Treat reads of module-scope variables as impure in the purity pass.
    pub strict_global_reads: bool,
    /// Suppress usage warnings for declared loop counters.
    pub ignore_loop_counters: bool,
    pub liveness_iteration_limit: u32,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            run_advanced_analysis: false,
            strict_global_reads: false,
            ignore_loop_counters: false,
            liveness_iteration_limit: 1000,
        }
    }
}

impl AnalysisOptions {
    pub fn with_advanced_analysis() -> Self {
        Self { run_advanced_analysis: true, ..Self::default() }
    }

    pub fn from_compile_options(options: &CompileOptions) -> Self {
        Self {
            run_advanced_analysis: options.run_advanced_analysis,
            strict_global_reads: options.strict,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_c64_o0_asm() {
        let (options, diagnostics) = RawCompileOptions::default().validate();
        assert!(diagnostics.is_empty());
        assert_eq!(options, CompileOptions::default());
        assert_eq!(options.load_address, 0x0801);
    }

    #[test]
    fn unknown_values_are_config_errors() {
        let raw = RawCompileOptions {
            target: Some("amiga".into()),
            optimization: Some("O9".into()),
            load_address: Some(0x1_0000),
            ..Default::default()
        };
        let (options, diagnostics) = raw.validate();
        assert_eq!(diagnostics.error_count(), 3);
        // Each bad field keeps its default.
        assert_eq!(options.target, "c64");
        assert_eq!(options.optimization, OptimizationLevel::O0);
    }

    #[test]
    fn target_lookup_is_case_insensitive() {
        let raw = RawCompileOptions { target: Some("C64".into()), ..Default::default() };
        let (options, diagnostics) = raw.validate();
        assert!(diagnostics.is_empty());
        assert_eq!(options.target, "c64");
    }
}
