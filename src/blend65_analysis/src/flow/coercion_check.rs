//! Tags every implicit-conversion site the type checker recorded with its
//! coercion kind and estimated cycle cost.

use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticCollection};
use crate::session::{AnalysisSession, CoercionSite};
use crate::types::{CoercionKind, TypeSystem};
use blend65_syntax::metadata::{MetadataValue, OptimizationMetadataKey};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoercionInfo {
    pub site: CoercionSite,
    pub kind: CoercionKind,
    pub cycle_cost: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoercionReport {
    pub coercions: Vec<CoercionInfo>,
    pub total_cycle_cost: u32,
}

pub fn analyze_session(session: &mut AnalysisSession) -> (CoercionReport, DiagnosticCollection) {
    let mut report = CoercionReport::default();
    let mut diagnostics = DiagnosticCollection::new();
    let sites = session.coercion_sites.clone();
    for site in sites {
        match TypeSystem::classify_coercion(&site.from, &site.to) {
            Some(kind) => {
                let cost = kind.cycle_cost();
                report.total_cycle_cost += u32::from(cost);
                if site.node.is_set() {
                    session.metadata.attach(
                        site.node,
                        OptimizationMetadataKey::CoercionKind,
                        MetadataValue::Text(kind.to_string()),
                    );
                    session.metadata.attach(
                        site.node,
                        OptimizationMetadataKey::CoercionCost,
                        MetadataValue::Int(i64::from(cost)),
                    );
                }
                report.coercions.push(CoercionInfo { site, kind, cycle_cost: cost });
            }
            None => {
                diagnostics.add(
                    Diagnostic::error(
                        DiagnosticCode::InvalidCoercion,
                        format!(
                            "no implicit conversion from `{}` to `{}`",
                            site.from.name, site.to.name
                        ),
                    )
                    .with_location(site.location.clone()),
                );
            }
        }
    }
    (report, diagnostics)
}
