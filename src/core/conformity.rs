//! Conformity evaluator - compares computed errors against tolerance limits

use serde::Serialize;
use std::fmt;

use crate::core::instrument::InstrumentClass;
use crate::core::tolerance::{profile, ErrorKind, LimitTable};

/// Outcome of a tolerance check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Conformity {
    Conform,
    NonConform,
    /// No applicable limit; neither a pass nor a fail
    Unevaluable,
}

impl fmt::Display for Conformity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conformity::Conform => write!(f, "conform"),
            Conformity::NonConform => write!(f, "non-conform"),
            Conformity::Unevaluable => write!(f, "unevaluable"),
        }
    }
}

/// Verdict for one error of one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToleranceVerdict {
    pub kind: ErrorKind,
    pub conformity: Conformity,

    /// Governing standard
    pub standard: &'static str,

    /// Applied limit (percent for piston classes, native volume unit for glassware)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<f64>,

    /// Human-readable explanation for tooltips and reports
    pub explanation: String,
}

impl ToleranceVerdict {
    /// `Some(conform)` when evaluable
    pub fn is_conform(&self) -> Option<bool> {
        match self.conformity {
            Conformity::Conform => Some(true),
            Conformity::NonConform => Some(false),
            Conformity::Unevaluable => None,
        }
    }

    fn unevaluable(kind: ErrorKind, standard: &'static str, explanation: String) -> Self {
        Self {
            kind,
            conformity: Conformity::Unevaluable,
            standard,
            limit: None,
            explanation,
        }
    }
}

/// Judge `error` for `class` at the given nominal and tested volumes
///
/// Volumes and absolute errors are in the class's native unit; piston errors
/// are in percent. Only the magnitude of `error` is compared.
pub fn evaluate(
    class: InstrumentClass,
    kind: ErrorKind,
    nominal: f64,
    tested: f64,
    error: f64,
) -> ToleranceVerdict {
    let profile = profile(class);
    let standard = profile.standard;
    let unit = class.native_unit();

    let (limit, suffix) = match profile.table(kind) {
        LimitTable::Relative(table) => {
            if tested.is_nan() || tested <= 0.0 {
                return ToleranceVerdict::unevaluable(
                    kind,
                    standard,
                    format!(
                        "tested volume is {} {}; the {} limit cannot be scaled",
                        tested, unit, kind
                    ),
                );
            }
            (nominal / tested * table.lookup(nominal), "%".to_string())
        }
        LimitTable::Absolute(table) => match table.lookup(nominal) {
            Some(limit) => (limit, format!(" {}", unit)),
            None => {
                return ToleranceVerdict::unevaluable(
                    kind,
                    standard,
                    format!(
                        "{} lists no {} {} size (listed: {}); {} error not evaluated",
                        standard,
                        nominal,
                        unit,
                        table
                            .sizes()
                            .map(|size| size.to_string())
                            .collect::<Vec<_>>()
                            .join(", "),
                        kind
                    ),
                )
            }
        },
        LimitTable::Unspecified => {
            return ToleranceVerdict::unevaluable(
                kind,
                standard,
                format!("{} defines no {} error limit", standard, kind),
            )
        }
    };

    let conform = error.abs() <= limit;
    let (conformity, relation) = if conform {
        (Conformity::Conform, "≤")
    } else {
        (Conformity::NonConform, ">")
    };

    ToleranceVerdict {
        kind,
        conformity,
        standard,
        limit: Some(limit),
        explanation: format!(
            "|{} error| {:.3}{} {} {:.3}{} ({}, V_nom {} {})",
            kind,
            error.abs(),
            suffix,
            relation,
            limit,
            suffix,
            standard,
            nominal,
            unit
        ),
    }
}
