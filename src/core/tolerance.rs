//! Tolerance tables - maximum permissible errors per instrument class
//!
//! Piston instruments use step tables: strict `>` thresholds on the nominal
//! volume, ordered descending, first match wins, otherwise the floor value.
//! Limits are in percent and are scaled by `V_nom / V_tested` at evaluation.
//!
//! Glassware uses size tables: the nominal volume must equal one of the
//! standard's enumerated sizes. Limits are absolute, in mL.
//!
//! Thresholds and sizes are in the class's native unit (µL for piston
//! pipettes, mL otherwise).

use serde::Serialize;
use std::fmt;

use crate::core::instrument::InstrumentClass;

/// Which error a limit applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Systematic,
    Random,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Systematic => write!(f, "systematic"),
            ErrorKind::Random => write!(f, "random"),
        }
    }
}

/// Descending strict-threshold step function
#[derive(Debug)]
pub struct StepTable {
    /// (threshold, limit) pairs, thresholds descending
    pub steps: &'static [(f64, f64)],
    /// Limit when no threshold is exceeded
    pub floor: f64,
}

impl StepTable {
    pub fn lookup(&self, nominal: f64) -> f64 {
        self.steps
            .iter()
            .find(|(threshold, _)| nominal > *threshold)
            .map_or(self.floor, |(_, limit)| *limit)
    }
}

/// Enumerated standard sizes with their absolute limits
#[derive(Debug)]
pub struct SizeTable {
    /// (nominal size, limit) pairs
    pub sizes: &'static [(f64, f64)],
}

impl SizeTable {
    /// Limit for an exactly matching size
    pub fn lookup(&self, nominal: f64) -> Option<f64> {
        self.sizes
            .iter()
            .find(|(size, _)| (size - nominal).abs() <= f64::EPSILON * size.max(1.0))
            .map(|(_, limit)| *limit)
    }

    pub fn sizes(&self) -> impl Iterator<Item = f64> + '_ {
        self.sizes.iter().map(|(size, _)| *size)
    }
}

/// A limit table for one class and error kind
#[derive(Debug)]
pub enum LimitTable {
    /// Percent limits, scaled to the tested volume
    Relative(StepTable),
    /// Absolute limits for enumerated sizes
    Absolute(SizeTable),
    /// The standard defines no limit
    Unspecified,
}

/// Everything needed to judge one instrument class
#[derive(Debug)]
pub struct ToleranceProfile {
    /// Governing standard
    pub standard: &'static str,
    pub systematic: LimitTable,
    pub random: LimitTable,
}

impl ToleranceProfile {
    pub fn table(&self, kind: ErrorKind) -> &LimitTable {
        match kind {
            ErrorKind::Systematic => &self.systematic,
            ErrorKind::Random => &self.random,
        }
    }
}

// ISO 8655-2:2022, single-channel air displacement (type A) and D1
static MSA: ToleranceProfile = ToleranceProfile {
    standard: "ISO 8655-2:2022",
    systematic: LimitTable::Relative(StepTable {
        steps: &[(5000.0, 0.6), (50.0, 0.8), (10.0, 1.0), (5.0, 1.2), (3.0, 2.5)],
        floor: 2.5,
    }),
    random: LimitTable::Relative(StepTable {
        steps: &[(5000.0, 0.3), (50.0, 0.3), (10.0, 0.5), (5.0, 0.8), (3.0, 1.5)],
        floor: 2.0,
    }),
};

// ISO 8655-2:2022, multichannel: twice the single-channel limits
static MMC: ToleranceProfile = ToleranceProfile {
    standard: "ISO 8655-2:2022",
    systematic: LimitTable::Relative(StepTable {
        steps: &[(5000.0, 1.2), (50.0, 1.6), (10.0, 2.0), (5.0, 2.4), (3.0, 5.0)],
        floor: 5.0,
    }),
    random: LimitTable::Relative(StepTable {
        steps: &[(5000.0, 0.6), (50.0, 0.6), (10.0, 1.0), (5.0, 1.6), (3.0, 3.0)],
        floor: 4.0,
    }),
};

// ISO 8655-2:2022, positive displacement type D2
static MSD: ToleranceProfile = ToleranceProfile {
    standard: "ISO 8655-2:2022",
    systematic: LimitTable::Relative(StepTable {
        steps: &[(200.0, 1.2), (50.0, 1.5), (20.0, 1.4), (5.0, 2.0)],
        floor: 2.5,
    }),
    random: LimitTable::Relative(StepTable {
        steps: &[(200.0, 0.4), (20.0, 0.6), (10.0, 0.8), (5.0, 1.0)],
        floor: 1.5,
    }),
};

// ISO 8655-3:2022 piston burettes, in mL
static BURETTE_DIGITAL: ToleranceProfile = ToleranceProfile {
    standard: "ISO 8655-3:2022",
    systematic: LimitTable::Relative(StepTable {
        steps: &[(10.0, 0.2), (2.0, 0.3), (1.0, 0.5)],
        floor: 0.6,
    }),
    random: LimitTable::Relative(StepTable {
        steps: &[(2.0, 0.1)],
        floor: 0.2,
    }),
};

// ISO 8655-5:2022 dispensers, in mL
static DISPENSER: ToleranceProfile = ToleranceProfile {
    standard: "ISO 8655-5:2022",
    systematic: LimitTable::Relative(StepTable {
        steps: &[(1.0, 0.5), (0.1, 0.6), (0.01, 1.0)],
        floor: 1.0,
    }),
    random: LimitTable::Relative(StepTable {
        steps: &[(1.0, 0.1), (0.1, 0.2), (0.01, 0.5)],
        floor: 1.0,
    }),
};

// ISO 1042:1998 one-mark volumetric flasks, class A
static FLASK: ToleranceProfile = ToleranceProfile {
    standard: "ISO 1042:1998",
    systematic: LimitTable::Absolute(SizeTable {
        sizes: &[
            (1.0, 0.025),
            (2.0, 0.025),
            (5.0, 0.025),
            (10.0, 0.025),
            (20.0, 0.04),
            (25.0, 0.04),
            (50.0, 0.06),
            (100.0, 0.10),
            (200.0, 0.15),
            (250.0, 0.15),
            (500.0, 0.25),
            (1000.0, 0.40),
            (2000.0, 0.60),
            (5000.0, 1.2),
        ],
    }),
    random: LimitTable::Unspecified,
};

// ISO 1042:1998 wide-neck flasks
static FLASK_WIDE: ToleranceProfile = ToleranceProfile {
    standard: "ISO 1042:1998",
    systematic: LimitTable::Absolute(SizeTable {
        sizes: &[
            (100.0, 0.20),
            (200.0, 0.30),
            (250.0, 0.30),
            (500.0, 0.50),
            (1000.0, 0.80),
            (2000.0, 1.2),
        ],
    }),
    random: LimitTable::Unspecified,
};

// ISO 385:2005 burettes, class A
static BURETTE: ToleranceProfile = ToleranceProfile {
    standard: "ISO 385:2005",
    systematic: LimitTable::Absolute(SizeTable {
        sizes: &[
            (1.0, 0.006),
            (2.0, 0.01),
            (5.0, 0.01),
            (10.0, 0.02),
            (25.0, 0.03),
            (50.0, 0.05),
            (100.0, 0.10),
        ],
    }),
    random: LimitTable::Unspecified,
};

// ISO 835:2007 graduated pipettes, class A
static PIPETTE_GRADUATED: ToleranceProfile = ToleranceProfile {
    standard: "ISO 835:2007",
    systematic: LimitTable::Absolute(SizeTable {
        sizes: &[
            (0.5, 0.005),
            (1.0, 0.006),
            (2.0, 0.01),
            (5.0, 0.03),
            (10.0, 0.05),
            (20.0, 0.10),
            (25.0, 0.10),
        ],
    }),
    random: LimitTable::Unspecified,
};

// ISO 648:2008 one-mark pipettes, class A
static PIPETTE_VOLUMETRIC: ToleranceProfile = ToleranceProfile {
    standard: "ISO 648:2008",
    systematic: LimitTable::Absolute(SizeTable {
        sizes: &[
            (0.5, 0.005),
            (1.0, 0.008),
            (2.0, 0.01),
            (3.0, 0.01),
            (4.0, 0.015),
            (5.0, 0.015),
            (10.0, 0.02),
            (15.0, 0.03),
            (20.0, 0.03),
            (25.0, 0.03),
            (50.0, 0.05),
            (100.0, 0.08),
            (200.0, 0.10),
        ],
    }),
    random: LimitTable::Unspecified,
};

/// Tolerance profile governing `class`
pub fn profile(class: InstrumentClass) -> &'static ToleranceProfile {
    match class {
        InstrumentClass::Bv => &FLASK,
        InstrumentClass::Bvl => &FLASK_WIDE,
        InstrumentClass::Bu => &BURETTE,
        InstrumentClass::Bdm | InstrumentClass::Bda => &BURETTE_DIGITAL,
        InstrumentClass::Dis => &DISPENSER,
        InstrumentClass::Msa => &MSA,
        InstrumentClass::Msd => &MSD,
        InstrumentClass::Mmc => &MMC,
        InstrumentClass::Pg => &PIPETTE_GRADUATED,
        InstrumentClass::Pv => &PIPETTE_VOLUMETRIC,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::instrument::Family;

    fn step(class: InstrumentClass, kind: ErrorKind) -> &'static StepTable {
        match profile(class).table(kind) {
            LimitTable::Relative(table) => table,
            other => panic!("expected step table, got {:?}", other),
        }
    }

    fn size(class: InstrumentClass) -> &'static SizeTable {
        match profile(class).table(ErrorKind::Systematic) {
            LimitTable::Absolute(table) => table,
            other => panic!("expected size table, got {:?}", other),
        }
    }

    #[test]
    fn test_msa_steps() {
        let sys = step(InstrumentClass::Msa, ErrorKind::Systematic);
        assert_eq!(sys.lookup(10000.0), 0.6);
        assert_eq!(sys.lookup(1000.0), 0.8);
        assert_eq!(sys.lookup(20.0), 1.0);
        assert_eq!(sys.lookup(10.0), 1.2);
        assert_eq!(sys.lookup(4.0), 2.5);
        assert_eq!(sys.lookup(1.0), 2.5);

        let rnd = step(InstrumentClass::Msa, ErrorKind::Random);
        assert_eq!(rnd.lookup(1000.0), 0.3);
        assert_eq!(rnd.lookup(2.0), 2.0);
    }

    #[test]
    fn test_step_boundary_falls_to_lower_bucket() {
        // 50 is not > 50, so the "> 10" bucket applies
        let sys = step(InstrumentClass::Msa, ErrorKind::Systematic);
        assert_eq!(sys.lookup(50.0), 1.0);
        assert_eq!(sys.lookup(50.000001), 0.8);
        assert_eq!(sys.lookup(5000.0), 0.8);
    }

    #[test]
    fn test_multichannel_doubles_single_channel() {
        for kind in [ErrorKind::Systematic, ErrorKind::Random] {
            let single = step(InstrumentClass::Msa, kind);
            let multi = step(InstrumentClass::Mmc, kind);
            for v in [1.0, 4.0, 8.0, 20.0, 100.0, 10000.0] {
                assert_eq!(multi.lookup(v), 2.0 * single.lookup(v), "{} at {}", kind, v);
            }
        }
    }

    #[test]
    fn test_digital_burettes_share_table() {
        assert_eq!(
            profile(InstrumentClass::Bda).standard,
            profile(InstrumentClass::Bdm).standard
        );
        let sys = step(InstrumentClass::Bda, ErrorKind::Systematic);
        assert_eq!(sys.lookup(50.0), 0.2);
        assert_eq!(sys.lookup(10.0), 0.3);
        assert_eq!(sys.lookup(1.0), 0.6);
    }

    #[test]
    fn test_flask_sizes_exact_match() {
        let bv = size(InstrumentClass::Bv);
        assert_eq!(bv.lookup(1000.0), Some(0.40));
        assert_eq!(bv.lookup(50.0), Some(0.06));
        assert_eq!(bv.lookup(37.0), None);
        assert_eq!(bv.lookup(1000.5), None);
    }

    #[test]
    fn test_pipette_sizes() {
        assert_eq!(size(InstrumentClass::Pv).lookup(25.0), Some(0.03));
        assert_eq!(size(InstrumentClass::Pg).lookup(0.5), Some(0.005));
        assert_eq!(size(InstrumentClass::Bu).lookup(50.0), Some(0.05));
    }

    #[test]
    fn test_step_tables_are_descending_and_non_negative() {
        for class in InstrumentClass::ALL {
            for kind in [ErrorKind::Systematic, ErrorKind::Random] {
                if let LimitTable::Relative(table) = profile(class).table(kind) {
                    assert!(table.floor >= 0.0);
                    for pair in table.steps.windows(2) {
                        assert!(pair[0].0 > pair[1].0, "{} {} not descending", class, kind);
                    }
                    assert!(table.steps.iter().all(|(_, l)| *l >= 0.0));
                }
            }
        }
    }

    #[test]
    fn test_table_shape_matches_family() {
        for class in InstrumentClass::ALL {
            let p = profile(class);
            match class.family() {
                Family::Piston => {
                    assert!(matches!(p.systematic, LimitTable::Relative(_)));
                    assert!(matches!(p.random, LimitTable::Relative(_)));
                }
                Family::Glassware => {
                    assert!(matches!(p.systematic, LimitTable::Absolute(_)));
                    assert!(matches!(p.random, LimitTable::Unspecified));
                }
            }
        }
    }
}
