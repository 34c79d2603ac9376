//! # Design Generators
//!
//! One submodule per registered module. Each follows the same pattern:
//!
//! - `PARAMETERS` - ordered parameter schema with defaults and ranges
//! - `*Input` - typed inputs read from a [`ParameterSet`](crate::params::ParameterSet)
//! - `*Input::validate()` - cross-field rules the schema cannot express
//! - `generate(params) -> CanvasResult<Design>` - drawing plus calculations
//!
//! The calculations are the simplified detailing checks a drafter expects to
//! see next to the drawing (IS 456 / IRC style), not a full code check.
//!
//! ## Available Modules
//!
//! - [`bridge`] - bridge general arrangement (elevation)
//! - [`rectangle_column`] - RC column cross section
//! - [`road_lsection`] - road longitudinal section
//! - [`road_plan`] - road plan alignment
//! - [`road_cross_section`] - road vertical profile with optional vertical curve
//! - [`pmgsy_road`] - PMGSY rural road typical cross section
//! - [`lintel`] - RC lintel over an opening
//! - [`sunshed`] - cantilever sunshade (chhajja) on a lintel beam
//! - [`tbeam_lbeam`] - flanged beam section
//! - [`staircase`] - waist-slab staircase flight

pub mod bridge;
pub mod lintel;
pub mod pmgsy_road;
pub mod rectangle_column;
pub mod road_cross_section;
pub mod road_lsection;
pub mod road_plan;
pub mod staircase;
pub mod sunshed;
pub mod tbeam_lbeam;

use serde::{Deserialize, Serialize};

use crate::drawing::Drawing;
use crate::errors::{CanvasError, CanvasResult};

/// Concrete grades offered by the structural modules
pub const CONCRETE_GRADES: &[&str] = &["M20", "M25", "M30", "M35", "M40"];

/// Reinforcement grades offered by the structural modules
pub const STEEL_GRADES: &[&str] = &["Fe415", "Fe500", "Fe550"];

/// Output of a design generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Design {
    pub drawing: Drawing,
    /// Key quantities, in display order
    pub summary: Vec<SummaryItem>,
    /// Pass/fail checks, in display order
    pub checks: Vec<DesignCheck>,
}

impl Design {
    pub fn new(drawing: Drawing) -> Self {
        Design {
            drawing,
            summary: Vec::new(),
            checks: Vec::new(),
        }
    }

    pub fn summary(mut self, label: impl Into<String>, value: f64, decimals: usize, unit: impl Into<String>) -> Self {
        self.summary.push(SummaryItem {
            label: label.into(),
            value,
            decimals,
            unit: unit.into(),
        });
        self
    }

    /// Add a check that passes when `actual <= limit`
    pub fn check_max(mut self, name: impl Into<String>, actual: f64, limit: f64, decimals: usize) -> Self {
        self.checks.push(DesignCheck {
            name: name.into(),
            actual: format!("{:.*}", decimals, actual),
            limit: format!("<= {:.*}", decimals, limit),
            passes: actual <= limit,
        });
        self
    }

    /// Add a check that passes when `actual >= limit`
    pub fn check_min(mut self, name: impl Into<String>, actual: f64, limit: f64, decimals: usize) -> Self {
        self.checks.push(DesignCheck {
            name: name.into(),
            actual: format!("{:.*}", decimals, actual),
            limit: format!(">= {:.*}", decimals, limit),
            passes: actual >= limit,
        });
        self
    }

    pub fn passes(&self) -> bool {
        self.checks.iter().all(|c| c.passes)
    }

    /// Look up a summary value by label
    pub fn value(&self, label: &str) -> Option<f64> {
        self.summary.iter().find(|s| s.label == label).map(|s| s.value)
    }
}

/// One reported quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryItem {
    pub label: String,
    pub value: f64,
    pub decimals: usize,
    pub unit: String,
}

impl SummaryItem {
    pub fn formatted(&self) -> String {
        format!("{:.*}", self.decimals, self.value)
    }
}

/// One pass/fail design check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignCheck {
    pub name: String,
    pub actual: String,
    pub limit: String,
    pub passes: bool,
}

impl DesignCheck {
    pub fn status(&self) -> &'static str {
        if self.passes {
            "OK"
        } else {
            "NG"
        }
    }
}

/// Characteristic strength in N/mm² from a grade label like `"M25"` or
/// `"Fe415"`.
pub(crate) fn grade_strength(module: &str, field: &str, grade: &str) -> CanvasResult<f64> {
    grade
        .trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .parse()
        .map_err(|_| CanvasError::invalid_parameter(module, field, grade, "unrecognized grade"))
}

/// Limiting neutral axis depth ratio xu,max/d for a steel grade (IS 456 38.1)
pub(crate) fn xu_max_ratio(fy: f64) -> f64 {
    if fy <= 250.0 {
        0.53
    } else if fy <= 415.0 {
        0.48
    } else {
        0.46
    }
}

/// Tension steel required for a singly reinforced rectangular section
/// (IS 456 Annex G), in mm². `mu` in N·mm, dimensions in mm.
///
/// Returns `None` when the section is too shallow for the moment.
pub(crate) fn required_steel(mu: f64, fck: f64, fy: f64, b: f64, d: f64) -> Option<f64> {
    let k = 4.6 * mu / (fck * b * d * d);
    if k >= 1.0 {
        return None;
    }
    Some(0.5 * fck / fy * (1.0 - (1.0 - k).sqrt()) * b * d)
}

/// Area of one bar of diameter `dia` mm
pub(crate) fn bar_area(dia: f64) -> f64 {
    std::f64::consts::PI * dia * dia / 4.0
}

/// Modification factor for tension reinforcement on the basic span/depth
/// ratio (IS 456 Fig. 4 in closed form), capped at 2.0. Areas in mm², `b`
/// and `d` in mm.
pub(crate) fn span_depth_modification(fy: f64, ast_required: f64, ast_provided: f64, b: f64, d: f64) -> f64 {
    let fs = 0.58 * fy * ast_required / ast_provided;
    let pt = 100.0 * ast_provided / (b * d);
    (1.0 / (0.225 + 0.003_22 * fs + 0.625 * pt.log10())).min(2.0)
}

/// Evenly spaced positions from `start` to `end` inclusive
pub(crate) fn spread(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![(start + end) / 2.0],
        n => (0..n)
            .map(|i| start + (end - start) * i as f64 / (n - 1) as f64)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::DrawingUnits;
    use crate::params::{ModuleParameterState, ParameterSet};
    use crate::registry::{ModuleKind, REGISTRY};
    use rstest::rstest;

    #[test]
    fn test_grade_strength() {
        assert_eq!(grade_strength("m", "fck", "M25").unwrap(), 25.0);
        assert_eq!(grade_strength("m", "fy", "Fe500").unwrap(), 500.0);
        assert!(grade_strength("m", "fy", "steel").is_err());
    }

    #[test]
    fn test_required_steel() {
        // 230 x 400 beam, 60 kNm, M20/Fe415
        let ast = required_steel(60e6, 20.0, 415.0, 230.0, 400.0).unwrap();
        assert!((ast - 464.0).abs() < 5.0, "got {}", ast);
        assert!(required_steel(500e6, 20.0, 415.0, 230.0, 400.0).is_none());
    }

    #[test]
    fn test_check_status() {
        let design = Design::new(Drawing::new("t", DrawingUnits::Millimetres))
            .check_max("Deflection", 8.0, 10.0, 1)
            .check_min("Cover", 20.0, 25.0, 0);
        assert_eq!(design.checks[0].status(), "OK");
        assert_eq!(design.checks[0].limit, "<= 10.0");
        assert_eq!(design.checks[1].status(), "NG");
        assert!(!design.passes());
    }

    #[test]
    fn test_spread() {
        assert_eq!(spread(0.0, 10.0, 3), vec![0.0, 5.0, 10.0]);
        assert_eq!(spread(0.0, 10.0, 1), vec![5.0]);
        assert!(spread(0.0, 10.0, 0).is_empty());
    }

    #[rstest]
    #[case(ModuleKind::Bridge)]
    #[case(ModuleKind::RectangleColumn)]
    #[case(ModuleKind::RoadLsection)]
    #[case(ModuleKind::RoadPlan)]
    #[case(ModuleKind::RoadCrossSection)]
    #[case(ModuleKind::PmgsyRoad)]
    #[case(ModuleKind::Lintel)]
    #[case(ModuleKind::Sunshed)]
    #[case(ModuleKind::TbeamLbeam)]
    #[case(ModuleKind::Staircase)]
    fn test_every_module_designs_from_defaults(#[case] kind: ModuleKind) {
        let state = ModuleParameterState::new();
        let descriptor = kind.descriptor();
        let params = ParameterSet::new(descriptor.id, descriptor.parameters, &state);
        let design = (descriptor.design)(&params).unwrap();

        assert!(!design.drawing.is_empty(), "{} drew nothing", kind);
        assert!(!design.summary.is_empty(), "{} has no summary", kind);
        let extents = design.drawing.extents();
        assert!(extents.width() > 0.0 && extents.height() > 0.0);
        for item in &design.summary {
            assert!(item.value.is_finite(), "{}: {} is not finite", kind, item.label);
        }
    }

    #[test]
    fn test_defaults_are_within_their_own_ranges() {
        for descriptor in &REGISTRY {
            for spec in descriptor.parameters {
                spec.check(descriptor.id, &spec.default_value())
                    .unwrap_or_else(|e| panic!("{}: {}", descriptor.id, e));
            }
        }
    }
}
