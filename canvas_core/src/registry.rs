//! # Module Registry
//!
//! The fixed, process-wide list of design modules shown in the navigation
//! sidebar. Order matters: the sidebar lists entries exactly as they appear
//! in [`REGISTRY`].
//!
//! Each [`ModuleDescriptor`] ties a stable string id and a display name to a
//! [`ModuleKind`], together with the module's parameter schema and its design
//! generator. The shell never constructs modules any other way.
//!
//! ## Example
//!
//! ```rust
//! use canvas_core::registry::{lookup, ModuleKind};
//!
//! let sunshed = lookup("sunshed").unwrap();
//! assert_eq!(sunshed.kind, ModuleKind::Sunshed);
//! assert_eq!(sunshed.display_name, "Sunshed");
//! assert!(lookup("nonexistent_id").is_none());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::designs::{self, Design};
use crate::errors::{CanvasError, CanvasResult};
use crate::params::{ParameterSet, ParameterSpec};
use crate::session::ModuleSession;

/// Signature shared by every design generator.
pub type DesignFn = fn(&ParameterSet<'_>) -> CanvasResult<Design>;

/// The closed set of design modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    Bridge,
    RectangleColumn,
    RoadLsection,
    RoadPlan,
    RoadCrossSection,
    PmgsyRoad,
    Lintel,
    Sunshed,
    TbeamLbeam,
    Staircase,
}

impl ModuleKind {
    /// All kinds, in navigation order.
    pub const ALL: [ModuleKind; 10] = [
        ModuleKind::Bridge,
        ModuleKind::RectangleColumn,
        ModuleKind::RoadLsection,
        ModuleKind::RoadPlan,
        ModuleKind::RoadCrossSection,
        ModuleKind::PmgsyRoad,
        ModuleKind::Lintel,
        ModuleKind::Sunshed,
        ModuleKind::TbeamLbeam,
        ModuleKind::Staircase,
    ];

    /// Registry entry for this kind
    pub fn descriptor(self) -> &'static ModuleDescriptor {
        &REGISTRY[self as usize]
    }

    /// Stable identifier used for navigation, files and the CLI
    pub fn id(self) -> &'static str {
        self.descriptor().id
    }

    /// Human-readable name shown in the sidebar
    pub fn display_name(self) -> &'static str {
        self.descriptor().display_name
    }

    /// Parameter schema of this module
    pub fn parameters(self) -> &'static [ParameterSpec] {
        self.descriptor().parameters
    }

    /// Create a fresh, empty session for this module.
    pub fn mount(self) -> ModuleSession {
        ModuleSession::new(self)
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ModuleKind {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(s)
            .map(|d| d.kind)
            .ok_or_else(|| CanvasError::unknown_module(s))
    }
}

/// One navigable module: identity plus the functions that drive it.
#[derive(Debug, Clone, Copy)]
pub struct ModuleDescriptor {
    /// Unique, stable id (e.g. `"road_plan"`)
    pub id: &'static str,
    /// Sidebar label (e.g. `"Road Plan"`)
    pub display_name: &'static str,
    pub kind: ModuleKind,
    /// Ordered parameter schema
    pub parameters: &'static [ParameterSpec],
    /// Turns resolved parameters into a drawing plus calculations
    pub design: DesignFn,
}

impl ModuleDescriptor {
    /// Find a parameter spec by name
    pub fn parameter(&self, name: &str) -> Option<&'static ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Every registered module, in sidebar order.
pub static REGISTRY: [ModuleDescriptor; 10] = [
    ModuleDescriptor {
        id: "bridge",
        display_name: "Bridge Design",
        kind: ModuleKind::Bridge,
        parameters: designs::bridge::PARAMETERS,
        design: designs::bridge::generate,
    },
    ModuleDescriptor {
        id: "rectangle_column",
        display_name: "Rectangle Column",
        kind: ModuleKind::RectangleColumn,
        parameters: designs::rectangle_column::PARAMETERS,
        design: designs::rectangle_column::generate,
    },
    ModuleDescriptor {
        id: "road_lsection",
        display_name: "Road L-Section",
        kind: ModuleKind::RoadLsection,
        parameters: designs::road_lsection::PARAMETERS,
        design: designs::road_lsection::generate,
    },
    ModuleDescriptor {
        id: "road_plan",
        display_name: "Road Plan",
        kind: ModuleKind::RoadPlan,
        parameters: designs::road_plan::PARAMETERS,
        design: designs::road_plan::generate,
    },
    ModuleDescriptor {
        id: "road_cross_section",
        display_name: "Road Cross Section",
        kind: ModuleKind::RoadCrossSection,
        parameters: designs::road_cross_section::PARAMETERS,
        design: designs::road_cross_section::generate,
    },
    ModuleDescriptor {
        id: "pmgsy_road",
        display_name: "PMGSY Road",
        kind: ModuleKind::PmgsyRoad,
        parameters: designs::pmgsy_road::PARAMETERS,
        design: designs::pmgsy_road::generate,
    },
    ModuleDescriptor {
        id: "lintel",
        display_name: "Lintel",
        kind: ModuleKind::Lintel,
        parameters: designs::lintel::PARAMETERS,
        design: designs::lintel::generate,
    },
    ModuleDescriptor {
        id: "sunshed",
        display_name: "Sunshed",
        kind: ModuleKind::Sunshed,
        parameters: designs::sunshed::PARAMETERS,
        design: designs::sunshed::generate,
    },
    ModuleDescriptor {
        id: "tbeam_lbeam",
        display_name: "T-Beam/L-Beam",
        kind: ModuleKind::TbeamLbeam,
        parameters: designs::tbeam_lbeam::PARAMETERS,
        design: designs::tbeam_lbeam::generate,
    },
    ModuleDescriptor {
        id: "staircase",
        display_name: "Staircase",
        kind: ModuleKind::Staircase,
        parameters: designs::staircase::PARAMETERS,
        design: designs::staircase::generate,
    },
];

/// Look up a module by id. Returns `None` for unregistered ids.
pub fn lookup(id: &str) -> Option<&'static ModuleDescriptor> {
    REGISTRY.iter().find(|d| d.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_order_matches_kinds() {
        for (descriptor, kind) in REGISTRY.iter().zip(ModuleKind::ALL) {
            assert_eq!(descriptor.kind, kind);
            assert_eq!(kind.descriptor().id, descriptor.id);
        }
    }

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<_> = REGISTRY.iter().map(|d| d.id).collect();
        assert_eq!(ids.len(), REGISTRY.len());
    }

    #[test]
    fn test_navigation_order() {
        let ids: Vec<_> = REGISTRY.iter().map(|d| d.id).collect();
        assert_eq!(
            ids,
            [
                "bridge",
                "rectangle_column",
                "road_lsection",
                "road_plan",
                "road_cross_section",
                "pmgsy_road",
                "lintel",
                "sunshed",
                "tbeam_lbeam",
                "staircase",
            ]
        );
    }

    #[test]
    fn test_lookup_unknown_id() {
        assert!(lookup("nonexistent_id").is_none());
        assert!(lookup("").is_none());
        assert!(lookup("Bridge").is_none());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("tbeam_lbeam".parse::<ModuleKind>().unwrap(), ModuleKind::TbeamLbeam);
        let err = "tower".parse::<ModuleKind>().unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_MODULE");
    }

    #[test]
    fn test_serde_id_matches_registry_id() {
        for kind in ModuleKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.id()));
        }
    }

    #[test]
    fn test_every_module_has_parameters() {
        for descriptor in &REGISTRY {
            assert!(!descriptor.parameters.is_empty(), "{} has no schema", descriptor.id);
            let names: HashSet<_> = descriptor.parameters.iter().map(|p| p.name).collect();
            assert_eq!(names.len(), descriptor.parameters.len(), "{} has duplicate names", descriptor.id);
        }
    }
}
