//! # Project Data Structures
//!
//! A `Project` stores everything needed to reopen a working session: who
//! the work is for, the shell settings, and the entered parameters of every
//! module that has any. Drawings are not stored; they are regenerated from
//! the parameters.
//!
//! Projects serialize to `.lcv` files as human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! Project
//! ├── meta: ProjectMetadata (version, engineer, job id, timestamps)
//! ├── settings: ShellSettings
//! └── designs: BTreeMap<ModuleKind, ModuleParameterState>
//! ```
//!
//! ## Example
//!
//! ```rust
//! use canvas_core::params::{ModuleParameterState, ParamValue};
//! use canvas_core::project::Project;
//! use canvas_core::registry::ModuleKind;
//!
//! let mut project = Project::new("Jane Engineer", "24-017");
//!
//! let mut lintel = ModuleParameterState::new();
//! lintel.insert("span".into(), ParamValue::Number(1500.0));
//! project.designs.insert(ModuleKind::Lintel, lintel);
//!
//! let json = serde_json::to_string_pretty(&project).unwrap();
//! assert!(json.contains("\"lintel\""));
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::params::ModuleParameterState;
use crate::registry::ModuleKind;
use crate::settings::ShellSettings;

/// Current schema version for .lcv files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// File extension for project files
pub const PROJECT_EXTENSION: &str = "lcv";

/// Root project container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub meta: ProjectMetadata,

    #[serde(default)]
    pub settings: ShellSettings,

    /// Entered parameters per module, keyed by module id
    #[serde(default)]
    pub designs: BTreeMap<ModuleKind, ModuleParameterState>,
}

impl Project {
    /// Create a new empty project.
    ///
    /// ```rust
    /// use canvas_core::project::Project;
    ///
    /// let project = Project::new("John Doe", "24-001");
    /// assert_eq!(project.meta.engineer, "John Doe");
    /// assert!(project.designs.is_empty());
    /// ```
    pub fn new(engineer: impl Into<String>, job_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Project {
            meta: ProjectMetadata {
                version: SCHEMA_VERSION.to_string(),
                engineer: engineer.into(),
                job_id: job_id.into(),
                created: now,
                modified: now,
            },
            settings: ShellSettings::default(),
            designs: BTreeMap::new(),
        }
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    /// Number of modules with stored parameters
    pub fn design_count(&self) -> usize {
        self.designs.len()
    }
}

impl Default for Project {
    fn default() -> Self {
        Project::new("", "")
    }
}

/// Project metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Schema version for compatibility checking
    pub version: String,

    pub engineer: String,

    /// Job number (e.g., "24-001")
    pub job_id: String,

    pub created: DateTime<Utc>,

    pub modified: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;

    #[test]
    fn test_new_project() {
        let project = Project::new("Test Engineer", "24-001");
        assert_eq!(project.meta.version, SCHEMA_VERSION);
        assert_eq!(project.meta.job_id, "24-001");
        assert_eq!(project.meta.created, project.meta.modified);
        assert_eq!(project.design_count(), 0);
    }

    #[test]
    fn test_designs_keyed_by_module_id() {
        let mut project = Project::new("Test", "T");
        let mut state = ModuleParameterState::new();
        state.insert("beam_type".into(), ParamValue::Text("L-Beam".into()));
        project.designs.insert(ModuleKind::TbeamLbeam, state);

        let json = serde_json::to_string(&project).unwrap();
        assert!(json.contains(r#""designs":{"tbeam_lbeam":{"beam_type":"L-Beam"}}"#));

        let back: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(back, project);
    }

    #[test]
    fn test_missing_sections_default() {
        let json = r#"{"meta":{"version":"0.1.0","engineer":"E","job_id":"J",
            "created":"2024-05-01T00:00:00Z","modified":"2024-05-01T00:00:00Z"}}"#;
        let project: Project = serde_json::from_str(json).unwrap();
        assert!(project.designs.is_empty());
        assert_eq!(project.settings, ShellSettings::default());
    }

    #[test]
    fn test_touch_advances_modified() {
        let mut project = Project::new("Test", "T");
        let created = project.meta.created;
        std::thread::sleep(std::time::Duration::from_millis(5));
        project.touch();
        assert!(project.meta.modified > created);
    }
}
