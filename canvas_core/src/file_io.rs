//! # File I/O Module
//!
//! Project file operations:
//! - **Atomic saves**: write to `.lcv.tmp`, fsync, rename over the target
//! - **Version validation**: refuse files written by an incompatible schema
//! - **Parameter validation**: stored parameters are checked against the
//!   module schemas on load, so a loaded project always mounts cleanly
//!
//! ## Example
//!
//! ```rust,no_run
//! use canvas_core::file_io::{load_project, save_project};
//! use canvas_core::project::Project;
//! use std::path::Path;
//!
//! let project = Project::new("Engineer", "24-001");
//! let path = Path::new("myproject.lcv");
//!
//! save_project(&project, path)?;
//! let loaded = load_project(path)?;
//! assert_eq!(loaded.meta.job_id, "24-001");
//! # Ok::<(), canvas_core::errors::CanvasError>(())
//! ```

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use tracing::info;

use crate::errors::{CanvasError, CanvasResult};
use crate::params::validate_state;
use crate::project::{Project, PROJECT_EXTENSION, SCHEMA_VERSION};

/// Save a project to a file with atomic write semantics.
///
/// The save process:
/// 1. Serialize project to JSON
/// 2. Write to a temporary file (`.lcv.tmp`)
/// 3. Sync to disk (fsync)
/// 4. Rename the temporary file over `path`
///
/// An interrupted save leaves the previous file intact.
pub fn save_project(project: &Project, path: &Path) -> CanvasResult<()> {
    let json = serde_json::to_string_pretty(project)?;

    let tmp_path = path.with_extension(format!("{PROJECT_EXTENSION}.tmp"));

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        CanvasError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        CanvasError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        CanvasError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CanvasError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    info!(path = %path.display(), designs = project.designs.len(), "saved project");
    Ok(())
}

/// Load a project from a file.
///
/// # Errors
///
/// * `VersionMismatch` - file version is incompatible
/// * `SerializationError` - invalid JSON or unknown module id
/// * `InvalidParameter` / `UnknownParameter` - stored parameters do not fit
///   the module schema
/// * `FileError` - I/O error
pub fn load_project(path: &Path) -> CanvasResult<Project> {
    let mut file = File::open(path)
        .map_err(|e| CanvasError::file_error("open", path.display().to_string(), e.to_string()))?;

    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| CanvasError::file_error("read", path.display().to_string(), e.to_string()))?;

    let mut project: Project = serde_json::from_str(&contents).map_err(|e| CanvasError::SerializationError {
        reason: format!("Invalid JSON in {}: {}", path.display(), e),
    })?;

    validate_version(&project.meta.version)?;
    project.settings.validate()?;

    for (kind, state) in project.designs.iter_mut() {
        *state = validate_state(kind.id(), kind.parameters(), state)?;
    }

    info!(path = %path.display(), designs = project.designs.len(), "loaded project");
    Ok(project)
}

/// Validate that a file version is compatible with the current schema.
fn validate_version(file_version: &str) -> CanvasResult<()> {
    let mismatch = || CanvasError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let file_parts: Vec<u32> = file_version.split('.').filter_map(|p| p.parse().ok()).collect();
    let current_parts: Vec<u32> = SCHEMA_VERSION.split('.').filter_map(|p| p.parse().ok()).collect();

    let (Some(file_major), Some(current_major)) = (file_parts.first(), current_parts.first()) else {
        return Err(mismatch());
    };

    if file_major != current_major {
        return Err(mismatch());
    }

    // 0.x: a newer minor may carry breaking changes
    if *current_major == 0 {
        if let (Some(file_minor), Some(current_minor)) = (file_parts.get(1), current_parts.get(1)) {
            if file_minor > current_minor {
                return Err(mismatch());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ModuleParameterState, ParamValue};
    use crate::registry::ModuleKind;
    use tempfile::TempDir;

    fn project_path(dir: &TempDir, name: &str) -> std::path::PathBuf {
        dir.path().join(format!("{name}.lcv"))
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = project_path(&dir, "roundtrip");

        let mut project = Project::new("Test Engineer", "TEST-001");
        let mut column = ModuleParameterState::new();
        column.insert("width".into(), ParamValue::Number(400.0));
        project.designs.insert(ModuleKind::RectangleColumn, column);
        save_project(&project, &path).unwrap();

        let loaded = load_project(&path).unwrap();
        assert_eq!(loaded.meta.engineer, "Test Engineer");
        assert_eq!(loaded.meta.job_id, "TEST-001");
        assert_eq!(loaded.designs, project.designs);
    }

    #[test]
    fn test_atomic_save_creates_no_tmp_file() {
        let dir = TempDir::new().unwrap();
        let path = project_path(&dir, "atomic");
        let tmp_path = path.with_extension("lcv.tmp");

        save_project(&Project::new("Test", "TEST"), &path).unwrap();

        assert!(!tmp_path.exists());
        assert!(path.exists());
    }

    #[test]
    fn test_save_overwrites_existing() {
        let dir = TempDir::new().unwrap();
        let path = project_path(&dir, "overwrite");

        save_project(&Project::new("First", "A"), &path).unwrap();
        save_project(&Project::new("Second", "B"), &path).unwrap();
        assert_eq!(load_project(&path).unwrap().meta.engineer, "Second");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_project(&project_path(&dir, "missing")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }

    #[test]
    fn test_load_rejects_bad_parameters() {
        let dir = TempDir::new().unwrap();
        let path = project_path(&dir, "bad_params");

        let mut project = Project::new("Test", "TEST");
        let mut lintel = ModuleParameterState::new();
        lintel.insert("span".into(), ParamValue::Number(-10.0));
        project.designs.insert(ModuleKind::Lintel, lintel);
        save_project(&project, &path).unwrap();

        let err = load_project(&path).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
    }

    #[test]
    fn test_load_rejects_unknown_module() {
        let dir = TempDir::new().unwrap();
        let path = project_path(&dir, "unknown_module");
        let mut json = serde_json::to_value(Project::new("Test", "TEST")).unwrap();
        json["designs"] = serde_json::json!({ "gantry_crane": {} });
        fs::write(&path, json.to_string()).unwrap();

        let err = load_project(&path).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.0").is_ok());
        assert!(validate_version("0.1.5").is_ok());
        assert!(validate_version("0.0.9").is_ok());

        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("banana").is_err());
    }
}
