//! # Module Sessions
//!
//! A [`ModuleSession`] is one mounted module: its parameter state, the last
//! design it drew, and an edit history. The lifecycle is
//!
//! ```text
//!            edit                render
//!   Empty ---------> Entered ----------> Drawn
//!     ^                 ^   <----------    |
//!     |                 |      edit        |
//!     +------ clear ----+------------------+
//! ```
//!
//! The phase is derived from the data rather than stored: a session with a
//! design is `Drawn`, one with any entered parameter is `ParametersEntered`,
//! otherwise it is `Empty`. Any edit drops the design, so a stale drawing is
//! never shown or exported.
//!
//! Exports render on demand from `ParametersEntered` and refuse to run from
//! `Empty` with [`CanvasError::NothingToExport`].
//!
//! ## Example
//!
//! ```rust
//! use canvas_core::registry::ModuleKind;
//! use canvas_core::session::ModulePhase;
//!
//! let mut session = ModuleKind::RectangleColumn.mount();
//! assert_eq!(session.phase(), ModulePhase::Empty);
//!
//! session.set_parameter("width", "350").unwrap();
//! assert_eq!(session.phase(), ModulePhase::ParametersEntered);
//!
//! session.render().unwrap();
//! assert_eq!(session.phase(), ModulePhase::Drawn);
//!
//! session.clear();
//! assert_eq!(session.phase(), ModulePhase::Empty);
//! ```

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::designs::Design;
use crate::dxf::write_dxf;
use crate::errors::{CanvasError, CanvasResult};
use crate::params::{defaults, validate_state, ModuleParameterState, ParamValue, ParameterSet, ResolvedParameter};
use crate::pdf::{render_report, Report};
use crate::registry::{ModuleDescriptor, ModuleKind};
use crate::settings::{CanvasSettings, DxfSettings, ReportSettings};
use crate::svg::render_svg;

/// Maximum number of undo levels kept per session
pub const MAX_UNDO: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModulePhase {
    Empty,
    ParametersEntered,
    Drawn,
}

impl ModulePhase {
    pub fn label(self) -> &'static str {
        match self {
            ModulePhase::Empty => "No parameters",
            ModulePhase::ParametersEntered => "Parameters entered",
            ModulePhase::Drawn => "Drawn",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModuleSession {
    kind: ModuleKind,
    parameters: ModuleParameterState,
    design: Option<Design>,
    last_error: Option<CanvasError>,
    undo: VecDeque<ModuleParameterState>,
    redo: Vec<ModuleParameterState>,
}

impl ModuleSession {
    /// An empty session; prefer [`ModuleKind::mount`].
    pub fn new(kind: ModuleKind) -> Self {
        debug!(module = kind.id(), "mounted module");
        ModuleSession {
            kind,
            parameters: ModuleParameterState::new(),
            design: None,
            last_error: None,
            undo: VecDeque::new(),
            redo: Vec::new(),
        }
    }

    /// A session restored from stored parameters (project files, CLI
    /// `--params`). Values are validated and canonicalized.
    pub fn with_parameters(kind: ModuleKind, parameters: &ModuleParameterState) -> CanvasResult<Self> {
        let parameters = validate_state(kind.id(), kind.parameters(), parameters)?;
        let mut session = Self::new(kind);
        session.parameters = parameters;
        Ok(session)
    }

    pub fn kind(&self) -> ModuleKind {
        self.kind
    }

    pub fn descriptor(&self) -> &'static ModuleDescriptor {
        self.kind.descriptor()
    }

    /// Parameters entered so far (not including schema defaults)
    pub fn parameters(&self) -> &ModuleParameterState {
        &self.parameters
    }

    pub fn phase(&self) -> ModulePhase {
        if self.design.is_some() {
            ModulePhase::Drawn
        } else if self.parameters.is_empty() {
            ModulePhase::Empty
        } else {
            ModulePhase::ParametersEntered
        }
    }

    pub fn design(&self) -> Option<&Design> {
        self.design.as_ref()
    }

    /// Error from the most recent failed operation, cleared by the next
    /// successful one
    pub fn last_error(&self) -> Option<&CanvasError> {
        self.last_error.as_ref()
    }

    /// Every schema parameter with its effective value
    pub fn resolved(&self) -> Vec<ResolvedParameter> {
        self.parameter_set().resolved()
    }

    fn parameter_set(&self) -> ParameterSet<'_> {
        let descriptor = self.descriptor();
        ParameterSet::new(descriptor.id, descriptor.parameters, &self.parameters)
    }

    fn record<T>(&mut self, result: CanvasResult<T>) -> CanvasResult<T> {
        match &result {
            Ok(_) => self.last_error = None,
            Err(e) => self.last_error = Some(e.clone()),
        }
        result
    }

    /// Replace the parameter state, saving the old one for undo.
    fn commit(&mut self, next: ModuleParameterState) {
        let previous = std::mem::replace(&mut self.parameters, next);
        if self.undo.len() == MAX_UNDO {
            self.undo.pop_front();
        }
        self.undo.push_back(previous);
        self.redo.clear();
        self.design = None;
    }

    /// Parse and store one parameter from form text.
    ///
    /// # Errors
    ///
    /// - `UnknownParameter` if `name` is not in the module schema
    /// - `InvalidParameter` if the text does not parse or is out of range
    ///
    /// The parameter state is unchanged on error.
    pub fn set_parameter(&mut self, name: &str, raw: &str) -> CanvasResult<()> {
        let module = self.kind.id();
        let parsed = self
            .descriptor()
            .parameter(name)
            .ok_or_else(|| CanvasError::unknown_parameter(module, name))
            .and_then(|spec| spec.parse(module, raw));
        let value = self.record(parsed)?;
        self.store(name, value);
        Ok(())
    }

    /// Store an already-typed value (pick lists, checkboxes).
    pub fn set_value(&mut self, name: &str, value: ParamValue) -> CanvasResult<()> {
        let module = self.kind.id();
        let checked = self
            .descriptor()
            .parameter(name)
            .ok_or_else(|| CanvasError::unknown_parameter(module, name))
            .and_then(|spec| spec.check(module, &value));
        let value = self.record(checked)?;
        self.store(name, value);
        Ok(())
    }

    fn store(&mut self, name: &str, value: ParamValue) {
        if self.parameters.get(name) == Some(&value) {
            return;
        }
        let mut next = self.parameters.clone();
        next.insert(name.to_string(), value);
        self.commit(next);
        debug!(module = self.kind.id(), parameter = name, "parameter set");
    }

    /// Forget an entered value so the schema default applies again.
    pub fn reset_parameter(&mut self, name: &str) {
        if self.parameters.contains_key(name) {
            let mut next = self.parameters.clone();
            next.remove(name);
            self.commit(next);
        }
    }

    /// Fill every parameter with its schema default.
    pub fn load_defaults(&mut self) {
        let next = defaults(self.kind.parameters());
        if next != self.parameters {
            self.commit(next);
        }
        self.last_error = None;
        debug!(module = self.kind.id(), "loaded defaults");
    }

    /// Run the design generator and keep its result.
    ///
    /// # Errors
    ///
    /// - `NothingToExport` from `Empty`
    /// - `InvalidParameter` for cross-field violations
    /// - `RenderFailed` when the design cannot be produced
    ///
    /// A failed render leaves the session in `ParametersEntered`.
    pub fn render(&mut self) -> CanvasResult<&Design> {
        let outcome = if self.parameters.is_empty() {
            Err(CanvasError::nothing_to_export(self.kind.id()))
        } else {
            (self.descriptor().design)(&self.parameter_set())
        };
        match self.record(outcome) {
            Ok(design) => {
                debug!(
                    module = self.kind.id(),
                    entities = design.drawing.entities.len(),
                    passes = design.passes(),
                    "rendered"
                );
                Ok(self.design.insert(design))
            }
            Err(e) => {
                warn!(module = self.kind.id(), error = %e, "render failed");
                self.design = None;
                Err(e)
            }
        }
    }

    /// The current design, rendering first when parameters are entered but
    /// not yet drawn.
    fn ensure_drawn(&mut self) -> CanvasResult<&Design> {
        if self.design.is_none() {
            self.render()?;
        }
        self.design
            .as_ref()
            .ok_or_else(|| CanvasError::Internal {
                message: "render produced no design".to_string(),
            })
    }

    /// DXF file contents for the current design.
    pub fn generate_dxf(&mut self, settings: &DxfSettings) -> CanvasResult<Vec<u8>> {
        let result = self
            .ensure_drawn()
            .and_then(|design| write_dxf(&design.drawing, settings))
            .map(String::into_bytes);
        let bytes = self.record(result)?;
        info!(module = self.kind.id(), bytes = bytes.len(), "generated DXF");
        Ok(bytes)
    }

    /// Standalone SVG of the current design at canvas size.
    pub fn export_svg(&mut self, canvas: &CanvasSettings) -> CanvasResult<String> {
        let result = self.ensure_drawn().map(|design| {
            render_svg(
                &design.drawing,
                f64::from(canvas.width),
                f64::from(canvas.height),
                f64::from(canvas.margin),
            )
        });
        let svg = self.record(result)?;
        info!(module = self.kind.id(), "exported SVG");
        Ok(svg)
    }

    /// PDF report for the current design.
    pub fn export_pdf(&mut self, settings: &ReportSettings) -> CanvasResult<Vec<u8>> {
        let resolved = self.resolved();
        let module = self.kind.display_name();
        let result = self.ensure_drawn().and_then(|design| {
            render_report(&Report {
                module,
                parameters: &resolved,
                design,
                settings,
            })
        });
        let bytes = self.record(result)?;
        info!(module = self.kind.id(), bytes = bytes.len(), "exported PDF");
        Ok(bytes)
    }

    /// Empty the parameters and drop the drawing.
    pub fn clear(&mut self) {
        if !self.parameters.is_empty() {
            self.commit(ModuleParameterState::new());
        }
        self.design = None;
        self.last_error = None;
        debug!(module = self.kind.id(), "cleared");
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Restore the previous parameter state. Returns false when there is
    /// nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.undo.pop_back() {
            Some(previous) => {
                let current = std::mem::replace(&mut self.parameters, previous);
                self.redo.push(current);
                self.design = None;
                self.last_error = None;
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.redo.pop() {
            Some(next) => {
                let current = std::mem::replace(&mut self.parameters, next);
                self.undo.push_back(current);
                self.design = None;
                self.last_error = None;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_moves_to_parameters_entered() {
        let mut session = ModuleKind::Lintel.mount();
        session.set_parameter("span", "1500").unwrap();
        assert_eq!(session.phase(), ModulePhase::ParametersEntered);
        assert_eq!(session.parameters().get("span"), Some(&ParamValue::Number(1500.0)));
    }

    #[test]
    fn test_invalid_edit_leaves_state_unchanged() {
        let mut session = ModuleKind::Lintel.mount();
        session.set_parameter("span", "1500").unwrap();

        let err = session.set_parameter("span", "wide").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
        assert_eq!(session.parameters().get("span"), Some(&ParamValue::Number(1500.0)));
        assert_eq!(session.last_error(), Some(&err));

        let err = session.set_parameter("colour", "red").unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_PARAMETER");
        assert_eq!(session.parameters().len(), 1);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut session = ModuleKind::Staircase.mount();
        let err = session.set_parameter("riser_height", "400").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
        assert_eq!(session.phase(), ModulePhase::Empty);
    }

    #[test]
    fn test_render_then_edit_drops_drawing() {
        let mut session = ModuleKind::Sunshed.mount();
        session.set_parameter("projection", "900").unwrap();
        session.render().unwrap();
        assert_eq!(session.phase(), ModulePhase::Drawn);

        session.set_parameter("projection", "800").unwrap();
        assert_eq!(session.phase(), ModulePhase::ParametersEntered);
        assert!(session.design().is_none());
    }

    #[test]
    fn test_same_value_is_not_an_edit() {
        let mut session = ModuleKind::Sunshed.mount();
        session.set_parameter("projection", "900").unwrap();
        session.render().unwrap();
        session.set_parameter("projection", "900.0").unwrap();
        assert_eq!(session.phase(), ModulePhase::Drawn);
    }

    #[test]
    fn test_exports_from_empty_change_nothing() {
        let mut session = ModuleKind::Sunshed.mount();
        let err = session.generate_dxf(&DxfSettings::default()).unwrap_err();
        assert_eq!(err.error_code(), "NOTHING_TO_EXPORT");
        let err = session.export_pdf(&ReportSettings::default()).unwrap_err();
        assert_eq!(err.error_code(), "NOTHING_TO_EXPORT");
        assert_eq!(session.phase(), ModulePhase::Empty);
        assert!(!session.can_undo());
    }

    #[test]
    fn test_export_renders_on_demand() {
        let mut session = ModuleKind::RectangleColumn.mount();
        session.set_parameter("width", "350").unwrap();
        let dxf = session.generate_dxf(&DxfSettings::default()).unwrap();
        assert!(dxf.starts_with(b"  0\nSECTION\n  2\nHEADER\n"));
        assert_eq!(session.phase(), ModulePhase::Drawn);
    }

    #[test]
    fn test_failed_render_keeps_parameters_entered() {
        let mut session = ModuleKind::Lintel.mount();
        session.set_parameter("span", "6000").unwrap();
        session.set_parameter("depth", "100").unwrap();
        assert!(session.render().is_err());
        assert_eq!(session.phase(), ModulePhase::ParametersEntered);
        assert!(session.last_error().is_some());
    }

    #[test]
    fn test_clear_resets() {
        let mut session = ModuleKind::Bridge.mount();
        session.load_defaults();
        session.render().unwrap();
        session.clear();
        assert_eq!(session.phase(), ModulePhase::Empty);
        assert!(session.parameters().is_empty());
        assert!(session.last_error().is_none());
    }

    #[test]
    fn test_undo_redo() {
        let mut session = ModuleKind::Lintel.mount();
        session.set_parameter("span", "1500").unwrap();
        session.set_parameter("span", "1800").unwrap();
        session.clear();

        assert!(session.undo());
        assert_eq!(session.parameters().get("span"), Some(&ParamValue::Number(1800.0)));
        assert!(session.undo());
        assert_eq!(session.parameters().get("span"), Some(&ParamValue::Number(1500.0)));
        assert!(session.undo());
        assert_eq!(session.phase(), ModulePhase::Empty);
        assert!(!session.undo());

        assert!(session.redo());
        assert_eq!(session.parameters().get("span"), Some(&ParamValue::Number(1500.0)));

        // A new edit discards the redo branch
        session.set_parameter("span", "2000").unwrap();
        assert!(!session.can_redo());
    }

    #[test]
    fn test_undo_depth_is_capped() {
        let mut session = ModuleKind::Lintel.mount();
        for i in 0..(MAX_UNDO + 10) {
            session.set_parameter("span", &(1000 + i).to_string()).unwrap();
        }
        let mut undone = 0;
        while session.undo() {
            undone += 1;
        }
        assert_eq!(undone, MAX_UNDO);
    }

    #[test]
    fn test_with_parameters_canonicalizes() {
        let mut stored = ModuleParameterState::new();
        stored.insert("concrete_grade".into(), ParamValue::Text("m25".into()));
        let session = ModuleSession::with_parameters(ModuleKind::Lintel, &stored).unwrap();
        assert_eq!(session.parameters().get("concrete_grade"), Some(&ParamValue::Text("M25".into())));

        stored.insert("bogus".into(), ParamValue::Flag(true));
        assert!(ModuleSession::with_parameters(ModuleKind::Lintel, &stored).is_err());
    }
}
